//! Criterion benchmarks for the filter graph (`lumen-core::graph`).
//!
//! Measures graph overhead independently of effect cost using a trivial
//! `Passthrough` effect. Two axes:
//!
//! - **Schedule**: execution order computation after a topology change
//! - **Tick**: `tick()` throughput on cached orders of varying size
//!
//! Run with: `cargo bench -p lumen-core -- graph/`
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use lumen_core::{Effect, FilterGraph, NodeId, Pixels, ProcessError, Rgb, Signal};

const NUM_PIXELS: usize = 300;
const SIZES: &[usize] = &[4, 16, 64, 256];

// ---------------------------------------------------------------------------
// Trivial effects isolate graph overhead from pixel work
// ---------------------------------------------------------------------------

/// Emits the same shared pixel table every tick.
struct Constant(Pixels);

impl Effect for Constant {
    fn type_name(&self) -> &'static str {
        "bench.Constant"
    }
    fn num_inputs(&self) -> usize {
        0
    }
    fn num_outputs(&self) -> usize {
        1
    }
    fn process(&mut self, _: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
        outputs[0] = Some(Signal::Pixels(self.0.clone()));
        Ok(())
    }
}

/// Forwards input 0 to output 0.
struct Passthrough;

impl Effect for Passthrough {
    fn type_name(&self) -> &'static str {
        "bench.Passthrough"
    }
    fn num_inputs(&self) -> usize {
        1
    }
    fn num_outputs(&self) -> usize {
        1
    }
    fn process(&mut self, inputs: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
        outputs[0] = inputs[0].clone();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Graph constructors
// ---------------------------------------------------------------------------

fn make_chain(n: usize) -> FilterGraph {
    let mut graph = FilterGraph::new();
    let mut prev = graph.add_node(Box::new(Constant(Pixels::filled(NUM_PIXELS, Rgb::WHITE))));
    for _ in 1..n {
        let next = graph.add_node(Box::new(Passthrough));
        let _ = graph.add_connection(prev, 0, next, 0);
        prev = next;
    }
    graph
}

/// One source fanning out to `n - 1` consumers.
fn make_fan_out(n: usize) -> FilterGraph {
    let mut graph = FilterGraph::new();
    let src = graph.add_node(Box::new(Constant(Pixels::filled(NUM_PIXELS, Rgb::RED))));
    for _ in 1..n {
        let sink = graph.add_node(Box::new(Passthrough));
        let _ = graph.add_connection(src, 0, sink, 0);
    }
    graph
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/schedule");
    for &n in SIZES {
        group.bench_with_input(BenchmarkId::new("chain", n), &n, |b, &n| {
            let mut graph = make_chain(n);
            b.iter(|| {
                // Add and remove a detached node to invalidate the cache.
                let extra: NodeId = graph.add_node(Box::new(Passthrough));
                let _ = graph.remove_node(extra);
                black_box(graph.execution_order().map(|o| o.len()).unwrap_or(0))
            });
        });
    }
    group.finish();
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/tick");
    for &n in SIZES {
        group.bench_with_input(BenchmarkId::new("chain", n), &n, |b, &n| {
            let mut graph = make_chain(n);
            b.iter(|| black_box(graph.tick(1.0 / 60.0).is_ok()));
        });
        group.bench_with_input(BenchmarkId::new("fan_out", n), &n, |b, &n| {
            let mut graph = make_fan_out(n);
            b.iter(|| black_box(graph.tick(1.0 / 60.0).is_ok()));
        });
    }
    group.finish();
}

fn bench_tick_with_timings(c: &mut Criterion) {
    let mut graph = make_chain(64);
    graph.set_record_timings(true);
    c.bench_function("graph/tick/chain_64_timed", |b| {
        b.iter(|| black_box(graph.tick(1.0 / 60.0).is_ok()));
    });
}

criterion_group!(benches, bench_schedule, bench_tick, bench_tick_with_timings);
criterion_main!(benches);
