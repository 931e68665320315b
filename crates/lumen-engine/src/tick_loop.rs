//! Fixed-rate tick loop.
//!
//! A dedicated thread repeatedly runs one tick of the shared graph and then
//! sleeps until the next deadline from its [`Pacer`]. The stop flag is only
//! checked between ticks, so a tick in progress always completes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::EngineError;
use crate::pacer::{Pacer, TickPace};
use crate::shared::SharedGraph;

/// Counters published by the loop thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Ticks completed.
    pub ticks: u64,
    /// Ticks that ran past their slot.
    pub overruns: u64,
}

#[derive(Default)]
struct Counters {
    ticks: AtomicU64,
    overruns: AtomicU64,
}

/// Handle to a running tick loop. Dropping it stops the loop.
pub struct TickLoop {
    running: Arc<AtomicBool>,
    counters: Arc<Counters>,
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl TickLoop {
    /// Starts ticking `graph` every `period` on a new thread.
    pub fn spawn(graph: SharedGraph, period: Duration) -> Result<Self, EngineError> {
        let running = Arc::new(AtomicBool::new(true));
        let counters = Arc::new(Counters::default());

        let r = Arc::clone(&running);
        let c = Arc::clone(&counters);
        let handle = std::thread::Builder::new()
            .name("lumen-tick".into())
            .spawn(move || run(&graph, period, &r, &c))
            .map_err(EngineError::Spawn)?;

        tracing::info!(period_ms = period.as_secs_f64() * 1000.0, "tick loop started");
        Ok(Self {
            running,
            counters,
            handle: Some(handle),
            period,
        })
    }

    /// Target time between ticks.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// True until [`stop`](Self::stop) is called.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Current counters.
    pub fn stats(&self) -> LoopStats {
        LoopStats {
            ticks: self.counters.ticks.load(Ordering::SeqCst),
            overruns: self.counters.overruns.load(Ordering::SeqCst),
        }
    }

    /// Stops the loop after the tick in progress and waits for the thread.
    pub fn stop(&mut self) -> LoopStats {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("tick thread panicked");
            }
            let stats = self.stats();
            tracing::info!(ticks = stats.ticks, overruns = stats.overruns, "tick loop stopped");
        }
        self.stats()
    }
}

impl Drop for TickLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for TickLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickLoop")
            .field("period", &self.period)
            .field("running", &self.is_running())
            .field("stats", &self.stats())
            .finish()
    }
}

fn run(graph: &SharedGraph, period: Duration, running: &AtomicBool, counters: &Counters) {
    let mut pacer = Pacer::new(period, Instant::now());
    let mut previous: Option<Instant> = None;

    while running.load(Ordering::SeqCst) {
        let wait = pacer.wait_time(Instant::now());
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }

        let start = Instant::now();
        let dt = previous.map_or(period, |p| start - p);
        previous = Some(start);

        if let Err(err) = graph.lock().tick(dt.as_secs_f64()) {
            tracing::error!("tick failed: {err}");
        }
        counters.ticks.fetch_add(1, Ordering::SeqCst);

        if pacer.finish_tick(Instant::now()) == TickPace::Overrun {
            counters.overruns.fetch_add(1, Ordering::SeqCst);
            tracing::trace!(tick_ms = start.elapsed().as_secs_f64() * 1000.0, "tick overran period");
        }
    }
}
