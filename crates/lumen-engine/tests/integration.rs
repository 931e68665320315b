//! Integration tests for lumen-engine: the tick loop running against live
//! control-plane mutations.

use std::sync::Arc;
use std::time::{Duration, Instant};

use lumen_core::param::param_map;
use lumen_core::{Effect, ErrorKind, FilterGraph, ParamMap, ParamValue, ProcessError, Rgb, Signal};
use lumen_effects::{LedOutput, MemoryDevice, StaticRgbColor};
use lumen_engine::{ControlPlane, Engine, SharedGraph, TickLoop};
use lumen_registry::EffectRegistry;
use parking_lot::Mutex;

/// Records when each tick reached it; the first tick takes `first_tick`.
struct Stopwatch {
    starts: Arc<Mutex<Vec<Instant>>>,
    first_tick: Duration,
}

impl Effect for Stopwatch {
    fn type_name(&self) -> &'static str {
        "test.Stopwatch"
    }

    fn num_inputs(&self) -> usize {
        0
    }

    fn num_outputs(&self) -> usize {
        0
    }

    fn process(&mut self, _inputs: &[Option<Signal>], _outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
        let mut starts = self.starts.lock();
        starts.push(Instant::now());
        if starts.len() == 1 {
            std::thread::sleep(self.first_tick);
        }
        Ok(())
    }
}

#[test]
fn slow_tick_is_followed_by_one_tick_not_a_burst() {
    let starts = Arc::new(Mutex::new(Vec::new()));
    let mut graph = FilterGraph::new();
    graph.add_node(Box::new(Stopwatch {
        starts: Arc::clone(&starts),
        first_tick: Duration::from_millis(40),
    }));
    let shared = SharedGraph::new(graph);

    let mut tick_loop = TickLoop::spawn(shared, Duration::from_millis(16)).unwrap();
    while starts.lock().len() < 4 {
        std::thread::sleep(Duration::from_millis(5));
    }
    let stats = tick_loop.stop();

    let starts = starts.lock();
    // the overrunning tick is followed immediately by exactly one tick...
    assert!(starts[1] - starts[0] >= Duration::from_millis(40));
    // ...and the one after that waits a period again
    assert!(
        starts[2] - starts[1] >= Duration::from_millis(8),
        "catch-up tick after {:?}",
        starts[2] - starts[1]
    );
    assert!(stats.overruns >= 1);
}

#[test]
fn loop_drives_sink_while_graph_is_edited() {
    let capture = MemoryDevice::new();
    let registry = Arc::new(EffectRegistry::new());
    let mut graph = FilterGraph::new();
    let led = graph.add_node(Box::new(LedOutput::with_sink(Box::new(capture.clone()))));
    let mut engine = Engine::new(graph, Arc::clone(&registry), Duration::from_millis(2));
    let control = engine.control();
    engine.start().unwrap();

    let color = control
        .create_node(
            "colors.StaticRGBColor",
            &param_map([
                ("num_pixels", ParamValue::Int(5)),
                ("r", ParamValue::Float(0.0)),
                ("g", ParamValue::Float(0.0)),
            ]),
        )
        .unwrap();
    let conn = control.create_connection(color.uid, 0, led.raw(), 0).unwrap();
    wait_for(|| capture.len() >= 3);
    assert_eq!(capture.last_frame(), Some(vec![Rgb::new(0.0, 0.0, 255.0); 5]));

    control
        .update_node_parameters(color.uid, &param_map([("r", ParamValue::Float(255.0))]))
        .unwrap();
    wait_for(|| capture.last_frame().is_some_and(|f| f[0].r == 255.0));

    control.delete_connection(conn.uid).unwrap();
    std::thread::sleep(Duration::from_millis(10));
    let frames = capture.len();
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(capture.len(), frames, "unbound sink must not write");

    let stats = engine.stop();
    assert!(stats.ticks > 0);
}

#[test]
fn fan_out_consumers_see_the_same_frame() {
    let capture_a = MemoryDevice::new();
    let capture_b = MemoryDevice::new();
    let mut graph = FilterGraph::new();
    let source = graph.add_node(Box::new(StaticRgbColor::new(3, Rgb::GREEN)));
    let a = graph.add_node(Box::new(LedOutput::with_sink(Box::new(capture_a.clone()))));
    let b = graph.add_node(Box::new(LedOutput::with_sink(Box::new(capture_b.clone()))));
    graph.add_connection(source, 0, a, 0).unwrap();
    graph.add_connection(source, 0, b, 0).unwrap();

    let mut engine = Engine::new(graph, Arc::new(EffectRegistry::new()), Duration::from_millis(16));
    engine.run_offline(1, |_| {}).unwrap();
    let shared = engine.graph().lock();
    let seen_a = shared.last_inputs(a).unwrap()[0].clone().unwrap();
    let seen_b = shared.last_inputs(b).unwrap()[0].clone().unwrap();
    assert!(seen_a.same_payload(&seen_b));
    assert_eq!(capture_a.frames(), capture_b.frames());
}

#[test]
fn rejected_mutations_leave_running_graph_intact() {
    let registry = Arc::new(EffectRegistry::new());
    let mut engine = Engine::new(FilterGraph::new(), registry, Duration::from_millis(2));
    let control = engine.control();
    engine.start().unwrap();

    let a = control.create_node("effects.AfterGlow", &ParamMap::new()).unwrap().uid;
    let b = control.create_node("effects.Mirror", &ParamMap::new()).unwrap().uid;
    control.create_connection(a, 0, b, 0).unwrap();
    let before = control.save_snapshot().unwrap();

    let cycle = control.create_connection(b, 0, a, 0).unwrap_err();
    assert_eq!(cycle.kind(), ErrorKind::Topology);
    let missing = control.create_connection(a, 0, 99, 0).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);
    let bad_channel = control.create_connection(a, 1, b, 0).unwrap_err();
    assert_eq!(bad_channel.kind(), ErrorKind::Configuration);

    assert_eq!(control.save_snapshot().unwrap(), before);
    engine.stop();
}

#[test]
fn snapshot_swap_under_running_loop() {
    let registry = Arc::new(EffectRegistry::new());
    let config = lumen_config::EngineConfig {
        num_pixels: 24,
        preset: "spectrum".into(),
        tick_rate_hz: 200.0,
        ..lumen_config::EngineConfig::default()
    };
    let mut engine = Engine::from_config(&config, Arc::clone(&registry)).unwrap();
    let control: ControlPlane = engine.control();
    engine.start().unwrap();
    wait_for(|| engine.stats().ticks >= 3);

    let vu_peak = lumen_config::build_preset(&registry, "vuPeak", 24, &config.output_target()).unwrap();
    let text = lumen_config::snapshot::save(&vu_peak).unwrap();
    control.load_snapshot(&text).unwrap();
    let ticks = engine.stats().ticks;
    wait_for(|| engine.stats().ticks >= ticks + 3);

    let timings = control.node_timings();
    assert_eq!(timings.len(), vu_peak.node_count());
    assert!(timings.iter().all(|t| t.failures == 0));
    assert!(timings.iter().any(|t| t.samples > 0), "timing flag carries over");
    engine.stop();
}

fn wait_for(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        std::thread::sleep(Duration::from_millis(1));
    }
}
