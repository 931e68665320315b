//! Engine assembly: initial graph, tick loop and control plane.

use std::sync::Arc;
use std::time::Duration;

use lumen_config::{EngineConfig, build_preset, snapshot};
use lumen_core::FilterGraph;
use lumen_registry::EffectRegistry;

use crate::control::ControlPlane;
use crate::error::EngineError;
use crate::shared::SharedGraph;
use crate::tick_loop::{LoopStats, TickLoop};

/// A graph plus the loop that drives it.
#[derive(Debug)]
pub struct Engine {
    graph: SharedGraph,
    registry: Arc<EffectRegistry>,
    period: Duration,
    tick_loop: Option<TickLoop>,
}

impl Engine {
    /// Wraps an already built graph.
    pub fn new(graph: FilterGraph, registry: Arc<EffectRegistry>, period: Duration) -> Self {
        Self {
            graph: SharedGraph::new(graph),
            registry,
            period,
            tick_loop: None,
        }
    }

    /// Builds the initial graph from `config`: the snapshot if one is set,
    /// otherwise the named preset.
    pub fn from_config(config: &EngineConfig, registry: Arc<EffectRegistry>) -> Result<Self, EngineError> {
        let mut graph = match &config.snapshot {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading snapshot");
                snapshot::load_from_file(path, &registry)?
            }
            None => {
                tracing::info!(preset = %config.preset, num_pixels = config.num_pixels, "building preset");
                build_preset(&registry, &config.preset, config.num_pixels, &config.output_target())?
            }
        };
        graph.set_record_timings(config.record_timings);
        Ok(Self::new(graph, registry, config.tick_period()))
    }

    /// Shared handle to the graph.
    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    /// A control plane over this engine's graph.
    pub fn control(&self) -> ControlPlane {
        ControlPlane::new(self.graph.clone(), Arc::clone(&self.registry))
    }

    /// Target time between ticks.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts the tick loop thread.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.tick_loop.as_ref().is_some_and(TickLoop::is_running) {
            return Err(EngineError::AlreadyRunning);
        }
        self.tick_loop = Some(TickLoop::spawn(self.graph.clone(), self.period)?);
        Ok(())
    }

    /// True while the tick loop runs.
    pub fn is_running(&self) -> bool {
        self.tick_loop.as_ref().is_some_and(TickLoop::is_running)
    }

    /// Counters of the most recent loop; zero before the first start.
    pub fn stats(&self) -> LoopStats {
        self.tick_loop.as_ref().map(TickLoop::stats).unwrap_or_default()
    }

    /// Stops the loop between ticks and joins its thread.
    pub fn stop(&mut self) -> LoopStats {
        self.tick_loop.as_mut().map(TickLoop::stop).unwrap_or_default()
    }

    /// Runs `ticks` ticks on the calling thread with a fixed `dt`, without pacing.
    ///
    /// Used for offline rendering; fails if the loop thread is running.
    pub fn run_offline(&mut self, ticks: u64, mut on_tick: impl FnMut(u64)) -> Result<(), EngineError> {
        if self.is_running() {
            return Err(EngineError::AlreadyRunning);
        }
        let dt = self.period.as_secs_f64();
        for i in 0..ticks {
            if let Err(err) = self.graph.lock().tick(dt) {
                tracing::error!("tick failed: {err}");
            }
            on_tick(i);
        }
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}
