//! Runtime for lumen graphs.
//!
//! - [`SharedGraph`] - the graph behind one mutex, shared by every thread
//! - [`TickLoop`] - a thread running `update` + `process` at a fixed rate,
//!   free-running when a tick overruns ([`Pacer`])
//! - [`ControlPlane`] - graph inspection and mutation for a remote transport
//! - [`Engine`] - the three assembled from an [`EngineConfig`](lumen_config::EngineConfig)
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lumen_config::EngineConfig;
//! use lumen_engine::Engine;
//! use lumen_registry::EffectRegistry;
//!
//! let mut engine = Engine::from_config(&EngineConfig::default(), Arc::new(EffectRegistry::new())).unwrap();
//! engine.start().unwrap();
//! let control = engine.control();
//! println!("{} nodes", control.list_nodes().len());
//! engine.stop();
//! ```

pub mod control;
mod engine;
mod error;
pub mod pacer;
mod shared;
pub mod tick_loop;

pub use control::{ConnectionInfo, ControlPlane, EffectTypeInfo, NodeInfo, NodeTiming, ParameterInfo};
pub use engine::Engine;
pub use error::{ControlError, EngineError};
pub use pacer::{Pacer, TickPace};
pub use shared::SharedGraph;
pub use tick_loop::{LoopStats, TickLoop};
