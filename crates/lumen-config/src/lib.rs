//! Snapshots, presets and configuration for lumen graphs.
//!
//! # Features
//!
//! - **Snapshots**: canonical JSON save/load of a whole [`FilterGraph`](lumen_core::FilterGraph)
//! - **Presets**: the built-in audio-reactive graphs, built through the effect registry
//! - **Engine config**: TOML settings for the tick loop and default graph
//! - **Paths**: platform-specific config and saved-graph directories
//!
//! # Example
//!
//! ```rust,no_run
//! use lumen_config::{OutputTarget, build_preset, snapshot};
//! use lumen_registry::EffectRegistry;
//!
//! let registry = EffectRegistry::new();
//! let graph = build_preset(&registry, "spectrum", 300, &OutputTarget::default()).unwrap();
//! snapshot::save_to_file(&graph, "spectrum.json").unwrap();
//! let restored = snapshot::load_from_file("spectrum.json", &registry).unwrap();
//! assert_eq!(restored.node_count(), graph.node_count());
//! ```

mod engine_config;
mod error;

/// Platform-specific paths for saved graphs and configuration.
pub mod paths;

/// Factory graph presets.
pub mod presets;

/// Graph snapshot codec.
pub mod snapshot;

pub use engine_config::EngineConfig;
pub use error::ConfigError;
pub use paths::{find_graph, user_config_dir, user_graphs_dir};
pub use presets::{OutputTarget, build_preset, preset_names};
pub use snapshot::{ConnectionSnapshot, NodeSnapshot, Snapshot};
