//! Dataflow graph engine.
//!
//! Nodes wrap [`Effect`](crate::Effect)s with heterogeneous channel counts;
//! connections route one output channel to one input channel. The engine
//! keeps the connection set acyclic, computes and caches a deterministic
//! execution order, and routes each tick's outputs to downstream inputs.
//!
//! # Architecture
//!
//! - [`FilterGraph`] owns topology and effect state. All mutations are
//!   all-or-nothing and invalidate the cached order.
//! - `schedule` computes the execution order (Kahn's algorithm, ties broken
//!   by creation order).
//! - `router` holds per-tick outputs and resolves inputs: bound channels read
//!   the upstream output of this tick, unbound channels read absent.
//!
//! # Example
//!
//! ```rust,ignore
//! use lumen_core::FilterGraph;
//!
//! let mut graph = FilterGraph::new();
//! let audio = graph.add_node(Box::new(audio_in));
//! let meter = graph.add_node(Box::new(vu_meter));
//! let led = graph.add_node(Box::new(led_out));
//!
//! graph.add_connection(audio, 0, meter, 0)?;
//! graph.add_connection(meter, 0, led, 0)?;
//!
//! loop {
//!     graph.tick(1.0 / 60.0)?;
//! }
//! ```

pub mod connection;
pub mod node;
mod processing;
mod router;
mod schedule;

pub use connection::{Connection, ConnectionId};
pub use node::{Node, NodeId};
pub use processing::FilterGraph;
