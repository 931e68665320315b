//! Lumen Core - dataflow graph engine for audio-reactive LED pipelines.
//!
//! This crate provides the engine that the effect library and runtime are
//! built on:
//!
//! - [`Effect`] - capability contract implemented by every node payload
//! - [`Signal`] - channel values (audio blocks, pixel tables, scalars); absence is `None`
//! - [`ParamDescriptor`] / [`ParamMap`] - parameter schemas and values
//! - [`FilterGraph`] - topology mutation, cached scheduling, buffer routing,
//!   update pass and per-node timing
//! - [`PixelSink`] - the device output contract
//!
//! ## Features
//!
//! - `tracing` - emit `tracing` events for graph mutations and node failures

pub mod effect;
pub mod error;
pub mod graph;
pub mod param;
pub mod signal;
pub mod sink;
pub mod timing;

pub use effect::{Effect, UpdateContext};
pub use error::{ChannelDirection, ErrorKind, GraphError, ParamError, ProcessError};
pub use graph::{Connection, ConnectionId, FilterGraph, Node, NodeId};
pub use param::{ParamDescriptor, ParamKind, ParamLookup, ParamMap, ParamUnit, ParamValue};
pub use signal::{AudioFrame, InputsExt, Pixels, Rgb, Signal};
pub use sink::PixelSink;
pub use timing::TimingStats;
