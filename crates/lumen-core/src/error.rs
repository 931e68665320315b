//! Error types for graph mutation, parameter handling and effect processing.
//!
//! Every error maps onto one [`ErrorKind`]. Configuration, topology and
//! not-found errors surface synchronously to the caller with the graph left
//! unchanged. Runtime processing errors stay local to one node for one tick.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::graph::{ConnectionId, NodeId};

/// Coarse error classification shared across the workspace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Bad channel index, unknown effect type, malformed snapshot, invalid parameter.
    Configuration,
    /// Cycle, duplicate input binding, duplicate explicit id, dangling reference.
    Topology,
    /// Unknown node or connection id.
    NotFound,
    /// An effect failed while processing a tick.
    RuntimeProcessing,
}

impl ErrorKind {
    /// Human-readable name.
    pub const fn name(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration error",
            ErrorKind::Topology => "topology error",
            ErrorKind::NotFound => "not found",
            ErrorKind::RuntimeProcessing => "runtime processing error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which side of a node a channel index refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelDirection {
    /// An input channel.
    Input,
    /// An output channel.
    Output,
}

impl fmt::Display for ChannelDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelDirection::Input => f.write_str("input"),
            ChannelDirection::Output => f.write_str("output"),
        }
    }
}

/// Invalid parameter names or values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    /// The parameter is not part of the schema.
    #[error("unknown parameter '{name}'")]
    Unknown {
        /// Offending parameter name.
        name: String,
    },

    /// The value has the wrong shape for the parameter.
    #[error("parameter '{name}' expects {expected}, got '{found}'")]
    TypeMismatch {
        /// Parameter name.
        name: String,
        /// Expected kind.
        expected: &'static str,
        /// Rendered offending value.
        found: String,
    },

    /// The value is not one of the allowed choices.
    #[error("parameter '{name}' must be one of [{options}], got '{value}'")]
    InvalidChoice {
        /// Parameter name.
        name: String,
        /// Offending value.
        value: String,
        /// Allowed values, comma separated.
        options: String,
    },

    /// The value is well-formed but unusable.
    #[error("parameter '{name}' is invalid: {reason}")]
    Invalid {
        /// Parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ParamError {
    /// Create an invalid-value error.
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ParamError::Invalid {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Always [`ErrorKind::Configuration`].
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }
}

/// An effect could not produce output for one tick.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// A device sink failed to transmit.
    #[error("device write failed: {0}")]
    Device(#[from] std::io::Error),

    /// An input carried an unexpected payload kind.
    #[error("input {channel} expected {expected}, got {found}")]
    UnexpectedInput {
        /// Input channel index.
        channel: usize,
        /// Expected payload kind.
        expected: &'static str,
        /// Received payload kind.
        found: &'static str,
    },

    /// Any other irrecoverable failure.
    #[error("{0}")]
    Failed(String),
}

impl ProcessError {
    /// Always [`ErrorKind::RuntimeProcessing`].
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::RuntimeProcessing
    }
}

/// Errors returned by graph mutations and the scheduler.
#[derive(Debug, Error)]
pub enum GraphError {
    /// No node with this id.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// No connection with this id.
    #[error("connection {0} not found")]
    ConnectionNotFound(ConnectionId),

    /// A channel index exceeds the endpoint's declared channel count.
    #[error("{direction} channel {channel} out of range for node {node} ({available} available)")]
    ChannelOutOfRange {
        /// Endpoint node.
        node: NodeId,
        /// Requested channel index.
        channel: usize,
        /// Declared channel count on that side.
        available: usize,
        /// Input or output side.
        direction: ChannelDirection,
    },

    /// The input channel already has an incoming connection.
    #[error("input channel {channel} of node {node} is already bound by connection {existing}")]
    InputAlreadyBound {
        /// Destination node.
        node: NodeId,
        /// Destination channel.
        channel: usize,
        /// The connection currently bound there.
        existing: ConnectionId,
    },

    /// Adding the edge `from → to` would close a cycle.
    #[error("connecting {from} to {to} would create a cycle")]
    CycleDetected {
        /// Source node of the rejected edge.
        from: NodeId,
        /// Destination node of the rejected edge.
        to: NodeId,
    },

    /// The scheduler found a cycle while ordering the graph.
    #[error("graph contains a cycle through node {node}")]
    GraphCycle {
        /// One node on the cycle.
        node: NodeId,
    },

    /// A node with this id already exists.
    #[error("node id {0} is already in use")]
    DuplicateNodeId(NodeId),

    /// A connection with this id already exists.
    #[error("connection id {0} is already in use")]
    DuplicateConnectionId(ConnectionId),

    /// An explicit id is larger than [`FilterGraph::MAX_ID`](crate::FilterGraph::MAX_ID).
    #[error("id {id} is out of range (largest allowed is {max})")]
    IdOutOfRange {
        /// Rejected id.
        id: u64,
        /// Largest accepted id.
        max: u64,
    },

    /// The node rejected a parameter update.
    #[error("invalid parameters for node {node}: {source}")]
    InvalidParameters {
        /// Target node.
        node: NodeId,
        /// Underlying parameter error.
        #[source]
        source: ParamError,
    },
}

impl GraphError {
    /// Classifies this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            GraphError::NodeNotFound(_) | GraphError::ConnectionNotFound(_) => ErrorKind::NotFound,
            GraphError::ChannelOutOfRange { .. }
            | GraphError::IdOutOfRange { .. }
            | GraphError::InvalidParameters { .. } => ErrorKind::Configuration,
            GraphError::InputAlreadyBound { .. }
            | GraphError::CycleDetected { .. }
            | GraphError::GraphCycle { .. }
            | GraphError::DuplicateNodeId(_)
            | GraphError::DuplicateConnectionId(_) => ErrorKind::Topology,
        }
    }
}
