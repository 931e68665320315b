//! Graph connection types.
//!
//! A [`Connection`] routes one output channel of a node to one input channel
//! of another. Output channels fan out freely; an input channel accepts at
//! most one connection.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// Unique identifier for a connection in a graph.
///
/// Connection IDs are assigned sequentially and never reused within a graph instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub(crate) u64);

impl ConnectionId {
    /// Wraps a raw identifier, e.g. one read from a snapshot.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric identifier.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId({})", self.0)
    }
}

/// A directed, channel-indexed edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Connection id.
    pub id: ConnectionId,
    /// Source node.
    pub from: NodeId,
    /// Output channel on the source node.
    pub from_channel: usize,
    /// Destination node.
    pub to: NodeId,
    /// Input channel on the destination node.
    pub to_channel: usize,
}

impl Connection {
    /// True if either endpoint is `node`.
    pub fn touches(&self, node: NodeId) -> bool {
        self.from == node || self.to == node
    }
}
