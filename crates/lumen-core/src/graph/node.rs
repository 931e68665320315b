//! Graph node types.
//!
//! A [`Node`] bundles one boxed [`Effect`] with its stable [`NodeId`] and the
//! node's [`TimingStats`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::effect::Effect;
use crate::timing::TimingStats;

/// Unique identifier for a node in a graph.
///
/// Node IDs are assigned sequentially and never reused within a graph instance.
/// They remain stable across mutations and across save/load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
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

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// A graph-resident effect instance.
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) effect: Box<dyn Effect>,
    pub(crate) timing: TimingStats,
}

impl Node {
    pub(crate) fn new(id: NodeId, effect: Box<dyn Effect>) -> Self {
        Self {
            id,
            effect,
            timing: TimingStats::default(),
        }
    }

    /// The node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The wrapped effect.
    pub fn effect(&self) -> &dyn Effect {
        self.effect.as_ref()
    }

    /// Registry name of the wrapped effect.
    pub fn type_name(&self) -> &'static str {
        self.effect.type_name()
    }

    /// Declared input channel count.
    pub fn num_inputs(&self) -> usize {
        self.effect.num_inputs()
    }

    /// Declared output channel count.
    pub fn num_outputs(&self) -> usize {
        self.effect.num_outputs()
    }

    /// Processing time diagnostics.
    pub fn timing(&self) -> &TimingStats {
        &self.timing
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("type", &self.effect.type_name())
            .field("inputs", &self.effect.num_inputs())
            .field("outputs", &self.effect.num_outputs())
            .finish()
    }
}
