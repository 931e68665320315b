//! Per-tick buffer routing.
//!
//! [`TickBuffers`] holds every node's outputs for the current tick. Inputs are
//! resolved from the input-binding index: a bound channel reads the upstream
//! node's current-tick output, an unbound channel reads absent. The router
//! never substitutes defaults and is cleared at the start of every tick, so a
//! value can never leak from one tick into the next.

use std::collections::{BTreeMap, HashMap};

use crate::signal::Signal;

use super::connection::{Connection, ConnectionId};
use super::node::NodeId;

/// Outputs (and the inputs they were computed from) for the running tick.
#[derive(Debug, Default)]
pub(crate) struct TickBuffers {
    outputs: HashMap<NodeId, Vec<Option<Signal>>>,
    inputs: HashMap<NodeId, Vec<Option<Signal>>>,
}

impl TickBuffers {
    /// Drops every value from the previous tick.
    pub fn clear(&mut self) {
        self.outputs.clear();
        self.inputs.clear();
    }

    /// Forgets a removed node.
    pub fn forget(&mut self, node: NodeId) {
        self.outputs.remove(&node);
        self.inputs.remove(&node);
    }

    /// Assembles the input vector for `node`.
    pub fn resolve_inputs(
        &self,
        node: NodeId,
        num_inputs: usize,
        bindings: &BTreeMap<(NodeId, usize), ConnectionId>,
        connections: &BTreeMap<ConnectionId, Connection>,
    ) -> Vec<Option<Signal>> {
        (0..num_inputs)
            .map(|channel| {
                let conn = bindings
                    .get(&(node, channel))
                    .and_then(|id| connections.get(id))?;
                let upstream = self.outputs.get(&conn.from);
                debug_assert!(
                    upstream.is_some(),
                    "{} read before {} produced output",
                    node,
                    conn.from
                );
                upstream?.get(conn.from_channel)?.clone()
            })
            .collect()
    }

    /// Stores a node's inputs and outputs for the rest of the tick.
    pub fn record(&mut self, node: NodeId, inputs: Vec<Option<Signal>>, outputs: Vec<Option<Signal>>) {
        self.inputs.insert(node, inputs);
        self.outputs.insert(node, outputs);
    }

    /// Output `channel` of `node` in the current tick.
    pub fn output(&self, node: NodeId, channel: usize) -> Option<&Signal> {
        self.outputs.get(&node)?.get(channel)?.as_ref()
    }

    /// Inputs `node` was given in the current tick.
    pub fn inputs(&self, node: NodeId) -> Option<&[Option<Signal>]> {
        self.inputs.get(&node).map(Vec::as_slice)
    }
}
