//! Execution order computation.
//!
//! Kahn's algorithm over the connection set. Among nodes that are ready at the
//! same time the smallest [`NodeId`] goes first; ids are handed out in creation
//! order, so the order is stable across runs and across save/load.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use crate::error::GraphError;

use super::connection::{Connection, ConnectionId};
use super::node::NodeId;

/// Computes a topological order of `nodes` consistent with every connection.
///
/// Parallel edges between the same pair of nodes are counted individually.
/// Fails with [`GraphError::GraphCycle`] naming the smallest unscheduled node
/// that still has pending predecessors.
pub(crate) fn topological_order<I>(
    nodes: I,
    connections: &BTreeMap<ConnectionId, Connection>,
) -> Result<Vec<NodeId>, GraphError>
where
    I: IntoIterator<Item = NodeId>,
{
    let mut in_degree: BTreeMap<NodeId, usize> = nodes.into_iter().map(|id| (id, 0)).collect();
    let mut successors: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();

    for conn in connections.values() {
        if let Some(degree) = in_degree.get_mut(&conn.to) {
            *degree += 1;
        }
        successors.entry(conn.from).or_default().push(conn.to);
    }

    let mut ready: BinaryHeap<Reverse<NodeId>> = in_degree
        .iter()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(&id, _)| Reverse(id))
        .collect();

    let mut order = Vec::with_capacity(in_degree.len());

    while let Some(Reverse(id)) = ready.pop() {
        order.push(id);
        for next in successors.get(&id).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(next) {
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(*next));
                }
            }
        }
    }

    if order.len() != in_degree.len() {
        let node = in_degree
            .iter()
            .find(|&(_, &degree)| degree > 0)
            .map_or(NodeId(0), |(&id, _)| id);
        return Err(GraphError::GraphCycle { node });
    }

    Ok(order)
}
