//! Property-based tests for lumen-core graph invariants.
//!
//! Builds random acyclic graphs with proptest and checks execution order
//! validity and determinism, cycle rejection, and incident-edge removal.

use std::collections::BTreeSet;

use lumen_core::{ConnectionId, Effect, FilterGraph, GraphError, NodeId, ProcessError, Signal};
use proptest::prelude::*;

/// Pass-through node with many inputs and one output.
struct Junction {
    inputs: usize,
}

impl Effect for Junction {
    fn type_name(&self) -> &'static str {
        "test.Junction"
    }
    fn num_inputs(&self) -> usize {
        self.inputs
    }
    fn num_outputs(&self) -> usize {
        1
    }
    fn process(&mut self, inputs: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
        let count = inputs.iter().flatten().count();
        outputs[0] = Some(Signal::Scalar(count as f32));
        Ok(())
    }
}

/// A random DAG: `rank` is a permutation giving each node its topological
/// rank, and every edge goes from a lower rank to a higher one.
#[derive(Debug, Clone)]
struct DagSpec {
    nodes: usize,
    rank: Vec<usize>,
    edges: Vec<(usize, usize)>,
}

fn dag_spec() -> impl Strategy<Value = DagSpec> {
    (2usize..12)
        .prop_flat_map(|n| {
            let perm = Just((0..n).collect::<Vec<_>>()).prop_shuffle();
            let edges = prop::collection::vec((0..n, 0..n), 0..(n * 2));
            (Just(n), perm, edges)
        })
        .prop_map(|(nodes, rank, raw)| {
            let edges = raw
                .into_iter()
                .filter(|(a, b)| a != b)
                .map(|(a, b)| if rank[a] < rank[b] { (a, b) } else { (b, a) })
                .collect();
            DagSpec { nodes, rank, edges }
        })
}

/// Builds the graph; each edge lands on the next free input of its target.
fn build(spec: &DagSpec) -> (FilterGraph, Vec<NodeId>) {
    let mut graph = FilterGraph::new();
    let ids: Vec<NodeId> = (0..spec.nodes)
        .map(|_| graph.add_node(Box::new(Junction { inputs: spec.edges.len().max(1) })))
        .collect();
    let mut next_input = vec![0usize; spec.nodes];
    for &(from, to) in &spec.edges {
        graph
            .add_connection(ids[from], 0, ids[to], next_input[to])
            .expect("acyclic edge with a free input must connect");
        next_input[to] += 1;
    }
    (graph, ids)
}

fn connection_set(graph: &FilterGraph) -> Vec<(ConnectionId, NodeId, usize, NodeId, usize)> {
    graph
        .connections()
        .map(|c| (c.id, c.from, c.from_channel, c.to, c.to_channel))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every connection's source precedes its destination, and recomputing
    /// the order after an unrelated invalidation yields the same order.
    #[test]
    fn order_respects_edges_and_is_deterministic(spec in dag_spec()) {
        let (mut graph, _) = build(&spec);
        let order = graph.execution_order().unwrap();
        prop_assert_eq!(order.len(), spec.nodes);

        let position = |id: NodeId| order.iter().position(|&n| n == id).unwrap();
        for conn in graph.connections() {
            prop_assert!(position(conn.from) < position(conn.to));
        }

        // Force a recompute without changing topology.
        let extra = graph.add_node(Box::new(Junction { inputs: 1 }));
        let _ = graph.remove_node(extra);
        let again = graph.execution_order().unwrap();
        prop_assert_eq!(order, again);
        prop_assert!(graph.tick(0.01).is_ok());
    }

    /// Any edge from a node to one of its ancestors is rejected and leaves
    /// the connection set untouched.
    #[test]
    fn cycle_closing_edge_rejected(spec in dag_spec()) {
        prop_assume!(!spec.edges.is_empty());
        let (mut graph, ids) = build(&spec);
        let before = connection_set(&graph);

        // Close the cycle on the first edge: to → from, on a fresh input.
        let (from, to) = spec.edges[0];
        let free_input = spec.edges.iter().filter(|&&(_, t)| t == from).count();
        let result = graph.add_connection(ids[to], 0, ids[from], free_input);
        let is_cycle = matches!(result, Err(GraphError::CycleDetected { .. }));
        prop_assert!(is_cycle);
        prop_assert_eq!(connection_set(&graph), before);
    }

    /// Removing a node removes exactly the connections touching it.
    #[test]
    fn remove_node_drops_exactly_incident(spec in dag_spec(), victim in 0usize..12) {
        let (mut graph, ids) = build(&spec);
        let victim = ids[victim % spec.nodes];
        let before = connection_set(&graph);
        let expected: BTreeSet<_> = before
            .iter()
            .filter(|c| c.1 != victim && c.3 != victim)
            .copied()
            .collect();

        prop_assert!(graph.remove_node(victim).is_ok());
        let after: BTreeSet<_> = connection_set(&graph).into_iter().collect();
        prop_assert_eq!(after, expected);
        prop_assert!(graph.remove_node(victim).is_err());
    }

    /// Node ranks drawn by the strategy are consistent with the order.
    #[test]
    fn rank_is_a_valid_order(spec in dag_spec()) {
        for &(a, b) in &spec.edges {
            prop_assert!(spec.rank[a] < spec.rank[b]);
        }
    }
}
