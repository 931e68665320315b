//! Filter graph: mutation API, cached scheduling and tick execution.
//!
//! [`FilterGraph`] owns the node set, the connection set and the input-binding
//! index. Every mutation validates fully before touching any state, so a
//! failed call leaves the graph exactly as it was. Topology changes invalidate
//! the cached execution order; the next tick recomputes it once and reuses it
//! until the topology changes again.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::effect::{Effect, UpdateContext};
use crate::error::{ChannelDirection, GraphError};
use crate::param::ParamMap;
use crate::signal::Signal;
use crate::timing::TimingStats;

use super::connection::{Connection, ConnectionId};
use super::node::{Node, NodeId};
use super::router::TickBuffers;
use super::schedule::topological_order;

/// A dataflow graph of effects.
///
/// # Usage
///
/// 1. Add nodes with [`add_node()`](Self::add_node)
/// 2. Wire channels with [`add_connection()`](Self::add_connection)
/// 3. Drive it with [`update()`](Self::update) then [`process()`](Self::process),
///    or both at once with [`tick()`](Self::tick)
pub struct FilterGraph {
    nodes: BTreeMap<NodeId, Node>,
    connections: BTreeMap<ConnectionId, Connection>,
    /// `(node, input channel)` → the single connection bound there.
    bindings: BTreeMap<(NodeId, usize), ConnectionId>,
    next_node_id: u64,
    next_connection_id: u64,
    order: Option<Arc<[NodeId]>>,
    order_generation: u64,
    buffers: TickBuffers,
    time: f64,
    ticks: u64,
    record_timings: bool,
}

impl Default for FilterGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterGraph {
    /// Largest id accepted by the `insert_*_with_id` methods.
    ///
    /// Ids up to 2^53 - 1 survive a round trip through any JSON reader, and
    /// capping explicit ids keeps both id counters far from `u64::MAX`.
    pub const MAX_ID: u64 = (1 << 53) - 1;

    /// Creates an empty graph with timing recording disabled.
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            connections: BTreeMap::new(),
            bindings: BTreeMap::new(),
            next_node_id: 0,
            next_connection_id: 0,
            order: None,
            order_generation: 0,
            buffers: TickBuffers::default(),
            time: 0.0,
            ticks: 0,
            record_timings: false,
        }
    }

    // --- Node mutations ---

    /// Adds a node wrapping `effect` and returns its fresh id.
    pub fn add_node(&mut self, effect: Box<dyn Effect>) -> NodeId {
        let id = NodeId(self.next_node_id);
        // Explicit ids are capped at MAX_ID, so the counter starts at most at
        // 2^53 and cannot reach u64::MAX.
        self.next_node_id += 1;
        self.insert_node(id, effect);
        id
    }

    /// Adds a node under an explicit id, as when restoring a snapshot.
    ///
    /// Later [`add_node()`](Self::add_node) calls never hand out an id at or
    /// below the largest id inserted this way. Ids above [`MAX_ID`](Self::MAX_ID)
    /// are rejected.
    pub fn insert_node_with_id(&mut self, id: NodeId, effect: Box<dyn Effect>) -> Result<NodeId, GraphError> {
        check_explicit_id(id.0)?;
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNodeId(id));
        }
        self.next_node_id = self.next_node_id.max(id.0 + 1);
        self.insert_node(id, effect);
        Ok(id)
    }

    fn insert_node(&mut self, id: NodeId, effect: Box<dyn Effect>) {
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: {} node {id}", effect.type_name());
        self.nodes.insert(id, Node::new(id, effect));
        self.invalidate_order();
    }

    /// Removes a node and every connection touching it.
    ///
    /// Returns the removed effect.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Box<dyn Effect>, GraphError> {
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }

        // Collect connection IDs to remove (avoid borrow conflict).
        let incident: Vec<ConnectionId> = self.incident_connections(id);
        for conn_id in incident {
            self.remove_connection_internal(conn_id);
        }

        let node = self.nodes.remove(&id).ok_or(GraphError::NodeNotFound(id))?;
        self.buffers.forget(id);
        self.invalidate_order();
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_remove: node {id}");
        Ok(node.effect)
    }

    /// Looks up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Mutable access to a node's effect.
    pub fn node_effect_mut(&mut self, id: NodeId) -> Option<&mut dyn Effect> {
        Some(self.nodes.get_mut(&id)?.effect.as_mut())
    }

    /// Applies tunable parameter values to a node's effect.
    pub fn update_node_parameters(&mut self, id: NodeId, values: &ParamMap) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        node.effect
            .apply_parameters(values)
            .map_err(|source| GraphError::InvalidParameters { node: id, source })?;
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_params: node {id} ({} values)", values.len());
        Ok(())
    }

    /// Iterates over nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // --- Connection mutations ---

    /// Connects output `from_channel` of `from` to input `to_channel` of `to`.
    ///
    /// Returns the new connection's ID, or an error if:
    /// - Either node doesn't exist
    /// - Either channel index is outside the endpoint's declared range
    /// - The input channel is already bound
    /// - The edge would create a cycle
    pub fn add_connection(
        &mut self,
        from: NodeId,
        from_channel: usize,
        to: NodeId,
        to_channel: usize,
    ) -> Result<ConnectionId, GraphError> {
        self.validate_connection(from, from_channel, to, to_channel)?;
        let id = ConnectionId(self.next_connection_id);
        // Bounded like the node counter.
        self.next_connection_id += 1;
        self.insert_connection(Connection {
            id,
            from,
            from_channel,
            to,
            to_channel,
        });
        Ok(id)
    }

    /// Adds a connection under an explicit id, as when restoring a snapshot.
    pub fn insert_connection_with_id(
        &mut self,
        id: ConnectionId,
        from: NodeId,
        from_channel: usize,
        to: NodeId,
        to_channel: usize,
    ) -> Result<ConnectionId, GraphError> {
        check_explicit_id(id.0)?;
        if self.connections.contains_key(&id) {
            return Err(GraphError::DuplicateConnectionId(id));
        }
        self.validate_connection(from, from_channel, to, to_channel)?;
        self.next_connection_id = self.next_connection_id.max(id.0 + 1);
        self.insert_connection(Connection {
            id,
            from,
            from_channel,
            to,
            to_channel,
        });
        Ok(id)
    }

    fn insert_connection(&mut self, conn: Connection) {
        self.bindings.insert((conn.to, conn.to_channel), conn.id);
        self.connections.insert(conn.id, conn);
        self.invalidate_order();
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_connect: {}.{} → {}.{}",
            conn.from,
            conn.from_channel,
            conn.to,
            conn.to_channel
        );
    }

    /// Removes a connection and returns it.
    pub fn remove_connection(&mut self, id: ConnectionId) -> Result<Connection, GraphError> {
        if !self.connections.contains_key(&id) {
            return Err(GraphError::ConnectionNotFound(id));
        }
        let conn = self
            .remove_connection_internal(id)
            .ok_or(GraphError::ConnectionNotFound(id))?;
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_disconnect: {id}");
        Ok(conn)
    }

    /// Looks up a connection.
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Iterates over connections in id order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Number of connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// IDs of every connection with `node` as an endpoint, in id order.
    pub fn incident_connections(&self, node: NodeId) -> Vec<ConnectionId> {
        self.connections
            .values()
            .filter(|c| c.touches(node))
            .map(|c| c.id)
            .collect()
    }

    /// The connection bound to input `channel` of `node`, if any.
    pub fn input_binding(&self, node: NodeId, channel: usize) -> Option<ConnectionId> {
        self.bindings.get(&(node, channel)).copied()
    }

    /// Removes every node and connection. Ids are not reused afterwards.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
        self.bindings.clear();
        self.buffers.clear();
        self.invalidate_order();
    }

    // --- Scheduling ---

    /// The cached execution order, recomputed first if the topology changed.
    pub fn execution_order(&mut self) -> Result<Arc<[NodeId]>, GraphError> {
        if let Some(order) = &self.order {
            return Ok(Arc::clone(order));
        }
        let order: Arc<[NodeId]> = topological_order(self.nodes.keys().copied(), &self.connections)?.into();
        self.order = Some(Arc::clone(&order));
        self.order_generation += 1;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_schedule: generation {} over {} nodes",
            self.order_generation,
            order.len()
        );
        Ok(order)
    }

    /// How many times the execution order has been computed.
    pub fn order_generation(&self) -> u64 {
        self.order_generation
    }

    fn invalidate_order(&mut self) {
        self.order = None;
    }

    // --- Execution ---

    /// Advances the graph clock by `dt` seconds and runs every node's
    /// time-based update.
    ///
    /// Non-finite or negative `dt` advances by zero; the clock never runs
    /// backwards.
    pub fn update(&mut self, dt: f64) {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.time += dt;
        self.ticks += 1;
        let ctx = UpdateContext {
            time: self.time,
            dt,
            tick: self.ticks,
        };
        for node in self.nodes.values_mut() {
            node.effect.advance_time(&ctx);
        }
    }

    /// Runs every node once in execution order.
    ///
    /// A node whose effect fails has all of its outputs absent for this tick;
    /// the failure is recorded in its [`TimingStats`] and processing continues.
    pub fn process(&mut self) -> Result<(), GraphError> {
        let order = self.execution_order()?;
        self.buffers.clear();

        for id in order.iter() {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            let inputs = self.buffers.resolve_inputs(
                *id,
                node.effect.num_inputs(),
                &self.bindings,
                &self.connections,
            );
            let mut outputs: Vec<Option<Signal>> = vec![None; node.effect.num_outputs()];

            let started = self.record_timings.then(Instant::now);
            let result = node.effect.process(&inputs, &mut outputs);
            if let Some(started) = started {
                node.timing.record(started.elapsed());
            }

            if let Err(err) = result {
                outputs.fill(None);
                #[cfg(feature = "tracing")]
                tracing::warn!("node {id} ({}) failed: {err}", node.effect.type_name());
                node.timing.record_failure(err.to_string());
            }

            self.buffers.record(*id, inputs, outputs);
        }
        Ok(())
    }

    /// One full tick: [`update(dt)`](Self::update) then [`process()`](Self::process).
    pub fn tick(&mut self, dt: f64) -> Result<(), GraphError> {
        self.update(dt);
        self.process()
    }

    /// Graph clock in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of update passes run.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    // --- Diagnostics ---

    /// Enables or disables per-node timing measurement.
    pub fn set_record_timings(&mut self, enabled: bool) {
        self.record_timings = enabled;
    }

    /// Whether per-node timing measurement is enabled.
    pub fn record_timings(&self) -> bool {
        self.record_timings
    }

    /// Timing record of a node.
    pub fn timings(&self, id: NodeId) -> Option<&TimingStats> {
        self.nodes.get(&id).map(|n| &n.timing)
    }

    /// Output `channel` of `node` from the most recent tick.
    pub fn output_of(&self, node: NodeId, channel: usize) -> Option<&Signal> {
        self.buffers.output(node, channel)
    }

    /// Inputs `node` received in the most recent tick.
    pub fn last_inputs(&self, node: NodeId) -> Option<&[Option<Signal>]> {
        self.buffers.inputs(node)
    }

    // --- Internal helpers ---

    fn get_node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    /// DFS reachability check: can `from` reach `to` via existing connections?
    fn can_reach(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = std::collections::BTreeSet::new();
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.extend(
                self.connections
                    .values()
                    .filter(|c| c.from == current)
                    .map(|c| c.to),
            );
        }
        false
    }

    /// Validates a prospective connection without changing anything.
    fn validate_connection(
        &self,
        from: NodeId,
        from_channel: usize,
        to: NodeId,
        to_channel: usize,
    ) -> Result<(), GraphError> {
        let from_node = self.get_node(from)?;
        let to_node = self.get_node(to)?;

        let outputs = from_node.num_outputs();
        if from_channel >= outputs {
            return Err(GraphError::ChannelOutOfRange {
                node: from,
                channel: from_channel,
                available: outputs,
                direction: ChannelDirection::Output,
            });
        }
        let inputs = to_node.num_inputs();
        if to_channel >= inputs {
            return Err(GraphError::ChannelOutOfRange {
                node: to,
                channel: to_channel,
                available: inputs,
                direction: ChannelDirection::Input,
            });
        }

        if let Some(&existing) = self.bindings.get(&(to, to_channel)) {
            return Err(GraphError::InputAlreadyBound {
                node: to,
                channel: to_channel,
                existing,
            });
        }

        // A cycle exists if `to` can already reach `from` via existing edges.
        if self.can_reach(to, from) {
            return Err(GraphError::CycleDetected { from, to });
        }

        Ok(())
    }

    /// Removes a connection without error checking.
    fn remove_connection_internal(&mut self, id: ConnectionId) -> Option<Connection> {
        let conn = self.connections.remove(&id)?;
        self.bindings.remove(&(conn.to, conn.to_channel));
        self.invalidate_order();
        Some(conn)
    }
}

impl std::fmt::Debug for FilterGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterGraph")
            .field("nodes", &self.nodes.len())
            .field("connections", &self.connections.len())
            .field("time", &self.time)
            .field("ticks", &self.ticks)
            .finish()
    }
}

fn check_explicit_id(id: u64) -> Result<(), GraphError> {
    if id > FilterGraph::MAX_ID {
        return Err(GraphError::IdOutOfRange {
            id,
            max: FilterGraph::MAX_ID,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ParamError, ProcessError};
    use crate::param::{ParamDescriptor, ParamLookup, ParamValue, param_map, validate_partial};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Emits `Scalar(base + channel)` on each output, bumping `base` per tick.
    struct Source {
        outputs: usize,
        base: f32,
    }

    impl Effect for Source {
        fn type_name(&self) -> &'static str {
            "test.Source"
        }
        fn num_inputs(&self) -> usize {
            0
        }
        fn num_outputs(&self) -> usize {
            self.outputs
        }
        fn process(&mut self, _: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
            self.base += 10.0;
            for (i, out) in outputs.iter_mut().enumerate() {
                *out = Some(Signal::Scalar(self.base + i as f32));
            }
            Ok(())
        }
    }

    /// Sums present scalar inputs onto every output.
    struct Sum {
        inputs: usize,
        outputs: usize,
    }

    impl Effect for Sum {
        fn type_name(&self) -> &'static str {
            "test.Sum"
        }
        fn num_inputs(&self) -> usize {
            self.inputs
        }
        fn num_outputs(&self) -> usize {
            self.outputs
        }
        fn process(&mut self, inputs: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
            let total: f32 = inputs.iter().flatten().filter_map(Signal::as_scalar).sum();
            for out in outputs.iter_mut() {
                *out = Some(Signal::Scalar(total));
            }
            Ok(())
        }
    }

    /// Always fails.
    struct Broken;

    impl Effect for Broken {
        fn type_name(&self) -> &'static str {
            "test.Broken"
        }
        fn num_inputs(&self) -> usize {
            1
        }
        fn num_outputs(&self) -> usize {
            1
        }
        fn process(&mut self, _: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
            outputs[0] = Some(Signal::Scalar(99.0));
            Err(ProcessError::Failed("broken on purpose".into()))
        }
    }

    /// Counts `advance_time` calls and remembers the last clock.
    struct Clocked {
        calls: Arc<AtomicUsize>,
        last_time: f64,
        gain: f64,
    }

    impl Effect for Clocked {
        fn type_name(&self) -> &'static str {
            "test.Clocked"
        }
        fn num_inputs(&self) -> usize {
            0
        }
        fn num_outputs(&self) -> usize {
            1
        }
        fn parameter_schema(&self) -> Vec<ParamDescriptor> {
            vec![ParamDescriptor::float("gain", 1.0, 0.0, 2.0, 0.1)]
        }
        fn parameter_values(&self) -> ParamMap {
            param_map([("gain", ParamValue::Float(self.gain))])
        }
        fn apply_parameters(&mut self, values: &ParamMap) -> Result<(), ParamError> {
            let values = validate_partial(&self.parameter_schema(), values)?;
            self.gain = values.f64_or("gain", self.gain);
            Ok(())
        }
        fn advance_time(&mut self, ctx: &UpdateContext) {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.last_time = ctx.time;
        }
        fn process(&mut self, _: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
            outputs[0] = Some(Signal::Scalar((self.last_time * self.gain) as f32));
            Ok(())
        }
    }

    fn source(outputs: usize) -> Box<dyn Effect> {
        Box::new(Source { outputs, base: 0.0 })
    }

    fn sum(inputs: usize, outputs: usize) -> Box<dyn Effect> {
        Box::new(Sum { inputs, outputs })
    }

    fn connection_ids(graph: &FilterGraph) -> Vec<ConnectionId> {
        graph.connections().map(|c| c.id).collect()
    }

    #[test]
    fn test_add_node_ids_are_sequential() {
        let mut graph = FilterGraph::new();
        let a = graph.add_node(source(1));
        let b = graph.add_node(source(1));
        assert_eq!(a.raw() + 1, b.raw());
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_ids_not_reused_after_removal() {
        let mut graph = FilterGraph::new();
        let a = graph.add_node(source(1));
        graph.remove_node(a).unwrap();
        let b = graph.add_node(source(1));
        assert_ne!(a, b);
    }

    #[test]
    fn test_insert_with_id_advances_counter() {
        let mut graph = FilterGraph::new();
        graph.insert_node_with_id(NodeId(41), source(1)).unwrap();
        let next = graph.add_node(source(1));
        assert_eq!(next, NodeId(42));
        let dup = graph.insert_node_with_id(NodeId(41), source(1));
        assert!(matches!(dup, Err(GraphError::DuplicateNodeId(_))));
    }

    #[test]
    fn test_explicit_ids_above_max_rejected() {
        let mut graph = FilterGraph::new();
        let err = graph.insert_node_with_id(NodeId(u64::MAX), source(1)).unwrap_err();
        assert!(matches!(err, GraphError::IdOutOfRange { id: u64::MAX, .. }));
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(graph.node_count(), 0);

        let a = graph.insert_node_with_id(NodeId(FilterGraph::MAX_ID), source(1)).unwrap();
        let b = graph.add_node(sum(1, 1));
        assert_eq!(b.raw(), FilterGraph::MAX_ID + 1);

        let err = graph
            .insert_connection_with_id(ConnectionId(FilterGraph::MAX_ID + 1), a, 0, b, 0)
            .unwrap_err();
        assert!(matches!(err, GraphError::IdOutOfRange { .. }));
        assert_eq!(graph.connection_count(), 0);
        let c = graph.insert_connection_with_id(ConnectionId(7), a, 0, b, 0).unwrap();
        assert_eq!(graph.connection(c).unwrap().to, b);
    }

    #[test]
    fn test_channel_out_of_range() {
        let mut graph = FilterGraph::new();
        let a = graph.add_node(source(1));
        let b = graph.add_node(sum(1, 1));

        let err = graph.add_connection(a, 1, b, 0).unwrap_err();
        assert!(matches!(
            err,
            GraphError::ChannelOutOfRange { direction: ChannelDirection::Output, .. }
        ));
        let err = graph.add_connection(a, 0, b, 1).unwrap_err();
        assert!(matches!(
            err,
            GraphError::ChannelOutOfRange { direction: ChannelDirection::Input, .. }
        ));
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_input_already_bound() {
        let mut graph = FilterGraph::new();
        let a = graph.add_node(source(2));
        let b = graph.add_node(sum(1, 1));

        let first = graph.add_connection(a, 0, b, 0).unwrap();
        let err = graph.add_connection(a, 1, b, 0).unwrap_err();
        assert!(matches!(err, GraphError::InputAlreadyBound { existing, .. } if existing == first));
        assert_eq!(err.kind(), ErrorKind::Topology);
        assert_eq!(graph.connection(first).unwrap().from_channel, 0);
        assert_eq!(connection_ids(&graph), vec![first]);
    }

    #[test]
    fn test_cycle_detection_direct() {
        let mut graph = FilterGraph::new();
        let a = graph.add_node(sum(1, 1));
        let b = graph.add_node(sum(1, 1));

        graph.add_connection(a, 0, b, 0).unwrap();
        let result = graph.add_connection(b, 0, a, 0);
        assert!(matches!(result, Err(GraphError::CycleDetected { .. })));
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut graph = FilterGraph::new();
        let a = graph.add_node(sum(1, 1));
        let result = graph.add_connection(a, 0, a, 0);
        assert!(matches!(result, Err(GraphError::CycleDetected { .. })));
    }

    #[test]
    fn test_cycle_detection_indirect_leaves_graph_unchanged() {
        let mut graph = FilterGraph::new();
        let a = graph.add_node(sum(1, 1));
        let b = graph.add_node(sum(1, 1));
        let c = graph.add_node(sum(1, 1));

        graph.add_connection(a, 0, b, 0).unwrap();
        graph.add_connection(b, 0, c, 0).unwrap();
        let before = connection_ids(&graph);
        let order_before = graph.execution_order().unwrap();
        let generation = graph.order_generation();

        let result = graph.add_connection(c, 0, a, 0);
        assert!(matches!(result, Err(GraphError::CycleDetected { .. })));
        assert_eq!(connection_ids(&graph), before);
        assert!(graph.input_binding(a, 0).is_none());
        // Cached order survives a rejected mutation.
        assert_eq!(graph.execution_order().unwrap(), order_before);
        assert_eq!(graph.order_generation(), generation);
    }

    #[test]
    fn test_missing_endpoint() {
        let mut graph = FilterGraph::new();
        let a = graph.add_node(source(1));
        let result = graph.add_connection(a, 0, NodeId(99), 0);
        assert!(matches!(result, Err(GraphError::NodeNotFound(id)) if id == NodeId(99)));
    }

    #[test]
    fn test_remove_node_removes_incident_connections_only() {
        let mut graph = FilterGraph::new();
        let a = graph.add_node(source(2));
        let b = graph.add_node(sum(2, 1));
        let c = graph.add_node(sum(1, 1));
        let d = graph.add_node(sum(1, 1));

        graph.add_connection(a, 0, b, 0).unwrap();
        graph.add_connection(a, 1, b, 1).unwrap();
        graph.add_connection(b, 0, c, 0).unwrap();
        let keep = graph.add_connection(a, 0, d, 0).unwrap();

        graph.remove_node(b).unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(connection_ids(&graph), vec![keep]);
        assert!(graph.input_binding(c, 0).is_none());
    }

    #[test]
    fn test_remove_nonexistent_node() {
        let mut graph = FilterGraph::new();
        graph.add_node(source(1));
        let result = graph.remove_node(NodeId(999));
        assert!(matches!(result, Err(GraphError::NodeNotFound(_))));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_remove_connection() {
        let mut graph = FilterGraph::new();
        let a = graph.add_node(source(1));
        let b = graph.add_node(sum(1, 1));

        let id = graph.add_connection(a, 0, b, 0).unwrap();
        let removed = graph.remove_connection(id).unwrap();
        assert_eq!(removed.to, b);
        assert_eq!(graph.connection_count(), 0);
        assert!(graph.input_binding(b, 0).is_none());

        let again = graph.remove_connection(id);
        assert!(matches!(again, Err(GraphError::ConnectionNotFound(_))));
        // The freed input can be bound again.
        graph.add_connection(a, 0, b, 0).unwrap();
    }

    #[test]
    fn test_order_cached_until_topology_changes() {
        let mut graph = FilterGraph::new();
        let a = graph.add_node(source(1));
        let b = graph.add_node(sum(1, 1));
        graph.add_connection(a, 0, b, 0).unwrap();

        graph.tick(0.016).unwrap();
        graph.tick(0.016).unwrap();
        assert_eq!(graph.order_generation(), 1);

        graph.update_node_parameters(b, &ParamMap::new()).unwrap();
        graph.tick(0.016).unwrap();
        assert_eq!(graph.order_generation(), 1);

        graph.add_node(sum(1, 1));
        graph.tick(0.016).unwrap();
        assert_eq!(graph.order_generation(), 2);
    }

    #[test]
    fn test_creation_order_breaks_ties() {
        let mut graph = FilterGraph::new();
        let sink = graph.add_node(sum(1, 0));
        let src = graph.add_node(source(1));
        let other = graph.add_node(source(1));
        graph.add_connection(src, 0, sink, 0).unwrap();

        let order = graph.execution_order().unwrap();
        assert_eq!(&*order, &[src, other, sink]);
    }

    #[test]
    fn test_failing_node_goes_dark() {
        let mut graph = FilterGraph::new();
        let a = graph.add_node(source(1));
        let broken = graph.add_node(Box::new(Broken));
        let after = graph.add_node(sum(1, 1));
        let parallel = graph.add_node(sum(1, 1));
        graph.add_connection(a, 0, broken, 0).unwrap();
        graph.add_connection(broken, 0, after, 0).unwrap();
        graph.add_connection(a, 0, parallel, 0).unwrap();

        graph.tick(0.016).unwrap();

        assert!(graph.output_of(broken, 0).is_none());
        assert_eq!(graph.last_inputs(after).unwrap(), &[None]);
        assert_eq!(graph.output_of(after, 0), Some(&Signal::Scalar(0.0)));
        assert_eq!(graph.output_of(parallel, 0), Some(&Signal::Scalar(10.0)));

        graph.tick(0.016).unwrap();
        let timing = graph.timings(broken).unwrap();
        assert_eq!(timing.failures(), 2);
        assert_eq!(timing.last_error(), Some("broken on purpose"));
    }

    #[test]
    fn test_update_advances_clock_and_calls_every_node() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut graph = FilterGraph::new();
        let a = graph.add_node(Box::new(Clocked {
            calls: Arc::clone(&calls),
            last_time: 0.0,
            gain: 1.0,
        }));
        graph.add_node(Box::new(Clocked {
            calls: Arc::clone(&calls),
            last_time: 0.0,
            gain: 1.0,
        }));

        graph.update(0.5);
        graph.update(-1.0);
        graph.update(f64::NAN);
        graph.update(0.25);
        graph.process().unwrap();

        assert_eq!(calls.load(Ordering::Relaxed), 8);
        assert_eq!(graph.time(), 0.75);
        assert_eq!(graph.tick_count(), 4);
        assert_eq!(graph.output_of(a, 0), Some(&Signal::Scalar(0.75)));
    }

    #[test]
    fn test_update_node_parameters() {
        let mut graph = FilterGraph::new();
        let a = graph.add_node(Box::new(Clocked {
            calls: Arc::new(AtomicUsize::new(0)),
            last_time: 0.0,
            gain: 1.0,
        }));

        graph
            .update_node_parameters(a, &param_map([("gain", ParamValue::Float(1.5))]))
            .unwrap();
        let values = graph.node(a).unwrap().effect().parameter_values();
        assert_eq!(values["gain"], ParamValue::Float(1.5));

        let err = graph
            .update_node_parameters(a, &param_map([("gain", ParamValue::Float(0.5)), ("nope", ParamValue::Int(1))]))
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidParameters { .. }));
        let values = graph.node(a).unwrap().effect().parameter_values();
        assert_eq!(values["gain"], ParamValue::Float(1.5));

        let missing = graph.update_node_parameters(NodeId(77), &ParamMap::new());
        assert!(matches!(missing, Err(GraphError::NodeNotFound(_))));
    }

    #[test]
    fn test_timings_only_when_enabled() {
        let mut graph = FilterGraph::new();
        let a = graph.add_node(source(1));
        graph.tick(0.016).unwrap();
        assert_eq!(graph.timings(a).unwrap().samples(), 0);

        graph.set_record_timings(true);
        graph.tick(0.016).unwrap();
        graph.tick(0.016).unwrap();
        let timing = graph.timings(a).unwrap();
        assert_eq!(timing.samples(), 2);
        assert!(timing.last().is_some());
        assert!(timing.average().is_some());
    }

    #[test]
    fn test_clear() {
        let mut graph = FilterGraph::new();
        let a = graph.add_node(source(1));
        let b = graph.add_node(sum(1, 1));
        graph.add_connection(a, 0, b, 0).unwrap();
        graph.tick(0.016).unwrap();

        graph.clear();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.connection_count(), 0);
        assert!(graph.output_of(a, 0).is_none());
        assert!(graph.add_node(source(1)).raw() > b.raw());
    }
}
