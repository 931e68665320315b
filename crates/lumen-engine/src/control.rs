//! Control-plane operations.
//!
//! [`ControlPlane`] is the surface a remote transport (HTTP, OSC, a UI)
//! calls to inspect and edit the running graph. Each operation takes the
//! graph lock once, so it is atomic with respect to ticks. Results are plain
//! serializable records; failures are [`ControlError`]s with the graph left
//! unchanged.

use std::sync::Arc;

use lumen_config::snapshot;
use lumen_core::{Connection, ConnectionId, FilterGraph, Node, NodeId, ParamDescriptor, ParamMap, ParamValue};
use lumen_registry::{EffectCategory, EffectDescriptor, EffectRegistry};
use serde::Serialize;

use crate::error::ControlError;
use crate::shared::SharedGraph;

/// One tunable parameter with its current value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterInfo {
    /// Schema entry.
    #[serde(flatten)]
    pub descriptor: ParamDescriptor,
    /// Current value, if the effect reports one.
    pub value: Option<ParamValue>,
}

/// A node as seen by control-plane callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    /// Node id.
    pub uid: u64,
    /// Registry type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Input channel count.
    pub num_inputs: usize,
    /// Output channel count.
    pub num_outputs: usize,
    /// Construction arguments.
    pub constructor_params: ParamMap,
    /// Tunable parameters with schema and current value.
    pub parameters: Vec<ParameterInfo>,
}

impl NodeInfo {
    fn from_node(node: &Node) -> Self {
        let effect = node.effect();
        let values = effect.parameter_values();
        let parameters = effect
            .parameter_schema()
            .into_iter()
            .map(|descriptor| ParameterInfo {
                value: values.get(&*descriptor.name).cloned(),
                descriptor,
            })
            .collect();
        Self {
            uid: node.id().raw(),
            type_name: node.type_name().to_owned(),
            num_inputs: node.num_inputs(),
            num_outputs: node.num_outputs(),
            constructor_params: effect.constructor_params(),
            parameters,
        }
    }
}

/// A connection as seen by control-plane callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    /// Connection id.
    pub uid: u64,
    /// Source node id.
    pub from_uid: u64,
    /// Source output channel.
    pub from_channel: usize,
    /// Destination node id.
    pub to_uid: u64,
    /// Destination input channel.
    pub to_channel: usize,
}

impl From<&Connection> for ConnectionInfo {
    fn from(c: &Connection) -> Self {
        Self {
            uid: c.id.raw(),
            from_uid: c.from.raw(),
            from_channel: c.from_channel,
            to_uid: c.to.raw(),
            to_channel: c.to_channel,
        }
    }
}

/// An effect type available for [`ControlPlane::create_node`].
#[derive(Debug, Clone, Serialize)]
pub struct EffectTypeInfo {
    /// Registry metadata.
    #[serde(flatten)]
    pub descriptor: EffectDescriptor,
}

/// Processing time record of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTiming {
    /// Node id.
    pub uid: u64,
    /// Registry type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Most recent processing time in microseconds.
    pub last_us: Option<f64>,
    /// Rolling average processing time in microseconds.
    pub average_us: Option<f64>,
    /// Measurements taken.
    pub samples: u64,
    /// Ticks on which the node failed.
    pub failures: u64,
    /// Most recent failure message.
    pub last_error: Option<String>,
}

impl NodeTiming {
    fn from_node(node: &Node) -> Self {
        let timing = node.timing();
        let micros = |d: std::time::Duration| d.as_secs_f64() * 1e6;
        Self {
            uid: node.id().raw(),
            type_name: node.type_name().to_owned(),
            last_us: timing.last().map(micros),
            average_us: timing.average().map(micros),
            samples: timing.samples(),
            failures: timing.failures(),
            last_error: timing.last_error().map(str::to_owned),
        }
    }
}

/// Cloneable handle exposing graph operations to a control transport.
#[derive(Clone, Debug)]
pub struct ControlPlane {
    graph: SharedGraph,
    registry: Arc<EffectRegistry>,
}

impl ControlPlane {
    /// Wraps the shared graph and the registry used by `create_node`.
    pub fn new(graph: SharedGraph, registry: Arc<EffectRegistry>) -> Self {
        Self { graph, registry }
    }

    /// The shared graph this plane edits.
    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    /// The effect registry.
    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    // --- Nodes ---

    /// All nodes in id order.
    pub fn list_nodes(&self) -> Vec<NodeInfo> {
        self.graph.lock().nodes().map(NodeInfo::from_node).collect()
    }

    /// One node.
    pub fn get_node(&self, uid: u64) -> Result<NodeInfo, ControlError> {
        let graph = self.graph.lock();
        Ok(NodeInfo::from_node(lookup(&graph, uid)?))
    }

    /// Removes a node and its connections, returning what was removed.
    pub fn delete_node(&self, uid: u64) -> Result<NodeInfo, ControlError> {
        let mut graph = self.graph.lock();
        let info = NodeInfo::from_node(lookup(&graph, uid)?);
        graph.remove_node(NodeId::from_raw(uid))?;
        tracing::info!(uid, type_name = %info.type_name, "node deleted");
        Ok(info)
    }

    /// Applies tunable values to a node; all or nothing.
    pub fn update_node_parameters(&self, uid: u64, values: &ParamMap) -> Result<NodeInfo, ControlError> {
        let mut graph = self.graph.lock();
        let id = NodeId::from_raw(uid);
        graph.update_node_parameters(id, values)?;
        Ok(NodeInfo::from_node(lookup(&graph, uid)?))
    }

    /// Builds an effect through the registry and adds it as a new node.
    pub fn create_node(&self, type_name: &str, constructor_params: &ParamMap) -> Result<NodeInfo, ControlError> {
        // construct outside the lock; sources may open files
        let effect = self.registry.create(type_name, constructor_params)?;
        let mut graph = self.graph.lock();
        let id = graph.add_node(effect);
        tracing::info!(uid = id.raw(), type_name, "node created");
        Ok(NodeInfo::from_node(lookup(&graph, id.raw())?))
    }

    // --- Connections ---

    /// All connections in id order.
    pub fn list_connections(&self) -> Vec<ConnectionInfo> {
        self.graph.lock().connections().map(ConnectionInfo::from).collect()
    }

    /// Connects `from_uid.from_channel` to `to_uid.to_channel`.
    pub fn create_connection(
        &self,
        from_uid: u64,
        from_channel: usize,
        to_uid: u64,
        to_channel: usize,
    ) -> Result<ConnectionInfo, ControlError> {
        let mut graph = self.graph.lock();
        let id = graph.add_connection(
            NodeId::from_raw(from_uid),
            from_channel,
            NodeId::from_raw(to_uid),
            to_channel,
        )?;
        Ok(ConnectionInfo {
            uid: id.raw(),
            from_uid,
            from_channel,
            to_uid,
            to_channel,
        })
    }

    /// Removes a connection, returning it.
    pub fn delete_connection(&self, uid: u64) -> Result<ConnectionInfo, ControlError> {
        let removed = self.graph.lock().remove_connection(ConnectionId::from_raw(uid))?;
        Ok(ConnectionInfo::from(&removed))
    }

    // --- Effect types ---

    /// Every registered effect type.
    pub fn list_effect_types(&self) -> Vec<EffectTypeInfo> {
        self.registry
            .all_effects()
            .into_iter()
            .map(|d| EffectTypeInfo { descriptor: d.clone() })
            .collect()
    }

    /// Effect types in one category.
    pub fn list_effect_types_in(&self, category: EffectCategory) -> Vec<EffectTypeInfo> {
        self.registry
            .effects_in_category(category)
            .into_iter()
            .map(|d| EffectTypeInfo { descriptor: d.clone() })
            .collect()
    }

    /// Construction parameters accepted by `type_name`.
    pub fn get_effect_constructor_schema(&self, type_name: &str) -> Result<Vec<ParamDescriptor>, ControlError> {
        Ok(self.registry.constructor_schema(type_name)?.to_vec())
    }

    // --- Snapshots and diagnostics ---

    /// Canonical JSON snapshot of the running graph.
    pub fn save_snapshot(&self) -> Result<String, ControlError> {
        Ok(snapshot::save(&self.graph.lock())?)
    }

    /// Replaces the running graph with one restored from `text`.
    ///
    /// The new graph is built before the lock is taken; on any error the
    /// running graph is untouched. The timing flag carries over.
    pub fn load_snapshot(&self, text: &str) -> Result<(), ControlError> {
        let mut graph = snapshot::load(text, &self.registry)?;
        let mut current = self.graph.lock();
        graph.set_record_timings(current.record_timings());
        let nodes = graph.node_count();
        let old = std::mem::replace(&mut *current, graph);
        drop(current);
        drop(old);
        tracing::info!(nodes, "snapshot loaded");
        Ok(())
    }

    /// Processing time records of every node.
    pub fn node_timings(&self) -> Vec<NodeTiming> {
        self.graph.lock().nodes().map(NodeTiming::from_node).collect()
    }

    /// Node ids in the order the next tick will run them.
    pub fn execution_order(&self) -> Result<Vec<u64>, ControlError> {
        let order = self.graph.lock().execution_order()?;
        Ok(order.iter().map(|id| id.raw()).collect())
    }
}

fn lookup(graph: &FilterGraph, uid: u64) -> Result<&Node, ControlError> {
    let id = NodeId::from_raw(uid);
    graph
        .node(id)
        .ok_or(ControlError::Graph(lumen_core::GraphError::NodeNotFound(id)))
}
