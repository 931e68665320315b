//! Graph snapshots.
//!
//! A snapshot is a JSON document listing every node (uid, effect type,
//! construction parameters, current tunable values) and every connection
//! (uid and both endpoints):
//!
//! ```json
//! {
//!   "nodes": [
//!     { "uid": 0, "type": "colors.StaticRGBColor",
//!       "constructorParams": { "b": 236.0, "g": 150.0, "num_pixels": 300, "r": 55.0 },
//!       "parameterValues": { "b": 236.0, "g": 150.0, "r": 55.0 } }
//!   ],
//!   "connections": [
//!     { "uid": 0, "fromUid": 0, "fromChannel": 0, "toUid": 1, "toChannel": 0 }
//!   ]
//! }
//! ```
//!
//! Saving is canonical: nodes and connections are sorted by uid and every
//! parameter map is ordered by name, so two saves of an unchanged graph are
//! byte-identical. Loading keeps the saved uids and ignores list order.
//! Effects are rebuilt from their construction parameters and then given
//! their saved tunable values; rolling histories and other runtime state
//! start fresh.

use std::collections::BTreeSet;
use std::path::Path;

use lumen_core::{ConnectionId, FilterGraph, NodeId, ParamMap};
use lumen_registry::EffectRegistry;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One saved node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    /// Node id.
    pub uid: u64,
    /// Registry type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Arguments the effect is rebuilt from.
    #[serde(default)]
    pub constructor_params: ParamMap,
    /// Tunable values applied after construction.
    #[serde(default)]
    pub parameter_values: ParamMap,
}

/// One saved connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSnapshot {
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

/// A whole saved graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Saved nodes.
    pub nodes: Vec<NodeSnapshot>,
    /// Saved connections.
    pub connections: Vec<ConnectionSnapshot>,
}

impl Snapshot {
    /// Records the topology and parameter state of `graph`.
    pub fn capture(graph: &FilterGraph) -> Self {
        let nodes = graph
            .nodes()
            .map(|node| NodeSnapshot {
                uid: node.id().raw(),
                type_name: node.type_name().to_owned(),
                constructor_params: node.effect().constructor_params(),
                parameter_values: node.effect().parameter_values(),
            })
            .collect();
        let connections = graph
            .connections()
            .map(|c| ConnectionSnapshot {
                uid: c.id.raw(),
                from_uid: c.from.raw(),
                from_channel: c.from_channel,
                to_uid: c.to.raw(),
                to_channel: c.to_channel,
            })
            .collect();
        let mut snapshot = Self { nodes, connections };
        snapshot.canonicalize();
        snapshot
    }

    /// Sorts nodes and connections by uid.
    pub fn canonicalize(&mut self) {
        self.nodes.sort_by_key(|n| n.uid);
        self.connections.sort_by_key(|c| c.uid);
    }

    /// Pretty-printed canonical JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        let mut sorted = self.clone();
        sorted.canonicalize();
        serde_json::to_string_pretty(&sorted).map_err(ConfigError::Encode)
    }

    /// Parses a snapshot document without building anything.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::from_json)
    }

    /// Builds a graph from this snapshot.
    ///
    /// Nodes are inserted in uid order, then connections in uid order. The
    /// graph is only returned once every element was accepted.
    pub fn restore(&self, registry: &EffectRegistry) -> Result<FilterGraph, ConfigError> {
        let mut nodes: Vec<&NodeSnapshot> = self.nodes.iter().collect();
        nodes.sort_by_key(|n| n.uid);
        let mut connections: Vec<&ConnectionSnapshot> = self.connections.iter().collect();
        connections.sort_by_key(|c| c.uid);

        let uids: BTreeSet<u64> = nodes.iter().map(|n| n.uid).collect();
        for c in &connections {
            for endpoint in [c.from_uid, c.to_uid] {
                if !uids.contains(&endpoint) {
                    return Err(ConfigError::DanglingConnection {
                        connection: c.uid,
                        node: endpoint,
                    });
                }
            }
        }

        let mut graph = FilterGraph::new();
        for saved in nodes {
            let context = || format!("node {} ({})", saved.uid, saved.type_name);
            let mut effect = registry
                .create(&saved.type_name, &saved.constructor_params)
                .map_err(|err| ConfigError::from_registry(err, context))?;
            effect
                .apply_parameters(&saved.parameter_values)
                .map_err(|source| ConfigError::InvalidParameter {
                    context: context(),
                    source,
                })?;
            graph.insert_node_with_id(NodeId::from_raw(saved.uid), effect)?;
        }
        for c in connections {
            graph.insert_connection_with_id(
                ConnectionId::from_raw(c.uid),
                NodeId::from_raw(c.from_uid),
                c.from_channel,
                NodeId::from_raw(c.to_uid),
                c.to_channel,
            )?;
        }

        tracing::debug!(
            nodes = graph.node_count(),
            connections = graph.connection_count(),
            "snapshot restored"
        );
        Ok(graph)
    }
}

/// Serializes `graph` to canonical JSON.
pub fn save(graph: &FilterGraph) -> Result<String, ConfigError> {
    Snapshot::capture(graph).to_json()
}

/// Builds a graph from a JSON snapshot.
///
/// # Errors
///
/// - [`ConfigError::Parse`] for malformed JSON
/// - [`ConfigError::Schema`] for missing or mistyped fields
/// - [`ConfigError::UnknownEffectType`] for type tags the registry lacks
/// - [`ConfigError::InvalidParameter`] for rejected parameters
/// - [`ConfigError::DanglingConnection`] or [`ConfigError::Graph`] for
///   topology violations
pub fn load(text: &str, registry: &EffectRegistry) -> Result<FilterGraph, ConfigError> {
    Snapshot::from_json(text)?.restore(registry)
}

/// Saves `graph` to `path`, creating parent directories as needed.
pub fn save_to_file(graph: &FilterGraph, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let text = save(graph)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
    }
    std::fs::write(path, text).map_err(|e| ConfigError::write_file(path, e))?;
    tracing::info!(path = %path.display(), "snapshot saved");
    Ok(())
}

/// Loads a graph from a snapshot file.
pub fn load_from_file(path: impl AsRef<Path>, registry: &EffectRegistry) -> Result<FilterGraph, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    load(&text, registry)
}
