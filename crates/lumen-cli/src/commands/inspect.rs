//! Snapshot inspection command.

use std::sync::Arc;

use clap::Args;
use lumen_config::snapshot;
use lumen_core::ParamMap;
use lumen_engine::{ControlPlane, SharedGraph};
use lumen_registry::EffectRegistry;

use super::common::resolve_graph;

#[derive(Args)]
pub struct InspectArgs {
    /// Snapshot file or saved graph name
    #[arg(value_name = "FILE")]
    file: String,

    /// Print nodes, connections and order as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let path = resolve_graph(&args.file)?;
    let registry = Arc::new(EffectRegistry::new());
    let graph = snapshot::load_from_file(&path, &registry)?;
    let control = ControlPlane::new(SharedGraph::new(graph), registry);

    let nodes = control.list_nodes();
    let connections = control.list_connections();
    let order = control.execution_order()?;

    if args.json {
        let listing = serde_json::json!({
            "nodes": nodes,
            "connections": connections,
            "executionOrder": order,
        });
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("{}", path.display());
    println!();
    println!("Nodes ({}):", nodes.len());
    for node in &nodes {
        println!(
            "  {:>4}  {:28} in {} out {}  {}",
            node.uid,
            node.type_name,
            node.num_inputs,
            node.num_outputs,
            format_params(&node.constructor_params)
        );
    }

    println!();
    println!("Connections ({}):", connections.len());
    for c in &connections {
        println!(
            "  {:>4}  {}:{} -> {}:{}",
            c.uid, c.from_uid, c.from_channel, c.to_uid, c.to_channel
        );
    }

    println!();
    let order: Vec<String> = order.iter().map(u64::to_string).collect();
    println!("Execution order: {}", order.join(" -> "));
    Ok(())
}

fn format_params(params: &ParamMap) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}
