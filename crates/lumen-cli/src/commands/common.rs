//! Helpers shared by several commands.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use std::path::{Path, PathBuf};

use lumen_config::{EngineConfig, find_graph, paths};
use lumen_core::{ParamDescriptor, ParamKind};
use lumen_engine::NodeTiming;
use lumen_registry::EffectCategory;

/// Resolves a snapshot argument: an existing file, or a graph saved under the
/// user graphs directory.
pub fn resolve_graph(name: &str) -> anyhow::Result<PathBuf> {
    find_graph(name).ok_or_else(|| {
        anyhow::anyhow!(
            "Graph not found: '{}' (looked in current directory and {})",
            name,
            paths::user_graphs_dir().display()
        )
    })
}

/// Loads the engine configuration: the given file, else the user config file
/// if present, else defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    if let Some(path) = path {
        return Ok(EngineConfig::load(path)?);
    }
    let default_file = paths::default_config_file();
    if default_file.is_file() {
        tracing::debug!(path = %default_file.display(), "using user config");
        return Ok(EngineConfig::load(default_file)?);
    }
    Ok(EngineConfig::default())
}

/// clap value parser for `--category`.
pub fn parse_category(s: &str) -> Result<EffectCategory, String> {
    EffectCategory::parse(s).ok_or_else(|| {
        let names: Vec<&str> = EffectCategory::ALL.iter().map(EffectCategory::name).collect();
        format!("unknown category '{}' (expected one of: {})", s, names.join(", "))
    })
}

/// Range or option list of a parameter, with its unit.
pub fn describe_kind(param: &ParamDescriptor) -> String {
    let unit = param.unit.suffix();
    match &param.kind {
        ParamKind::Float { min, max, .. } => format!("{min}..{max}{unit}"),
        ParamKind::Int { min, max, .. } => format!("{min}..{max}{unit}"),
        ParamKind::Bool => "bool".to_string(),
        ParamKind::Choice { options } => options.join("|"),
        ParamKind::Text => "text".to_string(),
    }
}

/// Prints a parameter table under `title`, or "(none)".
pub fn print_params(title: &str, params: &[ParamDescriptor]) {
    println!("{title}:");
    if params.is_empty() {
        println!("  (none)");
        return;
    }
    println!("  {:20}  {:28}  {:12}  {}", "Name", "Range", "Default", "Description");
    println!("  {:20}  {:28}  {:12}  {}", "----", "-----", "-------", "-----------");
    for param in params {
        println!(
            "  {:20}  {:28}  {:12}  {}",
            param.name,
            describe_kind(param),
            param.default.to_string(),
            param.description
        );
    }
}

/// Prints per-node timing statistics.
pub fn print_timings(timings: &[NodeTiming]) {
    println!(
        "  {:>5}  {:28}  {:>10}  {:>10}  {:>8}  {:>8}",
        "Node", "Type", "Last us", "Avg us", "Samples", "Failures"
    );
    for t in timings {
        let last = t.last_us.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"));
        let avg = t.average_us.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"));
        println!(
            "  {:>5}  {:28}  {:>10}  {:>10}  {:>8}  {:>8}",
            t.uid, t.type_name, last, avg, t.samples, t.failures
        );
        if let Some(err) = &t.last_error {
            println!("         last error: {err}");
        }
    }
}
