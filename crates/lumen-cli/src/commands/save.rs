//! Save a factory preset as a snapshot file.

use std::path::PathBuf;

use clap::Args;
use lumen_config::{OutputTarget, build_preset, paths, snapshot};
use lumen_effects::DeviceKind;
use lumen_registry::EffectRegistry;

#[derive(Args)]
pub struct SaveArgs {
    /// Factory preset to build
    #[arg(short, long)]
    preset: String,

    /// Output file (defaults to <preset>.json in the user graphs directory)
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Number of pixels
    #[arg(long, default_value = "300")]
    pixels: usize,

    /// Output device stored in the LED node
    #[arg(short, long, default_value = "null")]
    device: DeviceKind,
}

pub fn run(args: SaveArgs) -> anyhow::Result<()> {
    let registry = EffectRegistry::new();
    let graph = build_preset(&registry, &args.preset, args.pixels, &OutputTarget::new(args.device))?;

    let path = match args.out {
        Some(path) => path,
        None => paths::ensure_user_graphs_dir()?.join(format!("{}.json", args.preset)),
    };
    snapshot::save_to_file(&graph, &path)?;

    println!(
        "Saved preset '{}' ({} nodes, {} connections) to {}",
        args.preset,
        graph.node_count(),
        graph.connection_count(),
        path.display()
    );
    Ok(())
}
