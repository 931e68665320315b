//! Offline rendering: run a graph for a fixed number of ticks without pacing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use lumen_config::{OutputTarget, build_preset, snapshot};
use lumen_engine::Engine;
use lumen_registry::EffectRegistry;

use super::common::{print_timings, resolve_graph};

#[derive(Args)]
pub struct RenderArgs {
    /// Factory preset to build
    #[arg(short, long, conflicts_with = "snapshot", required_unless_present = "snapshot")]
    preset: Option<String>,

    /// Snapshot file or saved graph name
    #[arg(short, long)]
    snapshot: Option<String>,

    /// Number of ticks to run
    #[arg(short, long, default_value = "600")]
    ticks: u64,

    /// Simulated tick rate in Hz
    #[arg(long, default_value = "60")]
    fps: f64,

    /// Number of pixels for presets
    #[arg(long, default_value = "300")]
    pixels: usize,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if !(args.fps.is_finite() && args.fps > 0.0) {
        anyhow::bail!("Invalid tick rate: {} (must be > 0)", args.fps);
    }

    let registry = Arc::new(EffectRegistry::new());
    let mut graph = match (&args.snapshot, &args.preset) {
        (Some(name), _) => snapshot::load_from_file(resolve_graph(name)?, &registry)?,
        (None, Some(preset)) => build_preset(&registry, preset, args.pixels, &OutputTarget::default())?,
        (None, None) => anyhow::bail!("No graph specified. Use --preset or --snapshot"),
    };
    graph.set_record_timings(true);

    let mut engine = Engine::new(graph, registry, Duration::from_secs_f64(1.0 / args.fps));
    println!("Rendering {} ticks at {} Hz...", args.ticks, args.fps);

    let pb = ProgressBar::new(args.ticks);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let started = Instant::now();
    engine.run_offline(args.ticks, |_| pb.inc(1))?;
    pb.finish_and_clear();
    let elapsed = started.elapsed();

    let simulated = args.ticks as f64 / args.fps;
    println!(
        "Done: {:.2}s of graph time in {:.3}s ({:.1}x real time)",
        simulated,
        elapsed.as_secs_f64(),
        simulated / elapsed.as_secs_f64().max(1e-9)
    );
    println!();
    print_timings(&engine.control().node_timings());
    Ok(())
}
