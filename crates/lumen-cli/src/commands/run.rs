//! Real-time graph execution command.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Args;
use lumen_config::snapshot;
use lumen_effects::DeviceKind;
use lumen_engine::Engine;
use lumen_registry::EffectRegistry;

use super::common::{load_config, print_timings, resolve_graph};

#[derive(Args)]
pub struct RunArgs {
    /// Engine configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Factory preset to build
    #[arg(short, long, conflicts_with = "snapshot")]
    preset: Option<String>,

    /// Snapshot file or saved graph name
    #[arg(short, long)]
    snapshot: Option<String>,

    /// Number of pixels for presets
    #[arg(long)]
    pixels: Option<usize>,

    /// Output device: null, terminal or opc
    #[arg(short, long)]
    device: Option<DeviceKind>,

    /// OPC server address
    #[arg(long)]
    server: Option<String>,

    /// Tick rate in Hz
    #[arg(long)]
    fps: Option<f64>,

    /// Save the graph to this file on exit
    #[arg(long, value_name = "FILE")]
    save: Option<PathBuf>,
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(preset) = args.preset {
        config.preset = preset;
        config.snapshot = None;
    }
    if let Some(name) = &args.snapshot {
        config.snapshot = Some(resolve_graph(name)?);
    }
    if let Some(pixels) = args.pixels {
        config.num_pixels = pixels;
    }
    if let Some(device) = args.device {
        config.device = device;
    }
    if let Some(server) = args.server {
        config.opc_server = server;
    }
    if let Some(fps) = args.fps {
        config.tick_rate_hz = fps;
    }

    let registry = Arc::new(EffectRegistry::new());
    let mut engine = Engine::from_config(&config, registry)?;
    let control = engine.control();

    match &config.snapshot {
        Some(path) => println!("Running snapshot {}", path.display()),
        None => println!("Running preset '{}' on {} pixels", config.preset, config.num_pixels),
    }
    println!("  Nodes:  {}", control.list_nodes().len());
    println!("  Device: {}", config.device);
    println!("  Rate:   {:.1} Hz", 1.0 / engine.period().as_secs_f64());
    println!("\nPress Ctrl+C to stop...\n");

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    engine.start()?;
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }
    println!("\nStopping...");
    let stats = engine.stop();

    println!("{} ticks, {} overruns", stats.ticks, stats.overruns);
    if config.record_timings {
        print_timings(&control.node_timings());
    }

    if let Some(path) = &args.save {
        snapshot::save_to_file(&engine.graph().lock(), path)?;
        println!("Saved graph to {}", path.display());
    }
    Ok(())
}
