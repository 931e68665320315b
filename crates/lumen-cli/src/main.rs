//! Lumen CLI - run and inspect audio-reactive LED graphs.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lumen")]
#[command(author, version, about = "Audio-reactive LED graph engine", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a graph on the tick loop until Ctrl+C
    Run(commands::run::RunArgs),

    /// List available effect types
    Effects(commands::effects::EffectsArgs),

    /// Show the constructor and tunable parameters of an effect type
    Args(commands::effects::ArgsArgs),

    /// List factory presets and saved graphs
    Presets,

    /// Build a preset and save it as a snapshot
    Save(commands::save::SaveArgs),

    /// Print the nodes, connections and execution order of a snapshot
    Inspect(commands::inspect::InspectArgs),

    /// Run ticks offline as fast as possible and report node timings
    Render(commands::render::RenderArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Effects(args) => commands::effects::run(args),
        Commands::Args(args) => commands::effects::run_args(args),
        Commands::Presets => commands::presets::run(),
        Commands::Save(args) => commands::save::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Render(args) => commands::render::run(args),
    }
}
