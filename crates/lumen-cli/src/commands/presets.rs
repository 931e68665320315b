//! Preset and saved graph listing.

use lumen_config::{paths, preset_names};

pub fn run() -> anyhow::Result<()> {
    println!("Factory Presets:");
    println!("================");
    for name in preset_names() {
        println!("  {name}");
    }
    println!();

    println!("Saved Graphs:");
    println!("=============");
    let graphs = paths::list_user_graphs();
    if graphs.is_empty() {
        println!("  (none)");
        println!();
        println!("  Save one with: lumen save --preset <name>");
    } else {
        for path in graphs {
            let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unknown");
            println!("  {:20} {}", name, path.display());
        }
    }
    println!();
    println!("Graphs directory: {}", paths::user_graphs_dir().display());
    Ok(())
}
