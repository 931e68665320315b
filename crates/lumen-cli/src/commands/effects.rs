//! Effect type listing and parameter schema commands.

use clap::Args;
use lumen_core::ParamMap;
use lumen_registry::{EffectCategory, EffectRegistry};

use super::common::{parse_category, print_params};

#[derive(Args)]
pub struct EffectsArgs {
    /// Only list effects in this category
    #[arg(short, long, value_parser = parse_category)]
    category: Option<EffectCategory>,
}

#[derive(Args)]
pub struct ArgsArgs {
    /// Effect type name, e.g. "effects.AfterGlow"
    #[arg(value_name = "TYPE")]
    type_name: String,
}

pub fn run(args: EffectsArgs) -> anyhow::Result<()> {
    let registry = EffectRegistry::new();
    let categories: Vec<EffectCategory> = match args.category {
        Some(category) => vec![category],
        None => EffectCategory::ALL.to_vec(),
    };

    println!("Available Effects");
    println!("=================");
    for category in categories {
        let effects = registry.effects_in_category(category);
        if effects.is_empty() {
            continue;
        }
        println!();
        println!("{} - {}", category.name(), category.description());
        for effect in effects {
            println!(
                "  {:28} {}/{}  {}",
                effect.type_name, effect.inputs, effect.outputs, effect.description
            );
        }
    }
    println!();
    println!("Use 'lumen args <type>' for parameter details.");
    Ok(())
}

pub fn run_args(args: ArgsArgs) -> anyhow::Result<()> {
    let registry = EffectRegistry::new();
    let descriptor = registry
        .get(&args.type_name)
        .ok_or_else(|| anyhow::anyhow!("Unknown effect type: {}", args.type_name))?;

    println!("{} ({})", descriptor.name, descriptor.type_name);
    println!("{}", "=".repeat(descriptor.name.len() + descriptor.type_name.len() + 3));
    println!();
    println!("{}", descriptor.description);
    println!(
        "Category: {}   Inputs: {}   Outputs: {}",
        descriptor.category.name(),
        descriptor.inputs,
        descriptor.outputs
    );
    println!();

    print_params("Constructor parameters", registry.constructor_schema(&args.type_name)?);
    println!();

    // Tunables come from a default-constructed instance.
    let effect = registry.create(&args.type_name, &ParamMap::new())?;
    print_params("Tunable parameters", &effect.parameter_schema());
    Ok(())
}
