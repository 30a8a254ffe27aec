//! `targets` command implementation.

use anyhow::{Context, Result};
use contracts::{TargetRegistry, DEFAULT_OUTPUT_PREFIX};

use crate::cli::TargetsArgs;

/// Execute the `targets` command
pub fn run_targets(args: &TargetsArgs) -> Result<()> {
    let registry = TargetRegistry::reference();

    if args.json {
        let targets: Vec<_> = registry.iter().collect();
        let json =
            serde_json::to_string_pretty(&targets).context("Failed to serialize targets")?;
        println!("{}", json);
    } else {
        print!("{}", render_table(&registry));
    }

    Ok(())
}

fn render_table(registry: &TargetRegistry) -> String {
    let width = registry
        .iter()
        .map(|t| t.short_name.len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    let mut out = format!("{:<width$}  MODEL\n", "NAME");
    for target in registry {
        out.push_str(&format!(
            "{:<width$}  {}\n",
            target.short_name.as_str(),
            target.endpoint_reference
        ));
    }
    out.push_str(&format!(
        "\n{} targets, results under {}/<name>_<image>.json\n",
        registry.len(),
        DEFAULT_OUTPUT_PREFIX
    ));
    out
}
