//! List command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use traintrack_core::{ComponentClass, ComponentRegistry};

pub fn execute(library: &Path, set: Option<&str>, json_output: bool) -> Result<()> {
    let registry = ComponentRegistry::new(library);

    let sets = match set {
        Some(set) => vec![set.to_string()],
        None => registry
            .scan_all()
            .with_context(|| format!("Failed to scan model library {}", library.display()))?,
    };

    let mut components: Vec<ComponentClass> = Vec::new();
    for set in &sets {
        components.extend(registry.components(set).with_context(|| format!("Failed to index model set `{set}`"))?);
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&components)?);
        return Ok(());
    }

    println!();
    println!("{}", format!("Components ({})", components.len()).bold().cyan());
    println!();

    if components.is_empty() {
        println!("  {}", "No components found.".dimmed());
        println!("  {}", "Modules live in <library>/<set>/Models/*.toml".dimmed());
        return Ok(());
    }

    println!("{:<12} {:<24} {}", "Set", "Name", "Module");
    println!("{}", "─".repeat(60));
    for class in &components {
        println!("{:<12} {:<24} {}", class.namespace, class.name.cyan(), class.module.dimmed());
    }
    println!();
    Ok(())
}
