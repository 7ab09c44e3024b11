//! Resolve command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use traintrack_core::ComponentRegistry;

pub fn execute(library: &Path, set: &str, symbol: &str, json_output: bool) -> Result<()> {
    let registry = ComponentRegistry::new(library);
    let class = registry
        .require(set, symbol)
        .with_context(|| format!("Failed to resolve `{symbol}` in model set `{set}`"))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&class)?);
        return Ok(());
    }

    println!("{}", class.qualified_name().bold().cyan());
    println!("  Entry:  {}", class.entry);
    println!("  Source: {}", class.source.display().to_string().dimmed());
    if let Some(description) = &class.description {
        println!("  {}", description.dimmed());
    }
    Ok(())
}
