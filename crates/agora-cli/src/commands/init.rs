//! Write a starter scenario.

use agora::prelude::*;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::SCENARIO_FILE;

pub fn run(path: Option<String>, force: bool) -> Result<()> {
    let base_path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    println!("{} Initializing Agora scenario...", "→".blue());

    std::fs::create_dir_all(&base_path)
        .with_context(|| format!("Failed to create {}", base_path.display()))?;

    let scenario_path = base_path.join(SCENARIO_FILE);
    if scenario_path.exists() && !force {
        println!("  {} {} already exists (use --force to overwrite)", "•".yellow(), scenario_path.display());
        return Ok(());
    }

    let content = Scenario::default_toml().context("Failed to serialize starter scenario")?;
    std::fs::write(&scenario_path, content)
        .with_context(|| format!("Failed to write {}", scenario_path.display()))?;
    println!("  {} Created {}", "✓".green(), scenario_path.display());

    println!();
    println!("Next steps:");
    println!("  {} agora stats", "1.".blue());
    println!("  {} agora effects", "2.".blue());
    println!("  {} agora diffuse --type knowledge", "3.".blue());
    println!("  {} agora teams", "4.".blue());

    Ok(())
}
