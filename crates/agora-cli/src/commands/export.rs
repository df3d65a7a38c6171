//! Export visualization data.

use agora::prelude::*;
use anyhow::{bail, Context, Result};
use colored::Colorize;

use crate::config;

pub fn run(scenario: Option<&str>, output: &str, format: &str) -> Result<()> {
    if format != "json" {
        bail!("Unsupported export format: {} (expected {})", format, "json".cyan());
    }

    let scenario = config::load(scenario)?;
    let mut network = scenario.build_network();
    println!("{} Laying out {} agents...", "→".blue(), network.agent_count());

    network.statistics();
    let data: VisualizationData = network.visualization();

    let json = serde_json::to_string_pretty(&data)?;
    std::fs::write(output, json).with_context(|| format!("Failed to write {}", output))?;

    println!(
        "{} Exported {} nodes, {} edges, {} communities to {}",
        "✓".green(),
        data.nodes.len(),
        data.edges.len(),
        data.communities,
        output
    );
    Ok(())
}
