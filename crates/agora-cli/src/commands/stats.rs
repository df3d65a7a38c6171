//! Show network statistics.

use agora::prelude::*;
use anyhow::Result;
use colored::Colorize;

use crate::config;

pub fn run(scenario: Option<&str>, centrality: &str, top: usize) -> Result<()> {
    let scenario = config::load(scenario)?;
    let mut network = scenario.build_network();
    let stats = network.statistics();

    println!(
        "{} {} ({})",
        "Agora Network".white().bold(),
        network.id().cyan(),
        network.network_type()
    );
    println!("{}", "═".repeat(40).dimmed());
    println!();

    println!("{}", "Structure".blue().bold());
    println!("  Agents:            {}", stats.nodes.to_string().cyan());
    println!("  Connections:       {}", stats.edges.to_string().cyan());
    println!("  Density:           {:.4}", stats.density);
    if let Some(components) = stats.components {
        println!("  Components:        {}", components);
    }
    if let Some(size) = stats.largest_component_size {
        println!("  Largest component: {}", size);
    }
    if let (Some(avg), Some(max)) = (stats.avg_degree, stats.max_degree) {
        println!("  Degree (avg/max):  {:.2} / {}", avg, max);
    }
    println!();

    if stats.avg_path_length.is_some() {
        println!("{}", "Paths".blue().bold());
        if let Some(l) = stats.avg_path_length {
            println!("  Avg path length:   {:.3}", l);
        }
        if let Some(d) = stats.diameter {
            println!("  Diameter:          {}", d);
        }
        if let Some(c) = stats.clustering_coefficient {
            println!("  Clustering:        {:.3}", c);
        }
        if let Some(c) = stats.centralization {
            println!("  Centralization:    {:.3}", c);
        }
        if let Some(note) = &stats.note {
            println!("  {} {}", "note:".yellow(), note.dimmed());
        }
        println!();
    }

    let ranking = network.centrality_by_name(centrality);
    println!("{} ({})", "Most Central Agents".blue().bold(), centrality);
    if let Some(degraded) = &ranking.degraded {
        println!("  {} {:?}", "degraded:".yellow(), degraded);
    }
    for (i, (agent, score)) in ranking.ranked().into_iter().take(top).enumerate() {
        println!("  {:>3}. {:<20} {:.4}", i + 1, agent.to_string(), score);
    }
    println!();

    let communities = network.detect_communities();
    println!("{}", "Communities".blue().bold());
    println!("  Count:             {}", communities.communities.len());
    println!("  Modularity:        {:.4}", communities.modularity);

    Ok(())
}
