//! Simulate Bass diffusion over the scenario network.

use agora::prelude::*;
use anyhow::{Context, Result};
use colored::Colorize;

use crate::config;

pub fn run(
    scenario: Option<&str>,
    diffusion_type: Option<&str>,
    steps: Option<usize>,
    adopters: &[String],
) -> Result<()> {
    let scenario = config::load(scenario)?;
    let diffusion_type = match diffusion_type {
        Some(name) => name
            .parse::<DiffusionType>()
            .with_context(|| format!("Expected one of: {}", type_names()))?,
        None => scenario.diffusion.diffusion_type,
    };
    let steps = steps.unwrap_or(scenario.diffusion.steps);
    let adopters: Vec<AgentId> = if adopters.is_empty() {
        scenario.diffusion.initial_adopters.clone()
    } else {
        adopters.iter().map(AgentId::new).collect()
    };

    let network = scenario.build_network();
    let unknown: Vec<&AgentId> = adopters.iter().filter(|a| !network.contains_agent(a)).collect();

    println!(
        "{} Simulating {} diffusion over {} agents...",
        "→".blue(),
        diffusion_type.to_string().cyan(),
        network.agent_count()
    );
    for agent in unknown {
        println!("  {} Unknown adopter {} ignored", "•".yellow(), agent);
    }

    let trace = network.simulate_diffusion(diffusion_type, &adopters, steps, &scenario.diffusion.overrides);
    let p = trace.params;
    println!(
        "  threshold {:.2}  influence {:.2}  decay {:.2}  innovation {:.2}",
        p.adoption_threshold, p.social_influence, p.decay_rate, p.innovation_coefficient
    );
    println!();

    println!("{}", "Step  Mean level  Adopters".white().bold());
    println!("{}", "═".repeat(40).dimmed());
    let means = trace.mean_levels();
    let counts = trace.adopter_counts();
    for (step, (mean, count)) in means.iter().zip(&counts).enumerate() {
        let bar = "█".repeat((mean * 20.0).round() as usize);
        println!("{:>4}  {:>10.4}  {:>8}  {}", step, mean, count, bar.green());
    }

    if let (Some(last), Some(adopted)) = (trace.final_levels(), counts.last()) {
        println!();
        println!("{} {} of {} agents adopted", "✓".green(), adopted, last.len());
    }

    Ok(())
}

fn type_names() -> String {
    DiffusionType::ALL
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
