//! Apply network effects to the scenario's resource values.

use agora::prelude::*;
use anyhow::{bail, Result};
use colored::Colorize;

use crate::config;

pub fn run(scenario: Option<&str>, json: bool) -> Result<()> {
    let scenario = config::load(scenario)?;
    if scenario.values.is_empty() {
        bail!("Scenario has no {} to transform.", "[values]".cyan());
    }

    let mut network = scenario.build_network();
    let result = network.apply_network_effects(&scenario.values);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", "Network Effects".white().bold());
    println!("{}", "═".repeat(40).dimmed());
    for effect in network.effects() {
        let state = if effect.is_active { "on".green() } else { "off".dimmed() };
        println!(
            "  {:<16} {:<13} strength {:.2}  [{}]",
            effect.id,
            effect.effect_type().to_string(),
            effect.strength,
            state
        );
    }
    println!();

    for (agent, before) in &scenario.values {
        println!("{}", agent.to_string().blue().bold());
        for (resource, old) in before {
            let new = result
                .get(agent)
                .and_then(|r| r.get(resource))
                .copied()
                .unwrap_or(*old);
            let change = if *old != 0.0 { (new / old - 1.0) * 100.0 } else { 0.0 };
            let change = if change >= 0.0 {
                format!("{:+.2}%", change).green()
            } else {
                format!("{:+.2}%", change).red()
            };
            println!("  {:<16} {:>12.4} → {:>12.4}  {}", resource, old, new, change);
        }
    }

    Ok(())
}
