//! Find the best teams for the scenario's requirements.

use agora::prelude::*;
use anyhow::{bail, Result};
use colored::Colorize;

use crate::config;

pub fn run(scenario: Option<&str>, size: Option<usize>, steps: usize) -> Result<()> {
    let scenario = config::load(scenario)?;
    if scenario.teams.requirements.is_empty() {
        bail!("Scenario has no {}.", "[teams] requirements".cyan());
    }

    let mut model = scenario.build_knowledge_model();
    if steps > 0 {
        println!("{} Running {} knowledge updates first...", "→".blue(), steps);
        model.update_knowledge(steps);
    }

    let size = size.unwrap_or(scenario.teams.size);
    let teams = model.find_optimal_teams(&scenario.teams.requirements, size);

    println!("{} (size {})", "Best Teams".white().bold(), size);
    println!("{}", "═".repeat(40).dimmed());
    if teams.is_empty() {
        println!("  {} No candidate agents", "•".yellow());
        return Ok(());
    }

    for (rank, team) in teams.iter().enumerate() {
        let members: Vec<&str> = team.members.iter().map(|m| m.as_str()).collect();
        println!(
            "{:>3}. [{}]  score {:.3}  coverage {}",
            rank + 1,
            members.join(", ").cyan(),
            team.score,
            format!("{:.0}%", team.coverage * 100.0).green()
        );
        for (domain, level) in &team.domain_coverage {
            let required = scenario.teams.requirements.get(domain).copied().unwrap_or(0.0);
            let mark = if *level >= required { "✓".green() } else { "•".yellow() };
            println!("       {} {:<16} {:.2} / {:.2}", mark, domain, level, required);
        }
    }

    Ok(())
}
