//! Run knowledge diffusion and report levels and gaps.

use agora::prelude::*;
use anyhow::{bail, Result};
use colored::Colorize;
use std::collections::BTreeMap;

use crate::config;

pub fn run(scenario: Option<&str>, steps: Option<usize>) -> Result<()> {
    let scenario = config::load(scenario)?;
    if scenario.knowledge.domains.is_empty() {
        bail!("Scenario defines no {}.", "[knowledge] domains".cyan());
    }

    let mut model = scenario.build_knowledge_model();
    let steps = steps.unwrap_or(scenario.knowledge.steps);
    println!("{} Running {} knowledge updates...", "→".blue(), steps);
    model.update_knowledge(steps);

    let Some(stats) = model.knowledge_statistics() else {
        println!("  {} No agents have knowledge yet", "•".yellow());
        return Ok(());
    };

    println!();
    println!("{} (step {})", "Knowledge".white().bold(), stats.time_step);
    println!("{}", "═".repeat(40).dimmed());
    println!("  Agents:  {}", stats.agents.to_string().cyan());
    println!("  Domains: {}", stats.domains.to_string().cyan());
    if let Some(overall) = &stats.overall {
        println!("  Mean level: {:.3} (std {:.3})", overall.mean, overall.std);
    }
    println!();

    println!("{}", "Domains".blue().bold());
    for (domain, d) in &stats.domain_stats {
        println!(
            "  {:<16} mean {:.3}  median {:.3}  range {:.2}-{:.2}  experts {}  intermediate {}  novice {}  none {}",
            domain,
            d.summary.mean,
            d.summary.median,
            d.summary.min,
            d.summary.max,
            d.experts,
            d.intermediates,
            d.novices,
            d.uninitiated
        );
    }
    println!();

    println!("{}", "Expertise distribution".blue().bold());
    for (domains, agents) in &stats.expertise_distribution {
        println!("  {} expert domain(s): {} agent(s)", domains, agents);
    }
    println!();

    let gaps = open_gaps(model.find_knowledge_gaps());
    println!("{}", "Gaps".blue().bold());
    if gaps.is_empty() {
        println!("  {} No open knowledge gaps", "✓".green());
    }
    for (agent, domains) in &gaps {
        println!("  {} {} → {}", "•".yellow(), agent, domains.join(", "));
    }

    Ok(())
}

/// Drop agents with nothing left to learn.
fn open_gaps(gaps: BTreeMap<AgentId, Vec<DomainId>>) -> BTreeMap<AgentId, Vec<DomainId>> {
    gaps.into_iter().filter(|(_, domains)| !domains.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agents_without_gaps_are_not_listed() {
        let mut network = AgentNetwork::new("pair", NetworkType::Random, NetworkConfig::empty());
        network.add_connection("a", "b", 1.0);
        let mut model = KnowledgeDiffusionModel::new(network);
        model.add_knowledge_domain("rust", 0.3, vec![]);
        model.initialize_agent_knowledge("a", BTreeMap::from([("rust".to_string(), 0.9)]), 0.1);
        model.initialize_agent_knowledge("b", BTreeMap::from([("rust".to_string(), 0.1)]), 0.1);

        let gaps = open_gaps(model.find_knowledge_gaps());
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[&AgentId::new("b")], vec!["rust".to_string()]);
    }

    #[test]
    fn fully_skilled_population_has_no_open_gaps() {
        let mut model = KnowledgeDiffusionModel::new(AgentNetwork::new(
            "solo",
            NetworkType::Complete,
            NetworkConfig::empty(),
        ));
        model.add_knowledge_domain("rust", 0.3, vec![]);
        model.initialize_agent_knowledge("a", BTreeMap::from([("rust".to_string(), 0.9)]), 0.1);

        assert!(!model.find_knowledge_gaps().is_empty());
        assert!(open_gaps(model.find_knowledge_gaps()).is_empty());
    }
}
