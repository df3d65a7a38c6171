//! Scenario files: a whole simulation described in TOML.
//!
//! ```toml
//! [network]
//! id = "market"
//! type = "scale_free"
//! initial_nodes = 30
//! seed = 7
//!
//! [[effects]]
//! id = "metcalfe"
//! type = "direct"
//! strength = 0.5
//! resource_types = ["liquidity"]
//!
//! [diffusion]
//! type = "innovation"
//! initial_adopters = ["0"]
//! steps = 10
//! ```
//!
//! Every section is optional; missing values fall back to defaults.

use crate::diffusion::DiffusionConfig;
use crate::knowledge::{KnowledgeDiffusionModel, DEFAULT_LEARNING_RATE};
use crate::network::{AgentNetwork, NetworkConfig};
use crate::topology::{balanced_tree_size, MAX_TREE_NODES};
use agora_core::error::{check_range, AgoraError, Result};
use agora_core::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// A complete simulation setup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<NetworkEffect>,
    /// Agents added after the generated topology, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<AgentSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<ConnectionSpec>,
    /// Resource values fed through the network effects.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: AgentValues,
    #[serde(default)]
    pub diffusion: DiffusionSection,
    #[serde(default)]
    pub knowledge: KnowledgeSection,
    #[serde(default)]
    pub teams: TeamSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSection {
    #[serde(default = "default_network_id")]
    pub id: String,
    #[serde(rename = "type", default = "default_network_type")]
    pub network_type: NetworkType,
    #[serde(flatten)]
    pub config: NetworkConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: AgentId,
    #[serde(flatten)]
    pub attributes: AgentAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    pub a: AgentId,
    pub b: AgentId,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffusionSection {
    #[serde(rename = "type", default = "default_diffusion_type")]
    pub diffusion_type: DiffusionType,
    #[serde(default)]
    pub initial_adopters: Vec<AgentId>,
    #[serde(default = "default_diffusion_steps")]
    pub steps: usize,
    #[serde(flatten)]
    pub overrides: DiffusionConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<KnowledgeDomain>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<KnowledgeSeed>,
    /// Update rounds run by the `knowledge` command.
    #[serde(default = "default_knowledge_steps")]
    pub steps: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSeed {
    pub id: AgentId,
    #[serde(default)]
    pub levels: BTreeMap<DomainId, f64>,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSection {
    #[serde(default = "default_team_size")]
    pub size: usize,
    /// Required level per domain.
    #[serde(default)]
    pub requirements: BTreeMap<DomainId, f64>,
}

fn default_network_id() -> String { "agora".to_string() }
fn default_network_type() -> NetworkType { NetworkType::ScaleFree }
fn default_weight() -> f64 { 1.0 }
fn default_diffusion_type() -> DiffusionType { DiffusionType::Innovation }
fn default_diffusion_steps() -> usize { 10 }
fn default_knowledge_steps() -> usize { 10 }
fn default_learning_rate() -> f64 { DEFAULT_LEARNING_RATE }
fn default_team_size() -> usize { 3 }

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            id: default_network_id(),
            network_type: default_network_type(),
            config: NetworkConfig::default(),
        }
    }
}

impl Default for DiffusionSection {
    fn default() -> Self {
        Self {
            diffusion_type: default_diffusion_type(),
            initial_adopters: Vec::new(),
            steps: default_diffusion_steps(),
            overrides: DiffusionConfig::default(),
        }
    }
}

impl Default for TeamSection {
    fn default() -> Self {
        Self {
            size: default_team_size(),
            requirements: BTreeMap::new(),
        }
    }
}

impl Scenario {
    /// Read, parse and validate a scenario file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AgoraError::Io(format!("{}: {}", path.display(), e)))?;
        let scenario = Self::from_toml_str(&content)?;
        debug!("Loaded scenario from {}", path.display());
        Ok(scenario)
    }

    /// Parse and validate a scenario.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?)
            .map_err(|e| AgoraError::Io(format!("{}: {}", path.display(), e)))
    }

    /// Starter scenario written by `agora init`.
    pub fn example() -> Self {
        let levels = |pairs: &[(&str, f64)]| -> BTreeMap<DomainId, f64> {
            pairs.iter().map(|(d, l)| (d.to_string(), *l)).collect()
        };

        let mut values = AgentValues::new();
        for (agent, x) in [("0", 10.0), ("1", 25.0), ("2", 5.0)] {
            values
                .entry(AgentId::new(agent))
                .or_default()
                .insert("liquidity".to_string(), x);
        }

        Scenario {
            network: NetworkSection {
                id: "market".to_string(),
                network_type: NetworkType::SmallWorld,
                config: NetworkConfig::default().with_seed(42),
            },
            effects: vec![
                NetworkEffect::new("metcalfe", 0.5, EffectKind::direct(&["liquidity"])),
                NetworkEffect::new("neighbourhood", 0.3, EffectKind::local(&["liquidity"])),
                NetworkEffect::new("crowding", 0.8, EffectKind::congestion(&["liquidity"])),
            ],
            agents: vec![AgentSpec {
                id: AgentId::new("newcomer"),
                attributes: AgentAttributes::default().with_strategy("arbitrage"),
            }],
            connections: Vec::new(),
            values,
            diffusion: DiffusionSection {
                initial_adopters: vec![AgentId::new("0"), AgentId::new("1")],
                ..DiffusionSection::default()
            },
            knowledge: KnowledgeSection {
                domains: vec![
                    KnowledgeDomain::new("pricing", 0.3, vec![]),
                    KnowledgeDomain::new("derivatives", 0.8, vec!["pricing".to_string()]),
                ],
                agents: vec![
                    KnowledgeSeed {
                        id: AgentId::new("0"),
                        levels: levels(&[("pricing", 0.9), ("derivatives", 0.7)]),
                        learning_rate: 0.2,
                    },
                    KnowledgeSeed {
                        id: AgentId::new("1"),
                        levels: levels(&[("pricing", 0.3)]),
                        learning_rate: DEFAULT_LEARNING_RATE,
                    },
                    KnowledgeSeed {
                        id: AgentId::new("2"),
                        levels: levels(&[("pricing", 0.6), ("derivatives", 0.2)]),
                        learning_rate: DEFAULT_LEARNING_RATE,
                    },
                ],
                steps: default_knowledge_steps(),
            },
            teams: TeamSection {
                size: 2,
                requirements: levels(&[("pricing", 0.7), ("derivatives", 0.5)]),
            },
        }
    }

    /// The [`Scenario::example`] scenario as TOML.
    pub fn default_toml() -> Result<String> {
        Self::example().to_toml_string()
    }

    /// Check every numeric parameter against its allowed range.
    pub fn validate(&self) -> Result<()> {
        self.network.config.validate()?;
        if self.network.network_type == NetworkType::Hierarchical {
            let config = &self.network.config;
            let fits = balanced_tree_size(config.branching_factor, config.height)
                .is_some_and(|n| n <= MAX_TREE_NODES);
            if !fits {
                return Err(AgoraError::invalid_config(
                    "network.height",
                    format!("{} (branching_factor {})", config.height, config.branching_factor),
                    format!("hierarchical trees are limited to {} agents", MAX_TREE_NODES),
                ));
            }
        }

        for effect in &self.effects {
            check_range(&format!("effects.{}.strength", effect.id), effect.strength, 0.0, 1.0)?;
            match &effect.kind {
                EffectKind::Learning { learning_rate, .. } => {
                    check_range(&format!("effects.{}.learning_rate", effect.id), *learning_rate, 0.0, 1.0)?;
                }
                EffectKind::Congestion {
                    capacities,
                    default_capacity,
                    threshold,
                    ..
                } => {
                    check_range(&format!("effects.{}.threshold", effect.id), *threshold, 0.0, 1.0)?;
                    let non_positive = capacities
                        .iter()
                        .map(|(r, c)| (r.as_str(), *c))
                        .chain(std::iter::once(("default", *default_capacity)))
                        .find(|(_, c)| c.is_nan() || *c <= 0.0);
                    if let Some((resource, capacity)) = non_positive {
                        return Err(AgoraError::invalid_config(
                            format!("effects.{}.capacity.{}", effect.id, resource),
                            capacity.to_string(),
                            "capacity must be positive",
                        ));
                    }
                }
                EffectKind::Indirect { primary_type, .. } if primary_type.is_empty() => {
                    return Err(AgoraError::invalid_config(
                        format!("effects.{}.primary_type", effect.id),
                        "",
                        "indirect effects need a primary resource type",
                    ));
                }
                _ => {}
            }
        }

        for connection in &self.connections {
            if connection.a == connection.b {
                return Err(AgoraError::invalid_config(
                    "connections",
                    connection.a.to_string(),
                    "an agent cannot connect to itself",
                ));
            }
            if connection.weight.is_nan() || connection.weight < 0.0 {
                return Err(AgoraError::invalid_config(
                    "connections.weight",
                    connection.weight.to_string(),
                    "weights must be non-negative",
                ));
            }
        }

        let overrides = &self.diffusion.overrides;
        for (field, value) in [
            ("diffusion.adoption_threshold", overrides.adoption_threshold),
            ("diffusion.social_influence", overrides.social_influence),
            ("diffusion.decay_rate", overrides.decay_rate),
            ("diffusion.innovation_coefficient", overrides.innovation_coefficient),
        ] {
            if let Some(v) = value {
                check_range(field, v, 0.0, 1.0)?;
            }
        }

        for domain in &self.knowledge.domains {
            check_range(&format!("knowledge.{}.complexity", domain.id), domain.complexity, 0.0, 1.0)?;
        }
        for seed in &self.knowledge.agents {
            check_range(&format!("knowledge.{}.learning_rate", seed.id), seed.learning_rate, 0.0, 1.0)?;
            for (domain, level) in &seed.levels {
                check_range(&format!("knowledge.{}.{}", seed.id, domain), *level, 0.0, 1.0)?;
            }
        }

        for (domain, required) in &self.teams.requirements {
            if required.is_nan() || *required <= 0.0 || *required > 1.0 {
                return Err(AgoraError::out_of_range(format!("teams.requirements.{}", domain), 0.0, 1.0, *required));
            }
        }

        Ok(())
    }

    /// Build the network: generated topology, extra agents, connections, effects.
    pub fn build_network(&self) -> AgentNetwork {
        let mut network = AgentNetwork::new(
            self.network.id.clone(),
            self.network.network_type,
            self.network.config.clone(),
        );

        for agent in &self.agents {
            network.add_agent(agent.id.clone(), agent.attributes.clone());
        }
        for c in &self.connections {
            network.add_connection(c.a.clone(), c.b.clone(), c.weight);
        }
        for effect in &self.effects {
            network.add_network_effect(effect.id.clone(), effect.strength, effect.kind.clone());
            if !effect.is_active {
                network.set_effect_active(&effect.id, false);
            }
        }

        network
    }

    /// Build the network and seed a knowledge model over it.
    pub fn build_knowledge_model(&self) -> KnowledgeDiffusionModel {
        let mut model = KnowledgeDiffusionModel::new(self.build_network());
        for domain in &self.knowledge.domains {
            model.add_knowledge_domain(domain.id.clone(), domain.complexity, domain.prerequisites.clone());
        }
        for seed in &self.knowledge.agents {
            model.initialize_agent_knowledge(seed.id.clone(), seed.levels.clone(), seed.learning_rate);
        }
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::error::ConfigError;

    #[test]
    fn empty_scenario_uses_defaults() {
        let scenario = Scenario::from_toml_str("").unwrap();
        assert_eq!(scenario.network.network_type, NetworkType::ScaleFree);
        assert_eq!(scenario.network.config.initial_nodes, 20);
        assert_eq!(scenario.diffusion.steps, 10);
        assert_eq!(scenario.teams.size, 3);
    }

    #[test]
    fn parses_sections() {
        let scenario = Scenario::from_toml_str(
            r#"
            [network]
            id = "lab"
            type = "complete"
            initial_nodes = 0

            [[agents]]
            id = "alice"
            strategy = "cooperate"

            [[agents]]
            id = "bob"

            [[connections]]
            a = "alice"
            b = "carol"
            weight = 2.0

            [[effects]]
            id = "m"
            type = "direct"
            strength = 0.5
            resource_types = ["x"]
            model = "odlyzko"

            [[effects]]
            id = "off"
            type = "coordination"
            strength = 0.2
            is_active = false

            [values.alice]
            x = 10.0

            [diffusion]
            type = "trust"
            initial_adopters = ["alice"]
            decay_rate = 0.0

            [knowledge]
            steps = 3
            domains = [{ id = "rust", complexity = 0.5 }]
            agents = [{ id = "alice", levels = { rust = 0.9 } }]

            [teams]
            size = 2
            requirements = { rust = 0.7 }
            "#,
        )
        .unwrap();

        assert_eq!(scenario.network.id, "lab");
        assert_eq!(scenario.agents[0].attributes.strategy.as_deref(), Some("cooperate"));
        assert_eq!(scenario.diffusion.diffusion_type, DiffusionType::Trust);
        assert_eq!(scenario.diffusion.overrides.decay_rate, Some(0.0));
        assert_eq!(scenario.knowledge.agents[0].learning_rate, DEFAULT_LEARNING_RATE);
        assert_eq!(scenario.knowledge.domains[0].prerequisites, Vec::<String>::new());

        let network = scenario.build_network();
        assert_eq!(network.agent_count(), 3);
        // complete: bob attaches to alice; carol arrives through the connection
        assert!(network.has_connection(&"alice".into(), &"bob".into()));
        assert_eq!(network.connection_weight(&"alice".into(), &"carol".into()), Some(2.0));
        assert_eq!(network.effects().len(), 2);
        assert!(!network.effects()[1].is_active);
        assert!(matches!(
            network.effects()[0].kind,
            EffectKind::Direct { model: GrowthModel::Odlyzko, .. }
        ));
    }

    #[test]
    fn rejects_out_of_range_strength() {
        let err = Scenario::from_toml_str(
            r#"
            [[effects]]
            id = "loud"
            type = "direct"
            strength = 1.5
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, AgoraError::Config(ConfigError::OutOfRange { .. })));
        assert!(err.to_string().contains("effects.loud.strength"));
    }

    #[test]
    fn rejects_non_positive_capacity() {
        let err = Scenario::from_toml_str(
            r#"
            [[effects]]
            id = "jam"
            type = "congestion"
            strength = 0.5
            resource_types = ["bw"]
            capacities = { bw = 0.0 }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("effects.jam.capacity.bw"));
    }

    #[test]
    fn rejects_self_connection_and_zero_requirement() {
        assert!(Scenario::from_toml_str("[[connections]]\na = \"x\"\nb = \"x\"\n").is_err());
        assert!(Scenario::from_toml_str("[teams]\nrequirements = { rust = 0.0 }\n").is_err());
    }

    #[test]
    fn rejects_oversized_hierarchy() {
        let err = Scenario::from_toml_str(
            "[network]\ntype = \"hierarchical\"\nbranching_factor = 1000\nheight = 40\n",
        )
        .unwrap_err();
        assert!(matches!(err, AgoraError::Config(ConfigError::InvalidValue { .. })));
        assert!(err.to_string().contains("network.height"));

        // the same shape is fine for other topologies
        assert!(Scenario::from_toml_str("[network]\ntype = \"random\"\nbranching_factor = 1000\nheight = 40\n").is_ok());
    }

    #[test]
    fn unknown_network_type_is_a_parse_error() {
        let err = Scenario::from_toml_str("[network]\ntype = \"mesh\"\n").unwrap_err();
        assert!(matches!(err, AgoraError::Serialization(_)));
    }

    #[test]
    fn example_round_trips_through_toml() {
        let text = Scenario::default_toml().unwrap();
        let parsed = Scenario::from_toml_str(&text).unwrap();
        assert_eq!(parsed, Scenario::example());
    }

    #[test]
    fn knowledge_model_is_seeded() {
        let model = Scenario::example().build_knowledge_model();
        assert_eq!(model.domains().len(), 2);
        assert_eq!(model.agents().len(), 3);
        let k = model.agent_knowledge(&"1".into()).unwrap();
        // registered domains missing from the seed start at zero
        assert_eq!(k.level("derivatives"), Some(0.0));
    }
}
