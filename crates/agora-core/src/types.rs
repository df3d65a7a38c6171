//! Shared types used across the Agora crates.

use crate::error::AgoraError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Opaque identifier for an agent in a network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id given to the `index`-th node produced by a topology generator.
    pub fn from_index(index: usize) -> Self {
        Self(index.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a knowledge domain.
pub type DomainId = String;

/// Per-agent resource values: agent → resource type → amount.
pub type AgentValues = BTreeMap<AgentId, BTreeMap<String, f64>>;

/// Shape of the initial topology and the rule used to attach new agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    Hierarchical,
    Random,
    SmallWorld,
    ScaleFree,
    Clustered,
    Complete,
}

impl NetworkType {
    pub const ALL: [NetworkType; 6] = [
        NetworkType::Hierarchical,
        NetworkType::Random,
        NetworkType::SmallWorld,
        NetworkType::ScaleFree,
        NetworkType::Clustered,
        NetworkType::Complete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Hierarchical => "hierarchical",
            NetworkType::Random => "random",
            NetworkType::SmallWorld => "small_world",
            NetworkType::ScaleFree => "scale_free",
            NetworkType::Clustered => "clustered",
            NetworkType::Complete => "complete",
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkType {
    type Err = AgoraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NetworkType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.to_lowercase().replace('-', "_"))
            .ok_or_else(|| AgoraError::UnknownVariant {
                kind: "network type",
                name: s.to_string(),
            })
    }
}

/// Tag of a network effect transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    /// Value grows with the number of participants.
    Direct,
    /// Value grows with complementary resources held across the network.
    Indirect,
    /// Value depends on the weighted neighbourhood.
    Local,
    /// Value grows with accumulated knowledge.
    Learning,
    /// Value grows with strategy alignment.
    Coordination,
    /// Value shrinks once a shared resource saturates.
    Congestion,
}

impl EffectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectType::Direct => "direct",
            EffectType::Indirect => "indirect",
            EffectType::Local => "local",
            EffectType::Learning => "learning",
            EffectType::Coordination => "coordination",
            EffectType::Congestion => "congestion",
        }
    }
}

impl fmt::Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of process simulated by Bass diffusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffusionType {
    Innovation,
    Knowledge,
    Behavior,
    Capability,
    Trust,
}

impl DiffusionType {
    pub const ALL: [DiffusionType; 5] = [
        DiffusionType::Innovation,
        DiffusionType::Knowledge,
        DiffusionType::Behavior,
        DiffusionType::Capability,
        DiffusionType::Trust,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiffusionType::Innovation => "innovation",
            DiffusionType::Knowledge => "knowledge",
            DiffusionType::Behavior => "behavior",
            DiffusionType::Capability => "capability",
            DiffusionType::Trust => "trust",
        }
    }
}

impl fmt::Display for DiffusionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiffusionType {
    type Err = AgoraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiffusionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.to_lowercase())
            .ok_or_else(|| AgoraError::UnknownVariant {
                kind: "diffusion type",
                name: s.to_string(),
            })
    }
}

/// Centrality measure selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CentralityKind {
    Degree,
    Betweenness,
    Closeness,
    Eigenvector,
}

impl FromStr for CentralityKind {
    type Err = AgoraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "degree" => Ok(CentralityKind::Degree),
            "betweenness" => Ok(CentralityKind::Betweenness),
            "closeness" => Ok(CentralityKind::Closeness),
            "eigenvector" => Ok(CentralityKind::Eigenvector),
            _ => Err(AgoraError::UnknownVariant {
                kind: "centrality type",
                name: s.to_string(),
            }),
        }
    }
}

/// Attributes carried by an agent node.
///
/// Effects read named fields instead of looking up string keys, so each
/// transform's inputs are visible in its signature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentAttributes {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub knowledge: BTreeMap<DomainId, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// Read and blended by the learning effect (absent reads as 1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_level: Option<f64>,
}

impl AgentAttributes {
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    pub fn with_cluster(mut self, cluster: usize) -> Self {
        self.cluster = Some(cluster);
        self
    }

    pub fn with_knowledge_level(mut self, level: f64) -> Self {
        self.knowledge_level = Some(level);
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }
}

/// Growth law used by the direct effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthModel {
    /// `1 + s * n / 100`
    #[default]
    Metcalfe,
    /// `1 + s * ln(n) / 5`
    Odlyzko,
}

fn default_learning_rate() -> f64 {
    0.1
}
fn default_capacity() -> f64 {
    1000.0
}
fn default_congestion_threshold() -> f64 {
    0.7
}

/// Typed configuration of a network effect, one variant per [`EffectType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    Direct {
        #[serde(default)]
        resource_types: Vec<String>,
        #[serde(default)]
        model: GrowthModel,
    },
    Indirect {
        #[serde(default)]
        primary_type: String,
        #[serde(default)]
        complementary_types: Vec<String>,
    },
    Local {
        #[serde(default)]
        resource_types: Vec<String>,
    },
    Learning {
        #[serde(default)]
        resource_types: Vec<String>,
        #[serde(default = "default_learning_rate")]
        learning_rate: f64,
    },
    Coordination {
        #[serde(default)]
        resource_types: Vec<String>,
    },
    Congestion {
        #[serde(default)]
        resource_types: Vec<String>,
        /// Per-resource capacity; resources not listed use `default_capacity`.
        #[serde(default)]
        capacities: BTreeMap<String, f64>,
        #[serde(default = "default_capacity")]
        default_capacity: f64,
        #[serde(default = "default_congestion_threshold")]
        threshold: f64,
    },
}

impl EffectKind {
    pub fn direct(resource_types: &[&str]) -> Self {
        EffectKind::Direct {
            resource_types: to_strings(resource_types),
            model: GrowthModel::Metcalfe,
        }
    }

    pub fn indirect(primary_type: &str, complementary_types: &[&str]) -> Self {
        EffectKind::Indirect {
            primary_type: primary_type.to_string(),
            complementary_types: to_strings(complementary_types),
        }
    }

    pub fn local(resource_types: &[&str]) -> Self {
        EffectKind::Local {
            resource_types: to_strings(resource_types),
        }
    }

    pub fn learning(resource_types: &[&str]) -> Self {
        EffectKind::Learning {
            resource_types: to_strings(resource_types),
            learning_rate: default_learning_rate(),
        }
    }

    pub fn coordination(resource_types: &[&str]) -> Self {
        EffectKind::Coordination {
            resource_types: to_strings(resource_types),
        }
    }

    pub fn congestion(resource_types: &[&str]) -> Self {
        EffectKind::Congestion {
            resource_types: to_strings(resource_types),
            capacities: BTreeMap::new(),
            default_capacity: default_capacity(),
            threshold: default_congestion_threshold(),
        }
    }

    pub fn effect_type(&self) -> EffectType {
        match self {
            EffectKind::Direct { .. } => EffectType::Direct,
            EffectKind::Indirect { .. } => EffectType::Indirect,
            EffectKind::Local { .. } => EffectType::Local,
            EffectKind::Learning { .. } => EffectType::Learning,
            EffectKind::Coordination { .. } => EffectType::Coordination,
            EffectKind::Congestion { .. } => EffectType::Congestion,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A registered network effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEffect {
    pub id: String,
    /// Effect strength in [0, 1].
    pub strength: f64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(flatten)]
    pub kind: EffectKind,
}

fn default_active() -> bool {
    true
}

impl NetworkEffect {
    pub fn new(id: impl Into<String>, strength: f64, kind: EffectKind) -> Self {
        Self {
            id: id.into(),
            strength,
            is_active: true,
            kind,
        }
    }

    pub fn effect_type(&self) -> EffectType {
        self.kind.effect_type()
    }
}

/// A knowledge domain with its learning friction and prerequisites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDomain {
    pub id: DomainId,
    /// Complexity in [0, 1]; learning is scaled by `1 - 0.5 * complexity`.
    pub complexity: f64,
    #[serde(default)]
    pub prerequisites: Vec<DomainId>,
}

impl KnowledgeDomain {
    pub fn new(id: impl Into<DomainId>, complexity: f64, prerequisites: Vec<DomainId>) -> Self {
        Self {
            id: id.into(),
            complexity,
            prerequisites,
        }
    }

    pub fn complexity_factor(&self) -> f64 {
        1.0 - 0.5 * self.complexity
    }
}

/// Marker for a computation that fell back to a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degradation {
    /// Power iteration did not converge; degree centrality was returned.
    EigenvectorDidNotConverge,
    /// The requested centrality name was not recognised; all scores are zero.
    UnknownCentrality(String),
    /// Scores cover only the largest connected component.
    LargestComponentOnly,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_type_parses_both_spellings() {
        assert_eq!("small-world".parse::<NetworkType>().unwrap(), NetworkType::SmallWorld);
        assert_eq!("SCALE_FREE".parse::<NetworkType>().unwrap(), NetworkType::ScaleFree);
        assert!("mesh".parse::<NetworkType>().is_err());
    }

    #[test]
    fn effect_kind_deserializes_with_defaults() {
        let effect: NetworkEffect = toml::from_str(
            r#"
            id = "crowding"
            strength = 0.8
            type = "congestion"
            resource_types = ["bandwidth"]
            "#,
        )
        .unwrap();

        assert!(effect.is_active);
        assert_eq!(effect.effect_type(), EffectType::Congestion);
        match effect.kind {
            EffectKind::Congestion {
                default_capacity,
                threshold,
                ..
            } => {
                assert_eq!(default_capacity, 1000.0);
                assert_eq!(threshold, 0.7);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn complexity_factor_halves_at_full_complexity() {
        let domain = KnowledgeDomain::new("rust", 1.0, vec![]);
        assert_eq!(domain.complexity_factor(), 0.5);
    }

    #[test]
    fn centrality_kind_rejects_unknown() {
        let err = "pagerank".parse::<CentralityKind>().unwrap_err();
        assert!(err.to_string().contains("pagerank"));
    }
}
