//! # Agora
//!
//! Simulate how value, adoption and knowledge move through networks of agents.
//!
//! ## Quick Start
//!
//! ```rust
//! use agora::prelude::*;
//! use std::collections::BTreeMap;
//!
//! // Four fully connected agents
//! let mut network = AgentNetwork::new("demo", NetworkType::Complete, NetworkConfig::empty());
//! for id in ["a", "b", "c", "d"] {
//!     network.add_agent(id, AgentAttributes::default());
//! }
//!
//! // Metcalfe-style direct effect on resource "x"
//! network.add_network_effect("metcalfe", 0.5, EffectKind::direct(&["x"]));
//!
//! let mut values = AgentValues::new();
//! for id in ["a", "b", "c", "d"] {
//!     values.insert(AgentId::new(id), BTreeMap::from([("x".to_string(), 10.0)]));
//! }
//! let boosted = network.apply_network_effects(&values);
//! assert!((boosted[&AgentId::new("a")]["x"] - 10.2).abs() < 1e-9);
//! ```
//!
//! ## Architecture
//!
//! - [`agora_core`] - Identifiers, topology and effect descriptors, errors, Louvain
//! - [`agora_runtime`] - Networks, effects, analysis, diffusion, knowledge, scenarios
//!
//! ## Knowledge diffusion
//!
//! ```rust
//! use agora::prelude::*;
//! use std::collections::BTreeMap;
//!
//! let mut network = AgentNetwork::new("lab", NetworkType::Random, NetworkConfig::empty());
//! network.add_connection("mentor", "student", 1.0);
//!
//! let mut model = KnowledgeDiffusionModel::new(network);
//! model.add_knowledge_domain("rust", 0.4, vec![]);
//! model.initialize_agent_knowledge("mentor", BTreeMap::from([("rust".to_string(), 0.9)]), 0.1);
//! model.initialize_agent_knowledge("student", BTreeMap::new(), 0.3);
//! model.update_knowledge(5);
//!
//! let student = model.agent_knowledge(&AgentId::new("student")).unwrap();
//! assert!(student.level("rust").unwrap() > 0.0);
//! ```

pub use agora_core as core;
pub use agora_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust
/// use agora::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use agora_core::types::{
        AgentAttributes, AgentId, AgentValues,
        CentralityKind, Degradation,
        DiffusionType, DomainId,
        EffectKind, EffectType, GrowthModel, NetworkEffect,
        KnowledgeDomain, NetworkType,
    };

    // Error types
    pub use agora_core::error::{AgoraError, ConfigError, Result};

    // Community detection
    pub use agora_core::louvain::{compute_modularity, louvain_communities, LouvainResult};

    // Runtime
    pub use agora_runtime::analysis::{Centrality, NetworkStatistics};
    pub use agora_runtime::diffusion::{DiffusionConfig, DiffusionParams, DiffusionTrace};
    pub use agora_runtime::knowledge::{
        AgentKnowledge, DomainStatistics, Expertise,
        KnowledgeDiffusionModel, KnowledgeStatistics, LevelSummary, Team,
    };
    pub use agora_runtime::layout::{VisualEdge, VisualNode, VisualizationData};
    pub use agora_runtime::network::{AgentNetwork, NetworkConfig};
    pub use agora_runtime::scenario::Scenario;
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
