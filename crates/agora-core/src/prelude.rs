//! Agora Core Prelude - convenient imports for common usage.
//!
//! ```rust
//! use agora_core::prelude::*;
//! ```

pub use crate::types::{
    AgentAttributes, AgentId, AgentValues, CentralityKind, Degradation, DiffusionType, DomainId,
    EffectKind, EffectType, GrowthModel, KnowledgeDomain, NetworkEffect, NetworkType,
};

pub use crate::louvain::{compute_modularity, louvain_communities, LouvainResult};

pub use crate::error::{AgoraError, ConfigError, Result};
