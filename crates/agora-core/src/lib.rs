//! # Agora Core
//!
//! Core types for Agora agent-network simulations:
//!
//! - **Identifiers** - [`types::AgentId`] and knowledge domain ids
//! - **Topology tags** - [`types::NetworkType`] selects both the initial
//!   graph generator and the rule that attaches agents added later
//! - **Effects** - [`types::NetworkEffect`] descriptors with a typed
//!   [`types::EffectKind`] per effect type
//! - **Knowledge** - [`types::KnowledgeDomain`] with complexity and prerequisites
//! - **Communities** - deterministic Louvain modularity optimisation
//!
//! ## Quick Start
//!
//! ```rust
//! use agora_core::prelude::*;
//!
//! let effect = NetworkEffect::new("metcalfe", 0.5, EffectKind::direct(&["x"]));
//! assert_eq!(effect.effect_type(), EffectType::Direct);
//! ```

pub mod error;
pub mod louvain;
pub mod prelude;
pub mod types;
