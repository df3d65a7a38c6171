//! # Agora Runtime
//!
//! Agent networks and the processes that run over them.
//!
//! An [`network::AgentNetwork`] is generated from one of six topologies,
//! grows by that topology's attachment rule, and transforms per-agent
//! resource values through registered network effects. The same network
//! hosts Bass diffusion runs, and a [`knowledge::KnowledgeDiffusionModel`]
//! owns one to spread knowledge domains between agents.

pub mod analysis;
pub mod diffusion;
pub mod effects;
pub mod knowledge;
pub mod layout;
pub mod network;
pub mod scenario;
pub mod topology;
