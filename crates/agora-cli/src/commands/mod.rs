//! CLI command implementations.

pub mod diffuse;
pub mod effects;
pub mod export;
pub mod init;
pub mod knowledge;
pub mod stats;
pub mod teams;
