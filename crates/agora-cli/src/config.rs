//! Scenario discovery for the Agora CLI.

use agora::prelude::*;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// File name searched for when no scenario is given.
pub const SCENARIO_FILE: &str = "agora.toml";

/// Load the scenario at `path`, or the nearest agora.toml, or the defaults.
pub fn load(path: Option<&str>) -> Result<Scenario> {
    let path = match path {
        Some(p) => Some(PathBuf::from(p)),
        None => std::env::current_dir()
            .ok()
            .and_then(|dir| find_scenario_file(&dir)),
    };

    match path {
        Some(path) => {
            tracing::debug!("Using scenario {}", path.display());
            Scenario::load(&path).with_context(|| format!("Failed to load scenario: {}", path.display()))
        }
        None => {
            tracing::info!("No {} found, using defaults", SCENARIO_FILE);
            Ok(Scenario::default())
        }
    }
}

/// Find agora.toml in `start` or its parent directories.
pub fn find_scenario_file(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(SCENARIO_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}
