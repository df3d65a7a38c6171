//! Bass-model diffusion of adoption over an [`AgentNetwork`].
//!
//! Every agent carries an adoption level in [0, 1]. Each step, levels
//! decay, then grow by `(p + q * neighbour_average) * (1 - level)`, with a
//! one-off boost when a level first crosses the adoption threshold. All
//! agents update from the previous step's levels.

use crate::network::AgentNetwork;
use agora_core::types::{AgentId, DiffusionType};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Added to a level on the step it crosses the adoption threshold.
pub const THRESHOLD_BOOST: f64 = 0.2;

/// Resolved parameters for one diffusion run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiffusionParams {
    pub adoption_threshold: f64,
    pub social_influence: f64,
    pub decay_rate: f64,
    /// Bass `p`: adoption independent of neighbours.
    pub innovation_coefficient: f64,
}

impl DiffusionParams {
    /// Defaults for each kind of diffusion process.
    pub fn for_type(diffusion_type: DiffusionType) -> Self {
        let (adoption_threshold, social_influence, decay_rate) = match diffusion_type {
            DiffusionType::Innovation => (0.6, 0.4, 0.05),
            DiffusionType::Knowledge => (0.3, 0.3, 0.02),
            DiffusionType::Behavior => (0.4, 0.5, 0.05),
            DiffusionType::Capability => (0.7, 0.2, 0.05),
            DiffusionType::Trust => (0.8, 0.6, 0.1),
        };
        Self {
            adoption_threshold,
            social_influence,
            decay_rate,
            innovation_coefficient: 0.03,
        }
    }
}

/// Caller overrides for a diffusion run. Unset fields use the per-type defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffusionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adoption_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_influence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decay_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub innovation_coefficient: Option<f64>,
    /// Per-agent multiplier on adoption probability (default 1.0).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub individual_factors: BTreeMap<AgentId, f64>,
}

impl DiffusionConfig {
    pub fn resolve(&self, diffusion_type: DiffusionType) -> DiffusionParams {
        let base = DiffusionParams::for_type(diffusion_type);
        DiffusionParams {
            adoption_threshold: self.adoption_threshold.unwrap_or(base.adoption_threshold),
            social_influence: self.social_influence.unwrap_or(base.social_influence),
            decay_rate: self.decay_rate.unwrap_or(base.decay_rate),
            innovation_coefficient: self
                .innovation_coefficient
                .unwrap_or(base.innovation_coefficient),
        }
    }
}

/// Adoption levels over time; `steps[0]` is the initial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffusionTrace {
    pub diffusion_type: DiffusionType,
    pub params: DiffusionParams,
    pub steps: Vec<BTreeMap<AgentId, f64>>,
}

impl DiffusionTrace {
    pub fn final_levels(&self) -> Option<&BTreeMap<AgentId, f64>> {
        self.steps.last()
    }

    /// Mean adoption level at each step.
    pub fn mean_levels(&self) -> Vec<f64> {
        self.steps
            .iter()
            .map(|levels| {
                if levels.is_empty() {
                    0.0
                } else {
                    levels.values().sum::<f64>() / levels.len() as f64
                }
            })
            .collect()
    }

    /// Number of agents at or above the adoption threshold at each step.
    pub fn adopter_counts(&self) -> Vec<usize> {
        let threshold = self.params.adoption_threshold;
        self.steps
            .iter()
            .map(|levels| levels.values().filter(|&&l| l >= threshold).count())
            .collect()
    }
}

impl AgentNetwork {
    /// Run `steps` rounds of diffusion starting from `initial_adopters` at 1.0.
    ///
    /// Adopters that are not in the network are ignored.
    pub fn simulate_diffusion(
        &self,
        diffusion_type: DiffusionType,
        initial_adopters: &[AgentId],
        steps: usize,
        config: &DiffusionConfig,
    ) -> DiffusionTrace {
        let params = config.resolve(diffusion_type);
        let graph = self.graph();
        let ids = self.agents();
        let n = ids.len();

        let mut neighbors: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for edge in graph.edge_references() {
            let (a, b, w) = (edge.source().index(), edge.target().index(), *edge.weight());
            neighbors[a].push((b, w));
            neighbors[b].push((a, w));
        }
        let factors: Vec<f64> = ids
            .iter()
            .map(|id| config.individual_factors.get(id).copied().unwrap_or(1.0))
            .collect();

        let mut adoption = vec![0.0_f64; n];
        for adopter in initial_adopters {
            match self.index_of(adopter) {
                Some(idx) => adoption[idx.index()] = 1.0,
                None => debug!("Ignoring unknown initial adopter {}", adopter),
            }
        }

        let snapshot = |levels: &[f64]| -> BTreeMap<AgentId, f64> {
            ids.iter().cloned().zip(levels.iter().copied()).collect()
        };
        let mut trace = vec![snapshot(&adoption)];

        for _ in 0..steps {
            let next: Vec<f64> = (0..n)
                .map(|v| step_level(v, &adoption, &neighbors[v], factors[v], &params))
                .collect();
            adoption = next;
            trace.push(snapshot(&adoption));
        }

        debug!(
            "Simulated {} diffusion over {} agents for {} steps",
            diffusion_type, n, steps
        );
        DiffusionTrace {
            diffusion_type,
            params,
            steps: trace,
        }
    }
}

fn step_level(
    v: usize,
    adoption: &[f64],
    neighbors: &[(usize, f64)],
    factor: f64,
    params: &DiffusionParams,
) -> f64 {
    let mut current = adoption[v];
    if current > 0.0 {
        current = (current - params.decay_rate).max(0.0);
    }
    if neighbors.is_empty() {
        return current;
    }

    let total_weight: f64 = neighbors.iter().map(|(_, w)| w).sum();
    let avg = if total_weight > 0.0 {
        neighbors.iter().map(|&(u, w)| w * adoption[u]).sum::<f64>() / total_weight
    } else {
        0.0
    };

    let probability =
        (params.innovation_coefficient + params.social_influence * avg) * (1.0 - current) * factor;
    let mut level = current + probability;
    if level > params.adoption_threshold && current < params.adoption_threshold {
        level += THRESHOLD_BOOST;
    }
    level.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkConfig;
    use agora_core::types::{AgentAttributes, NetworkType};

    fn pair() -> AgentNetwork {
        let mut net = AgentNetwork::new("p", NetworkType::Random, NetworkConfig::empty().with_edge_probability(0.0));
        net.add_connection("a", "b", 1.0);
        net.add_agent("loner", AgentAttributes::default());
        net
    }

    #[test]
    fn per_type_defaults() {
        let trust = DiffusionParams::for_type(DiffusionType::Trust);
        assert_eq!((trust.adoption_threshold, trust.social_influence, trust.decay_rate), (0.8, 0.6, 0.1));
        let knowledge = DiffusionParams::for_type(DiffusionType::Knowledge);
        assert_eq!(knowledge.decay_rate, 0.02);
        assert_eq!(knowledge.innovation_coefficient, 0.03);
    }

    #[test]
    fn overrides_replace_defaults() {
        let config = DiffusionConfig {
            decay_rate: Some(0.0),
            ..DiffusionConfig::default()
        };
        let params = config.resolve(DiffusionType::Innovation);
        assert_eq!(params.decay_rate, 0.0);
        assert_eq!(params.adoption_threshold, 0.6);
    }

    #[test]
    fn one_step_bass_update() {
        let net = pair();
        let trace = net.simulate_diffusion(
            DiffusionType::Innovation,
            &[AgentId::new("a")],
            1,
            &DiffusionConfig::default(),
        );
        assert_eq!(trace.steps.len(), 2);
        assert_eq!(trace.steps[0][&AgentId::new("a")], 1.0);

        let step = &trace.steps[1];
        // a decays to 0.95, neighbour b is at 0: 0.95 + 0.03 * 0.05
        assert!((step[&AgentId::new("a")] - (0.95 + 0.03 * 0.05)).abs() < 1e-12);
        // b: (0.03 + 0.4 * 1.0) * 1.0
        assert!((step[&AgentId::new("b")] - 0.43).abs() < 1e-12);
        // isolated agents only decay
        assert_eq!(step[&AgentId::new("loner")], 0.0);
    }

    #[test]
    fn crossing_threshold_adds_boost() {
        let net = pair();
        let config = DiffusionConfig {
            adoption_threshold: Some(0.4),
            ..DiffusionConfig::default()
        };
        let trace = net.simulate_diffusion(DiffusionType::Innovation, &[AgentId::new("a")], 1, &config);
        assert!((trace.steps[1][&AgentId::new("b")] - 0.63).abs() < 1e-12);
    }

    #[test]
    fn levels_stay_in_unit_interval() {
        let net = AgentNetwork::new(
            "sf",
            NetworkType::ScaleFree,
            NetworkConfig::default().with_initial_nodes(30).with_seed(11),
        );
        let mut factors = BTreeMap::new();
        factors.insert(AgentId::new("0"), 10.0);
        let config = DiffusionConfig {
            individual_factors: factors,
            ..DiffusionConfig::default()
        };
        let trace = net.simulate_diffusion(DiffusionType::Trust, &[AgentId::new("1")], 20, &config);
        assert_eq!(trace.steps.len(), 21);
        for levels in &trace.steps {
            assert!(levels.values().all(|&l| (0.0..=1.0).contains(&l)));
        }
        assert_eq!(trace.mean_levels().len(), 21);
    }

    #[test]
    fn unknown_adopters_are_ignored() {
        let net = pair();
        let trace = net.simulate_diffusion(
            DiffusionType::Behavior,
            &[AgentId::new("ghost")],
            0,
            &DiffusionConfig::default(),
        );
        assert_eq!(trace.steps.len(), 1);
        assert!(trace.steps[0].values().all(|&l| l == 0.0));
        assert_eq!(trace.adopter_counts(), vec![0]);
    }
}
