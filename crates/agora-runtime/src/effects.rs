//! Network-effect transforms.
//!
//! Each transform takes the current per-agent values and returns new
//! values; the network is only read. The learning effect is the one
//! transform with a side effect, which it reports back as
//! `knowledge_updates` for the caller to write into agent attributes.

use crate::network::AgentNetwork;
use agora_core::types::{AgentId, AgentValues, EffectKind, GrowthModel, NetworkEffect};
use std::collections::{BTreeMap, HashMap};

/// Result of applying one effect.
#[derive(Debug, Clone, Default)]
pub struct EffectOutcome {
    pub values: AgentValues,
    /// New `knowledge_level` per agent (learning effect only).
    pub knowledge_updates: Vec<(AgentId, f64)>,
}

impl EffectOutcome {
    fn values(values: AgentValues) -> Self {
        Self {
            values,
            knowledge_updates: Vec::new(),
        }
    }
}

/// Knowledge level read by the learning effect when an agent has none.
pub const DEFAULT_KNOWLEDGE_LEVEL: f64 = 1.0;
/// Strategy read by the coordination effect when an agent has none.
pub const DEFAULT_STRATEGY: &str = "default";
/// Congestion multipliers never drop below this floor.
pub const CONGESTION_FLOOR: f64 = 0.1;

/// Apply a single effect to `values`.
pub fn apply(network: &AgentNetwork, effect: &NetworkEffect, values: AgentValues) -> EffectOutcome {
    let s = effect.strength;
    match &effect.kind {
        EffectKind::Direct {
            resource_types,
            model,
        } => EffectOutcome::values(direct(values, s, resource_types, *model)),
        EffectKind::Indirect {
            primary_type,
            complementary_types,
        } => EffectOutcome::values(indirect(values, s, primary_type, complementary_types)),
        EffectKind::Local { resource_types } => {
            EffectOutcome::values(local(network, values, s, resource_types))
        }
        EffectKind::Learning {
            resource_types,
            learning_rate,
        } => learning(network, values, s, resource_types, *learning_rate),
        EffectKind::Coordination { resource_types } => {
            EffectOutcome::values(coordination(network, values, s, resource_types))
        }
        EffectKind::Congestion {
            resource_types,
            capacities,
            default_capacity,
            threshold,
        } => EffectOutcome::values(congestion(
            values,
            s,
            resource_types,
            capacities,
            *default_capacity,
            *threshold,
        )),
    }
}

/// Multiply every listed resource that an agent holds by `multiplier`.
fn scale(entry: &mut BTreeMap<String, f64>, resource_types: &[String], multiplier: f64) {
    for resource in resource_types {
        if let Some(v) = entry.get_mut(resource) {
            *v *= multiplier;
        }
    }
}

/// Value grows with the number of participants in `values`.
pub fn direct(
    mut values: AgentValues,
    strength: f64,
    resource_types: &[String],
    model: GrowthModel,
) -> AgentValues {
    let n = values.len();
    if n <= 1 {
        return values;
    }

    let multiplier = match model {
        GrowthModel::Metcalfe => 1.0 + strength * (n as f64 / 100.0),
        GrowthModel::Odlyzko => 1.0 + strength * ((n as f64).ln() / 5.0),
    };
    for entry in values.values_mut() {
        scale(entry, resource_types, multiplier);
    }
    values
}

/// The primary resource grows with complementary resources held network-wide.
pub fn indirect(
    mut values: AgentValues,
    strength: f64,
    primary_type: &str,
    complementary_types: &[String],
) -> AgentValues {
    if primary_type.is_empty() || complementary_types.is_empty() {
        return values;
    }

    let total: f64 = values
        .values()
        .flat_map(|entry| complementary_types.iter().map(move |c| entry.get(c).copied().unwrap_or(0.0)))
        .sum();
    if total <= 0.0 {
        return values;
    }

    let multiplier = 1.0 + strength * (1.0 + total / 100.0).ln();
    for entry in values.values_mut() {
        if let Some(v) = entry.get_mut(primary_type) {
            *v *= multiplier;
        }
    }
    values
}

/// Value grows with the weighted resources of an agent's neighbours.
///
/// Neighbour values are read from the input, not from partially updated output.
pub fn local(
    network: &AgentNetwork,
    values: AgentValues,
    strength: f64,
    resource_types: &[String],
) -> AgentValues {
    let mut result = values.clone();

    for (agent, entry) in result.iter_mut() {
        let neighbors = network.weighted_neighbors(agent);
        if neighbors.is_empty() {
            continue;
        }

        let local_value: f64 = neighbors
            .iter()
            .filter_map(|(n, w)| values.get(n).map(|nv| (nv, w)))
            .map(|(nv, w)| {
                resource_types
                    .iter()
                    .map(|r| w * nv.get(r).copied().unwrap_or(0.0))
                    .sum::<f64>()
            })
            .sum();

        let multiplier = 1.0 + strength * (local_value / 100.0).tanh();
        scale(entry, resource_types, multiplier);
    }
    result
}

/// Agents blend their knowledge toward their neighbours' average, then
/// gain value logarithmically in the new knowledge.
///
/// All blends use knowledge levels as they were before this call.
pub fn learning(
    network: &AgentNetwork,
    mut values: AgentValues,
    strength: f64,
    resource_types: &[String],
    learning_rate: f64,
) -> EffectOutcome {
    let knowledge_of = |id: &AgentId| {
        network
            .agent_attributes(id)
            .and_then(|a| a.knowledge_level)
            .unwrap_or(DEFAULT_KNOWLEDGE_LEVEL)
    };

    let mut updates = Vec::new();
    for (agent, entry) in values.iter_mut() {
        let neighbors = network.neighbors(agent);
        if neighbors.is_empty() {
            continue;
        }

        let knowledge = knowledge_of(agent);
        let avg = neighbors.iter().map(|n| knowledge_of(n)).sum::<f64>() / neighbors.len() as f64;
        let new_knowledge = knowledge + learning_rate * (avg - knowledge);

        let multiplier = 1.0 + strength * (1.0 + new_knowledge).ln();
        scale(entry, resource_types, multiplier);
        updates.push((agent.clone(), new_knowledge));
    }

    EffectOutcome {
        values,
        knowledge_updates: updates,
    }
}

/// Value grows with the share of other agents that follow the same strategy.
pub fn coordination(
    network: &AgentNetwork,
    mut values: AgentValues,
    strength: f64,
    resource_types: &[String],
) -> AgentValues {
    let total = values.len();
    if total <= 1 {
        return values;
    }

    let strategies: BTreeMap<AgentId, String> = values
        .keys()
        .map(|id| {
            let strategy = network
                .agent_attributes(id)
                .and_then(|a| a.strategy.clone())
                .unwrap_or_else(|| DEFAULT_STRATEGY.to_string());
            (id.clone(), strategy)
        })
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for strategy in strategies.values() {
        *counts.entry(strategy.as_str()).or_insert(0) += 1;
    }

    for (agent, entry) in values.iter_mut() {
        let same = strategies
            .get(agent)
            .and_then(|s| counts.get(s.as_str()))
            .copied()
            .unwrap_or(1);
        let level = (same - 1) as f64 / (total - 1) as f64;
        scale(entry, resource_types, 1.0 + strength * level);
    }
    values
}

/// Sigmoid penalty once network-wide usage of a resource passes
/// `threshold` of its capacity.
pub fn congestion(
    mut values: AgentValues,
    strength: f64,
    resource_types: &[String],
    capacities: &BTreeMap<String, f64>,
    default_capacity: f64,
    threshold: f64,
) -> AgentValues {
    let usage: Vec<f64> = resource_types
        .iter()
        .map(|r| values.values().filter_map(|e| e.get(r)).sum())
        .collect();

    for (resource, usage) in resource_types.iter().zip(usage) {
        let capacity = capacities.get(resource).copied().unwrap_or(default_capacity);
        if capacity <= 0.0 {
            continue;
        }

        let multiplier = congestion_multiplier(usage / capacity, strength, threshold);
        if multiplier == 1.0 {
            continue;
        }

        for entry in values.values_mut() {
            if let Some(v) = entry.get_mut(resource) {
                *v *= multiplier;
            }
        }
    }
    values
}

/// Multiplier for a given utilisation `level` (usage / capacity).
pub fn congestion_multiplier(level: f64, strength: f64, threshold: f64) -> f64 {
    if level <= threshold {
        return 1.0;
    }
    let span = (1.0 - threshold).max(f64::EPSILON);
    let x = (level - threshold) / span;
    let penalty = strength / (1.0 + (-10.0 * (x - 0.5)).exp());
    (1.0 - penalty).max(CONGESTION_FLOOR)
}
