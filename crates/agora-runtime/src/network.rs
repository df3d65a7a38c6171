//! AgentNetwork - a weighted undirected graph of agents.
//!
//! The network owns its agents and connections. It is built by one of the
//! topology generators, grows through [`AgentNetwork::add_agent`] using the
//! same attachment rule as its generator, and transforms per-agent resource
//! values through the registered network effects.
//!
//! The backing store is petgraph's `Graph` with a HashMap index from
//! [`AgentId`] to `NodeIndex`. Connection weights are additionally recorded
//! in a symmetric `(a, b)` / `(b, a)` ledger that is kept in lock-step with
//! the graph.

use crate::effects;
use crate::topology::{self, INTER_CLUSTER_PROBABILITY, INTRA_CLUSTER_PROBABILITY};
use agora_core::error::{check_range, Result};
use agora_core::types::*;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Undirected;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Generator and attachment parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Node count for every generator except hierarchical (default: 20).
    #[serde(default = "default_initial_nodes")]
    pub initial_nodes: usize,
    /// Children per node in a hierarchical tree (default: 2).
    #[serde(default = "default_branching_factor")]
    pub branching_factor: usize,
    /// Height of a hierarchical tree (default: 3).
    #[serde(default = "default_height")]
    pub height: usize,
    /// Edge probability of a random network (default: 0.2).
    #[serde(default = "default_edge_probability")]
    pub edge_probability: f64,
    /// Lattice neighbours in a small world (default: 4).
    #[serde(default = "default_nearest_neighbors")]
    pub nearest_neighbors: usize,
    /// Rewiring probability in a small world (default: 0.1).
    #[serde(default = "default_rewiring_probability")]
    pub rewiring_probability: f64,
    /// Edges per new node in a scale-free network (default: 2).
    #[serde(default = "default_new_edges")]
    pub new_edges: usize,
    /// Number of clusters in a clustered network (default: 4).
    #[serde(default = "default_clusters")]
    pub clusters: usize,
    /// Seed for reproducible generation and attachment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_initial_nodes() -> usize { 20 }
fn default_branching_factor() -> usize { 2 }
fn default_height() -> usize { 3 }
fn default_edge_probability() -> f64 { 0.2 }
fn default_nearest_neighbors() -> usize { 4 }
fn default_rewiring_probability() -> f64 { 0.1 }
fn default_new_edges() -> usize { 2 }
fn default_clusters() -> usize { 4 }

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            initial_nodes: default_initial_nodes(),
            branching_factor: default_branching_factor(),
            height: default_height(),
            edge_probability: default_edge_probability(),
            nearest_neighbors: default_nearest_neighbors(),
            rewiring_probability: default_rewiring_probability(),
            new_edges: default_new_edges(),
            clusters: default_clusters(),
            seed: None,
        }
    }
}

impl NetworkConfig {
    /// Start with no generated nodes (agents are added explicitly).
    pub fn empty() -> Self {
        Self {
            initial_nodes: 0,
            ..Self::default()
        }
    }

    pub fn with_initial_nodes(mut self, n: usize) -> Self {
        self.initial_nodes = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_edge_probability(mut self, p: f64) -> Self {
        self.edge_probability = p;
        self
    }

    /// Reject probabilities outside [0, 1].
    pub fn validate(&self) -> Result<()> {
        check_range("edge_probability", self.edge_probability, 0.0, 1.0)?;
        check_range("rewiring_probability", self.rewiring_probability, 0.0, 1.0)?;
        Ok(())
    }
}

/// Node payload: the agent's id and attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentNode {
    pub id: AgentId,
    pub attributes: AgentAttributes,
}

/// A weighted undirected network of agents.
pub struct AgentNetwork {
    id: String,
    network_type: NetworkType,
    config: NetworkConfig,
    graph: Graph<AgentNode, f64, Undirected>,
    node_index: HashMap<AgentId, NodeIndex>,
    /// Symmetric weight ledger: both orientations of every connection.
    edge_weights: HashMap<(AgentId, AgentId), f64>,
    /// Registered effects in insertion order.
    effects: Vec<NetworkEffect>,
    pub(crate) statistics: Option<crate::analysis::NetworkStatistics>,
    pub(crate) rng: StdRng,
}

impl AgentNetwork {
    /// Create a network and generate its initial topology.
    pub fn new(id: impl Into<String>, network_type: NetworkType, config: NetworkConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let generated = topology::generate(network_type, &config, &mut rng);

        let mut network = Self {
            id: id.into(),
            network_type,
            config,
            graph: Graph::new_undirected(),
            node_index: HashMap::new(),
            edge_weights: HashMap::new(),
            effects: Vec::new(),
            statistics: None,
            rng,
        };

        for i in 0..generated.node_count {
            let attributes = AgentAttributes {
                cluster: generated.clusters.get(i).copied().flatten(),
                ..AgentAttributes::default()
            };
            network.insert_node(AgentId::from_index(i), attributes);
        }
        for &(a, b) in &generated.edges {
            network.link(&AgentId::from_index(a), &AgentId::from_index(b), 1.0);
        }

        debug!(
            "Generated {} network {} with {} agents and {} connections",
            network_type,
            network.id,
            network.agent_count(),
            network.connection_count()
        );
        network
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn network_type(&self) -> NetworkType {
        self.network_type
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub(crate) fn graph(&self) -> &Graph<AgentNode, f64, Undirected> {
        &self.graph
    }

    pub(crate) fn index_of(&self, id: &AgentId) -> Option<NodeIndex> {
        self.node_index.get(id).copied()
    }

    pub fn contains_agent(&self, id: &AgentId) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn agent_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All agent ids in insertion order.
    pub fn agents(&self) -> Vec<AgentId> {
        self.graph
            .node_indices()
            .map(|idx| self.graph[idx].id.clone())
            .collect()
    }

    /// All connections as (a, b, weight), each undirected edge once.
    pub fn connections(&self) -> Vec<(AgentId, AgentId, f64)> {
        self.graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].id.clone(),
                    self.graph[e.target()].id.clone(),
                    *e.weight(),
                )
            })
            .collect()
    }

    fn insert_node(&mut self, id: AgentId, attributes: AgentAttributes) -> NodeIndex {
        let idx = self.graph.add_node(AgentNode {
            id: id.clone(),
            attributes,
        });
        self.node_index.insert(id, idx);
        self.statistics = None;
        idx
    }

    /// Set the weight of an edge between two existing agents.
    fn link(&mut self, a: &AgentId, b: &AgentId, weight: f64) {
        let (Some(ia), Some(ib)) = (self.index_of(a), self.index_of(b)) else {
            return;
        };
        if let Some(edge) = self.graph.find_edge(ia, ib) {
            self.graph[edge] = weight;
        } else {
            self.graph.add_edge(ia, ib, weight);
        }
        self.edge_weights.insert((a.clone(), b.clone()), weight);
        self.edge_weights.insert((b.clone(), a.clone()), weight);
        self.statistics = None;
    }

    /// Add an agent and attach it with this network's growth rule.
    ///
    /// Returns `false` (and leaves the existing agent untouched) if the id
    /// is already present.
    pub fn add_agent(&mut self, id: impl Into<AgentId>, attributes: AgentAttributes) -> bool {
        let id = id.into();
        if self.contains_agent(&id) {
            return false;
        }

        let existing = self.agents();
        self.insert_node(id.clone(), attributes);
        self.connect_new_agent(&id, existing);

        info!("Added agent {} to network {}", id, self.id);
        true
    }

    fn connect_new_agent(&mut self, id: &AgentId, existing: Vec<AgentId>) {
        // Every clustered agent gets a label, including the first one.
        let cluster = if self.network_type == NetworkType::Clustered {
            let cluster = self.rng.gen_range(0..self.config.clusters.max(1));
            self.update_agent_attributes(id, |attrs| attrs.cluster = Some(cluster));
            Some(cluster)
        } else {
            None
        };

        if existing.is_empty() {
            return;
        }

        match self.network_type {
            NetworkType::Hierarchical => {
                // Cheapest parent: fewest neighbours, earliest on ties.
                let parent = existing
                    .iter()
                    .min_by_key(|n| self.neighbors(n).len())
                    .cloned();
                if let Some(parent) = parent {
                    self.add_connection(id.clone(), parent, 1.0);
                }
            }
            NetworkType::Random => {
                let p = self.config.edge_probability;
                for node in existing {
                    if self.rng.gen::<f64>() < p {
                        self.add_connection(id.clone(), node, 1.0);
                    }
                }
            }
            NetworkType::SmallWorld => {
                // First k agents in insertion order, not true lattice neighbours.
                let k = self.config.nearest_neighbors.min(existing.len());
                for node in existing.into_iter().take(k) {
                    self.add_connection(id.clone(), node, 1.0);
                }
            }
            NetworkType::ScaleFree => {
                let m = self.config.new_edges.min(existing.len());
                let weighted: Vec<(AgentId, usize)> = existing
                    .iter()
                    .map(|n| (n.clone(), self.degree(n)))
                    .filter(|(_, d)| *d > 0)
                    .collect();

                let selected: Vec<AgentId> = if weighted.is_empty() {
                    existing.choose_multiple(&mut self.rng, m).cloned().collect()
                } else {
                    match weighted.choose_multiple_weighted(&mut self.rng, m, |(_, d)| *d as f64) {
                        Ok(chosen) => chosen.map(|(n, _)| n.clone()).collect(),
                        Err(e) => {
                            warn!("Preferential attachment failed ({}), attaching uniformly", e);
                            existing.choose_multiple(&mut self.rng, m).cloned().collect()
                        }
                    }
                };
                for node in selected {
                    self.add_connection(id.clone(), node, 1.0);
                }
            }
            NetworkType::Clustered => {
                let (same, other): (Vec<AgentId>, Vec<AgentId>) = existing
                    .into_iter()
                    .partition(|n| self.agent_attributes(n).and_then(|a| a.cluster) == cluster);

                for node in same {
                    if self.rng.gen::<f64>() < INTRA_CLUSTER_PROBABILITY {
                        self.add_connection(id.clone(), node, 1.0);
                    }
                }
                if self.rng.gen::<f64>() < INTER_CLUSTER_PROBABILITY {
                    if let Some(node) = other.choose(&mut self.rng).cloned() {
                        self.add_connection(id.clone(), node, 1.0);
                    }
                }
            }
            NetworkType::Complete => {
                for node in existing {
                    self.add_connection(id.clone(), node, 1.0);
                }
            }
        }
    }

    /// Connect two agents, creating either one if missing.
    ///
    /// Re-adding an existing connection overwrites its weight. Self-loops
    /// are ignored; negative weights are clamped to zero.
    pub fn add_connection(&mut self, a: impl Into<AgentId>, b: impl Into<AgentId>, weight: f64) {
        let (a, b) = (a.into(), b.into());
        if a == b {
            warn!("Ignoring self-connection on agent {}", a);
            return;
        }
        let weight = sanitize_weight(weight);

        if !self.contains_agent(&a) {
            self.add_agent(a.clone(), AgentAttributes::default());
        }
        if !self.contains_agent(&b) {
            self.add_agent(b.clone(), AgentAttributes::default());
        }

        self.link(&a, &b, weight);
        debug!("Added connection between {} and {} with weight {}", a, b, weight);
    }

    /// Change the weight of an existing connection. Returns `false` if absent.
    pub fn update_connection(&mut self, a: &AgentId, b: &AgentId, weight: f64) -> bool {
        if !self.has_connection(a, b) {
            warn!("Cannot update non-existent connection between {} and {}", a, b);
            return false;
        }
        let weight = sanitize_weight(weight);
        self.link(a, b, weight);
        debug!("Updated connection between {} and {} to weight {}", a, b, weight);
        true
    }

    /// Remove an existing connection. Returns `false` if absent.
    pub fn remove_connection(&mut self, a: &AgentId, b: &AgentId) -> bool {
        let edge = match (self.index_of(a), self.index_of(b)) {
            (Some(ia), Some(ib)) => self.graph.find_edge(ia, ib),
            _ => None,
        };
        let Some(edge) = edge else {
            warn!("Cannot remove non-existent connection between {} and {}", a, b);
            return false;
        };

        self.graph.remove_edge(edge);
        self.edge_weights.remove(&(a.clone(), b.clone()));
        self.edge_weights.remove(&(b.clone(), a.clone()));
        self.statistics = None;
        debug!("Removed connection between {} and {}", a, b);
        true
    }

    pub fn has_connection(&self, a: &AgentId, b: &AgentId) -> bool {
        match (self.index_of(a), self.index_of(b)) {
            (Some(ia), Some(ib)) => self.graph.find_edge(ia, ib).is_some(),
            _ => false,
        }
    }

    /// Weight recorded in the symmetric ledger for the ordered pair (a, b).
    pub fn connection_weight(&self, a: &AgentId, b: &AgentId) -> Option<f64> {
        self.edge_weights.get(&(a.clone(), b.clone())).copied()
    }

    pub fn agent_attributes(&self, id: &AgentId) -> Option<&AgentAttributes> {
        self.index_of(id).map(|idx| &self.graph[idx].attributes)
    }

    /// Mutate an agent's attributes in place. Returns `false` if the agent is unknown.
    pub fn update_agent_attributes<F>(&mut self, id: &AgentId, f: F) -> bool
    where
        F: FnOnce(&mut AgentAttributes),
    {
        match self.index_of(id) {
            Some(idx) => {
                f(&mut self.graph[idx].attributes);
                debug!("Updated attributes for agent {}", id);
                true
            }
            None => {
                warn!("Cannot update attributes for non-existent agent {}", id);
                false
            }
        }
    }

    pub fn degree(&self, id: &AgentId) -> usize {
        self.index_of(id)
            .map(|idx| self.graph.edges(idx).count())
            .unwrap_or(0)
    }

    pub fn neighbors(&self, id: &AgentId) -> Vec<AgentId> {
        self.weighted_neighbors(id).into_iter().map(|(n, _)| n).collect()
    }

    /// Neighbours with connection weights; empty for unknown agents.
    pub fn weighted_neighbors(&self, id: &AgentId) -> Vec<(AgentId, f64)> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };
        self.graph
            .edges(idx)
            .map(|edge| {
                let other = if edge.source() == idx { edge.target() } else { edge.source() };
                (self.graph[other].id.clone(), *edge.weight())
            })
            .collect()
    }

    /// Register an effect, replacing any effect with the same id in place.
    pub fn add_network_effect(&mut self, id: impl Into<String>, strength: f64, kind: EffectKind) {
        let effect = NetworkEffect::new(id, strength, kind);
        info!("Added network effect {} of type {}", effect.id, effect.effect_type());
        match self.effects.iter_mut().find(|e| e.id == effect.id) {
            Some(slot) => *slot = effect,
            None => self.effects.push(effect),
        }
    }

    /// Enable or disable a registered effect. Returns `false` for unknown ids.
    pub fn set_effect_active(&mut self, id: &str, active: bool) -> bool {
        match self.effects.iter_mut().find(|e| e.id == id) {
            Some(effect) => {
                effect.is_active = active;
                debug!("Effect {} active = {}", id, active);
                true
            }
            None => {
                warn!("Cannot toggle non-existent effect {}", id);
                false
            }
        }
    }

    pub fn effects(&self) -> &[NetworkEffect] {
        &self.effects
    }

    /// Transform per-agent resource values through every active effect.
    ///
    /// The input is never modified. The learning effect updates the
    /// `knowledge_level` attribute of the agents it touches.
    pub fn apply_network_effects(&mut self, values: &AgentValues) -> AgentValues {
        let mut result = values.clone();

        for i in 0..self.effects.len() {
            if !self.effects[i].is_active {
                continue;
            }
            let effect = self.effects[i].clone();
            let outcome = effects::apply(self, &effect, result);
            result = outcome.values;

            for (agent, level) in outcome.knowledge_updates {
                self.update_agent_attributes(&agent, |attrs| attrs.knowledge_level = Some(level));
            }
        }

        result
    }
}

fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_nan() || weight < 0.0 {
        warn!("Connection weight {} clamped to 0.0", weight);
        0.0
    } else {
        weight
    }
}
