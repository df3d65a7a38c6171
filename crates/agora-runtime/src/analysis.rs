//! Structural analysis of an [`AgentNetwork`]: summary statistics,
//! centrality and community detection.
//!
//! Path metrics use unit edge lengths; communities use connection weights.

use crate::network::AgentNetwork;
use agora_core::louvain::{louvain_communities, LouvainResult};
use agora_core::types::{AgentId, CentralityKind, Degradation};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::warn;

const EIGENVECTOR_MAX_ITER: usize = 1000;
const EIGENVECTOR_TOLERANCE: f64 = 1e-6;

/// Summary of a network's structure.
///
/// Fields beyond `nodes`, `edges` and `density` are only filled in for
/// networks with at least two agents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStatistics {
    pub nodes: usize,
    pub edges: usize,
    pub density: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub largest_component_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_degree: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_degree: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_path_length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diameter: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clustering_coefficient: Option<f64>,
    /// Degree centralization; connected networks only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centralization: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Per-agent centrality scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centrality {
    pub scores: BTreeMap<AgentId, f64>,
    /// Set when the scores are a fallback rather than the requested measure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<Degradation>,
}

impl Centrality {
    fn exact(scores: BTreeMap<AgentId, f64>) -> Self {
        Self {
            scores,
            degraded: None,
        }
    }

    /// Agents sorted by descending score (ties by id).
    pub fn ranked(&self) -> Vec<(AgentId, f64)> {
        let mut ranked: Vec<(AgentId, f64)> =
            self.scores.iter().map(|(id, s)| (id.clone(), *s)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }
}

/// Unweighted adjacency lists indexed like the graph's nodes.
struct Adjacency {
    ids: Vec<AgentId>,
    neighbors: Vec<Vec<usize>>,
}

impl Adjacency {
    fn of(network: &AgentNetwork) -> Self {
        let graph = network.graph();
        let ids: Vec<AgentId> = graph.node_indices().map(|i| graph[i].id.clone()).collect();
        let mut neighbors = vec![Vec::new(); ids.len()];
        for edge in graph.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            neighbors[a].push(b);
            neighbors[b].push(a);
        }
        Self { ids, neighbors }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn degree(&self, v: usize) -> usize {
        self.neighbors[v].len()
    }

    /// Hop distances from `source`; `None` for unreachable nodes.
    fn distances(&self, source: usize) -> Vec<Option<usize>> {
        let mut dist = vec![None; self.len()];
        dist[source] = Some(0);
        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            let next = dist[v].map_or(0, |d| d + 1);
            for &w in &self.neighbors[v] {
                if dist[w].is_none() {
                    dist[w] = Some(next);
                    queue.push_back(w);
                }
            }
        }
        dist
    }

    /// Connected components in order of their lowest node index.
    fn components(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.len()];
        let mut components = Vec::new();
        for start in 0..self.len() {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut members = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(v) = queue.pop_front() {
                for &w in &self.neighbors[v] {
                    if !seen[w] {
                        seen[w] = true;
                        members.push(w);
                        queue.push_back(w);
                    }
                }
            }
            members.sort_unstable();
            components.push(members);
        }
        components
    }

    fn local_clustering(&self, v: usize) -> f64 {
        let nbrs = &self.neighbors[v];
        let k = nbrs.len();
        if k < 2 {
            return 0.0;
        }
        let mut links = 0usize;
        for (i, &a) in nbrs.iter().enumerate() {
            for &b in &nbrs[i + 1..] {
                if self.neighbors[a].contains(&b) {
                    links += 1;
                }
            }
        }
        2.0 * links as f64 / (k * (k - 1)) as f64
    }

    fn scores(&self, values: Vec<f64>) -> BTreeMap<AgentId, f64> {
        self.ids.iter().cloned().zip(values).collect()
    }
}

/// First component of maximal size.
fn largest(components: &[Vec<usize>]) -> &[usize] {
    let mut best: &[usize] = &[];
    for c in components {
        if c.len() > best.len() {
            best = c.as_slice();
        }
    }
    best
}

fn degree_scores(adj: &Adjacency) -> Vec<f64> {
    let n = adj.len();
    if n <= 1 {
        return vec![0.0; n];
    }
    (0..n).map(|v| adj.degree(v) as f64 / (n - 1) as f64).collect()
}

/// Brandes betweenness, normalised by `(n - 1)(n - 2)`.
fn betweenness_scores(adj: &Adjacency) -> Vec<f64> {
    let n = adj.len();
    let mut bc = vec![0.0_f64; n];

    for s in 0..n {
        let mut stack: Vec<usize> = Vec::new();
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0_f64; n];
        let mut dist = vec![-1i64; n];
        let mut delta = vec![0.0_f64; n];

        sigma[s] = 1.0;
        dist[s] = 0;
        let mut queue = VecDeque::from([s]);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in &adj.neighbors[v] {
                if dist[w] < 0 {
                    queue.push_back(w);
                    dist[w] = dist[v] + 1;
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
            }
            if w != s {
                bc[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        for b in bc.iter_mut() {
            *b *= scale;
        }
    }
    bc
}

/// Closeness within each node's own component, scaled by the component's
/// reach (Wasserman and Faust). Nodes outside `restrict_to` score zero.
fn closeness_scores(adj: &Adjacency, restrict_to: &[usize]) -> Vec<f64> {
    let mut scores = vec![0.0; adj.len()];
    let m = restrict_to.len();
    if m <= 1 {
        return scores;
    }
    for &v in restrict_to {
        let dist = adj.distances(v);
        let (reach, total) = dist
            .iter()
            .flatten()
            .fold((0usize, 0usize), |(r, t), d| (r + 1, t + d));
        if total > 0 {
            let reached = (reach - 1) as f64;
            scores[v] = (reached / total as f64) * (reached / (m - 1) as f64);
        }
    }
    scores
}

/// Power iteration on `A + I`; `None` when it fails to converge.
fn eigenvector_scores(adj: &Adjacency) -> Option<Vec<f64>> {
    let n = adj.len();
    if n == 0 {
        return Some(Vec::new());
    }
    let mut x = vec![1.0 / n as f64; n];

    for _ in 0..EIGENVECTOR_MAX_ITER {
        let last = x.clone();
        for v in 0..n {
            for &w in &adj.neighbors[v] {
                x[w] += last[v];
            }
        }
        let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        let norm = if norm == 0.0 { 1.0 } else { norm };
        for v in x.iter_mut() {
            *v /= norm;
        }

        let err: f64 = x.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
        if err < n as f64 * EIGENVECTOR_TOLERANCE {
            return Some(x);
        }
    }
    None
}

impl AgentNetwork {
    /// Compute structural statistics and cache them.
    pub fn statistics(&mut self) -> NetworkStatistics {
        let stats = compute_statistics(&Adjacency::of(self), self.connection_count());
        self.statistics = Some(stats.clone());
        stats
    }

    /// The most recently computed statistics, if the network has not
    /// changed since.
    pub fn last_statistics(&self) -> Option<&NetworkStatistics> {
        self.statistics.as_ref()
    }

    /// Compute one centrality measure for every agent.
    pub fn centrality(&self, kind: CentralityKind) -> Centrality {
        let adj = Adjacency::of(self);
        let n = adj.len();
        if n <= 1 {
            return Centrality::exact(adj.scores(vec![0.0; n]));
        }

        match kind {
            CentralityKind::Degree => Centrality::exact(adj.scores(degree_scores(&adj))),
            CentralityKind::Betweenness => Centrality::exact(adj.scores(betweenness_scores(&adj))),
            CentralityKind::Closeness => {
                let components = adj.components();
                let main = largest(&components);
                let degraded = (components.len() > 1).then_some(Degradation::LargestComponentOnly);
                Centrality {
                    scores: adj.scores(closeness_scores(&adj, main)),
                    degraded,
                }
            }
            CentralityKind::Eigenvector => match eigenvector_scores(&adj) {
                Some(scores) => Centrality::exact(adj.scores(scores)),
                None => {
                    warn!("Eigenvector centrality did not converge, using degree centrality");
                    Centrality {
                        scores: adj.scores(degree_scores(&adj)),
                        degraded: Some(Degradation::EigenvectorDidNotConverge),
                    }
                }
            },
        }
    }

    /// Like [`AgentNetwork::centrality`], selecting the measure by name.
    ///
    /// Unknown names give zero scores flagged with
    /// [`Degradation::UnknownCentrality`].
    pub fn centrality_by_name(&self, name: &str) -> Centrality {
        match name.parse::<CentralityKind>() {
            Ok(kind) => self.centrality(kind),
            Err(_) => {
                warn!("Unknown centrality type: {}", name);
                Centrality {
                    scores: self.agents().into_iter().map(|id| (id, 0.0)).collect(),
                    degraded: Some(Degradation::UnknownCentrality(name.to_string())),
                }
            }
        }
    }

    /// Louvain partition over connection weights.
    pub fn detect_communities(&self) -> LouvainResult<AgentId> {
        let graph = self.graph();
        let ids = self.agents();
        let edges: Vec<(usize, usize, f64)> = graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), *e.weight()))
            .collect();
        louvain_communities(&ids, &edges)
    }

    /// Community id per agent; a network of at most one agent is one community.
    pub fn communities(&self) -> BTreeMap<AgentId, usize> {
        if self.agent_count() <= 1 {
            return self.agents().into_iter().map(|id| (id, 0)).collect();
        }
        let result = self.detect_communities();
        self.agents().into_iter().zip(result.membership).collect()
    }

    /// Modularity of the partition returned by [`AgentNetwork::communities`].
    pub fn modularity(&self) -> f64 {
        if self.agent_count() <= 1 {
            return 0.0;
        }
        self.detect_communities().modularity
    }
}

fn compute_statistics(adj: &Adjacency, edges: usize) -> NetworkStatistics {
    let nodes = adj.len();
    let mut stats = NetworkStatistics {
        nodes,
        edges,
        ..NetworkStatistics::default()
    };
    if nodes <= 1 {
        return stats;
    }

    stats.density = 2.0 * edges as f64 / (nodes * (nodes - 1)) as f64;

    let components = adj.components();
    let main = largest(&components);
    stats.components = Some(components.len());
    stats.largest_component_size = Some(main.len());

    let degrees: Vec<usize> = (0..nodes).map(|v| adj.degree(v)).collect();
    stats.avg_degree = Some(degrees.iter().sum::<usize>() as f64 / nodes as f64);
    stats.max_degree = degrees.iter().copied().max();

    let connected = components.len() == 1;
    if !connected {
        stats.note = Some("Graph is disconnected. Path metrics calculated on largest component.".to_string());
    }

    // Path metrics over the largest component (the whole graph when connected).
    let m = main.len();
    let mut total = 0usize;
    let mut diameter = 0usize;
    for &v in main {
        for d in adj.distances(v).into_iter().flatten() {
            total += d;
            diameter = diameter.max(d);
        }
    }
    stats.avg_path_length = Some(if m > 1 {
        total as f64 / (m * (m - 1)) as f64
    } else {
        0.0
    });
    stats.diameter = Some(diameter);
    stats.clustering_coefficient =
        Some(main.iter().map(|&v| adj.local_clustering(v)).sum::<f64>() / m as f64);

    if connected {
        let centrality = degree_scores(adj);
        let max = centrality.iter().copied().fold(0.0, f64::max);
        let spread: f64 = centrality.iter().map(|c| max - c).sum();
        let max_spread = ((nodes - 1) * (nodes - 1)) as f64 / nodes as f64;
        stats.centralization = Some(if max_spread > 0.0 { spread / max_spread } else { 0.0 });
    }

    stats
}
