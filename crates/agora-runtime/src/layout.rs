//! Spring layout and visualization export.
//!
//! Positions come from a Fruchterman–Reingold force simulation started
//! from random coordinates drawn from the network's generator, centred on
//! the origin and scaled into [-1, 1].

use crate::analysis::NetworkStatistics;
use crate::network::AgentNetwork;
use agora_core::types::{AgentAttributes, AgentId, CentralityKind};
use petgraph::visit::EdgeRef;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Iterations of the force simulation.
pub const LAYOUT_ITERATIONS: usize = 50;
const INITIAL_TEMPERATURE: f64 = 0.1;
const MIN_DISTANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualNode {
    pub id: AgentId,
    pub x: f64,
    pub y: f64,
    pub attributes: AgentAttributes,
    /// Degree centrality.
    pub centrality: f64,
    pub community: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualEdge {
    pub source: AgentId,
    pub target: AgentId,
    pub weight: f64,
}

/// Everything needed to draw a network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationData {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
    /// Number of distinct communities.
    pub communities: usize,
    /// Statistics from the last [`AgentNetwork::statistics`] call, if still current.
    pub statistics: Option<NetworkStatistics>,
}

/// Fruchterman–Reingold positions for `n` nodes joined by `edges`.
pub fn spring_layout<R: Rng + ?Sized>(
    n: usize,
    edges: &[(usize, usize, f64)],
    iterations: usize,
    rng: &mut R,
) -> Vec<(f64, f64)> {
    match n {
        0 => return Vec::new(),
        1 => return vec![(0.0, 0.0)],
        _ => {}
    }

    let mut pos: Vec<(f64, f64)> = (0..n).map(|_| (rng.gen::<f64>(), rng.gen::<f64>())).collect();
    let mut weight = vec![vec![0.0_f64; n]; n];
    for &(a, b, w) in edges {
        weight[a][b] = w;
        weight[b][a] = w;
    }

    let k = (1.0 / n as f64).sqrt();
    let mut temperature = INITIAL_TEMPERATURE;
    let cooling = temperature / (iterations + 1) as f64;

    for _ in 0..iterations {
        let mut displacement = vec![(0.0_f64, 0.0_f64); n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let dx = pos[i].0 - pos[j].0;
                let dy = pos[i].1 - pos[j].1;
                let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                // Repulsion k²/d minus attraction w·d²/k, along the unit vector.
                let force = k * k / (distance * distance) - weight[i][j] * distance / k;
                displacement[i].0 += dx * force;
                displacement[i].1 += dy * force;
            }
        }

        for (p, d) in pos.iter_mut().zip(&displacement) {
            let length = (d.0 * d.0 + d.1 * d.1).sqrt().max(MIN_DISTANCE);
            p.0 += d.0 * temperature / length;
            p.1 += d.1 * temperature / length;
        }
        temperature -= cooling;
    }

    rescale(&mut pos);
    pos
}

/// Centre on the origin and scale the largest coordinate to 1.
fn rescale(pos: &mut [(f64, f64)]) {
    let n = pos.len() as f64;
    let (cx, cy) = pos.iter().fold((0.0, 0.0), |(x, y), p| (x + p.0 / n, y + p.1 / n));
    let mut extent: f64 = 0.0;
    for p in pos.iter_mut() {
        p.0 -= cx;
        p.1 -= cy;
        extent = extent.max(p.0.abs()).max(p.1.abs());
    }
    if extent > 0.0 {
        for p in pos.iter_mut() {
            p.0 /= extent;
            p.1 /= extent;
        }
    }
}

impl AgentNetwork {
    /// Positions, edges, degree centrality and communities for drawing.
    pub fn visualization(&mut self) -> VisualizationData {
        let edges: Vec<(usize, usize, f64)> = self
            .graph()
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), *e.weight()))
            .collect();
        let n = self.agent_count();
        let positions = spring_layout(n, &edges, LAYOUT_ITERATIONS, &mut self.rng);

        let centrality = self.centrality(CentralityKind::Degree);
        let communities = self.communities();
        let community_count = communities
            .values()
            .copied()
            .collect::<std::collections::BTreeSet<usize>>()
            .len();

        let graph = self.graph();
        let nodes = graph
            .node_indices()
            .zip(positions)
            .map(|(idx, (x, y))| {
                let node = &graph[idx];
                VisualNode {
                    id: node.id.clone(),
                    x,
                    y,
                    attributes: node.attributes.clone(),
                    centrality: centrality.scores.get(&node.id).copied().unwrap_or(0.0),
                    community: communities.get(&node.id).copied().unwrap_or(0),
                }
            })
            .collect();

        let edges = self
            .connections()
            .into_iter()
            .map(|(source, target, weight)| VisualEdge {
                source,
                target,
                weight,
            })
            .collect();

        VisualizationData {
            nodes,
            edges,
            communities: community_count,
            statistics: self.last_statistics().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkConfig;
    use agora_core::types::NetworkType;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn layout_is_scaled_into_unit_box() {
        let edges = vec![(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)];
        let pos = spring_layout(4, &edges, LAYOUT_ITERATIONS, &mut StdRng::seed_from_u64(3));
        assert_eq!(pos.len(), 4);
        let extent = pos.iter().map(|p| p.0.abs().max(p.1.abs())).fold(0.0, f64::max);
        assert!((extent - 1.0).abs() < 1e-9);
        assert!(pos.iter().all(|p| p.0.is_finite() && p.1.is_finite()));
    }

    #[test]
    fn trivial_layouts() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(spring_layout(0, &[], 10, &mut rng).is_empty());
        assert_eq!(spring_layout(1, &[], 10, &mut rng), vec![(0.0, 0.0)]);
    }

    #[test]
    fn visualization_covers_every_agent_and_edge() {
        let mut net = AgentNetwork::new(
            "viz",
            NetworkType::Clustered,
            NetworkConfig::default().with_initial_nodes(12).with_seed(9),
        );
        let stats = net.statistics();
        let data = net.visualization();
        assert_eq!(data.nodes.len(), 12);
        assert_eq!(data.edges.len(), stats.edges);
        assert!(data.communities >= 1);
        assert_eq!(data.statistics, Some(stats));
        assert!(data.nodes.iter().all(|n| n.x.abs() <= 1.0 + 1e-9 && n.y.abs() <= 1.0 + 1e-9));
    }
}
