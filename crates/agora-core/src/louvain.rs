//! Louvain community detection.
//!
//! The Louvain algorithm is a greedy optimization method for detecting
//! communities in weighted undirected networks. It optimizes modularity
//! through a two-phase iterative process:
//!
//! 1. **Local Moving**: Greedily move nodes to maximize modularity gain
//! 2. **Aggregation**: Build a new graph with communities as nodes
//!
//! Node visiting order and candidate communities are iterated in index
//! order, so the partition is a pure function of the input.
//!
//! Reference: Blondel et al. (2008) "Fast unfolding of communities in large networks"

use std::collections::BTreeMap;

/// Result of Louvain community detection.
#[derive(Debug, Clone)]
pub struct LouvainResult<T> {
    /// Communities as vectors of node IDs, ordered by their first member.
    pub communities: Vec<Vec<T>>,
    /// Community index of each input node, parallel to the input slice.
    pub membership: Vec<usize>,
    /// Final modularity score (higher = better structure).
    pub modularity: f64,
    /// Number of Louvain passes performed.
    pub passes: usize,
}

const MAX_PASSES: usize = 100;
const MAX_SWEEPS: usize = 1000;
const MIN_GAIN: f64 = 1e-12;

/// Graph representation optimized for Louvain.
struct LouvainGraph {
    /// Adjacency list: node_idx -> [(neighbor_idx, weight)], self-loops excluded.
    adj: Vec<Vec<(usize, f64)>>,
    /// Self-loop weight per node (internal weight of aggregated communities).
    self_loop: Vec<f64>,
    /// Weighted degree (self-loops count twice).
    degree: Vec<f64>,
    /// Total edge weight, counting each undirected edge once.
    total_weight: f64,
}

impl LouvainGraph {
    fn from_edges(node_count: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); node_count];
        let mut self_loop = vec![0.0; node_count];
        let mut degree = vec![0.0; node_count];
        let mut total_weight = 0.0;

        for &(from, to, weight) in edges {
            if from >= node_count || to >= node_count {
                continue;
            }
            if from == to {
                self_loop[from] += weight;
                degree[from] += 2.0 * weight;
            } else {
                adj[from].push((to, weight));
                adj[to].push((from, weight));
                degree[from] += weight;
                degree[to] += weight;
            }
            total_weight += weight;
        }

        Self {
            adj,
            self_loop,
            degree,
            total_weight,
        }
    }

    fn len(&self) -> usize {
        self.adj.len()
    }

    /// Phase 1: move nodes between communities while modularity improves.
    /// Returns the community of each node and whether any node moved.
    fn local_moving(&self) -> (Vec<usize>, bool) {
        let n = self.len();
        let mut community: Vec<usize> = (0..n).collect();
        let mut totals: Vec<f64> = self.degree.clone();
        let mut improved = false;

        if self.total_weight == 0.0 {
            return (community, false);
        }

        let m = self.total_weight;
        let m2_sq = 2.0 * m * m;

        for _ in 0..MAX_SWEEPS {
            let mut changed = false;

            for i in 0..n {
                let current = community[i];
                let ki = self.degree[i];

                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                for &(j, weight) in &self.adj[i] {
                    *links.entry(community[j]).or_insert(0.0) += weight;
                }

                // Take i out of its community before scoring candidates.
                totals[current] -= ki;

                let stay_links = links.get(&current).copied().unwrap_or(0.0);
                let mut best_community = current;
                let mut best_gain = stay_links / m - totals[current] * ki / m2_sq;

                for (&c, &k_in) in &links {
                    if c == current {
                        continue;
                    }
                    let gain = k_in / m - totals[c] * ki / m2_sq;
                    if gain > best_gain + MIN_GAIN {
                        best_gain = gain;
                        best_community = c;
                    }
                }

                totals[best_community] += ki;
                if best_community != current {
                    community[i] = best_community;
                    changed = true;
                    improved = true;
                }
            }

            if !changed {
                break;
            }
        }

        (community, improved)
    }

    /// Phase 2: collapse communities into super-nodes.
    /// Returns the aggregated graph and each node's new index.
    fn aggregate(&self, community: &[usize]) -> (Self, Vec<usize>) {
        let mut renumber: BTreeMap<usize, usize> = BTreeMap::new();
        let mut mapping = Vec::with_capacity(community.len());
        for &c in community {
            let next = renumber.len();
            mapping.push(*renumber.entry(c).or_insert(next));
        }

        let mut weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for (i, neighbors) in self.adj.iter().enumerate() {
            for &(j, weight) in neighbors {
                if i < j {
                    let (a, b) = (mapping[i], mapping[j]);
                    let key = if a <= b { (a, b) } else { (b, a) };
                    *weights.entry(key).or_insert(0.0) += weight;
                }
            }
        }
        for (i, &w) in self.self_loop.iter().enumerate() {
            if w > 0.0 {
                *weights.entry((mapping[i], mapping[i])).or_insert(0.0) += w;
            }
        }

        let edges: Vec<(usize, usize, f64)> =
            weights.into_iter().map(|((a, b), w)| (a, b, w)).collect();
        (LouvainGraph::from_edges(renumber.len(), &edges), mapping)
    }
}

/// Run Louvain community detection.
///
/// # Arguments
/// * `node_ids` - The node IDs in index order
/// * `edges` - Undirected edges as (from_idx, to_idx, weight)
pub fn louvain_communities<T: Clone>(node_ids: &[T], edges: &[(usize, usize, f64)]) -> LouvainResult<T> {
    let n = node_ids.len();
    if n == 0 {
        return LouvainResult {
            communities: Vec::new(),
            membership: Vec::new(),
            modularity: 0.0,
            passes: 0,
        };
    }

    let mut graph = LouvainGraph::from_edges(n, edges);
    // Original node -> node of the current level graph.
    let mut membership: Vec<usize> = (0..n).collect();
    let mut passes = 0;

    while passes < MAX_PASSES {
        passes += 1;

        let (community, improved) = graph.local_moving();
        if !improved {
            break;
        }

        let (next, mapping) = graph.aggregate(&community);
        for m in membership.iter_mut() {
            *m = mapping[*m];
        }

        let collapsed = next.len() == graph.len();
        graph = next;
        if collapsed || graph.len() == 1 {
            break;
        }
    }

    // Renumber communities by first appearance in input order.
    let mut renumber: BTreeMap<usize, usize> = BTreeMap::new();
    let mut order: Vec<usize> = Vec::new();
    for &m in &membership {
        if !renumber.contains_key(&m) {
            renumber.insert(m, order.len());
            order.push(m);
        }
    }
    let membership: Vec<usize> = membership.iter().map(|m| renumber[m]).collect();

    let mut communities: Vec<Vec<T>> = vec![Vec::new(); order.len()];
    for (i, &c) in membership.iter().enumerate() {
        communities[c].push(node_ids[i].clone());
    }

    let modularity = compute_modularity(n, edges, &membership);

    LouvainResult {
        communities,
        membership,
        modularity,
        passes,
    }
}

/// Compute modularity of a given partition.
///
/// # Arguments
/// * `node_count` - Number of nodes
/// * `edges` - Edges as (from_idx, to_idx, weight)
/// * `partition` - Community assignment for each node (indexed by node index)
pub fn compute_modularity(node_count: usize, edges: &[(usize, usize, f64)], partition: &[usize]) -> f64 {
    if node_count == 0 || edges.is_empty() {
        return 0.0;
    }

    let graph = LouvainGraph::from_edges(node_count, edges);
    if graph.total_weight == 0.0 {
        return 0.0;
    }
    let m = graph.total_weight;

    let community_of = |i: usize| partition.get(i).copied().unwrap_or(usize::MAX - i);

    let mut internal: BTreeMap<usize, f64> = BTreeMap::new();
    let mut degree: BTreeMap<usize, f64> = BTreeMap::new();

    for i in 0..node_count {
        let c = community_of(i);
        *degree.entry(c).or_insert(0.0) += graph.degree[i];
        *internal.entry(c).or_insert(0.0) += graph.self_loop[i];
        for &(j, weight) in &graph.adj[i] {
            if i < j && community_of(j) == c {
                *internal.entry(c).or_insert(0.0) += weight;
            }
        }
    }

    // Q = Σc [ (internal_c / m) - (degree_c / 2m)^2 ]
    degree
        .iter()
        .map(|(c, d)| internal.get(c).copied().unwrap_or(0.0) / m - (d / (2.0 * m)).powi(2))
        .sum()
}
