//! Initial topology generators.
//!
//! Each [`NetworkType`] has a generator that produces node indices
//! `0..node_count` and an undirected edge list without self-loops or
//! duplicates. The network turns indices into agent ids.

use crate::network::NetworkConfig;
use agora_core::types::NetworkType;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;
use tracing::warn;

/// Probability of an edge between two members of the same cluster.
pub const INTRA_CLUSTER_PROBABILITY: f64 = 0.7;
/// Probability that a newly attached clustered agent gets one foreign link.
pub const INTER_CLUSTER_PROBABILITY: f64 = 0.3;

/// Output of a generator.
#[derive(Debug, Clone, Default)]
pub struct GeneratedTopology {
    pub node_count: usize,
    pub edges: Vec<(usize, usize)>,
    /// Cluster label per node (only the clustered generator sets these).
    pub clusters: Vec<Option<usize>>,
}

/// Undirected simple edge set used while generating.
struct EdgeSet {
    edges: BTreeSet<(usize, usize)>,
    degree: Vec<usize>,
}

impl EdgeSet {
    fn new(node_count: usize) -> Self {
        Self {
            edges: BTreeSet::new(),
            degree: vec![0; node_count],
        }
    }

    fn key(a: usize, b: usize) -> (usize, usize) {
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    fn contains(&self, a: usize, b: usize) -> bool {
        self.edges.contains(&Self::key(a, b))
    }

    fn insert(&mut self, a: usize, b: usize) {
        if a != b && self.edges.insert(Self::key(a, b)) {
            self.degree[a] += 1;
            self.degree[b] += 1;
        }
    }

    fn remove(&mut self, a: usize, b: usize) {
        if self.edges.remove(&Self::key(a, b)) {
            self.degree[a] -= 1;
            self.degree[b] -= 1;
        }
    }

    fn into_topology(self) -> GeneratedTopology {
        let node_count = self.degree.len();
        GeneratedTopology {
            node_count,
            edges: self.edges.into_iter().collect(),
            clusters: vec![None; node_count],
        }
    }
}

/// Generate the initial topology for `network_type`.
pub fn generate<R: Rng + ?Sized>(
    network_type: NetworkType,
    config: &NetworkConfig,
    rng: &mut R,
) -> GeneratedTopology {
    let n = config.initial_nodes;
    match network_type {
        NetworkType::Hierarchical => balanced_tree(config.branching_factor, config.height),
        NetworkType::Random => erdos_renyi(n, config.edge_probability, rng),
        NetworkType::SmallWorld => {
            watts_strogatz(n, config.nearest_neighbors, config.rewiring_probability, rng)
        }
        NetworkType::ScaleFree => barabasi_albert(n, config.new_edges, rng),
        NetworkType::Clustered => clustered(n, config.clusters, rng),
        NetworkType::Complete => complete(n),
    }
}

/// Largest hierarchical tree the generator will build.
pub const MAX_TREE_NODES: usize = 1 << 20;

/// Node count of a balanced `r`-ary tree of height `h`, `None` on overflow.
pub fn balanced_tree_size(r: usize, h: usize) -> Option<usize> {
    if r == 0 {
        return Some(1);
    }
    let mut total: usize = 0;
    let mut level: usize = 1;
    for depth in 0..=h {
        total = total.checked_add(level)?;
        if depth < h {
            level = level.checked_mul(r)?;
        }
    }
    Some(total)
}

/// Perfectly balanced `r`-ary tree of height `h`; node `i > 0` hangs off `(i - 1) / r`.
///
/// Trees larger than [`MAX_TREE_NODES`] are truncated to that many nodes.
pub fn balanced_tree(r: usize, h: usize) -> GeneratedTopology {
    let node_count = match balanced_tree_size(r, h) {
        Some(n) if n <= MAX_TREE_NODES => n,
        _ => {
            warn!("Tree with branching {} and height {} is too large, truncating", r, h);
            MAX_TREE_NODES
        }
    };

    let mut set = EdgeSet::new(node_count);
    for i in 1..node_count {
        set.insert((i - 1) / r.max(1), i);
    }
    set.into_topology()
}

/// Erdős–Rényi G(n, p).
pub fn erdos_renyi<R: Rng + ?Sized>(n: usize, p: f64, rng: &mut R) -> GeneratedTopology {
    let mut set = EdgeSet::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if rng.gen::<f64>() < p {
                set.insert(i, j);
            }
        }
    }
    set.into_topology()
}

/// Watts–Strogatz small world: ring lattice with `k` neighbours, each
/// lattice edge rewired with probability `p` to a uniform non-neighbour.
pub fn watts_strogatz<R: Rng + ?Sized>(n: usize, k: usize, p: f64, rng: &mut R) -> GeneratedTopology {
    if k >= n {
        return complete(n);
    }

    let mut set = EdgeSet::new(n);
    let half = k / 2;
    for j in 1..=half {
        for u in 0..n {
            set.insert(u, (u + j) % n);
        }
    }

    let nodes: Vec<usize> = (0..n).collect();
    for j in 1..=half {
        for u in 0..n {
            let v = (u + j) % n;
            if rng.gen::<f64>() >= p {
                continue;
            }
            // Saturated nodes keep their lattice edge.
            if set.degree[u] >= n - 1 {
                continue;
            }
            let mut w = *nodes.choose(rng).unwrap_or(&u);
            while w == u || set.contains(u, w) {
                w = *nodes.choose(rng).unwrap_or(&u);
            }
            set.remove(u, v);
            set.insert(u, w);
        }
    }
    set.into_topology()
}

/// Barabási–Albert preferential attachment with `m` edges per new node,
/// grown from a star on `m + 1` nodes.
pub fn barabasi_albert<R: Rng + ?Sized>(n: usize, m: usize, rng: &mut R) -> GeneratedTopology {
    if n < 2 {
        return EdgeSet::new(n).into_topology();
    }
    let clamped = m.clamp(1, n - 1);
    if clamped != m {
        warn!("scale-free new_edges {} clamped to {} for {} nodes", m, clamped, n);
    }
    let m = clamped;

    let mut set = EdgeSet::new(n);
    for leaf in 1..=m {
        set.insert(0, leaf);
    }

    // Each node appears once per incident edge.
    let mut repeated: Vec<usize> = Vec::new();
    for node in 0..=m {
        repeated.extend(std::iter::repeat(node).take(set.degree[node]));
    }

    for source in (m + 1)..n {
        let mut targets: BTreeSet<usize> = BTreeSet::new();
        while targets.len() < m {
            if let Some(&t) = repeated.choose(rng) {
                targets.insert(t);
            }
        }
        for &t in &targets {
            set.insert(source, t);
        }
        repeated.extend(targets.iter().copied());
        repeated.extend(std::iter::repeat(source).take(m));
    }
    set.into_topology()
}

/// `clusters` equal blocks of `n / clusters` nodes, dense inside
/// (probability 0.7 per pair) with `n / 5` random links between blocks.
pub fn clustered<R: Rng + ?Sized>(n: usize, clusters: usize, rng: &mut R) -> GeneratedTopology {
    let clusters = clusters.max(1);
    let cluster_size = n / clusters;
    let mut set = EdgeSet::new(n);

    for c in 0..clusters {
        let start = c * cluster_size;
        let end = start + cluster_size;
        for i in start..end {
            for j in (i + 1)..end {
                if rng.gen::<f64>() < INTRA_CLUSTER_PROBABILITY {
                    set.insert(i, j);
                }
            }
        }
    }

    if clusters >= 2 && cluster_size > 0 {
        for _ in 0..(n / 5) {
            let c1 = rng.gen_range(0..clusters);
            let mut c2 = rng.gen_range(0..clusters);
            while c2 == c1 {
                c2 = rng.gen_range(0..clusters);
            }
            let n1 = rng.gen_range(c1 * cluster_size..(c1 + 1) * cluster_size);
            let n2 = rng.gen_range(c2 * cluster_size..(c2 + 1) * cluster_size);
            set.insert(n1, n2);
        }
    }

    let mut topology = set.into_topology();
    if cluster_size > 0 {
        for (i, label) in topology.clusters.iter_mut().enumerate() {
            if i < clusters * cluster_size {
                *label = Some(i / cluster_size);
            }
        }
    }
    topology
}

/// Complete graph on `n` nodes.
pub fn complete(n: usize) -> GeneratedTopology {
    let mut set = EdgeSet::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            set.insert(i, j);
        }
    }
    set.into_topology()
}
