//! Minimum spanning tree over the triangulation, with outlier peeling.
//!
//! Kruskal's algorithm on the triangulation edges whose endpoints are
//! both active: edges are stably sorted by length (ties keep insertion
//! order) and merged through a `UnionFind`. When the active subgraph is
//! disconnected the result is a spanning forest.
//!
//! Peeling runs on top of the first ("original") tree. Each round
//! computes a box-plot cutoff over the current tree lengths; a node
//! whose every tree edge is longer than the cutoff is an outlier. The
//! outliers are deactivated and the tree is rebuilt over the rest. The
//! original tree is never modified.

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::unionfind::UnionFind;

use crate::graph::{EdgeSet, NodeSet, ScatterGraph};

/// Fewest active nodes a peeling round may leave behind.
const MIN_REMAINING: usize = 3;

/// Kruskal spanning tree (or forest) over the edges joining two nodes
/// of `active`.
#[must_use]
pub fn spanning_tree(graph: &ScatterGraph, active: &NodeSet) -> EdgeSet {
    let mut candidates: Vec<(f64, EdgeIndex, NodeIndex, NodeIndex)> = graph
        .edges()
        .filter_map(|e| {
            let (a, b) = graph.endpoints(e)?;
            (active.contains(a.index()) && active.contains(b.index()))
                .then(|| (graph.length(e), e, a, b))
        })
        .collect();
    candidates.sort_by(|x, y| x.0.partial_cmp(&y.0).unwrap_or(std::cmp::Ordering::Equal));

    let wanted = active.count_ones(..).saturating_sub(1);
    let mut uf = UnionFind::<usize>::new(graph.node_count());
    let mut tree = graph.edge_set();
    let mut taken = 0;
    for (_, e, a, b) in candidates {
        let ra = uf.find_mut(a.index());
        let rb = uf.find_mut(b.index());
        if ra != rb {
            uf.union(ra, rb);
            tree.insert(e.index());
            taken += 1;
            if taken == wanted {
                break;
            }
        }
    }
    tree
}

/// Edge lengths of `tree`, ascending.
#[must_use]
pub fn sorted_lengths(graph: &ScatterGraph, tree: &EdgeSet) -> Vec<f64> {
    let mut lengths: Vec<f64> = tree.ones().map(|i| graph.length(EdgeIndex::new(i))).collect();
    lengths.sort_by(f64::total_cmp);
    lengths
}

/// Box-plot cutoff `q75 + 1.5·(q75 − q25)` over ascending lengths.
///
/// Quartiles are read by index: `n50 = len/2`, `n25 = n50/2`,
/// `n75 = n50 + n50/2`. Empty input yields infinity so nothing is ever
/// beyond it.
#[must_use]
pub fn outlier_cutoff(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return f64::INFINITY;
    }
    let n50 = sorted.len() / 2;
    let n25 = n50 / 2;
    let n75 = n50 + n50 / 2;
    let q25 = sorted[n25];
    let q75 = sorted[n75];
    1.5f64.mul_add(q75 - q25, q75)
}

/// Result of building the original tree and peeling outliers off it.
#[derive(Debug, Clone)]
pub struct Peeling {
    /// Tree over all nodes, before any peeling.
    pub original: EdgeSet,
    /// Tree over the nodes that survived peeling.
    pub tree: EdgeSet,
    /// Nodes that survived peeling.
    pub active: NodeSet,
    /// Nodes removed as outliers.
    pub outliers: NodeSet,
    /// Summed length of the tree edges that attached the outliers.
    pub outlier_length: f64,
    /// Number of rounds that removed at least one node.
    pub rounds: usize,
}

/// Build the original tree over every node and peel outliers.
#[must_use]
pub fn peel_outliers(graph: &ScatterGraph) -> Peeling {
    let mut active = graph.all_nodes();
    let original = spanning_tree(graph, &active);
    let mut tree = original.clone();
    let mut outliers = graph.node_set();
    let mut outlier_length = 0.0;
    let mut rounds = 0;

    loop {
        let cutoff = outlier_cutoff(&sorted_lengths(graph, &tree));

        let mut found = graph.node_set();
        let mut attaching = graph.edge_set();
        for i in active.ones() {
            let n = NodeIndex::new(i);
            let incident: Vec<EdgeIndex> = graph.incident_in(n, &tree).map(|(e, _)| e).collect();
            if !incident.is_empty() && incident.iter().all(|&e| graph.length(e) > cutoff) {
                found.insert(i);
                for e in incident {
                    attaching.insert(e.index());
                }
            }
        }

        let removed = found.count_ones(..);
        if removed == 0 || active.count_ones(..) - removed < MIN_REMAINING {
            break;
        }

        outlier_length += graph.total_length(&attaching);
        active.difference_with(&found);
        outliers.union_with(&found);
        tree = spanning_tree(graph, &active);
        rounds += 1;
        tracing::debug!(round = rounds, removed, cutoff, "peeled outlier nodes");
    }

    Peeling {
        original,
        tree,
        active,
        outliers,
        outlier_length,
        rounds,
    }
}
