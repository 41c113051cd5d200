//! Alpha shape: the triangulation with long edges pruned away.
//!
//! The edge-length threshold is derived from the spanning tree: the
//! `alpha_quantile` of its edge lengths, capped at `max_alpha`, times
//! `alpha_scale`. An edge between active nodes is on the shape when it
//! is no longer than the threshold, so raising the threshold can only
//! add edges. The occupied region is the union of triangles whose three
//! edges are all on the shape; its boundary consists of shape edges
//! that border exactly one such triangle.

use std::collections::BTreeMap;

use geo::{Area, Triangle};
use petgraph::graph::NodeIndex;

use crate::graph::{EdgeSet, NodeSet, ScatterGraph};
use crate::types::ScagnosticsConfig;

/// Value at fraction `q` of an ascending slice, read at index
/// `floor(q·len)` (clamped to the last element). Empty input gives 0.
#[must_use]
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let idx = (q.clamp(0.0, 1.0) * sorted.len() as f64).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Edge-length threshold for the alpha shape given ascending tree
/// lengths.
#[must_use]
pub fn alpha_threshold(sorted_tree_lengths: &[f64], config: &ScagnosticsConfig) -> f64 {
    let alpha = quantile(sorted_tree_lengths, config.alpha_quantile).min(config.max_alpha);
    config.alpha_scale * alpha
}

/// Pruned triangulation of the active sites.
#[derive(Debug, Clone)]
pub struct AlphaShape {
    /// Edge-length threshold the shape was built with.
    pub threshold: f64,
    /// Triangulation edges on the shape.
    pub edges: EdgeSet,
    /// Triangles with all three edges on the shape.
    pub triangles: Vec<[NodeIndex; 3]>,
    /// Summed area of `triangles`.
    pub area: f64,
    /// Summed length of shape edges bordering exactly one triangle.
    pub perimeter: f64,
}

/// Build the alpha shape of the active sites at `threshold`.
#[must_use]
pub fn alpha_shape(graph: &ScatterGraph, active: &NodeSet, threshold: f64) -> AlphaShape {
    let mut edges = graph.edge_set();
    for e in graph.edges() {
        let Some((a, b)) = graph.endpoints(e) else {
            continue;
        };
        if active.contains(a.index()) && active.contains(b.index()) && graph.length(e) <= threshold {
            edges.insert(e.index());
        }
    }

    let mut triangles = Vec::new();
    let mut bordering = BTreeMap::<usize, usize>::new();
    let mut area = 0.0;
    for &[a, b, c] in graph.triangles() {
        let sides = [
            graph.edge_between(a, b),
            graph.edge_between(b, c),
            graph.edge_between(c, a),
        ];
        let on_shape = sides
            .iter()
            .all(|s| s.is_some_and(|e| edges.contains(e.index())));
        if !on_shape {
            continue;
        }
        for e in sides.into_iter().flatten() {
            *bordering.entry(e.index()).or_default() += 1;
        }
        area += Triangle::new(
            graph.position(a).into(),
            graph.position(b).into(),
            graph.position(c).into(),
        )
        .unsigned_area();
        triangles.push([a, b, c]);
    }

    let perimeter = bordering
        .iter()
        .filter(|&(_, &count)| count == 1)
        .map(|(&e, _)| graph.length(petgraph::graph::EdgeIndex::new(e)))
        .sum();

    tracing::trace!(
        threshold,
        edges = edges.count_ones(..),
        triangles = triangles.len(),
        area,
        "alpha shape"
    );
    AlphaShape {
        threshold,
        edges,
        triangles,
        area,
        perimeter,
    }
}
