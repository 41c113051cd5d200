//! The nine scagnostic measures.
//!
//! Each function reads one characteristic off the structures built by
//! the earlier stages and returns a value clamped to `[0, 1]`.
//! `sorted` arguments are the ascending edge lengths of the final
//! (peeled) spanning tree.

use std::f64::consts::PI;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::graph::{EdgeSet, NodeSet, ScatterGraph};
use crate::traverse::subtree_count;

/// Mass at which the skewness correction reaches its midpoint.
const SKEW_MASS_SCALE: f64 = 500.0;

/// Angle cosine below which a degree-2 node counts as straight-through.
const STRIATION_COSINE: f64 = -0.75;

/// Clamp to `[0, 1]`, mapping NaN to 0.
fn unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Element at `len * num / den`, for index-based quantiles.
fn at_fraction(sorted: &[f64], num: usize, den: usize) -> f64 {
    sorted
        .get((sorted.len() * num / den).min(sorted.len().saturating_sub(1)))
        .copied()
        .unwrap_or(0.0)
}

/// Share of the original tree length spent attaching outliers.
#[must_use]
pub fn outlying(outlier_length: f64, original_length: f64) -> f64 {
    if original_length > 0.0 {
        unit(outlier_length / original_length)
    } else {
        0.0
    }
}

/// Asymmetry of the edge-length distribution, damped for small
/// samples.
#[must_use]
pub fn skewed(sorted: &[f64], total_mass: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let q10 = at_fraction(sorted, 1, 10);
    let q50 = at_fraction(sorted, 1, 2);
    let q90 = at_fraction(sorted, 9, 10);
    let spread = q90 - q10;
    let s = if spread > 0.0 { (q90 - q50) / spread } else { 0.0 };
    let t = total_mass / SKEW_MASS_SCALE;
    let correction = 0.7 + 0.3 / t.mul_add(t, 1.0);
    unit(correction.mul_add(-(1.0 - s), 1.0))
}

/// Long edges separating heavy runt subtrees.
///
/// For every tree edge, cut it and walk both sides using only edges no
/// longer than the cut edge. The lighter side (the runt) scores its
/// mass times how much shorter its longest internal edge is than the
/// cut. Runts of a single node do not count.
#[must_use]
pub fn clumpy(graph: &ScatterGraph, tree: &EdgeSet, total_mass: f64) -> f64 {
    if total_mass <= 0.0 {
        return 0.0;
    }
    let mut best: f64 = 0.0;
    for i in tree.ones() {
        let e = EdgeIndex::new(i);
        let w = graph.length(e);
        let Some((a, b)) = graph.endpoints(e) else {
            continue;
        };
        if w <= 0.0 {
            continue;
        }
        let mut cut = tree.clone();
        cut.set(i, false);
        let mut visited = graph.node_set();
        let left = subtree_count(graph, &cut, a, w, &mut visited);
        let right = subtree_count(graph, &cut, b, w, &mut visited);
        let runt = if left.mass <= right.mass { left } else { right };
        if runt.nodes.len() < 2 {
            continue;
        }
        best = best.max(runt.mass * (1.0 - runt.max_edge / w));
    }
    unit(2.0 * best / total_mass)
}

/// Typical edge length, the 90th percentile.
#[must_use]
pub fn sparse(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    unit(at_fraction(sorted, 9, 10).min(1.0))
}

/// Share of nodes where the tree runs straight through.
#[must_use]
pub fn striated(graph: &ScatterGraph, tree: &EdgeSet, active: &NodeSet) -> f64 {
    let total = active.count_ones(..);
    if total == 0 {
        return 0.0;
    }
    let straight = active
        .ones()
        .map(NodeIndex::new)
        .filter(|&n| {
            let ends: Vec<NodeIndex> = graph.incident_in(n, tree).map(|(_, o)| o).collect();
            let [p, q] = ends.as_slice() else {
                return false;
            };
            let c = graph.position(n);
            let (u, v) = (graph.position(*p), graph.position(*q));
            let (ux, uy, vx, vy) = (u.x - c.x, u.y - c.y, v.x - c.x, v.y - c.y);
            let norms = ux.hypot(uy) * vx.hypot(vy);
            norms > 0.0 && ux.mul_add(vx, uy * vy) / norms < STRIATION_COSINE
        })
        .count();
    #[allow(clippy::cast_precision_loss)]
    let share = straight as f64 / total as f64;
    unit(share)
}

/// Alpha-shape area relative to hull area.
#[must_use]
pub fn convex(alpha_area: f64, hull_area: f64) -> f64 {
    if hull_area > 0.0 {
        unit(alpha_area / hull_area)
    } else {
        1.0
    }
}

/// Thinness of the alpha shape: 0 for a disc, towards 1 when the
/// boundary is long for the area it encloses.
#[must_use]
pub fn skinny(alpha_area: f64, alpha_perimeter: f64) -> f64 {
    if alpha_perimeter > 0.0 {
        unit(1.0 - (4.0 * PI * alpha_area).sqrt() / alpha_perimeter)
    } else {
        1.0
    }
}

/// How close the tree is to a single unbranched path.
#[must_use]
pub fn stringy(graph: &ScatterGraph, tree: &EdgeSet, active: &NodeSet) -> f64 {
    let n = active.count_ones(..);
    if n < 2 {
        return 0.0;
    }
    let (mut d1, mut d2) = (0usize, 0usize);
    for i in active.ones() {
        match graph.degree_in(NodeIndex::new(i), tree) {
            1 => d1 += 1,
            2 => d2 += 1,
            _ => {}
        }
    }
    if n <= d1 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = d2 as f64 / (n - d1) as f64;
    unit(ratio.powi(3))
}

/// Ranks of `values` starting at 1, ties sharing their average rank.
#[must_use]
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        #[allow(clippy::cast_precision_loss)]
        let rank = (start + end + 1) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        start = end;
    }
    ranks
}

/// Squared Spearman rank correlation over the samples where both
/// coordinates are finite.
#[must_use]
pub fn monotonic(x: &[f64], y: &[f64]) -> f64 {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .unzip();
    if xs.len() < 2 {
        return 0.0;
    }
    let rx = average_ranks(&xs);
    let ry = average_ranks(&ys);
    #[allow(clippy::cast_precision_loss)]
    let mean = (xs.len() + 1) as f64 / 2.0;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in rx.iter().zip(&ry) {
        let (da, db) = (a - mean, b - mean);
        sxy += da * db;
        sxx += da * da;
        syy += db * db;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return 0.0;
    }
    let r = sxy / (sxx * syy).sqrt();
    unit(r * r)
}
