//! All-pairs scagnostics over a multivariate dataset.
//!
//! For `p` variables there are `p(p−1)/2` scatterplots, enumerated as
//! `(j, i)` for `i in 1..p` and `j in 0..i`, with variable `j` on the
//! horizontal axis. Pairs are independent and run in parallel; each
//! owns its graph and its RNG, the latter seeded from the batch seed and
//! the pair's position so results do not depend on scheduling. A failing
//! pair is recorded and logged without stopping the batch.

use std::collections::BTreeMap;

use petgraph::unionfind::UnionFind;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::{compute_with_rng, rng_for};
use crate::mst::outlier_cutoff;
use crate::types::{ScagError, Scagnostics, ScagnosticsConfig};

/// Measures (or the failure) for one scatterplot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairResult {
    /// Variable on the horizontal axis.
    pub x: usize,
    /// Variable on the vertical axis.
    pub y: usize,
    pub result: Result<Scagnostics, ScagError>,
}

/// Variable index pairs in output order.
#[must_use]
pub fn variable_pairs(variables: usize) -> Vec<(usize, usize)> {
    (1..variables)
        .flat_map(|i| (0..i).map(move |j| (j, i)))
        .collect()
}

/// Base seed shared by the pair RNGs of one batch.
///
/// Deterministic when `config.seed` is set.
#[must_use]
pub fn batch_seed(config: &ScagnosticsConfig) -> u64 {
    rng_for(config).r#gen()
}

/// RNG of the `k`-th pair (in [`variable_pairs`] order) of a batch.
///
/// Re-running a single pair with this RNG reproduces its batch result.
#[must_use]
pub fn pair_rng(base: u64, k: usize) -> StdRng {
    StdRng::seed_from_u64(base.wrapping_add(k as u64))
}

/// Compute scagnostics for every pair of `columns`.
///
/// Columns are expected on `[0, 1]` already (see
/// [`normalize_columns`](crate::normalize::normalize_columns)).
#[must_use]
pub fn compute_all_pairs(columns: &[Vec<f64>], config: &ScagnosticsConfig) -> Vec<PairResult> {
    let base = batch_seed(config);
    variable_pairs(columns.len())
        .into_par_iter()
        .enumerate()
        .map(|(k, (x, y))| {
            let mut rng = pair_rng(base, k);
            let result = compute_with_rng(&columns[x], &columns[y], config, &mut rng);
            if let Err(err) = &result {
                tracing::warn!(x, y, %err, "scagnostics failed for pair");
            }
            PairResult { x, y, result }
        })
        .collect()
}

/// Per-plot flags derived from the measure vectors of a whole batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotFlags {
    /// The plot's measures sit far from every other plot's.
    pub outlier: bool,
    /// The plot represents a cluster of similar plots.
    pub exemplar: bool,
}

/// Measure vectors of the successful pairs, with their result index.
fn measure_vectors(results: &[PairResult]) -> Vec<(usize, [f64; 9])> {
    results
        .iter()
        .enumerate()
        .filter_map(|(k, r)| r.result.as_ref().ok().map(|s| (k, s.to_array())))
        .collect()
}

fn distance(a: &[f64; 9], b: &[f64; 9]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(u, v)| (u - v) * (u - v))
        .sum::<f64>()
        .sqrt()
}

/// Kruskal spanning tree of the complete graph over `vectors`, as
/// `(length, a, b)` edges in ascending length.
fn measure_tree(vectors: &[(usize, [f64; 9])]) -> Vec<(f64, usize, usize)> {
    let n = vectors.len();
    if n < 2 {
        return Vec::new();
    }
    let mut candidates: Vec<(f64, usize, usize)> = Vec::with_capacity(n * (n - 1) / 2);
    for a in 0..n {
        for b in (a + 1)..n {
            candidates.push((distance(&vectors[a].1, &vectors[b].1), a, b));
        }
    }
    candidates.sort_by(|p, q| p.0.partial_cmp(&q.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut uf = UnionFind::<usize>::new(n);
    let mut tree = Vec::with_capacity(n - 1);
    for (d, a, b) in candidates {
        if uf.union(a, b) {
            tree.push((d, a, b));
            if tree.len() == n - 1 {
                break;
            }
        }
    }
    tree
}

/// Box-plot cutoff over the edge lengths of an ascending tree.
fn tree_cutoff(tree: &[(f64, usize, usize)]) -> f64 {
    let lengths: Vec<f64> = tree.iter().map(|t| t.0).collect();
    outlier_cutoff(&lengths)
}

/// Flag scatterplots whose measure vectors sit far from all others.
///
/// Builds a spanning tree over the nine-dimensional measure vectors
/// (complete graph, Euclidean distance) and applies the same box-plot
/// cutoff used for peeling sites: a plot is flagged when every tree
/// edge touching it is longer than the cutoff. Failed pairs are never
/// flagged and do not take part. The output is parallel to `results`.
#[must_use]
pub fn outlying_plots(results: &[PairResult]) -> Vec<bool> {
    let ok = measure_vectors(results);
    let mut flags = vec![false; results.len()];
    let tree = measure_tree(&ok);
    if tree.is_empty() {
        return flags;
    }
    let cutoff = tree_cutoff(&tree);

    // Per vertex: does it touch a tree edge, and are all of them long?
    let mut touched = vec![false; ok.len()];
    let mut all_long = vec![true; ok.len()];
    for &(d, a, b) in &tree {
        for v in [a, b] {
            touched[v] = true;
            all_long[v] &= d > cutoff;
        }
    }
    for (v, &(k, _)) in ok.iter().enumerate() {
        flags[k] = touched[v] && all_long[v];
    }
    flags
}

/// Pick one representative scatterplot per cluster of similar plots.
///
/// Clusters come from the same measure-space spanning tree as
/// [`outlying_plots`]: removing tree edges longer than the box-plot
/// cutoff splits it into groups. Every group of two or more plots
/// contributes its medoid, the member with the smallest summed distance
/// to the rest of its group (lowest index on ties). When every group is
/// a single plot, the medoid of all plots is chosen instead. Failed
/// pairs never take part. The output is parallel to `results`.
#[must_use]
pub fn exemplar_plots(results: &[PairResult]) -> Vec<bool> {
    let ok = measure_vectors(results);
    let mut flags = vec![false; results.len()];
    if ok.is_empty() {
        return flags;
    }
    let tree = measure_tree(&ok);
    let cutoff = tree_cutoff(&tree);

    let mut uf = UnionFind::<usize>::new(ok.len());
    for &(d, a, b) in &tree {
        if d <= cutoff {
            uf.union(a, b);
        }
    }
    let mut groups = BTreeMap::<usize, Vec<usize>>::new();
    for v in 0..ok.len() {
        groups.entry(uf.find_mut(v)).or_default().push(v);
    }

    let mut clusters: Vec<Vec<usize>> = groups.into_values().filter(|g| g.len() >= 2).collect();
    if clusters.is_empty() {
        clusters.push((0..ok.len()).collect());
    }
    for members in &clusters {
        let medoid = members
            .iter()
            .map(|&v| {
                let spread: f64 = members.iter().map(|&w| distance(&ok[v].1, &ok[w].1)).sum();
                (spread, v)
            })
            .min_by(|p, q| p.0.total_cmp(&q.0).then(p.1.cmp(&q.1)));
        if let Some((_, v)) = medoid {
            flags[ok[v].0] = true;
        }
    }
    tracing::debug!(
        plots = ok.len(),
        clusters = clusters.len(),
        cutoff,
        "exemplar plots chosen"
    );
    flags
}

/// [`outlying_plots`] and [`exemplar_plots`] together.
#[must_use]
pub fn flag_plots(results: &[PairResult]) -> Vec<PlotFlags> {
    outlying_plots(results)
        .into_iter()
        .zip(exemplar_plots(results))
        .map(|(outlier, exemplar)| PlotFlags { outlier, exemplar })
        .collect()
}
