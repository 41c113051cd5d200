//! scag-pipeline: Pure scagnostics pipeline (sans-IO).
//!
//! Reduces each pairwise scatterplot of a multivariate dataset to nine
//! shape measures through:
//! binning -> Delaunay triangulation -> spanning tree + outlier peeling
//! -> convex hull -> alpha shape -> measures.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! columns and returns structured data. Reading datasets and writing
//! results lives in `scag-io` and `scag-export`.

pub mod alpha;
pub mod analysis;
pub mod batch;
pub mod binning;
pub mod diagnostics;
pub mod graph;
pub mod hull;
pub mod measures;
pub mod mst;
pub mod normalize;
pub mod sampling;
pub mod traverse;
pub mod triangulate;
pub mod types;

pub use analysis::{
    PairAnalysis, PairPipeline, PairSummary, analyze, analyze_with_rng, compute, compute_with_rng,
    pin_seed,
};
pub use batch::{
    PairResult, PlotFlags, batch_seed, compute_all_pairs, exemplar_plots, flag_plots,
    outlying_plots, pair_rng, variable_pairs,
};
pub use graph::{EdgeSet, NodeSet, ScatterGraph};
pub use normalize::normalize_columns;
pub use types::{
    BinnedData, Dataset, Measure, Point, ScagError, Scagnostics, ScagnosticsConfig, Site,
};

/// Normalize every column of `dataset` and compute all pairs.
///
/// The returned results are in [`variable_pairs`] order, each paired
/// with its outlier and exemplar flags.
#[must_use]
pub fn process_dataset(
    dataset: &Dataset,
    config: &ScagnosticsConfig,
) -> Vec<(PairResult, PlotFlags)> {
    let columns = normalize_columns(&dataset.columns);
    let results = compute_all_pairs(&columns, config);
    let flags = flag_plots(&results);
    tracing::debug!(
        variables = dataset.variable_count(),
        rows = dataset.row_count(),
        pairs = results.len(),
        outliers = flags.iter().filter(|f| f.outlier).count(),
        exemplars = flags.iter().filter(|f| f.exemplar).count(),
        "dataset processed"
    );
    results.into_iter().zip(flags).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn process_dataset_normalizes_raw_columns() {
        let raw_a: Vec<f64> = (0..30).map(|i| 100.0 + 3.0 * f64::from(i)).collect();
        let raw_b: Vec<f64> = (0..30).map(|i| -5.0 * f64::from(i)).collect();
        let dataset = Dataset {
            labels: vec!["a".into(), "b".into()],
            columns: vec![raw_a, raw_b],
        };
        let config = ScagnosticsConfig {
            seed: Some(8),
            ..ScagnosticsConfig::default()
        };
        let out = process_dataset(&dataset, &config);
        assert_eq!(out.len(), 1);
        let (pair, flags) = &out[0];
        assert_eq!((pair.x, pair.y), (0, 1));
        assert!(!flags.outlier);
        assert!(flags.exemplar);
        let s = pair.result.as_ref().unwrap();
        assert!((s.monotonic - 1.0).abs() < 1e-12);
    }

    #[test]
    fn process_dataset_with_one_variable_is_empty() {
        let dataset = Dataset {
            labels: vec!["only".into()],
            columns: vec![vec![1.0, 2.0, 3.0]],
        };
        assert!(process_dataset(&dataset, &ScagnosticsConfig::default()).is_empty());
    }
}
