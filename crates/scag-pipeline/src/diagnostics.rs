//! Per-pair diagnostics: timing and counts for each pipeline stage.
//!
//! [`analyze_with_diagnostics`] drives the staged pipeline and records
//! how long each stage took and what it produced. Time is read through
//! the [`Clock`] trait so the pipeline itself stays free of any platform
//! time source; callers pass in whatever clock they have.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::analysis::{PairAnalysis, PairPipeline};
use crate::types::{ScagError, ScagnosticsConfig};

/// Monotonic time source.
pub trait Clock {
    /// Opaque timestamp.
    type Instant;

    /// The current time.
    fn now(&self) -> Self::Instant;

    /// Time passed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from one pair analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairDiagnostics {
    pub binning: StageDiagnostics,
    pub triangulation: StageDiagnostics,
    pub spanning_tree: StageDiagnostics,
    pub hull: StageDiagnostics,
    pub alpha_shape: StageDiagnostics,
    pub measures: StageDiagnostics,
    /// Wall-clock duration of the whole analysis (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    pub metrics: StageMetrics,
}

/// Stage-specific counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    Binning {
        /// Samples offered (including missing ones).
        input_points: usize,
        /// Weighted sites produced.
        sites: usize,
        /// Linear resolution of the accepted pass.
        num_bins: usize,
        /// Subsampling scale of the accepted pass.
        scale: f64,
        /// Retries before acceptance.
        relaxations: usize,
    },
    Triangulation {
        edges: usize,
        triangles: usize,
    },
    SpanningTree {
        original_edges: usize,
        final_edges: usize,
        outliers: usize,
        rounds: usize,
    },
    Hull {
        vertices: usize,
        area: f64,
        perimeter: f64,
    },
    AlphaShape {
        threshold: f64,
        edges: usize,
        triangles: usize,
        area: f64,
    },
    Measures,
}

impl PairDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("Pair Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration)
        ));
        lines.push(String::new());
        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(72));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Binning", &self.binning),
            ("Triangulation", &self.triangulation),
            ("Spanning tree", &self.spanning_tree),
            ("Hull", &self.hull),
            ("Alpha shape", &self.alpha_shape),
            ("Measures", &self.measures),
        ];
        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }
        lines.join("\n")
    }
}

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Binning {
            input_points,
            sites,
            num_bins,
            scale,
            relaxations,
        } => format!(
            "{input_points} pts -> {sites} sites (bins={num_bins} scale={scale:.2} retries={relaxations})"
        ),
        StageMetrics::Triangulation { edges, triangles } => {
            format!("{edges} edges, {triangles} triangles")
        }
        StageMetrics::SpanningTree {
            original_edges,
            final_edges,
            outliers,
            rounds,
        } => format!("{original_edges}->{final_edges} edges, {outliers} outliers in {rounds} rounds"),
        StageMetrics::Hull {
            vertices,
            area,
            perimeter,
        } => format!("{vertices} vertices, area={area:.4} perimeter={perimeter:.4}"),
        StageMetrics::AlphaShape {
            threshold,
            edges,
            triangles,
            area,
        } => format!("threshold={threshold:.4} {edges} edges, {triangles} triangles, area={area:.4}"),
        StageMetrics::Measures => String::new(),
    }
}

/// Run the staged pipeline, timing every stage.
///
/// # Errors
///
/// Same as [`analyze_with_rng`](crate::analysis::analyze_with_rng).
pub fn analyze_with_diagnostics<C: Clock, R: Rng + ?Sized>(
    x: &[f64],
    y: &[f64],
    config: &ScagnosticsConfig,
    rng: &mut R,
    clock: &C,
) -> Result<(PairAnalysis, PairDiagnostics), ScagError> {
    let start = clock.now();

    let t = clock.now();
    let binned = PairPipeline::new(x, y, config)?.bin(rng)?;
    let data = binned.binned();
    let binning = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Binning {
            input_points: x.len(),
            sites: data.sites.len(),
            num_bins: data.num_bins,
            scale: data.scale,
            relaxations: data.relaxations,
        },
    };

    let t = clock.now();
    let triangulated = binned.triangulate()?;
    let graph = triangulated.graph();
    let triangulation = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Triangulation {
            edges: graph.edge_count(),
            triangles: graph.triangles().len(),
        },
    };

    let t = clock.now();
    let spanned = triangulated.span();
    let peeling = spanned.peeling();
    let spanning_tree = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::SpanningTree {
            original_edges: peeling.original.count_ones(..),
            final_edges: peeling.tree.count_ones(..),
            outliers: peeling.outliers.count_ones(..),
            rounds: peeling.rounds,
        },
    };

    let t = clock.now();
    let hulled = spanned.hull();
    let h = hulled.hull_ref();
    let hull = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Hull {
            vertices: h.vertices.len(),
            area: h.area,
            perimeter: h.perimeter,
        },
    };

    let t = clock.now();
    let shaped = hulled.alpha_shape();
    let a = shaped.alpha();
    let alpha_shape = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::AlphaShape {
            threshold: a.threshold,
            edges: a.edges.count_ones(..),
            triangles: a.triangles.len(),
            area: a.area,
        },
    };

    let t = clock.now();
    let analysis = shaped.measure();
    let measures = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Measures,
    };

    tracing::debug!(scagnostics = ?analysis.scagnostics, "pair analysed");
    Ok((
        analysis,
        PairDiagnostics {
            binning,
            triangulation,
            spanning_tree,
            hull,
            alpha_shape,
            measures,
            total_duration: clock.elapsed(&start),
        },
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::analysis::analyze_with_rng;

    /// Clock that advances one millisecond per reading.
    struct TickClock(Cell<u64>);

    impl Clock for TickClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn sample() -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..200).map(|i| (f64::from(i) * 0.618_034).fract()).collect();
        let y: Vec<f64> = (0..200).map(|i| (f64::from(i) * 0.324_718).fract()).collect();
        (x, y)
    }

    #[test]
    fn duration_ms_converts_correctly() {
        assert!((duration_ms(Duration::from_millis(1234)) - 1234.0).abs() < 0.01);
    }

    #[test]
    fn diagnostics_match_plain_analysis() {
        let (x, y) = sample();
        let config = ScagnosticsConfig::default();
        let clock = TickClock(Cell::new(0));
        let (with, diag) =
            analyze_with_diagnostics(&x, &y, &config, &mut StdRng::seed_from_u64(4), &clock).unwrap();
        let plain = analyze_with_rng(&x, &y, &config, &mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(with.scagnostics, plain.scagnostics);

        assert!(matches!(
            diag.binning.metrics,
            StageMetrics::Binning { input_points: 200, sites, .. } if sites == with.graph.node_count()
        ));
        assert!(diag.total_duration >= diag.binning.duration);
    }

    #[test]
    fn report_lists_every_stage() {
        let (x, y) = sample();
        let clock = TickClock(Cell::new(0));
        let (_, diag) = analyze_with_diagnostics(
            &x,
            &y,
            &ScagnosticsConfig::default(),
            &mut StdRng::seed_from_u64(1),
            &clock,
        )
        .unwrap();
        let report = diag.report();
        for stage in ["Binning", "Triangulation", "Spanning tree", "Hull", "Alpha shape", "Measures"] {
            assert!(report.contains(stage), "{stage} missing from report");
        }
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let (x, y) = sample();
        let clock = TickClock(Cell::new(0));
        let (_, diag) = analyze_with_diagnostics(
            &x,
            &y,
            &ScagnosticsConfig::default(),
            &mut StdRng::seed_from_u64(1),
            &clock,
        )
        .unwrap();
        let json = serde_json::to_value(&diag).unwrap();
        assert!(json["binning"]["duration"].as_f64().unwrap() > 0.0);
        let back: PairDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.binning.duration, diag.binning.duration);
    }
}
