//! Per-pair analysis: advance stage by stage from raw columns to the
//! nine measures.
//!
//! ```rust
//! # use scag_pipeline::{PairPipeline, ScagnosticsConfig, ScagError};
//! # use rand::SeedableRng;
//! # fn run(x: &[f64], y: &[f64]) -> Result<(), ScagError> {
//! let config = ScagnosticsConfig::default();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let analysis = PairPipeline::new(x, y, &config)?
//!     .bin(&mut rng)?
//!     .triangulate()?
//!     .span()
//!     .hull()
//!     .alpha_shape()
//!     .measure();
//! println!("{}", analysis.scagnostics.outlying);
//! # Ok(())
//! # }
//! ```
//!
//! Each stage consumes `self` and carries every earlier intermediate
//! forward, so the finished [`PairAnalysis`] holds all structures for
//! visualization. [`analyze`] and [`compute`] run the whole chain.

use petgraph::graph::EdgeIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::alpha::{AlphaShape, alpha_shape, alpha_threshold};
use crate::binning::Binner;
use crate::graph::ScatterGraph;
use crate::hull::{Hull, convex_hull};
use crate::measures;
use crate::mst::{Peeling, peel_outliers, sorted_lengths};
use crate::traverse::{farthest_node, path_between};
use crate::triangulate::triangulate;
use crate::types::{BinnedData, ScagError, Scagnostics, ScagnosticsConfig};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Validated input columns, not yet binned.
#[must_use = "pipeline stages are consumed by advancing, call .bin() to continue"]
pub struct PairPipeline<'a> {
    x: &'a [f64],
    y: &'a [f64],
    config: &'a ScagnosticsConfig,
}

impl<'a> PairPipeline<'a> {
    /// Start an analysis of the pair `(x[i], y[i])`.
    ///
    /// # Errors
    ///
    /// Returns [`ScagError::InvalidConfig`] if the configuration fails
    /// [`ScagnosticsConfig::validate`].
    pub fn new(x: &'a [f64], y: &'a [f64], config: &'a ScagnosticsConfig) -> Result<Self, ScagError> {
        config.validate()?;
        Ok(Self { x, y, config })
    }

    /// Bin the raw samples into weighted sites.
    ///
    /// # Errors
    ///
    /// Propagates [`Binner::bin`] failures.
    pub fn bin<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Binned<'a>, ScagError> {
        let binned = Binner::new(self.config).bin(self.x, self.y, rng)?;
        Ok(Binned {
            x: self.x,
            y: self.y,
            config: self.config,
            binned,
        })
    }
}

// ───────────────────────── Stage 1: Binned ───────────────────────────

/// Samples reduced to weighted sites.
#[must_use = "pipeline stages are consumed by advancing, call .triangulate() to continue"]
pub struct Binned<'a> {
    x: &'a [f64],
    y: &'a [f64],
    config: &'a ScagnosticsConfig,
    binned: BinnedData,
}

impl<'a> Binned<'a> {
    #[must_use]
    pub const fn binned(&self) -> &BinnedData {
        &self.binned
    }

    /// Build the Delaunay proximity graph over the sites.
    ///
    /// # Errors
    ///
    /// Propagates [`triangulate`] failures.
    pub fn triangulate(self) -> Result<Triangulated<'a>, ScagError> {
        let graph = triangulate(&self.binned.sites)?;
        Ok(Triangulated {
            x: self.x,
            y: self.y,
            config: self.config,
            binned: self.binned,
            graph,
        })
    }
}

// ──────────────────────── Stage 2: Triangulated ──────────────────────

/// Sites joined by their triangulation.
#[must_use = "pipeline stages are consumed by advancing, call .span() to continue"]
pub struct Triangulated<'a> {
    x: &'a [f64],
    y: &'a [f64],
    config: &'a ScagnosticsConfig,
    binned: BinnedData,
    graph: ScatterGraph,
}

impl<'a> Triangulated<'a> {
    #[must_use]
    pub const fn graph(&self) -> &ScatterGraph {
        &self.graph
    }

    /// Build the spanning tree and peel outliers off it.
    pub fn span(self) -> Spanned<'a> {
        let peeling = peel_outliers(&self.graph);
        Spanned {
            x: self.x,
            y: self.y,
            config: self.config,
            binned: self.binned,
            graph: self.graph,
            peeling,
        }
    }
}

// ───────────────────────── Stage 3: Spanned ──────────────────────────

/// Original and peeled spanning trees.
#[must_use = "pipeline stages are consumed by advancing, call .hull() to continue"]
pub struct Spanned<'a> {
    x: &'a [f64],
    y: &'a [f64],
    config: &'a ScagnosticsConfig,
    binned: BinnedData,
    graph: ScatterGraph,
    peeling: Peeling,
}

impl<'a> Spanned<'a> {
    #[must_use]
    pub const fn peeling(&self) -> &Peeling {
        &self.peeling
    }

    /// Compute the convex hull of the surviving sites.
    pub fn hull(self) -> Hulled<'a> {
        let hull = convex_hull(&self.graph, &self.peeling.active);
        Hulled {
            x: self.x,
            y: self.y,
            config: self.config,
            binned: self.binned,
            graph: self.graph,
            peeling: self.peeling,
            hull,
        }
    }
}

// ───────────────────────── Stage 4: Hulled ───────────────────────────

/// Convex hull computed.
#[must_use = "pipeline stages are consumed by advancing, call .alpha_shape() to continue"]
pub struct Hulled<'a> {
    x: &'a [f64],
    y: &'a [f64],
    config: &'a ScagnosticsConfig,
    binned: BinnedData,
    graph: ScatterGraph,
    peeling: Peeling,
    hull: Hull,
}

impl<'a> Hulled<'a> {
    #[must_use]
    pub const fn hull_ref(&self) -> &Hull {
        &self.hull
    }

    /// Prune the triangulation into the alpha shape.
    pub fn alpha_shape(self) -> Shaped<'a> {
        let lengths = sorted_lengths(&self.graph, &self.peeling.tree);
        let threshold = alpha_threshold(&lengths, self.config);
        let alpha = alpha_shape(&self.graph, &self.peeling.active, threshold);
        Shaped {
            x: self.x,
            y: self.y,
            binned: self.binned,
            graph: self.graph,
            peeling: self.peeling,
            hull: self.hull,
            alpha,
            lengths,
        }
    }
}

// ───────────────────────── Stage 5: Shaped ───────────────────────────

/// Every structure built; only the measures remain.
#[must_use = "pipeline stages are consumed by advancing, call .measure() to finish"]
pub struct Shaped<'a> {
    x: &'a [f64],
    y: &'a [f64],
    binned: BinnedData,
    graph: ScatterGraph,
    peeling: Peeling,
    hull: Hull,
    alpha: AlphaShape,
    lengths: Vec<f64>,
}

impl Shaped<'_> {
    #[must_use]
    pub const fn alpha(&self) -> &AlphaShape {
        &self.alpha
    }

    /// Read the nine measures off the finished structures.
    #[must_use]
    pub fn measure(self) -> PairAnalysis {
        let monotonic = measures::monotonic(self.x, self.y);
        let scagnostics = if self.graph.node_count() < 2 {
            Scagnostics::degenerate(monotonic)
        } else {
            let tree = &self.peeling.tree;
            let active = &self.peeling.active;
            let mass = self.graph.mass(active);
            Scagnostics {
                outlying: measures::outlying(
                    self.peeling.outlier_length,
                    self.graph.total_length(&self.peeling.original),
                ),
                skewed: measures::skewed(&self.lengths, mass),
                clumpy: measures::clumpy(&self.graph, tree, mass),
                sparse: measures::sparse(&self.lengths),
                striated: measures::striated(&self.graph, tree, active),
                convex: measures::convex(self.alpha.area, self.hull.area),
                skinny: measures::skinny(self.alpha.area, self.alpha.perimeter),
                stringy: measures::stringy(&self.graph, tree, active),
                monotonic,
            }
        };
        PairAnalysis {
            binned: self.binned,
            graph: self.graph,
            peeling: self.peeling,
            hull: self.hull,
            alpha: self.alpha,
            scagnostics,
        }
    }
}

// ───────────────────────── Result ────────────────────────────────────

/// Every structure built for one variable pair, plus its measures.
#[derive(Debug, Clone)]
pub struct PairAnalysis {
    pub binned: BinnedData,
    pub graph: ScatterGraph,
    pub peeling: Peeling,
    pub hull: Hull,
    pub alpha: AlphaShape,
    pub scagnostics: Scagnostics,
}

impl PairAnalysis {
    /// The longest path along the original spanning tree.
    ///
    /// Found by a double sweep: the node farthest from an arbitrary
    /// start, then the node farthest from that one. Empty when the graph
    /// has fewer than two nodes.
    #[must_use]
    pub fn spine(&self) -> Vec<EdgeIndex> {
        let tree = &self.peeling.original;
        let Some(start) = self.graph.nodes().next() else {
            return Vec::new();
        };
        let (one_end, _) = farthest_node(&self.graph, tree, start);
        let (other_end, _) = farthest_node(&self.graph, tree, one_end);
        path_between(&self.graph, tree, one_end, other_end).unwrap_or_default()
    }
}

/// Summary counts of one analysis, for logs and reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairSummary {
    pub sites: usize,
    pub edges: usize,
    pub triangles: usize,
    pub outliers: usize,
    pub hull_vertices: usize,
    pub alpha_edges: usize,
}

impl PairAnalysis {
    #[must_use]
    pub fn summary(&self) -> PairSummary {
        PairSummary {
            sites: self.graph.node_count(),
            edges: self.graph.edge_count(),
            triangles: self.graph.triangles().len(),
            outliers: self.peeling.outliers.count_ones(..),
            hull_vertices: self.hull.vertices.len(),
            alpha_edges: self.alpha.edges.count_ones(..),
        }
    }
}

/// The subsampling RNG described by `config.seed`.
#[must_use]
pub fn rng_for(config: &ScagnosticsConfig) -> StdRng {
    config.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

/// A copy of `config` with its seed fixed, drawing one from entropy if
/// unset, so every later run with the copy is reproducible.
#[must_use]
pub fn pin_seed(config: &ScagnosticsConfig) -> ScagnosticsConfig {
    ScagnosticsConfig {
        seed: Some(config.seed.unwrap_or_else(|| rng_for(config).r#gen())),
        ..config.clone()
    }
}

/// Run the full pipeline with an explicit random source.
///
/// # Errors
///
/// Returns [`ScagError`] for invalid configuration or unusable input
/// columns.
pub fn analyze_with_rng<R: Rng + ?Sized>(
    x: &[f64],
    y: &[f64],
    config: &ScagnosticsConfig,
    rng: &mut R,
) -> Result<PairAnalysis, ScagError> {
    Ok(PairPipeline::new(x, y, config)?
        .bin(rng)?
        .triangulate()?
        .span()
        .hull()
        .alpha_shape()
        .measure())
}

/// Run the full pipeline, seeding the RNG from `config.seed`.
///
/// # Errors
///
/// See [`analyze_with_rng`].
pub fn analyze(x: &[f64], y: &[f64], config: &ScagnosticsConfig) -> Result<PairAnalysis, ScagError> {
    analyze_with_rng(x, y, config, &mut rng_for(config))
}

/// The nine measures of one pair, with an explicit random source.
///
/// # Errors
///
/// See [`analyze_with_rng`].
pub fn compute_with_rng<R: Rng + ?Sized>(
    x: &[f64],
    y: &[f64],
    config: &ScagnosticsConfig,
    rng: &mut R,
) -> Result<Scagnostics, ScagError> {
    analyze_with_rng(x, y, config, rng).map(|a| a.scagnostics)
}

/// The nine measures of one pair.
///
/// # Errors
///
/// See [`analyze_with_rng`].
pub fn compute(x: &[f64], y: &[f64], config: &ScagnosticsConfig) -> Result<Scagnostics, ScagError> {
    analyze(x, y, config).map(|a| a.scagnostics)
}
