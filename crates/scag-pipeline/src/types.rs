//! Shared types for the scagnostics pipeline.

use serde::{Deserialize, Serialize};

/// A 2D point in normalized data coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (first variable of the pair).
    pub x: f64,
    /// Vertical position (second variable of the pair).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

impl From<Point> for geo::Coord<f64> {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// A weighted representative point produced by binning.
///
/// `weight` is the number of raw samples the site stands for. Sites are
/// never mutated after binning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Position of the representative sample.
    pub point: Point,
    /// Number of raw samples collapsed into this site.
    pub weight: f64,
}

impl Site {
    /// Create a new site.
    #[must_use]
    pub const fn new(x: f64, y: f64, weight: f64) -> Self {
        Self {
            point: Point::new(x, y),
            weight,
        }
    }
}

/// Output of the binner: weighted sites plus the parameters of the
/// accepted binning pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinnedData {
    /// Nonempty sites in cell order.
    pub sites: Vec<Site>,
    /// Linear bin resolution of the accepted pass.
    pub num_bins: usize,
    /// Subsampling scale of the accepted pass.
    pub scale: f64,
    /// Number of retries before the pass was accepted.
    pub relaxations: usize,
}

impl BinnedData {
    /// Sum of all site weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.sites.iter().map(|s| s.weight).sum()
    }
}

/// The nine scagnostic measures, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measure {
    Outlying,
    Skewed,
    Clumpy,
    Sparse,
    Striated,
    Convex,
    Skinny,
    Stringy,
    Monotonic,
}

impl Measure {
    /// All measures in output order.
    pub const ALL: [Self; 9] = [
        Self::Outlying,
        Self::Skewed,
        Self::Clumpy,
        Self::Sparse,
        Self::Striated,
        Self::Convex,
        Self::Skinny,
        Self::Stringy,
        Self::Monotonic,
    ];

    /// Lowercase column name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Outlying => "outlying",
            Self::Skewed => "skewed",
            Self::Clumpy => "clumpy",
            Self::Sparse => "sparse",
            Self::Striated => "striated",
            Self::Convex => "convex",
            Self::Skinny => "skinny",
            Self::Stringy => "stringy",
            Self::Monotonic => "monotonic",
        }
    }
}

impl std::fmt::Display for Measure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The nine shape measures of one scatterplot.
///
/// Every value lies in `[0, 1]`; higher means a stronger presence of
/// the characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scagnostics {
    pub outlying: f64,
    pub skewed: f64,
    pub clumpy: f64,
    pub sparse: f64,
    pub striated: f64,
    pub convex: f64,
    pub skinny: f64,
    pub stringy: f64,
    pub monotonic: f64,
}

impl Scagnostics {
    /// Look up a single measure.
    #[must_use]
    pub const fn get(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Outlying => self.outlying,
            Measure::Skewed => self.skewed,
            Measure::Clumpy => self.clumpy,
            Measure::Sparse => self.sparse,
            Measure::Striated => self.striated,
            Measure::Convex => self.convex,
            Measure::Skinny => self.skinny,
            Measure::Stringy => self.stringy,
            Measure::Monotonic => self.monotonic,
        }
    }

    /// The measures as a vector in [`Measure::ALL`] order.
    #[must_use]
    pub fn to_array(&self) -> [f64; 9] {
        Measure::ALL.map(|m| self.get(m))
    }

    /// Result for a point set too small to carry any graph structure.
    ///
    /// Only the rank-based `monotonic` measure is meaningful.
    #[must_use]
    pub const fn degenerate(monotonic: f64) -> Self {
        Self {
            outlying: 0.0,
            skewed: 0.0,
            clumpy: 0.0,
            sparse: 0.0,
            striated: 0.0,
            convex: 0.0,
            skinny: 0.0,
            stringy: 0.0,
            monotonic,
        }
    }
}

/// A multivariate dataset as columns of raw samples.
///
/// Missing values are NaN. All columns have the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Variable names, one per column.
    pub labels: Vec<String>,
    /// Raw samples, `columns[variable][row]`.
    pub columns: Vec<Vec<f64>>,
}

impl Dataset {
    /// Number of variables.
    #[must_use]
    pub fn variable_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows (length of the first column).
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }
}

/// Configuration for the scagnostics pipeline.
///
/// Binning parameters follow the classic defaults (50 bins, at most
/// 1000 nonempty sites). The alpha-shape parameters control how long a
/// triangulation edge may be before it is treated as spanning empty
/// space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScagnosticsConfig {
    /// Target linear bin resolution. The grid has `2 * num_bins` cells
    /// per axis.
    pub num_bins: usize,

    /// Upper bound on the number of output sites.
    ///
    /// Should be at least `num_bins²`; not enforced.
    pub max_bins: usize,

    /// Initial subsampling scale. A cell holding `n` points keeps
    /// `floor(n / scale)` representatives.
    pub initial_scale: f64,

    /// Retry ceiling for the binning relaxation.
    pub max_relaxations: usize,

    /// Quantile of the spanning-tree edge lengths used as the alpha
    /// radius.
    pub alpha_quantile: f64,

    /// Multiplier turning the alpha radius into an edge-length threshold.
    pub alpha_scale: f64,

    /// Upper bound on the alpha radius in normalized units.
    pub max_alpha: f64,

    /// Seed for the subsampling RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl ScagnosticsConfig {
    /// Default target linear bin resolution.
    pub const DEFAULT_NUM_BINS: usize = 50;
    /// Largest accepted target linear bin resolution.
    pub const MAX_NUM_BINS: usize = 4096;
    /// Default maximum number of nonempty sites.
    pub const DEFAULT_MAX_BINS: usize = 1000;
    /// Default initial subsampling scale.
    pub const DEFAULT_INITIAL_SCALE: f64 = 1.0;
    /// Default retry ceiling for the binning relaxation.
    pub const DEFAULT_MAX_RELAXATIONS: usize = 64;
    /// Default alpha quantile.
    pub const DEFAULT_ALPHA_QUANTILE: f64 = 0.9;
    /// Default alpha edge multiplier.
    pub const DEFAULT_ALPHA_SCALE: f64 = 2.0;
    /// Default alpha radius cap.
    pub const DEFAULT_MAX_ALPHA: f64 = 0.1;

    /// Check the configuration for values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ScagError::InvalidConfig`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<(), ScagError> {
        if self.num_bins < 1 {
            return Err(ScagError::InvalidConfig("num_bins must be at least 1".into()));
        }
        if self.num_bins > Self::MAX_NUM_BINS || grid_cells(self.num_bins).is_none() {
            return Err(ScagError::InvalidConfig(format!(
                "num_bins must be at most {}, got {}",
                Self::MAX_NUM_BINS,
                self.num_bins
            )));
        }
        if self.max_bins < 1 {
            return Err(ScagError::InvalidConfig("max_bins must be at least 1".into()));
        }
        if !self.initial_scale.is_finite() || self.initial_scale < 1.0 {
            return Err(ScagError::InvalidConfig(format!(
                "initial_scale must be finite and at least 1, got {}",
                self.initial_scale
            )));
        }
        if self.max_relaxations < 1 {
            return Err(ScagError::InvalidConfig(
                "max_relaxations must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.alpha_quantile) {
            return Err(ScagError::InvalidConfig(format!(
                "alpha_quantile must be within [0, 1], got {}",
                self.alpha_quantile
            )));
        }
        if !(self.alpha_scale > 0.0 && self.alpha_scale.is_finite()) {
            return Err(ScagError::InvalidConfig(format!(
                "alpha_scale must be positive, got {}",
                self.alpha_scale
            )));
        }
        if !(self.max_alpha > 0.0 && self.max_alpha.is_finite()) {
            return Err(ScagError::InvalidConfig(format!(
                "max_alpha must be positive, got {}",
                self.max_alpha
            )));
        }
        Ok(())
    }
}

/// Number of cells in the `2·num_bins × 2·num_bins` binning grid, or
/// `None` when it does not fit in a `usize`.
#[must_use]
pub const fn grid_cells(num_bins: usize) -> Option<usize> {
    match num_bins.checked_mul(2) {
        Some(side) => side.checked_mul(side),
        None => None,
    }
}

impl Default for ScagnosticsConfig {
    fn default() -> Self {
        Self {
            num_bins: Self::DEFAULT_NUM_BINS,
            max_bins: Self::DEFAULT_MAX_BINS,
            initial_scale: Self::DEFAULT_INITIAL_SCALE,
            max_relaxations: Self::DEFAULT_MAX_RELAXATIONS,
            alpha_quantile: Self::DEFAULT_ALPHA_QUANTILE,
            alpha_scale: Self::DEFAULT_ALPHA_SCALE,
            max_alpha: Self::DEFAULT_MAX_ALPHA,
            seed: None,
        }
    }
}

/// Errors that can occur while computing scagnostics for one pair.
///
/// Failures are local to a variable pair; the batch runner records them
/// per pair and keeps going.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum ScagError {
    /// The input columns contained no samples.
    #[error("input point set is empty")]
    EmptyInput,

    /// The two coordinate columns differ in length.
    #[error("coordinate columns differ in length: x has {x_len}, y has {y_len}")]
    LengthMismatch { x_len: usize, y_len: usize },

    /// Every sample had at least one missing coordinate.
    #[error("no sample has two finite coordinates")]
    NoFiniteValues,

    /// Pipeline configuration is invalid.
    #[error("invalid scagnostics configuration: {0}")]
    InvalidConfig(String),

    /// Binning relaxation hit the retry ceiling.
    #[error("binning did not converge after {attempts} relaxations")]
    NonConvergentRelaxation { attempts: usize },

    /// The sites could not be triangulated.
    #[error("triangulation failed: {0}")]
    Triangulation(String),
}
