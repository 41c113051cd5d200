//! Adaptive density-aware binning.
//!
//! Reduces an arbitrarily large point list on the unit square to a
//! bounded number of weighted sites.
//!
//! The square is cut into a `2·num_bins × 2·num_bins` grid. Every cell
//! with more than one point keeps `floor(n / scale)` randomly chosen
//! representatives (at least one), and the cell population is spread
//! evenly over them as weight. Two relaxations run until the result is
//! acceptable:
//!
//! 1. If more representatives survive than there are cells, `scale`
//!    grows by half and the pass is retried.
//! 2. If the number of sites still exceeds `max_bins`, `num_bins`
//!    shrinks to two thirds, `scale` grows by half, and the pass is
//!    retried.
//!
//! Both relaxations only ever reduce the number of sites, so the loop
//! converges; a retry ceiling guards against configurations that cannot
//! (for instance `max_bins` below the number of occupied cells at the
//! coarsest resolution).

use std::collections::BTreeMap;

use rand::Rng;

use crate::sampling::select_distinct;
use crate::types::{BinnedData, Point, ScagError, ScagnosticsConfig, Site};

/// Growth factor applied to `scale` on each relaxation.
const SCALE_GROWTH: f64 = 1.5;

/// Bins raw points into weighted sites.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binner {
    num_bins: usize,
    max_bins: usize,
    initial_scale: f64,
    max_relaxations: usize,
}

/// Outcome of a single binning pass.
enum Pass {
    /// More representatives survived than there are cells.
    Overfull,
    /// Representatives per cell, in cell order.
    Accepted(Vec<Site>),
}

impl Binner {
    /// Build a binner from the binning fields of a config.
    #[must_use]
    pub const fn new(config: &ScagnosticsConfig) -> Self {
        Self {
            num_bins: config.num_bins,
            max_bins: config.max_bins,
            initial_scale: config.initial_scale,
            max_relaxations: config.max_relaxations,
        }
    }

    /// Bin the points `(x[i], y[i])` into at most `max_bins` sites.
    ///
    /// Samples with a non-finite coordinate are dropped. Finite values
    /// outside `[0, 1]` land in the nearest edge cell.
    ///
    /// # Errors
    ///
    /// Returns [`ScagError::LengthMismatch`] if the columns differ in
    /// length, [`ScagError::EmptyInput`] if they are empty,
    /// [`ScagError::NoFiniteValues`] if no sample has two finite
    /// coordinates, [`ScagError::InvalidConfig`] for a zero bin count or
    /// bound or a bin count above [`ScagnosticsConfig::MAX_NUM_BINS`],
    /// and [`ScagError::NonConvergentRelaxation`] when the retry ceiling
    /// is hit.
    pub fn bin<R: Rng + ?Sized>(
        &self,
        x: &[f64],
        y: &[f64],
        rng: &mut R,
    ) -> Result<BinnedData, ScagError> {
        if x.len() != y.len() {
            return Err(ScagError::LengthMismatch {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        if x.is_empty() {
            return Err(ScagError::EmptyInput);
        }
        if self.num_bins < 1 || self.max_bins < 1 {
            return Err(ScagError::InvalidConfig(
                "num_bins and max_bins must be at least 1".into(),
            ));
        }
        if self.num_bins > ScagnosticsConfig::MAX_NUM_BINS {
            return Err(ScagError::InvalidConfig(format!(
                "num_bins must be at most {}, got {}",
                ScagnosticsConfig::MAX_NUM_BINS,
                self.num_bins
            )));
        }

        let points: Vec<Point> = x
            .iter()
            .zip(y)
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .map(|(&a, &b)| Point::new(a, b))
            .collect();
        if points.is_empty() {
            return Err(ScagError::NoFiniteValues);
        }

        let mut num_bins = self.num_bins;
        let mut scale = self.initial_scale.max(1.0);
        let mut relaxations = 0;

        loop {
            match bin_pass(&points, num_bins, scale, rng) {
                Pass::Overfull => {
                    tracing::debug!(num_bins, scale, "binning overfull, growing scale");
                    scale *= SCALE_GROWTH;
                }
                Pass::Accepted(sites) if sites.len() > self.max_bins => {
                    tracing::debug!(
                        num_bins,
                        scale,
                        sites = sites.len(),
                        max_bins = self.max_bins,
                        "too many nonempty bins, coarsening grid"
                    );
                    num_bins = (2 * num_bins / 3).max(1);
                    scale *= SCALE_GROWTH;
                }
                Pass::Accepted(sites) => {
                    tracing::trace!(num_bins, scale, sites = sites.len(), "binning accepted");
                    return Ok(BinnedData {
                        sites,
                        num_bins,
                        scale,
                        relaxations,
                    });
                }
            }
            relaxations += 1;
            if relaxations > self.max_relaxations {
                return Err(ScagError::NonConvergentRelaxation {
                    attempts: relaxations - 1,
                });
            }
        }
    }
}

/// Cell index along one axis for a coordinate on the unit interval.
///
/// The value 1.0 (and anything above) maps to the last cell.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn cell_of(value: f64, cells: usize) -> usize {
    let raw = (value * cells as f64).floor();
    if raw <= 0.0 {
        0
    } else {
        (raw as usize).min(cells - 1)
    }
}

/// One binning pass at a fixed resolution and scale.
fn bin_pass<R: Rng + ?Sized>(points: &[Point], num_bins: usize, scale: f64, rng: &mut R) -> Pass {
    let cells_per_axis = 2 * num_bins;
    let cell_count = cells_per_axis * cells_per_axis;

    // Only occupied cells are stored, keyed (row, column) for row-major order.
    let mut members = BTreeMap::<(usize, usize), Vec<Point>>::new();
    for &p in points {
        let cx = cell_of(p.x, cells_per_axis);
        let cy = cell_of(p.y, cells_per_axis);
        members.entry((cy, cx)).or_default().push(p);
    }

    let mut sites = Vec::new();
    for cell in members.values() {
        match cell.len() {
            0 => {}
            1 => sites.push(Site {
                point: cell[0],
                weight: 1.0,
            }),
            population => {
                #[allow(clippy::cast_precision_loss)]
                let mass = population as f64;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let keep = (mass / scale).floor() as usize;
                if keep == 0 {
                    let pick = rng.gen_range(0..population);
                    sites.push(Site {
                        point: cell[pick],
                        weight: mass,
                    });
                } else {
                    #[allow(clippy::cast_precision_loss)]
                    let weight = mass / keep as f64;
                    for pick in select_distinct(rng, population, keep) {
                        sites.push(Site {
                            point: cell[pick],
                            weight,
                        });
                    }
                }
            }
        }
    }

    if sites.len() > cell_count {
        Pass::Overfull
    } else {
        Pass::Accepted(sites)
    }
}
