//! Per-variable rescaling onto the unit interval.
//!
//! Each column is mapped through
//!
//! ```text
//! v' = (v - min) / (max - min)
//! ```
//!
//! with `min` and `max` taken over the column's finite values. Missing
//! samples (NaN) stay missing. A column whose finite values are all
//! equal maps to 0, and a column with no finite value is left as all
//! NaN.

/// Rescale one column in place.
pub fn normalize_column(column: &mut [f64]) {
    let (lo, hi) = column
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if lo > hi {
        for v in column.iter_mut() {
            *v = f64::NAN;
        }
        return;
    }
    let range = hi - lo;
    for v in column.iter_mut() {
        *v = if !v.is_finite() {
            f64::NAN
        } else if range > 0.0 {
            (*v - lo) / range
        } else {
            0.0
        };
    }
}

/// Rescale every column onto `[0, 1]`.
#[must_use]
pub fn normalize_columns(columns: &[Vec<f64>]) -> Vec<Vec<f64>> {
    columns
        .iter()
        .map(|column| {
            let mut out = column.clone();
            normalize_column(&mut out);
            out
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn maps_extremes_to_unit_interval() {
        let out = normalize_columns(&[vec![2.0, 4.0, 3.0, 6.0]]);
        assert_eq!(out, vec![vec![0.0, 0.5, 0.25, 1.0]]);
    }

    #[test]
    fn constant_column_maps_to_zero() {
        let out = normalize_columns(&[vec![7.0, 7.0, 7.0]]);
        assert_eq!(out, vec![vec![0.0, 0.0, 0.0]]);
    }

    #[test]
    fn missing_values_stay_missing() {
        let out = normalize_columns(&[vec![1.0, f64::NAN, 3.0]]);
        assert!((out[0][0]).abs() < f64::EPSILON);
        assert!(out[0][1].is_nan());
        assert!((out[0][2] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn infinities_are_treated_as_missing() {
        let out = normalize_columns(&[vec![f64::INFINITY, 0.0, 10.0]]);
        assert!(out[0][0].is_nan());
        assert!((out[0][2] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn all_missing_column_stays_nan() {
        let out = normalize_columns(&[vec![f64::NAN, f64::NAN]]);
        assert!(out[0].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn columns_are_independent() {
        let out = normalize_columns(&[vec![0.0, 10.0], vec![-1.0, 1.0]]);
        assert_eq!(out, vec![vec![0.0, 1.0], vec![0.0, 1.0]]);
    }
}
