//! Random selection of distinct indices for bin subsampling.

use fixedbitset::FixedBitSet;
use rand::Rng;

/// Draw `m` distinct indices uniformly from `0..n`.
///
/// Each draw is uniform over `0..n`; a draw that collides with an
/// index already taken is retried. The returned indices are in draw
/// order. `m` is clamped to `n` so the loop always terminates.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use scag_pipeline::sampling::select_distinct;
///
/// let mut rng = StdRng::seed_from_u64(1);
/// let picked = select_distinct(&mut rng, 10, 4);
/// assert_eq!(picked.len(), 4);
/// assert!(picked.iter().all(|&i| i < 10));
/// ```
#[must_use]
pub fn select_distinct<R: Rng + ?Sized>(rng: &mut R, n: usize, m: usize) -> Vec<usize> {
    let m = m.min(n);
    let mut taken = FixedBitSet::with_capacity(n);
    let mut picked = Vec::with_capacity(m);
    while picked.len() < m {
        let candidate = rng.gen_range(0..n);
        if !taken.put(candidate) {
            picked.push(candidate);
        }
    }
    picked
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn zero_requested_returns_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(select_distinct(&mut rng, 5, 0).is_empty());
    }

    #[test]
    fn empty_population_returns_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(select_distinct(&mut rng, 0, 3).is_empty());
    }

    #[test]
    fn full_selection_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut picked = select_distinct(&mut rng, 20, 20);
        picked.sort_unstable();
        assert_eq!(picked, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn oversized_request_is_clamped() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(select_distinct(&mut rng, 4, 9).len(), 4);
    }

    #[test]
    fn same_seed_same_selection() {
        let a = select_distinct(&mut StdRng::seed_from_u64(42), 100, 10);
        let b = select_distinct(&mut StdRng::seed_from_u64(42), 100, 10);
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn selection_is_distinct_and_in_range(n in 1usize..200, frac in 0.0f64..=1.0, seed: u64) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
            let m = ((n as f64) * frac).floor() as usize;
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = select_distinct(&mut rng, n, m);
            prop_assert_eq!(picked.len(), m);
            let mut sorted = picked.clone();
            sorted.sort_unstable();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), m);
            prop_assert!(picked.iter().all(|&i| i < n));
        }
    }
}
