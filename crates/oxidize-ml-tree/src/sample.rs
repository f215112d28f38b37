use oxidize_ml_core::Tensor;
use rand::Rng;

use crate::criterion::Criterion;

/// Sequential reservoir selection of `n_in_bag` positions out of `n_total`,
/// uniform over all `C(n_total, n_in_bag)` subsets. Iterate forward once;
/// at position `i`, select it with probability `(n_in_bag - n_bagged) /
/// (n_total - i)`, the standard reservoir-sampling-without-replacement
/// recurrence. Always selects exactly `n_in_bag` positions.
pub fn random_sample_mask(n_total: usize, n_in_bag: usize, rng: &mut impl Rng) -> Vec<bool> {
    let mut mask = vec![false; n_total];
    let mut n_bagged = 0usize;
    for i in 0..n_total {
        if n_bagged >= n_in_bag {
            break;
        }
        let u: f64 = rng.gen_range(0.0..1.0);
        if u * ((n_total - i) as f64) < (n_in_bag - n_bagged) as f64 {
            mask[i] = true;
            n_bagged += 1;
        }
    }
    mask
}

/// Evaluate a criterion over a leaf's masked sample set without searching
/// for a split: `init` then `eval`.
pub fn error_at_leaf(
    y: &Tensor<f64>,
    sample_mask: &[bool],
    criterion: &mut dyn Criterion,
    n_samples: usize,
) -> f64 {
    let n_total = sample_mask.len();
    criterion.init(y, sample_mask, n_samples, n_total);
    criterion.eval()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::Mse;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn selects_exactly_m_positions() {
        let mut rng = StdRng::seed_from_u64(7);
        for &(n, m) in &[(10, 3), (10, 0), (10, 10), (1, 1), (1, 0), (5, 5)] {
            let mask = random_sample_mask(n, m, &mut rng);
            assert_eq!(mask.len(), n);
            assert_eq!(mask.iter().filter(|&&b| b).count(), m);
        }
    }

    #[test]
    fn marginal_selection_frequency_is_close_to_uniform() {
        let mut rng = StdRng::seed_from_u64(123);
        let n = 10;
        let m = 3;
        let trials = 2000;
        let mut counts = vec![0u32; n];
        for _ in 0..trials {
            let mask = random_sample_mask(n, m, &mut rng);
            for (i, &selected) in mask.iter().enumerate() {
                if selected {
                    counts[i] += 1;
                }
            }
        }
        let expected = trials as f64 * m as f64 / n as f64;
        for &c in &counts {
            assert_relative_eq!(c as f64, expected, max_relative = 0.25);
        }
    }

    #[test]
    fn error_at_leaf_matches_criterion_eval() {
        let y = Tensor::new(vec![0.0, 0.0, 10.0, 10.0], vec![4, 1, 1, 1]).unwrap();
        let mask = [true, true, true, true];
        let mut mse = Mse::new();
        let err = error_at_leaf(&y, &mask, &mut mse, 4);
        assert_relative_eq!(err, 100.0, epsilon = 1e-9);
    }
}
