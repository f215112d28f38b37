//! Numeric primitives shared by the regression criterion: recovering a
//! variance (sum of squared errors, normalized by count) from a running
//! sum-of-squares and mean, without ever re-touching the underlying samples.

/// `variance = sq_sum - n * mean^2`, the identity that lets `RegressionCriterion`
/// track `sq_sum` and `mean` incrementally and still recover a variance on demand.
#[inline]
pub fn variance_from_sum_of_squares(sq_sum: f64, mean: f64, n: usize) -> f64 {
    sq_sum - (n as f64) * mean * mean
}

/// Fold one more observation into a running mean, given the count *before*
/// this observation is added.
#[inline]
pub fn incremental_mean(old_mean: f64, old_n: usize, value: f64) -> f64 {
    (old_mean * old_n as f64 + value) / (old_n as f64 + 1.0)
}

/// Remove one observation from a running mean, given the count *before*
/// this observation is removed. Can divide by zero (yielding `inf`/`NaN`)
/// when `old_n == 1`; callers must not read the result past that point.
#[inline]
pub fn decremental_mean(old_mean: f64, old_n: usize, value: f64) -> f64 {
    (old_mean * old_n as f64 - value) / (old_n as f64 - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn variance_matches_direct_computation() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let sq_sum: f64 = values.iter().map(|v| v * v).sum();
        let direct: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        assert_relative_eq!(variance_from_sum_of_squares(sq_sum, mean, n), direct, epsilon = 1e-9);
    }

    #[test]
    fn incremental_mean_matches_batch() {
        let mut mean = 0.0;
        for (i, &v) in [1.0, 2.0, 3.0, 4.0].iter().enumerate() {
            mean = incremental_mean(mean, i, v);
        }
        assert_relative_eq!(mean, 2.5, epsilon = 1e-12);
    }
}
