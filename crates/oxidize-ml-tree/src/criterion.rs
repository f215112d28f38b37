use oxidize_ml_core::Tensor;

use crate::sse;

/// The statistic used to label a leaf containing the criterion's current
/// masked set: class counts for classification, per-output means for
/// regression. Shape is criterion-dependent, hence the enum rather than a
/// single `Vec<f64>`.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    ClassCounts(Vec<i32>),
    Means(Vec<f64>),
}

/// A stateful impurity accumulator with incremental left/right bookkeeping.
///
/// Lifecycle: `init` once per node, `reset` once per feature within that
/// node, `update` monotonically per sweep step. A criterion must not carry
/// state between unrelated nodes except through `init`.
pub trait Criterion {
    /// Recompute aggregate statistics over the masked subset; leave all
    /// samples on the right side.
    fn init(&mut self, y: &Tensor<f64>, sample_mask: &[bool], n_samples: usize, n_total: usize);

    /// Move all samples back to the right without rereading `y`.
    fn reset(&mut self);

    /// For every sort-position `k` in `[a, b)`, move masked sample
    /// `argsorted_column[k]` from right to left. Returns the new `n_left`.
    /// O(b - a), no allocation — this is the split search's hot path.
    fn update(
        &mut self,
        a: usize,
        b: usize,
        y: &Tensor<f64>,
        argsorted_column: &[i32],
        sample_mask: &[bool],
    ) -> usize;

    /// Impurity of the current (left, right) partition. Lower is better.
    fn eval(&self) -> f64;

    /// The statistic used to label a leaf over the current masked set.
    fn init_value(&self) -> LeafValue;
}

/// Product of the axes after the sample axis: `K1 * K2 * K3`.
pub(crate) fn output_dim(y: &Tensor<f64>) -> usize {
    y.shape().dims()[1..].iter().product()
}

/// `y[sample, 0, 0, 0]` rounded to the nearest integer class id.
pub(crate) fn class_of(y: &Tensor<f64>, sample: usize, out_dim: usize) -> usize {
    y.data()[sample * out_dim].round() as usize
}

/// Per-class counts on each side, shared by `Gini` and `Entropy`. The two
/// criteria differ only in the function applied to the counts at `eval()`
/// time; the counting logic itself is identical, so it lives here once.
#[derive(Debug, Clone)]
pub struct ClassificationCriterion {
    /// Number of distinct classes. `i32` counts are kept (not `u32`/`usize`)
    /// to match the historical contract; a node with more than 2^31 samples
    /// of one class would overflow this, which is an accepted ceiling.
    n_classes: usize,
    label_count_init: Vec<i32>,
    label_count_left: Vec<i32>,
    label_count_right: Vec<i32>,
    n_samples: usize,
    n_left: usize,
    n_right: usize,
}

impl ClassificationCriterion {
    pub fn new(n_classes: usize) -> Self {
        ClassificationCriterion {
            n_classes,
            label_count_init: vec![0; n_classes],
            label_count_left: vec![0; n_classes],
            label_count_right: vec![0; n_classes],
            n_samples: 0,
            n_left: 0,
            n_right: 0,
        }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn init(&mut self, y: &Tensor<f64>, sample_mask: &[bool], n_samples: usize, n_total: usize) {
        let out_dim = output_dim(y);
        self.label_count_init.iter_mut().for_each(|c| *c = 0);
        for i in 0..n_total {
            if sample_mask[i] {
                let cls = class_of(y, i, out_dim);
                if cls < self.n_classes {
                    self.label_count_init[cls] += 1;
                }
            }
        }
        self.n_samples = n_samples;
        self.reset();
    }

    fn reset(&mut self) {
        self.label_count_left.iter_mut().for_each(|c| *c = 0);
        self.label_count_right.copy_from_slice(&self.label_count_init);
        self.n_left = 0;
        self.n_right = self.n_samples;
    }

    fn update(
        &mut self,
        a: usize,
        b: usize,
        y: &Tensor<f64>,
        argsorted_column: &[i32],
        sample_mask: &[bool],
    ) -> usize {
        let out_dim = output_dim(y);
        for k in a..b {
            let s = argsorted_column[k] as usize;
            if !sample_mask[s] {
                continue;
            }
            let cls = class_of(y, s, out_dim);
            if cls < self.n_classes {
                self.label_count_left[cls] += 1;
                self.label_count_right[cls] -= 1;
            }
            self.n_left += 1;
            self.n_right -= 1;
        }
        debug_assert_eq!(self.n_left + self.n_right, self.n_samples);
        for k in 0..self.n_classes {
            debug_assert_eq!(
                self.label_count_left[k] + self.label_count_right[k],
                self.label_count_init[k]
            );
        }
        self.n_left
    }

    fn gini_eval(&self) -> f64 {
        fn side_gini(counts: &[i32], n_side: usize) -> f64 {
            if n_side == 0 {
                return 0.0;
            }
            let sum_sq: f64 = counts.iter().map(|&c| f64::from(c) * f64::from(c)).sum();
            n_side as f64 - sum_sq / n_side as f64
        }
        let g_left = side_gini(&self.label_count_left, self.n_left);
        let g_right = side_gini(&self.label_count_right, self.n_right);
        (g_left + g_right) / self.n_samples as f64
    }

    fn entropy_eval(&self) -> f64 {
        fn side_entropy(counts: &[i32], n_side: usize) -> f64 {
            if n_side == 0 {
                return 0.0;
            }
            counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = f64::from(c) / n_side as f64;
                    -p * p.ln()
                })
                .sum()
        }
        let n = self.n_samples as f64;
        let h_left = side_entropy(&self.label_count_left, self.n_left);
        let h_right = side_entropy(&self.label_count_right, self.n_right);
        (self.n_left as f64 / n) * h_left + (self.n_right as f64 / n) * h_right
    }

    fn init_value(&self) -> LeafValue {
        LeafValue::ClassCounts(self.label_count_init.clone())
    }
}

/// Gini impurity: `G_side = n_side - (Σ c_k²) / n_side`, reported as
/// `(G_left + G_right) / n_samples`.
#[derive(Debug, Clone)]
pub struct Gini(ClassificationCriterion);

impl Gini {
    pub fn new(n_classes: usize) -> Self {
        Gini(ClassificationCriterion::new(n_classes))
    }
}

impl Criterion for Gini {
    fn init(&mut self, y: &Tensor<f64>, sample_mask: &[bool], n_samples: usize, n_total: usize) {
        self.0.init(y, sample_mask, n_samples, n_total);
    }

    fn reset(&mut self) {
        self.0.reset();
    }

    fn update(
        &mut self,
        a: usize,
        b: usize,
        y: &Tensor<f64>,
        argsorted_column: &[i32],
        sample_mask: &[bool],
    ) -> usize {
        self.0.update(a, b, y, argsorted_column, sample_mask)
    }

    fn eval(&self) -> f64 {
        self.0.gini_eval()
    }

    fn init_value(&self) -> LeafValue {
        self.0.init_value()
    }
}

/// Entropy: `H_side = -Σ (c_k/n_side) ln(c_k/n_side)` skipping zero counts,
/// reported as the sample-weighted average of the two sides.
#[derive(Debug, Clone)]
pub struct Entropy(ClassificationCriterion);

impl Entropy {
    pub fn new(n_classes: usize) -> Self {
        Entropy(ClassificationCriterion::new(n_classes))
    }
}

impl Criterion for Entropy {
    fn init(&mut self, y: &Tensor<f64>, sample_mask: &[bool], n_samples: usize, n_total: usize) {
        self.0.init(y, sample_mask, n_samples, n_total);
    }

    fn reset(&mut self) {
        self.0.reset();
    }

    fn update(
        &mut self,
        a: usize,
        b: usize,
        y: &Tensor<f64>,
        argsorted_column: &[i32],
        sample_mask: &[bool],
    ) -> usize {
        self.0.update(a, b, y, argsorted_column, sample_mask)
    }

    fn eval(&self) -> f64 {
        self.0.entropy_eval()
    }

    fn init_value(&self) -> LeafValue {
        self.0.init_value()
    }
}

/// Per-output running sum, squared-sum, mean, and variance on each side.
/// Output count (`K1*K2*K3`) is discovered from `y`'s shape at `init` time,
/// so scratch vectors are allocated there rather than at construction.
#[derive(Debug, Clone, Default)]
pub struct RegressionCriterion {
    n_outputs: usize,
    mean_init: Vec<f64>,
    mean_left: Vec<f64>,
    mean_right: Vec<f64>,
    sq_sum_init: Vec<f64>,
    sq_sum_left: Vec<f64>,
    sq_sum_right: Vec<f64>,
    var_left: Vec<f64>,
    var_right: Vec<f64>,
    n_samples: usize,
    n_left: usize,
    n_right: usize,
}

impl RegressionCriterion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_outputs(&self) -> usize {
        self.n_outputs
    }

    fn init(&mut self, y: &Tensor<f64>, sample_mask: &[bool], n_samples: usize, n_total: usize) {
        let out_dim = output_dim(y);
        self.n_outputs = out_dim;
        self.mean_init = vec![0.0; out_dim];
        self.sq_sum_init = vec![0.0; out_dim];
        for i in 0..n_total {
            if sample_mask[i] {
                for o in 0..out_dim {
                    let v = y.data()[i * out_dim + o];
                    self.mean_init[o] += v;
                    self.sq_sum_init[o] += v * v;
                }
            }
        }
        if n_samples > 0 {
            for m in self.mean_init.iter_mut() {
                *m /= n_samples as f64;
            }
        }
        self.n_samples = n_samples;
        self.mean_left = vec![0.0; out_dim];
        self.mean_right = vec![0.0; out_dim];
        self.sq_sum_left = vec![0.0; out_dim];
        self.sq_sum_right = vec![0.0; out_dim];
        self.var_left = vec![0.0; out_dim];
        self.var_right = vec![0.0; out_dim];
        self.reset();
    }

    fn reset(&mut self) {
        self.mean_left.iter_mut().for_each(|m| *m = 0.0);
        self.mean_right.copy_from_slice(&self.mean_init);
        self.sq_sum_left.iter_mut().for_each(|s| *s = 0.0);
        self.sq_sum_right.copy_from_slice(&self.sq_sum_init);
        self.n_left = 0;
        self.n_right = self.n_samples;
        for o in 0..self.n_outputs {
            self.var_left[o] = 0.0;
            self.var_right[o] =
                sse::variance_from_sum_of_squares(self.sq_sum_right[o], self.mean_right[o], self.n_right);
        }
    }

    fn update(
        &mut self,
        a: usize,
        b: usize,
        y: &Tensor<f64>,
        argsorted_column: &[i32],
        sample_mask: &[bool],
    ) -> usize {
        let out_dim = self.n_outputs;
        for k in a..b {
            let s = argsorted_column[k] as usize;
            if !sample_mask[s] {
                continue;
            }
            let old_n_left = self.n_left;
            let old_n_right = self.n_samples - old_n_left;
            for o in 0..out_dim {
                let v = y.data()[s * out_dim + o];
                self.sq_sum_left[o] += v * v;
                self.sq_sum_right[o] -= v * v;
                // f64 arithmetic throughout: when old_n_right == 1 this
                // divides by zero, producing inf/NaN rather than an integer
                // underflow panic. The sweep driver never calls `eval()`
                // past that point, so the value is written but never read.
                self.mean_left[o] = sse::incremental_mean(self.mean_left[o], old_n_left, v);
                self.mean_right[o] = sse::decremental_mean(self.mean_right[o], old_n_right, v);
            }
            self.n_left += 1;
            self.n_right -= 1;
        }
        for o in 0..out_dim {
            self.var_left[o] =
                sse::variance_from_sum_of_squares(self.sq_sum_left[o], self.mean_left[o], self.n_left);
            self.var_right[o] =
                sse::variance_from_sum_of_squares(self.sq_sum_right[o], self.mean_right[o], self.n_right);
        }
        debug_assert_eq!(self.n_left + self.n_right, self.n_samples);
        for o in 0..out_dim {
            debug_assert!(
                (self.sq_sum_left[o] + self.sq_sum_right[o] - self.sq_sum_init[o]).abs()
                    <= 1e-9 * self.sq_sum_init[o].abs().max(1.0)
            );
        }
        self.n_left
    }

    fn mse_eval(&self) -> f64 {
        self.var_left
            .iter()
            .zip(self.var_right.iter())
            .map(|(l, r)| l + r)
            .sum()
    }

    fn init_value(&self) -> LeafValue {
        LeafValue::Means(self.mean_init.clone())
    }
}

/// MSE: `Σ_o (var_left[o] + var_right[o])`.
#[derive(Debug, Clone, Default)]
pub struct Mse(RegressionCriterion);

impl Mse {
    pub fn new() -> Self {
        Mse(RegressionCriterion::new())
    }
}

impl Criterion for Mse {
    fn init(&mut self, y: &Tensor<f64>, sample_mask: &[bool], n_samples: usize, n_total: usize) {
        self.0.init(y, sample_mask, n_samples, n_total);
    }

    fn reset(&mut self) {
        self.0.reset();
    }

    fn update(
        &mut self,
        a: usize,
        b: usize,
        y: &Tensor<f64>,
        argsorted_column: &[i32],
        sample_mask: &[bool],
    ) -> usize {
        self.0.update(a, b, y, argsorted_column, sample_mask)
    }

    fn eval(&self) -> f64 {
        self.0.mse_eval()
    }

    fn init_value(&self) -> LeafValue {
        self.0.init_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn y_classification(labels: &[f64]) -> Tensor<f64> {
        Tensor::new(labels.to_vec(), vec![labels.len(), 1, 1, 1]).unwrap()
    }

    fn y_regression(values: &[f64]) -> Tensor<f64> {
        Tensor::new(values.to_vec(), vec![values.len(), 1, 1, 1]).unwrap()
    }

    #[test]
    fn gini_pure_node_is_zero() {
        let y = y_classification(&[1.0, 1.0, 1.0]);
        let mask = [true, true, true];
        let mut gini = Gini::new(2);
        gini.init(&y, &mask, 3, 3);
        assert_relative_eq!(gini.eval(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn gini_matches_s1_initial_error() {
        let y = y_classification(&[0.0, 0.0, 1.0, 1.0]);
        let mask = [true, true, true, true];
        let mut gini = Gini::new(2);
        gini.init(&y, &mask, 4, 4);
        assert_relative_eq!(gini.eval(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn label_counts_partition_the_init_counts() {
        let y = y_classification(&[0.0, 1.0, 0.0, 1.0, 0.0]);
        let mask = [true; 5];
        let mut gini = Gini::new(2);
        gini.init(&y, &mask, 5, 5);
        let argsorted = [0, 1, 2, 3, 4];
        gini.update(0, 2, &y, &argsorted, &mask);
        match gini.init_value() {
            LeafValue::ClassCounts(counts) => assert_eq!(counts, vec![3, 2]),
            _ => panic!("expected class counts"),
        }
    }

    #[test]
    fn entropy_pure_node_is_zero() {
        let y = y_classification(&[0.0, 0.0, 0.0]);
        let mask = [true, true, true];
        let mut entropy = Entropy::new(1);
        entropy.init(&y, &mask, 3, 3);
        assert_relative_eq!(entropy.eval(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn mse_matches_s3_initial_error() {
        let y = y_regression(&[0.0, 0.0, 10.0, 10.0]);
        let mask = [true, true, true, true];
        let mut mse = Mse::new();
        mse.init(&y, &mask, 4, 4);
        assert_relative_eq!(mse.eval(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn mse_reaches_zero_on_perfect_split() {
        let y = y_regression(&[0.0, 0.0, 10.0, 10.0]);
        let mask = [true, true, true, true];
        let mut mse = Mse::new();
        mse.init(&y, &mask, 4, 4);
        let argsorted = [0, 1, 2, 3];
        mse.update(0, 2, &y, &argsorted, &mask);
        assert_relative_eq!(mse.eval(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn reset_restores_post_init_state() {
        use approx::assert_relative_ne;

        let y = y_regression(&[1.0, 2.0, 3.0, 4.0]);
        let mask = [true; 4];
        let mut mse = Mse::new();
        mse.init(&y, &mask, 4, 4);
        let after_init = mse.eval();
        let argsorted = [0, 1, 2, 3];
        mse.update(0, 2, &y, &argsorted, &mask);
        assert_relative_ne!(mse.eval(), after_init, epsilon = 1e-9);
        mse.reset();
        assert_relative_eq!(mse.eval(), after_init, epsilon = 1e-12);
    }

    #[test]
    fn multi_output_regression_sums_variance_across_outputs() {
        // output 0 splits perfectly at position 2 ([0,0,10,10]); output 1
        // is constant ([5,5,5,5]) and contributes zero variance regardless
        // of where the split falls.
        let y = Tensor::new(
            vec![0.0, 5.0, 0.0, 5.0, 10.0, 5.0, 10.0, 5.0],
            vec![4, 1, 1, 2],
        )
        .unwrap();
        let mask = [true; 4];
        let mut mse = Mse::new();
        mse.init(&y, &mask, 4, 4);
        let argsorted = [0, 1, 2, 3];
        mse.update(0, 2, &y, &argsorted, &mask);
        assert_relative_eq!(mse.eval(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn sq_sum_is_conserved_across_every_sweep_position() {
        let y = y_regression(&[1.0, 4.0, 9.0, 16.0, 25.0]);
        let mask = [true; 5];
        let mut reg = RegressionCriterion::new();
        reg.init(&y, &mask, 5, 5);
        let sq_sum_init = reg.sq_sum_init.clone();
        let argsorted = [0, 1, 2, 3, 4];

        for k in 0..5 {
            reg.update(k, k + 1, &y, &argsorted, &mask);
            for o in 0..reg.n_outputs {
                assert_relative_eq!(
                    reg.sq_sum_left[o] + reg.sq_sum_right[o],
                    sq_sum_init[o],
                    epsilon = 1e-9
                );
            }
        }
    }
}
