//! Decision-tree split-finding engine: chooses the feature and threshold
//! that minimize an impurity criterion over a masked subset of samples.
//!
//! This crate is the computational kernel consumed by higher-level
//! tree-growing and ensemble code (node queues, recursion, bagging,
//! boosting) — those live elsewhere and are not part of this crate's
//! surface. What's here: the `Criterion` abstraction and its Gini/Entropy/
//! MSE variants, the deterministic and random split searches, leaf-error
//! evaluation, and the tree traversal kernels that share the split
//! output's data layout.

pub mod criterion;
pub mod error;
pub mod matrix;
pub mod sample;
pub mod sse;
pub mod split;
pub mod traverse;

pub use criterion::{Criterion, Entropy, Gini, LeafValue, Mse};
pub use error::{TreeError, TreeResult};
pub use matrix::{ArgsortMatrix, ColumnMajorMatrix, FeatureMatrix};
pub use sample::{error_at_leaf, random_sample_mask};
pub use split::{find_best_random_split, find_best_split, smallest_sample_larger_than};
pub use traverse::{apply_tree, predict_tree};

/// Which impurity criterion to build. `Gini`/`Entropy` are classification
/// criteria and require `n_classes`; `Mse` is a regression criterion and
/// discovers its output count from `y`'s shape at `init` time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionKind {
    Gini,
    Entropy,
    Mse,
}

/// Factory matching the engine's external interface: build a boxed,
/// dynamically-dispatched `Criterion` for the given kind. Dynamic dispatch
/// is acceptable here because a criterion is invoked O(n·d) times per node
/// with meaningful work per call — the indirection is amortized.
pub fn build_criterion(
    kind: CriterionKind,
    n_classes: Option<usize>,
) -> TreeResult<Box<dyn Criterion>> {
    match kind {
        CriterionKind::Gini => {
            let n_classes = n_classes.ok_or(TreeError::MissingClassCount)?;
            Ok(Box::new(Gini::new(n_classes)))
        }
        CriterionKind::Entropy => {
            let n_classes = n_classes.ok_or(TreeError::MissingClassCount)?;
            Ok(Box::new(Entropy::new(n_classes)))
        }
        CriterionKind::Mse => Ok(Box::new(Mse::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use oxidize_ml_core::Tensor;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn build_criterion_requires_n_classes_for_gini() {
        assert!(matches!(
            build_criterion(CriterionKind::Gini, None),
            Err(TreeError::MissingClassCount)
        ));
        assert!(build_criterion(CriterionKind::Gini, Some(2)).is_ok());
    }

    #[test]
    fn build_criterion_mse_ignores_n_classes() {
        assert!(build_criterion(CriterionKind::Mse, None).is_ok());
    }

    #[test]
    fn end_to_end_split_via_factory() {
        let x = FeatureMatrix::new(vec![0.0, 1.0, 2.0, 3.0], 4, 1).unwrap();
        let y = Tensor::new(vec![0.0, 0.0, 1.0, 1.0], vec![4, 1, 1, 1]).unwrap();
        let x_argsorted = ArgsortMatrix::new(vec![0, 1, 2, 3], 4, 1).unwrap();
        let mask = [true, true, true, true];
        let mut criterion = build_criterion(CriterionKind::Gini, Some(2)).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let (best_i, best_t, best_error, _) = find_best_split(
            &x,
            &y,
            &x_argsorted,
            &mask,
            4,
            1,
            -1,
            criterion.as_mut(),
            &mut rng,
        )
        .unwrap();

        assert_eq!(best_i, 0);
        assert_relative_eq!(best_t, 1.5, epsilon = 1e-12);
        assert_relative_eq!(best_error, 0.0, epsilon = 1e-12);
    }
}
