use thiserror::Error;

/// Error type for the split-finding engine's API-boundary shape checks.
///
/// Internal hot-path code (`Criterion::update`, `smallest_sample_larger_than`,
/// the inner sweep loop) never constructs one of these — by the time a split
/// search reaches the sweep, shapes have already been validated once at entry.
#[derive(Debug, Error, Clone)]
pub enum TreeError {
    #[error("invalid shape for {what}: expected {expected}, got {got}")]
    InvalidShape {
        what: &'static str,
        expected: String,
        got: String,
    },

    #[error("n_samples must be > 0")]
    EmptySampleSet,

    #[error("classification criterion requires n_classes")]
    MissingClassCount,
}

pub type TreeResult<T> = Result<T, TreeError>;
