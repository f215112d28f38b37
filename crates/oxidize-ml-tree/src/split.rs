use oxidize_ml_core::Tensor;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::criterion::Criterion;
use crate::error::{TreeError, TreeResult};
use crate::matrix::{ArgsortMatrix, FeatureMatrix};

/// Additive tolerance for "strictly greater" feature-value comparisons in
/// the sweep cursor. Scale-dependent by construction: on features with very
/// large magnitudes it can merge values that a relative tolerance would
/// keep distinct. Kept exactly as specified for reproducibility.
const EPSILON: f64 = 1e-7;

/// Advance the sweep cursor from sort-position `a` (or `-1` to start) to the
/// smallest sort-position `b > a` such that `argsorted_col[b]` is masked and
/// its feature value exceeds the value at `a` by more than `EPSILON`.
/// Returns `-1` when no such position exists.
///
/// `a == -1` is handled by seeding the baseline at `f64::NEG_INFINITY`,
/// which is smaller than every finite value plus `EPSILON` — no separate
/// branch needed for "start of sweep".
pub fn smallest_sample_larger_than(
    a: isize,
    x_col: &[f64],
    argsorted_col: &[i32],
    sample_mask: &[bool],
) -> isize {
    let n = argsorted_col.len();
    let base_value = if a < 0 {
        f64::NEG_INFINITY
    } else {
        x_col[argsorted_col[a as usize] as usize]
    };
    let mut b = if a < 0 { 0usize } else { a as usize + 1 };
    while b < n {
        let s = argsorted_col[b] as usize;
        if sample_mask[s] && x_col[s] > base_value + EPSILON {
            return b as isize;
        }
        b += 1;
    }
    -1
}

fn check_shapes(
    x: &FeatureMatrix,
    x_argsorted: &ArgsortMatrix,
    sample_mask: &[bool],
) -> TreeResult<(usize, usize)> {
    let n_total = x.n_rows();
    let d = x.n_cols();
    if x_argsorted.n_rows() != n_total || x_argsorted.n_cols() != d {
        return Err(TreeError::InvalidShape {
            what: "X_argsorted",
            expected: format!("{n_total}x{d}"),
            got: format!("{}x{}", x_argsorted.n_rows(), x_argsorted.n_cols()),
        });
    }
    if sample_mask.len() != n_total {
        return Err(TreeError::InvalidShape {
            what: "sample_mask",
            expected: format!("{n_total} elements"),
            got: format!("{} elements", sample_mask.len()),
        });
    }
    Ok((n_total, d))
}

/// `max_features < 0` or `>= d` selects every feature in natural order;
/// otherwise a uniform random permutation of `[0..d)` is drawn and truncated.
/// One `shuffle` call consumes the RNG exactly once for this selection,
/// regardless of `d` or `max_features`.
fn select_candidate_features(d: usize, max_features: i64, rng: &mut impl Rng) -> Vec<usize> {
    if max_features < 0 || max_features as usize >= d {
        (0..d).collect()
    } else {
        let mut perm: Vec<usize> = (0..d).collect();
        perm.shuffle(rng);
        perm.truncate(max_features as usize);
        perm
    }
}

fn first_masked_position(arg_col: &[i32], sample_mask: &[bool]) -> Option<usize> {
    (0..arg_col.len()).find(|&k| sample_mask[arg_col[k] as usize])
}

fn last_masked_position(arg_col: &[i32], sample_mask: &[bool]) -> Option<usize> {
    (0..arg_col.len()).rev().find(|&k| sample_mask[arg_col[k] as usize])
}

/// Exhaustive sweep over `(feature, threshold)` pairs using the presorted
/// index, turning what would be an O(n² · d) search into O(n · d).
///
/// Preconditions: `n_samples > 0`; every column of `x_argsorted` lists every
/// row of the global dataset (masked or not).
pub fn find_best_split(
    x: &FeatureMatrix,
    y: &Tensor<f64>,
    x_argsorted: &ArgsortMatrix,
    sample_mask: &[bool],
    n_samples: usize,
    min_leaf: usize,
    max_features: i64,
    criterion: &mut dyn Criterion,
    rng: &mut impl Rng,
) -> TreeResult<(i32, f64, f64, f64)> {
    let (n_total, d) = check_shapes(x, x_argsorted, sample_mask)?;
    if n_samples == 0 {
        return Err(TreeError::EmptySampleSet);
    }

    criterion.init(y, sample_mask, n_samples, n_total);
    let initial_error = criterion.eval();
    if initial_error == 0.0 {
        return Ok((-1, f64::INFINITY, 0.0, 0.0));
    }

    let candidate_features = select_candidate_features(d, max_features, rng);

    let mut best_i: i32 = -1;
    let mut best_t = f64::INFINITY;
    let mut best_error = initial_error;

    for feature in candidate_features {
        criterion.reset();
        let col = x.column(feature);
        let arg_col = x_argsorted.column(feature);

        let Some(start) = first_masked_position(arg_col, sample_mask) else {
            continue;
        };
        let mut a = start as isize;

        loop {
            let b = smallest_sample_larger_than(a, col, arg_col, sample_mask);
            if b < 0 {
                break;
            }
            let n_left = criterion.update(a as usize, b as usize, y, arg_col, sample_mask);
            let n_right = n_samples - n_left;
            if n_left >= min_leaf && n_right >= min_leaf {
                let error = criterion.eval();
                if error < best_error {
                    let x_a = col[arg_col[a as usize] as usize];
                    let x_b = col[arg_col[b as usize] as usize];
                    let mut t = x_a + (x_b - x_a) / 2.0;
                    if t == x_b {
                        t = x_a;
                    }
                    best_error = error;
                    best_i = feature as i32;
                    best_t = t;
                }
            }
            a = b;
        }
    }

    Ok((best_i, best_t, best_error, initial_error))
}

/// One random threshold per feature, drawn uniformly between the feature's
/// masked extremes. The RNG is advanced once for the candidate-feature
/// permutation and once per candidate feature for its threshold draw.
pub fn find_best_random_split(
    x: &FeatureMatrix,
    y: &Tensor<f64>,
    x_argsorted: &ArgsortMatrix,
    sample_mask: &[bool],
    n_samples: usize,
    min_leaf: usize,
    max_features: i64,
    criterion: &mut dyn Criterion,
    rng: &mut impl Rng,
) -> TreeResult<(i32, f64, f64, f64)> {
    let (n_total, d) = check_shapes(x, x_argsorted, sample_mask)?;
    if n_samples == 0 {
        return Err(TreeError::EmptySampleSet);
    }

    criterion.init(y, sample_mask, n_samples, n_total);
    let initial_error = criterion.eval();
    if initial_error == 0.0 {
        return Ok((-1, f64::INFINITY, 0.0, 0.0));
    }

    let candidate_features = select_candidate_features(d, max_features, rng);

    let mut best_i: i32 = -1;
    let mut best_t = f64::INFINITY;
    let mut best_error = initial_error;

    for feature in candidate_features {
        criterion.reset();
        let col = x.column(feature);
        let arg_col = x_argsorted.column(feature);

        let (Some(a), Some(b)) = (
            first_masked_position(arg_col, sample_mask),
            last_masked_position(arg_col, sample_mask),
        ) else {
            continue;
        };
        if b <= a {
            continue;
        }
        let x_a = col[arg_col[a] as usize];
        let x_b = col[arg_col[b] as usize];
        if x_a == x_b {
            continue;
        }

        let u: f64 = rng.gen_range(0.0..1.0);
        let mut t = x_a + u * (x_b - x_a);
        if t == x_b {
            t = x_a;
        }

        let mut c = a + 1;
        while c < b {
            let s = arg_col[c] as usize;
            if sample_mask[s] && col[s] > t {
                break;
            }
            c += 1;
        }

        let n_left = criterion.update(0, c, y, arg_col, sample_mask);
        let n_right = n_samples - n_left;
        if n_left < min_leaf || n_right < min_leaf {
            continue;
        }
        let error = criterion.eval();
        if error < best_error {
            best_error = error;
            best_i = feature as i32;
            best_t = t;
        }
    }

    Ok((best_i, best_t, best_error, initial_error))
}
