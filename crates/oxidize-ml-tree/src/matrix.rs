use crate::error::{TreeError, TreeResult};

/// A dense 2-D matrix stored **column-major**: each column is a contiguous,
/// unit-stride slice. `oxidize_ml_core::Tensor` is row-major only, so the
/// split-search hot path (which sweeps one column at a time) gets its own
/// tiny view type instead of fighting the core tensor's stride convention.
#[derive(Debug, Clone)]
pub struct ColumnMajorMatrix<T> {
    data: Vec<T>,
    n_rows: usize,
    n_cols: usize,
}

impl<T: Copy> ColumnMajorMatrix<T> {
    pub fn new(data: Vec<T>, n_rows: usize, n_cols: usize) -> TreeResult<Self> {
        if data.len() != n_rows * n_cols {
            return Err(TreeError::InvalidShape {
                what: "ColumnMajorMatrix",
                expected: format!("{} elements ({n_rows}x{n_cols})", n_rows * n_cols),
                got: format!("{} elements", data.len()),
            });
        }
        Ok(ColumnMajorMatrix { data, n_rows, n_cols })
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[col * self.n_rows + row]
    }

    /// The `col`-th column as a contiguous, unit-stride slice.
    #[inline]
    pub fn column(&self, col: usize) -> &[T] {
        let start = col * self.n_rows;
        &self.data[start..start + self.n_rows]
    }
}

/// `X`: dense feature matrix, 64-bit float, column-major.
pub type FeatureMatrix = ColumnMajorMatrix<f64>;

/// `X_argsorted`: per-column ascending permutation of row indices, column-major.
pub type ArgsortMatrix = ColumnMajorMatrix<i32>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_is_contiguous_and_correct() {
        // column-major: [[0,1],[2,3],[4,5]] stored as col0=[0,2,4], col1=[1,3,5]
        let m = FeatureMatrix::new(vec![0.0, 2.0, 4.0, 1.0, 3.0, 5.0], 3, 2).unwrap();
        assert_eq!(m.column(0), &[0.0, 2.0, 4.0]);
        assert_eq!(m.column(1), &[1.0, 3.0, 5.0]);
        assert_eq!(m.get(1, 1), 3.0);
    }

    #[test]
    fn rejects_mismatched_length() {
        assert!(FeatureMatrix::new(vec![0.0, 1.0, 2.0], 2, 2).is_err());
    }
}
