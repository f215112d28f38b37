use crate::matrix::FeatureMatrix;

/// Descend every row from node `0` to the leaf it reaches: follow
/// `children[node][0]` while `X[row, feature[node]] <= threshold[node]`,
/// otherwise `children[node][1]`; stop once both children are `-1`.
/// Writes the reached node id into `out[row]`.
pub fn apply_tree(
    x: &FeatureMatrix,
    children: &[[i32; 2]],
    feature: &[i32],
    threshold: &[f64],
    out: &mut [i32],
) {
    for row in 0..x.n_rows() {
        let mut node = 0usize;
        loop {
            let [left, right] = children[node];
            if left == -1 && right == -1 {
                break;
            }
            let f = feature[node] as usize;
            node = if x.get(row, f) <= threshold[node] {
                left as usize
            } else {
                right as usize
            };
        }
        out[row] = node as i32;
    }
}

/// Same descent as `apply_tree`, then copy the reached leaf's `out_dim`-wide
/// value slab (row-major `values`) into the matching row of `pred`.
pub fn predict_tree(
    x: &FeatureMatrix,
    children: &[[i32; 2]],
    feature: &[i32],
    threshold: &[f64],
    values: &[f64],
    out_dim: usize,
    pred: &mut [f64],
) {
    let n_rows = x.n_rows();
    let mut leaves = vec![0i32; n_rows];
    apply_tree(x, children, feature, threshold, &mut leaves);
    for row in 0..n_rows {
        let leaf = leaves[row] as usize;
        let src = &values[leaf * out_dim..leaf * out_dim + out_dim];
        let dst = &mut pred[row * out_dim..row * out_dim + out_dim];
        dst.copy_from_slice(src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single-feature stump: node 0 splits at 1.5, leaves are nodes 1 and 2.
    fn stump() -> (Vec<[i32; 2]>, Vec<i32>, Vec<f64>) {
        let children = vec![[1, 2], [-1, -1], [-1, -1]];
        let feature = vec![0, -1, -1];
        let threshold = vec![1.5, 0.0, 0.0];
        (children, feature, threshold)
    }

    #[test]
    fn apply_tree_routes_rows_to_expected_leaves() {
        let x = FeatureMatrix::new(vec![0.0, 1.0, 2.0, 3.0], 4, 1).unwrap();
        let (children, feature, threshold) = stump();
        let mut out = vec![0; 4];
        apply_tree(&x, &children, &feature, &threshold, &mut out);
        assert_eq!(out, vec![1, 1, 2, 2]);
    }

    #[test]
    fn predict_tree_copies_leaf_values() {
        let x = FeatureMatrix::new(vec![0.0, 1.0, 2.0, 3.0], 4, 1).unwrap();
        let (children, feature, threshold) = stump();
        // leaf 1 predicts 0.0, leaf 2 predicts 1.0 (single output)
        let values = vec![0.0, 0.0, 1.0];
        let mut pred = vec![0.0; 4];
        predict_tree(&x, &children, &feature, &threshold, &values, 1, &mut pred);
        assert_eq!(pred, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn predict_tree_copies_multi_output_slabs() {
        let x = FeatureMatrix::new(vec![0.0, 3.0], 2, 1).unwrap();
        let (children, feature, threshold) = stump();
        // two outputs per leaf
        let values = vec![0.0, 0.0, 9.0, 9.0, 1.0, 2.0];
        let mut pred = vec![0.0; 4];
        predict_tree(&x, &children, &feature, &threshold, &values, 2, &mut pred);
        assert_eq!(pred, vec![9.0, 9.0, 1.0, 2.0]);
    }
}
