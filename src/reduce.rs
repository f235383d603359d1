use ndarray::{Array1, Array2, ArrayView2, Axis};


#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PruneMode {
    High,
    Low,
}

/// Zeroes the columns whose variance deviates more than `nrstd` standard
/// deviations from the mean of all column variances.
pub fn prune_high_variance(row_vecs: ArrayView2<f32>, nrstd: f32) -> Array2<f32> {
    prune(row_vecs, PruneMode::High, nrstd)
}

/// Zeroes the columns whose variance deviates less than `nrstd` standard
/// deviations from the mean of all column variances.
pub fn prune_low_variance(row_vecs: ArrayView2<f32>, nrstd: f32) -> Array2<f32> {
    prune(row_vecs, PruneMode::Low, nrstd)
}

pub fn prune(row_vecs: ArrayView2<f32>, mode: PruneMode, nrstd: f32) -> Array2<f32> {

    // variance is undefined without rows
    if row_vecs.nrows() == 0 || row_vecs.ncols() == 0 {
        return row_vecs.to_owned();
    }

    // population variance of every column, then mean and spread of those
    let varvec: Array1<f32> = row_vecs.var_axis(Axis(0), 0.0);
    let varmean = varvec.mean().unwrap_or(0.0);
    let varstd = varvec.std(0.0);
    let bound = varstd * nrstd;

    let mask = varvec.mapv(|var| {
        let deviation = (var - varmean).abs();
        let keep = match mode {
            PruneMode::High => deviation < bound,
            PruneMode::Low => deviation > bound,
        };
        if keep { 1.0 } else { 0.0 }
    });

    &row_vecs * &mask
}


#[cfg(test)]
mod tests {

    use ndarray::array;
    use super::{prune_high_variance, prune_low_variance};

    // column variances: 0, 1, 1, 100 -> mean 25.5, std ~43.0
    fn matrix() -> ndarray::Array2<f32> {
        array![
            [1.0, 0.0, 2.0, 10.0],
            [1.0, 2.0, 0.0, -10.0],
        ]
    }

    #[test]
    fn high_variance_columns_are_removed() {
        let pruned = prune_high_variance(matrix().view(), 1.0);
        assert_eq!(pruned, array![
            [1.0, 0.0, 2.0, 0.0],
            [1.0, 2.0, 0.0, 0.0],
        ]);
    }

    #[test]
    fn low_variance_columns_are_removed() {
        let pruned = prune_low_variance(matrix().view(), 1.0);
        assert_eq!(pruned, array![
            [0.0, 0.0, 0.0, 10.0],
            [0.0, 0.0, 0.0, -10.0],
        ]);
    }

    #[test]
    fn empty_matrix_is_untouched() {
        let empty = ndarray::Array2::<f32>::zeros((0, 4));
        assert_eq!(prune_high_variance(empty.view(), 1.0).dim(), (0, 4));
    }
}
