//! Non-overlapping buffers and sign changes.

use crate::utils::stats::mean;

/// Split `series` into consecutive non-overlapping buffers of `size`.
///
/// A trailing partial buffer is dropped. Returns no buffers when `size` is
/// zero or larger than the series.
pub fn make_buffer(series: &[f64], size: usize) -> Vec<&[f64]> {
    if size == 0 {
        return Vec::new();
    }
    series.chunks_exact(size).collect()
}

/// Mean of each non-overlapping buffer of `size`.
///
/// This is the coarse-graining step of multiscale analyses.
pub fn buffer_means(series: &[f64], size: usize) -> Vec<f64> {
    make_buffer(series, size).into_iter().map(mean).collect()
}

/// For each consecutive pair, whether the sign flips (`y[i]·y[i+1] < 0`).
pub fn sign_change(series: &[f64]) -> Vec<bool> {
    series.windows(2).map(|w| w[0] * w[1] < 0.0).collect()
}

/// Indices `i` such that the sign flips between `y[i]` and `y[i+1]`.
pub fn sign_change_indices(series: &[f64]) -> Vec<usize> {
    sign_change(series)
        .into_iter()
        .enumerate()
        .filter_map(|(i, flips)| flips.then_some(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn buffer_drops_partial_tail() {
        let y = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let buffers = make_buffer(&y, 3);
        assert_eq!(buffers.len(), 2);
        assert_eq!(buffers[1], &[4.0, 5.0, 6.0]);
        assert!(make_buffer(&y, 0).is_empty());
        assert!(make_buffer(&y, 8).is_empty());
    }

    #[test]
    fn buffer_means_coarse_grain() {
        let y = [1.0, 3.0, 5.0, 7.0, 9.0];
        let m = buffer_means(&y, 2);
        assert_eq!(m.len(), 2);
        assert_relative_eq!(m[0], 2.0);
        assert_relative_eq!(m[1], 6.0);
    }

    #[test]
    fn sign_changes() {
        let y = [1.0, -1.0, -2.0, 0.0, 3.0, -0.5];
        assert_eq!(sign_change(&y), vec![true, false, false, false, true]);
        assert_eq!(sign_change_indices(&y), vec![0, 4]);
    }
}
