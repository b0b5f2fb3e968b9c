//! Histogram counting on explicit edges.
//!
//! Bins are `[e_i, e_{i+1})` except the last, which also includes its right
//! edge. Values outside `[e_0, e_last]` and NaN are not counted.

/// Bin index of `v`, if it falls inside the edges.
pub fn bin_index(v: f64, edges: &[f64]) -> Option<usize> {
    let nbins = edges.len().checked_sub(1)?;
    if nbins == 0 || v.is_nan() || v < edges[0] || v > edges[nbins] {
        return None;
    }
    if v == edges[nbins] {
        return Some(nbins - 1);
    }
    Some(edges.partition_point(|&e| e <= v) - 1)
}

/// One-dimensional histogram counts.
pub fn histogram(x: &[f64], edges: &[f64]) -> Vec<usize> {
    let nbins = edges.len().saturating_sub(1);
    let mut counts = vec![0usize; nbins];
    for &v in x {
        if let Some(i) = bin_index(v, edges) {
            counts[i] += 1;
        }
    }
    counts
}

/// Joint histogram of paired samples, indexed `[row of x][column of y]`.
///
/// Pairs where either coordinate falls outside its edges are dropped.
pub fn histogram2d(x: &[f64], y: &[f64], x_edges: &[f64], y_edges: &[f64]) -> Vec<Vec<usize>> {
    let nx = x_edges.len().saturating_sub(1);
    let ny = y_edges.len().saturating_sub(1);
    let mut counts = vec![vec![0usize; ny]; nx];
    for (&a, &b) in x.iter().zip(y.iter()) {
        if let (Some(i), Some(j)) = (bin_index(a, x_edges), bin_index(b, y_edges)) {
            counts[i][j] += 1;
        }
    }
    counts
}

/// Normalise counts to probabilities; all zeros when nothing was counted.
pub fn to_probabilities(counts: &[usize]) -> Vec<f64> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    counts.iter().map(|&c| c as f64 / total as f64).collect()
}
