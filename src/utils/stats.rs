//! Statistical utility functions.

use std::cmp::Ordering;

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate the variance of a slice (sample variance with n-1 denominator).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Calculate the standard deviation of a slice (n-1 denominator).
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Population variance (n denominator).
pub fn variance_pop(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation (n denominator).
pub fn std_pop(values: &[f64]) -> f64 {
    variance_pop(values).sqrt()
}

/// Calculate the median of a slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let sorted = sorted(values);
    let n = sorted.len();
    if n.is_multiple_of(2) {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Return an ascending copy of the slice (NaNs compare equal).
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Quantile using the Hazen plotting position.
///
/// The 1-based position is `n·p + 0.5`, clamped to `[1, n]`, and values are
/// linearly interpolated between neighbouring order statistics. This differs
/// from the "linear" default of most numeric libraries.
pub fn quantile_hazen(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    hazen_sorted(&sorted(values), p)
}

/// Hazen quantiles at several probabilities, sorting once.
///
/// Probabilities outside `[0, 1]` (or NaN) give NaN.
pub fn quantiles_hazen(values: &[f64], probs: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return vec![f64::NAN; probs.len()];
    }
    let sorted = sorted(values);
    probs.iter().map(|&p| hazen_sorted(&sorted, p)).collect()
}

fn hazen_sorted(sorted: &[f64], p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    let n = sorted.len();
    let h = (n as f64 * p + 0.5).clamp(1.0, n as f64);
    let lo = h.floor();
    let frac = h - lo;
    let i = lo as usize - 1;
    if frac == 0.0 || i + 1 >= n {
        sorted[i]
    } else {
        sorted[i] + frac * (sorted[i + 1] - sorted[i])
    }
}

/// Interquartile range with Hazen quantiles.
pub fn iqr(values: &[f64]) -> f64 {
    let q = quantiles_hazen(values, &[0.25, 0.75]);
    q[1] - q[0]
}

/// Minimum value; NaN entries are skipped.
pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Pearson correlation coefficient of two equal-length slices.
///
/// Returns NaN when either input has zero variance or the lengths differ.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }
    let mx = mean(x);
    let my = mean(y);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y.iter()) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    sxy / (sxx * syy).sqrt()
}

/// Sample skewness (biased, moment based).
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return f64::NAN;
    }
    let m = mean(values);
    let m2 = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n as f64;
    if m2 == 0.0 {
        return f64::NAN;
    }
    let m3 = values.iter().map(|x| (x - m).powi(3)).sum::<f64>() / n as f64;
    m3 / m2.powf(1.5)
}

/// Excess kurtosis (biased, moment based).
pub fn kurtosis(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 4 {
        return f64::NAN;
    }
    let m = mean(values);
    let m2 = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n as f64;
    if m2 == 0.0 {
        return f64::NAN;
    }
    let m4 = values.iter().map(|x| (x - m).powi(4)).sum::<f64>() / n as f64;
    m4 / (m2 * m2) - 3.0
}

/// Evenly spaced values over `[start, stop]`, endpoints included.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            let mut out: Vec<f64> = (0..num).map(|i| start + step * i as f64).collect();
            out[num - 1] = stop;
            out
        }
    }
}

/// First difference.
pub fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Cumulative sum.
pub fn cumsum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, &x| {
            *acc += x;
            Some(*acc)
        })
        .collect()
}

/// Indices that would sort the slice; ties keep their original order.
pub fn argsort(values: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
    idx
}

/// Most frequent value; ties resolve to the smallest value.
///
/// Returns `(value, count)`.
pub fn mode(values: &[f64]) -> (f64, usize) {
    let sorted = sorted(values);
    let mut best = (f64::NAN, 0);
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i + 1;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        if j - i > best.1 {
            best = (sorted[i], j - i);
        }
        i = j;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_calculates_correctly() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert_relative_eq!(mean(&[10.0]), 10.0, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn variance_calculates_correctly() {
        // Sample variance of [1, 2, 3, 4, 5] = 2.5
        assert_relative_eq!(variance(&[1.0, 2.0, 3.0, 4.0, 5.0]), 2.5, epsilon = 1e-10);
        assert_relative_eq!(variance_pop(&[1.0, 2.0, 3.0, 4.0, 5.0]), 2.0, epsilon = 1e-10);
        assert!(variance(&[1.0]).is_nan());
        assert!(variance(&[]).is_nan());
    }

    #[test]
    fn median_calculates_correctly() {
        assert_relative_eq!(median(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert_relative_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5, epsilon = 1e-10);
        assert_relative_eq!(median(&[5.0, 1.0, 3.0, 2.0, 4.0]), 3.0, epsilon = 1e-10);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn hazen_probabilities_outside_unit_interval_are_nan() {
        let y = [3.0, 1.0, 2.0];
        let q = quantiles_hazen(&y, &[-0.1, f64::NAN, 0.5, 1.5]);
        assert!(q[0].is_nan());
        assert!(q[1].is_nan());
        assert_relative_eq!(q[2], 2.0);
        assert!(q[3].is_nan());
        assert!(quantile_hazen(&y, f64::NAN).is_nan());
    }

    #[test]
    fn hazen_quantiles_interpolate_half_positions() {
        let y: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        // position 10 * 0.5 + 0.5 = 5.5 -> between 5 and 6
        assert_relative_eq!(quantile_hazen(&y, 0.5), 5.5, epsilon = 1e-12);
        // position 10 * 0.25 + 0.5 = 3.0 -> exactly the third value
        assert_relative_eq!(quantile_hazen(&y, 0.25), 3.0, epsilon = 1e-12);
        // clamped at the extremes
        assert_relative_eq!(quantile_hazen(&y, 0.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(quantile_hazen(&y, 1.0), 10.0, epsilon = 1e-12);
        // position 10 * 0.9 + 0.5 = 9.5
        assert_relative_eq!(quantile_hazen(&y, 0.9), 9.5, epsilon = 1e-12);
        assert_relative_eq!(iqr(&y), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn pearson_of_perfect_line() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert_relative_eq!(pearson(&x, &y), 1.0, epsilon = 1e-12);
        assert!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]).is_nan());
    }

    #[test]
    fn kurtosis_of_two_point_distribution() {
        // symmetric two-point: m4 / m2² = 1
        assert_relative_eq!(kurtosis(&[-1.0, 1.0, -1.0, 1.0]), -2.0, epsilon = 1e-12);
        assert!(kurtosis(&[1.0, 1.0, 1.0, 1.0]).is_nan());
    }

    #[test]
    fn linspace_includes_endpoints() {
        let v = linspace(0.0, 1.0, 5);
        assert_eq!(v.len(), 5);
        assert_relative_eq!(v[1], 0.25);
        assert_eq!(v[4], 1.0);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn argsort_is_stable() {
        let idx = argsort(&[3.0, 1.0, 3.0, 0.0]);
        assert_eq!(idx, vec![3, 1, 0, 2]);
    }

    #[test]
    fn mode_prefers_smallest_on_ties() {
        assert_eq!(mode(&[2.0, 1.0, 2.0, 1.0, 3.0]), (1.0, 2));
        assert_eq!(mode(&[4.0, 4.0, 1.0]), (4.0, 2));
    }

    #[test]
    fn cumsum_and_diff() {
        assert_eq!(cumsum(&[1.0, 2.0, 3.0]), vec![1.0, 3.0, 6.0]);
        assert_eq!(diff(&[1.0, 4.0, 9.0]), vec![3.0, 5.0]);
    }
}
