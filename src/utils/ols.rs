//! Ordinary least squares utilities.
//!
//! Normal equations are solved with a Cholesky decomposition. Polynomial
//! fits map the abscissa onto `[-1, 1]` first so that cubic detrending of
//! long windows stays well conditioned.

/// Solve a least squares problem given the design matrix by columns.
///
/// Returns the coefficient vector, or `None` when the normal matrix is
/// singular or the dimensions disagree.
pub fn least_squares(columns: &[Vec<f64>], y: &[f64]) -> Option<Vec<f64>> {
    let p = columns.len();
    let n = y.len();
    if p == 0 || n < p || columns.iter().any(|c| c.len() != n) {
        return None;
    }

    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for i in 0..p {
        for j in 0..=i {
            let s: f64 = columns[i]
                .iter()
                .zip(columns[j].iter())
                .map(|(a, b)| a * b)
                .sum();
            xtx[i][j] = s;
            xtx[j][i] = s;
        }
        xty[i] = columns[i].iter().zip(y.iter()).map(|(a, b)| a * b).sum();
    }

    solve_symmetric(&xtx, &xty)
}

/// Fit a polynomial of the given degree.
///
/// Coefficients are returned in ascending order: `c[0] + c[1]·x + ...`.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Option<Vec<f64>> {
    if x.len() != y.len() || x.len() <= degree {
        return None;
    }
    let (center, scale) = normalisation(x);
    let t: Vec<f64> = x.iter().map(|&v| (v - center) / scale).collect();
    let scaled = least_squares(&vandermonde(&t, degree), y)?;
    Some(unscale_coefficients(&scaled, center, scale))
}

/// Residuals `y - p(x)` of a polynomial least squares fit.
pub fn polyfit_residuals(x: &[f64], y: &[f64], degree: usize) -> Option<Vec<f64>> {
    if x.len() != y.len() || x.len() <= degree {
        return None;
    }
    let (center, scale) = normalisation(x);
    let t: Vec<f64> = x.iter().map(|&v| (v - center) / scale).collect();
    let coeffs = least_squares(&vandermonde(&t, degree), y)?;
    Some(
        t.iter()
            .zip(y.iter())
            .map(|(&ti, &yi)| yi - polyval(&coeffs, ti))
            .collect(),
    )
}

/// Evaluate an ascending-order polynomial with Horner's rule.
pub fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Straight-line fit returning `(intercept, slope)`.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let c = polyfit(x, y, 1)?;
    Some((c[0], c[1]))
}

/// Residuals of a straight-line fit.
pub fn linear_residuals(x: &[f64], y: &[f64]) -> Option<Vec<f64>> {
    polyfit_residuals(x, y, 1)
}

fn vandermonde(t: &[f64], degree: usize) -> Vec<Vec<f64>> {
    (0..=degree)
        .map(|k| t.iter().map(|&v| v.powi(k as i32)).collect())
        .collect()
}

fn normalisation(x: &[f64]) -> (f64, f64) {
    let lo = x.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let center = 0.5 * (lo + hi);
    let half = 0.5 * (hi - lo);
    (center, if half > 0.0 { half } else { 1.0 })
}

// p(x) = sum_k a_k ((x - c) / s)^k expanded into powers of x.
fn unscale_coefficients(a: &[f64], center: f64, scale: f64) -> Vec<f64> {
    let mut out = vec![0.0; a.len()];
    for (k, &ak) in a.iter().enumerate() {
        let factor = ak / scale.powi(k as i32);
        let mut binom = 1.0;
        for j in 0..=k {
            out[j] += factor * binom * (-center).powi((k - j) as i32);
            binom = binom * (k - j) as f64 / (j + 1) as f64;
        }
    }
    out
}

/// Solve symmetric positive definite system using Cholesky decomposition.
///
/// Solves A @ x = b where A is symmetric positive definite.
pub(crate) fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    // Cholesky decomposition A = L @ L'
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // Forward substitution: L @ y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // Backward substitution: L' @ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linear_fit_exact_line() {
        // y = 2 + 3*x
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![5.0, 8.0, 11.0, 14.0, 17.0];

        let (intercept, slope) = linear_fit(&x, &y).unwrap();
        assert_relative_eq!(intercept, 2.0, epsilon = 1e-9);
        assert_relative_eq!(slope, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn polyfit_recovers_cubic() {
        let x: Vec<f64> = (0..40).map(|i| i as f64 * 10.0).collect();
        let y: Vec<f64> = x
            .iter()
            .map(|&v| 1.0 - 0.5 * v + 0.01 * v * v + 2e-5 * v * v * v)
            .collect();

        let c = polyfit(&x, &y, 3).unwrap();
        assert_relative_eq!(c[0], 1.0, epsilon = 1e-5);
        assert_relative_eq!(c[1], -0.5, epsilon = 1e-7);
        assert_relative_eq!(c[2], 0.01, epsilon = 1e-9);
        assert_relative_eq!(c[3], 2e-5, epsilon = 1e-11);

        let res = polyfit_residuals(&x, &y, 3).unwrap();
        assert!(res.iter().all(|r| r.abs() < 1e-6));
    }

    #[test]
    fn residuals_sum_to_zero_with_intercept() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![5.1, 7.9, 11.2, 13.8, 17.0];
        let residuals = linear_residuals(&x, &y).unwrap();
        assert_eq!(residuals.len(), 5);
        let sum: f64 = residuals.iter().sum();
        assert!(sum.abs() < 1e-9);
    }

    #[test]
    fn least_squares_multiple_regressors() {
        // y = 1 + 2*x1 + 3*x2
        let x1 = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let x2 = vec![0.5, 2.5, 1.0, 3.0, 1.5, 3.5, 2.0, 4.0];
        let y: Vec<f64> = x1
            .iter()
            .zip(x2.iter())
            .map(|(a, b)| 1.0 + 2.0 * a + 3.0 * b)
            .collect();

        let beta = least_squares(&[vec![1.0; 8], x1, x2], &y).unwrap();
        assert_relative_eq!(beta[0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(beta[1], 2.0, epsilon = 1e-8);
        assert_relative_eq!(beta[2], 3.0, epsilon = 1e-8);
    }

    #[test]
    fn degenerate_inputs_return_none() {
        assert!(polyfit(&[1.0, 2.0], &[1.0, 2.0], 2).is_none());
        assert!(polyfit(&[1.0, 2.0, 3.0], &[1.0, 2.0], 1).is_none());
        // collinear design
        assert!(least_squares(&[vec![1.0; 4], vec![2.0; 4]], &[1.0, 2.0, 3.0, 4.0]).is_none());
        assert_relative_eq!(polyval(&[1.0, 2.0, 3.0], 2.0), 17.0);
    }
}
