//! Derivative-free minimisation and small nonlinear curve fits.

use std::cmp::Ordering;

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The optimal point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the optimal point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the algorithm converged.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    pub max_iter: usize,
    /// Convergence tolerance on both the value spread and simplex size.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrinkage coefficient.
    pub sigma: f64,
    /// Relative size of the initial simplex.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            tolerance: 1e-10,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.1,
        }
    }
}

/// Minimise `objective` with the Nelder-Mead simplex method.
///
/// # Example
/// ```
/// use anofox_hctsa::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2),
///     &[0.0, 0.0],
///     NelderMeadConfig::default(),
/// );
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 1e-4);
/// ```
pub fn nelder_mead<F>(objective: F, initial: &[f64], config: NelderMeadConfig) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    // Non-finite objective values are treated as +inf so the simplex moves away.
    let eval = |p: &[f64]| {
        let v = objective(p);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    simplex.push((initial.to_vec(), eval(initial)));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        vertex[i] += if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        let v = eval(&vertex);
        simplex.push((vertex, v));
    }

    let mut iterations = 0;
    let mut converged = false;
    while iterations < config.max_iter {
        iterations += 1;
        simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        let best = simplex[0].1;
        let worst = simplex[n].1;
        let size = simplex
            .iter()
            .skip(1)
            .flat_map(|(p, _)| p.iter().zip(simplex[0].0.iter()).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max);
        if (worst - best).abs() <= config.tolerance && size <= config.tolerance.sqrt() {
            converged = true;
            break;
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|(p, _)| p[j]).sum::<f64>() / n as f64)
            .collect();
        let along = |t: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(simplex[n].0.iter())
                .map(|(c, w)| c + t * (c - w))
                .collect()
        };

        let reflected = along(config.alpha);
        let f_reflected = eval(&reflected);

        if f_reflected < best {
            let expanded = along(config.alpha * config.gamma);
            let f_expanded = eval(&expanded);
            simplex[n] = if f_expanded < f_reflected {
                (expanded, f_expanded)
            } else {
                (reflected, f_reflected)
            };
            continue;
        }
        if f_reflected < simplex[n - 1].1 {
            simplex[n] = (reflected, f_reflected);
            continue;
        }

        let (contracted, f_contracted) = if f_reflected < worst {
            let p = along(config.alpha * config.rho);
            let v = eval(&p);
            (p, v)
        } else {
            let p = along(-config.rho);
            let v = eval(&p);
            (p, v)
        };
        if f_contracted < f_reflected.min(worst) {
            simplex[n] = (contracted, f_contracted);
            continue;
        }

        let anchor = simplex[0].0.clone();
        for vertex in simplex.iter_mut().skip(1) {
            for (x, a) in vertex.0.iter_mut().zip(anchor.iter()) {
                *x = a + config.sigma * (*x - a);
            }
            vertex.1 = eval(&vertex.0);
        }
    }

    simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    let (optimal_point, optimal_value) = simplex.swap_remove(0);
    NelderMeadResult {
        optimal_point,
        optimal_value,
        iterations,
        converged,
    }
}

/// Parameters and goodness of fit of a least-squares curve fit.
#[derive(Debug, Clone)]
pub struct CurveFit {
    pub params: Vec<f64>,
    /// Residuals `y - model(x)`.
    pub residuals: Vec<f64>,
    /// Coefficient of determination.
    pub r_squared: f64,
    pub converged: bool,
}

impl CurveFit {
    /// Root mean squared residual.
    pub fn rmse(&self) -> f64 {
        let n = self.residuals.len() as f64;
        (self.residuals.iter().map(|r| r * r).sum::<f64>() / n).sqrt()
    }
}

/// Fit `model(x, params)` to `(x, y)` by least squares from `initial`.
pub fn curve_fit<M>(model: M, x: &[f64], y: &[f64], initial: &[f64]) -> Option<CurveFit>
where
    M: Fn(f64, &[f64]) -> f64,
{
    if x.len() != y.len() || x.len() < initial.len() {
        return None;
    }
    let sse = |p: &[f64]| -> f64 {
        x.iter()
            .zip(y.iter())
            .map(|(&xi, &yi)| (yi - model(xi, p)).powi(2))
            .sum()
    };
    let result = nelder_mead(sse, initial, NelderMeadConfig::default());
    if !result.optimal_value.is_finite() {
        return None;
    }

    let params = result.optimal_point;
    let residuals: Vec<f64> = x
        .iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| yi - model(xi, &params))
        .collect();
    let my = y.iter().sum::<f64>() / y.len() as f64;
    let sst: f64 = y.iter().map(|v| (v - my).powi(2)).sum();
    let ssr: f64 = residuals.iter().map(|r| r * r).sum();
    let r_squared = if sst > 0.0 { 1.0 - ssr / sst } else { f64::NAN };

    Some(CurveFit {
        params,
        residuals,
        r_squared,
        converged: result.converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn nelder_mead_quadratic() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            NelderMeadConfig::default(),
        );
        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(result.optimal_point[1], 3.0, epsilon = 1e-4);
    }

    #[test]
    fn nelder_mead_rosenbrock() {
        let rosenbrock = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let config = NelderMeadConfig {
            max_iter: 10_000,
            ..Default::default()
        };
        let result = nelder_mead(rosenbrock, &[-1.0, 1.0], config);
        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_empty_input() {
        let result = nelder_mead(|_| 0.0, &[], NelderMeadConfig::default());
        assert!(!result.converged);
        assert!(result.optimal_value.is_nan());
    }

    #[test]
    fn curve_fit_exponential_decay() {
        let x: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|t| 2.0 * (-0.2 * t).exp() + 0.5).collect();
        let fit = curve_fit(
            |t, p| p[0] * (p[1] * t).exp() + p[2],
            &x,
            &y,
            &[1.0, -0.5, 0.0],
        )
        .unwrap();
        assert_relative_eq!(fit.params[0], 2.0, epsilon = 5e-3);
        assert_relative_eq!(fit.params[1], -0.2, epsilon = 5e-3);
        assert_relative_eq!(fit.params[2], 0.5, epsilon = 5e-3);
        assert!(fit.r_squared > 0.9999);
        assert!(fit.rmse() < 1e-3);
    }
}
