//! Cubic spline interpolation with not-a-knot end conditions.

/// Interpolate `(x, y)` at the points `at`.
///
/// `x` must be strictly increasing. Two knots give linear interpolation and
/// three give the interpolating parabola; from four knots on the third
/// derivative is continuous across the second and penultimate knots.
/// Points outside `[x[0], x[n-1]]` are extrapolated with the end pieces.
pub fn spline_not_a_knot(x: &[f64], y: &[f64], at: &[f64]) -> Option<Vec<f64>> {
    let n = x.len();
    if n != y.len() || n < 2 || x.windows(2).any(|w| w[1] <= w[0]) {
        return None;
    }

    let m = match n {
        2 => vec![0.0, 0.0],
        3 => {
            // constant second derivative of the parabola
            let d0 = (y[1] - y[0]) / (x[1] - x[0]);
            let d1 = (y[2] - y[1]) / (x[2] - x[1]);
            let c = 2.0 * (d1 - d0) / (x[2] - x[0]);
            vec![c, c, c]
        }
        _ => second_derivatives(x, y),
    };

    Some(at.iter().map(|&t| evaluate(x, y, &m, t)).collect())
}

fn second_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let slope: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

    // Unknowns M[1..=n-2]; M[0] and M[n-1] are eliminated with the
    // not-a-knot conditions.
    let k = n - 2;
    let mut lower = vec![0.0; k];
    let mut diag = vec![0.0; k];
    let mut upper = vec![0.0; k];
    let mut rhs = vec![0.0; k];
    for r in 0..k {
        let i = r + 1;
        lower[r] = h[i - 1];
        diag[r] = 2.0 * (h[i - 1] + h[i]);
        upper[r] = h[i];
        rhs[r] = 6.0 * (slope[i] - slope[i - 1]);
    }

    let (h0, h1) = (h[0], h[1]);
    diag[0] += h0 * (h0 + h1) / h1;
    upper[0] -= h0 * h0 / h1;

    let (ha, hb) = (h[n - 3], h[n - 2]);
    diag[k - 1] += hb * (ha + hb) / ha;
    lower[k - 1] -= hb * hb / ha;

    let inner = thomas(&lower, &diag, &upper, &rhs);

    let mut m = vec![0.0; n];
    m[1..n - 1].copy_from_slice(&inner);
    m[0] = ((h0 + h1) * m[1] - h0 * m[2]) / h1;
    m[n - 1] = ((ha + hb) * m[n - 2] - hb * m[n - 3]) / ha;
    m
}

/// Tridiagonal solve; `lower[0]` and `upper[k-1]` are ignored.
fn thomas(lower: &[f64], diag: &[f64], upper: &[f64], rhs: &[f64]) -> Vec<f64> {
    let k = diag.len();
    let mut c = vec![0.0; k];
    let mut d = vec![0.0; k];
    c[0] = upper[0] / diag[0];
    d[0] = rhs[0] / diag[0];
    for i in 1..k {
        let denom = diag[i] - lower[i] * c[i - 1];
        c[i] = upper[i] / denom;
        d[i] = (rhs[i] - lower[i] * d[i - 1]) / denom;
    }
    let mut out = vec![0.0; k];
    out[k - 1] = d[k - 1];
    for i in (0..k - 1).rev() {
        out[i] = d[i] - c[i] * out[i + 1];
    }
    out
}

fn evaluate(x: &[f64], y: &[f64], m: &[f64], t: f64) -> f64 {
    let n = x.len();
    let j = match x.partition_point(|&xi| xi <= t) {
        0 => 0,
        p => (p - 1).min(n - 2),
    };
    let h = x[j + 1] - x[j];
    let a = x[j + 1] - t;
    let b = t - x[j];
    m[j] * a.powi(3) / (6.0 * h)
        + m[j + 1] * b.powi(3) / (6.0 * h)
        + (y[j] / h - m[j] * h / 6.0) * a
        + (y[j + 1] / h - m[j + 1] * h / 6.0) * b
}
