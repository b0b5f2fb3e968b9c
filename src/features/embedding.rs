//! Point densities and step distances in a two-dimensional delay embedding.

use statrs::distribution::{Continuous, Exp};

use crate::binning::{auto_edges, histogram};
use crate::core::{FeatureRecord, Lag};
use crate::correlation::{autocorr, AcfLags, AcfMethod};
use crate::error::Result;
use crate::utils::stats::{iqr, max, mean, median, min, std_dev};

const EMBED2_KEYS: [&str; 29] = [
    "updiag01",
    "downdiag01",
    "updiag05",
    "downdiag05",
    "ratdiag01",
    "ratdiag05",
    "parabup01",
    "parabdown01",
    "parabup05",
    "parabdown05",
    "parabup01_1",
    "parabdown01_1",
    "parabup05_1",
    "parabdown05_1",
    "parabup01_n1",
    "parabdown01_n1",
    "parabup05_n1",
    "parabdown05_n1",
    "ring1_01",
    "ring1_02",
    "ring1_05",
    "incircle_01",
    "incircle_02",
    "incircle_05",
    "incircle_1",
    "incircle_2",
    "incircle_3",
    "medianincircle",
    "stdincircle",
];

/// `CO_Embed2_Basic`: proportions of points `(y[t], y[t+τ])` lying near
/// simple curves in the delay plane.
///
/// Curves are the two diagonals (`updiag`, `downdiag` and their ratio
/// `ratdiag`), parabolas `±x²`, `x² ± 1` and `-(x² ± 1)` (`parabup*`,
/// `parabdown*`), the unit ring (`ring1_*`) and discs of radius² 0.1 to 3
/// (`incircle_*`), summarised by `medianincircle` and `stdincircle`.
/// The suffix gives the band half-width, e.g. `01` is 0.1. Intended for
/// z-scored input.
///
/// A lag the series cannot resolve gives a NaN record.
///
/// # Errors
/// `InvalidParameter` for a zero lag.
pub fn embed2_basic(y: &[f64], tau: Lag) -> Result<FeatureRecord> {
    let Some(tau) = tau.resolve_embedding(y, "embed2_basic")? else {
        return Ok(FeatureRecord::nan_filled(&EMBED2_KEYS));
    };
    let xt = &y[..y.len() - tau];
    let xtp = &y[tau..];
    let n = xt.len() as f64;

    let proportion = |f: &dyn Fn(f64, f64) -> bool| -> f64 {
        xt.iter().zip(xtp).filter(|&(&a, &b)| f(a, b)).count() as f64 / n
    };
    let band = |g: &dyn Fn(f64, f64) -> f64, width: f64| proportion(&|a, b| g(a, b).abs() < width);

    let mut out = FeatureRecord::with_capacity(30);
    for (suffix, w) in [("01", 0.1), ("05", 0.5)] {
        out.insert(format!("updiag{suffix}"), band(&|a, b| b - a, w));
        out.insert(format!("downdiag{suffix}"), band(&|a, b| b + a, w));
    }
    out.insert("ratdiag01", out["updiag01"] / out["downdiag01"]);
    out.insert("ratdiag05", out["updiag05"] / out["downdiag05"]);

    for (suffix, w) in [("01", 0.1), ("05", 0.5)] {
        out.insert(format!("parabup{suffix}"), band(&|a, b| b - a * a, w));
        out.insert(format!("parabdown{suffix}"), band(&|a, b| b + a * a, w));
    }
    for (suffix, w) in [("01", 0.1), ("05", 0.5)] {
        out.insert(format!("parabup{suffix}_1"), band(&|a, b| b - (a * a + 1.0), w));
        out.insert(format!("parabdown{suffix}_1"), band(&|a, b| b + (a * a - 1.0), w));
    }
    for (suffix, w) in [("01", 0.1), ("05", 0.5)] {
        out.insert(format!("parabup{suffix}_n1"), band(&|a, b| b - (a * a - 1.0), w));
        out.insert(format!("parabdown{suffix}_n1"), band(&|a, b| b + (a * a + 1.0), w));
    }

    for (suffix, w) in [("01", 0.1), ("02", 0.2), ("05", 0.5)] {
        out.insert(format!("ring1_{suffix}"), band(&|a, b| a * a + b * b - 1.0, w));
    }

    let radii = [("01", 0.1), ("02", 0.2), ("05", 0.5), ("1", 1.0), ("2", 2.0), ("3", 3.0)];
    let incircle: Vec<f64> = radii
        .iter()
        .map(|&(_, r2)| proportion(&|a, b| a * a + b * b < r2))
        .collect();
    for ((suffix, _), &p) in radii.iter().zip(&incircle) {
        out.insert(format!("incircle_{suffix}"), p);
    }
    out.insert("medianincircle", median(&incircle));
    out.insert("stdincircle", std_dev(&incircle));
    Ok(out)
}

const DIST_KEYS: [&str; 12] = [
    "d_ac1",
    "d_ac2",
    "d_ac3",
    "d_mean",
    "d_median",
    "d_std",
    "d_iqr",
    "d_max",
    "d_min",
    "d_cv",
    "d_expfit_nlogL",
    "d_expfit_meandiff",
];

/// `CO_Embed2_Dist`: distances between successive points of the
/// two-dimensional delay embedding `(y[t], y[t+τ])`.
///
/// The record holds the lag 1 to 3 autocorrelations of the distances,
/// their location and spread (`d_mean` to `d_cv`, Hazen IQR) and an
/// exponential fit with rate `1/mean`: its negative log-likelihood and the
/// mean absolute gap between the fitted density at the bin centres and the
/// bin probabilities of [`auto_edges`]. A symbolic lag above `N/10` is
/// capped there. Intended for z-scored input.
///
/// A lag the series cannot resolve, or fewer than two distances, gives a
/// NaN record.
///
/// # Errors
/// `InvalidParameter` for a zero lag.
pub fn embed2_dist(y: &[f64], tau: Lag) -> Result<FeatureRecord> {
    let n = y.len();
    let tau = match tau {
        Lag::Fixed(_) => tau,
        symbolic => match symbolic.resolve(y) {
            Some(t) if t > n / 10 => Lag::Fixed(n / 10),
            _ => symbolic,
        },
    };
    let Some(tau) = tau.resolve_embedding(y, "embed2_dist")? else {
        return Ok(FeatureRecord::nan_filled(&DIST_KEYS));
    };

    let m = n - tau;
    let d: Vec<f64> = (1..m)
        .map(|t| (y[t] - y[t - 1]).hypot(y[t + tau] - y[t + tau - 1]))
        .collect();
    if d.len() < 2 {
        log::warn!(
            "embed2_dist: lag {} leaves {} distances in a series of length {}",
            tau,
            d.len(),
            n
        );
        return Ok(FeatureRecord::nan_filled(&DIST_KEYS));
    }

    let ac = autocorr(&d, &AcfLags::List(vec![1, 2, 3]), AcfMethod::Fourier);
    let d_mean = mean(&d);
    let d_std = std_dev(&d);

    let mut out = FeatureRecord::with_capacity(DIST_KEYS.len());
    out.insert("d_ac1", ac[0]);
    out.insert("d_ac2", ac[1]);
    out.insert("d_ac3", ac[2]);
    out.insert("d_mean", d_mean);
    out.insert("d_median", median(&d));
    out.insert("d_std", d_std);
    out.insert("d_iqr", iqr(&d));
    out.insert("d_max", max(&d));
    out.insert("d_min", min(&d));
    out.insert("d_cv", d_mean / d_std);

    let (nlogl, meandiff) = match Exp::new(1.0 / d_mean) {
        Ok(fit) => {
            let nlogl = -d.iter().map(|&v| fit.ln_pdf(v)).sum::<f64>();
            let edges = auto_edges(&d);
            let total = d.len() as f64;
            let gaps: Vec<f64> = histogram(&d, &edges)
                .iter()
                .zip(edges.windows(2))
                .map(|(&c, e)| (c as f64 / total - fit.pdf(0.5 * (e[0] + e[1]))).abs())
                .collect();
            (nlogl, mean(&gaps))
        }
        Err(_) => {
            log::warn!("embed2_dist: successive embedded points do not move");
            (f64::NAN, f64::NAN)
        }
    };
    out.insert("d_expfit_nlogL", nlogl);
    out.insert("d_expfit_meandiff", meandiff);
    Ok(out)
}
