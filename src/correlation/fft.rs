//! FFT helpers for autocorrelation and resampling.

use rustfft::{num_complex::Complex64, FftPlanner};

/// Autocorrelation at every lag `0..N` via the power spectrum.
///
/// The mean-removed series is zero padded to `2^(ceil(log2 N) + 1)` so the
/// circular correlation equals the linear one, transformed, squared in
/// magnitude, transformed back and normalised by the lag-0 value.
/// Returns `None` for an empty or constant series.
pub fn autocorr_fft(signal: &[f64]) -> Option<Vec<f64>> {
    let n = signal.len();
    if n == 0 || signal.iter().all(|&x| x == signal[0]) {
        return None;
    }

    let mean = signal.iter().sum::<f64>() / n as f64;
    let n_fft = 1usize << (ceil_log2(n) + 1);

    let mut buffer: Vec<Complex64> = signal
        .iter()
        .map(|&x| Complex64::new(x - mean, 0.0))
        .chain(std::iter::repeat(Complex64::new(0.0, 0.0)))
        .take(n_fft)
        .collect();

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(n_fft).process(&mut buffer);
    for c in buffer.iter_mut() {
        *c = Complex64::new(c.norm_sqr(), 0.0);
    }
    planner.plan_fft_inverse(n_fft).process(&mut buffer);

    let lag0 = buffer[0].re;
    if lag0 <= 0.0 || !lag0.is_finite() {
        return None;
    }
    let mut acf: Vec<f64> = buffer[..n].iter().map(|c| c.re / lag0).collect();
    acf[0] = 1.0;
    Some(acf)
}

/// Resample a real signal to `num` samples with the Fourier method.
///
/// The spectrum is truncated or zero padded symmetrically; for an even
/// retained length the Nyquist bin is split or folded so the output stays
/// real.
pub fn fft_resample(signal: &[f64], num: usize) -> Vec<f64> {
    let nx = signal.len();
    if nx == 0 || num == 0 {
        return Vec::new();
    }
    if num == nx {
        return signal.to_vec();
    }

    let mut planner = FftPlanner::new();
    let mut spectrum: Vec<Complex64> = signal.iter().map(|&x| Complex64::new(x, 0.0)).collect();
    planner.plan_fft_forward(nx).process(&mut spectrum);

    // one-sided spectrum of the output
    let kept = num.min(nx);
    let mut half = vec![Complex64::new(0.0, 0.0); num / 2 + 1];
    for k in 0..=kept / 2 {
        if k < half.len() {
            half[k] = spectrum[k];
        }
    }
    if kept % 2 == 0 {
        if num < nx {
            half[kept / 2] *= 2.0;
        } else {
            half[kept / 2] *= 0.5;
        }
    }

    // rebuild the Hermitian full spectrum
    let mut full = vec![Complex64::new(0.0, 0.0); num];
    for k in 0..half.len() {
        full[k] = half[k];
    }
    if num % 2 == 0 {
        full[num / 2] = Complex64::new(half[num / 2].re, 0.0);
    }
    for k in 1..num.div_ceil(2) {
        full[num - k] = half[k].conj();
    }

    planner.plan_fft_inverse(num).process(&mut full);
    full.iter().map(|c| c.re / nx as f64).collect()
}

fn ceil_log2(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}
