//! IIR band-pass filtering for the speech band
//!
//! Butterworth coefficients are designed through the analog prototype
//! (low-pass to band-pass, then bilinear transform) and applied in a single
//! causal pass with transposed direct form II state.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::error::{EnhanceError, Result};

/// Lower edge of the telephony speech band (Hz)
pub const SPEECH_LOWCUT_HZ: f64 = 300.0;
/// Upper edge of the telephony speech band (Hz)
pub const SPEECH_HIGHCUT_HZ: f64 = 3400.0;
/// Butterworth order used for the speech band
pub const SPEECH_FILTER_ORDER: usize = 5;

/// Feedforward (`b`) and feedback (`a`) coefficients of a rational transfer function
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCoefficients {
    b: Vec<f64>,
    a: Vec<f64>,
}

impl FilterCoefficients {
    pub fn new(b: Vec<f64>, a: Vec<f64>) -> Result<Self> {
        if b.is_empty() || a.is_empty() {
            return Err(EnhanceError::InvalidParameter(
                "filter coefficients must not be empty".to_string(),
            ));
        }
        if a[0] == 0.0 || !a[0].is_finite() {
            return Err(EnhanceError::InvalidParameter(format!(
                "leading feedback coefficient must be finite and non-zero, got {}",
                a[0]
            )));
        }
        Ok(Self { b, a })
    }

    pub fn b(&self) -> &[f64] {
        &self.b
    }

    pub fn a(&self) -> &[f64] {
        &self.a
    }

    /// Order of the feedback polynomial
    pub fn order(&self) -> usize {
        self.a.len() - 1
    }

    /// True when all coefficients are finite and every pole lies strictly
    /// inside the unit circle.
    ///
    /// Uses the step-down recursion: the denominator is reduced one degree
    /// at a time and each reflection coefficient must have magnitude below 1.
    pub fn is_stable(&self) -> bool {
        if self.b.iter().chain(self.a.iter()).any(|c| !c.is_finite()) {
            return false;
        }

        let a0 = self.a[0];
        let mut poly: Vec<f64> = self.a.iter().map(|c| c / a0).collect();

        while poly.len() > 1 {
            let n = poly.len() - 1;
            let k = poly[n];
            if k.abs() >= 1.0 {
                return false;
            }
            let denom = 1.0 - k * k;
            poly = (0..n).map(|i| (poly[i] - k * poly[n - i]) / denom).collect();
        }

        true
    }
}

/// Design a band-pass Butterworth filter
///
/// # Arguments
/// * `lowcut` - Lower cutoff in Hz
/// * `highcut` - Upper cutoff in Hz
/// * `sample_rate` - Sample rate in Hz
/// * `order` - Prototype order; the band-pass result has order `2 * order`
///
/// Cutoffs are normalised to the Nyquist frequency before design.
pub fn butter_bandpass(
    lowcut: f64,
    highcut: f64,
    sample_rate: f64,
    order: usize,
) -> Result<FilterCoefficients> {
    if order == 0 {
        return Err(EnhanceError::InvalidParameter(
            "filter order must be at least 1".to_string(),
        ));
    }
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(EnhanceError::InvalidParameter(format!(
            "sample rate must be positive, got {}",
            sample_rate
        )));
    }
    if !lowcut.is_finite() || !highcut.is_finite() || lowcut <= 0.0 || highcut <= 0.0 {
        return Err(EnhanceError::InvalidParameter(format!(
            "cutoffs must be positive (lowcut={}, highcut={})",
            lowcut, highcut
        )));
    }
    if lowcut >= highcut {
        return Err(EnhanceError::InvalidParameter(format!(
            "lowcut ({} Hz) must be below highcut ({} Hz)",
            lowcut, highcut
        )));
    }

    let nyquist = 0.5 * sample_rate;
    let low = lowcut / nyquist;
    let high = highcut / nyquist;
    if high >= 1.0 {
        return Err(EnhanceError::InvalidParameter(format!(
            "highcut ({} Hz) must be below Nyquist ({} Hz)",
            highcut, nyquist
        )));
    }

    // Pre-warp with fs = 2 so that Nyquist sits at 1.0
    let fs = 2.0;
    let fs2 = 2.0 * fs;
    let warped_low = fs2 * (PI * low / fs).tan();
    let warped_high = fs2 * (PI * high / fs).tan();
    let bandwidth = warped_high - warped_low;
    let center = (warped_low * warped_high).sqrt();

    // Analog prototype poles, left half of the unit circle
    let n = order as f64;
    let prototype = (0..order).map(|i| {
        let m = 2.0 * i as f64 - n + 1.0;
        -Complex64::from_polar(1.0, PI * m / (2.0 * n))
    });

    // Low-pass to band-pass: every prototype pole splits into a pair,
    // `order` zeros land on s = 0
    let center_sq = Complex64::new(center * center, 0.0);
    let mut analog_poles = Vec::with_capacity(2 * order);
    for pole in prototype {
        let scaled = pole * (bandwidth / 2.0);
        let root = (scaled * scaled - center_sq).sqrt();
        analog_poles.push(scaled + root);
        analog_poles.push(scaled - root);
    }

    // Bilinear transform
    let fs2_c = Complex64::new(fs2, 0.0);
    let digital_poles: Vec<Complex64> = analog_poles
        .iter()
        .map(|&p| (fs2_c + p) / (fs2_c - p))
        .collect();

    let pole_product = analog_poles
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, &p| acc * (fs2_c - p));
    let gain = bandwidth.powi(order as i32) * (Complex64::new(fs2.powi(order as i32), 0.0) / pole_product).re;

    // s = 0 maps to z = 1; the remaining zeros sit at z = -1
    let mut digital_zeros = vec![Complex64::new(1.0, 0.0); order];
    digital_zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(order));

    let b = poly(&digital_zeros).into_iter().map(|c| c.re * gain).collect();
    let a = poly(&digital_poles).into_iter().map(|c| c.re).collect();

    FilterCoefficients::new(b, a)
}

/// Coefficients of the speech-band filter for a given sample rate
pub fn speech_band(sample_rate: f64) -> Result<FilterCoefficients> {
    butter_bandpass(
        SPEECH_LOWCUT_HZ,
        SPEECH_HIGHCUT_HZ,
        sample_rate,
        SPEECH_FILTER_ORDER,
    )
}

/// Apply an IIR filter in a single causal pass
///
/// Zero initial state; output has the same length as the input.
pub fn lfilter(coeffs: &FilterCoefficients, samples: &[f32]) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let taps = coeffs.b.len().max(coeffs.a.len());
    let a0 = coeffs.a[0];
    let mut b = vec![0.0f64; taps];
    let mut a = vec![0.0f64; taps];
    for (dst, src) in b.iter_mut().zip(&coeffs.b) {
        *dst = src / a0;
    }
    for (dst, src) in a.iter_mut().zip(&coeffs.a) {
        *dst = src / a0;
    }

    let mut state = vec![0.0f64; taps - 1];
    let mut output = Vec::with_capacity(samples.len());

    for &sample in samples {
        let x = sample as f64;
        let y = b[0] * x + state.first().copied().unwrap_or(0.0);

        for i in 0..state.len() {
            let next = state.get(i + 1).copied().unwrap_or(0.0);
            state[i] = b[i + 1] * x - a[i + 1] * y + next;
        }

        output.push(y as f32);
    }

    output
}

/// Expand a set of roots into polynomial coefficients, highest power first
fn poly(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for &root in roots {
        let mut next = vec![Complex64::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * root;
        }
        coeffs = next;
    }
    coeffs
}
