//! Second-order Butterworth high-pass pre-filter.
//!
//! Removes rumble and DC offset below a cutoff before analysis. Coefficients
//! come from the bilinear transform with `K = tan(π fc / fs)`.

use crate::error::{HpssError, Result};
use std::f64::consts::{PI, SQRT_2};

/// A single biquad (second-order IIR) section in Direct Form I.
///
///   y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
///
/// Coefficients are pre-normalized by a0.
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    /// Creates a 2nd-order Butterworth high-pass at `cutoff` Hz.
    ///
    /// # Errors
    ///
    /// Returns [`HpssError::InvalidParams`] unless `0 < cutoff < sample_rate / 2`.
    pub fn butterworth_highpass(cutoff: f64, sample_rate: u32) -> Result<Self> {
        let nyquist = sample_rate as f64 / 2.0;
        if !cutoff.is_finite() || cutoff <= 0.0 || cutoff >= nyquist {
            return Err(HpssError::InvalidParams(format!(
                "high-pass cutoff {} Hz must lie in (0, {}) Hz",
                cutoff, nyquist
            )));
        }
        let k = (PI * cutoff / sample_rate as f64).tan();
        let d = 1.0 + SQRT_2 * k + k * k;

        Ok(Self {
            b0: 1.0 / d,
            b1: -2.0 / d,
            b2: 1.0 / d,
            a1: 2.0 * (k * k - 1.0) / d,
            a2: (1.0 - SQRT_2 * k + k * k) / d,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        })
    }

    /// Processes a single sample through the filter.
    #[inline]
    pub fn process_sample(&mut self, input: f64) -> f64 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }

    /// Resets all delay line state to zero.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// Returns `input` high-pass filtered at `cutoff` Hz.
pub fn highpass(input: &[f64], cutoff: f64, sample_rate: u32) -> Result<Vec<f64>> {
    let mut filter = Biquad::butterworth_highpass(cutoff, sample_rate)?;
    Ok(input.iter().map(|&x| filter.process_sample(x)).collect())
}
