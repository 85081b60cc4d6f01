//! Repeating-pattern separation driven by the beat spectrum.
//!
//! The beat spectrum gives the repetition period in frames. Folding each bin's
//! magnitude over that period and taking the median per position models the
//! repeating background; the ratio of that model to the observed magnitude is
//! a soft mask for the repeating part.

use crate::analysis::mask::apply_mask;
use crate::analysis::median::median;
use crate::core::matrix::{ComplexSpectrumMatrix, MaskMatrix, Matrix, PowerSpectrumMatrix};
use crate::core::parallel::WorkerPool;
use crate::error::Result;

/// Magnitudes at or below this are treated as silence by the mask.
const MAGNITUDE_FLOOR: f64 = 1e-12;

/// Lags within this fraction of the strongest peak count as the period, so a
/// multiple of the true period never wins on rounding.
const PEAK_TOLERANCE: f64 = 0.95;

/// Repetition period in frames from a lag-0-normalised beat spectrum.
///
/// Only lags with at least three repetitions in the spectrogram are
/// considered. Returns `None` when no lag qualifies.
pub fn repeating_period(beat: &[f64]) -> Option<usize> {
    let max_lag = beat.len() / 3;
    if max_lag < 1 {
        return None;
    }
    let candidates = &beat[1..=max_lag];
    let peak = candidates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if peak <= 0.0 {
        return None;
    }
    candidates
        .iter()
        .position(|&b| b >= PEAK_TOLERANCE * peak)
        .map(|i| i + 1)
}

/// Repeating spectrum `W`: for each bin and frame, the median of the frames
/// one period apart, capped by the observed magnitude.
///
/// # Panics
///
/// Panics if `period` is zero.
pub fn repeating_spectrum(
    magnitude: &PowerSpectrumMatrix,
    period: usize,
    pool: &WorkerPool,
) -> Result<PowerSpectrumMatrix> {
    assert!(period > 0, "repetition period must be at least one frame");
    let (rows, cols) = magnitude.shape();
    let mut model: PowerSpectrumMatrix = Matrix::new(rows, cols);
    if model.is_empty() {
        return Ok(model);
    }

    pool.for_each_chunk_mut(model.as_mut_slice(), cols, |bins, chunk| {
        let mut segment = Vec::with_capacity(cols / period + 1);
        for (r, out) in bins.zip(chunk.chunks_exact_mut(cols)) {
            let row = magnitude.row(r);
            for phase in 0..period.min(cols) {
                segment.clear();
                segment.extend(row.iter().skip(phase).step_by(period));
                let typical = median(&segment);
                for t in (phase..cols).step_by(period) {
                    out[t] = typical.min(row[t]);
                }
            }
        }
        Ok(())
    })?;
    log::debug!("repeating spectrum {}x{} with period {}", rows, cols, period);
    Ok(model)
}

/// Soft mask `W / V`, clamped to `[0, 1]`. Silent bins get 0.
///
/// # Panics
///
/// Panics if the shapes differ.
pub fn repeating_mask(
    repeating: &PowerSpectrumMatrix,
    magnitude: &PowerSpectrumMatrix,
) -> MaskMatrix {
    let floored = magnitude.map(|v| v.max(MAGNITUDE_FLOOR));
    let ratio = repeating / &floored;
    let mut mask = ratio.map(|m| m.clamp(0.0, 1.0));
    for (m, &v) in mask.as_mut_slice().iter_mut().zip(magnitude.as_slice()) {
        if v <= MAGNITUDE_FLOOR {
            *m = 0.0;
        }
    }
    mask
}

/// Masks the complex spectrum `x` with the repeating mask built from
/// `repeating` and `magnitude`.
pub fn apply_repeating_mask(
    repeating: &PowerSpectrumMatrix,
    magnitude: &PowerSpectrumMatrix,
    x: &ComplexSpectrumMatrix,
    pool: &WorkerPool,
) -> Result<ComplexSpectrumMatrix> {
    apply_mask(x, &repeating_mask(repeating, magnitude), pool)
}
