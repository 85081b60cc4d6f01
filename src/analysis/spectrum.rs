//! Short-time spectrum construction.
//!
//! Frame `i` covers samples `[i * hop, i * hop + window)` of the zero-padded
//! signal. Each frame is windowed, transformed with the radix-2 engine and
//! stored as column `i` of a `(bin, frame)` matrix.

use crate::core::fft::{nyquist_size, FrequencyDomain, Radix2Fft};
use crate::core::matrix::{ComplexSpectrumMatrix, Matrix, PowerSpectrumMatrix};
use crate::core::parallel::WorkerPool;
use crate::core::types::HpssParams;
use crate::core::window::{apply_window, generate_window, WindowType};
use crate::error::{HpssError, Result};

/// Complex spectrum together with its power spectrum.
#[derive(Debug, Clone)]
pub struct Spectra {
    pub complex: ComplexSpectrumMatrix,
    pub power: PowerSpectrumMatrix,
}

impl Spectra {
    pub fn num_bins(&self) -> usize {
        self.complex.rows()
    }

    pub fn num_frames(&self) -> usize {
        self.complex.cols()
    }
}

/// Returns a copy of `samples` with `padding` zeros on each side.
pub fn pad_signal(samples: &[f64], padding: usize) -> Vec<f64> {
    let mut padded = vec![0.0; samples.len() + 2 * padding];
    padded[padding..padding + samples.len()].copy_from_slice(samples);
    padded
}

/// Builds the sqrt-Hann windowed complex spectrum and its power spectrum.
///
/// # Errors
///
/// Returns [`HpssError::InputTooShort`] if `padded` holds less than one
/// window, and propagates transform errors from any worker.
pub fn build_spectra(padded: &[f64], params: &HpssParams, pool: &WorkerPool) -> Result<Spectra> {
    let complex = stft(padded, params, WindowType::SqrtHann, pool)?;
    let power = power_spectrum(&complex, pool)?;
    log::debug!(
        "built spectra: {} bins x {} frames",
        complex.rows(),
        complex.cols()
    );
    Ok(Spectra { complex, power })
}

/// Hann-windowed power spectrogram for analysis that is never resynthesized.
pub fn build_power_spectrogram(
    padded: &[f64],
    params: &HpssParams,
    pool: &WorkerPool,
) -> Result<PowerSpectrumMatrix> {
    let complex = stft(padded, params, WindowType::Hann, pool)?;
    power_spectrum(&complex, pool)
}

/// Complex STFT of `padded` with the given analysis window.
pub fn stft(
    padded: &[f64],
    params: &HpssParams,
    window_type: WindowType,
    pool: &WorkerPool,
) -> Result<ComplexSpectrumMatrix> {
    let window_size = params.window_size;
    let hop = params.effective_hop_size();
    let num_bins = nyquist_size(window_size);
    let num_frames = params.num_frames(padded.len());
    if num_frames == 0 {
        return Err(HpssError::InputTooShort {
            provided: padded.len(),
            minimum: window_size,
        });
    }

    let fft = Radix2Fft::new(window_size)?;
    let window = generate_window(window_type, window_size);

    // Each worker transforms its own frame range into a private block.
    let blocks = pool.map_ranges(num_frames, |frames| {
        let mut spectrum = FrequencyDomain::new(window_size);
        let mut frame = vec![0.0; window_size];
        let mut block = Vec::with_capacity(frames.len() * num_bins);
        for i in frames {
            let start = i * hop;
            frame.copy_from_slice(&padded[start..start + window_size]);
            apply_window(&mut frame, &window);
            fft.forward(&frame, &mut spectrum)?;
            block.extend_from_slice(spectrum.bins());
        }
        Ok(block)
    })?;

    let mut complex = Matrix::new(num_bins, num_frames);
    for (frames, block) in blocks {
        for (i, bins) in frames.zip(block.chunks_exact(num_bins)) {
            complex.set_column(i, bins);
        }
    }
    Ok(complex)
}

/// Elementwise squared magnitude, computed over disjoint row ranges.
pub fn power_spectrum(
    complex: &ComplexSpectrumMatrix,
    pool: &WorkerPool,
) -> Result<PowerSpectrumMatrix> {
    let (rows, cols) = complex.shape();
    let mut power = Matrix::new(rows, cols);
    if power.is_empty() {
        return Ok(power);
    }
    pool.for_each_chunk_mut(power.as_mut_slice(), cols, |bins, chunk| {
        for (r, out) in bins.zip(chunk.chunks_exact_mut(cols)) {
            for (p, x) in out.iter_mut().zip(complex.row(r)) {
                *p = x.norm_sqr();
            }
        }
        Ok(())
    })?;
    Ok(power)
}
