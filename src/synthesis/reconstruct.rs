//! Overlap-add resynthesis of a complex short-time spectrum.
//!
//! Consecutive frames overlap by `window - hop` samples, so workers never
//! share an output buffer: each accumulates its frame range into a private
//! buffer, and the buffers are summed in range order after the join.

use crate::core::fft::Radix2Fft;
use crate::core::matrix::ComplexSpectrumMatrix;
use crate::core::parallel::WorkerPool;
use crate::core::types::HpssParams;
use crate::core::window::{cola_gain, generate_window, WindowType};
use crate::error::{HpssError, Result};
use std::ops::Range;

/// Private accumulation for one worker's frame range.
struct PartialSignal {
    /// Sample offset of `samples[0]` in the full output.
    offset: usize,
    samples: Vec<f64>,
}

/// Number of output samples covered by `frames` frames.
#[inline]
fn covered_len(frames: usize, window_size: usize, hop: usize) -> usize {
    if frames == 0 {
        0
    } else {
        (frames - 1) * hop + window_size
    }
}

fn overlap_add_range(
    spectrum: &ComplexSpectrumMatrix,
    frames: Range<usize>,
    fft: &Radix2Fft,
    window: &[f64],
    hop: usize,
    gain: f64,
) -> Result<PartialSignal> {
    let window_size = window.len();
    let offset = frames.start * hop;
    let mut samples = vec![0.0; covered_len(frames.len(), window_size, hop)];
    let mut folded = Vec::with_capacity(spectrum.rows());
    let mut frame = Vec::with_capacity(window_size);

    for i in frames {
        folded.clear();
        folded.extend((0..spectrum.rows()).map(|bin| spectrum[(bin, i)]));
        fft.inverse_folded(&folded, &mut frame)?;

        let start = i * hop - offset;
        for ((out, x), &w) in samples[start..start + window_size]
            .iter_mut()
            .zip(&frame)
            .zip(window)
        {
            *out += x.re * w / gain;
        }
    }
    Ok(PartialSignal { offset, samples })
}

/// Overlap-add of every frame, before padding removal.
///
/// The result spans `(frames - 1) * hop + window` samples.
pub fn overlap_add(
    spectrum: &ComplexSpectrumMatrix,
    params: &HpssParams,
    pool: &WorkerPool,
) -> Result<Vec<f64>> {
    let window_size = params.window_size;
    let hop = params.effective_hop_size();
    if spectrum.rows() != params.num_bins() {
        return Err(HpssError::InvalidParams(format!(
            "spectrum has {} bins, window of {} needs {}",
            spectrum.rows(),
            window_size,
            params.num_bins()
        )));
    }

    let num_frames = spectrum.cols();
    let fft = Radix2Fft::new(window_size)?;
    let window = generate_window(WindowType::SqrtHann, window_size);
    let gain = cola_gain(window_size, hop);

    let partials = pool.map_ranges(num_frames, |frames| {
        overlap_add_range(spectrum, frames, &fft, &window, hop, gain)
    })?;

    // Merge on the calling thread in range order.
    let mut output = vec![0.0; covered_len(num_frames, window_size, hop)];
    for (_, partial) in partials {
        let end = partial.offset + partial.samples.len();
        for (out, s) in output[partial.offset..end].iter_mut().zip(&partial.samples) {
            *out += s;
        }
    }
    Ok(output)
}

/// Resynthesizes `signal_len` samples from `spectrum`, dropping the leading
/// analysis padding.
///
/// The overlap-add buffer starts `padding` samples before the signal, so the
/// signal is the `signal_len` samples after that. Samples past the last frame
/// (possible only with less than half a window of padding) are zero.
///
/// # Errors
///
/// Returns [`HpssError::InvalidParams`] if the bin count does not match the
/// window size, and propagates transform errors from any worker.
pub fn reconstruct(
    spectrum: &ComplexSpectrumMatrix,
    params: &HpssParams,
    signal_len: usize,
    pool: &WorkerPool,
) -> Result<Vec<f64>> {
    let mut output = overlap_add(spectrum, params, pool)?;
    let padding = params.effective_padding().min(output.len());
    output.drain(..padding);
    output.resize(signal_len, 0.0);
    log::debug!(
        "reconstructed {} samples from {} frames",
        output.len(),
        spectrum.cols()
    );
    Ok(output)
}
