//! Median filtering of the power spectrum along time and frequency.
//!
//! Sustained (harmonic) energy is smooth over time at a fixed frequency, so a
//! median across frames estimates it. Transient (percussive) energy is
//! broadband within a frame, so a median across bins estimates it.

use crate::core::matrix::{Matrix, PowerSpectrumMatrix};
use crate::core::parallel::WorkerPool;
use crate::core::types::{EdgeMode, HpssParams};
use crate::error::Result;

/// Median of `values`. Even-length inputs average the two middle values.
///
/// Returns 0.0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    let mut scratch = values.to_vec();
    median_in_place(&mut scratch)
}

/// Median that reorders `values` instead of allocating.
fn median_in_place(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let mid = n / 2;
    let (lower, upper, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    let upper = *upper;
    if n % 2 == 1 {
        upper
    } else {
        let lower_max = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (lower_max + upper) / 2.0
    }
}

/// Median-filters one line of `input` into `output` with an odd window of
/// `len` samples centred on each position.
///
/// With [`EdgeMode::Interior`], positions closer than `(len - 1) / 2` to
/// either end are not written.
fn filter_line(
    input: &[f64],
    output: &mut [f64],
    len: usize,
    edge: EdgeMode,
    scratch: &mut Vec<f64>,
) {
    let n = input.len();
    let offset = (len - 1) / 2;

    for (j, out) in output.iter_mut().enumerate() {
        let interior = j >= offset && j + offset < n;
        if !interior && edge == EdgeMode::Interior {
            continue;
        }
        let start = j.saturating_sub(offset);
        let end = (j + offset + 1).min(n);
        scratch.clear();
        scratch.extend_from_slice(&input[start..end]);
        *out = median_in_place(scratch);
    }
}

/// Filters every row of `input` independently, rows split across workers.
fn filter_rows(
    input: &Matrix<f64>,
    len: usize,
    edge: EdgeMode,
    pool: &WorkerPool,
) -> Result<Matrix<f64>> {
    let (rows, cols) = input.shape();
    let mut output = Matrix::new(rows, cols);
    if output.is_empty() {
        return Ok(output);
    }
    pool.for_each_chunk_mut(output.as_mut_slice(), cols, |row_range, chunk| {
        let mut scratch = Vec::with_capacity(len);
        for (r, out_row) in row_range.zip(chunk.chunks_exact_mut(cols)) {
            filter_line(input.row(r), out_row, len, edge, &mut scratch);
        }
        Ok(())
    })?;
    Ok(output)
}

/// Harmonic estimate `yH`: median of `len` frames at each fixed bin.
pub fn median_filter_time(
    power: &PowerSpectrumMatrix,
    len: usize,
    edge: EdgeMode,
    pool: &WorkerPool,
) -> Result<PowerSpectrumMatrix> {
    filter_rows(power, len, edge, pool)
}

/// Percussive estimate `yP`: median of `len` bins within each fixed frame.
pub fn median_filter_frequency(
    power: &PowerSpectrumMatrix,
    len: usize,
    edge: EdgeMode,
    pool: &WorkerPool,
) -> Result<PowerSpectrumMatrix> {
    // Frames become contiguous rows after transposing.
    let by_frame = power.transpose();
    Ok(filter_rows(&by_frame, len, edge, pool)?.transpose())
}

/// Runs both median passes concurrently and returns `(yH, yP)`.
pub fn median_estimates(
    power: &PowerSpectrumMatrix,
    params: &HpssParams,
    pool: &WorkerPool,
) -> Result<(PowerSpectrumMatrix, PowerSpectrumMatrix)> {
    log::debug!(
        "median filtering {}x{} power spectrum (Lh={}, Lp={}, {:?})",
        power.rows(),
        power.cols(),
        params.harmonic_filter_len,
        params.percussive_filter_len,
        params.edge_mode
    );
    let (harmonic, percussive) = pool.join(
        || median_filter_time(power, params.harmonic_filter_len, params.edge_mode, pool),
        || median_filter_frequency(power, params.percussive_filter_len, params.edge_mode, pool),
    );
    Ok((harmonic?, percussive?))
}
