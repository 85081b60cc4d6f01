//! Beat spectrum: repetition strength of the power spectrum over time lags.

use crate::core::matrix::PowerSpectrumMatrix;
use crate::core::parallel::WorkerPool;
use crate::error::Result;

/// Lag-0 values at or below this are treated as silence and left unnormalized.
const NORMALIZE_FLOOR: f64 = f64::EPSILON;

/// Autocorrelation of one bin's power sequence at `lag`, averaged over the
/// overlapping frames.
fn lag_correlation(row: &[f64], lag: usize) -> f64 {
    let overlap = row.len() - lag;
    let sum: f64 = row[..overlap]
        .iter()
        .zip(&row[lag..])
        .map(|(a, b)| a * b)
        .sum();
    sum / overlap as f64
}

/// Frequency-averaged autocorrelation of `power` for every lag in
/// `[0, frames)`, divided by the lag-0 value when that is non-negligible.
///
/// Peaks at lag `k` indicate a pattern repeating every `k` frames.
pub fn beat_spectrum(power: &PowerSpectrumMatrix, pool: &WorkerPool) -> Result<Vec<f64>> {
    let (bins, frames) = power.shape();
    if bins == 0 || frames == 0 {
        return Ok(Vec::new());
    }

    let blocks = pool.map_ranges(frames, |lags| {
        Ok(lags
            .map(|lag| {
                let total: f64 = (0..bins)
                    .map(|f| lag_correlation(power.row(f), lag))
                    .sum();
                total / bins as f64
            })
            .collect::<Vec<f64>>())
    })?;
    let mut beat: Vec<f64> = blocks.into_iter().flat_map(|(_, b)| b).collect();

    let reference = beat[0];
    if reference.abs() > NORMALIZE_FLOOR {
        for b in &mut beat {
            *b /= reference;
        }
    }
    log::debug!("beat spectrum over {} lags", beat.len());
    Ok(beat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matrix::Matrix;

    #[test]
    fn test_periodic_pattern_peaks_at_period() {
        // Two bins pulsing every 4 frames.
        let frames = 32;
        let mut power: Matrix<f64> = Matrix::new(2, frames);
        for t in (0..frames).step_by(4) {
            power[(0, t)] = 1.0;
            power[(1, t)] = 2.0;
        }
        let beat = beat_spectrum(&power, &WorkerPool::new(3).unwrap()).unwrap();
        assert_eq!(beat.len(), frames);
        assert!((beat[0] - 1.0).abs() < 1e-12);
        assert!(beat[4] > 0.9, "lag 4 = {}", beat[4]);
        assert_eq!(beat[1], 0.0);
        assert_eq!(beat[2], 0.0);
    }

    #[test]
    fn test_silence_is_not_normalized() {
        let power: Matrix<f64> = Matrix::new(3, 5);
        let beat = beat_spectrum(&power, &WorkerPool::new(2).unwrap()).unwrap();
        assert_eq!(beat, vec![0.0; 5]);
    }

    #[test]
    fn test_constant_power_is_flat() {
        let power = Matrix::from_vec(1, 4, vec![2.0; 4]).unwrap();
        let beat = beat_spectrum(&power, &WorkerPool::new(1).unwrap()).unwrap();
        for b in beat {
            assert!((b - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empty_matrix() {
        let power: Matrix<f64> = Matrix::new(0, 0);
        assert!(beat_spectrum(&power, &WorkerPool::new(1).unwrap())
            .unwrap()
            .is_empty());
    }
}
