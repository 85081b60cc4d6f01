#![allow(dead_code)]

use std::f64::consts::PI;

pub fn gen_sine(freq_hz: f64, sr: u32, n: usize, amp: f64) -> Vec<f64> {
    (0..n)
        .map(|i| amp * (2.0 * PI * freq_hz * i as f64 / sr as f64).sin())
        .collect()
}

pub fn gen_impulse_train(period: usize, n: usize, amp: f64) -> Vec<f64> {
    let mut out = vec![0.0; n];
    if period == 0 {
        return out;
    }
    for i in (0..n).step_by(period) {
        out[i] = amp;
    }
    out
}

/// Sustained tone with clicks laid over it at `click_positions`.
pub fn gen_click_pad(sr: u32, n: usize, click_positions: &[usize]) -> Vec<f64> {
    let mut out = gen_sine(220.0, sr, n, 0.2);
    for &p in click_positions {
        if p < n {
            out[p] += 1.0;
        }
        if p + 1 < n {
            out[p + 1] -= 0.7;
        }
    }
    out
}

/// Deterministic pseudo-random samples in `[-1, 1)`.
pub fn gen_noise(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
        })
        .collect()
}

pub fn rms(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|s| s * s).sum::<f64>() / signal.len() as f64).sqrt()
}

pub fn windowed_rms(signal: &[f64], start: usize, len: usize) -> f64 {
    let end = (start + len).min(signal.len());
    if start >= end {
        return 0.0;
    }
    rms(&signal[start..end])
}

pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}
