//! Window functions for short-time analysis and synthesis.
//!
//! Provides the Hann window and its square root. The square-root Hann window
//! is applied at both analysis and synthesis so that their product is a Hann
//! window, which satisfies constant-overlap-add at quarter- and half-window
//! hops.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Window function types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowType {
    Hann,
    SqrtHann,
}

/// Hann weight `sin²(πn/(N-1))` for sample `n` of an `size`-point window.
#[inline]
pub fn hann(n: usize, size: usize) -> f64 {
    sqrt_hann(n, size).powi(2)
}

/// Square-root Hann weight `sin(πn/(N-1))`.
#[inline]
pub fn sqrt_hann(n: usize, size: usize) -> f64 {
    if size <= 1 {
        return 1.0;
    }
    (PI * n as f64 / (size - 1) as f64).sin()
}

/// Generates a window function of the specified type and size.
pub fn generate_window(window_type: WindowType, size: usize) -> Vec<f64> {
    if let Some(w) = trivial_window(size) {
        return w;
    }
    match window_type {
        WindowType::Hann => (0..size).map(|i| hann(i, size)).collect(),
        WindowType::SqrtHann => (0..size).map(|i| sqrt_hann(i, size)).collect(),
    }
}

/// Returns `Some(trivial_window)` for degenerate sizes (0 or 1), or `None`
/// to indicate the caller should compute the full window.
#[inline]
fn trivial_window(size: usize) -> Option<Vec<f64>> {
    match size {
        0 => Some(vec![]),
        1 => Some(vec![1.0]),
        _ => None,
    }
}

/// Overlap-add gain of a sqrt-Hann analysis/synthesis pair at `hop_size`.
///
/// Hann windows overlapped at `hop` sum to roughly `window / (2 * hop)`.
#[inline]
pub fn cola_gain(window_size: usize, hop_size: usize) -> f64 {
    window_size as f64 / (2.0 * hop_size as f64)
}

/// Applies a window function to a slice in-place.
#[inline]
pub fn apply_window(data: &mut [f64], window: &[f64]) {
    for (sample, &w) in data.iter_mut().zip(window.iter()) {
        *sample *= w;
    }
}

/// Applies a window function and returns a new vector.
#[inline]
pub fn apply_window_copy(data: &[f64], window: &[f64]) -> Vec<f64> {
    data.iter()
        .zip(window.iter())
        .map(|(&d, &w)| d * w)
        .collect()
}
