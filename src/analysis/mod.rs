//! Spectral analysis: STFT construction, median estimates, masks, HPSS and
//! repeating-pattern extraction.

pub mod beat;
pub mod hpss;
pub mod mask;
pub mod median;
pub mod repet;
pub mod spectrum;

pub use beat::beat_spectrum;
pub use hpss::{separate_spectra, SeparatedSpectra};
pub use mask::{apply_mask, binary_mask, compute_masks, soft_mask};
pub use median::{median, median_estimates, median_filter_frequency, median_filter_time};
pub use repet::{apply_repeating_mask, repeating_mask, repeating_period, repeating_spectrum};
pub use spectrum::{build_power_spectrogram, build_spectra, pad_signal, power_spectrum, Spectra};
