#![forbid(unsafe_code)]
//! Harmonic-percussive source separation for mono and stereo audio.
//!
//! `swaratone` splits a signal into a harmonic part (sustained tones) and a
//! percussive part (transients) by median-filtering its short-time power
//! spectrum along time and frequency, turning the two estimates into masks,
//! and resynthesizing each masked spectrum with overlap-add. Every stage runs
//! on a bounded worker pool.
//!
//! # Quick Start
//!
//! ```
//! use swaratone::{HpssParams, Signal};
//!
//! // Half a second of 440 Hz sine at 44.1 kHz with a click every 100 ms.
//! let samples: Vec<f64> = (0..22050)
//!     .map(|i| {
//!         let tone = 0.4 * (2.0 * std::f64::consts::PI * 440.0 * i as f64 / 44100.0).sin();
//!         if i % 4410 == 0 { tone + 0.8 } else { tone }
//!     })
//!     .collect();
//! let signal = Signal::new(samples, 44100);
//!
//! let params = HpssParams::new(1024).with_max_threads(2);
//! let separation = swaratone::separate(&signal, &params).unwrap();
//! assert_eq!(separation.harmonic.len(), signal.len());
//! assert_eq!(separation.percussive.len(), signal.len());
//! ```

pub mod analysis;
pub mod core;
pub mod error;
pub mod io;
pub mod synthesis;

pub use analysis::hpss::SeparatedSpectra;
pub use crate::core::matrix::{ComplexSpectrumMatrix, MaskMatrix, Matrix, PowerSpectrumMatrix};
pub use crate::core::parallel::WorkerPool;
pub use crate::core::types::{
    AudioBuffer, BitDepth, Channels, EdgeMode, HpssParams, MaskPolicy, Sample, Signal,
};
pub use crate::core::window::WindowType;
pub use error::{HpssError, Result};

use analysis::spectrum::{build_power_spectrogram, build_spectra, pad_signal};
use crate::core::filter::highpass;

/// Harmonic and percussive masks, shaped `(bins, frames)`.
#[derive(Debug, Clone)]
pub struct Masks {
    pub harmonic: MaskMatrix,
    pub percussive: MaskMatrix,
}

/// Result of separating one signal.
#[derive(Debug, Clone)]
pub struct Separation {
    pub harmonic: Signal,
    pub percussive: Signal,
    /// Only populated by [`separate_with_masks`].
    pub masks: Option<Masks>,
}

/// Result of splitting one signal into its repeating background and the rest.
#[derive(Debug, Clone)]
pub struct RepeatingSeparation {
    pub repeating: Signal,
    pub non_repeating: Signal,
    /// Repetition period in STFT frames.
    pub period: usize,
}

/// Rejects NaN and infinite samples before they spread through the medians.
#[inline]
fn validate_input(samples: &[f64]) -> Result<()> {
    if let Some(i) = samples.iter().position(|s| !s.is_finite()) {
        return Err(HpssError::InvalidParams(format!(
            "input sample {} is not finite",
            i
        )));
    }
    Ok(())
}

/// Applies the optional high-pass pre-filter.
fn prefilter(signal: &Signal, params: &HpssParams) -> Result<Vec<f64>> {
    match params.highpass_cutoff {
        Some(cutoff) => {
            log::info!("high-pass filtering at {} Hz", cutoff);
            highpass(&signal.samples, cutoff, signal.sample_rate)
        }
        None => Ok(signal.samples.clone()),
    }
}

/// Pads, analyses, separates and resynthesizes `signal`.
fn run_pipeline(signal: &Signal, params: &HpssParams, keep_masks: bool) -> Result<Separation> {
    params.validate()?;
    validate_input(&signal.samples)?;
    let n = signal.len();
    if n == 0 {
        return Ok(Separation {
            harmonic: Signal::new(Vec::new(), signal.sample_rate),
            percussive: Signal::new(Vec::new(), signal.sample_rate),
            masks: None,
        });
    }

    let pool = WorkerPool::new(params.max_threads)?;
    log::info!(
        "separating {} samples ({:.2}s) with {}",
        n,
        signal.duration_secs(),
        params
    );

    let filtered = prefilter(signal, params)?;
    let padded = pad_signal(&filtered, params.effective_padding());

    let spectra = build_spectra(&padded, params, &pool)?;
    log::info!(
        "analysed {} frames x {} bins",
        spectra.num_frames(),
        spectra.num_bins()
    );

    let separated = analysis::hpss::separate_spectra(&spectra, params, &pool)?;
    drop(spectra);
    log::info!("masks applied, resynthesizing");

    let (harmonic, percussive) = pool.join(
        || synthesis::reconstruct(&separated.harmonic, params, n, &pool),
        || synthesis::reconstruct(&separated.percussive, params, n, &pool),
    );
    let harmonic = harmonic?;
    let percussive = percussive?;

    let masks = keep_masks.then(|| Masks {
        harmonic: separated.harmonic_mask,
        percussive: separated.percussive_mask,
    });

    Ok(Separation {
        harmonic: Signal::new(harmonic, signal.sample_rate),
        percussive: Signal::new(percussive, signal.sample_rate),
        masks,
    })
}

/// Separates a mono signal into harmonic and percussive signals of the same
/// length.
///
/// # Errors
///
/// Returns [`HpssError::InvalidParams`] if `params` fail validation or the
/// input holds non-finite samples, and propagates errors from any stage.
pub fn separate(signal: &Signal, params: &HpssParams) -> Result<Separation> {
    run_pipeline(signal, params, false)
}

/// Like [`separate`], but also returns the masks used.
pub fn separate_with_masks(signal: &Signal, params: &HpssParams) -> Result<Separation> {
    run_pipeline(signal, params, true)
}

/// Downmixes `buffer` to mono and separates it.
///
/// # Example
///
/// ```
/// use swaratone::{AudioBuffer, HpssParams};
///
/// let buffer = AudioBuffer::from_stereo(vec![0.1, -0.1].repeat(4096), 22050);
/// let params = HpssParams::new(256).with_max_threads(1);
/// let separation = swaratone::separate_buffer(&buffer, &params).unwrap();
/// assert_eq!(separation.harmonic.len(), 4096);
/// assert_eq!(separation.harmonic.sample_rate, 22050);
/// ```
pub fn separate_buffer(buffer: &AudioBuffer, params: &HpssParams) -> Result<Separation> {
    separate(&buffer.to_mono(), params)
}

/// Splits `signal` into a repeating background and the non-repeating rest.
///
/// The period comes from the beat spectrum of the analysis power spectrum.
/// The repeating part is masked with `W / V`, and the rest with its
/// complement, so the two sum back to the input.
///
/// # Errors
///
/// Returns [`HpssError::InvalidParams`] if `params` fail validation, the
/// input holds non-finite samples, or no repetition period can be found.
pub fn separate_repeating(signal: &Signal, params: &HpssParams) -> Result<RepeatingSeparation> {
    params.validate()?;
    validate_input(&signal.samples)?;
    let n = signal.len();
    let pool = WorkerPool::new(params.max_threads)?;

    let filtered = prefilter(signal, params)?;
    let padded = pad_signal(&filtered, params.effective_padding());
    let spectra = build_spectra(&padded, params, &pool)?;

    let beat = analysis::beat::beat_spectrum(&spectra.power, &pool)?;
    let period = analysis::repet::repeating_period(&beat).ok_or_else(|| {
        HpssError::InvalidParams(format!(
            "no repetition period in {} frames",
            spectra.num_frames()
        ))
    })?;
    log::info!("repetition period: {} frames", period);

    let magnitude = spectra.power.map(f64::sqrt);
    let model = analysis::repet::repeating_spectrum(&magnitude, period, &pool)?;
    let mask = analysis::repet::repeating_mask(&model, &magnitude);
    let rest_mask = mask.map(|m| 1.0 - m);

    let (repeating, non_repeating) = pool.join(
        || analysis::mask::apply_mask(&spectra.complex, &mask, &pool),
        || analysis::mask::apply_mask(&spectra.complex, &rest_mask, &pool),
    );
    let (repeating, non_repeating) = (repeating?, non_repeating?);
    let (repeating, non_repeating) = pool.join(
        || synthesis::reconstruct(&repeating, params, n, &pool),
        || synthesis::reconstruct(&non_repeating, params, n, &pool),
    );

    Ok(RepeatingSeparation {
        repeating: Signal::new(repeating?, signal.sample_rate),
        non_repeating: Signal::new(non_repeating?, signal.sample_rate),
        period,
    })
}

/// Beat spectrum of `signal` from a Hann-windowed power spectrogram.
pub fn signal_beat_spectrum(signal: &Signal, params: &HpssParams) -> Result<Vec<f64>> {
    params.validate()?;
    validate_input(&signal.samples)?;
    let pool = WorkerPool::new(params.max_threads)?;
    let padded = pad_signal(&signal.samples, params.effective_padding());
    let power = build_power_spectrogram(&padded, params, &pool)?;
    analysis::beat::beat_spectrum(&power, &pool)
}
