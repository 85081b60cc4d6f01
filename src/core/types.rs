use crate::core::bits::is_power_of_two;
use crate::core::parallel::available_threads;
use crate::error::{HpssError, Result};
use serde::{Deserialize, Serialize};

/// A single audio sample (64-bit float, nominal range -1.0 to 1.0).
pub type Sample = f64;

/// Channel layout of decoded audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channels {
    Mono,
    Stereo,
}

impl Channels {
    /// Number of interleaved channels.
    #[inline]
    pub fn count(self) -> usize {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
        }
    }

    /// Maps a raw channel count to a supported layout.
    pub fn from_count(count: usize) -> Result<Self> {
        match count {
            1 => Ok(Channels::Mono),
            2 => Ok(Channels::Stereo),
            n => Err(HpssError::InvalidFormat(format!(
                "Unsupported channel count: {}",
                n
            ))),
        }
    }
}

/// Buffer holding decoded audio samples in interleaved format.
///
/// For mono audio, samples are stored sequentially: `[s0, s1, s2, ...]`
/// For stereo audio, samples are interleaved: `[L0, R0, L1, R1, ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Raw interleaved sample data.
    pub data: Vec<Sample>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel layout.
    pub channels: Channels,
}

impl AudioBuffer {
    pub fn new(data: Vec<Sample>, sample_rate: u32, channels: Channels) -> Self {
        Self {
            data,
            sample_rate,
            channels,
        }
    }

    pub fn from_mono(data: Vec<Sample>, sample_rate: u32) -> Self {
        Self::new(data, sample_rate, Channels::Mono)
    }

    pub fn from_stereo(data: Vec<Sample>, sample_rate: u32) -> Self {
        Self::new(data, sample_rate, Channels::Stereo)
    }

    /// Number of frames in the buffer (total samples / channels).
    pub fn num_frames(&self) -> usize {
        self.data.len() / self.channels.count()
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_frames() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a single channel's data as a new vector.
    pub fn channel_data(&self, channel: usize) -> Vec<Sample> {
        let num_ch = self.channels.count();
        if channel >= num_ch {
            return Vec::new();
        }
        self.data
            .iter()
            .skip(channel)
            .step_by(num_ch)
            .copied()
            .collect()
    }

    /// Downmixes to mono by averaging the channels of each frame.
    pub fn to_mono(&self) -> Signal {
        let samples = match self.channels {
            Channels::Mono => self.data.clone(),
            Channels::Stereo => self
                .data
                .chunks_exact(2)
                .map(|frame| (frame[0] + frame[1]) * 0.5)
                .collect(),
        };
        Signal::new(samples, self.sample_rate)
    }
}

/// Mono signal the separation pipeline operates on.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub samples: Vec<Sample>,
    pub sample_rate: u32,
}

impl Signal {
    pub fn new(samples: Vec<Sample>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Wraps the samples as a mono [`AudioBuffer`] for writing.
    pub fn into_buffer(self) -> AudioBuffer {
        AudioBuffer::from_mono(self.samples, self.sample_rate)
    }
}

/// Default soft-mask compression exponent.
pub const DEFAULT_MASK_POWER: f64 = 0.75;
/// Default soft-mask regularizer; keeps the mask defined when both estimates vanish.
pub const DEFAULT_MASK_EPSILON: f64 = 1e-7;

/// How harmonic and percussive estimates are turned into masks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaskPolicy {
    /// Each bin goes entirely to whichever estimate is larger (ties to harmonic).
    Binary,
    /// `mH = (yH^p + ε/2) / (yH^p + yP^p + ε)`, `mP = 1 - mH`.
    Soft { power: f64, epsilon: f64 },
}

impl Default for MaskPolicy {
    fn default() -> Self {
        MaskPolicy::Soft {
            power: DEFAULT_MASK_POWER,
            epsilon: DEFAULT_MASK_EPSILON,
        }
    }
}

/// Treatment of bins within half a filter length of the matrix edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMode {
    /// Only bins with a full filter window are computed; edges stay zero.
    #[default]
    Interior,
    /// Edge bins use the median of the truncated window.
    Shrink,
}

/// Output PCM bit depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum BitDepth {
    Eight,
    Sixteen,
    TwentyFour,
    ThirtyTwo,
}

impl BitDepth {
    #[inline]
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
            BitDepth::TwentyFour => 24,
            BitDepth::ThirtyTwo => 32,
        }
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = HpssError;

    fn try_from(bits: u16) -> Result<Self> {
        match bits {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            24 => Ok(BitDepth::TwentyFour),
            32 => Ok(BitDepth::ThirtyTwo),
            other => Err(HpssError::UnsupportedBitDepth(other)),
        }
    }
}

impl From<BitDepth> for u16 {
    fn from(depth: BitDepth) -> u16 {
        depth.bits()
    }
}

/// Parameters controlling the separation pipeline.
///
/// Threaded explicitly through every stage instead of living in globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HpssParams {
    /// STFT window length in samples; must be a power of two (default: 4096).
    pub window_size: usize,
    /// Frame step in samples (default: window_size / 4).
    pub hop_size: Option<usize>,
    /// Zeros added to each end before analysis (default: window_size / 2).
    pub padding: Option<usize>,
    /// Time-axis median filter length in frames, odd (default: 17).
    pub harmonic_filter_len: usize,
    /// Frequency-axis median filter length in bins, odd (default: 17).
    pub percussive_filter_len: usize,
    /// Mask policy (default: soft, p = 0.75, ε = 1e-7).
    pub mask: MaskPolicy,
    /// Edge handling for the median filters (default: interior only).
    pub edge_mode: EdgeMode,
    /// Upper bound on worker threads (default: available parallelism).
    pub max_threads: usize,
    /// Optional high-pass cutoff in Hz applied before analysis.
    pub highpass_cutoff: Option<f64>,
    /// Bit depth for written output (default: 16).
    pub output_bits: BitDepth,
}

impl Default for HpssParams {
    fn default() -> Self {
        Self {
            window_size: 4096,
            hop_size: None,
            padding: None,
            harmonic_filter_len: 17,
            percussive_filter_len: 17,
            mask: MaskPolicy::default(),
            edge_mode: EdgeMode::default(),
            max_threads: available_threads(),
            highpass_cutoff: None,
            output_bits: BitDepth::Sixteen,
        }
    }
}

impl HpssParams {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            ..Self::default()
        }
    }

    pub fn with_hop_size(mut self, hop_size: usize) -> Self {
        self.hop_size = Some(hop_size);
        self
    }

    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn with_filter_lengths(mut self, harmonic: usize, percussive: usize) -> Self {
        self.harmonic_filter_len = harmonic;
        self.percussive_filter_len = percussive;
        self
    }

    pub fn with_mask(mut self, mask: MaskPolicy) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_edge_mode(mut self, edge_mode: EdgeMode) -> Self {
        self.edge_mode = edge_mode;
        self
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn with_highpass(mut self, cutoff: f64) -> Self {
        self.highpass_cutoff = Some(cutoff);
        self
    }

    pub fn with_output_bits(mut self, bits: BitDepth) -> Self {
        self.output_bits = bits;
        self
    }

    /// Hop size in effect.
    #[inline]
    pub fn effective_hop_size(&self) -> usize {
        self.hop_size.unwrap_or(self.window_size / 4)
    }

    /// Padding in effect.
    #[inline]
    pub fn effective_padding(&self) -> usize {
        self.padding.unwrap_or(self.window_size / 2)
    }

    /// Number of frequency bins per frame.
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.window_size / 2 + 1
    }

    /// Number of full frames in a padded signal of `padded_len` samples.
    ///
    /// With the default half-window padding this is `signal_len / hop + 1`.
    pub fn num_frames(&self, padded_len: usize) -> usize {
        if padded_len < self.window_size {
            return 0;
        }
        (padded_len - self.window_size) / self.effective_hop_size() + 1
    }

    /// Checks every parameter, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.window_size < 4 || !is_power_of_two(self.window_size) {
            return Err(HpssError::InvalidParams(format!(
                "window size must be a power of two >= 4, got {}",
                self.window_size
            )));
        }
        let hop = self.effective_hop_size();
        if hop == 0 || hop > self.window_size {
            return Err(HpssError::InvalidParams(format!(
                "hop size must be in 1..={}, got {}",
                self.window_size, hop
            )));
        }
        for (name, len) in [
            ("harmonic", self.harmonic_filter_len),
            ("percussive", self.percussive_filter_len),
        ] {
            if len == 0 || len % 2 == 0 {
                return Err(HpssError::InvalidParams(format!(
                    "{} filter length must be odd, got {}",
                    name, len
                )));
            }
        }
        if let MaskPolicy::Soft { power, epsilon } = self.mask {
            if !power.is_finite() || power <= 0.0 {
                return Err(HpssError::InvalidParams(format!(
                    "soft mask power must be positive, got {}",
                    power
                )));
            }
            if !epsilon.is_finite() || epsilon < 0.0 {
                return Err(HpssError::InvalidParams(format!(
                    "soft mask epsilon must be non-negative, got {}",
                    epsilon
                )));
            }
        }
        if self.max_threads == 0 {
            return Err(HpssError::InvalidParams(
                "max_threads must be at least 1".to_string(),
            ));
        }
        if let Some(cutoff) = self.highpass_cutoff {
            if !cutoff.is_finite() || cutoff <= 0.0 {
                return Err(HpssError::InvalidParams(format!(
                    "high-pass cutoff must be positive, got {}",
                    cutoff
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for HpssParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "window={} hop={} pad={} Lh={} Lp={} mask={:?} edges={:?} threads={}",
            self.window_size,
            self.effective_hop_size(),
            self.effective_padding(),
            self.harmonic_filter_len,
            self.percussive_filter_len,
            self.mask,
            self.edge_mode,
            self.max_threads
        )
    }
}
