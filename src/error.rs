//! Error types for the swaratone crate.

use std::fmt;

/// Errors that can occur while separating audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HpssError {
    /// A transform was asked to run on a length that is not a power of two.
    NotPowerOfTwo(usize),
    /// Invalid separation parameters.
    InvalidParams(String),
    /// Input too short for the given parameters.
    InputTooShort { provided: usize, minimum: usize },
    /// Invalid audio format or malformed container.
    InvalidFormat(String),
    /// Requested output bit depth cannot be encoded.
    UnsupportedBitDepth(u16),
    /// I/O error.
    IoError(String),
    /// Compressed audio could not be decoded.
    Decode(String),
    /// The worker pool could not be created.
    ThreadPool(String),
}

impl fmt::Display for HpssError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HpssError::NotPowerOfTwo(n) => {
                write!(f, "transform length is not a power of two: {}", n)
            }
            HpssError::InvalidParams(msg) => write!(f, "invalid parameters: {}", msg),
            HpssError::InputTooShort { provided, minimum } => {
                write!(
                    f,
                    "input too short: {} samples provided, {} required",
                    provided, minimum
                )
            }
            HpssError::InvalidFormat(msg) => write!(f, "invalid format: {}", msg),
            HpssError::UnsupportedBitDepth(bits) => {
                write!(f, "unsupported bit depth: {} bits per sample", bits)
            }
            HpssError::IoError(msg) => write!(f, "I/O error: {}", msg),
            HpssError::Decode(msg) => write!(f, "decode error: {}", msg),
            HpssError::ThreadPool(msg) => write!(f, "worker pool error: {}", msg),
        }
    }
}

impl std::error::Error for HpssError {}

impl From<std::io::Error> for HpssError {
    fn from(err: std::io::Error) -> Self {
        HpssError::IoError(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HpssError>;
