//! Core types, transforms, windows, matrices and the worker pool.

pub mod bits;
pub mod config;
pub mod fft;
pub mod filter;
pub mod matrix;
pub mod parallel;
pub mod types;
pub mod window;

pub use matrix::{ComplexSpectrumMatrix, MaskMatrix, Matrix, PowerSpectrumMatrix};
pub use parallel::WorkerPool;
pub use types::*;
pub use window::{apply_window, apply_window_copy, generate_window, WindowType};
