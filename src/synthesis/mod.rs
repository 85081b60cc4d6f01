//! Time-domain resynthesis.

pub mod reconstruct;

pub use reconstruct::{overlap_add, reconstruct};
