//! Audio file input and output.

pub mod decode;
pub mod wav;

pub use decode::decode_file;
pub use wav::{encode_wav, read_wav, read_wav_file, write_wav_file};
