//! WAV and decoder integration tests.
//!
//! These write files into a scratch directory, read them back through the
//! public entry points and run a separation on decoded audio.

mod common;

use common::{gen_click_pad, gen_sine, max_abs_diff};
use swaratone::core::config::{read_params_json, write_params_json};
use swaratone::io::{decode_file, encode_wav, read_wav, read_wav_file, write_wav_file};
use swaratone::{separate_buffer, AudioBuffer, BitDepth, Channels, HpssError, HpssParams};

#[test]
fn test_write_read_each_bit_depth() {
    let dir = tempfile::tempdir().unwrap();
    let data = gen_sine(440.0, 44100, 2048, 0.8);
    let buffer = AudioBuffer::from_mono(data.clone(), 44100);

    for (bits, tolerance) in [
        (BitDepth::Eight, 1.0 / 64.0),
        (BitDepth::Sixteen, 1e-4),
        (BitDepth::ThirtyTwo, 1e-8),
    ] {
        let path = dir.path().join(format!("tone_{}.wav", bits.bits()));
        write_wav_file(&path, &buffer, bits).unwrap();
        let back = read_wav_file(&path).unwrap();
        assert_eq!(back.sample_rate, 44100);
        assert_eq!(back.channels, Channels::Mono);
        assert_eq!(back.data.len(), data.len());
        let err = max_abs_diff(&back.data, &data);
        assert!(err < tolerance, "{}-bit error {}", bits.bits(), err);
    }
}

#[test]
fn test_24bit_write_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.wav");
    let buffer = AudioBuffer::from_mono(vec![0.25; 64], 48000);
    let err = write_wav_file(&path, &buffer, BitDepth::TwentyFour).unwrap_err();
    assert_eq!(err, HpssError::UnsupportedBitDepth(24));
    assert!(!path.exists());
}

#[test]
fn test_write_to_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.wav");
    let buffer = AudioBuffer::from_mono(vec![0.0; 8], 8000);
    assert!(matches!(
        write_wav_file(&path, &buffer, BitDepth::Sixteen),
        Err(HpssError::IoError(_))
    ));
}

#[test]
fn test_header_fields() {
    let buffer = AudioBuffer::from_stereo(vec![0.0; 20], 32000);
    let wav = encode_wav(&buffer, BitDepth::ThirtyTwo).unwrap();
    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(&wav[8..12], b"WAVE");
    assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 2);
    assert_eq!(
        u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]),
        32000
    );
    assert_eq!(u16::from_le_bytes([wav[34], wav[35]]), 32);
    assert_eq!(
        u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]),
        80
    );
    assert_eq!(wav.len(), 44 + 80);
}

#[test]
fn test_truncated_data_chunk_is_tolerated() {
    let buffer = AudioBuffer::from_mono(vec![0.5; 100], 44100);
    let mut wav = encode_wav(&buffer, BitDepth::Sixteen).unwrap();
    wav.truncate(44 + 60);
    let back = read_wav(&wav).unwrap();
    assert_eq!(back.data.len(), 30);
}

#[test]
fn test_decode_and_separate_wav() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mix.wav");
    let mono = gen_click_pad(22050, 16384, &[4000, 9000, 14000]);
    let stereo: Vec<f64> = mono.iter().flat_map(|&s| [s * 0.5, s * 0.5]).collect();
    write_wav_file(&path, &AudioBuffer::from_stereo(stereo, 22050), BitDepth::Sixteen).unwrap();

    let decoded = decode_file(&path).unwrap();
    assert_eq!(decoded.channels, Channels::Stereo);
    assert_eq!(decoded.num_frames(), 16384);

    let params = HpssParams::new(512).with_max_threads(2);
    let sep = separate_buffer(&decoded, &params).unwrap();
    assert_eq!(sep.harmonic.len(), 16384);

    let out = dir.path().join("harmonic.wav");
    write_wav_file(&out, &sep.harmonic.into_buffer(), params.output_bits).unwrap();
    let back = read_wav_file(&out).unwrap();
    assert_eq!(back.channels, Channels::Mono);
    assert_eq!(back.sample_rate, 22050);
}

#[test]
fn test_params_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("params.json");
    let params = HpssParams::new(1024)
        .with_filter_lengths(31, 9)
        .with_output_bits(BitDepth::Eight);
    write_params_json(&path, &params).unwrap();
    let loaded = read_params_json(&path).unwrap();
    assert_eq!(loaded, params);
}
