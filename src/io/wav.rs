//! RIFF/WAVE reading and writing.
//!
//! The reader accepts PCM at 8, 16, 24 and 32 bits and IEEE float at 32 bits.
//! The writer produces PCM at 8, 16 and 32 bits with samples clamped to
//! `[-1, 1]`.

use crate::core::types::{AudioBuffer, BitDepth, Channels, Sample};
use crate::error::{HpssError, Result};
use std::path::Path;

/// WAV audio format codes.
const WAV_FORMAT_PCM: u16 = 1;
const WAV_FORMAT_IEEE_FLOAT: u16 = 3;

/// Size of the canonical RIFF + fmt + data headers.
const HEADER_LEN: usize = 44;

/// Reads a WAV file from a byte slice.
pub fn read_wav(data: &[u8]) -> Result<AudioBuffer> {
    if data.len() < HEADER_LEN {
        return Err(HpssError::InvalidFormat("WAV file too short".to_string()));
    }
    if &data[0..4] != b"RIFF" {
        return Err(HpssError::InvalidFormat("Missing RIFF header".to_string()));
    }
    if &data[8..12] != b"WAVE" {
        return Err(HpssError::InvalidFormat(
            "Missing WAVE identifier".to_string(),
        ));
    }
    let mut cursor = 12;

    let mut format_code: u16 = 0;
    let mut num_channels: u16 = 0;
    let mut sample_rate: u32 = 0;
    let mut bits_per_sample: u16 = 0;
    let mut audio_data: &[u8] = &[];

    while cursor + 8 <= data.len() {
        let chunk_id = &data[cursor..cursor + 4];
        let chunk_size = read_u32_le(data, cursor + 4) as usize;
        cursor += 8;

        if chunk_id == b"fmt " {
            if cursor + 16 > data.len() {
                return Err(HpssError::InvalidFormat("fmt chunk too short".to_string()));
            }
            format_code = read_u16_le(data, cursor);
            num_channels = read_u16_le(data, cursor + 2);
            sample_rate = read_u32_le(data, cursor + 4);
            // byte rate and block align are derived, skip them
            bits_per_sample = read_u16_le(data, cursor + 14);
        } else if chunk_id == b"data" {
            // A truncated data chunk keeps whatever is present.
            let end = cursor.saturating_add(chunk_size).min(data.len());
            audio_data = &data[cursor..end];
        }

        cursor = cursor.saturating_add(chunk_size);
        // chunks are word-aligned
        if chunk_size % 2 == 1 {
            cursor = cursor.saturating_add(1);
        }
    }

    if sample_rate == 0 {
        return Err(HpssError::InvalidFormat("No fmt chunk found".to_string()));
    }

    let channels = Channels::from_count(num_channels as usize)?;
    let samples = decode_samples(format_code, bits_per_sample, audio_data)?;
    log::debug!(
        "read WAV: {} Hz, {:?}, {} bits, {} samples",
        sample_rate,
        channels,
        bits_per_sample,
        samples.len()
    );
    Ok(AudioBuffer::new(samples, sample_rate, channels))
}

fn decode_samples(format_code: u16, bits: u16, raw: &[u8]) -> Result<Vec<Sample>> {
    let samples = match (format_code, bits) {
        (WAV_FORMAT_PCM, 8) => raw.iter().map(|&b| (b as f64 - 128.0) / 128.0).collect(),
        (WAV_FORMAT_PCM, 16) => raw
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as f64 / 32768.0)
            .collect(),
        (WAV_FORMAT_PCM, 24) => raw
            .chunks_exact(3)
            .map(|b| {
                // Place the 24 bits at the top of an i32 to sign-extend.
                let v = i32::from_le_bytes([0, b[0], b[1], b[2]]) >> 8;
                v as f64 / 8_388_608.0
            })
            .collect(),
        (WAV_FORMAT_PCM, 32) => raw
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64 / 2_147_483_648.0)
            .collect(),
        (WAV_FORMAT_IEEE_FLOAT, 32) => raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
            .collect(),
        (fmt, bits) => {
            return Err(HpssError::InvalidFormat(format!(
                "Unsupported WAV format: code={}, bits={}",
                fmt, bits
            )))
        }
    };
    Ok(samples)
}

/// Reads a WAV file from disk.
pub fn read_wav_file(path: &Path) -> Result<AudioBuffer> {
    let data =
        std::fs::read(path).map_err(|e| HpssError::IoError(format!("{}: {}", path.display(), e)))?;
    read_wav(&data)
}

/// Encodes `buffer` as PCM WAV at the given bit depth.
///
/// # Errors
///
/// Returns [`HpssError::UnsupportedBitDepth`] for 24-bit output.
pub fn encode_wav(buffer: &AudioBuffer, bits: BitDepth) -> Result<Vec<u8>> {
    let bits_per_sample = bits.bits();
    let encode: fn(f64, &mut Vec<u8>) = match bits {
        BitDepth::Eight => |s, out| out.push((s * 127.0 + 128.0).round() as u8),
        BitDepth::Sixteen => {
            |s, out| out.extend_from_slice(&((s * 32767.0).round() as i16).to_le_bytes())
        }
        BitDepth::ThirtyTwo => {
            |s, out| out.extend_from_slice(&((s * i32::MAX as f64).round() as i32).to_le_bytes())
        }
        BitDepth::TwentyFour => return Err(HpssError::UnsupportedBitDepth(bits_per_sample)),
    };
    let bytes_per_sample = bits_per_sample as usize / 8;
    let num_channels = buffer.channels.count() as u16;
    let byte_rate = buffer.sample_rate * num_channels as u32 * bytes_per_sample as u32;
    let block_align = num_channels * bytes_per_sample as u16;
    let data_size = (buffer.data.len() * bytes_per_sample) as u32;
    let file_size = 36 + data_size;

    let mut out = Vec::with_capacity(HEADER_LEN + data_size as usize);

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&file_size.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&WAV_FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&num_channels.to_le_bytes());
    out.extend_from_slice(&buffer.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());

    for &sample in &buffer.data {
        encode(sample.clamp(-1.0, 1.0), &mut out);
    }

    Ok(out)
}

/// Writes `buffer` to `path` as PCM WAV.
///
/// Unsupported bit depths are rejected before the file is created.
pub fn write_wav_file(path: &Path, buffer: &AudioBuffer, bits: BitDepth) -> Result<()> {
    let data = encode_wav(buffer, bits).map_err(|e| {
        log::warn!("not writing {}: {}", path.display(), e);
        e
    })?;
    std::fs::write(path, data).map_err(|e| HpssError::IoError(format!("{}: {}", path.display(), e)))?;
    log::info!(
        "wrote {} ({} frames, {}-bit)",
        path.display(),
        buffer.num_frames(),
        bits.bits()
    );
    Ok(())
}

#[inline]
fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

#[inline]
fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_roundtrip_16bit() {
        let original = AudioBuffer::from_mono(vec![0.0, 0.5, -0.5, 1.0, -1.0], 44100);
        let wav_data = encode_wav(&original, BitDepth::Sixteen).unwrap();
        assert_eq!(wav_data.len(), HEADER_LEN + 10);
        let decoded = read_wav(&wav_data).unwrap();
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.channels, Channels::Mono);
        for (i, (d, o)) in decoded.data.iter().zip(&original.data).enumerate() {
            assert!((d - o).abs() < 0.001, "sample {}: {} vs {}", i, d, o);
        }
    }

    #[test]
    fn test_wav_8bit_is_unsigned() {
        let original = AudioBuffer::from_mono(vec![0.0, 1.0, -1.0], 8000);
        let wav = encode_wav(&original, BitDepth::Eight).unwrap();
        assert_eq!(&wav[HEADER_LEN..], &[128, 255, 1]);
        let decoded = read_wav(&wav).unwrap();
        assert_eq!(decoded.data[0], 0.0);
        assert!((decoded.data[1] - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_wav_32bit_pcm_stereo() {
        let original = AudioBuffer::from_stereo(vec![0.1, -0.2, 0.3, -0.4], 48000);
        let decoded = read_wav(&encode_wav(&original, BitDepth::ThirtyTwo).unwrap()).unwrap();
        assert_eq!(decoded.channels, Channels::Stereo);
        assert_eq!(decoded.num_frames(), 2);
        for (d, o) in decoded.data.iter().zip(&original.data) {
            assert!((d - o).abs() < 1e-8);
        }
    }

    #[test]
    fn test_wav_write_clamps() {
        let original = AudioBuffer::from_mono(vec![2.5, -7.0], 44100);
        let decoded = read_wav(&encode_wav(&original, BitDepth::Sixteen).unwrap()).unwrap();
        assert!((decoded.data[0] - 1.0).abs() < 0.001);
        assert!((decoded.data[1] + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_wav_encode_rounds_to_nearest() {
        let buffer = AudioBuffer::from_mono(vec![1.6 / 32767.0, -1.6 / 32767.0], 44100);
        let wav = encode_wav(&buffer, BitDepth::Sixteen).unwrap();
        assert_eq!(i16::from_le_bytes([wav[44], wav[45]]), 2);
        assert_eq!(i16::from_le_bytes([wav[46], wav[47]]), -2);

        let step = 1.0 / i32::MAX as f64;
        let buffer = AudioBuffer::from_mono(vec![2.7 * step], 44100);
        let wav = encode_wav(&buffer, BitDepth::ThirtyTwo).unwrap();
        assert_eq!(i32::from_le_bytes([wav[44], wav[45], wav[46], wav[47]]), 3);
    }

    #[test]
    fn test_wav_24bit_write_rejected() {
        let buffer = AudioBuffer::from_mono(vec![0.0; 4], 44100);
        assert_eq!(
            encode_wav(&buffer, BitDepth::TwentyFour),
            Err(HpssError::UnsupportedBitDepth(24))
        );
    }

    #[test]
    fn test_wav_24bit_read() {
        let mut wav = encode_wav(&AudioBuffer::from_mono(vec![], 44100), BitDepth::Sixteen).unwrap();
        // Patch the header to 24-bit mono with one frame.
        wav[34..36].copy_from_slice(&24u16.to_le_bytes());
        wav[40..44].copy_from_slice(&3u32.to_le_bytes());
        wav.extend_from_slice(&[0x00, 0x00, 0xC0]); // -0.5
        let decoded = read_wav(&wav).unwrap();
        assert_eq!(decoded.data, vec![-0.5]);
    }

    #[test]
    fn test_wav_invalid_data() {
        assert!(read_wav(&[]).is_err());
        assert!(read_wav(b"NOT_RIFF_HEADER_AT_ALL______________________").is_err());
    }

    #[test]
    fn test_wav_unsupported_channels() {
        let mut wav = encode_wav(&AudioBuffer::from_mono(vec![0.0; 6], 44100), BitDepth::Sixteen)
            .unwrap();
        wav[22..24].copy_from_slice(&3u16.to_le_bytes());
        assert!(read_wav(&wav).is_err());
    }
}
