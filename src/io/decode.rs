//! Decoding of compressed and container formats through `symphonia`.

use crate::core::types::{AudioBuffer, Channels, Sample};
use crate::error::{HpssError, Result};
use crate::io::wav::read_wav_file;
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

fn has_wav_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav") || e.eq_ignore_ascii_case("wave"))
}

/// Decodes an audio file into an interleaved [`AudioBuffer`].
///
/// WAV files go through the built-in reader; everything else (MP3, FLAC,
/// Ogg Vorbis) is probed and decoded with `symphonia`. Sources with more than
/// two channels keep only the first two.
pub fn decode_file(path: &Path) -> Result<AudioBuffer> {
    if has_wav_extension(path) {
        return read_wav_file(path);
    }

    let file = File::open(path).map_err(|e| HpssError::IoError(format!("{}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| HpssError::Decode(format!("failed to probe format: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| HpssError::Decode("no audio track found".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| HpssError::Decode("unknown sample rate".to_string()))?;
    // Container metadata may omit the layout; the first decoded packet fixes it.
    let mut out_channels: Option<usize> = codec_params.channels.map(|c| c.count().clamp(1, 2));

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| HpssError::Decode(format!("failed to create decoder: {}", e)))?;

    let mut samples: Vec<Sample> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(HpssError::Decode(format!("error reading packet: {}", e))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("skipping corrupt packet: {}", e);
                continue;
            }
            Err(e) => return Err(HpssError::Decode(format!("decode error: {}", e))),
        };

        let spec = *decoded.spec();
        let buf = sample_buf.get_or_insert_with(|| {
            SampleBuffer::<f32>::new(decoded.capacity() as u64, spec)
        });
        if buf.capacity() < decoded.capacity() * spec.channels.count() {
            *buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        }
        buf.copy_interleaved_ref(decoded);

        let stride = spec.channels.count();
        let keep = *out_channels.get_or_insert(stride.clamp(1, 2));
        append_frames(buf.samples(), stride, keep, &mut samples);
    }

    let channels = Channels::from_count(out_channels.unwrap_or(1))?;
    log::info!(
        "decoded {}: {} Hz, {} channel(s), {} frames",
        path.display(),
        sample_rate,
        channels.count(),
        samples.len() / channels.count()
    );
    Ok(AudioBuffer::new(samples, sample_rate, channels))
}

/// Appends the first `keep` channels of each `stride`-wide interleaved frame.
///
/// A packet with fewer channels than the output layout repeats its last
/// channel so frames stay aligned.
fn append_frames(interleaved: &[f32], stride: usize, keep: usize, out: &mut Vec<Sample>) {
    if stride == 0 {
        return;
    }
    for frame in interleaved.chunks_exact(stride) {
        for c in 0..keep {
            out.push(frame[c.min(stride - 1)] as f64);
        }
    }
}
