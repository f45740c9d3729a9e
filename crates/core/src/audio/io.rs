//! Audio decoding into mono f32 sample buffers.

use std::path::Path;

use hound::{SampleFormat, WavReader};

use super::error::DecodeError;

/// Read a WAV file and return `(samples, sample_rate)`.
///
/// - Normalizes int16/int32 to f32 in [-1, 1]
/// - Passes through float WAVs
/// - Takes the first channel if stereo/multi-channel
pub fn read_wav(path: &Path) -> Result<(Vec<f32>, u32), DecodeError> {
    let reader = WavReader::open(path)?;

    let spec = reader.spec();
    let sample_rate = spec.sample_rate;
    let channels = spec.channels as usize;

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            let max_val = (1i64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .enumerate()
                .filter_map(|(i, s)| {
                    // Take first channel only
                    if i % channels == 0 {
                        Some(s.map(|v| v as f32 / max_val))
                    } else {
                        // Still consume the sample to advance the iterator
                        let _ = s;
                        None
                    }
                })
                .collect::<Result<Vec<_>, _>>()?
        }
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .enumerate()
            .filter_map(|(i, s)| {
                if i % channels == 0 {
                    Some(s)
                } else {
                    let _ = s;
                    None
                }
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok((samples, sample_rate))
}

/// Decode any supported audio file (WAV, MP3, AAC/MP4) to mono f32 at the
/// source sample rate. Multi-channel input is averaged down to mono.
///
/// WAV files short-circuit through `read_wav`; everything else goes
/// through symphonia's probe.
pub fn decode_audio(path: &Path) -> Result<(Vec<f32>, u32), DecodeError> {
    if path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
    {
        return read_wav(path);
    }

    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
    use symphonia::core::errors::Error as SymphError;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::NoAudioTrack(path.to_path_buf()))?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let num_frames = decoded.frames();
                let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);
                let interleaved = sample_buf.samples();

                // Average channels down to mono
                if channels > 1 {
                    for frame in 0..num_frames {
                        let mut sum = 0.0;
                        for ch in 0..channels {
                            sum += interleaved[frame * channels + ch];
                        }
                        all_samples.push(sum / channels as f32);
                    }
                } else {
                    all_samples.extend_from_slice(interleaved);
                }
            }
            Err(SymphError::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        }
    }

    if all_samples.is_empty() {
        return Err(DecodeError::Empty(path.to_path_buf()));
    }

    log::debug!(
        "decoded {}: {} samples at {} Hz",
        path.display(),
        all_samples.len(),
        sample_rate
    );

    Ok((all_samples, sample_rate))
}
