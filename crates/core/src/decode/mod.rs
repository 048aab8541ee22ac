use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

const LOG_TARGET: &str = "decode";

/// Mono PCM decoded from a corpus file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub source_channels: u16,
    pub samples: Vec<f32>,
}

impl DecodedAudio {
    pub fn duration(&self) -> Duration {
        duration_from_sample_count(self.sample_rate, 1, self.samples.len())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported or unrecognized format: {0}")]
    Unsupported(String),

    #[error("no audio track found")]
    NoAudioTrack,

    #[error("missing sample rate")]
    MissingSampleRate,

    #[error("decode failed: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

pub trait AudioDecoder: Send + Sync {
    fn decode_file(&self, path: &Path) -> Result<DecodedAudio>;
}

#[derive(Clone, Debug, Default)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode_file(&self, path: &Path) -> Result<DecodedAudio> {
        let file = std::fs::File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| DecodeError::Unsupported(e.to_string()))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodeError::NoAudioTrack)?;
        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or(DecodeError::MissingSampleRate)?;
        let codec_params = track.codec_params.clone();

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::Unsupported(e.to_string()))?;

        let mut interleaved = Vec::new();
        let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(DecodeError::Decode(e.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::debug!(target: LOG_TARGET, path = %path.display(), error = e, "skipping corrupt packet");
                    continue;
                }
                Err(e) => return Err(DecodeError::Decode(e.to_string())),
            };

            if sample_buf.is_none() {
                let spec = *decoded.spec();
                channels = spec.channels.count();
                sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
            }

            if let Some(buf) = sample_buf.as_mut() {
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }
        }

        let samples = downmix_to_mono(&interleaved, channels);
        tracing::trace!(
            target: LOG_TARGET,
            path = %path.display(),
            sample_rate,
            channels,
            frames = samples.len(),
            "decoded"
        );

        Ok(DecodedAudio {
            sample_rate,
            source_channels: u16::try_from(channels).unwrap_or(u16::MAX),
            samples,
        })
    }
}

pub fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

pub fn duration_from_sample_count(
    sample_rate_hz: u32,
    channels: u16,
    sample_count: usize,
) -> Duration {
    if sample_rate_hz == 0 || channels == 0 {
        return Duration::from_secs(0);
    }
    let frames = sample_count / usize::from(channels);
    let micros = (u128::from(frames as u64) * 1_000_000u128) / u128::from(sample_rate_hz);
    Duration::from_micros(micros.min(u128::from(u64::MAX)) as u64)
}
