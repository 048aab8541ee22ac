//! Heuristic emotion engine driven by simple prosodic features.
//!
//! This is a baseline, not a trained model: it derives energy, brightness
//! (zero-crossing rate) and energy variability from 20 ms frames and maps
//! them onto the five classes with a softmax.

use crate::decode::{AudioDecoder, DecodedAudio, SymphoniaDecoder};
use crate::emotion::EmotionProbabilities;
use crate::engine::{EmotionEngine, EngineError};
use std::path::Path;
use std::time::Duration;

const LOG_TARGET: &str = "engine::prosody";
const FRAME_MS: u32 = 20;

#[derive(Clone, Debug)]
pub struct ProsodyEngineOptions {
    /// Shorter recordings are invalid.
    pub min_duration: Duration,
    /// Frames below this RMS are treated as unvoiced.
    pub voiced_rms: f32,
    /// Minimum share of voiced frames for a valid result.
    pub min_voiced_ratio: f32,
}

impl Default for ProsodyEngineOptions {
    fn default() -> Self {
        Self {
            min_duration: Duration::from_millis(300),
            voiced_rms: 0.01,
            min_voiced_ratio: 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ProsodyFeatures {
    energy_rms: f32,
    zero_crossing_rate: f32,
    energy_variability: f32,
    voiced_ratio: f32,
}

#[derive(Clone, Debug)]
pub struct ProsodyEngine<D = SymphoniaDecoder> {
    decoder: D,
    options: ProsodyEngineOptions,
}

impl ProsodyEngine<SymphoniaDecoder> {
    pub fn new() -> Self {
        Self::with_decoder(SymphoniaDecoder::new(), ProsodyEngineOptions::default())
    }
}

impl Default for ProsodyEngine<SymphoniaDecoder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: AudioDecoder> ProsodyEngine<D> {
    pub fn with_decoder(decoder: D, options: ProsodyEngineOptions) -> Self {
        Self { decoder, options }
    }

    pub fn try_classify(&self, path: &Path) -> Result<EmotionProbabilities, EngineError> {
        let audio = self.decoder.decode_file(path)?;
        Ok(self.classify_audio(&audio))
    }

    fn classify_audio(&self, audio: &DecodedAudio) -> EmotionProbabilities {
        if audio.duration() < self.options.min_duration {
            return EmotionProbabilities::invalid();
        }
        match self.features(audio) {
            Some(f) if f.voiced_ratio >= self.options.min_voiced_ratio => score(&f),
            _ => EmotionProbabilities::invalid(),
        }
    }

    fn features(&self, audio: &DecodedAudio) -> Option<ProsodyFeatures> {
        let frame_len = usize::try_from(audio.sample_rate * FRAME_MS / 1000).ok()?;
        if frame_len < 2 {
            return None;
        }

        let mut voiced_rms = Vec::new();
        let mut zcr_sum = 0.0f32;
        let mut frames = 0usize;
        for frame in audio.samples.chunks_exact(frame_len) {
            frames += 1;
            let rms = (frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32).sqrt();
            if rms < self.options.voiced_rms {
                continue;
            }
            let crossings = frame
                .windows(2)
                .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
                .count();
            zcr_sum += crossings as f32 / (frame.len() - 1) as f32;
            voiced_rms.push(rms);
        }
        if frames == 0 || voiced_rms.is_empty() {
            return None;
        }

        let n = voiced_rms.len() as f32;
        let mean = voiced_rms.iter().sum::<f32>() / n;
        let variance = voiced_rms.iter().map(|r| (r - mean).powi(2)).sum::<f32>() / n;
        Some(ProsodyFeatures {
            energy_rms: mean,
            zero_crossing_rate: zcr_sum / n,
            energy_variability: variance.sqrt() / mean,
            voiced_ratio: n / frames as f32,
        })
    }
}

fn score(f: &ProsodyFeatures) -> EmotionProbabilities {
    let energy = f64::from((f.energy_rms / 0.3).clamp(0.0, 1.0));
    let brightness = f64::from((f.zero_crossing_rate / 0.25).clamp(0.0, 1.0));
    let variability = f64::from(f.energy_variability.clamp(0.0, 1.0));

    let logits = [
        1.0 - 2.0 * variability - energy,                       // neutrality
        1.5 * energy + 1.5 * brightness + variability - 1.0,    // happiness
        1.3 - 2.0 * energy - 2.0 * brightness,                  // sadness
        3.0 * energy + 2.0 * brightness - 1.0,                  // anger
        2.0 * brightness - 1.5 * energy + variability - 0.5,    // fear
    ];
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp = logits.map(|l| (l - max).exp());
    let total: f64 = exp.iter().sum();
    let [neutrality, happiness, sadness, anger, fear] = exp.map(|e| e / total);
    EmotionProbabilities::new(neutrality, happiness, sadness, anger, fear)
}

impl<D: AudioDecoder> EmotionEngine for ProsodyEngine<D> {
    fn classify(&self, path: &Path) -> EmotionProbabilities {
        match self.try_classify(path) {
            Ok(p) if p.valid => p,
            Ok(p) => {
                tracing::info!(
                    target: LOG_TARGET,
                    path = %path.display(),
                    "not enough sonorancy to determine emotions"
                );
                p
            }
            Err(e) => {
                tracing::warn!(target: LOG_TARGET, path = %path.display(), error = %e, "file not analyzed");
                EmotionProbabilities::invalid()
            }
        }
    }
}
