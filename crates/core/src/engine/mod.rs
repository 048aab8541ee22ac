mod command;
mod prosody;
mod scripted;

use crate::emotion::EmotionProbabilities;
use std::path::Path;
use std::sync::Arc;

pub use command::CommandEngine;
pub use prosody::{ProsodyEngine, ProsodyEngineOptions};
pub use scripted::ScriptedEngine;

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("failed to run engine command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("engine command exited with {code:?}: {stderr}")]
    CommandFailed { code: Option<i32>, stderr: String },

    #[error("malformed engine output: {0}")]
    MalformedOutput(#[from] serde_json::Error),

    #[error("{emotion} score out of range: {score}")]
    ScoreOutOfRange { emotion: &'static str, score: f64 },

    #[error("audio decoding failed: {0}")]
    Decode(#[from] crate::decode::DecodeError),
}

/// Black-box emotion classifier for one file.
///
/// Implementations never fail: anything that prevents a confident answer
/// (unreadable file, too little signal, engine crash) is reported as
/// `valid = false`.
pub trait EmotionEngine: Send + Sync {
    fn classify(&self, path: &Path) -> EmotionProbabilities;
}

impl<E: EmotionEngine + ?Sized> EmotionEngine for Arc<E> {
    fn classify(&self, path: &Path) -> EmotionProbabilities {
        (**self).classify(path)
    }
}

impl<E: EmotionEngine + ?Sized> EmotionEngine for Box<E> {
    fn classify(&self, path: &Path) -> EmotionProbabilities {
        (**self).classify(path)
    }
}

impl<E: EmotionEngine + ?Sized> EmotionEngine for &E {
    fn classify(&self, path: &Path) -> EmotionProbabilities {
        (**self).classify(path)
    }
}

pub(crate) fn validate_scores(p: &EmotionProbabilities) -> Result<(), EngineError> {
    for (emotion, score) in [
        ("neutrality", p.neutrality),
        ("happiness", p.happiness),
        ("sadness", p.sadness),
        ("anger", p.anger),
        ("fear", p.fear),
    ] {
        if !(0.0..=1.0).contains(&score) {
            return Err(EngineError::ScoreOutOfRange { emotion, score });
        }
    }
    Ok(())
}
