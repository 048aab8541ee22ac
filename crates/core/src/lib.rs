#![deny(warnings)]

pub mod config;
pub mod decode;
pub mod emotion;
pub mod engine;
pub mod label;
pub mod report;
pub mod tally;
pub mod walker;

pub use config::{AngerThreshold, EvalConfig, Jobs};
pub use emotion::{EmotionClass, EmotionProbabilities};
pub use engine::EmotionEngine;
pub use label::{extract_label, GroundTruthLabel, LabelError};
pub use report::{AccuracyReport, Percentage};
pub use tally::CorpusCounters;
pub use walker::CorpusWalker;
