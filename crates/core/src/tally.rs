use crate::config::AngerThreshold;
use crate::emotion::{EmotionClass, EmotionProbabilities};
use crate::label::{extract_label, GroundTruthLabel};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// What happened to a single corpus file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FileOutcome {
    /// Engine returned `valid = false`.
    Invalid,
    /// Name does not follow the RAVDESS convention.
    Unrecognized,
    Classified {
        label: GroundTruthLabel,
        dominant: EmotionClass,
        anger_score: f64,
    },
}

impl FileOutcome {
    pub fn evaluate(file_name: &str, probabilities: &EmotionProbabilities) -> Self {
        if !probabilities.valid {
            return Self::Invalid;
        }
        match extract_label(file_name) {
            Ok(label) => Self::Classified {
                label,
                dominant: probabilities.dominant(),
                anger_score: probabilities.anger,
            },
            Err(_) => Self::Unrecognized,
        }
    }
}

/// Confusion counts for "anger vs. not anger" over one corpus walk.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusCounters {
    pub anger_correctly_detected: u64,
    pub anger_not_detected: u64,
    pub false_negative_anger: u64,
    pub false_negative_anger_with_enough_anger: u64,
    pub false_positive_anger: u64,
    pub audio_files_with_anger: u64,
    pub audio_files_without_anger: u64,
    pub invalid_files: u64,
    pub unrecognized_filenames: u64,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CounterInvariantError {
    #[error("files with anger ({total}) != detected + false negatives ({parts})")]
    AngerClassMismatch { total: u64, parts: u64 },
    #[error("files without anger ({total}) != not detected + false positives ({parts})")]
    OtherClassMismatch { total: u64, parts: u64 },
    #[error("false negatives with enough anger ({with_enough}) exceed false negatives ({total})")]
    EnoughAngerExceedsFalseNegatives { with_enough: u64, total: u64 },
}

impl CorpusCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tally(
        &mut self,
        label: GroundTruthLabel,
        dominant: EmotionClass,
        anger_score: f64,
        threshold: AngerThreshold,
    ) {
        let anger_dominant = dominant == EmotionClass::Anger;
        match (label.has_anger, anger_dominant) {
            (true, true) => {
                self.anger_correctly_detected += 1;
                self.audio_files_with_anger += 1;
            }
            (true, false) => {
                self.false_negative_anger += 1;
                self.audio_files_with_anger += 1;
                if threshold.is_exceeded_by(anger_score) {
                    self.false_negative_anger_with_enough_anger += 1;
                }
            }
            (false, true) => {
                self.false_positive_anger += 1;
                self.audio_files_without_anger += 1;
            }
            (false, false) => {
                self.anger_not_detected += 1;
                self.audio_files_without_anger += 1;
            }
        }
    }

    pub fn record_invalid(&mut self) {
        self.invalid_files += 1;
    }

    pub fn record_unrecognized(&mut self) {
        self.unrecognized_filenames += 1;
    }

    pub fn record(&mut self, outcome: FileOutcome, threshold: AngerThreshold) {
        match outcome {
            FileOutcome::Invalid => self.record_invalid(),
            FileOutcome::Unrecognized => self.record_unrecognized(),
            FileOutcome::Classified {
                label,
                dominant,
                anger_score,
            } => self.tally(label, dominant, anger_score, threshold),
        }
    }

    pub fn merge(&mut self, other: &CorpusCounters) {
        self.anger_correctly_detected += other.anger_correctly_detected;
        self.anger_not_detected += other.anger_not_detected;
        self.false_negative_anger += other.false_negative_anger;
        self.false_negative_anger_with_enough_anger += other.false_negative_anger_with_enough_anger;
        self.false_positive_anger += other.false_positive_anger;
        self.audio_files_with_anger += other.audio_files_with_anger;
        self.audio_files_without_anger += other.audio_files_without_anger;
        self.invalid_files += other.invalid_files;
        self.unrecognized_filenames += other.unrecognized_filenames;
    }

    /// Classified plus invalid files; unrecognized names are not included.
    pub fn files_analyzed(&self) -> u64 {
        self.audio_files_with_anger + self.audio_files_without_anger + self.invalid_files
    }

    pub fn files_visited(&self) -> u64 {
        self.files_analyzed() + self.unrecognized_filenames
    }

    pub fn check_invariants(&self) -> Result<(), CounterInvariantError> {
        let parts = self.anger_correctly_detected + self.false_negative_anger;
        if self.audio_files_with_anger != parts {
            return Err(CounterInvariantError::AngerClassMismatch {
                total: self.audio_files_with_anger,
                parts,
            });
        }
        let parts = self.anger_not_detected + self.false_positive_anger;
        if self.audio_files_without_anger != parts {
            return Err(CounterInvariantError::OtherClassMismatch {
                total: self.audio_files_without_anger,
                parts,
            });
        }
        if self.false_negative_anger_with_enough_anger > self.false_negative_anger {
            return Err(CounterInvariantError::EnoughAngerExceedsFalseNegatives {
                with_enough: self.false_negative_anger_with_enough_anger,
                total: self.false_negative_anger,
            });
        }
        Ok(())
    }
}

impl AddAssign<&CorpusCounters> for CorpusCounters {
    fn add_assign(&mut self, rhs: &CorpusCounters) {
        self.merge(rhs);
    }
}
