//! Ground truth decoding from RAVDESS file names.
//!
//! A RAVDESS name is a 7-part numerical identifier followed by an extension,
//! e.g. `03-01-05-01-02-01-12.wav`:
//!
//! modality - vocal channel - emotion - intensity - statement - repetition - actor
//!
//! Only the emotion field is consumed for labeling; `05` means angry.

use serde::{Deserialize, Serialize};

pub const RAVDESS_FIELD_COUNT: usize = 7;
pub const RAVDESS_STEM_LEN: usize = RAVDESS_FIELD_COUNT * 3 - 1;
pub const RAVDESS_EXTENSION_LEN: usize = 4;
pub const RAVDESS_FILENAME_LEN: usize = RAVDESS_STEM_LEN + RAVDESS_EXTENSION_LEN;
pub const ANGRY_EMOTION_CODE: u8 = 5;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error("unrecognized file name {name:?}: {reason}")]
    UnrecognizedFilename { name: String, reason: &'static str },
}

impl LabelError {
    fn unrecognized(name: &str, reason: &'static str) -> Self {
        Self::UnrecognizedFilename {
            name: name.to_owned(),
            reason,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroundTruthLabel {
    pub has_anger: bool,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RavdessId {
    pub modality: u8,
    pub vocal_channel: u8,
    pub emotion: u8,
    pub intensity: u8,
    pub statement: u8,
    pub repetition: u8,
    pub actor: u8,
}

impl RavdessId {
    pub fn parse(file_name: &str) -> Result<Self, LabelError> {
        if file_name.len() != RAVDESS_FILENAME_LEN {
            return Err(LabelError::unrecognized(file_name, "wrong length"));
        }
        if !file_name.is_ascii() {
            return Err(LabelError::unrecognized(file_name, "non-ascii name"));
        }

        let (stem, extension) = file_name.split_at(RAVDESS_STEM_LEN);
        if !extension.starts_with('.') {
            return Err(LabelError::unrecognized(file_name, "missing extension"));
        }

        let mut fields = [0u8; RAVDESS_FIELD_COUNT];
        let mut count = 0;
        for part in stem.split('-') {
            if count == RAVDESS_FIELD_COUNT {
                return Err(LabelError::unrecognized(file_name, "too many fields"));
            }
            fields[count] = parse_two_digits(part)
                .ok_or_else(|| LabelError::unrecognized(file_name, "field is not two digits"))?;
            count += 1;
        }
        if count != RAVDESS_FIELD_COUNT {
            return Err(LabelError::unrecognized(file_name, "too few fields"));
        }

        let [modality, vocal_channel, emotion, intensity, statement, repetition, actor] = fields;
        Ok(Self {
            modality,
            vocal_channel,
            emotion,
            intensity,
            statement,
            repetition,
            actor,
        })
    }

    pub fn label(&self) -> GroundTruthLabel {
        GroundTruthLabel {
            has_anger: self.emotion == ANGRY_EMOTION_CODE,
        }
    }

    /// Odd-numbered actors are male, even-numbered are female.
    pub fn actor_is_female(&self) -> bool {
        self.actor % 2 == 0
    }
}

fn parse_two_digits(field: &str) -> Option<u8> {
    match field.as_bytes() {
        [hi, lo] if hi.is_ascii_digit() && lo.is_ascii_digit() => {
            Some((hi - b'0') * 10 + (lo - b'0'))
        }
        _ => None,
    }
}

/// Decodes the ground truth class from a bare file name (no directory part).
pub fn extract_label(file_name: &str) -> Result<GroundTruthLabel, LabelError> {
    RavdessId::parse(file_name).map(|id| id.label())
}
