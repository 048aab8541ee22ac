use crate::config::AngerThreshold;
use crate::tally::CorpusCounters;
use serde::Serialize;
use std::fmt;

/// A ratio that is undefined when its denominator is zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(into = "Option<f64>")]
pub enum Percentage {
    Ratio { numerator: u64, denominator: u64 },
    Undefined,
}

impl Percentage {
    pub fn of(numerator: u64, denominator: u64) -> Self {
        if denominator == 0 {
            return Self::Undefined;
        }
        Self::Ratio {
            numerator,
            denominator,
        }
    }

    /// The ratio in `[0, 1]` (for well-formed counters).
    pub fn ratio(&self) -> Option<f64> {
        match *self {
            Self::Ratio {
                numerator,
                denominator,
            } => Some(numerator as f64 / denominator as f64),
            Self::Undefined => None,
        }
    }

    /// Integer percent, truncated toward zero.
    pub fn whole_percent(&self) -> Option<u64> {
        match *self {
            Self::Ratio {
                numerator,
                denominator,
            } => {
                let scaled = u128::from(numerator) * 100 / u128::from(denominator);
                Some(u64::try_from(scaled).unwrap_or(u64::MAX))
            }
            Self::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Ratio { .. })
    }
}

impl From<Percentage> for Option<f64> {
    fn from(p: Percentage) -> Self {
        p.ratio()
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.whole_percent() {
            Some(pct) => write!(f, "{pct} %"),
            None => f.write_str("undefined"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AccuracyReport {
    pub counters: CorpusCounters,
    pub anger_threshold: f64,
    pub correct_anger: Percentage,
    pub false_negative: Percentage,
    pub false_negative_with_enough_anger: Percentage,
    pub correct_other: Percentage,
    pub false_positive: Percentage,
}

impl AccuracyReport {
    pub fn from_counters(counters: &CorpusCounters, threshold: AngerThreshold) -> Self {
        let c = counters;
        Self {
            counters: *c,
            anger_threshold: threshold.value(),
            correct_anger: Percentage::of(c.anger_correctly_detected, c.audio_files_with_anger),
            false_negative: Percentage::of(c.false_negative_anger, c.audio_files_with_anger),
            false_negative_with_enough_anger: Percentage::of(
                c.false_negative_anger_with_enough_anger,
                c.false_negative_anger,
            ),
            correct_other: Percentage::of(c.anger_not_detected, c.audio_files_without_anger),
            false_positive: Percentage::of(c.false_positive_anger, c.audio_files_without_anger),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counters;
        writeln!(f, "Audio files analyzed = {} files.", c.files_analyzed())?;
        writeln!(
            f,
            "Audio files with expected anger analyzed = {} files.",
            c.audio_files_with_anger
        )?;
        writeln!(
            f,
            "Audio files with other emotions analyzed = {} files.",
            c.audio_files_without_anger
        )?;
        writeln!(f, "Invalid files = {} files.", c.invalid_files)?;
        writeln!(
            f,
            "Unrecognized file names = {} files.",
            c.unrecognized_filenames
        )?;
        writeln!(f, "Correct anger answers = {}", self.correct_anger)?;
        writeln!(f, "False negative answers = {}", self.false_negative)?;
        writeln!(
            f,
            "False negative answers with enough anger (more than {} %) = {}",
            (self.anger_threshold * 10_000.0).round() / 100.0,
            self.false_negative_with_enough_anger
        )?;
        writeln!(f, "Correct other emotions answers = {}", self.correct_other)?;
        write!(f, "False positive answers = {}", self.false_positive)
    }
}
