use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EmotionClass {
    Neutrality,
    Happiness,
    Sadness,
    Anger,
    Fear,
}

impl EmotionClass {
    /// Scan order used when resolving the dominant emotion. Earlier entries
    /// win ties.
    pub const PRECEDENCE: [EmotionClass; 5] = [
        EmotionClass::Anger,
        EmotionClass::Happiness,
        EmotionClass::Fear,
        EmotionClass::Neutrality,
        EmotionClass::Sadness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionClass::Neutrality => "neutrality",
            EmotionClass::Happiness => "happiness",
            EmotionClass::Sadness => "sadness",
            EmotionClass::Anger => "anger",
            EmotionClass::Fear => "fear",
        }
    }
}

impl fmt::Display for EmotionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-file engine output. Scores are only meaningful when `valid` is set.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EmotionProbabilities {
    pub valid: bool,
    pub neutrality: f64,
    pub happiness: f64,
    pub sadness: f64,
    pub anger: f64,
    pub fear: f64,
}

impl EmotionProbabilities {
    pub fn new(neutrality: f64, happiness: f64, sadness: f64, anger: f64, fear: f64) -> Self {
        Self {
            valid: true,
            neutrality,
            happiness,
            sadness,
            anger,
            fear,
        }
    }

    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn score(&self, class: EmotionClass) -> f64 {
        match class {
            EmotionClass::Neutrality => self.neutrality,
            EmotionClass::Happiness => self.happiness,
            EmotionClass::Sadness => self.sadness,
            EmotionClass::Anger => self.anger,
            EmotionClass::Fear => self.fear,
        }
    }

    /// Class with the highest score. A later class in
    /// [`EmotionClass::PRECEDENCE`] only takes over on a strictly greater
    /// score, so ties go to the earlier one. NaN scores never win.
    pub fn dominant(&self) -> EmotionClass {
        let mut best = EmotionClass::PRECEDENCE[0];
        let mut best_score = self.score(best);
        for class in &EmotionClass::PRECEDENCE[1..] {
            let score = self.score(*class);
            if score > best_score || (best_score.is_nan() && !score.is_nan()) {
                best = *class;
                best_score = score;
            }
        }
        best
    }

    pub fn is_anger_dominant(&self) -> bool {
        self.dominant() == EmotionClass::Anger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anger_wins_tie_with_happiness() {
        let p = EmotionProbabilities::new(0.0, 0.5, 0.0, 0.5, 0.0);
        assert_eq!(p.dominant(), EmotionClass::Anger);
    }

    #[test]
    fn ties_follow_precedence_order() {
        // happiness before fear before neutrality before sadness
        assert_eq!(
            EmotionProbabilities::new(0.0, 0.4, 0.0, 0.2, 0.4).dominant(),
            EmotionClass::Happiness
        );
        assert_eq!(
            EmotionProbabilities::new(0.4, 0.0, 0.0, 0.2, 0.4).dominant(),
            EmotionClass::Fear
        );
        assert_eq!(
            EmotionProbabilities::new(0.4, 0.0, 0.4, 0.2, 0.0).dominant(),
            EmotionClass::Neutrality
        );
        assert_eq!(
            EmotionProbabilities::new(0.2, 0.2, 0.2, 0.2, 0.2).dominant(),
            EmotionClass::Anger
        );
    }

    #[test]
    fn strictly_greater_score_wins() {
        assert_eq!(
            EmotionProbabilities::new(0.1, 0.1, 0.6, 0.1, 0.1).dominant(),
            EmotionClass::Sadness
        );
        assert_eq!(
            EmotionProbabilities::new(0.3, 0.1, 0.1, 0.29, 0.21).dominant(),
            EmotionClass::Neutrality
        );
        assert!(EmotionProbabilities::new(0.1, 0.1, 0.1, 0.6, 0.1).is_anger_dominant());
    }

    #[test]
    fn dominant_is_idempotent() {
        let p = EmotionProbabilities::new(0.25, 0.25, 0.1, 0.15, 0.25);
        let first = p.dominant();
        assert_eq!(first, EmotionClass::Happiness);
        assert_eq!(p.dominant(), first);
    }

    #[test]
    fn nan_anger_does_not_stick() {
        let p = EmotionProbabilities::new(0.1, 0.2, 0.0, f64::NAN, 0.0);
        assert_eq!(p.dominant(), EmotionClass::Happiness);
    }

    #[test]
    fn deserializes_engine_json() {
        let p: EmotionProbabilities = serde_json::from_str(
            r#"{"valid":true,"neutrality":0.1,"happiness":0.2,"sadness":0.1,"anger":0.5,"fear":0.1}"#,
        )
        .expect("valid json");
        assert!(p.valid);
        assert_eq!(p.dominant(), EmotionClass::Anger);
    }
}
