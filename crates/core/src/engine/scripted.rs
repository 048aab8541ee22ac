use crate::emotion::EmotionProbabilities;
use crate::engine::EmotionEngine;
use std::collections::HashMap;
use std::path::Path;

/// Returns canned results keyed by file name. Unknown files are invalid.
#[derive(Clone, Debug, Default)]
pub struct ScriptedEngine {
    by_name: HashMap<String, EmotionProbabilities>,
    fallback: Option<EmotionProbabilities>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, file_name: &str, probabilities: EmotionProbabilities) -> Self {
        self.by_name.insert(file_name.to_owned(), probabilities);
        self
    }

    pub fn with_fallback(mut self, probabilities: EmotionProbabilities) -> Self {
        self.fallback = Some(probabilities);
        self
    }
}

impl EmotionEngine for ScriptedEngine {
    fn classify(&self, path: &Path) -> EmotionProbabilities {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| self.by_name.get(n).copied())
            .or(self.fallback)
            .unwrap_or_else(EmotionProbabilities::invalid)
    }
}
