use crate::emotion::EmotionProbabilities;
use crate::engine::{validate_scores, EmotionEngine, EngineError};
use std::path::Path;
use std::process::{Command, Stdio};

const LOG_TARGET: &str = "engine::command";

/// Wraps an external classifier program.
///
/// The program is invoked as `program [args...] <path>` and must print one
/// JSON object on stdout:
///
/// ```text
/// {"valid":true,"neutrality":0.1,"happiness":0.2,"sadness":0.1,"anger":0.5,"fear":0.1}
/// ```
#[derive(Clone, Debug)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new<S: Into<String>>(program: S, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn try_classify(&self, path: &Path) -> Result<EmotionProbabilities, EngineError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(EngineError::CommandFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        let probabilities: EmotionProbabilities = serde_json::from_slice(&output.stdout)?;
        if probabilities.valid {
            validate_scores(&probabilities)?;
        }
        Ok(probabilities)
    }
}

impl EmotionEngine for CommandEngine {
    fn classify(&self, path: &Path) -> EmotionProbabilities {
        match self.try_classify(path) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(
                    target: LOG_TARGET,
                    program = %self.program,
                    path = %path.display(),
                    error = %e,
                    "engine failed, counting file as invalid"
                );
                EmotionProbabilities::invalid()
            }
        }
    }
}
