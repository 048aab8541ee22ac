use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CORPUS_ROOT: &str = "./data";
pub const DEFAULT_ANGER_THRESHOLD: f64 = 0.1;
pub const DEFAULT_JOBS: usize = 1;
pub const ENV_CORPUS_ROOT: &str = "ANGER_EVAL_CORPUS";
pub const ENV_ANGER_THRESHOLD: &str = "ANGER_EVAL_THRESHOLD";
pub const ENV_JOBS: &str = "ANGER_EVAL_JOBS";

/// Minimum anger score for a false negative to count as "with enough anger".
/// The comparison is strict.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct AngerThreshold(f64);

impl AngerThreshold {
    pub fn new(value: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::ThresholdOutOfRange(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_exceeded_by(&self, score: f64) -> bool {
        score > self.0
    }
}

impl Default for AngerThreshold {
    fn default() -> Self {
        Self(DEFAULT_ANGER_THRESHOLD)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Jobs(usize);

impl Jobs {
    pub fn new(jobs: usize) -> Result<Self, ConfigError> {
        if jobs == 0 {
            return Err(ConfigError::ZeroJobs);
        }
        Ok(Self(jobs))
    }

    pub fn get(&self) -> usize {
        self.0
    }

    pub fn is_sequential(&self) -> bool {
        self.0 == 1
    }
}

impl Default for Jobs {
    fn default() -> Self {
        Self(DEFAULT_JOBS)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum EngineChoice {
    #[default]
    Prosody,
    Command { program: String, args: Vec<String> },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EvalConfig {
    pub corpus_root: PathBuf,
    pub anger_threshold: AngerThreshold,
    pub jobs: Jobs,
    pub engine: EngineChoice,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            corpus_root: PathBuf::from(DEFAULT_CORPUS_ROOT),
            anger_threshold: AngerThreshold::default(),
            jobs: Jobs::default(),
            engine: EngineChoice::default(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("anger threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),
    #[error("{key} is not a valid number: {value:?}")]
    NotANumber { key: String, value: String },
    #[error("jobs must be > 0")]
    ZeroJobs,
    #[error("corpus root must not be empty")]
    EmptyCorpusRoot,
    #[error("command engine requires a program")]
    MissingEngineCommand,
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

pub fn resolve_corpus_root(
    cli_value: Option<PathBuf>,
    env: &impl Env,
) -> Result<PathBuf, ConfigError> {
    let root = match cli_value {
        Some(p) => p,
        None => PathBuf::from(resolve_string_with_default(
            None,
            ENV_CORPUS_ROOT,
            env,
            DEFAULT_CORPUS_ROOT,
        )),
    };
    if root.as_os_str().is_empty() {
        return Err(ConfigError::EmptyCorpusRoot);
    }
    Ok(root)
}

pub fn resolve_anger_threshold(
    cli_value: Option<f64>,
    env: &impl Env,
) -> Result<AngerThreshold, ConfigError> {
    match cli_value {
        Some(v) => AngerThreshold::new(v),
        None => match env.var(ENV_ANGER_THRESHOLD) {
            Some(raw) => AngerThreshold::new(parse_env(ENV_ANGER_THRESHOLD, &raw)?),
            None => Ok(AngerThreshold::default()),
        },
    }
}

pub fn resolve_jobs(cli_value: Option<usize>, env: &impl Env) -> Result<Jobs, ConfigError> {
    match cli_value {
        Some(v) => Jobs::new(v),
        None => match env.var(ENV_JOBS) {
            Some(raw) => Jobs::new(parse_env(ENV_JOBS, &raw)?),
            None => Ok(Jobs::default()),
        },
    }
}

pub fn resolve_engine(
    program: Option<String>,
    args: Vec<String>,
    use_command: bool,
) -> Result<EngineChoice, ConfigError> {
    if !use_command {
        return Ok(EngineChoice::Prosody);
    }
    match program {
        Some(p) if !p.trim().is_empty() => Ok(EngineChoice::Command { program: p, args }),
        _ => Err(ConfigError::MissingEngineCommand),
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::NotANumber {
        key: key.to_owned(),
        value: raw.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_cli_takes_precedence_over_env() {
        let env = MapEnv::default().with_var(ENV_ANGER_THRESHOLD, "0.3");
        let t = resolve_anger_threshold(Some(0.2), &env).expect("valid threshold");
        assert_eq!(t.value(), 0.2);
    }

    #[test]
    fn threshold_env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_ANGER_THRESHOLD, " 0.25 ");
        let t = resolve_anger_threshold(None, &env).expect("valid threshold");
        assert_eq!(t.value(), 0.25);
    }

    #[test]
    fn threshold_defaults_to_one_tenth() {
        let t = resolve_anger_threshold(None, &MapEnv::default()).expect("default");
        assert_eq!(t.value(), DEFAULT_ANGER_THRESHOLD);
        assert!(!t.is_exceeded_by(0.1));
        assert!(t.is_exceeded_by(0.1000001));
    }

    #[test]
    fn threshold_rejects_out_of_range_and_garbage() {
        assert_eq!(
            resolve_anger_threshold(Some(1.5), &MapEnv::default()),
            Err(ConfigError::ThresholdOutOfRange(1.5))
        );
        assert!(AngerThreshold::new(f64::NAN).is_err());

        let env = MapEnv::default().with_var(ENV_ANGER_THRESHOLD, "lots");
        let err = resolve_anger_threshold(None, &env).unwrap_err();
        assert!(matches!(err, ConfigError::NotANumber { .. }));
    }

    #[test]
    fn jobs_resolution() {
        assert!(resolve_jobs(None, &MapEnv::default())
            .expect("default")
            .is_sequential());
        let env = MapEnv::default().with_var(ENV_JOBS, "4");
        assert_eq!(resolve_jobs(None, &env).expect("env").get(), 4);
        assert_eq!(resolve_jobs(Some(0), &env), Err(ConfigError::ZeroJobs));
    }

    #[test]
    fn corpus_root_cli_env_default() {
        let env = MapEnv::default().with_var(ENV_CORPUS_ROOT, "/corpus/env");
        assert_eq!(
            resolve_corpus_root(Some(PathBuf::from("/corpus/cli")), &env).expect("cli"),
            PathBuf::from("/corpus/cli")
        );
        assert_eq!(
            resolve_corpus_root(None, &env).expect("env"),
            PathBuf::from("/corpus/env")
        );
        assert_eq!(
            resolve_corpus_root(None, &MapEnv::default()).expect("default"),
            PathBuf::from(DEFAULT_CORPUS_ROOT)
        );
        assert_eq!(
            resolve_corpus_root(Some(PathBuf::new()), &env),
            Err(ConfigError::EmptyCorpusRoot)
        );
    }

    #[test]
    fn command_engine_needs_a_program() {
        assert_eq!(
            resolve_engine(None, Vec::new(), true),
            Err(ConfigError::MissingEngineCommand)
        );
        assert_eq!(
            resolve_engine(Some("vokaturi-probe".into()), vec!["--json".into()], true),
            Ok(EngineChoice::Command {
                program: "vokaturi-probe".into(),
                args: vec!["--json".into()],
            })
        );
        assert_eq!(
            resolve_engine(Some("ignored".into()), Vec::new(), false),
            Ok(EngineChoice::Prosody)
        );
    }
}
