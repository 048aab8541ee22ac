#![deny(warnings)]

use anger_eval_core::config::{
    resolve_anger_threshold, resolve_corpus_root, resolve_engine, resolve_jobs, EngineChoice,
    EvalConfig, StdEnv, ENV_ANGER_THRESHOLD, ENV_CORPUS_ROOT, ENV_JOBS,
};
use anger_eval_core::engine::{CommandEngine, EmotionEngine, ProsodyEngine};
use anger_eval_core::{AccuracyReport, CorpusWalker};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EngineKind {
    /// Built-in heuristic engine (energy / zero-crossing baseline).
    Prosody,
    /// External program printing a JSON probability vector.
    Command,
}

#[derive(Parser, Debug)]
#[command(name = "anger-eval")]
#[command(about = "Measure anger-detection accuracy of an emotion engine on a RAVDESS corpus")]
struct Args {
    /// Corpus root, traversed recursively.
    #[arg(env = ENV_CORPUS_ROOT)]
    corpus: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = EngineKind::Prosody)]
    engine: EngineKind,

    /// Program to run for `--engine command`; the file path is appended.
    #[arg(long)]
    engine_cmd: Option<String>,

    /// Extra arguments passed to the engine program before the file path.
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Anger score above which a false negative counts as "with enough anger".
    #[arg(long, env = ENV_ANGER_THRESHOLD)]
    anger_threshold: Option<f64>,

    /// Files classified concurrently.
    #[arg(long, env = ENV_JOBS)]
    jobs: Option<usize>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let json = args.json;
    let cfg = build_config(args)?;
    tracing::info!(
        corpus = %cfg.corpus_root.display(),
        anger_threshold = cfg.anger_threshold.value(),
        jobs = cfg.jobs.get(),
        engine = ?cfg.engine,
        "config loaded"
    );

    let start = Instant::now();
    let report = run_evaluation(&cfg).await;
    let elapsed = start.elapsed();

    if json {
        println!("{}", report.to_json().context("failed to serialize report")?);
    } else {
        println!("{report}");
        println!("It took {:.3} seconds to execute", elapsed.as_secs_f64());
    }

    Ok(())
}

async fn run_evaluation(cfg: &EvalConfig) -> AccuracyReport {
    let engine: Arc<dyn EmotionEngine> = match &cfg.engine {
        EngineChoice::Prosody => Arc::new(ProsodyEngine::new()),
        EngineChoice::Command { program, args } => {
            Arc::new(CommandEngine::new(program.clone(), args.clone()))
        }
    };
    let walker = CorpusWalker::new(engine, cfg.anger_threshold);

    let counters = if cfg.jobs.is_sequential() {
        walker.walk(&cfg.corpus_root)
    } else {
        walker.walk_concurrent(&cfg.corpus_root, cfg.jobs).await
    };

    if let Err(e) = counters.check_invariants() {
        tracing::error!(error = %e, "counter invariant violated");
    }
    AccuracyReport::from_counters(&counters, cfg.anger_threshold)
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn build_config(args: Args) -> anyhow::Result<EvalConfig> {
    let env = StdEnv;

    let corpus_root = resolve_corpus_root(args.corpus, &env)?;
    let anger_threshold = resolve_anger_threshold(args.anger_threshold, &env)?;
    let jobs = resolve_jobs(args.jobs, &env)?;
    let engine = resolve_engine(
        args.engine_cmd,
        args.engine_args,
        args.engine == EngineKind::Command,
    )?;

    Ok(EvalConfig {
        corpus_root,
        anger_threshold,
        jobs,
        engine,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let args = Args::try_parse_from(["anger-eval", "/corpus"]).expect("valid args");
        assert_eq!(args.corpus, Some(PathBuf::from("/corpus")));
        assert_eq!(args.engine, EngineKind::Prosody);
        assert!(!args.json);
    }

    #[test]
    fn command_engine_args_parse() {
        let args = Args::try_parse_from([
            "anger-eval",
            "/corpus",
            "--engine",
            "command",
            "--engine-cmd",
            "vokaturi-probe",
            "--engine-arg",
            "--json",
            "--anger-threshold",
            "0.25",
            "--jobs",
            "4",
        ])
        .expect("valid args");
        let cfg = build_config(args).expect("valid config");
        assert_eq!(
            cfg.engine,
            EngineChoice::Command {
                program: "vokaturi-probe".into(),
                args: vec!["--json".into()],
            }
        );
        assert_eq!(cfg.anger_threshold.value(), 0.25);
        assert_eq!(cfg.jobs.get(), 4);
    }

    #[test]
    fn command_engine_without_program_is_rejected() {
        let args = Args::try_parse_from(["anger-eval", "/corpus", "--engine", "command"])
            .expect("valid args");
        assert!(build_config(args).is_err());
    }
}
