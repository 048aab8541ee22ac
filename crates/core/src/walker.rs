use crate::config::{AngerThreshold, Jobs};
use crate::engine::EmotionEngine;
use crate::tally::{CorpusCounters, FileOutcome};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const LOG_TARGET: &str = "walker";

/// Every non-directory entry under `root`, depth first, sorted by name
/// within a directory. Unreadable directories are logged and skipped; a
/// root that cannot be opened (or is not a directory) yields nothing.
pub fn corpus_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_dir() => None,
            Ok(entry) => Some(entry.into_path()),
            Err(e) => {
                tracing::warn!(
                    target: LOG_TARGET,
                    path = ?e.path(),
                    error = %e,
                    "skipping unreadable entry"
                );
                None
            }
        })
}

/// Classifies one file and decides where it lands in the counters.
pub fn evaluate_file<E: EmotionEngine + ?Sized>(engine: &E, path: &Path) -> FileOutcome {
    let probabilities = engine.classify(path);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let outcome = FileOutcome::evaluate(&file_name, &probabilities);

    match outcome {
        FileOutcome::Invalid => {
            tracing::debug!(target: LOG_TARGET, path = %path.display(), "invalid classification");
        }
        FileOutcome::Unrecognized => {
            tracing::warn!(
                target: LOG_TARGET,
                path = %path.display(),
                "file name does not follow the RAVDESS convention, excluded from accuracy"
            );
        }
        FileOutcome::Classified {
            label, dominant, ..
        } => {
            tracing::debug!(
                target: LOG_TARGET,
                path = %path.display(),
                expected_anger = label.has_anger,
                dominant = %dominant,
                anger = probabilities.anger,
                "classified"
            );
        }
    }
    outcome
}

pub struct CorpusWalker<E> {
    engine: E,
    threshold: AngerThreshold,
}

impl<E: EmotionEngine> CorpusWalker<E> {
    pub fn new(engine: E, threshold: AngerThreshold) -> Self {
        Self { engine, threshold }
    }

    /// Sequential depth-first walk.
    pub fn walk(&self, root: &Path) -> CorpusCounters {
        let mut counters = CorpusCounters::new();
        for path in corpus_files(root) {
            counters.record(evaluate_file(&self.engine, &path), self.threshold);
        }
        log_summary(root, &counters);
        counters
    }
}

impl<E> CorpusWalker<E>
where
    E: EmotionEngine + Clone + 'static,
{
    /// Classifies files on the blocking pool with up to `jobs` in flight.
    /// Totals match [`CorpusWalker::walk`] regardless of completion order.
    pub async fn walk_concurrent(&self, root: &Path, jobs: Jobs) -> CorpusCounters {
        let listing_root = root.to_path_buf();
        let files =
            match tokio::task::spawn_blocking(move || corpus_files(&listing_root).collect::<Vec<_>>())
                .await
            {
                Ok(files) => files,
                Err(e) => {
                    tracing::error!(target: LOG_TARGET, error = %e, "corpus listing failed");
                    Vec::new()
                }
            };
        tracing::info!(
            target: LOG_TARGET,
            root = %root.display(),
            files = files.len(),
            jobs = jobs.get(),
            "starting concurrent walk"
        );

        let mut outcomes = stream::iter(files)
            .map(|path| {
                let engine = self.engine.clone();
                tokio::task::spawn_blocking(move || evaluate_file(&engine, &path))
            })
            .buffer_unordered(jobs.get());

        let mut counters = CorpusCounters::new();
        while let Some(result) = outcomes.next().await {
            match result {
                Ok(outcome) => counters.record(outcome, self.threshold),
                Err(e) => {
                    tracing::warn!(
                        target: LOG_TARGET,
                        error = %e,
                        "classification task aborted, counting file as invalid"
                    );
                    counters.record_invalid();
                }
            }
        }
        log_summary(root, &counters);
        counters
    }
}

fn log_summary(root: &Path, counters: &CorpusCounters) {
    tracing::info!(
        target: LOG_TARGET,
        root = %root.display(),
        visited = counters.files_visited(),
        with_anger = counters.audio_files_with_anger,
        without_anger = counters.audio_files_without_anger,
        invalid = counters.invalid_files,
        unrecognized = counters.unrecognized_filenames,
        "walk complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::EmotionProbabilities;
    use crate::engine::ScriptedEngine;
    use crate::report::{AccuracyReport, Percentage};
    use std::fs;
    use std::sync::Arc;

    fn angry() -> EmotionProbabilities {
        EmotionProbabilities::new(0.1, 0.1, 0.1, 0.6, 0.1)
    }

    fn sad_with_some_anger() -> EmotionProbabilities {
        EmotionProbabilities::new(0.1, 0.1, 0.5, 0.2, 0.1)
    }

    fn neutral() -> EmotionProbabilities {
        EmotionProbabilities::new(0.7, 0.1, 0.1, 0.05, 0.05)
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(path, b"RIFF").expect("write file");
    }

    #[test]
    fn two_file_corpus() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join("03-01-05-01-01-01-01.wav"));
        touch(&dir.path().join("03-01-03-01-01-01-01.wav"));

        let engine = ScriptedEngine::new()
            .with("03-01-05-01-01-01-01.wav", angry())
            .with("03-01-03-01-01-01-01.wav", angry());
        let counters = CorpusWalker::new(engine, AngerThreshold::default()).walk(dir.path());

        assert_eq!(counters.anger_correctly_detected, 1);
        assert_eq!(counters.audio_files_with_anger, 1);
        assert_eq!(counters.false_positive_anger, 1);
        assert_eq!(counters.audio_files_without_anger, 1);

        let report = AccuracyReport::from_counters(&counters, AngerThreshold::default());
        assert_eq!(report.correct_anger.whole_percent(), Some(100));
        assert_eq!(report.false_positive.whole_percent(), Some(100));
        assert_eq!(report.correct_other.whole_percent(), Some(0));
    }

    #[test]
    fn nested_corpus_counts_every_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        let files = [
            "Actor_01/03-01-05-01-01-01-01.wav",
            "Actor_01/03-01-05-02-01-01-01.wav",
            "Actor_01/03-01-01-01-01-01-01.wav",
            "Actor_02/deep/er/03-01-04-01-01-01-02.wav",
            "Actor_02/03-01-05-01-02-02-02.wav",
            "Actor_02/README.txt",
            "silent.wav",
        ];
        for f in files {
            touch(&root.join(f));
        }
        fs::create_dir_all(root.join("empty/dir")).expect("create dirs");

        let engine = ScriptedEngine::new()
            .with("03-01-05-01-01-01-01.wav", angry())
            .with("03-01-05-02-01-01-01.wav", sad_with_some_anger())
            .with("03-01-01-01-01-01-01.wav", neutral())
            .with("03-01-04-01-01-01-02.wav", neutral())
            .with("03-01-05-01-02-02-02.wav", neutral())
            .with("README.txt", neutral());
        let counters = CorpusWalker::new(engine, AngerThreshold::default()).walk(root);

        assert_eq!(counters.files_visited(), files.len() as u64);
        assert_eq!(counters.audio_files_with_anger, 3);
        assert_eq!(counters.anger_correctly_detected, 1);
        assert_eq!(counters.false_negative_anger, 2);
        assert_eq!(counters.false_negative_anger_with_enough_anger, 1);
        assert_eq!(counters.audio_files_without_anger, 2);
        assert_eq!(counters.anger_not_detected, 2);
        assert_eq!(counters.invalid_files, 1);
        assert_eq!(counters.unrecognized_filenames, 1);
        counters.check_invariants().expect("invariants hold");
    }

    #[test]
    fn invalid_wins_over_unrecognized() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join("bad-name.wav"));
        let counters =
            CorpusWalker::new(ScriptedEngine::new(), AngerThreshold::default()).walk(dir.path());
        assert_eq!(counters.invalid_files, 1);
        assert_eq!(counters.unrecognized_filenames, 0);
    }

    #[test]
    fn missing_root_is_an_empty_corpus() {
        let dir = tempfile::tempdir().expect("tempdir");
        let walker = CorpusWalker::new(
            ScriptedEngine::new().with_fallback(angry()),
            AngerThreshold::default(),
        );
        assert_eq!(walker.walk(&dir.path().join("missing")), CorpusCounters::default());

        let file_root = dir.path().join("03-01-05-01-01-01-01.wav");
        touch(&file_root);
        assert_eq!(walker.walk(&file_root), CorpusCounters::default());
    }

    #[test]
    fn no_angry_files_reports_undefined_anger_rates() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join("03-01-02-01-01-01-01.wav"));
        touch(&dir.path().join("03-01-08-01-01-01-01.wav"));
        let counters = CorpusWalker::new(
            ScriptedEngine::new().with_fallback(neutral()),
            AngerThreshold::default(),
        )
        .walk(dir.path());

        let report = AccuracyReport::from_counters(&counters, AngerThreshold::default());
        assert_eq!(report.correct_anger, Percentage::Undefined);
        assert_eq!(report.false_negative, Percentage::Undefined);
        assert_eq!(report.correct_other.whole_percent(), Some(100));
    }

    #[test]
    fn corpus_files_skips_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join("b/2.wav"));
        touch(&dir.path().join("a/1.wav"));
        touch(&dir.path().join("0.wav"));
        let names: Vec<_> = corpus_files(dir.path())
            .map(|p| p.strip_prefix(dir.path()).expect("under root").to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("0.wav"),
                PathBuf::from("a/1.wav"),
                PathBuf::from("b/2.wav"),
            ]
        );
    }

    #[tokio::test]
    async fn concurrent_walk_matches_sequential() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut engine = ScriptedEngine::new();
        for actor in 1..=6u8 {
            for emotion in 1..=8u8 {
                let name = format!("03-01-{emotion:02}-01-01-01-{actor:02}.wav");
                touch(&dir.path().join(format!("Actor_{actor:02}")).join(&name));
                let p = match (emotion + actor) % 4 {
                    0 => angry(),
                    1 => sad_with_some_anger(),
                    2 => neutral(),
                    _ => EmotionProbabilities::invalid(),
                };
                engine = engine.with(&name, p);
            }
        }
        touch(&dir.path().join("notes/readme.md"));

        let walker = CorpusWalker::new(Arc::new(engine), AngerThreshold::default());
        let sequential = walker.walk(dir.path());
        let concurrent = walker
            .walk_concurrent(dir.path(), Jobs::new(4).expect("nonzero"))
            .await;

        assert_eq!(sequential, concurrent);
        assert_eq!(concurrent.files_visited(), 49);
        concurrent.check_invariants().expect("invariants hold");
    }
}
