//! On-disk run store.
//!
//! Runs are written once as pretty-printed JSON into a single results
//! directory. Before a new run the store is asked whether an earlier complete
//! run of the same model already found enough websites to make a repeat
//! pointless.

use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::filename::{looks_like_run_file, run_filename, RunFileName};
use crate::run::RunRecord;

/// Answer from [`CompletionStore::check_completion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionStatus {
    /// No earlier run is good enough; `reason` explains why.
    NoResults { reason: String },
    /// An earlier run already meets the threshold.
    Sufficient {
        path: PathBuf,
        /// Results with `success` and a website URL.
        qualifying: usize,
        total: usize,
    },
}

/// A previously saved run together with the file it came from.
#[derive(Debug, Clone)]
pub struct StoredRun {
    pub path: PathBuf,
    pub file_name: RunFileName,
    pub record: RunRecord,
}

#[derive(Debug, Clone)]
pub struct CompletionStore {
    dir: PathBuf,
}

impl CompletionStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Look for an earlier complete run of `model_id` with at least
    /// `threshold` qualifying results.
    ///
    /// Partial runs are ignored. Files that cannot be read or parsed are
    /// skipped with a warning. Among the remaining files the one with the
    /// most qualifying results wins.
    #[must_use]
    pub fn check_completion(&self, model_id: &str, threshold: usize) -> CompletionStatus {
        let candidates = match self.list_run_files() {
            Ok(paths) => paths,
            Err(e) => {
                return CompletionStatus::NoResults {
                    reason: format!("results directory unavailable: {e}"),
                }
            }
        };

        let mut matched = 0usize;
        let mut best: Option<(PathBuf, usize, usize)> = None;

        for path in candidates {
            let Some(name) = parse_file_name(&path) else {
                continue;
            };
            if name.partial || !name.is_for_model(model_id) {
                continue;
            }
            matched += 1;

            let record = match Self::load_run(&path) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable run file");
                    continue;
                }
            };

            let qualifying = record.qualifying_count();
            let total = record.results.len();
            if best.as_ref().is_none_or(|(_, q, _)| qualifying > *q) {
                best = Some((path, qualifying, total));
            }
        }

        match best {
            None => CompletionStatus::NoResults {
                reason: if matched == 0 {
                    format!("no saved results found for model {model_id}")
                } else {
                    format!("none of the {matched} saved runs for model {model_id} could be read")
                },
            },
            Some((path, qualifying, total)) if qualifying >= threshold => {
                CompletionStatus::Sufficient {
                    path,
                    qualifying,
                    total,
                }
            }
            Some((path, qualifying, _)) => CompletionStatus::NoResults {
                reason: format!(
                    "best earlier run {} has {qualifying} websites found, {threshold} needed",
                    path.display()
                ),
            },
        }
    }

    /// Every run file in the directory, sorted by filename. A missing
    /// directory yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory exists but cannot be read.
    pub fn list_run_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.dir.display().to_string(),
                    source: e,
                })
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(looks_like_run_file)
            })
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Load every parseable run in the directory, skipping bad files with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory exists but cannot be read.
    pub fn load_all(&self) -> Result<Vec<StoredRun>, StoreError> {
        let mut runs = Vec::new();
        for path in self.list_run_files()? {
            let Some(file_name) = parse_file_name(&path) else {
                tracing::warn!(path = %path.display(), "skipping file with unrecognised run name");
                continue;
            };
            match Self::load_run(&path) {
                Ok(record) => runs.push(StoredRun {
                    path,
                    file_name,
                    record,
                }),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable run file");
                }
            }
        }
        Ok(runs)
    }

    /// Read and parse one run file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] or [`StoreError::Json`].
    pub fn load_run(path: &Path) -> Result<RunRecord, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| StoreError::Json {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Write `record` under its canonical filename and return the path.
    ///
    /// The filename carries the run timestamp; partial runs get the
    /// `PARTIAL_` marker.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created or the
    /// file cannot be written, [`StoreError::Json`] if serialization fails.
    pub fn save_run(&self, record: &RunRecord) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| StoreError::Io {
            path: self.dir.display().to_string(),
            source: e,
        })?;

        let file_name = run_filename(
            &record.metadata.model_id,
            record.metadata.timestamp,
            record.is_partial(),
        );
        let path = self.dir.join(file_name);

        let body = serde_json::to_string_pretty(record).map_err(|e| StoreError::Json {
            path: path.display().to_string(),
            source: e,
        })?;
        std::fs::write(&path, body).map_err(|e| StoreError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        tracing::info!(path = %path.display(), results = record.results.len(), "saved run");
        Ok(path)
    }
}

fn parse_file_name(path: &Path) -> Option<RunFileName> {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(RunFileName::parse)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::record::{BrandResult, ErrorType, SearchConfidence, TokenUsage};
    use crate::run::RunDescriptor;

    const MODEL: &str = "anthropic/claude-sonnet-4";

    fn descriptor(model_id: &str) -> RunDescriptor {
        RunDescriptor {
            model_key: "claude".to_owned(),
            model_name: "Claude".to_owned(),
            model_id: model_id.to_owned(),
            start_index: 0,
            requested_count: 10,
        }
    }

    fn found(brand: &str) -> BrandResult {
        BrandResult {
            brand_name: brand.to_owned(),
            website_url: Some(format!("https://{}.example", brand.to_lowercase())),
            description: None,
            additional_info: crate::AdditionalInfo::default(),
            search_confidence: SearchConfidence::High,
            notes: None,
            model_used: MODEL.to_owned(),
            timestamp: Utc::now(),
            raw_response: None,
            error_type: None,
            success: true,
            token_usage: TokenUsage::default(),
        }
    }

    fn success_without_url(brand: &str) -> BrandResult {
        BrandResult {
            website_url: None,
            ..found(brand)
        }
    }

    fn failed(brand: &str) -> BrandResult {
        BrandResult::failure(
            brand,
            MODEL,
            ErrorType::ParseError,
            "bad".to_owned(),
            None,
            TokenUsage::default(),
        )
    }

    /// Write a run file with a fixed timestamp `second` so names are unique.
    fn write_run(
        dir: &Path,
        model_id: &str,
        second: u32,
        partial: bool,
        results: Vec<BrandResult>,
    ) -> PathBuf {
        let record = RunRecord::build(&descriptor(model_id), results, partial, Utc::now());
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, second).unwrap();
        let path = dir.join(run_filename(model_id, ts, partial));
        std::fs::write(&path, serde_json::to_string_pretty(&record).unwrap()).unwrap();
        path
    }

    #[test]
    fn missing_directory_reports_no_results() {
        let dir = tempfile::tempdir().unwrap();
        let store = CompletionStore::new(dir.path().join("absent"));
        assert!(matches!(
            store.check_completion(MODEL, 1),
            CompletionStatus::NoResults { .. }
        ));
    }

    #[test]
    fn selects_file_with_most_qualifying_results() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), MODEL, 1, false, vec![found("A"), failed("B")]);
        let best = write_run(
            dir.path(),
            MODEL,
            2,
            false,
            vec![found("A"), found("B"), found("C")],
        );
        write_run(
            dir.path(),
            MODEL,
            3,
            false,
            vec![found("A"), success_without_url("B"), failed("C"), failed("D")],
        );

        let store = CompletionStore::new(dir.path());
        match store.check_completion(MODEL, 3) {
            CompletionStatus::Sufficient {
                path,
                qualifying,
                total,
            } => {
                assert_eq!(path, best);
                assert_eq!(qualifying, 3);
                assert_eq!(total, 3);
            }
            other => panic!("expected Sufficient, got {other:?}"),
        }
    }

    #[test]
    fn below_threshold_reports_no_results() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), MODEL, 1, false, vec![found("A"), failed("B")]);
        let store = CompletionStore::new(dir.path());
        match store.check_completion(MODEL, 2) {
            CompletionStatus::NoResults { reason } => {
                assert!(reason.contains("1 websites found"), "reason: {reason}");
            }
            other => panic!("expected NoResults, got {other:?}"),
        }
    }

    #[test]
    fn ignores_partial_runs_and_other_models() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), MODEL, 1, true, vec![found("A"), found("B")]);
        write_run(
            dir.path(),
            "anthropic/claude-sonnet-4-beta",
            2,
            false,
            vec![found("A"), found("B")],
        );
        let store = CompletionStore::new(dir.path());
        assert!(matches!(
            store.check_completion(MODEL, 1),
            CompletionStatus::NoResults { .. }
        ));
    }

    #[test]
    fn malformed_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 9).unwrap();
        std::fs::write(dir.path().join(run_filename(MODEL, ts, false)), "{ not json").unwrap();
        let good = write_run(dir.path(), MODEL, 1, false, vec![found("A")]);

        let store = CompletionStore::new(dir.path());
        match store.check_completion(MODEL, 1) {
            CompletionStatus::Sufficient { path, .. } => assert_eq!(path, good),
            other => panic!("expected Sufficient, got {other:?}"),
        }
    }

    #[test]
    fn only_malformed_files_reports_no_results() {
        let dir = tempfile::tempdir().unwrap();
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 9).unwrap();
        std::fs::write(dir.path().join(run_filename(MODEL, ts, false)), "[]").unwrap();
        let store = CompletionStore::new(dir.path());
        assert!(matches!(
            store.check_completion(MODEL, 0),
            CompletionStatus::NoResults { .. }
        ));
    }

    #[test]
    fn save_run_writes_partial_marker_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = CompletionStore::new(dir.path().join("results"));
        let record = RunRecord::build(
            &descriptor(MODEL),
            vec![found("A"), failed("B")],
            true,
            Utc::now(),
        );

        let path = store.save_run(&record).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(
            name.starts_with("brand_websites_anthropic_claude-sonnet-4_PARTIAL_"),
            "unexpected name {name}"
        );

        let loaded = CompletionStore::load_run(&path).unwrap();
        assert_eq!(loaded.results, record.results);
        assert!(loaded.is_partial());
    }

    #[test]
    fn load_all_skips_bad_files_and_keeps_partials() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), MODEL, 1, false, vec![found("A")]);
        write_run(dir.path(), "perplexity/sonar", 2, true, vec![failed("A")]);
        std::fs::write(dir.path().join("brand_websites_junk.json"), "{}").unwrap();
        std::fs::write(dir.path().join("unrelated.json"), "{}").unwrap();

        let runs = CompletionStore::new(dir.path()).load_all().unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs.iter().any(|r| r.file_name.partial));
    }
}
