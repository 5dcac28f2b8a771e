//! Run-file naming.
//!
//! Files are named `brand_websites_<model>_<timestamp>.json`, with a
//! `PARTIAL_` marker before the timestamp for interrupted runs. The model
//! segment is the sanitized model identifier and the timestamp is ISO 8601
//! with `:` and `.` replaced by `-`.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

const FILE_PREFIX: &str = "brand_websites_";
const PARTIAL_MARKER: &str = "PARTIAL_";

static RUN_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^brand_websites_(?P<model>.+?)_(?P<partial>PARTIAL_)?(?P<ts>\d{4}-\d{2}-\d{2}T\d{2}-\d{2}-\d{2}(?:-\d{1,9})?Z)\.json$",
    )
    .expect("valid run file regex")
});

/// Replace characters that are unsafe in filenames (`/ \ : * ? " < > |`)
/// with `_`.
#[must_use]
pub fn sanitize_model_id(model_id: &str) -> String {
    model_id
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect()
}

/// Timestamp segment used in run filenames, e.g. `2025-01-15T10-30-45-123Z`.
#[must_use]
pub fn filename_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}

/// Canonical filename for a run of `model_id` saved at `timestamp`.
#[must_use]
pub fn run_filename(model_id: &str, timestamp: DateTime<Utc>, partial: bool) -> String {
    let marker = if partial { PARTIAL_MARKER } else { "" };
    format!(
        "{FILE_PREFIX}{}_{marker}{}.json",
        sanitize_model_id(model_id),
        filename_timestamp(timestamp)
    )
}

/// The pieces encoded in a run filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFileName {
    /// Sanitized model identifier.
    pub model: String,
    pub partial: bool,
    pub timestamp: String,
}

impl RunFileName {
    /// Parse a bare filename (no directory). Returns `None` for anything that
    /// is not a run file.
    #[must_use]
    pub fn parse(file_name: &str) -> Option<Self> {
        let caps = RUN_FILE_RE.captures(file_name)?;
        Some(Self {
            model: caps["model"].to_owned(),
            partial: caps.name("partial").is_some(),
            timestamp: caps["ts"].to_owned(),
        })
    }

    /// `true` if this file was written for `model_id` (compared after
    /// sanitizing).
    #[must_use]
    pub fn is_for_model(&self, model_id: &str) -> bool {
        self.model == sanitize_model_id(model_id)
    }
}

/// Cheap prefix check used when listing a results directory.
#[must_use]
pub fn looks_like_run_file(file_name: &str) -> bool {
    file_name.starts_with(FILE_PREFIX)
        && std::path::Path::new(file_name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
