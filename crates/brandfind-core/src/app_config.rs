use std::path::PathBuf;

/// How a finished run's failures translate into the process exit status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailurePolicy {
    /// Exit non-zero when every brand in the run failed.
    pub fail_when_all_failed: bool,
    /// Print a warning when the failed share of the run exceeds this ratio.
    pub warn_failure_ratio: f64,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            fail_when_all_failed: true,
            warn_failure_ratio: 0.5,
        }
    }
}

/// Verdict of a [`FailurePolicy`] applied to a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunVerdict {
    Healthy,
    /// Failures exceeded the warning ratio; the run still counts as done.
    Degraded,
    /// Every brand failed; likely a systemic model or API problem.
    Failed,
}

impl FailurePolicy {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn evaluate(&self, successful: usize, failed: usize) -> RunVerdict {
        let total = successful + failed;
        if total == 0 {
            return RunVerdict::Healthy;
        }
        if successful == 0 && self.fail_when_all_failed {
            return RunVerdict::Failed;
        }
        if failed as f64 / total as f64 > self.warn_failure_ratio {
            return RunVerdict::Degraded;
        }
        RunVerdict::Healthy
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub openrouter_api_key: Option<String>,
    pub api_base_url: String,
    pub log_level: String,
    pub brands_path: PathBuf,
    pub results_dir: PathBuf,
    pub models_path: PathBuf,
    pub default_model: Option<String>,
    pub request_timeout_secs: u64,
    pub inter_request_delay_ms: u64,
    pub completion_threshold: Option<usize>,
    pub failure_policy: FailurePolicy,
    pub app_title: String,
    pub app_url: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "openrouter_api_key",
                &self.openrouter_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("api_base_url", &self.api_base_url)
            .field("log_level", &self.log_level)
            .field("brands_path", &self.brands_path)
            .field("results_dir", &self.results_dir)
            .field("models_path", &self.models_path)
            .field("default_model", &self.default_model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("completion_threshold", &self.completion_threshold)
            .field("failure_policy", &self.failure_policy)
            .field("app_title", &self.app_title)
            .field("app_url", &self.app_url)
            .finish()
    }
}
