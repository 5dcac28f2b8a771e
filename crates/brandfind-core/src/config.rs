use crate::app_config::{AppConfig, FailurePolicy};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars;
/// a missing or unreadable `.env` is not an error.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The credential is optional here: `--show` runs without one, so the CLI
/// decides whether its absence is fatal.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match optional(var) {
            None => Ok(default),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
            },
        }
    };

    let openrouter_api_key = optional("OPENROUTER_API_KEY");
    let api_base_url = or_default("BRANDFIND_API_BASE_URL", "https://openrouter.ai/api/v1");
    let log_level = or_default("BRANDFIND_LOG_LEVEL", "info");
    let brands_path = PathBuf::from(or_default("BRANDFIND_BRANDS_PATH", "./brands.json"));
    let results_dir = PathBuf::from(or_default("BRANDFIND_RESULTS_DIR", "./results"));
    let models_path = PathBuf::from(or_default("BRANDFIND_MODELS_PATH", "./config/models.yaml"));
    let default_model = optional("BRANDFIND_DEFAULT_MODEL");

    let request_timeout_secs = parse_u64("BRANDFIND_REQUEST_TIMEOUT_SECS", "60")?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "BRANDFIND_REQUEST_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    let inter_request_delay_ms = parse_u64("BRANDFIND_INTER_REQUEST_DELAY_MS", "1000")?;

    let completion_threshold = match optional("BRANDFIND_COMPLETION_THRESHOLD") {
        None => None,
        Some(raw) => Some(
            raw.trim()
                .parse::<usize>()
                .map_err(|e| invalid("BRANDFIND_COMPLETION_THRESHOLD", e.to_string()))?,
        ),
    };

    let fail_when_all_failed = parse_bool("BRANDFIND_FAIL_WHEN_ALL_FAILED", true)?;
    let warn_failure_ratio = {
        let var = "BRANDFIND_WARN_FAILURE_RATIO";
        let ratio = or_default(var, "0.5")
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(invalid(var, format!("{ratio} is outside 0.0..=1.0")));
        }
        ratio
    };

    let app_title = or_default("BRANDFIND_APP_TITLE", "brandfind");
    let app_url = or_default("BRANDFIND_APP_URL", "https://github.com/brandfind/brandfind");

    Ok(AppConfig {
        openrouter_api_key,
        api_base_url,
        log_level,
        brands_path,
        results_dir,
        models_path,
        default_model,
        request_timeout_secs,
        inter_request_delay_ms,
        completion_threshold,
        failure_policy: FailurePolicy {
            fail_when_all_failed,
            warn_failure_ratio,
        },
        app_title,
        app_url,
    })
}
