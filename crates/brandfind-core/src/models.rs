use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A backend model selectable by a short key on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Identifier sent to the backend, e.g. `perplexity/sonar`.
    pub id: String,
    /// Human-readable label for summaries and reports.
    pub name: String,
}

/// Model keys and the key used when none is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub default: String,
    pub models: BTreeMap<String, ModelSpec>,
}

impl ModelCatalog {
    /// Catalog used when no models file exists. All entries are
    /// web-search capable.
    #[must_use]
    pub fn builtin() -> Self {
        let entries = [
            ("sonar", "perplexity/sonar", "Perplexity Sonar"),
            ("sonar-pro", "perplexity/sonar-pro", "Perplexity Sonar Pro"),
            (
                "claude",
                "anthropic/claude-sonnet-4:online",
                "Claude Sonnet 4 (web search)",
            ),
            ("gpt4o", "openai/gpt-4o:online", "GPT-4o (web search)"),
            (
                "gemini",
                "google/gemini-2.5-flash:online",
                "Gemini 2.5 Flash (web search)",
            ),
        ];
        let models = entries
            .into_iter()
            .map(|(key, id, name)| {
                (
                    key.to_owned(),
                    ModelSpec {
                        id: id.to_owned(),
                        name: name.to_owned(),
                    },
                )
            })
            .collect();
        Self {
            default: "sonar".to_owned(),
            models,
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ModelSpec> {
        self.models.get(key)
    }

    /// Comma-separated list of known keys, for error hints.
    #[must_use]
    pub fn keys_display(&self) -> String {
        self.models.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}

/// Load the model catalog from a YAML file, falling back to
/// [`ModelCatalog::builtin`] when the file does not exist.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read, parsed, or
/// fails validation.
pub fn load_model_catalog(path: &Path) -> Result<ModelCatalog, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "model catalog not found; using built-in models");
        return Ok(ModelCatalog::builtin());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ModelsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog: ModelCatalog = serde_yaml::from_str(&content)?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

fn validate_catalog(catalog: &ModelCatalog) -> Result<(), ConfigError> {
    if catalog.models.is_empty() {
        return Err(ConfigError::Validation(
            "model catalog must define at least one model".to_string(),
        ));
    }

    for (key, spec) in &catalog.models {
        if key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "model key must be non-empty".to_string(),
            ));
        }
        if spec.id.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "model '{key}' has an empty id"
            )));
        }
    }

    if !catalog.models.contains_key(&catalog.default) {
        return Err(ConfigError::Validation(format!(
            "default model '{}' is not defined in the catalog",
            catalog.default
        )));
    }

    Ok(())
}
