//! Per-brand lookup outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How sure the backend was that `website_url` is the brand's official site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchConfidence {
    High,
    Medium,
    #[default]
    Low,
}

impl SearchConfidence {
    /// Parse a backend-supplied confidence label, ignoring case and padding.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for SearchConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure classification attached to unsuccessful lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Backend answered with a non-2xx status.
    ApiError,
    /// Timeout or other transport failure.
    NetworkError,
    /// Backend answered 2xx but with no content.
    ModelError,
    /// The backend could not be reached at all.
    ConnectionError,
    /// Content was present but held no usable JSON object.
    ParseError,
    UnknownError,
}

impl ErrorType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApiError => "api_error",
            Self::NetworkError => "network_error",
            Self::ModelError => "model_error",
            Self::ConnectionError => "connection_error",
            Self::ParseError => "parse_error",
            Self::UnknownError => "unknown_error",
        }
    }

    /// Errors that point at the model or API being unusable rather than a
    /// single brand being hard to find.
    #[must_use]
    pub fn indicates_unavailable_model(self) -> bool {
        matches!(self, Self::ApiError | Self::ModelError)
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token and cost accounting for one or more backend requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub cost: f64,
}

impl TokenUsage {
    /// Usage accrued between `earlier` and `self`, clamped at zero.
    #[must_use]
    pub fn since(&self, earlier: &TokenUsage) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.prompt_tokens.saturating_sub(earlier.prompt_tokens),
            completion_tokens: self
                .completion_tokens
                .saturating_sub(earlier.completion_tokens),
            total_tokens: self.total_tokens.saturating_sub(earlier.total_tokens),
            cost: (self.cost - earlier.cost).max(0.0),
        }
    }

    pub fn accumulate(&mut self, other: &TokenUsage) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self
            .completion_tokens
            .saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
        self.cost += other.cost.max(0.0);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalInfo {
    #[serde(default)]
    pub founded: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub specialties: Option<String>,
}

/// Outcome of looking up one brand against one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandResult {
    pub brand_name: String,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub additional_info: AdditionalInfo,
    #[serde(default)]
    pub search_confidence: SearchConfidence,
    #[serde(default)]
    pub notes: Option<String>,
    pub model_used: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub raw_response: Option<String>,
    #[serde(default)]
    pub error_type: Option<ErrorType>,
    pub success: bool,
    #[serde(default)]
    pub token_usage: TokenUsage,
}

impl BrandResult {
    /// A failed lookup carrying no structured data.
    #[must_use]
    pub fn failure(
        brand_name: &str,
        model_used: &str,
        error_type: ErrorType,
        notes: String,
        raw_response: Option<String>,
        token_usage: TokenUsage,
    ) -> Self {
        Self {
            brand_name: brand_name.to_owned(),
            website_url: None,
            description: None,
            additional_info: AdditionalInfo::default(),
            search_confidence: SearchConfidence::Low,
            notes: Some(notes),
            model_used: model_used.to_owned(),
            timestamp: Utc::now(),
            raw_response,
            error_type: Some(error_type),
            success: false,
            token_usage,
        }
    }

    /// `true` when the lookup succeeded and produced a website URL; only
    /// these count toward completion of a previous run.
    #[must_use]
    pub fn is_qualifying(&self) -> bool {
        self.success && self.website_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}
