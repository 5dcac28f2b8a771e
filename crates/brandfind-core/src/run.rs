//! The persisted record of one batch run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{BrandResult, ErrorType, TokenUsage};

/// `status` value stamped on runs saved early because of a signal.
pub const PARTIAL_STATUS: &str = "PARTIAL_RESULTS_DUE_TO_INTERRUPTION";

const AVAILABILITY_WORKING: &str = "working";
const AVAILABILITY_ISSUES: &str = "issues_detected";

/// Identifies which model and which slice of the brand list a run covered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDescriptor {
    pub model_key: String,
    pub model_name: String,
    pub model_id: String,
    pub start_index: usize,
    pub requested_count: usize,
}

/// Usage attributed to a single brand, in processing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandUsage {
    pub brand_name: String,
    #[serde(flatten)]
    pub usage: TokenUsage,
}

/// Aggregate token accounting for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTokenUsage {
    #[serde(default)]
    pub total_prompt_tokens: u64,
    #[serde(default)]
    pub total_completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub average_tokens_per_request: f64,
    #[serde(default)]
    pub average_cost_per_request: f64,
    #[serde(default)]
    pub per_brand: Vec<BrandUsage>,
}

impl RunTokenUsage {
    #[allow(clippy::cast_precision_loss)]
    fn from_results(results: &[BrandResult]) -> Self {
        let mut totals = TokenUsage::default();
        let mut per_brand = Vec::with_capacity(results.len());
        for result in results {
            totals.accumulate(&result.token_usage);
            per_brand.push(BrandUsage {
                brand_name: result.brand_name.clone(),
                usage: result.token_usage,
            });
        }

        let requests = results.len();
        let (average_tokens_per_request, average_cost_per_request) = if requests == 0 {
            (0.0, 0.0)
        } else {
            (
                totals.total_tokens as f64 / requests as f64,
                totals.cost / requests as f64,
            )
        };

        Self {
            total_prompt_tokens: totals.prompt_tokens,
            total_completion_tokens: totals.completion_tokens,
            total_tokens: totals.total_tokens,
            total_cost: totals.cost,
            average_tokens_per_request,
            average_cost_per_request,
            per_brand,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    #[serde(default)]
    pub model_key: String,
    #[serde(default)]
    pub model_name: String,
    pub model_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub requested_count: usize,
    pub total_brands_processed: usize,
    pub successful_searches: usize,
    pub failed_searches: usize,
    pub success_rate: String,
    #[serde(default)]
    pub error_breakdown: BTreeMap<ErrorType, usize>,
    #[serde(default)]
    pub model_availability: String,
    #[serde(default)]
    pub token_usage: RunTokenUsage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Metadata plus every per-brand result of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub metadata: RunMetadata,
    pub results: Vec<BrandResult>,
}

impl RunRecord {
    /// Build a run record, deriving every statistic from `results`.
    ///
    /// `partial` marks the record as saved because of an interruption.
    #[must_use]
    pub fn build(
        descriptor: &RunDescriptor,
        results: Vec<BrandResult>,
        partial: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let total = results.len();
        let successful = results.iter().filter(|r| r.success).count();
        let failed = total - successful;

        let mut error_breakdown: BTreeMap<ErrorType, usize> = BTreeMap::new();
        for error_type in results.iter().filter_map(|r| r.error_type) {
            *error_breakdown.entry(error_type).or_default() += 1;
        }

        let model_availability = if error_breakdown
            .keys()
            .any(|e| e.indicates_unavailable_model())
        {
            AVAILABILITY_ISSUES
        } else {
            AVAILABILITY_WORKING
        };

        let metadata = RunMetadata {
            model_key: descriptor.model_key.clone(),
            model_name: descriptor.model_name.clone(),
            model_id: descriptor.model_id.clone(),
            timestamp,
            start_index: descriptor.start_index,
            requested_count: descriptor.requested_count,
            total_brands_processed: total,
            successful_searches: successful,
            failed_searches: failed,
            success_rate: format_success_rate(successful, total),
            error_breakdown,
            model_availability: model_availability.to_owned(),
            token_usage: RunTokenUsage::from_results(&results),
            status: partial.then(|| PARTIAL_STATUS.to_owned()),
        };

        Self { metadata, results }
    }

    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.metadata.status.as_deref() == Some(PARTIAL_STATUS)
    }

    /// Results that succeeded and carry a website URL.
    #[must_use]
    pub fn qualifying_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_qualifying()).count()
    }
}

/// `successful / total` as a percentage with one decimal, e.g. `"50.0%"`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_success_rate(successful: usize, total: usize) -> String {
    if total == 0 {
        return "0.0%".to_owned();
    }
    format!("{:.1}%", successful as f64 * 100.0 / total as f64)
}
