//! Flattening saved runs into report rows and per-model statistics.

use std::collections::BTreeMap;

use brandfind_core::{ErrorType, SearchConfidence, StoredRun};

/// One brand lookup, tagged with the run it came from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BrandRow {
    pub model_id: String,
    pub model_name: String,
    pub file: String,
    pub brand: String,
    pub website: Option<String>,
    pub confidence: SearchConfidence,
    pub description: Option<String>,
    pub founded: Option<String>,
    pub location: Option<String>,
    pub specialties: Option<String>,
    pub notes: Option<String>,
    pub error_type: Option<ErrorType>,
    pub tokens: u64,
    pub cost: f64,
}

/// Aggregate line for one run file.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RunSummaryRow {
    pub model_id: String,
    pub model_name: String,
    pub file: String,
    pub brands: usize,
    pub found: usize,
    pub success_rate: String,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ReportRow {
    Brand(BrandRow),
    Summary(RunSummaryRow),
}

/// Every result of every run, each run followed by its summary row.
pub(crate) fn build_rows(runs: &[StoredRun]) -> Vec<ReportRow> {
    let mut rows = Vec::new();
    for run in runs {
        let meta = &run.record.metadata;
        let file = run
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        for result in &run.record.results {
            rows.push(ReportRow::Brand(BrandRow {
                model_id: meta.model_id.clone(),
                model_name: meta.model_name.clone(),
                file: file.clone(),
                brand: result.brand_name.clone(),
                website: result.website_url.clone(),
                confidence: result.search_confidence,
                description: result.description.clone(),
                founded: result.additional_info.founded.clone(),
                location: result.additional_info.location.clone(),
                specialties: result.additional_info.specialties.clone(),
                notes: result.notes.clone(),
                error_type: result.error_type,
                tokens: result.token_usage.total_tokens,
                cost: result.token_usage.cost,
            }));
        }

        rows.push(ReportRow::Summary(RunSummaryRow {
            model_id: meta.model_id.clone(),
            model_name: meta.model_name.clone(),
            file,
            brands: run.record.results.len(),
            found: run.record.results.iter().filter(|r| r.website_url.is_some()).count(),
            success_rate: meta.success_rate.clone(),
            total_tokens: meta.token_usage.total_tokens,
            total_cost: meta.token_usage.total_cost,
            partial: run.record.is_partial(),
        }));
    }
    rows
}

/// Per-model totals across every run of that model.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ModelStats {
    pub runs: usize,
    pub brands: usize,
    pub found: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total_tokens: u64,
    pub total_cost: f64,
}

impl ModelStats {
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn found_rate(&self) -> f64 {
        if self.brands == 0 {
            0.0
        } else {
            self.found as f64 * 100.0 / self.brands as f64
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn average_cost_per_brand(&self) -> f64 {
        if self.brands == 0 {
            0.0
        } else {
            self.total_cost / self.brands as f64
        }
    }
}

/// Statistics keyed by model id.
pub(crate) fn model_stats(rows: &[ReportRow]) -> BTreeMap<String, ModelStats> {
    let mut stats: BTreeMap<String, ModelStats> = BTreeMap::new();
    for row in rows {
        match row {
            ReportRow::Brand(brand) => {
                let entry = stats.entry(brand.model_id.clone()).or_default();
                entry.brands += 1;
                if brand.website.is_some() {
                    entry.found += 1;
                }
                match brand.confidence {
                    SearchConfidence::High => entry.high += 1,
                    SearchConfidence::Medium => entry.medium += 1,
                    SearchConfidence::Low => entry.low += 1,
                }
            }
            ReportRow::Summary(summary) => {
                let entry = stats.entry(summary.model_id.clone()).or_default();
                entry.runs += 1;
                entry.total_tokens += summary.total_tokens;
                entry.total_cost += summary.total_cost;
            }
        }
    }
    stats
}

pub(crate) fn print_model_stats(stats: &BTreeMap<String, ModelStats>) {
    println!(
        "{:<36} {:>5} {:>7} {:>8} {:>5} {:>6} {:>5} {:>10} {:>10} {:>11}",
        "MODEL", "RUNS", "BRANDS", "FOUND", "HIGH", "MEDIUM", "LOW", "TOKENS", "COST", "COST/BRAND"
    );
    println!("{}", "-".repeat(112));
    for (model_id, s) in stats {
        println!(
            "{:<36} {:>5} {:>7} {:>7.1}% {:>5} {:>6} {:>5} {:>10} {:>10} {:>11}",
            model_id,
            s.runs,
            s.brands,
            s.found_rate(),
            s.high,
            s.medium,
            s.low,
            s.total_tokens,
            format!("${:.4}", s.total_cost),
            format!("${:.5}", s.average_cost_per_brand()),
        );
    }
}
