//! Console summaries of finished and saved runs.

use brandfind_core::{RunRecord, StoredRun};

/// Print the headline statistics and per-brand outcome of one run.
pub(crate) fn print_run_summary(record: &RunRecord) {
    let meta = &record.metadata;
    let usage = &meta.token_usage;

    println!();
    println!("{} ({})", meta.model_name, meta.model_id);
    if record.is_partial() {
        println!("status:       partial (interrupted)");
    }
    println!(
        "processed:    {} (start index {}, requested {})",
        meta.total_brands_processed, meta.start_index, meta.requested_count
    );
    println!(
        "successful:   {} / failed: {} ({})",
        meta.successful_searches, meta.failed_searches, meta.success_rate
    );
    println!("websites:     {}", record.qualifying_count());
    println!("availability: {}", meta.model_availability);
    if !meta.error_breakdown.is_empty() {
        let breakdown: Vec<String> = meta
            .error_breakdown
            .iter()
            .map(|(kind, count)| format!("{kind}={count}"))
            .collect();
        println!("errors:       {}", breakdown.join(", "));
    }
    println!(
        "tokens:       {} (prompt {}, completion {}), cost ${:.4}",
        usage.total_tokens, usage.total_prompt_tokens, usage.total_completion_tokens, usage.total_cost
    );

    println!();
    println!("{:<32} {:<10} WEBSITE", "BRAND", "CONFIDENCE");
    println!("{}", "-".repeat(80));
    for result in &record.results {
        let website = match (&result.website_url, result.error_type) {
            (Some(url), _) => url.clone(),
            (None, Some(error_type)) => format!("({error_type})"),
            (None, None) => "(not found)".to_owned(),
        };
        println!(
            "{:<32} {:<10} {website}",
            truncate(&result.brand_name, 32),
            result.search_confidence
        );
    }
}

/// Print one line per saved run of a model, oldest first.
pub(crate) fn print_run_overview(runs: &[&StoredRun]) {
    println!(
        "{:<58} {:>9} {:>9} {:>8} {:>9}",
        "FILE", "PROCESSED", "SUCCESS", "WEBSITES", "COST"
    );
    println!("{}", "-".repeat(97));
    for run in runs {
        let meta = &run.record.metadata;
        let file = run
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "{:<58} {:>9} {:>9} {:>8} {:>9}",
            truncate(&file, 58),
            meta.total_brands_processed,
            meta.success_rate,
            run.record.qualifying_count(),
            format!("${:.4}", meta.token_usage.total_cost)
        );
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_owned()
    } else {
        let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}
