mod html;
mod report;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use brandfind_core::CompletionStore;
use chrono::Utc;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "brandfind-report")]
#[command(about = "Build an HTML comparison of saved brandfind runs")]
struct Cli {
    /// Directory holding brand_websites_*.json run files
    #[arg(long, env = "BRANDFIND_RESULTS_DIR", default_value = "./results")]
    results_dir: PathBuf,

    /// Path of the generated HTML report
    #[arg(long, default_value = "brand_websites_comparison.html")]
    output: PathBuf,
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing();

    let Some(summary) = generate_report(&cli.results_dir, &cli.output)? else {
        eprintln!("error: no run files found in {}", cli.results_dir.display());
        eprintln!("hint: run `brandfind` first or pass --results-dir");
        return Ok(ExitCode::FAILURE);
    };

    report::print_model_stats(&summary.stats);
    println!(
        "\nreport with {} rows from {} run files written to {}",
        summary.rows,
        summary.runs,
        cli.output.display()
    );
    Ok(ExitCode::SUCCESS)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| {
            let level = std::env::var("BRANDFIND_LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());
            tracing_subscriber::EnvFilter::try_new(level)
        })
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct ReportSummary {
    runs: usize,
    rows: usize,
    stats: std::collections::BTreeMap<String, report::ModelStats>,
}

/// Render every readable run in `results_dir` to `output`.
///
/// Returns `None` without writing anything when no run could be loaded.
fn generate_report(results_dir: &Path, output: &Path) -> anyhow::Result<Option<ReportSummary>> {
    let store = CompletionStore::new(results_dir);
    let runs = store.load_all()?;
    if runs.is_empty() {
        return Ok(None);
    }
    tracing::info!(runs = runs.len(), dir = %results_dir.display(), "loaded run files");

    let rows = report::build_rows(&runs);
    let generated_at = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let document = html::render_report(&rows, &generated_at);
    std::fs::write(output, document)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", output.display()))?;

    Ok(Some(ReportSummary {
        runs: runs.len(),
        rows: rows.len(),
        stats: report::model_stats(&rows),
    }))
}
