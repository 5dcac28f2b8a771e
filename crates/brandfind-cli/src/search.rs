//! The `brandfind` search command: pick a model, skip work that an earlier
//! run already covered, run the batch, save it, and map the outcome to an
//! exit code.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use brandfind_client::{BrandFinder, ClientOptions};
use brandfind_core::{
    load_brand_list, load_model_catalog, AppConfig, CompletionStatus, CompletionStore,
    ModelCatalog, RunDescriptor, RunRecord, RunVerdict,
};
use chrono::Utc;

use crate::finder::{Finder, SelectedModel};
use crate::interrupt::{spawn_signal_watcher, RunState};
use crate::runner::{batch_slice, run_batch};
use crate::summary::print_run_summary;

/// Positional arguments and flags of one invocation.
#[derive(Debug, Clone)]
pub(crate) struct SearchArgs {
    pub model_key: Option<String>,
    pub count: usize,
    pub start_index: usize,
    pub force: bool,
    pub show: bool,
}

/// Usage errors detected before any request is made.
#[derive(Debug, thiserror::Error)]
pub(crate) enum SearchError {
    #[error("OPENROUTER_API_KEY is not set")]
    MissingApiKey,

    #[error("unknown model key '{key}'")]
    UnknownModel { key: String, available: String },

    #[error("start index {start} is out of range for a list of {len} brands")]
    StartOutOfRange { start: usize, len: usize },

    #[error("count must be at least 1")]
    ZeroCount,
}

impl SearchError {
    pub(crate) fn hint(&self) -> String {
        match self {
            Self::MissingApiKey => {
                "set OPENROUTER_API_KEY in the environment or a .env file; \
                 use --show to view saved results without it"
                    .to_owned()
            }
            Self::UnknownModel { available, .. } => format!("available models: {available}"),
            Self::StartOutOfRange { len, .. } => {
                format!("choose a start index between 0 and {}", len.saturating_sub(1))
            }
            Self::ZeroCount => "pass a positive brand count, e.g. `brandfind sonar 10`".to_owned(),
        }
    }
}

/// Resolve the model key: explicit argument, then configured default, then
/// the catalog default.
pub(crate) fn select_model(
    catalog: &ModelCatalog,
    requested: Option<&str>,
    configured: Option<&str>,
) -> Result<SelectedModel, SearchError> {
    let key = requested.or(configured).unwrap_or(catalog.default.as_str());
    catalog
        .get(key)
        .map(|spec| SelectedModel {
            key: key.to_owned(),
            spec: spec.clone(),
        })
        .ok_or_else(|| SearchError::UnknownModel {
            key: key.to_owned(),
            available: catalog.keys_display(),
        })
}

fn build_finder(config: &AppConfig, model: SelectedModel) -> anyhow::Result<Finder> {
    let Some(api_key) = config.openrouter_api_key.as_deref() else {
        return Ok(Finder::ReadOnly { model });
    };
    let options = ClientOptions {
        timeout_secs: config.request_timeout_secs,
        app_title: config.app_title.clone(),
        app_url: config.app_url.clone(),
    };
    let client = BrandFinder::with_base_url(api_key, &model.spec.id, &options, &config.api_base_url)?;
    Ok(Finder::Live { client, model })
}

/// How an invocation ended, before it is turned into an exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchOutcome {
    /// `--show` printed saved results.
    Shown,
    /// An earlier run already met the threshold; nothing was searched.
    AlreadyComplete,
    Finished(RunVerdict),
}

impl SearchOutcome {
    pub(crate) fn exit_code(self) -> ExitCode {
        match self {
            Self::Finished(RunVerdict::Failed) => ExitCode::FAILURE,
            _ => ExitCode::SUCCESS,
        }
    }
}

pub(crate) async fn run_search(
    args: &SearchArgs,
    config: &AppConfig,
) -> anyhow::Result<SearchOutcome> {
    let catalog = load_model_catalog(&config.models_path)?;
    let model = select_model(
        &catalog,
        args.model_key.as_deref(),
        config.default_model.as_deref(),
    )?;
    let store = CompletionStore::new(&config.results_dir);

    if args.show {
        let finder = build_finder(config, model)?;
        finder.print_summary(&store)?;
        return Ok(SearchOutcome::Shown);
    }

    if args.count == 0 {
        return Err(SearchError::ZeroCount.into());
    }
    if config.openrouter_api_key.is_none() {
        return Err(SearchError::MissingApiKey.into());
    }

    let brands = load_brand_list(&config.brands_path)?;
    if args.start_index >= brands.len() {
        return Err(SearchError::StartOutOfRange {
            start: args.start_index,
            len: brands.len(),
        }
        .into());
    }

    let finder = build_finder(config, model)?;
    let threshold = config.completion_threshold.unwrap_or(args.count);

    if !args.force {
        match finder.check_completion(&store, threshold) {
            CompletionStatus::Sufficient {
                path,
                qualifying,
                total,
            } => {
                let covered = CompletionStore::load_run(&path)
                    .map(|record| format!(" for {}", covered_slice(&record)))
                    .unwrap_or_default();
                println!(
                    "{} already has {qualifying}/{total} websites{covered} in {} \
                     (threshold {threshold}); pass --force to search again",
                    finder.model().key,
                    path.display()
                );
                finder.print_summary(&store)?;
                return Ok(SearchOutcome::AlreadyComplete);
            }
            CompletionStatus::NoResults { reason } => {
                tracing::info!(%reason, "no sufficient earlier run");
            }
        }
    }

    let Some(client) = finder.client() else {
        return Err(SearchError::MissingApiKey.into());
    };
    let model = finder.model();
    let batch = batch_slice(&brands, args.start_index, args.count);
    println!(
        "searching {} brands (from index {}) with {} ({})",
        batch.len(),
        args.start_index,
        model.spec.name,
        model.spec.id
    );
    tracing::info!(
        model = %model.spec.id,
        start_index = args.start_index,
        count = batch.len(),
        "starting run"
    );

    let descriptor = RunDescriptor {
        model_key: model.key.clone(),
        model_name: model.spec.name.clone(),
        model_id: model.spec.id.clone(),
        start_index: args.start_index,
        requested_count: args.count,
    };
    let state = Arc::new(RunState::new(descriptor.clone(), store.clone()));
    let watcher = spawn_signal_watcher(Arc::clone(&state));

    let delay = Duration::from_millis(config.inter_request_delay_ms);
    let results = run_batch(client, batch, delay, &state).await;

    if !state.begin_finishing() {
        // The watcher saves the partial run and exits the process.
        std::future::pending::<()>().await;
    }

    let record = RunRecord::build(&descriptor, results, false, Utc::now());
    let saved = store.save_run(&record);
    watcher.abort();
    let path = saved?;
    print_run_summary(&record);
    println!("\nresults saved to {}", path.display());

    let meta = &record.metadata;
    let verdict = config
        .failure_policy
        .evaluate(meta.successful_searches, meta.failed_searches);
    report_verdict(verdict, &record);
    Ok(SearchOutcome::Finished(verdict))
}

/// The brand indices an earlier run covered, as `brands <start>..<end>`.
fn covered_slice(record: &RunRecord) -> String {
    let meta = &record.metadata;
    let end = meta.start_index + meta.total_brands_processed;
    format!("brands {}..{end}", meta.start_index)
}

fn report_verdict(verdict: RunVerdict, record: &RunRecord) {
    let meta = &record.metadata;
    match verdict {
        RunVerdict::Healthy => {}
        RunVerdict::Degraded => {
            eprintln!(
                "warning: {} of {} searches failed; check the model and API status",
                meta.failed_searches, meta.total_brands_processed
            );
        }
        RunVerdict::Failed => {
            eprintln!(
                "error: all {} searches failed (model availability: {})",
                meta.total_brands_processed, meta.model_availability
            );
            eprintln!("hint: verify the model id and your OpenRouter credits, then retry");
        }
    }
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
