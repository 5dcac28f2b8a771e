mod finder;
mod interrupt;
mod runner;
mod search;
mod summary;

use std::process::ExitCode;

use brandfind_core::ConfigError;
use clap::Parser;

use crate::search::{run_search, SearchArgs, SearchError};

#[derive(Debug, Parser)]
#[command(name = "brandfind")]
#[command(about = "Find official brand websites with web-search capable LLMs")]
struct Cli {
    /// Model key from the catalog (defaults to the configured model)
    model_key: Option<String>,

    /// Number of brands to process
    #[arg(default_value_t = 10)]
    count: usize,

    /// Zero-based position of the first brand in the list
    #[arg(default_value_t = 0)]
    start_index: usize,

    /// Search even if an earlier run already found enough websites
    #[arg(short, long)]
    force: bool,

    /// Print saved results for the model and exit
    #[arg(short, long)]
    show: bool,
}

impl From<Cli> for SearchArgs {
    fn from(cli: Cli) -> Self {
        Self {
            model_key: cli.model_key,
            count: cli.count,
            start_index: cli.start_index,
            force: cli.force,
            show: cli.show,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = brandfind_core::load_app_config();
    init_tracing(config.as_ref().map_or("info", |c| c.log_level.as_str()));

    let config = match config {
        Ok(config) => config,
        Err(e) => return fail(&anyhow::Error::from(e)),
    };
    tracing::debug!(?config, "configuration loaded");

    match run_search(&SearchArgs::from(cli), &config).await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => fail(&e),
    }
}

fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(error: &anyhow::Error) -> ExitCode {
    tracing::error!(error = %format!("{error:#}"), "brandfind failed");
    eprintln!("error: {error:#}");
    if let Some(hint) = remediation_hint(error) {
        eprintln!("hint: {hint}");
    }
    ExitCode::FAILURE
}

fn remediation_hint(error: &anyhow::Error) -> Option<String> {
    if let Some(e) = error.downcast_ref::<SearchError>() {
        return Some(e.hint());
    }
    match error.downcast_ref::<ConfigError>()? {
        ConfigError::InvalidEnvVar { var, .. } => {
            Some(format!("check {var} in the environment or .env file"))
        }
        ConfigError::BrandsFileIo { path, .. } | ConfigError::BrandsFileParse { path, .. } => {
            Some(format!(
                "{path} must be a JSON array of unique, non-empty brand names \
                 (set BRANDFIND_BRANDS_PATH to use another file)"
            ))
        }
        ConfigError::ModelsFileIo { .. } | ConfigError::ModelsFileParse(_) => Some(
            "fix the model catalog YAML or remove it to use the built-in models".to_owned(),
        ),
        ConfigError::Validation(_) => None,
    }
}
