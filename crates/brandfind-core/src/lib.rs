//! Shared types and configuration for brandfind.
//!
//! Holds the per-brand [`BrandResult`] and per-run [`RunRecord`] models, the
//! environment-driven [`AppConfig`], the model catalog, brand list loading,
//! run-file naming, and the [`CompletionStore`] that inspects previously
//! saved runs.

pub mod app_config;
pub mod brands;
pub mod config;
pub mod error;
pub mod filename;
pub mod models;
pub mod record;
pub mod run;
pub mod store;

pub use app_config::{AppConfig, FailurePolicy, RunVerdict};
pub use brands::load_brand_list;
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, StoreError};
pub use filename::{run_filename, sanitize_model_id, RunFileName};
pub use models::{load_model_catalog, ModelCatalog, ModelSpec};
pub use record::{AdditionalInfo, BrandResult, ErrorType, SearchConfidence, TokenUsage};
pub use run::{
    format_success_rate, BrandUsage, RunDescriptor, RunMetadata, RunRecord, RunTokenUsage,
    PARTIAL_STATUS,
};
pub use store::{CompletionStatus, CompletionStore, StoredRun};
