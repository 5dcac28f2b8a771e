use thiserror::Error;

/// Errors raised while loading configuration, the model catalog, or the
/// brand list. All of these are fatal to a run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read brand list {path}: {source}")]
    BrandsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse brand list {path}: {source}")]
    BrandsFileParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read model catalog {path}: {source}")]
    ModelsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model catalog: {0}")]
    ModelsFileParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Errors raised by the on-disk run store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error for {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
