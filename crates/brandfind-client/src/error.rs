use brandfind_core::ErrorType;
use thiserror::Error;

/// Errors returned by the chat-completion request path.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network, timeout, or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// The backend answered 2xx but the completion had no content.
    #[error("model returned no content")]
    EmptyContent,

    /// The response body was not a chat-completion payload.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The client could not be configured.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Map the error onto the persisted failure taxonomy.
    ///
    /// Transport failures are split by inspecting the error and its source
    /// chain: anything that never reached the server is a
    /// `connection_error`, everything else (timeouts included) is a
    /// `network_error`.
    #[must_use]
    pub fn error_type(&self) -> ErrorType {
        match self {
            ClientError::Api { .. } => ErrorType::ApiError,
            ClientError::EmptyContent => ErrorType::ModelError,
            ClientError::Http(e) => classify_transport(e),
            ClientError::Deserialize { .. } | ClientError::Config(_) => ErrorType::UnknownError,
        }
    }
}

const CONNECTION_MARKERS: &[&str] = &[
    "connection refused",
    "connection reset",
    "connection closed",
    "dns error",
    "failed to lookup address",
    "error trying to connect",
    "no route to host",
];

fn classify_transport(err: &reqwest::Error) -> ErrorType {
    if err.is_timeout() {
        return ErrorType::NetworkError;
    }
    if err.is_connect() {
        return ErrorType::ConnectionError;
    }

    let description = describe_chain(err).to_lowercase();
    if CONNECTION_MARKERS.iter().any(|m| description.contains(m)) {
        ErrorType::ConnectionError
    } else {
        ErrorType::NetworkError
    }
}

/// The error message followed by every source message, `: `-separated.
pub(crate) fn describe_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}
