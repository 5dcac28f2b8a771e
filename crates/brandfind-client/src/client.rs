//! HTTP client for the OpenRouter chat-completion API.
//!
//! Wraps `reqwest` with bearer authentication, OpenRouter identification
//! headers, a fixed per-request timeout, and running usage accounting. One
//! [`BrandFinder`] is bound to one model.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use brandfind_core::{BrandResult, TokenUsage};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};

use crate::error::{describe_chain, ClientError};
use crate::extract::{fallback_description, parse_brand_payload};
use crate::prompt::build_messages;
use crate::types::{ChatRequest, ChatResponse, UsageRequest};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 1000;

/// Transport settings shared by every request.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout_secs: u64,
    /// Sent as `X-Title`.
    pub app_title: String,
    /// Sent as `HTTP-Referer`.
    pub app_url: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            app_title: "brandfind".to_owned(),
            app_url: "https://github.com/brandfind/brandfind".to_owned(),
        }
    }
}

/// Looks up brand websites with one model.
///
/// Use [`BrandFinder::new`] for production or [`BrandFinder::with_base_url`]
/// to point at a mock server in tests.
pub struct BrandFinder {
    client: Client,
    endpoint: Url,
    model_id: String,
    totals: Mutex<TokenUsage>,
    requests: AtomicU64,
}

impl BrandFinder {
    /// Creates a finder pointed at the production OpenRouter API.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the API key or identification
    /// headers are not valid header values, or [`ClientError::Http`] if the
    /// underlying `reqwest::Client` cannot be constructed.
    pub fn new(api_key: &str, model_id: &str, options: &ClientOptions) -> Result<Self, ClientError> {
        Self::with_base_url(api_key, model_id, options, DEFAULT_BASE_URL)
    }

    /// Creates a finder with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`BrandFinder::new`], plus [`ClientError::Config`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        model_id: &str,
        options: &ClientOptions,
        base_url: &str,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .default_headers(default_headers(api_key, options)?)
            .build()?;

        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| ClientError::Config(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            endpoint,
            model_id: model_id.to_owned(),
            totals: Mutex::new(TokenUsage::default()),
            requests: AtomicU64::new(0),
        })
    }

    /// Cumulative usage over every request this finder has made.
    #[must_use]
    pub fn usage_totals(&self) -> TokenUsage {
        *self.totals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of requests sent so far, failed ones included.
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Look up `brand` and return exactly one result.
    ///
    /// Never fails: API, transport, empty-content and parse problems all
    /// come back as a result with `success = false` and an `error_type`.
    /// `token_usage` is the usage attributable to this call alone.
    pub async fn find_brand(&self, brand: &str) -> BrandResult {
        let before = self.usage_totals();
        let outcome = self.complete(brand).await;
        let usage = self.usage_totals().since(&before);

        match outcome {
            Ok(content) => self.result_from_content(brand, content, usage),
            Err(err) => {
                let error_type = err.error_type();
                let notes = match &err {
                    ClientError::Http(e) => describe_chain(e),
                    other => other.to_string(),
                };
                tracing::warn!(
                    brand,
                    model = %self.model_id,
                    error_type = %error_type,
                    error = %notes,
                    "brand lookup failed"
                );
                BrandResult::failure(brand, &self.model_id, error_type, notes, None, usage)
            }
        }
    }

    fn result_from_content(&self, brand: &str, content: String, usage: TokenUsage) -> BrandResult {
        match parse_brand_payload(&content) {
            Ok(payload) => {
                tracing::debug!(
                    brand,
                    website = payload.website_url.as_deref().unwrap_or("-"),
                    confidence = %payload.search_confidence,
                    "brand lookup parsed"
                );
                BrandResult {
                    brand_name: brand.to_owned(),
                    website_url: payload.website_url,
                    description: payload.description,
                    additional_info: payload.additional_info,
                    search_confidence: payload.search_confidence,
                    notes: payload.notes,
                    model_used: self.model_id.clone(),
                    timestamp: Utc::now(),
                    raw_response: Some(content),
                    error_type: None,
                    success: true,
                    token_usage: usage,
                }
            }
            Err(reason) => {
                tracing::warn!(brand, model = %self.model_id, reason = %reason, "could not parse model answer");
                let mut result = BrandResult::failure(
                    brand,
                    &self.model_id,
                    brandfind_core::ErrorType::ParseError,
                    format!("Failed to parse JSON response: {reason}"),
                    None,
                    usage,
                );
                result.description = Some(fallback_description(&content));
                result.raw_response = Some(content);
                result
            }
        }
    }

    /// Sends one chat-completion request and returns the first choice's
    /// content.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure or timeout.
    /// - [`ClientError::Api`] on a non-2xx status.
    /// - [`ClientError::Deserialize`] if the body is not a chat completion.
    /// - [`ClientError::EmptyContent`] if the completion has no text.
    async fn complete(&self, brand: &str) -> Result<String, ClientError> {
        let request = ChatRequest {
            model: self.model_id.clone(),
            messages: build_messages(brand),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            usage: UsageRequest { include: true },
        };

        tracing::debug!(brand, model = %self.model_id, "sending chat completion request");
        self.requests.fetch_add(1, Ordering::Relaxed);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
                context: format!("chat completion for {brand}"),
                source: e,
            })?;

        if let Some(usage) = &parsed.usage {
            self.record_usage(&TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
                cost: usage.cost,
            });
        }

        parsed
            .first_content()
            .map(str::to_owned)
            .ok_or(ClientError::EmptyContent)
    }

    fn record_usage(&self, usage: &TokenUsage) {
        self.totals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .accumulate(usage);
    }
}

fn default_headers(api_key: &str, options: &ClientOptions) -> Result<HeaderMap, ClientError> {
    let header = |name: &str, value: &str| {
        HeaderValue::from_str(value)
            .map_err(|e| ClientError::Config(format!("invalid {name} header value: {e}")))
    };

    let mut headers = HeaderMap::new();
    let mut auth = header("Authorization", &format!("Bearer {api_key}"))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert("http-referer", header("HTTP-Referer", &options.app_url)?);
    headers.insert("x-title", header("X-Title", &options.app_title)?);
    Ok(headers)
}
