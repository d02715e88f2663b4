//! Gemini generateContent client.

use std::fmt;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::error::GenerateError;
use crate::metrics;

/// Client for the Gemini generateContent endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// API origin, without a trailing slash.
    api_base: String,
    /// Model id placed in the request path.
    model: String,
    /// Credential sent as the `key` query parameter.
    api_key: Option<String>,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl GeminiClient {
    /// Create a client from config.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.upstream_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            api_base: config.gemini_api_base.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            api_key: config.gemini_api_key().map(str::to_string),
        })
    }

    /// Whether a credential is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Get the model id.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }

    /// Forward `payload` verbatim and return the upstream JSON.
    #[instrument(skip(self, payload), fields(model = %self.model))]
    pub async fn generate(&self, payload: &Value) -> Result<Value, GenerateError> {
        let api_key = self.api_key.as_deref().ok_or(GenerateError::MissingApiKey)?;
        let start = Instant::now();

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(payload)
            .send()
            .await;
        metrics::record_generate_latency(start);
        // reqwest errors embed the URL, which carries the key
        let response = response.map_err(|e| GenerateError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| GenerateError::Http(e.without_url()))?;
        debug!("generateContent succeeded");
        Ok(data)
    }
}
