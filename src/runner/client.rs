//! @ai:module:intent Inference runtime transport for benchmark calls
//! @ai:module:layer infrastructure
//! @ai:module:public_api InferenceTransport, RuntimeClient, MockTransport
//! @ai:module:stateless false

use crate::config::ApiConfig;
use crate::error::InvocationError;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// @ai:intent Trait for sending one JSON payload to one model endpoint
#[allow(async_fn_in_trait)]
pub trait InferenceTransport: Send + Sync {
    /// @ai:intent Send a payload and return the fully-read, decoded response body
    async fn invoke_model(&self, model_id: &str, body: &Value) -> Result<Value, InvocationError>;
}

/// @ai:intent HTTP client for the runtime `InvokeModel` API
///
/// Connect and per-read timeouts are both set to the configured ceiling; there
/// is no overall request deadline and no retries are attempted.
pub struct RuntimeClient {
    client: reqwest::Client,
    base_url: reqwest::Url,
    api_key: String,
}

impl RuntimeClient {
    /// @ai:intent Create a client from API configuration
    /// @ai:pre the configured API key environment variable is set
    /// @ai:effects env
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .with_context(|| format!("{} not set in environment", config.api_key_env))?;

        Self::with_api_key(config, api_key)
    }

    /// @ai:intent Create a client with an explicit key (for testing and proxies)
    /// @ai:effects pure
    pub fn with_api_key(config: &ApiConfig, api_key: String) -> Result<Self> {
        let timeout = config.timeout();

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = reqwest::Url::parse(&config.base_url())
            .with_context(|| format!("Invalid runtime URL: {}", config.base_url()))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// @ai:intent Build `{base}/model/{id}/invoke` with the id as one encoded segment
    /// @ai:effects pure
    pub fn invoke_url(&self, model_id: &str) -> Result<reqwest::Url, InvocationError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| InvocationError::Request(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(["model", model_id, "invoke"]);
        Ok(url)
    }
}

impl InferenceTransport for RuntimeClient {
    /// @ai:effects network
    async fn invoke_model(&self, model_id: &str, body: &Value) -> Result<Value, InvocationError> {
        let url = self.invoke_url(model_id)?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(InvocationError::from_reqwest)?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(InvocationError::from_reqwest)?;

        if !status.is_success() {
            return Err(InvocationError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| InvocationError::MalformedResponse(e.to_string()))
    }
}

/// @ai:intent Offline transport with scripted replies, used for dry runs and tests
///
/// Scripted replies are consumed in order; once exhausted every call gets a
/// response body that satisfies all four request shapes.
pub struct MockTransport {
    script: Mutex<VecDeque<Result<Value, InvocationError>>>,
    calls: Mutex<Vec<(String, Value)>>,
    latency: Duration,
}

impl MockTransport {
    /// @ai:intent Create a mock that always returns the universal reply
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    /// @ai:intent Create a mock that returns the given replies first
    /// @ai:effects pure
    pub fn scripted(replies: Vec<Result<Value, InvocationError>>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            ..Self::new()
        }
    }

    /// @ai:intent Simulate per-call latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// @ai:intent Reply body understood by every endpoint kind
    /// @ai:effects pure
    pub fn universal_reply() -> Value {
        let text = "This is a simulated completion used for offline runs.";
        json!({
            "content": [{ "type": "text", "text": text }],
            "output": { "message": { "role": "assistant", "content": [{ "text": text }] } },
            "embedding": [0.0125, -0.0431, 0.0872, 0.0019, -0.0563, 0.0301, 0.0744, -0.0208],
            "results": [
                { "index": 2, "relevance_score": 0.91 },
                { "index": 0, "relevance_score": 0.47 },
                { "index": 4, "relevance_score": 0.12 }
            ]
        })
    }

    /// @ai:intent Model ids and payloads received so far
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceTransport for MockTransport {
    /// @ai:effects time
    async fn invoke_model(&self, model_id: &str, body: &Value) -> Result<Value, InvocationError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((model_id.to_string(), body.clone()));
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        next.unwrap_or_else(|| Ok(Self::universal_reply()))
    }
}
