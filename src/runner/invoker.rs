//! @ai:module:intent Kind-specific request building, timing and failure capture for one call
//! @ai:module:layer application
//! @ai:module:public_api EndpointInvoker, InvocationResult, DocumentSource
//! @ai:module:stateless false

use crate::config::RerankDocuments;
use crate::corpus::{estimate_tokens, Prompt, ReferenceText};
use crate::endpoint::{Endpoint, EndpointKind};
use crate::error::{CorpusError, InvocationError};
use crate::runner::client::InferenceTransport;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// @ai:intent Outcome of one timed invocation; immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResult {
    /// Wall-clock seconds from dispatch to full body consumption or failure.
    pub duration_secs: f64,
    /// Response text on success, typed failure otherwise.
    pub outcome: Result<String, InvocationError>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Duration met or exceeded the configured ceiling.
    pub reached_timeout: bool,
}

impl InvocationResult {
    /// @ai:intent Assemble a result, deriving token estimates from the texts
    /// @ai:post output_tokens == 0 when the call failed
    /// @ai:effects pure
    pub fn new(
        duration: Duration,
        outcome: Result<String, InvocationError>,
        prompt: &str,
        timeout: Duration,
    ) -> Self {
        let output_tokens = match &outcome {
            Ok(text) => estimate_tokens(text),
            Err(_) => 0,
        };

        Self {
            duration_secs: duration.as_secs_f64(),
            input_tokens: estimate_tokens(prompt),
            output_tokens,
            reached_timeout: duration >= timeout,
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn error(&self) -> Option<&InvocationError> {
        self.outcome.as_ref().err()
    }

    pub fn response_text(&self) -> &str {
        self.outcome.as_deref().unwrap_or("")
    }
}

/// @ai:intent Candidate documents paired with the query for rerank endpoints
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Windows {
        reference: Arc<ReferenceText>,
        count: usize,
        window_chars: usize,
    },
    Fixed(Vec<String>),
}

impl DocumentSource {
    /// @ai:intent Resolve the configured source against the loaded reference text
    /// @ai:effects pure
    pub fn from_config(documents: &RerankDocuments, reference: Arc<ReferenceText>) -> Self {
        match documents {
            RerankDocuments::ReferenceWindows {
                count,
                window_chars,
            } => Self::Windows {
                reference,
                count: *count,
                window_chars: *window_chars,
            },
            RerankDocuments::Fixed { documents } => Self::Fixed(documents.clone()),
        }
    }

    /// @ai:intent Fail early when windows cannot be sampled from the reference
    /// @ai:effects pure
    pub fn validate(&self) -> Result<(), CorpusError> {
        match self {
            Self::Windows {
                reference,
                window_chars,
                ..
            } if *window_chars == 0 || reference.char_len() < *window_chars => {
                Err(CorpusError::ReferenceTooShort {
                    len: reference.char_len(),
                    window: *window_chars,
                })
            }
            _ => Ok(()),
        }
    }
}

/// @ai:intent Sends one prompt to one endpoint and returns a timed result
///
/// Failures never escape `invoke`; they are folded into the result.
pub struct EndpointInvoker<T: InferenceTransport> {
    transport: Arc<T>,
    timeout: Duration,
    documents: DocumentSource,
    rng: StdRng,
}

impl<T: InferenceTransport> EndpointInvoker<T> {
    /// @ai:intent Create an invoker with an entropy-seeded sampler
    /// @ai:effects random
    pub fn new(transport: Arc<T>, timeout: Duration, documents: DocumentSource) -> Self {
        Self::with_rng(transport, timeout, documents, StdRng::from_entropy())
    }

    /// @ai:intent Create an invoker with a caller-supplied sampler (for testing)
    /// @ai:effects pure
    pub fn with_rng(
        transport: Arc<T>,
        timeout: Duration,
        documents: DocumentSource,
        rng: StdRng,
    ) -> Self {
        Self {
            transport,
            timeout,
            documents,
            rng,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// @ai:intent Invoke an endpoint once, timing the call and capturing any failure
    /// @ai:post result.duration_secs >= 0 and result is produced for every call
    /// @ai:effects network, random
    pub async fn invoke(&mut self, endpoint: &Endpoint, prompt: &Prompt) -> InvocationResult {
        let payload = self.build_payload(&endpoint.kind, &prompt.text);

        let start = Instant::now();
        let outcome = match payload {
            Ok(body) => self
                .transport
                .invoke_model(&endpoint.id, &body)
                .await
                .and_then(|response| extract_text(&endpoint.kind, &response)),
            Err(e) => Err(e),
        };
        let elapsed = start.elapsed();

        if let Err(ref e) = outcome {
            tracing::error!("Error invoking {}: {}", endpoint.id, e);
        }

        let result = InvocationResult::new(elapsed, outcome, &prompt.text, self.timeout);

        if result.reached_timeout {
            tracing::warn!(
                "Request to {} reached timeout limit of {}s",
                endpoint.id,
                self.timeout.as_secs()
            );
        }

        result
    }

    /// @ai:intent Build the JSON request body for an endpoint kind
    /// @ai:effects random
    pub fn build_payload(&mut self, kind: &EndpointKind, prompt: &str) -> Result<Value, InvocationError> {
        let body = match kind {
            EndpointKind::ChatCompletion { max_tokens } => json!({
                "anthropic_version": "bedrock-2023-05-31",
                "max_tokens": max_tokens,
                "messages": [{ "role": "user", "content": prompt }],
            }),
            EndpointKind::ChatCompletionAlt { max_tokens } => json!({
                "messages": [{ "role": "user", "content": [{ "text": prompt }] }],
                "inferenceConfig": { "max_new_tokens": max_tokens },
            }),
            EndpointKind::Embedding { .. } => json!({ "inputText": prompt }),
            EndpointKind::Rerank {
                top_n, api_version, ..
            } => json!({
                "api_version": api_version,
                "documents": self.rerank_documents()?,
                "query": prompt,
                "top_n": top_n,
            }),
        };

        Ok(body)
    }

    /// @ai:effects random
    fn rerank_documents(&mut self) -> Result<Vec<String>, InvocationError> {
        match &self.documents {
            DocumentSource::Fixed(documents) => Ok(documents.clone()),
            DocumentSource::Windows {
                reference,
                count,
                window_chars,
            } => {
                let windows = reference
                    .sample_windows(&mut self.rng, *count, *window_chars)
                    .map_err(|e| InvocationError::Request(e.to_string()))?;
                Ok(windows.iter().map(|w| w.as_document()).collect())
            }
        }
    }
}

/// @ai:intent Pull the response text out of a kind-specific envelope
/// @ai:effects pure
pub fn extract_text(kind: &EndpointKind, response: &Value) -> Result<String, InvocationError> {
    match kind {
        EndpointKind::ChatCompletion { .. } => string_at(response, "/content/0/text"),
        EndpointKind::ChatCompletionAlt { .. } => {
            string_at(response, "/output/message/content/0/text")
        }
        EndpointKind::Embedding { preview_chars } => {
            field(response, "embedding").map(|v| preview(v, *preview_chars))
        }
        EndpointKind::Rerank { preview_chars, .. } => {
            field(response, "results").map(|v| preview(v, *preview_chars))
        }
    }
}

fn string_at(response: &Value, pointer: &str) -> Result<String, InvocationError> {
    response
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| InvocationError::MalformedResponse(format!("missing string at {}", pointer)))
}

fn field<'a>(response: &'a Value, name: &str) -> Result<&'a Value, InvocationError> {
    response
        .get(name)
        .ok_or_else(|| InvocationError::MalformedResponse(format!("missing field '{}'", name)))
}

/// @ai:intent Truncated textual preview of a structured value
/// @ai:effects pure
fn preview(value: &Value, chars: usize) -> String {
    let rendered = value.to_string();
    let head: String = rendered.chars().take(chars).collect();
    format!("{}...", head)
}
