//! @ai:module:intent Endpoint descriptors and request-shape classification
//! @ai:module:layer domain
//! @ai:module:public_api Endpoint, EndpointKind, EndpointFamily, EndpointPlan
//! @ai:module:stateless true

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Output cap sent to both chat-completion families.
pub const MAX_OUTPUT_TOKENS: u32 = 1000;

/// Characters of an embedding or rerank response kept as preview text.
pub const PREVIEW_CHARS: usize = 100;

pub const RERANK_TOP_N: u32 = 3;
pub const RERANK_API_VERSION: u32 = 2;

/// @ai:intent Request/response shape family as named in configuration
/// @ai:effects pure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointFamily {
    ChatCompletion,
    ChatCompletionAlt,
    Embedding,
    Rerank,
}

impl EndpointFamily {
    /// @ai:intent Infer the family from substrings of an endpoint id
    /// @ai:effects pure
    pub fn infer(id: &str) -> Option<Self> {
        let id = id.to_ascii_lowercase();

        if id.contains("rerank") {
            Some(Self::Rerank)
        } else if id.contains("embed") {
            Some(Self::Embedding)
        } else if id.contains("claude") || id.contains("anthropic") {
            Some(Self::ChatCompletion)
        } else if id.contains("nova") {
            Some(Self::ChatCompletionAlt)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChatCompletion => "chat_completion",
            Self::ChatCompletionAlt => "chat_completion_alt",
            Self::Embedding => "embedding",
            Self::Rerank => "rerank",
        }
    }
}

impl std::fmt::Display for EndpointFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Resolved request shape with its kind-specific parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Anthropic messages shape.
    ChatCompletion { max_tokens: u32 },
    /// Nova messages shape with content blocks.
    ChatCompletionAlt { max_tokens: u32 },
    Embedding { preview_chars: usize },
    Rerank {
        top_n: u32,
        api_version: u32,
        preview_chars: usize,
    },
}

impl From<EndpointFamily> for EndpointKind {
    fn from(family: EndpointFamily) -> Self {
        match family {
            EndpointFamily::ChatCompletion => Self::ChatCompletion {
                max_tokens: MAX_OUTPUT_TOKENS,
            },
            EndpointFamily::ChatCompletionAlt => Self::ChatCompletionAlt {
                max_tokens: MAX_OUTPUT_TOKENS,
            },
            EndpointFamily::Embedding => Self::Embedding {
                preview_chars: PREVIEW_CHARS,
            },
            EndpointFamily::Rerank => Self::Rerank {
                top_n: RERANK_TOP_N,
                api_version: RERANK_API_VERSION,
                preview_chars: PREVIEW_CHARS,
            },
        }
    }
}

impl EndpointKind {
    /// @ai:intent Map back to the configuration-facing family
    /// @ai:effects pure
    pub fn family(&self) -> EndpointFamily {
        match self {
            Self::ChatCompletion { .. } => EndpointFamily::ChatCompletion,
            Self::ChatCompletionAlt { .. } => EndpointFamily::ChatCompletionAlt,
            Self::Embedding { .. } => EndpointFamily::Embedding,
            Self::Rerank { .. } => EndpointFamily::Rerank,
        }
    }
}

/// @ai:intent Immutable endpoint descriptor, classified once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub id: String,
    pub kind: EndpointKind,
}

impl Endpoint {
    /// @ai:intent Build a descriptor, preferring an explicit family over inference
    /// @ai:pre id is non-empty
    /// @ai:effects pure
    pub fn classify(id: &str, explicit: Option<EndpointFamily>) -> Result<Self, ConfigError> {
        let family = explicit
            .or_else(|| EndpointFamily::infer(id))
            .ok_or_else(|| ConfigError::UnknownKind(id.to_string()))?;

        Ok(Self {
            id: id.to_string(),
            kind: family.into(),
        })
    }

    pub fn short_name(&self) -> &str {
        short_name(&self.id)
    }
}

/// @ai:intent Short display name: the second dot-separated segment of an id
/// @ai:effects pure
pub fn short_name(id: &str) -> &str {
    id.split('.').nth(1).unwrap_or(id)
}

/// @ai:intent An endpoint together with its regular iteration count per prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPlan {
    pub endpoint: Endpoint,
    /// Zero skips the endpoint entirely.
    pub iterations: u32,
}

impl EndpointPlan {
    pub fn is_enabled(&self) -> bool {
        self.iterations > 0
    }
}
