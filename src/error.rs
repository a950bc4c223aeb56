//! @ai:module:intent Define typed failure reasons for the benchmark system
//! @ai:module:layer domain
//! @ai:module:public_api InvocationError, CorpusError, ConfigError, Interrupted
//! @ai:module:stateless true

use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Reason a single endpoint invocation failed
///
/// Carried inside an invocation result; never propagated past the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvocationError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("could not build request: {0}")]
    Request(String),
}

impl InvocationError {
    /// @ai:intent Classify a reqwest error into a failure reason
    /// @ai:effects pure
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// @ai:intent Failures while loading the question corpus and reference text
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Reference text has {len} characters, fewer than the {window} needed per document window")]
    ReferenceTooShort { len: usize, window: usize },
}

/// @ai:intent Fatal configuration problems detected before any call is made
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot infer endpoint kind from id '{0}'; set `kind` explicitly")]
    UnknownKind(String),

    #[error("Invalid iteration override '{0}', expected <endpoint-id>=<count>")]
    InvalidOverride(String),

    #[error("Iteration override names unknown endpoint '{0}'")]
    UnknownEndpoint(String),
}

/// @ai:intent The operator pressed Ctrl-C while the terminal was in raw mode
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("interrupted from the keyboard")]
pub struct Interrupted;
