//! @ai:module:intent Configuration structs for the inference benchmark
//! @ai:module:layer infrastructure
//! @ai:module:public_api BenchmarkConfig, ApiConfig, RunConfig, PathConfig, EndpointConfig, RerankDocuments
//! @ai:module:stateless true

use crate::endpoint::{Endpoint, EndpointFamily, EndpointPlan};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// @ai:intent Main configuration for the benchmark system
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub paths: PathConfig,
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<EndpointConfig>,
}

/// @ai:intent Transport configuration shared by every call
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_region")]
    pub region: String,
    /// Overrides the regional runtime URL, e.g. for a proxy or a local stub.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// @ai:intent Run configuration for benchmark execution
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default)]
    pub interactive_extension: bool,
    #[serde(default = "default_extension_key")]
    pub extension_key: char,
    #[serde(default)]
    pub rerank_documents: RerankDocuments,
}

/// @ai:intent Where rerank candidate documents come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RerankDocuments {
    /// Random fixed-length windows of the reference text, resampled per call.
    ReferenceWindows { count: usize, window_chars: usize },
    Fixed { documents: Vec<String> },
}

/// @ai:intent Path configuration for inputs and outputs
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    #[serde(default = "default_questions_file")]
    pub questions_file: PathBuf,
    #[serde(default = "default_reference_file")]
    pub reference_file: PathBuf,
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default = "default_graphs_dir")]
    pub graphs_dir: PathBuf,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

/// @ai:intent One configured endpoint and its iteration count
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub id: String,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EndpointFamily>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            run: RunConfig::default(),
            paths: PathConfig::default(),
            endpoints: default_endpoints(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint_url: None,
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            interactive_extension: false,
            extension_key: default_extension_key(),
            rerank_documents: RerankDocuments::default(),
        }
    }
}

impl Default for RerankDocuments {
    fn default() -> Self {
        Self::ReferenceWindows {
            count: 5,
            window_chars: 1000,
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            questions_file: default_questions_file(),
            reference_file: default_reference_file(),
            results_dir: default_results_dir(),
            graphs_dir: default_graphs_dir(),
            log_file: default_log_file(),
        }
    }
}

fn default_region() -> String {
    "eu-west-1".to_string()
}

pub(crate) fn default_timeout_secs() -> u64 {
    30
}

fn default_api_key_env() -> String {
    "AWS_BEARER_TOKEN_BEDROCK".to_string()
}

fn default_cooldown_ms() -> u64 {
    1000
}

fn default_extension_key() -> char {
    'e'
}

fn default_iterations() -> u32 {
    1
}

fn default_questions_file() -> PathBuf {
    PathBuf::from("questions.txt")
}

fn default_reference_file() -> PathBuf {
    PathBuf::from("bible.txt")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_graphs_dir() -> PathBuf {
    PathBuf::from("graphs")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("model_benchmark.log")
}

fn default_endpoints() -> Vec<EndpointConfig> {
    [
        "eu.anthropic.claude-3-7-sonnet-20250219-v1:0",
        "eu.amazon.nova-lite-v1:0",
        "amazon.titan-embed-text-v2:0",
        "cohere.rerank-v3-5:0",
    ]
    .into_iter()
    .map(|id| EndpointConfig {
        id: id.to_string(),
        iterations: default_iterations(),
        kind: None,
    })
    .collect()
}

impl BenchmarkConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @ai:intent Classify every configured endpoint into a run plan
    /// @ai:effects pure
    pub fn endpoint_plans(&self) -> Result<Vec<EndpointPlan>, ConfigError> {
        self.endpoints
            .iter()
            .map(|e| {
                Ok(EndpointPlan {
                    endpoint: Endpoint::classify(&e.id, e.kind)?,
                    iterations: e.iterations,
                })
            })
            .collect()
    }

    /// @ai:intent Apply an `<endpoint-id>=<count>` override from the command line
    /// @ai:effects state:write
    pub fn apply_iteration_override(&mut self, spec: &str) -> Result<(), ConfigError> {
        let (id, count) = spec
            .rsplit_once('=')
            .ok_or_else(|| ConfigError::InvalidOverride(spec.to_string()))?;
        let count: u32 = count
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidOverride(spec.to_string()))?;

        let endpoint = self
            .endpoints
            .iter_mut()
            .find(|e| e.id == id.trim())
            .ok_or_else(|| ConfigError::UnknownEndpoint(id.trim().to_string()))?;

        endpoint.iterations = count;
        Ok(())
    }
}

impl ApiConfig {
    /// @ai:intent Per-call ceiling, never below one second
    /// @ai:effects pure
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// @ai:intent Base URL of the runtime API
    /// @ai:effects pure
    pub fn base_url(&self) -> String {
        self.endpoint_url
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", self.region))
    }
}

impl RunConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}
