//! @ai:module:intent Summary types for benchmark results
//! @ai:module:layer domain
//! @ai:module:public_api EndpointSummary, SummaryReport
//! @ai:module:stateless true

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// @ai:intent Aggregate figures for one endpoint across all of its records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointSummary {
    pub model_id: String,
    pub calls: usize,
    pub avg_duration: f64,
    pub avg_input_tokens: f64,
    pub avg_output_tokens: f64,
    pub avg_total_tokens: f64,
    pub avg_tokens_per_minute: f64,
    /// 60 / avg_duration, or 0 when the mean duration is not positive.
    pub invocations_per_minute: f64,
    /// Percentage of successful calls, 0..=100.
    pub success_rate: f64,
}

impl EndpointSummary {
    /// Column headings of the summary table, in field order.
    pub const HEADINGS: [&'static str; 8] = [
        "Model",
        "Avg Response Time (s)",
        "Avg Tokens Sent",
        "Avg Tokens Received",
        "Avg Total Tokens",
        "Tokens per Minute",
        "Invocations per Minute",
        "Success Rate (%)",
    ];

    /// @ai:intent Numeric cells in heading order (model id excluded)
    /// @ai:effects pure
    pub fn values(&self) -> [f64; 7] {
        [
            self.avg_duration,
            self.avg_input_tokens,
            self.avg_output_tokens,
            self.avg_total_tokens,
            self.avg_tokens_per_minute,
            self.invocations_per_minute,
            self.success_rate,
        ]
    }
}

/// @ai:intent Complete summary of one results dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    /// When the summary was computed.
    pub timestamp: DateTime<Utc>,
    /// Dataset the summary was computed from.
    pub source: String,
    pub total_records: usize,
    pub endpoints: Vec<EndpointSummary>,
}
