//! @ai:module:intent Per-endpoint summary table as CSV
//! @ai:module:layer infrastructure
//! @ai:module:public_api CsvSummaryReporter
//! @ai:module:stateless true

use crate::metrics::{EndpointSummary, SummaryReport};
use anyhow::Result;
use std::path::Path;

/// @ai:intent Trait for summary CSV generation
pub trait CsvSummaryReporterTrait: Send + Sync {
    /// @ai:intent Write the summary table to `output_path`
    fn generate(&self, summary: &SummaryReport, output_path: &Path) -> Result<()>;
}

/// @ai:intent Writes `metrics_summary` tables
pub struct CsvSummaryReporter;

impl CsvSummaryReporter {
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Render the table with full precision
    /// @ai:effects pure
    pub fn render(summary: &SummaryReport) -> String {
        let mut out = EndpointSummary::HEADINGS.join(",");
        out.push('\n');

        for endpoint in &summary.endpoints {
            out.push_str(&crate::sink::escape_field(&endpoint.model_id));
            for value in endpoint.values() {
                out.push(',');
                out.push_str(&value.to_string());
            }
            out.push('\n');
        }

        out
    }
}

impl Default for CsvSummaryReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvSummaryReporterTrait for CsvSummaryReporter {
    /// @ai:effects fs:write
    fn generate(&self, summary: &SummaryReport, output_path: &Path) -> Result<()> {
        std::fs::write(output_path, Self::render(summary))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_table() {
        let summary = SummaryReport {
            timestamp: "2026-01-19T00:00:00Z".parse().unwrap(),
            source: "benchmark.csv".to_string(),
            total_records: 2,
            endpoints: vec![EndpointSummary {
                model_id: "eu.amazon.nova-lite-v1:0".to_string(),
                calls: 2,
                avg_duration: 2.0,
                avg_input_tokens: 6000.0,
                avg_output_tokens: 100.0,
                avg_total_tokens: 6100.0,
                avg_tokens_per_minute: 183000.0,
                invocations_per_minute: 30.0,
                success_rate: 50.0,
            }],
        };

        let rendered = CsvSummaryReporter::render(&summary);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Model,Avg Response Time (s),"));
        assert_eq!(
            lines[1],
            "eu.amazon.nova-lite-v1:0,2,6000,100,6100,183000,30,50"
        );
    }
}
