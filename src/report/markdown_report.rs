//! @ai:module:intent Markdown report generation
//! @ai:module:layer infrastructure
//! @ai:module:public_api MarkdownReporter
//! @ai:module:stateless true

use crate::metrics::{EndpointSummary, SummaryReport};
use anyhow::Result;
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// @ai:intent Trait for Markdown report generation
pub trait MarkdownReporterTrait: Send + Sync {
    /// @ai:intent Generate Markdown report from a summary
    fn generate(&self, summary: &SummaryReport, output_path: &Path) -> Result<()>;
}

/// @ai:intent Generates Markdown reports from benchmark summaries
pub struct MarkdownReporter;

impl MarkdownReporter {
    /// @ai:intent Create a new Markdown reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Generate header section
    /// @ai:effects pure
    fn generate_header(summary: &SummaryReport) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "# Inference Benchmark Results")?;
        writeln!(output)?;
        writeln!(output, "**Date:** {}", summary.timestamp)?;
        writeln!(output, "**Source:** {}", summary.source)?;
        writeln!(output, "**Records:** {}", summary.total_records)?;
        writeln!(output)?;

        Ok(output)
    }

    /// @ai:intent Generate the per-endpoint table, two decimals per figure
    /// @ai:effects pure
    fn generate_endpoint_table(endpoints: &[EndpointSummary]) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "## Results by Endpoint")?;
        writeln!(output)?;

        if endpoints.is_empty() {
            writeln!(output, "_No records._")?;
            return Ok(output);
        }

        writeln!(output, "| {} | Calls |", EndpointSummary::HEADINGS.join(" | "))?;
        writeln!(
            output,
            "|{}",
            "---|".repeat(EndpointSummary::HEADINGS.len() + 1)
        )?;

        for endpoint in endpoints {
            let cells: Vec<String> = endpoint.values().iter().map(|v| format!("{:.2}", v)).collect();
            writeln!(
                output,
                "| {} | {} | {} |",
                endpoint.model_id,
                cells.join(" | "),
                endpoint.calls
            )?;
        }

        writeln!(output)?;
        Ok(output)
    }
}

impl Default for MarkdownReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownReporterTrait for MarkdownReporter {
    /// @ai:intent Generate Markdown report to file
    /// @ai:effects fs:write
    fn generate(&self, summary: &SummaryReport, output_path: &Path) -> Result<()> {
        let mut content = Self::generate_header(summary)?;
        content.push_str(&Self::generate_endpoint_table(&summary.endpoints)?);

        std::fs::write(output_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_endpoint_table_uses_two_decimals() {
        let table = MarkdownReporter::generate_endpoint_table(&[EndpointSummary {
            model_id: "eu.amazon.nova-pro-v1:0".to_string(),
            calls: 3,
            avg_duration: 1.23456,
            success_rate: 66.6666,
            ..Default::default()
        }])
        .unwrap();

        assert!(table.contains("| eu.amazon.nova-pro-v1:0 | 1.23 |"));
        assert!(table.contains("| 66.67 | 3 |"));
    }

    #[test]
    fn test_empty_summary_notes_no_records() {
        let table = MarkdownReporter::generate_endpoint_table(&[]).unwrap();
        assert!(table.contains("_No records._"));
    }

    #[test]
    fn test_generate_markdown_report() {
        let reporter = MarkdownReporter::new();
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("summary.md");

        let summary = SummaryReport {
            timestamp: "2026-01-19T00:00:00Z".parse().unwrap(),
            source: "results/benchmark_20260119_000000.csv".to_string(),
            total_records: 1,
            endpoints: vec![EndpointSummary {
                model_id: "eu.cohere.rerank-v3-5:0".to_string(),
                calls: 1,
                ..Default::default()
            }],
        };

        reporter.generate(&summary, &output).unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("# Inference Benchmark Results"));
        assert!(content.contains("**Date:** 2026-01-19 00:00:00 UTC"));
        assert!(content.contains("**Source:** results/benchmark_20260119_000000.csv"));
        assert!(content.contains("eu.cohere.rerank-v3-5:0"));
    }
}
