//! @ai:module:intent Report generation for benchmark results
//! @ai:module:layer infrastructure
//! @ai:module:public_api ReportGenerator, JsonReporter, MarkdownReporter, CsvSummaryReporter, ChartGenerator, find_latest_results

pub mod charts;
pub mod csv_summary;
pub mod json_report;
pub mod markdown_report;

pub use charts::{ChartGenerator, ChartGeneratorTrait};
pub use csv_summary::{CsvSummaryReporter, CsvSummaryReporterTrait};
pub use json_report::{JsonReporter, JsonReporterTrait};
pub use markdown_report::{MarkdownReporter, MarkdownReporterTrait};

use crate::metrics::SummaryReport;
use anyhow::Result;
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// @ai:intent Files written by one report generation
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub summary_csv: PathBuf,
    pub json: PathBuf,
    pub markdown: PathBuf,
    pub charts: Vec<PathBuf>,
}

/// @ai:intent Combined report generator
pub struct ReportGenerator {
    json: JsonReporter,
    markdown: MarkdownReporter,
    csv: CsvSummaryReporter,
    charts: ChartGenerator,
}

impl ReportGenerator {
    /// @ai:intent Create a new report generator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            json: JsonReporter::new(),
            markdown: MarkdownReporter::new(),
            csv: CsvSummaryReporter::new(),
            charts: ChartGenerator::new(),
        }
    }

    /// @ai:intent Generate every artifact, tagging file names with `stamp`
    /// @ai:effects fs:write
    pub fn generate_all(
        &self,
        summary: &SummaryReport,
        results_dir: &Path,
        graphs_dir: &Path,
        stamp: &str,
    ) -> Result<GeneratedReport> {
        std::fs::create_dir_all(results_dir)?;

        let summary_csv = results_dir.join(format!("metrics_summary_{}.csv", stamp));
        self.csv.generate(summary, &summary_csv)?;

        let json = results_dir.join(format!("summary_{}.json", stamp));
        self.json.generate(summary, &json)?;

        let markdown = results_dir.join(format!("summary_{}.md", stamp));
        self.markdown.generate(summary, &markdown)?;

        let charts = self.charts.generate_all(summary, graphs_dir, stamp)?;

        tracing::info!(
            "Reports generated in {} and {}",
            results_dir.display(),
            graphs_dir.display()
        );

        Ok(GeneratedReport {
            summary_csv,
            json,
            markdown,
            charts,
        })
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// @ai:intent Most recently modified `benchmark_*.csv` directly inside `results_dir`
/// @ai:effects fs:read
pub fn find_latest_results(results_dir: &Path) -> Result<Option<PathBuf>> {
    let pattern = Regex::new(r"^benchmark_.*\.csv$")?;

    if !results_dir.exists() {
        return Ok(None);
    }

    let latest = WalkDir::new(results_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|name| pattern.is_match(name))
                .unwrap_or(false)
        })
        .filter_map(|e| {
            let modified = e.metadata().ok()?.modified().ok()?;
            Some((modified, e.into_path()))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path);

    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_latest_ignores_other_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("metrics_summary_1.csv"), "x").unwrap();
        std::fs::write(temp.path().join("notes.txt"), "x").unwrap();

        assert!(find_latest_results(temp.path()).unwrap().is_none());

        let older = temp.path().join("benchmark_20260101_000000.csv");
        std::fs::write(&older, "x").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let newer = temp.path().join("benchmark_20260102_000000.csv");
        std::fs::write(&newer, "x").unwrap();

        assert_eq!(find_latest_results(temp.path()).unwrap(), Some(newer));
    }

    #[test]
    fn test_find_latest_in_missing_dir() {
        let temp = TempDir::new().unwrap();
        assert!(find_latest_results(&temp.path().join("absent"))
            .unwrap()
            .is_none());
    }
}
