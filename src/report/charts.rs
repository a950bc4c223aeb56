//! @ai:module:intent Chart generation for benchmark summaries
//! @ai:module:layer infrastructure
//! @ai:module:public_api ChartGenerator
//! @ai:module:stateless true

use crate::metrics::{EndpointSummary, SummaryReport};
use anyhow::Result;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

const CHART_SIZE: (u32, u32) = (1200, 600);
const BAR_PADDING_PX: u32 = 6;

/// @ai:intent Trait for chart generation
pub trait ChartGeneratorTrait: Send + Sync {
    /// @ai:intent Generate all charts from a summary
    fn generate_all(
        &self,
        summary: &SummaryReport,
        output_dir: &Path,
        stamp: &str,
    ) -> Result<Vec<PathBuf>>;
}

/// @ai:intent Generates per-endpoint bar charts
pub struct ChartGenerator;

/// One single-series chart: file prefix, caption, axis label and the plotted figure.
struct BarChartSpec {
    prefix: &'static str,
    caption: &'static str,
    y_desc: &'static str,
    value: fn(&EndpointSummary) -> f64,
}

const BAR_CHARTS: [BarChartSpec; 4] = [
    BarChartSpec {
        prefix: "tokens_per_minute",
        caption: "Average Tokens per Minute by Model",
        y_desc: "Tokens per Minute",
        value: |e| e.avg_tokens_per_minute,
    },
    BarChartSpec {
        prefix: "invocations_per_minute",
        caption: "Average Invocations per Minute by Model",
        y_desc: "Invocations per Minute",
        value: |e| e.invocations_per_minute,
    },
    BarChartSpec {
        prefix: "success_rate",
        caption: "Success Rate by Model",
        y_desc: "Success Rate (%)",
        value: |e| e.success_rate,
    },
    BarChartSpec {
        prefix: "response_time",
        caption: "Average Response Time by Model",
        y_desc: "Response Time (seconds)",
        value: |e| e.avg_duration,
    },
];

impl ChartGenerator {
    /// @ai:intent Create a new chart generator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Upper y bound with headroom, never below 1.0
    /// @ai:effects pure
    fn y_max<I: Iterator<Item = f64>>(values: I) -> f64 {
        let max = values.fold(0.0_f64, f64::max);
        (max * 1.1).max(1.0)
    }

    /// @ai:intent Draw one bar per endpoint
    /// @ai:effects fs:write
    fn generate_bar_chart(
        &self,
        endpoints: &[EndpointSummary],
        spec: &BarChartSpec,
        output_path: &Path,
    ) -> Result<()> {
        let root = BitMapBackend::new(output_path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let data: Vec<(&str, f64)> = endpoints
            .iter()
            .map(|e| (e.model_id.as_str(), (spec.value)(e)))
            .collect();
        let y_max = Self::y_max(data.iter().map(|(_, v)| *v));

        let mut chart = ChartBuilder::on(&root)
            .caption(spec.caption, ("sans-serif", 25))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(70)
            .build_cartesian_2d((0..data.len() as u32).into_segmented(), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc(spec.y_desc)
            .x_desc("Model")
            .x_labels(data.len())
            .x_label_style(("sans-serif", 12))
            .x_label_formatter(&|x| segment_label(x, &data))
            .draw()?;

        chart.draw_series(data.iter().enumerate().map(|(i, (_, value))| {
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i as u32), 0.0),
                    (SegmentValue::Exact(i as u32 + 1), *value),
                ],
                BLUE.mix(0.7).filled(),
            );
            bar.set_margin(0, 0, BAR_PADDING_PX, BAR_PADDING_PX);
            bar
        }))?;

        root.present()?;
        Ok(())
    }

    /// @ai:intent Grouped bars of mean tokens sent and received per endpoint
    /// @ai:effects fs:write
    fn generate_tokens_chart(&self, endpoints: &[EndpointSummary], output_path: &Path) -> Result<()> {
        let root = BitMapBackend::new(output_path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let data: Vec<(&str, f64, f64)> = endpoints
            .iter()
            .map(|e| (e.model_id.as_str(), e.avg_input_tokens, e.avg_output_tokens))
            .collect();
        let labels: Vec<(&str, f64)> = data.iter().map(|(name, _, _)| (*name, 0.0)).collect();
        let y_max = Self::y_max(data.iter().flat_map(|(_, sent, received)| [*sent, *received]));

        let mut chart = ChartBuilder::on(&root)
            .caption("Average Tokens Sent and Received by Model", ("sans-serif", 25))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(70)
            .build_cartesian_2d((0..data.len() as u32).into_segmented(), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc("Average Tokens")
            .x_desc("Model")
            .x_labels(data.len())
            .x_label_style(("sans-serif", 12))
            .x_label_formatter(&|x| segment_label(x, &labels))
            .draw()?;

        // Each endpoint's segment is split in half: sent on the left, received on the right.
        let segment_px = chart.plotting_area().dim_in_pixel().0 / data.len().max(1) as u32;
        let half = segment_px / 2;

        chart
            .draw_series(data.iter().enumerate().map(|(i, (_, sent, _))| {
                let mut bar = Rectangle::new(
                    [
                        (SegmentValue::Exact(i as u32), 0.0),
                        (SegmentValue::Exact(i as u32 + 1), *sent),
                    ],
                    BLUE.mix(0.7).filled(),
                );
                bar.set_margin(0, 0, BAR_PADDING_PX, half);
                bar
            }))?
            .label("Tokens Sent")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], BLUE.mix(0.7).filled()));

        chart
            .draw_series(data.iter().enumerate().map(|(i, (_, _, received))| {
                let mut bar = Rectangle::new(
                    [
                        (SegmentValue::Exact(i as u32), 0.0),
                        (SegmentValue::Exact(i as u32 + 1), *received),
                    ],
                    GREEN.mix(0.7).filled(),
                );
                bar.set_margin(0, 0, half, BAR_PADDING_PX);
                bar
            }))?
            .label("Tokens Received")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], GREEN.mix(0.7).filled()));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}

/// Label the centre of segment `i` with the i-th model id.
fn segment_label(x: &SegmentValue<u32>, data: &[(&str, f64)]) -> String {
    match x {
        SegmentValue::CenterOf(i) => data
            .get(*i as usize)
            .map(|(name, _)| name.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

impl Default for ChartGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartGeneratorTrait for ChartGenerator {
    /// @ai:intent Generate all five charts; nothing is drawn for an empty summary
    /// @ai:effects fs:write
    fn generate_all(
        &self,
        summary: &SummaryReport,
        output_dir: &Path,
        stamp: &str,
    ) -> Result<Vec<PathBuf>> {
        if summary.endpoints.is_empty() {
            tracing::warn!("No endpoints in summary, skipping charts");
            return Ok(Vec::new());
        }

        std::fs::create_dir_all(output_dir)?;

        let mut generated = Vec::new();

        for spec in &BAR_CHARTS {
            let path = output_dir.join(format!("{}_{}.png", spec.prefix, stamp));
            self.generate_bar_chart(&summary.endpoints, spec, &path)?;
            generated.push(path);
        }

        let tokens_path = output_dir.join(format!("tokens_sent_received_{}.png", stamp));
        self.generate_tokens_chart(&summary.endpoints, &tokens_path)?;
        generated.push(tokens_path);

        Ok(generated)
    }
}
