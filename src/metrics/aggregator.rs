//! @ai:module:intent Statistical aggregation for benchmark records
//! @ai:module:layer application
//! @ai:module:public_api MetricsAggregator
//! @ai:module:stateless true

use crate::metrics::types::{EndpointSummary, SummaryReport};
use crate::sink::ResultRecord;

/// @ai:intent Trait for metrics aggregation
pub trait MetricsAggregatorTrait: Send + Sync {
    /// @ai:intent Aggregate records into a per-endpoint summary
    fn aggregate(&self, records: &[ResultRecord], source: &str) -> SummaryReport;
}

/// @ai:intent Aggregates result records into per-endpoint means
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// @ai:intent Create a new metrics aggregator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Summarise one endpoint's records; failures count toward every mean
    /// @ai:pre records all share one model id
    /// @ai:effects pure
    pub fn summarize(model_id: &str, records: &[&ResultRecord]) -> EndpointSummary {
        if records.is_empty() {
            return EndpointSummary {
                model_id: model_id.to_string(),
                ..Default::default()
            };
        }

        let calls = records.len();
        let successes = records.iter().filter(|r| r.success).count();
        let avg_duration = average(records.iter().map(|r| r.duration));

        EndpointSummary {
            model_id: model_id.to_string(),
            calls,
            avg_duration,
            avg_input_tokens: average(records.iter().map(|r| r.input_tokens as f64)),
            avg_output_tokens: average(records.iter().map(|r| r.output_tokens as f64)),
            avg_total_tokens: average(records.iter().map(|r| r.total_tokens as f64)),
            avg_tokens_per_minute: average(records.iter().map(|r| r.tokens_per_minute)),
            invocations_per_minute: invocations_per_minute(avg_duration),
            success_rate: successes as f64 / calls as f64 * 100.0,
        }
    }

    /// @ai:intent Group records by model id in first-appearance order
    /// @ai:effects pure
    fn group_by_model(records: &[ResultRecord]) -> Vec<(&str, Vec<&ResultRecord>)> {
        let mut groups: Vec<(&str, Vec<&ResultRecord>)> = Vec::new();

        for record in records {
            match groups.iter_mut().find(|(id, _)| *id == record.model_id) {
                Some((_, group)) => group.push(record),
                None => groups.push((record.model_id.as_str(), vec![record])),
            }
        }

        groups
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// @ai:intent Calculate average of an iterator of f64
/// @ai:effects pure
fn average<I: Iterator<Item = f64>>(iter: I) -> f64 {
    let (sum, count) = iter.fold((0.0, 0u32), |(s, c), v| (s + v, c + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// @ai:effects pure
fn invocations_per_minute(avg_duration: f64) -> f64 {
    if avg_duration > 0.0 {
        60.0 / avg_duration
    } else {
        0.0
    }
}

impl MetricsAggregatorTrait for MetricsAggregator {
    /// @ai:effects pure
    fn aggregate(&self, records: &[ResultRecord], source: &str) -> SummaryReport {
        let endpoints = Self::group_by_model(records)
            .into_iter()
            .map(|(id, group)| Self::summarize(id, &group))
            .collect();

        SummaryReport {
            timestamp: chrono::Utc::now(),
            source: source.to_string(),
            total_records: records.len(),
            endpoints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(model: &str, duration: f64, output_tokens: u64, success: bool) -> ResultRecord {
        let input_tokens = 6000;
        let total_tokens = input_tokens + output_tokens;

        ResultRecord {
            model_id: model.to_string(),
            question_id: 1,
            iteration: 1,
            duration,
            input_tokens,
            output_tokens,
            total_tokens,
            tokens_per_minute: crate::sink::tokens_per_minute(total_tokens, duration),
            success,
        }
    }

    #[test]
    fn test_average() {
        let values = vec![10.0, 20.0, 30.0];
        assert!((average(values.into_iter()) - 20.0).abs() < 0.01);
    }

    #[test]
    fn test_average_empty() {
        let values: Vec<f64> = vec![];
        assert!((average(values.into_iter()) - 0.0).abs() < 0.01);
    }

    #[test]
    fn test_summary_includes_failures() {
        let records = vec![
            record("a.claude", 2.0, 200, true),
            record("a.claude", 4.0, 0, false),
        ];
        let refs: Vec<&ResultRecord> = records.iter().collect();

        let summary = MetricsAggregator::summarize("a.claude", &refs);

        assert_eq!(summary.calls, 2);
        assert!((summary.avg_duration - 3.0).abs() < 1e-9);
        assert!((summary.avg_output_tokens - 100.0).abs() < 1e-9);
        assert!((summary.avg_total_tokens - 6100.0).abs() < 1e-9);
        assert!((summary.invocations_per_minute - 20.0).abs() < 1e-9);
        assert!((summary.success_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_duration_has_zero_invocation_rate() {
        let records = vec![record("x.embed", 0.0, 25, true)];
        let refs: Vec<&ResultRecord> = records.iter().collect();

        let summary = MetricsAggregator::summarize("x.embed", &refs);
        assert_eq!(summary.invocations_per_minute, 0.0);
        assert_eq!(summary.avg_tokens_per_minute, 0.0);
    }

    #[test]
    fn test_aggregate_keeps_first_appearance_order() {
        let records = vec![
            record("b.nova", 1.0, 10, true),
            record("a.claude", 1.0, 10, true),
            record("b.nova", 1.0, 10, true),
        ];

        let report = MetricsAggregator::new().aggregate(&records, "benchmark.csv");

        let ids: Vec<&str> = report.endpoints.iter().map(|e| e.model_id.as_str()).collect();
        assert_eq!(ids, vec!["b.nova", "a.claude"]);
        assert_eq!(report.endpoints[0].calls, 2);
        assert_eq!(report.total_records, 3);
    }
}
