//! @ai:module:intent Per-endpoint aggregation of result records
//! @ai:module:layer application
//! @ai:module:public_api EndpointSummary, SummaryReport, MetricsAggregator

pub mod aggregator;
pub mod types;

pub use aggregator::{MetricsAggregator, MetricsAggregatorTrait};
pub use types::{EndpointSummary, SummaryReport};
