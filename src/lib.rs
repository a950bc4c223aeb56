//! @ai:module:intent Latency and throughput benchmark for hosted inference endpoints
//! @ai:module:layer application
//! @ai:module:public_api config, console, corpus, endpoint, error, metrics, report, runner, sink

pub mod config;
pub mod console;
pub mod corpus;
pub mod endpoint;
pub mod error;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod sink;

pub use config::BenchmarkConfig;
pub use corpus::{Corpus, CorpusLoader, Prompt};
pub use endpoint::{Endpoint, EndpointFamily, EndpointKind, EndpointPlan};
pub use error::{ConfigError, CorpusError, InvocationError};
pub use metrics::{EndpointSummary, MetricsAggregator, SummaryReport};
pub use report::ReportGenerator;
pub use runner::{EndpointInvoker, InvocationResult, MockTransport, RunController, RuntimeClient};
pub use sink::{ResultRecord, ResultSink};
