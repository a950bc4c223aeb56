//! @ai:module:intent Durable, append-only storage of per-call result records
//! @ai:module:layer infrastructure
//! @ai:module:public_api ResultRecord, ResultSink, RESULT_COLUMNS, read_records, tokens_per_minute

pub mod csv_sink;
pub mod record;

pub use csv_sink::{read_records, ResultSink};
pub use record::{escape_field, tokens_per_minute, ResultRecord, RESULT_COLUMNS};
