//! @ai:module:intent Result record type and its stable CSV column schema
//! @ai:module:layer domain
//! @ai:module:public_api ResultRecord, RESULT_COLUMNS, tokens_per_minute
//! @ai:module:stateless true

use crate::runner::InvocationResult;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Column order of the output dataset. Downstream stages depend on these names.
pub const RESULT_COLUMNS: [&str; 9] = [
    "model_id",
    "question_id",
    "iteration",
    "duration",
    "input_tokens",
    "output_tokens",
    "total_tokens",
    "tokens_per_minute",
    "success",
];

/// @ai:intent Throughput in tokens per minute, 0 when duration is not positive
/// @ai:effects pure
pub fn tokens_per_minute(total_tokens: u64, duration_secs: f64) -> f64 {
    if duration_secs > 0.0 {
        total_tokens as f64 / duration_secs * 60.0
    } else {
        0.0
    }
}

/// @ai:intent Persisted outcome of one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub model_id: String,
    pub question_id: usize,
    pub iteration: u32,
    pub duration: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub tokens_per_minute: f64,
    pub success: bool,
}

impl ResultRecord {
    /// @ai:intent Derive a record from an invocation result
    /// @ai:effects pure
    pub fn from_invocation(
        model_id: &str,
        question_id: usize,
        iteration: u32,
        result: &InvocationResult,
    ) -> Self {
        let total_tokens = result.input_tokens + result.output_tokens;

        Self {
            model_id: model_id.to_string(),
            question_id,
            iteration,
            duration: result.duration_secs,
            input_tokens: result.input_tokens,
            output_tokens: result.output_tokens,
            total_tokens,
            tokens_per_minute: tokens_per_minute(total_tokens, result.duration_secs),
            success: result.is_success(),
        }
    }

    /// @ai:intent Render as one CSV line in `RESULT_COLUMNS` order, without newline
    /// @ai:effects pure
    pub fn to_csv_row(&self) -> String {
        [
            escape_field(&self.model_id),
            self.question_id.to_string(),
            self.iteration.to_string(),
            self.duration.to_string(),
            self.input_tokens.to_string(),
            self.output_tokens.to_string(),
            self.total_tokens.to_string(),
            self.tokens_per_minute.to_string(),
            self.success.to_string(),
        ]
        .join(",")
    }

    /// @ai:intent Parse one data line using a header-derived column map
    ///
    /// The iteration column is optional; datasets without it read as iteration 1.
    /// @ai:effects pure
    pub fn from_csv_row(line: &str, columns: &HashMap<String, usize>) -> Result<Self> {
        let fields = split_row(line)?;

        let get = |name: &str| column(&fields, columns, name);

        let iteration = match columns.get("iteration") {
            Some(_) => get("iteration")?.parse()?,
            None => 1,
        };

        Ok(Self {
            model_id: get("model_id")?.to_string(),
            question_id: get("question_id")?.parse()?,
            iteration,
            duration: get("duration")?.parse()?,
            input_tokens: get("input_tokens")?.parse()?,
            output_tokens: get("output_tokens")?.parse()?,
            total_tokens: get("total_tokens")?.parse()?,
            tokens_per_minute: get("tokens_per_minute")?.parse()?,
            success: parse_bool(get("success")?)?,
        })
    }
}

fn column<'a>(fields: &'a [String], columns: &HashMap<String, usize>, name: &str) -> Result<&'a str> {
    let idx = columns
        .get(name)
        .with_context(|| format!("missing column '{}'", name))?;
    fields
        .get(*idx)
        .map(String::as_str)
        .with_context(|| format!("row has no value for '{}'", name))
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => bail!("invalid boolean '{}'", other),
    }
}

/// Quote a field when it contains a delimiter, quote or line break.
pub fn escape_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// @ai:intent Split one CSV line, honouring double-quoted fields
/// @ai:effects pure
pub(crate) fn split_row(line: &str) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches(&['\r', '\n'][..]).chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.is_empty() => in_quotes = true,
            (',', false) => fields.push(std::mem::take(&mut current)),
            (c, _) => current.push(c),
        }
    }

    if in_quotes {
        bail!("unterminated quoted field");
    }

    fields.push(current);
    Ok(fields)
}
