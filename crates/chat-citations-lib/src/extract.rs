//! Search-record extraction from tool results.
//!
//! Records are collected in message order and, inside one tool result, in the
//! order the tool returned them. A tool result that fails to decode
//! contributes nothing; the failure is logged and never surfaced.

use serde_json::Value;
use tracing::debug;

use crate::error::DecodeFailure;
use crate::model::message::{Message, ToolResultContent};
use crate::model::search_record::SearchRecord;

/// Output of [`extract_search_records`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedRecords {
    pub records: Vec<SearchRecord>,
    /// Tool invocations requested by assistant messages in the same input.
    pub tool_requests: usize,
    /// Tool results skipped because they did not decode.
    pub skipped_results: usize,
}

/// Decode one tool result into search records.
///
/// Text content must parse as a JSON array; structured content is used
/// directly. Every element must be an object whose known fields have the
/// expected types, otherwise the whole result is rejected.
pub fn decode_tool_result(content: &ToolResultContent) -> Result<Vec<SearchRecord>, DecodeFailure> {
    match content {
        ToolResultContent::Text(raw) => match serde_json::from_str::<Value>(raw)? {
            Value::Array(items) => decode_records(items),
            other => Err(DecodeFailure::NotASequence {
                found: value_kind(&other),
            }),
        },
        ToolResultContent::Records(items) => decode_records(items.clone()),
        ToolResultContent::Other(value) => Err(DecodeFailure::NotASequence {
            found: value_kind(value),
        }),
    }
}

fn decode_records(items: Vec<Value>) -> Result<Vec<SearchRecord>, DecodeFailure> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                // serde would accept a positional array for a struct; a record must be a mapping.
                return Err(DecodeFailure::BadRecord {
                    index,
                    source: serde::de::Error::custom(format!(
                        "expected an object, found {}",
                        value_kind(&item)
                    )),
                });
            }
            serde_json::from_value::<SearchRecord>(item)
                .map_err(|source| DecodeFailure::BadRecord { index, source })
        })
        .collect()
}

/// Collect search records from every tool result in `messages`.
pub fn extract_search_records(messages: &[Message]) -> ExtractedRecords {
    let mut out = ExtractedRecords::default();
    for (position, message) in messages.iter().enumerate() {
        match message {
            Message::Tool { content, name, .. } => match decode_tool_result(content) {
                Ok(records) => out.records.extend(records),
                Err(err) => {
                    debug!(
                        position,
                        tool = name.as_deref().unwrap_or("unknown"),
                        error = %err,
                        "skipping undecodable tool result"
                    );
                    out.skipped_results += 1;
                }
            },
            Message::Assistant { .. } => {
                out.tool_requests += message.tool_request_count();
            }
            Message::User { .. } => {}
        }
    }
    out
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
