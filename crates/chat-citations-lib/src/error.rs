//! Typed errors of the pipeline and the driver seam.

use thiserror::Error;

/// A tool result could not be turned into search records.
///
/// The extractor recovers from every variant by skipping the message.
#[derive(Debug, Error)]
pub enum DecodeFailure {
    #[error("tool result is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("tool result decoded to {found}, expected a list of records")]
    NotASequence { found: &'static str },
    #[error("record {index} is not a search record: {source}")]
    BadRecord {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// The conversation driver failed to produce a response.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("conversation driver failed: {0}")]
    Failed(String),
    #[error("scripted driver has no response left for this turn")]
    ScriptExhausted,
    #[error("response stream interrupted after {after_events} event(s): {reason}")]
    Interrupted { after_events: usize, reason: String },
}
