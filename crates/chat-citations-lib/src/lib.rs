//! Library entry point for the chat citation pipeline.
//!
//! This file re-exports the core types and provides helpers to persist and
//! restore a `ChatSession` transcript to/from JSON. The helpers go through a
//! serialisable representation so the in-memory session can evolve without
//! changing the interchange format.
//
// Public modules
pub mod accumulator;
pub mod answer;
pub mod citation;
pub mod driver;
pub mod error;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod session;

// Re‑export primary types for ergonomic use.
pub use accumulator::CitationAccumulator;
pub use answer::{resolve_final_answer, StreamingAnswer, FALLBACK_ANSWER};
pub use citation::{
    format_citations, select_citations, CitationConfig, CitationPolicy, FormattedCitation,
};
pub use driver::{ConversationDriver, ScriptedDriver, ScriptedTurn};
pub use error::{DecodeFailure, DriverError};
pub use extract::{decode_tool_result, extract_search_records, ExtractedRecords};
pub use model::{
    conversation_turn::{ConversationTurn, Role},
    message::{AssistantContent, ContentBlock, Message, ToolCall, ToolResultContent},
    search_record::SearchRecord,
};
pub use pipeline::{CitationPipeline, StreamingTurn, TurnOutput};
pub use session::{ChatSession, ResponseMode, GENERIC_ERROR_MESSAGE};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Format tag written into persisted transcripts.
pub const SESSION_FORMAT_VERSION: &str = "chat-citations-1";

/// Top-level serialisable transcript container.
///
/// # Fields
/// - `metadata`: format version and provenance
/// - `conversation_id`: thread id shared with the conversation driver
/// - `turns`: the append-only transcript, oldest first
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SerializableSession {
    pub metadata: HashMap<String, String>,
    pub conversation_id: String,
    pub turns: Vec<ConversationTurn>,
}

impl From<&ChatSession> for SerializableSession {
    fn from(session: &ChatSession) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(
            "format_version".to_string(),
            SESSION_FORMAT_VERSION.to_string(),
        );
        SerializableSession {
            metadata,
            conversation_id: session.conversation_id().to_string(),
            turns: session.turns().to_vec(),
        }
    }
}

/// Save the provided `ChatSession` to a JSON file.
///
/// # Returns
///
/// `Ok(())` on success, or an `anyhow::Error` on failure.
pub fn save_session_json(session: &ChatSession, path: &Path) -> Result<()> {
    let serial = SerializableSession::from(session);
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &serial)?;
    Ok(())
}

/// Load a session from a JSON file previously written with `save_session_json`.
///
/// Files without a `format_version` entry are accepted; files tagged with a
/// different version are rejected.
pub fn load_session_json(path: &Path) -> Result<ChatSession> {
    let file = BufReader::new(File::open(path)?);
    let serial: SerializableSession = serde_json::from_reader(file)
        .with_context(|| format!("decoding transcript {}", path.display()))?;

    if let Some(version) = serial.metadata.get("format_version") {
        if version != SESSION_FORMAT_VERSION {
            bail!(
                "unsupported transcript format '{}' (expected '{}')",
                version,
                SESSION_FORMAT_VERSION
            );
        }
    }

    Ok(ChatSession::from_parts(serial.conversation_id, serial.turns))
}
