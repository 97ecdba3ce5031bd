// Timestamp as seconds since UNIX epoch (u64); rendering is left to the caller.
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Author of a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Represents a single persisted turn of a chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub turn_id: u64,
    pub role: Role,
    pub content: String,
    /// Ordered citation strings. Only assistant turns carry them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<String>>,
    #[serde(default)]
    pub timestamp: u64,
}

impl ConversationTurn {
    pub fn user(turn_id: u64, content: impl Into<String>) -> Self {
        ConversationTurn {
            turn_id,
            role: Role::User,
            content: content.into(),
            citations: None,
            timestamp: now_seconds(),
        }
    }

    pub fn assistant(turn_id: u64, content: impl Into<String>, citations: Vec<String>) -> Self {
        ConversationTurn {
            turn_id,
            role: Role::Assistant,
            content: content.into(),
            citations: Some(citations),
            timestamp: now_seconds(),
        }
    }

    /// Returns a whitespace‑collapsed version of `content`.
    pub fn clean_content(&self) -> String {
        self.content
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Citations of this turn, empty for user turns.
    pub fn citations(&self) -> &[String] {
        self.citations.as_deref().unwrap_or(&[])
    }
}

fn now_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
