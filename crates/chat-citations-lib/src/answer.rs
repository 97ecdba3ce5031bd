//! Final-answer resolution.
//!
//! The single-shot resolver scans backward for the most recent assistant
//! message that carries text. The streaming resolver keeps a running answer
//! that every later non-empty assistant text replaces.

use crate::model::message::Message;

/// Text shown when a turn produced no answer at all.
pub const FALLBACK_ANSWER: &str = "Sorry, no answer could be generated for this message.";

/// Resolve the final answer of a complete message sequence.
///
/// Plain-string content is the answer as-is. Block content yields its first
/// `text` block; an assistant message without one is passed over in favour of
/// the next earlier assistant message. Returns an empty string when nothing
/// qualifies.
pub fn resolve_final_answer(messages: &[Message]) -> String {
    messages
        .iter()
        .rev()
        .find_map(|m| match m {
            Message::Assistant { content, .. } => content.text(),
            _ => None,
        })
        .map(str::to_string)
        .unwrap_or_default()
}

/// Running answer for a streaming turn.
#[derive(Debug, Clone, Default)]
pub struct StreamingAnswer {
    current: String,
}

impl StreamingAnswer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one message. Returns true when it replaced the running answer.
    pub fn observe(&mut self, message: &Message) -> bool {
        let Message::Assistant { content, .. } = message else {
            return false;
        };
        match content.text() {
            Some(text) if !text.is_empty() => {
                self.current = text.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn into_answer(self) -> String {
        self.current
    }
}
