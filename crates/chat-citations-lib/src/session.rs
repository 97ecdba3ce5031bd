//! Chat session: the append-only transcript of one conversation.
//!
//! The session is passed by `&mut` into the turn handler; there is no ambient
//! global state. `clear` is the explicit reset: it drops the transcript and
//! starts a new driver thread.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::answer::FALLBACK_ANSWER;
use crate::driver::ConversationDriver;
use crate::error::DriverError;
use crate::model::conversation_turn::ConversationTurn;
use crate::pipeline::{CitationPipeline, TurnOutput};

/// Content recorded for a turn whose driver call failed.
pub const GENERIC_ERROR_MESSAGE: &str =
    "Something went wrong while generating a response. Please try again.";

/// How a turn is pulled from the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// One blocking call returning the complete message list.
    #[default]
    SingleShot,
    /// Sequential pull of per-step message updates.
    Streaming,
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    conversation_id: String,
    turns: Vec<ConversationTurn>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// Fresh session with a random conversation id.
    pub fn new() -> Self {
        Self {
            conversation_id: Uuid::new_v4().to_string(),
            turns: Vec::new(),
        }
    }

    /// Rebuild a session from persisted parts.
    pub fn from_parts(conversation_id: String, turns: Vec<ConversationTurn>) -> Self {
        Self {
            conversation_id,
            turns,
        }
    }

    /// Identifier correlating this transcript with the driver's own memory.
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drop the transcript and start a new conversation thread.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.conversation_id = Uuid::new_v4().to_string();
    }

    fn next_turn_id(&self) -> u64 {
        self.turns
            .iter()
            .map(|t| t.turn_id)
            .max()
            .unwrap_or(0)
            .saturating_add(1)
    }

    /// Handle one user submission.
    ///
    /// Appends the user turn, runs the driver and the pipeline, and appends
    /// the assistant turn. A driver failure is recorded as an assistant turn
    /// with [`GENERIC_ERROR_MESSAGE`] and no citations; the session stays
    /// usable. An empty answer is replaced with [`FALLBACK_ANSWER`].
    pub fn handle_turn(
        &mut self,
        driver: &mut dyn ConversationDriver,
        pipeline: &CitationPipeline,
        prompt: &str,
        mode: ResponseMode,
    ) -> &ConversationTurn {
        let user_turn_id = self.next_turn_id();
        self.turns.push(ConversationTurn::user(user_turn_id, prompt));

        let assistant_turn_id = user_turn_id.saturating_add(1);
        let turn = match run_turn(driver, pipeline, &self.conversation_id, prompt, mode) {
            Ok(output) => {
                let answer = if output.answer.is_empty() {
                    FALLBACK_ANSWER.to_string()
                } else {
                    output.answer
                };
                info!(
                    conversation_id = %self.conversation_id,
                    turn_id = assistant_turn_id,
                    citations = output.citations.len(),
                    "assistant turn completed"
                );
                ConversationTurn::assistant(assistant_turn_id, answer, output.citations)
            }
            Err(err) => {
                warn!(
                    conversation_id = %self.conversation_id,
                    turn_id = assistant_turn_id,
                    error = %err,
                    "conversation driver failed; recording error turn"
                );
                ConversationTurn::assistant(assistant_turn_id, GENERIC_ERROR_MESSAGE, Vec::new())
            }
        };
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }
}

fn run_turn(
    driver: &mut dyn ConversationDriver,
    pipeline: &CitationPipeline,
    thread_id: &str,
    prompt: &str,
    mode: ResponseMode,
) -> Result<TurnOutput, DriverError> {
    match mode {
        ResponseMode::SingleShot => {
            let messages = driver.invoke(thread_id, prompt)?;
            Ok(pipeline.run(&messages))
        }
        ResponseMode::Streaming => {
            let mut turn = pipeline.streaming_turn();
            for snapshot in driver.stream(thread_id, prompt)? {
                turn.ingest(&snapshot?);
            }
            Ok(turn.finish())
        }
    }
}
