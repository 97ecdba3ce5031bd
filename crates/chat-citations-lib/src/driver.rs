//! Conversation driver seam.
//!
//! The driver is the orchestration graph around the language model and the
//! search tool. The pipeline only sees its output: either one complete list of
//! messages (`invoke`) or a finite, non-restartable sequence of per-node
//! message updates (`stream`).
//!
//! `ScriptedDriver` replays recorded responses from a JSON script and keeps a
//! per-thread message memory, standing in for a real graph with an in-memory
//! checkpointer.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::DriverError;
use crate::model::message::Message;

/// Lazy sequence of message updates produced during one turn.
pub type DriverStream<'a> = Box<dyn Iterator<Item = Result<Vec<Message>, DriverError>> + 'a>;

pub trait ConversationDriver {
    /// Run a full turn and return every message it produced, prompt included.
    fn invoke(&mut self, thread_id: &str, prompt: &str) -> Result<Vec<Message>, DriverError>;

    /// Run a turn incrementally. Each item is the message update of one step.
    fn stream(&mut self, thread_id: &str, prompt: &str) -> Result<DriverStream<'_>, DriverError>;
}

/// One recorded response of the scripted driver.
///
/// `events` are emitted in order; when `error` is set the turn fails after
/// the last event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptedTurn {
    #[serde(default)]
    pub events: Vec<Vec<Message>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// On-disk form of a driver script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverScript {
    pub turns: Vec<ScriptedTurn>,
}

#[derive(Debug, Default)]
pub struct ScriptedDriver {
    script: VecDeque<ScriptedTurn>,
    memory: HashMap<String, Vec<Message>>,
}

impl ScriptedDriver {
    pub fn new(turns: Vec<ScriptedTurn>) -> Self {
        Self {
            script: turns.into(),
            memory: HashMap::new(),
        }
    }

    /// Load a script previously written as JSON.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = BufReader::new(
            File::open(path).with_context(|| format!("opening driver script {}", path.display()))?,
        );
        let script: DriverScript = serde_json::from_reader(file)
            .with_context(|| format!("parsing driver script {}", path.display()))?;
        Ok(Self::new(script.turns))
    }

    /// Responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Messages remembered for `thread_id`, oldest first.
    pub fn history(&self, thread_id: &str) -> &[Message] {
        self.memory.get(thread_id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn next_turn(
        &mut self,
        thread_id: &str,
        prompt: &str,
    ) -> Result<(ScriptedTurn, &mut Vec<Message>), DriverError> {
        let turn = self
            .script
            .pop_front()
            .ok_or(DriverError::ScriptExhausted)?;
        let history = self.memory.entry(thread_id.to_string()).or_default();
        history.push(Message::user(prompt));
        Ok((turn, history))
    }
}

impl ConversationDriver for ScriptedDriver {
    fn invoke(&mut self, thread_id: &str, prompt: &str) -> Result<Vec<Message>, DriverError> {
        let (turn, history) = self.next_turn(thread_id, prompt)?;
        let mut produced = vec![Message::user(prompt)];
        for event in turn.events {
            history.extend(event.iter().cloned());
            produced.extend(event);
        }
        match turn.error {
            Some(reason) => Err(DriverError::Failed(reason)),
            None => Ok(produced),
        }
    }

    fn stream(&mut self, thread_id: &str, prompt: &str) -> Result<DriverStream<'_>, DriverError> {
        let (turn, history) = self.next_turn(thread_id, prompt)?;
        Ok(Box::new(ScriptedStream {
            events: turn.events.into_iter(),
            error: turn.error,
            history,
            emitted: 0,
        }))
    }
}

struct ScriptedStream<'a> {
    events: std::vec::IntoIter<Vec<Message>>,
    error: Option<String>,
    history: &'a mut Vec<Message>,
    emitted: usize,
}

impl Iterator for ScriptedStream<'_> {
    type Item = Result<Vec<Message>, DriverError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.events.next() {
            self.history.extend(event.iter().cloned());
            self.emitted += 1;
            return Some(Ok(event));
        }
        self.error.take().map(|reason| {
            Err(DriverError::Interrupted {
                after_events: self.emitted,
                reason,
            })
        })
    }
}
