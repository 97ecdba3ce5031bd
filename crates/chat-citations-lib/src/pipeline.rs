//! Citation extraction pipeline: message sequence in, answer and citations out.
//!
//! `CitationPipeline::run` handles a complete message sequence in one call.
//! `StreamingTurn` handles a turn delivered as a series of driver snapshots:
//! citations accumulate across snapshots, one per source (title, url), and
//! the answer is the last non-empty assistant text seen.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accumulator::CitationAccumulator;
use crate::answer::{resolve_final_answer, StreamingAnswer};
use crate::citation::{select_citations, CitationConfig, FormattedCitation};
use crate::extract::extract_search_records;
use crate::model::message::Message;

/// Result of one pipeline execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnOutput {
    /// Final assistant text; empty when none could be resolved.
    pub answer: String,
    pub citations: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CitationPipeline {
    config: CitationConfig,
}

impl CitationPipeline {
    pub fn new(config: CitationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CitationConfig {
        &self.config
    }

    /// Format citations for the tool results in `messages`.
    pub fn citations(&self, messages: &[Message]) -> Vec<String> {
        self.selected_citations(messages).into_iter().map(|c| c.text).collect()
    }

    /// Like [`CitationPipeline::citations`], keeping each entry's source.
    pub fn selected_citations(&self, messages: &[Message]) -> Vec<FormattedCitation> {
        let extracted = extract_search_records(messages);
        debug!(
            records = extracted.records.len(),
            tool_requests = extracted.tool_requests,
            skipped = extracted.skipped_results,
            policy = self.config.policy.as_str(),
            "extracted search records"
        );
        select_citations(&extracted.records, &self.config)
    }

    /// Single-shot execution over a complete message sequence.
    pub fn run(&self, messages: &[Message]) -> TurnOutput {
        TurnOutput {
            answer: resolve_final_answer(messages),
            citations: self.citations(messages),
        }
    }

    /// Start a streaming turn. The returned state lives for one response turn.
    pub fn streaming_turn(&self) -> StreamingTurn<'_> {
        StreamingTurn {
            pipeline: self,
            accumulator: CitationAccumulator::new(),
            answer: StreamingAnswer::new(),
            snapshots: 0,
        }
    }
}

/// Per-turn state of a streaming response.
#[derive(Debug)]
pub struct StreamingTurn<'a> {
    pipeline: &'a CitationPipeline,
    accumulator: CitationAccumulator,
    answer: StreamingAnswer,
    snapshots: usize,
}

impl StreamingTurn<'_> {
    /// Process one snapshot emitted by the driver.
    pub fn ingest(&mut self, snapshot: &[Message]) {
        self.snapshots += 1;
        let added = self
            .accumulator
            .extend(self.pipeline.selected_citations(snapshot));
        for message in snapshot {
            self.answer.observe(message);
        }
        debug!(
            snapshot = self.snapshots,
            new_citations = added,
            total_citations = self.accumulator.len(),
            "ingested streaming snapshot"
        );
    }

    /// Answer as of the last ingested snapshot.
    pub fn current_answer(&self) -> &str {
        self.answer.current()
    }

    pub fn citations(&self) -> &[String] {
        self.accumulator.as_slice()
    }

    pub fn snapshots(&self) -> usize {
        self.snapshots
    }

    /// Commit the turn, discarding the accumulator.
    pub fn finish(self) -> TurnOutput {
        TurnOutput {
            answer: self.answer.into_answer(),
            citations: self.accumulator.into_citations(),
        }
    }
}
