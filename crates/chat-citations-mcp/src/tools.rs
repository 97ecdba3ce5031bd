// Rust guideline compliant 2026-10-18

use std::path::Path;

use chat_citations::{
    load_session_json, resolve_final_answer, CitationConfig, CitationPipeline, CitationPolicy,
    Message, Role, FALLBACK_ANSWER,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    schemars,
};
use serde::Deserialize;

const MAX_CITATIONS_CAP: usize = 50;
const DEFAULT_SNIPPET_CHARS: usize = 140;

/// Input for extracting the answer and citations of a message sequence.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExtractCitationsInput {
    #[schemars(description = "JSON array of chat messages (user / assistant / tool)")]
    pub messages_json: String,
    #[schemars(description = "Citation policy: ranked (default) or unranked")]
    pub policy: Option<String>,
    #[schemars(description = "Minimum relevance kept by the ranked policy (default: 0.5)")]
    pub min_score: Option<f64>,
    #[schemars(description = "Maximum number of citations (default: 10)")]
    pub max_citations: Option<usize>,
}

/// Input for resolving only the final answer.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ResolveAnswerInput {
    #[schemars(description = "JSON array of chat messages (user / assistant / tool)")]
    pub messages_json: String,
}

/// Input for summarising a saved transcript.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TranscriptSummaryInput {
    #[schemars(description = "Path to a saved session JSON file")]
    pub session_path: String,
    #[schemars(description = "Maximum characters of the last answer to show (default: 140)")]
    pub snippet_chars: Option<usize>,
}

/// MCP server that exposes the citation pipeline as compact markdown tools.
#[derive(Debug, Clone)]
pub struct ChatCitationsMcpServer {
    pub tool_router: ToolRouter<Self>,
}

#[rmcp::tool_router]
impl ChatCitationsMcpServer {
    /// Construct a new server instance.
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    /// Extract the final answer and ranked citations from a message sequence.
    #[rmcp::tool(
        description = "Resolve the final answer and formatted source citations of a chat message sequence"
    )]
    fn extract_citations(&self, Parameters(input): Parameters<ExtractCitationsInput>) -> String {
        match self.extract_citations_impl(input) {
            Ok(output) => output,
            Err(err) => format!("Error: {err}"),
        }
    }

    /// Resolve only the final answer of a message sequence.
    #[rmcp::tool(description = "Resolve the final assistant answer of a chat message sequence")]
    fn resolve_answer(&self, Parameters(input): Parameters<ResolveAnswerInput>) -> String {
        match self.resolve_answer_impl(input) {
            Ok(output) => output,
            Err(err) => format!("Error: {err}"),
        }
    }

    /// Summarise a saved session transcript.
    #[rmcp::tool(description = "Return compact summary metadata for a saved chat transcript")]
    fn transcript_summary(&self, Parameters(input): Parameters<TranscriptSummaryInput>) -> String {
        match self.transcript_summary_impl(input) {
            Ok(output) => output,
            Err(err) => format!("Error: {err}"),
        }
    }
}

impl ChatCitationsMcpServer {
    fn parse_messages(raw: &str) -> anyhow::Result<Vec<Message>> {
        serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("invalid messages_json: {e}"))
    }

    fn config_from(input: &ExtractCitationsInput) -> anyhow::Result<CitationConfig> {
        let defaults = CitationConfig::default();
        let policy = match input.policy.as_deref() {
            Some(raw) => raw
                .parse::<CitationPolicy>()
                .map_err(|e| anyhow::anyhow!(e))?,
            None => defaults.policy,
        };
        Ok(CitationConfig {
            policy,
            min_score: input
                .min_score
                .unwrap_or(defaults.min_score)
                .clamp(0.0, 1.0),
            max_citations: input
                .max_citations
                .unwrap_or(defaults.max_citations)
                .clamp(1, MAX_CITATIONS_CAP),
        })
    }

    fn compact_snippet(text: &str, max_chars: usize) -> String {
        let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if single_line.chars().count() <= max_chars {
            single_line
        } else {
            let mut out: String = single_line.chars().take(max_chars).collect();
            out.push_str("...");
            out
        }
    }

    fn answer_or_fallback(answer: &str) -> &str {
        if answer.is_empty() {
            FALLBACK_ANSWER
        } else {
            answer
        }
    }

    fn extract_citations_impl(&self, input: ExtractCitationsInput) -> anyhow::Result<String> {
        let messages = Self::parse_messages(&input.messages_json)?;
        let config = Self::config_from(&input)?;
        let pipeline = CitationPipeline::new(config);
        let output = pipeline.run(&messages);

        let mut out = String::new();
        out.push_str("# Answer\n");
        out.push_str(Self::answer_or_fallback(&output.answer));
        out.push_str("\n\n");
        out.push_str(&format!(
            "- policy: {}\n- messages: {}\n- citations: {}\n",
            pipeline.config().policy.as_str(),
            messages.len(),
            output.citations.len()
        ));

        if !output.citations.is_empty() {
            out.push_str("\n## Sources\n");
            for (idx, citation) in output.citations.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", idx + 1, citation));
            }
        }
        Ok(out)
    }

    fn resolve_answer_impl(&self, input: ResolveAnswerInput) -> anyhow::Result<String> {
        let messages = Self::parse_messages(&input.messages_json)?;
        let answer = resolve_final_answer(&messages);
        Ok(Self::answer_or_fallback(&answer).to_string())
    }

    fn transcript_summary_impl(&self, input: TranscriptSummaryInput) -> anyhow::Result<String> {
        let path = Path::new(&input.session_path);
        let session = load_session_json(path)
            .map_err(|e| anyhow::anyhow!("failed to load transcript '{}': {e}", path.display()))?;
        let snippet_chars = input
            .snippet_chars
            .unwrap_or(DEFAULT_SNIPPET_CHARS)
            .clamp(40, 300);

        let user_turns = session
            .turns()
            .iter()
            .filter(|t| t.role == Role::User)
            .count();
        let assistant_turns = session.turns().len() - user_turns;
        let citation_count: usize = session.turns().iter().map(|t| t.citations().len()).sum();

        let mut out = String::new();
        out.push_str("# Transcript Summary\n");
        out.push_str(&format!("- session: `{}`\n", input.session_path));
        out.push_str(&format!("- conversation_id: {}\n", session.conversation_id()));
        out.push_str(&format!("- user_turns: {}\n", user_turns));
        out.push_str(&format!("- assistant_turns: {}\n", assistant_turns));
        out.push_str(&format!("- citations: {}\n", citation_count));

        if let Some(last) = session
            .turns()
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
        {
            out.push_str(&format!(
                "- last_answer: {}\n",
                Self::compact_snippet(&last.content, snippet_chars)
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> ChatCitationsMcpServer {
        ChatCitationsMcpServer::new()
    }

    #[test]
    fn extract_lists_sources_in_markdown() {
        let input = ExtractCitationsInput {
            messages_json: r#"[
                {"type":"tool","content":"[{\"title\":\"Doc A\",\"url\":\"http://a\",\"score\":0.9}]"},
                {"type":"assistant","content":[{"type":"text","text":"Hello"}]}
            ]"#
            .to_string(),
            policy: None,
            min_score: None,
            max_citations: None,
        };
        let out = server().extract_citations_impl(input).unwrap();
        assert!(out.starts_with("# Answer\nHello\n"));
        assert!(out.contains("1. [Doc A](http://a) (relevance: 90.0%)"));
    }

    #[test]
    fn extract_skips_tool_result_of_unexpected_shape() {
        let input = ExtractCitationsInput {
            messages_json: r#"[
                {"type":"tool","content":{"results":[]}},
                {"type":"tool","content":"[{\"title\":\"Doc A\",\"url\":\"http://a\",\"score\":0.9}]"},
                {"type":"assistant","content":"ok"}
            ]"#
            .to_string(),
            policy: None,
            min_score: None,
            max_citations: None,
        };
        let out = server().extract_citations_impl(input).unwrap();
        assert!(out.starts_with("# Answer\nok\n"));
        assert!(out.contains("- citations: 1\n"));
        assert!(out.contains("1. [Doc A](http://a) (relevance: 90.0%)"));
    }

    #[test]
    fn extract_rejects_unknown_policy() {
        let input = ExtractCitationsInput {
            messages_json: "[]".to_string(),
            policy: Some("random".to_string()),
            min_score: None,
            max_citations: None,
        };
        assert!(server().extract_citations_impl(input).is_err());
    }

    #[test]
    fn resolve_answer_falls_back_on_empty_sequence() {
        let out = server()
            .resolve_answer_impl(ResolveAnswerInput {
                messages_json: "[]".to_string(),
            })
            .unwrap();
        assert_eq!(out, FALLBACK_ANSWER);
    }

    #[test]
    fn compact_snippet_truncates_on_char_boundary() {
        let text = "é".repeat(50);
        let out = ChatCitationsMcpServer::compact_snippet(&text, 40);
        assert_eq!(out.chars().count(), 43);
        assert!(out.ends_with("..."));
    }
}
