//! Messages produced by the conversation driver.
//!
//! Each message kind and each content shape is an explicit enum variant so the
//! pipeline resolves shapes with `match` at its boundary. The JSON form uses a
//! `"type"` tag; the LangChain-style names `human` / `ai` are accepted as
//! aliases when reading.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of the ordered message sequence handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    #[serde(alias = "human")]
    User { text: String },
    #[serde(alias = "ai")]
    Assistant {
        content: AssistantContent,
        /// Tool invocations requested alongside (or instead of) text.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        #[serde(default)]
        content: ToolResultContent,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call_id: Option<String>,
    },
}

/// Assistant content: a plain string or a list of typed blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssistantContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A typed assistant content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    /// Any other block kind (thinking, images, ...). Carries no text.
    #[serde(other)]
    Unknown,
}

/// Tool result content: raw text expected to hold a JSON list, or records
/// that are already structured.
///
/// Any other JSON shape (object, number, null, missing) lands in `Other` so a
/// single odd tool result cannot fail decoding of the whole sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Records(Vec<Value>),
    Other(Value),
}

impl Default for ToolResultContent {
    fn default() -> Self {
        ToolResultContent::Other(Value::Null)
    }
}

/// A tool invocation request attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Message::User { text: text.into() }
    }

    /// Assistant message with plain string content and no tool calls.
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Message::Assistant {
            content: AssistantContent::Text(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Message::Assistant {
            content: AssistantContent::Blocks(blocks),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_result(content: ToolResultContent) -> Self {
        Message::Tool {
            content,
            name: None,
            tool_call_id: None,
        }
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self, Message::Assistant { .. })
    }

    /// Number of tool invocations this message requests.
    ///
    /// Counts both the `tool_calls` list and `tool_use` content blocks; zero
    /// for user and tool messages.
    pub fn tool_request_count(&self) -> usize {
        match self {
            Message::Assistant {
                content,
                tool_calls,
            } => {
                let from_blocks = match content {
                    AssistantContent::Text(_) => 0,
                    AssistantContent::Blocks(blocks) => blocks
                        .iter()
                        .filter(|b| matches!(b, ContentBlock::ToolUse { .. }))
                        .count(),
                };
                tool_calls.len() + from_blocks
            }
            Message::User { .. } | Message::Tool { .. } => 0,
        }
    }
}

impl AssistantContent {
    /// Text payload of this content, if any.
    ///
    /// Plain string content is returned as-is (even when empty); block content
    /// yields the payload of the first `text` block.
    pub fn text(&self) -> Option<&str> {
        match self {
            AssistantContent::Text(s) => Some(s.as_str()),
            AssistantContent::Blocks(blocks) => blocks.iter().find_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_tagged_messages_with_both_content_shapes() {
        let raw = json!([
            {"type": "human", "text": "what is rust?"},
            {"type": "ai", "content": [
                {"type": "thinking", "thinking": "hmm", "signature": "x"},
                {"type": "tool_use", "id": "t1", "name": "tavily_search", "input": {"query": "rust"}}
            ]},
            {"type": "tool", "name": "tavily_search", "content": "[{\"title\":\"Rust\"}]"},
            {"type": "tool", "content": [{"title": "Rust", "url": "https://rust-lang.org"}]},
            {"type": "assistant", "content": "Rust is a language."}
        ]);
        let messages: Vec<Message> = serde_json::from_value(raw).unwrap();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0], Message::user("what is rust?"));
        match &messages[1] {
            Message::Assistant {
                content: AssistantContent::Blocks(blocks),
                ..
            } => {
                assert_eq!(blocks[0], ContentBlock::Unknown);
                assert!(matches!(blocks[1], ContentBlock::ToolUse { .. }));
            }
            other => panic!("unexpected message {other:?}"),
        }
        assert!(matches!(
            messages[2],
            Message::Tool {
                content: ToolResultContent::Text(_),
                ..
            }
        ));
        assert!(matches!(
            messages[3],
            Message::Tool {
                content: ToolResultContent::Records(_),
                ..
            }
        ));
        assert_eq!(messages[4], Message::assistant_text("Rust is a language."));
    }

    #[test]
    fn unexpected_tool_content_shapes_still_decode() {
        let raw = json!([
            {"type": "tool", "content": {"results": []}},
            {"type": "tool", "content": 3},
            {"type": "tool", "content": null},
            {"type": "tool", "name": "search"},
            {"type": "assistant", "content": "ok"}
        ]);
        let messages: Vec<Message> = serde_json::from_value(raw).unwrap();
        assert_eq!(messages.len(), 5);
        assert_eq!(
            messages[0],
            Message::tool_result(ToolResultContent::Other(json!({"results": []})))
        );
        assert!(matches!(
            &messages[3],
            Message::Tool {
                content: ToolResultContent::Other(Value::Null),
                ..
            }
        ));
    }

    #[test]
    fn counts_tool_requests_from_calls_and_blocks() {
        let msg = Message::Assistant {
            content: AssistantContent::Blocks(vec![
                ContentBlock::Text {
                    text: "searching".into(),
                },
                ContentBlock::ToolUse {
                    id: "a".into(),
                    name: "search".into(),
                    input: Value::Null,
                },
            ]),
            tool_calls: vec![ToolCall {
                id: None,
                name: "search".into(),
                args: json!({"query": "x"}),
            }],
        };
        assert_eq!(msg.tool_request_count(), 2);
        assert_eq!(Message::user("hi").tool_request_count(), 0);
    }

    #[test]
    fn text_prefers_first_text_block() {
        let content = AssistantContent::Blocks(vec![
            ContentBlock::Unknown,
            ContentBlock::Text {
                text: "first".into(),
            },
            ContentBlock::Text {
                text: "second".into(),
            },
        ]);
        assert_eq!(content.text(), Some("first"));
        assert_eq!(AssistantContent::Blocks(vec![]).text(), None);
        assert_eq!(AssistantContent::Text(String::new()).text(), Some(""));
    }
}
