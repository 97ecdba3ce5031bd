use serde::{Deserialize, Serialize};

/// One search hit returned by a tool call.
///
/// Every field is optional; unknown fields in the tool payload are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Relevance in [0, 1] as reported by the search tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Page snippet, when the tool returns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl SearchRecord {
    /// Score used for ranking, clamped to [0, 1]; a missing score counts as 0.
    pub fn effective_score(&self) -> f64 {
        self.score.unwrap_or(0.0).clamp(0.0, 1.0)
    }

    /// Title and url when both are present and non-empty.
    pub fn title_and_url(&self) -> Option<(&str, &str)> {
        let title = self.title.as_deref().filter(|t| !t.is_empty())?;
        let url = self.url.as_deref().filter(|u| !u.is_empty())?;
        Some((title, url))
    }
}
