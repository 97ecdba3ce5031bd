/*
Citation formatting and ranking.

Two policies turn search records into user-facing citation strings:

- Ranked (default): stable sort by score descending (missing score = 0),
  keep scores >= min_score, keep the first max_citations survivors, then
  format "[title](url) (relevance: P%)".
- Unranked: first max_citations records in encounter order, no score filter,
  relevance suffix only when score > 0.

Both policies drop records without a title or url after selection, so a
result may hold fewer than max_citations entries even if more records exist.
Scores outside [0, 1] are clamped before any of this happens.
*/

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::model::search_record::SearchRecord;

/// Default minimum relevance kept by the ranked policy (inclusive).
pub const DEFAULT_MIN_SCORE: f64 = 0.5;
/// Default number of citations kept per turn.
pub const DEFAULT_MAX_CITATIONS: usize = 10;

/// Selection policy applied to search records.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CitationPolicy {
    #[default]
    Ranked,
    Unranked,
}

impl CitationPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ranked => "ranked",
            Self::Unranked => "unranked",
        }
    }
}

impl FromStr for CitationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ranked" => Ok(Self::Ranked),
            "unranked" => Ok(Self::Unranked),
            other => Err(format!(
                "unsupported citation policy '{}'; supported: ranked|unranked",
                other
            )),
        }
    }
}

/// Configuration for citation selection.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CitationConfig {
    pub policy: CitationPolicy,
    /// Minimum score (inclusive) for the ranked policy. Ignored by `Unranked`.
    pub min_score: f64,
    /// Upper bound on records considered per formatting call.
    pub max_citations: usize,
}

impl Default for CitationConfig {
    fn default() -> Self {
        CitationConfig {
            policy: CitationPolicy::Ranked,
            min_score: DEFAULT_MIN_SCORE,
            max_citations: DEFAULT_MAX_CITATIONS,
        }
    }
}

/// Render a score in [0, 1] as a percentage with one decimal place.
pub fn relevance_percent(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

fn link(title: &str, url: &str) -> String {
    format!("[{}]({})", title, url)
}

/// A selected citation together with the source it points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormattedCitation {
    pub title: String,
    pub url: String,
    /// User-facing citation string.
    pub text: String,
}

impl FormattedCitation {
    fn new(title: &str, url: &str, score: Option<f64>) -> Self {
        let text = match score {
            Some(score) => format!(
                "{} (relevance: {})",
                link(title, url),
                relevance_percent(score)
            ),
            None => link(title, url),
        };
        Self {
            title: title.to_string(),
            url: url.to_string(),
            text,
        }
    }
}

/// Select citations from `records` according to `cfg`, keeping the source
/// (title, url) of every entry.
pub fn select_citations(records: &[SearchRecord], cfg: &CitationConfig) -> Vec<FormattedCitation> {
    match cfg.policy {
        CitationPolicy::Ranked => {
            let mut ranked: Vec<&SearchRecord> = records
                .iter()
                .filter(|r| r.effective_score() >= cfg.min_score)
                .collect();
            // `sort_by` is stable, so equal scores keep encounter order.
            ranked.sort_by(|a, b| b.effective_score().total_cmp(&a.effective_score()));
            ranked.truncate(cfg.max_citations);
            ranked
                .into_iter()
                .filter_map(|r| {
                    let (title, url) = r.title_and_url()?;
                    Some(FormattedCitation::new(title, url, Some(r.effective_score())))
                })
                .collect()
        }
        CitationPolicy::Unranked => records
            .iter()
            .take(cfg.max_citations)
            .filter_map(|r| {
                let (title, url) = r.title_and_url()?;
                let score = Some(r.effective_score()).filter(|s| *s > 0.0);
                Some(FormattedCitation::new(title, url, score))
            })
            .collect(),
    }
}

/// Select and format citations from `records` according to `cfg`.
pub fn format_citations(records: &[SearchRecord], cfg: &CitationConfig) -> Vec<String> {
    select_citations(records, cfg)
        .into_iter()
        .map(|c| c.text)
        .collect()
}
