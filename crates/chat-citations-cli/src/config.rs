use chat_citations::{CitationConfig, CitationPolicy};
use std::env;
use thiserror::Error;

pub(crate) const POLICY_VAR: &str = "CHAT_CITATIONS_POLICY";
pub(crate) const MIN_SCORE_VAR: &str = "CHAT_CITATIONS_MIN_SCORE";
pub(crate) const MAX_VAR: &str = "CHAT_CITATIONS_MAX";

#[derive(Debug, Error, PartialEq)]
pub(crate) enum ConfigError {
    #[error("{var}: {message}")]
    InvalidPolicy { var: &'static str, message: String },
    #[error("{var} must be a number, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var} must lie in [0, 1], got {value}")]
    ScoreOutOfRange { var: &'static str, value: f64 },
}

/// Citation defaults loaded from the environment (and `.env` when present).
///
/// Command-line flags take precedence over every value here.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Config {
    pub(crate) policy: Option<CitationPolicy>,
    pub(crate) min_score: Option<f64>,
    pub(crate) max_citations: Option<usize>,
    /// Credentials of the hosted model and search tool a live driver would use.
    pub(crate) anthropic_key_present: bool,
    pub(crate) tavily_key_present: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let policy = match lookup(POLICY_VAR) {
            Some(raw) => Some(raw.parse::<CitationPolicy>().map_err(|message| {
                ConfigError::InvalidPolicy {
                    var: POLICY_VAR,
                    message,
                }
            })?),
            None => None,
        };

        let min_score = lookup(MIN_SCORE_VAR)
            .map(|raw| parse_min_score(MIN_SCORE_VAR, &raw))
            .transpose()?;

        let max_citations = match lookup(MAX_VAR) {
            Some(raw) => Some(raw.trim().parse::<usize>().map_err(|_| {
                ConfigError::InvalidNumber {
                    var: MAX_VAR,
                    value: raw.clone(),
                }
            })?),
            None => None,
        };

        Ok(Self {
            policy,
            min_score,
            max_citations,
            anthropic_key_present: lookup("ANTHROPIC_API_KEY").is_some(),
            tavily_key_present: lookup("TAVILY_API_KEY").is_some(),
        })
    }

    /// Merge flag overrides over the environment over the library defaults.
    pub(crate) fn citation_config(
        &self,
        policy: Option<CitationPolicy>,
        min_score: Option<f64>,
        max_citations: Option<usize>,
    ) -> CitationConfig {
        let defaults = CitationConfig::default();
        CitationConfig {
            policy: policy.or(self.policy).unwrap_or(defaults.policy),
            min_score: min_score
                .or(self.min_score)
                .unwrap_or(defaults.min_score),
            max_citations: max_citations
                .or(self.max_citations)
                .unwrap_or(defaults.max_citations),
        }
    }
}

/// Parse a minimum relevance, which must lie in [0, 1].
fn parse_min_score(var: &'static str, raw: &str) -> Result<f64, ConfigError> {
    let value: f64 = raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: raw.to_string(),
    })?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ScoreOutOfRange { var, value });
    }
    Ok(value)
}

/// clap value parser for `--min-score`.
pub(crate) fn min_score_flag(raw: &str) -> Result<f64, ConfigError> {
    parse_min_score("--min-score", raw)
}
