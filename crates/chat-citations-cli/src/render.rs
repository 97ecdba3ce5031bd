use anyhow::Result;
use chat_citations::{ConversationTurn, TurnOutput, FALLBACK_ANSWER};

fn push_sources(out: &mut String, citations: &[String]) {
    if citations.is_empty() {
        return;
    }
    out.push_str("Sources:\n");
    for (i, citation) in citations.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, citation));
    }
}

/// Human-readable form of a pipeline result. An empty answer shows the fallback text.
pub(crate) fn render_output(output: &TurnOutput) -> String {
    let answer = if output.answer.is_empty() {
        FALLBACK_ANSWER
    } else {
        output.answer.as_str()
    };
    let mut out = format!("{}\n", answer);
    push_sources(&mut out, &output.citations);
    out
}

pub(crate) fn render_turn(turn: &ConversationTurn) -> String {
    let mut out = format!("{}> {}\n", turn.role.as_str(), turn.content);
    push_sources(&mut out, turn.citations());
    out
}

/// Spinner shown on stderr while a turn is generated.
pub(crate) struct Spinner {
    #[cfg(feature = "progress")]
    bar: indicatif::ProgressBar,
}

impl Spinner {
    #[cfg(feature = "progress")]
    pub(crate) fn start(message: &str) -> Result<Self> {
        use indicatif::{ProgressBar, ProgressStyle};
        use std::time::Duration;

        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Ok(Self { bar })
    }

    #[cfg(not(feature = "progress"))]
    pub(crate) fn start(_message: &str) -> Result<Self> {
        Ok(Self {})
    }

    pub(crate) fn finish(self) {
        #[cfg(feature = "progress")]
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_answer_renders_fallback() {
        let rendered = render_output(&TurnOutput::default());
        assert_eq!(rendered, format!("{}\n", FALLBACK_ANSWER));
    }

    #[test]
    fn turn_lists_numbered_sources() {
        let turn = ConversationTurn::assistant(
            2,
            "Rust is fast.",
            vec![
                "[A](http://a) (relevance: 90.0%)".to_string(),
                "[B](http://b)".to_string(),
            ],
        );
        assert_eq!(
            render_turn(&turn),
            "assistant> Rust is fast.\nSources:\n  1. [A](http://a) (relevance: 90.0%)\n  2. [B](http://b)\n"
        );
    }

    #[test]
    fn user_turn_has_no_sources_block() {
        let turn = ConversationTurn::user(1, "hello");
        assert_eq!(render_turn(&turn), "user> hello\n");
    }
}
