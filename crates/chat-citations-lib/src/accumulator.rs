use std::collections::HashSet;

use crate::citation::FormattedCitation;

/// Ordered, de-duplicated citation list for one streaming response turn.
///
/// Entries are unique by their source (title, url): a later citation of the
/// same document is ignored even if its relevance differs. First-seen order
/// is preserved.
#[derive(Debug, Clone, Default)]
pub struct CitationAccumulator {
    citations: Vec<String>,
    seen: HashSet<(String, String)>,
}

impl CitationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `citation` unless its source is already present. Returns whether
    /// it was added.
    pub fn push(&mut self, citation: FormattedCitation) -> bool {
        let FormattedCitation { title, url, text } = citation;
        if !self.seen.insert((title, url)) {
            return false;
        }
        self.citations.push(text);
        true
    }

    /// Push every citation in order; returns how many were new.
    pub fn extend<I>(&mut self, citations: I) -> usize
    where
        I: IntoIterator<Item = FormattedCitation>,
    {
        citations
            .into_iter()
            .map(|c| self.push(c))
            .filter(|added| *added)
            .count()
    }

    pub fn len(&self) -> usize {
        self.citations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.citations.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.citations
    }

    pub fn into_citations(self) -> Vec<String> {
        self.citations
    }
}
