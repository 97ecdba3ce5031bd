use std::collections::HashSet;

use chat_citations::{
    extract_search_records, format_citations, select_citations, CitationAccumulator,
    CitationConfig, CitationPipeline, CitationPolicy, Message, SearchRecord, ToolResultContent,
};
use proptest::prelude::*;
use serde_json::Value;

// Small pools so generated records collide on title and url.
const TITLES: [&str; 4] = ["Doc A", "Doc B", "Doc C", ""];
const URLS: [&str; 4] = ["http://a", "http://b", "http://c", ""];

/// Records with any mix of missing fields; scores stray slightly outside [0, 1].
fn search_record() -> impl Strategy<Value = SearchRecord> {
    (
        prop::option::of(prop::sample::select(TITLES.to_vec())),
        prop::option::of(prop::sample::select(URLS.to_vec())),
        prop::option::of(-0.25f64..1.25),
    )
        .prop_map(|(title, url, score)| SearchRecord {
            title: title.map(str::to_string),
            url: url.map(str::to_string),
            score,
            content: None,
        })
}

fn records() -> impl Strategy<Value = Vec<SearchRecord>> {
    prop::collection::vec(search_record(), 0..40)
}

fn citation_config() -> impl Strategy<Value = CitationConfig> {
    (
        prop_oneof![Just(CitationPolicy::Ranked), Just(CitationPolicy::Unranked)],
        0.0f64..=1.0,
        1usize..15,
    )
        .prop_map(|(policy, min_score, max_citations)| CitationConfig {
            policy,
            min_score,
            max_citations,
        })
}

fn config_with(policy: CitationPolicy) -> impl Strategy<Value = CitationConfig> {
    citation_config().prop_map(move |cfg| CitationConfig { policy, ..cfg })
}

/// Tool-result batches; the flag picks raw text over structured content.
fn batches() -> impl Strategy<Value = Vec<(Vec<SearchRecord>, bool)>> {
    prop::collection::vec(
        (prop::collection::vec(search_record(), 0..8), any::<bool>()),
        0..5,
    )
}

/// Build a conversation with one tool result per batch. Every record's
/// `content` carries its "batch-index" position. Returns the messages and
/// the number of records sent.
fn conversation(
    batches: &[(Vec<SearchRecord>, bool)],
) -> Result<(Vec<Message>, usize), serde_json::Error> {
    let mut messages = vec![Message::user("question")];
    let mut total = 0;
    for (b, (records, as_text)) in batches.iter().enumerate() {
        let values = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                serde_json::to_value(SearchRecord {
                    content: Some(format!("{b}-{i}")),
                    ..record.clone()
                })
            })
            .collect::<Result<Vec<Value>, _>>()?;
        total += values.len();
        let content = if *as_text {
            ToolResultContent::Text(Value::Array(values).to_string())
        } else {
            ToolResultContent::Records(values)
        };
        messages.push(Message::tool_result(content));
        messages.push(Message::assistant_text(format!("step {b}")));
    }
    Ok((messages, total))
}

fn position_of(record: &SearchRecord) -> Option<(usize, usize)> {
    let (batch, index) = record.content.as_deref()?.split_once('-')?;
    Some((batch.parse().ok()?, index.parse().ok()?))
}

fn relevance_of(citation: &str) -> Option<f64> {
    let (_, tail) = citation.rsplit_once("(relevance: ")?;
    tail.strip_suffix("%)")?.parse().ok()
}

proptest! {
    #[test]
    fn extractor_never_grows_or_reorders(
        batches in batches(),
        broken_at in any::<prop::sample::Index>(),
    ) {
        let (mut messages, total) = conversation(&batches)?;
        let at = broken_at.index(messages.len() + 1);
        messages.insert(at, Message::tool_result(ToolResultContent::Text("{broken".to_string())));

        let out = extract_search_records(&messages);
        prop_assert!(out.records.len() <= total);
        prop_assert_eq!(out.skipped_results, 1);

        let positions = out
            .records
            .iter()
            .map(position_of)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| TestCaseError::fail("record lost its position tag"))?;
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn default_ranked_output_is_sorted_filtered_and_capped(records in records()) {
        let citations = format_citations(&records, &CitationConfig::default());
        prop_assert!(citations.len() <= 10);
        let scores = citations
            .iter()
            .map(|c| relevance_of(c))
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| TestCaseError::fail("ranked citation without relevance"))?;
        prop_assert!(scores.iter().all(|s| (50.0..=100.0).contains(s)));
        prop_assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn ranked_output_respects_any_threshold_and_cap(
        records in records(),
        cfg in config_with(CitationPolicy::Ranked),
    ) {
        let citations = format_citations(&records, &cfg);
        prop_assert!(citations.len() <= cfg.max_citations);
        let scores = citations
            .iter()
            .map(|c| relevance_of(c))
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| TestCaseError::fail("ranked citation without relevance"))?;
        // One decimal place of rounding in the rendered percentage.
        let floor = cfg.min_score * 100.0 - 0.05 - 1e-9;
        prop_assert!(scores.iter().all(|s| *s >= floor && *s <= 100.0));
        prop_assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn unranked_output_is_capped_and_keeps_encounter_order(
        records in records(),
        cfg in config_with(CitationPolicy::Unranked),
    ) {
        let expected: Vec<String> = records
            .iter()
            .take(cfg.max_citations)
            .filter_map(|r| r.title_and_url())
            .map(|(title, url)| format!("[{title}]({url})"))
            .collect();
        let citations = format_citations(&records, &cfg);
        prop_assert_eq!(citations.len(), expected.len());
        for (citation, link) in citations.iter().zip(&expected) {
            prop_assert!(citation.starts_with(link.as_str()));
        }
    }

    #[test]
    fn running_twice_is_identical(batches in batches(), cfg in citation_config()) {
        let (messages, _) = conversation(&batches)?;
        let pipeline = CitationPipeline::new(cfg);
        prop_assert_eq!(pipeline.run(&messages), pipeline.run(&messages));
    }

    #[test]
    fn accumulator_keeps_one_entry_per_source(records in records(), cfg in citation_config()) {
        let selected = select_citations(&records, &cfg);
        let sources: HashSet<(String, String)> = selected
            .iter()
            .map(|c| (c.title.clone(), c.url.clone()))
            .collect();

        let mut acc = CitationAccumulator::new();
        prop_assert_eq!(acc.extend(selected.clone()), sources.len());
        prop_assert_eq!(acc.extend(selected), 0);
        prop_assert_eq!(acc.len(), sources.len());
    }

    #[test]
    fn streaming_never_repeats_a_source(batches in batches(), cfg in citation_config()) {
        let (messages, _) = conversation(&batches)?;
        let pipeline = CitationPipeline::new(cfg);
        let mut turn = pipeline.streaming_turn();
        for snapshot in messages.chunks(2) {
            turn.ingest(snapshot);
        }
        let citations = turn.finish().citations;
        let links: HashSet<&str> = citations
            .iter()
            .filter_map(|c| c.split_once(')').map(|(link, _)| link))
            .collect();
        prop_assert_eq!(links.len(), citations.len());
    }
}

#[test]
fn scenario_a_single_ranked_citation() {
    let messages = vec![Message::tool_result(ToolResultContent::Text(
        r#"[{"title":"Doc A","url":"http://a","score":0.9}]"#.to_string(),
    ))];
    let out = CitationPipeline::default().run(&messages);
    assert_eq!(out.citations, vec!["[Doc A](http://a) (relevance: 90.0%)"]);
    assert_eq!(out.answer, "");
}
