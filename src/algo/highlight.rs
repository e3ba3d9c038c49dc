//! Span-based highlighting of shared content.
//!
//! Matches are collected as byte spans first (phrases before words, longest
//! first, never overlapping an earlier span) and rendered in one pass, so a
//! word can never be marked inside an already-marked phrase.

use serde::{Deserialize, Serialize};

use super::matcher;
use super::overlap::OverlapResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Phrase,
    Word,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightSpan {
    pub start: usize,
    pub end: usize,
    pub kind: MatchKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HighlightConfig {
    pub top_phrases: usize,
    pub top_words: usize,
    pub open: String,
    pub close: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            top_phrases: 10,
            top_words: 20,
            open: "<mark>".into(),
            close: "</mark>".into(),
        }
    }
}

fn overlaps(spans: &[HighlightSpan], start: usize, end: usize) -> bool {
    spans.iter().any(|s| start < s.end && s.start < end)
}

fn collect<'a>(
    text: &str,
    terms: impl IntoIterator<Item = &'a str>,
    kind: MatchKind,
    spans: &mut Vec<HighlightSpan>,
) {
    let mut terms: Vec<&str> = terms.into_iter().filter(|t| !t.trim().is_empty()).collect();
    // Longest first; stable so equal lengths keep caller order.
    terms.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

    for term in terms {
        let re = match kind {
            MatchKind::Phrase => matcher::phrase_regex(term),
            MatchKind::Word => matcher::word_regex(term),
        };
        let Some(re) = re else { continue };
        for (start, end) in matcher::bounded_matches(&re, text) {
            if !overlaps(spans, start, end) {
                spans.push(HighlightSpan { start, end, kind });
            }
        }
    }
}

/// Non-overlapping match spans in `text`, sorted by start offset.
pub fn highlight_spans(text: &str, phrases: &[&str], words: &[&str]) -> Vec<HighlightSpan> {
    let mut spans = Vec::new();
    collect(text, phrases.iter().copied(), MatchKind::Phrase, &mut spans);
    collect(text, words.iter().copied(), MatchKind::Word, &mut spans);
    spans.sort_by_key(|s| s.start);
    spans
}

/// Wrap every span in `open`/`close` markers.
pub fn render(text: &str, spans: &[HighlightSpan], open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len() + spans.len() * (open.len() + close.len()));
    let mut cursor = 0;
    for span in spans {
        out.push_str(&text[cursor..span.start]);
        out.push_str(open);
        out.push_str(&text[span.start..span.end]);
        out.push_str(close);
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Mark the top phrases and words of `overlap` inside the original `text`.
pub fn highlight_similar_text(text: &str, overlap: &OverlapResult, config: &HighlightConfig) -> String {
    let phrases: Vec<&str> = overlap
        .common_phrases
        .iter()
        .take(config.top_phrases)
        .map(String::as_str)
        .collect();
    let words: Vec<&str> = overlap
        .common_words
        .iter()
        .take(config.top_words)
        .map(|w| w.word.as_str())
        .collect();
    let spans = highlight_spans(text, &phrases, &words);
    render(text, &spans, &config.open, &config.close)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::overlap::overlap;

    #[test]
    fn words_never_nest_inside_phrases() {
        let text = "The quick brown fox. A brown dog.";
        let spans = highlight_spans(text, &["quick brown fox"], &["brown"]);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].kind, MatchKind::Phrase);
        assert_eq!(&text[spans[0].start..spans[0].end], "quick brown fox");
        assert_eq!(spans[1].kind, MatchKind::Word);
        assert_eq!(&text[spans[1].start..spans[1].end], "brown");
        let out = render(text, &spans, "[", "]");
        assert_eq!(out, "The [quick brown fox]. A [brown] dog.");
    }

    #[test]
    fn longer_phrase_wins() {
        let text = "big red barn door";
        let spans = highlight_spans(text, &["red barn", "big red barn door"], &[]);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].end - spans[0].start, text.len());
    }

    #[test]
    fn matching_is_case_insensitive_and_whole_word() {
        let text = "Cat, concatenate, CAT.";
        let spans = highlight_spans(text, &[], &["cat"]);
        let out = render(text, &spans, "<", ">");
        assert_eq!(out, "<Cat>, concatenate, <CAT>.");
    }

    #[test]
    fn underscore_is_a_word_separator() {
        let text = "foo_bar baz";
        let spans = highlight_spans(text, &[], &["foo"]);
        assert_eq!(render(text, &spans, "<", ">"), "<foo>_bar baz");
    }

    #[test]
    fn phrase_matches_across_punctuation() {
        let text = "Hello, world! hello world";
        let spans = highlight_spans(text, &["hello world"], &[]);
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn special_characters_are_literal() {
        let text = "the u.s office, the uxs office";
        let spans = highlight_spans(text, &[], &["u.s"]);
        assert_eq!(spans.len(), 1);
        assert_eq!(&text[spans[0].start..spans[0].end], "u.s");
    }

    #[test]
    fn highlight_from_overlap() {
        let a = "Rust programming language is fast and reliable.";
        let b = "The Rust programming language is loved.";
        let o = overlap(a, b);
        let out = highlight_similar_text(a, &o, &HighlightConfig::default());
        assert!(out.starts_with("<mark>Rust programming language is</mark>"));
        assert!(!out.contains("<mark><mark>"));
    }

    #[test]
    fn no_terms_returns_text_unchanged() {
        let text = "nothing to see";
        assert_eq!(render(text, &highlight_spans(text, &[], &[]), "<", ">"), text);
    }
}
