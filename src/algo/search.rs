//! Keyword and phrase search across full page text.

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::matcher::TermMatcher;
use crate::model::PageRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Keyword,
    Phrase,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Phrase => "phrase",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub count: usize,
    pub word_count: u64,
    /// `count / word_count * 100`, or 0 for pages without a word count.
    pub percentage: f64,
}

/// Outcome of one query. "No term" and "no hits" are answers, not errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SearchOutcome {
    /// The caller should prompt for a term.
    EmptyTerm,
    NoHits {
        term: String,
        kind: QueryKind,
    },
    Hits {
        term: String,
        kind: QueryKind,
        hits: Vec<SearchHit>,
    },
}

impl SearchOutcome {
    pub fn hits(&self) -> &[SearchHit] {
        match self {
            Self::Hits { hits, .. } => hits,
            _ => &[],
        }
    }
}

enum Query {
    Phrase(TermMatcher),
    Keyword { term: String, matcher: TermMatcher },
}

impl Query {
    fn count(&self, page: &PageRecord) -> usize {
        match self {
            Self::Phrase(m) => m.count(&page.text_content.to_lowercase()),
            Self::Keyword { term, matcher } => match page.keywords.term_counts.get(term) {
                Some(&n) => n as usize,
                None => matcher.count(&page.text_content.to_lowercase()),
            },
        }
    }
}

/// Case-insensitive search. Multi-word terms are matched as literal phrases;
/// single words consult the page's precomputed term counts before scanning
/// the text on word boundaries. Hits are sorted by count descending, ties in
/// report order.
pub fn search(term: &str, pages: &[PageRecord]) -> SearchOutcome {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return SearchOutcome::EmptyTerm;
    }

    let words: Vec<&str> = term.split_whitespace().collect();
    let (kind, query) = if words.len() > 1 {
        (QueryKind::Phrase, Query::Phrase(TermMatcher::phrase(&term)))
    } else {
        (
            QueryKind::Keyword,
            Query::Keyword {
                term: term.clone(),
                matcher: TermMatcher::word(&term),
            },
        )
    };
    let term = words.join(" ");

    let mut hits: Vec<SearchHit> = pages
        .par_iter()
        .filter_map(|page| {
            let count = query.count(page);
            if count == 0 {
                return None;
            }
            let percentage = if page.word_count > 0 {
                count as f64 / page.word_count as f64 * 100.0
            } else {
                0.0
            };
            Some(SearchHit {
                url: page.url.clone(),
                title: page.title.clone(),
                count,
                word_count: page.word_count,
                percentage,
            })
        })
        .collect();

    hits.sort_by(|a, b| b.count.cmp(&a.count));
    debug!(term = %term, kind = kind.as_str(), hits = hits.len(), "search finished");

    if hits.is_empty() {
        SearchOutcome::NoHits { term, kind }
    } else {
        SearchOutcome::Hits { term, kind, hits }
    }
}
