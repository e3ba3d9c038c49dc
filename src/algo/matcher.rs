//! Term matchers used by search and highlighting.
//!
//! Fallback order for a single word: whole-word regex, then plain substring
//! when the regex cannot be built. Substring counting can overcount (`cat`
//! inside `concat`); that is accepted as a last resort.
//!
//! Word boundaries follow `tokenizer::normalize`: only letters and digits are
//! word characters, so `_` separates words here just as it does there. The
//! `regex` crate's `\b` counts `_` as a word character, hence the explicit
//! boundary check in [`bounded_matches`].

use regex::{Regex, RegexBuilder};
use tracing::warn;

#[derive(Debug, Clone)]
pub enum TermMatcher {
    /// Literal, non-overlapping occurrences of a multi-word phrase.
    Phrase(String),
    /// Whole-word, boundary-checked match.
    Word(Regex),
    /// Plain substring occurrences.
    Substring(String),
}

impl TermMatcher {
    /// Interior whitespace of `phrase` collapses to single spaces.
    pub fn phrase(phrase: &str) -> Self {
        let collapsed = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::Phrase(collapsed.to_lowercase())
    }

    pub fn word(word: &str) -> Self {
        let lower = word.trim().to_lowercase();
        match word_regex(&lower) {
            Some(re) => Self::Word(re),
            None => Self::Substring(lower),
        }
    }

    /// Count occurrences in text that is already lowercase.
    pub fn count(&self, haystack: &str) -> usize {
        match self {
            Self::Phrase(p) | Self::Substring(p) => {
                if p.is_empty() {
                    0
                } else {
                    haystack.matches(p.as_str()).count()
                }
            }
            Self::Word(re) => bounded_matches(re, haystack).count(),
        }
    }
}

/// True unless letters or digits sit on both sides of byte offset `at`.
fn on_boundary(text: &str, at: usize) -> bool {
    let before = text[..at].chars().next_back();
    let after = text[at..].chars().next();
    !matches!((before, after), (Some(b), Some(a)) if b.is_alphanumeric() && a.is_alphanumeric())
}

/// Byte ranges of `re` matches that start and end on word boundaries.
pub fn bounded_matches<'a>(re: &'a Regex, text: &'a str) -> impl Iterator<Item = (usize, usize)> + 'a {
    re.find_iter(text)
        .filter(move |m| on_boundary(text, m.start()) && on_boundary(text, m.end()))
        .map(|m| (m.start(), m.end()))
}

/// Case-insensitive pattern for `term`, escaped. Use it through
/// [`bounded_matches`] for whole-word hits. `None` if the pattern cannot be
/// compiled.
pub fn word_regex(term: &str) -> Option<Regex> {
    if term.is_empty() {
        return None;
    }
    match RegexBuilder::new(&regex::escape(term)).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(term, error = %e, "word pattern rejected, falling back to substring");
            None
        }
    }
}

/// Case-insensitive phrase pattern in which any run of non-alphanumeric
/// characters may separate the tokens, so `quick brown` also matches
/// `Quick, brown` in raw text. Use it through [`bounded_matches`].
pub fn phrase_regex(phrase: &str) -> Option<Regex> {
    let tokens: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
    if tokens.is_empty() {
        return None;
    }
    let pattern = tokens.join(r"[^\p{L}\p{N}]+");
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(phrase, error = %e, "phrase pattern rejected");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrase_counts_literal_non_overlapping() {
        let m = TermMatcher::phrase("The   Cat sat");
        let text = "the cat sat on it. the cat sat again";
        assert_eq!(m.count(text), 2);
        let m = TermMatcher::phrase("aa aa");
        assert_eq!(m.count("aa aa aa"), 1);
    }

    #[test]
    fn word_respects_boundaries() {
        let m = TermMatcher::word("cat");
        assert!(matches!(m, TermMatcher::Word(_)));
        assert_eq!(m.count("concatenate the cat"), 1);
    }

    #[test]
    fn word_escapes_special_characters() {
        let m = TermMatcher::word("c.t");
        assert_eq!(m.count("cat c.t cut"), 1);
    }

    #[test]
    fn substring_overcounts() {
        let m = TermMatcher::Substring("cat".into());
        assert_eq!(m.count("concatenate the cat"), 2);
    }

    #[test]
    fn empty_terms_match_nothing() {
        assert_eq!(TermMatcher::phrase("   ").count("anything"), 0);
        assert_eq!(TermMatcher::word("").count("anything"), 0);
        assert!(phrase_regex("").is_none());
    }

    #[test]
    fn phrase_regex_spans_punctuation() {
        let re = phrase_regex("quick brown").unwrap();
        assert_eq!(bounded_matches(&re, "The Quick, brown fox").count(), 1);
        assert_eq!(bounded_matches(&re, "quickbrown").count(), 0);
        assert_eq!(bounded_matches(&re, "superquick brown").count(), 0);
    }

    #[test]
    fn underscore_separates_words() {
        let m = TermMatcher::word("foo");
        assert_eq!(m.count("foo_bar baz foo"), 2);
        assert_eq!(m.count("foobar"), 0);
        let re = phrase_regex("bar baz").unwrap();
        assert_eq!(bounded_matches(&re, "foo_bar baz").count(), 1);
    }
}
