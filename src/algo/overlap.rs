//! Shared words and phrases between two page texts.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::tokenizer;

/// Tunables for [`overlap_with`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlapConfig {
    /// Tokens shorter than this are left out of word frequencies.
    pub min_word_len: usize,
    pub min_phrase_tokens: usize,
    pub max_phrase_tokens: usize,
    /// A phrase must be strictly longer than this many characters.
    pub min_phrase_chars: usize,
    pub max_phrases: usize,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            min_word_len: 3,
            min_phrase_tokens: 2,
            max_phrase_tokens: 4,
            min_phrase_chars: 10,
            max_phrases: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommonWord {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapResult {
    /// Sorted by count descending, then word ascending.
    pub common_words: Vec<CommonWord>,
    /// Longest phrases first.
    pub common_phrases: Vec<String>,
    pub total_common_word_count: usize,
}

impl OverlapResult {
    pub fn is_empty(&self) -> bool {
        self.common_words.is_empty() && self.common_phrases.is_empty()
    }
}

pub fn overlap(text_a: &str, text_b: &str) -> OverlapResult {
    overlap_with(text_a, text_b, &OverlapConfig::default())
}

/// Compute shared words (count = min of both sides) and shared phrases.
pub fn overlap_with(text_a: &str, text_b: &str, config: &OverlapConfig) -> OverlapResult {
    let norm_a = tokenizer::normalize(text_a);
    let norm_b = tokenizer::normalize(text_b);
    if norm_a.is_empty() || norm_b.is_empty() {
        return OverlapResult::default();
    }

    let tokens_a = norm_a.tokens();
    let tokens_b = norm_b.tokens();

    let common_words = common_words(&tokens_a, &tokens_b, config.min_word_len);
    let total_common_word_count = common_words.iter().map(|w| w.count).sum();
    let common_phrases = common_phrases(&tokens_a, &tokens_b, config);

    OverlapResult {
        common_words,
        common_phrases,
        total_common_word_count,
    }
}

fn common_words(tokens_a: &[&str], tokens_b: &[&str], min_len: usize) -> Vec<CommonWord> {
    let freq_a = tokenizer::word_frequencies(tokens_a, min_len);
    let freq_b = tokenizer::word_frequencies(tokens_b, min_len);

    let (small, large): (&HashMap<String, usize>, &HashMap<String, usize>) =
        if freq_a.len() <= freq_b.len() {
            (&freq_a, &freq_b)
        } else {
            (&freq_b, &freq_a)
        };

    let mut words: Vec<CommonWord> = small
        .iter()
        .filter_map(|(word, &ca)| {
            large.get(word).map(|&cb| CommonWord {
                word: word.clone(),
                count: ca.min(cb),
            })
        })
        .collect();
    words.sort_by(|x, y| y.count.cmp(&x.count).then_with(|| x.word.cmp(&y.word)));
    words
}

/// Longer windows are taken first; a shorter phrase already contained in a
/// kept phrase is skipped. Candidates of one length are visited in sorted
/// order so the cap does not depend on argument order.
fn common_phrases(tokens_a: &[&str], tokens_b: &[&str], config: &OverlapConfig) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    if config.min_phrase_tokens == 0 || config.max_phrases == 0 {
        return kept;
    }

    for n in (config.min_phrase_tokens..=config.max_phrase_tokens).rev() {
        let windows_a: BTreeSet<String> = tokenizer::word_ngrams(tokens_a, n).into_iter().collect();
        if windows_a.is_empty() {
            continue;
        }
        let windows_b: BTreeSet<String> = tokenizer::word_ngrams(tokens_b, n).into_iter().collect();

        for phrase in windows_a.intersection(&windows_b) {
            if phrase.chars().count() <= config.min_phrase_chars {
                continue;
            }
            let padded = format!(" {phrase} ");
            if kept.iter().any(|k| format!(" {k} ").contains(&padded)) {
                continue;
            }
            kept.push(phrase.clone());
            if kept.len() >= config.max_phrases {
                return kept;
            }
        }
    }
    kept
}
