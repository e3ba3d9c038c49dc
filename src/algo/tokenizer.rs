use std::collections::HashMap;

/// Page text canonicalized for comparison: lowercase, punctuation replaced by
/// spaces, whitespace collapsed, trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every token, including short ones. Phrase windows are built from this.
    pub fn tokens(&self) -> Vec<&str> {
        self.0.split(' ').filter(|t| !t.is_empty()).collect()
    }
}

/// Normalize raw text. Any character that is not a letter, digit, or
/// whitespace becomes a space.
pub fn normalize(text: &str) -> NormalizedText {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    NormalizedText(out)
}

/// Tokens long enough to count as words (`min_len` characters or more).
pub fn word_tokens<'a>(tokens: &[&'a str], min_len: usize) -> Vec<&'a str> {
    tokens
        .iter()
        .copied()
        .filter(|t| t.chars().count() >= min_len)
        .collect()
}

/// Word -> occurrence count over length-filtered tokens.
pub fn word_frequencies(tokens: &[&str], min_len: usize) -> HashMap<String, usize> {
    let mut freq: HashMap<String, usize> = HashMap::new();
    for token in word_tokens(tokens, min_len) {
        *freq.entry(token.to_string()).or_insert(0) += 1;
    }
    freq
}

/// Generate word n-grams from a token list. Shorter inputs yield nothing.
pub fn word_ngrams(tokens: &[&str], n: usize) -> Vec<String> {
    if n == 0 || tokens.len() < n {
        return Vec::new();
    }
    tokens.windows(n).map(|w| w.join(" ")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_basic() {
        let n = normalize("  Hello, World!  This   is\ta TEST.  ");
        assert_eq!(n.as_str(), "hello world this is a test");
    }

    #[test]
    fn normalize_punctuation_only() {
        assert!(normalize("!!! ... ???").is_empty());
        assert!(normalize("").is_empty());
    }

    #[test]
    fn normalize_keeps_digits_and_unicode_letters() {
        let n = normalize("Café-2024 naïve");
        assert_eq!(n.as_str(), "café 2024 naïve");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("It's a dog-eat-dog world, isn't it?");
        let twice = normalize(once.as_str());
        assert_eq!(once, twice);
    }

    #[test]
    fn tokens_include_short_words() {
        let n = normalize("I am a developer");
        assert_eq!(n.tokens(), vec!["i", "am", "a", "developer"]);
    }

    #[test]
    fn word_frequencies_filter_short() {
        let n = normalize("the cat and the dog at a cat show");
        let freq = word_frequencies(&n.tokens(), 3);
        assert_eq!(freq.get("cat"), Some(&2));
        assert_eq!(freq.get("the"), Some(&2));
        assert_eq!(freq.get("at"), None);
        assert_eq!(freq.get("a"), None);
    }

    #[test]
    fn word_ngrams_basic() {
        let tokens = vec!["rust", "plugin", "system"];
        assert_eq!(word_ngrams(&tokens, 2), vec!["rust plugin", "plugin system"]);
        assert!(word_ngrams(&tokens, 4).is_empty());
    }
}
