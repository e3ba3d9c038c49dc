//! Engine tunables, loadable from a JSON file. Every field has a default, so
//! a partial file (or none at all) is fine.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algo::advisory::AdvisoryThresholds;
use crate::algo::dedup::DEFAULT_SIMILARITY_THRESHOLD;
use crate::algo::highlight::HighlightConfig;
use crate::algo::overlap::OverlapConfig;
use crate::algo::scoring::IssueThresholds;
use crate::error::{AnalyticsError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyticsConfig {
    /// Minimum similarity percentage for a pair to be reported.
    pub similarity_threshold: f64,
    pub overlap: OverlapConfig,
    pub highlight: HighlightConfig,
    pub issue_thresholds: IssueThresholds,
    pub advisory: AdvisoryThresholds,
    pub hub_pages: usize,
    pub top_keywords: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            overlap: OverlapConfig::default(),
            highlight: HighlightConfig::default(),
            issue_thresholds: IssueThresholds::default(),
            advisory: AdvisoryThresholds::default(),
            hub_pages: 10,
            top_keywords: 20,
        }
    }
}

/// Reject a percentage outside [0, 100].
pub fn check_threshold(threshold: f64) -> Result<f64> {
    if (0.0..=100.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(AnalyticsError::InvalidArgument(format!(
            "threshold must be between 0 and 100, got {threshold}"
        )))
    }
}

impl AnalyticsConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| AnalyticsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_threshold(self.similarity_threshold)?;
        let o = &self.overlap;
        if o.min_phrase_tokens == 0 || o.min_phrase_tokens > o.max_phrase_tokens {
            return Err(AnalyticsError::InvalidArgument(format!(
                "phrase token range {}..={} is empty",
                o.min_phrase_tokens, o.max_phrase_tokens
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = AnalyticsConfig::from_json("{}").unwrap();
        assert_eq!(config, AnalyticsConfig::default());
        assert_eq!(config.similarity_threshold, 40.0);
        assert_eq!(config.overlap.max_phrases, 20);
        assert_eq!(config.highlight.open, "<mark>");
        assert_eq!(config.hub_pages, 10);
    }

    #[test]
    fn partial_nested_override() {
        let config = AnalyticsConfig::from_json(
            r#"{"similarityThreshold": 60, "overlap": {"maxPhrases": 5}, "advisory": {"maxOutgoing": 80}}"#,
        )
        .unwrap();
        assert_eq!(config.similarity_threshold, 60.0);
        assert_eq!(config.overlap.max_phrases, 5);
        assert_eq!(config.overlap.min_word_len, 3);
        assert_eq!(config.advisory.max_outgoing, 80);
        assert_eq!(config.advisory.weak_incoming, 3);
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let err = AnalyticsConfig::from_json(r#"{"similarityThreshold": 140}"#).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidArgument(_)));
        assert!(check_threshold(-1.0).is_err());
        assert!(check_threshold(100.0).is_ok());
    }

    #[test]
    fn bad_phrase_range_rejected() {
        let err = AnalyticsConfig::from_json(r#"{"overlap": {"minPhraseTokens": 5}}"#).unwrap_err();
        assert!(err.to_string().contains("phrase token range"));
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(matches!(
            AnalyticsConfig::from_json("{not json"),
            Err(AnalyticsError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AnalyticsConfig::load("/nonexistent/crawl-topology.json").unwrap_err();
        assert!(matches!(err, AnalyticsError::Io { .. }));
    }
}
