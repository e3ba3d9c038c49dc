//! One loaded report and the derivations computed from it.
//!
//! Derivations are computed on first request and cached under the report
//! identity plus the arguments they were computed with. Loading a report with
//! a different identity drops every cache; reloading the same report keeps
//! them.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::algo::advisory::{self, PageAdvice};
use crate::algo::cache::{self, DerivationKey, ReportIdentity};
use crate::algo::dedup::{self, DuplicateGroup, SimilarityCluster, SimilarityPair};
use crate::algo::highlight::{self, HighlightConfig};
use crate::algo::overlap::{self, OverlapResult};
use crate::algo::scoring::{self, SitePerformance};
use crate::algo::search::{self, SearchOutcome};
use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use crate::model::{PageRecord, Report};

struct Cached<T> {
    key: DerivationKey,
    value: T,
}

impl<T> Cached<T> {
    fn fresh(&self, identity: &ReportIdentity, args_hash: u64) -> bool {
        cache::is_valid(&self.key, identity, args_hash)
    }
}

pub struct ReportView {
    report: Report,
    identity: ReportIdentity,
    config: AnalyticsConfig,
    duplicates: Option<Cached<Vec<DuplicateGroup>>>,
    pairs: Option<Cached<Vec<SimilarityPair>>>,
    last_search: Option<Cached<SearchOutcome>>,
    /// keyed by the ordered URL pair
    overlaps: HashMap<(String, String), OverlapResult>,
}

impl ReportView {
    pub fn new(report: Report, config: AnalyticsConfig) -> Self {
        let identity = cache::report_identity(&report);
        debug!(pages = report.pages.len(), ?identity, "report view opened");
        Self {
            report,
            identity,
            config,
            duplicates: None,
            pairs: None,
            last_search: None,
            overlaps: HashMap::new(),
        }
    }

    pub fn from_value(report: &Value, config: AnalyticsConfig) -> Self {
        Self::new(Report::from_value(report), config)
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn identity(&self) -> &ReportIdentity {
        &self.identity
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Swap in a new report. Returns `true` when its identity differs and the
    /// cached derivations were dropped.
    pub fn replace_report(&mut self, report: Report) -> bool {
        let identity = cache::report_identity(&report);
        self.report = report;
        if identity == self.identity {
            return false;
        }
        debug!(?identity, "report identity changed, dropping derivations");
        self.identity = identity;
        self.duplicates = None;
        self.pairs = None;
        self.last_search = None;
        self.overlaps.clear();
        true
    }

    /// Number of page pairs whose overlap is currently cached.
    pub fn cached_overlaps(&self) -> usize {
        self.overlaps.len()
    }

    pub fn page(&self, url: &str) -> Option<&PageRecord> {
        self.report.pages.iter().find(|p| p.url == url)
    }

    fn require_page(&self, url: &str) -> Result<&PageRecord> {
        self.page(url)
            .ok_or_else(|| AnalyticsError::InvalidArgument(format!("no page with url '{url}'")))
    }

    pub fn duplicate_groups(&mut self) -> &[DuplicateGroup] {
        let args = cache::args_hash(&());
        if !matches!(&self.duplicates, Some(c) if c.fresh(&self.identity, args)) {
            self.duplicates = None;
        }
        let (identity, pages) = (&self.identity, &self.report.pages);
        &self
            .duplicates
            .get_or_insert_with(|| Cached {
                key: DerivationKey::new(identity.clone(), &()),
                value: dedup::group_exact_duplicates(pages),
            })
            .value
    }

    /// Pairs at `threshold`. Only the most recent threshold is kept.
    pub fn similar_pairs(&mut self, threshold: f64) -> &[SimilarityPair] {
        let args = cache::args_hash(&threshold);
        if !matches!(&self.pairs, Some(c) if c.fresh(&self.identity, args)) {
            self.pairs = None;
        }
        let (identity, pages) = (&self.identity, &self.report.pages);
        &self
            .pairs
            .get_or_insert_with(|| Cached {
                key: DerivationKey::new(identity.clone(), &threshold),
                value: dedup::pair_similar_pages(pages, threshold),
            })
            .value
    }

    pub fn similarity_clusters(&mut self, threshold: f64) -> Vec<SimilarityCluster> {
        dedup::cluster_similar_pages(self.similar_pairs(threshold))
    }

    /// Repeating the last query returns the cached outcome.
    pub fn search(&mut self, term: &str) -> &SearchOutcome {
        let args = cache::args_hash(&term);
        if !matches!(&self.last_search, Some(c) if c.fresh(&self.identity, args)) {
            self.last_search = None;
        }
        let (identity, pages) = (&self.identity, &self.report.pages);
        &self
            .last_search
            .get_or_insert_with(|| Cached {
                key: DerivationKey::new(identity.clone(), &term),
                value: search::search(term, pages),
            })
            .value
    }

    /// Shared content of two pages, computed once per pair.
    pub fn overlap(&mut self, url_a: &str, url_b: &str) -> Result<&OverlapResult> {
        let key = if url_a <= url_b {
            (url_a.to_string(), url_b.to_string())
        } else {
            (url_b.to_string(), url_a.to_string())
        };
        if !self.overlaps.contains_key(&key) {
            let a = &self.require_page(&key.0)?.text_content;
            let b = &self.require_page(&key.1)?.text_content;
            let result = overlap::overlap_with(a, b, &self.config.overlap);
            debug!(
                url_a = %key.0,
                url_b = %key.1,
                words = result.common_words.len(),
                phrases = result.common_phrases.len(),
                "overlap computed"
            );
            self.overlaps.insert(key.clone(), result);
        }
        Ok(&self.overlaps[&key])
    }

    /// `url`'s text with the content it shares with `other` marked.
    pub fn highlight(&mut self, url: &str, other: &str, config: &HighlightConfig) -> Result<String> {
        let shared = self.overlap(url, other)?.clone();
        let text = &self.require_page(url)?.text_content;
        Ok(highlight::highlight_similar_text(text, &shared, config))
    }

    pub fn performance(&self) -> SitePerformance {
        scoring::site_performance(&self.report.pages, &self.config.issue_thresholds)
    }

    pub fn advise(&self, url: Option<&str>) -> Vec<PageAdvice> {
        match url {
            Some(url) => vec![advisory::advise_page(&self.report, url, &self.config.advisory)],
            None => advisory::advise_all(&self.report, &self.config.advisory),
        }
    }
}
