//! Report identity and argument hashing for derivation caches.
//!
//! A cached derivation is valid only while both the report identity and the
//! hash of the arguments it was computed with are unchanged.

use serde::Serialize;
use siphasher::sip::SipHasher13;
use std::hash::{Hash, Hasher};

use crate::model::{PageRecord, Report};

/// Stable identity of one report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "source", content = "value", rename_all = "camelCase")]
pub enum ReportIdentity {
    /// Upstream crawl job id.
    Job(String),
    /// SipHash of every page field a derivation reads, in report order.
    Content(u64),
}

/// Prefer the upstream job id; fall back to hashing the content.
pub fn report_identity(report: &Report) -> ReportIdentity {
    match &report.job_id {
        Some(id) => ReportIdentity::Job(id.clone()),
        None => ReportIdentity::Content(content_hash(report)),
    }
}

/// SipHash of the report content. Empty reports hash to 0.
pub fn content_hash(report: &Report) -> u64 {
    if report.pages.is_empty() && report.link_analysis.is_empty() {
        return 0;
    }
    let mut hasher = SipHasher13::new();
    report.pages.len().hash(&mut hasher);
    for page in &report.pages {
        hash_page(page, &mut hasher);
    }

    let mut links: Vec<_> = report.link_analysis.iter().collect();
    links.sort_unstable_by(|a, b| a.0.cmp(b.0));
    links.len().hash(&mut hasher);
    for (url, stats) in links {
        url.hash(&mut hasher);
        stats.incoming_count.hash(&mut hasher);
        stats.outgoing_count.hash(&mut hasher);
        stats.power.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

fn hash_page(page: &PageRecord, hasher: &mut SipHasher13) {
    page.url.hash(hasher);
    page.title.hash(hasher);
    page.text_content.hash(hasher);
    page.word_count.hash(hasher);
    page.status_code.hash(hasher);
    page.is_exact_duplicate.hash(hasher);
    page.duplicate_urls.hash(hasher);

    page.similarity_scores.len().hash(hasher);
    for (url, score) in &page.similarity_scores {
        url.hash(hasher);
        score.to_bits().hash(hasher);
    }

    let keywords = &page.keywords;
    keywords.top_keywords.len().hash(hasher);
    for entry in &keywords.top_keywords {
        entry.keyword.hash(hasher);
        entry.count.hash(hasher);
        entry.tf_idf.to_bits().hash(hasher);
    }
    let mut terms: Vec<_> = keywords.term_counts.iter().collect();
    terms.sort_unstable();
    terms.hash(hasher);
    keywords.keyword_ratio.to_bits().hash(hasher);

    let perf = &page.performance;
    (
        perf.heavy_images,
        perf.slow_assets,
        perf.slow_sections,
        perf.slow_components,
        perf.render_blocking,
    )
        .hash(hasher);
    (page.broken_links, page.internal_links, page.external_links).hash(hasher);
}

/// Hash derivation arguments for cache keying.
///
/// Serializes the argument struct to JSON, then SipHash-es the bytes. Any
/// change to a threshold or limit produces a different hash.
pub fn args_hash(args: &impl Serialize) -> u64 {
    let json = serde_json::to_string(args).unwrap_or_default();
    let mut hasher = SipHasher13::new();
    json.hash(&mut hasher);
    hasher.finish()
}

/// What a cached derivation was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivationKey {
    pub identity: ReportIdentity,
    pub args_hash: u64,
}

impl DerivationKey {
    pub fn new(identity: ReportIdentity, args: &impl Serialize) -> Self {
        Self {
            identity,
            args_hash: args_hash(args),
        }
    }
}

/// A cached derivation is reusable only for the same report and arguments.
pub fn is_valid(cached: &DerivationKey, identity: &ReportIdentity, args_hash: u64) -> bool {
    cached.identity == *identity && cached.args_hash == args_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(job: Option<&str>, texts: &[(&str, &str)]) -> Report {
        Report {
            job_id: job.map(str::to_string),
            pages: texts
                .iter()
                .map(|(url, text)| PageRecord {
                    url: url.to_string(),
                    text_content: text.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn job_id_wins() {
        let r = report(Some("job-7"), &[("a", "x")]);
        assert_eq!(report_identity(&r), ReportIdentity::Job("job-7".into()));
    }

    #[test]
    fn content_hash_deterministic() {
        let r = report(None, &[("a", "hello world"), ("b", "foo bar")]);
        assert_eq!(content_hash(&r), content_hash(&r.clone()));
    }

    #[test]
    fn content_hash_changes_with_data() {
        let r1 = report(None, &[("a", "rust programming")]);
        let r2 = report(None, &[("a", "cooking recipes")]);
        assert_ne!(report_identity(&r1), report_identity(&r2));
    }

    #[test]
    fn content_hash_sees_url_text_boundary() {
        let r1 = report(None, &[("ab", "c")]);
        let r2 = report(None, &[("a", "bc")]);
        assert_ne!(content_hash(&r1), content_hash(&r2));
    }

    #[test]
    fn content_hash_sees_similarity_and_duplicate_flags() {
        let base = report(None, &[("a", "same text"), ("b", "same text")]);
        let mut scored = base.clone();
        scored.pages[0].similarity_scores = vec![("b".into(), 90.0)];
        let mut rescored = scored.clone();
        rescored.pages[0].similarity_scores = vec![("b".into(), 10.0)];
        let mut flagged = base.clone();
        flagged.pages[0].is_exact_duplicate = true;
        flagged.pages[0].duplicate_urls = vec!["b".into()];
        let mut terms = base.clone();
        terms.pages[1].keywords.term_counts.insert("same".into(), 2);

        let hashes = [&base, &scored, &rescored, &flagged, &terms].map(content_hash);
        for (i, h) in hashes.iter().enumerate() {
            for other in &hashes[i + 1..] {
                assert_ne!(h, other);
            }
        }
    }

    #[test]
    fn content_hash_empty() {
        assert_eq!(content_hash(&Report::default()), 0);
    }

    #[test]
    fn args_hash_changes_with_params() {
        #[derive(Serialize)]
        struct Args {
            threshold: f64,
        }
        let h1 = args_hash(&Args { threshold: 40.0 });
        let h2 = args_hash(&Args { threshold: 60.0 });
        assert_ne!(h1, h2);
        assert_eq!(h1, args_hash(&Args { threshold: 40.0 }));
    }

    #[test]
    fn is_valid_checks_both_signals() {
        let id = ReportIdentity::Job("j".into());
        let key = DerivationKey::new(id.clone(), &40.0);
        assert!(is_valid(&key, &id, args_hash(&40.0)));
        assert!(!is_valid(&key, &id, args_hash(&41.0)));
        assert!(!is_valid(&key, &ReportIdentity::Job("k".into()), args_hash(&40.0)));
    }
}
