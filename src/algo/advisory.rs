//! Link-graph advisories: declarative per-page rules plus site-wide orphan,
//! hub, and power-distribution views.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::model::{LinkStats, Report};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Info,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AdvisoryKind {
    Orphan,
    WeakBacklinks,
    NoOutgoingLinks,
    ExcessiveOutgoingLinks,
    LowPowerSources,
    HealthyStructure,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdvisoryThresholds {
    /// Fewer incoming links than this, combined with low power, is weak.
    pub weak_incoming: u64,
    pub weak_power: f64,
    /// More outgoing links than this dilutes link equity.
    pub max_outgoing: u64,
    pub low_source_power: f64,
}

impl Default for AdvisoryThresholds {
    fn default() -> Self {
        Self {
            weak_incoming: 3,
            weak_power: 50.0,
            max_outgoing: 50,
            low_source_power: 30.0,
        }
    }
}

struct LinkRule {
    kind: AdvisoryKind,
    severity: Severity,
    applies: fn(&LinkStats, &AdvisoryThresholds) -> bool,
    message: fn(&LinkStats) -> String,
}

const RULES: &[LinkRule] = &[
    LinkRule {
        kind: AdvisoryKind::Orphan,
        severity: Severity::Warning,
        applies: |s, _| s.incoming_count == 0,
        message: |_| {
            "No internal pages link here; search engines and visitors may never discover it.".into()
        },
    },
    LinkRule {
        kind: AdvisoryKind::WeakBacklinks,
        severity: Severity::Info,
        applies: |s, t| s.incoming_count < t.weak_incoming && s.power < t.weak_power,
        message: |s| {
            format!(
                "Only {} incoming link(s); seek links from higher-power pages to raise its authority.",
                s.incoming_count
            )
        },
    },
    LinkRule {
        kind: AdvisoryKind::NoOutgoingLinks,
        severity: Severity::Info,
        applies: |s, _| s.outgoing_count == 0,
        message: |_| "No outgoing internal links; add links to related pages.".into(),
    },
    LinkRule {
        kind: AdvisoryKind::ExcessiveOutgoingLinks,
        severity: Severity::Warning,
        applies: |s, t| s.outgoing_count > t.max_outgoing,
        message: |s| {
            format!(
                "{} outgoing links; too many links dilute the equity passed to each target.",
                s.outgoing_count
            )
        },
    },
    LinkRule {
        kind: AdvisoryKind::LowPowerSources,
        severity: Severity::Info,
        applies: |s, t| s.incoming_count > 0 && s.power < t.low_source_power,
        message: |s| {
            format!(
                "Power {:.1} despite {} incoming link(s); the linking pages have low power themselves.",
                s.power, s.incoming_count
            )
        },
    },
];

/// Every matching rule, in rule order. A page matching none gets a single
/// confirmation.
pub fn link_advisories(stats: &LinkStats, thresholds: &AdvisoryThresholds) -> Vec<Advisory> {
    let mut out: Vec<Advisory> = RULES
        .iter()
        .filter(|rule| (rule.applies)(stats, thresholds))
        .map(|rule| Advisory {
            kind: rule.kind,
            severity: rule.severity,
            message: (rule.message)(stats),
        })
        .collect();
    if out.is_empty() {
        out.push(Advisory {
            kind: AdvisoryKind::HealthyStructure,
            severity: Severity::Success,
            message: "Good link structure: well linked in and out.".into(),
        });
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAdvice {
    pub url: String,
    #[serde(flatten)]
    pub stats: LinkStats,
    pub advisories: Vec<Advisory>,
}

/// `linkAnalysis` keys: those crawled in report order first, then the rest
/// sorted.
fn graph_urls(report: &Report) -> Vec<&str> {
    ordered_urls(report, true)
}

/// Crawled pages in report order, then `linkAnalysis` keys not crawled,
/// sorted. With `graph_only`, crawled pages lacking an entry are skipped.
fn ordered_urls(report: &Report, graph_only: bool) -> Vec<&str> {
    let mut urls: Vec<&str> = Vec::new();
    let mut seen = HashSet::new();
    for page in &report.pages {
        if graph_only && !report.link_analysis.contains_key(&page.url) {
            continue;
        }
        if !page.url.is_empty() && seen.insert(page.url.as_str()) {
            urls.push(page.url.as_str());
        }
    }
    let mut rest: Vec<&str> = report
        .link_analysis
        .keys()
        .map(String::as_str)
        .filter(|u| !seen.contains(u))
        .collect();
    rest.sort_unstable();
    urls.extend(rest);
    urls
}

pub fn advise_page(report: &Report, url: &str, thresholds: &AdvisoryThresholds) -> PageAdvice {
    let stats = report.link_stats(url);
    PageAdvice {
        url: url.to_string(),
        stats,
        advisories: link_advisories(&stats, thresholds),
    }
}

pub fn advise_all(report: &Report, thresholds: &AdvisoryThresholds) -> Vec<PageAdvice> {
    graph_urls(report)
        .into_iter()
        .map(|url| advise_page(report, url, thresholds))
        .collect()
}

/// A root URL (`/` or empty path) is never reported as an orphan.
pub fn is_homepage(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.path() == "/" || parsed.path().is_empty(),
        Err(_) => false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedPage {
    pub url: String,
    pub title: String,
    #[serde(flatten)]
    pub stats: LinkStats,
}

fn linked_page(report: &Report, url: &str) -> LinkedPage {
    let title = report
        .pages
        .iter()
        .find(|p| p.url == url)
        .map(|p| p.title.clone())
        .unwrap_or_default();
    LinkedPage {
        url: url.to_string(),
        title,
        stats: report.link_stats(url),
    }
}

/// Pages nothing links to, homepage excluded. A crawled page missing from
/// `linkAnalysis` has no incoming links.
pub fn orphan_pages(report: &Report) -> Vec<LinkedPage> {
    ordered_urls(report, false)
        .into_iter()
        .filter(|url| !is_homepage(url) && report.link_stats(url).incoming_count == 0)
        .map(|url| linked_page(report, url))
        .collect()
}

/// Top `limit` pages by outgoing link count; ties keep report order.
pub fn hub_pages(report: &Report, limit: usize) -> Vec<LinkedPage> {
    let mut pages: Vec<LinkedPage> = graph_urls(report)
        .into_iter()
        .map(|url| linked_page(report, url))
        .collect();
    pages.sort_by(|a, b| b.stats.outgoing_count.cmp(&a.stats.outgoing_count));
    pages.truncate(limit);
    pages
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PowerDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// `high` >= 70, `medium` in [40, 70), `low` below 40.
pub fn power_distribution(report: &Report) -> PowerDistribution {
    report
        .link_analysis
        .values()
        .fold(PowerDistribution::default(), |mut d, s| {
            if s.power >= 70.0 {
                d.high += 1;
            } else if s.power >= 40.0 {
                d.medium += 1;
            } else {
                d.low += 1;
            }
            d
        })
}
