//! Shared operation wrappers for all interfaces (CLI, MCP).
//!
//! Each `op_*` function is a synchronous wrapper around one `ReportView`
//! derivation. Reports come in as `serde_json::Value` (see [`open`]) and every
//! result goes out as `serde_json::Value`; nothing here depends on rmcp or
//! clap.

use serde_json::{json, Value};
use tracing::debug;

use crate::algo::advisory;
use crate::algo::highlight::HighlightConfig;
use crate::algo::keywords;
use crate::config::{check_threshold, AnalyticsConfig};
use crate::error::{AnalyticsError, Result};
use crate::model::Report;
use crate::session::ReportView;

// ── Loading ──────────────────────────────────────────────────────────────────

/// Open a view over a report given as JSON.
pub fn open(report: &Value, config: AnalyticsConfig) -> ReportView {
    ReportView::from_value(report, config)
}

/// Parse report text. Only syntactically broken JSON is an error; a report
/// missing its fields loads as empty.
pub fn parse_report(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text)?)
}

/// Point an existing view at `report`, keeping its caches when the report
/// identity is unchanged.
pub fn reload(view: &mut ReportView, report: &Value) {
    let dropped = view.replace_report(Report::from_value(report));
    debug!(dropped, "report reloaded");
}

fn threshold_or_default(view: &ReportView, threshold: Option<f64>) -> Result<f64> {
    check_threshold(threshold.unwrap_or(view.config().similarity_threshold))
}

// ── Operations ───────────────────────────────────────────────────────────────

pub fn op_duplicates(view: &mut ReportView) -> Value {
    let groups = view.duplicate_groups();
    json!({
        "count": groups.len(),
        "groups": groups,
    })
}

pub fn op_similar(view: &mut ReportView, threshold: Option<f64>) -> Result<Value> {
    let threshold = threshold_or_default(view, threshold)?;
    let pairs = view.similar_pairs(threshold);
    Ok(json!({
        "threshold": threshold,
        "count": pairs.len(),
        "pairs": pairs,
    }))
}

pub fn op_clusters(view: &mut ReportView, threshold: Option<f64>) -> Result<Value> {
    let threshold = threshold_or_default(view, threshold)?;
    let clusters = view.similarity_clusters(threshold);
    Ok(json!({
        "threshold": threshold,
        "count": clusters.len(),
        "clusters": clusters,
    }))
}

pub fn op_overlap(view: &mut ReportView, url_a: &str, url_b: &str) -> Result<Value> {
    let result = view.overlap(url_a, url_b)?;
    Ok(json!({
        "urlA": url_a,
        "urlB": url_b,
        "commonWords": result.common_words,
        "commonPhrases": result.common_phrases,
        "totalCommonWordCount": result.total_common_word_count,
    }))
}

pub fn op_highlight(
    view: &mut ReportView,
    url: &str,
    other: &str,
    phrases: Option<usize>,
    words: Option<usize>,
) -> Result<Value> {
    let defaults = &view.config().highlight;
    let config = HighlightConfig {
        top_phrases: phrases.unwrap_or(defaults.top_phrases),
        top_words: words.unwrap_or(defaults.top_words),
        ..defaults.clone()
    };
    let text = view.highlight(url, other, &config)?;
    Ok(json!({
        "url": url,
        "other": other,
        "highlighted": text,
    }))
}

pub fn op_search(view: &mut ReportView, term: &str) -> Value {
    json!(view.search(term))
}

pub fn op_score(view: &ReportView) -> Value {
    json!(view.performance())
}

pub fn op_advise(view: &ReportView, url: Option<&str>) -> Value {
    let advice = view.advise(url);
    json!({
        "count": advice.len(),
        "pages": advice,
    })
}

/// Site-wide ranking, or one page's own list when `url` is given.
pub fn op_keywords(view: &ReportView, top: Option<usize>, url: Option<&str>) -> Result<Value> {
    let n = top.unwrap_or(view.config().top_keywords);
    match url {
        Some(url) => {
            let page = view
                .page(url)
                .ok_or_else(|| AnalyticsError::InvalidArgument(format!("no page with url '{url}'")))?;
            Ok(json!({
                "url": url,
                "keywords": keywords::top_keywords(page, n),
            }))
        }
        None => Ok(json!({
            "keywords": keywords::site_keywords(&view.report().pages, n),
        })),
    }
}

pub fn op_summary(view: &mut ReportView) -> Value {
    let threshold = view.config().similarity_threshold;
    let hubs = view.config().hub_pages;
    let duplicate_groups = view.duplicate_groups().len();
    let similar_pairs = view.similar_pairs(threshold).len();
    let report = view.report();
    json!({
        "pages": report.pages.len(),
        "duplicateGroups": duplicate_groups,
        "similarityThreshold": threshold,
        "similarPairs": similar_pairs,
        "performance": view.performance(),
        "orphanPages": advisory::orphan_pages(report),
        "hubPages": advisory::hub_pages(report, hubs),
        "powerDistribution": advisory::power_distribution(report),
    })
}
