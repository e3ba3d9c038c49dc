//! Typed view of a crawl report.
//!
//! Reports arrive from two producers: the crawler writes snake_case keys
//! (`word_count`, `similarity_scores`, `performance_analysis`) and the UI
//! layer camelCase keys (`wordCount`, `similarityScores`). Every loader here
//! accepts both spellings, and every missing or wrong-shaped field falls back
//! to an empty value instead of failing the whole report.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

// ── Lenient field access ─────────────────────────────────────────────────────

/// First present, non-null value among `keys`.
fn field<'a>(row: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .find(|v| !v.is_null())
}

/// Extract a text field from a JSON object, returning "" if missing.
pub fn get_text(row: &Value, keys: &[&str]) -> String {
    field(row, keys)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

fn get_f64(row: &Value, keys: &[&str]) -> f64 {
    field(row, keys).and_then(|v| v.as_f64()).unwrap_or(0.0)
}

fn get_u64(row: &Value, keys: &[&str]) -> u64 {
    field(row, keys).map(as_count).unwrap_or(0)
}

fn get_bool(row: &Value, keys: &[&str]) -> bool {
    field(row, keys).and_then(|v| v.as_bool()).unwrap_or(false)
}

/// A list counts by its length; a number is taken as the count itself.
fn as_count(v: &Value) -> u64 {
    match v {
        Value::Array(items) => items.len() as u64,
        other => other
            .as_u64()
            .or_else(|| other.as_f64().filter(|f| *f > 0.0).map(|f| f.round() as u64))
            .unwrap_or(0),
    }
}

fn get_count(row: &Value, keys: &[&str]) -> usize {
    get_u64(row, keys) as usize
}

fn get_strings(row: &Value, keys: &[&str]) -> Vec<String> {
    match field(row, keys) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Object(_) => v.get("url").and_then(|u| u.as_str()).map(str::to_string),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

// ── Page records ─────────────────────────────────────────────────────────────

/// Upstream keyword analysis for one page. Ranked and searched, never recomputed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordProfile {
    pub top_keywords: Vec<KeywordEntry>,
    /// lowercase term -> occurrences in the page text
    pub term_counts: HashMap<String, u64>,
    pub keyword_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordEntry {
    pub keyword: String,
    pub count: u64,
    pub tf_idf: f64,
}

impl KeywordProfile {
    fn from_value(v: &Value) -> Self {
        // Some producers emit the keyword list directly instead of a profile.
        let list = match v {
            Value::Array(_) => Some(v),
            _ => field(v, &["topKeywords", "top_keywords", "keywords"]),
        };
        let top_keywords = match list {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| {
                    let keyword = get_text(item, &["keyword", "term", "word"]);
                    if keyword.is_empty() {
                        return None;
                    }
                    Some(KeywordEntry {
                        keyword,
                        count: get_u64(item, &["count", "frequency"]),
                        tf_idf: get_f64(item, &["tfIdf", "tf_idf", "tfidf"]),
                    })
                })
                .collect(),
            _ => Vec::new(),
        };

        let mut term_counts: HashMap<String, u64> = HashMap::new();
        if let Some(Value::Object(map)) = field(v, &["termCounts", "term_counts"]) {
            for (term, count) in map {
                let total = term_counts.entry(term.to_lowercase()).or_insert(0);
                *total = total.saturating_add(as_count(count));
            }
        }

        Self {
            top_keywords,
            term_counts,
            keyword_ratio: get_f64(v, &["keywordRatio", "keyword_ratio"]).clamp(0.0, 1.0),
        }
    }
}

/// Per-page (or aggregated) counts of performance findings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceIssueCounts {
    pub heavy_images: usize,
    pub slow_assets: usize,
    pub slow_sections: usize,
    pub slow_components: usize,
    pub render_blocking: usize,
}

impl PerformanceIssueCounts {
    fn from_value(v: &Value) -> Self {
        Self {
            heavy_images: get_count(v, &["heavyImages", "heavy_images"]),
            slow_assets: get_count(v, &["slowAssets", "slowJsCss", "slow_assets", "slow_js_css"]),
            slow_sections: get_count(
                v,
                &["slowSections", "slowHtmlSections", "slow_sections", "slow_html_sections"],
            ),
            slow_components: get_count(v, &["slowComponents", "slow_components"]),
            render_blocking: get_count(
                v,
                &["renderBlockingResources", "render_blocking_resources", "renderBlocking"],
            ),
        }
    }

    /// Sum the findings of every page.
    pub fn aggregate<'a>(counts: impl IntoIterator<Item = &'a PerformanceIssueCounts>) -> Self {
        counts.into_iter().fold(Self::default(), |acc, c| Self {
            heavy_images: acc.heavy_images.saturating_add(c.heavy_images),
            slow_assets: acc.slow_assets.saturating_add(c.slow_assets),
            slow_sections: acc.slow_sections.saturating_add(c.slow_sections),
            slow_components: acc.slow_components.saturating_add(c.slow_components),
            render_blocking: acc.render_blocking.saturating_add(c.render_blocking),
        })
    }
}

/// One crawled page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub text_content: String,
    pub word_count: u64,
    pub status_code: u16,
    pub is_exact_duplicate: bool,
    pub duplicate_urls: Vec<String>,
    /// other url -> similarity percentage, in report order
    pub similarity_scores: Vec<(String, f64)>,
    pub keywords: KeywordProfile,
    pub broken_links: usize,
    pub internal_links: usize,
    pub external_links: usize,
    pub performance: PerformanceIssueCounts,
}

impl PageRecord {
    pub fn from_value(row: &Value) -> Self {
        let similarity_scores = match field(row, &["similarityScores", "similarity_scores"]) {
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(url, score)| score.as_f64().map(|s| (url.clone(), s)))
                .collect(),
            // analyzer output shape: [{url, similarity}, ...]
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| {
                    let url = get_text(item, &["url"]);
                    let score = field(item, &["similarity", "score"])?.as_f64()?;
                    (!url.is_empty()).then_some((url, score))
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            url: get_text(row, &["url"]),
            title: get_text(row, &["title"]),
            text_content: get_text(row, &["textContent", "text_content", "text"]),
            word_count: get_u64(row, &["wordCount", "word_count"]),
            status_code: get_u64(row, &["statusCode", "status_code", "status"]).min(u16::MAX as u64)
                as u16,
            is_exact_duplicate: get_bool(row, &["isExactDuplicate", "is_exact_duplicate"]),
            duplicate_urls: get_strings(row, &["duplicateUrls", "duplicate_urls"]),
            similarity_scores,
            keywords: field(row, &["keywords"])
                .map(KeywordProfile::from_value)
                .unwrap_or_default(),
            broken_links: get_count(row, &["brokenLinks", "broken_links"]),
            internal_links: get_count(row, &["internalLinks", "internal_links"]),
            external_links: get_count(row, &["externalLinks", "external_links"]),
            performance: field(row, &["performanceAnalysis", "performance_analysis"])
                .map(PerformanceIssueCounts::from_value)
                .unwrap_or_default(),
        }
    }

    pub fn summary(&self) -> PageSummary {
        PageSummary {
            url: self.url.clone(),
            title: self.title.clone(),
            word_count: self.word_count,
            status_code: self.status_code,
        }
    }
}

/// The slice of a page that derived results carry for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub url: String,
    pub title: String,
    pub word_count: u64,
    pub status_code: u16,
}

impl PageSummary {
    /// Stand-in for a URL that is referenced but was never crawled.
    pub fn placeholder(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }
}

/// url -> page; the first record wins when a URL repeats.
pub fn index_pages(pages: &[PageRecord]) -> HashMap<&str, &PageRecord> {
    let mut index = HashMap::with_capacity(pages.len());
    for page in pages {
        index.entry(page.url.as_str()).or_insert(page);
    }
    index
}

// ── Link graph ───────────────────────────────────────────────────────────────

/// Link-graph figures for one URL, produced by the crawler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStats {
    pub incoming_count: u64,
    pub outgoing_count: u64,
    pub power: f64,
}

impl LinkStats {
    fn from_value(v: &Value, fallback_power: Option<f64>) -> Self {
        let power = field(v, &["power", "pagePower", "page_power"])
            .and_then(|p| p.as_f64())
            .or(fallback_power)
            .unwrap_or(0.0);
        Self {
            incoming_count: get_u64(
                v,
                &["incomingCount", "incoming_count", "incomingLinks", "incoming_links"],
            ),
            outgoing_count: get_u64(
                v,
                &["outgoingCount", "outgoing_count", "outgoingLinks", "outgoing_links"],
            ),
            power,
        }
    }
}

// ── Report ───────────────────────────────────────────────────────────────────

/// A full crawl report: the immutable input of every derivation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub job_id: Option<String>,
    pub pages: Vec<PageRecord>,
    pub link_analysis: HashMap<String, LinkStats>,
}

impl Report {
    /// Build a report from arbitrary JSON. A bare array is taken as the page
    /// list; anything unusable yields an empty report.
    pub fn from_value(v: &Value) -> Self {
        let pages_value = match v {
            Value::Array(_) => Some(v),
            _ => field(v, &["pages"]),
        };
        let pages: Vec<PageRecord> = match pages_value {
            Some(Value::Array(rows)) => rows
                .iter()
                .filter(|row| row.is_object())
                .map(PageRecord::from_value)
                .collect(),
            _ => Vec::new(),
        };

        let job_id = field(v, &["jobId", "job_id"]).and_then(|id| match id {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        Self {
            job_id,
            pages,
            link_analysis: Self::link_analysis_from(v),
        }
    }

    /// `linkAnalysis` sits at the top level or inside the page-power block;
    /// power may be inline or in a sibling `pagePowers` map.
    fn link_analysis_from(v: &Value) -> HashMap<String, LinkStats> {
        let scopes = [
            Some(v),
            field(v, &["pagePower", "page_power", "pagePowerStats", "page_power_stats"]),
        ];
        for scope in scopes.into_iter().flatten() {
            let Some(Value::Object(map)) = field(scope, &["linkAnalysis", "link_analysis"]) else {
                continue;
            };
            let powers = field(scope, &["pagePowers", "page_powers"]);
            return map
                .iter()
                .map(|(url, entry)| {
                    let fallback = powers.and_then(|p| p.get(url)).and_then(|p| p.as_f64());
                    (url.clone(), LinkStats::from_value(entry, fallback))
                })
                .collect();
        }
        HashMap::new()
    }

    pub fn page_index(&self) -> HashMap<&str, &PageRecord> {
        index_pages(&self.pages)
    }

    pub fn link_stats(&self, url: &str) -> LinkStats {
        self.link_analysis.get(url).copied().unwrap_or_default()
    }
}
