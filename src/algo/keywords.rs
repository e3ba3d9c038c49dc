//! Ranking of upstream keyword analysis. Counts and tf-idf weights are taken
//! as given; nothing here recomputes them.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::{KeywordEntry, PageRecord};

/// A page's keywords ranked by tf-idf descending; ties keep upstream order.
pub fn top_keywords(page: &PageRecord, n: usize) -> Vec<KeywordEntry> {
    let mut ranked = page.keywords.top_keywords.clone();
    ranked.sort_by(|a, b| b.tf_idf.total_cmp(&a.tf_idf));
    ranked.truncate(n);
    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteKeyword {
    pub keyword: String,
    pub total_count: u64,
    pub page_count: usize,
    pub max_tf_idf: f64,
}

/// Keywords merged across pages (case-insensitively), ranked by total count
/// descending then keyword ascending.
pub fn site_keywords(pages: &[PageRecord], n: usize) -> Vec<SiteKeyword> {
    let mut merged: HashMap<String, SiteKeyword> = HashMap::new();
    for page in pages {
        let mut counted_here: HashSet<String> = HashSet::new();
        for entry in &page.keywords.top_keywords {
            let key = entry.keyword.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            let slot = merged.entry(key.clone()).or_insert_with(|| SiteKeyword {
                keyword: key,
                total_count: 0,
                page_count: 0,
                max_tf_idf: f64::NEG_INFINITY,
            });
            slot.total_count = slot.total_count.saturating_add(entry.count);
            slot.max_tf_idf = slot.max_tf_idf.max(entry.tf_idf);
            if counted_here.insert(slot.keyword.clone()) {
                slot.page_count += 1;
            }
        }
    }

    let mut ranked: Vec<SiteKeyword> = merged.into_values().collect();
    ranked.sort_by(|a, b| {
        b.total_count
            .cmp(&a.total_count)
            .then_with(|| a.keyword.cmp(&b.keyword))
    });
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::KeywordProfile;

    fn entry(keyword: &str, count: u64, tf_idf: f64) -> KeywordEntry {
        KeywordEntry {
            keyword: keyword.into(),
            count,
            tf_idf,
        }
    }

    fn page(url: &str, entries: Vec<KeywordEntry>) -> PageRecord {
        PageRecord {
            url: url.into(),
            keywords: KeywordProfile {
                top_keywords: entries,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn top_keywords_by_tf_idf_stable() {
        let p = page(
            "a",
            vec![entry("alpha", 9, 0.1), entry("beta", 1, 0.5), entry("gamma", 3, 0.5)],
        );
        let top: Vec<String> = top_keywords(&p, 2).into_iter().map(|k| k.keyword).collect();
        assert_eq!(top, vec!["beta", "gamma"]);
    }

    #[test]
    fn site_keywords_aggregate() {
        let pages = vec![
            page("a", vec![entry("Rust", 4, 0.2), entry("seo", 2, 0.9)]),
            page("b", vec![entry("rust", 3, 0.6), entry("crawl", 7, 0.1)]),
        ];
        let site = site_keywords(&pages, 10);
        assert_eq!(site.len(), 3);
        assert_eq!(site[0].keyword, "crawl");
        assert_eq!(site[1].keyword, "rust");
        assert_eq!(site[1].total_count, 7);
        assert_eq!(site[1].page_count, 2);
        assert!((site[1].max_tf_idf - 0.6).abs() < 1e-9);
        assert_eq!(site[2].keyword, "seo");
    }

    #[test]
    fn equal_totals_sort_alphabetically() {
        let pages = vec![page("a", vec![entry("zeta", 2, 0.0), entry("eta", 2, 0.0)])];
        let site = site_keywords(&pages, 10);
        assert_eq!(site[0].keyword, "eta");
        assert_eq!(site[1].keyword, "zeta");
    }

    #[test]
    fn huge_counts_saturate() {
        let pages = vec![
            page("a", vec![entry("seo", u64::MAX, 0.1)]),
            page("b", vec![entry("seo", 5, 0.2)]),
        ];
        assert_eq!(site_keywords(&pages, 10)[0].total_count, u64::MAX);
    }

    #[test]
    fn repeated_keyword_on_one_page_counts_page_once() {
        let pages = vec![page("a", vec![entry("seo", 1, 0.1), entry("SEO", 2, 0.3)])];
        let site = site_keywords(&pages, 10);
        assert_eq!(site[0].page_count, 1);
        assert_eq!(site[0].total_count, 3);
    }
}
