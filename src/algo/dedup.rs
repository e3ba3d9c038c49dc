//! Exact-duplicate groups and near-duplicate similarity pairs.
//!
//! Both derivations read only what the crawler already computed
//! (`duplicateUrls`, `similarityScores`); nothing here compares text.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::model::{index_pages, PageRecord, PageSummary};

/// Pages sharing one duplicate key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    /// Sorted union of a member's URL and its listed duplicates, joined by `|`.
    pub key: String,
    /// Flagged pages whose own key produced this group, in report order.
    pub urls: Vec<String>,
    /// Members plus every URL they list, one entry per URL, first-seen order.
    pub pages: Vec<PageSummary>,
}

/// Group pages by the sorted union of their URL and `duplicateUrls`.
///
/// Pages whose duplicate lists disagree land in separate groups; no
/// transitive merging is done here.
pub fn group_exact_duplicates(pages: &[PageRecord]) -> Vec<DuplicateGroup> {
    let index = index_pages(pages);

    let mut groups: Vec<DuplicateGroup> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();
    let mut seen_in_group: Vec<HashSet<String>> = Vec::new();

    for page in pages {
        if !page.is_exact_duplicate || page.duplicate_urls.is_empty() {
            continue;
        }

        let mut members: Vec<&str> = std::iter::once(page.url.as_str())
            .chain(page.duplicate_urls.iter().map(String::as_str))
            .collect();
        members.sort_unstable();
        members.dedup();
        let key = members.join("|");

        let gi = *by_key.entry(key.clone()).or_insert_with(|| {
            groups.push(DuplicateGroup {
                key,
                urls: Vec::new(),
                pages: Vec::new(),
            });
            seen_in_group.push(HashSet::new());
            groups.len() - 1
        });

        let group = &mut groups[gi];
        let seen = &mut seen_in_group[gi];
        if !group.urls.contains(&page.url) {
            group.urls.push(page.url.clone());
        }
        for url in std::iter::once(&page.url).chain(page.duplicate_urls.iter()) {
            if seen.insert(url.clone()) {
                let summary = match index.get(url.as_str()) {
                    Some(p) => p.summary(),
                    None => {
                        debug!(url = %url, "duplicate reference to uncrawled page");
                        PageSummary::placeholder(url)
                    }
                };
                group.pages.push(summary);
            }
        }
    }

    debug!(groups = groups.len(), "grouped exact duplicates");
    groups
}

/// Severity bucket for a similarity percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityLevel {
    Low,
    Moderate,
    High,
    Exact,
}

impl SimilarityLevel {
    pub fn from_percentage(similarity: f64) -> Self {
        if similarity >= 95.0 {
            Self::Exact
        } else if similarity >= 80.0 {
            Self::High
        } else if similarity >= 60.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Exact => "exact",
        }
    }
}

/// One unordered pair of similar pages; `url_a < url_b` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityPair {
    pub url_a: String,
    pub url_b: String,
    pub similarity: f64,
    pub level: SimilarityLevel,
    /// `None` when the URL is referenced but absent from the report.
    pub page_a: Option<PageSummary>,
    pub page_b: Option<PageSummary>,
}

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 40.0;

/// Collect every unordered pair whose similarity is at least `threshold`,
/// strongest first. Ties keep the order in which pairs were first met.
///
/// When both pages carry a score for each other and the values differ, the
/// one stored on the lexicographically smaller URL's record is used.
pub fn pair_similar_pages(pages: &[PageRecord], threshold: f64) -> Vec<SimilarityPair> {
    let index = index_pages(pages);

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut pairs: Vec<SimilarityPair> = Vec::new();

    for page in pages {
        for (other, score) in &page.similarity_scores {
            if other.as_str() == page.url {
                continue;
            }
            let (a, b) = if page.url.as_str() < other.as_str() {
                (page.url.as_str(), other.as_str())
            } else {
                (other.as_str(), page.url.as_str())
            };
            if !seen.insert((a, b)) {
                continue;
            }

            let similarity = index
                .get(a)
                .and_then(|rec| rec.similarity_scores.iter().find(|(u, _)| u == b))
                .map(|(_, s)| *s)
                .unwrap_or(*score);
            if similarity < threshold {
                continue;
            }

            let summary = |url: &str| {
                let found = index.get(url).map(|p| p.summary());
                if found.is_none() {
                    debug!(url, "similarity reference to uncrawled page");
                }
                found
            };

            pairs.push(SimilarityPair {
                url_a: a.to_string(),
                url_b: b.to_string(),
                similarity,
                level: SimilarityLevel::from_percentage(similarity),
                page_a: summary(a),
                page_b: summary(b),
            });
        }
    }

    pairs.sort_by(|x, y| {
        y.similarity
            .partial_cmp(&x.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    debug!(pairs = pairs.len(), threshold, "paired similar pages");
    pairs
}

/// Union-find with path compression (halving).
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

/// Pages connected through any chain of similarity pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityCluster {
    pub urls: Vec<String>,
    pub max_similarity: f64,
    pub level: SimilarityLevel,
}

/// Transitive closure over `pairs`. Clusters come out in the order their
/// first URL was met; URLs inside a cluster keep first-seen order.
pub fn cluster_similar_pages(pairs: &[SimilarityPair]) -> Vec<SimilarityCluster> {
    let mut ids: HashMap<&str, usize> = HashMap::new();
    let mut urls: Vec<&str> = Vec::new();
    for pair in pairs {
        for url in [pair.url_a.as_str(), pair.url_b.as_str()] {
            ids.entry(url).or_insert_with(|| {
                urls.push(url);
                urls.len() - 1
            });
        }
    }

    let mut uf = UnionFind::new(urls.len());
    for pair in pairs {
        uf.union(ids[pair.url_a.as_str()], ids[pair.url_b.as_str()]);
    }

    let mut cluster_of_root: HashMap<usize, usize> = HashMap::new();
    let mut clusters: Vec<SimilarityCluster> = Vec::new();
    for (i, url) in urls.iter().enumerate() {
        let root = uf.find(i);
        let ci = *cluster_of_root.entry(root).or_insert_with(|| {
            clusters.push(SimilarityCluster {
                urls: Vec::new(),
                max_similarity: 0.0,
                level: SimilarityLevel::Low,
            });
            clusters.len() - 1
        });
        clusters[ci].urls.push(url.to_string());
    }

    for pair in pairs {
        let root = uf.find(ids[pair.url_a.as_str()]);
        let cluster = &mut clusters[cluster_of_root[&root]];
        if pair.similarity > cluster.max_similarity {
            cluster.max_similarity = pair.similarity;
        }
        cluster.level = cluster.level.max(pair.level);
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> PageRecord {
        PageRecord {
            url: url.into(),
            title: format!("Title {url}"),
            word_count: 100,
            status_code: 200,
            ..Default::default()
        }
    }

    fn dup(url: &str, dups: &[&str]) -> PageRecord {
        PageRecord {
            is_exact_duplicate: true,
            duplicate_urls: dups.iter().map(|s| s.to_string()).collect(),
            ..page(url)
        }
    }

    fn scored(url: &str, scores: &[(&str, f64)]) -> PageRecord {
        PageRecord {
            similarity_scores: scores.iter().map(|(u, s)| (u.to_string(), *s)).collect(),
            ..page(url)
        }
    }

    #[test]
    fn consistent_duplicates_form_one_group() {
        let pages = vec![dup("b", &["a"]), dup("a", &["b"]), page("c")];
        let groups = group_exact_duplicates(&pages);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "a|b");
        assert_eq!(groups[0].urls, vec!["b", "a"]);
        let urls: Vec<&str> = groups[0].pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["b", "a"]);
    }

    #[test]
    fn disagreeing_lists_split_groups() {
        let pages = vec![dup("a", &["b"]), dup("b", &["a", "c"]), dup("c", &["b"])];
        let groups = group_exact_duplicates(&pages);
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["a|b", "a|b|c", "b|c"]);
    }

    #[test]
    fn each_flagged_url_in_exactly_one_group() {
        let pages = vec![
            dup("a", &["b"]),
            dup("b", &["a", "c"]),
            dup("c", &["b"]),
            dup("d", &["e"]),
            dup("e", &["d"]),
        ];
        let groups = group_exact_duplicates(&pages);
        for p in &pages {
            let n = groups.iter().filter(|g| g.urls.contains(&p.url)).count();
            assert_eq!(n, 1, "{} appears in {n} groups", p.url);
        }
    }

    #[test]
    fn unflagged_or_empty_lists_ignored() {
        let mut not_flagged = dup("a", &["b"]);
        not_flagged.is_exact_duplicate = false;
        let pages = vec![not_flagged, dup("c", &[])];
        assert!(group_exact_duplicates(&pages).is_empty());
    }

    #[test]
    fn missing_duplicate_gets_placeholder() {
        let pages = vec![dup("a", &["ghost"])];
        let groups = group_exact_duplicates(&pages);
        let ghost = groups[0].pages.iter().find(|p| p.url == "ghost").unwrap();
        assert_eq!(ghost.title, "");
        assert_eq!(ghost.word_count, 0);
    }

    #[test]
    fn pairs_are_ordered_and_unique() {
        let pages = vec![
            scored("b", &[("a", 80.0), ("c", 50.0)]),
            scored("a", &[("b", 80.0)]),
            scored("c", &[("b", 50.0), ("a", 45.0)]),
        ];
        let pairs = pair_similar_pages(&pages, 40.0);
        assert_eq!(pairs.len(), 3);
        let mut seen = HashSet::new();
        for p in &pairs {
            assert!(p.url_a < p.url_b);
            assert!(seen.insert((p.url_a.clone(), p.url_b.clone())));
        }
        assert_eq!(pairs[0].similarity, 80.0);
        assert_eq!(pairs[0].level, SimilarityLevel::High);
    }

    #[test]
    fn threshold_is_inclusive() {
        let pages = vec![scored("a", &[("b", 40.0), ("c", 39.9)]), page("b"), page("c")];
        let pairs = pair_similar_pages(&pages, 40.0);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].url_b, "b");
    }

    #[test]
    fn asymmetric_scores_prefer_smaller_url() {
        let pages = vec![scored("b", &[("a", 90.0)]), scored("a", &[("b", 70.0)])];
        let pairs = pair_similar_pages(&pages, 40.0);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].similarity, 70.0);
    }

    #[test]
    fn self_pairs_skipped() {
        let pages = vec![scored("a", &[("a", 100.0)])];
        assert!(pair_similar_pages(&pages, 40.0).is_empty());
    }

    #[test]
    fn ties_keep_encounter_order() {
        let pages = vec![
            scored("m", &[("z", 60.0), ("n", 60.0)]),
            scored("a", &[("b", 60.0)]),
        ];
        let pairs = pair_similar_pages(&pages, 40.0);
        let order: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| (p.url_a.as_str(), p.url_b.as_str()))
            .collect();
        assert_eq!(order, vec![("m", "z"), ("m", "n"), ("a", "b")]);
    }

    #[test]
    fn dangling_reference_yields_empty_side() {
        let pages = vec![scored("a", &[("zz-missing", 75.0)])];
        let pairs = pair_similar_pages(&pages, 40.0);
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].page_a.is_some());
        assert!(pairs[0].page_b.is_none());
    }

    #[test]
    fn no_scores_no_pairs() {
        assert!(pair_similar_pages(&[page("a"), page("b")], 0.0).is_empty());
    }

    #[test]
    fn levels_bucket() {
        assert_eq!(SimilarityLevel::from_percentage(95.0), SimilarityLevel::Exact);
        assert_eq!(SimilarityLevel::from_percentage(80.0), SimilarityLevel::High);
        assert_eq!(SimilarityLevel::from_percentage(60.0), SimilarityLevel::Moderate);
        assert_eq!(SimilarityLevel::from_percentage(59.9), SimilarityLevel::Low);
    }

    #[test]
    fn clusters_are_transitive() {
        let pages = vec![
            scored("a", &[("b", 85.0)]),
            scored("b", &[("c", 65.0)]),
            scored("x", &[("y", 97.0)]),
        ];
        let pairs = pair_similar_pages(&pages, 40.0);
        let clusters = cluster_similar_pages(&pairs);
        assert_eq!(clusters.len(), 2);
        let abc = clusters.iter().find(|c| c.urls.contains(&"a".to_string())).unwrap();
        assert_eq!(abc.urls.len(), 3);
        assert_eq!(abc.max_similarity, 85.0);
        assert_eq!(abc.level, SimilarityLevel::High);
        let xy = clusters.iter().find(|c| c.urls.contains(&"x".to_string())).unwrap();
        assert_eq!(xy.level, SimilarityLevel::Exact);
    }
}
