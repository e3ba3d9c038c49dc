//! Performance score, letter grades, and per-issue status.

use serde::{Deserialize, Serialize};

use crate::model::{PageRecord, PerformanceIssueCounts};

/// Capped deduction: `min(cap, count * per_issue)`.
fn deduction(count: usize, per_issue: u64, cap: u64) -> u64 {
    (count as u64).saturating_mul(per_issue).min(cap)
}

/// 100 minus independent capped deductions, clamped to [0, 100].
pub fn performance_score(counts: &PerformanceIssueCounts) -> u32 {
    let total = deduction(counts.heavy_images, 2, 15)
        + deduction(counts.slow_assets, 3, 15)
        + deduction(counts.slow_sections, 2, 10)
        + deduction(counts.slow_components, 2, 10)
        + deduction(counts.render_blocking, 5, 20);
    100u64.saturating_sub(total) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Lower bounds are inclusive: 90 is an A, 89 a B.
    pub fn from_score(score: u32) -> Self {
        match score {
            90..=u32::MAX => Self::A,
            75..=89 => Self::B,
            60..=74 => Self::C,
            40..=59 => Self::D,
            _ => Self::F,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::A => "Excellent",
            Self::B => "Good",
            Self::C => "Needs Improvement",
            Self::D => "Poor",
            Self::F => "Critical",
        }
    }

    pub fn all() -> [Grade; 5] {
        [Self::A, Self::B, Self::C, Self::D, Self::F]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PerformanceScore {
    pub score: u32,
    pub grade: Grade,
    pub label: &'static str,
}

impl PerformanceScore {
    pub fn from_counts(counts: &PerformanceIssueCounts) -> Self {
        let score = performance_score(counts);
        let grade = Grade::from_score(score);
        Self {
            score,
            grade,
            label: grade.label(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueStatus {
    Good,
    Warning,
    Critical,
}

/// Zero is good, up to `threshold` a warning, beyond it critical.
pub fn classify_issue(count: usize, threshold: usize) -> IssueStatus {
    if count == 0 {
        IssueStatus::Good
    } else if count <= threshold {
        IssueStatus::Warning
    } else {
        IssueStatus::Critical
    }
}

/// Warning ceiling per issue category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IssueThresholds {
    pub heavy_images: usize,
    pub slow_assets: usize,
    pub slow_sections: usize,
    pub slow_components: usize,
    pub render_blocking: usize,
}

impl Default for IssueThresholds {
    fn default() -> Self {
        Self {
            heavy_images: 5,
            slow_assets: 3,
            slow_sections: 3,
            slow_components: 3,
            render_blocking: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueReport {
    pub category: &'static str,
    pub count: usize,
    pub threshold: usize,
    pub status: IssueStatus,
}

pub fn issue_statuses(counts: &PerformanceIssueCounts, thresholds: &IssueThresholds) -> Vec<IssueReport> {
    [
        ("heavyImages", counts.heavy_images, thresholds.heavy_images),
        ("slowAssets", counts.slow_assets, thresholds.slow_assets),
        ("slowSections", counts.slow_sections, thresholds.slow_sections),
        ("slowComponents", counts.slow_components, thresholds.slow_components),
        ("renderBlocking", counts.render_blocking, thresholds.render_blocking),
    ]
    .into_iter()
    .map(|(category, count, threshold)| IssueReport {
        category,
        count,
        threshold,
        status: classify_issue(count, threshold),
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBucket {
    pub grade: Grade,
    pub pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePerformance {
    pub counts: PerformanceIssueCounts,
    #[serde(flatten)]
    pub score: PerformanceScore,
    pub issues: Vec<IssueReport>,
    /// Pages graded one by one on their own findings.
    pub page_grades: Vec<GradeBucket>,
}

/// Aggregate findings over all pages, then score and grade the site.
pub fn site_performance(pages: &[PageRecord], thresholds: &IssueThresholds) -> SitePerformance {
    let counts = PerformanceIssueCounts::aggregate(pages.iter().map(|p| &p.performance));

    let mut page_grades: Vec<GradeBucket> = Grade::all()
        .into_iter()
        .map(|grade| GradeBucket { grade, pages: 0 })
        .collect();
    for page in pages {
        let grade = Grade::from_score(performance_score(&page.performance));
        if let Some(bucket) = page_grades.iter_mut().find(|b| b.grade == grade) {
            bucket.pages += 1;
        }
    }

    SitePerformance {
        counts,
        score: PerformanceScore::from_counts(&counts),
        issues: issue_statuses(&counts, thresholds),
        page_grades,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(h: usize, a: usize, s: usize, c: usize, r: usize) -> PerformanceIssueCounts {
        PerformanceIssueCounts {
            heavy_images: h,
            slow_assets: a,
            slow_sections: s,
            slow_components: c,
            render_blocking: r,
        }
    }

    #[test]
    fn clean_site_scores_100() {
        let s = PerformanceScore::from_counts(&counts(0, 0, 0, 0, 0));
        assert_eq!(s.score, 100);
        assert_eq!(s.grade, Grade::A);
        assert_eq!(s.label, "Excellent");
    }

    #[test]
    fn heavy_images_capped() {
        let s = PerformanceScore::from_counts(&counts(10, 0, 0, 0, 0));
        assert_eq!(s.score, 85);
        assert_eq!(s.grade, Grade::B);
    }

    #[test]
    fn render_blocking_capped() {
        assert_eq!(performance_score(&counts(0, 0, 0, 0, 10)), 80);
    }

    #[test]
    fn all_caps_hit_gives_30() {
        assert_eq!(performance_score(&counts(100, 100, 100, 100, 100)), 30);
        assert_eq!(performance_score(&counts(usize::MAX, 0, 0, 0, 0)), 85);
    }

    #[test]
    fn partial_deductions() {
        // 2*2 + 1*3 + 1*2 + 0 + 1*5 = 14
        assert_eq!(performance_score(&counts(2, 1, 1, 0, 1)), 86);
    }

    #[test]
    fn grade_boundaries() {
        assert_eq!(Grade::from_score(100), Grade::A);
        assert_eq!(Grade::from_score(90), Grade::A);
        assert_eq!(Grade::from_score(89), Grade::B);
        assert_eq!(Grade::from_score(75), Grade::B);
        assert_eq!(Grade::from_score(74), Grade::C);
        assert_eq!(Grade::from_score(60), Grade::C);
        assert_eq!(Grade::from_score(59), Grade::D);
        assert_eq!(Grade::from_score(40), Grade::D);
        assert_eq!(Grade::from_score(39), Grade::F);
        assert_eq!(Grade::from_score(0), Grade::F);
        assert_eq!(Grade::F.label(), "Critical");
    }

    #[test]
    fn issue_status_classification() {
        assert_eq!(classify_issue(0, 3), IssueStatus::Good);
        assert_eq!(classify_issue(1, 3), IssueStatus::Warning);
        assert_eq!(classify_issue(3, 3), IssueStatus::Warning);
        assert_eq!(classify_issue(4, 3), IssueStatus::Critical);
    }

    #[test]
    fn site_performance_aggregates_pages() {
        let pages = vec![
            PageRecord {
                url: "a".into(),
                performance: counts(1, 0, 0, 0, 2),
                ..Default::default()
            },
            PageRecord {
                url: "b".into(),
                performance: counts(2, 0, 0, 0, 0),
                ..Default::default()
            },
            PageRecord {
                url: "c".into(),
                ..Default::default()
            },
        ];
        let site = site_performance(&pages, &IssueThresholds::default());
        assert_eq!(site.counts, counts(3, 0, 0, 0, 2));
        // 3*2 + 2*5 = 16
        assert_eq!(site.score.score, 84);
        assert_eq!(site.score.grade, Grade::B);
        let render = site.issues.iter().find(|i| i.category == "renderBlocking").unwrap();
        assert_eq!(render.status, IssueStatus::Warning);
        let graded: usize = site.page_grades.iter().map(|b| b.pages).sum();
        assert_eq!(graded, 3);
        // a: 100-2-10 = 88 (B), b: 96 (A), c: 100 (A)
        assert_eq!(site.page_grades[0].pages, 2);
        assert_eq!(site.page_grades[1].pages, 1);
    }
}
