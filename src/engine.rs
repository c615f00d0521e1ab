//! Single-pass analysis orchestration
//!
//! One fetch, one signal extraction, then every enabled category table
//! is scored against the shared signals and the results aggregated.
//! Scorers are pure functions of the signals, so their order never
//! matters; aggregation runs strictly after all of them.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::error::SiteGradeError;
use crate::fetch::PageFetcher;
use crate::models::{Analysis, Category, CategoryReport, PageMeta};
use crate::scoring::{aggregate, score_category, Rule, ScoreModel};
use crate::signals::{self, Signals};

/// Category -> (model, rule table) registry
fn category_table(category: Category) -> (ScoreModel, &'static [Rule]) {
    match category {
        Category::Gdpr => (ScoreModel::DeductFrom100, signals::privacy::RULES),
        Category::Accessibility => (ScoreModel::DeductFrom100, signals::accessibility::RULES),
        Category::Security => (ScoreModel::CreditFrom0, signals::security::RULES),
        Category::Performance => (ScoreModel::CreditFrom0, signals::performance::RULES),
        Category::Seo => (ScoreModel::DeductFrom100, signals::seo::RULES),
    }
}

/// Runs complete analyses against a fetcher
pub struct AnalysisEngine {
    fetcher: Arc<dyn PageFetcher>,
    weight_overrides: HashMap<String, u32>,
}

impl AnalysisEngine {
    pub fn new(fetcher: Arc<dyn PageFetcher>, weight_overrides: HashMap<String, u32>) -> Self {
        Self {
            fetcher,
            weight_overrides,
        }
    }

    /// Fetch the target once and score the enabled categories.
    ///
    /// Retrieval failure is the only error path; everything after the
    /// fetch degrades instead of failing.
    pub async fn analyze(
        &self,
        url: &Url,
        categories: &[Category],
    ) -> Result<Analysis, SiteGradeError> {
        info!("analyzing {} ({} categories)", url, categories.len());
        let page = self.fetcher.fetch(url).await?;
        let signals = Signals::from_page(&page);
        if signals.dom.parse_degraded {
            debug!("document degraded for {}, scoring with empty tree", url);
        }

        let reports: Vec<CategoryReport> = categories
            .iter()
            .map(|&category| {
                let (model, rules) = category_table(category);
                score_category(category, model, rules, &signals, &self.weight_overrides)
            })
            .collect();

        let fingerprint = signals::fingerprint::detect(&signals);
        let overall = aggregate::aggregate(&reports);
        debug!(
            "{} scored {} ({}) with {} issues",
            url, overall.score, overall.grade, overall.total_issues
        );

        Ok(Analysis {
            page: PageMeta {
                final_url: page.final_url.to_string(),
                status: page.status,
                https: page.https(),
                load_time_ms: page.load_time_ms,
                page_size_bytes: page.page_size_bytes,
            },
            categories: reports,
            fingerprint,
            overall_score: overall.score,
            overall_grade: overall.grade,
            status: overall.status,
            total_issues: overall.total_issues,
            priority_issues: overall.priority_issues,
            recommendations: overall.recommendations,
        })
    }
}
