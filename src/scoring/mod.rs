//! Rule-table scoring
//!
//! Every category is a static table of [`Rule`] rows evaluated by one
//! generic scorer. Adding a rule means adding a row, never a branch.
//!
//! # Scoring Formula
//!
//! ```text
//! DeductFrom100:  score = clamp(100 - Σ deductions, 0, 100)
//!                 deduction = weight, or min(weight, per_item × count)
//! CreditFrom0:    score = clamp(Σ credits - Σ penalties, 0, 100)
//! ```
//!
//! Failed rows append exactly one issue and one recommendation. A row
//! whose signal could not be resolved evaluates as `Unknown` and is
//! treated as absent: deduct rows deduct, credit rows grant nothing.
//! Weights are data and can be overridden per rule id from config.

pub mod aggregate;

use std::collections::HashMap;

use serde_json::Value;

use crate::models::{
    compliance_level, grade_from_score, security_level, wcag_level, Category, CategoryReport,
};
use crate::signals::Signals;

/// Result of evaluating one rule against the signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Check satisfied; credit rules earn their weight
    Pass,
    /// Check failed; deduct/penalty rules lose their weight
    Fail,
    /// Check failed with a magnitude, scaled by the rule's `per_item`
    FailCount(u32),
    /// Rule does not apply to this page; no score change, no issue
    Skip,
    /// Signal could not be resolved; scored as absent
    Unknown,
}

/// How a rule moves the score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Subtracts weight from a 100 baseline on failure
    Deduct,
    /// Adds weight to a 0 baseline on success; failure is issue-only
    Credit,
    /// Subtracts weight on confirmed failure; success is silent
    Penalty,
}

/// One row of a category's rule table
pub struct Rule {
    pub id: &'static str,
    pub kind: RuleKind,
    pub weight: u32,
    /// For count-scaled rules: deduction = min(weight, per_item × count)
    pub per_item: Option<u32>,
    pub issue: &'static str,
    pub recommendation: &'static str,
    pub check: fn(&Signals) -> Outcome,
}

impl Rule {
    fn effective_weight(&self, overrides: &HashMap<String, u32>) -> u32 {
        overrides.get(self.id).copied().unwrap_or(self.weight)
    }
}

/// Scoring direction of a category table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreModel {
    DeductFrom100,
    CreditFrom0,
}

fn category_grade(category: Category, score: u32) -> String {
    match category {
        Category::Gdpr => compliance_level(score),
        Category::Accessibility => wcag_level(score),
        Category::Security => security_level(score),
        Category::Performance | Category::Seo => grade_from_score(score),
    }
}

/// Evaluate one category's table against the extracted signals
pub fn score_category(
    category: Category,
    model: ScoreModel,
    rules: &[Rule],
    signals: &Signals,
    overrides: &HashMap<String, u32>,
) -> CategoryReport {
    let mut score: i64 = match model {
        ScoreModel::DeductFrom100 => 100,
        ScoreModel::CreditFrom0 => 0,
    };
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();
    let mut signal_map = serde_json::Map::new();

    for rule in rules {
        let outcome = (rule.check)(signals);
        let weight = rule.effective_weight(overrides) as i64;

        let failed_amount = |count: Option<u32>| -> i64 {
            match (rule.per_item, count) {
                (Some(per), Some(n)) => weight.min((per as i64).saturating_mul(n as i64)),
                _ => weight,
            }
        };

        match outcome {
            Outcome::Skip => continue,
            Outcome::Pass => {
                signal_map.insert(rule.id.to_string(), Value::Bool(true));
                if rule.kind == RuleKind::Credit {
                    score += weight;
                }
            }
            Outcome::Fail | Outcome::FailCount(_) | Outcome::Unknown => {
                signal_map.insert(rule.id.to_string(), Value::Bool(false));
                let count = match outcome {
                    Outcome::FailCount(n) => Some(n),
                    _ => None,
                };
                match rule.kind {
                    RuleKind::Deduct => {
                        score -= failed_amount(count);
                        issues.push(rule.issue.to_string());
                        recommendations.push(rule.recommendation.to_string());
                    }
                    RuleKind::Credit => {
                        // No credit earned; still worth reporting
                        issues.push(rule.issue.to_string());
                        recommendations.push(rule.recommendation.to_string());
                    }
                    RuleKind::Penalty => {
                        // Penalties only fire on confirmed defects
                        if outcome != Outcome::Unknown {
                            score -= failed_amount(count);
                            issues.push(rule.issue.to_string());
                            recommendations.push(rule.recommendation.to_string());
                        }
                    }
                }
            }
        }
    }

    let score = score.clamp(0, 100) as u32;
    CategoryReport {
        category,
        score,
        grade: category_grade(category, score),
        issues,
        recommendations,
        signals: signal_map,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Signals;

    fn empty_signals() -> Signals {
        Signals::for_tests()
    }

    fn pass(_: &Signals) -> Outcome {
        Outcome::Pass
    }
    fn fail(_: &Signals) -> Outcome {
        Outcome::Fail
    }
    fn fail_three(_: &Signals) -> Outcome {
        Outcome::FailCount(3)
    }
    fn skip(_: &Signals) -> Outcome {
        Outcome::Skip
    }
    fn unknown(_: &Signals) -> Outcome {
        Outcome::Unknown
    }

    const fn deduct(id: &'static str, weight: u32, check: fn(&Signals) -> Outcome) -> Rule {
        Rule {
            id,
            kind: RuleKind::Deduct,
            weight,
            per_item: None,
            issue: "issue",
            recommendation: "recommendation",
            check,
        }
    }

    #[test]
    fn deduct_model_subtracts_failures() {
        let rules = [deduct("a", 15, fail), deduct("b", 10, pass), deduct("c", 10, fail)];
        let report = score_category(
            Category::Gdpr,
            ScoreModel::DeductFrom100,
            &rules,
            &empty_signals(),
            &HashMap::new(),
        );
        assert_eq!(report.score, 75);
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.recommendations.len(), 2);
        assert_eq!(report.signals.get("b"), Some(&Value::Bool(true)));
        assert_eq!(report.signals.get("a"), Some(&Value::Bool(false)));
    }

    #[test]
    fn score_clamps_at_zero() {
        let rules = [
            deduct("a", 60, fail),
            deduct("b", 60, fail),
            deduct("c", 60, fail),
        ];
        let report = score_category(
            Category::Gdpr,
            ScoreModel::DeductFrom100,
            &rules,
            &empty_signals(),
            &HashMap::new(),
        );
        assert_eq!(report.score, 0);
    }

    #[test]
    fn credit_model_clamps_at_hundred() {
        let rules = [
            Rule {
                id: "big",
                kind: RuleKind::Credit,
                weight: 80,
                per_item: None,
                issue: "i",
                recommendation: "r",
                check: pass,
            },
            Rule {
                id: "bigger",
                kind: RuleKind::Credit,
                weight: 80,
                per_item: None,
                issue: "i",
                recommendation: "r",
                check: pass,
            },
        ];
        let report = score_category(
            Category::Security,
            ScoreModel::CreditFrom0,
            &rules,
            &empty_signals(),
            &HashMap::new(),
        );
        assert_eq!(report.score, 100);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn failed_credit_reports_without_scoring() {
        let rules = [Rule {
            id: "csp",
            kind: RuleKind::Credit,
            weight: 15,
            per_item: None,
            issue: "No Content Security Policy found",
            recommendation: "Implement Content Security Policy to prevent XSS attacks",
            check: fail,
        }];
        let report = score_category(
            Category::Security,
            ScoreModel::CreditFrom0,
            &rules,
            &empty_signals(),
            &HashMap::new(),
        );
        assert_eq!(report.score, 0);
        assert_eq!(report.issues, vec!["No Content Security Policy found"]);
        assert_eq!(report.signals.get("csp"), Some(&Value::Bool(false)));
    }

    #[test]
    fn per_item_deduction_caps_at_weight() {
        let rules = [Rule {
            id: "alt",
            kind: RuleKind::Deduct,
            weight: 15,
            per_item: Some(2),
            issue: "i",
            recommendation: "r",
            check: fail_three,
        }];
        let report = score_category(
            Category::Accessibility,
            ScoreModel::DeductFrom100,
            &rules,
            &empty_signals(),
            &HashMap::new(),
        );
        // 3 items x 2 points, below the 15 cap
        assert_eq!(report.score, 94);

        let rules = [Rule {
            id: "alt",
            kind: RuleKind::Deduct,
            weight: 15,
            per_item: Some(2),
            issue: "i",
            recommendation: "r",
            check: |_| Outcome::FailCount(40),
        }];
        let report = score_category(
            Category::Accessibility,
            ScoreModel::DeductFrom100,
            &rules,
            &empty_signals(),
            &HashMap::new(),
        );
        assert_eq!(report.score, 85);
    }

    #[test]
    fn skip_is_silent() {
        let rules = [deduct("a", 50, skip)];
        let report = score_category(
            Category::Gdpr,
            ScoreModel::DeductFrom100,
            &rules,
            &empty_signals(),
            &HashMap::new(),
        );
        assert_eq!(report.score, 100);
        assert!(report.issues.is_empty());
        assert!(report.signals.is_empty());
    }

    #[test]
    fn unknown_deducts_but_penalty_stays_silent() {
        let rules = [
            deduct("d", 10, unknown),
            Rule {
                id: "p",
                kind: RuleKind::Penalty,
                weight: 10,
                per_item: None,
                issue: "i",
                recommendation: "r",
                check: unknown,
            },
        ];
        let report = score_category(
            Category::Gdpr,
            ScoreModel::DeductFrom100,
            &rules,
            &empty_signals(),
            &HashMap::new(),
        );
        assert_eq!(report.score, 90);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn weight_override_changes_score() {
        let rules = [deduct("a", 15, fail)];
        let mut overrides = HashMap::new();
        overrides.insert("a".to_string(), 40);
        let report = score_category(
            Category::Gdpr,
            ScoreModel::DeductFrom100,
            &rules,
            &empty_signals(),
            &overrides,
        );
        assert_eq!(report.score, 60);
    }
}
