//! Accessibility rule table
//!
//! Deduct-from-100 model over structural facts: alt text, heading
//! hierarchy, keyboard reachability, ARIA usage, landmarks, labels.
//! The alt-text and form-label rules scale with the number of
//! offending elements, capped at their weight.

use crate::scoring::{Outcome, Rule, RuleKind};
use crate::signals::Signals;

fn bool_outcome(present: bool) -> Outcome {
    if present {
        Outcome::Pass
    } else {
        Outcome::Fail
    }
}

fn check_image_alt(s: &Signals) -> Outcome {
    if s.dom.images_total == 0 {
        Outcome::Skip
    } else if s.dom.images_missing_alt == 0 {
        Outcome::Pass
    } else {
        Outcome::FailCount(s.dom.images_missing_alt as u32)
    }
}

/// A hierarchy is proper when no level is used while a higher level
/// above it is absent (e.g. h3 without any h2).
fn check_heading_hierarchy(s: &Signals) -> Outcome {
    let counts = &s.dom.heading_counts;
    if counts.iter().all(|&c| c == 0) {
        // Covered by the headings_present rule
        return Outcome::Skip;
    }
    let mut seen_gap = false;
    for level in 1..counts.len() {
        if counts[level] > 0 && counts[..level].iter().any(|&c| c == 0) {
            seen_gap = true;
            break;
        }
    }
    bool_outcome(!seen_gap)
}

fn check_headings_present(s: &Signals) -> Outcome {
    bool_outcome(s.dom.heading_counts.iter().any(|&c| c > 0))
}

fn check_keyboard_navigation(s: &Signals) -> Outcome {
    bool_outcome(s.dom.focusable_elements > 0)
}

fn check_screen_reader_support(s: &Signals) -> Outcome {
    bool_outcome(s.dom.aria_attr_count > 0 || s.dom.semantic_elements > 0)
}

fn check_focus_indicators(s: &Signals) -> Outcome {
    if s.dom.style_blocks == 0 && s.dom.stylesheets > 0 {
        // External styles cannot be inspected from a single fetch
        return Outcome::Unknown;
    }
    bool_outcome(s.dom.style_has_focus_rule)
}

fn check_skip_links(s: &Signals) -> Outcome {
    bool_outcome(s.dom.skip_link)
}

fn check_aria_labels(s: &Signals) -> Outcome {
    bool_outcome(s.dom.aria_attr_count > 0)
}

fn check_semantic_html(s: &Signals) -> Outcome {
    bool_outcome(s.dom.semantic_elements > 0)
}

fn check_form_labels(s: &Signals) -> Outcome {
    if s.dom.inputs_total == 0 {
        Outcome::Skip
    } else if s.dom.inputs_unlabeled == 0 {
        Outcome::Pass
    } else {
        Outcome::FailCount(s.dom.inputs_unlabeled as u32)
    }
}

/// Proxy check: a page with no styling at all is likely to have
/// default-contrast text, a styled page is assumed intentional.
fn check_contrast(s: &Signals) -> Outcome {
    bool_outcome(s.dom.stylesheets > 0 || s.dom.style_blocks > 0)
}

pub static RULES: &[Rule] = &[
    Rule {
        id: "image_alt_text",
        kind: RuleKind::Deduct,
        weight: 15,
        per_item: Some(2),
        issue: "Images missing alt text",
        recommendation: "Add descriptive alt text to all images for screen readers",
        check: check_image_alt,
    },
    Rule {
        id: "heading_hierarchy",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "Improper heading hierarchy detected",
        recommendation: "Use proper heading hierarchy (h1, h2, h3, etc.) without skipping levels",
        check: check_heading_hierarchy,
    },
    Rule {
        id: "headings_present",
        kind: RuleKind::Deduct,
        weight: 15,
        per_item: None,
        issue: "No heading structure found",
        recommendation: "Implement proper heading hierarchy for better document structure",
        check: check_headings_present,
    },
    Rule {
        id: "keyboard_navigation",
        kind: RuleKind::Deduct,
        weight: 15,
        per_item: None,
        issue: "Limited keyboard navigation support",
        recommendation: "Ensure all interactive elements are keyboard accessible",
        check: check_keyboard_navigation,
    },
    Rule {
        id: "screen_reader_support",
        kind: RuleKind::Deduct,
        weight: 15,
        per_item: None,
        issue: "Limited screen reader support",
        recommendation: "Add ARIA labels and semantic HTML elements",
        check: check_screen_reader_support,
    },
    Rule {
        id: "focus_indicators",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "No visible focus indicators",
        recommendation: "Add visible focus indicators for keyboard navigation",
        check: check_focus_indicators,
    },
    Rule {
        id: "skip_links",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "No skip navigation links",
        recommendation: "Add skip links for keyboard users",
        check: check_skip_links,
    },
    Rule {
        id: "aria_labels",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "Missing ARIA labels",
        recommendation: "Add ARIA labels to interactive elements",
        check: check_aria_labels,
    },
    Rule {
        id: "semantic_html",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "Limited semantic HTML usage",
        recommendation: "Use semantic HTML elements (nav, main, article, etc.)",
        check: check_semantic_html,
    },
    Rule {
        id: "form_labels",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: Some(2),
        issue: "Form inputs missing labels",
        recommendation: "Add proper labels to all form inputs",
        check: check_form_labels,
    },
    Rule {
        id: "color_contrast",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "Potential color contrast issues",
        recommendation: "Ensure sufficient color contrast for text readability",
        check: check_contrast,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::scoring::{score_category, ScoreModel};
    use crate::signals::test_support::signals_from_html;
    use std::collections::HashMap;

    fn score(html: &str) -> crate::models::CategoryReport {
        let signals = signals_from_html(html, &[]);
        score_category(
            Category::Accessibility,
            ScoreModel::DeductFrom100,
            RULES,
            &signals,
            &HashMap::new(),
        )
    }

    #[test]
    fn missing_alt_deduction_scales_and_caps() {
        let two_imgs = r#"<html><body><h1>t</h1>
            <img src="a.png"><img src="b.png">
        </body></html>"#;
        let many = r#"<html><body><h1>t</h1>
            <img><img><img><img><img><img><img><img><img><img>
        </body></html>"#;
        let few = score(two_imgs);
        let lots = score(many);
        // 2 missing at 2 points each vs the 15 point cap
        assert_eq!(lots.score + 15, few.score + 4);
    }

    #[test]
    fn heading_gap_detected() {
        let gap = r#"<html><body><h1>a</h1><h3>b</h3><a href="/x">l</a></body></html>"#;
        let report = score(gap);
        assert!(report
            .issues
            .contains(&"Improper heading hierarchy detected".to_string()));

        let ok = r#"<html><body><h1>a</h1><h2>b</h2><h3>c</h3><a href="/x">l</a></body></html>"#;
        let report = score(ok);
        assert!(!report
            .issues
            .contains(&"Improper heading hierarchy detected".to_string()));
    }

    #[test]
    fn no_headings_fails_presence_not_hierarchy() {
        let report = score(r#"<html><body><p>text</p></body></html>"#);
        assert!(report.issues.contains(&"No heading structure found".to_string()));
        assert!(!report
            .issues
            .contains(&"Improper heading hierarchy detected".to_string()));
    }

    #[test]
    fn well_structured_page_scores_high() {
        let html = r##"<html><body>
            <style>a:focus { outline: 2px solid blue; } body { color: #222; }</style>
            <a href="#main">Skip to content</a>
            <header><nav aria-label="Main"><a href="/">Home</a></nav></header>
            <main id="main">
                <h1>Title</h1>
                <h2>Section</h2>
                <img src="cat.jpg" alt="A cat" width="100" height="100">
                <form>
                    <label for="q">Search</label>
                    <input type="text" id="q">
                </form>
            </main>
            <footer>fin</footer>
        </body></html>"##;
        let report = score(html);
        assert_eq!(report.score, 100);
        assert_eq!(report.grade, "AAA");
    }

    #[test]
    fn score_never_negative() {
        let report = score("<html><body></body></html>");
        assert!(report.score <= 100);
    }
}
