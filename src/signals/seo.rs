//! Search-discoverability rule table
//!
//! Deduct-from-100 model. Title and description length windows carry
//! the heaviest weight; the remaining checks are 10 points each.

use crate::scoring::{Outcome, Rule, RuleKind};
use crate::signals::Signals;

const TITLE_MIN: usize = 30;
const TITLE_MAX: usize = 60;
const DESCRIPTION_MIN: usize = 120;
const DESCRIPTION_MAX: usize = 160;

fn bool_outcome(present: bool) -> Outcome {
    if present {
        Outcome::Pass
    } else {
        Outcome::Fail
    }
}

fn check_title(s: &Signals) -> Outcome {
    match &s.dom.title {
        Some(title) => {
            let len = title.chars().count();
            bool_outcome((TITLE_MIN..=TITLE_MAX).contains(&len))
        }
        None => Outcome::Fail,
    }
}

fn check_description(s: &Signals) -> Outcome {
    match &s.dom.meta_description {
        Some(desc) => {
            let len = desc.chars().count();
            bool_outcome((DESCRIPTION_MIN..=DESCRIPTION_MAX).contains(&len))
        }
        None => Outcome::Fail,
    }
}

fn check_open_graph(s: &Signals) -> Outcome {
    bool_outcome(s.dom.og_tags >= 3)
}

fn check_twitter_card(s: &Signals) -> Outcome {
    bool_outcome(s.dom.twitter_tags > 0)
}

fn check_structured_data(s: &Signals) -> Outcome {
    bool_outcome(s.dom.structured_data_blocks > 0)
}

fn check_sitemap(s: &Signals) -> Outcome {
    bool_outcome(s.dom.sitemap_link || s.body_lower.contains("sitemap.xml"))
}

fn check_robots_meta(s: &Signals) -> Outcome {
    match &s.dom.robots_meta {
        Some(content) => bool_outcome(!content.to_ascii_lowercase().contains("noindex")),
        None => Outcome::Fail,
    }
}

fn check_canonical(s: &Signals) -> Outcome {
    bool_outcome(s.dom.canonical.is_some())
}

fn check_internal_links(s: &Signals) -> Outcome {
    bool_outcome(s.dom.internal_links >= 5)
}

/// Exactly one h1 with some heading structure behind it
fn check_heading_structure(s: &Signals) -> Outcome {
    let counts = &s.dom.heading_counts;
    if counts.iter().all(|&c| c == 0) {
        return Outcome::Fail;
    }
    bool_outcome(counts[0] == 1)
}

fn check_image_seo(s: &Signals) -> Outcome {
    if s.dom.images_total == 0 {
        Outcome::Skip
    } else {
        bool_outcome(s.dom.images_missing_alt == 0)
    }
}

fn check_viewport(s: &Signals) -> Outcome {
    bool_outcome(s.dom.has_viewport_meta)
}

fn check_lang(s: &Signals) -> Outcome {
    bool_outcome(s.dom.has_lang_attr)
}

fn check_ssl(s: &Signals) -> Outcome {
    bool_outcome(s.https)
}

pub static RULES: &[Rule] = &[
    Rule {
        id: "meta_title",
        kind: RuleKind::Deduct,
        weight: 15,
        per_item: None,
        issue: "Missing or poorly sized meta title",
        recommendation: "Add a descriptive meta title (50-60 characters)",
        check: check_title,
    },
    Rule {
        id: "meta_description",
        kind: RuleKind::Deduct,
        weight: 15,
        per_item: None,
        issue: "Missing or poorly sized meta description",
        recommendation: "Add a compelling meta description (150-160 characters)",
        check: check_description,
    },
    Rule {
        id: "open_graph",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "No Open Graph tags found",
        recommendation: "Add Open Graph tags for better social media sharing",
        check: check_open_graph,
    },
    Rule {
        id: "twitter_card",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "No Twitter Card tags found",
        recommendation: "Add Twitter Card tags for better Twitter sharing",
        check: check_twitter_card,
    },
    Rule {
        id: "structured_data",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "No structured data found",
        recommendation: "Implement structured data (JSON-LD) for better search results",
        check: check_structured_data,
    },
    Rule {
        id: "sitemap",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "No sitemap link found",
        recommendation: "Create and submit a sitemap to search engines",
        check: check_sitemap,
    },
    Rule {
        id: "robots_meta",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "No robots meta tag found",
        recommendation: "Create a robots meta tag to guide search engine crawlers",
        check: check_robots_meta,
    },
    Rule {
        id: "canonical",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "No canonical URL found",
        recommendation: "Add canonical URLs to prevent duplicate content issues",
        check: check_canonical,
    },
    Rule {
        id: "internal_links",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "Limited internal linking structure",
        recommendation: "Implement strategic internal linking for better SEO",
        check: check_internal_links,
    },
    Rule {
        id: "heading_structure",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "Heading structure not optimized for search",
        recommendation: "Improve heading structure for better content organization",
        check: check_heading_structure,
    },
    Rule {
        id: "image_seo",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "Images missing alt text",
        recommendation: "Optimize images with proper alt text and file names",
        check: check_image_seo,
    },
    Rule {
        id: "mobile_viewport",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "Mobile optimization not implemented",
        recommendation: "Ensure responsive design and fast loading on mobile devices",
        check: check_viewport,
    },
    Rule {
        id: "lang_attribute",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "No language attribute on the document",
        recommendation: "Declare the page language with the html lang attribute",
        check: check_lang,
    },
    Rule {
        id: "ssl",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "SSL not implemented",
        recommendation: "Ensure all resources are served over HTTPS",
        check: check_ssl,
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
            Category::Seo,
            ScoreModel::DeductFrom100,
            RULES,
            &signals,
            &HashMap::new(),
        )
    }

    #[test]
    fn title_length_window() {
        let short = score("<html><head><title>Hi</title></head><body></body></html>");
        assert!(short
            .issues
            .contains(&"Missing or poorly sized meta title".to_string()));

        let good_title = "A".repeat(45);
        let html = format!("<html><head><title>{good_title}</title></head><body></body></html>");
        let good = score(&html);
        assert!(!good
            .issues
            .contains(&"Missing or poorly sized meta title".to_string()));
    }

    #[test]
    fn description_length_window() {
        let desc = "d".repeat(140);
        let html = format!(
            r#"<html><head><meta name="description" content="{desc}"></head><body></body></html>"#
        );
        let report = score(&html);
        assert!(!report
            .issues
            .contains(&"Missing or poorly sized meta description".to_string()));

        let report = score(r#"<html><head><meta name="description" content="tiny"></head><body></body></html>"#);
        assert!(report
            .issues
            .contains(&"Missing or poorly sized meta description".to_string()));
    }

    #[test]
    fn multiple_h1_fails_heading_structure() {
        let report = score("<html><body><h1>a</h1><h1>b</h1></body></html>");
        assert!(report
            .issues
            .contains(&"Heading structure not optimized for search".to_string()));
    }

    #[test]
    fn noindex_robots_fails() {
        let report = score(
            r#"<html><head><meta name="robots" content="noindex, nofollow"></head><body></body></html>"#,
        );
        assert!(report.issues.contains(&"No robots meta tag found".to_string()));
    }

    #[test]
    fn rich_head_scores_full() {
        let title = "T".repeat(40);
        let desc = "d".repeat(130);
        let html = format!(
            r#"<html lang="en"><head>
            <title>{title}</title>
            <meta name="description" content="{desc}">
            <meta name="viewport" content="width=device-width">
            <meta name="robots" content="index, follow">
            <link rel="canonical" href="https://example.com/">
            <meta property="og:title" content="t">
            <meta property="og:description" content="d">
            <meta property="og:image" content="i.png">
            <meta name="twitter:card" content="summary">
            <script type="application/ld+json">{{}}</script>
        </head><body>
            <h1>One</h1><h2>Two</h2>
            <a href="/a">a</a><a href="/b">b</a><a href="/c">c</a>
            <a href="/d">d</a><a href="/sitemap.xml">sitemap</a>
        </body></html>"#
        );
        let report = score(&html);
        assert_eq!(report.score, 100);
        assert!(report.issues.is_empty());
    }
}
