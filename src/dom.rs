//! Document model builder
//!
//! Parses the fetched body into a queryable tree and distills it into
//! [`DomFacts`], a plain-data summary consumed by the rule tables.
//! Parse problems never propagate: a body that does not look like a
//! document yields degraded (empty) facts and scoring still runs.
//!
//! Extraction is per-fact fault isolated. A selector that fails to
//! compile is logged and its fact stays at the conservative default,
//! so one bad query cannot abort the analysis.

use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

/// Everything the rule tables need to know about the document tree.
///
/// Defaults are conservative: absent features, zero counts. Degraded
/// parses produce exactly the default value with `parse_degraded` set.
#[derive(Debug, Clone, Default)]
pub struct DomFacts {
    pub parse_degraded: bool,
    pub element_count: usize,

    // Images
    pub images_total: usize,
    pub images_missing_alt: usize,
    pub images_missing_dimensions: usize,
    pub images_modern_format: usize,

    // Headings
    pub heading_counts: [usize; 6],

    // Head metadata
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub has_viewport_meta: bool,
    pub canonical: Option<String>,
    pub has_lang_attr: bool,
    pub robots_meta: Option<String>,
    pub og_tags: usize,
    pub twitter_tags: usize,
    pub structured_data_blocks: usize,
    pub has_csp_meta: bool,

    // Forms
    pub forms_total: usize,
    pub inputs_total: usize,
    pub inputs_unlabeled: usize,
    pub inputs_constrained: usize,
    pub password_inputs: usize,
    pub file_inputs: usize,
    pub has_csrf_token: bool,
    pub insecure_form_actions: usize,

    // Links
    pub links_total: usize,
    pub internal_links: usize,
    pub privacy_policy_link: bool,
    pub terms_link: bool,
    pub cookie_policy_link: bool,
    pub sitemap_link: bool,
    pub skip_link: bool,

    // Accessibility structure
    pub aria_attr_count: usize,
    pub semantic_elements: usize,
    pub focusable_elements: usize,
    pub cookie_banner: bool,
    pub consent_controls: bool,
    pub style_has_focus_rule: bool,

    // Resources
    pub stylesheets: usize,
    pub minified_css: usize,
    pub external_scripts: usize,
    pub minified_js: usize,
    pub inline_scripts: usize,
    pub inline_script_bytes: usize,
    pub style_blocks: usize,
    pub inline_style_bytes: usize,
    pub render_blocking: usize,
    pub scripts_with_integrity: usize,
    pub iframes: usize,
    pub inline_event_handlers: usize,
    pub insecure_resource_refs: usize,
}

/// Compile a selector, logging instead of failing on a bad pattern
fn sel(pattern: &str) -> Option<Selector> {
    match Selector::parse(pattern) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("selector '{}' failed to compile: {:?}", pattern, e);
            None
        }
    }
}

fn count(doc: &Html, pattern: &str) -> usize {
    sel(pattern).map(|s| doc.select(&s).count()).unwrap_or(0)
}

fn exists(doc: &Html, pattern: &str) -> bool {
    count(doc, pattern) > 0
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

impl DomFacts {
    /// Extract facts from a fetched body. `base` is the final URL after
    /// redirects, used to classify links as internal or external.
    pub fn extract(body: &str, base: &Url) -> DomFacts {
        if !looks_like_markup(body) {
            warn!("body does not look like a document, degrading to empty tree");
            return DomFacts {
                parse_degraded: true,
                ..DomFacts::default()
            };
        }

        let doc = Html::parse_document(body);
        let mut facts = DomFacts::default();

        facts.element_count = count(&doc, "*");
        if facts.element_count == 0 {
            facts.parse_degraded = true;
            return facts;
        }

        extract_images(&doc, &mut facts);
        extract_headings(&doc, &mut facts);
        extract_head_metadata(&doc, &mut facts);
        extract_forms(&doc, &mut facts);
        extract_links(&doc, base, &mut facts);
        extract_accessibility(&doc, &mut facts);
        extract_resources(&doc, &mut facts);

        facts
    }
}

fn looks_like_markup(body: &str) -> bool {
    let trimmed = body.trim_start();
    !trimmed.is_empty() && trimmed.starts_with('<')
}

fn extract_images(doc: &Html, facts: &mut DomFacts) {
    let Some(img) = sel("img") else { return };
    for el in doc.select(&img) {
        facts.images_total += 1;
        let alt = el.value().attr("alt").unwrap_or("");
        if alt.trim().is_empty() {
            facts.images_missing_alt += 1;
        }
        if el.value().attr("width").is_none() || el.value().attr("height").is_none() {
            facts.images_missing_dimensions += 1;
        }
        let src = el.value().attr("src").unwrap_or("").to_ascii_lowercase();
        if src.contains(".webp") || src.contains(".avif") || src.contains(".svg") {
            facts.images_modern_format += 1;
        }
    }
}

fn extract_headings(doc: &Html, facts: &mut DomFacts) {
    for (i, tag) in ["h1", "h2", "h3", "h4", "h5", "h6"].iter().enumerate() {
        facts.heading_counts[i] = count(doc, tag);
    }
}

fn extract_head_metadata(doc: &Html, facts: &mut DomFacts) {
    if let Some(s) = sel("title") {
        facts.title = doc
            .select(&s)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty());
    }
    if let Some(s) = sel("meta[name=\"description\"]") {
        facts.meta_description = doc
            .select(&s)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
    }
    facts.has_viewport_meta = exists(doc, "meta[name=\"viewport\"]");
    if let Some(s) = sel("link[rel=\"canonical\"]") {
        facts.canonical = doc
            .select(&s)
            .next()
            .and_then(|el| el.value().attr("href"))
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());
    }
    facts.has_lang_attr = exists(doc, "html[lang]");
    if let Some(s) = sel("meta[name=\"robots\"]") {
        facts.robots_meta = doc
            .select(&s)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|c| c.to_string());
    }
    facts.og_tags = count(doc, "meta[property^=\"og:\"]");
    facts.twitter_tags = count(doc, "meta[name^=\"twitter:\"]");
    facts.structured_data_blocks = count(doc, "script[type=\"application/ld+json\"]");
    facts.has_csp_meta = exists(doc, "meta[http-equiv=\"Content-Security-Policy\"]");
}

fn extract_forms(doc: &Html, facts: &mut DomFacts) {
    facts.forms_total = count(doc, "form");

    let Some(input_sel) = sel("input, select, textarea") else {
        return;
    };
    let labelled_ids: Vec<String> = sel("label[for]")
        .map(|s| {
            doc.select(&s)
                .filter_map(|el| el.value().attr("for"))
                .map(|f| f.to_string())
                .collect()
        })
        .unwrap_or_default();

    for el in doc.select(&input_sel) {
        let ty = el
            .value()
            .attr("type")
            .unwrap_or("text")
            .to_ascii_lowercase();
        if ty == "hidden" || ty == "submit" || ty == "button" {
            continue;
        }
        facts.inputs_total += 1;
        if ty == "password" {
            facts.password_inputs += 1;
        }
        if ty == "file" {
            facts.file_inputs += 1;
        }
        if matches!(ty.as_str(), "email" | "tel" | "number" | "date" | "url")
            || el.value().attr("required").is_some()
            || el.value().attr("pattern").is_some()
        {
            facts.inputs_constrained += 1;
        }

        let has_label = el
            .value()
            .attr("id")
            .map(|id| labelled_ids.iter().any(|l| l == id))
            .unwrap_or(false)
            || el.value().attr("aria-label").is_some()
            || el.value().attr("aria-labelledby").is_some();
        if !has_label {
            facts.inputs_unlabeled += 1;
        }
    }

    // Hidden inputs whose name or opaque value suggests a request token
    if let Some(s) = sel("input[type=\"hidden\"]") {
        facts.has_csrf_token = doc.select(&s).any(|el| {
            let name = el.value().attr("name").unwrap_or("").to_ascii_lowercase();
            let value = el.value().attr("value").unwrap_or("");
            name.contains("csrf")
                || name.contains("token")
                || name.contains("nonce")
                || value.len() > 20
        });
    }

    if let Some(s) = sel("form[action]") {
        facts.insecure_form_actions = doc
            .select(&s)
            .filter(|el| {
                el.value()
                    .attr("action")
                    .map(|a| a.starts_with("http://"))
                    .unwrap_or(false)
            })
            .count();
    }
}

const SKIP_LINK_KEYWORDS: &[&str] = &[
    "skip",
    "jump",
    "main content",
    "main navigation",
    "skip to content",
    "skip navigation",
];

fn extract_links(doc: &Html, base: &Url, facts: &mut DomFacts) {
    let Some(a) = sel("a[href]") else { return };
    let base_host = base.host_str().unwrap_or("");

    for el in doc.select(&a) {
        let href = el.value().attr("href").unwrap_or("");
        facts.links_total += 1;

        let internal = if href.starts_with('/') || href.starts_with('#') {
            true
        } else {
            Url::parse(href)
                .map(|u| u.host_str() == Some(base_host))
                .unwrap_or(!href.starts_with("http"))
        };
        if internal {
            facts.internal_links += 1;
        }

        let href_lower = href.to_ascii_lowercase();
        let text_lower = element_text(el).to_ascii_lowercase();

        if href_lower.contains("privacy") || text_lower.contains("privacy") {
            facts.privacy_policy_link = true;
        }
        if href_lower.contains("terms")
            || href_lower.contains("conditions")
            || text_lower.contains("terms")
        {
            facts.terms_link = true;
        }
        if href_lower.contains("cookie") {
            facts.cookie_policy_link = true;
        }
        if href_lower.contains("sitemap") {
            facts.sitemap_link = true;
        }
        if href.starts_with('#') && SKIP_LINK_KEYWORDS.iter().any(|k| text_lower.contains(k)) {
            facts.skip_link = true;
        }
    }
}

const COOKIE_BANNER_SELECTORS: &[&str] = &[
    "[class*=\"cookie\"]",
    "[id*=\"cookie\"]",
    "[class*=\"consent\"]",
    "[id*=\"consent\"]",
    "[class*=\"gdpr\"]",
    "[id*=\"gdpr\"]",
];

const COOKIE_KEYWORDS: &[&str] = &["cookie", "consent", "accept", "gdpr", "privacy", "tracking"];

fn extract_accessibility(doc: &Html, facts: &mut DomFacts) {
    facts.aria_attr_count = count(doc, "[aria-label], [aria-labelledby], [aria-describedby], [role]");
    facts.semantic_elements = count(
        doc,
        "nav, main, article, section, aside, header, footer, figure, figcaption, details, summary",
    );

    // Focusable elements, minus anything explicitly removed from tab order
    if let Some(s) = sel("a[href], button, input, select, textarea, [tabindex]") {
        facts.focusable_elements = doc
            .select(&s)
            .filter(|el| el.value().attr("tabindex") != Some("-1"))
            .count();
    }

    for pattern in COOKIE_BANNER_SELECTORS {
        let Some(s) = sel(pattern) else { continue };
        if doc.select(&s).any(|el| {
            let text = element_text(el).to_ascii_lowercase();
            COOKIE_KEYWORDS.iter().any(|k| text.contains(k))
        }) {
            facts.cookie_banner = true;
            break;
        }
    }

    facts.consent_controls = exists(
        doc,
        "input[name*=\"consent\"], [class*=\"opt-in\"], [class*=\"opt-out\"], button[class*=\"consent\"]",
    );

    if let Some(s) = sel("style") {
        facts.style_has_focus_rule = doc
            .select(&s)
            .any(|el| element_text(el).contains(":focus"));
    }
}

fn extract_resources(doc: &Html, facts: &mut DomFacts) {
    if let Some(s) = sel("link[rel=\"stylesheet\"]") {
        for el in doc.select(&s) {
            facts.stylesheets += 1;
            let href = el.value().attr("href").unwrap_or("");
            if href.contains(".min.css") {
                facts.minified_css += 1;
            }
            if href.starts_with("http://") {
                facts.insecure_resource_refs += 1;
            }
            if el.value().attr("media") != Some("print") {
                facts.render_blocking += 1;
            }
        }
    }

    if let Some(s) = sel("script") {
        for el in doc.select(&s) {
            match el.value().attr("src") {
                Some(src) => {
                    facts.external_scripts += 1;
                    if src.contains(".min.js") {
                        facts.minified_js += 1;
                    }
                    if src.starts_with("http://") {
                        facts.insecure_resource_refs += 1;
                    }
                    if el.value().attr("integrity").is_some() {
                        facts.scripts_with_integrity += 1;
                    }
                    if el.value().attr("async").is_none() && el.value().attr("defer").is_none() {
                        facts.render_blocking += 1;
                    }
                }
                None => {
                    facts.inline_scripts += 1;
                    facts.inline_script_bytes += element_text(el).len();
                }
            }
        }
    }

    if let Some(s) = sel("style") {
        for el in doc.select(&s) {
            facts.style_blocks += 1;
            facts.inline_style_bytes += element_text(el).len();
        }
    }

    if let Some(s) = sel("img[src], iframe[src], audio[src], video[src], source[src]") {
        facts.insecure_resource_refs += doc
            .select(&s)
            .filter(|el| {
                el.value()
                    .attr("src")
                    .map(|src| src.starts_with("http://"))
                    .unwrap_or(false)
            })
            .count();
    }

    facts.iframes = count(doc, "iframe");
    facts.inline_event_handlers = count(
        doc,
        "[onclick], [onload], [onmouseover], [onerror], [onsubmit]",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn empty_body_degrades() {
        let facts = DomFacts::extract("", &base());
        assert!(facts.parse_degraded);
        assert_eq!(facts.images_total, 0);
        assert!(facts.title.is_none());
    }

    #[test]
    fn non_markup_body_degrades() {
        let facts = DomFacts::extract("{\"json\": true}", &base());
        assert!(facts.parse_degraded);
    }

    #[test]
    fn extracts_title_and_description() {
        let html = r#"<html lang="en"><head>
            <title>Hello World</title>
            <meta name="description" content="A fine page">
            <meta name="viewport" content="width=device-width">
        </head><body><h1>Hi</h1></body></html>"#;
        let facts = DomFacts::extract(html, &base());
        assert!(!facts.parse_degraded);
        assert_eq!(facts.title.as_deref(), Some("Hello World"));
        assert_eq!(facts.meta_description.as_deref(), Some("A fine page"));
        assert!(facts.has_viewport_meta);
        assert!(facts.has_lang_attr);
        assert_eq!(facts.heading_counts[0], 1);
    }

    #[test]
    fn counts_images_missing_alt() {
        let html = r#"<html><body>
            <img src="a.png">
            <img src="b.webp" alt="b" width="10" height="10">
            <img src="c.png" alt="  ">
        </body></html>"#;
        let facts = DomFacts::extract(html, &base());
        assert_eq!(facts.images_total, 3);
        assert_eq!(facts.images_missing_alt, 2);
        assert_eq!(facts.images_modern_format, 1);
    }

    #[test]
    fn detects_csrf_token_by_name_and_value_length() {
        let html = r#"<html><body><form>
            <input type="hidden" name="csrf_token" value="x">
            <input type="text" name="q">
        </form></body></html>"#;
        let facts = DomFacts::extract(html, &base());
        assert!(facts.has_csrf_token);

        let html = r#"<html><body><form>
            <input type="hidden" name="state" value="aaaaaaaaaaaaaaaaaaaaaaaaaaa">
        </form></body></html>"#;
        let facts = DomFacts::extract(html, &base());
        assert!(facts.has_csrf_token);

        let html = r#"<html><body><form>
            <input type="hidden" name="page" value="2">
        </form></body></html>"#;
        let facts = DomFacts::extract(html, &base());
        assert!(!facts.has_csrf_token);
    }

    #[test]
    fn unlabeled_inputs_counted() {
        let html = r#"<html><body><form>
            <label for="email">Email</label>
            <input type="email" id="email">
            <input type="text" name="nickname">
            <input type="submit" value="Go">
        </form></body></html>"#;
        let facts = DomFacts::extract(html, &base());
        assert_eq!(facts.inputs_total, 2);
        assert_eq!(facts.inputs_unlabeled, 1);
        assert_eq!(facts.inputs_constrained, 1);
    }

    #[test]
    fn file_inputs_counted() {
        let html = r#"<html><body><form>
            <input type="file" name="avatar">
            <input type="text" name="caption">
        </form></body></html>"#;
        let facts = DomFacts::extract(html, &base());
        assert_eq!(facts.file_inputs, 1);
        assert_eq!(facts.inputs_total, 2);
    }

    #[test]
    fn internal_and_external_links() {
        let html = r#"<html><body>
            <a href="/about">About</a>
            <a href="https://example.com/faq">FAQ</a>
            <a href="https://other.org/x">Other</a>
            <a href="/privacy-policy">Privacy Policy</a>
        </body></html>"#;
        let facts = DomFacts::extract(html, &base());
        assert_eq!(facts.links_total, 4);
        assert_eq!(facts.internal_links, 3);
        assert!(facts.privacy_policy_link);
        assert!(!facts.terms_link);
    }

    #[test]
    fn skip_link_requires_fragment_and_keyword() {
        let html = r##"<html><body>
            <a href="#main">Skip to content</a>
        </body></html>"##;
        let facts = DomFacts::extract(html, &base());
        assert!(facts.skip_link);

        let html = r##"<html><body><a href="#top">Back</a></body></html>"##;
        let facts = DomFacts::extract(html, &base());
        assert!(!facts.skip_link);
    }

    #[test]
    fn cookie_banner_needs_keyword_text() {
        let html = r#"<html><body>
            <div class="cookie-banner">We use cookies. <button>Accept</button></div>
        </body></html>"#;
        let facts = DomFacts::extract(html, &base());
        assert!(facts.cookie_banner);

        let html = r#"<html><body><div class="banner">Welcome!</div></body></html>"#;
        let facts = DomFacts::extract(html, &base());
        assert!(!facts.cookie_banner);
    }

    #[test]
    fn resource_counts() {
        let html = r#"<html><head>
            <link rel="stylesheet" href="app.min.css">
            <script src="https://cdn.example.com/lib.min.js" defer></script>
            <script src="http://insecure.example.com/x.js"></script>
            <script>var inline = 1;</script>
            <style>a:focus { outline: 2px solid; }</style>
        </head><body></body></html>"#;
        let facts = DomFacts::extract(html, &base());
        assert_eq!(facts.stylesheets, 1);
        assert_eq!(facts.minified_css, 1);
        assert_eq!(facts.external_scripts, 2);
        assert_eq!(facts.minified_js, 1);
        assert_eq!(facts.inline_scripts, 1);
        assert_eq!(facts.insecure_resource_refs, 1);
        assert!(facts.style_has_focus_rule);
        // the http script has no async/defer, the stylesheet is render blocking
        assert_eq!(facts.render_blocking, 2);
    }
}
