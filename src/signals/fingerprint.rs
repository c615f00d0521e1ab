//! Platform fingerprinting
//!
//! Static {substring pattern -> label} tables evaluated by generic
//! matchers. Hosting is first-match-wins across ordered header
//! sources with a URL fallback; frameworks, CMS, and technologies
//! accumulate every match. Purely informational, never scored.
//! False negatives are acceptable.

use crate::signals::Signals;
use crate::models::Fingerprint;

struct PatternRow {
    pattern: &'static str,
    label: &'static str,
}

const fn row(pattern: &'static str, label: &'static str) -> PatternRow {
    PatternRow { pattern, label }
}

/// Hosting hints in the `server` header
static SERVER_HOSTING: &[PatternRow] = &[
    row("cloudflare", "Cloudflare"),
    row("awselb", "AWS"),
    row("amazons3", "AWS S3"),
    row("gws", "Google"),
    row("microsoft-iis", "Microsoft IIS"),
    row("vercel", "Vercel"),
    row("netlify", "Netlify"),
    row("github.com", "GitHub Pages"),
    row("nginx", "Nginx"),
    row("apache", "Apache"),
    row("litespeed", "LiteSpeed"),
];

static POWERED_BY_HOSTING: &[PatternRow] = &[
    row("express", "Express"),
    row("php", "PHP"),
    row("asp.net", "ASP.NET"),
    row("next.js", "Vercel"),
    row("wp engine", "WP Engine"),
];

static URL_HOSTING: &[PatternRow] = &[
    row(".github.io", "GitHub Pages"),
    row(".netlify.app", "Netlify"),
    row(".vercel.app", "Vercel"),
    row(".herokuapp.com", "Heroku"),
    row(".pages.dev", "Cloudflare Pages"),
    row(".web.app", "Firebase"),
    row(".firebaseapp.com", "Firebase"),
];

static FRAMEWORKS: &[PatternRow] = &[
    row("react", "React"),
    row("angular", "Angular"),
    row("vue", "Vue.js"),
    row("jquery", "jQuery"),
    row("bootstrap", "Bootstrap"),
    row("tailwind", "Tailwind CSS"),
    row("material-ui", "Material-UI"),
    row("ant-design", "Ant Design"),
    row("chakra", "Chakra UI"),
    row("next.js", "Next.js"),
    row("_next/", "Next.js"),
    row("nuxt", "Nuxt.js"),
    row("gatsby", "Gatsby"),
];

static CMS: &[PatternRow] = &[
    row("wp-content", "WordPress"),
    row("wp-includes", "WordPress"),
    row("drupal", "Drupal"),
    row("joomla", "Joomla"),
    row("shopify", "Shopify"),
    row("wix.com", "Wix"),
    row("squarespace", "Squarespace"),
    row("ghost.io", "Ghost"),
    row("generator\" content=\"hugo", "Hugo"),
    row("generator\" content=\"jekyll", "Jekyll"),
];

static TECHNOLOGIES: &[PatternRow] = &[
    row("google-analytics.com", "Google Analytics"),
    row("gtag(", "Google Analytics"),
    row("googletagmanager.com", "Google Tag Manager"),
    row("facebook.net", "Facebook Pixel"),
    row("fbq(", "Facebook Pixel"),
    row("js.stripe.com", "Stripe"),
    row("paypal.com", "PayPal"),
    row("recaptcha", "reCAPTCHA"),
    row("amazonaws.com", "AWS"),
    row("googleapis.com", "Google Cloud"),
    row("azurewebsites.net", "Azure"),
    row("vercel.app", "Vercel"),
    row("netlify.app", "Netlify"),
    row("firebaseio.com", "Firebase"),
    row("sentry.io", "Sentry"),
    row("mixpanel.com", "Mixpanel"),
    row("hotjar.com", "Hotjar"),
    row("intercom.io", "Intercom"),
    row("zendesk.com", "Zendesk"),
    row("mailchimp.com", "Mailchimp"),
    row("hubspot.com", "HubSpot"),
];

fn first_match(haystack: &str, table: &[PatternRow]) -> Option<&'static str> {
    let lower = haystack.to_ascii_lowercase();
    table
        .iter()
        .find(|r| lower.contains(r.pattern))
        .map(|r| r.label)
}

fn all_matches(haystack: &str, table: &[PatternRow], into: &mut Vec<String>) {
    for r in table {
        if haystack.contains(r.pattern) {
            let label = r.label.to_string();
            if !into.contains(&label) {
                into.push(label);
            }
        }
    }
}

/// Hosting detection: ordered header sources, first match wins, URL
/// patterns as the last resort.
fn detect_hosting(signals: &Signals) -> String {
    if let Some(label) = signals
        .header("server")
        .and_then(|v| first_match(v, SERVER_HOSTING))
    {
        return label.to_string();
    }
    if let Some(label) = signals
        .header("x-powered-by")
        .and_then(|v| first_match(v, POWERED_BY_HOSTING))
    {
        return label.to_string();
    }
    if signals.has_header("cf-ray") {
        return "Cloudflare".to_string();
    }
    if let Some(label) = signals
        .header("via")
        .and_then(|v| first_match(v, SERVER_HOSTING))
    {
        return label.to_string();
    }
    if let Some(label) = first_match(signals.url.as_str(), URL_HOSTING) {
        return label.to_string();
    }
    "Unknown".to_string()
}

/// Build the complete fingerprint from headers, URL, and body content
pub fn detect(signals: &Signals) -> Fingerprint {
    let mut fp = Fingerprint {
        hosting: detect_hosting(signals),
        ..Fingerprint::default()
    };
    all_matches(&signals.body_lower, FRAMEWORKS, &mut fp.frameworks);
    all_matches(&signals.body_lower, CMS, &mut fp.cms);
    all_matches(&signals.body_lower, TECHNOLOGIES, &mut fp.technologies);
    fp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::test_support::signals_from_html;

    #[test]
    fn hosting_prefers_server_header() {
        let s = signals_from_html("<html></html>", &[("server", "nginx/1.18"), ("cf-ray", "x")]);
        let fp = detect(&s);
        assert_eq!(fp.hosting, "Nginx");
    }

    #[test]
    fn cf_ray_wins_over_via() {
        let s = signals_from_html("<html></html>", &[("cf-ray", "abc"), ("via", "1.1 apache")]);
        assert_eq!(detect(&s).hosting, "Cloudflare");
    }

    #[test]
    fn url_fallback_hosting() {
        let mut s = signals_from_html("<html></html>", &[]);
        s.url = url::Url::parse("https://myblog.github.io/").unwrap();
        assert_eq!(detect(&s).hosting, "GitHub Pages");
    }

    #[test]
    fn unknown_hosting_without_hints() {
        let s = signals_from_html("<html></html>", &[]);
        assert_eq!(detect(&s).hosting, "Unknown");
    }

    #[test]
    fn frameworks_accumulate_and_dedupe() {
        let html = r#"<html><body>
            <script src="/js/react.production.min.js"></script>
            <script src="/js/react-dom.min.js"></script>
            <link href="/css/bootstrap.min.css" rel="stylesheet">
        </body></html>"#;
        let s = signals_from_html(html, &[]);
        let fp = detect(&s);
        assert_eq!(fp.frameworks.iter().filter(|f| *f == "React").count(), 1);
        assert!(fp.frameworks.contains(&"Bootstrap".to_string()));
    }

    #[test]
    fn wordpress_from_wp_content() {
        let html = r#"<html><body><img src="/wp-content/uploads/x.png"></body></html>"#;
        let s = signals_from_html(html, &[]);
        assert_eq!(detect(&s).cms, vec!["WordPress"]);
    }

    #[test]
    fn technologies_detected_from_script_urls() {
        let html = r#"<html><body>
            <script src="https://www.google-analytics.com/analytics.js"></script>
            <script src="https://js.stripe.com/v3/"></script>
        </body></html>"#;
        let s = signals_from_html(html, &[]);
        let fp = detect(&s);
        assert!(fp.technologies.contains(&"Google Analytics".to_string()));
        assert!(fp.technologies.contains(&"Stripe".to_string()));
    }
}
