//! Performance rule table
//!
//! Additive-credit model. Load time earns tiered credit (the tiers are
//! mutually exclusive rows, each skipping outside its band), small
//! pages earn a bonus, and confirmed slowness signals subtract. Two
//! zero-weight penalty rows exist only to surface slow-load issues
//! without double counting the missing tier credit.

use crate::scoring::{Outcome, Rule, RuleKind};
use crate::signals::Signals;

const MB: u64 = 1024 * 1024;
const KB: u64 = 1024;

const CDN_MARKERS: &[&str] = &[
    "cloudfront.net",
    "cloudflare",
    "fastly",
    "akamai",
    "jsdelivr.net",
    "unpkg.com",
    "cdnjs.cloudflare.com",
    "cdn.",
];

fn tier(s: &Signals, low_ms: u64, high_ms: u64) -> Outcome {
    if s.load_time_ms >= low_ms && s.load_time_ms < high_ms {
        Outcome::Pass
    } else {
        Outcome::Skip
    }
}

fn band_issue(s: &Signals, low_ms: u64, high_ms: u64) -> Outcome {
    if s.load_time_ms >= low_ms && s.load_time_ms < high_ms {
        Outcome::Fail
    } else {
        Outcome::Skip
    }
}

fn check_small_page(s: &Signals) -> Outcome {
    if s.page_size_bytes < 500 * KB {
        Outcome::Pass
    } else {
        Outcome::Skip
    }
}

fn check_large_page(s: &Signals) -> Outcome {
    if s.page_size_bytes > 3 * MB {
        Outcome::Fail
    } else {
        Outcome::Skip
    }
}

fn check_moderate_page(s: &Signals) -> Outcome {
    if s.page_size_bytes > MB && s.page_size_bytes <= 3 * MB {
        Outcome::Fail
    } else {
        Outcome::Skip
    }
}

fn check_image_formats(s: &Signals) -> Outcome {
    if s.dom.images_total == 0 {
        Outcome::Skip
    } else if s.dom.images_modern_format > 0 {
        Outcome::Pass
    } else {
        Outcome::Fail
    }
}

fn check_minification(s: &Signals) -> Outcome {
    let has_css = s.dom.stylesheets > 0;
    let has_js = s.dom.external_scripts > 0;
    if !has_css && !has_js {
        return Outcome::Skip;
    }
    let css_ok = !has_css || s.dom.minified_css > 0;
    let js_ok = !has_js || s.dom.minified_js > 0;
    if css_ok && js_ok {
        Outcome::Pass
    } else {
        Outcome::Fail
    }
}

fn check_compression(s: &Signals) -> Outcome {
    match s.header("content-encoding") {
        Some(v) if v.contains("gzip") || v.contains("br") || v.contains("deflate") => Outcome::Pass,
        _ => Outcome::Fail,
    }
}

fn check_caching(s: &Signals) -> Outcome {
    let cached = s.has_header("cache-control")
        || s.has_header("expires")
        || s.has_header("etag")
        || s.has_header("last-modified");
    if cached {
        Outcome::Pass
    } else {
        Outcome::Fail
    }
}

fn check_cdn(s: &Signals) -> Outcome {
    if s.mentions_any(CDN_MARKERS) || s.has_header("cf-ray") || s.has_header("x-served-by") {
        Outcome::Pass
    } else {
        Outcome::Fail
    }
}

fn check_render_blocking(s: &Signals) -> Outcome {
    if s.dom.render_blocking > 3 {
        Outcome::FailCount(s.dom.render_blocking as u32)
    } else {
        Outcome::Pass
    }
}

fn check_dom_size(s: &Signals) -> Outcome {
    if s.dom.element_count > 1500 {
        Outcome::Fail
    } else {
        Outcome::Pass
    }
}

fn check_inline_assets(s: &Signals) -> Outcome {
    if s.dom.inline_script_bytes + s.dom.inline_style_bytes > 50 * 1024 {
        Outcome::Fail
    } else {
        Outcome::Pass
    }
}

fn check_third_party(s: &Signals) -> Outcome {
    if s.dom.external_scripts > 10 {
        Outcome::FailCount(s.dom.external_scripts as u32)
    } else {
        Outcome::Pass
    }
}

fn check_http2(s: &Signals) -> Outcome {
    if s.http2 {
        Outcome::Pass
    } else {
        Outcome::Fail
    }
}

pub static RULES: &[Rule] = &[
    Rule {
        id: "load_time_excellent",
        kind: RuleKind::Credit,
        weight: 25,
        per_item: None,
        issue: "",
        recommendation: "",
        check: |s| tier(s, 0, 1_000),
    },
    Rule {
        id: "load_time_good",
        kind: RuleKind::Credit,
        weight: 20,
        per_item: None,
        issue: "",
        recommendation: "",
        check: |s| tier(s, 1_000, 2_000),
    },
    Rule {
        id: "load_time_fair",
        kind: RuleKind::Credit,
        weight: 15,
        per_item: None,
        issue: "",
        recommendation: "",
        check: |s| tier(s, 2_000, 3_000),
    },
    Rule {
        id: "load_time_acceptable",
        kind: RuleKind::Credit,
        weight: 10,
        per_item: None,
        issue: "",
        recommendation: "",
        check: |s| tier(s, 3_000, 5_000),
    },
    Rule {
        id: "slow_load",
        kind: RuleKind::Penalty,
        weight: 0,
        per_item: None,
        issue: "Slow page load time",
        recommendation: "Optimize page load time to under 3 seconds for better user experience",
        check: |s| band_issue(s, 3_000, 5_000),
    },
    Rule {
        id: "very_slow_load",
        kind: RuleKind::Penalty,
        weight: 0,
        per_item: None,
        issue: "Very slow page load time",
        recommendation: "Urgently optimize page load time for better user experience",
        check: |s| band_issue(s, 5_000, u64::MAX),
    },
    Rule {
        id: "small_page",
        kind: RuleKind::Credit,
        weight: 5,
        per_item: None,
        issue: "",
        recommendation: "",
        check: check_small_page,
    },
    Rule {
        id: "large_page",
        kind: RuleKind::Penalty,
        weight: 15,
        per_item: None,
        issue: "Large page size",
        recommendation: "Reduce page size through optimization and compression",
        check: check_large_page,
    },
    Rule {
        id: "moderate_page",
        kind: RuleKind::Penalty,
        weight: 10,
        per_item: None,
        issue: "Moderate page size",
        recommendation: "Consider reducing page size for better performance",
        check: check_moderate_page,
    },
    Rule {
        id: "image_optimization",
        kind: RuleKind::Credit,
        weight: 10,
        per_item: None,
        issue: "Image optimization not detected",
        recommendation: "Optimize images using modern formats (WebP, AVIF) and proper sizing",
        check: check_image_formats,
    },
    Rule {
        id: "minification",
        kind: RuleKind::Credit,
        weight: 10,
        per_item: None,
        issue: "Resources not minified",
        recommendation: "Optimize resources through minification, compression, and bundling",
        check: check_minification,
    },
    Rule {
        id: "compression",
        kind: RuleKind::Credit,
        weight: 15,
        per_item: None,
        issue: "No compression detected",
        recommendation: "Enable GZIP/Brotli compression to reduce file sizes",
        check: check_compression,
    },
    Rule {
        id: "caching",
        kind: RuleKind::Credit,
        weight: 10,
        per_item: None,
        issue: "No caching headers detected",
        recommendation: "Implement proper caching strategies for static resources",
        check: check_caching,
    },
    Rule {
        id: "cdn",
        kind: RuleKind::Credit,
        weight: 10,
        per_item: None,
        issue: "No CDN detected",
        recommendation: "Consider using a CDN for better global performance",
        check: check_cdn,
    },
    Rule {
        id: "http2",
        kind: RuleKind::Credit,
        weight: 5,
        per_item: None,
        issue: "HTTP/2 not detected",
        recommendation: "Upgrade to HTTP/2 for better multiplexing and performance",
        check: check_http2,
    },
    Rule {
        id: "render_blocking",
        kind: RuleKind::Penalty,
        weight: 10,
        per_item: Some(1),
        issue: "Render-blocking resources detected",
        recommendation: "Optimize critical rendering path by deferring non-critical resources",
        check: check_render_blocking,
    },
    Rule {
        id: "dom_size",
        kind: RuleKind::Penalty,
        weight: 10,
        per_item: None,
        issue: "DOM structure not optimized",
        recommendation: "Optimize DOM structure and reduce complexity",
        check: check_dom_size,
    },
    Rule {
        id: "inline_assets",
        kind: RuleKind::Penalty,
        weight: 10,
        per_item: None,
        issue: "Large inline scripts or styles detected",
        recommendation: "Move large inline scripts and styles into cacheable external files",
        check: check_inline_assets,
    },
    Rule {
        id: "third_party_resources",
        kind: RuleKind::Penalty,
        weight: 10,
        per_item: Some(1),
        issue: "Excessive third-party resources detected",
        recommendation: "Reduce third-party resources and load them asynchronously",
        check: check_third_party,
    },
];
