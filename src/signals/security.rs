//! Security posture rule table
//!
//! Additive-credit model: the score starts at 0 and present controls
//! earn it back. HTTPS and CSP carry the most weight, response headers
//! a flat 4 each, softer signals less. Confirmed defects (mixed
//! content, leaked secrets, disclosure headers) subtract.

use std::sync::OnceLock;

use regex::Regex;

use crate::scoring::{Outcome, Rule, RuleKind};
use crate::signals::Signals;

const SENSITIVE_PATTERNS: &[&str] = &[
    "api_key",
    "private_key",
    "database_url",
    "connection_string",
    "aws_access_key",
    "aws_secret_key",
    "jwt_secret",
    "stripe_secret_key",
    "github_token",
    "slack_token",
    "mongodb_uri",
    "redis_url",
];

const API_USAGE_PATTERNS: &[&str] = &[
    "fetch(",
    "axios",
    "xmlhttprequest",
    "/api/",
];

const ERROR_LEAK_PATTERNS: &[&str] = &[
    "stack trace",
    "mysql_error",
    "sql error",
    "traceback (most recent call last)",
    "fatal error:",
];

/// Known end-of-life library generations, fingerprinted from script paths
static OUTDATED_LIBRARIES: OnceLock<Vec<Regex>> = OnceLock::new();

fn outdated_libraries() -> &'static [Regex] {
    OUTDATED_LIBRARIES.get_or_init(|| {
        vec![
            Regex::new(r"jquery[-/][12]\.\d").expect("valid regex"),
            Regex::new(r"angular\.js/1\.[01]").expect("valid regex"),
            Regex::new(r"bootstrap/(2\.\d|3\.0)").expect("valid regex"),
        ]
    })
}

fn bool_outcome(present: bool) -> Outcome {
    if present {
        Outcome::Pass
    } else {
        Outcome::Fail
    }
}

fn header_present(s: &Signals, name: &'static str) -> Outcome {
    bool_outcome(s.has_header(name))
}

fn check_https(s: &Signals) -> Outcome {
    bool_outcome(s.https)
}

fn check_csp(s: &Signals) -> Outcome {
    bool_outcome(s.has_header("content-security-policy") || s.dom.has_csp_meta)
}

fn check_xss_protection(s: &Signals) -> Outcome {
    bool_outcome(s.has_header("x-xss-protection") || s.has_header("content-security-policy"))
}

fn check_csrf(s: &Signals) -> Outcome {
    if s.dom.forms_total == 0 {
        Outcome::Skip
    } else {
        bool_outcome(s.dom.has_csrf_token)
    }
}

fn cookie_flag(s: &Signals, flag: &str) -> Outcome {
    match s.header("set-cookie") {
        None => Outcome::Skip,
        Some(value) => bool_outcome(value.to_ascii_lowercase().contains(flag)),
    }
}

fn check_session_management(s: &Signals) -> Outcome {
    match s.header("set-cookie") {
        None => Outcome::Skip,
        Some(value) => {
            let v = value.to_ascii_lowercase();
            bool_outcome(v.contains("secure") && v.contains("httponly"))
        }
    }
}

fn check_subresource_integrity(s: &Signals) -> Outcome {
    if s.dom.external_scripts == 0 {
        Outcome::Skip
    } else {
        bool_outcome(s.dom.scripts_with_integrity > 0)
    }
}

fn check_input_validation(s: &Signals) -> Outcome {
    if s.dom.inputs_total == 0 {
        Outcome::Skip
    } else {
        bool_outcome(s.dom.inputs_constrained > 0)
    }
}

fn check_error_handling(s: &Signals) -> Outcome {
    bool_outcome(!s.mentions_any(ERROR_LEAK_PATTERNS))
}

fn check_auth_over_https(s: &Signals) -> Outcome {
    if s.dom.password_inputs == 0 {
        Outcome::Skip
    } else {
        bool_outcome(s.https)
    }
}

fn check_form_actions_secure(s: &Signals) -> Outcome {
    if s.dom.forms_total == 0 {
        Outcome::Skip
    } else {
        bool_outcome(s.dom.insecure_form_actions == 0)
    }
}

fn check_third_party_security(s: &Signals) -> Outcome {
    if s.dom.external_scripts == 0 {
        Outcome::Skip
    } else {
        bool_outcome(s.dom.scripts_with_integrity > 0)
    }
}

/// Client-side API calls should at least ride on TLS
fn check_api_security(s: &Signals) -> Outcome {
    if !s.mentions_any(API_USAGE_PATTERNS) {
        Outcome::Skip
    } else {
        bool_outcome(s.https)
    }
}

fn check_file_upload_security(s: &Signals) -> Outcome {
    if s.dom.file_inputs == 0 {
        Outcome::Skip
    } else {
        bool_outcome(s.https && s.dom.has_csrf_token)
    }
}

fn check_security_misconfiguration(s: &Signals) -> Outcome {
    let server_leaks = matches!(
        s.header("server"),
        Some(v) if v.chars().any(|c| c.is_ascii_digit())
    );
    bool_outcome(!server_leaks && !s.has_header("x-powered-by"))
}

fn check_mixed_content(s: &Signals) -> Outcome {
    if !s.https {
        return Outcome::Skip;
    }
    if s.dom.insecure_resource_refs > 0 {
        Outcome::Fail
    } else {
        Outcome::Pass
    }
}

fn check_inline_handlers(s: &Signals) -> Outcome {
    if s.dom.inline_event_handlers > 0 {
        Outcome::Fail
    } else {
        Outcome::Pass
    }
}

fn check_sensitive_exposure(s: &Signals) -> Outcome {
    if s.mentions_any(SENSITIVE_PATTERNS) {
        Outcome::Fail
    } else {
        Outcome::Pass
    }
}

fn check_outdated_libraries(s: &Signals) -> Outcome {
    let hit = outdated_libraries()
        .iter()
        .any(|pattern| pattern.is_match(&s.body_lower));
    if hit {
        Outcome::Fail
    } else {
        Outcome::Pass
    }
}

fn check_server_disclosure(s: &Signals) -> Outcome {
    match s.header("server") {
        Some(v) if v.chars().any(|c| c.is_ascii_digit()) => Outcome::Fail,
        _ => Outcome::Pass,
    }
}

fn check_powered_by_disclosure(s: &Signals) -> Outcome {
    if s.has_header("x-powered-by") {
        Outcome::Fail
    } else {
        Outcome::Pass
    }
}

pub static RULES: &[Rule] = &[
    Rule {
        id: "https",
        kind: RuleKind::Credit,
        weight: 25,
        per_item: None,
        issue: "Website not using HTTPS",
        recommendation: "Implement SSL/TLS encryption for secure data transmission",
        check: check_https,
    },
    Rule {
        id: "x_frame_options",
        kind: RuleKind::Credit,
        weight: 4,
        per_item: None,
        issue: "No X-Frame-Options header",
        recommendation: "Implement security headers: X-Frame-Options, X-Content-Type-Options, etc.",
        check: |s| header_present(s, "x-frame-options"),
    },
    Rule {
        id: "x_content_type_options",
        kind: RuleKind::Credit,
        weight: 4,
        per_item: None,
        issue: "No X-Content-Type-Options header",
        recommendation: "Add the X-Content-Type-Options: nosniff header",
        check: |s| header_present(s, "x-content-type-options"),
    },
    Rule {
        id: "referrer_policy",
        kind: RuleKind::Credit,
        weight: 4,
        per_item: None,
        issue: "No Referrer Policy header",
        recommendation: "Add a Referrer-Policy header to limit referrer leakage",
        check: |s| header_present(s, "referrer-policy"),
    },
    Rule {
        id: "permissions_policy",
        kind: RuleKind::Credit,
        weight: 4,
        per_item: None,
        issue: "No Permissions Policy header",
        recommendation: "Add a Permissions-Policy header to restrict powerful features",
        check: |s| header_present(s, "permissions-policy"),
    },
    Rule {
        id: "cross_origin_opener_policy",
        kind: RuleKind::Credit,
        weight: 4,
        per_item: None,
        issue: "No Cross-Origin-Opener-Policy header",
        recommendation: "Add a Cross-Origin-Opener-Policy header to isolate the browsing context",
        check: |s| header_present(s, "cross-origin-opener-policy"),
    },
    Rule {
        id: "csp",
        kind: RuleKind::Credit,
        weight: 15,
        per_item: None,
        issue: "No Content Security Policy found",
        recommendation: "Implement Content Security Policy to prevent XSS attacks",
        check: check_csp,
    },
    Rule {
        id: "hsts",
        kind: RuleKind::Credit,
        weight: 10,
        per_item: None,
        issue: "No HTTP Strict Transport Security",
        recommendation: "Enable HSTS header to enforce HTTPS connections",
        check: |s| header_present(s, "strict-transport-security"),
    },
    Rule {
        id: "xss_protection",
        kind: RuleKind::Credit,
        weight: 10,
        per_item: None,
        issue: "No XSS protection detected",
        recommendation: "Implement XSS protection mechanisms",
        check: check_xss_protection,
    },
    Rule {
        id: "csrf_protection",
        kind: RuleKind::Credit,
        weight: 8,
        per_item: None,
        issue: "No CSRF protection detected",
        recommendation: "Implement CSRF tokens or other CSRF protection mechanisms",
        check: check_csrf,
    },
    Rule {
        id: "secure_cookies",
        kind: RuleKind::Credit,
        weight: 6,
        per_item: None,
        issue: "Cookies missing the Secure flag",
        recommendation: "Set the Secure flag on all cookies",
        check: |s| cookie_flag(s, "secure"),
    },
    Rule {
        id: "httponly_cookies",
        kind: RuleKind::Credit,
        weight: 6,
        per_item: None,
        issue: "Cookies missing the HttpOnly flag",
        recommendation: "Set the HttpOnly flag on session cookies",
        check: |s| cookie_flag(s, "httponly"),
    },
    Rule {
        id: "samesite_cookies",
        kind: RuleKind::Credit,
        weight: 6,
        per_item: None,
        issue: "Cookies missing the SameSite attribute",
        recommendation: "Set SameSite=Lax or Strict on cookies to limit cross-site requests",
        check: |s| cookie_flag(s, "samesite"),
    },
    Rule {
        id: "subresource_integrity",
        kind: RuleKind::Credit,
        weight: 6,
        per_item: None,
        issue: "External scripts loaded without integrity attributes",
        recommendation: "Add Subresource Integrity hashes to third-party scripts",
        check: check_subresource_integrity,
    },
    Rule {
        id: "input_validation",
        kind: RuleKind::Credit,
        weight: 4,
        per_item: None,
        issue: "No input validation detected",
        recommendation: "Implement proper input validation for all user inputs",
        check: check_input_validation,
    },
    Rule {
        id: "session_management",
        kind: RuleKind::Credit,
        weight: 4,
        per_item: None,
        issue: "No secure session management detected",
        recommendation: "Implement secure session management and secure cookie handling",
        check: check_session_management,
    },
    Rule {
        id: "error_handling",
        kind: RuleKind::Credit,
        weight: 4,
        per_item: None,
        issue: "Error messages potentially exposed",
        recommendation: "Disable detailed error messages in production",
        check: check_error_handling,
    },
    Rule {
        id: "auth_over_https",
        kind: RuleKind::Credit,
        weight: 4,
        per_item: None,
        issue: "Login form served without HTTPS",
        recommendation: "Serve authentication forms exclusively over HTTPS",
        check: check_auth_over_https,
    },
    Rule {
        id: "secure_form_actions",
        kind: RuleKind::Credit,
        weight: 3,
        per_item: None,
        issue: "Forms submitting to insecure endpoints",
        recommendation: "Point all form actions at HTTPS endpoints",
        check: check_form_actions_secure,
    },
    Rule {
        id: "third_party_security",
        kind: RuleKind::Credit,
        weight: 3,
        per_item: None,
        issue: "No third-party security measures detected",
        recommendation: "Review and secure third-party integrations",
        check: check_third_party_security,
    },
    Rule {
        id: "api_security",
        kind: RuleKind::Credit,
        weight: 3,
        per_item: None,
        issue: "No API security measures detected",
        recommendation: "Implement API security best practices",
        check: check_api_security,
    },
    Rule {
        id: "file_upload_security",
        kind: RuleKind::Credit,
        weight: 3,
        per_item: None,
        issue: "No file upload security measures detected",
        recommendation: "Implement secure file upload mechanisms",
        check: check_file_upload_security,
    },
    Rule {
        id: "security_misconfiguration",
        kind: RuleKind::Credit,
        weight: 3,
        per_item: None,
        issue: "Security misconfigurations detected",
        recommendation: "Fix security misconfigurations",
        check: check_security_misconfiguration,
    },
    Rule {
        id: "mixed_content",
        kind: RuleKind::Penalty,
        weight: 10,
        per_item: None,
        issue: "Mixed content detected on an HTTPS page",
        recommendation: "Load all subresources over HTTPS",
        check: check_mixed_content,
    },
    Rule {
        id: "inline_event_handlers",
        kind: RuleKind::Penalty,
        weight: 10,
        per_item: None,
        issue: "Inline event handlers present",
        recommendation: "Move inline event handlers into scripts so a strict CSP can be applied",
        check: check_inline_handlers,
    },
    Rule {
        id: "sensitive_exposure",
        kind: RuleKind::Penalty,
        weight: 10,
        per_item: None,
        issue: "Sensitive information may be exposed",
        recommendation: "Remove or properly secure sensitive information from HTML source",
        check: check_sensitive_exposure,
    },
    Rule {
        id: "vulnerable_components",
        kind: RuleKind::Penalty,
        weight: 10,
        per_item: None,
        issue: "Vulnerable components detected",
        recommendation: "Update vulnerable components and dependencies",
        check: check_outdated_libraries,
    },
    Rule {
        id: "server_disclosure",
        kind: RuleKind::Penalty,
        weight: 5,
        per_item: None,
        issue: "Server version disclosed in response headers",
        recommendation: "Strip version details from the Server header",
        check: check_server_disclosure,
    },
    Rule {
        id: "powered_by_disclosure",
        kind: RuleKind::Penalty,
        weight: 5,
        per_item: None,
        issue: "Information disclosure detected",
        recommendation: "Remove the X-Powered-By header",
        check: check_powered_by_disclosure,
    },
];
