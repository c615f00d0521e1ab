//! GDPR / privacy rule table
//!
//! Deduct-from-100 model. Most checks are keyword scans over the
//! lowercased body; the cookie banner and consent checks lean on the
//! document facts. Weights mirror severity: missing banner or policy
//! costs 15, missing disclosures 10, softer governance signals 5.

use crate::scoring::{Outcome, Rule, RuleKind};
use crate::signals::Signals;

const PRIVACY_POLICY_TEXTS: &[&str] = &[
    "privacy policy",
    "privacy notice",
    "privacy statement",
    "data protection policy",
    "information privacy",
];

const TERMS_TEXTS: &[&str] = &[
    "terms of service",
    "terms and conditions",
    "terms & conditions",
    "user agreement",
    "service agreement",
];

const DATA_PROCESSING_TEXTS: &[&str] = &[
    "data processing",
    "personal data",
    "data protection",
    "data collection",
    "data usage",
    "data handling",
    "data storage",
    "data sharing",
];

const COOKIE_POLICY_TEXTS: &[&str] = &[
    "cookie policy",
    "cookie notice",
    "cookie statement",
    "cookie settings",
    "cookie usage",
];

const RETENTION_TEXTS: &[&str] = &[
    "data retention",
    "retention policy",
    "retention period",
    "how long we keep",
    "how long we store",
];

const CONSENT_TEXTS: &[&str] = &[
    "consent",
    "opt-in",
    "opt-out",
    "i agree",
    "i accept",
    "accept terms",
];

const PORTABILITY_TEXTS: &[&str] = &[
    "data portability",
    "export data",
    "download data",
    "export my data",
    "download my data",
    "right to data portability",
];

const ERASURE_TEXTS: &[&str] = &[
    "right to erasure",
    "right to be forgotten",
    "delete my data",
    "data deletion",
    "erase data",
    "account deletion",
    "data removal",
];

const LAWFUL_BASIS_TEXTS: &[&str] = &[
    "lawful basis",
    "legal basis",
    "legitimate interest",
    "basis for data processing",
];

const PURPOSE_TEXTS: &[&str] = &[
    "purpose of data collection",
    "data processing purpose",
    "data usage purpose",
    "purposes for which",
];

const SUBJECT_RIGHTS_TEXTS: &[&str] = &[
    "data subject rights",
    "your rights",
    "right of access",
    "right to rectification",
    "right to object",
];

const DPO_TEXTS: &[&str] = &[
    "data protection officer",
    "dpo@",
    "privacy officer",
];

const BREACH_TEXTS: &[&str] = &[
    "data breach",
    "breach notification",
    "security incident",
];

const PRIVACY_BY_DESIGN_TEXTS: &[&str] = &["privacy by design", "privacy by default"];

pub(crate) const TRACKING_DOMAINS: &[&str] = &[
    "google-analytics.com",
    "googletagmanager.com",
    "facebook.net",
    "doubleclick.net",
    "hotjar.com",
    "mixpanel.com",
    "amplitude.com",
    "segment.com",
];

fn bool_outcome(present: bool) -> Outcome {
    if present {
        Outcome::Pass
    } else {
        Outcome::Fail
    }
}

fn mentions(s: &Signals, needles: &[&str]) -> Outcome {
    bool_outcome(s.mentions_any(needles))
}

fn check_cookie_banner(s: &Signals) -> Outcome {
    bool_outcome(s.dom.cookie_banner)
}

fn check_privacy_policy(s: &Signals) -> Outcome {
    bool_outcome(s.dom.privacy_policy_link || s.mentions_any(PRIVACY_POLICY_TEXTS))
}

fn check_terms(s: &Signals) -> Outcome {
    bool_outcome(s.dom.terms_link || s.mentions_any(TERMS_TEXTS))
}

fn check_cookie_policy(s: &Signals) -> Outcome {
    bool_outcome(s.dom.cookie_policy_link || s.mentions_any(COOKIE_POLICY_TEXTS))
}

fn check_consent_mechanism(s: &Signals) -> Outcome {
    bool_outcome(s.dom.consent_controls || s.mentions_any(CONSENT_TEXTS))
}

/// Tracking scripts present without a consent banner is a confirmed
/// defect; without tracking the rule does not apply.
fn check_tracking_consent(s: &Signals) -> Outcome {
    let tracking = s.mentions_any(TRACKING_DOMAINS);
    if !tracking {
        Outcome::Skip
    } else if s.dom.cookie_banner {
        Outcome::Pass
    } else {
        Outcome::Fail
    }
}

pub static RULES: &[Rule] = &[
    Rule {
        id: "cookie_banner",
        kind: RuleKind::Deduct,
        weight: 15,
        per_item: None,
        issue: "No cookie consent banner found",
        recommendation: "Implement a cookie consent banner that clearly explains data collection and provides accept/reject options",
        check: check_cookie_banner,
    },
    Rule {
        id: "privacy_policy",
        kind: RuleKind::Deduct,
        weight: 15,
        per_item: None,
        issue: "No privacy policy found",
        recommendation: "Create and prominently link to a comprehensive privacy policy",
        check: check_privacy_policy,
    },
    Rule {
        id: "terms_of_service",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "No terms of service found",
        recommendation: "Create and link to terms of service",
        check: check_terms,
    },
    Rule {
        id: "data_processing_notice",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "No data processing notice found",
        recommendation: "Add clear data processing notices explaining how personal data is handled",
        check: |s| mentions(s, DATA_PROCESSING_TEXTS),
    },
    Rule {
        id: "cookie_policy",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "No cookie policy found",
        recommendation: "Create a detailed cookie policy explaining all cookie types and purposes",
        check: check_cookie_policy,
    },
    Rule {
        id: "data_retention",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "No data retention policy found",
        recommendation: "Define and publish data retention policies with specific timeframes",
        check: |s| mentions(s, RETENTION_TEXTS),
    },
    Rule {
        id: "consent_mechanism",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "No user consent mechanism found",
        recommendation: "Implement granular consent mechanisms for different data processing activities",
        check: check_consent_mechanism,
    },
    Rule {
        id: "data_portability",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "No data portability option found",
        recommendation: "Provide data export functionality for users to download their personal data",
        check: |s| mentions(s, PORTABILITY_TEXTS),
    },
    Rule {
        id: "right_to_erasure",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "No right to erasure mechanism found",
        recommendation: "Implement data deletion functionality for users to request data removal",
        check: |s| mentions(s, ERASURE_TEXTS),
    },
    Rule {
        id: "lawful_basis",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "No lawful basis for data processing found",
        recommendation: "Ensure data processing is based on a valid legal basis (consent, contract, legitimate interest, etc.)",
        check: |s| mentions(s, LAWFUL_BASIS_TEXTS),
    },
    Rule {
        id: "purpose_limitation",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "Purpose limitation not properly implemented",
        recommendation: "Clearly state the purpose of data collection and ensure it is lawful",
        check: |s| mentions(s, PURPOSE_TEXTS),
    },
    Rule {
        id: "data_subject_rights",
        kind: RuleKind::Deduct,
        weight: 10,
        per_item: None,
        issue: "Data subject rights not clearly communicated",
        recommendation: "Clearly communicate all data subject rights including access, rectification, erasure, and objection",
        check: |s| mentions(s, SUBJECT_RIGHTS_TEXTS),
    },
    Rule {
        id: "tracking_consent",
        kind: RuleKind::Deduct,
        weight: 15,
        per_item: None,
        issue: "Third-party tracking detected without proper consent mechanism",
        recommendation: "Implement consent mechanism for third-party tracking and analytics",
        check: check_tracking_consent,
    },
    Rule {
        id: "dpo_contact",
        kind: RuleKind::Deduct,
        weight: 5,
        per_item: None,
        issue: "No Data Protection Officer contact information found",
        recommendation: "Appoint and publish contact information for Data Protection Officer if required",
        check: |s| mentions(s, DPO_TEXTS),
    },
    Rule {
        id: "breach_notification",
        kind: RuleKind::Deduct,
        weight: 5,
        per_item: None,
        issue: "No data breach notification procedure found",
        recommendation: "Implement and publish data breach notification procedures",
        check: |s| mentions(s, BREACH_TEXTS),
    },
    Rule {
        id: "privacy_by_design",
        kind: RuleKind::Deduct,
        weight: 5,
        per_item: None,
        issue: "Privacy by design principles not implemented",
        recommendation: "Implement privacy by design principles in all data processing activities",
        check: |s| mentions(s, PRIVACY_BY_DESIGN_TEXTS),
    },
];
