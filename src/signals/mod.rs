//! Signal extraction
//!
//! [`Signals`] is everything the rule tables consult: retrieval facts,
//! the lowercased body for substring checks, the header map, and the
//! distilled document facts. It is built once per analysis and shared
//! read-only by every category.
//!
//! Each category module owns its rule table; [`fingerprint`] holds the
//! pattern tables for hosting/framework/CMS/technology detection.

pub mod accessibility;
pub mod fingerprint;
pub mod performance;
pub mod privacy;
pub mod security;
pub mod seo;

use std::collections::HashMap;

use url::Url;

use crate::dom::DomFacts;
use crate::fetch::FetchedPage;

/// Read-only input to every rule check
#[derive(Debug, Clone)]
pub struct Signals {
    pub url: Url,
    pub https: bool,
    pub status: u16,
    /// Header names lowercased
    pub headers: HashMap<String, String>,
    pub body_lower: String,
    pub load_time_ms: u64,
    pub page_size_bytes: u64,
    pub http2: bool,
    pub dom: DomFacts,
}

impl Signals {
    pub fn from_page(page: &FetchedPage) -> Signals {
        Signals {
            url: page.final_url.clone(),
            https: page.https(),
            status: page.status,
            headers: page.headers.clone(),
            body_lower: page.body.to_lowercase(),
            load_time_ms: page.load_time_ms,
            page_size_bytes: page.page_size_bytes,
            http2: page.http2,
            dom: DomFacts::extract(&page.body, &page.final_url),
        }
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// True when any needle occurs in the lowercased body
    pub fn mentions_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.body_lower.contains(n))
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Signals {
        Signals {
            url: Url::parse("https://example.com/").expect("static url"),
            https: true,
            status: 200,
            headers: HashMap::new(),
            body_lower: String::new(),
            load_time_ms: 0,
            page_size_bytes: 0,
            http2: true,
            dom: DomFacts::default(),
        }
    }
}
