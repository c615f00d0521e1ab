//! Content retrieval
//!
//! One bounded-time GET per analysis. Any HTTP status is valid input;
//! only transport-level failures (DNS, timeout, redirect loop) are
//! fatal. Timing and byte length are captured alongside body and
//! headers because the performance rules score them directly.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::redirect::Policy;
use tracing::debug;
use url::Url;

use crate::error::SiteGradeError;

pub const ANALYSIS_USER_AGENT: &str = "Mozilla/5.0 (compatible; ComplianceScanner/1.0)";
pub const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_REDIRECTS: usize = 5;

/// A fully retrieved page, ready for signal extraction
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: Url,
    pub status: u16,
    /// Header names lowercased; multi-valued headers joined with ", "
    pub headers: HashMap<String, String>,
    pub body: String,
    pub load_time_ms: u64,
    pub page_size_bytes: u64,
    pub http2: bool,
}

impl FetchedPage {
    pub fn https(&self) -> bool {
        self.final_url.scheme() == "https"
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }
}

/// Seam between the engine and the network
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, SiteGradeError>;
}

/// Production fetcher backed by reqwest
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, SiteGradeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()
            .map_err(|e| SiteGradeError::Config(format!("http client: {e}")))?;
        Ok(Self { client })
    }

    pub fn for_analysis() -> Result<Self, SiteGradeError> {
        Self::new(ANALYSIS_TIMEOUT, ANALYSIS_USER_AGENT)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, SiteGradeError> {
        let started = Instant::now();

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SiteGradeError::Retrieval {
                url: url.to_string(),
                source: e,
            })?;

        let final_url = response.url().clone();
        let status = response.status().as_u16();
        let http2 = response.version() == reqwest::Version::HTTP_2;

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            let key = name.as_str().to_string();
            let value = value.to_str().unwrap_or("").to_string();
            headers
                .entry(key)
                .and_modify(|existing: &mut String| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        let body = response
            .text()
            .await
            .map_err(|e| SiteGradeError::Retrieval {
                url: url.to_string(),
                source: e,
            })?;

        let load_time_ms = started.elapsed().as_millis() as u64;
        let page_size_bytes = body.len() as u64;
        debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            url, status, load_time_ms, page_size_bytes
        );

        Ok(FetchedPage {
            final_url,
            status,
            headers,
            body,
            load_time_ms,
            page_size_bytes,
            http2,
        })
    }
}

/// Parse and normalize a target URL for analysis and duplicate suppression.
///
/// Schemeless input gets https; trailing slash on a bare path is dropped
/// from the comparison key, so `https://a.com` and `https://a.com/`
/// suppress each other.
pub fn normalize_target(input: &str) -> Result<Url, SiteGradeError> {
    let candidate = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{input}")
    };
    Url::parse(&candidate).map_err(|e| SiteGradeError::InvalidUrl {
        input: input.to_string(),
        source: e,
    })
}

/// Stable comparison key for the per-target in-flight guard
pub fn target_key(url: &Url) -> String {
    let mut key = format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or_default(),
        url.path().trim_end_matches('/')
    );
    if let Some(q) = url.query() {
        key.push('?');
        key.push_str(q);
    }
    key
}
