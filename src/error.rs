//! Error taxonomy for sitegrade
//!
//! Retrieval failures are fatal to a job; parse failures and individual
//! rule evaluation failures are handled in place and never surface here.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SiteGradeError {
    /// Network, DNS, timeout, or redirect failure. Routes the job to `failed`.
    #[error("failed to retrieve {url}: {source}")]
    Retrieval {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid url '{input}': {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    /// A job for this target is already pending or running
    #[error("an analysis for {target} is already in flight")]
    DuplicateJob { target: String },

    #[error("no job with id {0}")]
    JobNotFound(Uuid),

    #[error("no monitored endpoint with id {0}")]
    EndpointNotFound(String),

    /// Saved state that cannot be restored, e.g. a corrupt endpoint record
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("config error: {0}")]
    Config(String),
}
