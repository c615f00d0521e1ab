//! Sitegrade - website compliance analysis
//!
//! Fetches a page once, extracts every signal the scorers need, and
//! grades it across five compliance categories. Also ships a job
//! runner with per-target duplicate suppression, a recurring-scan
//! scheduler, and an endpoint health poller.

pub mod cli;
pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod jobs;
pub mod models;
pub mod monitor;
pub mod schedule;
pub mod scoring;
pub mod signals;
