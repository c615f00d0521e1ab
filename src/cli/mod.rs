//! CLI command definitions and handlers

pub(crate) mod analyze;
pub(crate) mod monitor;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::{Category, PollInterval};

/// Sitegrade - website compliance analysis
///
/// Scores a page for GDPR, accessibility, security, performance, and
/// SEO compliance in a single pass, and can keep watching an endpoint
/// for uptime.
#[derive(Parser, Debug)]
#[command(name = "sitegrade")]
#[command(
    version,
    about = "Website compliance analyzer - score GDPR, accessibility, security, performance, and SEO in one pass",
    after_help = "\
Examples:
  sitegrade analyze example.com                  Full scan, text report
  sitegrade analyze example.com --json           JSON output for scripting
  sitegrade analyze example.com --categories security,seo
  sitegrade monitor example.com --interval 1m    Foreground uptime watch
  sitegrade monitor example.com --count 5        Five checks, then summary"
)]
pub struct Cli {
    /// Verbose logging (same as RUST_LOG=debug)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a one-shot compliance analysis against a URL
    #[command(after_help = "\
Examples:
  sitegrade analyze example.com                       All five categories
  sitegrade analyze https://example.com --json        JSON for scripting
  sitegrade analyze example.com --categories gdpr     Privacy only
  sitegrade analyze example.com --config weights.toml Custom rule weights")]
    Analyze {
        /// Target URL (https assumed when the scheme is omitted)
        url: String,

        /// Categories to score: gdpr, accessibility, security, performance, seo (default: all)
        #[arg(long, short = 'c', value_delimiter = ',')]
        categories: Vec<Category>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Config file path (default: ./sitegrade.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Watch an endpoint in the foreground, printing every check
    Monitor {
        /// Target URL (https assumed when the scheme is omitted)
        url: String,

        /// Polling interval: 1m, 5m, 30m
        #[arg(long, short = 'i', default_value = "5m")]
        interval: PollInterval,

        /// Stop after this many checks (0 = run until interrupted)
        #[arg(long, short = 'n', default_value = "0")]
        count: u64,
    },
}

/// Dispatch a parsed command
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze {
            url,
            categories,
            json,
            config,
        } => analyze::run(&url, &categories, json, config.as_deref()).await,
        Commands::Monitor {
            url,
            interval,
            count,
        } => monitor::run(&url, interval, count).await,
    }
}
