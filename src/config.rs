//! Configuration support
//!
//! Loads optional settings from `sitegrade.toml`. Rule weights are
//! data: any rule id from the category tables can be overridden here
//! without touching code.
//!
//! # Configuration Format
//!
//! ```toml
//! # sitegrade.toml
//!
//! [rule_weights]
//! cookie_banner = 25
//! csp = 20
//!
//! [fetch]
//! timeout_secs = 30
//!
//! [monitor]
//! default_interval = "5m"
//! timeout_secs = 10
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::SiteGradeError;
use crate::models::PollInterval;

pub const DEFAULT_CONFIG_FILE: &str = "sitegrade.toml";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Rule id -> replacement weight
    #[serde(default)]
    pub rule_weights: HashMap<String, u32>,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    #[serde(default)]
    pub default_interval: PollInterval,
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
}

impl MonitorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            default_interval: PollInterval::default(),
            timeout_secs: default_probe_timeout(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    crate::fetch::ANALYSIS_USER_AGENT.to_string()
}

fn parse_toml(path: &Path) -> Result<Config, SiteGradeError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SiteGradeError::Config(format!("{}: {e}", path.display())))?;
    toml::from_str(&content)
        .map_err(|e| SiteGradeError::Config(format!("{}: {e}", path.display())))
}

/// Load configuration.
///
/// An explicitly requested file must parse; the implicit
/// `sitegrade.toml` in the working directory is best-effort and falls
/// back to defaults on any problem.
pub fn load(explicit: Option<&Path>) -> Result<Config, SiteGradeError> {
    if let Some(path) = explicit {
        let config = parse_toml(path)?;
        debug!("loaded config from {}", path.display());
        return Ok(config);
    }

    let implicit = Path::new(DEFAULT_CONFIG_FILE);
    if implicit.exists() {
        match parse_toml(implicit) {
            Ok(config) => {
                debug!("loaded config from {}", implicit.display());
                return Ok(config);
            }
            Err(e) => {
                warn!("ignoring {}: {}", implicit.display(), e);
            }
        }
    }
    Ok(Config::default())
}
