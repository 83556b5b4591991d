// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Runtime configuration: optional JSON file plus `FEDIPOST_*` environment overrides.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use url::Url;

/// Names a JSON file to read before applying environment overrides.
pub const CONFIG_FILE_VAR: &str = "FEDIPOST_CONFIG";
pub const API_URL_VAR: &str = "FEDIPOST_API_URL";
pub const TIMEOUT_VAR: &str = "FEDIPOST_TIMEOUT_SECS";
pub const NOTICE_VAR: &str = "FEDIPOST_NOTICE_SECS";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Origin of the REST backend.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout for backend calls.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// How long notices and validation errors stay on screen.
    #[serde(default = "default_notice_secs")]
    pub notice_secs: u64,
}

fn default_api_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_notice_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            notice_secs: default_notice_secs(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when the config file cannot be read or parsed, or a
    /// value is out of range.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup(CONFIG_FILE_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(url) = lookup(API_URL_VAR) {
            config.api_url = url;
        }
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            config.timeout_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("{TIMEOUT_VAR} must be a whole number of seconds, got {raw:?}"))?;
        }
        if let Some(raw) = lookup(NOTICE_VAR) {
            config.notice_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("{NOTICE_VAR} must be a whole number of seconds, got {raw:?}"))?;
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        self.api_base()?;
        if self.timeout_secs == 0 {
            bail!("{TIMEOUT_VAR} must be greater than zero");
        }
        Ok(())
    }

    /// Backend origin as a parsed URL (http or https only).
    pub fn api_base(&self) -> Result<Url> {
        let url = Url::parse(self.api_url.trim())
            .with_context(|| format!("Invalid API URL {:?}", self.api_url))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            bail!("API URL must be an http(s) URL with a host, got {:?}", self.api_url);
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn notice_window(&self) -> Duration {
        Duration::from_secs(self.notice_secs)
    }
}
