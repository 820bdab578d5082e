//! # Configuration Module
//!
//! Loads engine settings from environment variables (and a `.env` file when
//! present), with defaults that match a locally running dashboard backend.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::executor::DEFAULT_MAX_EXTRACT_URLS;

// =============================================================================
// CONFIGURATION STRUCT
// =============================================================================
/// Main configuration for the flow engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend exposing the search/extract/crawl/map/flow routes
    pub api_base_url: String,

    /// Maximum URLs sent in a single extract call
    pub max_extract_urls: usize,

    /// Per-call timeout. `None` waits for as long as the service takes.
    pub request_timeout: Option<Duration>,

    /// Log level for the application
    pub log_level: String,
}

// =============================================================================
// DEFAULT IMPLEMENTATION
// =============================================================================
impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            max_extract_urls: DEFAULT_MAX_EXTRACT_URLS,
            request_timeout: None,
            log_level: "info".to_string(),
        }
    }
}

// =============================================================================
// CONFIGURATION LOADING
// =============================================================================
impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Example
    /// ```ignore
    /// let config = Config::from_env()?;
    /// println!("Backend: {}", config.api_base_url);
    /// ```
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (silently ignore if not found)
        let _ = dotenvy::dotenv();

        let mut config = Config::default();

        if let Ok(val) = env::var("WEBFLOW_API_BASE_URL") {
            config.api_base_url = val;
        }

        if let Ok(val) = env::var("WEBFLOW_MAX_EXTRACT_URLS") {
            config.max_extract_urls = val
                .parse()
                .context("WEBFLOW_MAX_EXTRACT_URLS must be a valid positive integer")?;
        }

        if let Ok(val) = env::var("WEBFLOW_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = val
                .parse()
                .context("WEBFLOW_REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        if let Ok(val) = env::var("RUST_LOG") {
            config.log_level = val;
        }

        Ok(config)
    }

    /// Validate the configuration before anything talks to the network.
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            anyhow::bail!("WEBFLOW_API_BASE_URL cannot be empty");
        }

        reqwest::Url::parse(&self.api_base_url)
            .with_context(|| format!("WEBFLOW_API_BASE_URL is not a valid URL: {}", self.api_base_url))?;

        if self.max_extract_urls == 0 {
            anyhow::bail!("WEBFLOW_MAX_EXTRACT_URLS must be at least 1");
        }

        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            anyhow::bail!("WEBFLOW_REQUEST_TIMEOUT_SECS must be greater than 0");
        }

        Ok(())
    }
}
