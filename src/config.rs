//! Configuration loaded from environment variables with defaults.

use anyhow::{Context, Result};
use reqwest::Url;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::fetch::auth::{ApiKey, UrlParam};
use crate::fetch::{BasicClient, HttpClient};
use crate::source::SeptaClient;
use crate::staleness::MAX_AGE_SECS;

pub const DEFAULT_FEED_URL: &str = "https://www3.septa.org/api/TrainView/index.php";

/// How the API key, if any, is attached to requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedAuth {
    None,
    Header { header_name: String, key: String },
    UrlParam { param_name: String, key: String },
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// TrainView endpoint (default: SEPTA's public API)
    pub feed_url: String,
    /// Idle time between cycles (default: 300s)
    pub poll_interval: Duration,
    /// Snapshots older than this are shown as unknown (default: 600s)
    pub max_age_secs: i64,
    /// Whole-request timeout for one fetch (default: 30s)
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// How often the `watch` reporter logs the current status (default: 60s)
    pub report_interval: Duration,
    pub auth: FeedAuth,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            poll_interval: Duration::from_secs(300),
            max_age_secs: MAX_AGE_SECS,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            report_interval: Duration::from_secs(60),
            auth: FeedAuth::None,
        }
    }
}

impl PollerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SEPTA_FEED_URL`
    /// - `SEPTA_POLL_INTERVAL_SECS`
    /// - `SEPTA_MAX_AGE_SECS`
    /// - `SEPTA_REQUEST_TIMEOUT_SECS`
    /// - `SEPTA_CONNECT_TIMEOUT_SECS`
    /// - `SEPTA_REPORT_INTERVAL_SECS`
    /// - `SEPTA_API_KEY` with either `SEPTA_API_KEY_HEADER` or `SEPTA_API_KEY_PARAM`
    pub fn load() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`load`](Self::load), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(url) = lookup("SEPTA_FEED_URL") {
            cfg.feed_url = url;
        }
        if let Some(secs) = parse_positive(&lookup, "SEPTA_POLL_INTERVAL_SECS") {
            cfg.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_positive(&lookup, "SEPTA_MAX_AGE_SECS") {
            cfg.max_age_secs = secs;
        }
        if let Some(secs) = parse_positive(&lookup, "SEPTA_REQUEST_TIMEOUT_SECS") {
            cfg.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_positive(&lookup, "SEPTA_CONNECT_TIMEOUT_SECS") {
            cfg.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_positive(&lookup, "SEPTA_REPORT_INTERVAL_SECS") {
            cfg.report_interval = Duration::from_secs(secs);
        }

        if let Some(key) = lookup("SEPTA_API_KEY") {
            cfg.auth = match (lookup("SEPTA_API_KEY_HEADER"), lookup("SEPTA_API_KEY_PARAM")) {
                (Some(header_name), _) => FeedAuth::Header { header_name, key },
                (None, Some(param_name)) => FeedAuth::UrlParam { param_name, key },
                (None, None) => {
                    warn!(
                        "SEPTA_API_KEY is set without SEPTA_API_KEY_HEADER or SEPTA_API_KEY_PARAM; \
                         ignoring it"
                    );
                    FeedAuth::None
                }
            };
        }

        cfg
    }

    pub fn feed_url(&self) -> Result<Url> {
        Url::parse(&self.feed_url).with_context(|| format!("invalid feed URL '{}'", self.feed_url))
    }

    /// HTTP client with the configured timeouts and credentials.
    pub fn http_client(&self) -> Result<Box<dyn HttpClient>> {
        let base = BasicClient::with_timeouts(self.request_timeout, self.connect_timeout)
            .context("failed to build HTTP client")?;

        let client: Box<dyn HttpClient> = match &self.auth {
            FeedAuth::None => Box::new(base),
            FeedAuth::Header { header_name, key } => Box::new(ApiKey::new(base, header_name, key)?),
            FeedAuth::UrlParam { param_name, key } => Box::new(UrlParam {
                inner: base,
                param_name: param_name.clone(),
                key: key.clone(),
            }),
        };
        Ok(client)
    }

    pub fn septa_client(&self) -> Result<SeptaClient<Box<dyn HttpClient>>> {
        Ok(SeptaClient::new(self.http_client()?, self.feed_url()?))
    }
}

/// Parses a numeric setting that must be greater than zero.
///
/// Zero, negative and unparseable values are ignored with a warning.
fn parse_positive<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Some(value),
        Ok(_) => {
            warn!(variable = name, value = %raw, "Ignoring non-positive setting, using default");
            None
        }
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring unparseable setting, using default");
            None
        }
    }
}
