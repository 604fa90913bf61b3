use crate::SaveError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://web.archive.org";
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(300_000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How to make each submitted URL distinct.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheBuster {
    #[default]
    None,
    Fragment,
    Query,
}

impl FromStr for CacheBuster {
    type Err = SaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(CacheBuster::None),
            "frag" | "fragment" => Ok(CacheBuster::Fragment),
            "query" => Ok(CacheBuster::Query),
            other => Err(SaveError::Config(format!(
                "unknown cache-buster mode '{other}' (expected none, frag or query)"
            ))),
        }
    }
}

impl fmt::Display for CacheBuster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CacheBuster::None => "none",
            CacheBuster::Fragment => "frag",
            CacheBuster::Query => "query",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub keep_protocol: bool,
    pub debug: bool,
    pub poll_timeout: Duration,
    pub cache_buster: CacheBuster,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            keep_protocol: false,
            debug: false,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            cache_buster: CacheBuster::None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, SaveError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, SaveError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let base_url = get("WAYBACK_SAVE_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        let keep_protocol = match get("WAYBACK_SAVE_KEEP_PROTOCOL") {
            Some(v) => parse_bool("WAYBACK_SAVE_KEEP_PROTOCOL", &v)?,
            None => defaults.keep_protocol,
        };
        let debug = match get("WAYBACK_SAVE_DEBUG") {
            Some(v) => parse_bool("WAYBACK_SAVE_DEBUG", &v)?,
            None => defaults.debug,
        };
        let poll_timeout = match get("WAYBACK_SAVE_POLL_TIMEOUT_MS") {
            Some(v) => Duration::from_millis(parse_u64("WAYBACK_SAVE_POLL_TIMEOUT_MS", &v)?),
            None => defaults.poll_timeout,
        };
        let cache_buster = match get("WAYBACK_SAVE_CACHE_BUSTER") {
            Some(v) => v.parse()?,
            None => defaults.cache_buster,
        };
        let request_timeout = match get("WAYBACK_SAVE_REQUEST_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_u64("WAYBACK_SAVE_REQUEST_TIMEOUT_SECS", &v)?),
            None => defaults.request_timeout,
        };
        Ok(Self {
            base_url,
            keep_protocol,
            debug,
            poll_timeout,
            cache_buster,
            request_timeout,
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SaveError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(SaveError::Config(format!(
            "{key} must be a boolean, got '{value}'"
        ))),
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, SaveError> {
    value
        .trim()
        .parse()
        .map_err(|_| SaveError::Config(format!("{key} must be a whole number, got '{value}'")))
}
