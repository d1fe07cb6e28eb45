use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::search::PageLimits;

pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub connect_timeout: Duration,
    pub page_limits: PageLimits,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Values are trimmed and unquoted;
    /// blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(normalize_env_value)
                .filter(|s| !s.is_empty())
        };

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| Error::Config("DATABASE_URL is required".to_string()))?;

        let defaults = PageLimits::default();
        let default_page = parse_or("PAGE_SIZE_DEFAULT", get("PAGE_SIZE_DEFAULT"), defaults.default);
        let max_page = parse_or("PAGE_SIZE_MAX", get("PAGE_SIZE_MAX"), defaults.max).max(1);

        Ok(Self {
            database_url,
            max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 5u32).max(1),
            connect_timeout: Duration::from_secs(parse_or(
                "DB_CONNECT_TIMEOUT_SECS",
                get("DB_CONNECT_TIMEOUT_SECS"),
                5u64,
            )),
            page_limits: PageLimits {
                default: default_page.clamp(1, max_page),
                max: max_page,
            },
        })
    }
}

pub fn normalize_env_value(raw: String) -> String {
    let trimmed = raw.trim();

    if let Some(inner) = trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return inner.trim().to_string();
    }
    if let Some(inner) = trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        return inner.trim().to_string();
    }

    trimmed.to_string()
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Display + Copy,
    T::Err: Display,
{
    let Some(raw) = raw else {
        debug!("{key} not set, using default: {default}");
        return default;
    };

    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?} ({e}), using default: {default}");
        default
    })
}
