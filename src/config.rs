//! Runtime configuration, read from `REVIEWDASH_*` environment variables.

use std::env;
use std::ops::RangeInclusive;

use anyhow::{Context, bail};

/// Default port if not specified via environment variable.
pub const DEFAULT_PORT: u16 = 3000;

pub const DEFAULT_APP_ID: &str = "com.supergears.racingkingdom";
pub const DEFAULT_APP_TITLE: &str = "Racing Kingdom";
pub const DEFAULT_EXPORT_PREFIX: &str = "racing_kingdom";

/// One hour, matching how often new reviews realistically show up.
pub const DEFAULT_CACHE_TTL_SECS: i64 = 3600;
pub const DEFAULT_SESSION_IDLE_SECS: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,

    /// Play Store package name of the app under analysis.
    pub app_id: String,

    /// Display name used in the page title.
    pub app_title: String,

    /// Prefix of exported CSV file names.
    pub export_prefix: String,

    pub cache_ttl_secs: i64,
    pub session_idle_secs: i64,

    /// Per-country review cap; `None` fetches everything.
    pub max_reviews_per_country: Option<usize>,

    /// Random pause between review pages, in milliseconds.
    pub page_delay_ms: RangeInclusive<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            app_id: DEFAULT_APP_ID.to_string(),
            app_title: DEFAULT_APP_TITLE.to_string(),
            export_prefix: DEFAULT_EXPORT_PREFIX.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
            max_reviews_per_country: None,
            page_delay_ms: 200..=500,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("REVIEWDASH_PORT") {
            Some(v) => v.parse().with_context(|| format!("invalid REVIEWDASH_PORT '{v}'"))?,
            None => defaults.port,
        };

        let cache_ttl_secs = parse_positive(get("REVIEWDASH_CACHE_TTL_SECS"), "REVIEWDASH_CACHE_TTL_SECS")?
            .unwrap_or(defaults.cache_ttl_secs);
        let session_idle_secs =
            parse_positive(get("REVIEWDASH_SESSION_IDLE_SECS"), "REVIEWDASH_SESSION_IDLE_SECS")?
                .unwrap_or(defaults.session_idle_secs);

        let max_reviews_per_country = match get("REVIEWDASH_MAX_REVIEWS_PER_COUNTRY") {
            Some(v) => {
                let max: usize = v
                    .parse()
                    .with_context(|| format!("invalid REVIEWDASH_MAX_REVIEWS_PER_COUNTRY '{v}'"))?;
                (max > 0).then_some(max)
            }
            None => defaults.max_reviews_per_country,
        };

        let page_delay_ms = match get("REVIEWDASH_PAGE_DELAY_MS") {
            Some(v) => parse_delay_range(&v)?,
            None => defaults.page_delay_ms,
        };

        Ok(Self {
            port,
            app_id: get("REVIEWDASH_APP_ID").unwrap_or(defaults.app_id),
            app_title: get("REVIEWDASH_APP_TITLE").unwrap_or(defaults.app_title),
            export_prefix: get("REVIEWDASH_EXPORT_PREFIX").unwrap_or(defaults.export_prefix),
            cache_ttl_secs,
            session_idle_secs,
            max_reviews_per_country,
            page_delay_ms,
        })
    }
}

fn parse_positive(value: Option<String>, key: &str) -> anyhow::Result<Option<i64>> {
    let Some(v) = value else {
        return Ok(None);
    };
    let n: i64 = v.parse().with_context(|| format!("invalid {key} '{v}'"))?;
    if n <= 0 {
        bail!("{key} must be positive, got {n}");
    }
    Ok(Some(n))
}

/// Parse `"200-500"` or a single value such as `"300"`.
fn parse_delay_range(value: &str) -> anyhow::Result<RangeInclusive<u64>> {
    let (lo, hi) = match value.split_once('-') {
        Some((lo, hi)) => (lo.trim(), hi.trim()),
        None => (value, value),
    };
    let lo: u64 = lo
        .parse()
        .with_context(|| format!("invalid REVIEWDASH_PAGE_DELAY_MS '{value}'"))?;
    let hi: u64 = hi
        .parse()
        .with_context(|| format!("invalid REVIEWDASH_PAGE_DELAY_MS '{value}'"))?;
    if lo > hi {
        bail!("REVIEWDASH_PAGE_DELAY_MS lower bound {lo} exceeds upper bound {hi}");
    }
    Ok(lo..=hi)
}
