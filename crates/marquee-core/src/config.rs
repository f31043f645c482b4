use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;

pub const DEFAULT_COOLDOWN_SECS: u64 = 60;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_TIMEZONE: &str = "Asia/Ho_Chi_Minh";
pub const DEFAULT_BASE_RATE_MINOR: i64 = 1_500_000;

/// Business rules the record builder applies: the default hourly rate in
/// currency minor units, the known-exception names, and the roster of known
/// performers.
#[derive(Debug, Clone)]
pub struct ReconcileRules {
    pub base_rate_minor: i64,
    flagged_names: Vec<String>,
    roster: Vec<String>,
}

impl ReconcileRules {
    pub fn new(base_rate_minor: i64, flagged_names: Vec<String>, roster: Vec<String>) -> Self {
        Self {
            base_rate_minor,
            flagged_names: flagged_names
                .into_iter()
                .map(|n| n.trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
            roster: roster
                .into_iter()
                .map(|n| n.trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    pub fn is_flagged(&self, name: &str) -> bool {
        let needle = name.trim().to_lowercase();
        self.flagged_names.iter().any(|n| *n == needle)
    }

    pub fn in_roster(&self, name: &str) -> bool {
        let needle = name.trim().to_lowercase();
        self.roster.iter().any(|n| *n == needle)
    }
}

/// Per-deployment configuration, read from the environment. A missing feed
/// URL is deliberately not an error: sync becomes a no-op and the gap is
/// reported once at startup.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub source_url: Option<String>,
    pub fetch_timeout: Duration,
    pub cooldown: Duration,
    pub timezone: Tz,
    pub rules: ReconcileRules,
}

fn env_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .map(|raw| raw.split(',').map(|s| s.trim().to_string()).collect())
        .unwrap_or_default()
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl FeedConfig {
    pub fn from_env() -> Result<Self> {
        let source_url = std::env::var("MARQUEE_FEED_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let timezone: Tz = match std::env::var("MARQUEE_TIMEZONE") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|err| anyhow::anyhow!("invalid MARQUEE_TIMEZONE '{raw}': {err}"))?,
            Err(_) => DEFAULT_TIMEZONE.parse().expect("default timezone"),
        };

        Ok(Self {
            source_url,
            fetch_timeout: Duration::from_secs(env_parsed(
                "MARQUEE_FETCH_TIMEOUT_SECS",
                DEFAULT_FETCH_TIMEOUT_SECS,
            )?),
            cooldown: Duration::from_secs(env_parsed(
                "MARQUEE_SYNC_COOLDOWN_SECS",
                DEFAULT_COOLDOWN_SECS,
            )?),
            timezone,
            rules: ReconcileRules::new(
                env_parsed("MARQUEE_BASE_RATE_MINOR", DEFAULT_BASE_RATE_MINOR)?,
                env_list("MARQUEE_FLAGGED_NAMES"),
                env_list("MARQUEE_ROSTER"),
            ),
        })
    }
}
