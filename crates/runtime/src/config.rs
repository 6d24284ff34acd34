//! Sync configuration and its environment loader.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use board_core::Category;

pub const DEFAULT_HOST: &str = "dojo.nplusplus.ninja";
pub const DEFAULT_PATH: &str = "/prod/steam";
pub const DEFAULT_APP_ID: u32 = 230270;

/// Body the score service returns when the credential is inactive.
pub const INVALID_SESSION_MARKER: &str = "-1337";

/// Endpoint of the remote score service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointConfig {
    pub host: String,
    pub path: String,
    pub app_id: u32,
    pub request_timeout: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            path: DEFAULT_PATH.to_string(),
            app_id: DEFAULT_APP_ID,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Bounded retry loop of the fetcher. The delay is fixed, not exponential.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 50,
            delay: Duration::from_millis(250),
        }
    }
}

/// Configuration shared by the fetcher, the workers and the scheduler.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub endpoint: EndpointConfig,
    pub retry: RetryPolicy,
    /// Session credentials in rotation order.
    pub tickets: Vec<String>,
    pub score_frequency: Duration,
    pub demo_frequency: Duration,
    pub demo_concurrency: usize,
    pub demo_attempt_limit: u32,
    pub demo_buffer_size: usize,
    pub categories: Vec<Category>,
    pub rules_path: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            retry: RetryPolicy::default(),
            tickets: Vec::new(),
            score_frequency: Duration::from_secs(86_400),
            demo_frequency: Duration::from_secs(86_400),
            demo_concurrency: 4,
            demo_attempt_limit: 5,
            demo_buffer_size: 1024,
            categories: vec![Category::Level, Category::Episode, Category::Story],
            rules_path: None,
        }
    }
}

impl SyncConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `LEADERBOARD_HOST` - Score service host (default: dojo.nplusplus.ninja)
    /// - `LEADERBOARD_PATH` - Path prefix of the endpoints (default: /prod/steam)
    /// - `LEADERBOARD_APP_ID` - Application id sent with every request (default: 230270)
    /// - `LEADERBOARD_TICKETS` - Comma separated session credentials, in rotation order
    /// - `SYNC_RETRIES` - Attempts per fetch (default: 50)
    /// - `SYNC_RETRY_DELAY_MS` - Fixed delay between attempts (default: 250)
    /// - `SYNC_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
    /// - `SYNC_SCORE_FREQUENCY_SECS` - Period of score syncs (default: 86400)
    /// - `SYNC_DEMO_FREQUENCY_SECS` - Period of demo backfills (default: 86400)
    /// - `SYNC_DEMO_CONCURRENCY` - Parallel demo downloads (default: 4)
    /// - `SYNC_DEMO_ATTEMPT_LIMIT` - Attempts per demo in one backfill (default: 5)
    /// - `SYNC_CATEGORIES` - Categories to sync (default: level,episode,story)
    /// - `CLEANING_RULES_PATH` - TOML file overriding the embedded cleaning rules
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("LEADERBOARD_HOST") {
            config.endpoint.host = host;
        }
        if let Ok(path) = env::var("LEADERBOARD_PATH") {
            config.endpoint.path = path;
        }
        if let Some(app_id) = read_env::<u32>("LEADERBOARD_APP_ID") {
            config.endpoint.app_id = app_id;
        }
        if let Some(secs) = read_env::<u64>("SYNC_REQUEST_TIMEOUT_SECS") {
            config.endpoint.request_timeout = Duration::from_secs(secs.max(1));
        }

        if let Ok(tickets) = env::var("LEADERBOARD_TICKETS") {
            config.tickets = split_list(&tickets).map(str::to_string).collect();
        }

        if let Some(attempts) = read_env::<u32>("SYNC_RETRIES") {
            config.retry.attempts = attempts.max(1);
        }
        if let Some(ms) = read_env::<u64>("SYNC_RETRY_DELAY_MS") {
            config.retry.delay = Duration::from_millis(ms);
        }

        if let Some(secs) = read_env::<u64>("SYNC_SCORE_FREQUENCY_SECS") {
            config.score_frequency = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = read_env::<u64>("SYNC_DEMO_FREQUENCY_SECS") {
            config.demo_frequency = Duration::from_secs(secs.max(1));
        }
        if let Some(concurrency) = read_env::<usize>("SYNC_DEMO_CONCURRENCY") {
            config.demo_concurrency = concurrency.max(1);
        }
        if let Some(limit) = read_env::<u32>("SYNC_DEMO_ATTEMPT_LIMIT") {
            config.demo_attempt_limit = limit.max(1);
        }

        if let Ok(categories) = env::var("SYNC_CATEGORIES") {
            let parsed: Vec<Category> = split_list(&categories)
                .filter_map(|name| Category::from_str(name).ok())
                .collect();
            if !parsed.is_empty() {
                config.categories = parsed;
            }
        }

        config.rules_path = env::var("CLEANING_RULES_PATH").ok().map(PathBuf::from);

        config
    }

    pub fn with_tickets(mut self, tickets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tickets = tickets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_categories(mut self, categories: impl Into<Vec<Category>>) -> Self {
        self.categories = categories.into();
        self
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_live_service() {
        let config = SyncConfig::default();
        assert_eq!(config.endpoint.host, "dojo.nplusplus.ninja");
        assert_eq!(config.retry.attempts, 50);
        assert_eq!(config.retry.delay, Duration::from_millis(250));
        assert_eq!(config.categories.len(), 3);
    }

    #[test]
    fn test_split_list_trims_and_skips_blanks() {
        let items: Vec<_> = split_list(" a, b ,,c ").collect();
        assert_eq!(items, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_builders() {
        let config = SyncConfig::default()
            .with_tickets(["1", "2"])
            .with_categories([Category::Level]);
        assert_eq!(config.tickets, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(config.categories, vec![Category::Level]);
    }
}
