//! Client configuration.
use std::env;
use std::path::PathBuf;

use runtime::SyncConfig;

use crate::dirs;

/// Everything the binary needs before building the runtime.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Directory holding the store snapshot.
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Mirror log output to stderr next to the log file.
    pub log_stderr: bool,
    pub sync: SyncConfig,
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `LEADERBOARD_DATA_DIR` - Store directory (default: platform data dir)
    /// - `LEADERBOARD_LOG_DIR` - Log directory (default: platform cache dir + `/logs`)
    /// - `LEADERBOARD_LOG_STDERR` - Also log to stderr (default: true)
    ///
    /// Sync settings are read by [`SyncConfig::from_env`].
    pub fn from_env() -> Self {
        Self {
            data_dir: env::var_os("LEADERBOARD_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(dirs::data_dir),
            log_dir: env::var_os("LEADERBOARD_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(dirs::log_dir),
            log_stderr: read_env("LEADERBOARD_LOG_STDERR").unwrap_or(true),
            sync: SyncConfig::from_env(),
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
