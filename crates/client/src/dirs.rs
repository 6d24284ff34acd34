//! Platform-specific directory utilities
//!
//! Provides consistent directory paths across different operating systems,
//! following platform conventions for cache and data directories.

use std::path::PathBuf;

const APP_NAME: &str = "leaderboard";

/// Get the platform-specific log directory
///
/// Follows platform conventions:
/// - macOS: `~/Library/Caches/leaderboard/logs`
/// - Linux: `~/.cache/leaderboard/logs` (or `$XDG_CACHE_HOME/leaderboard/logs`)
/// - Windows: `%LOCALAPPDATA%\leaderboard\logs`
/// - Fallback: `/tmp/leaderboard/logs`
pub fn log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp").join(APP_NAME))
        .join("logs")
}

/// Get the platform-specific data directory, where the store lives
///
/// - macOS: `~/Library/Application Support/leaderboard`
/// - Linux: `~/.local/share/leaderboard` (or `$XDG_DATA_HOME/leaderboard`)
/// - Windows: `%APPDATA%\leaderboard`
/// - Fallback: `./leaderboard_data`
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./leaderboard_data"))
}
