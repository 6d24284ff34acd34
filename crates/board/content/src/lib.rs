//! Static leaderboard content and its loaders.
//!
//! This crate ships the cleaning rules consumed by the score cleaner:
//! - ignored player names and hacked account ids
//! - cheater ids (archived separately, never ranked)
//! - legacy patches for runs submitted against older map versions
//! - individual run deletions and score changes
//!
//! The rules are embedded as TOML and can be overridden from a file.

/// Embedded default cleaning rules (TOML).
pub const EMBEDDED_RULES: &str = include_str!("../data/cleaning.toml");

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{LoadResult, RulesLoader};
