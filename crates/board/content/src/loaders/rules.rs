//! Cleaning rules loader.

use std::path::Path;

use board_core::CleaningRules;

use crate::EMBEDDED_RULES;
use crate::loaders::{LoadResult, read_file};

/// Loader for [`CleaningRules`] from TOML.
pub struct RulesLoader;

impl RulesLoader {
    /// Load rules from a TOML file.
    pub fn load(path: &Path) -> LoadResult<CleaningRules> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse rules {}: {}", path.display(), e))
    }

    /// Parse rules from TOML text.
    pub fn parse(content: &str) -> LoadResult<CleaningRules> {
        let rules: CleaningRules = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse rules TOML: {}", e))?;
        Ok(rules)
    }

    /// Rules bundled with the crate.
    pub fn embedded() -> LoadResult<CleaningRules> {
        Self::parse(EMBEDDED_RULES)
    }

    /// Rules from `path` when given, otherwise the bundled ones.
    pub fn load_or_embedded(path: Option<&Path>) -> LoadResult<CleaningRules> {
        match path {
            Some(path) => Self::load(path),
            None => Self::embedded(),
        }
    }
}
