use std::collections::{BTreeMap, BTreeSet};

use crate::category::Category;
use crate::units::Millis;

/// Score correction for runs submitted before a level's geometry changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LegacyPatch {
    pub category: Category,
    pub id: u32,
    /// Runs with a replay id at or below this value are patched.
    pub threshold: u64,
    pub delta: Millis,
}

/// Correction for one specific run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplayChange {
    pub category: Category,
    pub replay_id: u64,
    pub delta: Millis,
}

/// One specific run removed from the boards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplayDeletion {
    pub category: Category,
    pub replay_id: u64,
}

/// Static configuration consumed by the score cleaner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CleaningRules {
    /// Player names whose runs are never kept.
    pub ignored_names: BTreeSet<String>,
    /// User ids whose runs are never kept (hacked accounts).
    pub ignored_ids: BTreeSet<u32>,
    /// User ids whose runs are archived as cheated but never ranked.
    pub cheaters: BTreeSet<u32>,
    pub patches: Vec<LegacyPatch>,
    pub deletions: Vec<ReplayDeletion>,
    pub changes: Vec<ReplayChange>,
}

impl CleaningRules {
    pub fn is_ignored(&self, user_id: u32, user_name: &str) -> bool {
        self.ignored_ids.contains(&user_id) || self.ignored_names.contains(user_name)
    }

    pub fn is_cheater(&self, user_id: u32) -> bool {
        self.cheaters.contains(&user_id)
    }

    /// Legacy patch for an entity. The first configured one wins.
    pub fn patch_for(&self, category: Category, id: u32) -> Option<&LegacyPatch> {
        self.patches
            .iter()
            .find(|patch| patch.category == category && patch.id == id)
    }

    pub fn is_deleted(&self, category: Category, replay_id: u64) -> bool {
        self.deletions
            .iter()
            .any(|deletion| deletion.category == category && deletion.replay_id == replay_id)
    }

    pub fn change_for(&self, category: Category, replay_id: u64) -> Option<Millis> {
        self.changes
            .iter()
            .find(|change| change.category == category && change.replay_id == replay_id)
            .map(|change| change.delta)
    }

    /// Number of configured entries per rule kind, for logging.
    pub fn summary(&self) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([
            ("ignored_names", self.ignored_names.len()),
            ("ignored_ids", self.ignored_ids.len()),
            ("cheaters", self.cheaters.len()),
            ("patches", self.patches.len()),
            ("deletions", self.deletions.len()),
            ("changes", self.changes.len()),
        ])
    }
}
