//! Score cleaning: static rules and the cleaner that applies them.
mod cleaner;
mod rules;

pub use cleaner::{CleanedBoard, RankedEntry, ScoreCleaner, assign_ranks};
pub use rules::{CleaningRules, LegacyPatch, ReplayChange, ReplayDeletion};
