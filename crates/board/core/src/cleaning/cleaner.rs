//! Score list cleaning and rank assignment.

use std::collections::HashSet;

use crate::category::PAGE_SIZE;
use crate::cleaning::CleaningRules;
use crate::model::{HighscoreableId, RawScore};

/// A cleaned entry holding a board slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankedEntry {
    pub rank: usize,
    pub tied_rank: usize,
    pub score: RawScore,
}

/// Result of cleaning one entity's remote score list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CleanedBoard {
    /// Ranked entries in canonical order, at most [`PAGE_SIZE`] long.
    pub ranked: Vec<RankedEntry>,
    /// Entries by flagged cheaters, archived but never ranked.
    pub cheated: Vec<RawScore>,
    /// Entries dropped by dedup, ignore lists, deletions or the ceiling.
    pub dropped: usize,
}

impl CleanedBoard {
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty() && self.cheated.is_empty()
    }
}

/// Applies the static cleaning rules to remote score lists.
#[derive(Clone, Copy, Debug)]
pub struct ScoreCleaner<'a> {
    rules: &'a CleaningRules,
}

impl<'a> ScoreCleaner<'a> {
    pub fn new(rules: &'a CleaningRules) -> Self {
        Self { rules }
    }

    /// Cleans the full remote list for `key` and ranks the survivors.
    ///
    /// Steps, in order: dedup by user name (first wins), drop ignored players,
    /// deleted replays and scores at or above the ceiling, apply the legacy
    /// patch and individual changes, then sort by score descending with the
    /// lower replay id first on ties.
    pub fn clean(&self, key: HighscoreableId, raw: Vec<RawScore>) -> CleanedBoard {
        let total = raw.len();
        let ceiling = key.ceiling();
        let patch = self.rules.patch_for(key.category, key.id);

        let mut seen = HashSet::new();
        let mut kept: Vec<(RawScore, bool)> = raw
            .into_iter()
            .filter(|entry| seen.insert(entry.user_name.clone()))
            .filter(|entry| {
                !self.rules.is_ignored(entry.user_id, &entry.user_name)
                    && !self.rules.is_deleted(key.category, entry.replay_id)
                    && entry.score < ceiling
            })
            .map(|mut entry| {
                if let Some(patch) = patch
                    && entry.replay_id <= patch.threshold
                {
                    entry.score += patch.delta;
                }
                if let Some(delta) = self.rules.change_for(key.category, entry.replay_id) {
                    entry.score += delta;
                }
                let cheated = self.rules.is_cheater(entry.user_id);
                (entry, cheated)
            })
            .collect();

        let dropped = total - kept.len();
        kept.sort_by(|(a, _), (b, _)| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.replay_id.cmp(&b.replay_id))
        });

        let (cheated, honest): (Vec<_>, Vec<_>) =
            kept.into_iter().partition(|(_, cheated)| *cheated);

        CleanedBoard {
            ranked: assign_ranks(honest.into_iter().map(|(entry, _)| entry)),
            cheated: cheated.into_iter().map(|(entry, _)| entry).collect(),
            dropped,
        }
    }
}

/// Assigns dense ranks by position and tied ranks by the first position
/// holding an equal score. Input must already be in canonical order.
pub fn assign_ranks(ordered: impl IntoIterator<Item = RawScore>) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = Vec::with_capacity(PAGE_SIZE);
    for (rank, score) in ordered.into_iter().take(PAGE_SIZE).enumerate() {
        let tied_rank = match ranked.last() {
            Some(prev) if prev.score.score == score.score => prev.tied_rank,
            _ => rank,
        };
        ranked.push(RankedEntry {
            rank,
            tied_rank,
            score,
        });
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::cleaning::{LegacyPatch, ReplayChange, ReplayDeletion};
    use crate::units::Millis;

    fn raw(user_id: u32, name: &str, score: i64, replay_id: u64) -> RawScore {
        RawScore::new(user_id, name, score, replay_id)
    }

    #[test]
    fn test_ranks_are_dense_and_ties_share_first_position() {
        let rules = CleaningRules::default();
        let board = ScoreCleaner::new(&rules).clean(
            HighscoreableId::level(0),
            vec![
                raw(1, "a", 90_000, 5),
                raw(2, "b", 95_000, 9),
                raw(3, "c", 90_000, 3),
                raw(4, "d", 80_000, 1),
                raw(5, "e", 95_000, 2),
            ],
        );

        let ranks: Vec<_> = board.ranked.iter().map(|e| e.rank).collect();
        let ties: Vec<_> = board.ranked.iter().map(|e| e.tied_rank).collect();
        let replays: Vec<_> = board.ranked.iter().map(|e| e.score.replay_id).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4]);
        assert_eq!(ties, vec![0, 0, 2, 2, 4]);
        assert_eq!(replays, vec![2, 9, 3, 5, 1]);
    }

    #[test]
    fn test_duplicate_names_keep_first_occurrence() {
        let rules = CleaningRules::default();
        let board = ScoreCleaner::new(&rules).clean(
            HighscoreableId::level(0),
            vec![raw(1, "a", 80_000, 1), raw(9, "a", 99_000, 2)],
        );
        assert_eq!(board.ranked.len(), 1);
        assert_eq!(board.ranked[0].score.user_id, 1);
        assert_eq!(board.dropped, 1);
    }

    #[test]
    fn test_score_at_ceiling_is_dropped() {
        // Intro level ceiling is 298 seconds.
        let rules = CleaningRules::default();
        let board = ScoreCleaner::new(&rules).clean(
            HighscoreableId::level(0),
            vec![raw(1, "hacked", 298_000, 1), raw(2, "fine", 297_999, 2)],
        );
        assert_eq!(board.ranked.len(), 1);
        assert_eq!(board.ranked[0].score.user_name, "fine");
        assert_eq!(board.ranked[0].rank, 0);
    }

    #[test]
    fn test_legacy_patch_applies_below_threshold() {
        let rules = CleaningRules {
            patches: vec![LegacyPatch {
                category: Category::Level,
                id: 7,
                threshold: 1000,
                delta: Millis(-42),
            }],
            ..Default::default()
        };
        let board = ScoreCleaner::new(&rules).clean(
            HighscoreableId::level(7),
            vec![raw(1, "old", 5000, 500), raw(2, "new", 4990, 1001)],
        );
        assert_eq!(board.ranked[0].score.user_name, "new");
        assert_eq!(board.ranked[1].score.score, Millis(4958));

        // Other entities are untouched.
        let board = ScoreCleaner::new(&rules)
            .clean(HighscoreableId::level(8), vec![raw(1, "old", 5000, 500)]);
        assert_eq!(board.ranked[0].score.score, Millis(5000));
    }

    #[test]
    fn test_ignore_lists_deletions_and_changes() {
        let rules = CleaningRules {
            ignored_names: ["banned".to_string()].into(),
            ignored_ids: [66].into(),
            deletions: vec![ReplayDeletion {
                category: Category::Level,
                replay_id: 40,
            }],
            changes: vec![ReplayChange {
                category: Category::Level,
                replay_id: 50,
                delta: Millis(-6000),
            }],
            ..Default::default()
        };
        let board = ScoreCleaner::new(&rules).clean(
            HighscoreableId::level(0),
            vec![
                raw(1, "banned", 100_000, 10),
                raw(66, "alias", 100_000, 20),
                raw(3, "deleted", 100_000, 40),
                raw(4, "changed", 100_000, 50),
                raw(5, "plain", 95_000, 60),
            ],
        );
        let names: Vec<_> = board.ranked.iter().map(|e| e.score.user_name.as_str()).collect();
        assert_eq!(names, vec!["plain", "changed"]);
        assert_eq!(board.ranked[1].score.score, Millis(94_000));
        assert_eq!(board.dropped, 3);
    }

    #[test]
    fn test_cheaters_are_kept_aside_without_rank() {
        let rules = CleaningRules {
            cheaters: [2].into(),
            ..Default::default()
        };
        let board = ScoreCleaner::new(&rules).clean(
            HighscoreableId::level(0),
            vec![raw(1, "a", 90_000, 1), raw(2, "b", 99_000, 2), raw(3, "c", 80_000, 3)],
        );
        assert_eq!(board.cheated.len(), 1);
        assert_eq!(board.cheated[0].user_id, 2);
        assert_eq!(board.ranked.len(), 2);
        assert_eq!(board.ranked[0].score.user_id, 1);
        assert_eq!(board.ranked[0].rank, 0);
    }

    #[test]
    fn test_output_capped_at_page_size() {
        let rules = CleaningRules::default();
        let raw_list = (0..30)
            .map(|i| raw(i, &format!("p{i}"), 100_000 - i64::from(i), u64::from(i)))
            .collect();
        let board = ScoreCleaner::new(&rules).clean(HighscoreableId::level(0), raw_list);
        assert_eq!(board.ranked.len(), PAGE_SIZE);
        assert_eq!(board.ranked.last().map(|e| e.rank), Some(PAGE_SIZE - 1));
    }
}
