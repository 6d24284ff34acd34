use std::collections::BTreeSet;

use crate::category::{Category, PAGE_SIZE, Tab, min_scores};
use crate::error::{BoardError, Result};
use crate::model::{HighscoreableId, PlayerId};
use crate::units::Millis;

use super::RankingEngine;

/// Per-player overview across the selected categories.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayerSummary {
    pub scores: usize,
    pub points: usize,
    /// `None` until the player has `min_scores` scores.
    pub avg_points: Option<f64>,
    pub total_score: Millis,
    /// Number of scores at positions below 1, 5, 10 and 20.
    pub top: [usize; 4],
}

const TOP_CUTS: [usize; 4] = [1, 5, 10, 20];

impl RankingEngine<'_> {
    /// Sum of the 0th scores and how many entities contributed.
    pub fn total_scores(&self, categories: &[Category], tabs: &[Tab]) -> (Millis, usize) {
        self.boards(categories, tabs)
            .values()
            .filter_map(|rows| rows.iter().find(|row| row.rank == 0))
            .fold((Millis::ZERO, 0), |(sum, count), row| (sum + row.score, count + 1))
    }

    /// How far each episode or story score at `rank` is from the sum of its
    /// levels' 0ths, after removing the 90 seconds every extra level adds.
    ///
    /// Smaller is cleaner. Entities lacking a score at `rank` are skipped.
    pub fn cleanliness(
        &self,
        category: Category,
        tabs: &[Tab],
        rank: usize,
    ) -> Result<Vec<(HighscoreableId, Millis)>> {
        let children = category
            .child_levels()
            .ok_or(BoardError::NoChildLevels(category))?;
        if rank >= PAGE_SIZE {
            return Err(BoardError::RankOutOfRange(rank));
        }
        let levels = self.boards(&[Category::Level], &[]);
        let offset = Millis::from_secs(90 * i64::from(children - 1));

        let mut result = Vec::new();
        for (key, rows) in self.boards(&[category], tabs) {
            let Some(entry) = rows.iter().find(|row| row.rank == rank) else {
                continue;
            };
            let level_sum: Millis = key
                .levels()?
                .iter()
                .filter_map(|level| levels.get(level))
                .filter_map(|rows| rows.iter().find(|row| row.rank == 0))
                .map(|row| row.score)
                .sum();
            result.push((key, level_sum.abs_diff(entry.score) - offset));
        }
        result.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(result)
    }

    /// Number of entities per row count: index `k` counts entities with `k`
    /// rows (only 0th-tied rows with `ties`).
    pub fn tallies(
        &self,
        categories: &[Category],
        tabs: &[Tab],
        ties: bool,
    ) -> [usize; PAGE_SIZE + 1] {
        let mut tallies = [0; PAGE_SIZE + 1];
        for rows in self.boards(categories, tabs).values() {
            let count = rows
                .iter()
                .filter(|row| !ties || row.tied_rank == 0)
                .count()
                .min(PAGE_SIZE);
            tallies[count] += 1;
        }
        tallies
    }

    /// Points, averages, total score and top-N counts for one player.
    pub fn player_summary(
        &self,
        player: PlayerId,
        categories: &[Category],
        tabs: &[Tab],
        ties: bool,
    ) -> PlayerSummary {
        let mut summary = PlayerSummary::default();
        let boards = self.placed(categories, tabs, &BTreeSet::new());
        for placed in boards.values().flatten().filter(|p| p.row.player_id == player) {
            let position = placed.position(ties);
            summary.scores += 1;
            summary.points += PAGE_SIZE - position;
            summary.total_score += placed.row.score;
            for (slot, cut) in TOP_CUTS.iter().enumerate() {
                if position < *cut {
                    summary.top[slot] += 1;
                }
            }
        }
        if summary.scores > 0 && summary.scores as u32 >= min_scores(categories, tabs) {
            summary.avg_points = Some(summary.points as f64 / summary.scores as f64);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::ranking::tests::board;

    #[test]
    fn test_total_scores_sums_zeroths() {
        let mut rows = board(HighscoreableId::level(0), &[(1, 100_000), (2, 90_000)]);
        rows.extend(board(HighscoreableId::level(1), &[(2, 50_500)]));
        let names = HashMap::new();
        let engine = RankingEngine::new(&rows, &names);

        assert_eq!(engine.total_scores(&[Category::Level], &[]), (Millis(150_500), 2));
        assert_eq!(engine.total_scores(&[Category::Episode], &[]), (Millis::ZERO, 0));
    }

    #[test]
    fn test_cleanliness_of_episode() {
        let mut rows = Vec::new();
        for level in 0..5 {
            rows.extend(board(HighscoreableId::level(level), &[(1, 100_000)]));
        }
        // Perfect chaining would give 500 - 4 * 90 = 140 seconds.
        rows.extend(board(HighscoreableId::episode(0), &[(1, 139_000)]));
        let names = HashMap::new();
        let engine = RankingEngine::new(&rows, &names);

        let clean = engine.cleanliness(Category::Episode, &[], 0).unwrap();
        assert_eq!(clean, vec![(HighscoreableId::episode(0), Millis(1_000))]);
        assert!(engine.cleanliness(Category::Level, &[], 0).is_err());
    }

    #[test]
    fn test_tallies_and_player_summary() {
        let mut rows = board(HighscoreableId::level(0), &[(1, 100_000), (2, 100_000), (3, 9_000)]);
        rows.extend(board(HighscoreableId::level(1), &[(2, 100_000)]));
        let names = HashMap::new();
        let engine = RankingEngine::new(&rows, &names);

        let tallies = engine.tallies(&[Category::Level], &[], false);
        assert_eq!((tallies[1], tallies[3]), (1, 1));
        let tallies = engine.tallies(&[Category::Level], &[], true);
        assert_eq!((tallies[1], tallies[2]), (1, 1));

        let summary = engine.player_summary(PlayerId(2), &[Category::Level], &[], false);
        assert_eq!(summary.scores, 2);
        assert_eq!(summary.points, 39);
        assert_eq!(summary.top, [1, 2, 2, 2]);
        assert_eq!(summary.total_score, Millis(200_000));
        assert_eq!(summary.avg_points, None);
    }
}
