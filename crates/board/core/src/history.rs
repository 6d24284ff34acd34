//! Point-in-time boards rebuilt from archive rows.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::category::PAGE_SIZE;
use crate::model::{Archive, ArchiveId, HighscoreableId, PlayerId};
use crate::units::Millis;

/// Top [`PAGE_SIZE`] of `key` as it stood at `date`.
///
/// Each player's latest non-cheated archive up to `date` (highest replay id)
/// stands for them, then the board is ordered by score descending and replay
/// id ascending.
pub fn board_at<'a>(
    archives: impl IntoIterator<Item = &'a Archive>,
    key: HighscoreableId,
    date: DateTime<Utc>,
) -> Vec<&'a Archive> {
    let mut latest: HashMap<PlayerId, &Archive> = HashMap::new();
    for archive in archives
        .into_iter()
        .filter(|a| a.highscoreable == key && a.date <= date && !a.cheated)
    {
        latest
            .entry(archive.player_id)
            .and_modify(|current| {
                if archive.replay_id > current.replay_id {
                    *current = archive;
                }
            })
            .or_insert(archive);
    }

    let mut board: Vec<&Archive> = latest.into_values().collect();
    board.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.replay_id.cmp(&b.replay_id))
    });
    board.truncate(PAGE_SIZE);
    board
}

/// Position of `archive` in its board at `date`, or [`PAGE_SIZE`] if absent.
pub fn rank_at<'a>(
    archives: impl IntoIterator<Item = &'a Archive>,
    archive: &Archive,
    date: DateTime<Utc>,
) -> usize {
    board_at(archives, archive.highscoreable, date)
        .iter()
        .position(|entry| entry.id == archive.id)
        .unwrap_or(PAGE_SIZE)
}

/// Change of one player's standing between two snapshots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardChange {
    pub player_id: PlayerId,
    pub archive: ArchiveId,
    pub rank: usize,
    /// `None` when the player was not on the old board.
    pub previous_rank: Option<usize>,
    pub score_delta: Option<Millis>,
}

impl BoardChange {
    pub fn is_new(&self) -> bool {
        self.previous_rank.is_none()
    }
}

/// Per-player differences from `old` to `new`, in `new`'s order.
pub fn diff_boards(old: &[&Archive], new: &[&Archive]) -> Vec<BoardChange> {
    let previous: HashMap<PlayerId, (usize, Millis)> = old
        .iter()
        .enumerate()
        .map(|(rank, archive)| (archive.player_id, (rank, archive.score)))
        .collect();

    new.iter()
        .enumerate()
        .map(|(rank, archive)| {
            let before = previous.get(&archive.player_id);
            BoardChange {
                player_id: archive.player_id,
                archive: archive.id,
                rank,
                previous_rank: before.map(|(rank, _)| *rank),
                score_delta: before.map(|(_, score)| archive.score - *score),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::model::UNSET_FRACTION;

    fn archive(id: u64, player: u64, score: i64, day: i64) -> Archive {
        Archive {
            id: ArchiveId(id),
            replay_id: id * 10,
            player_id: PlayerId(player),
            metanet_id: player as u32,
            highscoreable: HighscoreableId::level(3),
            score: Millis(score),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day),
            tab: None,
            cheated: false,
            fraction: UNSET_FRACTION,
            framecount: None,
            gold: None,
        }
    }

    #[test]
    fn test_board_at_keeps_latest_per_player_up_to_date() {
        let rows = vec![
            archive(1, 1, 80_000, 0),
            archive(2, 2, 85_000, 1),
            archive(3, 1, 90_000, 5),
            archive(4, 3, 70_000, 2),
        ];
        let day3 = Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap();

        let board: Vec<_> = board_at(&rows, HighscoreableId::level(3), day3)
            .iter()
            .map(|a| a.id.0)
            .collect();
        assert_eq!(board, vec![2, 1, 4]);

        let later = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(rank_at(&rows, &rows[2], later), 0);
        assert_eq!(rank_at(&rows, &rows[0], later), PAGE_SIZE);
    }

    #[test]
    fn test_latest_replay_stands_even_when_slower() {
        // replay 30 is newer than replay 10 but scores lower
        let rows = vec![
            archive(1, 1, 90_000, 0),
            archive(3, 1, 80_000, 2),
            archive(2, 2, 85_000, 1),
        ];
        let later = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        let board: Vec<_> = board_at(&rows, HighscoreableId::level(3), later)
            .iter()
            .map(|a| a.id.0)
            .collect();
        assert_eq!(board, vec![2, 3]);
        assert_eq!(rank_at(&rows, &rows[0], later), PAGE_SIZE);

        let day1 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let board: Vec<_> = board_at(&rows, HighscoreableId::level(3), day1)
            .iter()
            .map(|a| a.id.0)
            .collect();
        assert_eq!(board, vec![1, 2]);
    }

    #[test]
    fn test_cheated_archives_are_ignored() {
        let mut rows = vec![archive(1, 1, 80_000, 0), archive(2, 2, 99_000, 0)];
        rows[1].cheated = true;
        let later = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let board = board_at(&rows, HighscoreableId::level(3), later);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].player_id, PlayerId(1));
    }

    #[test]
    fn test_diff_marks_new_and_moved_players() {
        let rows = vec![
            archive(1, 1, 80_000, 0),
            archive(2, 2, 85_000, 1),
            archive(3, 1, 90_000, 5),
        ];
        let old = vec![&rows[1], &rows[0]];
        let new = vec![&rows[2], &rows[1]];
        let changes = diff_boards(&old, &new);

        assert_eq!(changes[0].previous_rank, Some(1));
        assert_eq!(changes[0].score_delta, Some(Millis(10_000)));
        assert_eq!(changes[1].previous_rank, Some(0));
        assert!(!changes[1].is_new());

        let fresh = diff_boards(&[], &new);
        assert!(fresh.iter().all(BoardChange::is_new));
    }
}
