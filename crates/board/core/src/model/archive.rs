use core::fmt;

use chrono::{DateTime, Utc};

use crate::category::Tab;
use crate::model::{HighscoreableId, PlayerId};
use crate::units::{FRAME_RATE, Millis};

/// Stored fraction meaning "not computed".
///
/// Older rows that were computed as exactly 1 share this value; the two cases
/// are indistinguishable and are treated alike.
pub const UNSET_FRACTION: f64 = 1.0;

/// Identity shared by an archive row and its demo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ArchiveId(pub u64);

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Append-only record of one run observed in a top-20 board.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Archive {
    pub id: ArchiveId,
    pub replay_id: u64,
    pub player_id: PlayerId,
    pub metanet_id: u32,
    pub highscoreable: HighscoreableId,
    pub score: Millis,
    pub date: DateTime<Utc>,
    pub tab: Option<Tab>,
    pub cheated: bool,
    pub fraction: f64,
    pub framecount: Option<u32>,
    pub gold: Option<i64>,
}

impl Archive {
    /// Whether a sub-frame remainder has been stored for this run.
    pub fn has_fraction(&self) -> bool {
        (0.0..UNSET_FRACTION).contains(&self.fraction)
    }

    /// Records the replay's total frame count and the gold it implies.
    ///
    /// Every piece of gold is worth two seconds and levels start at 90, so
    /// the remaining time plus the elapsed time pins down the gold collected.
    pub fn record_framecount(&mut self, framecount: u32) {
        let total = (self.score.to_frames() + i64::from(framecount)) as f64;
        let gold = ((total / FRAME_RATE as f64 - 90.0) / 2.0).round() as i64;
        self.framecount = Some(framecount);
        self.gold = Some(gold);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive(score: i64) -> Archive {
        Archive {
            id: ArchiveId(1),
            replay_id: 10,
            player_id: PlayerId(1),
            metanet_id: 7,
            highscoreable: HighscoreableId::level(0),
            score: Millis(score),
            date: Utc::now(),
            tab: None,
            cheated: false,
            fraction: UNSET_FRACTION,
            framecount: None,
            gold: None,
        }
    }

    #[test]
    fn test_default_fraction_is_unset() {
        let mut row = archive(90_000);
        assert!(!row.has_fraction());
        row.fraction = 0.25;
        assert!(row.has_fraction());
    }

    #[test]
    fn test_gold_from_framecount() {
        // 100s left after 20s of play: 120s total, 15 gold.
        let mut row = archive(100_000);
        row.record_framecount(1200);
        assert_eq!(row.framecount, Some(1200));
        assert_eq!(row.gold, Some(15));
    }
}
