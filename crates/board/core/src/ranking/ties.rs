use std::collections::{BTreeMap, BTreeSet};

use crate::category::{Category, MIN_TIES, PAGE_SIZE, Tab};
use crate::model::{HighscoreableId, PlayerId};
use crate::units::Millis;

use super::{Placed, RankingEngine};

/// Whether every recorded score on an entity shares the 0th.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TieClass {
    Maxed,
    Maxable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TieEntry {
    pub highscoreable: HighscoreableId,
    /// Rows with `tied_rank == 0`.
    pub tied: usize,
    /// All recorded rows.
    pub total: usize,
    pub class: TieClass,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spread {
    pub highscoreable: HighscoreableId,
    pub spread: Millis,
    /// Holder of the 0th.
    pub holder: PlayerId,
}

/// Entities with at least [`MIN_TIES`] players sharing the 0th, most ties first.
pub(super) fn classify(
    boards: &BTreeMap<HighscoreableId, Vec<Placed<'_>>>,
    player: Option<PlayerId>,
) -> Vec<TieEntry> {
    let mut entries: Vec<TieEntry> = boards
        .iter()
        .filter_map(|(key, rows)| {
            let zeroths: BTreeSet<PlayerId> = rows
                .iter()
                .filter(|placed| placed.tied_rank == 0)
                .map(|placed| placed.row.player_id)
                .collect();
            if zeroths.len() < MIN_TIES {
                return None;
            }
            if player.is_some_and(|player| zeroths.contains(&player)) {
                return None;
            }
            let class = if zeroths.len() == rows.len() {
                TieClass::Maxed
            } else {
                TieClass::Maxable
            };
            Some(TieEntry {
                highscoreable: *key,
                tied: zeroths.len(),
                total: rows.len(),
                class,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.tied
            .cmp(&a.tied)
            .then_with(|| a.highscoreable.cmp(&b.highscoreable))
    });
    entries
}

impl RankingEngine<'_> {
    /// Classifies entities as maxed or maxable.
    ///
    /// With `player`, entities where that player already shares the 0th are
    /// left out, leaving the ties still open to them.
    pub fn ties(
        &self,
        categories: &[Category],
        tabs: &[Tab],
        player: Option<PlayerId>,
    ) -> Vec<TieEntry> {
        let boards = self.placed(categories, tabs, &BTreeSet::new());
        classify(&boards, player)
    }

    pub fn maxed(&self, categories: &[Category], tabs: &[Tab]) -> Vec<TieEntry> {
        self.ties(categories, tabs, None)
            .into_iter()
            .filter(|tie| tie.class == TieClass::Maxed)
            .collect()
    }

    pub fn maxable(&self, categories: &[Category], tabs: &[Tab]) -> Vec<TieEntry> {
        self.ties(categories, tabs, None)
            .into_iter()
            .filter(|tie| tie.class == TieClass::Maxable)
            .collect()
    }

    /// Gap between the 0th and the `n`th score per entity.
    ///
    /// `n` is clamped to the board. Entities without an `n`th score are
    /// skipped. With `player`, only entities whose 0th they hold are kept.
    pub fn spreads(
        &self,
        n: usize,
        categories: &[Category],
        tabs: &[Tab],
        smallest: bool,
        player: Option<PlayerId>,
    ) -> Vec<Spread> {
        let n = n.min(PAGE_SIZE - 1);
        let mut spreads: Vec<Spread> = self
            .boards(categories, tabs)
            .into_iter()
            .filter_map(|(key, rows)| {
                let first = rows.iter().find(|row| row.rank == 0)?;
                let nth = rows.iter().find(|row| row.rank == n)?;
                Some(Spread {
                    highscoreable: key,
                    spread: first.score - nth.score,
                    holder: first.player_id,
                })
            })
            .filter(|spread| player.is_none_or(|player| spread.holder == player))
            .collect();

        spreads.sort_by(|a, b| {
            let by_spread = if smallest {
                a.spread.cmp(&b.spread)
            } else {
                b.spread.cmp(&a.spread)
            };
            by_spread.then_with(|| a.highscoreable.cmp(&b.highscoreable))
        });
        spreads.truncate(PAGE_SIZE);
        spreads
    }
}
