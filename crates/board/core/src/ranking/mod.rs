//! Cross-entity player rankings over persisted score rows.
//!
//! The engine is a pure read-side view: it never caches derived sets, so
//! results always reflect the rows it was built from.
//!
//! # Positions
//!
//! Every ranking works on a player's *position* in an entity's board: the raw
//! dense `rank`, or the tie-aware `tied_rank` when the query asks for ties.
//! Excluding players re-derives both positions per entity as if the excluded
//! players had never submitted.

mod stats;
mod ties;

pub use stats::PlayerSummary;
pub use ties::{Spread, TieClass, TieEntry};

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::category::{Category, DEFAULT_RANKED, PAGE_SIZE, Tab, min_scores};
use crate::model::{HighscoreableId, Player, PlayerId, Score};
use crate::units::Millis;

/// Aggregation computed by [`RankingEngine::rank`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RankingKind {
    /// Number of positions at or above `n`.
    Rank,
    /// Extra positions at or above `n` gained only through ties.
    TiedRank,
    /// Sum of `20 - position`.
    Points,
    /// Mean of `20 - position`, for players with enough scores.
    AvgPoints,
    /// Mean position, for players with enough scores. Lower is better.
    AvgRank,
    /// Mean margin of a 0th over the 1st, in seconds.
    AvgLead,
    /// Sum of scores.
    Score,
    /// Number of 0ths held alone.
    Singular,
    /// Number of shared 0ths on maxed entities.
    Maxed,
    /// Number of shared 0ths on maxable entities.
    Maxable,
}

impl RankingKind {
    /// Kinds whose defaults cover a single category.
    const fn single_category(self) -> bool {
        matches!(self, Self::AvgLead | Self::Score | Self::Maxed | Self::Maxable)
    }

    /// Kinds where zero or negative values are meaningful.
    const fn keeps_non_positive(self) -> bool {
        matches!(self, Self::AvgRank | Self::AvgLead)
    }

    const fn ascending(self) -> bool {
        matches!(self, Self::AvgRank)
    }
}

/// Parameters of a ranking request.
#[derive(Clone, Debug, PartialEq)]
pub struct RankingQuery {
    pub kind: RankingKind,
    /// Categories to aggregate. Empty selects the kind's default.
    pub categories: Vec<Category>,
    /// Tabs to aggregate. Empty selects all.
    pub tabs: Vec<Tab>,
    pub ties: bool,
    /// Position threshold for [`RankingKind::Rank`] and [`RankingKind::TiedRank`].
    pub n: usize,
    pub excluded: BTreeSet<PlayerId>,
    /// Return every player instead of one page.
    pub full: bool,
}

impl RankingQuery {
    pub fn new(kind: RankingKind) -> Self {
        Self {
            kind,
            categories: Vec::new(),
            tabs: Vec::new(),
            ties: false,
            n: 0,
            excluded: BTreeSet::new(),
            full: false,
        }
    }

    pub fn categories(mut self, categories: impl Into<Vec<Category>>) -> Self {
        self.categories = categories.into();
        self
    }

    pub fn tabs(mut self, tabs: impl Into<Vec<Tab>>) -> Self {
        self.tabs = tabs.into();
        self
    }

    pub fn ties(mut self, ties: bool) -> Self {
        self.ties = ties;
        self
    }

    /// Counts positions `0..=n`.
    pub fn top(mut self, n: usize) -> Self {
        self.n = n.min(PAGE_SIZE - 1);
        self
    }

    pub fn exclude(mut self, players: impl IntoIterator<Item = PlayerId>) -> Self {
        self.excluded.extend(players);
        self
    }

    pub fn full(mut self) -> Self {
        self.full = true;
        self
    }

    /// Categories actually aggregated.
    pub fn effective_categories(&self) -> Vec<Category> {
        if !self.categories.is_empty() {
            self.categories.clone()
        } else if self.kind.single_category() {
            vec![Category::Level]
        } else {
            DEFAULT_RANKED.to_vec()
        }
    }
}

/// Value of one ranking entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RankValue {
    Count(i64),
    Average(f64),
    Total(Millis),
}

impl RankValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Count(count) => *count as f64,
            Self::Average(avg) => *avg,
            Self::Total(total) => total.as_secs_f64(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RankingEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub value: RankValue,
}

/// A score row with the positions used by the current query.
#[derive(Clone, Copy, Debug)]
struct Placed<'a> {
    row: &'a Score,
    rank: usize,
    tied_rank: usize,
}

impl Placed<'_> {
    const fn position(&self, ties: bool) -> usize {
        if ties { self.tied_rank } else { self.rank }
    }
}

/// Aggregates score rows into player rankings.
pub struct RankingEngine<'a> {
    scores: &'a [Score],
    players: &'a HashMap<PlayerId, Player>,
}

impl<'a> RankingEngine<'a> {
    pub fn new(scores: &'a [Score], players: &'a HashMap<PlayerId, Player>) -> Self {
        Self { scores, players }
    }

    /// Rows in the given categories and tabs, grouped by entity in rank order.
    fn boards(
        &self,
        categories: &[Category],
        tabs: &[Tab],
    ) -> BTreeMap<HighscoreableId, Vec<&'a Score>> {
        let mut boards: BTreeMap<HighscoreableId, Vec<&Score>> = BTreeMap::new();
        for row in self.scores.iter().filter(|row| {
            categories.contains(&row.highscoreable.category)
                && (tabs.is_empty() || row.tab.is_some_and(|tab| tabs.contains(&tab)))
        }) {
            boards.entry(row.highscoreable).or_default().push(row);
        }
        for rows in boards.values_mut() {
            rows.sort_by_key(|row| row.rank);
        }
        boards
    }

    /// Positions per entity, re-derived when players are excluded.
    fn placed(
        &self,
        categories: &[Category],
        tabs: &[Tab],
        excluded: &BTreeSet<PlayerId>,
    ) -> BTreeMap<HighscoreableId, Vec<Placed<'a>>> {
        self.boards(categories, tabs)
            .into_iter()
            .map(|(key, rows)| {
                let placed = if excluded.is_empty() {
                    rows.into_iter()
                        .map(|row| Placed {
                            row,
                            rank: row.rank,
                            tied_rank: row.tied_rank,
                        })
                        .collect()
                } else {
                    rerank(rows.into_iter().filter(|row| !excluded.contains(&row.player_id)))
                };
                (key, placed)
            })
            .collect()
    }

    /// Computes one ranking page.
    pub fn rank(&self, query: &RankingQuery) -> Vec<RankingEntry> {
        let categories = query.effective_categories();
        let boards = self.placed(&categories, &query.tabs, &query.excluded);
        let ties = query.ties;
        let n = query.n;

        let mut counts: HashMap<PlayerId, i64> = HashMap::new();
        let mut totals: HashMap<PlayerId, Millis> = HashMap::new();
        let mut averages: HashMap<PlayerId, (i64, i64)> = HashMap::new();

        match query.kind {
            RankingKind::Rank => {
                for placed in boards.values().flatten().filter(|p| p.position(ties) <= n) {
                    *counts.entry(placed.row.player_id).or_default() += 1;
                }
            }
            RankingKind::TiedRank => {
                for placed in boards.values().flatten() {
                    if placed.tied_rank <= n && placed.rank > n {
                        *counts.entry(placed.row.player_id).or_default() += 1;
                    }
                }
            }
            RankingKind::Points => {
                for placed in boards.values().flatten() {
                    *counts.entry(placed.row.player_id).or_default() +=
                        (PAGE_SIZE - placed.position(ties)) as i64;
                }
            }
            RankingKind::AvgPoints | RankingKind::AvgRank => {
                let points = query.kind == RankingKind::AvgPoints;
                for placed in boards.values().flatten() {
                    let position = placed.position(ties);
                    let value = if points { PAGE_SIZE - position } else { position };
                    let (sum, count) = averages.entry(placed.row.player_id).or_default();
                    *sum += value as i64;
                    *count += 1;
                }
                let threshold = i64::from(min_scores(&categories, &query.tabs));
                averages.retain(|_, (_, count)| *count >= threshold);
            }
            RankingKind::AvgLead => {
                for rows in boards.values() {
                    if let [first, second, ..] = rows.as_slice() {
                        let (sum, count) = averages.entry(first.row.player_id).or_default();
                        *sum += first.row.score.abs_diff(second.row.score).raw();
                        *count += 1;
                    }
                }
            }
            RankingKind::Score => {
                for placed in boards.values().flatten() {
                    *totals.entry(placed.row.player_id).or_default() += placed.row.score;
                }
            }
            RankingKind::Singular => {
                for rows in boards.values() {
                    if let [first, second, ..] = rows.as_slice()
                        && second.tied_rank == 1
                    {
                        *counts.entry(first.row.player_id).or_default() += 1;
                    }
                }
            }
            RankingKind::Maxed | RankingKind::Maxable => {
                let wanted = if query.kind == RankingKind::Maxed {
                    TieClass::Maxed
                } else {
                    TieClass::Maxable
                };
                for tie in ties::classify(&boards, None).into_iter().filter(|t| t.class == wanted) {
                    for placed in boards[&tie.highscoreable].iter().filter(|p| p.tied_rank == 0) {
                        *counts.entry(placed.row.player_id).or_default() += 1;
                    }
                }
            }
        }

        let values: Vec<(PlayerId, RankValue)> = match query.kind {
            RankingKind::AvgPoints | RankingKind::AvgRank => averages
                .into_iter()
                .map(|(id, (sum, count))| (id, RankValue::Average(sum as f64 / count as f64)))
                .collect(),
            RankingKind::AvgLead => averages
                .into_iter()
                .map(|(id, (sum, count))| {
                    (id, RankValue::Average(sum as f64 / count as f64 / 1000.0))
                })
                .collect(),
            RankingKind::Score => totals
                .into_iter()
                .map(|(id, total)| (id, RankValue::Total(total)))
                .collect(),
            _ => counts
                .into_iter()
                .map(|(id, count)| (id, RankValue::Count(count)))
                .collect(),
        };

        self.finish(query, values)
    }

    /// Drops non-positive values where they carry no meaning, sorts best-first
    /// with ties alphabetical by name, and applies the page cap.
    fn finish(
        &self,
        query: &RankingQuery,
        values: Vec<(PlayerId, RankValue)>,
    ) -> Vec<RankingEntry> {
        let mut entries: Vec<RankingEntry> = values
            .into_iter()
            .filter(|(_, value)| query.kind.keeps_non_positive() || value.as_f64() > 0.0)
            .map(|(player_id, value)| RankingEntry {
                player_id,
                name: self.name_of(player_id),
                value,
            })
            .collect();

        let ascending = query.kind.ascending();
        entries.sort_by(|a, b| {
            let by_value = a
                .value
                .as_f64()
                .partial_cmp(&b.value.as_f64())
                .unwrap_or(Ordering::Equal);
            let by_value = if ascending { by_value } else { by_value.reverse() };
            by_value
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                .then_with(|| a.player_id.cmp(&b.player_id))
        });

        if !query.full {
            entries.truncate(PAGE_SIZE);
        }
        entries
    }

    fn name_of(&self, id: PlayerId) -> String {
        self.players
            .get(&id)
            .map(|player| player.display().to_string())
            .unwrap_or_else(|| format!("#{id}"))
    }
}

/// Re-derives dense and tie-aware positions for rows already in rank order.
fn rerank<'a>(rows: impl Iterator<Item = &'a Score>) -> Vec<Placed<'a>> {
    let mut placed: Vec<Placed<'a>> = Vec::new();
    for (rank, row) in rows.enumerate() {
        let tied_rank = match placed.last() {
            Some(prev) if prev.row.score <= row.score => prev.tied_rank,
            _ => rank,
        };
        placed.push(Placed {
            row,
            rank,
            tied_rank,
        });
    }
    placed
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds rows for one entity from `(player, score)` pairs in rank order.
    pub(crate) fn board(key: HighscoreableId, entries: &[(u64, i64)]) -> Vec<Score> {
        let mut rows: Vec<Score> = Vec::new();
        for (rank, (player, score)) in entries.iter().enumerate() {
            let tied_rank = match rows.last() {
                Some(prev) if prev.score == Millis(*score) => prev.tied_rank,
                _ => rank,
            };
            rows.push(Score {
                highscoreable: key,
                rank,
                tied_rank,
                score: Millis(*score),
                player_id: PlayerId(*player),
                replay_id: key.id as u64 * 100 + rank as u64,
                tab: key.tab(),
            });
        }
        rows
    }

    pub(crate) fn players(names: &[(u64, &str)]) -> HashMap<PlayerId, Player> {
        names
            .iter()
            .map(|(id, name)| (PlayerId(*id), Player::new(PlayerId(*id), *id as u32, *name)))
            .collect()
    }

    fn sample() -> Vec<Score> {
        let mut rows = board(HighscoreableId::level(0), &[(1, 100_000), (2, 100_000), (3, 90_000)]);
        rows.extend(board(HighscoreableId::level(1), &[(2, 80_000), (1, 70_000), (3, 60_000)]));
        rows.extend(board(HighscoreableId::episode(0), &[(3, 300_000), (1, 250_000)]));
        rows
    }

    fn values(entries: &[RankingEntry]) -> Vec<(u64, f64)> {
        entries.iter().map(|e| (e.player_id.0, e.value.as_f64())).collect()
    }

    #[test]
    fn test_rank_counts_zeroths_with_and_without_ties() {
        let rows = sample();
        let names = players(&[(1, "alice"), (2, "bob"), (3, "carol")]);
        let engine = RankingEngine::new(&rows, &names);

        let raw = engine.rank(&RankingQuery::new(RankingKind::Rank));
        assert_eq!(values(&raw), vec![(1, 1.0), (2, 1.0), (3, 1.0)]);

        let tied = engine.rank(&RankingQuery::new(RankingKind::Rank).ties(true));
        assert_eq!(values(&tied), vec![(2, 2.0), (1, 1.0), (3, 1.0)]);

        let extra = engine.rank(&RankingQuery::new(RankingKind::TiedRank));
        assert_eq!(values(&extra), vec![(2, 1.0)]);
    }

    #[test]
    fn test_points_sum_twenty_minus_position() {
        let rows = sample();
        let names = players(&[(1, "alice"), (2, "bob"), (3, "carol")]);
        let engine = RankingEngine::new(&rows, &names);

        let points = engine.rank(&RankingQuery::new(RankingKind::Points));
        // alice: 20 + 19 + 19, bob: 19 + 20, carol: 18 + 18 + 20
        assert_eq!(values(&points), vec![(1, 58.0), (3, 56.0), (2, 39.0)]);
    }

    #[test]
    fn test_averages_require_min_scores() {
        let rows = sample();
        let names = players(&[(1, "alice"), (2, "bob"), (3, "carol")]);
        let engine = RankingEngine::new(&rows, &names);

        // Default categories need 100 scores; nobody qualifies.
        assert!(engine.rank(&RankingQuery::new(RankingKind::AvgRank)).is_empty());

        // Story min_scores caps at 10; a story-only board with 10 entities qualifies.
        let mut story_rows = Vec::new();
        for id in 0..10 {
            story_rows.extend(board(HighscoreableId::story(id), &[(1, 500_000), (2, 400_000)]));
        }
        let engine = RankingEngine::new(&story_rows, &names);
        let avg = engine.rank(&RankingQuery::new(RankingKind::AvgRank).categories([Category::Story]));
        assert_eq!(values(&avg), vec![(1, 0.0), (2, 1.0)]);
    }

    #[test]
    fn test_avg_lead_averages_margin_over_first() {
        let rows = sample();
        let names = players(&[(1, "alice"), (2, "bob"), (3, "carol")]);
        let engine = RankingEngine::new(&rows, &names);

        let lead = engine.rank(&RankingQuery::new(RankingKind::AvgLead));
        // Level only by default: alice leads by 0 on level 0, bob by 10s on level 1.
        assert_eq!(values(&lead), vec![(2, 10.0), (1, 0.0)]);
    }

    #[test]
    fn test_score_and_singular() {
        let rows = sample();
        let names = players(&[(1, "alice"), (2, "bob"), (3, "carol")]);
        let engine = RankingEngine::new(&rows, &names);

        let totals = engine.rank(&RankingQuery::new(RankingKind::Score));
        assert_eq!(totals[0].player_id, PlayerId(2));
        assert_eq!(totals[0].value, RankValue::Total(Millis(180_000)));
        assert_eq!(totals[1].value, RankValue::Total(Millis(170_000)));

        let singular = engine.rank(&RankingQuery::new(RankingKind::Singular));
        assert_eq!(values(&singular), vec![(2, 1.0), (3, 1.0)]);
    }

    #[test]
    fn test_exclusion_rederives_positions() {
        let rows = sample();
        let names = players(&[(1, "alice"), (2, "bob"), (3, "carol")]);
        let engine = RankingEngine::new(&rows, &names);

        let query = RankingQuery::new(RankingKind::Rank).exclude([PlayerId(2)]);
        // Without bob, alice holds both level 0ths and carol the episode.
        assert_eq!(values(&engine.rank(&query)), vec![(1, 2.0), (3, 1.0)]);

        let query = RankingQuery::new(RankingKind::Points).exclude([PlayerId(1)]);
        // bob: 20 + 20, carol: 19 + 19 + 20
        assert_eq!(values(&engine.rank(&query)), vec![(3, 58.0), (2, 40.0)]);
    }

    #[test]
    fn test_equal_values_sort_by_name() {
        let rows = board(HighscoreableId::level(0), &[(1, 100_000), (2, 100_000), (3, 100_000)]);
        let names = players(&[(1, "zed"), (2, "Amy"), (3, "bo")]);
        let engine = RankingEngine::new(&rows, &names);

        let tied = engine.rank(&RankingQuery::new(RankingKind::Rank).ties(true));
        let order: Vec<_> = tied.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(order, vec!["Amy", "bo", "zed"]);
    }

    #[test]
    fn test_page_cap_and_full() {
        let mut rows = Vec::new();
        for player in 0..30u64 {
            rows.extend(board(HighscoreableId::level(player as u32), &[(player, 100_000)]));
        }
        let names = HashMap::new();
        let engine = RankingEngine::new(&rows, &names);

        assert_eq!(engine.rank(&RankingQuery::new(RankingKind::Rank)).len(), PAGE_SIZE);
        assert_eq!(engine.rank(&RankingQuery::new(RankingKind::Rank).full()).len(), 30);
    }
}
