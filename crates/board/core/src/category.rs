//! Highscoreable categories and their constant tables.
//!
//! Every cleaning and ranking rule dispatches on [`Category`] plus the static
//! tab table below: id ranges, score ceilings and the minimum score counts used
//! by averaged rankings.

use crate::units::Millis;

/// Number of ranked slots on every board.
pub const PAGE_SIZE: usize = 20;

/// Minimum number of players sharing the 0th for an entity to count in ties.
pub const MIN_TIES: usize = 3;

/// Global cap applied to [`min_scores`].
pub const MAX_MIN_SCORES: u32 = 100;

/// Categories ranked when a query does not name any.
pub const DEFAULT_RANKED: [Category; 2] = [Category::Level, Category::Episode];

/// Kind of scoreable entity.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Category {
    Level,
    Episode,
    Story,
    Userlevel,
}

impl Category {
    /// Query-type discriminator sent to the remote service for replay requests.
    pub const fn query_type(self) -> u32 {
        match self {
            Self::Level | Self::Userlevel => 0,
            Self::Episode => 1,
            Self::Story => 4,
        }
    }

    /// Name of the id parameter in remote requests.
    pub const fn id_param(self) -> &'static str {
        match self {
            Self::Level | Self::Userlevel => "level_id",
            Self::Episode => "episode_id",
            Self::Story => "story_id",
        }
    }

    /// Number of level blocks a replay of this category carries.
    pub const fn block_count(self) -> usize {
        match self {
            Self::Level | Self::Userlevel => 1,
            Self::Episode => 5,
            Self::Story => 25,
        }
    }

    /// Upper bound for this category's contribution to [`min_scores`].
    pub const fn min_scores_cap(self) -> u32 {
        match self {
            Self::Level => 100,
            Self::Episode => 50,
            Self::Story => 10,
            Self::Userlevel => 0,
        }
    }

    /// Child levels per entity, for categories composed of levels.
    pub const fn child_levels(self) -> Option<u32> {
        match self {
            Self::Episode => Some(5),
            Self::Story => Some(25),
            Self::Level | Self::Userlevel => None,
        }
    }

    /// Static tab table for this category. Userlevels have none.
    pub const fn tabs(self) -> &'static [TabInfo] {
        match self {
            Self::Level => LEVEL_TABS,
            Self::Episode => EPISODE_TABS,
            Self::Story => STORY_TABS,
            Self::Userlevel => &[],
        }
    }

    /// Looks up the tab entry whose id range contains `id`.
    pub fn tab_info(self, id: u32) -> Option<&'static TabInfo> {
        self.tabs().iter().find(|info| info.contains(id))
    }

    pub fn tab_of(self, id: u32) -> Option<Tab> {
        self.tab_info(id).map(|info| info.tab)
    }

    /// Score ceiling in seconds for entity `id`.
    ///
    /// Ids outside every tab fall back to the largest ceiling of the category.
    /// Userlevels are unbounded.
    pub fn ceiling_secs(self, id: u32) -> u32 {
        if self == Self::Userlevel {
            return u32::MAX;
        }
        match self.tab_info(id) {
            Some(info) => info.ceiling_secs,
            None => self
                .tabs()
                .iter()
                .map(|info| info.ceiling_secs)
                .max()
                .unwrap_or(u32::MAX),
        }
    }

    /// Score ceiling for entity `id` in milli-units.
    pub fn ceiling(self, id: u32) -> Millis {
        Millis::from_secs(i64::from(self.ceiling_secs(id)))
    }
}

/// Game tab (the in-game grouping of levels).
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tab {
    /// Intro
    Si,
    /// Main (N++)
    S,
    /// Legacy
    Sl,
    /// Secret
    Ss,
    /// Ultimate
    Su,
    /// Ultimate secret
    Ss2,
}

/// One row of the tab table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TabInfo {
    pub tab: Tab,
    pub first_id: u32,
    pub last_id: u32,
    pub ceiling_secs: u32,
    pub min_scores: u32,
}

impl TabInfo {
    const fn new(tab: Tab, first_id: u32, last_id: u32, ceiling_secs: u32, min_scores: u32) -> Self {
        Self {
            tab,
            first_id,
            last_id,
            ceiling_secs,
            min_scores,
        }
    }

    pub const fn contains(&self, id: u32) -> bool {
        id >= self.first_id && id <= self.last_id
    }
}

const LEVEL_TABS: &[TabInfo] = &[
    TabInfo::new(Tab::Si, 0, 124, 298, 25),
    TabInfo::new(Tab::S, 600, 1199, 874, 50),
    TabInfo::new(Tab::Sl, 1200, 1799, 400, 50),
    TabInfo::new(Tab::Ss, 1800, 1919, 2462, 25),
    TabInfo::new(Tab::Su, 2400, 2999, 530, 50),
    TabInfo::new(Tab::Ss2, 3000, 3119, 322, 25),
];

const EPISODE_TABS: &[TabInfo] = &[
    TabInfo::new(Tab::Si, 0, 24, 400, 5),
    TabInfo::new(Tab::S, 120, 239, 950, 25),
    TabInfo::new(Tab::Sl, 240, 359, 650, 25),
    TabInfo::new(Tab::Su, 480, 599, 650, 25),
];

const STORY_TABS: &[TabInfo] = &[
    TabInfo::new(Tab::Si, 0, 4, 1000, 1),
    TabInfo::new(Tab::S, 24, 43, 2000, 5),
    TabInfo::new(Tab::Sl, 48, 67, 2000, 5),
    TabInfo::new(Tab::Su, 96, 115, 1500, 5),
];

/// Minimum number of scores a player needs to appear in averaged rankings.
///
/// Each category contributes the summed `min_scores` of the selected tabs (all
/// tabs when `tabs` is empty), capped by [`Category::min_scores_cap`]; the total
/// is capped by [`MAX_MIN_SCORES`].
pub fn min_scores(categories: &[Category], tabs: &[Tab]) -> u32 {
    let categories: &[Category] = if categories.is_empty() {
        &DEFAULT_RANKED
    } else {
        categories
    };

    let total: u32 = categories
        .iter()
        .map(|category| {
            let sum: u32 = category
                .tabs()
                .iter()
                .filter(|info| tabs.is_empty() || tabs.contains(&info.tab))
                .map(|info| info.min_scores)
                .sum();
            sum.min(category.min_scores_cap())
        })
        .sum();

    total.min(MAX_MIN_SCORES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_tab_lookup_by_id_range() {
        assert_eq!(Category::Level.tab_of(0), Some(Tab::Si));
        assert_eq!(Category::Level.tab_of(1919), Some(Tab::Ss));
        assert_eq!(Category::Level.tab_of(2000), None);
        assert_eq!(Category::Episode.tab_of(130), Some(Tab::S));
        assert_eq!(Category::Story.tab_of(100), Some(Tab::Su));
        assert_eq!(Category::Userlevel.tab_of(5), None);
    }

    #[test]
    fn test_ceiling_falls_back_to_category_max() {
        assert_eq!(Category::Level.ceiling_secs(3000), 322);
        assert_eq!(Category::Level.ceiling_secs(2000), 2462);
        assert_eq!(Category::Episode.ceiling(0), Millis(400_000));
        assert_eq!(Category::Userlevel.ceiling_secs(1), u32::MAX);
    }

    #[test]
    fn test_min_scores_caps_per_category_and_globally() {
        // Level tabs sum to 225 -> capped at 100, episodes sum to 80 -> 50.
        assert_eq!(min_scores(&[Category::Level], &[]), 100);
        assert_eq!(min_scores(&[Category::Episode], &[]), 50);
        assert_eq!(min_scores(&[Category::Level, Category::Episode], &[]), 100);
        assert_eq!(min_scores(&[Category::Level], &[Tab::Si]), 25);
        assert_eq!(min_scores(&[Category::Level, Category::Episode], &[Tab::Si]), 30);
        assert_eq!(min_scores(&[Category::Story], &[]), 10);
    }

    #[test]
    fn test_names_parse_case_insensitively() {
        assert_eq!(Category::from_str("Episode").unwrap(), Category::Episode);
        assert_eq!(Tab::from_str("ss2").unwrap(), Tab::Ss2);
        assert_eq!(Tab::Ss2.to_string(), "SS2");
        assert_eq!(Category::Story.as_ref(), "story");
    }
}
