use core::fmt;

use chrono::{DateTime, Utc};

use crate::category::{Category, Tab};
use crate::error::{BoardError, Result};
use crate::units::Millis;

/// Tagged reference to a scoreable entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HighscoreableId {
    pub category: Category,
    pub id: u32,
}

impl HighscoreableId {
    pub const fn new(category: Category, id: u32) -> Self {
        Self { category, id }
    }

    pub const fn level(id: u32) -> Self {
        Self::new(Category::Level, id)
    }

    pub const fn episode(id: u32) -> Self {
        Self::new(Category::Episode, id)
    }

    pub const fn story(id: u32) -> Self {
        Self::new(Category::Story, id)
    }

    pub fn tab(&self) -> Option<Tab> {
        self.category.tab_of(self.id)
    }

    pub fn ceiling(&self) -> Millis {
        self.category.ceiling(self.id)
    }

    /// Levels making up an episode or story, in order.
    pub fn levels(&self) -> Result<Vec<HighscoreableId>> {
        let count = self
            .category
            .child_levels()
            .ok_or(BoardError::NoChildLevels(self.category))?;
        let first = self.id * count;
        Ok((first..first + count).map(Self::level).collect())
    }
}

impl fmt::Display for HighscoreableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.id)
    }
}

/// Play mode of an entity.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    #[default]
    Solo,
    Coop,
    Race,
}

/// A scoreable entity and its denormalized sync state.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Highscoreable {
    pub key: HighscoreableId,
    pub name: String,
    pub tab: Option<Tab>,
    pub mode: Mode,
    pub last_synced: Option<DateTime<Utc>>,
    pub has_scores: bool,
}

impl Highscoreable {
    /// Creates an entity, deriving its tab from the id range.
    pub fn new(key: HighscoreableId, name: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            tab: key.tab(),
            mode: Mode::Solo,
            last_synced: None,
            has_scores: false,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}
