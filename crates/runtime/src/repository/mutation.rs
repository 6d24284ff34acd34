//! Store writes as values that can be checked, journaled and replayed.

use board_core::{Demo, DemoState, Highscoreable};
use serde::{Deserialize, Serialize};

use super::error::Result;
use super::snapshot::StoreSnapshot;
use super::types::{BoardCommit, CommitReceipt};

/// One write against a [`StoreSnapshot`].
///
/// `check` runs before anything is persisted and must reject every write
/// `apply` could not carry out; `apply` itself never fails.
pub trait Mutation: Clone + Into<JournalEntry> {
    type Output;

    /// Fails if the write cannot apply. `Ok(false)` means it would change
    /// nothing and needs no journal entry.
    fn check(&self, snapshot: &StoreSnapshot) -> Result<bool>;

    fn apply(self, snapshot: &mut StoreSnapshot) -> Self::Output;
}

/// Catalog entries to add; known keys are left alone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Register(pub Vec<Highscoreable>);

/// A demo update guarded by the state the writer last read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDemo {
    pub demo: Demo,
    pub expected: DemoState,
    pub framecount: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetProperty {
    pub key: String,
    pub value: String,
}

impl Mutation for BoardCommit {
    type Output = CommitReceipt;

    fn check(&self, snapshot: &StoreSnapshot) -> Result<bool> {
        snapshot.check_commit(self)?;
        Ok(true)
    }

    fn apply(self, snapshot: &mut StoreSnapshot) -> CommitReceipt {
        snapshot.apply_commit(self)
    }
}

impl Mutation for Register {
    type Output = usize;

    fn check(&self, snapshot: &StoreSnapshot) -> Result<bool> {
        Ok(self.0.iter().any(|entity| !snapshot.is_registered(entity.key)))
    }

    fn apply(self, snapshot: &mut StoreSnapshot) -> usize {
        snapshot.register(self.0)
    }
}

impl Mutation for SaveDemo {
    type Output = bool;

    fn check(&self, snapshot: &StoreSnapshot) -> Result<bool> {
        snapshot.check_demo(self.demo.id)?;
        Ok(snapshot.demo_state(self.demo.id) == self.expected)
    }

    fn apply(self, snapshot: &mut StoreSnapshot) -> bool {
        snapshot.save_demo(self.demo, self.expected, self.framecount)
    }
}

impl Mutation for SetProperty {
    type Output = ();

    fn check(&self, _snapshot: &StoreSnapshot) -> Result<bool> {
        Ok(true)
    }

    fn apply(self, snapshot: &mut StoreSnapshot) {
        snapshot.set_property(self.key, self.value);
    }
}

/// A mutation as recorded in the file store's journal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JournalEntry {
    Commit(BoardCommit),
    Register(Register),
    SaveDemo(SaveDemo),
    SetProperty(SetProperty),
}

impl JournalEntry {
    /// Re-applies a recorded write while reopening the store.
    pub fn replay(self, snapshot: &mut StoreSnapshot) {
        match self {
            Self::Commit(m) => {
                m.apply(snapshot);
            }
            Self::Register(m) => {
                m.apply(snapshot);
            }
            Self::SaveDemo(m) => {
                m.apply(snapshot);
            }
            Self::SetProperty(m) => m.apply(snapshot),
        }
    }
}

impl From<BoardCommit> for JournalEntry {
    fn from(m: BoardCommit) -> Self {
        Self::Commit(m)
    }
}

impl From<Register> for JournalEntry {
    fn from(m: Register) -> Self {
        Self::Register(m)
    }
}

impl From<SaveDemo> for JournalEntry {
    fn from(m: SaveDemo) -> Self {
        Self::SaveDemo(m)
    }
}

impl From<SetProperty> for JournalEntry {
    fn from(m: SetProperty) -> Self {
        Self::SetProperty(m)
    }
}
