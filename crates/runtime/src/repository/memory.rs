use std::sync::RwLock;

use super::error::{RepositoryError, Result};
use super::mutation::Mutation;
use super::snapshot::{SnapshotBackend, StoreSnapshot};

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    snapshot: RwLock<StoreSnapshot>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }
}

impl SnapshotBackend for InMemoryStore {
    fn read<T>(&self, f: impl FnOnce(&StoreSnapshot) -> T) -> Result<T> {
        let snapshot = self
            .snapshot
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(f(&snapshot))
    }

    fn write<M: Mutation>(&self, mutation: M) -> Result<M::Output> {
        let mut snapshot = self
            .snapshot
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        mutation.check(&snapshot)?;
        Ok(mutation.apply(&mut snapshot))
    }
}
