use crate::error::{BoardError, Result};
use crate::model::ArchiveId;

/// Lifecycle of a demo: `Pending -> Downloaded -> {Stored | Expired}`.
///
/// `Expired` is terminal and only reached when the remote service reports the
/// replay as nonexistent. A pending demo may also expire directly, since that
/// report arrives instead of a payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DemoState {
    #[default]
    Pending,
    Downloaded,
    Stored,
    Expired,
}

/// Replay payload paired 1:1 with an archive row.
///
/// `data` holds the storage encoding of the per-level input streams.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Demo {
    pub id: ArchiveId,
    pub state: DemoState,
    pub data: Option<Vec<u8>>,
    pub attempts: u32,
}

impl Demo {
    /// Creates the stub inserted alongside a new archive row.
    pub fn pending(id: ArchiveId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn is_expired(&self) -> bool {
        self.state == DemoState::Expired
    }

    pub fn is_pending(&self) -> bool {
        self.state == DemoState::Pending
    }

    /// Marks the raw payload as fetched.
    pub fn mark_downloaded(&mut self) -> Result<()> {
        self.transition(DemoState::Downloaded, &[DemoState::Pending])
    }

    /// Stores the encoded streams. Only valid after a download.
    pub fn store(&mut self, encoded: Vec<u8>) -> Result<()> {
        self.transition(DemoState::Stored, &[DemoState::Downloaded])?;
        self.data = Some(encoded);
        Ok(())
    }

    /// Marks the replay as gone from the remote service.
    pub fn expire(&mut self) -> Result<()> {
        self.transition(DemoState::Expired, &[DemoState::Pending, DemoState::Downloaded])
    }

    /// Returns a downloaded-but-unstored demo to pending, e.g. after a corrupt payload.
    pub fn reset(&mut self) -> Result<()> {
        self.transition(DemoState::Pending, &[DemoState::Downloaded])
    }

    fn transition(&mut self, to: DemoState, allowed_from: &[DemoState]) -> Result<()> {
        if !allowed_from.contains(&self.state) {
            return Err(BoardError::InvalidDemoTransition {
                id: self.id,
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_to_stored() {
        let mut demo = Demo::pending(ArchiveId(4));
        demo.mark_downloaded().unwrap();
        demo.store(vec![1, 2, 3]).unwrap();
        assert_eq!(demo.state, DemoState::Stored);
        assert_eq!(demo.data.as_deref(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_expired_is_terminal() {
        let mut demo = Demo::pending(ArchiveId(4));
        demo.expire().unwrap();
        assert!(demo.is_expired());
        assert!(demo.mark_downloaded().is_err());
        assert!(demo.expire().is_err());
        assert!(demo.store(vec![]).is_err());
    }

    #[test]
    fn test_store_requires_download() {
        let mut demo = Demo::pending(ArchiveId(4));
        let err = demo.store(vec![1]).unwrap_err();
        assert_eq!(
            err,
            BoardError::InvalidDemoTransition {
                id: ArchiveId(4),
                from: DemoState::Pending,
                to: DemoState::Stored,
            }
        );
        assert!(demo.data.is_none());
    }
}
