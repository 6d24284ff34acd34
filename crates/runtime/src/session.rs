//! Rotation over the configured session credentials ("tickets").
//!
//! One ticket is active at a time. Invalidating it marks it bad and moves on
//! to the next ticket not yet marked; once every ticket is marked, `acquire`
//! reports exhaustion until a ticket is confirmed or the marks are reset.
//! Concurrent fetchers share one instance; invalidating a ticket that is no
//! longer active is a no-op, so two callers holding the same stale ticket
//! advance the rotation only once.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::fetch::{FetchError, Result};

#[derive(Debug)]
struct Rotation {
    tickets: Vec<String>,
    active: usize,
    bad: Vec<bool>,
}

#[derive(Debug)]
pub struct SessionFailover {
    rotation: Mutex<Rotation>,
}

impl SessionFailover {
    pub fn new(tickets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let tickets: Vec<String> = tickets.into_iter().map(Into::into).collect();
        let bad = vec![false; tickets.len()];
        Self {
            rotation: Mutex::new(Rotation {
                tickets,
                active: 0,
                bad,
            }),
        }
    }

    /// Starts the rotation at `ticket` if it is configured, e.g. the one that
    /// last worked before a restart.
    pub fn with_active(self, ticket: &str) -> Self {
        {
            let mut rotation = self.lock();
            if let Some(index) = rotation.tickets.iter().position(|t| t == ticket) {
                rotation.active = index;
            }
        }
        self
    }

    /// Returns the active ticket.
    pub fn acquire(&self) -> Result<String> {
        let rotation = self.lock();
        match rotation.tickets.get(rotation.active) {
            Some(ticket) if !rotation.bad[rotation.active] => Ok(ticket.clone()),
            _ => Err(FetchError::CredentialsExhausted),
        }
    }

    /// Marks `ticket` bad and advances to the next usable one.
    pub fn invalidate(&self, ticket: &str) {
        let mut rotation = self.lock();
        let active = rotation.active;
        if rotation.tickets.get(active).map(String::as_str) != Some(ticket) {
            debug!("Ticket already rotated away, ignoring invalidation");
            return;
        }
        rotation.bad[active] = true;

        let len = rotation.tickets.len();
        let next = (1..len)
            .map(|step| (active + step) % len)
            .find(|index| !rotation.bad[*index]);
        match next {
            Some(index) => {
                rotation.active = index;
                debug!("Rotated session ticket {} -> {}", active, index);
            }
            None => warn!("All {} session tickets are marked inactive", len),
        }
    }

    /// Records that `ticket` produced a valid response, clearing every mark.
    pub fn confirm(&self, ticket: &str) {
        let mut rotation = self.lock();
        if rotation.tickets.get(rotation.active).map(String::as_str) == Some(ticket) {
            rotation.bad.fill(false);
        }
    }

    /// Clears all marks, keeping the active ticket. Called once per cycle so
    /// an exhausted rotation gets another chance.
    pub fn reset(&self) {
        self.lock().bad.fill(false);
    }

    pub fn active(&self) -> Option<String> {
        let rotation = self.lock();
        rotation.tickets.get(rotation.active).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Rotation> {
        // The rotation holds no invariant a panicking holder could break.
        self.rotation.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_three_invalidations_exhaust_rotation() {
        let session = SessionFailover::new(["a", "b", "c"]);
        for expected in ["a", "b", "c"] {
            let ticket = session.acquire().unwrap();
            assert_eq!(ticket, expected);
            session.invalidate(&ticket);
        }
        assert_eq!(session.acquire(), Err(FetchError::CredentialsExhausted));

        session.reset();
        assert_eq!(session.acquire().unwrap(), "c");
    }

    #[test]
    fn test_stale_invalidation_is_ignored() {
        let session = SessionFailover::new(["a", "b", "c"]);
        session.invalidate("a");
        session.invalidate("a");
        assert_eq!(session.acquire().unwrap(), "b");
    }

    #[test]
    fn test_confirm_clears_marks() {
        let session = SessionFailover::new(["a", "b"]);
        session.invalidate("a");
        session.confirm("b");
        session.invalidate("b");
        assert_eq!(session.acquire().unwrap(), "a");
    }

    #[test]
    fn test_with_active_restores_position() {
        let session = SessionFailover::new(["a", "b", "c"]).with_active("c");
        assert_eq!(session.active().as_deref(), Some("c"));
        let session = SessionFailover::new(["a"]).with_active("zzz");
        assert_eq!(session.active().as_deref(), Some("a"));
    }

    #[test]
    fn test_empty_rotation_is_exhausted() {
        let session = SessionFailover::new(Vec::<String>::new());
        assert!(session.is_empty());
        assert_eq!(session.acquire(), Err(FetchError::CredentialsExhausted));
        session.invalidate("anything");
    }

    #[test]
    fn test_racing_invalidations_advance_once() {
        let session = Arc::new(SessionFailover::new(["a", "b", "c"]));
        let stale = session.acquire().unwrap();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let session = Arc::clone(&session);
                let stale = stale.clone();
                std::thread::spawn(move || session.invalidate(&stale))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(session.acquire().unwrap(), "b");
    }
}
