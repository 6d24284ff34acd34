//! Remote score and replay retrieval.
//!
//! Every fetch is an explicit bounded loop over [`FetchOutcome`]s:
//!
//! - within one attempt, an "inactive credential" body rotates to the next
//!   ticket until a ticket repeats, which ends the fetch as
//!   [`FetchError::CredentialsExhausted`];
//! - transport failures, 5xx statuses and unparseable score lists are
//!   retryable and cost one attempt plus a fixed delay;
//! - anything else is terminal.
//!
//! The `fetch_*` wrappers log failures and return `None`, the `try_fetch_*`
//! variants hand the error to the caller for classification.

mod error;
#[cfg(feature = "http")]
mod http;
pub mod mock;
mod transport;

use std::collections::HashSet;
use std::sync::Arc;

use board_core::{HighscoreableId, RawScore};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::RetryPolicy;
use crate::session::SessionFailover;
use crate::shutdown::ShutdownSignal;

pub use error::{FetchError, Result};
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use mock::MockTransport;
pub use transport::{Request, ScoreTransport, TransportResponse};

/// Classification of a single attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    Ok(T),
    Retryable(FetchError),
    Terminal(FetchError),
}

/// Result of a replay download.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplayFetch {
    Payload(Vec<u8>),
    /// The service answered with an empty body: the replay no longer exists.
    Missing,
}

#[derive(Deserialize)]
struct RemoteScore {
    user_id: u32,
    user_name: String,
    score: i64,
    replay_id: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScoreList {
    Wrapped { scores: Vec<RemoteScore> },
    Bare(Vec<RemoteScore>),
}

/// Parses a score list body, bare or wrapped in `{"scores": [...]}`.
pub fn parse_scores(body: &[u8]) -> Result<Vec<RawScore>> {
    let list: ScoreList =
        serde_json::from_slice(body).map_err(|e| FetchError::Malformed(e.to_string()))?;
    let scores = match list {
        ScoreList::Wrapped { scores } | ScoreList::Bare(scores) => scores,
    };
    Ok(scores
        .into_iter()
        .map(|s| RawScore::new(s.user_id, s.user_name, s.score, s.replay_id))
        .collect())
}

pub struct RemoteFetcher {
    transport: Arc<dyn ScoreTransport>,
    session: Arc<SessionFailover>,
    retry: RetryPolicy,
    shutdown: ShutdownSignal,
}

impl RemoteFetcher {
    pub fn new(
        transport: Arc<dyn ScoreTransport>,
        session: Arc<SessionFailover>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            session,
            retry,
            shutdown: ShutdownSignal::never(),
        }
    }

    /// Makes retry sleeps return early with [`FetchError::Cancelled`].
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn session(&self) -> &Arc<SessionFailover> {
        &self.session
    }

    /// Score list of `key`, or `None` after logging the failure.
    pub async fn fetch_scores(&self, key: HighscoreableId) -> Option<Vec<RawScore>> {
        match self.try_fetch_scores(key).await {
            Ok(scores) => Some(scores),
            Err(e) => {
                warn!("Failed to fetch scores of {}: {}", key, e);
                None
            }
        }
    }

    pub async fn try_fetch_scores(&self, key: HighscoreableId) -> Result<Vec<RawScore>> {
        self.retrying(&Request::Scores(key), |body| match parse_scores(&body) {
            Ok(scores) => FetchOutcome::Ok(scores),
            Err(e) => FetchOutcome::Retryable(e),
        })
        .await
    }

    /// Replay payload, [`ReplayFetch::Missing`], or `None` after logging.
    pub async fn fetch_replay(&self, key: HighscoreableId, replay_id: u64) -> Option<ReplayFetch> {
        match self.try_fetch_replay(key, replay_id).await {
            Ok(fetch) => Some(fetch),
            Err(e) => {
                warn!("Failed to fetch {} replay {}: {}", key.category, replay_id, e);
                None
            }
        }
    }

    pub async fn try_fetch_replay(&self, key: HighscoreableId, replay_id: u64) -> Result<ReplayFetch> {
        let request = Request::Replay {
            category: key.category,
            replay_id,
        };
        self.retrying(&request, |body| {
            if body.is_empty() {
                FetchOutcome::Ok(ReplayFetch::Missing)
            } else {
                FetchOutcome::Ok(ReplayFetch::Payload(body))
            }
        })
        .await
    }

    async fn retrying<T>(
        &self,
        request: &Request,
        on_body: impl Fn(Vec<u8>) -> FetchOutcome<T>,
    ) -> Result<T> {
        let attempts = self.retry.attempts.max(1);
        for attempt in 1..=attempts {
            if self.shutdown.is_triggered() {
                return Err(FetchError::Cancelled);
            }

            match self.attempt(request, &on_body).await {
                FetchOutcome::Ok(value) => return Ok(value),
                FetchOutcome::Terminal(e) => return Err(e),
                FetchOutcome::Retryable(e) => {
                    debug!("{}: attempt {}/{} failed: {}", request, attempt, attempts, e);
                    if attempt < attempts {
                        tokio::select! {
                            _ = tokio::time::sleep(self.retry.delay) => {}
                            _ = self.shutdown.cancelled() => return Err(FetchError::Cancelled),
                        }
                    }
                }
            }
        }
        Err(FetchError::RetriesExhausted(attempts))
    }

    /// One attempt, rotating tickets while the service rejects them.
    async fn attempt<T>(
        &self,
        request: &Request,
        on_body: &impl Fn(Vec<u8>) -> FetchOutcome<T>,
    ) -> FetchOutcome<T> {
        let mut ticket = match self.session.acquire() {
            Ok(ticket) => ticket,
            Err(e) => return FetchOutcome::Terminal(e),
        };
        let mut seen = HashSet::new();

        loop {
            let response = match self.transport.send(request, &ticket).await {
                Ok(response) => response,
                Err(e) => return FetchOutcome::Retryable(e),
            };

            if !response.is_invalid_session() {
                return self.classify(&ticket, response, on_body);
            }

            debug!("{}: {}", request, FetchError::SessionExpired(ticket.clone()));
            self.session.invalidate(&ticket);
            seen.insert(ticket);
            match self.session.acquire() {
                Ok(next) if !seen.contains(&next) => ticket = next,
                _ => return FetchOutcome::Terminal(FetchError::CredentialsExhausted),
            }
        }
    }

    fn classify<T>(
        &self,
        ticket: &str,
        response: TransportResponse,
        on_body: &impl Fn(Vec<u8>) -> FetchOutcome<T>,
    ) -> FetchOutcome<T> {
        match response.status {
            200..=299 => {
                self.session.confirm(ticket);
                on_body(response.body)
            }
            404 => FetchOutcome::Terminal(FetchError::NotFound),
            429 | 500..=599 => FetchOutcome::Retryable(FetchError::UnexpectedStatus(response.status)),
            status => FetchOutcome::Terminal(FetchError::UnexpectedStatus(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrapped_and_bare_lists() {
        let wrapped = br#"{"scores":[{"user_id":1,"user_name":"a","score":90500,"replay_id":7,"rank":0}],"userInfo":null}"#;
        let bare = br#"[{"user_id":1,"user_name":"a","score":90500,"replay_id":7}]"#;

        let expected = vec![RawScore::new(1, "a", 90_500, 7)];
        assert_eq!(parse_scores(wrapped).unwrap(), expected);
        assert_eq!(parse_scores(bare).unwrap(), expected);
        assert!(matches!(parse_scores(b"<html>"), Err(FetchError::Malformed(_))));
    }
}
