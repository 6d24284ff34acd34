//! Transport seam between the fetcher and the remote service.

use core::fmt;

use async_trait::async_trait;
use board_core::{Category, HighscoreableId};

use super::Result;
use crate::config::INVALID_SESSION_MARKER;

/// A request against the score service, without credentials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    Scores(HighscoreableId),
    Replay { category: Category, replay_id: u64 },
}

impl Request {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Scores(_) => "get_scores",
            Self::Replay { .. } => "get_replay",
        }
    }

    /// Query parameters specific to this request.
    ///
    /// Score lists are always requested as global boards (`qt=0`); replays
    /// carry the category's query type.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Scores(key) => vec![
                ("qt", "0".to_string()),
                (key.category.id_param(), key.id.to_string()),
            ],
            Self::Replay {
                category,
                replay_id,
            } => vec![
                ("qt", category.query_type().to_string()),
                ("replay_id", replay_id.to_string()),
            ],
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scores(key) => write!(f, "scores of {}", key),
            Self::Replay {
                category,
                replay_id,
            } => write!(f, "{} replay {}", category, replay_id),
        }
    }
}

/// Raw HTTP-level answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the body is the service's "inactive credential" marker.
    pub fn is_invalid_session(&self) -> bool {
        self.body == INVALID_SESSION_MARKER.as_bytes()
    }
}

/// Sends one request with one credential. Implementations do not retry.
#[async_trait]
pub trait ScoreTransport: Send + Sync {
    async fn send(&self, request: &Request, ticket: &str) -> Result<TransportResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parameters() {
        let scores = Request::Scores(HighscoreableId::episode(12));
        assert_eq!(scores.endpoint(), "get_scores");
        assert_eq!(
            scores.query(),
            vec![("qt", "0".to_string()), ("episode_id", "12".to_string())]
        );

        let replay = Request::Replay {
            category: Category::Story,
            replay_id: 99,
        };
        assert_eq!(replay.query()[0], ("qt", "4".to_string()));
        assert_eq!(replay.to_string(), "story replay 99");
    }

    #[test]
    fn test_invalid_marker_detection() {
        assert!(TransportResponse::new(200, "-1337").is_invalid_session());
        assert!(!TransportResponse::new(200, "-13370").is_invalid_session());
        assert!(!TransportResponse::new(502, "").is_success());
    }
}
