//! Scripted transport for tests and offline runs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{FetchError, Request, Result, ScoreTransport, TransportResponse};
use crate::config::INVALID_SESSION_MARKER;

#[derive(Debug)]
struct Reply {
    delay: Duration,
    result: Result<TransportResponse>,
}

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<Reply>,
    sent: Vec<(Request, String)>,
}

/// Answers requests from a queue of scripted replies, in order.
///
/// Clones share the same queue, so a test can keep one handle for
/// assertions while the fetcher owns another.
#[derive(Clone, Debug, Default)]
pub struct MockTransport {
    script: Arc<Mutex<Script>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: Result<TransportResponse>) -> &Self {
        self.push_delayed(Duration::ZERO, reply)
    }

    /// Queues a reply that arrives `delay` after its request was sent.
    pub fn push_delayed(&self, delay: Duration, reply: Result<TransportResponse>) -> &Self {
        self.with_script(|script| {
            script.replies.push_back(Reply {
                delay,
                result: reply,
            })
        });
        self
    }

    pub fn push_response(&self, status: u16, body: impl Into<Vec<u8>>) -> &Self {
        self.push(Ok(TransportResponse::new(status, body)))
    }

    pub fn push_invalid_session(&self) -> &Self {
        self.push_response(200, INVALID_SESSION_MARKER)
    }

    pub fn push_error(&self, error: FetchError) -> &Self {
        self.push(Err(error))
    }

    /// Requests seen so far with the ticket each was sent with.
    pub fn sent(&self) -> Vec<(Request, String)> {
        self.with_script(|script| script.sent.clone())
    }

    pub fn remaining(&self) -> usize {
        self.with_script(|script| script.replies.len())
    }

    fn with_script<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut script)
    }
}

#[async_trait]
impl ScoreTransport for MockTransport {
    async fn send(&self, request: &Request, ticket: &str) -> Result<TransportResponse> {
        let reply = self.with_script(|script| {
            script.sent.push((request.clone(), ticket.to_string()));
            script.replies.pop_front()
        });
        let Some(Reply { delay, result }) = reply else {
            return Err(FetchError::Transport("no scripted reply left".into()));
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}
