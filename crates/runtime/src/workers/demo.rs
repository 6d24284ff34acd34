//! Demo download worker.
//!
//! Archives created by a sync are queued here and downloaded in the
//! background, bounded by a semaphore. A periodic backfill picks up whatever
//! is still pending, e.g. after a restart or a failed download.
//!
//! # Demo lifecycle
//!
//! ```text
//! Pending -> Downloaded -> Stored
//!    |  ^        |
//!    |  +--------+  (corrupt payload, retried later)
//!    v
//! Expired          (the service no longer has the replay)
//! ```
//!
//! The queue and the backfill may both pick up the same demo. A demo is
//! claimed while a download of it runs, and its store write only lands if the
//! stored demo is still pending.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use board_core::{Archive, ArchiveId, Demo, DemoState};
use replay::{ReplayKind, Transcoded};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::metrics::SyncMetrics;
use super::store_call;
use crate::error::SyncError;
use crate::fetch::{FetchError, RemoteFetcher, ReplayFetch};
use crate::repository::{RepositoryError, Store};
use crate::shutdown::ShutdownSignal;

/// What happened to one demo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemoOutcome {
    Stored { framecount: u32 },
    Expired,
    /// The demo had already left the pending state, or another download of
    /// it was running.
    Skipped,
}

/// Outcome of one backfill run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackfillSummary {
    pub pending: usize,
    pub stored: usize,
    pub expired: usize,
    /// Demos still pending after exhausting their attempts.
    pub failed: usize,
}

/// Archives with a download in flight, shared by every clone of a
/// [`DemoDownloader`].
#[derive(Clone, Debug, Default)]
struct Claims(Arc<Mutex<HashSet<ArchiveId>>>);

impl Claims {
    fn claim(&self, id: ArchiveId) -> Option<Claim> {
        let mut claimed = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        claimed.insert(id).then(|| Claim {
            claims: self.clone(),
            id,
        })
    }
}

/// Releases its archive on drop.
struct Claim {
    claims: Claims,
    id: ArchiveId,
}

impl Drop for Claim {
    fn drop(&mut self) {
        let mut claimed = self
            .claims
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        claimed.remove(&self.id);
    }
}

/// Downloads, validates and stores single demos.
#[derive(Clone)]
pub struct DemoDownloader {
    fetcher: Arc<RemoteFetcher>,
    store: Arc<dyn Store>,
    metrics: Arc<SyncMetrics>,
    claims: Claims,
}

impl DemoDownloader {
    pub fn new(fetcher: Arc<RemoteFetcher>, store: Arc<dyn Store>, metrics: Arc<SyncMetrics>) -> Self {
        Self {
            fetcher,
            store,
            metrics,
            claims: Claims::default(),
        }
    }

    /// Downloads the demo of archive `id`.
    ///
    /// A corrupt payload puts the demo back to pending; only an explicit
    /// not-found from the service expires it. Returns
    /// [`DemoOutcome::Skipped`] when the demo is already being downloaded or
    /// was resolved by someone else in the meantime.
    pub async fn download(&self, id: ArchiveId) -> Result<DemoOutcome, SyncError> {
        let Some(_claim) = self.claims.claim(id) else {
            debug!("Demo of archive {} already downloading", id);
            return Ok(DemoOutcome::Skipped);
        };
        let archive = self
            .store
            .archive(id)?
            .ok_or(RepositoryError::ArchiveNotFound(id))?;
        let mut demo = self.store.demo(id)?.unwrap_or_else(|| Demo::pending(id));
        if !demo.is_pending() {
            return Ok(DemoOutcome::Skipped);
        }
        demo.attempts += 1;

        let fetched = self
            .fetcher
            .try_fetch_replay(archive.highscoreable, archive.replay_id)
            .await;

        let payload = match fetched {
            Ok(ReplayFetch::Payload(payload)) => payload,
            Ok(ReplayFetch::Missing) | Err(FetchError::NotFound) => {
                demo.expire()?;
                if !self.save(demo, None).await? {
                    return Ok(DemoOutcome::Skipped);
                }
                self.metrics.record_demo_expired();
                debug!("Demo of archive {} expired", id);
                return Ok(DemoOutcome::Expired);
            }
            Err(e) => {
                if !self.save(demo, None).await? {
                    return Ok(DemoOutcome::Skipped);
                }
                self.metrics.record_demo_failure();
                return Err(e.into());
            }
        };

        demo.mark_downloaded()?;
        match transcode_checked(&payload, &archive) {
            Ok(transcoded) => {
                let framecount = transcoded.framecount;
                demo.store(transcoded.encoded)?;
                if !self.save(demo, Some(framecount)).await? {
                    return Ok(DemoOutcome::Skipped);
                }
                self.metrics.record_demo_stored();
                debug!("Stored demo of archive {} ({} frames)", id, framecount);
                Ok(DemoOutcome::Stored { framecount })
            }
            Err(e) => {
                demo.reset()?;
                if !self.save(demo, None).await? {
                    return Ok(DemoOutcome::Skipped);
                }
                self.metrics.record_demo_failure();
                Err(e.into())
            }
        }
    }

    /// Writes `demo` unless the stored one left the pending state since it
    /// was read.
    async fn save(&self, demo: Demo, framecount: Option<u32>) -> Result<bool, SyncError> {
        let id = demo.id;
        let saved = store_call(&self.store, move |store| {
            store.save_demo(demo, DemoState::Pending, framecount)
        })
        .await?;
        if !saved {
            debug!("Demo of archive {} was resolved elsewhere", id);
        }
        Ok(saved)
    }

    /// Downloads every pending demo, retrying each up to `attempt_limit`
    /// times with at most `concurrency` downloads in flight.
    pub async fn backfill(
        &self,
        attempt_limit: u32,
        concurrency: usize,
        shutdown: &ShutdownSignal,
    ) -> Result<BackfillSummary, SyncError> {
        let pending = self.store.pending_demos()?;
        let mut summary = BackfillSummary {
            pending: pending.len(),
            ..Default::default()
        };
        info!("Backfilling {} pending demos", pending.len());

        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for demo in pending {
            let downloader = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let shutdown = shutdown.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                downloader
                    .download_with_retries(demo.id, attempt_limit, &shutdown)
                    .await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(DemoOutcome::Stored { .. })) => summary.stored += 1,
                Ok(Some(DemoOutcome::Expired)) => summary.expired += 1,
                Ok(Some(DemoOutcome::Skipped)) => {}
                Ok(None) => summary.failed += 1,
                Err(e) => {
                    error!("Demo task failed: {}", e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Backfill finished: {} stored, {} expired, {} still pending",
            summary.stored, summary.expired, summary.failed
        );
        Ok(summary)
    }

    async fn download_with_retries(
        &self,
        id: ArchiveId,
        attempt_limit: u32,
        shutdown: &ShutdownSignal,
    ) -> Option<DemoOutcome> {
        for attempt in 1..=attempt_limit {
            if shutdown.is_triggered() {
                return None;
            }
            match self.download(id).await {
                Ok(outcome) => return Some(outcome),
                Err(SyncError::Cancelled) => return None,
                Err(e) => debug!("Demo of archive {} attempt {} failed: {}", id, attempt, e),
            }
        }
        warn!(
            "Giving up on demo of archive {} after {} attempts",
            id, attempt_limit
        );
        None
    }
}

/// Decodes the payload and checks it belongs to `archive`.
fn transcode_checked(payload: &[u8], archive: &Archive) -> replay::Result<Transcoded> {
    let kind = ReplayKind::from(archive.highscoreable.category);
    let transcoded = replay::transcode(payload, kind)?;
    transcoded
        .header
        .expect(kind, archive.replay_id, archive.metanet_id)?;
    Ok(transcoded)
}

/// Background worker draining the queue of freshly created archives.
pub struct DemoWorker {
    downloader: DemoDownloader,
    rx: mpsc::Receiver<ArchiveId>,
    semaphore: Arc<Semaphore>,
    shutdown: ShutdownSignal,
}

impl DemoWorker {
    pub fn new(
        downloader: DemoDownloader,
        rx: mpsc::Receiver<ArchiveId>,
        concurrency: usize,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            downloader,
            rx,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            shutdown,
        }
    }

    /// Main worker loop. Returns once the queue closes or shutdown is
    /// triggered, after in-flight downloads finished.
    pub async fn run(mut self) {
        info!("DemoWorker started");
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                job = self.rx.recv() => {
                    let Some(id) = job else { break };
                    let downloader = self.downloader.clone();
                    let semaphore = Arc::clone(&self.semaphore);
                    tasks.spawn(async move {
                        let Ok(_permit) = semaphore.acquire_owned().await else {
                            return;
                        };
                        if let Err(e) = downloader.download(id).await {
                            warn!("Demo of archive {} not stored: {}", id, e);
                        }
                    });
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!("Demo task failed: {}", e);
                    }
                }
                _ = self.shutdown.cancelled() => break,
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("Demo task failed: {}", e);
            }
        }
        info!("DemoWorker stopped");
    }
}
