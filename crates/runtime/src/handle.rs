//! Cloneable façade over a running [`Runtime`](crate::Runtime).
//!
//! [`RuntimeHandle`] exposes on-demand syncs and backfills next to the
//! scheduled ones, plus the read side: rankings computed from the store.

use std::sync::Arc;

use board_core::{ArchiveId, HighscoreableId, RankingEngine, RankingEntry, RankingQuery};

use crate::config::SyncConfig;
use crate::error::{Result, RuntimeError, SyncError};
use crate::repository::{CommitReceipt, Store};
use crate::shutdown::ShutdownSignal;
use crate::workers::{
    BackfillSummary, DemoDownloader, DemoOutcome, MetricsSnapshot, PassSummary, ScoreSync,
    SyncMetrics,
};

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    sync: Arc<ScoreSync>,
    demos: DemoDownloader,
    store: Arc<dyn Store>,
    metrics: Arc<SyncMetrics>,
    config: Arc<SyncConfig>,
    shutdown: ShutdownSignal,
}

impl RuntimeHandle {
    pub(crate) fn new(
        sync: Arc<ScoreSync>,
        demos: DemoDownloader,
        store: Arc<dyn Store>,
        metrics: Arc<SyncMetrics>,
        config: Arc<SyncConfig>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            sync,
            demos,
            store,
            metrics,
            config,
            shutdown,
        }
    }

    /// Sync one entity right away.
    pub async fn sync_entity(&self, key: HighscoreableId) -> Result<CommitReceipt> {
        self.sync
            .sync_entity(key)
            .await
            .map_err(|source| RuntimeError::Sync { key, source })
    }

    /// Run a full pass over the configured categories.
    pub async fn sync_pass(&self) -> PassSummary {
        self.sync.sync_all(&self.config.categories).await
    }

    /// Download every pending demo.
    pub async fn backfill_demos(&self) -> Result<BackfillSummary> {
        self.demos
            .backfill(
                self.config.demo_attempt_limit,
                self.config.demo_concurrency,
                &self.shutdown,
            )
            .await
            .map_err(RuntimeError::Backfill)
    }

    /// Download a single demo, bypassing the queue.
    pub async fn download_demo(&self, id: ArchiveId) -> std::result::Result<DemoOutcome, SyncError> {
        self.demos.download(id).await
    }

    /// Runs `f` against a ranking engine over the current boards.
    pub fn with_engine<T>(&self, f: impl FnOnce(&RankingEngine<'_>) -> T) -> Result<T> {
        let scores = self.store.scores()?;
        let players = self.store.players()?;
        Ok(f(&RankingEngine::new(&scores, &players)))
    }

    pub fn rankings(&self, query: &RankingQuery) -> Result<Vec<RankingEntry>> {
        self.with_engine(|engine| engine.rank(query))
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }
}
