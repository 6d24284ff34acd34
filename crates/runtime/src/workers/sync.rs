//! Score sync worker.
//!
//! One pass walks every registered highscoreable of the configured
//! categories, fetches its top-20, cleans it and commits the diff. A failure
//! is contained to the entity it happened on: it is logged, counted and the
//! pass moves on to the next entity.

use std::sync::Arc;

use board_core::{ArchiveId, Category, CleaningRules, GlobalKey, HighscoreableId, ScoreCleaner};
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::metrics::SyncMetrics;
use super::store_call;
use crate::differ::ArchiveDiffer;
use crate::error::SyncError;
use crate::fetch::RemoteFetcher;
use crate::repository::{CommitReceipt, Store};
use crate::shutdown::ShutdownSignal;

/// Outcome of one sync pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub synced: usize,
    pub failed: usize,
    pub new_archives: usize,
    /// Set when shutdown cut the pass short.
    pub interrupted: bool,
}

/// Fetches, cleans and commits boards.
pub struct ScoreSync {
    fetcher: Arc<RemoteFetcher>,
    store: Arc<dyn Store>,
    rules: Arc<CleaningRules>,
    metrics: Arc<SyncMetrics>,
    demo_tx: Option<mpsc::Sender<ArchiveId>>,
    shutdown: ShutdownSignal,
}

impl ScoreSync {
    pub fn new(
        fetcher: Arc<RemoteFetcher>,
        store: Arc<dyn Store>,
        rules: Arc<CleaningRules>,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        Self {
            fetcher,
            store,
            rules,
            metrics,
            demo_tx: None,
            shutdown: ShutdownSignal::never(),
        }
    }

    /// Queue archives created by a commit for demo download.
    pub fn with_demo_queue(mut self, demo_tx: mpsc::Sender<ArchiveId>) -> Self {
        self.demo_tx = Some(demo_tx);
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Syncs a single entity.
    ///
    /// Nothing is written unless the fetch succeeded and the whole commit
    /// went through; new archives are queued for download only afterwards.
    pub async fn sync_entity(&self, key: HighscoreableId) -> Result<CommitReceipt, SyncError> {
        let raw = self.fetcher.try_fetch_scores(key).await?;
        let cleaned = ScoreCleaner::new(&self.rules).clean(key, raw);
        let now = Utc::now();
        let receipt = store_call(&self.store, move |store| {
            ArchiveDiffer::new(store).apply(key, cleaned, now)
        })
        .await?;

        self.metrics
            .record_entity(receipt.new_archives.len(), receipt.new_players);
        self.queue_demos(&receipt.new_archives).await;
        Ok(receipt)
    }

    /// Syncs every registered entity of `categories`.
    pub async fn sync_all(&self, categories: &[Category]) -> PassSummary {
        let mut summary = PassSummary::default();
        self.fetcher.session().reset();
        info!("Starting score sync of {:?}", categories);

        'categories: for &category in categories {
            let entities = match self.store.highscoreables(category) {
                Ok(entities) => entities,
                Err(e) => {
                    warn!("Failed to list {} entities: {}", category, e);
                    continue;
                }
            };

            for entity in entities {
                if self.shutdown.is_triggered() {
                    summary.interrupted = true;
                    break 'categories;
                }

                match self.sync_entity(entity.key).await {
                    Ok(receipt) => {
                        summary.synced += 1;
                        summary.new_archives += receipt.new_archives.len();
                    }
                    Err(SyncError::Cancelled) => {
                        summary.interrupted = true;
                        break 'categories;
                    }
                    Err(e) => {
                        warn!("Skipping {}: {}", entity.key, e);
                        self.metrics.record_entity_failure();
                        summary.failed += 1;
                    }
                }
            }
        }

        if let Some(ticket) = self.fetcher.session().active()
            && let Err(e) = store_call(&self.store, move |store| {
                store.set_property(GlobalKey::ActiveTicket, ticket)
            })
            .await
        {
            warn!("Failed to remember active ticket: {}", e);
        }

        self.metrics.record_pass();
        info!(
            "Score sync finished: {} synced, {} failed, {} new archives",
            summary.synced, summary.failed, summary.new_archives
        );
        summary
    }

    async fn queue_demos(&self, archives: &[ArchiveId]) {
        let Some(tx) = &self.demo_tx else {
            return;
        };
        for &id in archives {
            if tx.send(id).await.is_err() {
                debug!("Demo worker gone, archive {} left for backfill", id);
                return;
            }
        }
    }
}
