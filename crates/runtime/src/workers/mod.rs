//! Worker tasks that back the runtime orchestration.
//!
//! The score sync walks the boards and commits their diffs, while the demo
//! worker downloads the replays of newly archived runs in the background.

mod demo;
mod metrics;
mod sync;

use std::sync::Arc;

use crate::error::SyncError;
use crate::repository::{self, Store};

pub use demo::{BackfillSummary, DemoDownloader, DemoOutcome, DemoWorker};
pub use metrics::{MetricsSnapshot, SyncMetrics};
pub use sync::{PassSummary, ScoreSync};

/// Runs a store write on the blocking pool, keeping file I/O off the async
/// worker threads.
pub(crate) async fn store_call<T, F>(store: &Arc<dyn Store>, f: F) -> Result<T, SyncError>
where
    T: Send + 'static,
    F: FnOnce(&dyn Store) -> repository::Result<T> + Send + 'static,
{
    let store = Arc::clone(store);
    let value = tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(SyncError::StoreTask)??;
    Ok(value)
}
