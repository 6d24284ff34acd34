//! Score sync runtime for the leaderboard.
//!
//! This crate wires the remote fetcher, the session failover, the store and
//! the worker tasks into a runtime that keeps the local boards in step with
//! the remote score service. Consumers embed [`Runtime`] to schedule syncs and
//! query rankings through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`fetch`] and [`session`] talk to the remote service
//! - [`differ`] turns cleaned boards into store commits
//! - [`repository`] provides the persisted entity store
//! - [`schedule`] keeps the periodic jobs on their cadence
//! - [`workers`] keeps background tasks internal to the crate
pub mod catalog;
pub mod config;
pub mod differ;
pub mod error;
pub mod fetch;
pub mod handle;
pub mod repository;
pub mod runtime;
pub mod schedule;
pub mod session;
pub mod shutdown;

mod workers;

pub use catalog::catalog;
pub use config::{EndpointConfig, RetryPolicy, SyncConfig};
pub use differ::ArchiveDiffer;
pub use error::{Result, RuntimeError, SyncError};
pub use fetch::{FetchError, RemoteFetcher, ReplayFetch, ScoreTransport};
pub use handle::RuntimeHandle;
pub use repository::{FileStore, InMemoryStore, RepositoryError, Store};
pub use runtime::{Runtime, RuntimeBuilder};
pub use schedule::{Scheduler, correct_time};
pub use session::SessionFailover;
pub use shutdown::{ShutdownSignal, ShutdownTrigger, shutdown_channel};
pub use workers::{
    BackfillSummary, DemoDownloader, DemoOutcome, DemoWorker, MetricsSnapshot, PassSummary,
    ScoreSync, SyncMetrics,
};
