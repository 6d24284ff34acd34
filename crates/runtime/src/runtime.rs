//! High-level runtime orchestrator.
//!
//! The runtime owns the background workers, wires the sync to the demo queue
//! and exposes a builder-based API for clients.

use std::sync::Arc;

use board_core::{CleaningRules, GlobalKey};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::catalog::catalog;
use crate::config::SyncConfig;
use crate::error::{Result, RuntimeError};
use crate::fetch::{RemoteFetcher, ScoreTransport};
use crate::handle::RuntimeHandle;
use crate::repository::Store;
use crate::schedule::Scheduler;
use crate::session::SessionFailover;
use crate::shutdown::{ShutdownTrigger, shutdown_channel};
use crate::workers::{DemoDownloader, DemoWorker, ScoreSync, SyncMetrics};

/// Main runtime that orchestrates score syncs and demo downloads
///
/// Runtime owns the workers; [`RuntimeHandle`] is the cloneable façade
/// handed to clients.
pub struct Runtime {
    handle: RuntimeHandle,
    trigger: ShutdownTrigger,
    workers: Vec<JoinHandle<()>>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Spawn the periodic score sync and demo backfill.
    pub fn start_schedules(&mut self) {
        let score_frequency = self.handle.config().score_frequency;
        let demo_frequency = self.handle.config().demo_frequency;
        let signal = self.trigger.signal();

        let scores = Scheduler::new(Arc::clone(self.handle.store()), signal.clone());
        let handle = self.handle.clone();
        self.workers.push(tokio::spawn(async move {
            scores
                .run(GlobalKey::NextScoreSync, score_frequency, || {
                    let handle = handle.clone();
                    async move {
                        handle.sync_pass().await;
                    }
                })
                .await;
        }));

        let demos = Scheduler::new(Arc::clone(self.handle.store()), signal);
        let handle = self.handle.clone();
        self.workers.push(tokio::spawn(async move {
            demos
                .run(GlobalKey::NextDemoSync, demo_frequency, || {
                    let handle = handle.clone();
                    async move {
                        if let Err(e) = handle.backfill_demos().await {
                            warn!("{}", e);
                        }
                    }
                })
                .await;
        }));

        info!("Schedules started");
    }

    /// Signal every worker to stop without waiting for them.
    pub fn trigger_shutdown(&self) {
        self.trigger.trigger();
    }

    /// Shutdown the runtime gracefully
    ///
    /// In-flight fetches return at their next retry; in-flight demo downloads
    /// are awaited.
    pub async fn shutdown(self) -> Result<()> {
        self.trigger.trigger();
        drop(self.handle);

        for worker in self.workers {
            worker.await.map_err(RuntimeError::WorkerJoin)?;
        }
        info!("Runtime stopped");
        Ok(())
    }
}

/// Builder for [`Runtime`].
pub struct RuntimeBuilder {
    config: SyncConfig,
    store: Option<Arc<dyn Store>>,
    transport: Option<Arc<dyn ScoreTransport>>,
    rules: CleaningRules,
    register_catalog: bool,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: SyncConfig::default(),
            store: None,
            transport: None,
            rules: CleaningRules::default(),
            register_catalog: true,
        }
    }

    /// Override sync configuration
    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the required store
    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the transport. Defaults to HTTP against the configured endpoint
    /// when the `http` feature is enabled.
    pub fn transport(mut self, transport: Arc<dyn ScoreTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn rules(mut self, rules: CleaningRules) -> Self {
        self.rules = rules;
        self
    }

    /// Whether to insert the static level/episode/story catalog into the
    /// store on build (default: true).
    pub fn register_catalog(mut self, register: bool) -> Self {
        self.register_catalog = register;
        self
    }

    #[cfg(feature = "http")]
    fn default_transport(config: &SyncConfig) -> Result<Arc<dyn ScoreTransport>> {
        let transport =
            crate::fetch::HttpTransport::new(&config.endpoint).map_err(RuntimeError::Transport)?;
        Ok(Arc::new(transport))
    }

    #[cfg(not(feature = "http"))]
    fn default_transport(_config: &SyncConfig) -> Result<Arc<dyn ScoreTransport>> {
        Err(RuntimeError::MissingComponent("transport"))
    }

    /// Build the runtime and spawn the demo worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> Result<Runtime> {
        let store = self.store.ok_or(RuntimeError::MissingComponent("store"))?;
        if self.config.tickets.is_empty() {
            return Err(RuntimeError::NoCredentials);
        }
        let transport = match self.transport {
            Some(transport) => transport,
            None => Self::default_transport(&self.config)?,
        };

        if self.register_catalog {
            let added = store.register(catalog(&self.config.categories))?;
            info!("Registered {} new highscoreables", added);
        }

        let (trigger, signal) = shutdown_channel();

        let mut session = SessionFailover::new(self.config.tickets.iter().cloned());
        if let Some(active) = store.property(GlobalKey::ActiveTicket)? {
            session = session.with_active(&active);
        }
        let fetcher = Arc::new(
            RemoteFetcher::new(transport, Arc::new(session), self.config.retry)
                .with_shutdown(signal.clone()),
        );
        let metrics = Arc::new(SyncMetrics::new());

        let (demo_tx, demo_rx) = mpsc::channel(self.config.demo_buffer_size);
        let downloader =
            DemoDownloader::new(Arc::clone(&fetcher), Arc::clone(&store), Arc::clone(&metrics));
        let demo_worker = DemoWorker::new(
            downloader.clone(),
            demo_rx,
            self.config.demo_concurrency,
            signal.clone(),
        );
        let demo_worker_handle = tokio::spawn(async move {
            demo_worker.run().await;
        });

        let sync = ScoreSync::new(
            fetcher,
            Arc::clone(&store),
            Arc::new(self.rules),
            Arc::clone(&metrics),
        )
        .with_demo_queue(demo_tx)
        .with_shutdown(signal.clone());

        let handle = RuntimeHandle::new(
            Arc::new(sync),
            downloader,
            store,
            metrics,
            Arc::new(self.config),
            signal,
        );

        Ok(Runtime {
            handle,
            trigger,
            workers: vec![demo_worker_handle],
        })
    }
}
