//! Subcommand implementations.

use std::sync::Arc;

use anyhow::{Context, Result};
use board_content::RulesLoader;
use board_core::{Category, HighscoreableId, RankValue, RankingEngine, RankingQuery};
use runtime::repository::BoardRepository;
use runtime::{FileStore, Runtime};
use tracing::info;

use crate::config::ClientConfig;

fn build_runtime(config: ClientConfig) -> Result<(Runtime, Arc<FileStore>)> {
    let store = FileStore::open(&config.data_dir)
        .with_context(|| format!("Failed to open store in {}", config.data_dir.display()))?;
    let store = Arc::new(store);
    let rules = RulesLoader::load_or_embedded(config.sync.rules_path.as_deref())?;

    let runtime = Runtime::builder()
        .config(config.sync)
        .store(store.clone())
        .rules(rules)
        .build()
        .context("Failed to build runtime")?;
    Ok((runtime, store))
}

/// Stops the runtime and folds the store's journal into its snapshot.
async fn finish(runtime: Runtime, store: Arc<FileStore>) -> Result<()> {
    runtime.shutdown().await?;
    tokio::task::spawn_blocking(move || store.compact())
        .await?
        .context("Failed to compact store")
}

pub async fn run(config: ClientConfig) -> Result<()> {
    let (mut runtime, store) = build_runtime(config)?;
    runtime.start_schedules();

    tokio::signal::ctrl_c().await?;
    info!("Interrupted, shutting down");
    finish(runtime, store).await
}

pub async fn sync(mut config: ClientConfig, category: Option<Category>, id: Option<u32>) -> Result<()> {
    if let Some(category) = category {
        config.sync.categories = vec![category];
    }
    let (runtime, store) = build_runtime(config)?;
    let handle = runtime.handle();

    match category.zip(id) {
        Some((category, id)) => {
            let key = HighscoreableId::new(category, id);
            let receipt = handle.sync_entity(key).await?;
            println!(
                "{}: {} new archives, {} new players, {} flagged",
                key,
                receipt.new_archives.len(),
                receipt.new_players,
                receipt.flagged
            );
        }
        None => {
            let summary = handle.sync_pass().await;
            println!(
                "{} synced, {} failed, {} new archives",
                summary.synced, summary.failed, summary.new_archives
            );
        }
    }

    println!("{}", handle.metrics());
    finish(runtime, store).await
}

pub async fn backfill(config: ClientConfig) -> Result<()> {
    let (runtime, store) = build_runtime(config)?;
    let summary = runtime.handle().backfill_demos().await?;
    println!(
        "{} pending: {} stored, {} expired, {} still pending",
        summary.pending, summary.stored, summary.expired, summary.failed
    );
    finish(runtime, store).await
}

pub fn rank(config: &ClientConfig, query: RankingQuery) -> Result<()> {
    let store = FileStore::open(&config.data_dir)?;
    let scores = store.scores()?;
    let players = store.players()?;

    let entries = RankingEngine::new(&scores, &players).rank(&query);
    if entries.is_empty() {
        println!("No players ranked");
    }
    for (position, entry) in entries.iter().enumerate() {
        println!("{:>3} {:<24} {}", position, entry.name, format_value(entry.value));
    }
    Ok(())
}

fn format_value(value: RankValue) -> String {
    match value {
        RankValue::Count(count) => count.to_string(),
        RankValue::Average(average) => format!("{:.3}", average),
        RankValue::Total(total) => total.to_string(),
    }
}
