//! Leaderboard sync binary.
//!
//! Composition root: loads configuration, opens the file store, loads the
//! cleaning rules and drives the runtime from one of the subcommands.
//!
//! ```bash
//! # Keep syncing on schedule until Ctrl-C
//! LEADERBOARD_TICKETS=ticket1,ticket2 leaderboard run
//!
//! # One pass over episodes only
//! leaderboard sync --category episode
//!
//! # Top-5 counts over levels and episodes, ties counted
//! leaderboard rank rank --top 4 --ties
//! ```

mod commands;
mod config;
mod dirs;
mod logging;

use anyhow::Result;
use board_core::{Category, RankingKind, Tab};
use clap::{Args, Parser, Subcommand};

use config::ClientConfig;

/// Keeps local leaderboards in sync with the remote score service
#[derive(Parser)]
#[command(name = "leaderboard", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run score syncs and demo backfills on their schedule (default)
    Run,

    /// Sync once, optionally limited to one category or one entity
    Sync {
        #[arg(long)]
        category: Option<Category>,

        /// Entity id within the category
        #[arg(long, requires = "category")]
        id: Option<u32>,
    },

    /// Download every pending demo
    Backfill,

    /// Print a player ranking from the local store
    Rank(RankArgs),
}

#[derive(Args)]
struct RankArgs {
    /// rank, tied_rank, points, avg_points, avg_rank, avg_lead, score, singular, maxed, maxable
    kind: RankingKind,

    #[arg(long = "category")]
    categories: Vec<Category>,

    #[arg(long = "tab")]
    tabs: Vec<Tab>,

    /// Use tied positions
    #[arg(long)]
    ties: bool,

    /// Position threshold for rank counts
    #[arg(long, default_value_t = 0)]
    top: usize,

    /// Print every player instead of one page
    #[arg(long)]
    full: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = ClientConfig::from_env();
    logging::setup_logging(&config.log_dir, config.log_stderr)?;
    tracing::info!("Data directory: {}", config.data_dir.display());

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => commands::run(config).await,
        Command::Sync { category, id } => commands::sync(config, category, id).await,
        Command::Backfill => commands::backfill(config).await,
        Command::Rank(args) => commands::rank(&config, args.into()),
    }
}

impl From<RankArgs> for board_core::RankingQuery {
    fn from(args: RankArgs) -> Self {
        let query = Self::new(args.kind)
            .categories(args.categories)
            .tabs(args.tabs)
            .ties(args.ties)
            .top(args.top);
        if args.full { query.full() } else { query }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_args_parse_into_query() {
        let cli = Cli::try_parse_from([
            "leaderboard",
            "rank",
            "avg_points",
            "--category",
            "level",
            "--tab",
            "si",
            "--ties",
        ])
        .unwrap();
        let Some(Command::Rank(args)) = cli.command else {
            panic!("expected rank command");
        };

        let query = board_core::RankingQuery::from(args);
        assert_eq!(query.kind, RankingKind::AvgPoints);
        assert_eq!(query.categories, vec![Category::Level]);
        assert_eq!(query.tabs, vec![Tab::Si]);
        assert!(query.ties);
        assert!(!query.full);
    }

    #[test]
    fn test_sync_id_requires_category() {
        assert!(Cli::try_parse_from(["leaderboard", "sync", "--id", "3"]).is_err());
        assert!(Cli::try_parse_from(["leaderboard", "sync", "--category", "story", "--id", "3"]).is_ok());
    }
}
