//! gigscout CLI
//!
//! Local entry point for the job discovery and scoring pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use gigscout::{
    config,
    error::Result,
    fetcher::ListingFetcher,
    pipeline::{LogHandoff, Orchestrator},
    store::{JobStore, LocalJobStore},
};

/// gigscout - freelance job discovery and scoring
#[derive(Parser, Debug)]
#[command(
    name = "gigscout",
    version,
    about = "Discovers and scores freelance job postings"
)]
struct Cli {
    /// Directory containing config.toml and profile.toml
    #[arg(short, long, default_value = "data")]
    base_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline once (or on a schedule with --recur)
    Run {
        /// Search query; falls back to run.query from config.toml
        #[arg(long)]
        query: Option<String>,

        /// Rescore jobs that were already finalized
        #[arg(long)]
        force_rescore: bool,

        /// Keep running at the configured interval
        #[arg(long)]
        recur: bool,
    },

    /// Validate configuration and profile files
    Validate,

    /// Show store statistics
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run {
            query,
            force_rescore,
            recur,
        } => {
            let (config, profile) = config::load_all(&cli.base_dir)?;
            let query = query.unwrap_or_else(|| config.run.query.clone());

            let fetcher = ListingFetcher::new(&config.fetcher)?;
            let store = LocalJobStore::from_config(&config.store);
            let orchestrator = Orchestrator::new(
                config,
                profile,
                Arc::new(fetcher),
                Arc::new(store),
                Box::new(LogHandoff),
            )?
            .with_force_rescore(force_rescore);

            if recur {
                orchestrator.run_recurring(&query).await?;
            } else {
                let report = orchestrator.run(&query).await?;
                log::info!(
                    "run finished: {} match(es) handed off",
                    report.matches.len()
                );
            }
        }

        Command::Validate => {
            log::info!("Validating configuration and profile...");
            let (config, profile) = config::load_all(&cli.base_dir)?;
            log::info!(
                "✓ Config OK (weights sum to 1.0, {} user agent(s))",
                config.fetcher.user_agents.len()
            );
            log::info!("✓ Profile OK ({} skill(s))", profile.skills.len());
            log::info!("All validations passed!");
        }

        Command::Info => {
            let (config, _profile) = config::load_all(&cli.base_dir)?;
            let store = LocalJobStore::from_config(&config.store);

            let total = store.len().await?;
            let unscored = store.list_unscored().await?.len();
            let passing = store
                .list_passing(config.scoring.minimum_score)
                .await?
                .len();

            log::info!("store: {}", config.store.path);
            log::info!("jobs: {total} total, {unscored} unscored");
            log::info!(
                "jobs above {:.1}: {passing}",
                config.scoring.minimum_score
            );
        }
    }

    log::info!("Done!");

    Ok(())
}
