//! logsift CLI
//!
//! `crawl` walks the configured matrix job and archives every run;
//! `analyze` classifies the archived failures and prints the report.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use logsift::{
    error::Result,
    models::Config,
    pipeline,
    services::{JenkinsClient, RuleSet},
    storage::LocalArchive,
};

/// logsift - Jenkins matrix build log triage
#[derive(Parser, Debug)]
#[command(
    name = "logsift",
    version,
    about = "Harvests Jenkins matrix build logs and classifies failures"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Archive directory (overrides JENKINS_LOGS_DIR and the config file)
    #[arg(long)]
    archive_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk the matrix job tree and archive all run logs
    Crawl {
        /// Root URL of the matrix job (default: configured root_url)
        #[arg(long)]
        url: Option<String>,
    },

    /// Classify archived failures and print the ranked report
    Analyze,

    /// Validate configuration and category patterns
    Validate,
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

    let config = Config::load_or_default(&cli.config);
    let archive_root = cli.archive_dir.unwrap_or_else(|| config.archive_root());

    match cli.command {
        Command::Crawl { url } => {
            let root_url = url.unwrap_or_else(|| config.crawler.root_url.clone());
            let client = JenkinsClient::new(&config.crawler)?;
            let store = LocalArchive::new(&archive_root);

            log::info!("Archiving to {}", archive_root.display());
            let outcome = pipeline::run_crawl(&client, &store, &root_url).await?;

            log::info!(
                "Crawl complete: {} builds ({} failed), {} runs archived, {} runs failed",
                outcome.builds_total,
                outcome.builds_failed,
                outcome.runs_archived,
                outcome.runs_failed
            );
        }

        Command::Analyze => {
            let rules = RuleSet::compile(&config.categories)?;
            let store = LocalArchive::new(&archive_root);

            log::info!("Reading archive from {}", archive_root.display());
            pipeline::run_analyze(&store, &rules).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            config.validate()?;
            let rules = RuleSet::compile(&config.categories)?;
            log::info!("✓ Config OK ({} categories compiled)", rules.len());

            log::info!("All validations passed!");
        }
    }

    Ok(())
}
