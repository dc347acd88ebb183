// src/pipeline/crawl.rs

//! Tree crawling pipeline.
//!
//! Walks project → builds → runs. A failure anywhere below the root is
//! logged and skips only that subtree; the root descriptor itself is the one
//! fatal point, because without it no builds can be discovered at all.
//! Every level waits for all of its children, so the crawl cannot complete
//! before the last write has landed.

use futures::future;

use crate::error::Result;
use crate::models::NodeRef;
use crate::services::JobFetcher;
use crate::storage::ArchiveStore;

/// Summary of a crawl run.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub builds_total: usize,
    pub builds_failed: usize,
    pub runs_total: usize,
    pub runs_failed: usize,
    pub runs_archived: usize,
}

/// Per-build tally folded into the overall outcome.
#[derive(Debug, Default)]
struct BuildTally {
    runs_total: usize,
    runs_failed: usize,
    runs_archived: usize,
}

/// Crawl the matrix job at `root_url`, archiving every run.
pub async fn run_crawl(
    fetcher: &dyn JobFetcher,
    store: &dyn ArchiveStore,
    root_url: &str,
) -> Result<CrawlOutcome> {
    log::info!("Crawling matrix job at {root_url}");

    let project = fetcher.fetch_project(root_url).await?;
    let builds = project.builds()?;

    log::info!("Discovered {} builds", builds.len());

    let mut outcome = CrawlOutcome {
        builds_total: builds.len(),
        ..CrawlOutcome::default()
    };

    // All builds in flight at once; the join is the completion barrier.
    let tallies =
        future::join_all(builds.iter().map(|node| crawl_build(fetcher, store, node))).await;

    for tally in tallies {
        match tally {
            Ok(tally) => {
                outcome.runs_total += tally.runs_total;
                outcome.runs_failed += tally.runs_failed;
                outcome.runs_archived += tally.runs_archived;
            }
            Err(error) => {
                outcome.builds_failed += 1;
                log::warn!("Skipping build: {error}");
            }
        }
    }

    Ok(outcome)
}

/// Crawl one build's runs. Errors out only for failures that invalidate the
/// whole build (bad reference, unreachable or malformed descriptor); run
/// failures are tallied and logged without affecting siblings.
async fn crawl_build(
    fetcher: &dyn JobFetcher,
    store: &dyn ArchiveStore,
    node: &NodeRef,
) -> Result<BuildTally> {
    let (number, url) = node.validated("build reference")?;
    log::info!("Retrieving metadata for build {number} from {url}");

    let descriptor = fetcher.fetch_build(url).await?;
    let runs = descriptor.runs()?;

    let mut tally = BuildTally {
        runs_total: runs.len(),
        ..BuildTally::default()
    };

    let results = future::join_all(runs.iter().map(|run| crawl_run(fetcher, store, run))).await;

    for result in results {
        match result {
            Ok(()) => tally.runs_archived += 1,
            Err(error) => {
                tally.runs_failed += 1;
                log::warn!("Skipping run of build {number}: {error}");
            }
        }
    }

    Ok(tally)
}

/// Fetch one run's descriptor and console log, then persist the record.
async fn crawl_run(
    fetcher: &dyn JobFetcher,
    store: &dyn ArchiveStore,
    node: &NodeRef,
) -> Result<()> {
    let (number, url) = node.validated("run reference")?;
    log::info!("Retrieving metadata for run {number} from {url}");

    let descriptor = fetcher.fetch_run(url).await?;
    let metadata = descriptor.into_metadata(url)?;

    let console_log = fetcher.fetch_console_text(&metadata.url).await?;

    store
        .put_run(
            metadata.number,
            &metadata.full_display_name,
            &metadata,
            &console_log,
        )
        .await?;

    log::info!(
        "Archived build {} run '{}'",
        metadata.number,
        metadata.full_display_name
    );
    Ok(())
}
