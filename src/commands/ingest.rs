//! Ingest command implementation

use crate::catalog::Catalog;
use crate::config::Config;
use crate::embed::create_embedder;
use crate::error::Result;
use crate::feed::RedditClient;
use crate::ingest::{run_ingestion, FeedStatus, IngestReport};
use crate::store::RecsDb;
use tracing::info;

/// Run a full ingestion against the configured feeds.
///
/// Catalog and store connections are fatal here; individual feed failures
/// surface in the returned report instead.
pub async fn cmd_ingest(config: &Config) -> Result<IngestReport> {
    info!("Starting ingestion for {} feeds", config.feeds.subreddits.len());

    let catalog = Catalog::open(&config.paths.catalog_db_file).await?;
    let db = RecsDb::connect(&config.paths.recs_db_file).await?;
    let embedder = create_embedder(&config.embedding)?;
    let feed_client = RedditClient::new(&config.feeds)?;

    run_ingestion(config, &feed_client, embedder.as_ref(), &catalog, &db).await
}

/// Print an ingestion report to the console
pub fn print_ingest_report(report: &IngestReport) {
    for outcome in &report.outcomes {
        match outcome.status {
            FeedStatus::Completed => println!(
                "  r/{}: {} posts, {} suggestions",
                outcome.feed, outcome.posts_accepted, outcome.suggestions_matched
            ),
            FeedStatus::Failed => println!(
                "  r/{}: FAILED ({})",
                outcome.feed,
                outcome.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    if report.is_partial() {
        println!("\n⚠ Ingestion finished with failed feeds");
    } else {
        println!("\n✓ Ingestion complete");
    }
    println!("  Posts staged: {}", report.posts_staged);
    println!("  Suggestions staged: {}", report.suggestions_staged);
}
