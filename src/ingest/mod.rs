//! Ingestion pipeline
//!
//! Walks configured feeds, filters posts and comments by score, resolves
//! candidate movie mentions against the reference catalog, and stages
//! (post, item, weight) rows plus one title embedding per post. Everything
//! staged across all feeds is committed in a single transaction at the end.
//!
//! A failing feed never aborts the run; its outcome is recorded and the
//! pipeline moves on. Only catalog/store connectivity and the final commit
//! are fatal.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::embed::{embed_in_batches, Embedder};
use crate::error::{Error, Result};
use crate::feed::{FeedClient, FeedPost};
use crate::normalize::normalize_title;
use crate::store::{IngestBatch, NewPost, NewSuggestion, RecsDb};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Outcome of processing a single feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    Completed,
    Failed,
}

/// Per-feed result, aggregated into the run report
#[derive(Debug, Clone, Serialize)]
pub struct FeedOutcome {
    pub feed: String,
    pub status: FeedStatus,
    pub posts_accepted: usize,
    pub suggestions_matched: usize,
    pub error: Option<String>,
}

/// Summary of one ingestion run
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub outcomes: Vec<FeedOutcome>,
    pub posts_staged: usize,
    pub suggestions_staged: usize,
    pub finished_at: DateTime<Utc>,
}

impl IngestReport {
    /// True when at least one feed failed
    pub fn is_partial(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| outcome.status == FeedStatus::Failed)
    }
}

/// Run the full ingestion pipeline and commit the result atomically
pub async fn run_ingestion(
    config: &Config,
    feed_client: &dyn FeedClient,
    embedder: &dyn Embedder,
    catalog: &Catalog,
    db: &RecsDb,
) -> Result<IngestReport> {
    let mut batch = IngestBatch::default();
    let mut seen_posts: HashSet<String> = HashSet::new();
    let mut report = IngestReport::default();

    let progress = ProgressBar::new(config.feeds.subreddits.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} feeds {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    for feed in &config.feeds.subreddits {
        progress.set_message(format!("r/{}", feed));

        let outcome = match process_feed(
            config,
            feed_client,
            embedder,
            catalog,
            feed,
            &mut batch,
            &mut seen_posts,
        )
        .await
        {
            Ok((posts_accepted, suggestions_matched)) => {
                info!(
                    "Processed r/{}: {} posts, {} suggestions",
                    feed, posts_accepted, suggestions_matched
                );
                FeedOutcome {
                    feed: feed.clone(),
                    status: FeedStatus::Completed,
                    posts_accepted,
                    suggestions_matched,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Failed to process r/{}: {}", feed, e);
                FeedOutcome {
                    feed: feed.clone(),
                    status: FeedStatus::Failed,
                    posts_accepted: 0,
                    suggestions_matched: 0,
                    error: Some(e.to_string()),
                }
            }
        };

        report.outcomes.push(outcome);
        progress.inc(1);
    }

    progress.finish_and_clear();

    report.posts_staged = batch.posts.len();
    report.suggestions_staged = batch.suggestions.len();

    // Single durable commit; a failure here aborts the run with nothing
    // visible to readers.
    db.commit_batch(&batch).await?;

    report.finished_at = Utc::now();
    Ok(report)
}

/// Process one feed into the shared batch.
///
/// Any error in here (fetch, embed, catalog lookup) marks the feed failed
/// and none of its rows reach the batch; a feed contributes all of its rows
/// or nothing.
async fn process_feed(
    config: &Config,
    feed_client: &dyn FeedClient,
    embedder: &dyn Embedder,
    catalog: &Catalog,
    feed: &str,
    batch: &mut IngestBatch,
    seen_posts: &mut HashSet<String>,
) -> Result<(usize, usize)> {
    let posts = feed_client
        .fetch_hot(feed, config.feeds.post_limit)
        .await?;

    let mut pending_posts: Vec<(String, String)> = Vec::new();
    let mut pending_suggestions: Vec<NewSuggestion> = Vec::new();

    for post in posts {
        if !accept_post(config, &post) {
            debug!("Skipping post '{}' (score {})", post.title, post.score);
            continue;
        }

        // First write wins; later duplicates of the same post keep the stored
        // title and vector, but their comments still contribute suggestions.
        if !seen_posts.contains(&post.id)
            && !pending_posts.iter().any(|(id, _)| *id == post.id)
        {
            pending_posts.push((post.id.clone(), post.title.clone()));
        }

        for comment in &post.comments {
            if comment.score < config.feeds.comment_score_threshold {
                continue;
            }

            for line in comment.body.lines() {
                let candidate = line.trim();
                if candidate.is_empty() {
                    continue;
                }

                let cleaned = normalize_title(candidate);
                if let Some(tt_id) = catalog.resolve(&cleaned).await? {
                    debug!("Matched '{}' -> {}", candidate, tt_id);
                    pending_suggestions.push(NewSuggestion {
                        post_id: post.id.clone(),
                        tt_id,
                        upvotes: comment.score,
                    });
                }
                // No match: silently dropped.
            }
        }
    }

    let titles: Vec<String> = pending_posts.iter().map(|(_, title)| title.clone()).collect();
    let vectors = embed_in_batches(embedder, titles, config.embedding.batch_size).await?;
    if vectors.len() != pending_posts.len() {
        return Err(Error::Embedding(format!(
            "Backend returned {} embeddings for {} titles",
            vectors.len(),
            pending_posts.len()
        )));
    }

    let posts_accepted = pending_posts.len();
    let suggestions_matched = pending_suggestions.len();

    for ((post_id, post_title), vector) in pending_posts.into_iter().zip(vectors) {
        seen_posts.insert(post_id.clone());
        batch.posts.push(NewPost {
            post_id,
            post_title,
            vector,
        });
    }
    batch.suggestions.extend(pending_suggestions);

    Ok((posts_accepted, suggestions_matched))
}

fn accept_post(config: &Config, post: &FeedPost) -> bool {
    post.score >= config.feeds.post_score_threshold && post.is_self && !post.stickied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed_test_catalog;
    use crate::error::Error;
    use crate::feed::FeedComment;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct FixtureFeed {
        posts_by_feed: HashMap<String, Vec<FeedPost>>,
        failing_feeds: Vec<String>,
    }

    #[async_trait]
    impl FeedClient for FixtureFeed {
        async fn fetch_hot(&self, feed: &str, _limit: u32) -> Result<Vec<FeedPost>> {
            if self.failing_feeds.iter().any(|f| f == feed) {
                return Err(Error::Feed(format!("r/{} unreachable", feed)));
            }
            Ok(self.posts_by_feed.get(feed).cloned().unwrap_or_default())
        }
    }

    struct ConstantEmbedder;

    #[async_trait]
    impl crate::embed::Embedder for ConstantEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "constant"
        }
    }

    fn feed_post(id: &str, score: i64, is_self: bool, stickied: bool) -> FeedPost {
        FeedPost {
            id: id.to_string(),
            title: format!("post {}", id),
            score,
            is_self,
            stickied,
            comments: vec![FeedComment {
                body: "*Inception*\nnot a real film".to_string(),
                score: 10,
            }],
        }
    }

    fn test_config(tmp: &TempDir) -> Config {
        let mut config = Config::default();
        config.feeds.subreddits = vec!["movies".to_string()];
        config.feeds.post_score_threshold = 20;
        config.feeds.comment_score_threshold = 5;
        config.paths.recs_db_file = tmp.path().join("recommendations.db");
        config.paths.catalog_db_file = tmp.path().join("catalog.db");
        config
    }

    async fn run_with_posts(
        config: &Config,
        posts: Vec<FeedPost>,
        failing_feeds: Vec<String>,
    ) -> (IngestReport, RecsDb) {
        seed_test_catalog(&config.paths.catalog_db_file, &[("inception", "tt1375666")]).await;
        let catalog = Catalog::open(&config.paths.catalog_db_file).await.unwrap();
        let db = RecsDb::connect(&config.paths.recs_db_file).await.unwrap();

        let mut posts_by_feed = HashMap::new();
        posts_by_feed.insert("movies".to_string(), posts);
        let feed = FixtureFeed {
            posts_by_feed,
            failing_feeds,
        };

        let report = run_ingestion(config, &feed, &ConstantEmbedder, &catalog, &db)
            .await
            .unwrap();
        (report, db)
    }

    #[tokio::test]
    async fn test_accepted_post_produces_rows() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        let (report, db) =
            run_with_posts(&config, vec![feed_post("abc", 50, true, false)], vec![]).await;

        assert_eq!(report.posts_staged, 1);
        assert_eq!(report.suggestions_staged, 1);
        assert!(!report.is_partial());

        let posts = db.fetch_posts().await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].post_id, "abc");

        let suggestions = db.fetch_suggestions().await.unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].tt_id, "tt1375666");
        assert_eq!(suggestions[0].upvotes, 10);
    }

    #[tokio::test]
    async fn test_low_score_post_is_skipped_entirely() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        let (report, db) =
            run_with_posts(&config, vec![feed_post("abc", 5, true, false)], vec![]).await;

        assert_eq!(report.posts_staged, 0);
        assert_eq!(report.suggestions_staged, 0);
        assert_eq!(db.count_posts().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_link_and_stickied_posts_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        let (report, _db) = run_with_posts(
            &config,
            vec![
                feed_post("link", 50, false, false),
                feed_post("pinned", 50, true, true),
            ],
            vec![],
        )
        .await;

        assert_eq!(report.posts_staged, 0);
    }

    #[tokio::test]
    async fn test_low_score_comment_contributes_nothing() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        let mut post = feed_post("abc", 50, true, false);
        post.comments = vec![FeedComment {
            body: "*Inception*".to_string(),
            score: 1,
        }];
        let (report, _db) = run_with_posts(&config, vec![post], vec![]).await;

        assert_eq!(report.posts_staged, 1);
        assert_eq!(report.suggestions_staged, 0);
    }

    #[tokio::test]
    async fn test_unmatched_lines_are_dropped_silently() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        let mut post = feed_post("abc", 50, true, false);
        post.comments = vec![FeedComment {
            body: "totally unknown movie\n\n   \n*Inception*".to_string(),
            score: 8,
        }];
        let (report, _db) = run_with_posts(&config, vec![post], vec![]).await;

        assert_eq!(report.suggestions_staged, 1);
    }

    #[tokio::test]
    async fn test_duplicate_post_ids_first_write_wins() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        let (report, db) = run_with_posts(
            &config,
            vec![
                feed_post("abc", 50, true, false),
                feed_post("abc", 60, true, false),
            ],
            vec![],
        )
        .await;

        assert_eq!(report.posts_staged, 1);
        assert_eq!(db.count_posts().await.unwrap(), 1);
        // Suggestions from the duplicate still accumulate against the post.
        assert_eq!(report.suggestions_staged, 2);
    }

    #[tokio::test]
    async fn test_failed_feed_recorded_and_run_continues() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(&tmp);
        config.feeds.subreddits = vec!["broken".to_string(), "movies".to_string()];

        let (report, db) = run_with_posts(
            &config,
            vec![feed_post("abc", 50, true, false)],
            vec!["broken".to_string()],
        )
        .await;

        assert!(report.is_partial());
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].status, FeedStatus::Failed);
        assert!(report.outcomes[0].error.is_some());
        assert_eq!(report.outcomes[1].status, FeedStatus::Completed);
        assert_eq!(db.count_posts().await.unwrap(), 1);
    }
}
