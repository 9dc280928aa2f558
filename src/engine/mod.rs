//! Serving engine
//!
//! The engine owns an immutable in-memory snapshot of the suggestion store
//! plus the embedder, and is shared by every request handler. It is built
//! once at startup; if the store cannot be loaded the engine starts degraded
//! and serves empty results instead of crashing.

use crate::config::QueryConfig;
use crate::embed::{embed_one, Embedder};
use crate::error::{Error, Result};
use crate::store::{decode_vector, PostRow, RecsDb, SuggestionRow};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// A post held in memory for similarity search
#[derive(Debug, Clone)]
pub struct StoredPost {
    pub id: String,
    pub title: String,
    pub vector: Vec<f32>,
}

/// Immutable in-memory view of the suggestion store
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Posts in storage order; tie-breaks in similarity search follow this
    posts: Vec<StoredPost>,
    suggestions_by_post: HashMap<String, Vec<(String, i64)>>,
    default_ranking: Vec<String>,
}

impl Snapshot {
    /// Build a snapshot from store rows.
    ///
    /// Every vector must decode to `expected_dimension` floats; anything else
    /// is treated as corruption and fails the load.
    pub fn build(
        posts: Vec<PostRow>,
        suggestions: Vec<SuggestionRow>,
        expected_dimension: usize,
        max_results: usize,
    ) -> Result<Self> {
        let mut stored = Vec::with_capacity(posts.len());
        for row in posts {
            let vector = decode_vector(&row.post_vector)?;
            if vector.len() != expected_dimension {
                return Err(Error::Store(format!(
                    "Post {} has vector dimension {}, expected {}",
                    row.post_id,
                    vector.len(),
                    expected_dimension
                )));
            }
            stored.push(StoredPost {
                id: row.post_id,
                title: row.post_title,
                vector,
            });
        }

        let mut suggestions_by_post: HashMap<String, Vec<(String, i64)>> = HashMap::new();
        let mut default_scores: HashMap<String, i64> = HashMap::new();
        for row in suggestions {
            *default_scores.entry(row.tt_id.clone()).or_insert(0) += row.upvotes;
            suggestions_by_post
                .entry(row.post_id)
                .or_default()
                .push((row.tt_id, row.upvotes));
        }

        let default_ranking = rank_scores(default_scores, max_results);

        Ok(Self {
            posts: stored,
            suggestions_by_post,
            default_ranking,
        })
    }

    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    pub fn suggestion_count(&self) -> usize {
        self.suggestions_by_post.values().map(Vec::len).sum()
    }
}

/// Sort accumulated weights into a ranked id list.
///
/// Descending by summed weight; equal weights order by item id ascending so
/// the ranking is deterministic across runs.
fn rank_scores(scores: HashMap<String, i64>, max_results: usize) -> Vec<String> {
    let mut entries: Vec<(String, i64)> = scores.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(max_results);
    entries.into_iter().map(|(tt_id, _)| tt_id).collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// One catalog item descriptor as returned to the addon surface
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
}

/// The serving engine
pub struct Engine {
    snapshot: Snapshot,
    embedder: Box<dyn Embedder>,
    similar_post_count: usize,
    max_results: usize,
    catalog_id: String,
    degraded: bool,
}

impl Engine {
    /// Load the full store into memory and build a ready engine
    pub async fn load(db: &RecsDb, embedder: Box<dyn Embedder>, query: &QueryConfig) -> Result<Self> {
        let posts = db.fetch_posts().await?;
        let suggestions = db.fetch_suggestions().await?;
        let snapshot = Snapshot::build(
            posts,
            suggestions,
            embedder.dimension(),
            query.max_results,
        )?;

        info!(
            "Loaded {} post vectors and {} suggestions",
            snapshot.post_count(),
            snapshot.suggestion_count()
        );

        Ok(Self::from_snapshot(snapshot, embedder, query, false))
    }

    /// Build a degraded engine that answers every query with empty results
    pub fn degraded(embedder: Box<dyn Embedder>, query: &QueryConfig) -> Self {
        Self::from_snapshot(Snapshot::default(), embedder, query, true)
    }

    pub fn from_snapshot(
        snapshot: Snapshot,
        embedder: Box<dyn Embedder>,
        query: &QueryConfig,
        degraded: bool,
    ) -> Self {
        Self {
            snapshot,
            embedder,
            similar_post_count: query.similar_post_count,
            max_results: query.max_results,
            catalog_id: query.catalog_id.clone(),
            degraded,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn post_count(&self) -> usize {
        self.snapshot.post_count()
    }

    /// Rank all stored posts by cosine similarity to the query vector.
    ///
    /// Brute force over the whole store; at most `k` ids, descending
    /// similarity, ties kept in storage order by the stable sort.
    pub fn similar_posts(&self, query_vector: &[f32], k: usize) -> Vec<&str> {
        let mut scored: Vec<(usize, f32)> = self
            .snapshot
            .posts
            .iter()
            .enumerate()
            .map(|(idx, post)| (idx, cosine_similarity(query_vector, &post.vector)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
            .into_iter()
            .map(|(idx, _)| self.snapshot.posts[idx].id.as_str())
            .collect()
    }

    /// Aggregate the suggestion lists of the given posts into one ranking.
    ///
    /// Weights are summed per item across all posts; order of accumulation
    /// does not affect the result. Output is truncated to `max_results`.
    pub fn rank_for_posts(&self, post_ids: &[&str]) -> Vec<String> {
        let mut scores: HashMap<String, i64> = HashMap::new();
        for post_id in post_ids {
            if let Some(suggestions) = self.snapshot.suggestions_by_post.get(*post_id) {
                for (tt_id, upvotes) in suggestions {
                    *scores.entry(tt_id.clone()).or_insert(0) += upvotes;
                }
            }
        }
        rank_scores(scores, self.max_results)
    }

    /// The precomputed default ranking, already truncated
    pub fn default_ranking(&self) -> &[String] {
        &self.snapshot.default_ranking
    }

    /// Look up the title of a stored post (for diagnostics)
    pub fn post_title(&self, post_id: &str) -> Option<&str> {
        self.snapshot
            .posts
            .iter()
            .find(|post| post.id == post_id)
            .map(|post| post.title.as_str())
    }

    /// Rank catalog items for an optional free-text query.
    ///
    /// With a query the text is embedded, similar posts selected, and their
    /// suggestions aggregated; without one the default ranking is served.
    pub async fn rank(&self, search_query: Option<&str>) -> Result<Vec<String>> {
        if self.snapshot.posts.is_empty() {
            return Ok(Vec::new());
        }

        match search_query {
            Some(query) if !query.is_empty() => {
                debug!("Handling search query: '{}'", query);
                let query_vector = embed_one(self.embedder.as_ref(), query).await?;
                let similar = self.similar_posts(&query_vector, self.similar_post_count);
                for post_id in &similar {
                    if let Some(title) = self.post_title(post_id) {
                        debug!("Similar post: {}", title);
                    }
                }
                Ok(self.rank_for_posts(&similar))
            }
            _ => Ok(self.default_ranking().to_vec()),
        }
    }

    /// Serve one catalog request.
    ///
    /// An unknown catalog id is a not-found outcome for the caller; the
    /// single supported catalog answers with at most `max_results` item
    /// descriptors.
    pub async fn catalog(
        &self,
        catalog_id: &str,
        search_query: Option<&str>,
    ) -> Result<Vec<CatalogItem>> {
        if catalog_id != self.catalog_id {
            return Err(Error::UnknownCatalog(catalog_id.to_string()));
        }

        let mut tt_ids = self.rank(search_query).await?;
        tt_ids.truncate(self.max_results);
        Ok(tt_ids
            .into_iter()
            .map(|id| CatalogItem {
                id,
                item_type: "movie".to_string(),
            })
            .collect())
    }
}
