//! Default values for configuration

/// Default subreddits harvested for suggestion threads
pub fn default_feed_subreddits() -> Vec<String> {
    vec!["MovieSuggestions".to_string(), "ifyoulikeblank".to_string()]
}

/// Default number of hot posts fetched per feed
pub fn default_feed_post_limit() -> u32 {
    50
}

/// Default minimum post score for ingestion
pub fn default_post_score_threshold() -> i64 {
    20
}

/// Default minimum comment score for a suggestion to count
pub fn default_comment_score_threshold() -> i64 {
    5
}

/// Default feed user agent
pub fn default_feed_user_agent() -> String {
    format!("reelvibe/{} (Vibe Recommender)", env!("CARGO_PKG_VERSION"))
}

/// Default feed request timeout in seconds
pub fn default_feed_timeout() -> u64 {
    30
}

/// Default embedding model
pub fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

/// Default embedding dimension (all-MiniLM-L6-v2)
pub fn default_embedding_dimension() -> usize {
    384
}

/// Default batch size for embedding
pub fn default_embedding_batch_size() -> usize {
    32
}

/// Default embedding backend URL
pub fn default_embedding_backend_url() -> String {
    std::env::var("REELVIBE_EMBEDDING_BACKEND_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:7997".to_string())
}

/// Default number of similar posts considered per query
pub fn default_similar_post_count() -> usize {
    5
}

/// Default maximum catalog results
pub fn default_max_results() -> usize {
    100
}

/// Default catalog identifier served over HTTP
pub fn default_catalog_id() -> String {
    "reddit-vibe-catalog".to_string()
}

/// Default addon identifier in the manifest
pub fn default_addon_id() -> String {
    "com.reelvibe.vibe-recommender".to_string()
}

/// Default addon display name
pub fn default_addon_name() -> String {
    "Reddit Vibe Recommender".to_string()
}

/// Default server bind address
pub fn default_server_bind() -> String {
    "0.0.0.0:7000".to_string()
}
