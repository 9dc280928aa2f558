//! Suggestion store backed by SQLite
//!
//! Durable mapping from post to (title, embedding, weighted suggestions).
//! Ingestion writes everything in one transaction; the serving engine reads
//! the whole store into memory once at startup and never writes.
//!
//! Schema:
//! - `posts(post_id TEXT PRIMARY KEY, post_title TEXT, post_vector BLOB)`
//! - `suggestions(suggestion_id INTEGER PRIMARY KEY AUTOINCREMENT,
//!    post_id TEXT, tt_id TEXT, upvotes INTEGER)`
//!
//! Vectors are stored as raw little-endian f32 arrays with no header.

use crate::error::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;
use tracing::{debug, info};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS posts (
    post_id TEXT PRIMARY KEY,
    post_title TEXT,
    post_vector BLOB
);

CREATE TABLE IF NOT EXISTS suggestions (
    suggestion_id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id TEXT,
    tt_id TEXT,
    upvotes INTEGER,
    FOREIGN KEY(post_id) REFERENCES posts(post_id)
);
"#;

/// A stored post row
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub post_id: String,
    pub post_title: String,
    pub post_vector: Vec<u8>,
}

/// A stored suggestion row
#[derive(Debug, Clone, FromRow)]
pub struct SuggestionRow {
    pub post_id: String,
    pub tt_id: String,
    pub upvotes: i64,
}

/// A post staged for insertion
#[derive(Debug, Clone)]
pub struct NewPost {
    pub post_id: String,
    pub post_title: String,
    pub vector: Vec<f32>,
}

/// A suggestion staged for insertion
#[derive(Debug, Clone)]
pub struct NewSuggestion {
    pub post_id: String,
    pub tt_id: String,
    pub upvotes: i64,
}

/// All rows staged by one ingestion run, committed atomically
#[derive(Debug, Default)]
pub struct IngestBatch {
    pub posts: Vec<NewPost>,
    pub suggestions: Vec<NewSuggestion>,
}

impl IngestBatch {
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.suggestions.is_empty()
    }
}

/// Encode an embedding as raw little-endian f32 bytes
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode raw little-endian f32 bytes back into an embedding
pub fn decode_vector(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(Error::Store(format!(
            "Corrupt post vector: {} bytes is not a whole f32 array",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Suggestion store handle
#[derive(Clone)]
pub struct RecsDb {
    pool: SqlitePool,
}

impl RecsDb {
    /// Open the store read-write, creating the file and schema if needed
    pub async fn connect(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to suggestion store at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    /// Open the store read-only for serving; fails if the file is absent
    pub async fn open_read_only(db_path: &Path) -> Result<Self> {
        if !db_path.exists() {
            return Err(Error::Store(format!(
                "Suggestion store not found: {}",
                db_path.display()
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Commit one ingestion batch as a single transaction.
    ///
    /// Posts use first-write-wins semantics (`INSERT OR IGNORE`); suggestions
    /// are always appended, duplicates included. Nothing is visible to
    /// readers unless the whole batch commits.
    pub async fn commit_batch(&self, batch: &IngestBatch) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for post in &batch.posts {
            sqlx::query(
                "INSERT OR IGNORE INTO posts (post_id, post_title, post_vector) VALUES (?, ?, ?)",
            )
            .bind(&post.post_id)
            .bind(&post.post_title)
            .bind(encode_vector(&post.vector))
            .execute(&mut *tx)
            .await?;
        }

        for suggestion in &batch.suggestions {
            sqlx::query("INSERT INTO suggestions (post_id, tt_id, upvotes) VALUES (?, ?, ?)")
                .bind(&suggestion.post_id)
                .bind(&suggestion.tt_id)
                .bind(suggestion.upvotes)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!(
            "Committed {} posts and {} suggestions",
            batch.posts.len(),
            batch.suggestions.len()
        );
        Ok(())
    }

    /// Fetch all posts in storage order
    pub async fn fetch_posts(&self) -> Result<Vec<PostRow>> {
        let rows = sqlx::query_as::<_, PostRow>(
            "SELECT post_id, post_title, post_vector FROM posts ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Fetch all suggestions in insertion order
    pub async fn fetch_suggestions(&self) -> Result<Vec<SuggestionRow>> {
        let rows = sqlx::query_as::<_, SuggestionRow>(
            "SELECT post_id, tt_id, upvotes FROM suggestions ORDER BY suggestion_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Count stored posts
    pub async fn count_posts(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count stored suggestions
    pub async fn count_suggestions(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suggestions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_round_trip() {
        let vector = vec![0.25_f32, -1.5, 3.0];
        let bytes = encode_vector(&vector);
        assert_eq!(bytes.len(), 12);
        assert_eq!(decode_vector(&bytes).unwrap(), vector);
    }

    #[test]
    fn test_decode_rejects_partial_floats() {
        let err = decode_vector(&[0u8, 1, 2]);
        assert!(matches!(err, Err(Error::Store(_))));
    }

    #[test]
    fn test_decode_empty_is_empty() {
        assert!(decode_vector(&[]).unwrap().is_empty());
    }

    use tempfile::TempDir;

    fn new_post(id: &str, title: &str, vector: &[f32]) -> NewPost {
        NewPost {
            post_id: id.to_string(),
            post_title: title.to_string(),
            vector: vector.to_vec(),
        }
    }

    fn new_suggestion(post_id: &str, tt_id: &str, upvotes: i64) -> NewSuggestion {
        NewSuggestion {
            post_id: post_id.to_string(),
            tt_id: tt_id.to_string(),
            upvotes,
        }
    }

    #[tokio::test]
    async fn test_commit_and_reload_round_trip() {
        let tmp = TempDir::new().unwrap();
        let db = RecsDb::connect(&tmp.path().join("recs.db")).await.unwrap();

        let batch = IngestBatch {
            posts: vec![
                new_post("p1", "first", &[1.0, 2.0]),
                new_post("p2", "second", &[3.0, 4.0]),
            ],
            suggestions: vec![
                new_suggestion("p1", "ttA", 5),
                new_suggestion("p1", "ttA", 5),
                new_suggestion("p2", "ttB", 3),
            ],
        };
        db.commit_batch(&batch).await.unwrap();

        let posts = db.fetch_posts().await.unwrap();
        assert_eq!(posts.len(), 2);
        // Storage order is preserved for the similarity tie-break.
        assert_eq!(posts[0].post_id, "p1");
        assert_eq!(posts[1].post_id, "p2");
        assert_eq!(decode_vector(&posts[0].post_vector).unwrap(), vec![1.0, 2.0]);

        // Duplicate (post, item) pairs accumulate rather than merge.
        let suggestions = db.fetch_suggestions().await.unwrap();
        assert_eq!(suggestions.len(), 3);
        assert_eq!(suggestions[0].tt_id, "ttA");
        assert_eq!(suggestions[1].tt_id, "ttA");
    }

    #[tokio::test]
    async fn test_post_insert_is_first_write_wins() {
        let tmp = TempDir::new().unwrap();
        let db = RecsDb::connect(&tmp.path().join("recs.db")).await.unwrap();

        db.commit_batch(&IngestBatch {
            posts: vec![new_post("p1", "original", &[1.0])],
            suggestions: vec![],
        })
        .await
        .unwrap();

        db.commit_batch(&IngestBatch {
            posts: vec![new_post("p1", "replacement", &[9.0])],
            suggestions: vec![],
        })
        .await
        .unwrap();

        let posts = db.fetch_posts().await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].post_title, "original");
    }

    #[tokio::test]
    async fn test_open_read_only_missing_file_fails() {
        let tmp = TempDir::new().unwrap();
        let err = RecsDb::open_read_only(&tmp.path().join("absent.db")).await;
        assert!(matches!(err, Err(Error::Store(_))));
    }

    #[tokio::test]
    async fn test_counts_on_empty_store() {
        let tmp = TempDir::new().unwrap();
        let db = RecsDb::connect(&tmp.path().join("recs.db")).await.unwrap();
        assert_eq!(db.count_posts().await.unwrap(), 0);
        assert_eq!(db.count_suggestions().await.unwrap(), 0);
        assert!(db.fetch_posts().await.unwrap().is_empty());
    }
}
