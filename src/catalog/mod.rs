//! Reference catalog lookups
//!
//! The catalog is an external, read-only SQLite database mapping cleaned
//! movie titles to canonical `tt` identifiers. It is consulted once per
//! candidate mention during ingestion; a miss is an expected outcome, not an
//! error.

use crate::error::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::debug;

/// Handle to the reference catalog database
#[derive(Clone)]
pub struct Catalog {
    pool: SqlitePool,
}

impl Catalog {
    /// Open the catalog database read-only.
    ///
    /// A missing or unreadable catalog is fatal for an ingestion run, so this
    /// fails loudly instead of degrading.
    pub async fn open(db_path: &Path) -> Result<Self> {
        if !db_path.exists() {
            return Err(Error::Config(format!(
                "Reference catalog not found: {}",
                db_path.display()
            )));
        }

        debug!("Opening reference catalog at {:?}", db_path);

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Resolve a normalized title to its canonical catalog identifier.
    ///
    /// Exact-key lookup; returns `Ok(None)` when the title is unknown.
    pub async fn resolve(&self, normalized_title: &str) -> Result<Option<String>> {
        let tt_id: Option<String> =
            sqlx::query_scalar("SELECT tconst FROM movies WHERE cleaned_title = ?")
                .bind(normalized_title)
                .fetch_optional(&self.pool)
                .await?;
        Ok(tt_id)
    }
}

#[cfg(test)]
pub(crate) async fn seed_test_catalog(db_path: &Path, entries: &[(&str, &str)]) {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    sqlx::query("CREATE TABLE movies (cleaned_title TEXT PRIMARY KEY, tconst TEXT)")
        .execute(&pool)
        .await
        .unwrap();
    for (title, tt) in entries {
        sqlx::query("INSERT INTO movies (cleaned_title, tconst) VALUES (?, ?)")
            .bind(title)
            .bind(tt)
            .execute(&pool)
            .await
            .unwrap();
    }
    pool.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_resolve_hit_and_miss() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("catalog.db");
        seed_test_catalog(&db_path, &[("inception", "tt1375666")]).await;

        let catalog = Catalog::open(&db_path).await.unwrap();
        assert_eq!(
            catalog.resolve("inception").await.unwrap(),
            Some("tt1375666".to_string())
        );
        assert_eq!(catalog.resolve("no such film").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_open_missing_catalog_fails() {
        let tmp = TempDir::new().unwrap();
        let err = Catalog::open(&tmp.path().join("absent.db")).await;
        assert!(err.is_err());
    }
}
