//! Serve command implementation

use crate::config::Config;
use crate::embed::create_embedder;
use crate::engine::Engine;
use crate::error::Result;
use crate::server;
use crate::store::RecsDb;
use std::sync::Arc;
use tracing::{info, warn};

/// Build the serving engine, degrading to empty results when the store is
/// missing or unreadable.
pub async fn build_engine(config: &Config) -> Result<Engine> {
    let embedder = create_embedder(&config.embedding)?;

    match RecsDb::open_read_only(&config.paths.recs_db_file).await {
        Ok(db) => match Engine::load(&db, embedder, &config.query).await {
            Ok(engine) => Ok(engine),
            Err(e) => {
                warn!("Failed to load suggestion store, serving empty results: {}", e);
                Ok(Engine::degraded(create_embedder(&config.embedding)?, &config.query))
            }
        },
        Err(e) => {
            warn!("Suggestion store unavailable, serving empty results: {}", e);
            Ok(Engine::degraded(embedder, &config.query))
        }
    }
}

/// Start the catalog HTTP service
pub async fn cmd_serve(config: &Config) -> Result<()> {
    let engine = build_engine(config).await?;
    if engine.is_degraded() {
        warn!("Engine is degraded; run 'reelvibe ingest' to populate the store");
    } else {
        info!("Engine ready with {} posts", engine.post_count());
    }

    server::serve(config, Arc::new(engine)).await
}
