//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::RecsDb;
use std::path::PathBuf;
use tracing::info;

/// Write the default config and create the suggestion store schema
pub async fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<Config> {
    let mut config = Config::default();
    let base = base_dir.unwrap_or_else(Config::default_base_dir);
    config.paths.base_dir = base.clone();
    config.paths.config_file = base.join("config.toml");
    config.paths.recs_db_file = base.join("recommendations.db");
    config.paths.catalog_db_file = base.join("catalog.db");

    if config.paths.config_file.exists() && !force {
        return Err(Error::Config(format!(
            "Already initialized at {} (use --force to overwrite)",
            config.paths.config_file.display()
        )));
    }

    config.save()?;

    // Creating the store up front lets `status` and `serve` run before the
    // first ingestion, just with empty results.
    RecsDb::connect(&config.paths.recs_db_file).await?;

    info!("Initialized reelvibe at {:?}", config.paths.base_dir);
    Ok(config)
}
