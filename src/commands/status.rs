//! Status command implementation

use crate::config::Config;
use crate::error::Result;
use crate::store::RecsDb;
use serde::Serialize;

/// System status for CLI display
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub config_file: String,
    pub store_file: String,
    pub store_available: bool,
    pub posts: i64,
    pub suggestions: i64,
    pub catalog_available: bool,
}

/// Gather system status
pub async fn cmd_status(config: &Config) -> Result<StatusReport> {
    let mut report = StatusReport {
        config_file: config.paths.config_file.display().to_string(),
        store_file: config.paths.recs_db_file.display().to_string(),
        store_available: false,
        posts: 0,
        suggestions: 0,
        catalog_available: config.paths.catalog_db_file.exists(),
    };

    if let Ok(db) = RecsDb::open_read_only(&config.paths.recs_db_file).await {
        report.store_available = true;
        report.posts = db.count_posts().await?;
        report.suggestions = db.count_suggestions().await?;
    }

    Ok(report)
}

/// Print a status report to the console
pub fn print_status(report: &StatusReport) {
    println!("reelvibe status");
    println!("  Config: {}", report.config_file);
    println!("  Reference catalog: {}", if report.catalog_available { "present" } else { "missing" });
    if report.store_available {
        println!("  Suggestion store: {}", report.store_file);
        println!("    Posts: {}", report.posts);
        println!("    Suggestions: {}", report.suggestions);
    } else {
        println!("  Suggestion store: unavailable ({})", report.store_file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_status_with_missing_store() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.config_file = tmp.path().join("config.toml");
        config.paths.recs_db_file = tmp.path().join("recommendations.db");
        config.paths.catalog_db_file = tmp.path().join("catalog.db");

        let report = cmd_status(&config).await.unwrap();
        assert!(!report.store_available);
        assert!(!report.catalog_available);
        assert_eq!(report.posts, 0);
    }
}
