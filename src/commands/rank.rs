//! Rank command implementation
//!
//! Offline counterpart of the catalog route: runs a query (or the default
//! ranking) against the store from the command line, mainly for inspecting
//! what a deployment would serve.

use super::build_engine;
use crate::config::Config;
use crate::error::Result;
use serde::Serialize;

/// Ranked output for CLI display
#[derive(Debug, Clone, Serialize)]
pub struct RankResult {
    pub query: Option<String>,
    pub items: Vec<String>,
    pub degraded: bool,
}

/// Rank catalog items for an optional query
pub async fn cmd_rank(
    config: &Config,
    query: Option<String>,
    limit: Option<usize>,
) -> Result<RankResult> {
    let engine = build_engine(config).await?;

    let mut items = engine.rank(query.as_deref()).await?;
    if let Some(limit) = limit {
        items.truncate(limit);
    }

    Ok(RankResult {
        query,
        items,
        degraded: engine.is_degraded(),
    })
}

/// Print ranked items to the console
pub fn print_rank_result(result: &RankResult) {
    match &result.query {
        Some(query) => println!("\nRanking for query: {}\n", query),
        None => println!("\nDefault ranking\n"),
    }

    if result.degraded {
        println!("(store unavailable; serving empty results)");
        return;
    }

    if result.items.is_empty() {
        println!("(no results)");
        return;
    }

    for (i, tt_id) in result.items.iter().enumerate() {
        println!("{:3}. {}", i + 1, tt_id);
    }
}
