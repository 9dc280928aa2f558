//! reelvibe — movie recommendations from community vibes
//!
//! Two halves share this crate:
//! - an offline ingestion pipeline that turns social posts and their
//!   comments into a weighted suggestion store with one embedding per post,
//! - an online ranking engine that matches free-text queries against those
//!   embeddings and aggregates community suggestions into a catalog.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod embed;
pub mod engine;
pub mod error;
pub mod feed;
pub mod ingest;
pub mod normalize;
pub mod server;
pub mod store;
