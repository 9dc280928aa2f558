//! HTTP serving surface
//!
//! Thin addon-protocol layer over the engine: a manifest describing the
//! single movie catalog, and catalog routes with an optional search extra.
//! The engine snapshot is immutable, so handlers share it through an `Arc`
//! with no locking; only the query embedding awaits.

use crate::config::Config;
use crate::engine::{CatalogItem, Engine};
use crate::error::{Error, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
struct AppState {
    engine: Arc<Engine>,
    manifest: Arc<Manifest>,
}

#[derive(Debug, Clone, Serialize)]
struct Manifest {
    id: String,
    version: String,
    name: String,
    description: String,
    resources: Vec<String>,
    types: Vec<String>,
    catalogs: Vec<ManifestCatalog>,
}

#[derive(Debug, Clone, Serialize)]
struct ManifestCatalog {
    #[serde(rename = "type")]
    catalog_type: String,
    id: String,
    name: String,
    extra: Vec<ManifestExtra>,
}

#[derive(Debug, Clone, Serialize)]
struct ManifestExtra {
    name: String,
    #[serde(rename = "isRequired")]
    is_required: bool,
}

#[derive(Debug, Serialize)]
struct CatalogResponse {
    metas: Vec<CatalogItem>,
}

fn build_manifest(config: &Config) -> Manifest {
    Manifest {
        id: config.query.addon_id.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        name: config.query.addon_name.clone(),
        description: "Movie recommendations based on community vibes.".to_string(),
        resources: vec!["catalog".to_string()],
        types: vec!["movie".to_string()],
        catalogs: vec![ManifestCatalog {
            catalog_type: "movie".to_string(),
            id: config.query.catalog_id.clone(),
            name: "Vibe Search".to_string(),
            extra: vec![ManifestExtra {
                name: "search".to_string(),
                is_required: false,
            }],
        }],
    }
}

/// Build the router for the addon surface
pub fn create_router(config: &Config, engine: Arc<Engine>) -> Router {
    let state = AppState {
        engine,
        manifest: Arc::new(build_manifest(config)),
    };

    Router::new()
        .route("/", get(root))
        .route("/manifest.json", get(manifest))
        .route("/catalog/movie/:catalog", get(catalog_default))
        .route("/catalog/movie/:catalog/:extra", get(catalog_search))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(config: &Config, engine: Arc<Engine>) -> Result<()> {
    let app = create_router(config, engine);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Serving catalog on http://{}", config.server.bind);
    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Other(e.to_string()))?;
    Ok(())
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({"message": "reelvibe recommender is running."}))
}

async fn manifest(State(state): State<AppState>) -> Json<Manifest> {
    Json(state.manifest.as_ref().clone())
}

async fn catalog_default(
    State(state): State<AppState>,
    Path(catalog): Path<String>,
) -> Response {
    let catalog_id = strip_json_suffix(&catalog);
    answer(&state, catalog_id, None).await
}

async fn catalog_search(
    State(state): State<AppState>,
    Path((catalog, extra)): Path<(String, String)>,
) -> Response {
    let catalog_id = strip_json_suffix(&catalog);
    let query = parse_search_extra(&extra);
    answer(&state, catalog_id, query).await
}

async fn answer(state: &AppState, catalog_id: &str, query: Option<&str>) -> Response {
    match state.engine.catalog(catalog_id, query).await {
        Ok(metas) => Json(CatalogResponse { metas }).into_response(),
        Err(Error::UnknownCatalog(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Catalog not found"})),
        )
            .into_response(),
        Err(e) => {
            warn!("Catalog request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}

/// Addon route segments carry a trailing `.json`
fn strip_json_suffix(segment: &str) -> &str {
    segment.strip_suffix(".json").unwrap_or(segment)
}

/// Parse the `search=<query>.json` extra segment
fn parse_search_extra(extra: &str) -> Option<&str> {
    strip_json_suffix(extra)
        .strip_prefix("search=")
        .filter(|query| !query.is_empty())
}
