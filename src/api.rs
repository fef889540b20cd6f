//! Translation cache API server.
//!
//! A small shared cache that hover-translator clients consult before calling
//! the translation provider, and feed with every translation they obtain.
//!
//! # Usage
//!
//! ```bash
//! # Start the server
//! translation-cache-api
//!
//! # Or with custom port
//! PORT=8080 translation-cache-api
//! ```
//!
//! # API Endpoints
//!
//! ## GET /get_translation/:word
//!
//! Returns the cached translation, or `null` when the word is unknown.
//!
//! ```json
//! { "translation": "perro" }
//! ```
//!
//! ## POST /cache_translation
//!
//! Stores a translation. Body: `{ "word": "dog", "translation": "perro" }`.
//!
//! ## GET /health
//!
//! Health check endpoint.

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Response of the lookup endpoint.
#[derive(Debug, Serialize, Deserialize)]
struct LookupResponse {
    translation: Option<String>,
}

/// Body of the store endpoint.
#[derive(Debug, Deserialize)]
struct CacheRequest {
    word: String,
    translation: String,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Cached translations keyed by lower-cased word.
#[derive(Default)]
struct AppState {
    translations: RwLock<HashMap<String, String>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "translation_cache_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load .env if present
    let _ = dotenvy::dotenv();

    // Get host from environment or use default (127.0.0.1 for local, 0.0.0.0 for Docker)
    let host: std::net::Ipv4Addr = std::env::var("HOST")
        .unwrap_or_else(|_| "127.0.0.1".to_string())
        .parse()
        .map_err(|e| anyhow::anyhow!("HOST must be a valid IPv4 address: {}", e))?;

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8000".to_string())
        .parse()
        .map_err(|e| anyhow::anyhow!("PORT must be a valid number: {}", e))?;

    let app = router(Arc::new(AppState::default()));

    let addr = SocketAddr::from((host, port));
    info!("Translation cache API starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    // Browser clients call this from any origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/get_translation/:word", get(get_translation))
        .route("/cache_translation", post(cache_translation))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

/// GET /get_translation/:word
async fn get_translation(
    Path(word): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<LookupResponse> {
    let key = word.trim().to_lowercase();
    let translation = state.translations.read().await.get(&key).cloned();
    debug!("Lookup '{}': {:?}", key, translation);
    Json(LookupResponse { translation })
}

/// POST /cache_translation
async fn cache_translation(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CacheRequest>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    let key = body.word.trim().to_lowercase();
    if key.is_empty() || body.translation.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "word and translation must not be empty".to_string(),
            }),
        ));
    }

    debug!("Caching '{}' -> '{}'", key, body.translation);
    state.translations.write().await.insert(key, body.translation);
    Ok(Json(StatusResponse { status: "ok" }))
}
