//! HTTP server for the Vista insight dashboard.
//!
//! Wraps the JSON API from [`vista_api`] with CORS, request tracing and a
//! liveness route, and provides the ingestion command used to refresh the
//! store.

pub mod error;
pub mod ingest;

pub use error::Error;

use std::{path::{Path, PathBuf}, sync::Arc};

use axum::{
  Router,
  http::{HeaderValue, Method, header},
  routing::get,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use vista_core::store::InsightStore;

/// Body of `GET /`.
pub const BANNER: &str = "Visualization Dashboard API running";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  pub store_path:   PathBuf,
  /// Origins allowed to call the API with credentials. Empty allows any
  /// origin without credentials.
  #[serde(default)]
  pub cors_origins: Vec<String>,
}

impl ServerConfig {
  /// Load from `path` (optional), then `VISTA_*` variables, then a bare
  /// `PORT` variable, each overriding the last.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "0.0.0.0")?
      .set_default("port", 5000)?
      .set_default("store_path", "vista.db")?
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("VISTA")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("cors_origins"),
      )
      .set_override_option("port", std::env::var("PORT").ok())?
      .build()?
      .try_deserialize()
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: `/` plus the API under `/api`.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: InsightStore + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/", get(|| async { BANNER }))
    .nest("/api", vista_api::api_router(store))
    .layer(cors_layer(&config.cors_origins))
    .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
  if origins.is_empty() {
    return CorsLayer::permissive();
  }

  let mut parsed = Vec::new();
  for origin in origins {
    match HeaderValue::from_str(origin) {
      Ok(value) => parsed.push(value),
      Err(err) => tracing::warn!("ignoring invalid CORS origin '{origin}': {err}"),
    }
  }

  CorsLayer::new()
    .allow_methods([Method::GET])
    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    .allow_credentials(true)
    .allow_origin(parsed)
}

// ─── Listener ─────────────────────────────────────────────────────────────────

/// Bind the configured address. The listening address is logged only once
/// the socket is actually bound.
pub async fn bind(config: &ServerConfig) -> std::io::Result<TcpListener> {
  let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
  tracing::info!("Listening on http://{}", listener.local_addr()?);
  Ok(listener)
}

// ─── Integration tests ────────────────────────────────────────────────────────
