//! JSON REST API for Vista.
//!
//! Exposes an axum [`Router`] backed by any [`vista_core::store::InsightStore`].
//! CORS, tracing, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", vista_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod insights;

use std::sync::Arc;

use axum::{Router, routing::get};
use vista_core::store::InsightStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: InsightStore + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Raw records
    .route("/insights", get(insights::list::<S>))
    .route("/insights/", get(insights::list::<S>))
    // Chart aggregations
    .route("/insights/avg-intensity-by-year", get(insights::avg_intensity_by_year::<S>))
    .route("/insights/count-by-country", get(insights::count_by_country::<S>))
    .route("/insights/count-by-topic", get(insights::count_by_topic::<S>))
    .route("/insights/sector-risk-analysis", get(insights::sector_risk_analysis::<S>))
    .route("/insights/count-by-pestle", get(insights::count_by_pestle::<S>))
    // Dropdown population
    .route("/insights/filters", get(insights::filters::<S>))
    .with_state(store)
}
