//! Handlers for `/insights` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/insights` | Up to 200 raw records |
//! | `GET`  | `/insights/avg-intensity-by-year` | `[{_id, avgIntensity}]`, year ascending |
//! | `GET`  | `/insights/count-by-country` | Top 10 `[{_id, count}]`; ignores `country` |
//! | `GET`  | `/insights/count-by-topic` | `[{_id, count}]`; ignores `topic` |
//! | `GET`  | `/insights/sector-risk-analysis` | `[{_id, avgLikelihood, avgRelevance, avgIntensity}]`; ignores `sector` |
//! | `GET`  | `/insights/count-by-pestle` | `[{_id, count}]`; ignores `pestle` |
//! | `GET`  | `/insights/filters` | Distinct values per field; no parameters |
//!
//! Every endpoint except `/filters` accepts the filter keys `topic`, `sector`,
//! `region`, `country`, `pestle`, `source`, `city`, `swot` and `endYear`.
//! Other keys are ignored and values are never rejected.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use vista_core::{
  chart::{Chart, DimensionCount, LIST_LIMIT, SectorRisk, YearIntensity},
  filter::{FilterSelection, build_match},
  insight::Insight,
  options::FilterOptions,
  pipeline::GroupRow,
  store::InsightStore,
};

use crate::error::ApiError;

/// Raw query string pairs, in order of appearance.
type FilterQuery = Query<Vec<(String, String)>>;

fn selection(Query(pairs): FilterQuery) -> FilterSelection { FilterSelection::from_pairs(pairs) }

/// Run `chart` for `selection` and convert each group into its response row.
async fn chart_rows<S, T>(
  store: &S,
  chart: Chart,
  selection: &FilterSelection,
) -> Result<Vec<T>, ApiError>
where
  S: InsightStore,
  T: TryFrom<GroupRow, Error = vista_core::Error>,
{
  let rows = store
    .aggregate(&chart.pipeline(selection))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(rows.into_iter().map(T::try_from).collect::<Result<_, _>>()?)
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /insights[?topic=...][&endYear=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  query: FilterQuery,
) -> Result<Json<Vec<Insight>>, ApiError>
where
  S: InsightStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let matching = build_match(&selection(query), &[]);
  let insights = store
    .find(&matching, LIST_LIMIT)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(insights))
}

// ─── Aggregations ─────────────────────────────────────────────────────────────

/// `GET /insights/avg-intensity-by-year`
pub async fn avg_intensity_by_year<S>(
  State(store): State<Arc<S>>,
  query: FilterQuery,
) -> Result<Json<Vec<YearIntensity>>, ApiError>
where
  S: InsightStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let rows = chart_rows(store.as_ref(), Chart::IntensityByYear, &selection(query)).await?;
  Ok(Json(rows))
}

/// `GET /insights/count-by-country`
pub async fn count_by_country<S>(
  State(store): State<Arc<S>>,
  query: FilterQuery,
) -> Result<Json<Vec<DimensionCount>>, ApiError>
where
  S: InsightStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let rows = chart_rows(store.as_ref(), Chart::CountByCountry, &selection(query)).await?;
  Ok(Json(rows))
}

/// `GET /insights/count-by-topic`
pub async fn count_by_topic<S>(
  State(store): State<Arc<S>>,
  query: FilterQuery,
) -> Result<Json<Vec<DimensionCount>>, ApiError>
where
  S: InsightStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let rows = chart_rows(store.as_ref(), Chart::CountByTopic, &selection(query)).await?;
  Ok(Json(rows))
}

/// `GET /insights/sector-risk-analysis`
pub async fn sector_risk_analysis<S>(
  State(store): State<Arc<S>>,
  query: FilterQuery,
) -> Result<Json<Vec<SectorRisk>>, ApiError>
where
  S: InsightStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let rows = chart_rows(store.as_ref(), Chart::SectorRisk, &selection(query)).await?;
  Ok(Json(rows))
}

/// `GET /insights/count-by-pestle`
pub async fn count_by_pestle<S>(
  State(store): State<Arc<S>>,
  query: FilterQuery,
) -> Result<Json<Vec<DimensionCount>>, ApiError>
where
  S: InsightStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let rows = chart_rows(store.as_ref(), Chart::CountByPestle, &selection(query)).await?;
  Ok(Json(rows))
}

// ─── Filter options ───────────────────────────────────────────────────────────

/// `GET /insights/filters` — unfiltered by design.
pub async fn filters<S>(State(store): State<Arc<S>>) -> Result<Json<FilterOptions>, ApiError>
where
  S: InsightStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let options = FilterOptions::collect(store.as_ref())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(options))
}
