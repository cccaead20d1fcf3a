//! The `InsightStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `vista-store-sqlite`).
//! Higher layers (`vista-api`, `vista-server`) depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use crate::{
  filter::{FilterField, MatchExpr},
  insight::{Insight, NewInsight},
  pipeline::{GroupRow, Pipeline},
};

/// Abstraction over an insight store backend.
///
/// Records are read-only once stored; the only write is a wholesale
/// [`replace_all`](InsightStore::replace_all).
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait InsightStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Up to `limit` records matching `matching`, in insertion order.
  fn find<'a>(
    &'a self,
    matching: &'a MatchExpr,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Insight>, Self::Error>> + Send + 'a;

  /// Run a match → group → sort → limit pipeline. Rows must agree with
  /// [`Pipeline::evaluate`].
  fn aggregate<'a>(
    &'a self,
    pipeline: &'a Pipeline,
  ) -> impl Future<Output = Result<Vec<GroupRow>, Self::Error>> + Send + 'a;

  /// Distinct values of a categorical field across the whole store. `None`
  /// is included when any record has a null there.
  fn distinct_values(
    &self,
    field: FilterField,
  ) -> impl Future<Output = Result<Vec<Option<String>>, Self::Error>> + Send + '_;

  /// Distinct publication years across the whole store.
  fn distinct_years(
    &self,
  ) -> impl Future<Output = Result<Vec<Option<i64>>, Self::Error>> + Send + '_;

  /// Delete every record and insert `records` in their place, atomically.
  /// Returns the number inserted.
  fn replace_all(
    &self,
    records: Vec<NewInsight>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
