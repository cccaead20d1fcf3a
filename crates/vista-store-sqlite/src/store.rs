//! [`SqliteStore`] — the SQLite implementation of [`InsightStore`].

use std::path::Path;

use vista_core::{
  filter::{FilterField, MatchExpr},
  insight::{Insight, NewInsight},
  pipeline::{Accumulator, GroupKey, GroupRow, GroupValue, Pipeline, Summary},
  store::InsightStore,
};

use crate::{
  Result,
  encode::{INSIGHT_COLUMNS, RawInsight},
  query::{self, Statement},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An insight store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  ///
  /// Fails if the file cannot be opened or the schema cannot be applied; the
  /// caller decides whether that is fatal.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of stored records.
  pub async fn count(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM insights", [], |r| r.get(0))?))
      .await?;
    Ok(n as usize)
  }
}

// ─── InsightStore impl ───────────────────────────────────────────────────────

impl InsightStore for SqliteStore {
  type Error = crate::Error;

  async fn find(&self, matching: &MatchExpr, limit: usize) -> Result<Vec<Insight>> {
    let Statement { sql, params } = query::find(matching, limit);

    let raws: Vec<RawInsight> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawInsight::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInsight::into_insight).collect()
  }

  async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<GroupRow>> {
    let Statement { sql, params } = query::aggregate(pipeline);
    let key = pipeline.group.key;
    let accumulators = pipeline.group.accumulators.clone();

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            let key = match key {
              GroupKey::Year => GroupValue::Year(row.get(0)?),
              GroupKey::Field(_) => GroupValue::Text(row.get(0)?),
            };
            let summaries = accumulators
              .iter()
              .enumerate()
              .map(|(i, acc)| match acc {
                Accumulator::Count => row.get::<_, i64>(i + 1).map(|n| Summary::Count(n as u64)),
                Accumulator::Mean(_) => row.get::<_, f64>(i + 1).map(Summary::Mean),
              })
              .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(GroupRow { key, summaries })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  async fn distinct_values(&self, field: FilterField) -> Result<Vec<Option<String>>> {
    let column = field.column();
    let values = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT DISTINCT {column} FROM insights ORDER BY {column}"))?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<Option<String>>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(values)
  }

  async fn distinct_years(&self) -> Result<Vec<Option<i64>>> {
    let years = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT DISTINCT year FROM insights ORDER BY year")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<Option<i64>>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(years)
  }

  async fn replace_all(&self, records: Vec<NewInsight>) -> Result<usize> {
    let raws: Vec<RawInsight> = records
      .into_iter()
      .map(|r| RawInsight::from_insight(Insight::from_new(r)))
      .collect();

    let (deleted, inserted) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let deleted = tx.execute("DELETE FROM insights", [])?;
        {
          let mut stmt = tx.prepare(&format!(
            "INSERT INTO insights ({INSIGHT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
          ))?;
          for r in &raws {
            stmt.execute(rusqlite::params![
              r.insight_id,
              r.intensity,
              r.likelihood,
              r.relevance,
              r.sector,
              r.topic,
              r.region,
              r.country,
              r.pestle,
              r.source,
              r.city,
              r.swot,
              r.year,
            ])?;
          }
        }
        tx.commit()?;
        Ok((deleted, raws.len()))
      })
      .await?;

    tracing::debug!(deleted, inserted, "replaced insight records");
    Ok(inserted)
  }
}
