//! One-shot ingestion: replace the store contents with a source dump.

use vista_core::{ingest::parse_dump, store::InsightStore};

use crate::error::Error;

/// Normalise every record in `json` and swap them in for the current store
/// contents. Returns the number of records inserted.
///
/// Nothing is written if the dump fails to parse.
pub async fn ingest<S>(store: &S, json: &str) -> Result<usize, Error>
where
  S: InsightStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let records = parse_dump(json)?;
  tracing::debug!(records = records.len(), "parsed source dump");

  let inserted = store
    .replace_all(records)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;
  tracing::info!(inserted, "ingested insight records");
  Ok(inserted)
}
