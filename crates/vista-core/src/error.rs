//! Error types for `vista-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unexpected summary in aggregation row: {0}")]
  UnexpectedSummary(String),

  #[error("unexpected {0} group key in aggregation row")]
  UnexpectedGroupKey(&'static str),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
