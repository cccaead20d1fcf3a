//! Error type for server-side maintenance operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid source dump: {0}")]
  Dump(#[from] vista_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}
