//! Core types and trait definitions for the Vista insight dashboard.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod chart;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod insight;
pub mod options;
pub mod pipeline;
pub mod store;

pub use error::{Error, Result};
