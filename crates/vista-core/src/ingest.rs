//! Normalisation of raw source records into [`NewInsight`]s.
//!
//! The source dump is loosely typed: scores may be blank strings, categories
//! may be empty, and the publication date is free text. Everything is coerced
//! here so the store only ever sees the clean data model.

use chrono::{DateTime, Datelike as _, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;

use crate::{Result, insight::NewInsight};

/// Date-time layouts seen in `published`, tried in order.
const DATE_TIME_FORMATS: &[&str] = &["%B, %d %Y %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// One record of the source dump. Fields the data model does not use are
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceRecord {
  #[serde(default)]
  pub intensity:  Value,
  #[serde(default)]
  pub likelihood: Value,
  #[serde(default)]
  pub relevance:  Value,
  #[serde(default)]
  pub sector:     Value,
  #[serde(default)]
  pub topic:      Value,
  #[serde(default)]
  pub region:     Value,
  #[serde(default)]
  pub country:    Value,
  #[serde(default)]
  pub pestle:     Value,
  #[serde(default)]
  pub source:     Value,
  #[serde(default)]
  pub city:       Value,
  #[serde(default)]
  pub swot:       Value,
  #[serde(default)]
  pub published:  Value,
}

impl SourceRecord {
  pub fn normalise(self) -> NewInsight {
    NewInsight {
      intensity:  score(&self.intensity),
      likelihood: score(&self.likelihood),
      relevance:  score(&self.relevance),
      sector:     category(self.sector),
      topic:      category(self.topic),
      region:     category(self.region),
      country:    category(self.country),
      pestle:     category(self.pestle),
      source:     category(self.source),
      city:       category(self.city),
      swot:       category(self.swot),
      year:       category(self.published).as_deref().and_then(publication_year),
    }
  }
}

/// Parse a JSON array of source records and normalise each one.
pub fn parse_dump(json: &str) -> Result<Vec<NewInsight>> {
  let records: Vec<SourceRecord> = serde_json::from_str(json)?;
  Ok(records.into_iter().map(SourceRecord::normalise).collect())
}

/// Numeric score; anything missing, blank or non-numeric is 0.
fn score(value: &Value) -> f64 {
  match value {
    Value::Number(n) => n.as_f64().unwrap_or(0.0),
    Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0),
    Value::Bool(true) => 1.0,
    _ => 0.0,
  }
}

/// Categorical value; empty and null both mean "unknown".
fn category(value: Value) -> Option<String> {
  match value {
    Value::String(s) if !s.is_empty() => Some(s),
    Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
    Value::Bool(true) => Some("true".to_owned()),
    _ => None,
  }
}

/// Calendar year of a publication date, or `None` if it cannot be read.
pub fn publication_year(raw: &str) -> Option<i64> {
  let raw = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(i64::from(dt.year()));
  }
  for format in DATE_TIME_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
      return Some(i64::from(dt.year()));
    }
  }
  NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().map(|d| i64::from(d.year()))
}
