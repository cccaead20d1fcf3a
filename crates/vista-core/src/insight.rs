//! Insight records — the unit of data the dashboard aggregates over.
//!
//! Records are immutable once ingested. The store is refreshed by replacing
//! its whole contents, never by updating individual records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::filter::FilterField;

// ─── Stored record ───────────────────────────────────────────────────────────

/// One observation, as held by the store and returned by the raw list
/// endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
  #[serde(rename = "_id")]
  pub id:         Uuid,
  pub intensity:  f64,
  pub likelihood: f64,
  pub relevance:  f64,
  pub sector:     Option<String>,
  pub topic:      Option<String>,
  pub region:     Option<String>,
  pub country:    Option<String>,
  pub pestle:     Option<String>,
  pub source:     Option<String>,
  /// Only present when the source record carried one.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub city:       Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub swot:       Option<String>,
  pub year:       Option<i64>,
}

impl Insight {
  /// Attach a fresh id to a normalised record.
  pub fn from_new(new: NewInsight) -> Self {
    Self {
      id:         Uuid::new_v4(),
      intensity:  new.intensity,
      likelihood: new.likelihood,
      relevance:  new.relevance,
      sector:     new.sector,
      topic:      new.topic,
      region:     new.region,
      country:    new.country,
      pestle:     new.pestle,
      source:     new.source,
      city:       new.city,
      swot:       new.swot,
      year:       new.year,
    }
  }

  /// The value of a categorical dimension.
  pub fn dimension(&self, field: FilterField) -> Option<&str> {
    let value = match field {
      FilterField::Topic => &self.topic,
      FilterField::Sector => &self.sector,
      FilterField::Region => &self.region,
      FilterField::Country => &self.country,
      FilterField::Pestle => &self.pestle,
      FilterField::Source => &self.source,
      FilterField::City => &self.city,
      FilterField::Swot => &self.swot,
    };
    value.as_deref()
  }

  /// The value of a numeric score.
  pub fn measure(&self, measure: Measure) -> f64 {
    match measure {
      Measure::Intensity => self.intensity,
      Measure::Likelihood => self.likelihood,
      Measure::Relevance => self.relevance,
    }
  }
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// A normalised record ready to be inserted. Numeric scores are always set;
/// categorical fields use `None` for "unknown".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewInsight {
  pub intensity:  f64,
  pub likelihood: f64,
  pub relevance:  f64,
  pub sector:     Option<String>,
  pub topic:      Option<String>,
  pub region:     Option<String>,
  pub country:    Option<String>,
  pub pestle:     Option<String>,
  pub source:     Option<String>,
  pub city:       Option<String>,
  pub swot:       Option<String>,
  pub year:       Option<i64>,
}

// ─── Measures ────────────────────────────────────────────────────────────────

/// The numeric scores an aggregation can average over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
  Intensity,
  Likelihood,
  Relevance,
}

impl Measure {
  pub fn column(self) -> &'static str {
    match self {
      Self::Intensity => "intensity",
      Self::Likelihood => "likelihood",
      Self::Relevance => "relevance",
    }
  }
}
