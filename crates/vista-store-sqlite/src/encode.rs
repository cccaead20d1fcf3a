//! Conversions between domain types and SQLite rows.
//!
//! UUIDs are stored as hyphenated lowercase strings. Scores are REAL; years
//! are INTEGER. Categorical fields are nullable TEXT.

use vista_core::insight::Insight;
use uuid::Uuid;

use crate::Result;

/// Column list shared by every record read and write, in row order.
pub const INSIGHT_COLUMNS: &str = "insight_id, intensity, likelihood, relevance, sector, topic, \
                                   region, country, pestle, source, city, swot, year";

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Raw row ──────────────────────────────────────────────────────────────────

/// An `insights` row as read from SQLite, before the id is parsed.
#[derive(Debug)]
pub struct RawInsight {
  pub insight_id: String,
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

impl RawInsight {
  /// Read a row selected with [`INSIGHT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      insight_id: row.get(0)?,
      intensity:  row.get(1)?,
      likelihood: row.get(2)?,
      relevance:  row.get(3)?,
      sector:     row.get(4)?,
      topic:      row.get(5)?,
      region:     row.get(6)?,
      country:    row.get(7)?,
      pestle:     row.get(8)?,
      source:     row.get(9)?,
      city:       row.get(10)?,
      swot:       row.get(11)?,
      year:       row.get(12)?,
    })
  }

  pub fn into_insight(self) -> Result<Insight> {
    Ok(Insight {
      id:         decode_uuid(&self.insight_id)?,
      intensity:  self.intensity,
      likelihood: self.likelihood,
      relevance:  self.relevance,
      sector:     self.sector,
      topic:      self.topic,
      region:     self.region,
      country:    self.country,
      pestle:     self.pestle,
      source:     self.source,
      city:       self.city,
      swot:       self.swot,
      year:       self.year,
    })
  }

  pub fn from_insight(insight: Insight) -> Self {
    Self {
      insight_id: encode_uuid(insight.id),
      intensity:  insight.intensity,
      likelihood: insight.likelihood,
      relevance:  insight.relevance,
      sector:     insight.sector,
      topic:      insight.topic,
      region:     insight.region,
      country:    insight.country,
      pestle:     insight.pestle,
      source:     insight.source,
      city:       insight.city,
      swot:       insight.swot,
      year:       insight.year,
    }
  }
}
