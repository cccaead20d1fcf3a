//! SQL schema for the Vista SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Rows are never updated. The table is emptied and refilled on ingestion.
CREATE TABLE IF NOT EXISTS insights (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,  -- insertion order
    insight_id  TEXT    NOT NULL UNIQUE,
    intensity   REAL    NOT NULL DEFAULT 0,
    likelihood  REAL    NOT NULL DEFAULT 0,
    relevance   REAL    NOT NULL DEFAULT 0,
    sector      TEXT,
    topic       TEXT,
    region      TEXT,
    country     TEXT,
    pestle      TEXT,
    source      TEXT,
    city        TEXT,
    swot        TEXT,
    year        INTEGER
);

CREATE INDEX IF NOT EXISTS insights_year_idx    ON insights(year);
CREATE INDEX IF NOT EXISTS insights_country_idx ON insights(country);
CREATE INDEX IF NOT EXISTS insights_topic_idx   ON insights(topic);
CREATE INDEX IF NOT EXISTS insights_sector_idx  ON insights(sector);
CREATE INDEX IF NOT EXISTS insights_pestle_idx  ON insights(pestle);

PRAGMA user_version = 1;
";
