//! The aggregation contract between chart definitions and store backends.
//!
//! A [`Pipeline`] is match → group → sort → limit. Backends translate it into
//! their own query language; [`Pipeline::evaluate`] is the in-process
//! reference semantics they must agree with.

use std::cmp::Ordering;

use serde::Serialize;

use crate::{
  filter::{FilterField, MatchExpr},
  insight::{Insight, Measure},
};

// ─── Grouping ────────────────────────────────────────────────────────────────

/// The field records are partitioned by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
  Year,
  Field(FilterField),
}

impl GroupKey {
  pub fn column(self) -> &'static str {
    match self {
      Self::Year => "year",
      Self::Field(field) => field.column(),
    }
  }

  fn value_of(self, insight: &Insight) -> GroupValue {
    match self {
      Self::Year => GroupValue::Year(insight.year),
      Self::Field(field) => GroupValue::Text(insight.dimension(field).map(str::to_owned)),
    }
  }
}

/// A per-group summary statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulator {
  Count,
  Mean(Measure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
  pub key:          GroupKey,
  pub accumulators: Vec<Accumulator>,
}

// ─── Ordering ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
  /// The group key.
  Key,
  /// The accumulator at this index in [`GroupSpec::accumulators`].
  Summary(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Ascending,
  Descending,
}

/// Ties are always broken by ascending group key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
  pub by:        SortBy,
  pub direction: Direction,
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
  pub matching: MatchExpr,
  pub group:    GroupSpec,
  pub sort:     Option<Sort>,
  pub limit:    Option<usize>,
}

/// A group key value as returned to clients: a year or a category, either of
/// which may be null.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum GroupValue {
  Year(Option<i64>),
  Text(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Summary {
  Count(u64),
  Mean(f64),
}

impl Summary {
  pub fn as_f64(self) -> f64 {
    match self {
      Self::Count(n) => n as f64,
      Self::Mean(m) => m,
    }
  }
}

/// One output row: the group key plus one summary per accumulator, in
/// accumulator order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
  pub key:       GroupValue,
  pub summaries: Vec<Summary>,
}

impl Pipeline {
  /// Run the pipeline over an in-memory slice of records.
  pub fn evaluate(&self, records: &[Insight]) -> Vec<GroupRow> {
    // Group in first-seen order; groups are few so a linear scan is fine.
    let mut groups: Vec<(GroupValue, Vec<&Insight>)> = Vec::new();
    for insight in records.iter().filter(|r| self.matching.matches(r)) {
      let key = self.group.key.value_of(insight);
      match groups.iter_mut().find(|(k, _)| *k == key) {
        Some((_, members)) => members.push(insight),
        None => groups.push((key, vec![insight])),
      }
    }

    let mut rows: Vec<GroupRow> = groups
      .into_iter()
      .map(|(key, members)| GroupRow {
        key,
        summaries: self
          .group
          .accumulators
          .iter()
          .map(|acc| summarise(*acc, &members))
          .collect(),
      })
      .collect();

    match self.sort {
      Some(sort) => rows.sort_by(|a, b| compare_rows(sort, a, b)),
      None => rows.sort_by(|a, b| a.key.cmp(&b.key)),
    }
    if let Some(limit) = self.limit {
      rows.truncate(limit);
    }
    rows
  }
}

fn summarise(acc: Accumulator, members: &[&Insight]) -> Summary {
  match acc {
    Accumulator::Count => Summary::Count(members.len() as u64),
    Accumulator::Mean(measure) => {
      let total: f64 = members.iter().map(|r| r.measure(measure)).sum();
      Summary::Mean(total / members.len() as f64)
    }
  }
}

fn compare_rows(sort: Sort, a: &GroupRow, b: &GroupRow) -> Ordering {
  let primary = match sort.by {
    SortBy::Key => a.key.cmp(&b.key),
    // An index past the accumulators leaves only the key tie-break.
    SortBy::Summary(i) => match (a.summaries.get(i), b.summaries.get(i)) {
      (Some(x), Some(y)) => x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal),
      _ => Ordering::Equal,
    },
  };
  let primary = match sort.direction {
    Direction::Ascending => primary,
    Direction::Descending => primary.reverse(),
  };
  primary.then_with(|| a.key.cmp(&b.key))
}
