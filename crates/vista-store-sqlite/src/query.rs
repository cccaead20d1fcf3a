//! Translation of match expressions and pipelines into SQL.
//!
//! Column names come from fixed identifiers on the core enums; user-supplied
//! values only ever travel as bound parameters.

use rusqlite::types::Value;
use vista_core::{
  filter::{Constraint, MatchExpr, YearBound},
  pipeline::{Accumulator, Direction, Pipeline, SortBy},
};

use crate::encode::INSIGHT_COLUMNS;

/// A SQL statement and its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
  pub sql:    String,
  pub params: Vec<Value>,
}

/// Render `expr` as a `WHERE` clause (empty when `expr` matches everything),
/// appending its parameters to `params`.
pub fn where_clause(expr: &MatchExpr, params: &mut Vec<Value>) -> String {
  let conds: Vec<String> = expr
    .constraints()
    .iter()
    .map(|constraint| match constraint {
      Constraint::Equals { field, value } => {
        params.push(Value::Text(value.clone()));
        format!("{} = ?{}", field.column(), params.len())
      }
      Constraint::NotNull(field) => format!("{} IS NOT NULL", field.column()),
      Constraint::YearAtMost(YearBound::AtMost(bound)) => {
        params.push(Value::Integer(*bound));
        format!("year <= ?{}", params.len())
      }
      Constraint::YearAtMost(YearBound::Unmatchable) => "0".to_owned(),
    })
    .collect();

  if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  }
}

/// `SELECT` of raw records, oldest first.
pub fn find(expr: &MatchExpr, limit: usize) -> Statement {
  let mut params = Vec::new();
  let where_clause = where_clause(expr, &mut params);
  Statement {
    sql: format!("SELECT {INSIGHT_COLUMNS} FROM insights {where_clause} ORDER BY seq LIMIT {limit}"),
    params,
  }
}

/// `SELECT … GROUP BY` for a pipeline. Output columns are `group_key`
/// followed by `s0`, `s1`, … in accumulator order.
pub fn aggregate(pipeline: &Pipeline) -> Statement {
  let mut params = Vec::new();
  let where_clause = where_clause(&pipeline.matching, &mut params);
  let key = pipeline.group.key.column();

  let summaries: Vec<String> = pipeline
    .group
    .accumulators
    .iter()
    .enumerate()
    .map(|(i, acc)| match acc {
      Accumulator::Count => format!("COUNT(*) AS s{i}"),
      Accumulator::Mean(measure) => format!("AVG({}) AS s{i}", measure.column()),
    })
    .collect();

  let order_by = match pipeline.sort {
    None => "group_key ASC".to_owned(),
    Some(sort) => {
      let dir = match sort.direction {
        Direction::Ascending => "ASC",
        Direction::Descending => "DESC",
      };
      match sort.by {
        SortBy::Key => format!("group_key {dir}"),
        SortBy::Summary(i) => format!("s{i} {dir}, group_key ASC"),
      }
    }
  };

  let limit = pipeline
    .limit
    .map(|n| format!(" LIMIT {n}"))
    .unwrap_or_default();

  Statement {
    sql: format!(
      "SELECT {key} AS group_key, {} FROM insights {where_clause} GROUP BY {key} ORDER BY {order_by}{limit}",
      summaries.join(", ")
    ),
    params,
  }
}
