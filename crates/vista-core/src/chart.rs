//! Chart definitions: which filters each chart ignores, how it groups, and
//! the JSON row shape it returns.
//!
//! | Chart | Ignores | Groups by | Summaries | Order | Limit |
//! |-------|---------|-----------|-----------|-------|-------|
//! | [`Chart::IntensityByYear`] | — | year | mean(intensity) | year asc | — |
//! | [`Chart::CountByCountry`] | country | country | count | count desc | 10 |
//! | [`Chart::CountByTopic`] | topic | topic | count | count desc | — |
//! | [`Chart::SectorRisk`] | sector | sector | mean(likelihood, relevance, intensity) | intensity desc | — |
//! | [`Chart::CountByPestle`] | pestle | pestle | count | — | — |

use serde::Serialize;

use crate::{
  Error, Result,
  filter::{Constraint, FilterField, FilterSelection, MatchExpr, build_match},
  insight::Measure,
  pipeline::{
    Accumulator, Direction, GroupKey, GroupRow, GroupSpec, GroupValue, Pipeline, Sort,
    SortBy, Summary,
  },
};

/// Maximum number of raw records returned by the list endpoint.
pub const LIST_LIMIT: usize = 200;

/// Maximum number of countries returned by [`Chart::CountByCountry`].
pub const TOP_COUNTRIES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chart {
  IntensityByYear,
  CountByCountry,
  CountByTopic,
  SectorRisk,
  CountByPestle,
}

impl Chart {
  /// The dimension this chart groups on, if it is a filterable field. A chart
  /// is never filtered by its own dimension.
  pub fn dimension(self) -> Option<FilterField> {
    match self {
      Self::IntensityByYear => None,
      Self::CountByCountry => Some(FilterField::Country),
      Self::CountByTopic => Some(FilterField::Topic),
      Self::SectorRisk => Some(FilterField::Sector),
      Self::CountByPestle => Some(FilterField::Pestle),
    }
  }

  /// Fields dropped from the selection before matching.
  pub fn ignored(self) -> Vec<FilterField> { self.dimension().into_iter().collect() }

  /// The match expression for this chart: the selection minus the chart's own
  /// dimension, plus "dimension is not null".
  pub fn matching(self, selection: &FilterSelection) -> MatchExpr {
    let expr = build_match(selection, &self.ignored());
    match self.dimension() {
      Some(field) => expr.and(Constraint::NotNull(field)),
      None => expr,
    }
  }

  pub fn pipeline(self, selection: &FilterSelection) -> Pipeline {
    let matching = self.matching(selection);
    let descending = |index| Sort { by: SortBy::Summary(index), direction: Direction::Descending };

    let (key, accumulators, sort, limit) = match self {
      Self::IntensityByYear => (
        GroupKey::Year,
        vec![Accumulator::Mean(Measure::Intensity)],
        Some(Sort { by: SortBy::Key, direction: Direction::Ascending }),
        None,
      ),
      Self::CountByCountry => (
        GroupKey::Field(FilterField::Country),
        vec![Accumulator::Count],
        Some(descending(0)),
        Some(TOP_COUNTRIES),
      ),
      Self::CountByTopic => (
        GroupKey::Field(FilterField::Topic),
        vec![Accumulator::Count],
        Some(descending(0)),
        None,
      ),
      Self::SectorRisk => (
        GroupKey::Field(FilterField::Sector),
        vec![
          Accumulator::Mean(Measure::Likelihood),
          Accumulator::Mean(Measure::Relevance),
          Accumulator::Mean(Measure::Intensity),
        ],
        Some(descending(2)),
        None,
      ),
      Self::CountByPestle => (
        GroupKey::Field(FilterField::Pestle),
        vec![Accumulator::Count],
        None,
        None,
      ),
    };

    Pipeline { matching, group: GroupSpec { key, accumulators }, sort, limit }
  }
}

// ─── Response rows ───────────────────────────────────────────────────────────

/// Row of `/avg-intensity-by-year`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearIntensity {
  #[serde(rename = "_id")]
  pub year:          Option<i64>,
  #[serde(rename = "avgIntensity")]
  pub avg_intensity: f64,
}

/// Row of the `/count-by-*` endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionCount {
  #[serde(rename = "_id")]
  pub value: Option<String>,
  pub count: u64,
}

/// Row of `/sector-risk-analysis`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorRisk {
  #[serde(rename = "_id")]
  pub sector:         Option<String>,
  pub avg_likelihood: f64,
  pub avg_relevance:  f64,
  pub avg_intensity:  f64,
}

fn mean(row: &GroupRow, index: usize) -> Result<f64> {
  match row.summaries.get(index) {
    Some(Summary::Mean(m)) => Ok(*m),
    other => Err(Error::UnexpectedSummary(format!("expected mean at {index}, got {other:?}"))),
  }
}

fn count(row: &GroupRow, index: usize) -> Result<u64> {
  match row.summaries.get(index) {
    Some(Summary::Count(n)) => Ok(*n),
    other => Err(Error::UnexpectedSummary(format!("expected count at {index}, got {other:?}"))),
  }
}

fn text_key(row: &GroupRow) -> Result<Option<String>> {
  match &row.key {
    GroupValue::Text(value) => Ok(value.clone()),
    GroupValue::Year(_) => Err(Error::UnexpectedGroupKey("year")),
  }
}

impl TryFrom<GroupRow> for YearIntensity {
  type Error = Error;

  fn try_from(row: GroupRow) -> Result<Self> {
    let year = match row.key {
      GroupValue::Year(year) => year,
      GroupValue::Text(_) => return Err(Error::UnexpectedGroupKey("text")),
    };
    Ok(Self { year, avg_intensity: mean(&row, 0)? })
  }
}

impl TryFrom<GroupRow> for DimensionCount {
  type Error = Error;

  fn try_from(row: GroupRow) -> Result<Self> {
    Ok(Self { value: text_key(&row)?, count: count(&row, 0)? })
  }
}

impl TryFrom<GroupRow> for SectorRisk {
  type Error = Error;

  fn try_from(row: GroupRow) -> Result<Self> {
    Ok(Self {
      sector:         text_key(&row)?,
      avg_likelihood: mean(&row, 0)?,
      avg_relevance:  mean(&row, 1)?,
      avg_intensity:  mean(&row, 2)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::filter::YearBound;

  const ALL: [Chart; 5] = [
    Chart::IntensityByYear,
    Chart::CountByCountry,
    Chart::CountByTopic,
    Chart::SectorRisk,
    Chart::CountByPestle,
  ];

  fn full_selection() -> FilterSelection {
    FilterField::all()
      .fold(FilterSelection::new(), |s, f| s.with(f, "x"))
      .with_end_year("2017")
  }

  #[test]
  fn chart_never_filters_its_own_dimension() {
    for chart in ALL {
      let expr = chart.matching(&full_selection());
      if let Some(field) = chart.dimension() {
        assert!(
          !expr
            .constraints()
            .iter()
            .any(|c| matches!(c, Constraint::Equals { field: f, .. } if *f == field)),
          "{chart:?} filtered by {field:?}"
        );
        assert!(expr.constraints().contains(&Constraint::NotNull(field)));
      }
    }
  }

  #[test]
  fn intensity_by_year_keeps_every_filter() {
    let expr = Chart::IntensityByYear.matching(&full_selection());
    assert_eq!(expr, build_match(&full_selection(), &[]));
  }

  #[test]
  fn every_chart_honours_end_year() {
    for chart in ALL {
      let expr = chart.matching(&full_selection());
      assert!(
        expr.constraints().contains(&Constraint::YearAtMost(YearBound::AtMost(2017))),
        "{chart:?}"
      );
    }
  }

  #[test]
  fn only_country_is_capped() {
    let selection = FilterSelection::new();
    assert_eq!(Chart::CountByCountry.pipeline(&selection).limit, Some(TOP_COUNTRIES));
    assert_eq!(Chart::CountByTopic.pipeline(&selection).limit, None);
    assert_eq!(Chart::CountByPestle.pipeline(&selection).limit, None);
  }

  #[test]
  fn sector_risk_sorts_by_mean_intensity() {
    let pipeline = Chart::SectorRisk.pipeline(&FilterSelection::new());
    let Some(Sort { by: SortBy::Summary(i), direction: Direction::Descending }) = pipeline.sort
    else {
      panic!("unexpected sort {:?}", pipeline.sort);
    };
    assert_eq!(pipeline.group.accumulators[i], Accumulator::Mean(Measure::Intensity));
  }

  #[test]
  fn rows_convert_to_response_shapes() {
    let row = GroupRow {
      key:       GroupValue::Text(Some("Energy".into())),
      summaries: vec![Summary::Mean(2.0), Summary::Mean(3.0), Summary::Mean(4.5)],
    };
    let risk = SectorRisk::try_from(row).unwrap();
    let json = serde_json::to_value(&risk).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "_id": "Energy",
        "avgLikelihood": 2.0,
        "avgRelevance": 3.0,
        "avgIntensity": 4.5,
      })
    );

    let count = DimensionCount::try_from(GroupRow {
      key:       GroupValue::Text(None),
      summaries: vec![Summary::Count(7)],
    })
    .unwrap();
    assert_eq!(serde_json::to_value(&count).unwrap(), serde_json::json!({ "_id": null, "count": 7 }));
  }

  #[test]
  fn mismatched_rows_are_rejected() {
    let row = GroupRow { key: GroupValue::Year(Some(2016)), summaries: vec![Summary::Count(1)] };
    assert!(DimensionCount::try_from(row.clone()).is_err());
    assert!(YearIntensity::try_from(row).is_err());
  }
}
