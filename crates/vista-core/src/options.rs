//! The universe of filter choices offered to the dashboard.

use serde::Serialize;

use crate::{filter::FilterField, store::InsightStore};

/// Distinct values per filterable field, taken over the whole store. The
/// current filter selection never narrows these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
  pub topics:    Vec<Option<String>>,
  pub sectors:   Vec<Option<String>>,
  pub regions:   Vec<Option<String>>,
  pub countries: Vec<Option<String>>,
  pub pestles:   Vec<Option<String>>,
  pub sources:   Vec<Option<String>>,
  pub years:     Vec<Option<i64>>,
  pub cities:    Vec<Option<String>>,
  pub swots:     Vec<Option<String>>,
}

impl FilterOptions {
  pub async fn collect<S: InsightStore>(store: &S) -> Result<Self, S::Error> {
    let mut years = store.distinct_years().await?;
    sort_years(&mut years);

    Ok(Self {
      topics: distinct(store, FilterField::Topic).await?,
      sectors: distinct(store, FilterField::Sector).await?,
      regions: distinct(store, FilterField::Region).await?,
      countries: distinct(store, FilterField::Country).await?,
      pestles: distinct(store, FilterField::Pestle).await?,
      sources: distinct(store, FilterField::Source).await?,
      years,
      cities: distinct(store, FilterField::City).await?,
      swots: distinct(store, FilterField::Swot).await?,
    })
  }
}

async fn distinct<S: InsightStore>(
  store: &S,
  field: FilterField,
) -> Result<Vec<Option<String>>, S::Error> {
  let mut values = store.distinct_values(field).await?;
  if field.is_optional_extra() {
    values.retain(Option::is_some);
  }
  Ok(values)
}

/// Ascending, with an unknown year last.
pub fn sort_years(years: &mut [Option<i64>]) {
  years.sort_by_key(|y| (y.is_none(), *y));
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn years_ascend_with_null_last() {
    let mut years = vec![Some(2017), None, Some(2009), Some(2016)];
    sort_years(&mut years);
    assert_eq!(years, vec![Some(2009), Some(2016), Some(2017), None]);
  }

  #[test]
  fn serialises_with_plural_keys() {
    let json = serde_json::to_value(FilterOptions {
      sectors: vec![Some("Energy".into()), None],
      years: vec![Some(2016)],
      ..FilterOptions::default()
    })
    .unwrap();
    assert_eq!(json["sectors"], serde_json::json!(["Energy", null]));
    assert_eq!(json["years"], serde_json::json!([2016]));
    assert_eq!(json["swots"], serde_json::json!([]));
  }
}
