//! Integration tests for `SqliteStore` against an in-memory database.

use vista_core::{
  chart::{Chart, DimensionCount, LIST_LIMIT, TOP_COUNTRIES, YearIntensity},
  filter::{FilterField, FilterSelection, MatchExpr, build_match},
  insight::NewInsight,
  options::FilterOptions,
  pipeline::{GroupRow, Summary},
  store::InsightStore,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn insight(country: Option<&str>, year: Option<i64>, intensity: f64) -> NewInsight {
  NewInsight {
    country: country.map(str::to_owned),
    year,
    intensity,
    ..NewInsight::default()
  }
}

/// The three-record store used by the aggregation scenarios.
async fn scenario_store() -> SqliteStore {
  let s = store().await;
  s.replace_all(vec![
    insight(Some("USA"), Some(2016), 4.0),
    insight(Some("USA"), Some(2017), 6.0),
    insight(None, Some(2016), 2.0),
  ])
  .await
  .unwrap();
  s
}

fn convert<T: TryFrom<GroupRow, Error = vista_core::Error>>(rows: Vec<GroupRow>) -> Vec<T> {
  rows.into_iter().map(|r| T::try_from(r).unwrap()).collect()
}

// ─── Replace / find ──────────────────────────────────────────────────────────

#[tokio::test]
async fn replace_all_swaps_contents() {
  let s = store().await;
  assert_eq!(s.replace_all(vec![NewInsight::default(); 3]).await.unwrap(), 3);
  assert_eq!(s.count().await.unwrap(), 3);

  assert_eq!(s.replace_all(vec![insight(Some("India"), None, 1.0)]).await.unwrap(), 1);
  let all = s.find(&MatchExpr::all(), LIST_LIMIT).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].country.as_deref(), Some("India"));
}

#[tokio::test]
async fn find_round_trips_every_field() {
  let s = store().await;
  let record = NewInsight {
    intensity:  6.0,
    likelihood: 3.0,
    relevance:  2.0,
    sector:     Some("Energy".into()),
    topic:      Some("gas".into()),
    region:     Some("Northern America".into()),
    country:    Some("United States of America".into()),
    pestle:     Some("Industries".into()),
    source:     Some("EIA".into()),
    city:       Some("Houston".into()),
    swot:       None,
    year:       Some(2017),
  };
  s.replace_all(vec![record.clone()]).await.unwrap();

  let found = s.find(&MatchExpr::all(), LIST_LIMIT).await.unwrap();
  assert_eq!(found.len(), 1);
  let got = &found[0];
  assert_eq!(got.intensity, record.intensity);
  assert_eq!(got.sector, record.sector);
  assert_eq!(got.city, record.city);
  assert_eq!(got.swot, None);
  assert_eq!(got.year, Some(2017));
}

#[tokio::test]
async fn find_caps_and_keeps_insertion_order() {
  let s = store().await;
  let records: Vec<_> = (0..250).map(|i| insight(None, Some(1900 + i), 0.0)).collect();
  s.replace_all(records).await.unwrap();

  let found = s.find(&MatchExpr::all(), LIST_LIMIT).await.unwrap();
  assert_eq!(found.len(), LIST_LIMIT);
  assert_eq!(found[0].year, Some(1900));
  assert_eq!(found[199].year, Some(2099));
}

#[tokio::test]
async fn find_applies_filters() {
  let s = scenario_store().await;
  let selection = FilterSelection::new()
    .with(FilterField::Country, "USA")
    .with_end_year("2016");
  let found = s.find(&build_match(&selection, &[]), LIST_LIMIT).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].intensity, 4.0);
}

#[tokio::test]
async fn non_numeric_end_year_matches_nothing() {
  let s = scenario_store().await;
  let selection = FilterSelection::new().with_end_year("next year");
  let found = s.find(&build_match(&selection, &[]), LIST_LIMIT).await.unwrap();
  assert!(found.is_empty());
}

// ─── Aggregations ────────────────────────────────────────────────────────────

#[tokio::test]
async fn avg_intensity_by_year_scenario() {
  let s = scenario_store().await;
  let rows = s
    .aggregate(&Chart::IntensityByYear.pipeline(&FilterSelection::new()))
    .await
    .unwrap();
  assert_eq!(convert::<YearIntensity>(rows), vec![
    YearIntensity { year: Some(2016), avg_intensity: 3.0 },
    YearIntensity { year: Some(2017), avg_intensity: 6.0 },
  ]);
}

#[tokio::test]
async fn count_by_country_excludes_null() {
  let s = scenario_store().await;
  let rows = s
    .aggregate(&Chart::CountByCountry.pipeline(&FilterSelection::new()))
    .await
    .unwrap();
  assert_eq!(convert::<DimensionCount>(rows), vec![DimensionCount {
    value: Some("USA".into()),
    count: 2,
  }]);
}

#[tokio::test]
async fn count_by_country_ignores_country_filter() {
  let s = store().await;
  s.replace_all(vec![
    insight(Some("France"), None, 0.0),
    insight(Some("India"), None, 0.0),
    insight(Some("India"), None, 0.0),
  ])
  .await
  .unwrap();

  let selection = FilterSelection::new().with(FilterField::Country, "France");
  let rows = s.aggregate(&Chart::CountByCountry.pipeline(&selection)).await.unwrap();
  assert_eq!(convert::<DimensionCount>(rows), vec![
    DimensionCount { value: Some("India".into()), count: 2 },
    DimensionCount { value: Some("France".into()), count: 1 },
  ]);
}

#[tokio::test]
async fn count_by_country_keeps_top_ten_but_topic_is_uncapped() {
  let s = store().await;
  let records: Vec<_> = (0..15)
    .map(|i| NewInsight {
      country: Some(format!("country-{i:02}")),
      topic: Some(format!("topic-{i:02}")),
      ..NewInsight::default()
    })
    .collect();
  s.replace_all(records).await.unwrap();

  let none = FilterSelection::new();
  let countries = s.aggregate(&Chart::CountByCountry.pipeline(&none)).await.unwrap();
  assert_eq!(countries.len(), TOP_COUNTRIES);
  let topics = s.aggregate(&Chart::CountByTopic.pipeline(&none)).await.unwrap();
  assert_eq!(topics.len(), 15);
}

#[tokio::test]
async fn sector_risk_orders_by_mean_intensity() {
  let s = store().await;
  let sector = |name: &str, intensity: f64, likelihood: f64| NewInsight {
    sector: Some(name.to_owned()),
    intensity,
    likelihood,
    ..NewInsight::default()
  };
  s.replace_all(vec![
    sector("Energy", 2.0, 1.0),
    sector("Energy", 4.0, 3.0),
    sector("Retail", 9.0, 5.0),
    NewInsight { intensity: 50.0, ..NewInsight::default() },
  ])
  .await
  .unwrap();

  let rows = s
    .aggregate(&Chart::SectorRisk.pipeline(&FilterSelection::new()))
    .await
    .unwrap();
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[0].summaries[2], Summary::Mean(9.0));
  assert_eq!(rows[1].summaries, vec![Summary::Mean(2.0), Summary::Mean(0.0), Summary::Mean(3.0)]);
}

#[tokio::test]
async fn aggregations_agree_with_reference_evaluation() {
  let s = store().await;
  let records: Vec<_> = (0..40)
    .map(|i| NewInsight {
      intensity: f64::from(i % 7),
      likelihood: f64::from(i % 3),
      relevance: f64::from(i % 5),
      sector: (i % 4 != 0).then(|| format!("sector-{}", i % 3)),
      topic: Some(format!("topic-{}", i % 6)),
      country: (i % 5 != 0).then(|| format!("country-{}", i % 4)),
      pestle: (i % 2 == 0).then(|| "Economic".to_owned()),
      year: (i % 9 != 0).then(|| 2010 + i64::from(i % 6)),
      ..NewInsight::default()
    })
    .collect();
  s.replace_all(records).await.unwrap();
  let stored = s.find(&MatchExpr::all(), LIST_LIMIT).await.unwrap();

  let selections = [
    FilterSelection::new(),
    FilterSelection::new().with(FilterField::Topic, "topic-2"),
    FilterSelection::new().with_end_year("2013"),
    FilterSelection::new()
      .with(FilterField::Sector, "sector-1")
      .with(FilterField::Country, "country-3"),
  ];
  for selection in &selections {
    for chart in [
      Chart::IntensityByYear,
      Chart::CountByCountry,
      Chart::CountByTopic,
      Chart::SectorRisk,
      Chart::CountByPestle,
    ] {
      let pipeline = chart.pipeline(selection);
      let from_sql = s.aggregate(&pipeline).await.unwrap();
      assert_eq!(from_sql, pipeline.evaluate(&stored), "{chart:?} / {selection:?}");
    }
  }
}

#[tokio::test]
async fn aggregation_is_idempotent() {
  let s = scenario_store().await;
  let pipeline = Chart::CountByPestle.pipeline(&FilterSelection::new());
  let first = s.aggregate(&pipeline).await.unwrap();
  let second = s.aggregate(&pipeline).await.unwrap();
  assert_eq!(first, second);
}

// ─── Distinct values ─────────────────────────────────────────────────────────

#[tokio::test]
async fn distinct_values_dedupe_and_keep_null() {
  let s = store().await;
  let energy = || NewInsight { sector: Some("Energy".into()), ..NewInsight::default() };
  s.replace_all(vec![energy(), energy()]).await.unwrap();
  assert_eq!(
    s.distinct_values(FilterField::Sector).await.unwrap(),
    vec![Some("Energy".to_owned())]
  );

  s.replace_all(vec![energy(), NewInsight::default()]).await.unwrap();
  assert_eq!(
    s.distinct_values(FilterField::Sector).await.unwrap(),
    vec![None, Some("Energy".to_owned())]
  );
}

#[tokio::test]
async fn filter_options_cover_whole_store() {
  let s = scenario_store().await;
  let options = FilterOptions::collect(&s).await.unwrap();
  assert_eq!(options.countries, vec![None, Some("USA".to_owned())]);
  assert_eq!(options.years, vec![Some(2016), Some(2017)]);
  assert!(options.cities.is_empty());
  assert!(options.swots.is_empty());
}
