//! Filter selections and the match expressions built from them.
//!
//! The dashboard sends its whole filter selection with every chart request.
//! [`build_match`] turns that selection into a [`MatchExpr`], leaving out the
//! fields a chart groups by so a filter never collapses its own chart to a
//! single bar.

use std::collections::BTreeMap;

use strum::{EnumIter, EnumString, IntoEnumIterator as _};

use crate::insight::Insight;

/// The query key carrying the upper year bound.
pub const END_YEAR_KEY: &str = "endYear";

// ─── Fields ──────────────────────────────────────────────────────────────────

/// A categorical dimension the dashboard can filter on.
///
/// Declaration order is the order constraints appear in a built
/// [`MatchExpr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum FilterField {
  Topic,
  Sector,
  Region,
  Country,
  Pestle,
  Source,
  City,
  Swot,
}

impl FilterField {
  /// Every filterable field, in constraint order.
  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }

  /// Name of the backing store column. Always a fixed identifier, safe to
  /// splice into SQL.
  pub fn column(self) -> &'static str {
    match self {
      Self::Topic => "topic",
      Self::Sector => "sector",
      Self::Region => "region",
      Self::Country => "country",
      Self::Pestle => "pestle",
      Self::Source => "source",
      Self::City => "city",
      Self::Swot => "swot",
    }
  }

  /// `city` and `swot` are not part of the ingested data model; a null there
  /// means the field was never set rather than "unknown".
  pub fn is_optional_extra(self) -> bool { matches!(self, Self::City | Self::Swot) }
}

// ─── Selection ───────────────────────────────────────────────────────────────

/// The dashboard's current filter state: at most one value per field plus an
/// optional raw `endYear`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
  values:   BTreeMap<FilterField, String>,
  end_year: Option<String>,
}

impl FilterSelection {
  pub fn new() -> Self { Self::default() }

  /// Build a selection from raw query pairs. Unknown keys are ignored; for a
  /// repeated key the last value wins.
  pub fn from_pairs<I, K, V>(pairs: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
  {
    let mut selection = Self::new();
    for (key, value) in pairs {
      selection.set(key.as_ref(), value);
    }
    selection
  }

  /// Set a value by its query key. Returns `false` if the key is not a
  /// filter key.
  pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
    if key == END_YEAR_KEY {
      self.end_year = Some(value.into());
      return true;
    }
    match key.parse::<FilterField>() {
      Ok(field) => {
        self.values.insert(field, value.into());
        true
      }
      Err(_) => false,
    }
  }

  pub fn with(mut self, field: FilterField, value: impl Into<String>) -> Self {
    self.values.insert(field, value.into());
    self
  }

  pub fn with_end_year(mut self, value: impl Into<String>) -> Self {
    self.end_year = Some(value.into());
    self
  }

  pub fn get(&self, field: FilterField) -> Option<&str> {
    self.values.get(&field).map(String::as_str)
  }

  pub fn end_year(&self) -> Option<&str> { self.end_year.as_deref() }

  pub fn is_empty(&self) -> bool { self.values.is_empty() && self.end_year.is_none() }
}

// ─── Constraints ─────────────────────────────────────────────────────────────

/// Upper bound on `year` derived from a raw `endYear` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearBound {
  /// `year <= n`.
  AtMost(i64),
  /// The raw value was not numeric. No record satisfies this bound.
  Unmatchable,
}

impl YearBound {
  /// Coerce a raw query value the way a loosely-typed numeric conversion
  /// would: surrounding whitespace is ignored, a blank string is zero,
  /// `Infinity` and `0x`/`0o`/`0b` integer literals are accepted, anything
  /// else non-numeric is unmatchable.
  pub fn coerce(raw: &str) -> Self {
    let trimmed = raw.trim();
    if let Some(bound) = Self::radix_literal(trimmed) {
      return bound;
    }
    let number = match trimmed {
      "" => 0.0,
      "Infinity" | "+Infinity" => f64::INFINITY,
      "-Infinity" => f64::NEG_INFINITY,
      s if s.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') => {
        return Self::Unmatchable;
      }
      s => match s.parse::<f64>() {
        Ok(n) => n,
        Err(_) => return Self::Unmatchable,
      },
    };
    // Years are integral, so `year <= n` is `year <= floor(n)`. The cast
    // saturates for infinities.
    Self::AtMost(number.floor() as i64)
  }

  /// `None` unless `s` carries a radix prefix. Signs are not allowed after
  /// the prefix; an overflowing literal saturates.
  fn radix_literal(s: &str) -> Option<Self> {
    let radix = match s.get(..2)? {
      "0x" | "0X" => 16,
      "0o" | "0O" => 8,
      "0b" | "0B" => 2,
      _ => return None,
    };
    let digits = &s[2..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
      return Some(Self::Unmatchable);
    }
    Some(Self::AtMost(i64::from_str_radix(digits, radix).unwrap_or(i64::MAX)))
  }

  pub fn admits(self, year: Option<i64>) -> bool {
    match (self, year) {
      (Self::AtMost(bound), Some(year)) => year <= bound,
      _ => false,
    }
  }
}

/// A single predicate over a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
  /// `field == value`.
  Equals { field: FilterField, value: String },
  /// `field != null`.
  NotNull(FilterField),
  YearAtMost(YearBound),
}

impl Constraint {
  pub fn equals(field: FilterField, value: impl Into<String>) -> Self {
    Self::Equals { field, value: value.into() }
  }

  /// The categorical field this constraint applies to, if any.
  pub fn field(&self) -> Option<FilterField> {
    match self {
      Self::Equals { field, .. } | Self::NotNull(field) => Some(*field),
      Self::YearAtMost(_) => None,
    }
  }

  pub fn matches(&self, insight: &Insight) -> bool {
    match self {
      Self::Equals { field, value } => insight.dimension(*field) == Some(value.as_str()),
      Self::NotNull(field) => insight.dimension(*field).is_some(),
      Self::YearAtMost(bound) => bound.admits(insight.year),
    }
  }
}

// ─── Match expression ────────────────────────────────────────────────────────

/// A conjunction of [`Constraint`]s. The empty expression matches every
/// record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchExpr {
  constraints: Vec<Constraint>,
}

impl MatchExpr {
  /// The predicate that matches everything.
  pub fn all() -> Self { Self::default() }

  pub fn and(mut self, constraint: Constraint) -> Self {
    self.constraints.push(constraint);
    self
  }

  pub fn constraints(&self) -> &[Constraint] { &self.constraints }

  pub fn is_empty(&self) -> bool { self.constraints.is_empty() }

  /// Whether any constraint mentions `field`.
  pub fn constrains(&self, field: FilterField) -> bool {
    self.constraints.iter().any(|c| c.field() == Some(field))
  }

  pub fn matches(&self, insight: &Insight) -> bool {
    self.constraints.iter().all(|c| c.matches(insight))
  }
}

/// Build the match expression for `selection`, skipping every field in
/// `ignore`.
///
/// Empty values are treated as "not filtered". The `endYear` bound is a
/// global filter and is applied even when a chart ignores other fields.
pub fn build_match(selection: &FilterSelection, ignore: &[FilterField]) -> MatchExpr {
  let mut expr = MatchExpr::all();

  for field in FilterField::all() {
    if ignore.contains(&field) {
      continue;
    }
    if let Some(value) = selection.get(field)
      && !value.is_empty()
    {
      expr = expr.and(Constraint::equals(field, value));
    }
  }

  if let Some(raw) = selection.end_year()
    && !raw.is_empty()
  {
    expr = expr.and(Constraint::YearAtMost(YearBound::coerce(raw)));
  }

  expr
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::insight::NewInsight;

  fn every_field_selected() -> FilterSelection {
    FilterField::all().fold(FilterSelection::new(), |s, f| s.with(f, format!("{f:?}")))
  }

  #[test]
  fn empty_selection_matches_everything() {
    assert_eq!(build_match(&FilterSelection::new(), &[]), MatchExpr::all());
    assert!(build_match(&FilterSelection::new(), &[]).is_empty());
  }

  #[test]
  fn one_equality_per_selected_field() {
    let expr = build_match(&every_field_selected(), &[]);
    assert_eq!(expr.constraints().len(), 8);
    for field in FilterField::all() {
      let count = expr
        .constraints()
        .iter()
        .filter(|c| matches!(c, Constraint::Equals { field: f, .. } if *f == field))
        .count();
      assert_eq!(count, 1, "{field:?}");
    }
  }

  #[test]
  fn ignored_fields_never_constrained() {
    let ignore = [FilterField::Country, FilterField::Swot];
    let expr = build_match(&every_field_selected(), &ignore);
    assert_eq!(expr.constraints().len(), 6);
    for field in ignore {
      assert!(!expr.constrains(field));
    }
  }

  #[test]
  fn empty_values_are_not_filters() {
    let selection = FilterSelection::new()
      .with(FilterField::Topic, "")
      .with(FilterField::Sector, "Energy");
    let expr = build_match(&selection, &[]);
    assert_eq!(expr.constraints(), &[Constraint::equals(FilterField::Sector, "Energy")]);
  }

  #[test]
  fn end_year_survives_any_ignore_list() {
    let selection = FilterSelection::new().with_end_year("2017");
    let all: Vec<_> = FilterField::all().collect();
    for ignore in [&[][..], &[FilterField::Country][..], &all[..]] {
      let expr = build_match(&selection, ignore);
      assert_eq!(
        expr.constraints(),
        &[Constraint::YearAtMost(YearBound::AtMost(2017))]
      );
    }
  }

  #[test]
  fn constraints_follow_field_order_then_year() {
    let selection = FilterSelection::new()
      .with_end_year("2020")
      .with(FilterField::Swot, "s")
      .with(FilterField::Topic, "oil");
    let expr = build_match(&selection, &[]);
    assert_eq!(
      expr.constraints(),
      &[
        Constraint::equals(FilterField::Topic, "oil"),
        Constraint::equals(FilterField::Swot, "s"),
        Constraint::YearAtMost(YearBound::AtMost(2020)),
      ]
    );
  }

  #[test]
  fn building_is_deterministic() {
    let selection = every_field_selected().with_end_year("2018");
    assert_eq!(
      build_match(&selection, &[FilterField::Topic]),
      build_match(&selection, &[FilterField::Topic])
    );
  }

  #[test]
  fn end_year_coercion() {
    assert_eq!(YearBound::coerce(" 2017 "), YearBound::AtMost(2017));
    assert_eq!(YearBound::coerce("2017.9"), YearBound::AtMost(2017));
    assert_eq!(YearBound::coerce("2e3"), YearBound::AtMost(2000));
    assert_eq!(YearBound::coerce("   "), YearBound::AtMost(0));
    assert_eq!(YearBound::coerce("Infinity"), YearBound::AtMost(i64::MAX));
    assert_eq!(YearBound::coerce("soon"), YearBound::Unmatchable);
    assert_eq!(YearBound::coerce("NaN"), YearBound::Unmatchable);
    assert_eq!(YearBound::coerce("inf"), YearBound::Unmatchable);
    assert_eq!(YearBound::coerce("20-17"), YearBound::Unmatchable);
  }

  #[test]
  fn end_year_radix_literals() {
    assert_eq!(YearBound::coerce("0x7E0"), YearBound::AtMost(2016));
    assert_eq!(YearBound::coerce(" 0X7e1 "), YearBound::AtMost(2017));
    assert_eq!(YearBound::coerce("0o3740"), YearBound::AtMost(2016));
    assert_eq!(YearBound::coerce("0b11111100000"), YearBound::AtMost(2016));
    assert_eq!(YearBound::coerce("0xffffffffffffffffff"), YearBound::AtMost(i64::MAX));
    assert_eq!(YearBound::coerce("0x"), YearBound::Unmatchable);
    assert_eq!(YearBound::coerce("0x-10"), YearBound::Unmatchable);
    assert_eq!(YearBound::coerce("0b102"), YearBound::Unmatchable);
    assert_eq!(YearBound::coerce("-0x10"), YearBound::Unmatchable);
  }

  #[test]
  fn selection_from_query_pairs() {
    let selection = FilterSelection::from_pairs([
      ("country", "France"),
      ("unknown", "x"),
      ("endYear", "2019"),
      ("country", "India"),
    ]);
    assert_eq!(selection.get(FilterField::Country), Some("India"));
    assert_eq!(selection.end_year(), Some("2019"));
    assert_eq!(selection.get(FilterField::Topic), None);
  }

  #[test]
  fn match_expr_evaluates_records() {
    let insight = Insight::from_new(NewInsight {
      country: Some("USA".into()),
      year: Some(2016),
      ..NewInsight::default()
    });

    let usa_before_2017 = MatchExpr::all()
      .and(Constraint::equals(FilterField::Country, "USA"))
      .and(Constraint::YearAtMost(YearBound::AtMost(2017)));
    assert!(usa_before_2017.matches(&insight));

    assert!(!MatchExpr::all().and(Constraint::NotNull(FilterField::Topic)).matches(&insight));
    assert!(
      !MatchExpr::all()
        .and(Constraint::YearAtMost(YearBound::Unmatchable))
        .matches(&insight)
    );
    assert!(
      !MatchExpr::all()
        .and(Constraint::YearAtMost(YearBound::AtMost(2015)))
        .matches(&insight)
    );
  }
}
