//! Category aggregation
//!
//! Groups movements by a classification label and sums their amounts, either
//! as a single total per label or broken out by calendar month. Every function
//! here is a single pass over its input; nothing is retained between calls.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::error::{TransparencyError, TransparencyResult};
use crate::models::{Dimension, Money, MovementRecord};

/// Accumulated amount per classification label
///
/// Labels remember the order in which they were first seen so that ranking
/// ties resolve the same way on every run. Equality ignores that order.
#[derive(Debug, Clone, Default)]
pub struct GroupTotals {
    entries: Vec<(String, Money)>,
    index: HashMap<String, usize>,
}

impl GroupTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct labels
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Amount accumulated for a label
    pub fn get(&self, label: &str) -> Option<Money> {
        self.index.get(label).map(|&i| self.entries[i].1)
    }

    /// Add an amount to a label, starting from zero on first sight
    pub fn add(&mut self, label: impl Into<String>, amount: Money) {
        let label = label.into();
        match self.index.get(&label) {
            Some(&i) => self.entries[i].1 += amount,
            None => {
                self.index.insert(label.clone(), self.entries.len());
                self.entries.push((label, amount));
            }
        }
    }

    /// Make sure a label is present, inserting it with a zero amount
    pub fn ensure(&mut self, label: &str) {
        if !self.contains(label) {
            self.add(label, Money::zero());
        }
    }

    /// Labels and amounts in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Money)> + '_ {
        self.entries.iter().map(|(label, amount)| (label.as_str(), *amount))
    }

    /// Labels in first-seen order
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    /// Sum over all labels
    pub fn total(&self) -> Money {
        self.entries.iter().map(|(_, amount)| *amount).sum()
    }
}

impl PartialEq for GroupTotals {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(label, amount)| other.get(label) == Some(amount))
    }
}

impl Eq for GroupTotals {}

impl<S: Into<String>> FromIterator<(S, Money)> for GroupTotals {
    fn from_iter<T: IntoIterator<Item = (S, Money)>>(iter: T) -> Self {
        let mut totals = GroupTotals::new();
        for (label, amount) in iter {
            totals.add(label, amount);
        }
        totals
    }
}

/// The movement-type patterns used by the portal queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "value", rename_all = "kebab-case")]
pub enum MovementTypeMatch {
    /// Every movement type
    Any,
    /// Case-insensitive substring, e.g. "pagamento"
    Contains(String),
    /// Exact match against any of the listed types
    OneOf(Vec<String>),
}

impl MovementTypeMatch {
    pub fn contains(needle: impl Into<String>) -> Self {
        Self::Contains(needle.into())
    }

    pub fn one_of<S: Into<String>>(types: impl IntoIterator<Item = S>) -> Self {
        Self::OneOf(types.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, movement_type: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Contains(needle) => movement_type
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            Self::OneOf(types) => types.iter().any(|t| t == movement_type),
        }
    }
}

impl fmt::Display for MovementTypeMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any movement"),
            Self::Contains(needle) => write!(f, "containing '{}'", needle),
            Self::OneOf(types) => write!(f, "one of [{}]", types.join(", ")),
        }
    }
}

/// Selects which movements take part in an aggregation
pub struct AggregationFilter {
    movement_type: Box<dyn Fn(&str) -> bool>,
    year: Option<i32>,
    month: Option<u32>,
}

impl AggregationFilter {
    /// Filter with a custom movement-type predicate and no date constraint
    pub fn new(predicate: impl Fn(&str) -> bool + 'static) -> Self {
        Self {
            movement_type: Box::new(predicate),
            year: None,
            month: None,
        }
    }

    /// Filter using one of the standard movement-type patterns
    pub fn matching(pattern: MovementTypeMatch) -> Self {
        Self::new(move |movement_type| pattern.matches(movement_type))
    }

    /// Accept every movement type
    pub fn any() -> Self {
        Self::new(|_| true)
    }

    pub fn year(mut self, year: impl Into<Option<i32>>) -> Self {
        self.year = year.into();
        self
    }

    pub fn month(mut self, month: impl Into<Option<u32>>) -> Self {
        self.month = month.into();
        self
    }

    pub fn year_constraint(&self) -> Option<i32> {
        self.year
    }

    pub fn month_constraint(&self) -> Option<u32> {
        self.month
    }

    pub fn accepts_type(&self, movement_type: &str) -> bool {
        (self.movement_type)(movement_type)
    }

    /// Whether a record participates. The date of a record whose type
    /// matches must split into three integers, whatever the constraints.
    pub fn accepts(&self, record: &MovementRecord) -> TransparencyResult<bool> {
        if !self.accepts_type(&record.movement_type) {
            return Ok(false);
        }

        let (year, month, _) = record.date.parts()?;
        Ok(self.year.map_or(true, |y| y == year) && self.month.map_or(true, |m| m == month))
    }
}

impl fmt::Debug for AggregationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregationFilter")
            .field("year", &self.year)
            .field("month", &self.month)
            .finish_non_exhaustive()
    }
}

/// Maps a movement to the label it is grouped under
pub trait Classify {
    fn classify(&mut self, record: &MovementRecord) -> TransparencyResult<String>;
}

impl Classify for Dimension {
    fn classify(&mut self, record: &MovementRecord) -> TransparencyResult<String> {
        record.label(*self).map(str::to_owned)
    }
}

impl<F> Classify for F
where
    F: FnMut(&MovementRecord) -> TransparencyResult<String>,
{
    fn classify(&mut self, record: &MovementRecord) -> TransparencyResult<String> {
        self(record)
    }
}

/// Anything the aggregator can read a record from: an owned record, a
/// borrowed one, or the fallible output of a document loader
pub trait MovementItem {
    fn visit<T>(
        self,
        f: impl FnOnce(&MovementRecord) -> TransparencyResult<T>,
    ) -> TransparencyResult<T>;
}

impl MovementItem for MovementRecord {
    fn visit<T>(
        self,
        f: impl FnOnce(&MovementRecord) -> TransparencyResult<T>,
    ) -> TransparencyResult<T> {
        f(&self)
    }
}

impl MovementItem for &MovementRecord {
    fn visit<T>(
        self,
        f: impl FnOnce(&MovementRecord) -> TransparencyResult<T>,
    ) -> TransparencyResult<T> {
        f(self)
    }
}

impl MovementItem for TransparencyResult<MovementRecord> {
    fn visit<T>(
        self,
        f: impl FnOnce(&MovementRecord) -> TransparencyResult<T>,
    ) -> TransparencyResult<T> {
        f(&self?)
    }
}

/// Sum the amounts of the records passing `filter`, grouped by label
///
/// An empty result is not an error; callers report "no data" themselves.
pub fn aggregate<I, C>(
    records: I,
    filter: &AggregationFilter,
    mut classify: C,
) -> TransparencyResult<GroupTotals>
where
    I: IntoIterator,
    I::Item: MovementItem,
    C: Classify,
{
    let mut totals = GroupTotals::new();
    let mut scanned = 0usize;
    let mut accepted = 0usize;

    for item in records {
        item.visit(|record| {
            scanned += 1;
            if filter.accepts(record)? {
                let label = classify.classify(record)?;
                totals.add(label, record.amount);
                accepted += 1;
            }
            Ok(())
        })?;
    }

    debug!(scanned, accepted, labels = totals.len(), ?filter, "aggregated movements");
    Ok(totals)
}

/// Per-month totals where every label appears in all twelve months
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyBreakdown {
    months: [GroupTotals; 12],
}

impl Default for MonthlyBreakdown {
    fn default() -> Self {
        Self {
            months: std::array::from_fn(|_| GroupTotals::new()),
        }
    }
}

impl MonthlyBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Totals for a month (1-12)
    pub fn get(&self, month: u32) -> Option<&GroupTotals> {
        let index = usize::try_from(month).ok()?.checked_sub(1)?;
        self.months.get(index)
    }

    /// Months in calendar order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &GroupTotals)> + '_ {
        (1u32..).zip(self.months.iter())
    }

    /// Labels in first-seen order
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.months[0].labels()
    }

    pub fn is_empty(&self) -> bool {
        self.months[0].is_empty()
    }

    /// Whole-period total per label
    pub fn label_totals(&self) -> GroupTotals {
        let mut totals = GroupTotals::new();
        for label in self.labels() {
            totals.ensure(label);
        }
        for month in &self.months {
            for (label, amount) in month.iter() {
                totals.add(label, amount);
            }
        }
        totals
    }

    /// Sum over all months and labels
    pub fn total(&self) -> Money {
        self.months.iter().map(GroupTotals::total).sum()
    }

    fn add(&mut self, month: u32, label: String, amount: Money) -> TransparencyResult<()> {
        let index = usize::try_from(month)
            .ok()
            .and_then(|m| m.checked_sub(1))
            .filter(|&i| i < 12)
            .ok_or_else(|| {
                TransparencyError::data_format(format!("Month {} out of range", month))
            })?;

        // Seed new labels everywhere so stacked series share one category axis
        if !self.months[0].contains(&label) {
            for totals in self.months.iter_mut() {
                totals.ensure(&label);
            }
        }
        self.months[index].add(label, amount);
        Ok(())
    }
}

/// Like [`aggregate`], partitioned by the month of each record's date
pub fn aggregate_monthly<I, C>(
    records: I,
    filter: &AggregationFilter,
    mut classify: C,
) -> TransparencyResult<MonthlyBreakdown>
where
    I: IntoIterator,
    I::Item: MovementItem,
    C: Classify,
{
    let mut breakdown = MonthlyBreakdown::new();

    for item in records {
        item.visit(|record| {
            if !filter.accepts(record)? {
                return Ok(());
            }
            let month = record.date.month()?;
            let label = classify.classify(record)?;
            breakdown.add(month, label, record.amount)
        })?;
    }

    debug!(labels = breakdown.months[0].len(), ?filter, "aggregated monthly movements");
    Ok(breakdown)
}

/// Distinct labels of the records passing `filter`, in first-seen order
pub fn distinct_labels<I, C>(
    records: I,
    filter: &AggregationFilter,
    classify: C,
) -> TransparencyResult<Vec<String>>
where
    I: IntoIterator,
    I::Item: MovementItem,
    C: Classify,
{
    let totals = aggregate(records, filter, classify)?;
    Ok(totals.labels().map(str::to_owned).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(date: &str, cents: i64, category: &str) -> MovementRecord {
        MovementRecord::new(date, "Pagamento de empenho", Money::from_cents(cents))
            .with_label(Dimension::Element, category)
    }

    fn scenario_a() -> Vec<MovementRecord> {
        vec![
            payment("2022-03-01", 10000, "A"),
            payment("2022-03-15", 5000, "B"),
            payment("2022-04-01", 3000, "A"),
        ]
    }

    fn payments() -> AggregationFilter {
        AggregationFilter::matching(MovementTypeMatch::contains("pagamento"))
    }

    #[test]
    fn test_scenario_a_year_and_month() {
        let filter = payments().year(2022).month(3);
        let totals = aggregate(scenario_a(), &filter, Dimension::Element).unwrap();

        let expected: GroupTotals = [("A", Money::from_cents(10000)), ("B", Money::from_cents(5000))]
            .into_iter()
            .collect();
        assert_eq!(totals, expected);
    }

    #[test]
    fn test_empty_input_is_empty_totals() {
        let records: Vec<MovementRecord> = Vec::new();
        let totals = aggregate(&records, &payments(), Dimension::Element).unwrap();
        assert!(totals.is_empty());
    }

    #[test]
    fn test_no_match_is_empty_totals() {
        let filter = payments().year(2019);
        let totals = aggregate(scenario_a(), &filter, Dimension::Element).unwrap();
        assert!(totals.is_empty());
    }

    #[test]
    fn test_conservation_of_filtered_amounts() {
        let mut records = scenario_a();
        records.push(
            MovementRecord::new("2022-03-02", "Arrecadação de receita", Money::from_cents(999))
                .with_label(Dimension::Element, "C"),
        );
        let filter = payments().year(2022);

        let expected: Money = records
            .iter()
            .filter(|r| filter.accepts(r).unwrap())
            .map(|r| r.amount)
            .sum();
        let totals = aggregate(&records, &filter, Dimension::Element).unwrap();

        assert_eq!(totals.total(), expected);
        assert_eq!(expected.cents(), 18000);
    }

    #[test]
    fn test_idempotent_over_rematerialized_input() {
        let filter = payments();
        let first = aggregate(scenario_a(), &filter, Dimension::Element).unwrap();
        let second = aggregate(scenario_a().into_iter().rev(), &filter, Dimension::Element).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_exact_match_predicate() {
        let records = vec![
            payment("2022-01-10", 100, "A"),
            MovementRecord::new("2022-01-11", "Pagamento de restos a pagar", Money::from_cents(50))
                .with_label(Dimension::Element, "A"),
        ];
        let filter = AggregationFilter::matching(MovementTypeMatch::one_of(["Pagamento de empenho"]));
        let totals = aggregate(&records, &filter, Dimension::Element).unwrap();
        assert_eq!(totals.get("A"), Some(Money::from_cents(100)));
    }

    #[test]
    fn test_custom_predicate_and_classifier() {
        let filter = AggregationFilter::new(|t| t.ends_with("empenho"));
        let totals = aggregate(scenario_a(), &filter, |r: &MovementRecord| {
            Ok(r.date.as_str()[..7].to_string())
        })
        .unwrap();
        assert_eq!(totals.get("2022-03"), Some(Money::from_cents(15000)));
        assert_eq!(totals.get("2022-04"), Some(Money::from_cents(3000)));
    }

    #[test]
    fn test_malformed_date_fails() {
        let records = vec![payment("2022-03-01", 100, "A"), payment("03/2022", 100, "A")];
        let err = aggregate(&records, &payments(), Dimension::Element).unwrap_err();
        assert!(err.is_data_format());
    }

    #[test]
    fn test_malformed_date_of_unmatched_type_is_ignored() {
        let records = vec![
            payment("2022-03-01", 100, "A"),
            MovementRecord::new("garbage", "Estorno", Money::from_cents(1)),
        ];
        let totals = aggregate(&records, &payments(), Dimension::Element).unwrap();
        assert_eq!(totals.total().cents(), 100);
    }

    #[test]
    fn test_missing_classification_fails() {
        let records = vec![payment("2022-03-01", 100, "A")];
        let err = aggregate(&records, &payments(), Dimension::Function).unwrap_err();
        assert!(err.is_data_format());
    }

    #[test]
    fn test_loader_error_is_propagated() {
        let items: Vec<TransparencyResult<MovementRecord>> = vec![
            Ok(payment("2022-03-01", 100, "A")),
            Err(TransparencyError::Storage("unreadable".into())),
        ];
        let err = aggregate(items, &payments(), Dimension::Element).unwrap_err();
        assert!(matches!(err, TransparencyError::Storage(_)));
    }

    #[test]
    fn test_monthly_completeness() {
        let breakdown =
            aggregate_monthly(scenario_a(), &payments().year(2022), Dimension::Element).unwrap();

        for (_, totals) in breakdown.iter() {
            assert!(totals.contains("A"));
            assert!(totals.contains("B"));
        }
        assert_eq!(breakdown.get(3).unwrap().get("A"), Some(Money::from_cents(10000)));
        assert_eq!(breakdown.get(4).unwrap().get("A"), Some(Money::from_cents(3000)));
        assert_eq!(breakdown.get(4).unwrap().get("B"), Some(Money::zero()));
        assert_eq!(breakdown.get(12).unwrap().get("B"), Some(Money::zero()));
        assert!(breakdown.get(0).is_none());
        assert!(breakdown.get(13).is_none());
        assert_eq!(breakdown.total().cents(), 18000);
        assert_eq!(
            breakdown.label_totals().get("A"),
            Some(Money::from_cents(13000))
        );
    }

    #[test]
    fn test_monthly_month_out_of_range_fails() {
        let records = vec![payment("2022-13-01", 100, "A")];
        let err = aggregate_monthly(&records, &payments(), Dimension::Element).unwrap_err();
        assert!(err.is_data_format());
    }

    #[test]
    fn test_monthly_empty() {
        let records: Vec<MovementRecord> = Vec::new();
        let breakdown = aggregate_monthly(&records, &payments(), Dimension::Element).unwrap();
        assert!(breakdown.is_empty());
        assert_eq!(breakdown.iter().count(), 12);
    }

    #[test]
    fn test_distinct_labels_first_seen_order() {
        let mut records = scenario_a();
        records.insert(0, payment("2022-05-01", 1, "Z"));
        let labels = distinct_labels(&records, &payments(), Dimension::Element).unwrap();
        assert_eq!(labels, vec!["Z", "A", "B"]);
    }

    #[test]
    fn test_movement_type_match_display_and_case() {
        let m = MovementTypeMatch::contains("PAGAMENTO");
        assert!(m.matches("Pagamento de empenho"));
        assert!(!m.matches("Arrecadação de receita"));
        assert_eq!(m.to_string(), "containing 'PAGAMENTO'");
        assert!(MovementTypeMatch::Any.matches("anything"));
    }
}
