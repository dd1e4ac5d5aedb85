//! Monthly Report
//!
//! Month-by-month totals per label for one year: the data behind a stacked
//! bar chart, rendered as a table.

use serde::Serialize;
use std::io::Write;
use tracing::{info, warn};

use super::aggregation::{aggregate_monthly, AggregationFilter, MonthlyBreakdown};
use super::query::ReportQuery;
use super::ranking::rank_all;
use crate::display::report::{format_bar, month_abbreviation, pad_right, separator, truncate};
use crate::error::{TransparencyError, TransparencyResult};
use crate::models::money::serialize_as_decimal;
use crate::models::Money;
use crate::storage::Storage;

/// One label's twelve monthly amounts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySeries {
    pub label: String,
    /// January first
    #[serde(serialize_with = "serialize_months")]
    pub months: [Money; 12],
    #[serde(serialize_with = "serialize_as_decimal")]
    pub total: Money,
}

fn serialize_months<S>(months: &[Money; 12], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeSeq;

    let mut seq = serializer.serialize_seq(Some(months.len()))?;
    for amount in months {
        seq.serialize_element(&amount.as_f64())?;
    }
    seq.end()
}

/// Monthly Report
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub title: String,
    pub year: i32,
    /// Largest whole-year total first
    pub series: Vec<MonthlySeries>,
    #[serde(serialize_with = "serialize_months")]
    pub month_totals: [Money; 12],
    #[serde(serialize_with = "serialize_as_decimal")]
    pub total: Money,
}

impl MonthlyReport {
    /// Generate the report for a query; the query must name a year
    pub fn generate(storage: &Storage, query: &ReportQuery) -> TransparencyResult<Self> {
        query.validate()?;
        let year = query.year.ok_or_else(|| {
            TransparencyError::Validation("The monthly report needs a year".to_string())
        })?;

        let records = storage.movements(query.kind, Some(year), &[query.dimension])?;
        let filter = AggregationFilter::matching(query.movement_types.clone()).year(year);
        let breakdown = aggregate_monthly(records, &filter, query.dimension)?;
        if breakdown.is_empty() {
            warn!(title = %query.title, year, "no movements matched");
        }

        let report = Self::from_breakdown(&query.title, year, &breakdown);
        info!(title = %report.title, labels = report.series.len(), total = %report.total, "generated monthly report");
        Ok(report)
    }

    /// Build a report from an already aggregated breakdown
    pub fn from_breakdown(title: &str, year: i32, breakdown: &MonthlyBreakdown) -> Self {
        let series = rank_all(&breakdown.label_totals())
            .into_rows()
            .into_iter()
            .map(|row| {
                let months = std::array::from_fn(|i| {
                    breakdown
                        .get(i as u32 + 1)
                        .and_then(|totals| totals.get(&row.label))
                        .unwrap_or_default()
                });
                MonthlySeries {
                    label: row.label,
                    months,
                    total: row.amount,
                }
            })
            .collect();

        let month_totals = std::array::from_fn(|i| {
            breakdown
                .get(i as u32 + 1)
                .map(|totals| totals.total())
                .unwrap_or_default()
        });

        Self {
            title: title.to_string(),
            year,
            series,
            month_totals,
            total: breakdown.total(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Format the report for terminal display
    ///
    /// One line per month with its total, followed by the whole-year total of
    /// every label.
    pub fn format_terminal(&self, currency_symbol: &str) -> String {
        let mut output = String::new();

        output.push_str(&format!("{} ({})\n", self.title, self.year));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        if self.is_empty() {
            output.push_str("No data for the selected period.\n");
            return output;
        }

        let largest = self
            .month_totals
            .iter()
            .map(Money::as_f64)
            .fold(0.0_f64, f64::max);

        output.push_str(&format!("{:<5} {:>18}  {}\n", "Month", "Amount", "Share"));
        output.push_str(&separator(80));
        output.push('\n');
        for (month, amount) in (1u32..).zip(self.month_totals.iter()) {
            output.push_str(&format!(
                "{:<5} {:>18}  {}\n",
                month_abbreviation(month),
                amount.format_with_symbol(currency_symbol),
                format_bar(amount.as_f64(), largest, 30)
            ));
        }

        output.push('\n');
        output.push_str(&format!("{} {:>18}\n", pad_right("Category", 50), "Year total"));
        output.push_str(&separator(80));
        output.push('\n');
        for series in &self.series {
            output.push_str(&format!(
                "{} {:>18}\n",
                pad_right(&truncate(&series.label, 50), 50),
                series.total.format_with_symbol(currency_symbol)
            ));
        }

        output.push_str(&separator(80));
        output.push('\n');
        output.push_str(&format!(
            "{} {:>18}\n",
            pad_right("TOTAL", 50),
            self.total.format_with_symbol(currency_symbol)
        ));

        output
    }

    /// Export the report to CSV format, one row per month and label
    pub fn export_csv<W: Write>(&self, writer: W) -> TransparencyResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["Year", "Month", "Category", "Amount"])?;

        let year = self.year.to_string();
        for series in &self.series {
            for (month, amount) in (1u32..).zip(series.months.iter()) {
                csv.write_record([
                    year.clone(),
                    month.to_string(),
                    series.label.clone(),
                    amount.to_string(),
                ])?;
            }
        }

        csv.flush()?;
        Ok(())
    }
}
