//! Category Report
//!
//! Ranked totals per classification label with each row's share of the
//! grand total. Backs the function, department, group, species and economic
//! category panels as well as the execution reports.

use serde::Serialize;
use std::io::Write;
use tracing::{info, warn};

use super::aggregation::{aggregate, GroupTotals};
use super::query::ReportQuery;
use super::ranking::{rank_all, rank_and_truncate_with, RankedSummary, RemainderPolicy};
use crate::display::report::{format_bar, pad_right, percentage_of, separator, truncate};
use crate::display::format_percentage;
use crate::error::TransparencyResult;
use crate::models::money::serialize_as_decimal;
use crate::models::Money;
use crate::storage::Storage;

/// One ranked category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub label: String,
    #[serde(serialize_with = "serialize_as_decimal")]
    pub amount: Money,
    /// Share of the report total, 0-100
    pub percentage: f64,
    /// True for the synthetic remainder row
    pub is_remainder: bool,
}

/// Category Report
#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub title: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// Distinct labels before truncation
    pub label_count: usize,
    pub rows: Vec<CategoryRow>,
    #[serde(serialize_with = "serialize_as_decimal")]
    pub total: Money,
}

/// How a report cuts its ranked rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation<'a> {
    /// Every label, no remainder row
    None,
    /// Keep the largest labels and fold the rest into one row
    TopK {
        top_k: usize,
        other_label: &'a str,
        policy: RemainderPolicy,
    },
}

impl<'a> Truncation<'a> {
    pub fn apply(&self, totals: &GroupTotals) -> RankedSummary {
        match *self {
            Truncation::None => rank_all(totals),
            Truncation::TopK {
                top_k,
                other_label,
                policy,
            } => rank_and_truncate_with(totals, top_k, other_label, policy),
        }
    }
}

impl CategoryReport {
    /// Generate the report for a query
    pub fn generate(storage: &Storage, query: &ReportQuery) -> TransparencyResult<Self> {
        query.validate()?;

        let records = storage.movements(query.kind, query.year, &[query.dimension])?;
        let totals = aggregate(records, &query.filter(), query.dimension)?;
        if totals.is_empty() {
            warn!(title = %query.title, year = ?query.year, month = ?query.month, "no movements matched");
        }

        let truncation = match query.top_k {
            Some(top_k) => Truncation::TopK {
                top_k,
                other_label: &query.other_label,
                policy: query.policy,
            },
            None => Truncation::None,
        };

        let report = Self::from_totals(&query.title, &totals, truncation)
            .for_period(query.year, query.month);
        info!(title = %report.title, rows = report.rows.len(), total = %report.total, "generated category report");
        Ok(report)
    }

    /// Build a report from already aggregated totals
    pub fn from_totals(title: &str, totals: &GroupTotals, truncation: Truncation<'_>) -> Self {
        let summary = truncation.apply(totals);
        let total = summary.total();

        let rows = summary
            .into_rows()
            .into_iter()
            .map(|row| CategoryRow {
                percentage: percentage_of(row.amount, total),
                label: row.label,
                amount: row.amount,
                is_remainder: row.is_remainder,
            })
            .collect();

        Self {
            title: title.to_string(),
            year: None,
            month: None,
            label_count: totals.len(),
            rows,
            total,
        }
    }

    pub fn for_period(mut self, year: Option<i32>, month: Option<u32>) -> Self {
        self.year = year;
        self.month = month;
        self
    }

    /// True when no movement matched
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn period_description(&self) -> String {
        match (self.year, self.month) {
            (Some(year), Some(month)) => format!("{:04}-{:02}", year, month),
            (Some(year), None) => year.to_string(),
            (None, Some(month)) => format!("month {} of every year", month),
            (None, None) => "all years".to_string(),
        }
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self, currency_symbol: &str) -> String {
        let mut output = String::new();

        output.push_str(&format!("{} ({})\n", self.title, self.period_description()));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        if self.is_empty() {
            output.push_str("No data for the selected period.\n");
            return output;
        }

        output.push_str(&format!(
            "{} {:>18} {:>7}  {}\n",
            pad_right("Category", 40),
            "Amount",
            "%",
            "Share"
        ));
        output.push_str(&separator(80));
        output.push('\n');

        let largest = self
            .rows
            .iter()
            .map(|row| row.amount.as_f64())
            .fold(0.0_f64, f64::max);

        for row in &self.rows {
            output.push_str(&format!(
                "{} {:>18} {:>7}  {}\n",
                pad_right(&truncate(&row.label, 40), 40),
                row.amount.format_with_symbol(currency_symbol),
                format_percentage(row.percentage),
                format_bar(row.amount.as_f64(), largest, 10)
            ));
        }

        output.push_str(&separator(80));
        output.push('\n');
        output.push_str(&format!(
            "{} {:>18}\n",
            pad_right("TOTAL", 40),
            self.total.format_with_symbol(currency_symbol)
        ));
        if self.label_count > self.rows.iter().filter(|r| !r.is_remainder).count() {
            output.push_str(&format!("{} categories in total\n", self.label_count));
        }

        output
    }

    /// Export the report to CSV format
    pub fn export_csv<W: Write>(&self, writer: W) -> TransparencyResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["Category", "Amount", "Percentage", "Remainder"])?;

        for row in &self.rows {
            csv.write_record([
                row.label.clone(),
                row.amount.to_string(),
                format!("{:.2}", row.percentage),
                row.is_remainder.to_string(),
            ])?;
        }

        csv.write_record([
            "TOTAL".to_string(),
            self.total.to_string(),
            if self.is_empty() { String::new() } else { "100.00".to_string() },
            String::new(),
        ])?;
        csv.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TransparencyPaths;
    use crate::config::Settings;
    use crate::models::DatasetKind;
    use crate::reports::query::ReportPreset;
    use crate::storage::DocumentEntry;
    use tempfile::TempDir;

    fn totals(entries: &[(&str, i64)]) -> GroupTotals {
        entries
            .iter()
            .map(|(label, cents)| (*label, Money::from_cents(*cents)))
            .collect()
    }

    const EXPENSES: &str = r#"{"registros": [
        {"registro": {
            "despesa": {"funcao": {"denominacao": "Saúde"}},
            "listMovimentos": [
                {"tipoMovimento": "Pagamento de empenho", "dataMovimento": "2022-03-01", "valorMovimento": 100.0},
                {"tipoMovimento": "Emissão de empenho", "dataMovimento": "2022-03-01", "valorMovimento": 900.0}
            ]
        }},
        {"registro": {
            "despesa": {"funcao": {"denominacao": "Educação"}},
            "listMovimentos": [
                {"tipoMovimento": "Pagamento de restos a pagar", "dataMovimento": "2022-04-10", "valorMovimento": 50.0},
                {"tipoMovimento": "Pagamento de empenho", "dataMovimento": "2021-12-31", "valorMovimento": 70.0}
            ]
        }}
    ]}"#;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TransparencyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::open(paths).unwrap();
        std::fs::write(storage.paths().data_dir().join("despesa.json"), EXPENSES).unwrap();
        storage
            .manifest
            .add(DocumentEntry::new("despesa.json", DatasetKind::Expense))
            .unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_generate_category_report() {
        let (_temp_dir, storage) = create_test_storage();
        let query = ReportQuery::from_preset(ReportPreset::ExpensesByFunction, &Settings::default())
            .with_year(2022);

        let report = CategoryReport::generate(&storage, &query).unwrap();

        assert_eq!(report.total.cents(), 15000);
        assert_eq!(report.label_count, 2);
        let labels: Vec<_> = report.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Saúde", "Educação", "Outros"]);
        assert!(report.rows[2].is_remainder);
        assert!(report.rows[2].amount.is_zero());
    }

    #[test]
    fn test_generate_empty_period() {
        let (_temp_dir, storage) = create_test_storage();
        let query = ReportQuery::from_preset(ReportPreset::ExpensesByFunction, &Settings::default())
            .with_year(2019);

        let report = CategoryReport::generate(&storage, &query).unwrap();
        assert!(report.is_empty());
        assert!(report.format_terminal("R$").contains("No data"));
    }

    #[test]
    fn test_percentages() {
        let report = CategoryReport::from_totals(
            "Test",
            &totals(&[("A", 300), ("B", 100)]),
            Truncation::None,
        );
        assert_eq!(report.rows[0].percentage, 75.0);
        assert_eq!(report.rows[1].percentage, 25.0);
    }

    #[test]
    fn test_truncation_keeps_total() {
        let report = CategoryReport::from_totals(
            "Test",
            &totals(&[("A", 300), ("B", 100), ("C", 50), ("D", 50)]),
            Truncation::TopK {
                top_k: 2,
                other_label: "Others",
                policy: RemainderPolicy::WhenTruncated,
            },
        );
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.rows[2].label, "Others");
        assert_eq!(report.rows[2].amount.cents(), 100);
        assert_eq!(report.total.cents(), 500);
        assert_eq!(report.label_count, 4);
    }

    #[test]
    fn test_format_terminal() {
        let report = CategoryReport::from_totals(
            "Payments by function",
            &totals(&[("Saúde", 150000)]),
            Truncation::None,
        )
        .for_period(Some(2022), None);

        let output = report.format_terminal("R$");
        assert!(output.contains("Payments by function (2022)"));
        assert!(output.contains("R$1500.00"));
        assert!(output.contains("100%"));
    }

    #[test]
    fn test_export_csv() {
        let report = CategoryReport::from_totals(
            "Test",
            &totals(&[("Saúde, Geral", 1050)]),
            Truncation::None,
        );

        let mut buffer = Vec::new();
        report.export_csv(&mut buffer).unwrap();
        let csv = String::from_utf8(buffer).unwrap();

        assert!(csv.starts_with("Category,Amount,Percentage,Remainder\n"));
        assert!(csv.contains("\"Saúde, Geral\",10.50,100.00,false"));
        assert!(csv.contains("TOTAL,10.50,100.00,"));
    }
}
