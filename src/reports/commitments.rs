//! Commitment distribution report
//!
//! For one budget element, summarizes the values of its commitment items per
//! month of issue and lists the largest items of the period.

use serde::Serialize;
use std::io::Write;
use tracing::{info, warn};

use crate::display::report::{month_abbreviation, pad_right, separator, truncate};
use crate::error::TransparencyResult;
use crate::models::money::serialize_as_decimal;
use crate::models::{CommitmentItem, Money};
use crate::storage::Storage;

/// Value distribution of the items issued in one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthDistribution {
    pub month: u32,
    pub count: usize,
    #[serde(serialize_with = "serialize_as_decimal")]
    pub min: Money,
    #[serde(serialize_with = "serialize_as_decimal")]
    pub median: Money,
    #[serde(serialize_with = "serialize_as_decimal")]
    pub max: Money,
    #[serde(serialize_with = "serialize_as_decimal")]
    pub total: Money,
}

impl MonthDistribution {
    fn from_values(month: u32, mut values: Vec<Money>) -> Self {
        values.sort();
        let count = values.len();
        let median = match count {
            0 => Money::zero(),
            n if n % 2 == 1 => values[n / 2],
            n => Money::from_cents((values[n / 2 - 1].cents() + values[n / 2].cents()) / 2),
        };

        Self {
            month,
            count,
            min: values.first().copied().unwrap_or_default(),
            median,
            max: values.last().copied().unwrap_or_default(),
            total: values.iter().sum(),
        }
    }
}

/// Commitment distribution report
#[derive(Debug, Clone, Serialize)]
pub struct CommitmentReport {
    pub element: String,
    pub year: Option<i32>,
    /// January to December
    pub months: Vec<MonthDistribution>,
    /// Largest items first
    pub largest: Vec<CommitmentItem>,
    #[serde(serialize_with = "serialize_as_decimal")]
    pub total: Money,
}

impl CommitmentReport {
    /// Generate the report for an element from the expense documents
    pub fn generate(
        storage: &Storage,
        element: &str,
        year: Option<i32>,
        top_n: usize,
    ) -> TransparencyResult<Self> {
        let items = storage.commitments(year)?;
        let report = Self::build(items, element, year, top_n)?;
        if report.is_empty() {
            warn!(element, ?year, "no commitment items matched");
        }
        info!(element, items = report.item_count(), total = %report.total, "generated commitment report");
        Ok(report)
    }

    /// Build the report from commitment items
    ///
    /// The issue date of every item of `element` must be well formed, even
    /// when `year` would exclude it.
    pub fn build(
        items: impl IntoIterator<Item = CommitmentItem>,
        element: &str,
        year: Option<i32>,
        top_n: usize,
    ) -> TransparencyResult<Self> {
        let mut values: [Vec<Money>; 12] = std::array::from_fn(|_| Vec::new());
        let mut selected = Vec::new();

        for item in items {
            if item.element != element {
                continue;
            }
            let (issued_year, _, _) = item.issued.parts()?;
            if year.map_or(false, |y| y != issued_year) {
                continue;
            }
            let month = item.issued.month()?;
            values[(month - 1) as usize].push(item.total);
            selected.push(item);
        }

        // sort_by is stable: equal totals keep document order
        selected.sort_by(|a, b| b.total.cmp(&a.total));
        let total = selected.iter().map(|item| item.total).sum();
        selected.truncate(top_n);

        let months = (1u32..)
            .zip(values)
            .map(|(month, values)| MonthDistribution::from_values(month, values))
            .collect();

        Ok(Self {
            element: element.to_string(),
            year,
            months,
            largest: selected,
            total,
        })
    }

    /// Number of items of the element in the period
    pub fn item_count(&self) -> usize {
        self.months.iter().map(|m| m.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self, currency_symbol: &str) -> String {
        let mut output = String::new();
        let period = self
            .year
            .map_or_else(|| "all years".to_string(), |y| y.to_string());

        output.push_str(&format!("Commitments: {} ({})\n", self.element, period));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        if self.is_empty() {
            output.push_str("No commitment items for the selected period.\n");
            return output;
        }

        output.push_str(&format!(
            "{:<5} {:>6} {:>16} {:>16} {:>16} {:>16}\n",
            "Month", "Items", "Min", "Median", "Max", "Total"
        ));
        output.push_str(&separator(80));
        output.push('\n');
        for month in self.months.iter().filter(|m| m.count > 0) {
            output.push_str(&format!(
                "{:<5} {:>6} {:>16} {:>16} {:>16} {:>16}\n",
                month_abbreviation(month.month),
                month.count,
                month.min.format_with_symbol(currency_symbol),
                month.median.format_with_symbol(currency_symbol),
                month.max.format_with_symbol(currency_symbol),
                month.total.format_with_symbol(currency_symbol)
            ));
        }

        output.push_str(&format!("\nLargest {} items\n", self.largest.len()));
        output.push_str(&separator(80));
        output.push('\n');
        for item in &self.largest {
            output.push_str(&format!(
                "{} {:<10} {:>10.2} {:>16}\n",
                pad_right(&truncate(&item.description, 38), 38),
                item.issued.as_str(),
                item.quantity,
                item.total.format_with_symbol(currency_symbol)
            ));
        }

        output.push_str(&separator(80));
        output.push('\n');
        output.push_str(&format!(
            "TOTAL {} items {:>16}\n",
            self.item_count(),
            self.total.format_with_symbol(currency_symbol)
        ));

        output
    }

    /// Export the largest items to CSV format
    pub fn export_csv<W: Write>(&self, writer: W) -> TransparencyResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["Element", "Description", "Issued", "Quantity", "Unit Price", "Total"])?;

        for item in &self.largest {
            csv.write_record([
                item.element.clone(),
                item.description.clone(),
                item.issued.to_string(),
                format!("{:.2}", item.quantity),
                item.unit_price.to_string(),
                item.total.to_string(),
            ])?;
        }

        csv.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ELEMENT: &str = "Material de Consumo";

    fn item(issued: &str, element: &str, description: &str, total: f64) -> CommitmentItem {
        CommitmentItem::new(issued, element, description, 1.0, total).unwrap()
    }

    fn items() -> Vec<CommitmentItem> {
        vec![
            item("2022-01-10", ELEMENT, "Papel", 10.0),
            item("2022-01-12", ELEMENT, "Toner", 30.0),
            item("2022-01-20", ELEMENT, "Canetas", 20.0),
            item("2022-02-01", ELEMENT, "Luvas", 5.0),
            item("2022-02-03", ELEMENT, "Máscaras", 15.0),
            item("2022-03-01", "Diárias", "Viagem", 500.0),
            item("2021-03-01", ELEMENT, "Antigo", 900.0),
        ]
    }

    #[test]
    fn test_monthly_distribution() {
        let report = CommitmentReport::build(items(), ELEMENT, Some(2022), 50).unwrap();

        assert_eq!(report.months.len(), 12);
        let january = &report.months[0];
        assert_eq!(january.count, 3);
        assert_eq!(january.min.cents(), 1000);
        assert_eq!(january.median.cents(), 2000);
        assert_eq!(january.max.cents(), 3000);
        assert_eq!(january.total.cents(), 6000);

        let february = &report.months[1];
        assert_eq!(february.median.cents(), 1000);
        assert_eq!(report.months[2].count, 0);
        assert_eq!(report.total.cents(), 8000);
    }

    #[test]
    fn test_largest_items() {
        let report = CommitmentReport::build(items(), ELEMENT, None, 2).unwrap();
        let names: Vec<_> = report.largest.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(names, vec!["Antigo", "Toner"]);
        assert_eq!(report.item_count(), 6);
    }

    #[test]
    fn test_malformed_issue_date_fails() {
        let mut items = items();
        items.push(item("10/01/2022", ELEMENT, "Quebrado", 1.0));
        let err = CommitmentReport::build(items, ELEMENT, Some(2022), 50).unwrap_err();
        assert!(err.is_data_format());
    }

    #[test]
    fn test_other_elements_are_not_parsed() {
        let mut items = items();
        items.push(item("sem data", "Diárias", "Quebrado", 1.0));
        assert!(CommitmentReport::build(items, ELEMENT, Some(2022), 50).is_ok());
    }

    #[test]
    fn test_empty_report() {
        let report = CommitmentReport::build(items(), "Obras", Some(2022), 50).unwrap();
        assert!(report.is_empty());
        assert!(report.format_terminal("R$").contains("No commitment items"));
    }

    #[test]
    fn test_export_csv() {
        let report = CommitmentReport::build(items(), ELEMENT, Some(2022), 1).unwrap();
        let mut buffer = Vec::new();
        report.export_csv(&mut buffer).unwrap();
        let csv = String::from_utf8(buffer).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains("Material de Consumo,Toner,2022-01-12,1.00,30.00,30.00"));
    }
}
