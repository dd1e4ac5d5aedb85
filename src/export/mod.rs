//! Export module for transparencia
//!
//! Renders any report in one of three formats:
//! - Text: terminal tables with bars
//! - CSV: spreadsheet-compatible rows
//! - JSON: the report wrapped in a versioned envelope

pub mod json;

pub use json::{export_summary_json, SummaryExport, EXPORT_SCHEMA_VERSION};

use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::error::{TransparencyError, TransparencyResult};
use crate::reports::{CategoryReport, CommitmentReport, MonthlyReport};

/// Output format of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Csv,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = TransparencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(TransparencyError::Validation(format!(
                "Unknown output format '{}'. Use text, csv or json",
                other
            ))),
        }
    }
}

/// A report that can be written in every [`OutputFormat`]
pub trait ExportableReport: Serialize {
    /// Name recorded in the JSON envelope
    fn report_type(&self) -> &'static str;

    fn to_text(&self, currency_symbol: &str) -> String;

    fn to_csv(&self, writer: &mut dyn Write) -> TransparencyResult<()>;
}

impl ExportableReport for CategoryReport {
    fn report_type(&self) -> &'static str {
        "category"
    }

    fn to_text(&self, currency_symbol: &str) -> String {
        self.format_terminal(currency_symbol)
    }

    fn to_csv(&self, writer: &mut dyn Write) -> TransparencyResult<()> {
        self.export_csv(writer)
    }
}

impl ExportableReport for MonthlyReport {
    fn report_type(&self) -> &'static str {
        "monthly"
    }

    fn to_text(&self, currency_symbol: &str) -> String {
        self.format_terminal(currency_symbol)
    }

    fn to_csv(&self, writer: &mut dyn Write) -> TransparencyResult<()> {
        self.export_csv(writer)
    }
}

impl ExportableReport for CommitmentReport {
    fn report_type(&self) -> &'static str {
        "commitments"
    }

    fn to_text(&self, currency_symbol: &str) -> String {
        self.format_terminal(currency_symbol)
    }

    fn to_csv(&self, writer: &mut dyn Write) -> TransparencyResult<()> {
        self.export_csv(writer)
    }
}

/// Write `report` to `writer` in `format`
pub fn write_report<R: ExportableReport>(
    report: &R,
    format: OutputFormat,
    currency_symbol: &str,
    writer: &mut dyn Write,
) -> TransparencyResult<()> {
    match format {
        OutputFormat::Text => {
            writer.write_all(report.to_text(currency_symbol).as_bytes())?;
        }
        OutputFormat::Csv => report.to_csv(writer)?,
        OutputFormat::Json => {
            export_summary_json(&mut *writer, report.report_type(), currency_symbol, report, true)?;
            writeln!(writer)?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use crate::reports::{GroupTotals, Truncation};

    fn report() -> CategoryReport {
        let totals: GroupTotals = [("Saúde", Money::from_cents(2500)), ("Educação", Money::from_cents(500))]
            .into_iter()
            .collect();
        CategoryReport::from_totals("Payments by function", &totals, Truncation::None)
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default().to_string(), "text");
    }

    #[test]
    fn test_write_each_format() {
        let report = report();

        let mut text = Vec::new();
        write_report(&report, OutputFormat::Text, "R$", &mut text).unwrap();
        assert!(String::from_utf8(text).unwrap().contains("R$25.00"));

        let mut csv = Vec::new();
        write_report(&report, OutputFormat::Csv, "R$", &mut csv).unwrap();
        assert!(String::from_utf8(csv).unwrap().contains("Educação,5.00"));

        let mut json = Vec::new();
        write_report(&report, OutputFormat::Json, "R$", &mut json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["report_type"], "category");
    }
}
