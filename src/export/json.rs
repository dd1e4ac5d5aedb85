//! JSON Export functionality
//!
//! Wraps a report in an envelope carrying schema and application versions so
//! that downstream consumers (dashboards, notebooks) can check what they read.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::error::{TransparencyError, TransparencyResult};

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Envelope around one exported report
#[derive(Debug, Clone, Serialize)]
pub struct SummaryExport<'a, T: Serialize> {
    /// Schema version for compatibility checking
    pub schema_version: &'static str,

    /// Export timestamp
    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: &'static str,

    /// Kind of report, e.g. "category" or "monthly"
    pub report_type: &'a str,

    /// Amounts in the report are decimal currency units
    pub currency: &'a str,

    pub report: &'a T,
}

impl<'a, T: Serialize> SummaryExport<'a, T> {
    pub fn new(report_type: &'a str, currency: &'a str, report: &'a T) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION,
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION"),
            report_type,
            currency,
            report,
        }
    }
}

/// Write a report wrapped in a [`SummaryExport`]
pub fn export_summary_json<W: Write, T: Serialize>(
    writer: W,
    report_type: &str,
    currency: &str,
    report: &T,
    pretty: bool,
) -> TransparencyResult<()> {
    let export = SummaryExport::new(report_type, currency, report);

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| TransparencyError::Export(e.to_string()))?;

    Ok(())
}
