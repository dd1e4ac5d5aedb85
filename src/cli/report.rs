//! CLI commands for reports
//!
//! Generates the category, monthly, execution and commitment reports and the
//! label listings, writing them as text, CSV or JSON.

use clap::{Args, Subcommand};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use crate::config::Settings;
use crate::display::format_label_list;
use crate::error::{TransparencyError, TransparencyResult};
use crate::export::{write_report, ExportableReport, OutputFormat};
use crate::models::{DatasetKind, Dimension, MovementRecord};
use crate::reports::{
    distinct_labels, execution_report, AggregationFilter, CategoryReport, CommitmentReport,
    MonthlyReport, MovementTypeMatch, RemainderPolicy, ReportPreset, ReportQuery,
    StageClassifier,
};
use crate::storage::Storage;

/// Which panel, or which custom grouping, a report aggregates
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Dashboard preset (see `transparencia report presets`)
    #[arg(short, long, conflicts_with_all = ["kind", "dimension"], required_unless_present = "kind")]
    pub preset: Option<ReportPreset>,

    /// Dataset kind of a custom report (revenue, expense, budgetary-expense)
    #[arg(short, long, requires = "dimension")]
    pub kind: Option<DatasetKind>,

    /// Classification dimension of a custom report (e.g. function, species)
    #[arg(short, long, requires = "kind")]
    pub dimension: Option<Dimension>,

    /// Count movements whose type contains this text (case-insensitive)
    /// instead of the default payment or collection types
    #[arg(short = 't', long)]
    pub movement_type: Option<String>,

    /// Match --movement-type exactly instead of as a substring
    #[arg(long, requires = "movement_type")]
    pub exact: bool,
}

impl SelectionArgs {
    /// Resolve into a query with the settings' defaults
    pub fn resolve(&self, settings: &Settings) -> TransparencyResult<ReportQuery> {
        let query = match (self.preset, self.kind, self.dimension) {
            (Some(preset), _, _) => ReportQuery::from_preset(preset, settings),
            (None, Some(kind), Some(dimension)) => ReportQuery::custom(kind, dimension, settings),
            _ => {
                return Err(TransparencyError::Validation(
                    "Choose a --preset, or both --kind and --dimension".to_string(),
                ))
            }
        };

        Ok(match &self.movement_type {
            Some(movement_type) if self.exact => {
                query.with_movement_types(MovementTypeMatch::one_of([movement_type.clone()]))
            }
            Some(movement_type) => {
                query.with_movement_types(MovementTypeMatch::contains(movement_type.clone()))
            }
            None => query,
        })
    }
}

/// Where and how a report is written
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format (text, csv, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Write to a file instead of standard output
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Report subcommands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Ranked totals per category, with the smallest folded into a remainder row
    #[command(alias = "cat")]
    Category {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Only movements of this year
        #[arg(short, long)]
        year: Option<i32>,

        /// Only movements of this month (1-12)
        #[arg(short, long)]
        month: Option<u32>,

        /// Number of categories kept by name
        #[arg(long, conflicts_with = "all")]
        top: Option<usize>,

        /// List every category without a remainder row
        #[arg(long)]
        all: bool,

        /// When to add the remainder row (always, when-truncated)
        #[arg(long)]
        policy: Option<RemainderPolicy>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Month-by-month totals per category for one year
    Monthly {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Year to break down
        #[arg(short, long)]
        year: i32,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Committed, liquidated and paid totals of the expense documents
    Execution {
        /// Only movements of this year
        #[arg(short, long)]
        year: Option<i32>,

        /// Report paid and cancelled carryover (restos a pagar) instead
        #[arg(long)]
        carryover: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Distribution of the commitment items of one budget element
    Commitments {
        /// Budget element name, e.g. "Material de Consumo"
        #[arg(short, long)]
        element: String,

        /// Only items issued in this year
        #[arg(short, long)]
        year: Option<i32>,

        /// Number of largest items listed
        #[arg(long)]
        top: Option<usize>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Distinct category labels of a selection
    Labels {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Only movements of this year
        #[arg(short, long)]
        year: Option<i32>,

        /// Only movements of this month (1-12)
        #[arg(short, long)]
        month: Option<u32>,
    },

    /// Distinct movement types found in a dataset
    #[command(alias = "types")]
    MovementTypes {
        /// Dataset kind (revenue, expense, budgetary-expense)
        #[arg(short, long)]
        kind: DatasetKind,

        /// Only movements of this year
        #[arg(short, long)]
        year: Option<i32>,

        /// Only movements of this month (1-12)
        #[arg(short, long)]
        month: Option<u32>,
    },

    /// List the dashboard presets
    Presets,
}

/// Handle report commands
pub fn handle_report_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ReportCommands,
) -> TransparencyResult<()> {
    match cmd {
        ReportCommands::Category {
            selection,
            year,
            month,
            top,
            all,
            policy,
            output,
        } => {
            let mut query = selection
                .resolve(settings)?
                .with_year(year)
                .with_month(month);
            if all {
                query = query.with_top_k(None);
            } else if let Some(top) = top {
                query = query.with_top_k(Some(top));
            }
            if let Some(policy) = policy {
                query = query.with_policy(policy);
            }

            let report = CategoryReport::generate(storage, &query)?;
            emit(&report, &output, settings)
        }
        ReportCommands::Monthly {
            selection,
            year,
            output,
        } => {
            let query = selection.resolve(settings)?.with_year(year);
            let report = MonthlyReport::generate(storage, &query)?;
            emit(&report, &output, settings)
        }
        ReportCommands::Execution {
            year,
            carryover,
            output,
        } => {
            let classifier = if carryover {
                StageClassifier::carryover()
            } else {
                StageClassifier::expense_execution()
            };
            let report = execution_report(storage, &classifier, year)?;
            emit(&report, &output, settings)
        }
        ReportCommands::Commitments {
            element,
            year,
            top,
            output,
        } => {
            let top_n = top.unwrap_or(settings.commitment_top_n);
            let report = CommitmentReport::generate(storage, &element, year, top_n)?;
            emit(&report, &output, settings)
        }
        ReportCommands::Labels {
            selection,
            year,
            month,
        } => handle_labels(storage, settings, &selection, year, month),
        ReportCommands::MovementTypes { kind, year, month } => {
            handle_movement_types(storage, kind, year, month)
        }
        ReportCommands::Presets => {
            for preset in ReportPreset::ALL {
                let top = preset
                    .top_k()
                    .map_or_else(|| "all".to_string(), |k| format!("top {}", k));
                println!(
                    "{:<32} {:<8} {:<18} {:<7} {}",
                    preset.name(),
                    preset.kind().to_string(),
                    preset.dimension().to_string(),
                    top,
                    preset.movement_types()
                );
            }
            Ok(())
        }
    }
}

/// Write a report to the requested file or to standard output
fn emit<R: ExportableReport>(
    report: &R,
    output: &OutputArgs,
    settings: &Settings,
) -> TransparencyResult<()> {
    match &output.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                TransparencyError::Export(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let mut writer = BufWriter::new(file);
            write_report(report, output.format, &settings.currency_symbol, &mut writer)?;
            println!("Report exported to: {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            write_report(report, output.format, &settings.currency_symbol, &mut writer)?;
        }
    }
    Ok(())
}

fn handle_labels(
    storage: &Storage,
    settings: &Settings,
    selection: &SelectionArgs,
    year: Option<i32>,
    month: Option<u32>,
) -> TransparencyResult<()> {
    let query = selection
        .resolve(settings)?
        .with_year(year)
        .with_month(month);
    query.validate()?;

    let records = storage.movements(query.kind, query.year, &[query.dimension])?;
    let labels = distinct_labels(records, &query.filter(), query.dimension)?;

    println!(
        "{}",
        format_label_list(&format!("{} labels ({})", query.dimension, query.kind), &labels)
    );
    Ok(())
}

fn handle_movement_types(
    storage: &Storage,
    kind: DatasetKind,
    year: Option<i32>,
    month: Option<u32>,
) -> TransparencyResult<()> {
    if let Some(month) = month {
        if !(1..=12).contains(&month) {
            return Err(TransparencyError::Validation(format!(
                "Month must be between 1 and 12, got {}",
                month
            )));
        }
    }

    let records = storage.movements(kind, year, &[])?;
    let filter = AggregationFilter::any().year(year).month(month);
    let types = distinct_labels(
        records,
        &filter,
        |record: &MovementRecord| -> TransparencyResult<String> {
            Ok(record.movement_type.clone())
        },
    )?;

    println!(
        "{}",
        format_label_list(&format!("Movement types ({})", kind), &types)
    );
    Ok(())
}
