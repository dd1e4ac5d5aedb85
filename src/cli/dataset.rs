//! Dataset CLI commands
//!
//! Registers downloaded portal documents in the manifest so that reports can
//! select them by kind and year.

use clap::Subcommand;
use std::path::PathBuf;
use tracing::info;

use crate::display::format_dataset_table;
use crate::error::{TransparencyError, TransparencyResult};
use crate::models::DatasetKind;
use crate::storage::{ensure_document_exists, infer_from_filename, DocumentEntry, Storage};

/// Dataset subcommands
#[derive(Subcommand, Debug)]
pub enum DatasetCommands {
    /// Register a document; relative paths are under the data directory
    Add {
        /// Document file
        file: PathBuf,
        /// Dataset kind (revenue, expense, budgetary-expense); inferred from
        /// the file name when omitted
        #[arg(short, long)]
        kind: Option<DatasetKind>,
        /// Year the document covers; leave out for multi-year documents
        #[arg(short, long)]
        year: Option<i32>,
        /// Free-text period, e.g. "1 a 12 - 2022"
        #[arg(short, long)]
        period: Option<String>,
    },
    /// List registered documents
    #[command(alias = "ls")]
    List,
    /// Unregister a document (the file is left in place)
    #[command(alias = "rm")]
    Remove {
        /// Document file as registered
        file: PathBuf,
    },
    /// Register every file named by the download convention
    /// ("receita - ...", "despesa - ...", "despesaOrcamentaria - ...")
    Scan {
        /// Directory to scan; defaults to the data directory
        dir: Option<PathBuf>,
    },
}

/// Handle dataset commands
pub fn handle_dataset_command(storage: &mut Storage, cmd: DatasetCommands) -> TransparencyResult<()> {
    match cmd {
        DatasetCommands::Add {
            file,
            kind,
            year,
            period,
        } => {
            let inferred = file
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(infer_from_filename);

            let kind = kind.or(inferred.map(|(kind, _)| kind)).ok_or_else(|| {
                TransparencyError::Validation(format!(
                    "Cannot infer the dataset kind of {}; pass --kind",
                    file.display()
                ))
            })?;
            let year = year.or(inferred.and_then(|(_, year)| year));

            let entry = DocumentEntry::new(file, kind)
                .with_year(year)
                .with_period(period);
            ensure_document_exists(storage.paths(), &entry)?;

            storage.manifest.add(entry.clone())?;
            storage.manifest.save()?;
            info!(file = %entry.file.display(), %kind, ?year, "registered document");

            println!("Registered {} as {}", entry.file.display(), kind);
            if let Some(year) = entry.year {
                println!("  Year: {}", year);
            }
        }
        DatasetCommands::List => {
            println!("{}", format_dataset_table(storage.manifest.documents()));
        }
        DatasetCommands::Remove { file } => {
            let removed = storage.manifest.remove(&file)?;
            storage.manifest.save()?;
            println!("Unregistered {}", removed.file.display());
        }
        DatasetCommands::Scan { dir } => {
            let dir = dir.unwrap_or_else(|| storage.paths().data_dir());
            let added = storage.manifest.scan_legacy(&dir)?;
            storage.manifest.save()?;

            if added.is_empty() {
                println!("No new documents found in {}", dir.display());
            } else {
                println!("Registered {} document(s):", added.len());
                println!("{}", format_dataset_table(&added));
            }
        }
    }

    Ok(())
}
