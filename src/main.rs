use anyhow::Result;
use clap::{Parser, Subcommand};

use transparencia::cli::{handle_dataset_command, handle_report_command};
use transparencia::config::{paths::TransparencyPaths, settings::Settings};
use transparencia::storage::Storage;

#[derive(Parser)]
#[command(
    name = "transparencia",
    version,
    about = "Summarize municipal transparency portal revenue and expense data",
    long_about = "transparencia reads revenue and expense documents downloaded from a \
                  municipal transparency portal and reports ranked totals per category, \
                  per month and per execution stage, as text tables, CSV or JSON."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Dataset document management commands
    #[command(subcommand, alias = "data")]
    Dataset(transparencia::cli::DatasetCommands),

    /// Report commands
    #[command(subcommand)]
    Report(transparencia::cli::ReportCommands),

    /// Create the data directory and default settings
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    transparencia::init_tracing();
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = TransparencyPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    // Initialize storage
    let mut storage = Storage::open(paths.clone())?;

    match cli.command {
        Some(Commands::Dataset(cmd)) => {
            handle_dataset_command(&mut storage, cmd)?;
        }
        Some(Commands::Report(cmd)) => {
            handle_report_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Init) => {
            if paths.is_initialized() {
                println!("transparencia is already initialized at: {}", paths.base_dir().display());
                return Ok(());
            }
            println!("Initializing transparencia at: {}", paths.base_dir().display());
            settings.save(&paths)?;
            storage.manifest.save()?;
            println!("Initialization complete!");
            println!();
            println!("Copy portal documents into: {}", paths.data_dir().display());
            println!("Then run 'transparencia dataset scan' to register them.");
        }
        Some(Commands::Config) => {
            println!("transparencia Configuration");
            println!("===========================");
            println!("Base directory:    {}", paths.base_dir().display());
            println!("Data directory:    {}", paths.data_dir().display());
            println!("Exports directory: {}", paths.exports_dir().display());
            println!("Manifest:          {} document(s)", storage.manifest.len());
            println!();
            println!("Settings:");
            println!("  Currency symbol:  {}", settings.currency_symbol);
            println!("  Remainder label:  {}", settings.other_label);
            println!("  Remainder policy: {:?}", settings.remainder_policy);
            println!("  Default top-K:    {}", settings.default_top_k);
            println!("  Commitment top-N: {}", settings.commitment_top_n);
        }
        None => {
            println!("transparencia - municipal transparency portal summaries");
            println!();
            println!("Run 'transparencia --help' for usage information.");
        }
    }

    Ok(())
}
