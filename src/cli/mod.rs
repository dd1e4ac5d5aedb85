//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the storage and report layers.

pub mod dataset;
pub mod report;

pub use dataset::{handle_dataset_command, DatasetCommands};
pub use report::{handle_report_command, OutputArgs, ReportCommands, SelectionArgs};
