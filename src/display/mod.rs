//! Display formatting for terminal output
//!
//! Provides utilities for formatting reports and dataset listings for
//! terminal display.

pub mod dataset;
pub mod report;

pub use dataset::{format_dataset_table, format_label_list};
pub use report::{format_bar, format_percentage, month_abbreviation, percentage_of, truncate};
