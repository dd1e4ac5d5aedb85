//! transparencia - municipal transparency portal summaries
//!
//! Reads revenue and expense documents downloaded from a municipal
//! transparency portal and turns their movements into ranked category
//! totals: group by a classification label, sum, sort by amount, keep the
//! largest categories and fold the rest into a single remainder row,
//! optionally broken out by month.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Base directory and user settings
//! - `error`: Custom error types
//! - `models`: Money, movement records and commitment items
//! - `storage`: Dataset manifest and portal document loading
//! - `reports`: Aggregation, ranking and the reports built on them
//! - `display`: Terminal formatting helpers
//! - `export`: Text, CSV and JSON report output
//! - `cli`: clap command handlers
//!
//! # Example
//!
//! ```rust
//! use transparencia::models::{Dimension, Money, MovementRecord};
//! use transparencia::reports::{aggregate, rank_and_truncate, AggregationFilter, MovementTypeMatch};
//!
//! let records = vec![
//!     MovementRecord::new("2022-03-01", "Pagamento de empenho", Money::from_cents(10000))
//!         .with_label(Dimension::Function, "Saúde"),
//!     MovementRecord::new("2022-03-15", "Pagamento de empenho", Money::from_cents(5000))
//!         .with_label(Dimension::Function, "Educação"),
//! ];
//! let filter = AggregationFilter::matching(MovementTypeMatch::contains("pagamento")).year(2022);
//! let totals = aggregate(&records, &filter, Dimension::Function)?;
//! let summary = rank_and_truncate(&totals, 1, "Outros");
//!
//! assert_eq!(summary.pairs(), vec![
//!     ("Saúde", Money::from_cents(10000)),
//!     ("Outros", Money::from_cents(5000)),
//! ]);
//! # Ok::<(), transparencia::TransparencyError>(())
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod reports;
pub mod storage;

pub use error::{TransparencyError, TransparencyResult};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Default log filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "transparencia=info";

/// Initializes the global tracing subscriber, logging to stderr
///
/// `RUST_LOG` overrides the default filter. Calling this more than once is a
/// no-op.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        // A subscriber installed by an embedding application wins
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
