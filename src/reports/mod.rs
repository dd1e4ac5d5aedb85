//! Reports module for transparencia
//!
//! Aggregation and ranking primitives plus the reports built on them:
//! ranked category totals, month-by-month breakdowns, execution stages and
//! commitment distributions.

pub mod aggregation;
pub mod category;
pub mod commitments;
pub mod execution;
pub mod monthly;
pub mod query;
pub mod ranking;

pub use aggregation::{
    aggregate, aggregate_monthly, distinct_labels, AggregationFilter, Classify, GroupTotals,
    MonthlyBreakdown, MovementItem, MovementTypeMatch,
};
pub use category::{CategoryReport, CategoryRow, Truncation};
pub use commitments::{CommitmentReport, MonthDistribution};
pub use execution::{execution_report, StageClassifier, StageRule};
pub use monthly::{MonthlyReport, MonthlySeries};
pub use query::{ReportPreset, ReportQuery};
pub use ranking::{
    rank_all, rank_and_truncate, rank_and_truncate_with, RankedRow, RankedSummary,
    RemainderPolicy,
};
