//! Top-N ranking with a remainder bucket
//!
//! Turns [`GroupTotals`] into rows sorted by amount, keeping the largest
//! labels by name and folding everything else into one "others" row so the
//! summary still adds up to the grand total.

use serde::{Deserialize, Serialize};

use super::aggregation::GroupTotals;
use crate::models::Money;

/// When to emit the remainder row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemainderPolicy {
    /// Whenever there is any data, even if nothing was cut (zero-valued row)
    #[default]
    Always,
    /// Only when some labels were cut off by `top_k`
    WhenTruncated,
}

impl std::str::FromStr for RemainderPolicy {
    type Err = crate::error::TransparencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "when-truncated" => Ok(Self::WhenTruncated),
            other => Err(crate::error::TransparencyError::Validation(format!(
                "Unknown remainder policy '{}'. Use always or when-truncated",
                other
            ))),
        }
    }
}

/// One row of a ranked summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedRow {
    pub label: String,
    pub amount: Money,
    /// True for the synthetic "others" row
    pub is_remainder: bool,
}

/// Rows sorted by amount descending, ties in first-seen order, with an
/// optional trailing remainder row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RankedSummary {
    rows: Vec<RankedRow>,
}

impl RankedSummary {
    pub fn rows(&self) -> &[RankedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of every row, remainder included
    pub fn total(&self) -> Money {
        self.rows.iter().map(|row| row.amount).sum()
    }

    /// Labels kept by name, remainder excluded
    pub fn named_labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .filter(|row| !row.is_remainder)
            .map(|row| row.label.as_str())
    }

    pub fn remainder(&self) -> Option<&RankedRow> {
        self.rows.last().filter(|row| row.is_remainder)
    }

    /// `(label, amount)` pairs, for comparisons and plotting collaborators
    pub fn pairs(&self) -> Vec<(&str, Money)> {
        self.rows
            .iter()
            .map(|row| (row.label.as_str(), row.amount))
            .collect()
    }

    pub fn into_rows(self) -> Vec<RankedRow> {
        self.rows
    }
}

fn sorted_entries(totals: &GroupTotals) -> Vec<(&str, Money)> {
    let mut entries: Vec<_> = totals.iter().collect();
    // sort_by is stable, so ties keep first-seen order
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

/// Every label, largest first, without truncation
pub fn rank_all(totals: &GroupTotals) -> RankedSummary {
    let rows = sorted_entries(totals)
        .into_iter()
        .map(|(label, amount)| RankedRow {
            label: label.to_string(),
            amount,
            is_remainder: false,
        })
        .collect();
    RankedSummary { rows }
}

/// Keep the `top_k` largest labels and fold the rest into `other_label`,
/// using the default [`RemainderPolicy`]
pub fn rank_and_truncate(totals: &GroupTotals, top_k: usize, other_label: &str) -> RankedSummary {
    rank_and_truncate_with(totals, top_k, other_label, RemainderPolicy::default())
}

/// Keep the `top_k` largest labels and fold the rest into `other_label`
///
/// Empty totals always produce an empty summary.
pub fn rank_and_truncate_with(
    totals: &GroupTotals,
    top_k: usize,
    other_label: &str,
    policy: RemainderPolicy,
) -> RankedSummary {
    if totals.is_empty() {
        return RankedSummary::default();
    }

    let entries = sorted_entries(totals);
    let truncated = top_k < entries.len();
    let split = top_k.min(entries.len());
    let (kept, rest) = entries.split_at(split);

    let mut rows: Vec<RankedRow> = kept
        .iter()
        .map(|(label, amount)| RankedRow {
            label: label.to_string(),
            amount: *amount,
            is_remainder: false,
        })
        .collect();

    let emit_remainder = match policy {
        RemainderPolicy::Always => true,
        RemainderPolicy::WhenTruncated => truncated,
    };
    if emit_remainder {
        rows.push(RankedRow {
            label: other_label.to_string(),
            amount: rest.iter().map(|(_, amount)| *amount).sum(),
            is_remainder: true,
        });
    }

    RankedSummary { rows }
}
