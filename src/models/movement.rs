//! Movement records parsed from portal documents
//!
//! A movement is one dated financial event (a payment, a collection, a
//! commitment) together with the classification labels of the budget entry
//! it belongs to.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::money::Money;
use crate::error::{TransparencyError, TransparencyResult};

/// Kind of dataset a portal document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetKind {
    /// Revenue ("receita")
    Revenue,
    /// Expense ("despesa")
    Expense,
    /// Budgetary expense ("despesaOrcamentaria")
    BudgetaryExpense,
}

impl DatasetKind {
    /// All dataset kinds, in display order
    pub const ALL: [DatasetKind; 3] = [
        DatasetKind::Revenue,
        DatasetKind::Expense,
        DatasetKind::BudgetaryExpense,
    ];

    /// Identifier used by the portal API and in downloaded file names
    pub fn portal_name(&self) -> &'static str {
        match self {
            DatasetKind::Revenue => "receita",
            DatasetKind::Expense => "despesa",
            DatasetKind::BudgetaryExpense => "despesaOrcamentaria",
        }
    }

    /// Whether documents of this kind carry expense classifications
    pub fn is_expense(&self) -> bool {
        matches!(self, DatasetKind::Expense | DatasetKind::BudgetaryExpense)
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatasetKind::Revenue => "revenue",
            DatasetKind::Expense => "expense",
            DatasetKind::BudgetaryExpense => "budgetary-expense",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for DatasetKind {
    type Err = TransparencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "revenue" | "receita" => Ok(DatasetKind::Revenue),
            "expense" | "despesa" => Ok(DatasetKind::Expense),
            "budgetary-expense" | "despesaorcamentaria" => Ok(DatasetKind::BudgetaryExpense),
            other => Err(TransparencyError::Validation(format!(
                "Unknown dataset kind '{}'. Use revenue, expense or budgetary-expense",
                other
            ))),
        }
    }
}

/// A classification dimension of a budget entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dimension {
    /// Economic category (revenue and expense)
    EconomicCategory,
    /// Revenue species ("espécie")
    Species,
    /// Revenue subheading ("alínea")
    Subheading,
    /// Expense group ("grupo de despesa")
    Group,
    /// Expense element ("elemento de despesa")
    Element,
    /// Expense detail ("detalhamento")
    Detail,
    /// Budget unit / department ("unidade orçamentária")
    Department,
    /// Government function ("função")
    Function,
}

impl Dimension {
    /// All dimensions, in display order
    pub const ALL: [Dimension; 8] = [
        Dimension::EconomicCategory,
        Dimension::Species,
        Dimension::Subheading,
        Dimension::Group,
        Dimension::Element,
        Dimension::Detail,
        Dimension::Department,
        Dimension::Function,
    ];

    /// Path below `registro` to the object holding the label, for a given
    /// document kind. `None` when the dimension does not exist for that kind.
    pub fn source_path(&self, kind: DatasetKind) -> Option<&'static [&'static str]> {
        let expense = kind.is_expense();
        match self {
            Dimension::EconomicCategory if expense => {
                Some(&["naturezaDespesa", "categoriaEconomica"])
            }
            Dimension::EconomicCategory => Some(&["naturezaReceita", "categoriaEconomica"]),
            Dimension::Species if !expense => Some(&["naturezaReceita", "especie"]),
            Dimension::Subheading if !expense => Some(&["naturezaReceita", "alinea"]),
            Dimension::Group if expense => Some(&["naturezaDespesa", "grupo"]),
            Dimension::Element if expense => Some(&["naturezaDespesa", "elemento"]),
            Dimension::Detail if expense => Some(&["naturezaDespesa", "detalhamento"]),
            Dimension::Department if expense => Some(&["unidadeOrcamentaria"]),
            Dimension::Function if expense => Some(&["despesa", "funcao"]),
            _ => None,
        }
    }

    /// Check a dimension against a document kind
    pub fn ensure_applies_to(&self, kind: DatasetKind) -> TransparencyResult<()> {
        if self.source_path(kind).is_some() {
            Ok(())
        } else {
            Err(TransparencyError::Validation(format!(
                "Dimension '{}' is not available for {} documents",
                self, kind
            )))
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::EconomicCategory => "economic-category",
            Dimension::Species => "species",
            Dimension::Subheading => "subheading",
            Dimension::Group => "group",
            Dimension::Element => "element",
            Dimension::Detail => "detail",
            Dimension::Department => "department",
            Dimension::Function => "function",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Dimension {
    type Err = TransparencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Dimension::ALL
            .into_iter()
            .find(|d| d.to_string() == wanted)
            .ok_or_else(|| {
                TransparencyError::Validation(format!("Unknown classification dimension '{}'", s))
            })
    }
}

/// A movement date as written by the portal (`YYYY-MM-DD`)
///
/// Kept as text and split on demand so that a malformed date surfaces as a
/// data error at the point where it would influence a total.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementDate(String);

impl MovementDate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into `(year, month, day)` integers
    ///
    /// The components are not range-checked; callers that bucket by month
    /// validate the month themselves.
    pub fn parts(&self) -> TransparencyResult<(i32, u32, u32)> {
        let malformed = || {
            TransparencyError::data_format(format!(
                "Malformed movement date '{}', expected YYYY-MM-DD",
                self.0
            ))
        };

        let mut pieces = self.0.trim().split('-');
        let (Some(year), Some(month), Some(day), None) =
            (pieces.next(), pieces.next(), pieces.next(), pieces.next())
        else {
            return Err(malformed());
        };

        let year = year.parse::<i32>().map_err(|_| malformed())?;
        let month = month.parse::<u32>().map_err(|_| malformed())?;
        let day = day.parse::<u32>().map_err(|_| malformed())?;
        Ok((year, month, day))
    }

    /// Month number, validated to lie in 1..=12
    pub fn month(&self) -> TransparencyResult<u32> {
        let (_, month, _) = self.parts()?;
        if (1..=12).contains(&month) {
            Ok(month)
        } else {
            Err(TransparencyError::data_format(format!(
                "Month {} out of range in movement date '{}'",
                month, self.0
            )))
        }
    }
}

impl fmt::Display for MovementDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single dated financial movement with its classification labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub date: MovementDate,
    pub movement_type: String,
    pub amount: Money,
    pub classification: BTreeMap<Dimension, String>,
    /// Why a requested label could not be read from the source document
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub unresolved: BTreeMap<Dimension, String>,
}

impl MovementRecord {
    /// Create a record without classification labels
    pub fn new(date: impl Into<String>, movement_type: impl Into<String>, amount: Money) -> Self {
        Self {
            date: MovementDate::new(date),
            movement_type: movement_type.into(),
            amount,
            classification: BTreeMap::new(),
            unresolved: BTreeMap::new(),
        }
    }

    /// Builder-style helper to attach a classification label
    pub fn with_label(mut self, dimension: Dimension, label: impl Into<String>) -> Self {
        self.classification.insert(dimension, label.into());
        self
    }

    /// Record that a label was requested but absent from the source, so the
    /// error surfaces only if the record is ever classified
    pub fn with_unresolved_label(mut self, dimension: Dimension, reason: impl Into<String>) -> Self {
        self.unresolved.insert(dimension, reason.into());
        self
    }

    /// Label for a dimension; a missing label is a data error, never a default
    pub fn label(&self, dimension: Dimension) -> TransparencyResult<&str> {
        if let Some(label) = self.classification.get(&dimension) {
            return Ok(label);
        }

        Err(match self.unresolved.get(&dimension) {
            Some(reason) => TransparencyError::data_format(reason.clone()),
            None => TransparencyError::data_format(format!(
                "Movement of {} ({}) has no '{}' classification",
                self.date, self.movement_type, dimension
            )),
        })
    }
}
