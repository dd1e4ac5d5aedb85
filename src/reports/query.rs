//! Report presets and queries
//!
//! A [`ReportPreset`] names one of the dashboard panels with its dataset,
//! grouping dimension, movement-type pattern and truncation. A [`ReportQuery`]
//! is a preset (or a custom selection) resolved against the user settings
//! and command-line overrides.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::aggregation::{AggregationFilter, MovementTypeMatch};
use super::ranking::RemainderPolicy;
use crate::config::Settings;
use crate::error::{TransparencyError, TransparencyResult};
use crate::models::{DatasetKind, Dimension};

/// Expense payment movements
pub const PAYMENT_TYPES: [&str; 2] = ["Pagamento de empenho", "Pagamento de restos a pagar"];

/// Revenue collection movements
pub const COLLECTION_TYPES: [&str; 1] = ["Arrecadação de receita"];

/// The standard dashboard panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportPreset {
    ExpensesByFunction,
    ExpensesByDepartment,
    ExpensesByGroup,
    ExpensesByElement,
    ExpensesByDetail,
    ExpensesByEconomicCategory,
    RevenueBySpecies,
    RevenueBySubheading,
    RevenueByEconomicCategory,
}

impl ReportPreset {
    pub const ALL: [ReportPreset; 9] = [
        Self::ExpensesByFunction,
        Self::ExpensesByDepartment,
        Self::ExpensesByGroup,
        Self::ExpensesByElement,
        Self::ExpensesByDetail,
        Self::ExpensesByEconomicCategory,
        Self::RevenueBySpecies,
        Self::RevenueBySubheading,
        Self::RevenueByEconomicCategory,
    ];

    /// Command-line name of the preset
    pub fn name(&self) -> &'static str {
        match self {
            Self::ExpensesByFunction => "expenses-by-function",
            Self::ExpensesByDepartment => "expenses-by-department",
            Self::ExpensesByGroup => "expenses-by-group",
            Self::ExpensesByElement => "expenses-by-element",
            Self::ExpensesByDetail => "expenses-by-detail",
            Self::ExpensesByEconomicCategory => "expenses-by-economic-category",
            Self::RevenueBySpecies => "revenue-by-species",
            Self::RevenueBySubheading => "revenue-by-subheading",
            Self::RevenueByEconomicCategory => "revenue-by-economic-category",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::ExpensesByFunction => "Payments by function",
            Self::ExpensesByDepartment => "Payments by department",
            Self::ExpensesByGroup => "Payments by expense group",
            Self::ExpensesByElement => "Payments by expense element",
            Self::ExpensesByDetail => "Payments by expense detail",
            Self::ExpensesByEconomicCategory => "Payments by economic category",
            Self::RevenueBySpecies => "Revenue by species",
            Self::RevenueBySubheading => "Revenue by subheading",
            Self::RevenueByEconomicCategory => "Revenue by economic category",
        }
    }

    pub fn kind(&self) -> DatasetKind {
        match self {
            Self::RevenueBySpecies | Self::RevenueBySubheading | Self::RevenueByEconomicCategory => {
                DatasetKind::Revenue
            }
            _ => DatasetKind::Expense,
        }
    }

    pub fn dimension(&self) -> Dimension {
        match self {
            Self::ExpensesByFunction => Dimension::Function,
            Self::ExpensesByDepartment => Dimension::Department,
            Self::ExpensesByGroup => Dimension::Group,
            Self::ExpensesByElement => Dimension::Element,
            Self::ExpensesByDetail => Dimension::Detail,
            Self::ExpensesByEconomicCategory | Self::RevenueByEconomicCategory => {
                Dimension::EconomicCategory
            }
            Self::RevenueBySpecies => Dimension::Species,
            Self::RevenueBySubheading => Dimension::Subheading,
        }
    }

    pub fn movement_types(&self) -> MovementTypeMatch {
        match self {
            Self::ExpensesByDetail => MovementTypeMatch::contains("pagamento"),
            Self::RevenueBySubheading => MovementTypeMatch::contains("arrecadação"),
            _ => default_movement_types(self.kind()),
        }
    }

    /// Categories kept by name; `None` lists every category
    pub fn top_k(&self) -> Option<usize> {
        match self {
            Self::ExpensesByFunction | Self::ExpensesByDepartment | Self::RevenueBySpecies => {
                Some(5)
            }
            Self::ExpensesByGroup => Some(3),
            Self::ExpensesByElement | Self::ExpensesByDetail | Self::RevenueBySubheading => {
                Some(10)
            }
            Self::ExpensesByEconomicCategory | Self::RevenueByEconomicCategory => None,
        }
    }

    /// Remainder label, when the panel uses its own instead of the setting
    pub fn other_label(&self) -> Option<&'static str> {
        match self {
            Self::ExpensesByDetail => Some("Demais despesas"),
            Self::RevenueBySubheading => Some("Demais receitas"),
            _ => None,
        }
    }
}

impl fmt::Display for ReportPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ReportPreset {
    type Err = TransparencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| TransparencyError::preset_not_found(s))
    }
}

/// Movement types counted when a custom query does not name any
pub fn default_movement_types(kind: DatasetKind) -> MovementTypeMatch {
    match kind {
        DatasetKind::Revenue => MovementTypeMatch::one_of(COLLECTION_TYPES),
        DatasetKind::Expense | DatasetKind::BudgetaryExpense => {
            MovementTypeMatch::one_of(PAYMENT_TYPES)
        }
    }
}

/// A fully resolved category query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportQuery {
    pub title: String,
    pub kind: DatasetKind,
    pub dimension: Dimension,
    pub movement_types: MovementTypeMatch,
    pub top_k: Option<usize>,
    pub other_label: String,
    pub policy: RemainderPolicy,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl ReportQuery {
    /// Query for a preset panel
    pub fn from_preset(preset: ReportPreset, settings: &Settings) -> Self {
        Self {
            title: preset.title().to_string(),
            kind: preset.kind(),
            dimension: preset.dimension(),
            movement_types: preset.movement_types(),
            top_k: preset.top_k(),
            other_label: preset
                .other_label()
                .map_or_else(|| settings.other_label.clone(), str::to_string),
            policy: settings.remainder_policy,
            year: None,
            month: None,
        }
    }

    /// Query grouping any dataset by any dimension
    pub fn custom(kind: DatasetKind, dimension: Dimension, settings: &Settings) -> Self {
        Self {
            title: format!("{} by {}", kind, dimension),
            kind,
            dimension,
            movement_types: default_movement_types(kind),
            top_k: Some(settings.default_top_k),
            other_label: settings.other_label.clone(),
            policy: settings.remainder_policy,
            year: None,
            month: None,
        }
    }

    pub fn with_year(mut self, year: impl Into<Option<i32>>) -> Self {
        self.year = year.into();
        self
    }

    pub fn with_month(mut self, month: impl Into<Option<u32>>) -> Self {
        self.month = month.into();
        self
    }

    pub fn with_top_k(mut self, top_k: Option<usize>) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_policy(mut self, policy: RemainderPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_movement_types(mut self, movement_types: MovementTypeMatch) -> Self {
        self.movement_types = movement_types;
        self
    }

    /// Reject combinations that could never match
    pub fn validate(&self) -> TransparencyResult<()> {
        self.dimension.ensure_applies_to(self.kind)?;
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(TransparencyError::Validation(format!(
                    "Month must be between 1 and 12, got {}",
                    month
                )));
            }
        }
        Ok(())
    }

    pub fn filter(&self) -> AggregationFilter {
        AggregationFilter::matching(self.movement_types.clone())
            .year(self.year)
            .month(self.month)
    }
}
