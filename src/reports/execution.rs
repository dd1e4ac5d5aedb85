//! Budget execution reports
//!
//! Group expense movements by the execution stage their type represents
//! instead of by a classification label: committed, liquidated and paid
//! amounts for the year, or paid and cancelled carryover ("restos a pagar").

use tracing::warn;

use super::aggregation::{aggregate, AggregationFilter, Classify, MovementTypeMatch};
use super::category::{CategoryReport, Truncation};
use crate::error::{TransparencyError, TransparencyResult};
use crate::models::{DatasetKind, MovementRecord};
use crate::storage::Storage;

/// Maps a movement type to the stage it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRule {
    pub pattern: MovementTypeMatch,
    pub stage: String,
}

impl StageRule {
    pub fn new(pattern: MovementTypeMatch, stage: impl Into<String>) -> Self {
        Self {
            pattern,
            stage: stage.into(),
        }
    }
}

/// Classifies movements by execution stage; the first matching rule wins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageClassifier {
    title: String,
    rules: Vec<StageRule>,
}

impl StageClassifier {
    pub fn new(title: impl Into<String>, rules: Vec<StageRule>) -> Self {
        Self {
            title: title.into(),
            rules,
        }
    }

    /// Commitment, liquidation and payment of the year's expenses
    pub fn expense_execution() -> Self {
        Self::new(
            "Expense execution",
            vec![
                StageRule::new(MovementTypeMatch::one_of(["Emissão de empenho"]), "Empenhado"),
                StageRule::new(MovementTypeMatch::one_of(["Liquidação de empenho"]), "Liquidado"),
                StageRule::new(MovementTypeMatch::one_of(["Pagamento de empenho"]), "Pago"),
            ],
        )
    }

    /// Payment and cancellation of commitments carried over from earlier years
    pub fn carryover() -> Self {
        Self::new(
            "Carryover execution (restos a pagar)",
            vec![
                StageRule::new(
                    MovementTypeMatch::one_of(["Pagamento de restos a pagar"]),
                    "Valor pago",
                ),
                StageRule::new(
                    MovementTypeMatch::contains("Cancelamento de restos a pagar"),
                    "Valor cancelado",
                ),
            ],
        )
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rules(&self) -> &[StageRule] {
        &self.rules
    }

    /// Stage of a movement type, if any rule matches
    pub fn stage_of(&self, movement_type: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(movement_type))
            .map(|rule| rule.stage.as_str())
    }

    /// Filter accepting exactly the movement types some rule matches
    pub fn filter(&self) -> AggregationFilter {
        let patterns: Vec<MovementTypeMatch> =
            self.rules.iter().map(|rule| rule.pattern.clone()).collect();
        AggregationFilter::new(move |movement_type| {
            patterns.iter().any(|pattern| pattern.matches(movement_type))
        })
    }
}

impl Classify for &StageClassifier {
    fn classify(&mut self, record: &MovementRecord) -> TransparencyResult<String> {
        self.stage_of(&record.movement_type)
            .map(str::to_owned)
            .ok_or_else(|| {
                TransparencyError::data_format(format!(
                    "Movement type '{}' has no execution stage",
                    record.movement_type
                ))
            })
    }
}

/// Stage totals of the expense documents, largest first, without truncation
pub fn execution_report(
    storage: &Storage,
    classifier: &StageClassifier,
    year: Option<i32>,
) -> TransparencyResult<CategoryReport> {
    let records = storage.movements(DatasetKind::Expense, year, &[])?;
    let totals = aggregate(records, &classifier.filter().year(year), classifier)?;
    if totals.is_empty() {
        warn!(title = classifier.title(), ?year, "no movements matched");
    }

    Ok(CategoryReport::from_totals(classifier.title(), &totals, Truncation::None).for_period(year, None))
}
