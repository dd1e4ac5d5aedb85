//! Commitment ("empenho") line items

use serde::{Deserialize, Serialize};

use super::money::Money;
use super::movement::MovementDate;

/// One item of a commitment: quantity times unit price under a budget element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitmentItem {
    /// Issue date of the commitment
    pub issued: MovementDate,
    /// Budget element the commitment is charged to
    pub element: String,
    /// Item description
    pub description: String,
    pub quantity: f64,
    pub unit_price: Money,
    /// `quantity * unit_price`, rounded to the cent
    pub total: Money,
}

impl CommitmentItem {
    /// Build an item, computing its total from quantity and unit price.
    /// Returns `None` when the product is not a finite amount.
    pub fn new(
        issued: impl Into<String>,
        element: impl Into<String>,
        description: impl Into<String>,
        quantity: f64,
        unit_price: f64,
    ) -> Option<Self> {
        Some(Self {
            issued: MovementDate::new(issued),
            element: element.into(),
            description: description.into(),
            quantity,
            unit_price: Money::from_decimal(unit_price)?,
            total: Money::from_decimal(quantity * unit_price)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_quantity_times_price() {
        let item = CommitmentItem::new("2022-05-10", "Material de Consumo", "Papel A4", 12.0, 25.5)
            .unwrap();
        assert_eq!(item.total.cents(), 30600);
        assert_eq!(item.unit_price.cents(), 2550);
    }

    #[test]
    fn test_non_finite_total_rejected() {
        assert!(CommitmentItem::new("2022-05-10", "X", "Y", f64::INFINITY, 1.0).is_none());
    }
}
