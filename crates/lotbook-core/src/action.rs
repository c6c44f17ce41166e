//! Corporate-action adjustments.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{AdjustmentId, StockId};

/// Kind of corporate action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorporateActionKind {
    /// Every unit becomes `ratio` units at `1 / ratio` of the price.
    Split,
    /// Holders receive `ratio - 1` free units per unit held.
    Bonus,
    /// Recorded for audit only.
    Other,
}

impl fmt::Display for CorporateActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Split => write!(f, "split"),
            Self::Bonus => write!(f, "bonus"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A corporate action applied to every scope of a stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorporateActionAdjustment {
    /// Adjustment id.
    pub id: AdjustmentId,
    /// The stock affected.
    #[serde(rename = "stock_id")]
    pub stock: StockId,
    /// Lots bought on or before this date are affected.
    pub effective_date: NaiveDate,
    /// Split, bonus or other.
    pub kind: CorporateActionKind,
    /// Quantity multiplier.
    pub ratio: Decimal,
    /// Set once the adjustment has been replayed into the affected scopes.
    pub applied: bool,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CorporateActionAdjustment {
    /// Check whether `other` describes the same action (kind, ratio and
    /// effective date), ignoring id and note.
    #[must_use]
    pub fn same_action(&self, other: &Self) -> bool {
        self.stock == other.stock
            && self.kind == other.kind
            && self.ratio == other.ratio
            && self.effective_date == other.effective_date
    }
}

impl fmt::Display for CorporateActionAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}x for stock {}",
            self.effective_date, self.kind, self.ratio, self.stock
        )?;
        if let Some(note) = &self.note {
            write!(f, " ({note})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_same_action_ignores_id_and_note() {
        let a = CorporateActionAdjustment {
            id: AdjustmentId(1),
            stock: StockId(7),
            effective_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            kind: CorporateActionKind::Split,
            ratio: dec!(2),
            applied: true,
            note: None,
        };
        let b = CorporateActionAdjustment {
            id: AdjustmentId(2),
            note: Some("inferred".into()),
            applied: false,
            ..a.clone()
        };
        assert!(a.same_action(&b));

        let c = CorporateActionAdjustment {
            ratio: dec!(5),
            ..a.clone()
        };
        assert!(!a.same_action(&c));
        assert_eq!(a.to_string(), "2024-05-01 split 2x for stock 7");
    }
}
