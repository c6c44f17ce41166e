//! Pure comparison of a reported row against the booked view.

use lotbook_core::CorporateActionKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::options::ReconcileOptions;

/// Quantity and cost of some units, as seen by one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Units.
    pub quantity: Decimal,
    /// Total cost of the units.
    pub buy_value: Decimal,
}

impl Observation {
    /// Create an observation.
    #[must_use]
    pub const fn new(quantity: Decimal, buy_value: Decimal) -> Self {
        Self {
            quantity,
            buy_value,
        }
    }

    /// Cost per unit, or zero when there are no units.
    #[must_use]
    pub fn buy_price(&self) -> Decimal {
        if self.quantity.is_zero() {
            Decimal::ZERO
        } else {
            self.buy_value / self.quantity
        }
    }
}

/// Why a reported row could not be explained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// Nothing booked corresponds to the row.
    NoCounterpart,
    /// The row's buy predates every booked trade of the scope.
    MissingHistory,
    /// Quantities differ by no known corporate-action ratio.
    QuantityMismatch,
    /// Quantities agree but values do not.
    ValueMismatch,
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCounterpart => write!(f, "no counterpart"),
            Self::MissingHistory => write!(f, "missing history"),
            Self::QuantityMismatch => write!(f, "quantity mismatch"),
            Self::ValueMismatch => write!(f, "value mismatch"),
        }
    }
}

/// Outcome of comparing one reported row against the booked view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Both sides agree.
    Matched,
    /// The reported quantity is the booked quantity times a split ratio.
    Split {
        /// The split ratio.
        ratio: Decimal,
    },
    /// The reported quantity is the booked quantity times a bonus multiplier.
    Bonus {
        /// The bonus multiplier.
        ratio: Decimal,
    },
    /// No rule explains the difference.
    Unexplained {
        /// What kind of difference was seen.
        kind: MismatchKind,
    },
}

impl Decision {
    /// The corporate action this decision calls for, if any.
    #[must_use]
    pub fn action(&self) -> Option<(CorporateActionKind, Decimal)> {
        match *self {
            Self::Split { ratio } => Some((CorporateActionKind::Split, ratio)),
            Self::Bonus { ratio } => Some((CorporateActionKind::Bonus, ratio)),
            Self::Matched | Self::Unexplained { .. } => None,
        }
    }
}

/// Check whether two values agree within a relative tolerance of the
/// larger magnitude.
#[must_use]
pub fn values_match(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    let scale = a.abs().max(b.abs());
    if scale.is_zero() {
        return true;
    }
    (a - b).abs() / scale <= tolerance
}

/// Compare what the engine booked with what the report says.
///
/// Equal quantities must agree on value. Otherwise the values must agree
/// within the looser ratio tolerance and the quantity ratio must be close to
/// a configured split ratio, then a bonus multiplier. Integer ratios are
/// therefore read as splits.
#[must_use]
pub fn decide(
    engine: &Observation,
    reported: &Observation,
    options: &ReconcileOptions,
) -> Decision {
    if engine.quantity <= Decimal::ZERO {
        return Decision::Unexplained {
            kind: MismatchKind::NoCounterpart,
        };
    }

    if engine.quantity == reported.quantity {
        return if values_match(engine.buy_value, reported.buy_value, options.value_tolerance) {
            Decision::Matched
        } else {
            Decision::Unexplained {
                kind: MismatchKind::ValueMismatch,
            }
        };
    }

    let quantity_mismatch = Decision::Unexplained {
        kind: MismatchKind::QuantityMismatch,
    };
    if !values_match(
        engine.buy_value,
        reported.buy_value,
        options.ratio_value_tolerance,
    ) {
        return quantity_mismatch;
    }

    let ratio = reported.quantity / engine.quantity;
    let near = |candidate: &&Decimal| (ratio - **candidate).abs() < options.ratio_tolerance;

    if let Some(&r) = options.split_ratios.iter().find(near) {
        return Decision::Split { ratio: r };
    }
    if let Some(&r) = options.bonus_ratios.iter().find(near) {
        return Decision::Bonus { ratio: r };
    }

    quantity_mismatch
}
