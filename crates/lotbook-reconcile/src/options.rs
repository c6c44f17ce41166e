//! Reconciliation tolerances and candidate ratios.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tolerances and candidate ratios used when comparing a tax report
/// against booked lots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    /// Relative difference allowed between buy values for a plain match.
    pub value_tolerance: Decimal,
    /// Relative difference allowed between buy values when the quantities
    /// differ by a corporate-action ratio.
    pub ratio_value_tolerance: Decimal,
    /// Absolute difference allowed between the quantity ratio and a
    /// candidate ratio.
    pub ratio_tolerance: Decimal,
    /// Split ratios to try, in order.
    pub split_ratios: Vec<Decimal>,
    /// Bonus multipliers to try after the split ratios.
    pub bonus_ratios: Vec<Decimal>,
    /// Days a reported entry date may differ from the booked buy date when
    /// no buy falls on it exactly. Covers trade versus settlement dates.
    pub entry_date_window_days: u32,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            value_tolerance: Decimal::new(1, 2),
            ratio_value_tolerance: Decimal::new(2, 2),
            ratio_tolerance: Decimal::new(1, 2),
            split_ratios: [2, 3, 4, 5, 10, 20, 25, 50, 100]
                .into_iter()
                .map(Decimal::from)
                .collect(),
            bonus_ratios: vec![Decimal::new(15, 1)],
            entry_date_window_days: 1,
        }
    }
}
