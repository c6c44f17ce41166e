//! Position totals and unrealized gains.

use lotbook_core::Lot;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Totals for one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSummary {
    /// Units bought across all buy trades.
    pub total_bought: Decimal,
    /// Units sold across all sell trades.
    pub total_sold: Decimal,
    /// Units held now, after any corporate actions.
    pub available: Decimal,
    /// Weighted-average cost of the units held.
    pub average_price: Decimal,
    /// Cost of the units held.
    pub book_value: Decimal,
    /// Lots with units remaining.
    pub open_lots: usize,
    /// Realized entries produced so far.
    pub realized_entries: usize,
    /// Sum of realized profit.
    pub realized_profit: Decimal,
}

/// Paper gain on held units at a given price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unrealized {
    /// Units held.
    pub quantity: Decimal,
    /// Cost of the units.
    pub buy_value: Decimal,
    /// Units times the current price.
    pub current_value: Decimal,
    /// `current_value - buy_value`.
    pub profit: Decimal,
    /// Profit as a percentage of cost; `None` when the cost is zero.
    pub percent: Option<Decimal>,
}

/// Compute the unrealized gain of `lots` at `current_price`.
pub fn unrealized<'a, I>(lots: I, current_price: Decimal) -> Unrealized
where
    I: IntoIterator<Item = &'a Lot>,
{
    let (quantity, buy_value) = lots
        .into_iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(q, v), lot| {
            (q + lot.remaining_quantity, v + lot.book_value())
        });

    let current_value = quantity * current_price;
    let profit = current_value - buy_value;
    let percent = if buy_value.is_zero() {
        None
    } else {
        Some(profit / buy_value * Decimal::ONE_HUNDRED)
    };

    Unrealized {
        quantity,
        buy_value,
        current_value,
        profit,
        percent,
    }
}
