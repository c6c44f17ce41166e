//! Snapshots of current holdings.

use lotbook_booking::{unrealized, FifoEngine, Unrealized};
use lotbook_core::{AccountId, Lot, ScopeKey, StockId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Units of one stock held in one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// The stock.
    #[serde(rename = "stock_id")]
    pub stock: StockId,
    /// The account.
    #[serde(rename = "account_id")]
    pub account: AccountId,
    /// Units held.
    pub quantity: Decimal,
    /// Weighted-average cost of the held units.
    pub average_price: Decimal,
    /// Total cost of the held units.
    pub book_value: Decimal,
    /// Open lots, oldest first.
    pub lots: Vec<Lot>,
}

impl Holding {
    pub(crate) fn from_engine(engine: &FifoEngine) -> Self {
        let scope = engine.scope();
        Self {
            stock: scope.stock,
            account: scope.account,
            quantity: engine.units(),
            average_price: engine.average_price(),
            book_value: engine.book_value(),
            lots: engine.open_lots().cloned().collect(),
        }
    }

    /// The (stock, account) pair.
    #[must_use]
    pub const fn scope(&self) -> ScopeKey {
        ScopeKey::new(self.stock, self.account)
    }

    /// Paper gain of the held units at `current_price`.
    #[must_use]
    pub fn unrealized(&self, current_price: Decimal) -> Unrealized {
        unrealized(&self.lots, current_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lotbook_core::{TermPolicy, Trade};
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_snapshot_and_unrealized() {
        let scope = ScopeKey::new(StockId(1), AccountId(2));
        let mut engine = FifoEngine::new(scope, TermPolicy::default());
        for trade in [
            Trade::buy("B1", StockId(1), AccountId(2), date(2024, 1, 1), dec!(50), dec!(100)),
            Trade::buy("B2", StockId(1), AccountId(2), date(2024, 2, 1), dec!(50), dec!(120)),
            Trade::sell("S1", StockId(1), AccountId(2), date(2024, 3, 1), dec!(30), dec!(150)),
        ] {
            engine.process_trade(&trade).unwrap();
        }

        let holding = Holding::from_engine(&engine);
        assert_eq!(holding.scope(), scope);
        assert_eq!(holding.quantity, dec!(70));
        assert_eq!(holding.book_value, dec!(8000));
        assert_eq!(holding.lots.len(), 2);

        let paper = holding.unrealized(dec!(130));
        assert_eq!(paper.current_value, dec!(9100));
        assert_eq!(paper.profit, dec!(1100));
    }
}
