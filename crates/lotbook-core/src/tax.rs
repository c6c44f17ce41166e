//! Rows of an externally supplied tax report.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, ScopeKey, StockId};

/// One realized-gain row as reported by the broker's tax statement.
///
/// The report is independent of our own bookkeeping; comparing the two is
/// how corporate actions are discovered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxPnlEntry {
    /// The stock sold.
    #[serde(rename = "stock_id")]
    pub stock: StockId,
    /// The account it was sold from.
    #[serde(rename = "account_id")]
    pub account: AccountId,
    /// Buy date of the units.
    pub entry_date: NaiveDate,
    /// Sell date.
    pub exit_date: NaiveDate,
    /// Units sold.
    pub quantity: Decimal,
    /// Reported cost of the units.
    pub buy_value: Decimal,
    /// Reported proceeds.
    pub sell_value: Decimal,
}

impl TaxPnlEntry {
    /// The scope the row refers to.
    #[must_use]
    pub const fn scope(&self) -> ScopeKey {
        ScopeKey::new(self.stock, self.account)
    }

    /// Reported profit.
    #[must_use]
    pub fn profit(&self) -> Decimal {
        self.sell_value - self.buy_value
    }

    /// Reported cost per unit, or zero for an empty row.
    #[must_use]
    pub fn buy_price(&self) -> Decimal {
        if self.quantity.is_zero() {
            Decimal::ZERO
        } else {
            self.buy_value / self.quantity
        }
    }

    /// Reported proceeds per unit, or zero for an empty row.
    #[must_use]
    pub fn sell_price(&self) -> Decimal {
        if self.quantity.is_zero() {
            Decimal::ZERO
        } else {
            self.sell_value / self.quantity
        }
    }
}
