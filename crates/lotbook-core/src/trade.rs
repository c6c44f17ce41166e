//! Trades as reported by a broker.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ids::{AccountId, ScopeKey, StockId, TradeId};

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Units acquired.
    Buy,
    /// Units disposed of.
    Sell,
}

impl Side {
    /// Get the side as a lowercase string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown trade side.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown trade side: {0:?}")]
pub struct ParseSideError(pub String);

impl FromStr for Side {
    type Err = ParseSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "b" => Ok(Self::Buy),
            "sell" | "s" => Ok(Self::Sell),
            _ => Err(ParseSideError(s.to_string())),
        }
    }
}

/// A single executed trade.
///
/// Trades are immutable once accepted. Quantity and price are always
/// positive; the direction is carried by [`Side`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Broker-assigned id, unique across all trades.
    #[serde(rename = "trade_id")]
    pub id: TradeId,
    /// The stock traded.
    #[serde(rename = "stock_id")]
    pub stock: StockId,
    /// The account the trade settled in.
    #[serde(rename = "account_id")]
    pub account: AccountId,
    /// Trade date.
    pub date: NaiveDate,
    /// Buy or sell.
    pub side: Side,
    /// Number of units.
    pub quantity: Decimal,
    /// Price per unit.
    pub price: Decimal,
}

impl Trade {
    /// Create a buy trade.
    #[must_use]
    pub fn buy(
        id: impl Into<TradeId>,
        stock: StockId,
        account: AccountId,
        date: NaiveDate,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            stock,
            account,
            date,
            side: Side::Buy,
            quantity,
            price,
        }
    }

    /// Create a sell trade.
    #[must_use]
    pub fn sell(
        id: impl Into<TradeId>,
        stock: StockId,
        account: AccountId,
        date: NaiveDate,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            side: Side::Sell,
            ..Self::buy(id, stock, account, date, quantity, price)
        }
    }

    /// The (stock, account) scope the trade belongs to.
    #[must_use]
    pub const fn scope(&self) -> ScopeKey {
        ScopeKey::new(self.stock, self.account)
    }

    /// Gross value of the trade (quantity times price).
    #[must_use]
    pub fn value(&self) -> Decimal {
        self.quantity * self.price
    }

    /// Check if this is a buy.
    #[must_use]
    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    /// Check if this is a sell.
    #[must_use]
    pub fn is_sell(&self) -> bool {
        self.side == Side::Sell
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} @ {} ({})",
            self.date,
            self.id,
            self.side,
            self.quantity,
            self.price,
            self.scope()
        )
    }
}
