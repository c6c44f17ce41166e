//! Open and exhausted lots.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{AdjustmentId, TradeId};

/// Where a lot came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum LotSource {
    /// Opened by a buy trade.
    Trade(TradeId),
    /// Issued by a bonus adjustment.
    Bonus(AdjustmentId),
}

impl fmt::Display for LotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trade(id) => write!(f, "{id}"),
            Self::Bonus(id) => write!(f, "bonus#{id}"),
        }
    }
}

/// A quantity of a stock acquired at one price on one date.
///
/// `remaining_quantity` only goes down as sells consume the lot, except when
/// a split rescales it. Lots that reach zero stay around for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    /// Originating trade or adjustment.
    pub source: LotSource,
    /// Acquisition date.
    pub buy_date: NaiveDate,
    /// Cost per unit.
    pub buy_price: Decimal,
    /// Units at acquisition (after any split rescaling).
    pub original_quantity: Decimal,
    /// Units still held.
    pub remaining_quantity: Decimal,
    /// Ingestion order within the scope; breaks ties on `buy_date`.
    pub seq: u64,
}

impl Lot {
    /// Check whether the lot still holds units.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.remaining_quantity > Decimal::ZERO
    }

    /// Cost of the units still held.
    #[must_use]
    pub fn book_value(&self) -> Decimal {
        self.remaining_quantity * self.buy_price
    }

    /// Units already consumed by sells.
    #[must_use]
    pub fn consumed_quantity(&self) -> Decimal {
        self.original_quantity - self.remaining_quantity
    }

    pub(crate) fn order_key(&self) -> (NaiveDate, u64) {
        (self.buy_date, self.seq)
    }
}

impl fmt::Display for Lot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} @ {} {{{}, {}}}",
            self.remaining_quantity,
            self.original_quantity,
            self.buy_price,
            self.buy_date,
            self.source
        )
    }
}
