//! FIFO lot queue for a single (stock, account) scope.
//!
//! A [`LotQueue`] keeps every lot of a scope ordered by acquisition date,
//! with ties broken by ingestion order. Sells consume from the front.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::lot::{Lot, LotSource};

/// A slice of a lot taken by a sell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumption {
    /// The lot the units came from.
    pub source: LotSource,
    /// The lot's acquisition date.
    pub buy_date: NaiveDate,
    /// The lot's cost per unit.
    pub buy_price: Decimal,
    /// Units taken.
    pub quantity: Decimal,
}

impl Consumption {
    /// Cost of the units taken.
    #[must_use]
    pub fn buy_value(&self) -> Decimal {
        self.quantity * self.buy_price
    }
}

/// Not enough open units to satisfy a reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("insufficient lots: requested {requested}, available {available}")]
pub struct InsufficientLots {
    /// Units requested.
    pub requested: Decimal,
    /// Units available.
    pub available: Decimal,
}

/// Ordered lots of one scope.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use lotbook_core::{LotQueue, LotSource, TradeId};
/// use rust_decimal_macros::dec;
///
/// let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let feb = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
///
/// let mut queue = LotQueue::new();
/// queue.push(LotSource::Trade(TradeId::new("B2")), feb, dec!(120), dec!(50));
/// queue.push(LotSource::Trade(TradeId::new("B1")), jan, dec!(100), dec!(50));
///
/// let taken = queue.consume(dec!(30)).unwrap();
/// assert_eq!(taken[0].buy_price, dec!(100));
/// assert_eq!(queue.units(), dec!(70));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotQueue {
    lots: Vec<Lot>,
    next_seq: u64,
}

impl LotQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a lot and return its sequence number.
    ///
    /// The lot is placed after every lot with an earlier or equal buy date,
    /// so a back-dated lot lands in date order rather than at the tail.
    pub fn push(
        &mut self,
        source: LotSource,
        buy_date: NaiveDate,
        buy_price: Decimal,
        quantity: Decimal,
    ) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;

        let lot = Lot {
            source,
            buy_date,
            buy_price,
            original_quantity: quantity,
            remaining_quantity: quantity,
            seq,
        };
        let key = lot.order_key();
        let at = self.lots.partition_point(|l| l.order_key() <= key);
        self.lots.insert(at, lot);
        seq
    }

    /// All lots, including exhausted ones, in FIFO order.
    #[must_use]
    pub fn all_lots(&self) -> &[Lot] {
        &self.lots
    }

    /// Lots with units remaining, in FIFO order.
    pub fn open_lots(&self) -> impl Iterator<Item = &Lot> {
        self.lots.iter().filter(|l| l.is_open())
    }

    /// Number of lots with units remaining.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.open_lots().count()
    }

    /// Check if no units are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.open_count() == 0
    }

    /// Total units held.
    #[must_use]
    pub fn units(&self) -> Decimal {
        self.open_lots().map(|l| l.remaining_quantity).sum()
    }

    /// Total cost of the units held.
    #[must_use]
    pub fn book_value(&self) -> Decimal {
        self.open_lots().map(Lot::book_value).sum()
    }

    /// Weighted-average cost per held unit, or zero when nothing is held.
    #[must_use]
    pub fn average_price(&self) -> Decimal {
        let units = self.units();
        if units.is_zero() {
            Decimal::ZERO
        } else {
            self.book_value() / units
        }
    }

    /// Acquisition date of the oldest open lot.
    #[must_use]
    pub fn earliest_open_date(&self) -> Option<NaiveDate> {
        self.open_lots().map(|l| l.buy_date).next()
    }

    /// Take `quantity` units from the oldest open lots.
    ///
    /// Either the whole quantity is taken or nothing is: availability is
    /// checked before any lot is touched.
    pub fn consume(&mut self, quantity: Decimal) -> Result<Vec<Consumption>, InsufficientLots> {
        let available = self.units();
        if quantity > available {
            return Err(InsufficientLots {
                requested: quantity,
                available,
            });
        }

        let mut need = quantity;
        let mut taken = Vec::new();

        for lot in self.lots.iter_mut().filter(|l| l.is_open()) {
            if need.is_zero() {
                break;
            }

            let take = need.min(lot.remaining_quantity);
            taken.push(Consumption {
                source: lot.source.clone(),
                buy_date: lot.buy_date,
                buy_price: lot.buy_price,
                quantity: take,
            });
            lot.remaining_quantity -= take;
            need -= take;
        }

        Ok(taken)
    }

    /// Rescale every lot bought on or before `effective_date` by a split
    /// ratio. Returns the number of lots touched.
    ///
    /// Quantities are multiplied and prices divided by `ratio`, so each
    /// lot's cost is unchanged. Non-positive ratios leave the queue as is.
    pub fn apply_split(&mut self, effective_date: NaiveDate, ratio: Decimal) -> usize {
        if ratio <= Decimal::ZERO {
            return 0;
        }

        let mut touched = 0;
        for lot in self.lots.iter_mut().filter(|l| l.buy_date <= effective_date) {
            lot.original_quantity *= ratio;
            lot.remaining_quantity *= ratio;
            lot.buy_price /= ratio;
            touched += 1;
        }
        touched
    }
}

impl fmt::Display for LotQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(empty)");
        }

        for (i, lot) in self.open_lots().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{lot}")?;
        }
        Ok(())
    }
}
