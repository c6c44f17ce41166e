//! The per-scope FIFO state machine.

use chrono::NaiveDate;
use lotbook_core::{
    CorporateActionAdjustment, CorporateActionKind, Lot, LotQueue, LotSource, RealizedGainEntry,
    ScopeKey, Side, TermPolicy, Trade, TradeId,
};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::summary::{unrealized, PositionSummary, Unrealized};

/// A sell asked for more units than the scope holds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "insufficient lots in {scope} for sell {trade_id} on {date}: requested {requested}, available {available}"
)]
pub struct InsufficientLotError {
    /// The scope sold from.
    pub scope: ScopeKey,
    /// The rejected sell.
    pub trade_id: TradeId,
    /// Date of the sell.
    pub date: NaiveDate,
    /// Units the sell asked for.
    pub requested: Decimal,
    /// Units held at the time.
    pub available: Decimal,
}

/// Errors that can occur while booking a trade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    /// Not enough units to cover a sell.
    #[error(transparent)]
    InsufficientLots(#[from] InsufficientLotError),

    /// The trade belongs to a different scope.
    #[error("trade {trade_id} belongs to {got}, not {expected}")]
    ScopeMismatch {
        /// The engine's scope.
        expected: ScopeKey,
        /// The trade's scope.
        got: ScopeKey,
        /// The trade.
        trade_id: TradeId,
    },
}

/// What an adjustment did to the lots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdjustmentEffect {
    /// Lots rescaled by a split.
    pub lots_rescaled: usize,
    /// Units issued by a bonus.
    pub units_issued: Decimal,
}

/// FIFO lot matching for a single (stock, account) scope.
///
/// Buys open lots; sells consume the oldest open lots first and produce one
/// [`RealizedGainEntry`] per lot touched. A sell that cannot be covered
/// leaves the engine exactly as it was.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use lotbook_booking::FifoEngine;
/// use lotbook_core::{AccountId, ScopeKey, StockId, TermPolicy, Trade};
/// use rust_decimal_macros::dec;
///
/// let scope = ScopeKey::new(StockId(1), AccountId(1));
/// let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let mar = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
///
/// let mut engine = FifoEngine::new(scope, TermPolicy::default());
/// engine.process_trade(&Trade::buy("B1", StockId(1), AccountId(1), jan, dec!(50), dec!(100))).unwrap();
/// let gains = engine
///     .process_trade(&Trade::sell("S1", StockId(1), AccountId(1), mar, dec!(30), dec!(150)))
///     .unwrap();
///
/// assert_eq!(gains[0].profit, dec!(1500));
/// assert_eq!(engine.units(), dec!(20));
/// ```
#[derive(Debug, Clone)]
pub struct FifoEngine {
    scope: ScopeKey,
    policy: TermPolicy,
    lots: LotQueue,
    realized: Vec<RealizedGainEntry>,
    total_bought: Decimal,
    total_sold: Decimal,
}

impl FifoEngine {
    /// Create an engine with no lots.
    #[must_use]
    pub fn new(scope: ScopeKey, policy: TermPolicy) -> Self {
        Self {
            scope,
            policy,
            lots: LotQueue::new(),
            realized: Vec::new(),
            total_bought: Decimal::ZERO,
            total_sold: Decimal::ZERO,
        }
    }

    /// The scope this engine books.
    #[must_use]
    pub const fn scope(&self) -> ScopeKey {
        self.scope
    }

    /// The term policy used to classify gains.
    #[must_use]
    pub const fn policy(&self) -> TermPolicy {
        self.policy
    }

    /// Book a trade. Returns the gains realized by it (empty for buys).
    pub fn process_trade(&mut self, trade: &Trade) -> Result<&[RealizedGainEntry], BookingError> {
        if trade.scope() != self.scope {
            return Err(BookingError::ScopeMismatch {
                expected: self.scope,
                got: trade.scope(),
                trade_id: trade.id.clone(),
            });
        }

        match trade.side {
            Side::Buy => {
                self.process_buy(trade);
                Ok(&[])
            }
            Side::Sell => Ok(self.process_sell(trade)?),
        }
    }

    /// Open a lot for a buy. Returns the lot's sequence number.
    pub fn process_buy(&mut self, trade: &Trade) -> u64 {
        self.total_bought += trade.quantity;
        self.lots.push(
            LotSource::Trade(trade.id.clone()),
            trade.date,
            trade.price,
            trade.quantity,
        )
    }

    /// Match a sell against the oldest open lots.
    ///
    /// Returns the entries realized by this sell.
    pub fn process_sell(
        &mut self,
        trade: &Trade,
    ) -> Result<&[RealizedGainEntry], InsufficientLotError> {
        let taken = self
            .lots
            .consume(trade.quantity)
            .map_err(|e| InsufficientLotError {
                scope: self.scope,
                trade_id: trade.id.clone(),
                date: trade.date,
                requested: e.requested,
                available: e.available,
            })?;

        let first = self.realized.len();
        for slice in &taken {
            self.realized.push(RealizedGainEntry::from_consumption(
                self.scope,
                trade.id.clone(),
                trade.date,
                trade.price,
                slice,
                self.policy,
            ));
        }
        self.total_sold += trade.quantity;

        Ok(&self.realized[first..])
    }

    /// Apply a corporate action to the lots held on its effective date.
    ///
    /// Adjustments for other stocks are ignored.
    pub fn apply_adjustment(&mut self, adjustment: &CorporateActionAdjustment) -> AdjustmentEffect {
        if adjustment.stock != self.scope.stock || adjustment.ratio <= Decimal::ZERO {
            return AdjustmentEffect::default();
        }

        match adjustment.kind {
            CorporateActionKind::Split => AdjustmentEffect {
                lots_rescaled: self
                    .lots
                    .apply_split(adjustment.effective_date, adjustment.ratio),
                units_issued: Decimal::ZERO,
            },
            CorporateActionKind::Bonus => {
                let held: Decimal = self
                    .lots
                    .open_lots()
                    .filter(|l| l.buy_date <= adjustment.effective_date)
                    .map(|l| l.remaining_quantity)
                    .sum();
                let issued = (held * (adjustment.ratio - Decimal::ONE)).floor();
                if issued > Decimal::ZERO {
                    self.lots.push(
                        LotSource::Bonus(adjustment.id),
                        adjustment.effective_date,
                        Decimal::ZERO,
                        issued,
                    );
                }
                AdjustmentEffect {
                    lots_rescaled: 0,
                    units_issued: issued.max(Decimal::ZERO),
                }
            }
            CorporateActionKind::Other => AdjustmentEffect::default(),
        }
    }

    /// The lot queue.
    #[must_use]
    pub const fn lots(&self) -> &LotQueue {
        &self.lots
    }

    /// Lots with units remaining, oldest first.
    pub fn open_lots(&self) -> impl Iterator<Item = &Lot> {
        self.lots.open_lots()
    }

    /// Every lot ever opened, including exhausted ones.
    #[must_use]
    pub fn all_lots(&self) -> &[Lot] {
        self.lots.all_lots()
    }

    /// Every realized entry, in the order the sells were booked.
    #[must_use]
    pub fn realized(&self) -> &[RealizedGainEntry] {
        &self.realized
    }

    /// Units held.
    #[must_use]
    pub fn units(&self) -> Decimal {
        self.lots.units()
    }

    /// Weighted-average cost of the units held.
    #[must_use]
    pub fn average_price(&self) -> Decimal {
        self.lots.average_price()
    }

    /// Cost of the units held.
    #[must_use]
    pub fn book_value(&self) -> Decimal {
        self.lots.book_value()
    }

    /// Position totals for reporting.
    #[must_use]
    pub fn summary(&self) -> PositionSummary {
        PositionSummary {
            total_bought: self.total_bought,
            total_sold: self.total_sold,
            available: self.units(),
            average_price: self.average_price(),
            book_value: self.book_value(),
            open_lots: self.lots.open_count(),
            realized_entries: self.realized.len(),
            realized_profit: self.realized.iter().map(|e| e.profit).sum(),
        }
    }

    /// Paper gain on the units held at `current_price`.
    #[must_use]
    pub fn unrealized(&self, current_price: Decimal) -> Unrealized {
        unrealized(self.open_lots(), current_price)
    }
}
