//! Trade registry and per-scope event logs.

use chrono::NaiveDate;
use lotbook_core::{CorporateActionAdjustment, ScopeKey, Trade, TradeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Result of submitting a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportOutcome {
    /// The trade was new and has been booked.
    Imported,
    /// A trade with the same id was already booked; nothing changed.
    DuplicateSkipped,
}

impl fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Imported => write!(f, "imported"),
            Self::DuplicateSkipped => write!(f, "duplicate skipped"),
        }
    }
}

/// Every trade id ever booked, across all scopes.
#[derive(Debug, Clone, Default)]
pub struct TradeRegistry {
    seen: HashSet<TradeId>,
}

impl TradeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `id`. Returns `false` if it was already taken.
    pub fn claim(&mut self, id: &TradeId) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.clone())
    }

    /// Give back a claimed id whose trade was not booked.
    pub fn release(&mut self, id: &TradeId) {
        self.seen.remove(id);
    }

    /// Check whether `id` has been claimed.
    #[must_use]
    pub fn contains(&self, id: &TradeId) -> bool {
        self.seen.contains(id)
    }

    /// Number of claimed ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Check if no ids are claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Something that happened to a scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A buy or sell.
    Trade(Trade),
    /// A corporate action on the scope's stock.
    Adjustment(CorporateActionAdjustment),
}

impl LedgerEvent {
    /// Date the event takes effect.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        match self {
            Self::Trade(t) => t.date,
            Self::Adjustment(a) => a.effective_date,
        }
    }

    /// Trades sort before adjustments on the same date.
    const fn rank(&self) -> u8 {
        match self {
            Self::Trade(_) => 0,
            Self::Adjustment(_) => 1,
        }
    }
}

/// An event with its ingestion sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Ingestion order within the scope.
    pub seq: u64,
    /// The event.
    pub event: LedgerEvent,
}

impl LedgerEntry {
    fn order_key(&self) -> (NaiveDate, u8, u64) {
        (self.event.date(), self.event.rank(), self.seq)
    }
}

/// The ordered event log of one (stock, account) scope.
///
/// Events are kept sorted by date, with trades before adjustments on the
/// same date and ingestion order breaking any remaining tie. Replaying the
/// log in this order reproduces the scope's lot state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeLedger {
    scope: ScopeKey,
    entries: Vec<LedgerEntry>,
    next_seq: u64,
}

impl ScopeLedger {
    /// Create an empty ledger for `scope`.
    #[must_use]
    pub const fn new(scope: ScopeKey) -> Self {
        Self {
            scope,
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    /// The scope this ledger belongs to.
    #[must_use]
    pub const fn scope(&self) -> ScopeKey {
        self.scope
    }

    /// Insert an event in order. Returns its position in the log.
    pub fn insert(&mut self, event: LedgerEvent) -> usize {
        let entry = LedgerEntry {
            seq: self.next_seq,
            event,
        };
        self.next_seq += 1;

        let key = entry.order_key();
        let at = self.entries.partition_point(|e| e.order_key() <= key);
        self.entries.insert(at, entry);
        at
    }

    /// Check whether a trade dated `date` would land at the end of the log,
    /// so it can be booked without replaying anything.
    #[must_use]
    pub fn is_tail(&self, date: NaiveDate) -> bool {
        self.entries.last().map_or(true, |last| {
            let (last_date, rank, _) = last.order_key();
            last_date < date || (last_date == date && rank == 0)
        })
    }

    /// All events in replay order.
    #[must_use]
    pub fn events(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Trades in replay order.
    pub fn trades(&self) -> impl Iterator<Item = &Trade> {
        self.entries.iter().filter_map(|e| match &e.event {
            LedgerEvent::Trade(t) => Some(t),
            LedgerEvent::Adjustment(_) => None,
        })
    }

    /// Adjustments in replay order.
    pub fn adjustments(&self) -> impl Iterator<Item = &CorporateActionAdjustment> {
        self.entries.iter().filter_map(|e| match &e.event {
            LedgerEvent::Adjustment(a) => Some(a),
            LedgerEvent::Trade(_) => None,
        })
    }

    /// Date of the first trade, if any.
    #[must_use]
    pub fn earliest_trade_date(&self) -> Option<NaiveDate> {
        self.trades().map(|t| t.date).next()
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotbook_core::{AccountId, AdjustmentId, CorporateActionKind, StockId};
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn scope() -> ScopeKey {
        ScopeKey::new(StockId(1), AccountId(1))
    }

    fn buy(id: &str, d: NaiveDate) -> LedgerEvent {
        LedgerEvent::Trade(Trade::buy(id, StockId(1), AccountId(1), d, dec!(10), dec!(100)))
    }

    fn split(d: NaiveDate) -> LedgerEvent {
        LedgerEvent::Adjustment(CorporateActionAdjustment {
            id: AdjustmentId(1),
            stock: StockId(1),
            effective_date: d,
            kind: CorporateActionKind::Split,
            ratio: dec!(2),
            applied: true,
            note: None,
        })
    }

    fn ids(ledger: &ScopeLedger) -> Vec<String> {
        ledger.trades().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn test_registry_claim_release() {
        let mut registry = TradeRegistry::new();
        let id = TradeId::new("T1");

        assert!(registry.claim(&id));
        assert!(!registry.claim(&id));
        assert!(registry.contains(&id));

        registry.release(&id);
        assert!(!registry.contains(&id));
        assert!(registry.claim(&id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_insert_keeps_date_order() {
        let mut ledger = ScopeLedger::new(scope());
        ledger.insert(buy("B", date(2024, 2, 1)));
        ledger.insert(buy("C", date(2024, 3, 1)));
        let at = ledger.insert(buy("A", date(2024, 1, 1)));

        assert_eq!(at, 0);
        assert_eq!(ids(&ledger), vec!["A", "B", "C"]);
        assert_eq!(ledger.earliest_trade_date(), Some(date(2024, 1, 1)));
    }

    #[test]
    fn test_same_date_keeps_ingestion_order() {
        let mut ledger = ScopeLedger::new(scope());
        ledger.insert(buy("X", date(2024, 1, 1)));
        ledger.insert(buy("Y", date(2024, 1, 1)));
        assert_eq!(ids(&ledger), vec!["X", "Y"]);
    }

    #[test]
    fn test_trades_sort_before_adjustments_on_same_date() {
        let mut ledger = ScopeLedger::new(scope());
        ledger.insert(buy("A", date(2024, 1, 1)));
        ledger.insert(split(date(2024, 2, 1)));
        ledger.insert(buy("B", date(2024, 2, 1)));

        let kinds: Vec<_> = ledger
            .events()
            .iter()
            .map(|e| matches!(e.event, LedgerEvent::Trade(_)))
            .collect();
        assert_eq!(kinds, vec![true, true, false]);
        assert_eq!(ledger.adjustments().count(), 1);
    }

    #[test]
    fn test_is_tail() {
        let mut ledger = ScopeLedger::new(scope());
        assert!(ledger.is_tail(date(2000, 1, 1)));

        ledger.insert(buy("A", date(2024, 1, 10)));
        assert!(ledger.is_tail(date(2024, 1, 10)));
        assert!(ledger.is_tail(date(2024, 2, 1)));
        assert!(!ledger.is_tail(date(2024, 1, 9)));

        ledger.insert(split(date(2024, 2, 1)));
        assert!(!ledger.is_tail(date(2024, 2, 1)));
        assert!(ledger.is_tail(date(2024, 2, 2)));
    }
}
