//! Property-based tests for the trade ledger.
//!
//! Run with: cargo test -p lotbook-ledger --test `ledger_proptest`

use chrono::NaiveDate;
use lotbook_core::{AccountId, ScopeKey, StockId, Trade, TradeId};
use lotbook_ledger::{LedgerEvent, ScopeLedger, TradeRegistry};
use proptest::prelude::*;
use rust_decimal_macros::dec;

// ============================================================================
// Arbitrary generators
// ============================================================================

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2025i32, 1u32..13u32, 1u32..29u32)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn arb_trades() -> impl Strategy<Value = Vec<Trade>> {
    prop::collection::vec(arb_date(), 1..50).prop_map(|dates| {
        dates
            .into_iter()
            .enumerate()
            .map(|(i, d)| {
                Trade::buy(
                    format!("T{i}"),
                    StockId(1),
                    AccountId(1),
                    d,
                    dec!(1),
                    dec!(10),
                )
            })
            .collect()
    })
}

// ============================================================================
// Ordering Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Trades come back sorted by date, and same-date trades keep the order
    /// they were submitted in
    #[test]
    fn prop_trades_are_stably_date_sorted(trades in arb_trades()) {
        let mut ledger = ScopeLedger::new(ScopeKey::new(StockId(1), AccountId(1)));
        for t in &trades {
            ledger.insert(LedgerEvent::Trade(t.clone()));
        }

        let mut expected = trades.clone();
        expected.sort_by_key(|t| t.date);

        let got: Vec<_> = ledger.trades().cloned().collect();
        prop_assert_eq!(got, expected);
    }

    /// Claiming the same ids twice admits each id exactly once
    #[test]
    fn prop_registry_admits_each_id_once(ids in prop::collection::vec(0u8..20u8, 0..100)) {
        let mut registry = TradeRegistry::new();
        let admitted = ids
            .iter()
            .filter(|i| registry.claim(&TradeId::new(format!("T{i}"))))
            .count();

        let mut distinct = ids.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(admitted, distinct.len());
        prop_assert_eq!(registry.len(), distinct.len());
    }
}
