//! Identifier newtypes.
//!
//! Every entity in lotbook is referenced through a small typed identifier so
//! that a stock id can never be passed where an account id is expected.
//! Numeric ids are stable `u64`s; trade ids are the broker's own strings.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Get the raw numeric value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifies a listed equity.
    StockId
);
numeric_id!(
    /// Identifies a brokerage account.
    AccountId
);
numeric_id!(
    /// Identifies the person a slice of a holding belongs to.
    OwnerId
);
numeric_id!(
    /// Identifies the goal a slice of a holding is earmarked for.
    GoalId
);
numeric_id!(
    /// Identifies an allocation.
    AllocationId
);
numeric_id!(
    /// Identifies a corporate-action adjustment.
    AdjustmentId
);

impl OwnerId {
    /// The owner that holds every unit nobody has claimed yet.
    pub const DEFAULT: Self = Self(0);
}

impl GoalId {
    /// The goal for units not earmarked for anything.
    pub const UNASSIGNED: Self = Self(0);
}

impl AllocationId {
    /// Id reported for the synthetic "unallocated" bucket.
    pub const UNALLOCATED: Self = Self(0);
}

/// The broker-assigned identity of a trade.
///
/// This is the sole source of idempotence: two trades with the same id are
/// the same trade, whatever their other fields say.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(String);

impl TradeId {
    /// Create a trade id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether the id is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for TradeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TradeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A (stock, account) pair: the unit of FIFO matching and of write
/// serialization.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ScopeKey {
    /// The stock held.
    pub stock: StockId,
    /// The account holding it.
    pub account: AccountId,
}

impl ScopeKey {
    /// Create a scope key.
    #[must_use]
    pub const fn new(stock: StockId, account: AccountId) -> Self {
        Self { stock, account }
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stock {} / account {}", self.stock, self.account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_key_orders_by_stock_then_account() {
        let a = ScopeKey::new(StockId(1), AccountId(9));
        let b = ScopeKey::new(StockId(2), AccountId(1));
        let c = ScopeKey::new(StockId(2), AccountId(3));

        let mut keys = vec![c, a, b];
        keys.sort();
        assert_eq!(keys, vec![a, b, c]);
    }

    #[test]
    fn test_trade_id_blank() {
        assert!(TradeId::new("  ").is_blank());
        assert!(!TradeId::new("T001").is_blank());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&StockId(42)).unwrap(), "42");
        assert_eq!(
            serde_json::to_string(&TradeId::new("T001")).unwrap(),
            "\"T001\""
        );
        let id: AccountId = serde_json::from_str("7").unwrap();
        assert_eq!(id, AccountId(7));
    }
}
