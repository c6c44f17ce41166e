//! Batch import results.

use std::fmt;

use lotbook_core::{ScopeKey, TradeId};
use serde::{Deserialize, Serialize};

/// Why a trade in a batch was not imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The trade failed validation.
    Invalid,
    /// The sell exceeded the units held.
    InsufficientLots,
    /// An earlier sell of the same scope in the batch was rejected.
    Blocked,
}

impl FailureKind {
    /// Check whether the trade may go through once the held units change.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::InsufficientLots | Self::Blocked)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "invalid"),
            Self::InsufficientLots => write!(f, "insufficient lots"),
            Self::Blocked => write!(f, "blocked"),
        }
    }
}

/// A trade that was not imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFailure {
    /// The trade.
    pub trade_id: TradeId,
    /// Its scope.
    pub scope: ScopeKey,
    /// Why it failed.
    pub kind: FailureKind,
    /// Error text.
    pub message: String,
}

/// Counts and failures of a batch import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Trades booked.
    pub imported: usize,
    /// Trades already seen.
    pub duplicates: usize,
    /// Trades that failed validation.
    pub invalid: usize,
    /// Sells rejected for lack of units.
    pub insufficient: usize,
    /// Trades skipped behind a rejected sell.
    pub blocked: usize,
    /// Every trade that was not imported, in submission order.
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    pub(crate) fn push_failure(
        &mut self,
        trade_id: TradeId,
        scope: ScopeKey,
        kind: FailureKind,
        message: String,
    ) {
        match kind {
            FailureKind::Invalid => self.invalid += 1,
            FailureKind::InsufficientLots => self.insufficient += 1,
            FailureKind::Blocked => self.blocked += 1,
        }
        self.failures.push(ImportFailure {
            trade_id,
            scope,
            kind,
            message,
        });
    }

    /// Ids of the trades that failed for lack of units, directly or behind
    /// a rejected sell.
    pub fn retryable(&self) -> impl Iterator<Item = &TradeId> {
        self.failures
            .iter()
            .filter(|f| f.kind.is_retryable())
            .map(|f| &f.trade_id)
    }

    /// Replace the retryable failures with the outcome of resubmitting
    /// those trades.
    pub fn merge_retry(&mut self, retry: Self) {
        self.failures.retain(|f| !f.kind.is_retryable());
        self.insufficient = 0;
        self.blocked = 0;
        self.imported += retry.imported;
        self.duplicates += retry.duplicates;
        for f in retry.failures {
            self.push_failure(f.trade_id, f.scope, f.kind, f.message);
        }
    }

    /// Total trades seen in the batch.
    #[must_use]
    pub fn total(&self) -> usize {
        self.imported + self.duplicates + self.failures.len()
    }

    /// Check whether every trade was imported or skipped as a duplicate.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} imported, {} duplicate, {} invalid, {} insufficient, {} blocked",
            self.imported, self.duplicates, self.invalid, self.insufficient, self.blocked
        )
    }
}
