//! Rows that need a human to look at them.

use lotbook_core::TaxPnlEntry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decide::{MismatchKind, Observation};

/// A reported row no rule could explain.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error(
    "unreconciled {kind} for stock {} account {} ({} -> {}): {message}",
    .entry.stock,
    .entry.account,
    .entry.entry_date,
    .entry.exit_date
)]
pub struct UnreconciledMismatchError {
    /// What kind of difference was seen.
    pub kind: MismatchKind,
    /// The reported row.
    pub entry: TaxPnlEntry,
    /// Human-readable detail.
    pub message: String,
}

/// A reported row held back for review, with what the engine had booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewItem {
    /// The reported row.
    pub entry: TaxPnlEntry,
    /// What kind of difference was seen.
    pub kind: MismatchKind,
    /// The engine's counterpart, if one was found.
    pub engine: Option<Observation>,
    /// Human-readable detail.
    pub message: String,
}

impl ReviewItem {
    /// Build a review item, describing the difference in `message`.
    #[must_use]
    pub fn new(entry: TaxPnlEntry, kind: MismatchKind, engine: Option<Observation>) -> Self {
        let message = match (kind, engine) {
            (MismatchKind::MissingHistory, _) => format!(
                "entry date {} is before the first booked trade",
                entry.entry_date
            ),
            (_, None) => format!(
                "nothing booked for units bought {} and sold {}",
                entry.entry_date, entry.exit_date
            ),
            (_, Some(obs)) => format!(
                "reported {} units costing {}, booked {} units costing {}",
                entry.quantity, entry.buy_value, obs.quantity, obs.buy_value
            ),
        };

        Self {
            entry,
            kind,
            engine,
            message,
        }
    }

    /// The error this item stands for.
    #[must_use]
    pub fn error(&self) -> UnreconciledMismatchError {
        UnreconciledMismatchError {
            kind: self.kind,
            entry: self.entry.clone(),
            message: self.message.clone(),
        }
    }
}
