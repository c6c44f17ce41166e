//! Rebuilding a scope from its ledger.
//!
//! A back-dated trade or a new corporate action changes history, so the
//! scope is rebuilt from scratch on a fresh engine. The caller swaps the
//! result in only if the whole replay succeeds.

use lotbook_core::TermPolicy;
use lotbook_ledger::{LedgerEvent, ScopeLedger};

use crate::engine::{BookingError, FifoEngine};

/// Replay every event of `ledger`, in order, onto a new engine.
pub fn replay(ledger: &ScopeLedger, policy: TermPolicy) -> Result<FifoEngine, BookingError> {
    let mut engine = FifoEngine::new(ledger.scope(), policy);

    for entry in ledger.events() {
        match &entry.event {
            LedgerEvent::Trade(trade) => {
                engine.process_trade(trade)?;
            }
            LedgerEvent::Adjustment(adjustment) => {
                engine.apply_adjustment(adjustment);
            }
        }
    }

    Ok(engine)
}
