//! Trade ledger for lotbook.
//!
//! This crate keeps the append-only record of what happened to each
//! (stock, account) scope:
//!
//! - [`TradeRegistry`] - Global set of booked trade ids (exact duplicate detection)
//! - [`ScopeLedger`] - Per-scope event log in replay order
//! - [`validate_trade`] - Checks applied before a trade is accepted
//!
//! # Error Codes
//!
//! | Code | Description |
//! |------|-------------|
//! | V1001 | Trade id is empty |
//! | V1002 | Quantity is not positive |
//! | V1003 | Price is not positive |
//! | V1004 | Quantity above the configured maximum |
//! | V1005 | Price above the configured maximum |
//! | V1006 | Fractional quantity where whole units are required |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ledger;
pub mod validate;

pub use ledger::{ImportOutcome, LedgerEntry, LedgerEvent, ScopeLedger, TradeRegistry};
pub use validate::{validate_trade, ErrorCode, InvalidTradeError, Limits};
