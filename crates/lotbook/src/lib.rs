//! Equity trade-lot accounting.
//!
//! This crate ties the lotbook components together behind one service
//! object, [`Portfolio`]:
//!
//! - trades are validated, deduplicated by trade id and booked per (stock,
//!   account) under strict FIFO
//! - realized gains are tagged short- or long-term and by financial year
//! - rows of a broker's tax report are reconciled against the booked lots;
//!   quantity differences explained by a split or bonus are applied as
//!   corporate actions, anything else is set aside for review
//! - held units can be allocated to owners and goals, never beyond what is
//!   held
//!
//! It also provides the `lotbook` command-line tool.
//!
//! # Example
//!
//! ```
//! use lotbook::{Portfolio, ReconcileOutcome};
//! use lotbook_core::{AccountId, NaiveDate, StockId, TaxPnlEntry, Trade};
//! use rust_decimal_macros::dec;
//!
//! let day = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
//! let portfolio = Portfolio::default();
//!
//! portfolio.submit_trade(Trade::buy("B1", StockId(1), AccountId(1), day(1, 1), dec!(10), dec!(200))).unwrap();
//!
//! // The broker saw twice as many units at half the price: a 2:1 split.
//! let outcome = portfolio
//!     .submit_tax_pnl_entry(TaxPnlEntry {
//!         stock: StockId(1),
//!         account: AccountId(1),
//!         entry_date: day(1, 1),
//!         exit_date: day(7, 1),
//!         quantity: dec!(20),
//!         buy_value: dec!(2000),
//!         sell_value: dec!(2400),
//!     })
//!     .unwrap();
//! assert!(matches!(outcome, ReconcileOutcome::AdjustmentApplied { .. }));
//!
//! portfolio.submit_trade(Trade::sell("S1", StockId(1), AccountId(1), day(7, 1), dec!(20), dec!(120))).unwrap();
//! assert_eq!(portfolio.get_realized_gains(None, None)[0].profit, dec!(400));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
mod error;
mod holding;
mod import;
mod options;
mod portfolio;

pub use error::Error;
pub use holding::Holding;
pub use import::{FailureKind, ImportFailure, ImportReport};
pub use options::{Options, OPTIONS_FILE};
pub use portfolio::{Portfolio, ReconcileOutcome};

pub use lotbook_allocate::{AllocationRequest, BucketTotal, LockPrice};
pub use lotbook_ledger::ImportOutcome;
