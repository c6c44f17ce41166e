//! FIFO lot matching for lotbook.
//!
//! This crate provides:
//! - [`FifoEngine`] - Per-scope lot state: buys open lots, sells consume the
//!   oldest lots first and produce realized-gain entries
//! - [`replay`] - Rebuild a scope's engine from its ledger
//! - [`PositionSummary`] and [`Unrealized`] - Reporting views
//!
//! # Atomic sells
//!
//! A sell larger than the units held is rejected with
//! [`InsufficientLotError`] before any lot is touched.
//!
//! ```
//! use chrono::NaiveDate;
//! use lotbook_booking::{BookingError, FifoEngine};
//! use lotbook_core::{AccountId, ScopeKey, StockId, TermPolicy, Trade};
//! use rust_decimal_macros::dec;
//!
//! let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let mut engine = FifoEngine::new(ScopeKey::new(StockId(1), AccountId(1)), TermPolicy::default());
//! engine.process_trade(&Trade::buy("B1", StockId(1), AccountId(1), d, dec!(5), dec!(10))).unwrap();
//!
//! let err = engine
//!     .process_trade(&Trade::sell("S1", StockId(1), AccountId(1), d, dec!(6), dec!(12)))
//!     .unwrap_err();
//! assert!(matches!(err, BookingError::InsufficientLots(_)));
//! assert_eq!(engine.units(), dec!(5));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod replay;
mod summary;

pub use engine::{AdjustmentEffect, BookingError, FifoEngine, InsufficientLotError};
pub use replay::replay;
pub use summary::{unrealized, PositionSummary, Unrealized};
