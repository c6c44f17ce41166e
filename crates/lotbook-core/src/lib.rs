//! Core types for lotbook
//!
//! This crate provides the fundamental types used throughout the lotbook project:
//!
//! - [`Trade`] - A broker-reported buy or sell
//! - [`Lot`] - Units acquired at one price on one date
//! - [`LotQueue`] - The FIFO-ordered lots of one (stock, account) scope
//! - [`RealizedGainEntry`] - Profit realized by a sell out of one lot
//! - [`TaxPnlEntry`] - A row of an external tax report
//! - [`CorporateActionAdjustment`] - A split or bonus applied to a stock
//! - [`Allocation`] - Units assigned to an owner and goal
//! - [`classify`] / [`financial_year`] - Tax-term and financial-year tagging
//!
//! # Example
//!
//! ```
//! use lotbook_core::{classify, LotQueue, LotSource, TaxTerm, TradeId};
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! let bought = NaiveDate::from_ymd_opt(2023, 1, 10).unwrap();
//! let sold = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
//!
//! let mut queue = LotQueue::new();
//! queue.push(LotSource::Trade(TradeId::new("B1")), bought, dec!(150), dec!(10));
//!
//! // Sell some shares, oldest lot first
//! let taken = queue.consume(dec!(5)).unwrap();
//! assert_eq!(taken[0].buy_value(), dec!(750)); // 5 * 150
//! assert_eq!(queue.units(), dec!(5));
//!
//! assert_eq!(classify(bought, sold).term, TaxTerm::LongTerm);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod allocation;
pub mod classify;
pub mod gain;
pub mod ids;
pub mod lot;
pub mod queue;
pub mod tax;
pub mod trade;

pub use action::{CorporateActionAdjustment, CorporateActionKind};
pub use allocation::{Allocation, AllocationTranche};
pub use classify::{
    classify, financial_year, Classification, FinancialYear, ParseFinancialYearError, TaxTerm,
    TermPolicy,
};
pub use gain::{summarize, GainSummary, RealizedGainEntry};
pub use ids::{AccountId, AdjustmentId, AllocationId, GoalId, OwnerId, ScopeKey, StockId, TradeId};
pub use lot::{Lot, LotSource};
pub use queue::{Consumption, InsufficientLots, LotQueue};
pub use tax::TaxPnlEntry;
pub use trade::{ParseSideError, Side, Trade};

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
