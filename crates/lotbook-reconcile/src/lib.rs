//! Corporate-action reconciliation for lotbook.
//!
//! A broker's tax report lists realized gains computed with knowledge of
//! splits and bonus issues that never show up as trades. Comparing each
//! reported row with what the FIFO engine booked reveals those actions:
//!
//! - equal quantity and value (within 1%) is a match
//! - equal value (within 2%) with the quantity scaled by a known split ratio
//!   is a split; by a known bonus multiplier, a bonus
//! - anything else is held for review
//!
//! [`decide`] is the pure rule; [`assess`] finds the booked counterpart of a
//! row first; [`estimate_effective_date`] dates the inferred action.
//!
//! ```
//! use lotbook_reconcile::{decide, Decision, Observation, ReconcileOptions};
//! use rust_decimal_macros::dec;
//!
//! let booked = Observation::new(dec!(10), dec!(2000));
//! let reported = Observation::new(dec!(20), dec!(2000));
//! assert_eq!(
//!     decide(&booked, &reported, &ReconcileOptions::default()),
//!     Decision::Split { ratio: dec!(2) }
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod decide;
mod matching;
mod options;
mod review;

pub use decide::{decide, values_match, Decision, MismatchKind, Observation};
pub use matching::{assess, engine_view, estimate_effective_date, Assessment, ScopeView};
pub use options::ReconcileOptions;
pub use review::{ReviewItem, UnreconciledMismatchError};
