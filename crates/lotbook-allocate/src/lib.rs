//! Owner and goal allocations for lotbook.
//!
//! A holding can be split into allocations, each assigning some units of a
//! stock to an owner and a goal at a buy price locked when the allocation is
//! made. Units nobody claimed sit in a default bucket
//! ([`OwnerId::DEFAULT`](lotbook_core::OwnerId::DEFAULT) /
//! [`GoalId::UNASSIGNED`](lotbook_core::GoalId::UNASSIGNED)).
//!
//! The allocated total of a stock never exceeds the units held across all
//! accounts.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod book;
mod price;

pub use book::{
    default_bucket, AllocationBook, AllocationError, AllocationRequest, BucketTotal, SyncResult,
};
pub use price::LockPrice;
