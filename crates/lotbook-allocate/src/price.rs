//! Choosing the price an allocation is locked at.

use chrono::NaiveDate;
use lotbook_core::{AllocationTranche, Lot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where an allocation's locked buy price comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum LockPrice {
    /// A caller-supplied price and date.
    Fixed {
        /// Cost per unit.
        price: Decimal,
        /// Date the price refers to.
        date: NaiveDate,
    },
    /// The weighted price of the oldest held units not yet covered by
    /// earlier allocations, dated at the first lot used.
    FifoLots,
    /// The weighted-average cost of all held units, dated at the oldest lot.
    AverageCost,
}

/// Weighted price of `quantity` units taken from the oldest lots after
/// skipping the first `skip` units, with the units taken per buy date.
/// Returns `None` if no units are left.
pub(crate) fn fifo_price(
    lots: &[Lot],
    skip: Decimal,
    quantity: Decimal,
) -> Option<(Decimal, Vec<AllocationTranche>)> {
    let mut to_skip = skip;
    let mut need = quantity;
    let mut value = Decimal::ZERO;
    let mut taken = Decimal::ZERO;
    let mut tranches: Vec<AllocationTranche> = Vec::new();

    for lot in lots.iter().filter(|l| l.is_open()) {
        if need <= Decimal::ZERO {
            break;
        }

        let mut available = lot.remaining_quantity;
        if to_skip > Decimal::ZERO {
            let skipped = to_skip.min(available);
            available -= skipped;
            to_skip -= skipped;
        }
        if available <= Decimal::ZERO {
            continue;
        }

        let take = need.min(available);
        value += take * lot.buy_price;
        taken += take;
        need -= take;
        match tranches.last_mut() {
            Some(last) if last.buy_date == lot.buy_date => last.quantity += take,
            _ => tranches.push(AllocationTranche {
                buy_date: lot.buy_date,
                quantity: take,
            }),
        }
    }

    if taken.is_zero() {
        return None;
    }
    Some((value / taken, tranches))
}

/// Weighted-average cost of the open lots, dated at the oldest one.
pub(crate) fn average_price(lots: &[Lot]) -> Option<(Decimal, NaiveDate)> {
    let (units, value, first) = lots.iter().filter(|l| l.is_open()).fold(
        (Decimal::ZERO, Decimal::ZERO, None::<NaiveDate>),
        |(u, v, d), lot| {
            (
                u + lot.remaining_quantity,
                v + lot.book_value(),
                Some(d.map_or(lot.buy_date, |d| d.min(lot.buy_date))),
            )
        },
    );

    if units.is_zero() {
        return None;
    }
    first.map(|d| (value / units, d))
}
