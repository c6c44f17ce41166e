//! The allocation book.

use chrono::NaiveDate;
use lotbook_core::{Allocation, AllocationId, AllocationTranche, GoalId, Lot, OwnerId, StockId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::price::{average_price, fifo_price, LockPrice};

/// Errors from allocation operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// The request would allocate more units than are held.
    #[error("allocation overflow for stock {stock}: requested {requested}, unallocated {available}")]
    Overflow {
        /// The stock.
        stock: StockId,
        /// Units requested.
        requested: Decimal,
        /// Units held but not yet allocated.
        available: Decimal,
    },

    /// No allocation has this id.
    #[error("allocation {0} not found")]
    NotFound(AllocationId),

    /// Quantities must be positive.
    #[error("invalid allocation quantity {0}")]
    InvalidQuantity(Decimal),

    /// No held lots to derive a locked price from.
    #[error("no held units of stock {0} to price the allocation")]
    NothingToPrice(StockId),
}

/// A request to assign units to an owner and goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// The stock.
    #[serde(rename = "stock_id")]
    pub stock: StockId,
    /// Who receives the units.
    #[serde(rename = "owner_id")]
    pub owner: OwnerId,
    /// What the units are for.
    #[serde(rename = "goal_id")]
    pub goal: GoalId,
    /// Units to allocate.
    pub quantity: Decimal,
    /// How to fix the buy price.
    pub lock: LockPrice,
}

/// What a holdings sync changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncResult {
    /// Allocations reduced.
    pub adjusted: usize,
    /// Allocations removed.
    pub deleted: usize,
}

/// Quantity and locked cost of a group of allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BucketTotal {
    /// Units.
    pub quantity: Decimal,
    /// Units times locked price, summed.
    pub locked_value: Decimal,
}

impl BucketTotal {
    fn add(&mut self, allocation: &Allocation) {
        self.quantity += allocation.quantity;
        self.locked_value += allocation.locked_value();
    }
}

/// Every allocation, across all stocks.
///
/// The book never holds more units of a stock than the caller says are
/// held: [`allocate`](Self::allocate) rejects overflow and
/// [`sync_with_holdings`](Self::sync_with_holdings) trims after sells.
#[derive(Debug, Clone)]
pub struct AllocationBook {
    allocations: BTreeMap<AllocationId, Allocation>,
    next_id: u64,
}

impl Default for AllocationBook {
    fn default() -> Self {
        Self {
            allocations: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl AllocationBook {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate units of a stock.
    ///
    /// `held` are the open lots of the stock across all accounts, oldest
    /// first. The locked price is computed once here and never revisited.
    pub fn allocate(
        &mut self,
        request: AllocationRequest,
        held: &[Lot],
    ) -> Result<Allocation, AllocationError> {
        if request.quantity <= Decimal::ZERO {
            return Err(AllocationError::InvalidQuantity(request.quantity));
        }

        let total: Decimal = held.iter().map(|l| l.remaining_quantity).sum();
        let allocated = self.allocated(request.stock);
        let available = (total - allocated).max(Decimal::ZERO);
        if request.quantity > available {
            return Err(AllocationError::Overflow {
                stock: request.stock,
                requested: request.quantity,
                available,
            });
        }

        let whole = |date| {
            vec![AllocationTranche {
                buy_date: date,
                quantity: request.quantity,
            }]
        };
        let (locked_buy_price, tranches) = match request.lock {
            LockPrice::Fixed { price, date } => (price, whole(date)),
            LockPrice::FifoLots => fifo_price(held, allocated, request.quantity)
                .ok_or(AllocationError::NothingToPrice(request.stock))?,
            LockPrice::AverageCost => {
                let (price, date) =
                    average_price(held).ok_or(AllocationError::NothingToPrice(request.stock))?;
                (price, whole(date))
            }
        };
        let buy_date = tranches
            .first()
            .map(|t| t.buy_date)
            .ok_or(AllocationError::NothingToPrice(request.stock))?;

        let id = AllocationId(self.next_id);
        self.next_id += 1;

        let allocation = Allocation {
            id,
            stock: request.stock,
            owner: request.owner,
            goal: request.goal,
            quantity: request.quantity,
            locked_buy_price,
            buy_date,
            tranches,
        };
        self.allocations.insert(id, allocation.clone());
        Ok(allocation)
    }

    /// Release units of an allocation back to the default bucket.
    ///
    /// Returns the reduced allocation, or `None` if it was removed. Asking
    /// for more than the allocation holds removes it.
    pub fn deallocate(
        &mut self,
        id: AllocationId,
        quantity: Decimal,
    ) -> Result<Option<Allocation>, AllocationError> {
        if quantity <= Decimal::ZERO {
            return Err(AllocationError::InvalidQuantity(quantity));
        }
        let allocation = self
            .allocations
            .get_mut(&id)
            .ok_or(AllocationError::NotFound(id))?;

        if quantity >= allocation.quantity {
            self.allocations.remove(&id);
            return Ok(None);
        }
        allocation.reduce(quantity);
        Ok(Some(allocation.clone()))
    }

    /// Move an allocation to another owner and/or goal.
    ///
    /// Quantity and locked price are unchanged.
    pub fn reassign(
        &mut self,
        id: AllocationId,
        owner: Option<OwnerId>,
        goal: Option<GoalId>,
    ) -> Result<Allocation, AllocationError> {
        let allocation = self
            .allocations
            .get_mut(&id)
            .ok_or(AllocationError::NotFound(id))?;

        if let Some(owner) = owner {
            allocation.owner = owner;
        }
        if let Some(goal) = goal {
            allocation.goal = goal;
        }
        Ok(allocation.clone())
    }

    /// Look up an allocation.
    #[must_use]
    pub fn get(&self, id: AllocationId) -> Option<&Allocation> {
        self.allocations.get(&id)
    }

    /// Units of `stock` allocated.
    #[must_use]
    pub fn allocated(&self, stock: StockId) -> Decimal {
        self.allocations
            .values()
            .filter(|a| a.stock == stock)
            .map(|a| a.quantity)
            .sum()
    }

    /// Units of `stock` held but not allocated.
    #[must_use]
    pub fn unallocated(&self, stock: StockId, held: Decimal) -> Decimal {
        (held - self.allocated(stock)).max(Decimal::ZERO)
    }

    /// Allocations of `stock`, oldest locked date first.
    #[must_use]
    pub fn for_stock(&self, stock: StockId) -> Vec<&Allocation> {
        let mut out: Vec<&Allocation> = self
            .allocations
            .values()
            .filter(|a| a.stock == stock)
            .collect();
        out.sort_by_key(|a| (a.buy_date, a.id));
        out
    }

    /// Every allocation, by id.
    pub fn iter(&self) -> impl Iterator<Item = &Allocation> {
        self.allocations.values()
    }

    /// Stocks with at least one allocation.
    #[must_use]
    pub fn stocks(&self) -> Vec<StockId> {
        let mut stocks: Vec<StockId> = self.allocations.values().map(|a| a.stock).collect();
        stocks.sort_unstable();
        stocks.dedup();
        stocks
    }

    /// Trim allocations of `stock` so they fit within `held`, oldest first.
    ///
    /// Growing holdings leave allocations alone; new units stay
    /// unallocated until someone claims them.
    pub fn sync_with_holdings(&mut self, stock: StockId, held: Decimal) -> SyncResult {
        let mut excess = self.allocated(stock) - held.max(Decimal::ZERO);
        let mut result = SyncResult::default();
        if excess <= Decimal::ZERO {
            return result;
        }

        let order: Vec<AllocationId> = self.for_stock(stock).iter().map(|a| a.id).collect();
        for id in order {
            if excess <= Decimal::ZERO {
                break;
            }
            let Some(allocation) = self.allocations.get_mut(&id) else {
                continue;
            };

            if allocation.quantity <= excess {
                excess -= allocation.quantity;
                self.allocations.remove(&id);
                result.deleted += 1;
            } else {
                allocation.reduce(excess);
                excess = Decimal::ZERO;
                result.adjusted += 1;
            }
        }
        result
    }

    /// Apply a split to the units of `stock` allocations bought on or
    /// before `effective_date`. Returns the number of allocations rescaled.
    pub fn rescale(&mut self, stock: StockId, effective_date: NaiveDate, ratio: Decimal) -> usize {
        self.allocations
            .values_mut()
            .filter(|a| a.stock == stock)
            .map(|a| a.apply_split(effective_date, ratio))
            .filter(|&touched| touched)
            .count()
    }

    /// Totals per owner, optionally for one stock.
    #[must_use]
    pub fn by_owner(&self, stock: Option<StockId>) -> BTreeMap<OwnerId, BucketTotal> {
        let mut totals: BTreeMap<OwnerId, BucketTotal> = BTreeMap::new();
        for a in self.iter().filter(|a| stock.map_or(true, |s| a.stock == s)) {
            totals.entry(a.owner).or_default().add(a);
        }
        totals
    }

    /// Totals per goal, optionally for one stock.
    #[must_use]
    pub fn by_goal(&self, stock: Option<StockId>) -> BTreeMap<GoalId, BucketTotal> {
        let mut totals: BTreeMap<GoalId, BucketTotal> = BTreeMap::new();
        for a in self.iter().filter(|a| stock.map_or(true, |s| a.stock == s)) {
            totals.entry(a.goal).or_default().add(a);
        }
        totals
    }

    /// Number of allocations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    /// Check if there are no allocations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }
}

/// The synthetic allocation holding every unit of `stock` nobody claimed.
///
/// Priced at the weighted-average cost of `held` and dated at its oldest
/// lot. Returns `None` when nothing is left unallocated.
#[must_use]
pub fn default_bucket(book: &AllocationBook, stock: StockId, held: &[Lot]) -> Option<Allocation> {
    let total: Decimal = held.iter().map(|l| l.remaining_quantity).sum();
    let quantity = book.unallocated(stock, total);
    if quantity.is_zero() {
        return None;
    }

    let (locked_buy_price, buy_date) = average_price(held)?;
    Some(Allocation {
        id: AllocationId::UNALLOCATED,
        stock,
        owner: OwnerId::DEFAULT,
        goal: GoalId::UNASSIGNED,
        quantity,
        locked_buy_price,
        buy_date,
        tranches: Vec::new(),
    })
}
