//! Owner/goal allocations of a holding.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{AllocationId, GoalId, OwnerId, StockId};

/// Units of an allocation drawn from lots bought on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationTranche {
    /// Buy date of the lots the units came from.
    pub buy_date: NaiveDate,
    /// Units.
    pub quantity: Decimal,
}

/// Units of a stock assigned to an owner and goal at a locked price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Allocation id.
    pub id: AllocationId,
    /// The stock allocated.
    #[serde(rename = "stock_id")]
    pub stock: StockId,
    /// Who the units belong to.
    #[serde(rename = "owner_id")]
    pub owner: OwnerId,
    /// What the units are earmarked for.
    #[serde(rename = "goal_id")]
    pub goal: GoalId,
    /// Units allocated.
    pub quantity: Decimal,
    /// Cost per unit, fixed when the allocation was made.
    pub locked_buy_price: Decimal,
    /// Date the locked price refers to.
    pub buy_date: NaiveDate,
    /// Units by buy date, oldest first, summing to `quantity`. Empty means
    /// every unit is dated at `buy_date`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tranches: Vec<AllocationTranche>,
}

impl Allocation {
    /// Cost of the allocated units at the locked price.
    #[must_use]
    pub fn locked_value(&self) -> Decimal {
        self.quantity * self.locked_buy_price
    }

    /// Check whether this is the synthetic bucket of unclaimed units.
    #[must_use]
    pub fn is_unallocated(&self) -> bool {
        self.id == AllocationId::UNALLOCATED
    }

    fn tranches_mut(&mut self) -> &mut Vec<AllocationTranche> {
        if self.tranches.is_empty() && self.quantity > Decimal::ZERO {
            self.tranches.push(AllocationTranche {
                buy_date: self.buy_date,
                quantity: self.quantity,
            });
        }
        &mut self.tranches
    }

    /// Take `quantity` units off the allocation, oldest tranche first.
    /// The locked price is unchanged.
    pub fn reduce(&mut self, quantity: Decimal) {
        let taken = quantity.min(self.quantity);
        let mut left = taken;

        let tranches = self.tranches_mut();
        for tranche in tranches.iter_mut() {
            if left <= Decimal::ZERO {
                break;
            }
            let take = left.min(tranche.quantity);
            tranche.quantity -= take;
            left -= take;
        }
        tranches.retain(|t| t.quantity > Decimal::ZERO);
        self.quantity -= taken;
        if let Some(first) = self.tranches.first() {
            self.buy_date = first.buy_date;
        }
    }

    /// Multiply the units bought on or before `effective_date` by `ratio`.
    ///
    /// The locked value is preserved, so the locked price becomes the value
    /// spread over the new unit count. Returns whether anything changed.
    pub fn apply_split(&mut self, effective_date: NaiveDate, ratio: Decimal) -> bool {
        if ratio <= Decimal::ZERO || ratio == Decimal::ONE {
            return false;
        }

        let value = self.locked_value();
        let mut touched = false;
        for tranche in self
            .tranches_mut()
            .iter_mut()
            .filter(|t| t.buy_date <= effective_date)
        {
            tranche.quantity *= ratio;
            touched = true;
        }
        if !touched {
            return false;
        }

        self.quantity = self.tranches.iter().map(|t| t.quantity).sum();
        if self.quantity > Decimal::ZERO {
            self.locked_buy_price = value / self.quantity;
        }
        true
    }
}
