//! The portfolio service.
//!
//! Locks are always taken in this order: allocations, corporate-action log,
//! then scopes in [`ScopeKey`] order. The trade registry, the review list
//! and the set of seen report rows are leaf locks held only briefly. Sells,
//! adjustments and allocation changes take the allocation lock first, so
//! the allocated total of a stock never exceeds its held units at any point
//! another thread can observe. Buys lock only their own scope.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use lotbook_allocate::{default_bucket, AllocationBook, AllocationRequest, BucketTotal, SyncResult};
use lotbook_booking::{replay, BookingError, FifoEngine, PositionSummary};
use lotbook_core::{
    summarize, AccountId, AdjustmentId, Allocation, AllocationId, CorporateActionAdjustment,
    CorporateActionKind, FinancialYear, GainSummary, GoalId, Lot, OwnerId, RealizedGainEntry,
    ScopeKey, StockId, TaxPnlEntry, Trade,
};
use lotbook_ledger::{validate_trade, ImportOutcome, LedgerEvent, ScopeLedger, TradeRegistry};
use lotbook_reconcile::{
    assess, estimate_effective_date, Assessment, Decision, MismatchKind, Observation, ReviewItem,
    ScopeView,
};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::holding::Holding;
use crate::import::{FailureKind, ImportReport};
use crate::options::Options;

/// What happened to a submitted tax-report row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// The booked lots agree with the row.
    Matched,
    /// A corporate action explained the row and has been applied.
    AdjustmentApplied {
        /// Split or bonus.
        kind: CorporateActionKind,
        /// Quantity multiplier.
        ratio: Decimal,
        /// Date the action was taken to be effective.
        effective_date: NaiveDate,
    },
    /// Nothing explained the row; it has been set aside for review.
    FlaggedForReview(ReviewItem),
    /// The same row was submitted before.
    DuplicateSkipped,
}

/// Event log and lot state of one (stock, account) scope.
#[derive(Debug)]
struct ScopeBook {
    ledger: ScopeLedger,
    engine: FifoEngine,
}

impl ScopeBook {
    fn new(scope: ScopeKey, options: &Options) -> Self {
        Self {
            ledger: ScopeLedger::new(scope),
            engine: FifoEngine::new(scope, options.term_policy),
        }
    }
}

type SharedScope = Arc<Mutex<ScopeBook>>;

/// Holdings, gains and allocations of every account.
///
/// A `Portfolio` is `Send + Sync`; share it by reference or in an [`Arc`].
///
/// ```
/// use lotbook::{Options, Portfolio};
/// use lotbook_core::{AccountId, NaiveDate, StockId, Trade};
/// use rust_decimal::Decimal;
///
/// let portfolio = Portfolio::new(Options::default());
/// let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// portfolio
///     .submit_trade(Trade::buy("B1", StockId(1), AccountId(1), day, Decimal::TEN, Decimal::ONE_HUNDRED))
///     .unwrap();
///
/// let holdings = portfolio.get_holdings(None);
/// assert_eq!(holdings[0].quantity, Decimal::TEN);
/// ```
#[derive(Debug)]
pub struct Portfolio {
    options: Options,
    scopes: RwLock<BTreeMap<ScopeKey, SharedScope>>,
    registry: Mutex<TradeRegistry>,
    allocations: Mutex<AllocationBook>,
    actions: Mutex<Vec<CorporateActionAdjustment>>,
    reviews: Mutex<Vec<ReviewItem>>,
    seen_reports: Mutex<HashSet<TaxPnlEntry>>,
}

impl Default for Portfolio {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Portfolio {
    /// Create an empty portfolio.
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            options,
            scopes: RwLock::new(BTreeMap::new()),
            registry: Mutex::new(TradeRegistry::new()),
            allocations: Mutex::new(AllocationBook::new()),
            actions: Mutex::new(Vec::new()),
            reviews: Mutex::new(Vec::new()),
            seen_reports: Mutex::new(HashSet::new()),
        }
    }

    /// The options in effect.
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    // ------------------------------------------------------------------
    // Trades
    // ------------------------------------------------------------------

    /// Validate and book a trade.
    ///
    /// A trade id seen before is skipped without touching any state. A sell
    /// that exceeds the units held is rejected, leaves the scope as it was
    /// and does not count as seen, so it can be resubmitted once a
    /// corporate action has been applied.
    pub fn submit_trade(&self, trade: Trade) -> Result<ImportOutcome, Error> {
        validate_trade(&trade, &self.options.limits)?;

        if !self.registry.lock().claim(&trade.id) {
            debug!(trade_id = %trade.id, "duplicate trade skipped");
            return Ok(ImportOutcome::DuplicateSkipped);
        }

        let booked = if trade.is_sell() {
            let mut allocations = self.allocations.lock();
            self.book_trade(&trade).map(|()| {
                self.sync_allocations(&mut allocations, trade.stock);
            })
        } else {
            self.book_trade(&trade)
        };

        match booked {
            Ok(()) => {
                debug!(
                    trade_id = %trade.id,
                    scope = %trade.scope(),
                    side = %trade.side,
                    "trade imported"
                );
                Ok(ImportOutcome::Imported)
            }
            Err(err) => {
                self.registry.lock().release(&trade.id);
                if let Some(e) = err.as_insufficient_lots() {
                    warn!(error = %e, "sell rejected");
                }
                Err(err)
            }
        }
    }

    /// Submit a batch of trades in order.
    ///
    /// Each trade stands on its own, except that once a sell of a scope is
    /// rejected for lack of units the rest of that scope's trades in the
    /// batch are reported as blocked. Other scopes carry on.
    pub fn submit_trades<I>(&self, trades: I) -> ImportReport
    where
        I: IntoIterator<Item = Trade>,
    {
        let mut report = ImportReport::default();
        let mut blocked = BTreeSet::new();

        for trade in trades {
            let id = trade.id.clone();
            let scope = trade.scope();

            if blocked.contains(&scope) {
                report.push_failure(
                    id,
                    scope,
                    FailureKind::Blocked,
                    format!("an earlier sell in {scope} was rejected"),
                );
                continue;
            }

            match self.submit_trade(trade) {
                Ok(ImportOutcome::Imported) => report.imported += 1,
                Ok(ImportOutcome::DuplicateSkipped) => report.duplicates += 1,
                Err(err) => {
                    let kind = match err {
                        Error::InsufficientLots(_) => {
                            blocked.insert(scope);
                            FailureKind::InsufficientLots
                        }
                        _ => FailureKind::Invalid,
                    };
                    report.push_failure(id, scope, kind, err.to_string());
                }
            }
        }

        info!(
            imported = report.imported,
            duplicates = report.duplicates,
            failed = report.failures.len(),
            "trade batch processed"
        );
        report
    }

    /// Append a trade to its scope and book it, replaying the scope when
    /// the trade is back-dated. Nothing changes on error.
    fn book_trade(&self, trade: &Trade) -> Result<(), Error> {
        let scope = self.scope_or_insert(trade.scope());
        let mut guard = scope.lock();
        let book = &mut *guard;

        if book.ledger.is_tail(trade.date) {
            book.engine.process_trade(trade)?;
            book.ledger.insert(LedgerEvent::Trade(trade.clone()));
        } else {
            let mut ledger = book.ledger.clone();
            ledger.insert(LedgerEvent::Trade(trade.clone()));
            let engine = replay(&ledger, self.options.term_policy)?;
            debug!(
                scope = %ledger.scope(),
                events = ledger.len(),
                "scope replayed for back-dated trade"
            );
            book.ledger = ledger;
            book.engine = engine;
        }
        Ok(())
    }

    /// Trades of one scope in booking order.
    pub fn list_trades(&self, stock: StockId, account: AccountId) -> Vec<Trade> {
        self.scope(ScopeKey::new(stock, account))
            .map(|scope| scope.lock().ledger.trades().cloned().collect())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Tax reports
    // ------------------------------------------------------------------

    /// Reconcile one row of a broker's tax report against the booked lots.
    ///
    /// A row explained by a split or bonus applies that corporate action to
    /// every account holding the stock. A row nothing explains is recorded
    /// as a [`ReviewItem`] and leaves the books untouched.
    pub fn submit_tax_pnl_entry(&self, entry: TaxPnlEntry) -> Result<ReconcileOutcome, Error> {
        if !self.seen_reports.lock().insert(entry.clone()) {
            debug!(scope = %entry.scope(), "duplicate tax report entry skipped");
            return Ok(ReconcileOutcome::DuplicateSkipped);
        }

        let outcome = self.reconcile(&entry);
        if outcome.is_err() {
            self.seen_reports.lock().remove(&entry);
        }
        outcome
    }

    fn reconcile(&self, entry: &TaxPnlEntry) -> Result<ReconcileOutcome, Error> {
        let mut allocations = self.allocations.lock();
        let assessment = self.assess_entry(entry);

        match assessment.decision {
            Decision::Matched => {
                debug!(
                    scope = %entry.scope(),
                    exit_date = %entry.exit_date,
                    "tax report entry matched"
                );
                Ok(ReconcileOutcome::Matched)
            }
            Decision::Split { ratio } => self.apply_action(
                &mut allocations,
                entry,
                CorporateActionKind::Split,
                ratio,
                assessment.engine,
            ),
            Decision::Bonus { ratio } => self.apply_action(
                &mut allocations,
                entry,
                CorporateActionKind::Bonus,
                ratio,
                assessment.engine,
            ),
            Decision::Unexplained { kind } => Ok(self.flag(entry, kind, assessment.engine)),
        }
    }

    fn assess_entry(&self, entry: &TaxPnlEntry) -> Assessment {
        let Some(scope) = self.scope(entry.scope()) else {
            return Assessment {
                decision: Decision::Unexplained {
                    kind: MismatchKind::NoCounterpart,
                },
                engine: None,
            };
        };

        let book = scope.lock();
        let view = ScopeView {
            earliest_trade_date: book.ledger.earliest_trade_date(),
            realized: book.engine.realized(),
            lots: book.engine.all_lots(),
        };
        assess(entry, &view, &self.options.reconcile)
    }

    /// Record a corporate action against every scope of the row's stock and
    /// replay them. Either all scopes take the action or none does.
    fn apply_action(
        &self,
        allocations: &mut AllocationBook,
        entry: &TaxPnlEntry,
        kind: CorporateActionKind,
        ratio: Decimal,
        engine: Option<Observation>,
    ) -> Result<ReconcileOutcome, Error> {
        let pre_price = engine.map_or(Decimal::ZERO, |o| o.buy_price());
        let effective_date = estimate_effective_date(
            entry.entry_date,
            entry.exit_date,
            pre_price,
            ratio,
            self.trade_prices(entry.stock),
        );

        let mut actions = self.actions.lock();
        let adjustment = CorporateActionAdjustment {
            id: AdjustmentId(actions.len() as u64 + 1),
            stock: entry.stock,
            effective_date,
            kind,
            ratio,
            applied: true,
            note: Some(format!(
                "inferred from tax report of account {} ({} -> {})",
                entry.account, entry.entry_date, entry.exit_date
            )),
        };

        // Already applied and still off: a person has to look at it.
        if actions.iter().any(|a| a.same_action(&adjustment)) {
            return Ok(self.flag(entry, MismatchKind::QuantityMismatch, engine));
        }

        let scopes = self.stock_scopes(entry.stock);
        let mut guards: Vec<_> = scopes.iter().map(|s| s.lock()).collect();
        let rebuilt = guards
            .iter()
            .map(|book| {
                let mut ledger = book.ledger.clone();
                ledger.insert(LedgerEvent::Adjustment(adjustment.clone()));
                replay(&ledger, self.options.term_policy).map(|engine| (ledger, engine))
            })
            .collect::<Result<Vec<_>, BookingError>>()?;

        for (book, (ledger, engine)) in guards.iter_mut().zip(rebuilt) {
            book.ledger = ledger;
            book.engine = engine;
        }
        drop(guards);

        if kind == CorporateActionKind::Split {
            allocations.rescale(entry.stock, effective_date, ratio);
        }
        self.sync_allocations(allocations, entry.stock);

        info!(
            stock = %entry.stock,
            %kind,
            %ratio,
            %effective_date,
            scopes = scopes.len(),
            "corporate action applied"
        );
        actions.push(adjustment);

        Ok(ReconcileOutcome::AdjustmentApplied {
            kind,
            ratio,
            effective_date,
        })
    }

    fn flag(
        &self,
        entry: &TaxPnlEntry,
        kind: MismatchKind,
        engine: Option<Observation>,
    ) -> ReconcileOutcome {
        let item = ReviewItem::new(entry.clone(), kind, engine);
        warn!(error = %item.error(), "tax report entry needs review");
        self.reviews.lock().push(item.clone());
        ReconcileOutcome::FlaggedForReview(item)
    }

    /// Dates and prices of every trade of `stock`, across accounts.
    fn trade_prices(&self, stock: StockId) -> Vec<(NaiveDate, Decimal)> {
        self.stock_scopes(stock)
            .iter()
            .flat_map(|scope| {
                scope
                    .lock()
                    .ledger
                    .trades()
                    .map(|t| (t.date, t.price))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Corporate actions applied so far, oldest first.
    pub fn corporate_actions(&self) -> Vec<CorporateActionAdjustment> {
        self.actions.lock().clone()
    }

    /// Report rows awaiting review, oldest first.
    pub fn review_items(&self) -> Vec<ReviewItem> {
        self.reviews.lock().clone()
    }

    // ------------------------------------------------------------------
    // Holdings and gains
    // ------------------------------------------------------------------

    /// Current holdings, optionally for one account only. Scopes with no
    /// units left are omitted.
    pub fn get_holdings(&self, account: Option<AccountId>) -> Vec<Holding> {
        self.scopes_matching(account)
            .iter()
            .map(|scope| Holding::from_engine(&scope.lock().engine))
            .filter(|h| h.quantity > Decimal::ZERO)
            .collect()
    }

    /// Totals of one scope, if it has any trades.
    pub fn position_summary(&self, stock: StockId, account: AccountId) -> Option<PositionSummary> {
        self.scope(ScopeKey::new(stock, account))
            .map(|scope| scope.lock().engine.summary())
    }

    /// Realized gains, optionally narrowed to one financial year and one
    /// account, ordered by sell date.
    pub fn get_realized_gains(
        &self,
        financial_year: Option<FinancialYear>,
        account: Option<AccountId>,
    ) -> Vec<RealizedGainEntry> {
        let mut gains: Vec<RealizedGainEntry> = self
            .scopes_matching(account)
            .iter()
            .flat_map(|scope| {
                scope
                    .lock()
                    .engine
                    .realized()
                    .iter()
                    .filter(|g| financial_year.map_or(true, |fy| g.financial_year == fy))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        gains.sort_by_key(|g| g.exit_date);
        gains
    }

    /// Realized profit by financial year and tax term.
    pub fn gains_summary(&self, account: Option<AccountId>) -> Vec<GainSummary> {
        summarize(&self.get_realized_gains(None, account))
    }

    // ------------------------------------------------------------------
    // Allocations
    // ------------------------------------------------------------------

    /// Assign units of a stock to an owner and goal.
    pub fn allocate(&self, request: AllocationRequest) -> Result<Allocation, Error> {
        let mut book = self.allocations.lock();
        let held = self.held_lots(request.stock);
        let allocation = book.allocate(request, &held)?;
        info!(
            id = %allocation.id,
            stock = %allocation.stock,
            owner = %allocation.owner,
            goal = %allocation.goal,
            quantity = %allocation.quantity,
            "allocation created"
        );
        Ok(allocation)
    }

    /// Return units of an allocation to the default bucket. Returns the
    /// reduced allocation, or `None` once it is gone.
    pub fn deallocate(
        &self,
        id: AllocationId,
        quantity: Decimal,
    ) -> Result<Option<Allocation>, Error> {
        let remaining = self.allocations.lock().deallocate(id, quantity)?;
        debug!(%id, %quantity, removed = remaining.is_none(), "allocation reduced");
        Ok(remaining)
    }

    /// Move an allocation to another owner or goal.
    pub fn reassign(
        &self,
        id: AllocationId,
        owner: Option<OwnerId>,
        goal: Option<GoalId>,
    ) -> Result<Allocation, Error> {
        let allocation = self.allocations.lock().reassign(id, owner, goal)?;
        debug!(%id, owner = %allocation.owner, goal = %allocation.goal, "allocation reassigned");
        Ok(allocation)
    }

    /// Allocations of one stock, or of all stocks, oldest first. Each stock
    /// with unallocated units ends with a synthetic default-bucket entry
    /// whose id is [`AllocationId::UNALLOCATED`].
    pub fn get_allocations(&self, stock: Option<StockId>) -> Vec<Allocation> {
        let book = self.allocations.lock();
        let mut out = Vec::new();
        for s in self.stocks_for(&book, stock) {
            out.extend(book.for_stock(s).into_iter().cloned());
            out.extend(default_bucket(&book, s, &self.held_lots(s)));
        }
        out
    }

    /// Allocated quantity and locked value per owner, including the
    /// default bucket.
    pub fn allocation_breakdown_by_owner(
        &self,
        stock: Option<StockId>,
    ) -> BTreeMap<OwnerId, BucketTotal> {
        let book = self.allocations.lock();
        let mut totals = book.by_owner(stock);
        for bucket in self.default_buckets(&book, stock) {
            add_to(totals.entry(OwnerId::DEFAULT).or_default(), &bucket);
        }
        totals
    }

    /// Allocated quantity and locked value per goal, including the
    /// default bucket.
    pub fn allocation_breakdown_by_goal(
        &self,
        stock: Option<StockId>,
    ) -> BTreeMap<GoalId, BucketTotal> {
        let book = self.allocations.lock();
        let mut totals = book.by_goal(stock);
        for bucket in self.default_buckets(&book, stock) {
            add_to(totals.entry(GoalId::UNASSIGNED).or_default(), &bucket);
        }
        totals
    }

    fn default_buckets(&self, book: &AllocationBook, stock: Option<StockId>) -> Vec<Allocation> {
        self.stocks_for(book, stock)
            .into_iter()
            .filter_map(|s| default_bucket(book, s, &self.held_lots(s)))
            .collect()
    }

    fn stocks_for(&self, book: &AllocationBook, stock: Option<StockId>) -> BTreeSet<StockId> {
        match stock {
            Some(s) => BTreeSet::from([s]),
            None => {
                let held = self.scopes.read().keys().map(|k| k.stock).collect::<Vec<_>>();
                book.stocks().into_iter().chain(held).collect()
            }
        }
    }

    fn sync_allocations(&self, book: &mut AllocationBook, stock: StockId) -> SyncResult {
        let held = self.held_units(stock);
        let result = book.sync_with_holdings(stock, held);
        if result != SyncResult::default() {
            info!(
                stock = %stock,
                adjusted = result.adjusted,
                deleted = result.deleted,
                "allocations trimmed to holdings"
            );
        }
        result
    }

    // ------------------------------------------------------------------
    // Scope access
    // ------------------------------------------------------------------

    fn scope(&self, key: ScopeKey) -> Option<SharedScope> {
        self.scopes.read().get(&key).cloned()
    }

    fn scope_or_insert(&self, key: ScopeKey) -> SharedScope {
        if let Some(scope) = self.scope(key) {
            return scope;
        }
        let mut scopes = self.scopes.write();
        Arc::clone(
            scopes
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(ScopeBook::new(key, &self.options)))),
        )
    }

    /// Every scope of `stock`, in account order.
    fn stock_scopes(&self, stock: StockId) -> Vec<SharedScope> {
        let range = ScopeKey::new(stock, AccountId(0))..=ScopeKey::new(stock, AccountId(u64::MAX));
        self.scopes
            .read()
            .range(range)
            .map(|(_, scope)| Arc::clone(scope))
            .collect()
    }

    fn scopes_matching(&self, account: Option<AccountId>) -> Vec<SharedScope> {
        self.scopes
            .read()
            .iter()
            .filter(|(key, _)| account.map_or(true, |a| key.account == a))
            .map(|(_, scope)| Arc::clone(scope))
            .collect()
    }

    /// Open lots of `stock` across accounts, oldest first.
    fn held_lots(&self, stock: StockId) -> Vec<Lot> {
        let mut lots: Vec<Lot> = self
            .stock_scopes(stock)
            .iter()
            .flat_map(|scope| scope.lock().engine.open_lots().cloned().collect::<Vec<_>>())
            .collect();
        lots.sort_by_key(|l| l.buy_date);
        lots
    }

    fn held_units(&self, stock: StockId) -> Decimal {
        self.stock_scopes(stock)
            .iter()
            .map(|scope| scope.lock().engine.units())
            .sum()
    }
}

fn add_to(total: &mut BucketTotal, allocation: &Allocation) {
    total.quantity += allocation.quantity;
    total.locked_value += allocation.locked_value();
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotbook_allocate::LockPrice;
    use lotbook_core::TradeId;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn buy(id: &str, account: u64, d: NaiveDate, qty: Decimal, price: Decimal) -> Trade {
        Trade::buy(id, StockId(1), AccountId(account), d, qty, price)
    }

    fn sell(id: &str, account: u64, d: NaiveDate, qty: Decimal, price: Decimal) -> Trade {
        Trade::sell(id, StockId(1), AccountId(account), d, qty, price)
    }

    #[test]
    fn test_portfolio_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Portfolio>();
    }

    #[test]
    fn test_rejected_sell_can_be_resubmitted() {
        let p = Portfolio::default();
        p.submit_trade(buy("B1", 1, date(2024, 1, 1), dec!(10), dec!(100)))
            .unwrap();

        let err = p
            .submit_trade(sell("S1", 1, date(2024, 2, 1), dec!(15), dec!(110)))
            .unwrap_err();
        let e = err.as_insufficient_lots().unwrap();
        assert_eq!(e.requested, dec!(15));
        assert_eq!(e.available, dec!(10));
        assert_eq!(p.get_holdings(None)[0].quantity, dec!(10));

        p.submit_trade(buy("B2", 1, date(2024, 1, 15), dec!(5), dec!(100)))
            .unwrap();
        assert_eq!(
            p.submit_trade(sell("S1", 1, date(2024, 2, 1), dec!(15), dec!(110)))
                .unwrap(),
            ImportOutcome::Imported
        );
        assert!(p.get_holdings(None).is_empty());
    }

    #[test]
    fn test_invalid_trade_is_not_claimed() {
        let p = Portfolio::default();
        let bad = buy("B1", 1, date(2024, 1, 1), dec!(0), dec!(100));
        assert!(matches!(p.submit_trade(bad), Err(Error::InvalidTrade(_))));

        assert_eq!(
            p.submit_trade(buy("B1", 1, date(2024, 1, 1), dec!(5), dec!(100)))
                .unwrap(),
            ImportOutcome::Imported
        );
    }

    #[test]
    fn test_back_dated_buy_replays() {
        let p = Portfolio::default();
        p.submit_trade(buy("B2", 1, date(2024, 2, 1), dec!(10), dec!(120)))
            .unwrap();
        p.submit_trade(buy("B1", 1, date(2024, 1, 1), dec!(10), dec!(100)))
            .unwrap();
        p.submit_trade(sell("S1", 1, date(2024, 3, 1), dec!(10), dec!(150)))
            .unwrap();

        let gains = p.get_realized_gains(None, None);
        assert_eq!(gains.len(), 1);
        assert_eq!(gains[0].entry_date, date(2024, 1, 1));
        assert_eq!(gains[0].buy_value, dec!(1000));

        let trades: Vec<TradeId> = p
            .list_trades(StockId(1), AccountId(1))
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(
            trades,
            vec![TradeId::new("B1"), TradeId::new("B2"), TradeId::new("S1")]
        );
    }

    #[test]
    fn test_batch_blocks_scope_after_rejected_sell() {
        let p = Portfolio::default();
        let report = p.submit_trades(vec![
            buy("B1", 1, date(2024, 1, 1), dec!(10), dec!(100)),
            buy("C1", 2, date(2024, 1, 1), dec!(10), dec!(100)),
            sell("S1", 1, date(2024, 2, 1), dec!(20), dec!(110)),
            sell("S2", 1, date(2024, 3, 1), dec!(5), dec!(110)),
            sell("S3", 2, date(2024, 3, 1), dec!(5), dec!(110)),
            buy("", 2, date(2024, 3, 2), dec!(1), dec!(100)),
        ]);

        assert_eq!(report.imported, 3);
        assert_eq!(report.insufficient, 1);
        assert_eq!(report.blocked, 1);
        assert_eq!(report.invalid, 1);
        assert_eq!(report.total(), 6);
        assert_eq!(report.failures[1].trade_id, TradeId::new("S2"));
        assert_eq!(report.failures[1].kind, FailureKind::Blocked);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_sell_trims_allocations() {
        let p = Portfolio::default();
        p.submit_trade(buy("B1", 1, date(2024, 1, 1), dec!(100), dec!(100)))
            .unwrap();
        let a = p
            .allocate(AllocationRequest {
                stock: StockId(1),
                owner: OwnerId(7),
                goal: GoalId(3),
                quantity: dec!(80),
                lock: LockPrice::FifoLots,
            })
            .unwrap();

        p.submit_trade(sell("S1", 1, date(2024, 2, 1), dec!(50), dec!(110)))
            .unwrap();

        let allocations = p.get_allocations(Some(StockId(1)));
        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].id, a.id);
        assert_eq!(allocations[0].quantity, dec!(50));
    }

    #[test]
    fn test_default_bucket_in_breakdowns() {
        let p = Portfolio::default();
        p.submit_trade(buy("B1", 1, date(2024, 1, 1), dec!(60), dec!(100)))
            .unwrap();
        p.submit_trade(buy("B2", 2, date(2024, 2, 1), dec!(40), dec!(150)))
            .unwrap();
        p.allocate(AllocationRequest {
            stock: StockId(1),
            owner: OwnerId(7),
            goal: GoalId(3),
            quantity: dec!(30),
            lock: LockPrice::FifoLots,
        })
        .unwrap();

        let allocations = p.get_allocations(None);
        assert_eq!(allocations.len(), 2);
        assert!(allocations[1].is_unallocated());
        assert_eq!(allocations[1].quantity, dec!(70));
        assert_eq!(allocations[1].locked_buy_price, dec!(120));

        let owners = p.allocation_breakdown_by_owner(None);
        assert_eq!(owners[&OwnerId(7)].quantity, dec!(30));
        assert_eq!(owners[&OwnerId(7)].locked_value, dec!(3000));
        assert_eq!(owners[&OwnerId::DEFAULT].quantity, dec!(70));

        let goals = p.allocation_breakdown_by_goal(Some(StockId(1)));
        assert_eq!(goals[&GoalId(3)].quantity, dec!(30));
        assert_eq!(goals[&GoalId::UNASSIGNED].quantity, dec!(70));
    }

    #[test]
    fn test_report_without_scope_is_flagged() {
        let p = Portfolio::default();
        let entry = TaxPnlEntry {
            stock: StockId(9),
            account: AccountId(1),
            entry_date: date(2024, 1, 1),
            exit_date: date(2024, 6, 1),
            quantity: dec!(10),
            buy_value: dec!(1000),
            sell_value: dec!(1100),
        };

        let outcome = p.submit_tax_pnl_entry(entry.clone()).unwrap();
        let ReconcileOutcome::FlaggedForReview(item) = outcome else {
            panic!("expected a review item");
        };
        assert_eq!(item.kind, MismatchKind::NoCounterpart);
        assert_eq!(p.review_items().len(), 1);

        assert_eq!(
            p.submit_tax_pnl_entry(entry).unwrap(),
            ReconcileOutcome::DuplicateSkipped
        );
        assert_eq!(p.review_items().len(), 1);
    }

    #[test]
    fn test_position_summary() {
        let p = Portfolio::default();
        p.submit_trade(buy("B1", 1, date(2024, 1, 1), dec!(10), dec!(100)))
            .unwrap();
        p.submit_trade(sell("S1", 1, date(2024, 2, 1), dec!(4), dec!(125)))
            .unwrap();

        let summary = p.position_summary(StockId(1), AccountId(1)).unwrap();
        assert_eq!(summary.available, dec!(6));
        assert_eq!(summary.realized_profit, dec!(100));
        assert!(p.position_summary(StockId(1), AccountId(2)).is_none());
    }
}
