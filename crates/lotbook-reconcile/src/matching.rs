//! Building the booked counterpart of a reported row.

use chrono::NaiveDate;
use lotbook_core::{Lot, RealizedGainEntry, TaxPnlEntry};
use rust_decimal::Decimal;

use crate::decide::{decide, Decision, MismatchKind, Observation};
use crate::options::ReconcileOptions;

/// Read-only view of one scope's booked state.
#[derive(Debug, Clone, Copy)]
pub struct ScopeView<'a> {
    /// Date of the scope's first trade, if it has any.
    pub earliest_trade_date: Option<NaiveDate>,
    /// Realized entries of the scope.
    pub realized: &'a [RealizedGainEntry],
    /// All lots of the scope, open or not.
    pub lots: &'a [Lot],
}

/// A decision together with the booked observation it was based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    /// What to do.
    pub decision: Decision,
    /// What the engine had booked, if anything matched.
    pub engine: Option<Observation>,
}

fn within(a: NaiveDate, b: NaiveDate, days: u32) -> bool {
    (a - b).num_days().abs() <= i64::from(days)
}

fn total<I>(items: I) -> Observation
where
    I: IntoIterator<Item = (Decimal, Decimal)>,
{
    items
        .into_iter()
        .fold(Observation::new(Decimal::ZERO, Decimal::ZERO), |acc, (q, v)| {
            Observation::new(acc.quantity + q, acc.buy_value + v)
        })
}

/// Find what the engine booked for the units a reported row describes.
///
/// Realized entries on the row's exit date are used first, narrowed to
/// those with the row's entry date when any exist. A sell the engine
/// rejected leaves no realized entries, so the open lots bought on the
/// row's entry date are used instead. When no buy falls on the entry date
/// exactly, buys within `entry_date_window_days` of it are accepted.
#[must_use]
pub fn engine_view(
    entry: &TaxPnlEntry,
    view: &ScopeView<'_>,
    options: &ReconcileOptions,
) -> Option<Observation> {
    let window = options.entry_date_window_days;
    let same_exit: Vec<&RealizedGainEntry> = view
        .realized
        .iter()
        .filter(|r| r.exit_date == entry.exit_date)
        .collect();

    if !same_exit.is_empty() {
        let near_entry = |days| {
            same_exit
                .iter()
                .copied()
                .filter(|r| within(r.entry_date, entry.entry_date, days))
                .collect::<Vec<_>>()
        };
        let mut chosen = near_entry(0);
        if chosen.is_empty() {
            chosen = near_entry(window);
        }
        if chosen.is_empty() {
            chosen = same_exit;
        }
        return Some(total(chosen.iter().map(|r| (r.quantity, r.buy_value))));
    }

    let open_near = |days| {
        total(
            view.lots
                .iter()
                .filter(|l| l.is_open() && within(l.buy_date, entry.entry_date, days))
                .map(|l| (l.remaining_quantity, l.book_value())),
        )
    };
    let mut open = open_near(0);
    if open.quantity.is_zero() && window > 0 {
        open = open_near(window);
    }

    (open.quantity > Decimal::ZERO).then_some(open)
}

/// Compare a reported row with a scope's booked state.
#[must_use]
pub fn assess(entry: &TaxPnlEntry, view: &ScopeView<'_>, options: &ReconcileOptions) -> Assessment {
    let unexplained = |kind| Assessment {
        decision: Decision::Unexplained { kind },
        engine: None,
    };

    let window = i64::from(options.entry_date_window_days);
    match view.earliest_trade_date {
        None => return unexplained(MismatchKind::NoCounterpart),
        Some(earliest) if (earliest - entry.entry_date).num_days() > window => {
            return unexplained(MismatchKind::MissingHistory);
        }
        Some(_) => {}
    }

    let Some(engine) = engine_view(entry, view, options) else {
        return unexplained(MismatchKind::NoCounterpart);
    };

    let reported = Observation::new(entry.quantity, entry.buy_value);
    Assessment {
        decision: decide(&engine, &reported, options),
        engine: Some(engine),
    }
}

/// Guess when a corporate action took effect.
///
/// `prices` are trade prices of the stock. The first trade after
/// `entry_date` whose price sits closer to `pre_price / ratio` than to
/// `pre_price` (geometrically) is taken as the first post-action trade, and
/// the action is dated the day before it. Without such a trade the day
/// before `exit_date` is used. The result is never before `entry_date`.
#[must_use]
pub fn estimate_effective_date<I>(
    entry_date: NaiveDate,
    exit_date: NaiveDate,
    pre_price: Decimal,
    ratio: Decimal,
    prices: I,
) -> NaiveDate
where
    I: IntoIterator<Item = (NaiveDate, Decimal)>,
{
    let mut candidates: Vec<(NaiveDate, Decimal)> = prices
        .into_iter()
        .filter(|(d, _)| *d > entry_date && *d <= exit_date)
        .collect();
    candidates.sort_by_key(|(d, _)| *d);

    let threshold = pre_price * pre_price;
    let first_post = if pre_price > Decimal::ZERO && ratio > Decimal::ONE {
        candidates
            .into_iter()
            .find(|(_, p)| *p * *p * ratio < threshold)
            .map(|(d, _)| d)
    } else {
        None
    };

    first_post
        .unwrap_or(exit_date)
        .pred_opt()
        .map_or(entry_date, |d| d.max(entry_date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotbook_core::{AccountId, Consumption, LotSource, ScopeKey, StockId, TermPolicy, TradeId};
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn lot(id: &str, d: NaiveDate, price: Decimal, qty: Decimal) -> Lot {
        Lot {
            source: LotSource::Trade(TradeId::new(id)),
            buy_date: d,
            buy_price: price,
            original_quantity: qty,
            remaining_quantity: qty,
            seq: 0,
        }
    }

    fn realized(
        buy: NaiveDate,
        sell: NaiveDate,
        qty: Decimal,
        price: Decimal,
    ) -> RealizedGainEntry {
        RealizedGainEntry::from_consumption(
            ScopeKey::new(StockId(1), AccountId(1)),
            TradeId::new("S1"),
            sell,
            dec!(1),
            &Consumption {
                source: LotSource::Trade(TradeId::new("B1")),
                buy_date: buy,
                buy_price: price,
                quantity: qty,
            },
            TermPolicy::default(),
        )
    }

    fn report(entry: NaiveDate, exit: NaiveDate, qty: Decimal, value: Decimal) -> TaxPnlEntry {
        TaxPnlEntry {
            stock: StockId(1),
            account: AccountId(1),
            entry_date: entry,
            exit_date: exit,
            quantity: qty,
            buy_value: value,
            sell_value: value,
        }
    }

    #[test]
    fn test_view_prefers_same_entry_date() {
        let r = vec![
            realized(date(2024, 1, 1), date(2024, 6, 1), dec!(10), dec!(100)),
            realized(date(2024, 2, 1), date(2024, 6, 1), dec!(5), dec!(120)),
            realized(date(2024, 1, 1), date(2024, 7, 1), dec!(3), dec!(100)),
        ];
        let view = ScopeView {
            earliest_trade_date: Some(date(2024, 1, 1)),
            realized: &r,
            lots: &[],
        };
        let options = ReconcileOptions::default();

        let row = report(date(2024, 2, 1), date(2024, 6, 1), dec!(5), dec!(600));
        let obs = engine_view(&row, &view, &options);
        assert_eq!(obs, Some(Observation::new(dec!(5), dec!(600))));

        // No entry-date match: everything sold that day.
        let row = report(date(2024, 3, 1), date(2024, 6, 1), dec!(15), dec!(1600));
        let obs = engine_view(&row, &view, &options);
        assert_eq!(obs, Some(Observation::new(dec!(15), dec!(1600))));
    }

    #[test]
    fn test_view_falls_back_to_open_lots() {
        let lots = vec![
            lot("B1", date(2024, 1, 1), dec!(200), dec!(10)),
            lot("B2", date(2024, 2, 1), dec!(210), dec!(10)),
        ];
        let view = ScopeView {
            earliest_trade_date: Some(date(2024, 1, 1)),
            realized: &[],
            lots: &lots,
        };
        let options = ReconcileOptions::default();

        let row = report(date(2024, 1, 1), date(2024, 7, 1), dec!(20), dec!(2000));
        let obs = engine_view(&row, &view, &options);
        assert_eq!(obs, Some(Observation::new(dec!(10), dec!(2000))));

        let row = report(date(2024, 1, 5), date(2024, 7, 1), dec!(20), dec!(2000));
        assert_eq!(engine_view(&row, &view, &options), None);
    }

    #[test]
    fn test_view_accepts_buy_a_day_off() {
        let lots = vec![
            lot("B1", date(2024, 1, 1), dec!(200), dec!(10)),
            lot("B2", date(2024, 1, 3), dec!(210), dec!(10)),
        ];
        let view = ScopeView {
            earliest_trade_date: Some(date(2024, 1, 1)),
            realized: &[],
            lots: &lots,
        };
        let mut options = ReconcileOptions::default();

        // An exact date wins over neighbours.
        let row = report(date(2024, 1, 3), date(2024, 7, 1), dec!(20), dec!(2100));
        let obs = engine_view(&row, &view, &options);
        assert_eq!(obs, Some(Observation::new(dec!(10), dec!(2100))));

        // Jan 2 has no buy; both neighbours are within a day.
        let row = report(date(2024, 1, 2), date(2024, 7, 1), dec!(40), dec!(4100));
        let obs = engine_view(&row, &view, &options);
        assert_eq!(obs, Some(Observation::new(dec!(20), dec!(4100))));

        options.entry_date_window_days = 0;
        let row = report(date(2024, 1, 2), date(2024, 7, 1), dec!(40), dec!(4100));
        assert_eq!(engine_view(&row, &view, &options), None);
    }

    #[test]
    fn test_view_realized_entry_a_day_off() {
        let r = vec![
            realized(date(2024, 1, 1), date(2024, 6, 1), dec!(10), dec!(100)),
            realized(date(2024, 3, 1), date(2024, 6, 1), dec!(5), dec!(120)),
        ];
        let view = ScopeView {
            earliest_trade_date: Some(date(2024, 1, 1)),
            realized: &r,
            lots: &[],
        };

        let obs = engine_view(
            &report(date(2024, 1, 2), date(2024, 6, 1), dec!(10), dec!(1000)),
            &view,
            &ReconcileOptions::default(),
        );
        assert_eq!(obs, Some(Observation::new(dec!(10), dec!(1000))));
    }

    #[test]
    fn test_assess_split_with_settlement_date() {
        let lots = vec![lot("B1", date(2024, 1, 1), dec!(200), dec!(10))];
        let view = ScopeView {
            earliest_trade_date: Some(date(2024, 1, 1)),
            realized: &[],
            lots: &lots,
        };
        let options = ReconcileOptions::default();

        let row = report(date(2024, 1, 2), date(2024, 7, 1), dec!(20), dec!(2000));
        let a = assess(&row, &view, &options);
        assert_eq!(a.decision, Decision::Split { ratio: dec!(2) });

        // A day before the first trade is still within the window.
        let row = report(date(2023, 12, 31), date(2024, 7, 1), dec!(20), dec!(2000));
        let a = assess(&row, &view, &options);
        assert_eq!(a.decision, Decision::Split { ratio: dec!(2) });
    }

    #[test]
    fn test_assess_split() {
        let lots = vec![lot("B1", date(2024, 1, 1), dec!(200), dec!(10))];
        let view = ScopeView {
            earliest_trade_date: Some(date(2024, 1, 1)),
            realized: &[],
            lots: &lots,
        };

        let a = assess(
            &report(date(2024, 1, 1), date(2024, 7, 1), dec!(20), dec!(2000)),
            &view,
            &ReconcileOptions::default(),
        );
        assert_eq!(a.decision, Decision::Split { ratio: dec!(2) });
        assert_eq!(a.engine, Some(Observation::new(dec!(10), dec!(2000))));
    }

    #[test]
    fn test_assess_missing_history() {
        let view = ScopeView {
            earliest_trade_date: Some(date(2024, 1, 1)),
            realized: &[],
            lots: &[],
        };
        let a = assess(
            &report(date(2023, 6, 1), date(2024, 7, 1), dec!(20), dec!(2000)),
            &view,
            &ReconcileOptions::default(),
        );
        assert_eq!(
            a.decision,
            Decision::Unexplained {
                kind: MismatchKind::MissingHistory
            }
        );
    }

    #[test]
    fn test_assess_empty_scope() {
        let view = ScopeView {
            earliest_trade_date: None,
            realized: &[],
            lots: &[],
        };
        let a = assess(
            &report(date(2024, 1, 1), date(2024, 7, 1), dec!(1), dec!(1)),
            &view,
            &ReconcileOptions::default(),
        );
        assert_eq!(
            a.decision,
            Decision::Unexplained {
                kind: MismatchKind::NoCounterpart
            }
        );
    }

    #[test]
    fn test_effective_date_from_price_drop() {
        let prices = vec![
            (date(2024, 2, 1), dec!(205)),
            (date(2024, 4, 10), dec!(104)),
            (date(2024, 5, 1), dec!(99)),
        ];
        let d = estimate_effective_date(
            date(2024, 1, 1),
            date(2024, 7, 1),
            dec!(200),
            dec!(2),
            prices,
        );
        assert_eq!(d, date(2024, 4, 9));
    }

    #[test]
    fn test_effective_date_defaults_to_day_before_exit() {
        let d = estimate_effective_date(
            date(2024, 1, 1),
            date(2024, 7, 1),
            dec!(200),
            dec!(2),
            Vec::new(),
        );
        assert_eq!(d, date(2024, 6, 30));
    }

    #[test]
    fn test_effective_date_never_before_entry() {
        let d = estimate_effective_date(
            date(2024, 7, 1),
            date(2024, 7, 1),
            dec!(200),
            dec!(2),
            Vec::new(),
        );
        assert_eq!(d, date(2024, 7, 1));
    }
}
