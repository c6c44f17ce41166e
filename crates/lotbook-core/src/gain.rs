//! Realized gains.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::classify::{financial_year, FinancialYear, TaxTerm, TermPolicy};
use crate::ids::{AccountId, ScopeKey, StockId, TradeId};
use crate::lot::LotSource;
use crate::queue::Consumption;

/// One (sell trade, consumed lot) pair.
///
/// `buy_value + profit == sell_value` always holds; `profit` is derived,
/// never supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealizedGainEntry {
    /// The stock sold.
    #[serde(rename = "stock_id")]
    pub stock: StockId,
    /// The account it was sold from.
    #[serde(rename = "account_id")]
    pub account: AccountId,
    /// The sell trade that realized the gain.
    pub sell_trade_id: TradeId,
    /// The lot the units came from.
    pub lot: LotSource,
    /// Buy date of the lot.
    pub entry_date: NaiveDate,
    /// Sell date.
    pub exit_date: NaiveDate,
    /// Units sold out of the lot.
    pub quantity: Decimal,
    /// Cost per unit.
    pub buy_price: Decimal,
    /// Proceeds per unit.
    pub sell_price: Decimal,
    /// `quantity * buy_price`.
    pub buy_value: Decimal,
    /// `quantity * sell_price`.
    pub sell_value: Decimal,
    /// `sell_value - buy_value`.
    pub profit: Decimal,
    /// Days between entry and exit.
    pub holding_days: i64,
    /// Short- or long-term.
    pub tax_term: TaxTerm,
    /// Financial year of the exit date.
    pub financial_year: FinancialYear,
}

impl RealizedGainEntry {
    /// Build the entry for units of one lot taken by a sell.
    #[must_use]
    pub fn from_consumption(
        scope: ScopeKey,
        sell_trade_id: TradeId,
        exit_date: NaiveDate,
        sell_price: Decimal,
        taken: &Consumption,
        policy: TermPolicy,
    ) -> Self {
        let buy_value = taken.quantity * taken.buy_price;
        let sell_value = taken.quantity * sell_price;
        let classification = policy.classify(taken.buy_date, exit_date);

        Self {
            stock: scope.stock,
            account: scope.account,
            sell_trade_id,
            lot: taken.source.clone(),
            entry_date: taken.buy_date,
            exit_date,
            quantity: taken.quantity,
            buy_price: taken.buy_price,
            sell_price,
            buy_value,
            sell_value,
            profit: sell_value - buy_value,
            holding_days: classification.holding_days,
            tax_term: classification.term,
            financial_year: financial_year(exit_date),
        }
    }

    /// The scope the gain was realized in.
    #[must_use]
    pub const fn scope(&self) -> ScopeKey {
        ScopeKey::new(self.stock, self.account)
    }

    /// Check if the gain is long-term.
    #[must_use]
    pub fn is_long_term(&self) -> bool {
        self.tax_term == TaxTerm::LongTerm
    }
}

/// Realized profit for one financial year and tax term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainSummary {
    /// The financial year.
    pub financial_year: FinancialYear,
    /// The tax term.
    pub tax_term: TaxTerm,
    /// Sum of profits (losses are negative).
    pub total_profit: Decimal,
    /// Number of entries summed.
    pub entries: usize,
}

/// Group realized entries by financial year and tax term.
///
/// Rows come out ordered by year, short-term before long-term.
#[must_use]
pub fn summarize<'a, I>(entries: I) -> Vec<GainSummary>
where
    I: IntoIterator<Item = &'a RealizedGainEntry>,
{
    let mut groups: BTreeMap<(FinancialYear, TaxTerm), (Decimal, usize)> = BTreeMap::new();
    for entry in entries {
        let slot = groups
            .entry((entry.financial_year, entry.tax_term))
            .or_insert((Decimal::ZERO, 0));
        slot.0 += entry.profit;
        slot.1 += 1;
    }

    groups
        .into_iter()
        .map(|((financial_year, tax_term), (total_profit, entries))| GainSummary {
            financial_year,
            tax_term,
            total_profit,
            entries,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn entry(
        buy: NaiveDate,
        sell: NaiveDate,
        qty: Decimal,
        bp: Decimal,
        sp: Decimal,
    ) -> RealizedGainEntry {
        let taken = Consumption {
            source: LotSource::Trade(TradeId::new("B1")),
            buy_date: buy,
            buy_price: bp,
            quantity: qty,
        };
        RealizedGainEntry::from_consumption(
            ScopeKey::new(StockId(1), AccountId(1)),
            TradeId::new("S1"),
            sell,
            sp,
            &taken,
            TermPolicy::default(),
        )
    }

    #[test]
    fn test_entry_values() {
        let e = entry(date(2024, 1, 1), date(2024, 3, 1), dec!(30), dec!(100), dec!(150));
        assert_eq!(e.buy_value, dec!(3000));
        assert_eq!(e.sell_value, dec!(4500));
        assert_eq!(e.profit, dec!(1500));
        assert_eq!(e.buy_value + e.profit, e.sell_value);
        assert_eq!(e.holding_days, 60);
        assert_eq!(e.tax_term, TaxTerm::ShortTerm);
        assert_eq!(e.financial_year.to_string(), "2023-24");
    }

    #[test]
    fn test_loss_entry() {
        let e = entry(date(2022, 1, 1), date(2023, 6, 1), dec!(10), dec!(100), dec!(80));
        assert_eq!(e.profit, dec!(-200));
        assert!(e.is_long_term());
    }

    #[test]
    fn test_summarize_groups_by_year_and_term() {
        let entries = vec![
            entry(date(2024, 1, 1), date(2024, 3, 1), dec!(10), dec!(100), dec!(110)),
            entry(date(2024, 1, 1), date(2024, 3, 2), dec!(10), dec!(100), dec!(120)),
            entry(date(2022, 1, 1), date(2024, 3, 2), dec!(10), dec!(100), dec!(90)),
            entry(date(2024, 1, 1), date(2024, 4, 2), dec!(10), dec!(100), dec!(130)),
        ];

        let summary = summarize(&entries);
        assert_eq!(summary.len(), 3);

        assert_eq!(summary[0].financial_year.to_string(), "2023-24");
        assert_eq!(summary[0].tax_term, TaxTerm::ShortTerm);
        assert_eq!(summary[0].total_profit, dec!(300));
        assert_eq!(summary[0].entries, 2);

        assert_eq!(summary[1].tax_term, TaxTerm::LongTerm);
        assert_eq!(summary[1].total_profit, dec!(-100));

        assert_eq!(summary[2].financial_year.to_string(), "2024-25");
    }
}
