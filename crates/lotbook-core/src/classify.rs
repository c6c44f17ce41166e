//! Tax-term and financial-year classification.
//!
//! A realized gain is short-term or long-term depending on how long the
//! units were held, and is reported in the financial year (April 1 to
//! March 31) of the sell date. Everything here is pure and total.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tax treatment of a realized gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaxTerm {
    /// Short-term capital gain.
    #[serde(rename = "STCG")]
    ShortTerm,
    /// Long-term capital gain.
    #[serde(rename = "LTCG")]
    LongTerm,
}

impl TaxTerm {
    /// Short code used in reports.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ShortTerm => "STCG",
            Self::LongTerm => "LTCG",
        }
    }
}

impl fmt::Display for TaxTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// How the long-term threshold is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermPolicy {
    /// Long-term iff the sell date is strictly after the buy date plus this
    /// many calendar months. A Feb 29 buy plus 12 months lands on Feb 28.
    CalendarMonths(u32),
    /// Long-term iff more than this many days were held.
    Days(i64),
}

impl Default for TermPolicy {
    fn default() -> Self {
        Self::CalendarMonths(12)
    }
}

/// Result of classifying a holding period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Short- or long-term.
    pub term: TaxTerm,
    /// Days between buy and sell.
    pub holding_days: i64,
}

impl TermPolicy {
    /// Classify a holding from `buy_date` to `sell_date`.
    #[must_use]
    pub fn classify(self, buy_date: NaiveDate, sell_date: NaiveDate) -> Classification {
        let holding_days = (sell_date - buy_date).num_days();
        let long = match self {
            Self::CalendarMonths(months) => buy_date
                .checked_add_months(Months::new(months))
                .is_some_and(|threshold| sell_date > threshold),
            Self::Days(days) => holding_days > days,
        };

        Classification {
            term: if long {
                TaxTerm::LongTerm
            } else {
                TaxTerm::ShortTerm
            },
            holding_days,
        }
    }
}

impl fmt::Display for TermPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CalendarMonths(m) => write!(f, "more than {m} calendar months"),
            Self::Days(d) => write!(f, "more than {d} days"),
        }
    }
}

/// Classify with the default policy (more than 12 calendar months).
#[must_use]
pub fn classify(buy_date: NaiveDate, sell_date: NaiveDate) -> Classification {
    TermPolicy::default().classify(buy_date, sell_date)
}

/// An April-to-March financial year, identified by the calendar year it
/// starts in.
///
/// ```
/// use lotbook_core::{financial_year, FinancialYear};
/// use chrono::NaiveDate;
///
/// let fy = financial_year(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
/// assert_eq!(fy.to_string(), "2023-24");
/// assert_eq!("2023-2024".parse::<FinancialYear>().unwrap(), fy);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FinancialYear {
    start_year: i32,
}

/// The financial year containing `date`.
#[must_use]
pub fn financial_year(date: NaiveDate) -> FinancialYear {
    let start_year = if date.month() >= 4 {
        date.year()
    } else {
        date.year() - 1
    };
    FinancialYear { start_year }
}

impl FinancialYear {
    /// Create the financial year starting on April 1 of `start_year`.
    ///
    /// Returns `None` when the year's dates cannot be represented.
    #[must_use]
    pub fn starting(start_year: i32) -> Option<Self> {
        NaiveDate::from_ymd_opt(start_year, 4, 1)?;
        NaiveDate::from_ymd_opt(start_year.checked_add(1)?, 3, 31)?;
        Some(Self { start_year })
    }

    /// Calendar year the financial year starts in.
    #[must_use]
    pub const fn start_year(self) -> i32 {
        self.start_year
    }

    /// April 1 of the start year.
    #[must_use]
    pub fn start_date(self) -> NaiveDate {
        // In range by construction.
        NaiveDate::from_ymd_opt(self.start_year, 4, 1).unwrap_or(NaiveDate::MIN)
    }

    /// March 31 of the following year.
    #[must_use]
    pub fn end_date(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year + 1, 3, 31).unwrap_or(NaiveDate::MAX)
    }

    /// Check whether `date` falls in this financial year.
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        financial_year(date) == self
    }

    /// The following financial year.
    #[must_use]
    pub const fn next(self) -> Self {
        Self {
            start_year: self.start_year + 1,
        }
    }
}

impl fmt::Display for FinancialYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:02}",
            self.start_year,
            (self.start_year + 1).rem_euclid(100)
        )
    }
}

/// Error returned when a financial year label cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid financial year {0:?}: expected \"2023-24\" or \"2023-2024\"")]
pub struct ParseFinancialYearError(pub String);

impl FromStr for FinancialYear {
    type Err = ParseFinancialYearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseFinancialYearError(s.to_string());

        let (start, end) = s.trim().split_once('-').ok_or_else(err)?;
        let start_year: i32 = start.parse().map_err(|_| err())?;
        let end_year: i32 = end.parse().map_err(|_| err())?;

        let expected_end = start_year.checked_add(1).ok_or_else(err)?;
        let ok = match end.len() {
            2 => end_year == expected_end.rem_euclid(100),
            4 => end_year == expected_end,
            _ => false,
        };
        if !ok {
            return Err(err());
        }

        Self::starting(start_year).ok_or_else(err)
    }
}

impl TryFrom<String> for FinancialYear {
    type Error = ParseFinancialYearError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FinancialYear> for String {
    fn from(value: FinancialYear) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_exactly_twelve_months_is_short_term() {
        let c = classify(date(2023, 1, 15), date(2024, 1, 15));
        assert_eq!(c.term, TaxTerm::ShortTerm);
        assert_eq!(c.holding_days, 365);
    }

    #[test]
    fn test_one_day_past_twelve_months_is_long_term() {
        let c = classify(date(2023, 1, 15), date(2024, 1, 16));
        assert_eq!(c.term, TaxTerm::LongTerm);
    }

    #[test]
    fn test_leap_day_buy_clamps_to_feb_28() {
        let buy = date(2024, 2, 29);
        assert_eq!(classify(buy, date(2025, 2, 28)).term, TaxTerm::ShortTerm);
        assert_eq!(classify(buy, date(2025, 3, 1)).term, TaxTerm::LongTerm);
    }

    #[test]
    fn test_days_policy_boundary() {
        let policy = TermPolicy::Days(365);
        let buy = date(2023, 6, 1);
        // 2024 is a leap year: June 1 2023 to May 31 2024 is 365 days.
        assert_eq!(policy.classify(buy, date(2024, 5, 31)).term, TaxTerm::ShortTerm);
        assert_eq!(policy.classify(buy, date(2024, 6, 1)).term, TaxTerm::LongTerm);
    }

    #[test]
    fn test_same_day_sell() {
        let c = classify(date(2024, 5, 5), date(2024, 5, 5));
        assert_eq!(c.term, TaxTerm::ShortTerm);
        assert_eq!(c.holding_days, 0);
    }

    #[test]
    fn test_financial_year_boundaries() {
        assert_eq!(financial_year(date(2024, 3, 31)).to_string(), "2023-24");
        assert_eq!(financial_year(date(2024, 4, 1)).to_string(), "2024-25");
        assert_eq!(financial_year(date(1999, 12, 31)).to_string(), "1999-00");
    }

    #[test]
    fn test_financial_year_dates() {
        let fy: FinancialYear = "2023-24".parse().unwrap();
        assert_eq!(fy.start_date(), date(2023, 4, 1));
        assert_eq!(fy.end_date(), date(2024, 3, 31));
        assert!(fy.contains(date(2023, 4, 1)));
        assert!(fy.contains(date(2024, 3, 31)));
        assert!(!fy.contains(date(2024, 4, 1)));
        assert_eq!(fy.next().to_string(), "2024-25");
    }

    #[test]
    fn test_financial_year_parse() {
        assert_eq!(
            "2023-2024".parse::<FinancialYear>().unwrap().start_year(),
            2023
        );
        assert!("2023-25".parse::<FinancialYear>().is_err());
        assert!("2023".parse::<FinancialYear>().is_err());
        assert!("abcd-ef".parse::<FinancialYear>().is_err());
        assert!("2023-024".parse::<FinancialYear>().is_err());
    }

    #[test]
    fn test_financial_year_serde() {
        let fy: FinancialYear = serde_json::from_str("\"2022-23\"").unwrap();
        assert_eq!(fy.start_year(), 2022);
        assert_eq!(serde_json::to_string(&fy).unwrap(), "\"2022-23\"");
    }

    #[test]
    fn test_term_policy_serde() {
        let policy: TermPolicy = serde_json::from_str(r#"{"days": 365}"#).unwrap();
        assert_eq!(policy, TermPolicy::Days(365));
        assert_eq!(TaxTerm::LongTerm.to_string(), "LTCG");
    }
}
