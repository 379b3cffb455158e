//! Behavioural flags read by the engine.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use plainledger_parser::Period;

/// Engine options.
///
/// Owned by the command-line layer; the passes only read them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Warn about undeclared accounts and commodities.
    pub strict: bool,

    /// Fail on undeclared accounts and commodities.
    pub pedantic: bool,

    /// Also check payees against `payee` declarations.
    pub checkpayee: bool,

    /// Only post transactions on or after this date.
    pub begin: Option<NaiveDate>,

    /// Only post transactions before this date.
    pub end: Option<NaiveDate>,

    /// First month of the fiscal year (1-12); January when unset.
    pub finyear: Option<u32>,

    /// Show debit and credit columns.
    pub dcformat: bool,

    /// Suppress parent subtotals.
    pub nosubtotal: bool,
}

impl Options {
    /// Create options with everything off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Narrow the date bounds to a period's bounds.
    #[must_use]
    pub fn with_period(mut self, period: &Period) -> Self {
        if period.begin.is_some() {
            self.begin = period.begin;
        }
        if period.end.is_some() {
            self.end = period.end;
        }
        self
    }

    /// The bounds as timestamps for a time-ordered store range.
    #[must_use]
    pub fn bounds(&self) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
        let at = |d: NaiveDate| d.and_time(NaiveTime::default());
        (self.begin.map(at), self.end.map(at))
    }

    /// The fiscal year `date` belongs to, named by the calendar year in which
    /// that fiscal year begins.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use plainledger_loader::Options;
    ///
    /// let opts = Options { finyear: Some(4), ..Options::default() };
    /// let may = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    /// let march = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    /// assert_eq!(opts.fiscal_year(may), 2024);
    /// assert_eq!(opts.fiscal_year(march), 2023);
    /// ```
    #[must_use]
    pub fn fiscal_year(&self, date: NaiveDate) -> i32 {
        if date.month() >= self.fiscal_month() {
            date.year()
        } else {
            date.year() - 1
        }
    }

    /// First day of fiscal year `year`.
    #[must_use]
    pub fn fiscal_year_start(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.fiscal_month(), 1)
    }

    fn fiscal_month(&self) -> u32 {
        self.finyear.filter(|m| (1..=12).contains(m)).unwrap_or(1)
    }
}
