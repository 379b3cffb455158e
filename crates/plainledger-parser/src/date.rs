//! Date-spec parsing.
//!
//! Accepts the absolute forms `YYYY/MM/DD` (with `/`, `-` or `.` as
//! separator), `YY/MM/DD`, `YYYY/MM`, `YYYY`, bare month names or numbers, and
//! the relative forms `yesterday`, `today`, `tomorrow` and
//! `last|this|next day|week|month|quarter|year`.
//!
//! Every form resolves to a [`DateRange`] whose width is the form's
//! granularity: `2014` covers the whole year, `2014/03` the month, `last
//! quarter` the quarter. [`parse_date`] returns the first day of that range.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// Errors raised by date-spec and period parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// Nothing to parse.
    #[error("empty date")]
    Empty,
    /// No date form matched.
    #[error("unrecognized date '{0}'")]
    Unrecognized(String),
    /// The form matched but names a day that does not exist.
    #[error("date out of range '{0}'")]
    OutOfRange(String),
    /// The time of day is malformed or out of range.
    #[error("invalid time '{0}'")]
    InvalidTime(String),
    /// A period expression did not parse.
    #[error("invalid period '{0}'")]
    InvalidPeriod(String),
}

/// Calendar granularity of a date-spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// One day.
    Day,
    /// Sunday-aligned week.
    Week,
    /// Calendar month.
    Month,
    /// Calendar quarter.
    Quarter,
    /// Calendar year.
    Year,
}

impl Unit {
    /// Parse a singular or plural unit name.
    #[must_use]
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "day" | "days" => Some(Self::Day),
            "week" | "weeks" => Some(Self::Week),
            "month" | "months" => Some(Self::Month),
            "quarter" | "quarters" => Some(Self::Quarter),
            "year" | "years" => Some(Self::Year),
            _ => None,
        }
    }

    /// Move `date` by `n` units, clamping the day to the target month.
    ///
    /// `None` when the result falls outside the representable calendar.
    #[must_use]
    pub fn shift(self, date: NaiveDate, n: i32) -> Option<NaiveDate> {
        match self {
            Self::Day => date.checked_add_signed(Duration::days(i64::from(n))),
            Self::Week => date.checked_add_signed(Duration::weeks(i64::from(n))),
            Self::Month => add_months(date, n),
            Self::Quarter => add_months(date, n.checked_mul(3)?),
            Self::Year => add_months(date, n.checked_mul(12)?),
        }
    }

    /// The first day of the unit containing `date`.
    #[must_use]
    pub fn start_of(self, date: NaiveDate) -> NaiveDate {
        let first = |m: u32| NaiveDate::from_ymd_opt(date.year(), m, 1).unwrap_or(date);
        match self {
            Self::Day => date,
            Self::Week => date
                .checked_sub_signed(Duration::days(i64::from(
                    date.weekday().num_days_from_sunday(),
                )))
                .unwrap_or(NaiveDate::MIN),
            Self::Month => first(date.month()),
            Self::Quarter => first((date.month() - 1) / 3 * 3 + 1),
            Self::Year => first(1),
        }
    }
}

/// A half-open `[begin, end)` calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First day.
    pub begin: NaiveDate,
    /// First day after the range.
    pub end: NaiveDate,
}

impl DateRange {
    fn of(raw: &str, unit: Unit, begin: NaiveDate) -> Result<Self, DateError> {
        let end = unit
            .shift(begin, 1)
            .ok_or_else(|| DateError::OutOfRange(raw.to_string()))?;
        Ok(Self { begin, end })
    }

    /// Whether `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.begin && date < self.end
    }
}

const MONTHS: [(&str, u32); 23] = [
    ("jan", 1),
    ("january", 1),
    ("feb", 2),
    ("february", 2),
    ("mar", 3),
    ("march", 3),
    ("apr", 4),
    ("april", 4),
    ("may", 5),
    ("jun", 6),
    ("june", 6),
    ("jul", 7),
    ("july", 7),
    ("aug", 8),
    ("august", 8),
    ("sep", 9),
    ("september", 9),
    ("oct", 10),
    ("october", 10),
    ("nov", 11),
    ("november", 11),
    ("dec", 12),
    ("december", 12),
];

fn month_from_name(word: &str) -> Option<u32> {
    MONTHS.iter().find(|(name, _)| *name == word).map(|(_, m)| *m)
}

/// Promote a two-digit year into the century of `reference`.
#[must_use]
pub const fn expand_year(yy: i32, reference: i32) -> i32 {
    reference.div_euclid(100) * 100 + yy
}

const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Days in `month` of `year`.
#[must_use]
pub const fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

/// Add (or subtract) whole months, rolling the year over and clamping the
/// day to the length of the target month. `None` when the result falls
/// outside the representable calendar.
#[must_use]
pub fn add_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let total = i64::from(date.year()) * 12 + i64::from(date.month0()) + i64::from(months);
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

fn day_from(raw: &str, today: NaiveDate, days: i32) -> Result<NaiveDate, DateError> {
    Unit::Day
        .shift(today, days)
        .ok_or_else(|| DateError::OutOfRange(raw.to_string()))
}

fn ymd(raw: &str, year: i32, month: u32, day: u32) -> Result<NaiveDate, DateError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DateError::OutOfRange(raw.to_string()))
}

fn number<T: std::str::FromStr>(raw: &str, part: &str) -> Result<T, DateError> {
    part.parse().map_err(|_| DateError::Unrecognized(raw.to_string()))
}

/// Parse the numeric forms. `year` completes `MM/DD`; its century promotes
/// two-digit years.
fn parse_numeric(raw: &str, year: i32) -> Result<DateRange, DateError> {
    let parts: Vec<&str> = raw.split(['/', '-', '.']).collect();
    if parts
        .iter()
        .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(DateError::Unrecognized(raw.to_string()));
    }
    let full_year = |part: &str| -> Result<i32, DateError> {
        let y: i32 = number(raw, part)?;
        Ok(if part.len() <= 2 { expand_year(y, year) } else { y })
    };
    match parts.as_slice() {
        [y, m, d] => {
            let date = ymd(raw, full_year(y)?, number(raw, m)?, number(raw, d)?)?;
            DateRange::of(raw, Unit::Day, date)
        }
        [y, m] if y.len() == 4 => {
            let date = ymd(raw, number(raw, y)?, number(raw, m)?, 1)?;
            DateRange::of(raw, Unit::Month, date)
        }
        [m, d] => {
            let date = ymd(raw, year, number(raw, m)?, number(raw, d)?)?;
            DateRange::of(raw, Unit::Day, date)
        }
        [y] if y.len() == 4 => {
            let date = ymd(raw, number(raw, y)?, 1, 1)?;
            DateRange::of(raw, Unit::Year, date)
        }
        [m] if m.len() <= 2 => {
            let date = ymd(raw, year, number(raw, m)?, 1)?;
            DateRange::of(raw, Unit::Month, date)
        }
        _ => Err(DateError::Unrecognized(raw.to_string())),
    }
}

fn parse_relative(
    raw: &str,
    modifier: &str,
    unit: &str,
    today: NaiveDate,
) -> Result<DateRange, DateError> {
    let unit = Unit::parse(unit).ok_or_else(|| DateError::Unrecognized(raw.to_string()))?;
    let offset = match modifier {
        "last" => -1,
        "this" => 0,
        "next" => 1,
        _ => return Err(DateError::Unrecognized(raw.to_string())),
    };
    let begin = unit
        .shift(unit.start_of(today), offset)
        .ok_or_else(|| DateError::OutOfRange(raw.to_string()))?;
    DateRange::of(raw, unit, begin)
}

/// Resolve a date-spec to the calendar range it denotes.
///
/// ```
/// use chrono::NaiveDate;
/// use plainledger_parser::date::parse_range;
///
/// let today = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
/// let last = parse_range("last month", today).unwrap();
/// assert_eq!(last.begin, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
/// assert_eq!(last.end, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
/// ```
pub fn parse_range(input: &str, today: NaiveDate) -> Result<DateRange, DateError> {
    let raw = input.trim();
    if raw.is_empty() {
        return Err(DateError::Empty);
    }
    let lower = raw.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    match words.as_slice() {
        ["today"] => DateRange::of(raw, Unit::Day, today),
        ["yesterday"] => DateRange::of(raw, Unit::Day, day_from(raw, today, -1)?),
        ["tomorrow"] => DateRange::of(raw, Unit::Day, day_from(raw, today, 1)?),
        [modifier, unit] => parse_relative(raw, modifier, unit, today),
        [word] => match month_from_name(word) {
            Some(month) => DateRange::of(raw, Unit::Month, ymd(raw, today.year(), month, 1)?),
            None => parse_numeric(word, today.year()),
        },
        _ => Err(DateError::Unrecognized(raw.to_string())),
    }
}

/// Resolve a date-spec to a single calendar date, the first day it denotes.
///
/// ```
/// use chrono::NaiveDate;
/// use plainledger_parser::date::parse_date;
///
/// let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
/// let expected = NaiveDate::from_ymd_opt(2014, 1, 1).unwrap();
/// for spec in ["2014/01/01", "14/01/01", "14-01-01", "2014.01.01"] {
///     assert_eq!(parse_date(spec, today).unwrap(), expected);
/// }
/// assert!(parse_date("2013/02/29", today).is_err());
/// ```
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate, DateError> {
    parse_range(input, today).map(|r| r.begin)
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_time(input: &str) -> Result<NaiveTime, DateError> {
    let invalid = || DateError::InvalidTime(input.to_string());
    let parts = input
        .split(':')
        .map(|p| p.parse::<u32>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;
    let (h, m, s) = match parts.as_slice() {
        [h, m] => (*h, *m, 0),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(invalid()),
    };
    NaiveTime::from_hms_opt(h, m, s).ok_or_else(invalid)
}

/// Resolve a date-spec with an optional trailing `HH:MM[:SS]`.
///
/// Times are validated strictly: a leap second such as `23:59:60` is rejected.
pub fn parse_datetime(input: &str, today: NaiveDate) -> Result<NaiveDateTime, DateError> {
    let raw = input.trim();
    match raw.rsplit_once(char::is_whitespace) {
        Some((date, time)) if time.contains(':') => {
            Ok(parse_date(date, today)?.and_time(parse_time(time)?))
        }
        _ => Ok(parse_date(raw, today)?.and_time(NaiveTime::default())),
    }
}

/// Parse a journal date: `YYYY/MM/DD`, `YY/MM/DD`, or `MM/DD` completed with
/// `year` (the current `year` directive).
pub fn parse_journal_date(input: &str, year: i32) -> Result<NaiveDate, DateError> {
    let raw = input.trim();
    if raw.is_empty() {
        return Err(DateError::Empty);
    }
    let range = parse_numeric(raw, year)?;
    if Some(range.end) != Unit::Day.shift(range.begin, 1) {
        return Err(DateError::Unrecognized(raw.to_string()));
    }
    Ok(range.begin)
}
