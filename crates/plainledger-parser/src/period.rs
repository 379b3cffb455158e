//! Period expressions for report filtering.
//!
//! A period combines an optional recurrence interval with optional bounds:
//!
//! ```text
//! every 2 weeks from 2024/01/01 to 2024/03/01
//! monthly in 2024
//! since last quarter
//! ```

use chrono::NaiveDate;
use std::fmt;

use crate::date::{parse_range, DateError, Unit};

/// A recurrence interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// Calendar unit stepped by.
    pub unit: Unit,
    /// Number of units per step, at least one.
    pub count: u32,
}

impl Interval {
    /// An interval of `count` units.
    #[must_use]
    pub const fn new(unit: Unit, count: u32) -> Self {
        Self { unit, count }
    }

    fn from_adverb(word: &str) -> Option<Self> {
        let (unit, count) = match word {
            "daily" => (Unit::Day, 1),
            "weekly" => (Unit::Week, 1),
            "biweekly" => (Unit::Week, 2),
            "monthly" => (Unit::Month, 1),
            "bimonthly" => (Unit::Month, 2),
            "quarterly" => (Unit::Quarter, 1),
            "yearly" | "annually" => (Unit::Year, 1),
            _ => return None,
        };
        Some(Self::new(unit, count))
    }

    /// The date one interval after `date`, or `None` past the end of the
    /// representable calendar.
    #[must_use]
    pub fn advance(self, date: NaiveDate) -> Option<NaiveDate> {
        self.unit.shift(date, i32::try_from(self.count).ok()?)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            Unit::Day => "day",
            Unit::Week => "week",
            Unit::Month => "month",
            Unit::Quarter => "quarter",
            Unit::Year => "year",
        };
        if self.count == 1 {
            write!(f, "every {unit}")
        } else {
            write!(f, "every {} {unit}s", self.count)
        }
    }
}

/// A parsed period expression. Bounds are half-open: `begin` inclusive,
/// `end` exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Period {
    /// Recurrence interval, if any.
    pub interval: Option<Interval>,
    /// Inclusive lower bound.
    pub begin: Option<NaiveDate>,
    /// Exclusive upper bound.
    pub end: Option<NaiveDate>,
}

impl Period {
    /// Whether `date` lies within the bounds.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.begin.map_or(true, |b| date >= b) && self.end.map_or(true, |e| date < e)
    }

    /// Consecutive `[start, end)` buckets between the bounds.
    ///
    /// Both bounds are required; without an interval the whole period is a
    /// single bucket. The last bucket is truncated at `end`.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use plainledger_parser::period::parse_period;
    ///
    /// let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    /// let period = parse_period("monthly in 2024", today).unwrap();
    /// assert_eq!(period.buckets().count(), 12);
    /// ```
    #[must_use]
    pub fn buckets(&self) -> Buckets {
        let next = match (self.begin, self.end) {
            (Some(begin), Some(end)) if begin < end => Some(begin),
            _ => None,
        };
        Buckets {
            next,
            end: self.end.unwrap_or(NaiveDate::MAX),
            interval: self.interval,
        }
    }
}

/// Iterator returned by [`Period::buckets`].
#[derive(Debug, Clone)]
pub struct Buckets {
    next: Option<NaiveDate>,
    end: NaiveDate,
    interval: Option<Interval>,
}

impl Iterator for Buckets {
    type Item = (NaiveDate, NaiveDate);

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next?;
        let stop = match self.interval {
            Some(interval) => interval.advance(start).map_or(self.end, |d| d.min(self.end)),
            None => self.end,
        };
        self.next = (stop < self.end && stop > start).then_some(stop);
        Some((start, stop))
    }
}

const CLAUSE_WORDS: [&str; 7] = ["every", "in", "from", "since", "to", "until", "till"];

fn is_clause_word(word: &str) -> bool {
    CLAUSE_WORDS.contains(&word) || Interval::from_adverb(word).is_some()
}

/// Parse a period expression.
///
/// Clauses may come in any order: `every [N] UNIT` or an adverb such as
/// `monthly`; `in SPEC`; `from|since SPEC`; `to|until|till SPEC`. A bare
/// date-spec is read as `in SPEC`.
pub fn parse_period(input: &str, today: NaiveDate) -> Result<Period, DateError> {
    let invalid = || DateError::InvalidPeriod(input.trim().to_string());
    let lower = input.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    if words.is_empty() {
        return Err(DateError::Empty);
    }

    let mut period = Period::default();
    let mut i = 0;
    while i < words.len() {
        let word = words[i];
        if let Some(interval) = Interval::from_adverb(word) {
            period.interval = Some(interval);
            i += 1;
            continue;
        }
        if word == "every" {
            let (count, unit_at) = match words.get(i + 1).map(|w| w.parse::<u32>()) {
                Some(Ok(n)) => (n, i + 2),
                _ => (1, i + 1),
            };
            let unit = words
                .get(unit_at)
                .and_then(|w| Unit::parse(w))
                .ok_or_else(invalid)?;
            if count == 0 {
                return Err(invalid());
            }
            period.interval = Some(Interval::new(unit, count));
            i = unit_at + 1;
            continue;
        }

        let keyword = CLAUSE_WORDS.contains(&word).then_some(word);
        let start = if keyword.is_some() { i + 1 } else { i };
        let stop = (start..words.len())
            .find(|&j| is_clause_word(words[j]))
            .unwrap_or(words.len());
        if stop == start {
            return Err(invalid());
        }
        let range = parse_range(&words[start..stop].join(" "), today)?;
        match keyword {
            Some("from" | "since") => period.begin = Some(range.begin),
            Some("to" | "until" | "till") => period.end = Some(range.begin),
            _ => {
                period.begin = Some(range.begin);
                period.end = Some(range.end);
            }
        }
        i = stop;
    }
    Ok(period)
}
