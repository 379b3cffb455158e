//! Append-only collection ordered by timestamp.
//!
//! Used for transactions and price declarations. Entries with equal
//! timestamps keep their insertion order.

use chrono::NaiveDateTime;

/// Which range boundaries are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Inclusivity {
    /// Exclude entries equal to either bound.
    None,
    /// Include entries equal to the low bound only.
    Low,
    /// Include entries equal to the high bound only.
    High,
    /// Include entries equal to either bound.
    #[default]
    Both,
}

impl Inclusivity {
    const fn low(self) -> bool {
        matches!(self, Self::Low | Self::Both)
    }

    const fn high(self) -> bool {
        matches!(self, Self::High | Self::Both)
    }
}

impl std::str::FromStr for Inclusivity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "low" => Ok(Self::Low),
            "high" => Ok(Self::High),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown inclusivity '{other}'")),
        }
    }
}

/// Timestamp-keyed entries kept in ascending order.
///
/// # Example
///
/// ```
/// use plainledger_core::{Inclusivity, TimeStore};
/// use chrono::NaiveDate;
///
/// let at = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap().and_hms_opt(0, 0, 0).unwrap();
///
/// let mut store = TimeStore::new();
/// store.insert(at(3), "c");
/// store.insert(at(1), "a");
/// store.insert(at(2), "b");
///
/// let all: Vec<_> = store.range(None, None, Inclusivity::Both).map(|(_, v)| *v).collect();
/// assert_eq!(all, vec!["a", "b", "c"]);
///
/// let inner: Vec<_> = store
///     .range(Some(at(1)), Some(at(3)), Inclusivity::None)
///     .map(|(_, v)| *v)
///     .collect();
/// assert_eq!(inner, vec!["b"]);
/// ```
#[derive(Debug, Clone)]
pub struct TimeStore<T> {
    entries: Vec<(NaiveDateTime, T)>,
}

impl<T> Default for TimeStore<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> TimeStore<T> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry after every entry with a timestamp `<= at`.
    pub fn insert(&mut self, at: NaiveDateTime, value: T) {
        let idx = self.entries.partition_point(|(ts, _)| *ts <= at);
        self.entries.insert(idx, (at, value));
    }

    /// Entries between `low` and `high`; `None` leaves that side unbounded.
    pub fn range(
        &self,
        low: Option<NaiveDateTime>,
        high: Option<NaiveDateTime>,
        inclusivity: Inclusivity,
    ) -> impl Iterator<Item = (&NaiveDateTime, &T)> {
        let start = match low {
            Some(low) if inclusivity.low() => self.entries.partition_point(|(ts, _)| *ts < low),
            Some(low) => self.entries.partition_point(|(ts, _)| *ts <= low),
            None => 0,
        };
        let end = match high {
            Some(high) if inclusivity.high() => {
                self.entries.partition_point(|(ts, _)| *ts <= high)
            }
            Some(high) => self.entries.partition_point(|(ts, _)| *ts < high),
            None => self.entries.len(),
        };
        let end = end.max(start);
        self.entries[start..end].iter().map(|(ts, v)| (ts, v))
    }

    /// All entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDateTime, &T)> {
        self.entries.iter().map(|(ts, v)| (ts, v))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
