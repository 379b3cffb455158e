//! Metadata attached to transactions and postings.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Metadata value types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetaValue {
    /// String value
    String(String),
    /// Numeric value
    Number(Decimal),
    /// Date value
    Date(NaiveDate),
}

impl MetaValue {
    /// Infer the narrowest variant for a raw `key: value` text.
    ///
    /// ```
    /// use plainledger_core::MetaValue;
    /// use rust_decimal_macros::dec;
    ///
    /// assert_eq!(MetaValue::infer("42.5"), MetaValue::Number(dec!(42.5)));
    /// assert!(matches!(MetaValue::infer("2024/01/15"), MetaValue::Date(_)));
    /// assert_eq!(MetaValue::infer("groceries"), MetaValue::String("groceries".into()));
    /// ```
    #[must_use]
    pub fn infer(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(n) = Decimal::from_str(raw) {
            return Self::Number(n);
        }
        for fmt in ["%Y/%m/%d", "%Y-%m-%d", "%Y.%m.%d"] {
            if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
                return Self::Date(d);
            }
        }
        Self::String(raw.to_string())
    }

    /// The string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y/%m/%d")),
        }
    }
}

/// Metadata is a key-value map attached to transactions and postings.
pub type Metadata = HashMap<String, MetaValue>;
