//! Journal parser for plainledger.
//!
//! This crate turns journal text into a stream of [`Directive`]s along with
//! any line-scoped parse errors, and hosts the date-spec and period grammars
//! used for report filtering.
//!
//! # Features
//!
//! - Transactions, postings and price lines
//! - `account`, `commodity` and `payee` blocks with their sub-directives
//! - `apply account`/`end`, `alias`, `year`, `bucket`, `capture`, `include`,
//!   `assert`, `check`, `define`, `fixed` and `test` directives
//! - Error recovery: a bad line is reported and parsing continues
//!
//! # Example
//!
//! ```
//! use plainledger_parser::parse;
//! use plainledger_core::Directive;
//!
//! let source = "\
//! 2024/01/15 * Coffee Shop
//!     Expenses:Food:Coffee  $5.00
//!     Assets:Cash
//! ";
//!
//! let result = parse(source);
//! assert!(result.errors.is_empty());
//! assert_eq!(result.directives.len(), 1);
//! let Directive::Transaction(txn) = &result.directives[0].value else { panic!() };
//! assert_eq!(txn.postings.len(), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod date;
mod error;
mod grammar;
pub mod lexer;
pub mod period;
mod span;

pub use date::{parse_date, parse_datetime, DateError, DateRange};
pub use error::{ParseError, ParseErrorKind};
pub use period::{parse_period, Interval, Period};
pub use span::{Span, Spanned};

use chrono::{Local, NaiveDate};
use plainledger_core::Directive;

/// Result of parsing a journal.
#[derive(Debug)]
pub struct ParseResult {
    /// Successfully parsed directives in source order.
    pub directives: Vec<Spanned<Directive>>,
    /// Parse errors encountered.
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// Check if any line failed to parse.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Parse journal source, completing partial dates with the current year.
pub fn parse(source: &str) -> ParseResult {
    parse_at(source, Local::now().date_naive())
}

/// Parse journal source as if today were `today`.
///
/// `today` only supplies the year for `MM/DD` dates until a `year`
/// directive overrides it.
pub fn parse_at(source: &str, today: NaiveDate) -> ParseResult {
    grammar::Grammar::new(source, today).run()
}
