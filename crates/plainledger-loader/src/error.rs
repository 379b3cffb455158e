//! Ledger processing errors.

use chrono::NaiveDate;
use plainledger_booking::BalanceError;
use plainledger_core::CommodityError;
use plainledger_parser::ParseError;
use std::path::PathBuf;
use thiserror::Error;

use crate::datastore::Stage;

/// Errors that can occur while loading or processing a journal.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// IO error reading a file.
    #[error("failed to read file {path}: {source}")]
    Io {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Include cycle detected.
    #[error("include cycle detected: {}", .cycle.join(" -> "))]
    IncludeCycle {
        /// The cycle of file paths.
        cycle: Vec<String>,
    },

    /// Lines of a file did not match the grammar.
    #[error("{} parse error(s) in {path}", .errors.len())]
    Parse {
        /// The file with parse errors.
        path: PathBuf,
        /// The parse errors.
        errors: Vec<ParseError>,
    },

    /// Autobalancing failed.
    #[error("{date} {payee:?} (lines {}-{}): {source}", .lines.0, .lines.1)]
    Balance {
        /// Transaction date.
        date: NaiveDate,
        /// Transaction payee.
        payee: String,
        /// Source line range.
        lines: (usize, usize),
        /// What went wrong.
        #[source]
        source: BalanceError,
    },

    /// Arithmetic between differing commodities.
    #[error(transparent)]
    Commodity(#[from] CommodityError),

    /// No payee rule resolves an `Unknown` account placeholder.
    #[error("no payee rule resolves {account} for payee {payee:?}")]
    UnresolvedUnknownAccount {
        /// The placeholder as written.
        account: String,
        /// The payee that was matched.
        payee: String,
    },

    /// Dangling `end` or unclosed `apply account`.
    #[error("{0}")]
    DirectiveState(String),

    /// Undeclared account, commodity or payee in pedantic mode.
    #[error("undeclared {kind} {name:?}")]
    Pedantic {
        /// What was undeclared.
        kind: &'static str,
        /// Its name.
        name: String,
    },

    /// A capture, payee or alias regex failed to compile.
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The pattern text.
        pattern: String,
        /// The regex compiler error.
        #[source]
        source: regex::Error,
    },

    /// A pass was run out of order.
    #[error("cannot {action} at stage {found}, expected {expected}")]
    InvalidStage {
        /// The attempted operation.
        action: &'static str,
        /// Stage the operation requires.
        expected: Stage,
        /// Stage the datastore is in.
        found: Stage,
    },

    /// A reporter callback failed.
    #[error(transparent)]
    Reporter(#[from] anyhow::Error),
}
