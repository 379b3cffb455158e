//! Plain-text double-entry accounting from the command line.
//!
//! The `plainledger` binary reads one or more journals, runs them through
//! the two-pass engine in `plainledger-loader` and renders one report:
//!
//! - `balance`: account balances with parent subtotals
//! - `register`: postings in date order with a running total
//! - `accounts`: account names
//! - `stats`: journal statistics
//!
//! Every report takes a filter expression over account names.
//!
//! # Example Usage
//!
//! ```bash
//! plainledger -f household.ledger balance Expenses and not Food
//! plainledger -f household.ledger --period "in 2024" register Assets:Checking
//! plainledger -f household.ledger --pedantic accounts
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
pub mod report;
