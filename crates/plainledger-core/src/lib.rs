//! Core types for plainledger
//!
//! This crate provides the fundamental types shared by the grammar, the
//! balancing engine and the reporters:
//!
//! - [`Commodity`] - A decimal amount of a named commodity
//! - [`DoubleEntry`] - Balance, debit and credit aggregates per commodity
//! - [`Account`] - A colon-delimited account with its aggregates
//! - [`TimeStore`] - Timestamp-ordered store with range queries
//! - [`Transaction`], [`Posting`], [`Price`] - Journal entries
//! - [`Directive`] - Every raw node the grammar can produce
//!
//! # Example
//!
//! ```
//! use plainledger_core::{Account, Commodity};
//! use rust_decimal_macros::dec;
//!
//! let mut cash = Account::new("Assets:Cash");
//! cash.add_balance(&Commodity::currency("$", dec!(20.00))).unwrap();
//! cash.add_balance(&Commodity::currency("$", dec!(-5.00))).unwrap();
//!
//! assert_eq!(cash.balances()[0].to_string(), "$15.00");
//! assert_eq!(cash.credits()[0].to_string(), "$5.00");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod account;
pub mod commodity;
pub mod directive;
pub mod double_entry;
pub mod metadata;
pub mod timestore;

pub use account::{Account, AccountType};
pub use commodity::{Commodity, CommodityError, BALANCE_EPSILON};
pub use directive::{
    AccountDecl, AccountKind, CommodityDecl, Directive, PayeeDecl, Posting, PostingAccount, Price,
    State, Transaction,
};
pub use double_entry::DoubleEntry;
pub use metadata::{MetaValue, Metadata};
pub use timestore::{Inclusivity, TimeStore};

// Re-export commonly used external types
pub use chrono::{NaiveDate, NaiveDateTime};
pub use rust_decimal::Decimal;
