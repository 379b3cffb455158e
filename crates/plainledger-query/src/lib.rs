//! Filter expressions for selecting accounts and payees.
//!
//! Report commands take free-form tokens such as `Expenses and not Food`.
//! This crate compiles them into a boolean tree of regular-expression matches.
//!
//! # Overview
//!
//! - `and` binds tighter than `or`
//! - `not` negates the whole expression that follows it
//! - adjacent terms with no keyword between them are OR'd
//! - leading `(` and trailing `)` on a token group terms
//!
//! # Example
//!
//! ```
//! use plainledger_query::compile;
//!
//! let filter = compile(&["not", "Expenses"]).unwrap().unwrap();
//! assert!(filter.matches("Income:Salary"));
//! assert!(!filter.matches("Expenses:Food"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
pub mod error;
pub mod parser;

pub use ast::FilterExpr;
pub use error::FilterError;
pub use parser::{compile, parse, preprocess};
