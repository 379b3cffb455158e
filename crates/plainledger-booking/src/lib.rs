//! Transaction balancing for plainledger.
//!
//! This crate provides:
//! - The balancing predicate (which transactions must balance)
//! - Residual calculation over cost-valued postings
//! - Autobalancing (filling in the tally posting)
//!
//! # Autobalance
//!
//! When a transaction has exactly one posting without an amount, that amount
//! is calculated to make the transaction balance.
//!
//! ```
//! use plainledger_booking::autobalance;
//! use plainledger_core::{Commodity, NaiveDate, Posting, Transaction};
//! use rust_decimal_macros::dec;
//!
//! let mut txn = Transaction::new(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), "Groceries")
//!     .with_posting(Posting::new("Expenses:Food", Commodity::currency("$", dec!(50.00))))
//!     .with_posting(Posting::tally("Assets:Cash"));
//!
//! let filled = autobalance(&mut txn, None, &Commodity::currency("$", dec!(0))).unwrap();
//! assert_eq!(filled, vec![1]);
//! assert_eq!(txn.postings[1].commodity.as_ref().unwrap().amount, dec!(-50.00));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod autobalance;

pub use autobalance::{autobalance, BalanceError};

use plainledger_core::{AccountKind, Commodity, CommodityError, Transaction};
use std::collections::BTreeMap;

/// Check whether a transaction is subject to balancing.
///
/// A single `(Account)` posting exempts the whole transaction.
#[must_use]
pub fn requires_balancing(transaction: &Transaction) -> bool {
    !transaction
        .postings
        .iter()
        .any(|p| p.kind == AccountKind::Virtual)
}

/// Calculate the residual (imbalance) of a transaction.
///
/// Sums the cost value of every posting that carries an amount, per
/// commodity name, and returns the nets sorted by name. Tally postings are
/// skipped.
pub fn calculate_residual(transaction: &Transaction) -> Result<Vec<Commodity>, CommodityError> {
    let mut residuals: BTreeMap<String, Commodity> = BTreeMap::new();

    for value in transaction.postings.iter().filter_map(|p| p.cost_value()) {
        match residuals.get_mut(&value.name) {
            Some(sum) => sum.add(&value)?,
            None => {
                residuals.insert(value.name.clone(), value);
            }
        }
    }

    Ok(residuals.into_values().collect())
}

/// The residual entries outside the balancing tolerance.
pub fn unbalanced(transaction: &Transaction) -> Result<Vec<Commodity>, CommodityError> {
    Ok(calculate_residual(transaction)?
        .into_iter()
        .filter(|c| !c.is_balanced())
        .collect())
}

/// Check if a transaction is complete and balanced within tolerance.
pub fn is_balanced(transaction: &Transaction) -> Result<bool, CommodityError> {
    if transaction.postings.iter().any(|p| p.is_tally()) {
        return Ok(false);
    }
    Ok(unbalanced(transaction)?.is_empty())
}
