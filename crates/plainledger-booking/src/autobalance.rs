//! Transaction autobalancing.
//!
//! Fills in the tally posting, or a bucket posting, so that a transaction
//! balances.

use plainledger_core::{Commodity, CommodityError, Posting, Transaction};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::unbalanced;

/// Errors that can occur during autobalancing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    /// The transaction has no postings.
    #[error("transaction has no postings")]
    EmptyTransaction,

    /// The transaction cannot be made to balance.
    #[error("transaction does not balance: residual {residual}")]
    UnbalancedTransaction {
        /// Rendered residual amounts.
        residual: String,
    },

    /// More than one posting is missing its amount.
    #[error("{count} postings without an amount, at most one is allowed")]
    MultipleNullPostings {
        /// Number of tally postings.
        count: usize,
    },

    /// Postings mix a commodity name with different currency flags.
    #[error(transparent)]
    Commodity(#[from] CommodityError),
}

impl BalanceError {
    fn unbalanced(residual: &[Commodity]) -> Self {
        let residual = residual
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Self::UnbalancedTransaction { residual }
    }
}

/// Autobalance a transaction in place.
///
/// `bucket` is the account that absorbs a lone posting; `default_commodity`
/// supplies the commodity given to a tally posting when nothing is left to
/// balance.
///
/// # Rules
///
/// - A transaction without postings fails.
/// - A lone posting is offset on the bucket account, or fails without one.
/// - At most one posting may omit its amount.
/// - Residuals within the balancing tolerance are ignored.
/// - The tally posting takes the negation of the first residual (by
///   commodity name); each further residual is offset by a new posting on
///   the tally posting's account.
/// - Without a tally posting, a single residual fails; several residuals
///   leave the transaction untouched.
///
/// Returns the indices of postings whose amounts were filled in or appended.
pub fn autobalance(
    transaction: &mut Transaction,
    bucket: Option<&str>,
    default_commodity: &Commodity,
) -> Result<Vec<usize>, BalanceError> {
    if transaction.postings.is_empty() {
        return Err(BalanceError::EmptyTransaction);
    }
    if transaction.postings.len() == 1 {
        let value = transaction.postings[0].cost_value();
        return match (bucket, value) {
            (Some(account), Some(value)) => {
                transaction
                    .postings
                    .push(Posting::new(account, value.invert()));
                Ok(vec![1])
            }
            (_, value) => Err(BalanceError::unbalanced(value.as_slice())),
        };
    }

    let tallies: Vec<usize> = transaction
        .postings
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_tally())
        .map(|(i, _)| i)
        .collect();
    if tallies.len() > 1 {
        return Err(BalanceError::MultipleNullPostings {
            count: tallies.len(),
        });
    }
    let tally = tallies.first().copied();
    let residual = unbalanced(transaction)?;

    match (tally, residual.as_slice()) {
        (None, []) => Ok(Vec::new()),
        (Some(i), []) => {
            transaction.postings[i].commodity = Some(default_commodity.make_similar(Decimal::ZERO));
            Ok(vec![i])
        }
        (None, [_]) => Err(BalanceError::unbalanced(&residual)),
        (None, _) => Ok(Vec::new()),
        (Some(i), [first, rest @ ..]) => {
            let mut filled = vec![i];
            for value in rest {
                let mut offset = transaction.postings[i].clone();
                offset.commodity = Some(value.invert());
                filled.push(transaction.postings.len());
                transaction.postings.push(offset);
            }
            transaction.postings[i].commodity = Some(first.invert());
            Ok(filled)
        }
    }
}
