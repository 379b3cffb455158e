//! Running balance, debit and credit aggregates.

use std::collections::BTreeMap;

use crate::commodity::{Commodity, CommodityError};

/// Balance, debit and credit totals keyed by commodity name.
///
/// Entries are replaced on every update, never edited in place, so a clone
/// taken at any point stays a valid snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoubleEntry {
    balances: BTreeMap<String, Commodity>,
    debits: BTreeMap<String, Commodity>,
    credits: BTreeMap<String, Commodity>,
}

impl DoubleEntry {
    /// Create empty aggregates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a contribution into the aggregates.
    ///
    /// Non-negative contributions count as debits; negative contributions
    /// count as credits and are stored negated.
    pub fn add_balance(&mut self, commodity: &Commodity) -> Result<(), CommodityError> {
        Self::accumulate(&mut self.balances, commodity)?;
        if commodity.is_negative() {
            Self::accumulate(&mut self.credits, &commodity.invert())
        } else {
            Self::accumulate(&mut self.debits, commodity)
        }
    }

    fn accumulate(
        map: &mut BTreeMap<String, Commodity>,
        commodity: &Commodity,
    ) -> Result<(), CommodityError> {
        let next = match map.get(&commodity.name) {
            Some(existing) => {
                let mut sum = existing.make_similar(existing.amount);
                sum.add(commodity)?;
                sum
            }
            None => commodity.make_similar(commodity.amount),
        };
        map.insert(next.name.clone(), next);
        Ok(())
    }

    /// Current balance of one commodity.
    #[must_use]
    pub fn balance(&self, name: &str) -> Option<&Commodity> {
        self.balances.get(name)
    }

    /// Balances sorted by commodity name.
    #[must_use]
    pub fn balances(&self) -> Vec<&Commodity> {
        self.balances.values().collect()
    }

    /// Debit totals sorted by commodity name.
    #[must_use]
    pub fn debits(&self) -> Vec<&Commodity> {
        self.debits.values().collect()
    }

    /// Credit totals (stored positive) sorted by commodity name.
    #[must_use]
    pub fn credits(&self) -> Vec<&Commodity> {
        self.credits.values().collect()
    }

    /// True when no contribution has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_add_balance_creates_and_sums() {
        let mut de = DoubleEntry::new();
        de.add_balance(&Commodity::new("USD", dec!(10.00))).unwrap();
        de.add_balance(&Commodity::new("USD", dec!(-4.00))).unwrap();
        assert_eq!(de.balance("USD").unwrap().amount, dec!(6.00));
        assert_eq!(de.debits()[0].amount, dec!(10.00));
        assert_eq!(de.credits()[0].amount, dec!(4.00));
    }

    #[test]
    fn test_accessors_sorted_by_name() {
        let mut de = DoubleEntry::new();
        de.add_balance(&Commodity::new("USD", dec!(1))).unwrap();
        de.add_balance(&Commodity::new("AAPL", dec!(2))).unwrap();
        de.add_balance(&Commodity::new("EUR", dec!(3))).unwrap();
        let names: Vec<_> = de.balances().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["AAPL", "EUR", "USD"]);
    }

    #[test]
    fn test_mismatched_currency_flag_fails() {
        let mut de = DoubleEntry::new();
        de.add_balance(&Commodity::currency("$", dec!(1))).unwrap();
        assert!(de.add_balance(&Commodity::new("$", dec!(1))).is_err());
    }

    #[test]
    fn test_clone_is_independent_snapshot() {
        let mut de = DoubleEntry::new();
        de.add_balance(&Commodity::new("USD", dec!(5))).unwrap();
        let snapshot = de.clone();
        de.add_balance(&Commodity::new("USD", dec!(5))).unwrap();
        assert_eq!(snapshot.balance("USD").unwrap().amount, dec!(5));
        assert_eq!(de.balance("USD").unwrap().amount, dec!(10));
    }

    #[test]
    fn test_caller_value_not_aliased() {
        let mut de = DoubleEntry::new();
        let c = Commodity::new("USD", dec!(5));
        de.add_balance(&c).unwrap();
        de.add_balance(&c).unwrap();
        assert_eq!(c.amount, dec!(5));
        assert_eq!(de.balance("USD").unwrap().amount, dec!(10));
    }
}
