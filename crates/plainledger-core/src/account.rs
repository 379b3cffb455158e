//! Hierarchical accounts.
//!
//! Account names are colon-delimited paths (`Expenses:Food:Dining`). Every
//! account carries its own [`DoubleEntry`] aggregates plus whatever an
//! `account` directive declared about it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::commodity::{Commodity, CommodityError};
use crate::double_entry::DoubleEntry;

/// Separator between account name segments.
pub const SEPARATOR: char = ':';

/// Account classification declared with a `type` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Assets (debit-normal).
    Asset,
    /// Liabilities (credit-normal).
    Liability,
    /// Equity or capital (credit-normal).
    Equity,
    /// Income (credit-normal).
    Income,
    /// Expenses (debit-normal).
    Expense,
}

impl AccountType {
    /// Parse a declared type, accepting the usual singular/plural spellings.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asset" | "assets" => Some(Self::Asset),
            "liability" | "liabilities" => Some(Self::Liability),
            "equity" | "capital" => Some(Self::Equity),
            "income" | "revenue" => Some(Self::Income),
            "expense" | "expenses" | "expenditure" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Whether the account normally carries a debit balance.
    #[must_use]
    pub const fn is_debit_normal(self) -> bool {
        matches!(self, Self::Asset | Self::Expense)
    }
}

/// An account with its declaration metadata and running aggregates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    /// Full colon path.
    pub name: String,
    /// Declared with parentheses or brackets.
    pub is_virtual: bool,
    /// Participates in transaction balancing.
    pub balanced: bool,
    /// Declared by an `account` directive.
    pub declared: bool,
    /// `note` line.
    pub note: Option<String>,
    /// `alias` lines.
    pub aliases: Vec<String>,
    /// `payee` lines (regular expressions).
    pub payees: Vec<String>,
    /// `check` expressions.
    pub checks: Vec<String>,
    /// `assert` expressions.
    pub asserts: Vec<String>,
    /// `eval` expressions.
    pub evals: Vec<String>,
    /// `type` lines.
    pub types: Vec<AccountType>,
    /// Marked with `default`, i.e. the bucket account.
    pub is_default: bool,
    entry: DoubleEntry,
}

impl Account {
    /// A plain (non-virtual, balanced) account.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            balanced: true,
            ..Self::default()
        }
    }

    /// Set the virtual/balanced flags.
    #[must_use]
    pub const fn with_flags(mut self, is_virtual: bool, balanced: bool) -> Self {
        self.is_virtual = is_virtual;
        self.balanced = balanced;
        self
    }

    /// Fold a posting's contribution into this account.
    pub fn add_balance(&mut self, commodity: &Commodity) -> Result<(), CommodityError> {
        self.entry.add_balance(commodity)
    }

    /// The account's aggregates.
    #[must_use]
    pub const fn double_entry(&self) -> &DoubleEntry {
        &self.entry
    }

    /// Balances sorted by commodity name.
    #[must_use]
    pub fn balances(&self) -> Vec<&Commodity> {
        self.entry.balances()
    }

    /// Debits sorted by commodity name.
    #[must_use]
    pub fn debits(&self) -> Vec<&Commodity> {
        self.entry.debits()
    }

    /// Credits sorted by commodity name.
    #[must_use]
    pub fn credits(&self) -> Vec<&Commodity> {
        self.entry.credits()
    }

    /// Debit-normal unless a credit-normal type was declared.
    #[must_use]
    pub fn is_debit_normal(&self) -> bool {
        self.types.first().map_or(true, |t| t.is_debit_normal())
    }

    /// Number of segments in the name.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.name.split(SEPARATOR).count()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.is_virtual, self.balanced) {
            (true, false) => write!(f, "({})", self.name),
            (true, true) => write!(f, "[{}]", self.name),
            _ => write!(f, "{}", self.name),
        }
    }
}

/// The immediate parent of an account name.
///
/// ```
/// use plainledger_core::account::parent;
/// assert_eq!(parent("Expenses:Food:Dining"), Some("Expenses:Food"));
/// assert_eq!(parent("Expenses"), None);
/// ```
#[must_use]
pub fn parent(name: &str) -> Option<&str> {
    name.rfind(SEPARATOR).map(|i| &name[..i])
}

/// Strict ancestors of an account name, nearest first.
#[must_use]
pub fn ancestors(name: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut current = name;
    while let Some(p) = parent(current) {
        out.push(p);
        current = p;
    }
    out
}

/// Join a root prefix and a name.
#[must_use]
pub fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else if name.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}{SEPARATOR}{name}")
    }
}

/// Whether `name` equals `prefix` or lies beneath it.
#[must_use]
pub fn has_prefix(name: &str, prefix: &str) -> bool {
    name == prefix
        || (name.starts_with(prefix) && name[prefix.len()..].starts_with(SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ancestors_nearest_first() {
        assert_eq!(
            ancestors("Assets:Bank:Checking"),
            vec!["Assets:Bank", "Assets"]
        );
        assert!(ancestors("Assets").is_empty());
    }

    #[test]
    fn test_join() {
        assert_eq!(join("Personal", "Expenses:Food"), "Personal:Expenses:Food");
        assert_eq!(join("", "Expenses"), "Expenses");
    }

    #[test]
    fn test_has_prefix() {
        assert!(has_prefix("Expenses:Food", "Expenses"));
        assert!(has_prefix("Expenses", "Expenses"));
        assert!(!has_prefix("ExpensesX:Food", "Expenses"));
        assert!(!has_prefix("Income", "Expenses"));
    }

    #[test]
    fn test_display_forms() {
        assert_eq!(Account::new("A:B").to_string(), "A:B");
        assert_eq!(Account::new("A").with_flags(true, false).to_string(), "(A)");
        assert_eq!(Account::new("A").with_flags(true, true).to_string(), "[A]");
    }

    #[test]
    fn test_account_type_parse() {
        assert_eq!(AccountType::parse("Assets"), Some(AccountType::Asset));
        assert_eq!(AccountType::parse(" liability "), Some(AccountType::Liability));
        assert_eq!(AccountType::parse("bogus"), None);
    }

    #[test]
    fn test_debit_normal_from_type() {
        let mut acc = Account::new("Income:Salary");
        assert!(acc.is_debit_normal());
        acc.types.push(AccountType::Income);
        assert!(!acc.is_debit_normal());
    }

    #[test]
    fn test_add_balance() {
        let mut acc = Account::new("Assets:Cash");
        acc.add_balance(&Commodity::currency("$", dec!(3))).unwrap();
        acc.add_balance(&Commodity::currency("$", dec!(-1))).unwrap();
        assert_eq!(acc.balances()[0].amount, dec!(2));
        assert_eq!(acc.debits()[0].amount, dec!(3));
        assert_eq!(acc.credits()[0].amount, dec!(1));
    }
}
