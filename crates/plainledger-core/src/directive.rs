//! Journal nodes produced by the grammar.
//!
//! A journal is a sequence of [`Directive`]s. The most common one is the
//! [`Transaction`], a dated group of [`Posting`]s that must balance. The rest
//! configure accounts, commodities, payees and the name-rewriting tables used
//! when postings are resolved.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::Signed;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::commodity::Commodity;
use crate::metadata::{MetaValue, Metadata};

/// Clearing state of a transaction or posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    /// `*`
    Cleared,
    /// `!`
    Pending,
}

impl State {
    /// Parse a state marker.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '*' => Some(Self::Cleared),
            '!' => Some(Self::Pending),
            _ => None,
        }
    }

    /// The marker character.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Cleared => '*',
            Self::Pending => '!',
        }
    }
}

/// How an account was written on a posting line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountKind {
    /// `Account`
    #[default]
    Real,
    /// `(Account)`: virtual, exempt from balancing.
    Virtual,
    /// `[Account]`: virtual, must balance.
    BalancedVirtual,
}

impl AccountKind {
    /// Written inside parentheses or brackets.
    #[must_use]
    pub const fn is_virtual(self) -> bool {
        !matches!(self, Self::Real)
    }

    /// Participates in transaction balancing.
    #[must_use]
    pub const fn is_balanced(self) -> bool {
        !matches!(self, Self::Virtual)
    }
}

/// The account a posting refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostingAccount {
    /// A concrete account name.
    Named(String),
    /// Placeholder (`Unknown`, `Expenses:Unknown`) to be resolved from the
    /// payee table; `prefix` is whatever preceded `Unknown`.
    Unknown {
        /// Declared parent the resolved account must live under.
        prefix: Option<String>,
    },
}

impl PostingAccount {
    /// Literal placeholder segment.
    pub const UNKNOWN: &'static str = "Unknown";

    /// Classify a raw account name.
    ///
    /// ```
    /// use plainledger_core::PostingAccount;
    ///
    /// assert_eq!(
    ///     PostingAccount::parse("Expenses:Unknown"),
    ///     PostingAccount::Unknown { prefix: Some("Expenses".into()) }
    /// );
    /// assert_eq!(PostingAccount::parse("Unknown"), PostingAccount::Unknown { prefix: None });
    /// assert_eq!(PostingAccount::parse("Assets:Cash"), PostingAccount::Named("Assets:Cash".into()));
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw == Self::UNKNOWN {
            return Self::Unknown { prefix: None };
        }
        match raw.rsplit_once(crate::account::SEPARATOR) {
            Some((prefix, Self::UNKNOWN)) => Self::Unknown {
                prefix: Some(prefix.to_string()),
            },
            _ => Self::Named(raw.to_string()),
        }
    }

    /// The concrete name, if resolved.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Unknown { .. } => None,
        }
    }
}

impl fmt::Display for PostingAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::Unknown { prefix: Some(p) } => write!(f, "{p}:{}", Self::UNKNOWN),
            Self::Unknown { prefix: None } => write!(f, "{}", Self::UNKNOWN),
        }
    }
}

/// A posting within a transaction.
///
/// A posting without a commodity is the transaction's tally posting; its
/// amount is computed by autobalancing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Account reference, rewritten to the resolved name during the first pass.
    pub account: PostingAccount,
    /// Parenthesised/bracketed form.
    pub kind: AccountKind,
    /// Posting-level clearing state.
    pub state: Option<State>,
    /// The amount; `None` for the tally posting.
    pub commodity: Option<Commodity>,
    /// `{price}` or `{{total}}`.
    pub lot_price: Option<Commodity>,
    /// `[date]` following the lot price.
    pub lot_date: Option<NaiveDate>,
    /// `@ price` or `@@ total`.
    pub cost_price: Option<Commodity>,
    /// `= balance`.
    pub balance_price: Option<Commodity>,
    /// Trailing `; note` text.
    pub note: Option<String>,
    /// Inline tags.
    pub tags: Vec<String>,
    /// Posting metadata; lookups fall back to the transaction.
    pub meta: Metadata,
}

impl Posting {
    /// Create a posting with the given account and amount.
    #[must_use]
    pub fn new(account: impl AsRef<str>, commodity: Commodity) -> Self {
        Self {
            commodity: Some(commodity),
            ..Self::tally(account)
        }
    }

    /// Create a posting without an amount.
    #[must_use]
    pub fn tally(account: impl AsRef<str>) -> Self {
        Self {
            account: PostingAccount::parse(account.as_ref()),
            kind: AccountKind::Real,
            state: None,
            commodity: None,
            lot_price: None,
            lot_date: None,
            cost_price: None,
            balance_price: None,
            note: None,
            tags: Vec::new(),
            meta: Metadata::new(),
        }
    }

    /// Set the account kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: AccountKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the cost price.
    #[must_use]
    pub fn with_cost_price(mut self, price: Commodity) -> Self {
        self.cost_price = Some(price);
        self
    }

    /// Set the lot price.
    #[must_use]
    pub fn with_lot_price(mut self, price: Commodity) -> Self {
        self.lot_price = Some(price);
        self
    }

    /// Whether this is a tally posting.
    #[must_use]
    pub const fn is_tally(&self) -> bool {
        self.commodity.is_none()
    }

    /// Resolved account name, if any.
    #[must_use]
    pub fn account_name(&self) -> Option<&str> {
        self.account.name()
    }

    /// The value this posting contributes to balancing.
    ///
    /// A cost price wins over a lot price; a per-unit price is multiplied by
    /// the quantity, a total price takes the quantity's sign.
    #[must_use]
    pub fn cost_value(&self) -> Option<Commodity> {
        let commodity = self.commodity.as_ref()?;
        let price = self.cost_price.as_ref().or(self.lot_price.as_ref());
        let value = match price {
            Some(p) if p.total => p.make_similar(p.amount.abs() * commodity.amount.signum()),
            Some(p) => p.make_similar(p.amount * commodity.amount),
            None => return Some(commodity.clone()),
        };
        Some(value.with_total(false).with_fixprice(false))
    }

    /// Metadata lookup with fallback to the owning transaction.
    #[must_use]
    pub fn meta_value<'a>(&'a self, txn: &'a Transaction, key: &str) -> Option<&'a MetaValue> {
        self.meta.get(key).or_else(|| txn.meta.get(key))
    }

    /// Payee for this posting: a `payee` metadata override or the transaction's.
    #[must_use]
    pub fn payee<'a>(&'a self, txn: &'a Transaction) -> &'a str {
        self.meta
            .get("payee")
            .and_then(MetaValue::as_str)
            .unwrap_or(&txn.payee)
    }

    /// Posting state, falling back to the transaction's.
    #[must_use]
    pub fn effective_state(&self, txn: &Transaction) -> Option<State> {
        self.state.or(txn.state)
    }
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "    ")?;
        if let Some(state) = self.state {
            write!(f, "{} ", state.as_char())?;
        }
        match self.kind {
            AccountKind::Real => write!(f, "{}", self.account)?,
            AccountKind::Virtual => write!(f, "({})", self.account)?,
            AccountKind::BalancedVirtual => write!(f, "[{}]", self.account)?,
        }
        if let Some(c) = &self.commodity {
            write!(f, "  {c}")?;
        }
        if let Some(p) = &self.lot_price {
            if p.total {
                write!(f, " {{{{{p}}}}}")?;
            } else {
                write!(f, " {{{p}}}")?;
            }
        }
        if let Some(d) = &self.lot_date {
            write!(f, " [{}]", d.format("%Y/%m/%d"))?;
        }
        if let Some(p) = &self.cost_price {
            let at = if p.total { "@@" } else { "@" };
            write!(f, " {at} {p}")?;
        }
        if let Some(p) = &self.balance_price {
            write!(f, " = {p}")?;
        }
        if let Some(note) = &self.note {
            write!(f, "  ; {note}")?;
        }
        Ok(())
    }
}

/// A dated, payee-tagged group of postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Primary date.
    pub date: NaiveDate,
    /// Effective date (`DATE=EDATE`).
    pub edate: Option<NaiveDate>,
    /// Clearing state.
    pub state: Option<State>,
    /// `(CODE)`.
    pub code: Option<String>,
    /// Payee text.
    pub payee: String,
    /// Header `; note`.
    pub note: Option<String>,
    /// Inline tags.
    pub tags: Vec<String>,
    /// Transaction metadata.
    pub meta: Metadata,
    /// Postings in journal order.
    pub postings: Vec<Posting>,
    /// First and last source line (1-based, inclusive).
    pub lines: (usize, usize),
    /// Hex SHA-256 over the source lines, empty when built by hand.
    pub fingerprint: String,
}

impl Transaction {
    /// Create a new transaction.
    #[must_use]
    pub fn new(date: NaiveDate, payee: impl Into<String>) -> Self {
        Self {
            date,
            edate: None,
            state: None,
            code: None,
            payee: payee.into(),
            note: None,
            tags: Vec::new(),
            meta: Metadata::new(),
            postings: Vec::new(),
            lines: (0, 0),
            fingerprint: String::new(),
        }
    }

    /// Add a posting.
    #[must_use]
    pub fn with_posting(mut self, posting: Posting) -> Self {
        self.postings.push(posting);
        self
    }

    /// Set the state.
    #[must_use]
    pub const fn with_state(mut self, state: State) -> Self {
        self.state = Some(state);
        self
    }

    /// Timestamp used for ordering in a time store.
    #[must_use]
    pub fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(NaiveTime::default())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y/%m/%d"))?;
        if let Some(edate) = self.edate {
            write!(f, "={}", edate.format("%Y/%m/%d"))?;
        }
        if let Some(state) = self.state {
            write!(f, " {}", state.as_char())?;
        }
        if let Some(code) = &self.code {
            write!(f, " ({code})")?;
        }
        write!(f, " {}", self.payee)?;
        if let Some(note) = &self.note {
            write!(f, "  ; {note}")?;
        }
        for posting in &self.postings {
            write!(f, "\n{posting}")?;
        }
        Ok(())
    }
}

/// A `P DATE SYMBOL AMOUNT` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// When the price was recorded.
    pub when: NaiveDateTime,
    /// The commodity being priced.
    pub commodity: String,
    /// Its value.
    pub value: Commodity,
}

/// An `account` directive and its sub-lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDecl {
    /// Declared name.
    pub name: String,
    /// `note`
    pub note: Option<String>,
    /// `alias`
    pub aliases: Vec<String>,
    /// `payee` regular expressions.
    pub payees: Vec<String>,
    /// `check`
    pub checks: Vec<String>,
    /// `assert`
    pub asserts: Vec<String>,
    /// `eval`
    pub evals: Vec<String>,
    /// `type`
    pub types: Vec<String>,
    /// `default`
    pub is_default: bool,
}

/// A `commodity` directive and its sub-lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommodityDecl {
    /// Declared symbol.
    pub name: String,
    /// `note`
    pub note: Option<String>,
    /// `format` sample amount.
    pub format: Option<Commodity>,
    /// `nomarket`
    pub nomarket: bool,
    /// `default`
    pub is_default: bool,
    /// `currency`: rendered as a prefix symbol.
    pub currency: bool,
}

/// A `payee` directive and its sub-lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayeeDecl {
    /// Canonical payee name.
    pub name: String,
    /// `alias` regular expressions rewritten to `name`.
    pub aliases: Vec<String>,
    /// `uuid`
    pub uuid: Option<String>,
}

/// A raw journal node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    /// Transaction header plus postings.
    Transaction(Transaction),
    /// `P DATE SYMBOL AMOUNT`
    Price(Price),
    /// `account NAME`
    Account(AccountDecl),
    /// `apply account NAME`
    ApplyAccount(String),
    /// `end` / `end apply account`
    End,
    /// `alias NAME=ACCOUNT`
    Alias {
        /// Short name.
        name: String,
        /// Account it stands for.
        account: String,
    },
    /// `year YYYY`
    Year(i32),
    /// `bucket ACCOUNT`
    Bucket(String),
    /// `capture ACCOUNT REGEX`
    Capture {
        /// Account substituted on match.
        account: String,
        /// Regular expression matched against posting accounts.
        pattern: String,
    },
    /// `commodity SYMBOL`
    Commodity(CommodityDecl),
    /// `payee NAME`
    Payee(PayeeDecl),
    /// `include PATH`
    Include(String),
    /// `assert EXPR`
    Assert(String),
    /// `check EXPR`
    Check(String),
    /// `define NAME=EXPR`
    Define {
        /// Variable name.
        name: String,
        /// Unevaluated expression text.
        expr: String,
    },
    /// `fixed SYMBOL AMOUNT`
    Fixed {
        /// Commodity being fixated.
        commodity: String,
        /// Its fixed price.
        price: Commodity,
    },
    /// `test ... end test` block, kept verbatim.
    Test(String),
    /// Comment line.
    Comment(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cost_value_plain() {
        let p = Posting::new("Assets:Cash", Commodity::new("USD", dec!(10)));
        assert_eq!(p.cost_value().unwrap().amount, dec!(10));
    }

    #[test]
    fn test_cost_value_per_unit() {
        let p = Posting::new("Assets:Broker", Commodity::new("AAPL", dec!(-3)))
            .with_cost_price(Commodity::currency("$", dec!(150.00)));
        let v = p.cost_value().unwrap();
        assert_eq!(v.name, "$");
        assert_eq!(v.amount, dec!(-450.00));
    }

    #[test]
    fn test_cost_value_total_takes_sign() {
        let p = Posting::new("Assets:Broker", Commodity::new("AAPL", dec!(-3)))
            .with_cost_price(Commodity::currency("$", dec!(450)).with_total(true));
        assert_eq!(p.cost_value().unwrap().amount, dec!(-450));
    }

    #[test]
    fn test_cost_price_wins_over_lot_price() {
        let p = Posting::new("Assets:Broker", Commodity::new("AAPL", dec!(2)))
            .with_lot_price(Commodity::currency("$", dec!(100)))
            .with_cost_price(Commodity::currency("$", dec!(120)));
        assert_eq!(p.cost_value().unwrap().amount, dec!(240));
    }

    #[test]
    fn test_tally_has_no_cost_value() {
        assert!(Posting::tally("Assets:Cash").cost_value().is_none());
    }

    #[test]
    fn test_meta_falls_back_to_transaction() {
        let mut txn = Transaction::new(date(2024, 1, 1), "Grocer");
        txn.meta.insert("project".into(), MetaValue::String("home".into()));
        let mut p = Posting::tally("Expenses:Food");
        assert_eq!(p.meta_value(&txn, "project").and_then(MetaValue::as_str), Some("home"));
        p.meta.insert("project".into(), MetaValue::String("work".into()));
        assert_eq!(p.meta_value(&txn, "project").and_then(MetaValue::as_str), Some("work"));
        assert!(p.meta_value(&txn, "missing").is_none());
    }

    #[test]
    fn test_posting_payee_override() {
        let txn = Transaction::new(date(2024, 1, 1), "Grocer");
        let mut p = Posting::tally("Expenses:Food");
        assert_eq!(p.payee(&txn), "Grocer");
        p.meta.insert("payee".into(), MetaValue::String("Bakery".into()));
        assert_eq!(p.payee(&txn), "Bakery");
    }

    #[test]
    fn test_effective_state() {
        let txn = Transaction::new(date(2024, 1, 1), "x").with_state(State::Cleared);
        let mut p = Posting::tally("A");
        assert_eq!(p.effective_state(&txn), Some(State::Cleared));
        p.state = Some(State::Pending);
        assert_eq!(p.effective_state(&txn), Some(State::Pending));
    }

    #[test]
    fn test_kind_flags() {
        assert!(AccountKind::Virtual.is_virtual());
        assert!(!AccountKind::Virtual.is_balanced());
        assert!(AccountKind::BalancedVirtual.is_balanced());
        assert!(!AccountKind::Real.is_virtual());
    }

    #[test]
    fn test_display_transaction() {
        let txn = Transaction::new(date(2024, 2, 3), "Cafe")
            .with_state(State::Cleared)
            .with_posting(Posting::new("Expenses:Coffee", Commodity::currency("$", dec!(4.50))))
            .with_posting(Posting::tally("Assets:Cash"));
        let text = txn.to_string();
        assert!(text.starts_with("2024/02/03 * Cafe"));
        assert!(text.contains("Expenses:Coffee  $4.50"));
    }
}
