//! Ledger state shared by both passes.

use chrono::NaiveDate;
use plainledger_core::{
    account, Account, AccountKind, AccountType, Commodity, CommodityDecl, Directive, PayeeDecl,
    Price, TimeStore, Transaction,
};
use plainledger_parser::Span;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, warn};

use crate::{LedgerError, Options};

/// Processing stage of a [`Datastore`].
///
/// Stages only move forward: `Parsed` → `Firstpass` → `Secondpass` →
/// `Rendered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Created; no pass has run.
    Parsed,
    /// Resolution and balancing done.
    Firstpass,
    /// Balances accumulated.
    Secondpass,
    /// Reports rendered.
    Rendered,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parsed => "parsed",
            Self::Firstpass => "firstpass",
            Self::Secondpass => "secondpass",
            Self::Rendered => "rendered",
        };
        f.write_str(name)
    }
}

/// A declared payee with its compiled `alias` patterns.
#[derive(Debug, Clone)]
pub(crate) struct PayeeRule {
    pub(crate) name: String,
    pub(crate) patterns: Vec<Regex>,
    pub(crate) uuid: Option<String>,
}

/// Counts describing a processed journal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Transactions stored.
    pub transactions: usize,
    /// Postings across all transactions.
    pub postings: usize,
    /// Accounts, including implied parents.
    pub accounts: usize,
    /// Distinct commodities.
    pub commodities: usize,
    /// Price declarations.
    pub prices: usize,
    /// Transactions whose source text repeats an earlier one.
    pub duplicates: usize,
    /// Earliest transaction date.
    pub first: Option<NaiveDate>,
    /// Latest transaction date.
    pub last: Option<NaiveDate>,
}

/// Accounts, commodities, directive state and the time-ordered stores.
///
/// Cloning yields an isolated copy; the second pass runs on a clone so that
/// its accumulation never touches first-pass state.
#[derive(Debug, Clone)]
pub struct Datastore {
    pub(crate) stage: Stage,
    pub(crate) options: Options,
    pub(crate) accounts: BTreeMap<String, Account>,
    /// Zero-valued sample of every commodity seen, keyed by name.
    pub(crate) commodities: BTreeMap<String, Commodity>,
    pub(crate) commodity_decls: BTreeMap<String, CommodityDecl>,
    pub(crate) default_commodity: Option<String>,
    pub(crate) first_commodity: Option<String>,
    /// `alias X=Y` directives; targets are prefixed with the active root.
    pub(crate) aliases: HashMap<String, String>,
    /// `alias` lines of `account` declarations, mapped to full names.
    pub(crate) account_aliases: HashMap<String, String>,
    pub(crate) payees: Vec<PayeeRule>,
    /// `payee` lines of `account` declarations.
    pub(crate) account_payees: Vec<(Regex, String)>,
    pub(crate) captures: Vec<(Regex, String)>,
    pub(crate) rootstack: Vec<String>,
    pub(crate) bucket: Option<String>,
    pub(crate) defines: BTreeMap<String, String>,
    pub(crate) fixed: BTreeMap<String, Commodity>,
    pub(crate) assertions: Vec<String>,
    pub(crate) transactions: TimeStore<Transaction>,
    pub(crate) prices: TimeStore<Price>,
    pub(crate) fingerprints: HashMap<String, usize>,
}

impl Datastore {
    /// Create an empty datastore.
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            stage: Stage::Parsed,
            options,
            accounts: BTreeMap::new(),
            commodities: BTreeMap::new(),
            commodity_decls: BTreeMap::new(),
            default_commodity: None,
            first_commodity: None,
            aliases: HashMap::new(),
            account_aliases: HashMap::new(),
            payees: Vec::new(),
            account_payees: Vec::new(),
            captures: Vec::new(),
            rootstack: Vec::new(),
            bucket: None,
            defines: BTreeMap::new(),
            fixed: BTreeMap::new(),
            assertions: Vec::new(),
            transactions: TimeStore::new(),
            prices: TimeStore::new(),
            fingerprints: HashMap::new(),
        }
    }

    /// Current stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// The options this datastore was created with.
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Look up an account by resolved name.
    #[must_use]
    pub fn account(&self, name: &str) -> Option<&Account> {
        self.accounts.get(name)
    }

    /// All accounts, sorted by name.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Zero-valued sample of a commodity, carrying its display settings.
    #[must_use]
    pub fn commodity(&self, name: &str) -> Option<&Commodity> {
        self.commodities.get(name)
    }

    /// Samples of every commodity seen, sorted by name.
    pub fn commodities(&self) -> impl Iterator<Item = &Commodity> {
        self.commodities.values()
    }

    /// A `commodity` declaration.
    #[must_use]
    pub fn commodity_decl(&self, name: &str) -> Option<&CommodityDecl> {
        self.commodity_decls.get(name)
    }

    /// Zero amount of the declared default commodity, else of the first
    /// commodity seen.
    #[must_use]
    pub fn default_commodity(&self) -> Commodity {
        let Some(name) = self
            .default_commodity
            .as_ref()
            .or(self.first_commodity.as_ref())
        else {
            return Commodity::new("", Decimal::ZERO);
        };
        if let Some(sample) = self.commodities.get(name) {
            return sample.make_similar(Decimal::ZERO);
        }
        let mut value = Commodity::new(name.clone(), Decimal::ZERO);
        value.currency = self.commodity_decls.get(name).is_some_and(|d| d.currency);
        value
    }

    /// The account absorbing lone postings.
    #[must_use]
    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    /// The active `apply account` prefix, empty when none.
    #[must_use]
    pub fn root(&self) -> String {
        self.rootstack
            .iter()
            .fold(String::new(), |root, name| account::join(&root, name))
    }

    /// Transactions in date order.
    #[must_use]
    pub const fn transactions(&self) -> &TimeStore<Transaction> {
        &self.transactions
    }

    /// Price declarations in date order.
    #[must_use]
    pub const fn prices(&self) -> &TimeStore<Price> {
        &self.prices
    }

    /// A `define`d expression.
    #[must_use]
    pub fn define(&self, name: &str) -> Option<&str> {
        self.defines.get(name).map(String::as_str)
    }

    /// A `fixed` price.
    #[must_use]
    pub fn fixed_price(&self, commodity: &str) -> Option<&Commodity> {
        self.fixed.get(commodity)
    }

    /// `assert` and `check` expressions, unevaluated.
    #[must_use]
    pub fn assertions(&self) -> &[String] {
        &self.assertions
    }

    /// Names of declared payees.
    pub fn payees(&self) -> impl Iterator<Item = &str> {
        self.payees.iter().map(|p| p.name.as_str())
    }

    /// The `uuid` of a declared payee.
    #[must_use]
    pub fn payee_uuid(&self, name: &str) -> Option<&str> {
        self.payees
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.uuid.as_deref())
    }

    /// Counts describing the stored journal.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        Statistics {
            transactions: self.transactions.len(),
            postings: self.transactions.iter().map(|(_, t)| t.postings.len()).sum(),
            accounts: self.accounts.len(),
            commodities: self.commodities.len(),
            prices: self.prices.len(),
            duplicates: self
                .fingerprints
                .values()
                .map(|n| n.saturating_sub(1))
                .sum(),
            first: self.transactions.iter().next().map(|(_, t)| t.date),
            last: self.transactions.iter().last().map(|(_, t)| t.date),
        }
    }

    pub(crate) fn expect_stage(&self, expected: Stage, action: &'static str) -> Result<(), LedgerError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(LedgerError::InvalidStage {
                action,
                expected,
                found: self.stage,
            })
        }
    }

    /// Look up or create an account and its implied parents.
    pub(crate) fn ensure_account(&mut self, name: &str, kind: AccountKind) -> &mut Account {
        for ancestor in account::ancestors(name) {
            self.accounts
                .entry(ancestor.to_string())
                .or_insert_with(|| Account::new(ancestor));
        }
        self.accounts.entry(name.to_string()).or_insert_with(|| {
            debug!(account = name, "new account");
            Account::new(name).with_flags(kind.is_virtual(), kind.is_balanced())
        })
    }

    /// Record a commodity, widening the stored display precision.
    pub(crate) fn register_commodity(&mut self, value: &Commodity) {
        self.commodities
            .entry(value.name.clone())
            .and_modify(|sample| sample.precision = sample.precision.max(value.precision))
            .or_insert_with(|| value.make_similar(Decimal::ZERO));
        if self.first_commodity.is_none() {
            self.first_commodity = Some(value.name.clone());
        }
    }

    /// Apply a non-transaction directive.
    pub(crate) fn apply(&mut self, directive: Directive, span: Span) -> Result<(), LedgerError> {
        match directive {
            // posted by the first pass
            Directive::Transaction(_) => {}
            Directive::Price(price) => {
                self.register_commodity(&price.value);
                self.prices.insert(price.when, price);
            }
            Directive::Account(decl) => {
                let name = account::join(&self.root(), &decl.name);
                for alias in &decl.aliases {
                    self.account_aliases.insert(alias.clone(), name.clone());
                }
                for pattern in &decl.payees {
                    self.account_payees.push((compile(pattern)?, name.clone()));
                }
                let types: Vec<AccountType> = decl
                    .types
                    .iter()
                    .filter_map(|t| {
                        let parsed = AccountType::parse(t);
                        if parsed.is_none() {
                            warn!(account = %name, r#type = %t, "unknown account type");
                        }
                        parsed
                    })
                    .collect();
                if decl.is_default {
                    self.bucket = Some(name.clone());
                }

                let acct = self.ensure_account(&name, AccountKind::Real);
                acct.declared = true;
                acct.note = decl.note.or(acct.note.take());
                acct.aliases.extend(decl.aliases);
                acct.payees.extend(decl.payees);
                acct.checks.extend(decl.checks);
                acct.asserts.extend(decl.asserts);
                acct.evals.extend(decl.evals);
                acct.types.extend(types);
                acct.is_default |= decl.is_default;
            }
            Directive::ApplyAccount(name) => self.rootstack.push(name),
            Directive::End => {
                if self.rootstack.pop().is_none() {
                    return Err(LedgerError::DirectiveState(format!(
                        "{span}: 'end' without a matching 'apply account'"
                    )));
                }
            }
            Directive::Alias { name, account } => {
                self.aliases.insert(name, account);
            }
            Directive::Bucket(name) => self.bucket = Some(account::join(&self.root(), &name)),
            Directive::Capture { account, pattern } => {
                self.captures.push((compile(&pattern)?, account));
            }
            Directive::Commodity(decl) => {
                if let Some(format) = &decl.format {
                    let mut sample = format.make_similar(Decimal::ZERO);
                    sample.name.clone_from(&decl.name);
                    sample.currency |= decl.currency;
                    self.register_commodity(&sample);
                }
                if decl.is_default {
                    self.default_commodity = Some(decl.name.clone());
                }
                self.commodity_decls.insert(decl.name.clone(), decl);
            }
            Directive::Payee(decl) => self.payees.push(payee_rule(decl)?),
            Directive::Define { name, expr } => {
                self.defines.insert(name, expr);
            }
            Directive::Fixed { commodity, price } => {
                self.fixed.insert(commodity, price);
            }
            Directive::Assert(expr) | Directive::Check(expr) => self.assertions.push(expr),
            Directive::Include(path) => {
                debug!(%path, %span, "include directive outside the loader ignored");
            }
            Directive::Year(_) | Directive::Test(_) | Directive::Comment(_) => {}
        }
        Ok(())
    }
}

pub(crate) fn compile(pattern: &str) -> Result<Regex, LedgerError> {
    Regex::new(pattern).map_err(|source| LedgerError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn payee_rule(decl: PayeeDecl) -> Result<PayeeRule, LedgerError> {
    let patterns = decl
        .aliases
        .iter()
        .map(|p| compile(p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PayeeRule {
        name: decl.name,
        patterns,
        uuid: decl.uuid,
    })
}
