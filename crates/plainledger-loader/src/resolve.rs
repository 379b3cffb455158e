//! Account, commodity and payee resolution.
//!
//! A posting's account is resolved in a fixed order: an `Unknown`
//! placeholder goes through the payee table, otherwise a matching `capture`
//! wins, otherwise an alias declared on an `account` gives the full name,
//! otherwise the name goes through the `alias` table and is prefixed with
//! the active `apply account` root.

use plainledger_core::{account, Commodity, Posting, PostingAccount, Transaction};
use tracing::warn;

use crate::{Datastore, LedgerError};

impl Datastore {
    /// Resolve the account a posting refers to.
    ///
    /// # Errors
    ///
    /// [`LedgerError::UnresolvedUnknownAccount`] when a placeholder's payee
    /// matches no rule, or matches one outside the placeholder's prefix.
    pub fn resolve_account(
        &self,
        posting: &Posting,
        txn: &Transaction,
    ) -> Result<String, LedgerError> {
        match &posting.account {
            PostingAccount::Unknown { prefix } => {
                let payee = posting.payee(txn);
                let matched = self
                    .account_payees
                    .iter()
                    .find(|(re, _)| re.is_match(payee))
                    .map(|(_, name)| name);
                match (matched, prefix) {
                    (Some(name), Some(prefix)) if account::has_prefix(name, prefix) => {
                        Ok(name.clone())
                    }
                    (Some(name), None) => Ok(name.clone()),
                    _ => Err(LedgerError::UnresolvedUnknownAccount {
                        account: posting.account.to_string(),
                        payee: payee.to_string(),
                    }),
                }
            }
            PostingAccount::Named(name) => {
                if let Some((_, captured)) = self.captures.iter().find(|(re, _)| re.is_match(name))
                {
                    return Ok(captured.clone());
                }
                if let Some(full) = self.account_aliases.get(name) {
                    return Ok(full.clone());
                }
                let name = self.aliases.get(name).unwrap_or(name);
                Ok(account::join(&self.root(), name))
            }
        }
    }

    /// Apply a commodity's declared display settings and record it.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Pedantic`] for an undeclared commodity in pedantic mode.
    pub(crate) fn resolve_commodity(&mut self, value: &mut Commodity) -> Result<(), LedgerError> {
        let declared = match self.commodity_decls.get(&value.name) {
            Some(decl) => {
                if let Some(format) = &decl.format {
                    value.precision = format.precision;
                }
                value.currency |= decl.currency;
                true
            }
            None => value.name.is_empty(),
        };
        self.check_declared("commodity", &value.name, declared)?;
        self.register_commodity(value);
        Ok(())
    }

    /// Report an undeclared name under the strict and pedantic options.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Pedantic`] when pedantic mode is on.
    pub(crate) fn check_declared(
        &self,
        kind: &'static str,
        name: &str,
        declared: bool,
    ) -> Result<(), LedgerError> {
        if declared {
            return Ok(());
        }
        if self.options.pedantic {
            return Err(LedgerError::Pedantic {
                kind,
                name: name.to_string(),
            });
        }
        if self.options.strict {
            warn!(kind, name, "undeclared");
        }
        Ok(())
    }

    /// The declared payee whose `alias` pattern matches `payee`.
    #[must_use]
    pub fn rewrite_payee(&self, payee: &str) -> Option<&str> {
        self.payees
            .iter()
            .find(|rule| rule.patterns.iter().any(|re| re.is_match(payee)))
            .map(|rule| rule.name.as_str())
    }

    pub(crate) fn is_declared_account(&self, name: &str) -> bool {
        self.accounts.get(name).is_some_and(|a| a.declared)
    }

    pub(crate) fn is_declared_payee(&self, payee: &str) -> bool {
        self.payees.iter().any(|rule| rule.name == payee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Options;
    use plainledger_core::{AccountDecl, CommodityDecl, Directive, NaiveDate, PayeeDecl};
    use plainledger_parser::Span;
    use rust_decimal_macros::dec;

    fn txn(payee: &str) -> Transaction {
        Transaction::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), payee)
    }

    fn store_with(directives: Vec<Directive>, options: Options) -> Datastore {
        let mut store = Datastore::new(options);
        for d in directives {
            store.apply(d, Span::line(1)).unwrap();
        }
        store
    }

    #[test]
    fn test_plain_name_passes_through() {
        let store = Datastore::new(Options::default());
        let p = Posting::tally("Expenses:Food");
        assert_eq!(store.resolve_account(&p, &txn("x")).unwrap(), "Expenses:Food");
    }

    #[test]
    fn test_alias_then_root() {
        let store = store_with(
            vec![
                Directive::Alias {
                    name: "food".into(),
                    account: "Expenses:Food".into(),
                },
                Directive::ApplyAccount("Personal".into()),
            ],
            Options::default(),
        );
        let p = Posting::tally("food");
        assert_eq!(
            store.resolve_account(&p, &txn("x")).unwrap(),
            "Personal:Expenses:Food"
        );
    }

    #[test]
    fn test_account_alias_is_full_name() {
        let decl = AccountDecl {
            name: "Cash".into(),
            aliases: vec!["c".into()],
            ..AccountDecl::default()
        };
        let store = store_with(
            vec![
                Directive::ApplyAccount("Personal".into()),
                Directive::Account(decl),
            ],
            Options::default(),
        );
        let p = Posting::tally("c");
        assert_eq!(store.resolve_account(&p, &txn("x")).unwrap(), "Personal:Cash");
    }

    #[test]
    fn test_capture_wins_over_alias() {
        let store = store_with(
            vec![
                Directive::Alias {
                    name: "Bank:Visa".into(),
                    account: "Liabilities:Visa".into(),
                },
                Directive::Capture {
                    account: "Liabilities:Card".into(),
                    pattern: "^Bank:".into(),
                },
            ],
            Options::default(),
        );
        let p = Posting::tally("Bank:Visa");
        assert_eq!(
            store.resolve_account(&p, &txn("x")).unwrap(),
            "Liabilities:Card"
        );
    }

    #[test]
    fn test_unknown_resolved_by_payee() {
        let decl = AccountDecl {
            name: "Expenses:Coffee".into(),
            payees: vec!["^Starbucks".into()],
            ..AccountDecl::default()
        };
        let store = store_with(vec![Directive::Account(decl)], Options::default());

        let bare = Posting::tally("Unknown");
        assert_eq!(
            store.resolve_account(&bare, &txn("Starbucks 123")).unwrap(),
            "Expenses:Coffee"
        );

        let scoped = Posting::tally("Expenses:Unknown");
        assert_eq!(
            store.resolve_account(&scoped, &txn("Starbucks")).unwrap(),
            "Expenses:Coffee"
        );

        let wrong_prefix = Posting::tally("Income:Unknown");
        assert!(matches!(
            store.resolve_account(&wrong_prefix, &txn("Starbucks")),
            Err(LedgerError::UnresolvedUnknownAccount { .. })
        ));

        assert!(matches!(
            store.resolve_account(&bare, &txn("Bakery")),
            Err(LedgerError::UnresolvedUnknownAccount { payee, .. }) if payee == "Bakery"
        ));
    }

    #[test]
    fn test_resolve_commodity_applies_declaration() {
        let decl = CommodityDecl {
            name: "$".into(),
            format: Some(Commodity::currency("$", dec!(1000.000))),
            currency: true,
            ..CommodityDecl::default()
        };
        let mut store = store_with(vec![Directive::Commodity(decl)], Options::default());
        let mut value = Commodity::new("$", dec!(5));
        store.resolve_commodity(&mut value).unwrap();
        assert_eq!(value.precision, 3);
        assert!(value.currency);
    }

    #[test]
    fn test_pedantic_rejects_undeclared_commodity() {
        let mut store = Datastore::new(Options {
            pedantic: true,
            ..Options::default()
        });
        let mut value = Commodity::new("EUR", dec!(5));
        assert!(matches!(
            store.resolve_commodity(&mut value),
            Err(LedgerError::Pedantic { kind: "commodity", .. })
        ));

        let mut bare = Commodity::new("", dec!(5));
        assert!(store.resolve_commodity(&mut bare).is_ok());
    }

    #[test]
    fn test_strict_only_warns() {
        let store = Datastore::new(Options {
            strict: true,
            ..Options::default()
        });
        assert!(store.check_declared("account", "Assets:Cash", false).is_ok());
    }

    #[test]
    fn test_rewrite_payee() {
        let decl = PayeeDecl {
            name: "Grocery Store".into(),
            aliases: vec!["(?i)^grocer".into()],
            uuid: None,
        };
        let store = store_with(vec![Directive::Payee(decl)], Options::default());
        assert_eq!(store.rewrite_payee("GROCERY #42"), Some("Grocery Store"));
        assert_eq!(store.rewrite_payee("Cafe"), None);
        assert!(store.is_declared_payee("Grocery Store"));
    }
}
