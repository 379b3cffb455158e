//! The `balance` report.

use crate::report::{format_amount, Totals, AMOUNT_WIDTH};
use plainledger_core::{account, Account, Commodity};
use plainledger_loader::{Datastore, Reporter};
use plainledger_query::FilterExpr;
use std::io::{self, Write};

/// Account balances, one row per commodity, followed by a grand total.
///
/// An account is shown when the filter selects it and one of its balances
/// is non-zero. With `nosubtotal` only accounts without posted children are
/// shown. With `dcformat` debit and credit columns precede the balance, and
/// accounts declared with a credit-normal type show their balance from the
/// credit side.
pub struct BalanceReport<'a, W> {
    filter: Option<FilterExpr>,
    out: &'a mut W,
}

impl<'a, W: Write> BalanceReport<'a, W> {
    /// Create a balance report writing to `out`.
    pub fn new(filter: Option<FilterExpr>, out: &'a mut W) -> Self {
        Self { filter, out }
    }

    fn selects(&self, name: &str) -> bool {
        self.filter.as_ref().map_or(true, |f| f.matches(name))
    }

    fn write_row(
        &mut self,
        store: &Datastore,
        balance: &Commodity,
        debit: Option<&Commodity>,
        credit: Option<&Commodity>,
        label: &str,
    ) -> io::Result<()> {
        let mut line = String::new();
        if store.options().dcformat {
            let debit = debit.map(|c| format_amount(store, c)).unwrap_or_default();
            let credit = credit.map(|c| format_amount(store, c)).unwrap_or_default();
            line.push_str(&format!("{debit:>AMOUNT_WIDTH$} {credit:>AMOUNT_WIDTH$} "));
        }
        let balance = format_amount(store, balance);
        line.push_str(&format!("{balance:>AMOUNT_WIDTH$}  {label}"));
        writeln!(self.out, "{}", line.trim_end())
    }
}

fn find<'c>(values: &[&'c Commodity], name: &str) -> Option<&'c Commodity> {
    values.iter().copied().find(|c| c.name == name)
}

fn has_posted_child(store: &Datastore, name: &str) -> bool {
    store
        .accounts()
        .any(|a| account::parent(&a.name) == Some(name) && !a.double_entry().is_empty())
}

impl<W: Write> Reporter for BalanceReport<'_, W> {
    fn render(&mut self, store: &Datastore) -> anyhow::Result<()> {
        let options = store.options();
        let shown: Vec<&Account> = store
            .accounts()
            .filter(|a| self.selects(&a.name))
            .filter(|a| a.balances().iter().any(|c| !c.is_zero()))
            .filter(|a| !options.nosubtotal || !has_posted_child(store, &a.name))
            .collect();

        let mut balances = Totals::new();
        let mut debits = Totals::new();
        let mut credits = Totals::new();
        for acct in &shown {
            let nested = shown
                .iter()
                .any(|other| other.name != acct.name && account::has_prefix(&acct.name, &other.name));
            if !nested {
                for value in acct.balances() {
                    balances.add(value)?;
                }
                for value in acct.debits() {
                    debits.add(value)?;
                }
                for value in acct.credits() {
                    credits.add(value)?;
                }
            }

            let rows: Vec<&Commodity> = acct
                .balances()
                .into_iter()
                .filter(|c| options.dcformat || !c.is_zero())
                .collect();
            let (acct_debits, acct_credits) = (acct.debits(), acct.credits());
            let credit_side = options.dcformat && !acct.is_debit_normal();
            for (i, value) in rows.iter().enumerate() {
                let label = if i + 1 == rows.len() { acct.name.as_str() } else { "" };
                let shown = if credit_side { value.invert() } else { (*value).clone() };
                self.write_row(
                    store,
                    &shown,
                    find(&acct_debits, &value.name),
                    find(&acct_credits, &value.name),
                    label,
                )?;
            }
        }

        let columns = if options.dcformat { 3 } else { 1 };
        let rule_width = columns * AMOUNT_WIDTH + columns - 1;
        writeln!(self.out, "{}", "-".repeat(rule_width))?;
        let totals: Vec<&Commodity> = balances.nonzero().collect();
        if totals.is_empty() {
            let zero = Commodity::new("", rust_decimal::Decimal::ZERO);
            self.write_row(store, &zero, None, None, "")?;
        }
        for value in totals {
            self.write_row(
                store,
                value,
                debits.get(&value.name),
                credits.get(&value.name),
                "",
            )?;
        }
        Ok(())
    }
}
