//! The `accounts` report.

use plainledger_loader::{Datastore, Reporter};
use plainledger_query::FilterExpr;
use std::io::Write;

/// Names of every account the filter selects, including implied parents.
pub struct AccountsReport<'a, W> {
    filter: Option<FilterExpr>,
    out: &'a mut W,
}

impl<'a, W: Write> AccountsReport<'a, W> {
    /// Create an accounts report writing to `out`.
    pub fn new(filter: Option<FilterExpr>, out: &'a mut W) -> Self {
        Self { filter, out }
    }
}

impl<W: Write> Reporter for AccountsReport<'_, W> {
    fn render(&mut self, store: &Datastore) -> anyhow::Result<()> {
        for account in store.accounts() {
            if self.filter.as_ref().map_or(true, |f| f.matches(&account.name)) {
                writeln!(self.out, "{}", account.name)?;
            }
        }
        Ok(())
    }
}
