//! The `stats` report.

use plainledger_loader::{Datastore, Reporter};
use std::io::Write;

/// Counts describing the journal.
pub struct StatsReport<'a, W> {
    out: &'a mut W,
}

impl<'a, W: Write> StatsReport<'a, W> {
    /// Create a statistics report writing to `out`.
    pub fn new(out: &'a mut W) -> Self {
        Self { out }
    }
}

impl<W: Write> Reporter for StatsReport<'_, W> {
    fn render(&mut self, store: &Datastore) -> anyhow::Result<()> {
        let stats = store.statistics();
        let out = &mut *self.out;
        writeln!(out, "Transactions:  {}", stats.transactions)?;
        writeln!(out, "Postings:      {}", stats.postings)?;
        writeln!(out, "Accounts:      {}", stats.accounts)?;
        writeln!(out, "Commodities:   {}", stats.commodities)?;
        writeln!(out, "Prices:        {}", stats.prices)?;
        writeln!(out, "Duplicates:    {}", stats.duplicates)?;
        if let (Some(first), Some(last)) = (stats.first, stats.last) {
            writeln!(
                out,
                "Time period:   {} to {}",
                first.format("%Y/%m/%d"),
                last.format("%Y/%m/%d")
            )?;
            let options = store.options();
            writeln!(
                out,
                "Fiscal years:  {} to {}",
                options.fiscal_year(first),
                options.fiscal_year(last)
            )?;
        }
        Ok(())
    }
}
