//! The `register` report.

use crate::report::{format_amount, truncate, Totals, AMOUNT_WIDTH};
use plainledger_core::{Posting, Transaction};
use plainledger_loader::{Datastore, Reporter};
use plainledger_query::FilterExpr;
use std::io::Write;

const PAYEE_WIDTH: usize = 22;
const ACCOUNT_WIDTH: usize = 30;

/// Postings in date order with a running total per commodity.
///
/// Date and payee are printed on the first selected posting of each
/// transaction only.
pub struct RegisterReport<'a, W> {
    filter: Option<FilterExpr>,
    out: &'a mut W,
    totals: Totals,
    in_transaction: bool,
}

impl<'a, W: Write> RegisterReport<'a, W> {
    /// Create a register report writing to `out`.
    pub fn new(filter: Option<FilterExpr>, out: &'a mut W) -> Self {
        Self {
            filter,
            out,
            totals: Totals::new(),
            in_transaction: false,
        }
    }
}

impl<W: Write> Reporter for RegisterReport<'_, W> {
    fn posting(
        &mut self,
        store: &Datastore,
        txn: &Transaction,
        posting: &Posting,
    ) -> anyhow::Result<()> {
        let (Some(name), Some(value)) = (posting.account_name(), &posting.commodity) else {
            return Ok(());
        };
        if !self.filter.as_ref().map_or(true, |f| f.matches(name)) {
            return Ok(());
        }

        self.totals.add(value)?;
        let running = self
            .totals
            .get(&value.name)
            .map(|c| format_amount(store, c))
            .unwrap_or_default();
        let (date, payee) = if self.in_transaction {
            (String::new(), String::new())
        } else {
            (
                txn.date.format("%Y/%m/%d").to_string(),
                truncate(posting.payee(txn), PAYEE_WIDTH),
            )
        };
        self.in_transaction = true;

        let account = truncate(name, ACCOUNT_WIDTH);
        let amount = format_amount(store, value);
        writeln!(
            self.out,
            "{date:<10} {payee:<PAYEE_WIDTH$} {account:<ACCOUNT_WIDTH$} {amount:>AMOUNT_WIDTH$} {running:>AMOUNT_WIDTH$}"
        )?;
        Ok(())
    }

    fn transaction(&mut self, _store: &Datastore, _txn: &Transaction) -> anyhow::Result<()> {
        self.in_transaction = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plainledger_core::{Commodity, Directive, NaiveDate};
    use plainledger_loader::{NullReporter, Options};
    use plainledger_parser::{Span, Spanned};
    use rust_decimal::Decimal;

    fn usd(cents: i64) -> Commodity {
        Commodity::currency("$", Decimal::new(cents, 2))
    }

    fn register(filter: &[&str]) -> Vec<String> {
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let txns = [
            Transaction::new(day(5), "Market")
                .with_posting(Posting::new("Expenses:Food", usd(4250)))
                .with_posting(Posting::tally("Assets:Checking")),
            Transaction::new(day(6), "A payee name longer than the column")
                .with_posting(Posting::new("Expenses:Food", usd(450)))
                .with_posting(Posting::tally("Assets:Checking")),
        ];
        let directives = txns
            .into_iter()
            .map(|t| Spanned::new(Directive::Transaction(t), Span::line(1)))
            .collect();
        let mut store = Datastore::new(Options::default());
        store.firstpass(directives, &mut NullReporter).unwrap();

        let mut out = Vec::new();
        let filter = plainledger_query::compile(filter).unwrap();
        store
            .secondpass(&mut RegisterReport::new(filter, &mut out))
            .unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_header_on_first_posting_only() {
        let lines = register(&[]);
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("2024/01/05 Market"));
        assert!(lines[1].starts_with("           "));
        assert!(lines[1].contains("Assets:Checking"));
    }

    #[test]
    fn test_running_total_and_truncation() {
        let lines = register(&["Food"]);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].trim_end().ends_with("$42.50           $42.50"));
        assert!(lines[1].trim_end().ends_with("$47.00"));
        assert!(lines[1].contains("A payee name longer .."));
    }
}
