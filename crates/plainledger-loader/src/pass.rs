//! The first and second passes over a journal.

use plainledger_booking::{autobalance, is_balanced, requires_balancing};
use plainledger_core::{account, AccountKind, Directive, Inclusivity, PostingAccount, Transaction};
use plainledger_parser::Spanned;
use tracing::{debug, warn};

use crate::{Datastore, LedgerError, Reporter, Stage};

impl Datastore {
    /// Run the first pass: apply directives, balance transactions and
    /// resolve every posting.
    ///
    /// # Errors
    ///
    /// Any error aborts the pass; the datastore is left part-way through and
    /// should be discarded.
    pub fn firstpass(
        &mut self,
        directives: Vec<Spanned<Directive>>,
        reporter: &mut dyn Reporter,
    ) -> Result<(), LedgerError> {
        self.expect_stage(Stage::Parsed, "run the first pass")?;

        for Spanned { value, span } in directives {
            match value {
                Directive::Transaction(txn) => self.admit(txn, reporter)?,
                other => self.apply(other, span)?,
            }
        }
        if !self.rootstack.is_empty() {
            return Err(LedgerError::DirectiveState(format!(
                "'apply account {}' is never closed",
                self.root()
            )));
        }

        self.stage = Stage::Firstpass;
        debug!(
            transactions = self.transactions.len(),
            accounts = self.accounts.len(),
            "first pass done"
        );
        Ok(())
    }

    fn admit(
        &mut self,
        mut txn: Transaction,
        reporter: &mut dyn Reporter,
    ) -> Result<(), LedgerError> {
        if let Some(name) = self.rewrite_payee(&txn.payee) {
            txn.payee = name.to_string();
        }
        if self.first_commodity.is_none() {
            self.first_commodity = txn
                .postings
                .iter()
                .find_map(|p| p.commodity.as_ref())
                .map(|c| c.name.clone());
        }

        let mut bucket_posting = None;
        if requires_balancing(&txn) && !is_balanced(&txn)? {
            let lone = txn.postings.len() == 1;
            let default = self.default_commodity();
            let filled = autobalance(&mut txn, self.bucket.as_deref(), &default).map_err(
                |source| LedgerError::Balance {
                    date: txn.date,
                    payee: txn.payee.clone(),
                    lines: txn.lines,
                    source,
                },
            )?;
            debug!(payee = %txn.payee, ?filled, "autobalanced");
            if lone {
                bucket_posting = filled.first().copied();
            }
        }

        let mut postings = std::mem::take(&mut txn.postings);
        for (i, posting) in postings.iter_mut().enumerate() {
            let name = match posting.account_name() {
                // the bucket already holds a full name
                Some(bucket) if bucket_posting == Some(i) => bucket.to_string(),
                _ => self.resolve_account(posting, &txn)?,
            };
            let declared = self.is_declared_account(&name);
            self.check_declared("account", &name, declared)?;
            self.ensure_account(&name, posting.kind);
            posting.account = PostingAccount::Named(name);

            let prices = [
                &mut posting.commodity,
                &mut posting.lot_price,
                &mut posting.cost_price,
                &mut posting.balance_price,
            ];
            for value in prices.into_iter().flatten() {
                self.resolve_commodity(value)?;
            }
        }
        txn.postings = postings;

        if self.options.checkpayee {
            let declared = self.is_declared_payee(&txn.payee);
            self.check_declared("payee", &txn.payee, declared)?;
        }
        for posting in &txn.postings {
            reporter.firstpass(self, &txn, posting)?;
        }

        if !txn.fingerprint.is_empty() {
            let seen = self.fingerprints.entry(txn.fingerprint.clone()).or_insert(0);
            *seen += 1;
            if *seen > 1 {
                warn!(
                    date = %txn.date,
                    payee = %txn.payee,
                    lines = ?txn.lines,
                    "duplicate transaction"
                );
            }
        }
        self.transactions.insert(txn.timestamp(), txn);
        Ok(())
    }

    /// Run the second pass on a copy of this datastore, accumulating the
    /// transactions inside the `begin`/`end` bounds.
    ///
    /// `self` is left untouched so it can feed further second passes.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidStage`] unless the first pass completed, or the
    /// first error from aggregation or the reporter.
    pub fn secondpass(&self, reporter: &mut dyn Reporter) -> Result<Self, LedgerError> {
        self.expect_stage(Stage::Firstpass, "run the second pass")?;

        let mut store = self.clone();
        store.stage = Stage::Secondpass;
        let (low, high) = self.options.bounds();
        let mut posted = 0usize;
        for (_, txn) in self.transactions.range(low, high, Inclusivity::Low) {
            store.post(txn, reporter)?;
            posted += 1;
        }
        debug!(posted, "second pass done");
        Ok(store)
    }

    fn post(&mut self, txn: &Transaction, reporter: &mut dyn Reporter) -> Result<(), LedgerError> {
        for posting in &txn.postings {
            let (Some(name), Some(value)) = (posting.account_name(), &posting.commodity) else {
                continue;
            };
            self.ensure_account(name, posting.kind).add_balance(value)?;
            let ancestors = account::ancestors(name);
            for ancestor in &ancestors {
                self.ensure_account(ancestor, AccountKind::Real)
                    .add_balance(value)?;
            }

            reporter.posting(self, txn, posting)?;
            for ancestor in &ancestors {
                if let Some(acct) = self.accounts.get(*ancestor) {
                    reporter.bubble_posting(self, txn, posting, acct)?;
                }
            }
        }
        reporter.transaction(self, txn)?;
        Ok(())
    }

    /// Hand the accumulated datastore to the reporter.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidStage`] unless the second pass completed, or the
    /// reporter's error.
    pub fn render(&mut self, reporter: &mut dyn Reporter) -> Result<(), LedgerError> {
        self.expect_stage(Stage::Secondpass, "render")?;
        reporter.render(self)?;
        self.stage = Stage::Rendered;
        Ok(())
    }
}
