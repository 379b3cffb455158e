//! Callbacks through which reports observe the passes.

use plainledger_core::{Account, Posting, Transaction};

use crate::Datastore;

/// A report fed by the engine.
///
/// Every callback has a no-op default so a reporter only implements what it
/// needs. Errors abort the run.
pub trait Reporter {
    /// Called once per posting during the first pass, after resolution.
    fn firstpass(
        &mut self,
        _store: &Datastore,
        _txn: &Transaction,
        _posting: &Posting,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once per posting during the second pass, after the posting's
    /// account and its ancestors were updated.
    fn posting(
        &mut self,
        _store: &Datastore,
        _txn: &Transaction,
        _posting: &Posting,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once per posting for each strict ancestor of its account.
    fn bubble_posting(
        &mut self,
        _store: &Datastore,
        _txn: &Transaction,
        _posting: &Posting,
        _ancestor: &Account,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once per transaction at the end of the second pass.
    fn transaction(&mut self, _store: &Datastore, _txn: &Transaction) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once after every journal was processed.
    fn render(&mut self, _store: &Datastore) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A reporter that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {}
