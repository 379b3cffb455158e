//! Journal loader and two-pass ledger engine.
//!
//! This crate reads journal files, follows their `include` directives and
//! drives a [`Datastore`] through its passes:
//!
//! 1. **Firstpass** applies directives in order, rewrites payees, balances
//!    transactions and resolves every posting's account and commodity.
//! 2. **Secondpass** runs on a clone of the first-pass datastore and
//!    accumulates each posting into its account and every ancestor account,
//!    calling back into a [`Reporter`].
//! 3. **Render** hands the accumulated datastore to the reporter once.
//!
//! # Features
//!
//! - Recursive include resolution with cycle detection
//! - `apply account`, `alias`, `capture` and payee-driven account resolution
//! - Strict (warn) and pedantic (fail) declaration checks
//! - Duplicate transaction detection by source fingerprint
//!
//! # Example
//!
//! ```no_run
//! use plainledger_loader::{run, NullReporter, Options};
//! use std::path::Path;
//!
//! let store = run(&[Path::new("ledger.journal")], Options::default(), &mut NullReporter)?;
//! for account in store.accounts() {
//!     println!("{account}");
//! }
//! # Ok::<(), plainledger_loader::LedgerError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod datastore;
mod error;
mod options;
mod pass;
mod reporter;
mod resolve;

pub use datastore::{Datastore, Stage, Statistics};
pub use error::LedgerError;
pub use options::Options;
pub use reporter::{NullReporter, Reporter};

use chrono::NaiveDate;
use plainledger_core::Directive;
use plainledger_parser::Spanned;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result of loading a journal file.
#[derive(Debug)]
pub struct LoadResult {
    /// All directives from all files, includes expanded in place.
    pub directives: Vec<Spanned<Directive>>,
    /// Every file read, in the order it was first opened.
    pub files: Vec<PathBuf>,
}

/// Journal file loader.
#[derive(Debug, Default)]
pub struct Loader {
    /// Files that have been loaded.
    loaded_files: HashSet<PathBuf>,
    /// Stack for cycle detection during loading.
    include_stack: Vec<PathBuf>,
    /// Date partial dates are completed against; the clock when unset.
    today: Option<NaiveDate>,
}

impl Loader {
    /// Create a new loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse as if today were `today`.
    #[must_use]
    pub const fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Load a journal file and all its includes.
    ///
    /// A file reached a second time through a different include chain is
    /// skipped.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Io`] - Failed to read the file or an included file
    /// - [`LedgerError::IncludeCycle`] - Circular include detected
    /// - [`LedgerError::Parse`] - A file had lines that did not parse
    pub fn load(&mut self, path: &Path) -> Result<LoadResult, LedgerError> {
        let canonical = path.canonicalize().map_err(|e| LedgerError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut directives = Vec::new();
        let mut files = Vec::new();
        self.load_recursive(&canonical, &mut directives, &mut files)?;
        Ok(LoadResult { directives, files })
    }

    fn load_recursive(
        &mut self,
        path: &Path,
        directives: &mut Vec<Spanned<Directive>>,
        files: &mut Vec<PathBuf>,
    ) -> Result<(), LedgerError> {
        let path_buf = path.to_path_buf();
        if self.include_stack.contains(&path_buf) {
            let mut cycle: Vec<String> = self
                .include_stack
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            cycle.push(path.display().to_string());
            return Err(LedgerError::IncludeCycle { cycle });
        }
        if self.loaded_files.contains(path) {
            debug!(path = %path.display(), "already loaded");
            return Ok(());
        }

        let source = fs::read_to_string(path).map_err(|e| LedgerError::Io {
            path: path_buf.clone(),
            source: e,
        })?;
        self.include_stack.push(path_buf.clone());
        self.loaded_files.insert(path_buf.clone());
        files.push(path_buf.clone());

        let result = match self.today {
            Some(today) => plainledger_parser::parse_at(&source, today),
            None => plainledger_parser::parse(&source),
        };
        if result.has_errors() {
            return Err(LedgerError::Parse {
                path: path_buf,
                errors: result.errors,
            });
        }
        debug!(
            path = %path.display(),
            directives = result.directives.len(),
            "parsed"
        );

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        for directive in result.directives {
            let Directive::Include(include) = &directive.value else {
                directives.push(directive);
                continue;
            };
            let full_path = base_dir.join(include);
            let canonical = full_path.canonicalize().map_err(|e| LedgerError::Io {
                path: full_path,
                source: e,
            })?;
            self.load_recursive(&canonical, directives, files)?;
        }

        self.include_stack.pop();
        Ok(())
    }
}

/// Load a journal file.
///
/// This is a convenience function that creates a loader and loads a single file.
///
/// # Errors
///
/// See [`Loader::load`].
pub fn load(path: &Path) -> Result<LoadResult, LedgerError> {
    Loader::new().load(path)
}

/// Load journals and run both passes and the render step.
///
/// Journals are processed in the order given, as one continuous stream of
/// directives; a file named twice is read once.
///
/// # Errors
///
/// The first loading, first-pass, second-pass or reporter error.
pub fn run(
    paths: &[&Path],
    options: Options,
    reporter: &mut dyn Reporter,
) -> Result<Datastore, LedgerError> {
    let mut loader = Loader::new();
    let mut directives = Vec::new();
    for path in paths {
        directives.extend(loader.load(path)?.directives);
    }

    let mut store = Datastore::new(options);
    store.firstpass(directives, reporter)?;
    let mut store = store.secondpass(reporter)?;
    store.render(reporter)?;
    Ok(store)
}
