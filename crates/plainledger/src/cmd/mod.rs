//! Command-line front end.
//!
//! Flags map onto [`Options`]; each subcommand is a [`Reporter`] fed by the
//! engine.

mod accounts;
mod balance;
mod register;
mod stats;

pub use accounts::AccountsReport;
pub use balance::BalanceReport;
pub use register::RegisterReport;
pub use stats::StatsReport;

use crate::report;
use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use plainledger_loader::{LedgerError, Options, Reporter};
use plainledger_parser::{parse_date, parse_period};
use plainledger_query::FilterExpr;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Plain-text double-entry accounting reports.
#[derive(Parser, Debug)]
#[command(name = "plainledger", author, version, about, long_about = None)]
pub struct Args {
    /// Journal file to read (repeat for several)
    #[arg(short, long = "file", value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Warn about undeclared accounts and commodities
    #[arg(long)]
    pub strict: bool,

    /// Fail on undeclared accounts and commodities
    #[arg(long)]
    pub pedantic: bool,

    /// Also check payees against payee declarations
    #[arg(long)]
    pub checkpayee: bool,

    /// Only include transactions on or after this date
    #[arg(short, long, value_name = "DATE")]
    pub begin: Option<String>,

    /// Only include transactions before this date
    #[arg(short, long, value_name = "DATE")]
    pub end: Option<String>,

    /// Only include transactions inside this period expression
    #[arg(short, long, value_name = "PERIOD")]
    pub period: Option<String>,

    /// First month of the fiscal year
    #[arg(long, value_name = "MONTH", value_parser = clap::value_parser!(u32).range(1..=12))]
    pub finyear: Option<u32>,

    /// Only include the fiscal year starting in YEAR
    #[arg(long, value_name = "YEAR")]
    pub fy: Option<i32>,

    /// Show debit and credit columns
    #[arg(long)]
    pub dc: bool,

    /// Do not show parent account subtotals
    #[arg(long)]
    pub nosubtotal: bool,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// The report to generate
    #[command(subcommand)]
    pub command: Command,
}

/// Available reports.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show account balances
    #[command(alias = "bal")]
    Balance {
        /// Filter expression over account names
        filter: Vec<String>,
    },
    /// Show postings with a running total
    #[command(alias = "reg")]
    Register {
        /// Filter expression over account names
        filter: Vec<String>,
    },
    /// List accounts
    Accounts {
        /// Filter expression over account names
        filter: Vec<String>,
    },
    /// Show journal statistics
    #[command(alias = "stat")]
    Stats,
}

impl Args {
    /// Build engine options from the flags, reading relative dates against
    /// `today`.
    ///
    /// `--period` narrows `--begin`/`--end` and must not carry an interval;
    /// `--fy` overrides both.
    pub fn options(&self, today: NaiveDate) -> Result<Options> {
        let mut options = Options {
            strict: self.strict,
            pedantic: self.pedantic,
            checkpayee: self.checkpayee,
            finyear: self.finyear,
            dcformat: self.dc,
            nosubtotal: self.nosubtotal,
            ..Options::default()
        };
        if let Some(spec) = &self.begin {
            let date =
                parse_date(spec, today).with_context(|| format!("invalid --begin {spec:?}"))?;
            options.begin = Some(date);
        }
        if let Some(spec) = &self.end {
            let date =
                parse_date(spec, today).with_context(|| format!("invalid --end {spec:?}"))?;
            options.end = Some(date);
        }
        if let Some(expr) = &self.period {
            let period =
                parse_period(expr, today).with_context(|| format!("invalid --period {expr:?}"))?;
            if let Some(interval) = period.interval {
                bail!("invalid --period {expr:?}: reports take bounds only, not '{interval}'");
            }
            options = options.with_period(&period);
        }
        if let Some(year) = self.fy {
            options.begin = options.fiscal_year_start(year);
            options.end = options.fiscal_year_start(year + 1);
        }
        Ok(options)
    }
}

fn compile_filter(tokens: &[String]) -> Result<Option<FilterExpr>> {
    plainledger_query::compile(tokens)
        .with_context(|| format!("invalid filter {:?}", tokens.join(" ")))
}

/// Run the command described by `args`, writing the report to `out`.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<()> {
    let options = args.options(Local::now().date_naive())?;
    debug!(?options, files = args.files.len(), "running report");
    let paths: Vec<&Path> = args.files.iter().map(PathBuf::as_path).collect();
    match &args.command {
        Command::Balance { filter } => {
            let mut report = BalanceReport::new(compile_filter(filter)?, out);
            execute(&paths, options, &mut report)
        }
        Command::Register { filter } => {
            let mut report = RegisterReport::new(compile_filter(filter)?, out);
            execute(&paths, options, &mut report)
        }
        Command::Accounts { filter } => {
            let mut report = AccountsReport::new(compile_filter(filter)?, out);
            execute(&paths, options, &mut report)
        }
        Command::Stats => execute(&paths, options, &mut StatsReport::new(out)),
    }
}

fn execute(paths: &[&Path], options: Options, reporter: &mut dyn Reporter) -> Result<()> {
    plainledger_loader::run(paths, options, reporter)?;
    Ok(())
}

/// Exit status for a failed run: `1` for a problem in the journal, `2` for
/// usage and IO problems.
pub fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<LedgerError>() {
        Some(LedgerError::Io { .. }) | None => 2,
        Some(_) => 1,
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Main entry point.
pub fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut stdout = io::stdout().lock();
    match run(&args, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let mut stderr = io::stderr().lock();
            if let Some(LedgerError::Parse { path, errors }) = e.downcast_ref::<LedgerError>() {
                let _ = report::report_parse_errors(errors, path, &mut stderr);
            }
            let _ = writeln!(stderr, "error: {e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}
