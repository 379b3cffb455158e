//! Shared report formatting and error diagnostics.

use plainledger_core::{Commodity, CommodityError};
use plainledger_loader::Datastore;
use plainledger_parser::ParseError;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Width of an amount column.
pub const AMOUNT_WIDTH: usize = 16;

/// Render an amount with the display settings recorded for its commodity.
pub fn format_amount(store: &Datastore, value: &Commodity) -> String {
    store
        .commodity(&value.name)
        .map_or_else(|| value.clone(), |sample| sample.make_similar(value.amount))
        .to_string()
}

/// Cut `text` to at most `width` characters, marking the cut with `..`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width < 3 {
        return text.chars().take(width).collect();
    }
    let mut out: String = text.chars().take(width - 2).collect();
    out.push_str("..");
    out
}

/// Per-commodity running sums.
#[derive(Debug, Clone, Default)]
pub struct Totals {
    sums: BTreeMap<String, Commodity>,
}

impl Totals {
    /// Create empty totals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an amount to the sum for its commodity.
    pub fn add(&mut self, value: &Commodity) -> Result<(), CommodityError> {
        self.sums
            .entry(value.name.clone())
            .or_insert_with(|| value.make_similar(Decimal::ZERO))
            .add(value)
    }

    /// The sum for one commodity.
    pub fn get(&self, name: &str) -> Option<&Commodity> {
        self.sums.get(name)
    }

    /// Non-zero sums sorted by commodity name.
    pub fn nonzero(&self) -> impl Iterator<Item = &Commodity> {
        self.sums.values().filter(|c| !c.is_zero())
    }
}

/// Report parse errors to the given writer, one block per error.
pub fn report_parse_errors<W: Write>(
    errors: &[ParseError],
    source_path: &Path,
    writer: &mut W,
) -> std::io::Result<usize> {
    let path_str = source_path.display();
    for error in errors {
        writeln!(
            writer,
            "{path_str}:{}: {}: {}",
            error.line(),
            error.label(),
            error.kind
        )?;
        writeln!(writer, "  | {}", error.text)?;
    }
    Ok(errors.len())
}
