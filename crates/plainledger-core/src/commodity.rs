//! Commodity type representing a typed decimal value.
//!
//! A [`Commodity`] pairs an amount with a commodity name, remembers how it was
//! written (`$10.00` vs `10.00 USD`) and how many digits follow the decimal
//! point. Arithmetic is only defined between similar commodities, that is,
//! commodities sharing both the name and the currency flag.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Tolerance used when deciding whether a commodity total is balanced.
pub const BALANCE_EPSILON: Decimal = Decimal::from_parts(9, 0, 0, false, 3);

/// Error raised by commodity arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommodityError {
    /// The operands differ in name or in currency flag.
    #[error("commodity mismatch: cannot combine {left} with {right}")]
    Mismatch {
        /// Display form of the receiver.
        left: String,
        /// Display form of the operand.
        right: String,
    },
}

/// A decimal amount of a named commodity.
///
/// # Examples
///
/// ```
/// use plainledger_core::Commodity;
/// use rust_decimal_macros::dec;
///
/// let mut cash = Commodity::currency("$", dec!(10.00));
/// cash.add(&Commodity::currency("$", dec!(2.50))).unwrap();
/// assert_eq!(cash.amount, dec!(12.50));
/// assert_eq!(cash.to_string(), "$12.50");
///
/// let stock = Commodity::new("AAPL", dec!(3));
/// assert!(cash.add(&stock).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commodity {
    /// Commodity name or symbol (`$`, `USD`, `AAPL`).
    pub name: String,
    /// The decimal quantity.
    pub amount: Decimal,
    /// Rendered as a prefix symbol (`$10`) rather than a suffix name (`10 USD`).
    pub currency: bool,
    /// Digits after the decimal point used for display.
    pub precision: u32,
    /// Lot price declared as fixated (`{=...}`).
    pub fixprice: bool,
    /// Price annotation is a total rather than a per-unit value (`{{}}`, `@@`).
    pub total: bool,
}

impl Commodity {
    /// Create a suffix-named commodity, precision taken from the amount's scale.
    #[must_use]
    pub fn new(name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            name: name.into(),
            precision: amount.scale(),
            amount,
            currency: false,
            fixprice: false,
            total: false,
        }
    }

    /// Create a prefix-symbol commodity, precision taken from the amount's scale.
    #[must_use]
    pub fn currency(name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            currency: true,
            ..Self::new(name, amount)
        }
    }

    /// Override the display precision.
    #[must_use]
    pub const fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Mark the value as a total price annotation.
    #[must_use]
    pub const fn with_total(mut self, total: bool) -> Self {
        self.total = total;
        self
    }

    /// Mark the value as a fixated lot price.
    #[must_use]
    pub const fn with_fixprice(mut self, fixprice: bool) -> Self {
        self.fixprice = fixprice;
        self
    }

    /// A new commodity sharing name, currency flag, precision and flags, with
    /// a different amount.
    ///
    /// Use this whenever a value has to be stored in more than one aggregate.
    #[must_use]
    pub fn make_similar(&self, amount: Decimal) -> Self {
        Self {
            name: self.name.clone(),
            amount,
            currency: self.currency,
            precision: self.precision,
            fixprice: self.fixprice,
            total: self.total,
        }
    }

    /// Whether arithmetic between `self` and `other` is defined.
    #[must_use]
    pub fn is_similar(&self, other: &Self) -> bool {
        self.name == other.name && self.currency == other.currency
    }

    /// Add `other` into `self`.
    ///
    /// The wider of the two precisions is kept.
    pub fn add(&mut self, other: &Self) -> Result<(), CommodityError> {
        self.check_similar(other)?;
        self.amount += other.amount;
        self.precision = self.precision.max(other.precision);
        Ok(())
    }

    /// Subtract `other` from `self`.
    pub fn subtract(&mut self, other: &Self) -> Result<(), CommodityError> {
        self.check_similar(other)?;
        self.amount -= other.amount;
        self.precision = self.precision.max(other.precision);
        Ok(())
    }

    /// A fresh value holding the negated amount.
    #[must_use]
    pub fn invert(&self) -> Self {
        self.make_similar(-self.amount)
    }

    /// A fresh value holding the absolute amount.
    #[must_use]
    pub fn abs(&self) -> Self {
        self.make_similar(self.amount.abs())
    }

    /// Check if the amount is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Check if the amount is negative.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Check if the amount lies within [`BALANCE_EPSILON`] of zero.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.amount.abs() <= BALANCE_EPSILON
    }

    fn check_similar(&self, other: &Self) -> Result<(), CommodityError> {
        if self.is_similar(other) {
            Ok(())
        } else {
            Err(CommodityError::Mismatch {
                left: self.to_string(),
                right: other.to_string(),
            })
        }
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let number = self.amount.round_dp(self.precision);
        let number = format!("{:.*}", self.precision as usize, number);
        if self.currency {
            match number.strip_prefix('-') {
                Some(abs) => write!(f, "-{}{abs}", self.name),
                None => write!(f, "{}{number}", self.name),
            }
        } else if self.name.is_empty() {
            write!(f, "{number}")
        } else {
            write!(f, "{number} {}", self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_infers_precision() {
        let c = Commodity::new("USD", dec!(10.250));
        assert_eq!(c.precision, 3);
        assert!(!c.currency);

        let c = Commodity::currency("$", dec!(7));
        assert_eq!(c.precision, 0);
        assert!(c.currency);
    }

    #[test]
    fn test_add_similar() {
        let mut a = Commodity::new("USD", dec!(10.00));
        a.add(&Commodity::new("USD", dec!(2.5))).unwrap();
        assert_eq!(a.amount, dec!(12.50));
        assert_eq!(a.precision, 2);
    }

    #[test]
    fn test_add_keeps_wider_precision() {
        let mut a = Commodity::new("BTC", dec!(1));
        a.add(&Commodity::new("BTC", dec!(0.0001))).unwrap();
        assert_eq!(a.precision, 4);
    }

    #[test]
    fn test_add_name_mismatch() {
        let mut a = Commodity::new("USD", dec!(10));
        let err = a.add(&Commodity::new("EUR", dec!(1))).unwrap_err();
        assert!(matches!(err, CommodityError::Mismatch { .. }));
        // receiver untouched on failure
        assert_eq!(a.amount, dec!(10));
    }

    #[test]
    fn test_add_currency_flag_mismatch() {
        let mut a = Commodity::currency("$", dec!(10));
        assert!(a.add(&Commodity::new("$", dec!(1))).is_err());
    }

    #[test]
    fn test_subtract() {
        let mut a = Commodity::currency("$", dec!(10.00));
        a.subtract(&Commodity::currency("$", dec!(12.00))).unwrap();
        assert_eq!(a.amount, dec!(-2.00));
        assert!(a.is_negative());
    }

    #[test]
    fn test_invert_is_fresh() {
        let a = Commodity::new("USD", dec!(5.00)).with_total(true);
        let b = a.invert();
        assert_eq!(a.amount, dec!(5.00));
        assert_eq!(b.amount, dec!(-5.00));
        assert!(b.total);
        assert!(a.is_similar(&b));
    }

    #[test]
    fn test_make_similar() {
        let a = Commodity::currency("$", dec!(1.234)).with_fixprice(true);
        let b = a.make_similar(dec!(9));
        assert_eq!(b.name, "$");
        assert!(b.currency);
        assert!(b.fixprice);
        assert_eq!(b.precision, 3);
        assert_eq!(b.amount, dec!(9));
    }

    #[test]
    fn test_is_balanced_epsilon() {
        assert!(Commodity::new("USD", dec!(0.009)).is_balanced());
        assert!(Commodity::new("USD", dec!(-0.009)).is_balanced());
        assert!(!Commodity::new("USD", dec!(0.01)).is_balanced());
    }

    #[test]
    fn test_display() {
        assert_eq!(Commodity::currency("$", dec!(1234.5)).with_precision(2).to_string(), "$1234.50");
        assert_eq!(Commodity::currency("$", dec!(-3.00)).to_string(), "-$3.00");
        assert_eq!(Commodity::new("AAPL", dec!(10)).to_string(), "10 AAPL");
        assert_eq!(Commodity::new("", dec!(0)).to_string(), "0");
    }
}
