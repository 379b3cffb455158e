//! Filter expression tree.

use regex::Regex;
use std::fmt;

/// A compiled filter expression.
///
/// Nodes are immutable once built; evaluation never allocates.
#[derive(Debug, Clone)]
pub enum FilterExpr {
    /// Unanchored regular-expression search.
    Match(Regex),
    /// Both operands match.
    And(Box<FilterExpr>, Box<FilterExpr>),
    /// Either operand matches.
    Or(Box<FilterExpr>, Box<FilterExpr>),
    /// The operand does not match.
    Not(Box<FilterExpr>),
}

impl FilterExpr {
    /// Create an AND node.
    #[must_use]
    pub fn and(left: Self, right: Self) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    /// Create an OR node.
    #[must_use]
    pub fn or(left: Self, right: Self) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    /// Create a NOT node.
    #[must_use]
    pub fn not(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Evaluate the expression against `name`.
    ///
    /// `and`/`or` short-circuit left to right.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Match(re) => re.is_match(name),
            Self::And(l, r) => l.matches(name) && r.matches(name),
            Self::Or(l, r) => l.matches(name) || r.matches(name),
            Self::Not(inner) => !inner.matches(name),
        }
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match(re) => write!(f, "/{}/", re.as_str()),
            Self::And(l, r) => write!(f, "({l} and {r})"),
            Self::Or(l, r) => write!(f, "({l} or {r})"),
            Self::Not(inner) => write!(f, "not {inner}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(pattern: &str) -> FilterExpr {
        FilterExpr::Match(Regex::new(pattern).unwrap())
    }

    #[test]
    fn test_match_is_unanchored() {
        assert!(m("Chat").matches("Expenses:Chats"));
        assert!(!m("^Chat").matches("Expenses:Chats"));
    }

    #[test]
    fn test_boolean_nodes() {
        let e = FilterExpr::and(m("Expenses"), FilterExpr::not(m("Food")));
        assert!(e.matches("Expenses:Travel"));
        assert!(!e.matches("Expenses:Food"));
        assert!(!e.matches("Income:Salary"));

        let e = FilterExpr::or(m("Income"), m("Travel"));
        assert!(e.matches("Expenses:Travel"));
        assert!(e.matches("Income"));
    }

    #[test]
    fn test_display() {
        let e = FilterExpr::or(FilterExpr::and(m("a"), m("b")), FilterExpr::not(m("c")));
        assert_eq!(e.to_string(), "((/a/ and /b/) or not /c/)");
    }
}
