//! Integration tests for filter expressions.

use plainledger_query::{compile, FilterExpr};
use proptest::prelude::*;

// ============================================================================
// Helper Functions
// ============================================================================

fn filter(tokens: &[&str]) -> FilterExpr {
    compile(tokens)
        .expect("filter should compile")
        .expect("filter should not be empty")
}

// ============================================================================
// Account and payee selection
// ============================================================================

#[test]
fn test_anchored_account_prefix() {
    let f = filter(&["^Assets:", "or", "^Liabilities:"]);
    assert!(f.matches("Assets:Checking"));
    assert!(f.matches("Liabilities:Visa"));
    assert!(!f.matches("Expenses:Assets:Misc"));
}

#[test]
fn test_payee_filter() {
    let f = filter(&["(Whole", "or", "Trader)", "and", "not", "Gas"]);
    assert!(f.matches("Whole Foods"));
    assert!(f.matches("Trader Joe's"));
    assert!(!f.matches("Whole Foods Gas Station"));
}

#[test]
fn test_nested_groups() {
    let f = filter(&["((Food", "or", "Dining)", "and", "Expenses)", "or", "Salary"]);
    assert!(f.matches("Expenses:Food"));
    assert!(f.matches("Income:Salary"));
    assert!(!f.matches("Liabilities:Dining"));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_not_inverts_match(word in "[A-Za-z]{1,8}", name in "[A-Za-z:]{0,20}") {
        prop_assume!(!["and", "or", "not"].contains(&word.as_str()));
        let plain = filter(&[word.as_str()]);
        let negated = filter(&["not", word.as_str()]);
        prop_assert_eq!(plain.matches(&name), !negated.matches(&name));
    }

    #[test]
    fn prop_and_is_intersection(a in "[A-Z]", b in "[A-Z]", name in "[A-Z]{0,10}") {
        let both = filter(&[a.as_str(), "and", b.as_str()]);
        prop_assert_eq!(
            both.matches(&name),
            filter(&[a.as_str()]).matches(&name) && filter(&[b.as_str()]).matches(&name)
        );
    }
}
