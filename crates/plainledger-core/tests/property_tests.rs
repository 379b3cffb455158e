//! Property-based tests for plainledger-core.
//!
//! Run with: cargo test -p plainledger-core --test `property_tests`

use chrono::{NaiveDate, NaiveDateTime};
use plainledger_core::{Account, Commodity, DoubleEntry, Inclusivity, TimeStore};
use proptest::prelude::*;
use rust_decimal::Decimal;

// ============================================================================
// Arbitrary generators
// ============================================================================

fn arb_decimal() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("USD".to_string()),
        Just("EUR".to_string()),
        Just("AAPL".to_string()),
        Just("BTC".to_string()),
    ]
}

fn arb_commodity() -> impl Strategy<Value = Commodity> {
    (arb_decimal(), arb_name()).prop_map(|(n, c)| Commodity::new(c, n))
}

fn arb_timestamp() -> impl Strategy<Value = NaiveDateTime> {
    (2020i32..2025i32, 1u32..13u32, 1u32..29u32).prop_map(|(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    })
}

// ============================================================================
// Commodity arithmetic
// ============================================================================

proptest! {
    #[test]
    fn prop_add_then_subtract_is_identity(a in arb_decimal(), b in arb_decimal()) {
        let mut c = Commodity::new("USD", a);
        let other = Commodity::new("USD", b);
        c.add(&other).unwrap();
        c.subtract(&other).unwrap();
        prop_assert_eq!(c.amount, a);
    }

    #[test]
    fn prop_add_is_commutative(a in arb_decimal(), b in arb_decimal()) {
        let mut left = Commodity::new("USD", a);
        left.add(&Commodity::new("USD", b)).unwrap();
        let mut right = Commodity::new("USD", b);
        right.add(&Commodity::new("USD", a)).unwrap();
        prop_assert_eq!(left.amount, right.amount);
    }

    #[test]
    fn prop_invert_twice_is_identity(c in arb_commodity()) {
        prop_assert_eq!(c.invert().invert(), c);
    }

    #[test]
    fn prop_mismatched_names_never_combine(a in arb_commodity(), b in arb_commodity()) {
        let mut left = a.clone();
        let result = left.add(&b);
        prop_assert_eq!(result.is_ok(), a.name == b.name);
        if result.is_err() {
            prop_assert_eq!(left, a);
        }
    }
}

// ============================================================================
// Double-entry aggregates
// ============================================================================

proptest! {
    #[test]
    fn prop_balance_is_debits_minus_credits(values in prop::collection::vec(arb_decimal(), 1..30)) {
        let mut de = DoubleEntry::new();
        for v in &values {
            de.add_balance(&Commodity::new("USD", *v)).unwrap();
        }
        let debit = de.debits().first().map_or(Decimal::ZERO, |c| c.amount);
        let credit = de.credits().first().map_or(Decimal::ZERO, |c| c.amount);
        let balance = de.balance("USD").unwrap().amount;
        prop_assert_eq!(balance, debit - credit);
        prop_assert!(debit >= Decimal::ZERO);
        prop_assert!(credit >= Decimal::ZERO);
    }

    #[test]
    fn prop_account_balances_sorted(items in prop::collection::vec(arb_commodity(), 1..20)) {
        let mut acc = Account::new("Assets:Mixed");
        for c in &items {
            acc.add_balance(c).unwrap();
        }
        let names: Vec<_> = acc.balances().iter().map(|c| c.name.clone()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(names, sorted);
    }
}

// ============================================================================
// Time store
// ============================================================================

proptest! {
    #[test]
    fn prop_timestore_iterates_in_order(stamps in prop::collection::vec(arb_timestamp(), 0..50)) {
        let mut store = TimeStore::new();
        for (i, ts) in stamps.iter().enumerate() {
            store.insert(*ts, i);
        }
        prop_assert_eq!(store.len(), stamps.len());
        let seen: Vec<_> = store.iter().map(|(ts, _)| *ts).collect();
        prop_assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn prop_range_matches_filter(
        stamps in prop::collection::vec(arb_timestamp(), 0..50),
        low in arb_timestamp(),
        high in arb_timestamp(),
    ) {
        let mut store = TimeStore::new();
        for ts in &stamps {
            store.insert(*ts, ());
        }
        let expected = stamps.iter().filter(|ts| **ts > low && **ts < high).count();
        prop_assert_eq!(store.range(Some(low), Some(high), Inclusivity::None).count(), expected);

        let expected = stamps.iter().filter(|ts| **ts >= low && **ts <= high).count();
        prop_assert_eq!(store.range(Some(low), Some(high), Inclusivity::Both).count(), expected);
    }
}
