//! Property tests for autobalancing.

use plainledger_booking::{autobalance, calculate_residual, is_balanced};
use plainledger_core::{Commodity, NaiveDate, Posting, Transaction};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn base() -> Transaction {
    Transaction::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), "Generated")
}

fn cents(c: i64) -> Commodity {
    Commodity::currency("$", Decimal::new(c, 2))
}

proptest! {
    #[test]
    fn prop_tally_balances_single_commodity(amounts in prop::collection::vec(-1_000_000i64..1_000_000, 1..8)) {
        let mut txn = amounts
            .iter()
            .enumerate()
            .fold(base(), |t, (i, c)| t.with_posting(Posting::new(format!("Expenses:E{i}"), cents(*c))))
            .with_posting(Posting::tally("Assets:Cash"));

        autobalance(&mut txn, None, &cents(0)).unwrap();

        let residual = calculate_residual(&txn).unwrap();
        prop_assert_eq!(residual.len(), 1);
        prop_assert!(residual[0].amount.abs() <= Decimal::new(9, 3));
        prop_assert!(is_balanced(&txn).unwrap());
    }

    #[test]
    fn prop_bucket_offsets_exactly(c in -1_000_000i64..1_000_000) {
        let mut txn = base().with_posting(Posting::new("Expenses:Rent", cents(c)));
        autobalance(&mut txn, Some("Assets:Checking"), &cents(0)).unwrap();

        prop_assert_eq!(txn.postings.len(), 2);
        let offset = txn.postings[1].commodity.as_ref().unwrap();
        prop_assert_eq!(offset.amount, -Decimal::new(c, 2));
        prop_assert!(calculate_residual(&txn).unwrap()[0].is_zero());
    }
}
