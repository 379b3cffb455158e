//! Integration tests for the parser crate.
//!
//! Tests cover transactions, postings, every directive block, price lines and
//! error recovery.

use chrono::NaiveDate;
use plainledger_core::{AccountKind, Directive, MetaValue, PostingAccount, State, Transaction};
use plainledger_parser::{parse_at, ParseErrorKind, ParseResult};
use rust_decimal_macros::dec;

// ============================================================================
// Helper Functions
// ============================================================================

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn parse_ok(source: &str) -> ParseResult {
    let result = parse_at(source, today());
    assert!(
        result.errors.is_empty(),
        "expected no errors, got: {:?}",
        result.errors
    );
    result
}

fn transactions(result: &ParseResult) -> Vec<&Transaction> {
    result
        .directives
        .iter()
        .filter_map(|d| match &d.value {
            Directive::Transaction(t) => Some(t),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Transactions
// ============================================================================

#[test]
fn test_transaction_header_fields() {
    let source = "2024/01/15=2024/01/17 * (1042) Grocery Store  ; weekly shop\n    Expenses:Food  $42.10\n    Assets:Checking\n";
    let result = parse_ok(source);
    let txns = transactions(&result);
    assert_eq!(txns.len(), 1);
    let txn = txns[0];
    assert_eq!(txn.date, date(2024, 1, 15));
    assert_eq!(txn.edate, Some(date(2024, 1, 17)));
    assert_eq!(txn.state, Some(State::Cleared));
    assert_eq!(txn.code.as_deref(), Some("1042"));
    assert_eq!(txn.payee, "Grocery Store");
    assert_eq!(txn.note.as_deref(), Some("weekly shop"));
    assert_eq!(txn.lines, (1, 3));
    assert_eq!(txn.fingerprint.len(), 64);
}

#[test]
fn test_postings_amount_forms_and_tally() {
    let source = "\
2024/02/01 Broker
    Assets:Broker  10 AAPL @ $150.00
    Assets:Cash  -$1,500.00
    Expenses:Fees
";
    let result = parse_ok(source);
    let txn = transactions(&result)[0];
    assert_eq!(txn.postings.len(), 3);

    let stock = &txn.postings[0];
    let qty = stock.commodity.as_ref().unwrap();
    assert_eq!(qty.name, "AAPL");
    assert_eq!(qty.amount, dec!(10));
    assert!(!qty.currency);
    assert_eq!(stock.cost_price.as_ref().unwrap().amount, dec!(150.00));

    let cash = txn.postings[1].commodity.as_ref().unwrap();
    assert!(cash.currency);
    assert_eq!(cash.amount, dec!(-1500.00));
    assert_eq!(cash.precision, 2);

    assert!(txn.postings[2].is_tally());
}

#[test]
fn test_virtual_account_forms() {
    let source = "\
2024/02/01 Budget
    (Budget:Food)  $-50
    [Savings:Goal]  $20
    [Assets:Cash]  $-20
";
    let result = parse_ok(source);
    let txn = transactions(&result)[0];
    assert_eq!(txn.postings[0].kind, AccountKind::Virtual);
    assert_eq!(txn.postings[0].account_name(), Some("Budget:Food"));
    assert_eq!(txn.postings[1].kind, AccountKind::BalancedVirtual);
    assert_eq!(txn.postings[1].account_name(), Some("Savings:Goal"));
}

#[test]
fn test_unknown_placeholder_account() {
    let source = "2024/03/01 Corner Deli\n    Expenses:Unknown  $12\n    Assets:Cash\n";
    let result = parse_ok(source);
    let txn = transactions(&result)[0];
    assert_eq!(
        txn.postings[0].account,
        PostingAccount::Unknown {
            prefix: Some("Expenses".into())
        }
    );
}

#[test]
fn test_posting_state_tags_and_metadata() {
    let source = "\
2024/03/02 ! Hardware Store
    ; :home:
    * Expenses:Tools  $30  ; project: shed
    ; receipt: 2024/03/02
    Assets:Cash
";
    let result = parse_ok(source);
    let txn = transactions(&result)[0];
    assert_eq!(txn.state, Some(State::Pending));
    assert_eq!(txn.tags, vec!["home"]);

    let tools = &txn.postings[0];
    assert_eq!(tools.state, Some(State::Cleared));
    assert_eq!(
        tools.meta.get("project"),
        Some(&MetaValue::String("shed".into()))
    );
    assert_eq!(
        tools.meta.get("receipt"),
        Some(&MetaValue::Date(date(2024, 3, 2)))
    );
}

#[test]
fn test_lot_annotations() {
    let source = "\
2024/04/01 Sell
    Assets:Broker  -5 AAPL {=$100} [2023/01/05] @@ $600 = 5 AAPL
    Assets:Cash
";
    let result = parse_ok(source);
    let p = &transactions(&result)[0].postings[0];
    let lot = p.lot_price.as_ref().unwrap();
    assert!(lot.fixprice);
    assert_eq!(lot.amount, dec!(100));
    assert_eq!(p.lot_date, Some(date(2023, 1, 5)));
    assert!(p.cost_price.as_ref().unwrap().total);
    assert_eq!(p.balance_price.as_ref().unwrap().amount, dec!(5));
}

#[test]
fn test_partial_dates_use_year_directive() {
    let source = "\
year 2011

03/04 Cafe
    Expenses:Coffee  $3
    Assets:Cash
";
    let result = parse_ok(source);
    assert!(matches!(result.directives[0].value, Directive::Year(2011)));
    assert_eq!(transactions(&result)[0].date, date(2011, 3, 4));
}

#[test]
fn test_partial_dates_default_to_current_year() {
    let result = parse_ok("05/06 Cafe\n    Expenses:Coffee  $3\n    Assets:Cash\n");
    assert_eq!(transactions(&result)[0].date, date(2024, 5, 6));
}

#[test]
fn test_identical_text_has_identical_fingerprint() {
    let block = "2024/01/01 Rent\n    Expenses:Rent  $900\n    Assets:Bank\n";
    let result = parse_ok(&format!("{block}\n{block}"));
    let txns = transactions(&result);
    assert_eq!(txns.len(), 2);
    assert_eq!(txns[0].fingerprint, txns[1].fingerprint);
    assert_eq!(txns[1].lines, (5, 7));
}

// ============================================================================
// Directives
// ============================================================================

#[test]
fn test_account_block() {
    let source = "\
account Expenses:Food
    note Groceries and dining
    alias food
    payee ^(Grocer|Market)
    check commodity == \"$\"
    assert amount < 1000
    eval 1
    type Expense
    default
";
    let result = parse_ok(source);
    let Directive::Account(decl) = &result.directives[0].value else {
        panic!("expected account directive");
    };
    assert_eq!(decl.name, "Expenses:Food");
    assert_eq!(decl.note.as_deref(), Some("Groceries and dining"));
    assert_eq!(decl.aliases, vec!["food"]);
    assert_eq!(decl.payees, vec!["^(Grocer|Market)"]);
    assert_eq!(decl.checks.len(), 1);
    assert_eq!(decl.asserts.len(), 1);
    assert_eq!(decl.evals, vec!["1"]);
    assert_eq!(decl.types, vec!["Expense"]);
    assert!(decl.is_default);
    assert_eq!(result.directives[0].span.last, 9);
}

#[test]
fn test_commodity_and_payee_blocks() {
    let source = "\
commodity $
    note US dollar
    format $1,000.00
    nomarket
    default
    currency

payee Whole Foods
    alias ^WFM
    uuid 2a2e21d434356f886c84371eebac6e44f1337fda
";
    let result = parse_ok(source);
    let Directive::Commodity(c) = &result.directives[0].value else {
        panic!("expected commodity directive");
    };
    assert_eq!(c.name, "$");
    assert_eq!(c.format.as_ref().unwrap().precision, 2);
    assert!(c.nomarket && c.is_default && c.currency);

    let Directive::Payee(p) = &result.directives[1].value else {
        panic!("expected payee directive");
    };
    assert_eq!(p.name, "Whole Foods");
    assert_eq!(p.aliases, vec!["^WFM"]);
    assert!(p.uuid.is_some());
}

#[test]
fn test_single_line_directives() {
    let source = "\
apply account Personal
alias cash=Assets:Cash
bucket Assets:Checking
capture Expenses:Medical  ^Expenses:Doctor
include other.ledger
assert 1 == 1
check 2 > 1
define rate=1.5
fixed CAD $0.90
end apply account
";
    let result = parse_ok(source);
    let values: Vec<_> = result.directives.iter().map(|d| d.value.clone()).collect();
    assert_eq!(values[0], Directive::ApplyAccount("Personal".into()));
    assert_eq!(
        values[1],
        Directive::Alias {
            name: "cash".into(),
            account: "Assets:Cash".into()
        }
    );
    assert_eq!(values[2], Directive::Bucket("Assets:Checking".into()));
    assert_eq!(
        values[3],
        Directive::Capture {
            account: "Expenses:Medical".into(),
            pattern: "^Expenses:Doctor".into()
        }
    );
    assert_eq!(values[4], Directive::Include("other.ledger".into()));
    assert_eq!(values[5], Directive::Assert("1 == 1".into()));
    assert_eq!(values[6], Directive::Check("2 > 1".into()));
    assert_eq!(
        values[7],
        Directive::Define {
            name: "rate".into(),
            expr: "1.5".into()
        }
    );
    assert!(matches!(&values[8], Directive::Fixed { commodity, .. } if commodity == "CAD"));
    assert_eq!(values[9], Directive::End);
}

#[test]
fn test_price_line() {
    let result = parse_ok("P 2024/05/01 10:30 AAPL $170.25\nP 2024/05/02 EUR 1.08 USD\n");
    let Directive::Price(p) = &result.directives[0].value else {
        panic!("expected price");
    };
    assert_eq!(p.commodity, "AAPL");
    assert_eq!(p.value.amount, dec!(170.25));
    assert_eq!(p.when.format("%H:%M").to_string(), "10:30");

    let Directive::Price(p) = &result.directives[1].value else {
        panic!("expected price");
    };
    assert_eq!(p.value.name, "USD");
}

#[test]
fn test_comment_lines_and_blocks() {
    let source = "\
; semicolon
# hash
% percent
| pipe
* star
comment
anything at all
  even indented
end comment
test balance
  output
end test
";
    let result = parse_ok(source);
    assert_eq!(result.directives.len(), 7);
    assert_eq!(
        result.directives[5].value,
        Directive::Comment("anything at all\n  even indented".into())
    );
    assert_eq!(result.directives[6].value, Directive::Test("  output".into()));
}

// ============================================================================
// Error Recovery
// ============================================================================

#[test]
fn test_bad_date_is_reported_and_parsing_continues() {
    let source = "\
2013/02/29 Leap
    Expenses:Food  $1
    Assets:Cash

2024/01/01 Fine
    Expenses:Food  $1
    Assets:Cash
";
    let result = parse_at(source, today());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].line(), 1);
    assert!(matches!(result.errors[0].kind, ParseErrorKind::InvalidDate(_)));
    assert_eq!(result.errors[0].text, "2013/02/29 Leap");
    assert_eq!(transactions(&result).len(), 1);
}

#[test]
fn test_bad_posting_carries_line_text() {
    let source = "2024/01/01 X\n    Expenses:Food  $1 (oops)\n    Assets:Cash\n";
    let result = parse_at(source, today());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].line(), 2);
    assert!(result.errors[0].text.contains("(oops)"));
}

#[test]
fn test_unknown_directive_and_stray_indent() {
    let result = parse_at("frobnicate now\n\n    orphan line\n", today());
    assert_eq!(result.errors.len(), 2);
    assert!(matches!(
        result.errors[0].kind,
        ParseErrorKind::UnknownDirective(ref k) if k == "frobnicate"
    ));
    assert_eq!(result.errors[1].kind, ParseErrorKind::UnexpectedIndent);
}

#[test]
fn test_unterminated_test_block() {
    let result = parse_at("test reg\n  output\n", today());
    assert_eq!(
        result.errors[0].kind,
        ParseErrorKind::UnterminatedBlock("test".into())
    );
}

#[test]
fn test_unknown_account_sub_directive() {
    let result = parse_at("account Assets:Cash\n    colour blue\n", today());
    assert_eq!(
        result.errors[0].kind,
        ParseErrorKind::UnknownSubDirective("colour".into())
    );
}
