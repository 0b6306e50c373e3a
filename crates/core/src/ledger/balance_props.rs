//! Property-based tests for running balance lines.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use tally_shared::{Currency, Money};

use super::entry::{EntryType, Posting};
use super::general::GeneralLedger;
use crate::account::AccountType;

fn usd(cents: i64) -> Money {
    Money::from_minor(cents, Currency::Usd)
}

fn date(day: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(day)
}

/// (day, cents, debit cash?) for entries between cash and sales.
fn moves() -> impl Strategy<Value = Vec<(u64, i64, bool)>> {
    prop::collection::vec((0u64..30, 1i64..500_000, any::<bool>()), 1..40)
}

fn ledger(moves: &[(u64, i64, bool)]) -> GeneralLedger {
    let mut gl = GeneralLedger::new("Lines", Currency::Usd);
    gl.create_account("cash", "Cash", AccountType::Asset).unwrap();
    gl.create_account("sales", "Sales", AccountType::Revenue).unwrap();
    for &(day, cents, debit_cash) in moves {
        let postings = if debit_cash {
            vec![Posting::debit("cash", usd(cents)), Posting::credit("sales", usd(cents))]
        } else {
            vec![Posting::debit("sales", usd(cents)), Posting::credit("cash", usd(cents))]
        };
        gl.record(date(day), postings, None).unwrap();
    }
    gl
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Lines stay sorted and each one continues from the previous balance,
    /// even when entries arrive back-dated.
    #[test]
    fn prop_lines_chain_in_date_order(moves in moves()) {
        let gl = ledger(&moves);
        for code in ["cash", "sales"] {
            let normal = gl.account(code).unwrap().normal_balance();
            let lines = gl.lines(code).unwrap();
            prop_assert_eq!(lines.len(), moves.len());

            let mut running = usd(0);
            for pair in lines.windows(2) {
                prop_assert!((pair[0].date, pair[0].sequence) < (pair[1].date, pair[1].sequence));
            }
            for line in lines {
                prop_assert_eq!(line.previous_balance, running);
                let change = if line.entry_type == normal {
                    line.amount.amount_minor()
                } else {
                    -line.amount.amount_minor()
                };
                prop_assert_eq!(line.balance, usd(running.amount_minor() + change));
                running = line.balance;
            }
            prop_assert_eq!(gl.current_balance(code).unwrap(), running);
        }
    }

    /// Gross debits minus gross credits equals the signed balance.
    #[test]
    fn prop_gross_totals_match_balance(moves in moves(), check_day in 0u64..35) {
        let gl = ledger(&moves);
        let debits = gl.gross_debits("cash", date(check_day)).unwrap();
        let credits = gl.gross_credits("cash", date(check_day)).unwrap();
        prop_assert_eq!(
            gl.balance_as_of("cash", date(check_day)).unwrap(),
            debits.checked_sub(credits).unwrap()
        );
        prop_assert_eq!(gl.account("cash").unwrap().normal_balance(), EntryType::Debit);
    }

    /// Cash and sales always mirror each other.
    #[test]
    fn prop_two_account_mirror(moves in moves(), check_day in 0u64..35) {
        let gl = ledger(&moves);
        let cash = gl.balance_as_of("cash", date(check_day)).unwrap();
        let sales = gl.balance_as_of("sales", date(check_day)).unwrap();
        prop_assert_eq!(cash, sales);
    }
}
