//! Property-based tests for posting, balances and snapshots.
//!
//! Random sequences of entries, dated in any order, are posted to a fresh
//! general ledger and the results are compared with independent folds.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use tally_shared::{Currency, Money};

use super::entry::Posting;
use super::general::GeneralLedger;
use crate::account::AccountType;

const ACCOUNTS: [(&str, AccountType); 6] = [
    ("cash", AccountType::Asset),
    ("receivable", AccountType::Asset),
    ("payable", AccountType::Liability),
    ("capital", AccountType::Equity),
    ("sales", AccountType::Revenue),
    ("wages", AccountType::Expense),
];

/// One generated entry: a day offset and (debit, credit, cents) legs.
#[derive(Debug, Clone)]
struct GenEntry {
    day: u64,
    legs: Vec<(usize, usize, i64)>,
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn date(day: u64) -> NaiveDate {
    base_date() + Days::new(day)
}

fn usd(cents: i64) -> Money {
    Money::from_minor(cents, Currency::Usd)
}

fn entry_strategy() -> impl Strategy<Value = GenEntry> {
    (
        0u64..60,
        prop::collection::vec((0..ACCOUNTS.len(), 0..ACCOUNTS.len(), 1i64..1_000_000), 1..4),
    )
        .prop_map(|(day, legs)| GenEntry { day, legs })
}

fn entries_strategy(max_len: usize) -> impl Strategy<Value = Vec<GenEntry>> {
    prop::collection::vec(entry_strategy(), 1..=max_len)
}

fn postings(generated: &GenEntry) -> Vec<Posting> {
    generated.legs
        .iter()
        .flat_map(|&(debit, credit, cents)| {
            [
                Posting::debit(ACCOUNTS[debit].0, usd(cents)),
                Posting::credit(ACCOUNTS[credit].0, usd(cents)),
            ]
        })
        .collect()
}

fn ledger_with(entries: &[GenEntry]) -> GeneralLedger {
    let mut gl = GeneralLedger::new("Props", Currency::Usd);
    for (code, account_type) in ACCOUNTS {
        gl.create_account(code, code, account_type).unwrap();
    }
    for generated in entries {
        gl.record(date(generated.day), postings(generated), None).unwrap();
    }
    gl
}

/// Balance computed straight from the generated data.
fn expected_balance(entries: &[GenEntry], account: usize, as_of: u64) -> i64 {
    let debit_normal = ACCOUNTS[account].1.normal_balance() == super::entry::EntryType::Debit;
    entries
        .iter()
        .filter(|s| s.day <= as_of)
        .flat_map(|s| s.legs.iter())
        .map(|&(debit, credit, cents)| {
            let mut change = 0;
            if debit == account {
                change += cents;
            }
            if credit == account {
                change -= cents;
            }
            if debit_normal { change } else { -change }
        })
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// After every post the journal's debits equal its credits.
    #[test]
    fn prop_trial_balance_holds_after_every_post(entries in entries_strategy(20)) {
        let mut gl = GeneralLedger::new("Props", Currency::Usd);
        for (code, account_type) in ACCOUNTS {
            gl.create_account(code, code, account_type).unwrap();
        }
        for generated in &entries {
            gl.record(date(generated.day), postings(generated), None).unwrap();
            prop_assert!(gl.is_balanced());
            prop_assert!(gl.trial_balance(date(generated.day)).unwrap().is_balanced());
        }
    }

    /// Running balances equal the journal fold and the raw data for every
    /// account and date, whatever order entries were posted in.
    #[test]
    fn prop_running_balance_matches_fold(
        entries in entries_strategy(25),
        check_days in prop::collection::vec(0u64..70, 1..8),
    ) {
        let gl = ledger_with(&entries);
        for as_of in check_days {
            for (i, (code, _)) in ACCOUNTS.iter().enumerate() {
                let running = gl.balance_as_of(code, date(as_of)).unwrap();
                let folded = gl.fold_balance_as_of(code, date(as_of)).unwrap();
                prop_assert_eq!(running, folded, "{} on day {}", code, as_of);
                prop_assert_eq!(running, usd(expected_balance(&entries, i, as_of)));
            }
        }
        prop_assert!(gl.verify().is_ok());
    }

    /// Posting the same entries in a different order gives the same balances.
    #[test]
    fn prop_balances_independent_of_post_order(entries in entries_strategy(15)) {
        let forward = ledger_with(&entries);
        let mut reversed_entries = entries.clone();
        reversed_entries.reverse();
        let backward = ledger_with(&reversed_entries);

        for day in [0, 15, 30, 59] {
            prop_assert_eq!(
                forward.trial_balance(date(day)).unwrap(),
                backward.trial_balance(date(day)).unwrap()
            );
        }
    }

    /// Restoring a snapshot preserves the trial balance at any date.
    #[test]
    fn prop_snapshot_restore_preserves_trial_balance(
        entries in entries_strategy(15),
        check_day in 0u64..70,
    ) {
        let gl = ledger_with(&entries);
        let json = gl.snapshot().to_json().unwrap();
        let restored = GeneralLedger::restore(super::snapshot::Snapshot::from_json(&json).unwrap()).unwrap();
        prop_assert_eq!(
            restored.trial_balance(date(check_day)).unwrap(),
            gl.trial_balance(date(check_day)).unwrap()
        );
        prop_assert_eq!(restored.journal().len(), gl.journal().len());
    }

    /// Reversing every entry returns every account to zero.
    #[test]
    fn prop_reversals_zero_every_account(entries in entries_strategy(10)) {
        let mut gl = ledger_with(&entries);
        let ids: Vec<_> = gl.journal().iter().map(super::entry::JournalEntry::id).collect();
        for id in ids {
            gl.reverse(id, date(90), None).unwrap();
        }
        for (code, _) in ACCOUNTS {
            prop_assert!(gl.current_balance(code).unwrap().is_zero());
        }
    }
}
