//! Property-based tests for journal entry validation rules.

use proptest::prelude::*;
use tally_shared::{Currency, Money};

use super::entry::{EntryTotals, EntryType, Posting};
use super::error::LedgerError;
use super::validation::{AccountPolicy, validate_postings};
use crate::account::{AccountType, ChartOfAccounts};

const ACCOUNTS: [&str; 4] = ["cash", "bank", "sales", "fees"];

fn chart() -> ChartOfAccounts {
    let mut chart = ChartOfAccounts::new();
    chart.create("cash", "Cash", AccountType::Asset).unwrap();
    chart.create("bank", "Bank", AccountType::Asset).unwrap();
    chart.create("sales", "Sales", AccountType::Revenue).unwrap();
    chart.create("fees", "Fees", AccountType::Expense).unwrap();
    chart
}

/// Strategy to generate a valid positive amount in cents (0.01 to 1,000,000.00).
fn positive_cents() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

fn account() -> impl Strategy<Value = &'static str> {
    prop::sample::select(&ACCOUNTS[..])
}

fn entry_type_strategy() -> impl Strategy<Value = EntryType> {
    prop_oneof![Just(EntryType::Debit), Just(EntryType::Credit)]
}

fn usd(cents: i64) -> Money {
    Money::from_minor(cents, Currency::Usd)
}

/// Cuts `total` at the given points into positive amounts summing back to it.
fn split(total: i64, cuts: &[i64]) -> Vec<i64> {
    let mut points: Vec<i64> = cuts.iter().map(|c| c.rem_euclid(total)).collect();
    points.push(0);
    points.push(total);
    points.sort_unstable();
    points.dedup();
    points.windows(2).map(|w| w[1] - w[0]).collect()
}

fn validate(postings: &[Posting]) -> Result<EntryTotals, LedgerError> {
    validate_postings(&chart(), postings, AccountPolicy::RequireActive)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Balanced entries
    // =========================================================================

    /// Any split of one total into debits and another split of the same total
    /// into credits forms a valid compound entry.
    #[test]
    fn prop_balanced_splits_accepted(
        total in 2i64..10_000_000i64,
        debit_cuts in prop::collection::vec(any::<i64>(), 0..4),
        credit_cuts in prop::collection::vec(any::<i64>(), 0..4),
        debit_account in account(),
        credit_account in account(),
    ) {
        let mut postings: Vec<Posting> = split(total, &debit_cuts)
            .into_iter()
            .map(|c| Posting::debit(debit_account, usd(c)))
            .collect();
        postings.extend(
            split(total, &credit_cuts)
                .into_iter()
                .map(|c| Posting::credit(credit_account, usd(c))),
        );

        let totals = validate(&postings).unwrap();
        prop_assert_eq!(totals.debit, usd(total));
        prop_assert_eq!(totals.credit, usd(total));
    }

    /// Unequal sides are rejected and the delta is debit minus credit.
    #[test]
    fn prop_unbalanced_reports_delta(
        debit in positive_cents(),
        credit in positive_cents(),
    ) {
        prop_assume!(debit != credit);
        let result = validate(&[
            Posting::debit("cash", usd(debit)),
            Posting::credit("sales", usd(credit)),
        ]);
        prop_assert_eq!(
            result,
            Err(LedgerError::UnbalancedEntry {
                debit: usd(debit),
                credit: usd(credit),
                delta: usd(debit - credit),
            })
        );
    }

    // =========================================================================
    // Rejected postings
    // =========================================================================

    /// A zero or negative amount anywhere is rejected.
    #[test]
    fn prop_non_positive_amount_rejected(
        bad in -100_000_000i64..=0i64,
        good in positive_cents(),
        entry_type in entry_type_strategy(),
    ) {
        let bad = Posting::debit("cash", usd(bad));
        let good = Posting::credit("sales", usd(good));
        let postings = match entry_type {
            EntryType::Debit => vec![bad, good],
            EntryType::Credit => vec![good.reversed(), bad.reversed()],
        };
        let result = validate(&postings);
        prop_assert!(
            matches!(result, Err(LedgerError::NonPositiveAmount { .. })),
            "Non-positive amount should be rejected, got: {:?}",
            result
        );
    }

    /// A single posting never forms an entry.
    #[test]
    fn prop_single_posting_rejected(
        amount in positive_cents(),
        entry_type in entry_type_strategy(),
        code in account(),
    ) {
        let posting = Posting {
            account: code.to_string(),
            entry_type,
            amount: usd(amount),
            memo: None,
        };
        prop_assert_eq!(
            validate(&[posting]),
            Err(LedgerError::InsufficientPostings { count: 1 })
        );
    }

    /// Postings in one direction only can never balance.
    #[test]
    fn prop_single_sided_rejected(
        amounts in prop::collection::vec(positive_cents(), 2..6),
        entry_type in entry_type_strategy(),
    ) {
        let postings: Vec<Posting> = amounts
            .iter()
            .map(|&c| match entry_type {
                EntryType::Debit => Posting::debit("cash", usd(c)),
                EntryType::Credit => Posting::credit("cash", usd(c)),
            })
            .collect();
        let result = validate(&postings);
        prop_assert!(
            matches!(result, Err(LedgerError::UnbalancedEntry { .. })),
            "Single-sided entry should be unbalanced, got: {:?}",
            result
        );
    }
}
