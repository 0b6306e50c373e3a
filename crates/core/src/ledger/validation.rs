//! Business rule validation for journal entries.

use tally_shared::Money;

use super::entry::{EntryTotals, EntryType, Posting};
use super::error::LedgerError;
use crate::account::ChartOfAccounts;

/// Whether archived accounts may receive postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccountPolicy {
    /// Caller-supplied entries: archived accounts are rejected.
    RequireActive,
    /// Replays and carry-forwards of existing balances.
    AllowArchived,
}

/// Validates a set of postings and returns their totals.
///
/// Rules are checked in a fixed order so the first broken rule is the one
/// reported:
/// 1. At least 2 postings
/// 2. Every amount strictly positive
/// 3. Every account registered (and active, under `RequireActive`)
/// 4. One currency across all postings
/// 5. Debits equal credits
pub(crate) fn validate_postings(
    chart: &ChartOfAccounts,
    postings: &[Posting],
    policy: AccountPolicy,
) -> Result<EntryTotals, LedgerError> {
    if postings.len() < 2 {
        return Err(LedgerError::InsufficientPostings {
            count: postings.len(),
        });
    }

    if let Some(bad) = postings.iter().find(|p| !p.amount.is_positive()) {
        return Err(LedgerError::NonPositiveAmount {
            account: bad.account.clone(),
            amount: bad.amount,
        });
    }

    for posting in postings {
        let account = chart.require(&posting.account)?;
        if policy == AccountPolicy::RequireActive && account.is_archived() {
            return Err(LedgerError::ArchivedAccount(posting.account.clone()));
        }
    }

    let currency = postings[0].amount.currency();
    if let Some(other) = postings.iter().find(|p| p.amount.currency() != currency) {
        return Err(LedgerError::CurrencyMismatch {
            expected: currency,
            found: other.amount.currency(),
        });
    }

    let side_total = |side: EntryType| {
        Money::sum(
            currency,
            postings
                .iter()
                .filter(move |p| p.entry_type == side)
                .map(|p| p.amount),
        )
    };
    let totals = EntryTotals {
        debit: side_total(EntryType::Debit)?,
        credit: side_total(EntryType::Credit)?,
    };

    if !totals.is_balanced() {
        return Err(LedgerError::UnbalancedEntry {
            debit: totals.debit,
            credit: totals.credit,
            delta: totals.difference()?,
        });
    }

    Ok(totals)
}
