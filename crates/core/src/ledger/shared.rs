//! Thread-safe handle to a general ledger.

use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;
use tally_shared::{EntryId, Money};

use super::entry::{JournalEntry, Posting};
use super::error::LedgerError;
use super::general::GeneralLedger;
use super::report::TrialBalance;
use super::snapshot::Snapshot;

/// Single-writer, multi-reader access to one [`GeneralLedger`].
///
/// Writers hold the write lock for the whole validate-append-index step, so
/// readers always observe a ledger between posts. Clones share the ledger.
#[derive(Debug, Clone)]
pub struct SharedGeneralLedger {
    inner: Arc<RwLock<GeneralLedger>>,
}

impl SharedGeneralLedger {
    /// Wraps a ledger.
    #[must_use]
    pub fn new(ledger: GeneralLedger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    /// Runs `f` under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&GeneralLedger) -> R) -> R {
        f(&self.inner.read())
    }

    /// Runs `f` under the write lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut GeneralLedger) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Posts an entry.
    pub fn post(&self, entry: JournalEntry) -> Result<EntryId, LedgerError> {
        self.inner.write().post(entry)
    }

    /// Creates and posts an entry under one write lock.
    pub fn record(
        &self,
        date: NaiveDate,
        postings: Vec<Posting>,
        memo: Option<String>,
    ) -> Result<EntryId, LedgerError> {
        self.inner.write().record(date, postings, memo)
    }

    /// Balance of `code` as of `date`.
    pub fn balance_as_of(&self, code: &str, date: NaiveDate) -> Result<Money, LedgerError> {
        self.inner.read().balance_as_of(code, date)
    }

    /// Trial balance as of `date`.
    pub fn trial_balance(&self, date: NaiveDate) -> Result<TrialBalance, LedgerError> {
        self.inner.read().trial_balance(date)
    }

    /// True when the journal balances.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.inner.read().is_balanced()
    }

    /// Closes the period.
    pub fn close(&self) {
        self.inner.write().close();
    }

    /// Consistent snapshot of the ledger.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.inner.read().snapshot()
    }

    /// Returns the ledger if this is the last handle.
    pub fn try_unwrap(self) -> Result<GeneralLedger, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl From<GeneralLedger> for SharedGeneralLedger {
    fn from(ledger: GeneralLedger) -> Self {
        Self::new(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountType;
    use std::thread;
    use tally_shared::Currency;

    fn usd(cents: i64) -> Money {
        Money::from_minor(cents, Currency::Usd)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn shared() -> SharedGeneralLedger {
        let mut gl = GeneralLedger::new("Shared", Currency::Usd);
        gl.create_account("cash", "Cash", AccountType::Asset).unwrap();
        gl.create_account("sales", "Sales", AccountType::Revenue).unwrap();
        gl.into()
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let ledger = shared();
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let ledger = ledger.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        ledger
                            .record(
                                day(),
                                vec![Posting::debit("cash", usd(100)), Posting::credit("sales", usd(100))],
                                None,
                            )
                            .unwrap();
                    }
                })
            })
            .collect();
        let readers: Vec<_> = (0..2)
            .map(|_| {
                let ledger = ledger.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        assert!(ledger.is_balanced());
                        let cash = ledger.balance_as_of("cash", day()).unwrap();
                        let sales = ledger.balance_as_of("sales", day()).unwrap();
                        assert!(cash.amount_minor() % 100 == 0);
                        assert!(sales.amount_minor() % 100 == 0);
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }

        assert_eq!(ledger.balance_as_of("cash", day()).unwrap(), usd(10_000));
        assert!(ledger.trial_balance(day()).unwrap().is_balanced());
        assert_eq!(ledger.read(|gl| gl.journal().len()), 100);
    }

    #[test]
    fn test_closed_shared_ledger() {
        let ledger = shared();
        ledger.close();
        assert_eq!(
            ledger.record(
                day(),
                vec![Posting::debit("cash", usd(1)), Posting::credit("sales", usd(1))],
                None,
            ),
            Err(LedgerError::LedgerClosed)
        );
        assert_eq!(ledger.snapshot().entries.len(), 0);
    }

    #[test]
    fn test_try_unwrap() {
        let ledger = shared();
        let other = ledger.clone();
        let ledger = ledger.try_unwrap().unwrap_err();
        drop(other);
        let gl = ledger.try_unwrap().unwrap();
        assert_eq!(gl.name(), "Shared");
    }
}
