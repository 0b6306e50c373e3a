//! The journal: every posted entry in chronological order.
//!
//! Entries are ordered by date, then by the sequence number they received
//! when appended. Appending in date order is amortized O(1); a back-dated
//! entry is inserted after every entry sharing or preceding its date.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tally_shared::{Currency, EntryId, Money};

use super::entry::{EntryType, JournalEntry, Posting};
use super::error::LedgerError;
use crate::account::ChartOfAccounts;

/// A date window with an exclusive start and an inclusive end.
///
/// Missing bounds are open. `between(d1, d2)` covers `d1 < date <= d2`, so
/// consecutive windows never count a day twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// Exclusive lower bound.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound.
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Every date.
    #[must_use]
    pub const fn all() -> Self {
        Self { from: None, to: None }
    }

    /// Dates on or before `to`.
    #[must_use]
    pub const fn up_to(to: NaiveDate) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }

    /// Dates strictly after `from`.
    #[must_use]
    pub const fn after(from: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    /// Dates in `(from, to]`.
    #[must_use]
    pub const fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// True when `date` falls in the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date > from) && self.to.is_none_or(|to| date <= to)
    }
}

#[derive(Debug, Clone)]
struct Recorded {
    sequence: u64,
    entry: JournalEntry,
}

/// Append-only, chronologically ordered log of journal entries.
#[derive(Debug, Clone)]
pub struct Journal {
    currency: Currency,
    records: Vec<Recorded>,
    keys: HashMap<EntryId, (NaiveDate, u64)>,
    next_sequence: u64,
    total_debits: Money,
    total_credits: Money,
}

impl Journal {
    /// An empty journal for entries in `currency`.
    #[must_use]
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            records: Vec::new(),
            keys: HashMap::new(),
            next_sequence: 0,
            total_debits: Money::zero(currency),
            total_credits: Money::zero(currency),
        }
    }

    /// Currency of every entry.
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Appends an entry and returns its sequence number.
    ///
    /// # Errors
    ///
    /// `DuplicateEntryId` if the entry is already present, `CurrencyMismatch`
    /// if it is in another currency, `MoneyOverflow` if the running totals
    /// would overflow. The journal is unchanged on error.
    pub fn append(&mut self, entry: JournalEntry) -> Result<u64, LedgerError> {
        if self.keys.contains_key(&entry.id()) {
            return Err(LedgerError::DuplicateEntryId(entry.id()));
        }
        if entry.currency() != self.currency {
            return Err(LedgerError::CurrencyMismatch {
                expected: self.currency,
                found: entry.currency(),
            });
        }
        let totals = entry.totals();
        let total_debits = self.total_debits.checked_add(totals.debit)?;
        let total_credits = self.total_credits.checked_add(totals.credit)?;

        let sequence = self.next_sequence;
        let date = entry.date();
        let position = self.insertion_point(date);

        self.next_sequence += 1;
        self.total_debits = total_debits;
        self.total_credits = total_credits;
        self.keys.insert(entry.id(), (date, sequence));
        self.records.insert(position, Recorded { sequence, entry });
        Ok(sequence)
    }

    /// Removes entry `id` and undoes its totals.
    ///
    /// Only used to back out an append whose follow-up checks failed.
    pub(crate) fn rollback(&mut self, id: EntryId) -> Option<JournalEntry> {
        let position = self.position_of(id)?;
        let Recorded { entry, .. } = self.records.remove(position);
        self.keys.remove(&id);
        let totals = entry.totals();
        if let (Ok(debits), Ok(credits)) = (
            self.total_debits.checked_sub(totals.debit),
            self.total_credits.checked_sub(totals.credit),
        ) {
            self.total_debits = debits;
            self.total_credits = credits;
        }
        Some(entry)
    }

    /// Sequence the next append will receive.
    pub(crate) fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    fn insertion_point(&self, date: NaiveDate) -> usize {
        if self.records.last().is_none_or(|last| last.entry.date() <= date) {
            return self.records.len();
        }
        self.records.partition_point(|r| r.entry.date() <= date)
    }

    fn position_of(&self, id: EntryId) -> Option<usize> {
        let key = *self.keys.get(&id)?;
        self.records
            .binary_search_by(|r| (r.entry.date(), r.sequence).cmp(&key))
            .ok()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when the entry is in the journal.
    #[must_use]
    pub fn contains(&self, id: EntryId) -> bool {
        self.keys.contains_key(&id)
    }

    /// Looks an entry up by id.
    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<&JournalEntry> {
        self.position_of(id).map(|i| &self.records[i].entry)
    }

    /// Sequence number assigned on append.
    #[must_use]
    pub fn sequence_of(&self, id: EntryId) -> Option<u64> {
        self.keys.get(&id).map(|&(_, sequence)| sequence)
    }

    /// Entries in (date, sequence) order.
    pub fn iter(
        &self,
    ) -> impl DoubleEndedIterator<Item = &JournalEntry> + ExactSizeIterator + Clone {
        self.records.iter().map(|r| &r.entry)
    }

    /// Sum of every debit posting.
    #[must_use]
    pub fn total_debits(&self) -> Money {
        self.total_debits
    }

    /// Sum of every credit posting.
    #[must_use]
    pub fn total_credits(&self) -> Money {
        self.total_credits
    }

    fn window(&self, range: DateRange) -> &[Recorded] {
        let start = range
            .from
            .map_or(0, |from| self.records.partition_point(|r| r.entry.date() <= from));
        let end = range.to.map_or(self.records.len(), |to| {
            self.records.partition_point(|r| r.entry.date() <= to)
        });
        &self.records[start..end.max(start)]
    }

    /// Entries dated within `range`, chronologically.
    pub fn entries_between(
        &self,
        range: DateRange,
    ) -> impl Iterator<Item = &JournalEntry> + Clone {
        self.window(range).iter().map(|r| &r.entry)
    }

    /// Postings to `account` dated within `range`, with their entries.
    ///
    /// The iterator is lazy and can be cloned to restart it.
    pub fn entries_affecting<'a>(
        &'a self,
        account: &'a str,
        range: DateRange,
    ) -> impl Iterator<Item = (&'a JournalEntry, &'a Posting)> + Clone + 'a {
        self.window(range).iter().flat_map(move |r| {
            r.entry
                .postings()
                .iter()
                .filter(move |p| p.account == account)
                .map(move |p| (&r.entry, p))
        })
    }

    /// Renders the journal using account names from `chart`.
    #[must_use]
    pub fn table<'a>(&'a self, chart: &'a ChartOfAccounts) -> JournalTable<'a> {
        JournalTable {
            journal: self,
            chart: Some(chart),
        }
    }
}

impl fmt::Display for Journal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = JournalTable {
            journal: self,
            chart: None,
        };
        fmt::Display::fmt(&table, f)
    }
}

const DATE_WIDTH: usize = 20;
const ACCOUNT_WIDTH: usize = 32;
const AMOUNT_WIDTH: usize = 16;
const CREDIT_INDENT: &str = "    ";

/// Chronological table view of a journal.
///
/// ```text
/// Date                Account                                    Debit          Credit
/// ========================================================================================
/// January 25, 2020    Cash                                      100.00
///                         Revenue                                               100.00
/// ----------------------------------------------------------------------------------------
/// ```
#[derive(Debug)]
pub struct JournalTable<'a> {
    journal: &'a Journal,
    chart: Option<&'a ChartOfAccounts>,
}

impl JournalTable<'_> {
    fn account_label<'b>(&'b self, posting: &'b Posting) -> &'b str {
        self.chart
            .and_then(|chart| chart.get(&posting.account))
            .map_or(posting.account.as_str(), |account| account.name())
    }
}

impl fmt::Display for JournalTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = DATE_WIDTH + ACCOUNT_WIDTH + 2 * AMOUNT_WIDTH;
        writeln!(
            f,
            "{:<DATE_WIDTH$}{:<ACCOUNT_WIDTH$}{:>AMOUNT_WIDTH$}{:>AMOUNT_WIDTH$}",
            "Date", "Account", "Debit", "Credit"
        )?;
        writeln!(f, "{}", "=".repeat(width))?;

        for entry in self.journal.iter() {
            let date = entry.date().format("%B %-d, %Y").to_string();
            let mut postings: Vec<&Posting> = entry.postings().iter().collect();
            postings.sort_by_key(|p| p.entry_type == EntryType::Credit);

            for (i, posting) in postings.into_iter().enumerate() {
                let shown_date = if i == 0 { date.as_str() } else { "" };
                let amount = posting.amount.format_amount();
                match posting.entry_type {
                    EntryType::Debit => writeln!(
                        f,
                        "{shown_date:<DATE_WIDTH$}{:<ACCOUNT_WIDTH$}{amount:>AMOUNT_WIDTH$}",
                        self.account_label(posting)
                    )?,
                    EntryType::Credit => writeln!(
                        f,
                        "{shown_date:<DATE_WIDTH$}{:<ACCOUNT_WIDTH$}{:>AMOUNT_WIDTH$}{amount:>AMOUNT_WIDTH$}",
                        format!("{CREDIT_INDENT}{}", self.account_label(posting)),
                        ""
                    )?,
                }
            }
            if let Some(memo) = entry.memo() {
                writeln!(f, "{:<DATE_WIDTH$}({memo})", "")?;
            }
            writeln!(f, "{}", "-".repeat(width))?;
        }
        Ok(())
    }
}
