//! Per-account ledgers with running balances.
//!
//! Every posting to an account becomes a [`LedgerLine`] carrying the
//! balance before and after it, measured from the account's normal side:
//! - Asset/Expense: balance += debit - credit (debit-normal)
//! - Liability/Equity/Revenue: balance += credit - debit (credit-normal)
//!
//! Lines stay in (date, journal sequence) order. Updates are computed in a
//! [`StagedPost`] without touching the ledgers and applied by
//! [`LedgerBook::commit`], which cannot fail.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tally_shared::{Currency, EntryId, Money};

use super::entry::{EntryType, JournalEntry};
use super::error::LedgerError;
use super::journal::{DateRange, Journal};

/// One posting as seen from its account.
///
/// `balance` always equals `previous_balance` plus the posting's effect,
/// and `previous_balance` equals the prior line's `balance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    /// Entry date.
    pub date: NaiveDate,
    /// Entry the posting belongs to.
    pub entry_id: EntryId,
    /// Journal sequence of the entry.
    pub sequence: u64,
    /// Posting side.
    pub entry_type: EntryType,
    /// Posting amount.
    pub amount: Money,
    /// Balance before this line.
    pub previous_balance: Money,
    /// Balance after this line.
    pub balance: Money,
}

impl LedgerLine {
    fn key(&self) -> (NaiveDate, u64) {
        (self.date, self.sequence)
    }
}

/// The ledger of a single account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    code: String,
    normal_balance: EntryType,
    currency: Currency,
    lines: Vec<LedgerLine>,
    gross_debits: Money,
    gross_credits: Money,
}

impl Ledger {
    fn new(code: String, normal_balance: EntryType, currency: Currency) -> Self {
        Self {
            code,
            normal_balance,
            currency,
            lines: Vec::new(),
            gross_debits: Money::zero(currency),
            gross_credits: Money::zero(currency),
        }
    }

    /// Account code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Side that increases the balance.
    #[must_use]
    pub fn normal_balance(&self) -> EntryType {
        self.normal_balance
    }

    /// Lines in (date, sequence) order.
    #[must_use]
    pub fn lines(&self) -> &[LedgerLine] {
        &self.lines
    }

    /// Balance after every posting.
    #[must_use]
    pub fn current_balance(&self) -> Money {
        self.lines
            .last()
            .map_or(Money::zero(self.currency), |line| line.balance)
    }

    /// Balance including every posting dated on or before `date`.
    #[must_use]
    pub fn balance_as_of(&self, date: NaiveDate) -> Money {
        let end = self.lines.partition_point(|line| line.date <= date);
        end.checked_sub(1)
            .map_or(Money::zero(self.currency), |i| self.lines[i].balance)
    }

    /// All-time debit total.
    #[must_use]
    pub fn gross_debits(&self) -> Money {
        self.gross_debits
    }

    /// All-time credit total.
    #[must_use]
    pub fn gross_credits(&self) -> Money {
        self.gross_credits
    }

    /// Sum of `side` postings dated on or before `date`.
    pub fn gross_as_of(&self, side: EntryType, date: NaiveDate) -> Result<Money, LedgerError> {
        let end = self.lines.partition_point(|line| line.date <= date);
        Ok(Money::sum(
            self.currency,
            self.lines[..end]
                .iter()
                .filter(|line| line.entry_type == side)
                .map(|line| line.amount),
        )?)
    }

    fn stage(
        &self,
        postings: &[(EntryType, Money)],
        date: NaiveDate,
        entry_id: EntryId,
        sequence: u64,
    ) -> Result<StagedLedger, LedgerError> {
        let key = (date, sequence);
        let position = self.lines.partition_point(|line| line.key() <= key);
        let mut running = position
            .checked_sub(1)
            .map_or(Money::zero(self.currency), |i| self.lines[i].balance);

        let mut gross_debits = self.gross_debits;
        let mut gross_credits = self.gross_credits;
        let mut tail = Vec::with_capacity(postings.len() + self.lines.len() - position);

        for &(entry_type, amount) in postings {
            match entry_type {
                EntryType::Debit => gross_debits = gross_debits.checked_add(amount)?,
                EntryType::Credit => gross_credits = gross_credits.checked_add(amount)?,
            }
            let previous_balance = running;
            running = running.checked_add(entry_type.effect_on(amount, self.normal_balance)?)?;
            tail.push(LedgerLine {
                date,
                entry_id,
                sequence,
                entry_type,
                amount,
                previous_balance,
                balance: running,
            });
        }

        // Later lines shift by the inserted lines' net effect.
        for line in &self.lines[position..] {
            let previous_balance = running;
            let change = line.entry_type.effect_on(line.amount, self.normal_balance)?;
            running = running.checked_add(change)?;
            tail.push(LedgerLine {
                previous_balance,
                balance: running,
                ..*line
            });
        }

        Ok(StagedLedger {
            code: self.code.clone(),
            position,
            tail,
            gross_debits,
            gross_credits,
        })
    }

    fn apply(&mut self, staged: StagedLedger) {
        self.lines.truncate(staged.position);
        self.lines.extend(staged.tail);
        self.gross_debits = staged.gross_debits;
        self.gross_credits = staged.gross_credits;
    }
}

#[derive(Debug)]
struct StagedLedger {
    code: String,
    position: usize,
    tail: Vec<LedgerLine>,
    gross_debits: Money,
    gross_credits: Money,
}

/// Ledger updates for one entry, computed but not yet applied.
#[derive(Debug)]
#[must_use]
pub(crate) struct StagedPost {
    ledgers: Vec<StagedLedger>,
}

/// The ledgers of every account in a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerBook {
    currency: Currency,
    ledgers: HashMap<String, Ledger>,
}

impl LedgerBook {
    /// An empty book in `currency`.
    #[must_use]
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            ledgers: HashMap::new(),
        }
    }

    /// Currency of every balance.
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Starts an empty ledger for `code`; existing ledgers are kept.
    pub(crate) fn open(&mut self, code: &str, normal_balance: EntryType) {
        if !self.ledgers.contains_key(code) {
            self.ledgers.insert(
                code.to_string(),
                Ledger::new(code.to_string(), normal_balance, self.currency),
            );
        }
    }

    /// The ledger of `code`.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&Ledger> {
        self.ledgers.get(code)
    }

    /// Like [`get`](Self::get) but fails with `UnknownAccount`.
    pub fn require(&self, code: &str) -> Result<&Ledger, LedgerError> {
        self.get(code)
            .ok_or_else(|| LedgerError::UnknownAccount(code.to_string()))
    }

    /// Balance of `code` as of `date`.
    pub fn balance_as_of(&self, code: &str, date: NaiveDate) -> Result<Money, LedgerError> {
        Ok(self.require(code)?.balance_as_of(date))
    }

    /// Computes the updates `entry` would cause without applying them.
    pub(crate) fn stage(
        &self,
        entry: &JournalEntry,
        sequence: u64,
    ) -> Result<StagedPost, LedgerError> {
        let mut grouped: Vec<(&str, Vec<(EntryType, Money)>)> = Vec::new();
        for posting in entry.postings() {
            if posting.amount.currency() != self.currency {
                return Err(LedgerError::CurrencyMismatch {
                    expected: self.currency,
                    found: posting.amount.currency(),
                });
            }
            let side = (posting.entry_type, posting.amount);
            match grouped.iter_mut().find(|(code, _)| *code == posting.account) {
                Some((_, sides)) => sides.push(side),
                None => grouped.push((posting.account.as_str(), vec![side])),
            }
        }

        let ledgers = grouped
            .into_iter()
            .map(|(code, sides)| {
                self.require(code)?
                    .stage(&sides, entry.date(), entry.id(), sequence)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StagedPost { ledgers })
    }

    /// Applies staged updates.
    pub(crate) fn commit(&mut self, staged: StagedPost) {
        for update in staged.ledgers {
            if let Some(ledger) = self.ledgers.get_mut(&update.code) {
                ledger.apply(update);
            }
        }
    }
}

/// Balance of `code` folded directly from the journal.
///
/// Independent of the incremental ledgers and used to verify them.
pub fn fold_balance_as_of(
    journal: &Journal,
    code: &str,
    normal_balance: EntryType,
    date: NaiveDate,
) -> Result<Money, LedgerError> {
    journal
        .entries_affecting(code, DateRange::up_to(date))
        .try_fold(Money::zero(journal.currency()), |balance, (_, posting)| {
            let change = posting.entry_type.effect_on(posting.amount, normal_balance)?;
            Ok(balance.checked_add(change)?)
        })
}
