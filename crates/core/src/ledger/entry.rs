//! Journal entry domain types.
//!
//! A [`JournalEntry`] only exists once its postings have passed every
//! validation rule, so holding one is proof that it balances.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tally_shared::{Currency, EntryId, Money};

use super::error::LedgerError;
use super::validation::{AccountPolicy, validate_postings};
use crate::account::ChartOfAccounts;

/// Direction of a posting, and the natural balance side of an account.
///
/// In double-entry bookkeeping:
/// - Debits increase asset/expense accounts, decrease liability/equity/revenue accounts
/// - Credits decrease asset/expense accounts, increase liability/equity/revenue accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Debit entry.
    Debit,
    /// Credit entry.
    Credit,
}

impl EntryType {
    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }

    /// Signed effect of `amount` posted on this side to an account whose
    /// normal balance is `normal_balance`. Positive on the normal side.
    pub fn effect_on(self, amount: Money, normal_balance: Self) -> Result<Money, LedgerError> {
        if self == normal_balance {
            Ok(amount)
        } else {
            Ok(amount.checked_neg()?)
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debit => f.write_str("Debit"),
            Self::Credit => f.write_str("Credit"),
        }
    }
}

/// Why an entry was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryKind {
    /// Ordinary journal entry.
    #[default]
    Standard,
    /// Period-end or correcting adjustment.
    Adjusting,
    /// Mirror image of an earlier entry.
    Reversal {
        /// The entry being reversed.
        of: EntryId,
    },
    /// Balances carried forward into a new period.
    OpeningBalance,
}

/// One debit or credit line within a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Code of the account posted to.
    pub account: String,
    /// Debit or credit.
    pub entry_type: EntryType,
    /// Amount; must be positive.
    pub amount: Money,
    /// Optional line memo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl Posting {
    /// A debit line.
    pub fn debit(account: impl Into<String>, amount: Money) -> Self {
        Self {
            account: account.into(),
            entry_type: EntryType::Debit,
            amount,
            memo: None,
        }
    }

    /// A credit line.
    pub fn credit(account: impl Into<String>, amount: Money) -> Self {
        Self {
            account: account.into(),
            entry_type: EntryType::Credit,
            amount,
            memo: None,
        }
    }

    /// Attaches a line memo.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// The same line on the opposite side.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            entry_type: self.entry_type.opposite(),
            ..self.clone()
        }
    }
}

/// Debit and credit sums of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotals {
    /// Sum of debit postings.
    pub debit: Money,
    /// Sum of credit postings.
    pub credit: Money,
}

impl EntryTotals {
    /// Returns true when debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debit == self.credit
    }

    /// Debits minus credits.
    pub fn difference(&self) -> Result<Money, LedgerError> {
        Ok(self.debit.checked_sub(self.credit)?)
    }
}

/// An immutable, balanced journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    id: EntryId,
    date: NaiveDate,
    postings: Vec<Posting>,
    memo: Option<String>,
    kind: EntryKind,
    totals: EntryTotals,
}

impl JournalEntry {
    /// Validates `postings` against the chart and builds an entry with a fresh id.
    ///
    /// Checks run in order: posting count, positive amounts, known accounts,
    /// uniform currency, balance. Nothing is built unless every check passes.
    ///
    /// # Errors
    ///
    /// `InsufficientPostings`, `NonPositiveAmount`, `UnknownAccount`,
    /// `ArchivedAccount`, `CurrencyMismatch` or `UnbalancedEntry`.
    pub fn create(
        chart: &ChartOfAccounts,
        date: NaiveDate,
        postings: Vec<Posting>,
        memo: Option<String>,
    ) -> Result<Self, LedgerError> {
        Self::assemble(
            chart,
            EntryId::new(),
            date,
            postings,
            memo,
            EntryKind::Standard,
            AccountPolicy::RequireActive,
        )
    }

    pub(crate) fn assemble(
        chart: &ChartOfAccounts,
        id: EntryId,
        date: NaiveDate,
        postings: Vec<Posting>,
        memo: Option<String>,
        kind: EntryKind,
        policy: AccountPolicy,
    ) -> Result<Self, LedgerError> {
        let totals = validate_postings(chart, &postings, policy)?;
        Ok(Self {
            id,
            date,
            postings,
            memo,
            kind,
            totals,
        })
    }

    /// Replaces the cached totals without re-validating.
    #[cfg(test)]
    pub(crate) fn set_totals(&mut self, totals: EntryTotals) {
        self.totals = totals;
    }

    /// Entry identifier.
    #[must_use]
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Entry date.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Postings in the order they were given.
    #[must_use]
    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    /// Entry memo.
    #[must_use]
    pub fn memo(&self) -> Option<&str> {
        self.memo.as_deref()
    }

    /// Why the entry was recorded.
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Debit and credit sums (always equal).
    #[must_use]
    pub fn totals(&self) -> EntryTotals {
        self.totals
    }

    /// Currency shared by every posting.
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.totals.debit.currency()
    }

    /// True when some side carries more than one posting.
    #[must_use]
    pub fn is_compound(&self) -> bool {
        let debits = self
            .postings
            .iter()
            .filter(|p| p.entry_type == EntryType::Debit)
            .count();
        debits > 1 || self.postings.len() - debits > 1
    }

    /// True when any posting touches `account`.
    #[must_use]
    pub fn affects(&self, account: &str) -> bool {
        self.postings.iter().any(|p| p.account == account)
    }

    /// The mirror entry, dated `date`: same accounts and amounts with every
    /// side swapped. The memo defaults to `Reversal: <original memo>`.
    #[must_use]
    pub fn reversal(&self, date: NaiveDate, memo: Option<String>) -> Self {
        let memo = memo.unwrap_or_else(|| match self.memo() {
            Some(original) => format!("Reversal: {original}"),
            None => format!("Reversal of {}", self.id),
        });
        Self {
            id: EntryId::new(),
            date,
            postings: self.reversing_postings(),
            memo: Some(memo),
            kind: EntryKind::Reversal { of: self.id },
            totals: self.totals,
        }
    }

    fn reversing_postings(&self) -> Vec<Posting> {
        self.postings
            .iter()
            .map(|posting| {
                let mut reversed = posting.reversed();
                reversed.memo = posting.memo.as_ref().map(|memo| format!("Reversal: {memo}"));
                reversed
            })
            .collect()
    }
}

/// Incremental construction of journal entries for import tooling.
///
/// ```
/// use chrono::NaiveDate;
/// use tally_core::account::{AccountType, ChartOfAccounts};
/// use tally_core::ledger::JournalEntryBuilder;
/// use tally_shared::{Currency, Money};
///
/// let mut chart = ChartOfAccounts::new();
/// chart.create("1000", "Cash", AccountType::Asset).unwrap();
/// chart.create("4000", "Sales", AccountType::Revenue).unwrap();
///
/// let amount = Money::from_minor(10_000, Currency::Usd);
/// let entry = JournalEntryBuilder::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
///     .debit("1000", amount)
///     .credit("4000", amount)
///     .memo("Cash sale")
///     .build(&chart)
///     .unwrap();
/// assert_eq!(entry.postings().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct JournalEntryBuilder {
    date: NaiveDate,
    postings: Vec<Posting>,
    memo: Option<String>,
    kind: EntryKind,
}

impl JournalEntryBuilder {
    /// Starts an entry dated `date`.
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            postings: Vec::new(),
            memo: None,
            kind: EntryKind::Standard,
        }
    }

    /// Adds a debit line.
    #[must_use]
    pub fn debit(self, account: impl Into<String>, amount: Money) -> Self {
        self.posting(Posting::debit(account, amount))
    }

    /// Adds a credit line.
    #[must_use]
    pub fn credit(self, account: impl Into<String>, amount: Money) -> Self {
        self.posting(Posting::credit(account, amount))
    }

    /// Adds a prepared line.
    #[must_use]
    pub fn posting(mut self, posting: Posting) -> Self {
        self.postings.push(posting);
        self
    }

    /// Sets the entry memo.
    #[must_use]
    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// Marks the entry as an adjustment.
    #[must_use]
    pub fn adjusting(self) -> Self {
        self.kind(EntryKind::Adjusting)
    }

    /// Sets why the entry is recorded.
    #[must_use]
    pub fn kind(mut self, kind: EntryKind) -> Self {
        self.kind = kind;
        self
    }

    /// Validates and builds the entry.
    pub fn build(self, chart: &ChartOfAccounts) -> Result<JournalEntry, LedgerError> {
        JournalEntry::assemble(
            chart,
            EntryId::new(),
            self.date,
            self.postings,
            self.memo,
            self.kind,
            AccountPolicy::RequireActive,
        )
    }
}
