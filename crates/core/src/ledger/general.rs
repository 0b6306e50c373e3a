//! The general ledger: chart, journal, account ledgers and rollups.
//!
//! Posting is all-or-nothing. An entry is checked, its ledger updates are
//! staged, it is appended to the journal, the trial balance is re-checked,
//! and only then are the staged updates committed. Any failure leaves the
//! general ledger exactly as it was.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tally_shared::{AccountingMethod, Currency, EntryId, LedgerConfig, Money};
use tracing::{debug, error, info, warn};

use super::balance::{Ledger, LedgerBook, LedgerLine, fold_balance_as_of};
use super::entry::{EntryKind, EntryType, JournalEntry, Posting};
use super::error::LedgerError;
use super::journal::{DateRange, Journal};
use super::report::{ConsolidatedLine, ConsolidatedSource, TrialBalance, TrialBalanceLine};
use super::rollup::{BalanceSource, SubledgerRollup};
use super::validation::AccountPolicy;
use crate::account::{Account, AccountFilter, AccountNumberTemplate, AccountType, ChartOfAccounts};

/// Whether the period accepts postings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Accepts postings.
    #[default]
    Open,
    /// Read-only; the next period starts from its balances.
    Closed,
}

/// Root of the bookkeeping model.
#[derive(Debug, Clone)]
pub struct GeneralLedger {
    name: String,
    currency: Currency,
    accounting_method: AccountingMethod,
    status: PeriodStatus,
    period: u32,
    chart: ChartOfAccounts,
    journal: Journal,
    book: LedgerBook,
    rollups: Vec<SubledgerRollup>,
}

impl GeneralLedger {
    /// An open, empty general ledger for period 1.
    pub fn new(name: impl Into<String>, currency: Currency) -> Self {
        Self::with_chart(name, currency, ChartOfAccounts::new())
    }

    /// Like [`new`](Self::new), with account codes constrained by `template`.
    pub fn with_template(
        name: impl Into<String>,
        currency: Currency,
        template: AccountNumberTemplate,
    ) -> Self {
        Self::with_chart(name, currency, ChartOfAccounts::with_template(template))
    }

    /// Builds an empty general ledger from configuration.
    #[must_use]
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.name.clone(), config.currency)
            .with_accounting_method(config.accounting_method)
    }

    fn with_chart(name: impl Into<String>, currency: Currency, chart: ChartOfAccounts) -> Self {
        Self {
            name: name.into(),
            currency,
            accounting_method: AccountingMethod::default(),
            status: PeriodStatus::Open,
            period: 1,
            chart,
            journal: Journal::new(currency),
            book: LedgerBook::new(currency),
            rollups: Vec::new(),
        }
    }

    /// Records the bookkeeping method. Informational only.
    #[must_use]
    pub fn with_accounting_method(mut self, method: AccountingMethod) -> Self {
        self.accounting_method = method;
        self
    }

    // ========== Accessors ==========

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Functional currency.
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Bookkeeping method.
    #[must_use]
    pub fn accounting_method(&self) -> AccountingMethod {
        self.accounting_method
    }

    /// Open or closed.
    #[must_use]
    pub fn status(&self) -> PeriodStatus {
        self.status
    }

    /// Period number, starting at 1.
    #[must_use]
    pub fn period(&self) -> u32 {
        self.period
    }

    /// The chart of accounts.
    #[must_use]
    pub fn chart(&self) -> &ChartOfAccounts {
        &self.chart
    }

    /// The journal.
    #[must_use]
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Per-account ledgers.
    #[must_use]
    pub fn ledgers(&self) -> &LedgerBook {
        &self.book
    }

    /// Top-level rollups in insertion order.
    #[must_use]
    pub fn rollups(&self) -> &[SubledgerRollup] {
        &self.rollups
    }

    // ========== Accounts ==========

    /// Registers an account and opens its ledger.
    pub fn create_account(
        &mut self,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
    ) -> Result<&Account, LedgerError> {
        let code = code.into();
        self.chart.create(code.clone(), name, account_type)?;
        self.book.open(&code, account_type.normal_balance());
        self.chart.require(&code)
    }

    /// Stops postings to an account. Its history and balance remain.
    pub fn archive_account(&mut self, code: &str) -> Result<(), LedgerError> {
        self.chart.archive(code)?;
        info!(account = %code, "Account archived");
        Ok(())
    }

    /// Looks an account up by code.
    #[must_use]
    pub fn account(&self, code: &str) -> Option<&Account> {
        self.chart.get(code)
    }

    /// Accounts matching `filter`, in chart order.
    pub fn filter_accounts<'a>(
        &'a self,
        filter: &'a AccountFilter,
    ) -> impl Iterator<Item = &'a Account> {
        self.chart.filter(filter)
    }

    /// The single account matching `filter`.
    ///
    /// # Errors
    ///
    /// `AmbiguousAccount` with every matching code when more than one
    /// account matches.
    pub fn find_account<'a>(
        &'a self,
        filter: &AccountFilter,
    ) -> Result<Option<&'a Account>, LedgerError> {
        let mut matches = self.chart.filter(filter);
        let Some(first) = matches.next() else {
            return Ok(None);
        };
        let Some(second) = matches.next() else {
            return Ok(Some(first));
        };
        let codes = [first, second]
            .into_iter()
            .chain(matches)
            .map(|account| account.code().to_string())
            .collect();
        Err(LedgerError::AmbiguousAccount(codes))
    }

    // ========== Posting ==========

    /// Validates postings against this ledger's chart.
    pub fn create_entry(
        &self,
        date: NaiveDate,
        postings: Vec<Posting>,
        memo: Option<String>,
    ) -> Result<JournalEntry, LedgerError> {
        JournalEntry::create(&self.chart, date, postings, memo)
    }

    /// Creates and posts an entry in one step.
    pub fn record(
        &mut self,
        date: NaiveDate,
        postings: Vec<Posting>,
        memo: Option<String>,
    ) -> Result<EntryId, LedgerError> {
        let entry = self.create_entry(date, postings, memo)?;
        self.post(entry)
    }

    /// Appends an entry to the journal and updates every affected ledger.
    ///
    /// # Errors
    ///
    /// - `LedgerClosed` once the period is closed
    /// - `CurrencyMismatch` for entries outside the functional currency
    /// - `DuplicateEntryId` when the entry is already posted
    /// - `UnknownAccount` / `ArchivedAccount` when the entry was built
    ///   against another chart or an account has since been archived
    /// - `LedgerIntegrityViolation` if the journal stops balancing
    pub fn post(&mut self, entry: JournalEntry) -> Result<EntryId, LedgerError> {
        if self.status == PeriodStatus::Closed {
            warn!(entry_id = %entry.id(), period = self.period, "Post rejected: period closed");
            return Err(LedgerError::LedgerClosed);
        }
        let policy = match entry.kind() {
            EntryKind::Standard | EntryKind::Adjusting => AccountPolicy::RequireActive,
            EntryKind::Reversal { .. } | EntryKind::OpeningBalance => AccountPolicy::AllowArchived,
        };
        self.append(entry, policy).inspect_err(|err| {
            if !err.is_fatal() {
                warn!(error = %err, code = err.error_code(), "Post rejected");
            }
        })
    }

    fn append(
        &mut self,
        entry: JournalEntry,
        policy: AccountPolicy,
    ) -> Result<EntryId, LedgerError> {
        let id = entry.id();

        // 1. Entry-level checks
        if entry.currency() != self.currency {
            return Err(LedgerError::CurrencyMismatch {
                expected: self.currency,
                found: entry.currency(),
            });
        }
        if self.journal.contains(id) {
            return Err(LedgerError::DuplicateEntryId(id));
        }
        for posting in entry.postings() {
            let account = self.chart.require(&posting.account)?;
            if policy == AccountPolicy::RequireActive && account.is_archived() {
                return Err(LedgerError::ArchivedAccount(posting.account.clone()));
            }
        }

        // 2. Stage ledger updates without mutating
        let staged = self.book.stage(&entry, self.journal.next_sequence())?;

        // 3. Append, then re-check the trial balance
        let sequence = self.journal.append(entry)?;
        let (debit, credit) = (self.journal.total_debits(), self.journal.total_credits());
        if debit != credit {
            self.journal.rollback(id);
            error!(
                entry_id = %id,
                debit = %debit,
                credit = %credit,
                "Ledger integrity violation, entry not committed"
            );
            return Err(LedgerError::LedgerIntegrityViolation { debit, credit });
        }

        // 4. Commit
        self.book.commit(staged);
        debug!(entry_id = %id, sequence, period = self.period, "Entry posted");
        Ok(id)
    }

    /// Posts the mirror image of entry `id`, dated `date`.
    pub fn reverse(
        &mut self,
        id: EntryId,
        date: NaiveDate,
        memo: Option<String>,
    ) -> Result<EntryId, LedgerError> {
        let reversal = self
            .journal
            .get(id)
            .ok_or(LedgerError::EntryNotFound(id))?
            .reversal(date, memo);
        let reversal_id = self.post(reversal)?;
        info!(entry_id = %id, reversal_id = %reversal_id, "Entry reversed");
        Ok(reversal_id)
    }

    /// Postings to `code` within `range`.
    pub fn entries_affecting<'a>(
        &'a self,
        code: &'a str,
        range: DateRange,
    ) -> impl Iterator<Item = (&'a JournalEntry, &'a Posting)> + Clone + 'a {
        self.journal.entries_affecting(code, range)
    }

    // ========== Balances ==========

    fn ledger(&self, code: &str) -> Result<&Ledger, LedgerError> {
        self.book.require(code)
    }

    /// Balance of `code` from postings dated on or before `date`.
    pub fn balance_as_of(&self, code: &str, date: NaiveDate) -> Result<Money, LedgerError> {
        Ok(self.ledger(code)?.balance_as_of(date))
    }

    /// Balance of `code` after every posting.
    pub fn current_balance(&self, code: &str) -> Result<Money, LedgerError> {
        Ok(self.ledger(code)?.current_balance())
    }

    /// Movement of `code` within `range`: balance at `to` minus balance at `from`.
    pub fn balance_change(&self, code: &str, range: DateRange) -> Result<Money, LedgerError> {
        let ledger = self.ledger(code)?;
        let end = range
            .to
            .map_or_else(|| ledger.current_balance(), |to| ledger.balance_as_of(to));
        let start = range
            .from
            .map_or(Money::zero(self.currency), |from| ledger.balance_as_of(from));
        Ok(end.checked_sub(start)?)
    }

    /// Debit postings to `code` dated on or before `date`.
    pub fn gross_debits(&self, code: &str, date: NaiveDate) -> Result<Money, LedgerError> {
        self.ledger(code)?.gross_as_of(EntryType::Debit, date)
    }

    /// Credit postings to `code` dated on or before `date`.
    pub fn gross_credits(&self, code: &str, date: NaiveDate) -> Result<Money, LedgerError> {
        self.ledger(code)?.gross_as_of(EntryType::Credit, date)
    }

    /// Ledger lines of `code` with running balances.
    pub fn lines(&self, code: &str) -> Result<&[LedgerLine], LedgerError> {
        Ok(self.ledger(code)?.lines())
    }

    /// Balance of `code` recomputed from the journal alone.
    pub fn fold_balance_as_of(&self, code: &str, date: NaiveDate) -> Result<Money, LedgerError> {
        let account = self.chart.require(code)?;
        fold_balance_as_of(&self.journal, code, account.normal_balance(), date)
    }

    /// Combined balance of the accounts matching `filter`, reported
    /// relative to `side`. No matches yield zero.
    pub fn net_balance_as(
        &self,
        filter: &AccountFilter,
        side: EntryType,
        date: NaiveDate,
    ) -> Result<Money, LedgerError> {
        self.chart
            .filter(filter)
            .try_fold(Money::zero(self.currency), |total, account| {
                let balance = self.balance_as_of(account.code(), date)?;
                let signed = if account.normal_balance() == side {
                    balance
                } else {
                    balance.checked_neg()?
                };
                Ok(total.checked_add(signed)?)
            })
    }

    /// Checks every running balance against a fold of the journal.
    ///
    /// # Errors
    ///
    /// `LedgerIntegrityViolation` on the first disagreement.
    pub fn verify(&self) -> Result<(), LedgerError> {
        let dates: Vec<NaiveDate> = {
            let mut dates: Vec<NaiveDate> = self.journal.iter().map(JournalEntry::date).collect();
            dates.dedup();
            dates
        };
        for account in &self.chart {
            for &date in &dates {
                let running = self.balance_as_of(account.code(), date)?;
                let folded = self.fold_balance_as_of(account.code(), date)?;
                if running != folded {
                    error!(
                        account = %account.code(),
                        %date,
                        %running,
                        %folded,
                        "Running balance drifted"
                    );
                    return Err(LedgerError::LedgerIntegrityViolation {
                        debit: running,
                        credit: folded,
                    });
                }
            }
        }
        Ok(())
    }

    // ========== Trial balance ==========

    /// True when the journal's debits equal its credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.journal.total_debits() == self.journal.total_credits()
    }

    /// Every account's balance as of `date`.
    pub fn trial_balance(&self, date: NaiveDate) -> Result<TrialBalance, LedgerError> {
        let lines = self
            .chart
            .iter()
            .map(|account| {
                TrialBalanceLine::new(
                    account.code().to_string(),
                    account.name().to_string(),
                    account.account_type(),
                    self.balance_as_of(account.code(), date)?,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        TrialBalance::new(date, self.currency, lines)
    }

    // ========== Rollups ==========

    /// Adds a top-level rollup.
    ///
    /// # Errors
    ///
    /// `UnknownAccount` if a member is not in the chart, `OverlappingAccounts`
    /// if a member account already belongs to another top-level rollup.
    pub fn add_rollup(&mut self, rollup: SubledgerRollup) -> Result<(), LedgerError> {
        let covered = rollup.covered_accounts();
        if let Some(unknown) = covered.iter().find(|code| !self.chart.contains(code)) {
            return Err(LedgerError::UnknownAccount((*unknown).to_string()));
        }
        let shared: Vec<String> = self
            .rollups
            .iter()
            .flat_map(BalanceSource::covered_accounts)
            .filter(|code| covered.contains(code))
            .map(str::to_string)
            .collect();
        if !shared.is_empty() {
            return Err(LedgerError::OverlappingAccounts {
                rollup: rollup.name().to_string(),
                accounts: shared,
            });
        }
        debug!(rollup = %rollup.name(), accounts = covered.len(), "Rollup added");
        self.rollups.push(rollup);
        Ok(())
    }

    /// Looks a top-level rollup up by name.
    #[must_use]
    pub fn rollup(&self, name: &str) -> Option<&SubledgerRollup> {
        self.rollups.iter().find(|r| r.name() == name)
    }

    /// Net balance of a top-level rollup as of `date`.
    pub fn rollup_balance(&self, name: &str, date: NaiveDate) -> Result<Money, LedgerError> {
        self.rollup(name)
            .ok_or_else(|| LedgerError::RollupNotFound(name.to_string()))?
            .net_balance(&self.book, date)
    }

    /// One line per top-level rollup, then one per account outside them.
    pub fn consolidated(&self, date: NaiveDate) -> Result<Vec<ConsolidatedLine>, LedgerError> {
        let mut lines = Vec::with_capacity(self.rollups.len());
        for rollup in &self.rollups {
            lines.push(ConsolidatedLine {
                label: rollup.name().to_string(),
                source: ConsolidatedSource::Rollup,
                balance: rollup.net_balance(&self.book, date)?,
            });
        }
        let covered: BTreeSet<&str> = self
            .rollups
            .iter()
            .flat_map(BalanceSource::covered_accounts)
            .collect();
        for account in self.chart.iter().filter(|a| !covered.contains(a.code())) {
            lines.push(ConsolidatedLine {
                label: account.code().to_string(),
                source: ConsolidatedSource::Account,
                balance: self.balance_as_of(account.code(), date)?,
            });
        }
        Ok(lines)
    }

    // ========== Period lifecycle ==========

    /// Closes the period. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.status == PeriodStatus::Open {
            self.status = PeriodStatus::Closed;
            info!(
                ledger = %self.name,
                period = self.period,
                entries = self.journal.len(),
                "Period closed"
            );
        }
    }

    /// Opens the next period from this closed one.
    ///
    /// The new ledger keeps the chart and rollups, and its journal starts
    /// with one opening-balance entry dated `opening_date` carrying every
    /// non-zero balance. When every balance is zero the journal starts
    /// empty.
    ///
    /// # Errors
    ///
    /// `LedgerOpen` unless this period is closed, `PeriodLimitReached` when
    /// the period number cannot grow.
    pub fn start_next_period(&self, opening_date: NaiveDate) -> Result<Self, LedgerError> {
        if self.status != PeriodStatus::Closed {
            return Err(LedgerError::LedgerOpen);
        }

        let mut next = Self {
            name: self.name.clone(),
            currency: self.currency,
            accounting_method: self.accounting_method,
            status: PeriodStatus::Open,
            period: self
                .period
                .checked_add(1)
                .ok_or(LedgerError::PeriodLimitReached(self.period))?,
            chart: self.chart.clone(),
            journal: Journal::new(self.currency),
            book: LedgerBook::new(self.currency),
            rollups: self.rollups.clone(),
        };
        for account in &self.chart {
            next.book.open(account.code(), account.normal_balance());
        }

        let mut postings = Vec::new();
        for account in &self.chart {
            let balance = self.current_balance(account.code())?;
            if balance.is_zero() {
                continue;
            }
            let side = if balance.is_negative() {
                account.normal_balance().opposite()
            } else {
                account.normal_balance()
            };
            postings.push(Posting {
                account: account.code().to_string(),
                entry_type: side,
                amount: balance.checked_abs()?,
                memo: None,
            });
        }

        if !postings.is_empty() {
            let opening = JournalEntry::assemble(
                &next.chart,
                EntryId::new(),
                opening_date,
                postings,
                Some(format!("Opening balances, period {}", next.period)),
                EntryKind::OpeningBalance,
                AccountPolicy::AllowArchived,
            )?;
            next.append(opening, AccountPolicy::AllowArchived)?;
        }

        info!(ledger = %next.name, period = next.period, "Period started");
        Ok(next)
    }

    pub(crate) fn set_period(&mut self, period: u32) {
        self.period = period;
    }

    pub(crate) fn replay(&mut self, entry: JournalEntry) -> Result<EntryId, LedgerError> {
        self.append(entry, AccountPolicy::AllowArchived)
    }
}
