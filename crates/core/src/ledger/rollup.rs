//! Subledger rollups: named groups of accounts reported as one line.
//!
//! A rollup's members are account ledgers or other rollups. Sibling members
//! never share an account, so a rollup's balance counts each account once.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tally_shared::Money;

use super::balance::LedgerBook;
use super::entry::EntryType;
use super::error::LedgerError;

/// Anything that can report a net balance out of a [`LedgerBook`].
pub trait BalanceSource {
    /// Display name.
    fn label(&self) -> &str;

    /// Every account code whose balance this source includes.
    fn covered_accounts(&self) -> BTreeSet<&str>;

    /// Net balance as of `date`, each account measured from its own normal side.
    fn balance_as_of(&self, book: &LedgerBook, date: NaiveDate) -> Result<Money, LedgerError>;

    /// Net balance as of `date`, positive when it leans toward `side`.
    ///
    /// An account whose normal side is `side` adds its balance; any other
    /// account subtracts it. Owing 100,000 while owning 100 reports
    /// 99,900 as `Credit` and -99,900 as `Debit`.
    fn balance_as(
        &self,
        book: &LedgerBook,
        side: EntryType,
        date: NaiveDate,
    ) -> Result<Money, LedgerError> {
        self.covered_accounts()
            .into_iter()
            .try_fold(Money::zero(book.currency()), |total, code| {
                let ledger = book.require(code)?;
                let balance = ledger.balance_as_of(date);
                let signed = if ledger.normal_balance() == side {
                    balance
                } else {
                    balance.checked_neg()?
                };
                Ok(total.checked_add(signed)?)
            })
    }
}

/// A member of a rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "member", rename_all = "snake_case")]
pub enum RollupMember {
    /// A single account ledger.
    Account {
        /// Account code.
        code: String,
    },
    /// A nested rollup.
    Rollup(SubledgerRollup),
}

impl BalanceSource for RollupMember {
    fn label(&self) -> &str {
        match self {
            Self::Account { code } => code,
            Self::Rollup(rollup) => rollup.label(),
        }
    }

    fn covered_accounts(&self) -> BTreeSet<&str> {
        match self {
            Self::Account { code } => BTreeSet::from([code.as_str()]),
            Self::Rollup(rollup) => rollup.covered_accounts(),
        }
    }

    fn balance_as_of(&self, book: &LedgerBook, date: NaiveDate) -> Result<Money, LedgerError> {
        match self {
            Self::Account { code } => book.balance_as_of(code, date),
            Self::Rollup(rollup) => rollup.balance_as_of(book, date),
        }
    }
}

/// A named group of ledgers and rollups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubledgerRollup {
    name: String,
    members: Vec<RollupMember>,
}

impl SubledgerRollup {
    /// An empty rollup.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Rollup name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct members in insertion order.
    #[must_use]
    pub fn members(&self) -> &[RollupMember] {
        &self.members
    }

    /// Adds a member whose accounts are not covered yet.
    ///
    /// # Errors
    ///
    /// `OverlappingAccounts` listing every code the member shares with the
    /// existing members; the rollup is unchanged.
    pub fn add_member(&mut self, member: RollupMember) -> Result<&mut Self, LedgerError> {
        let existing = self.covered_accounts();
        let shared: Vec<String> = member
            .covered_accounts()
            .intersection(&existing)
            .map(|code| (*code).to_string())
            .collect();
        if !shared.is_empty() {
            return Err(LedgerError::OverlappingAccounts {
                rollup: self.name.clone(),
                accounts: shared,
            });
        }
        self.members.push(member);
        Ok(self)
    }

    /// Adds an account ledger.
    pub fn add_account(&mut self, code: impl Into<String>) -> Result<&mut Self, LedgerError> {
        self.add_member(RollupMember::Account { code: code.into() })
    }

    /// Adds a nested rollup.
    pub fn add_rollup(&mut self, rollup: SubledgerRollup) -> Result<&mut Self, LedgerError> {
        self.add_member(RollupMember::Rollup(rollup))
    }

    /// Sum of the members' balances as of `date`.
    pub fn net_balance(&self, book: &LedgerBook, date: NaiveDate) -> Result<Money, LedgerError> {
        self.balance_as_of(book, date)
    }

    /// Net balance reported relative to `side`.
    pub fn net_balance_as(
        &self,
        book: &LedgerBook,
        side: EntryType,
        date: NaiveDate,
    ) -> Result<Money, LedgerError> {
        self.balance_as(book, side, date)
    }

    /// Rebuilds the rollup through [`add_member`](Self::add_member), re-checking
    /// disjointness at every level. Used for rollups read from storage.
    pub fn rebuild(&self) -> Result<Self, LedgerError> {
        let mut rebuilt = Self::new(self.name.clone());
        for member in &self.members {
            let member = match member {
                RollupMember::Account { code } => RollupMember::Account { code: code.clone() },
                RollupMember::Rollup(nested) => RollupMember::Rollup(nested.rebuild()?),
            };
            rebuilt.add_member(member)?;
        }
        Ok(rebuilt)
    }
}

impl BalanceSource for SubledgerRollup {
    fn label(&self) -> &str {
        &self.name
    }

    fn covered_accounts(&self) -> BTreeSet<&str> {
        self.members
            .iter()
            .flat_map(BalanceSource::covered_accounts)
            .collect()
    }

    fn balance_as_of(&self, book: &LedgerBook, date: NaiveDate) -> Result<Money, LedgerError> {
        self.members
            .iter()
            .try_fold(Money::zero(book.currency()), |total, member| {
                Ok(total.checked_add(member.balance_as_of(book, date)?)?)
            })
    }
}
