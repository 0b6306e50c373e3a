//! Account domain types.

use serde::{Deserialize, Serialize};

use crate::ledger::{EntryType, LedgerError};

/// Account classification.
///
/// The set is closed; each type has a fixed normal balance side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// What the business owns.
    Asset,
    /// What the business owes.
    Liability,
    /// Owners' interest.
    Equity,
    /// Income earned.
    Revenue,
    /// Costs incurred.
    Expense,
}

impl AccountType {
    /// Every account type, in chart order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];

    /// The side that increases accounts of this type.
    ///
    /// - Asset/Expense: debit-normal
    /// - Liability/Equity/Revenue: credit-normal
    #[must_use]
    pub const fn normal_balance(self) -> EntryType {
        match self {
            Self::Asset | Self::Expense => EntryType::Debit,
            Self::Liability | Self::Equity | Self::Revenue => EntryType::Credit,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "revenue" => Ok(Self::Revenue),
            "expense" => Ok(Self::Expense),
            _ => Err(LedgerError::UnknownAccountType(s.to_string())),
        }
    }
}

/// A chart of accounts entry.
///
/// Accounts never carry balances; those are derived from the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    code: String,
    name: String,
    account_type: AccountType,
    #[serde(default)]
    archived: bool,
}

impl Account {
    pub(crate) fn new(code: String, name: String, account_type: AccountType) -> Self {
        Self {
            code,
            name,
            account_type,
            archived: false,
        }
    }

    /// Unique account code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Account classification.
    #[must_use]
    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    /// Side that increases this account.
    #[must_use]
    pub fn normal_balance(&self) -> EntryType {
        self.account_type.normal_balance()
    }

    /// Archived accounts keep their history but take no new postings.
    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.archived
    }

    pub(crate) fn archive(&mut self) {
        self.archived = true;
    }
}
