//! Report types derived from a general ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tally_shared::{Currency, Money};

use super::entry::EntryType;
use super::error::LedgerError;
use crate::account::AccountType;

/// One account in a trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceLine {
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Balance measured from the account's normal side.
    pub balance: Money,
    /// Debit column (zero unless the balance leans debit).
    pub debit: Money,
    /// Credit column (zero unless the balance leans credit).
    pub credit: Money,
}

impl TrialBalanceLine {
    pub(crate) fn new(
        code: String,
        name: String,
        account_type: AccountType,
        balance: Money,
    ) -> Result<Self, LedgerError> {
        let zero = Money::zero(balance.currency());
        let magnitude = balance.checked_abs()?;
        let side = if balance.is_negative() {
            account_type.normal_balance().opposite()
        } else {
            account_type.normal_balance()
        };
        let (debit, credit) = match side {
            EntryType::Debit => (magnitude, zero),
            EntryType::Credit => (zero, magnitude),
        };
        Ok(Self {
            code,
            name,
            account_type,
            balance,
            debit,
            credit,
        })
    }
}

/// Trial balance totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    /// Sum of debit-normal account balances.
    pub debit_normal: Money,
    /// Sum of credit-normal account balances.
    pub credit_normal: Money,
    /// Sum of the debit column.
    pub total_debit: Money,
    /// Sum of the credit column.
    pub total_credit: Money,
    /// Whether both pairs agree.
    pub is_balanced: bool,
}

/// Every account's balance at a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    /// As of date.
    pub as_of: NaiveDate,
    /// Currency of every amount.
    pub currency: Currency,
    /// One line per account, in chart order.
    pub lines: Vec<TrialBalanceLine>,
    /// Totals.
    pub totals: TrialBalanceTotals,
}

impl TrialBalance {
    pub(crate) fn new(
        as_of: NaiveDate,
        currency: Currency,
        lines: Vec<TrialBalanceLine>,
    ) -> Result<Self, LedgerError> {
        let sum = |pick: &dyn Fn(&TrialBalanceLine) -> Option<Money>| {
            Money::sum(currency, lines.iter().filter_map(pick))
        };
        let debit_normal = sum(&|l: &TrialBalanceLine| {
            (l.account_type.normal_balance() == EntryType::Debit).then_some(l.balance)
        })?;
        let credit_normal = sum(&|l: &TrialBalanceLine| {
            (l.account_type.normal_balance() == EntryType::Credit).then_some(l.balance)
        })?;
        let total_debit = sum(&|l: &TrialBalanceLine| Some(l.debit))?;
        let total_credit = sum(&|l: &TrialBalanceLine| Some(l.credit))?;

        Ok(Self {
            as_of,
            currency,
            totals: TrialBalanceTotals {
                debit_normal,
                credit_normal,
                total_debit,
                total_credit,
                is_balanced: debit_normal == credit_normal && total_debit == total_credit,
            },
            lines,
        })
    }

    /// Whether debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.totals.is_balanced
    }

    /// The line of `code`.
    #[must_use]
    pub fn line(&self, code: &str) -> Option<&TrialBalanceLine> {
        self.lines.iter().find(|line| line.code == code)
    }
}

/// What a consolidated line stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidatedSource {
    /// A top-level rollup.
    Rollup,
    /// An account outside every rollup.
    Account,
}

/// One line of the consolidated general ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedLine {
    /// Rollup name or account code.
    pub label: String,
    /// Rollup or account.
    pub source: ConsolidatedSource,
    /// Net balance as of the report date.
    pub balance: Money,
}
