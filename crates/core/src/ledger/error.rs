//! Ledger error types for validation and state errors.
//!
//! This module defines all errors that can occur during bookkeeping
//! operations: account registry errors, entry validation errors, journal
//! errors, rollup errors, and general ledger state errors.

use tally_shared::{AppError, Currency, EntryId, Money, MoneyError};
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Account Errors ==========
    /// An account with this code is already registered.
    #[error("Account code already registered: {0}")]
    DuplicateAccountCode(String),

    /// Account not registered.
    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    /// Account type name not recognized.
    #[error("Unknown account type: {0}")]
    UnknownAccountType(String),

    /// Account is archived and cannot receive postings.
    #[error("Account {0} is archived")]
    ArchivedAccount(String),

    /// Account code does not match the chart's number template.
    #[error("Invalid account number {code}: {reason}")]
    InvalidAccountNumber {
        /// The rejected code.
        code: String,
        /// Which rule the code broke.
        reason: String,
    },

    /// A single-account lookup matched several accounts.
    #[error("Filter matched more than one account: {0:?}")]
    AmbiguousAccount(Vec<String>),

    /// Account number template is malformed.
    #[error("Invalid account number template: {0}")]
    InvalidTemplate(String),

    // ========== Validation Errors ==========
    /// Entry must have at least 2 postings.
    #[error("Journal entry must have at least 2 postings, got {count}")]
    InsufficientPostings {
        /// Number of postings supplied.
        count: usize,
    },

    /// Posting amount must be strictly positive.
    #[error("Posting amount must be positive, got {amount} on account {account}")]
    NonPositiveAmount {
        /// The account of the offending posting.
        account: String,
        /// The rejected amount.
        amount: Money,
    },

    /// Operands carry different currencies.
    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch {
        /// The currency required by the operation.
        expected: Currency,
        /// The currency supplied.
        found: Currency,
    },

    /// Entry is not balanced (debits != credits).
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}, Delta: {delta}")]
    UnbalancedEntry {
        /// Sum of debit postings.
        debit: Money,
        /// Sum of credit postings.
        credit: Money,
        /// Debit minus credit.
        delta: Money,
    },

    /// A sum or difference does not fit the money representation.
    #[error("Money amount overflow")]
    MoneyOverflow,

    /// Amount cannot be represented in its currency.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // ========== Journal Errors ==========
    /// Entry was already appended.
    #[error("Journal entry already appended: {0}")]
    DuplicateEntryId(EntryId),

    /// Entry not in the journal.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(EntryId),

    // ========== Rollup Errors ==========
    /// Rollup members would count an account twice.
    #[error("Rollup {rollup} overlaps existing members on accounts {accounts:?}")]
    OverlappingAccounts {
        /// The rollup or ledger being extended.
        rollup: String,
        /// Codes covered more than once.
        accounts: Vec<String>,
    },

    /// No top-level rollup has this name.
    #[error("Rollup not found: {0}")]
    RollupNotFound(String),

    // ========== General Ledger State Errors ==========
    /// The period is closed; no posting allowed.
    #[error("Ledger period is closed, no posting allowed")]
    LedgerClosed,

    /// The period must be closed before starting the next one.
    #[error("Ledger period is still open")]
    LedgerOpen,

    /// The period counter cannot advance any further.
    #[error("Period {0} is the last period a ledger can reach")]
    PeriodLimitReached(u32),

    /// Trial balance failed after an append. Indicates a bug in the engine.
    #[error("Ledger integrity violation: total debits {debit} != total credits {credit}")]
    LedgerIntegrityViolation {
        /// Journal debit total after the append.
        debit: Money,
        /// Journal credit total after the append.
        credit: Money,
    },

    /// Snapshot failed re-validation on load.
    #[error("Corrupt ledger data: {0}")]
    CorruptLedgerData(String),

    /// Snapshot could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LedgerError {
    /// Returns a stable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateAccountCode(_) => "DUPLICATE_ACCOUNT_CODE",
            Self::UnknownAccount(_) => "UNKNOWN_ACCOUNT",
            Self::UnknownAccountType(_) => "UNKNOWN_ACCOUNT_TYPE",
            Self::ArchivedAccount(_) => "ARCHIVED_ACCOUNT",
            Self::InvalidAccountNumber { .. } => "INVALID_ACCOUNT_NUMBER",
            Self::AmbiguousAccount(_) => "AMBIGUOUS_ACCOUNT",
            Self::InvalidTemplate(_) => "INVALID_TEMPLATE",
            Self::InsufficientPostings { .. } => "INSUFFICIENT_POSTINGS",
            Self::NonPositiveAmount { .. } => "NON_POSITIVE_AMOUNT",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::MoneyOverflow => "MONEY_OVERFLOW",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::DuplicateEntryId(_) => "DUPLICATE_ENTRY_ID",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::OverlappingAccounts { .. } => "OVERLAPPING_ACCOUNTS",
            Self::RollupNotFound(_) => "ROLLUP_NOT_FOUND",
            Self::LedgerClosed => "LEDGER_CLOSED",
            Self::LedgerOpen => "LEDGER_OPEN",
            Self::PeriodLimitReached(_) => "PERIOD_LIMIT_REACHED",
            Self::LedgerIntegrityViolation { .. } => "LEDGER_INTEGRITY_VIOLATION",
            Self::CorruptLedgerData(_) => "CORRUPT_LEDGER_DATA",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Returns true for invariant breaches that signal a bug rather than bad input.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::LedgerIntegrityViolation { .. })
    }
}

impl From<MoneyError> for LedgerError {
    fn from(err: MoneyError) -> Self {
        match err {
            MoneyError::CurrencyMismatch { expected, found } => {
                Self::CurrencyMismatch { expected, found }
            }
            MoneyError::Overflow => Self::MoneyOverflow,
            other => Self::InvalidAmount(other.to_string()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::LedgerIntegrityViolation { .. } => Self::Internal(err.to_string()),
            LedgerError::Serialization(msg) => Self::Internal(msg),
            other => Self::Ledger(other.to_string()),
        }
    }
}
