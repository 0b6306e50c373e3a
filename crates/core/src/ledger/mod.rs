//! Double-entry bookkeeping.
//!
//! This module implements the ledger proper:
//! - Journal entries, postings and their validation
//! - The journal, ordered by date and then insertion
//! - Per-account ledgers with running balances
//! - Subledger rollups and consolidated balances
//! - The general ledger with period close and carry-forward
//! - Trial balance reports and snapshots

pub mod balance;
pub mod entry;
pub mod error;
pub mod general;
pub mod journal;
pub mod report;
pub mod rollup;
pub mod shared;
pub mod snapshot;
mod validation;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod general_props;
#[cfg(test)]
mod validation_props;

pub use balance::{Ledger, LedgerBook, LedgerLine, fold_balance_as_of};
pub use entry::{EntryKind, EntryTotals, EntryType, JournalEntry, JournalEntryBuilder, Posting};
pub use error::LedgerError;
pub use general::{GeneralLedger, PeriodStatus};
pub use journal::{DateRange, Journal, JournalTable};
pub use report::{ConsolidatedLine, ConsolidatedSource, TrialBalance, TrialBalanceLine, TrialBalanceTotals};
pub use rollup::{BalanceSource, RollupMember, SubledgerRollup};
pub use shared::SharedGeneralLedger;
pub use snapshot::{EntryRecord, Snapshot};
