//! Serializable records of a general ledger.
//!
//! A [`Snapshot`] holds only source data: the chart, the journal in order,
//! rollups and period state. Balances are never stored; restoring replays
//! every entry through the same checks used when posting, so a snapshot
//! that was edited by hand either loads into a consistent ledger or is
//! rejected as a whole.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tally_shared::{AccountingMethod, Currency, EntryId};
use tracing::{info, warn};

use super::entry::{EntryKind, JournalEntry, Posting};
use super::error::LedgerError;
use super::general::{GeneralLedger, PeriodStatus};
use super::rollup::SubledgerRollup;
use super::validation::AccountPolicy;
use crate::account::{Account, AccountNumberTemplate};

/// A stored journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    /// Original entry id.
    pub id: EntryId,
    /// Entry date.
    pub date: NaiveDate,
    /// Entry memo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    /// Why the entry was recorded.
    #[serde(flatten)]
    pub kind: EntryKind,
    /// Postings in order.
    pub postings: Vec<Posting>,
}

impl From<&JournalEntry> for EntryRecord {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            id: entry.id(),
            date: entry.date(),
            memo: entry.memo().map(str::to_string),
            kind: entry.kind(),
            postings: entry.postings().to_vec(),
        }
    }
}

/// Everything needed to rebuild a general ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Ledger name.
    pub name: String,
    /// Functional currency.
    pub currency: Currency,
    /// Bookkeeping method.
    #[serde(default)]
    pub accounting_method: AccountingMethod,
    /// Open or closed.
    pub status: PeriodStatus,
    /// Period number.
    pub period: u32,
    /// Account code template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<AccountNumberTemplate>,
    /// Accounts in chart order.
    pub accounts: Vec<Account>,
    /// Top-level rollups.
    #[serde(default)]
    pub rollups: Vec<SubledgerRollup>,
    /// Entries in journal order.
    pub entries: Vec<EntryRecord>,
}

impl Snapshot {
    /// Encodes the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, LedgerError> {
        serde_json::to_string_pretty(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Decodes a snapshot. Malformed JSON is reported as corrupt data.
    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(json).map_err(|e| LedgerError::CorruptLedgerData(e.to_string()))
    }
}

impl GeneralLedger {
    /// Captures the ledger's source data.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            name: self.name().to_string(),
            currency: self.currency(),
            accounting_method: self.accounting_method(),
            status: self.status(),
            period: self.period(),
            template: self.chart().template().cloned(),
            accounts: self.chart().iter().cloned().collect(),
            rollups: self.rollups().to_vec(),
            entries: self.journal().iter().map(EntryRecord::from).collect(),
        }
    }

    /// Rebuilds a ledger from a snapshot, re-validating every invariant.
    ///
    /// # Errors
    ///
    /// `CorruptLedgerData` naming the first check that failed. Nothing is
    /// partially loaded.
    pub fn restore(snapshot: Snapshot) -> Result<Self, LedgerError> {
        Self::rebuild(snapshot).map_err(|err| {
            warn!(error = %err, "Snapshot rejected");
            match err {
                LedgerError::CorruptLedgerData(_) => err,
                other => LedgerError::CorruptLedgerData(other.to_string()),
            }
        })
    }

    fn rebuild(snapshot: Snapshot) -> Result<Self, LedgerError> {
        if snapshot.period == 0 {
            return Err(LedgerError::CorruptLedgerData("period 0".to_string()));
        }

        let mut gl = match snapshot.template {
            Some(template) => {
                template.revalidate()?;
                Self::with_template(snapshot.name, snapshot.currency, template)
            }
            None => Self::new(snapshot.name, snapshot.currency),
        }
        .with_accounting_method(snapshot.accounting_method);

        // 1. Accounts, all active so history can replay
        for account in &snapshot.accounts {
            gl.create_account(account.code(), account.name(), account.account_type())?;
        }

        // 2. Entries with their original ids, in journal order
        let entry_count = snapshot.entries.len();
        for record in snapshot.entries {
            let entry = JournalEntry::assemble(
                gl.chart(),
                record.id,
                record.date,
                record.postings,
                record.memo,
                record.kind,
                AccountPolicy::AllowArchived,
            )?;
            gl.replay(entry)?;
        }
        if !gl.is_balanced() {
            return Err(LedgerError::CorruptLedgerData(
                "journal debits and credits differ".to_string(),
            ));
        }

        // 3. Archive flags, rollups and period state
        for account in snapshot.accounts.iter().filter(|a| a.is_archived()) {
            gl.archive_account(account.code())?;
        }
        for rollup in &snapshot.rollups {
            gl.add_rollup(rollup.rebuild()?)?;
        }
        gl.set_period(snapshot.period);
        if snapshot.status == PeriodStatus::Closed {
            gl.close();
        }

        info!(
            ledger = %gl.name(),
            period = gl.period(),
            entries = entry_count,
            "Snapshot restored"
        );
        Ok(gl)
    }
}
