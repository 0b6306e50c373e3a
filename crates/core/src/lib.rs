//! Core bookkeeping logic for Tally.
//!
//! This crate contains the pure double-entry engine with ZERO storage or UI
//! dependencies. Amounts are exact minor units from `tally-shared`; every
//! balance is derived from the journal.
//!
//! # Modules
//!
//! - `account` - Chart of accounts, account number templates and filters
//! - `ledger` - Journal, running balances, rollups, periods and reports

pub mod account;
pub mod ledger;
