//! Accounts and the chart of accounts.
//!
//! - [`AccountType`] fixes each account's normal balance side
//! - [`ChartOfAccounts`] owns accounts and enforces unique codes
//! - [`AccountNumberTemplate`] optionally constrains code shape
//! - [`AccountFilter`] queries the chart by name, type or code segment

mod chart;
mod filter;
mod template;
mod types;

pub use chart::ChartOfAccounts;
pub use filter::{AccountFilter, Criterion};
pub use template::{AccountNumber, AccountNumberTemplate, Segment, SegmentRule, SegmentValue};
pub use types::{Account, AccountType};
