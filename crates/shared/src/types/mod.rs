//! Common types used across the workspace.

pub mod date;
pub mod id;
pub mod money;

pub use date::{DateParseError, parse_date};
pub use id::*;
pub use money::{Currency, Money, MoneyError};
