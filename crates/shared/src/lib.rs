//! Shared types, errors, and configuration for Tally.
//!
//! This crate provides common types used across all other crates:
//! - Money types with exact minor-unit precision
//! - Typed IDs for type-safe entity references
//! - Lenient date parsing for importers
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AccountingMethod, AppConfig, LedgerConfig};
pub use error::{AppError, AppResult};
pub use types::{Currency, DateParseError, EntryId, Money, MoneyError, parse_date};
