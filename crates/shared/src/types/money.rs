//! Money type with exact minor-unit precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are stored as an integer count of the currency's minor unit
//! (cents for USD). `rust_decimal::Decimal` is only used at the edges,
//! for display and for importing human-entered amounts.

use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by money arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Operands carry different currencies.
    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch {
        /// Currency of the left-hand operand.
        expected: Currency,
        /// Currency of the right-hand operand.
        found: Currency,
    },

    /// The result does not fit in the minor-unit representation.
    #[error("Money arithmetic overflowed")]
    Overflow,

    /// A decimal amount has more fractional digits than the currency allows.
    #[error("Amount {amount} has more precision than {currency} allows")]
    TooPrecise {
        /// The rejected amount.
        amount: Decimal,
        /// The target currency.
        currency: Currency,
    },

    /// Currency code is not supported.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
}

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US Dollar
    Usd,
    /// Euro
    Eur,
    /// Pound Sterling
    Gbp,
    /// Canadian Dollar
    Cad,
    /// Indonesian Rupiah
    Idr,
    /// Singapore Dollar
    Sgd,
    /// Japanese Yen
    Jpy,
}

impl Currency {
    /// Number of decimal digits in one major unit.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::Jpy => 0,
            Self::Usd | Self::Eur | Self::Gbp | Self::Cad | Self::Idr | Self::Sgd => 2,
        }
    }

    /// The three-letter ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Cad => "CAD",
            Self::Idr => "IDR",
            Self::Sgd => "SGD",
            Self::Jpy => "JPY",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "CAD" => Ok(Self::Cad),
            "IDR" => Ok(Self::Idr),
            "SGD" => Ok(Self::Sgd),
            "JPY" => Ok(Self::Jpy),
            _ => Err(MoneyError::UnknownCurrency(s.to_string())),
        }
    }
}

/// Represents a monetary amount with currency.
///
/// Immutable value type: every operation returns a new `Money`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// The amount in the smallest currency unit (e.g., cents).
    amount_minor: i64,
    /// ISO 4217 currency code.
    currency: Currency,
}

impl Money {
    /// Creates a new Money instance from minor units.
    #[must_use]
    pub const fn from_minor(amount_minor: i64, currency: Currency) -> Self {
        Self {
            amount_minor,
            currency,
        }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self::from_minor(0, currency)
    }

    /// Converts a major-unit decimal (e.g. `12.34`) into money.
    ///
    /// Amounts finer than the currency's minor unit are rejected rather
    /// than rounded.
    pub fn from_decimal(amount: Decimal, currency: Currency) -> Result<Self, MoneyError> {
        let factor = Decimal::from(10_i64.pow(currency.minor_units()));
        let scaled = amount.checked_mul(factor).ok_or(MoneyError::Overflow)?;
        if !scaled.fract().is_zero() {
            return Err(MoneyError::TooPrecise { amount, currency });
        }
        let minor = scaled.trunc().to_i64().ok_or(MoneyError::Overflow)?;
        Ok(Self::from_minor(minor, currency))
    }

    /// Returns the amount in minor units.
    #[must_use]
    pub const fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    /// Returns the currency.
    #[must_use]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns the amount in major units as an exact decimal.
    #[must_use]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.amount_minor, self.currency.minor_units())
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.amount_minor < 0
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.amount_minor > 0
    }

    /// Amount with thousands separators and no currency code, e.g. `1,234.56`.
    #[must_use]
    pub fn format_amount(&self) -> String {
        let digits = self.currency.minor_units();
        let divisor = 10_u64.pow(digits);
        let magnitude = self.amount_minor.unsigned_abs();
        let whole = group_thousands(magnitude / divisor);
        let sign = if self.is_negative() { "-" } else { "" };

        if digits == 0 {
            format!("{sign}{whole}")
        } else {
            let fraction = magnitude % divisor;
            format!("{sign}{whole}.{fraction:0width$}", width = digits as usize)
        }
    }

    fn ensure_same_currency(&self, other: &Self) -> Result<(), MoneyError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                expected: self.currency,
                found: other.currency,
            })
        }
    }

    /// Adds two amounts of the same currency.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(&other)?;
        let amount = self
            .amount_minor
            .checked_add(other.amount_minor)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::from_minor(amount, self.currency))
    }

    /// Subtracts `other` from `self`.
    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(&other)?;
        let amount = self
            .amount_minor
            .checked_sub(other.amount_minor)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::from_minor(amount, self.currency))
    }

    /// Negates the amount.
    pub fn checked_neg(self) -> Result<Self, MoneyError> {
        let amount = self.amount_minor.checked_neg().ok_or(MoneyError::Overflow)?;
        Ok(Self::from_minor(amount, self.currency))
    }

    /// Absolute value.
    pub fn checked_abs(self) -> Result<Self, MoneyError> {
        let amount = self.amount_minor.checked_abs().ok_or(MoneyError::Overflow)?;
        Ok(Self::from_minor(amount, self.currency))
    }

    /// Total order between two amounts of the same currency.
    pub fn compare(&self, other: &Self) -> Result<Ordering, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount_minor.cmp(&other.amount_minor))
    }

    /// Sums amounts, starting from zero in `currency`.
    pub fn sum<I>(currency: Currency, amounts: I) -> Result<Self, MoneyError>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::zero(currency), Self::checked_add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.format_amount(), self.currency)
    }
}

fn group_thousands(value: u64) -> String {
    let raw = value.to_string();
    let mut grouped = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
#[path = "money_tests.rs"]
mod tests;
