//! Account queries by name, code, type or named code segment.

use serde::{Deserialize, Serialize};

use super::template::AccountNumber;
use super::types::Account;

/// How a field value is compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Criterion {
    /// Field equals the value.
    Eq(String),
    /// Field equals any of the values.
    In(Vec<String>),
}

impl Criterion {
    fn accepts(&self, actual: &str, fuzzy: bool) -> bool {
        let same = |expected: &str| {
            if fuzzy {
                expected.trim().eq_ignore_ascii_case(actual)
            } else {
                expected == actual
            }
        };
        match self {
            Self::Eq(expected) => same(expected),
            Self::In(values) => values.iter().any(|v| same(v)),
        }
    }
}

/// A query over the chart of accounts.
///
/// Fields are `name`, `code`, `type`, or the name of a template segment;
/// underscores and spaces are interchangeable in segment names, so
/// `account_code` selects the `Account Code` segment. By default every
/// criterion must hold and comparisons ignore case. A filter with no
/// criteria matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFilter {
    criteria: Vec<(String, Criterion)>,
    match_all: bool,
    fuzzy: bool,
}

impl Default for AccountFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountFilter {
    /// An empty AND filter with case-insensitive matching.
    #[must_use]
    pub fn new() -> Self {
        Self {
            criteria: Vec::new(),
            match_all: true,
            fuzzy: true,
        }
    }

    /// Requires `field` to equal `value`.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.criteria.push((field.into(), Criterion::Eq(value.into())));
        self
    }

    /// Requires `field` to equal one of `values`.
    #[must_use]
    pub fn any_of<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.criteria.push((
            field.into(),
            Criterion::In(values.into_iter().map(Into::into).collect()),
        ));
        self
    }

    /// Matches accounts satisfying at least one criterion.
    #[must_use]
    pub fn match_any(mut self) -> Self {
        self.match_all = false;
        self
    }

    /// Compares values case-sensitively.
    #[must_use]
    pub fn exact(mut self) -> Self {
        self.fuzzy = false;
        self
    }

    /// True when no criterion was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Evaluates the filter against one account and its parsed number.
    #[must_use]
    pub fn matches(&self, account: &Account, number: Option<&AccountNumber>) -> bool {
        if self.criteria.is_empty() {
            return false;
        }

        let mut hits = self.criteria.iter().map(|(field, criterion)| {
            field_value(account, number, field)
                .is_some_and(|actual| criterion.accepts(actual, self.fuzzy))
        });

        if self.match_all {
            hits.all(|hit| hit)
        } else {
            hits.any(|hit| hit)
        }
    }
}

fn field_value<'a>(
    account: &'a Account,
    number: Option<&'a AccountNumber>,
    field: &str,
) -> Option<&'a str> {
    match field.trim().to_ascii_lowercase().as_str() {
        "name" => Some(account.name()),
        "code" => Some(account.code()),
        "type" => Some(account.account_type().as_str()),
        _ => number.and_then(|n| n.segment(field)),
    }
}
