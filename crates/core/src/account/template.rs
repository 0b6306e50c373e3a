//! Segmented account numbers.
//!
//! A template such as `XX-XX-XXX` splits an account code into named
//! segments (division, department, account code). Each segment has a fixed
//! width and a set of allowed values, listed one by one or as numeric
//! ranges sharing one label.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// One allowed value, or a block of values, for a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SegmentRule {
    /// A single literal value.
    Value {
        /// The literal, exactly `width` characters.
        value: String,
        /// Human-readable meaning.
        label: String,
    },
    /// Every number in `start..=end`, zero padded to the segment width.
    Range {
        /// First allowed number.
        start: u32,
        /// Last allowed number.
        end: u32,
        /// Label shared by the whole range.
        label: String,
    },
}

impl SegmentRule {
    fn label_for(&self, raw: &str) -> Option<&str> {
        match self {
            Self::Value { value, label } => (value == raw).then_some(label.as_str()),
            Self::Range { start, end, label } => {
                if !raw.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let number: u32 = raw.parse().ok()?;
                (*start..=*end).contains(&number).then_some(label.as_str())
            }
        }
    }
}

/// A named, fixed-width part of an account number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    name: String,
    width: usize,
    rules: Vec<SegmentRule>,
}

impl Segment {
    /// A segment with no allowed values yet.
    pub fn new(name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            width,
            rules: Vec::new(),
        }
    }

    /// Allows one literal value.
    #[must_use]
    pub fn value(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.rules.push(SegmentRule::Value {
            value: value.into(),
            label: label.into(),
        });
        self
    }

    /// Allows several literal values.
    #[must_use]
    pub fn values<I, V, L>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<String>,
        L: Into<String>,
    {
        pairs
            .into_iter()
            .fold(self, |segment, (value, label)| segment.value(value, label))
    }

    /// Allows a numeric range under one label.
    #[must_use]
    pub fn range(mut self, range: RangeInclusive<u32>, label: impl Into<String>) -> Self {
        self.rules.push(SegmentRule::Range {
            start: *range.start(),
            end: *range.end(),
            label: label.into(),
        });
        self
    }

    /// Segment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of characters.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Label of `raw`, if the segment allows it.
    #[must_use]
    pub fn label(&self, raw: &str) -> Option<&str> {
        if raw.chars().count() != self.width {
            return None;
        }
        self.rules.iter().find_map(|rule| rule.label_for(raw))
    }

    fn check(&self) -> Result<(), LedgerError> {
        let invalid = |reason: String| Err(LedgerError::InvalidTemplate(reason));

        if self.width == 0 {
            return invalid(format!("segment {} has zero width", self.name));
        }
        if self.rules.is_empty() {
            return invalid(format!("segment {} allows no values", self.name));
        }
        for rule in &self.rules {
            match rule {
                SegmentRule::Value { value, .. } if value.chars().count() != self.width => {
                    return invalid(format!(
                        "value {value:?} does not fit segment {} of width {}",
                        self.name, self.width
                    ));
                }
                SegmentRule::Range { start, end, .. } => {
                    let fits = u32::try_from(self.width)
                        .ok()
                        .and_then(|w| 10_u32.checked_pow(w))
                        .is_none_or(|limit| *end < limit);
                    if start > end || !fits {
                        return invalid(format!(
                            "range {start}..={end} does not fit segment {} of width {}",
                            self.name, self.width
                        ));
                    }
                }
                SegmentRule::Value { .. } => {}
            }
        }
        Ok(())
    }
}

/// Format every account code of a chart must follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountNumberTemplate {
    separator: String,
    segments: Vec<Segment>,
}

impl AccountNumberTemplate {
    /// A template whose segments are joined with `-`.
    pub fn new(segments: Vec<Segment>) -> Result<Self, LedgerError> {
        Self::with_separator("-", segments)
    }

    /// A template with a custom separator.
    pub fn with_separator(
        separator: impl Into<String>,
        segments: Vec<Segment>,
    ) -> Result<Self, LedgerError> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(LedgerError::InvalidTemplate("empty separator".to_string()));
        }
        if segments.is_empty() {
            return Err(LedgerError::InvalidTemplate("no segments".to_string()));
        }
        for (i, segment) in segments.iter().enumerate() {
            segment.check()?;
            if segments[..i]
                .iter()
                .any(|s| same_segment_name(&s.name, &segment.name))
            {
                return Err(LedgerError::InvalidTemplate(format!(
                    "duplicate segment name {}",
                    segment.name
                )));
            }
        }
        Ok(Self {
            separator,
            segments,
        })
    }

    /// Re-runs construction checks; used when a template is deserialized.
    pub(crate) fn revalidate(&self) -> Result<(), LedgerError> {
        Self::with_separator(self.separator.clone(), self.segments.clone()).map(|_| ())
    }

    /// Segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Separator between segments.
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Placeholder form, e.g. `XX-XX-XXX`.
    #[must_use]
    pub fn form(&self) -> String {
        self.segments
            .iter()
            .map(|s| "X".repeat(s.width))
            .collect::<Vec<_>>()
            .join(&self.separator)
    }

    /// Returns true if `code` follows the template.
    #[must_use]
    pub fn validate(&self, code: &str) -> bool {
        self.parse(code).is_ok()
    }

    /// Splits `code` into labelled segments.
    pub fn parse(&self, code: &str) -> Result<AccountNumber, LedgerError> {
        let invalid = |reason: String| LedgerError::InvalidAccountNumber {
            code: code.to_string(),
            reason,
        };

        let raw: Vec<&str> = code.split(self.separator.as_str()).collect();
        if raw.len() != self.segments.len() {
            return Err(invalid(format!("expected form {}", self.form())));
        }

        let parts = self
            .segments
            .iter()
            .zip(raw)
            .map(|(segment, value)| {
                segment
                    .label(value)
                    .map(|label| SegmentValue {
                        name: segment.name.clone(),
                        value: value.to_string(),
                        label: label.to_string(),
                    })
                    .ok_or_else(|| {
                        invalid(format!("{value:?} is not a valid {}", segment.name))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AccountNumber {
            parts,
            code: code.to_string(),
        })
    }
}

/// One parsed segment of an account number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentValue {
    /// Segment name.
    pub name: String,
    /// Raw segment text.
    pub value: String,
    /// Label the template assigns to the value.
    pub label: String,
}

/// An account code parsed against a template.
///
/// Ordering compares segment values left to right.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountNumber {
    parts: Vec<SegmentValue>,
    code: String,
}

impl AccountNumber {
    /// The full code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Parsed segments in order.
    #[must_use]
    pub fn parts(&self) -> &[SegmentValue] {
        &self.parts
    }

    fn find(&self, name: &str) -> Option<&SegmentValue> {
        self.parts.iter().find(|p| same_segment_name(&p.name, name))
    }

    /// Raw value of the named segment.
    ///
    /// Names compare case-insensitively, with underscores read as spaces.
    #[must_use]
    pub fn segment(&self, name: &str) -> Option<&str> {
        self.find(name).map(|p| p.value.as_str())
    }

    /// Label of the named segment.
    #[must_use]
    pub fn label(&self, name: &str) -> Option<&str> {
        self.find(name).map(|p| p.label.as_str())
    }
}

/// `Account_Code`, `account code` and `ACCOUNT_CODE` name the same segment.
fn same_segment_name(a: &str, b: &str) -> bool {
    let fold = |c: char| if c == '_' { ' ' } else { c.to_ascii_lowercase() };
    a.trim().chars().map(fold).eq(b.trim().chars().map(fold))
}
