//! The chart of accounts: registry of every account a ledger knows.

use std::collections::HashMap;

use tracing::info;

use super::filter::AccountFilter;
use super::template::{AccountNumber, AccountNumberTemplate};
use super::types::{Account, AccountType};
use crate::ledger::LedgerError;

/// Accounts in creation order, unique by code.
///
/// When a template is set every code must parse against it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartOfAccounts {
    accounts: Vec<Account>,
    index: HashMap<String, usize>,
    numbers: HashMap<String, AccountNumber>,
    template: Option<AccountNumberTemplate>,
}

impl ChartOfAccounts {
    /// An empty chart accepting any non-empty code.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty chart whose codes must follow `template`.
    #[must_use]
    pub fn with_template(template: AccountNumberTemplate) -> Self {
        Self {
            template: Some(template),
            ..Self::default()
        }
    }

    /// Registers a new account.
    ///
    /// # Errors
    ///
    /// `DuplicateAccountCode` if the code exists, `InvalidAccountNumber`
    /// if the code is empty or breaks the template.
    pub fn create(
        &mut self,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
    ) -> Result<&Account, LedgerError> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(LedgerError::InvalidAccountNumber {
                code,
                reason: "account code is empty".to_string(),
            });
        }
        if self.index.contains_key(&code) {
            return Err(LedgerError::DuplicateAccountCode(code));
        }
        let number = self
            .template
            .as_ref()
            .map(|template| template.parse(&code))
            .transpose()?;

        let account = Account::new(code.clone(), name.into(), account_type);
        info!(account = %code, account_type = %account_type, "Account created");

        if let Some(number) = number {
            self.numbers.insert(code.clone(), number);
        }
        let position = self.accounts.len();
        self.index.insert(code, position);
        self.accounts.push(account);
        Ok(&self.accounts[position])
    }

    /// Looks an account up by code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&Account> {
        self.index.get(code).map(|&i| &self.accounts[i])
    }

    /// Like [`get`](Self::get) but fails with `UnknownAccount`.
    pub fn require(&self, code: &str) -> Result<&Account, LedgerError> {
        self.get(code)
            .ok_or_else(|| LedgerError::UnknownAccount(code.to_string()))
    }

    /// True when `code` is registered.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Stops further postings to an account. Archiving twice is a no-op.
    pub fn archive(&mut self, code: &str) -> Result<(), LedgerError> {
        let position = *self
            .index
            .get(code)
            .ok_or_else(|| LedgerError::UnknownAccount(code.to_string()))?;
        self.accounts[position].archive();
        Ok(())
    }

    /// Accounts in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// True when no account is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// The code template, if any.
    #[must_use]
    pub fn template(&self) -> Option<&AccountNumberTemplate> {
        self.template.as_ref()
    }

    /// Parsed number of an account; `None` without a template.
    #[must_use]
    pub fn number(&self, code: &str) -> Option<&AccountNumber> {
        self.numbers.get(code)
    }

    /// Accounts matching `filter`, in creation order.
    pub fn filter<'a, 'f>(
        &'a self,
        filter: &'f AccountFilter,
    ) -> impl Iterator<Item = &'a Account> {
        self.accounts
            .iter()
            .filter(move |account| filter.matches(account, self.number(account.code())))
    }
}

impl<'a> IntoIterator for &'a ChartOfAccounts {
    type Item = &'a Account;
    type IntoIter = std::slice::Iter<'a, Account>;

    fn into_iter(self) -> Self::IntoIter {
        self.accounts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Segment;

    fn template() -> AccountNumberTemplate {
        AccountNumberTemplate::new(vec![
            Segment::new("Division Code", 2)
                .values([("01", "cmpny1"), ("10", "cmpny10"), ("11", "cmpny11")]),
            Segment::new("Department Code", 2)
                .values([("00", "dpt0"), ("01", "dpt1"), ("02", "dpt2")]),
            Segment::new("Account Code", 3)
                .range(100..=199, "Assets")
                .range(200..=299, "Liabilities")
                .range(300..=399, "Equity")
                .range(500..=599, "Expenses"),
        ])
        .unwrap()
    }

    fn segmented_chart() -> ChartOfAccounts {
        let mut chart = ChartOfAccounts::with_template(template());
        chart.create("10-02-200", "account 1", AccountType::Liability).unwrap();
        chart.create("10-00-300", "account 2", AccountType::Equity).unwrap();
        chart.create("01-00-300", "account 3", AccountType::Equity).unwrap();
        chart.create("11-01-500", "account 4", AccountType::Expense).unwrap();
        chart
    }

    fn codes<'a>(accounts: impl Iterator<Item = &'a Account>) -> Vec<&'a str> {
        accounts.map(Account::code).collect()
    }

    #[test]
    fn test_create_and_lookup() {
        let mut chart = ChartOfAccounts::new();
        let account = chart.create("1000", "Cash", AccountType::Asset).unwrap();
        assert_eq!(account.name(), "Cash");
        assert!(chart.contains("1000"));
        assert_eq!(chart.len(), 1);
        assert_eq!(chart.get("1000").unwrap().account_type(), AccountType::Asset);
        assert!(chart.get("2000").is_none());
        assert_eq!(
            chart.require("2000").unwrap_err(),
            LedgerError::UnknownAccount("2000".to_string())
        );
    }

    #[test]
    fn test_duplicate_code() {
        let mut chart = ChartOfAccounts::new();
        chart.create("1000", "Cash", AccountType::Asset).unwrap();
        assert_eq!(
            chart.create("1000", "Other", AccountType::Expense).unwrap_err(),
            LedgerError::DuplicateAccountCode("1000".to_string())
        );
        assert_eq!(chart.len(), 1);
        // Duplicate names are fine.
        chart.create("1001", "Cash", AccountType::Asset).unwrap();
    }

    #[test]
    fn test_empty_code_rejected() {
        let mut chart = ChartOfAccounts::new();
        assert!(matches!(
            chart.create("  ", "Blank", AccountType::Asset),
            Err(LedgerError::InvalidAccountNumber { .. })
        ));
        assert!(chart.is_empty());
    }

    #[test]
    fn test_archive() {
        let mut chart = ChartOfAccounts::new();
        chart.create("1000", "Cash", AccountType::Asset).unwrap();
        chart.archive("1000").unwrap();
        chart.archive("1000").unwrap();
        assert!(chart.get("1000").unwrap().is_archived());
        assert!(chart.archive("9999").is_err());
    }

    #[test]
    fn test_template_enforced() {
        let mut chart = segmented_chart();
        assert!(matches!(
            chart.create("99-00-100", "bad", AccountType::Asset),
            Err(LedgerError::InvalidAccountNumber { .. })
        ));
        assert_eq!(chart.len(), 4);
        assert_eq!(chart.number("11-01-500").unwrap().label("Account Code"), Some("Expenses"));
    }

    #[test]
    fn test_filter_by_segment() {
        let chart = segmented_chart();

        assert!(codes(chart.filter(&AccountFilter::new())).is_empty());
        assert_eq!(
            codes(chart.filter(&AccountFilter::new().eq("account_code", "500"))),
            ["11-01-500"]
        );
        assert_eq!(
            codes(chart.filter(&AccountFilter::new().eq("department_code", "00"))),
            ["10-00-300", "01-00-300"]
        );
        assert_eq!(
            codes(chart.filter(&AccountFilter::new().eq("Division Code", "10"))),
            ["10-02-200", "10-00-300"]
        );
        assert!(codes(chart.filter(&AccountFilter::new().eq("division_code", "05"))).is_empty());
    }

    #[test]
    fn test_filter_by_name() {
        let chart = segmented_chart();
        assert_eq!(
            codes(chart.filter(&AccountFilter::new().eq("name", "account 1"))),
            ["10-02-200"]
        );
        assert!(codes(chart.filter(&AccountFilter::new().eq("name", "account"))).is_empty());
    }

    #[test]
    fn test_filter_and_or() {
        let chart = segmented_chart();
        assert_eq!(
            codes(chart.filter(
                &AccountFilter::new().eq("name", "account 1").eq("division_code", "10")
            )),
            ["10-02-200"]
        );
        assert_eq!(
            codes(chart.filter(
                &AccountFilter::new()
                    .eq("name", "account 1")
                    .eq("division_code", "01")
                    .match_any()
            )),
            ["10-02-200", "01-00-300"]
        );
        assert_eq!(
            codes(chart.filter(&AccountFilter::new().any_of("account_code", ["200", "500"]))),
            ["10-02-200", "11-01-500"]
        );
    }
}
