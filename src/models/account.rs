//! Account model
//!
//! Represents ledger buckets (bank accounts, cards, income and expense
//! categories). An account is matched by name through a cached collation
//! key, and optionally by its external account number.

use std::fmt;

use caseless::Caseless;
use unicode_normalization::UnicodeNormalization;

use super::currency::CurrencyCode;
use crate::error::EngineResult;

/// Class of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccountType {
    #[default]
    Asset,
    Liability,
    Income,
    Expense,
}

impl AccountType {
    /// Returns true for accounts shown on the balance sheet (assets and
    /// liabilities), as opposed to income statement accounts.
    pub fn is_balance_sheet(&self) -> bool {
        matches!(self, Self::Asset | Self::Liability)
    }

    /// Parse account type from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "asset" | "assets" => Some(Self::Asset),
            "liability" | "liabilities" => Some(Self::Liability),
            "income" => Some(Self::Income),
            "expense" | "expenses" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asset => write!(f, "Asset"),
            Self::Liability => write!(f, "Liability"),
            Self::Income => write!(f, "Income"),
            Self::Expense => write!(f, "Expense"),
        }
    }
}

/// Comparable identity key for an account name
///
/// Surrounding whitespace is dropped, the text is brought to Unicode
/// compatibility composition (NFKC) and then fully case-folded, so
/// "  Épargne" and "ÉPARGNE" produce the same key, as do "Straße" and
/// "STRASSE".
pub fn collation_key(name: &str) -> String {
    name.trim().nfkc().default_case_fold().collect()
}

/// A ledger account
///
/// `name` and its derived key are only changed through the directory's
/// rename so the key never goes stale.
#[derive(Debug, PartialEq)]
pub struct Account {
    name: String,
    name_key: String,

    /// Currency the account is denominated in
    pub currency: CurrencyCode,

    pub account_type: AccountType,

    /// External account number, a secondary lookup channel
    pub account_number: Option<String>,

    /// Opaque reference assigned by an import source
    pub reference: Option<String>,

    /// Name of the group the account is filed under
    pub group: Option<String>,

    pub notes: String,

    pub inactive: bool,
}

impl Account {
    /// Create an unnamed account in `currency`
    pub fn new(currency: CurrencyCode) -> Self {
        Self {
            name: String::new(),
            name_key: collation_key(""),
            currency,
            account_type: AccountType::default(),
            account_number: None,
            reference: None,
            group: None,
            notes: String::new(),
            inactive: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cached collation key of the current name
    pub fn name_key(&self) -> &str {
        &self.name_key
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.name_key = collation_key(name);
    }

    /// Field-for-field copy that reports allocation failure instead of
    /// aborting.
    pub fn try_clone(&self) -> EngineResult<Self> {
        #[cfg(test)]
        clone_failure::check()?;

        Ok(Self {
            name: try_clone_str(&self.name)?,
            name_key: try_clone_str(&self.name_key)?,
            currency: self.currency.clone(),
            account_type: self.account_type,
            account_number: try_clone_opt(&self.account_number)?,
            reference: try_clone_opt(&self.reference)?,
            group: try_clone_opt(&self.group)?,
            notes: try_clone_str(&self.notes)?,
            inactive: self.inactive,
        })
    }
}

fn try_clone_str(s: &str) -> EngineResult<String> {
    let mut out = String::new();
    out.try_reserve_exact(s.len())?;
    out.push_str(s);
    Ok(out)
}

fn try_clone_opt(s: &Option<String>) -> EngineResult<Option<String>> {
    s.as_deref().map(try_clone_str).transpose()
}

/// Test hook making `Account::try_clone` fail after a set number of clones
#[cfg(test)]
pub(crate) mod clone_failure {
    use std::cell::Cell;

    use crate::error::{EngineError, EngineResult};

    thread_local! {
        static REMAINING: Cell<Option<usize>> = const { Cell::new(None) };
    }

    /// Let `successes` clones through on this thread, then fail the next one
    pub(crate) fn fail_after(successes: usize) {
        REMAINING.with(|r| r.set(Some(successes)));
    }

    pub(super) fn check() -> EngineResult<()> {
        REMAINING.with(|r| match r.get() {
            Some(0) => {
                r.set(None);
                Err(EngineError::ResourceExhausted("account clone failed".into()))
            }
            Some(n) => {
                r.set(Some(n - 1));
                Ok(())
            }
            None => Ok(()),
        })
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.account_type, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd() -> CurrencyCode {
        CurrencyCode::parse("USD").unwrap()
    }

    #[test]
    fn test_new_account_is_blank() {
        let account = Account::new(usd());
        assert_eq!(account.name(), "");
        assert_eq!(account.name_key(), "");
        assert_eq!(account.account_type, AccountType::Asset);
        assert!(account.account_number.is_none());
        assert!(account.reference.is_none());
        assert!(!account.inactive);
    }

    #[test]
    fn test_set_name_updates_key() {
        let mut account = Account::new(usd());
        account.set_name("  My Checking ");
        assert_eq!(account.name(), "  My Checking ");
        assert_eq!(account.name_key(), "my checking");
    }

    #[test]
    fn test_collation_key_folds_case_and_width() {
        assert_eq!(collation_key("ÉPARGNE"), collation_key("épargne"));
        // Fullwidth letters fold to their ASCII forms under NFKC
        assert_eq!(collation_key("ＣＡＳＨ"), collation_key("cash"));
        // Decomposed and precomposed accents compare equal
        assert_eq!(collation_key("Cafe\u{301}"), collation_key("Café"));
        assert_ne!(collation_key("cafe"), collation_key("café"));
    }

    #[test]
    fn test_collation_key_full_case_folding() {
        assert_eq!(collation_key("Straße"), collation_key("STRASSE"));
        assert_eq!(collation_key("straße"), "strasse");
        // Final sigma folds to the ordinary sigma
        assert_eq!(collation_key("ΟΔΟΣ"), collation_key("οδος"));
    }

    #[test]
    fn test_try_clone_failure_hook() {
        let account = Account::new(usd());
        clone_failure::fail_after(1);
        assert!(account.try_clone().is_ok());
        assert!(matches!(
            account.try_clone(),
            Err(crate::error::EngineError::ResourceExhausted(_))
        ));
        // One-shot: later clones succeed again
        assert!(account.try_clone().is_ok());
    }

    #[test]
    fn test_try_clone_is_field_for_field() {
        let mut account = Account::new(usd());
        account.set_name("Visa");
        account.account_type = AccountType::Liability;
        account.account_number = Some("4111".into());
        account.reference = Some("ofx-1".into());
        account.group = Some("Cards".into());
        account.notes = "primary card".into();

        let copy = account.try_clone().unwrap();
        assert_eq!(copy, account);
    }

    #[test]
    fn test_account_type_parsing() {
        assert_eq!(AccountType::parse("asset"), Some(AccountType::Asset));
        assert_eq!(AccountType::parse(" EXPENSES "), Some(AccountType::Expense));
        assert_eq!(AccountType::parse("bogus"), None);
        assert!(AccountType::Liability.is_balance_sheet());
        assert!(!AccountType::Income.is_balance_sheet());
    }

    #[test]
    fn test_display() {
        let mut account = Account::new(usd());
        account.set_name("Wallet");
        assert_eq!(account.to_string(), "Wallet (Asset, USD)");
    }
}
