//! Transaction model
//!
//! A transaction is a dated event made of splits, each split moving an
//! amount in or out of one account. Identity is the `TransactionId`
//! assigned at construction; two transactions with equal content are still
//! different transactions.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

use super::amount::Amount;
use super::currency::CurrencyCode;
use super::ids::{AccountHandle, TransactionId};

/// One line of a transaction
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// Account affected by this split, if assigned
    pub account: Option<AccountHandle>,

    /// Amount (positive for increase, negative for decrease)
    pub amount: Amount,

    pub memo: String,

    pub reconciled: bool,
}

impl Split {
    pub fn new(account: Option<AccountHandle>, amount: Amount) -> Self {
        Self {
            account,
            amount,
            memo: String::new(),
            reconciled: false,
        }
    }

    pub fn with_memo(account: Option<AccountHandle>, amount: Amount, memo: impl Into<String>) -> Self {
        Self {
            memo: memo.into(),
            ..Self::new(account, amount)
        }
    }
}

/// A dated financial event
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,

    pub date: NaiveDate,

    pub description: String,

    pub payee: String,

    /// Check number, if paid by check
    pub checkno: String,

    pub notes: String,

    pub splits: Vec<Split>,
}

impl Transaction {
    /// Create an empty transaction on `date`
    pub fn new(date: NaiveDate) -> Self {
        Self {
            id: TransactionId::new(),
            date,
            description: String::new(),
            payee: String::new(),
            checkno: String::new(),
            notes: String::new(),
            splits: Vec::new(),
        }
    }

    /// Create a transaction with a description
    pub fn with_description(date: NaiveDate, description: impl Into<String>) -> Self {
        let mut txn = Self::new(date);
        txn.description = description.into();
        txn
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Add a split
    pub fn add_split(&mut self, split: Split) {
        self.splits.push(split);
    }

    /// Accounts touched by this transaction, in split order, without repeats
    pub fn affected_accounts(&self) -> Vec<AccountHandle> {
        let mut accounts = Vec::new();
        for handle in self.splits.iter().filter_map(|s| s.account) {
            if !accounts.contains(&handle) {
                accounts.push(handle);
            }
        }
        accounts
    }

    /// Splits of this transaction that affect `account`
    pub fn splits_for(&self, account: AccountHandle) -> impl Iterator<Item = &Split> {
        self.splits
            .iter()
            .filter(move |s| s.account == Some(account))
    }

    /// Net minor units moved in `account`, per currency
    pub fn amount_for(&self, account: AccountHandle) -> HashMap<CurrencyCode, i64> {
        let mut totals: HashMap<CurrencyCode, i64> = HashMap::new();
        for split in self.splits_for(account) {
            *totals.entry(split.amount.currency.clone()).or_default() += split.amount.units;
        }
        totals
    }

    /// True when the splits of each currency sum to zero
    pub fn is_balanced(&self) -> bool {
        let mut totals: HashMap<&CurrencyCode, i64> = HashMap::new();
        for split in &self.splits {
            *totals.entry(&split.amount.currency).or_default() += split.amount.units;
        }
        totals.values().all(|total| *total == 0)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.description)
    }
}
