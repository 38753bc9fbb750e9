//! Per-account entry lists
//!
//! An entry is one split seen from the account it affects. The account
//! directory caches one `EntryList` per account, keyed by the account's
//! current name.

use chrono::NaiveDate;

use crate::currency::CurrencyRegistry;
use crate::error::EngineResult;
use crate::models::{AccountHandle, Amount, CurrencyCode, Transaction, TransactionId};

use super::transactions::TransactionStore;

/// A posted line affecting one account
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub transaction: TransactionId,
    pub date: NaiveDate,
    pub amount: Amount,
    pub description: String,
    pub reconciled: bool,
}

/// Ordered ledger of one account
#[derive(Debug)]
pub struct EntryList {
    account: AccountHandle,
    entries: Vec<Entry>,
}

impl EntryList {
    /// Create an empty list for `account`
    pub fn new(account: AccountHandle) -> Self {
        Self {
            account,
            entries: Vec::new(),
        }
    }

    pub fn account(&self) -> AccountHandle {
        self.account
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Append an entry without reordering
    pub fn push(&mut self, entry: Entry) -> EngineResult<()> {
        self.entries.try_reserve(1)?;
        self.entries.push(entry);
        Ok(())
    }

    /// Append the entries `txn` produces for this list's account
    pub fn push_transaction(&mut self, txn: &Transaction) -> EngineResult<usize> {
        let mut added = 0;
        for split in txn.splits_for(self.account) {
            self.push(Entry {
                transaction: txn.id(),
                date: txn.date,
                amount: split.amount.clone(),
                description: txn.description.clone(),
                reconciled: split.reconciled,
            })?;
            added += 1;
        }
        Ok(added)
    }

    /// Make room for the entries `txn` produces for this list's account
    pub fn reserve_for(&mut self, txn: &Transaction) -> EngineResult<()> {
        let needed = txn.splits_for(self.account).count();
        self.entries.try_reserve(needed)?;
        Ok(())
    }

    /// Insert the entries `txn` produces for this list's account at their
    /// date position, after any entries already on that date
    ///
    /// Keeps a date-ordered list date-ordered, in the same order
    /// [`EntryList::populate`] would produce.
    pub fn insert_transaction(&mut self, txn: &Transaction) -> EngineResult<usize> {
        self.reserve_for(txn)?;
        let mut at = self.entries.partition_point(|e| e.date <= txn.date);
        let mut added = 0;
        for split in txn.splits_for(self.account) {
            self.entries.insert(
                at,
                Entry {
                    transaction: txn.id(),
                    date: txn.date,
                    amount: split.amount.clone(),
                    description: txn.description.clone(),
                    reconciled: split.reconciled,
                },
            );
            at += 1;
            added += 1;
        }
        Ok(added)
    }

    /// Stable sort by date
    pub fn sort(&mut self) {
        self.entries.sort_by_key(|e| e.date);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop every entry coming from `txn`, returning how many were dropped
    pub fn remove_transaction(&mut self, txn: TransactionId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.transaction != txn);
        before - self.entries.len()
    }

    /// Date of the latest entry
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.iter().map(|e| e.date).max()
    }

    /// Rebuild from every split in `store` that targets this account, in
    /// date order
    pub fn populate(&mut self, store: &TransactionStore) -> EngineResult<()> {
        self.entries.clear();
        for txn in store.for_account(self.account) {
            self.push_transaction(txn)?;
        }
        self.sort();
        Ok(())
    }

    /// Sum of all entries expressed in `currency`, each entry converted at
    /// the rate of its own date
    pub fn balance_in(
        &self,
        registry: &CurrencyRegistry,
        currency: &CurrencyCode,
    ) -> EngineResult<Amount> {
        let mut total = Amount::zero(currency.clone());
        for entry in &self.entries {
            let converted = entry.amount.convert(registry, entry.date, currency)?;
            total = total.checked_add(&converted)?;
        }
        Ok(total)
    }
}
