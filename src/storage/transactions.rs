//! Transaction store
//!
//! Owns the transactions of one document as an ordered sequence. Insertion
//! never reorders; callers run [`TransactionStore::sort`] when they need
//! chronological order.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{AccountHandle, Transaction, TransactionId};

/// Ordered collection of transactions
#[derive(Debug, Default)]
pub struct TransactionStore {
    transactions: Vec<Transaction>,
}

impl TransactionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Transactions in store order
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    /// Make room for `additional` more transactions
    pub fn reserve(&mut self, additional: usize) -> EngineResult<()> {
        self.transactions.try_reserve(additional)?;
        Ok(())
    }

    /// Append `txn`, taking ownership of it
    pub fn add(&mut self, txn: Transaction) -> EngineResult<TransactionId> {
        self.reserve(1)?;
        Ok(self.push_reserved(txn))
    }

    /// Append `txn` into capacity secured by [`TransactionStore::reserve`]
    pub(crate) fn push_reserved(&mut self, txn: Transaction) -> TransactionId {
        let id = txn.id();
        debug!(%id, date = %txn.date, "transaction added");
        self.transactions.push(txn);
        id
    }

    /// Every transaction dated exactly `date`, in store order
    ///
    /// Returns `None` rather than an empty list when nothing matches.
    pub fn at_date(&self, date: NaiveDate) -> Option<Vec<&Transaction>> {
        let found: Vec<&Transaction> = self
            .transactions
            .iter()
            .filter(|t| t.date == date)
            .collect();
        if found.is_empty() {
            None
        } else {
            Some(found)
        }
    }

    /// Position of the transaction with identity `id`
    pub fn find(&self, id: TransactionId) -> Option<usize> {
        self.transactions.iter().position(|t| t.id() == id)
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id() == id)
    }

    pub fn get_mut(&mut self, id: TransactionId) -> Option<&mut Transaction> {
        self.transactions.iter_mut().find(|t| t.id() == id)
    }

    /// Unlink the transaction with identity `id` and hand it back
    ///
    /// The caller owns the returned transaction: it can keep it (to add it
    /// back later) or drop it.
    pub fn remove(&mut self, id: TransactionId) -> EngineResult<Transaction> {
        let index = self
            .find(id)
            .ok_or_else(|| EngineError::transaction_not_found(id.to_string()))?;
        let txn = self.transactions.remove(index);
        debug!(%id, index, "transaction removed");
        Ok(txn)
    }

    /// Stable sort by date; transactions sharing a date keep their order
    pub fn sort(&mut self) {
        self.transactions.sort_by_key(|t| t.date);
        debug!(count = self.transactions.len(), "transactions sorted");
    }

    /// Transactions dated within `start..=end`, in store order
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|t| t.date >= start && t.date <= end)
            .collect()
    }

    /// Transactions with at least one split on `account`, in store order
    pub fn for_account(&self, account: AccountHandle) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(move |t| t.splits.iter().any(|s| s.account == Some(account)))
    }
}
