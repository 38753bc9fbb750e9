//! Storage layer for tally-core
//!
//! In-memory containers for one open document: the account directory with
//! its cached per-account entry lists, and the transaction store. [`Book`]
//! ties the two together so cached lists follow posted transactions.

pub mod accounts;
pub mod entries;
pub mod file_io;
pub mod transactions;

pub use accounts::AccountDirectory;
pub use entries::{Entry, EntryList};
pub use file_io::{read_json, write_json_atomic};
pub use transactions::TransactionStore;

use thiserror::Error;
use tracing::debug;

use crate::config::Settings;
use crate::error::{EngineError, EngineResult};
use crate::models::{AccountHandle, CurrencyCode, Transaction, TransactionId};

/// A transaction [`Book::post`] turned down, handed back to the caller
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PostError {
    pub error: EngineError,
    pub transaction: Transaction,
}

impl PostError {
    fn new(error: EngineError, transaction: Transaction) -> Self {
        Self { error, transaction }
    }
}

impl From<PostError> for EngineError {
    fn from(rejected: PostError) -> Self {
        rejected.error
    }
}

/// Accounts and transactions of one open document
#[derive(Debug)]
pub struct Book {
    pub accounts: AccountDirectory,
    pub transactions: TransactionStore,
}

impl Book {
    /// Create an empty book whose new accounts use `default_currency`
    pub fn new(default_currency: CurrencyCode) -> Self {
        Self {
            accounts: AccountDirectory::new(default_currency),
            transactions: TransactionStore::new(),
        }
    }

    /// Create an empty book using the configured default currency
    pub fn from_settings(settings: &Settings) -> EngineResult<Self> {
        Ok(Self::new(settings.default_currency_code()?))
    }

    /// Entry list of `handle`, built from the store the first time it is
    /// requested
    pub fn ledger_for(&mut self, handle: AccountHandle) -> EngineResult<&mut EntryList> {
        let cached = self.accounts.has_entries(handle);
        let list = self.accounts.entries_for(handle)?;
        if !cached {
            list.populate(&self.transactions)?;
            debug!(%handle, entries = list.len(), "ledger populated");
        }
        Ok(list)
    }

    /// Add `txn` to the store and insert its entries, in date order, into
    /// every cached ledger it touches
    ///
    /// On failure nothing changes and the transaction comes back inside the
    /// [`PostError`].
    pub fn post(&mut self, txn: Transaction) -> Result<TransactionId, PostError> {
        if let Err(error) = self.prepare(&txn) {
            return Err(PostError::new(error, txn));
        }

        let mut failure = None;
        for list in self.accounts.cached_entries_mut() {
            if let Err(e) = list.insert_transaction(&txn) {
                failure = Some(e);
                break;
            }
        }
        if let Some(error) = failure {
            for list in self.accounts.cached_entries_mut() {
                list.remove_transaction(txn.id());
            }
            return Err(PostError::new(error, txn));
        }

        Ok(self.transactions.push_reserved(txn))
    }

    /// Check the accounts of `txn` and secure all the room posting it needs
    fn prepare(&mut self, txn: &Transaction) -> EngineResult<()> {
        for account in txn.affected_accounts() {
            if !self.accounts.is_live(account) {
                return Err(EngineError::account_not_found(account.to_string()));
            }
        }
        self.transactions.reserve(1)?;
        for list in self.accounts.cached_entries_mut() {
            list.reserve_for(txn)?;
        }
        Ok(())
    }

    /// Remove the transaction `id` from the store and from cached ledgers,
    /// handing it back to the caller
    pub fn unpost(&mut self, id: TransactionId) -> EngineResult<Transaction> {
        let txn = self.transactions.remove(id)?;
        let dropped: usize = self
            .accounts
            .cached_entries_mut()
            .map(|list| list.remove_transaction(id))
            .sum();
        debug!(%id, dropped, "transaction unposted");
        Ok(txn)
    }
}
