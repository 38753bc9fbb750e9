//! Account directory
//!
//! Owns every account of one document in an arena of slots. A slot is
//! never reclaimed: removing an account only unlinks it from the live
//! sequence and marks the slot as a tombstone, so handles held elsewhere
//! (an undo history, for one) keep dereferencing to the account's last
//! state and can bring it back with [`AccountDirectory::restore`].
//!
//! The directory also caches one [`EntryList`] per account, keyed by the
//! account's current name. The cache is only rekeyed by `rename`, only
//! when a list exists for the renamed account, and is unlinked by `remove`.

use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::entries::EntryList;
use crate::error::{EngineError, EngineResult};
use crate::models::{collation_key, Account, AccountHandle, CurrencyCode};

#[derive(Debug)]
struct Slot {
    account: Account,
    live: bool,
    /// Entry list that was cached when the account was removed
    parked_entries: Option<Box<EntryList>>,
}

/// Directory of the accounts of one document
#[derive(Debug)]
pub struct AccountDirectory {
    default_currency: CurrencyCode,
    slots: Vec<Slot>,
    /// Live accounts, in directory order
    active: Vec<AccountHandle>,
    /// Boxed so a list keeps its address when rekeyed or parked
    entries: HashMap<String, Box<EntryList>>,
}

impl AccountDirectory {
    /// Create an empty directory whose new accounts use `default_currency`
    pub fn new(default_currency: CurrencyCode) -> Self {
        Self {
            default_currency,
            slots: Vec::new(),
            active: Vec::new(),
            entries: HashMap::new(),
        }
    }

    pub fn default_currency(&self) -> &CurrencyCode {
        &self.default_currency
    }

    /// Number of live accounts
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Handles of live accounts, in directory order
    pub fn handles(&self) -> &[AccountHandle] {
        &self.active
    }

    /// Live accounts, in directory order
    pub fn iter(&self) -> impl Iterator<Item = (AccountHandle, &Account)> {
        self.active
            .iter()
            .filter_map(move |&h| self.slots.get(h.slot()).map(|s| (h, &s.account)))
    }

    /// Account behind `handle`, live or removed
    pub fn account(&self, handle: AccountHandle) -> Option<&Account> {
        self.slots.get(handle.slot()).map(|s| &s.account)
    }

    /// Mutable access to the account behind `handle`, live or removed
    ///
    /// The name can only be changed through [`AccountDirectory::rename`].
    pub fn account_mut(&mut self, handle: AccountHandle) -> Option<&mut Account> {
        self.slots.get_mut(handle.slot()).map(|s| &mut s.account)
    }

    /// Whether `handle` refers to an account that has not been removed
    pub fn is_live(&self, handle: AccountHandle) -> bool {
        self.slots.get(handle.slot()).is_some_and(|s| s.live)
    }

    /// Allocate a blank account at the end of the directory
    pub fn create(&mut self) -> EngineResult<AccountHandle> {
        self.slots.try_reserve(1)?;
        self.active.try_reserve(1)?;

        let handle = AccountHandle::from_slot(self.slots.len());
        self.slots.push(Slot {
            account: Account::new(self.default_currency.clone()),
            live: true,
            parked_entries: None,
        });
        self.active.push(handle);
        debug!(%handle, "account created");
        Ok(handle)
    }

    /// Create an account named `name` in `currency`
    pub fn create_named(&mut self, name: &str, currency: CurrencyCode) -> EngineResult<AccountHandle> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::Validation(
                "Account name cannot be empty".into(),
            ));
        }
        if self.find_by_name(name).is_some() {
            warn!(name, "account creation rejected: name taken");
            return Err(EngineError::name_conflict(name));
        }

        let handle = self.create()?;
        if let Some(account) = self.account_mut(handle) {
            account.set_name(name);
            account.currency = currency;
        }
        info!(%handle, name, "account created");
        Ok(handle)
    }

    /// Cached entry list of `handle`, created empty on first request
    ///
    /// Fails with a conflict when the list cached under the account's name
    /// belongs to another live account, which only happens between blank
    /// accounts from [`AccountDirectory::create`] that were never named.
    pub fn entries_for(&mut self, handle: AccountHandle) -> EngineResult<&mut EntryList> {
        let slot = self
            .slots
            .get_mut(handle.slot())
            .ok_or_else(|| EngineError::account_not_found(handle.to_string()))?;

        if !slot.live {
            let parked = slot
                .parked_entries
                .get_or_insert_with(|| Box::new(EntryList::new(handle)));
            return Ok(&mut **parked);
        }

        let name = slot.account.name().to_string();
        self.entries.try_reserve(1)?;
        match self.entries.entry(name) {
            MapEntry::Occupied(cached) if cached.get().account() == handle => {
                Ok(&mut **cached.into_mut())
            }
            MapEntry::Occupied(cached) => {
                warn!(
                    %handle,
                    owner = %cached.get().account(),
                    "entry list name already cached for another account"
                );
                Err(EngineError::name_conflict(cached.key().as_str()))
            }
            MapEntry::Vacant(vacant) => {
                debug!(%handle, name = vacant.key().as_str(), "entry list created");
                Ok(&mut **vacant.insert(Box::new(EntryList::new(handle))))
            }
        }
    }

    /// Whether an entry list is currently cached for `handle`
    pub fn has_entries(&self, handle: AccountHandle) -> bool {
        match self.slots.get(handle.slot()) {
            Some(slot) if slot.live => self
                .entries
                .get(slot.account.name())
                .is_some_and(|list| list.account() == handle),
            Some(slot) => slot.parked_entries.is_some(),
            None => false,
        }
    }

    /// Number of entry lists cached for live accounts
    pub fn cached_entry_lists(&self) -> usize {
        self.entries.len()
    }

    /// Every cached entry list of live accounts
    pub(crate) fn cached_entries_mut(&mut self) -> impl Iterator<Item = &mut EntryList> {
        self.entries.values_mut().map(|list| &mut **list)
    }

    /// Unlink `target` from the directory
    ///
    /// The account stays readable through `target` and can be brought back
    /// with [`AccountDirectory::restore`]. Its cached entry list is kept
    /// aside for that purpose.
    pub fn remove(&mut self, target: AccountHandle) -> EngineResult<()> {
        let index = self
            .active
            .iter()
            .position(|&h| h == target)
            .ok_or_else(|| EngineError::account_not_found(target.to_string()))?;
        self.active.remove(index);

        if let Some(slot) = self.slots.get_mut(target.slot()) {
            slot.live = false;
            let name = slot.account.name();
            if self
                .entries
                .get(name)
                .is_some_and(|list| list.account() == target)
            {
                slot.parked_entries = self.entries.remove(name);
            }
            info!(handle = %target, name = slot.account.name(), "account removed");
        }
        Ok(())
    }

    /// Put a removed account back at the end of the directory
    pub fn restore(&mut self, target: AccountHandle) -> EngineResult<()> {
        let name = match self.slots.get(target.slot()) {
            Some(slot) if !slot.live => slot.account.name().to_string(),
            _ => return Err(EngineError::account_not_found(target.to_string())),
        };
        if self.find_by_name(&name).is_some() {
            warn!(handle = %target, name, "restore rejected: name taken");
            return Err(EngineError::name_conflict(name));
        }

        self.active.try_reserve(1)?;
        self.entries.try_reserve(1)?;
        if let Some(slot) = self.slots.get_mut(target.slot()) {
            slot.live = true;
            if let Some(list) = slot.parked_entries.take() {
                self.entries.insert(name.clone(), list);
            }
        }
        self.active.push(target);
        info!(handle = %target, name, "account restored");
        Ok(())
    }

    /// Rename `target` to `new_name` (surrounding whitespace dropped)
    ///
    /// Fails with a conflict, changing nothing, when another live account
    /// already answers to `new_name`.
    pub fn rename(&mut self, target: AccountHandle, new_name: &str) -> EngineResult<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(EngineError::Validation(
                "Account name cannot be empty".into(),
            ));
        }
        let (old_name, live) = match self.slots.get(target.slot()) {
            Some(slot) => (slot.account.name().to_string(), slot.live),
            None => return Err(EngineError::account_not_found(target.to_string())),
        };
        if let Some(found) = self.find_by_name(new_name) {
            if found != target {
                warn!(handle = %target, new_name, "rename rejected: name taken");
                return Err(EngineError::name_conflict(new_name));
            }
        }

        self.entries.try_reserve(1)?;
        let cached = if live
            && self
                .entries
                .get(&old_name)
                .is_some_and(|list| list.account() == target)
        {
            self.entries.remove(&old_name)
        } else {
            None
        };

        if let Some(slot) = self.slots.get_mut(target.slot()) {
            slot.account.set_name(new_name);
        }
        if let Some(list) = cached {
            self.entries.insert(new_name.to_string(), list);
        }
        debug!(handle = %target, old_name, new_name, "account renamed");
        Ok(())
    }

    /// Live account answering to `name`
    ///
    /// The name is trimmed and compared by collation key; if no key
    /// matches, the trimmed name is compared verbatim against account
    /// numbers. The first match in directory order wins.
    pub fn find_by_name(&self, name: &str) -> Option<AccountHandle> {
        let trimmed = name.trim();
        let key = collation_key(trimmed);
        self.iter()
            .find(|(_, a)| a.name_key() == key)
            .or_else(|| {
                self.iter()
                    .find(|(_, a)| a.account_number.as_deref() == Some(trimmed))
            })
            .map(|(h, _)| h)
    }

    /// Live account whose import reference is exactly `reference`
    pub fn find_by_reference(&self, reference: &str) -> Option<AccountHandle> {
        if reference.is_empty() {
            return None;
        }
        self.iter()
            .find(|(_, a)| a.reference.as_deref() == Some(reference))
            .map(|(h, _)| h)
    }

    /// Independent copy of the live accounts, in order
    ///
    /// Entry lists are not copied. If any account fails to clone, nothing
    /// is returned.
    pub fn try_clone(&self) -> EngineResult<AccountDirectory> {
        let mut copy = AccountDirectory::new(self.default_currency.clone());
        for (index, (_, account)) in self.iter().enumerate() {
            let partial = |e: EngineError| EngineError::PartialClone {
                index,
                reason: e.to_string(),
            };
            let cloned = account.try_clone().map_err(partial)?;
            let handle = copy.create().map_err(partial)?;
            if let Some(slot) = copy.slots.get_mut(handle.slot()) {
                slot.account = cloned;
            }
        }
        debug!(count = copy.len(), "account directory cloned");
        Ok(copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::models::account::clone_failure;
    use crate::models::{AccountType, Amount, Split, Transaction};

    fn usd() -> CurrencyCode {
        CurrencyCode::parse("USD").unwrap()
    }

    fn directory() -> AccountDirectory {
        AccountDirectory::new(usd())
    }

    fn named(dir: &mut AccountDirectory, name: &str) -> AccountHandle {
        dir.create_named(name, usd()).unwrap()
    }

    #[test]
    fn test_create_appends_blank_account() {
        let mut dir = directory();
        let a = dir.create().unwrap();
        let b = dir.create().unwrap();
        assert_ne!(a, b);
        assert_eq!(dir.handles(), &[a, b]);

        let account = dir.account(a).unwrap();
        assert_eq!(account.name(), "");
        assert_eq!(account.currency, usd());
        assert!(dir.is_live(a));
    }

    #[test]
    fn test_create_named_rejects_duplicates_and_blanks() {
        let mut dir = directory();
        named(&mut dir, "Checking");
        assert!(dir
            .create_named("  CHECKING ", usd())
            .unwrap_err()
            .is_conflict());
        assert!(dir.create_named("   ", usd()).unwrap_err().is_validation());
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_find_by_name_folds_case_and_whitespace() {
        let mut dir = directory();
        let a = named(&mut dir, "Épargne");
        assert_eq!(dir.find_by_name("  ÉPARGNE "), Some(a));
        assert_eq!(dir.find_by_name("épargne"), Some(a));
        assert_eq!(dir.find_by_name("epargne"), None);
    }

    #[test]
    fn test_find_by_name_falls_back_to_account_number() {
        let mut dir = directory();
        let a = named(&mut dir, "Checking");
        let b = named(&mut dir, "Savings");
        dir.account_mut(b).unwrap().account_number = Some("Acc-42".into());

        assert_eq!(dir.find_by_name(" Acc-42 "), Some(b));
        // Account numbers are matched verbatim, not folded
        assert_eq!(dir.find_by_name("acc-42"), None);
        // A name match wins over an account number match
        dir.account_mut(b).unwrap().account_number = Some("checking".into());
        assert_eq!(dir.find_by_name("checking"), Some(a));
    }

    #[test]
    fn test_find_by_name_first_match_wins() {
        let mut dir = directory();
        let a = dir.create().unwrap();
        let b = dir.create().unwrap();
        dir.account_mut(a).unwrap().account_number = Some("1".into());
        dir.account_mut(b).unwrap().account_number = Some("1".into());
        assert_eq!(dir.find_by_name("1"), Some(a));
    }

    #[test]
    fn test_find_by_reference() {
        let mut dir = directory();
        let a = named(&mut dir, "Checking");
        dir.account_mut(a).unwrap().reference = Some("OFX-ref".into());

        assert_eq!(dir.find_by_reference("OFX-ref"), Some(a));
        assert_eq!(dir.find_by_reference("ofx-ref"), None);
        assert_eq!(dir.find_by_reference(""), None);
    }

    #[test]
    fn test_entries_for_returns_same_instance() {
        let mut dir = directory();
        let a = named(&mut dir, "Checking");

        let first: *const EntryList = dir.entries_for(a).unwrap();
        let b = named(&mut dir, "Savings");
        dir.entries_for(b).unwrap();
        let second: *const EntryList = dir.entries_for(a).unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(dir.cached_entry_lists(), 2);
        assert_eq!(dir.entries_for(a).unwrap().account(), a);
    }

    #[test]
    fn test_entries_for_blank_accounts_do_not_share_a_list() {
        let mut dir = directory();
        let a = dir.create().unwrap();
        let b = dir.create().unwrap();

        assert_eq!(dir.entries_for(a).unwrap().account(), a);
        assert!(dir.entries_for(b).unwrap_err().is_conflict());
        assert!(!dir.has_entries(b));

        dir.rename(b, "Savings").unwrap();
        assert_eq!(dir.entries_for(b).unwrap().account(), b);
        assert_eq!(dir.cached_entry_lists(), 2);
    }

    #[test]
    fn test_rename_rejects_blank_name() {
        let mut dir = directory();
        let a = named(&mut dir, "Checking");
        assert!(dir.rename(a, "   ").unwrap_err().is_validation());
        assert_eq!(dir.account(a).unwrap().name(), "Checking");
    }

    #[test]
    fn test_rename_to_other_account_name_conflicts() {
        let mut dir = directory();
        let a = named(&mut dir, "Checking");
        let b = named(&mut dir, "Savings");

        let err = dir.rename(a, "SAVINGS").unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(dir.account(a).unwrap().name(), "Checking");
        assert_eq!(dir.account(b).unwrap().name(), "Savings");
    }

    #[test]
    fn test_rename_to_own_name_with_new_case() {
        let mut dir = directory();
        let a = named(&mut dir, "checking");
        dir.rename(a, "Checking").unwrap();
        assert_eq!(dir.account(a).unwrap().name(), "Checking");
    }

    #[test]
    fn test_rename_updates_lookup() {
        let mut dir = directory();
        let a = named(&mut dir, "Checking");
        dir.rename(a, "Joint Checking").unwrap();

        assert_eq!(dir.find_by_name("joint checking"), Some(a));
        assert_eq!(dir.find_by_name("Checking"), None);
    }

    #[test]
    fn test_rename_rekeys_cached_entries() {
        let mut dir = directory();
        let a = named(&mut dir, "Checking");
        let mut txn = Transaction::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        txn.add_split(Split::new(Some(a), Amount::new(100, usd())));
        dir.entries_for(a).unwrap().push_transaction(&txn).unwrap();
        let before: *const EntryList = dir.entries_for(a).unwrap();

        dir.rename(a, "Main").unwrap();
        assert_eq!(dir.cached_entry_lists(), 1);
        assert!(dir.has_entries(a));
        let after = dir.entries_for(a).unwrap();
        assert_eq!(after.len(), 1);
        assert!(std::ptr::eq(before, after));
    }

    #[test]
    fn test_rename_without_cache_creates_nothing() {
        let mut dir = directory();
        let a = named(&mut dir, "Checking");
        dir.rename(a, "Main").unwrap();
        assert_eq!(dir.cached_entry_lists(), 0);
        assert!(!dir.has_entries(a));
    }

    #[test]
    fn test_remove_unlinks_but_keeps_data() {
        let mut dir = directory();
        let a = named(&mut dir, "Checking");
        let b = named(&mut dir, "Savings");
        let c = named(&mut dir, "Cash");
        {
            let account = dir.account_mut(b).unwrap();
            account.reference = Some("ref-b".into());
            account.account_type = AccountType::Liability;
        }

        dir.remove(b).unwrap();
        assert_eq!(dir.handles(), &[a, c]);
        assert_eq!(dir.find_by_name("Savings"), None);
        assert_eq!(dir.find_by_reference("ref-b"), None);
        assert!(!dir.is_live(b));

        let removed = dir.account(b).unwrap();
        assert_eq!(removed.name(), "Savings");
        assert_eq!(removed.reference.as_deref(), Some("ref-b"));
        assert_eq!(removed.account_type, AccountType::Liability);
    }

    #[test]
    fn test_remove_unknown_fails_without_change() {
        let mut dir = directory();
        let a = named(&mut dir, "Checking");
        dir.remove(a).unwrap();

        let b = named(&mut dir, "Savings");

        assert!(dir.remove(a).unwrap_err().is_not_found());
        assert!(dir
            .remove(AccountHandle::from_slot(99))
            .unwrap_err()
            .is_not_found());
        assert_eq!(dir.handles(), &[b]);
    }

    #[test]
    fn test_removal_frees_the_name() {
        let mut dir = directory();
        let a = named(&mut dir, "Checking");
        dir.remove(a).unwrap();
        let b = named(&mut dir, "Checking");
        assert_ne!(a, b);
        assert_eq!(dir.find_by_name("checking"), Some(b));
    }

    #[test]
    fn test_restore_brings_back_account_and_entries() {
        let mut dir = directory();
        let a = named(&mut dir, "Checking");
        let b = named(&mut dir, "Savings");
        let list: *const EntryList = dir.entries_for(a).unwrap();

        dir.remove(a).unwrap();
        assert_eq!(dir.cached_entry_lists(), 0);
        assert!(dir.has_entries(a));

        dir.restore(a).unwrap();
        assert_eq!(dir.handles(), &[b, a]);
        assert_eq!(dir.find_by_name("checking"), Some(a));
        let restored: *const EntryList = dir.entries_for(a).unwrap();
        assert!(std::ptr::eq(list, restored));
    }

    #[test]
    fn test_restore_rejects_live_or_conflicting() {
        let mut dir = directory();
        let a = named(&mut dir, "Checking");
        assert!(dir.restore(a).unwrap_err().is_not_found());

        dir.remove(a).unwrap();
        named(&mut dir, "CHECKING");
        assert!(dir.restore(a).unwrap_err().is_conflict());
        assert!(!dir.is_live(a));
    }

    #[test]
    fn test_try_clone_copies_in_order() {
        let mut dir = directory();
        let a = named(&mut dir, "Checking");
        let b = named(&mut dir, "Savings");
        let gone = named(&mut dir, "Gone");
        dir.account_mut(b).unwrap().account_number = Some("42".into());
        dir.remove(gone).unwrap();

        let mut copy = dir.try_clone().unwrap();
        assert_eq!(copy.len(), 2);
        assert_eq!(copy.default_currency(), dir.default_currency());
        for ((_, original), (_, cloned)) in dir.iter().zip(copy.iter()) {
            assert_eq!(original, cloned);
            assert!(!std::ptr::eq(original, cloned));
        }

        let first = copy.handles()[0];
        copy.rename(first, "Renamed").unwrap();
        copy.account_mut(first).unwrap().notes = "edited".into();
        assert_eq!(dir.account(a).unwrap().name(), "Checking");
        assert_eq!(dir.account(a).unwrap().notes, "");
    }

    #[test]
    fn test_try_clone_is_all_or_nothing() {
        let mut dir = directory();
        for name in ["Checking", "Savings", "Cash"] {
            named(&mut dir, name);
        }
        let before = dir.handles().to_vec();

        clone_failure::fail_after(1);
        let err = dir.try_clone().unwrap_err();
        assert!(matches!(err, EngineError::PartialClone { index: 1, .. }));

        assert_eq!(dir.handles(), before.as_slice());
        let names: Vec<&str> = dir.iter().map(|(_, a)| a.name()).collect();
        assert_eq!(names, vec!["Checking", "Savings", "Cash"]);
        assert_eq!(dir.try_clone().unwrap().len(), 3);
    }
}
