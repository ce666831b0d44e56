//! # Account Store
//!
//! Arena of escrow accounts indexed by sequential [`AccountNumber`].
//!
//! All operations are synchronous (the lock is `parking_lot`, not
//! `tokio::sync`) because the lock is never held across `.await` points.
//! Cloning the store is cheap and every clone shares the same data.
//!
//! Mutation goes through [`AccountStore::try_update`], which runs the
//! caller's read-validate-mutate closure on a working copy under one write
//! lock and commits only on `Ok`. A rejected operation therefore never
//! leaves a partially mutated account behind. The working copy is taken
//! without the account's history; new events are appended on commit.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mofn_core::{AccountNumber, BlockHeight, EscrowError, Principal};

use crate::account::EscrowAccount;

/// Errors raised when restoring a store from a snapshot.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// Two snapshot entries share an account number.
    #[error("duplicate account {0} in snapshot")]
    DuplicateAccount(AccountNumber),

    /// An issued account number has no entry. Accounts are never removed.
    #[error("account {0} missing from snapshot")]
    MissingAccount(AccountNumber),

    /// The next-number counter is below the first issuable number.
    #[error("next account number {0} is below the first account number")]
    InvalidCounter(AccountNumber),

    /// An account number was never issued by the recorded counter.
    #[error("account {number} is not below next account number {next}")]
    NumberOutOfRange {
        /// The offending account.
        number: AccountNumber,
        /// The snapshot's next-number counter.
        next: AccountNumber,
    },

    /// An account violates a structural invariant.
    #[error("account {number} violates invariant: {reason}")]
    InvariantViolation {
        /// The offending account.
        number: AccountNumber,
        /// What is wrong.
        reason: String,
    },
}

/// Serializable image of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Number the next successful `create` will receive.
    pub next_account: AccountNumber,
    /// All accounts in number order.
    pub accounts: Vec<EscrowAccount>,
}

#[derive(Debug)]
struct Inner {
    accounts: BTreeMap<AccountNumber, EscrowAccount>,
    next_account: AccountNumber,
}

/// Thread-safe, cloneable account arena.
#[derive(Debug, Clone)]
pub struct AccountStore {
    inner: Arc<RwLock<Inner>>,
}

impl AccountStore {
    /// Create an empty store. The first account will be number 1.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                accounts: BTreeMap::new(),
                next_account: AccountNumber::FIRST,
            })),
        }
    }

    /// Open a new account owned by `owner`.
    ///
    /// Fails with [`EscrowError::InvalidThreshold`] unless `1 <= m <= n`,
    /// and with [`EscrowError::AccountLimitReached`] once `u64::MAX` has
    /// been issued. Failed creations do not consume an account number.
    pub fn create(
        &self,
        owner: Principal,
        m: u64,
        n: u64,
        height: BlockHeight,
    ) -> Result<AccountNumber, EscrowError> {
        if !EscrowAccount::valid_thresholds(m, n) {
            return Err(EscrowError::InvalidThreshold);
        }
        let mut guard = self.inner.write();
        let number = guard.next_account;
        let following = number.next().ok_or(EscrowError::AccountLimitReached)?;
        guard
            .accounts
            .insert(number, EscrowAccount::new(number, owner, m, n, height));
        guard.next_account = following;
        Ok(number)
    }

    /// Fetch a copy of an account.
    pub fn get(&self, number: AccountNumber) -> Result<EscrowAccount, EscrowError> {
        self.inner
            .read()
            .accounts
            .get(&number)
            .cloned()
            .ok_or(EscrowError::AccountNotFound)
    }

    /// Read a projection of an account without cloning it.
    pub fn with<R>(
        &self,
        number: AccountNumber,
        f: impl FnOnce(&EscrowAccount) -> R,
    ) -> Result<R, EscrowError> {
        self.inner
            .read()
            .accounts
            .get(&number)
            .map(f)
            .ok_or(EscrowError::AccountNotFound)
    }

    /// Atomically read-validate-update an account.
    ///
    /// Fails with [`EscrowError::AccountNotFound`] before calling `f` when
    /// the number was never issued. Otherwise `f` runs on a working copy
    /// whose `history` starts empty; the copy replaces the stored account,
    /// with its events appended to the stored history, only if `f`
    /// returns `Ok`.
    pub fn try_update<R>(
        &self,
        number: AccountNumber,
        f: impl FnOnce(&mut EscrowAccount) -> Result<R, EscrowError>,
    ) -> Result<R, EscrowError> {
        let mut guard = self.inner.write();
        let slot = guard
            .accounts
            .get_mut(&number)
            .ok_or(EscrowError::AccountNotFound)?;
        let history = std::mem::take(&mut slot.history);
        let mut working = slot.clone();
        match f(&mut working) {
            Ok(result) => {
                let fresh = std::mem::replace(&mut working.history, history);
                working.append_history(fresh);
                *slot = working;
                Ok(result)
            }
            Err(e) => {
                slot.history = history;
                Err(e)
            }
        }
    }

    /// Total accounts created so far.
    pub fn open_account_count(&self) -> u64 {
        self.inner.read().accounts.len() as u64
    }

    /// Whether an account exists.
    pub fn contains(&self, number: AccountNumber) -> bool {
        self.inner.read().accounts.contains_key(&number)
    }

    /// All accounts in number order.
    pub fn list(&self) -> Vec<EscrowAccount> {
        self.inner.read().accounts.values().cloned().collect()
    }

    /// Project every account in number order without cloning them.
    pub fn map_all<R>(&self, f: impl FnMut(&EscrowAccount) -> R) -> Vec<R> {
        self.inner.read().accounts.values().map(f).collect()
    }

    /// Capture the full store contents.
    pub fn snapshot(&self) -> StoreSnapshot {
        let guard = self.inner.read();
        StoreSnapshot {
            next_account: guard.next_account,
            accounts: guard.accounts.values().cloned().collect(),
        }
    }

    /// Rebuild a store from a snapshot, validating every account.
    ///
    /// Histories longer than [`HISTORY_LIMIT`](crate::account::HISTORY_LIMIT)
    /// are pruned.
    pub fn restore(snapshot: StoreSnapshot) -> Result<Self, StoreError> {
        let next = snapshot.next_account;
        if next < AccountNumber::FIRST {
            return Err(StoreError::InvalidCounter(next));
        }
        let mut accounts = BTreeMap::new();
        for mut account in snapshot.accounts {
            let number = account.number;
            if number < AccountNumber::FIRST || number >= next {
                return Err(StoreError::NumberOutOfRange { number, next });
            }
            account
                .check_invariants()
                .map_err(|reason| StoreError::InvariantViolation { number, reason })?;
            account.trim_history();
            if accounts.insert(number, account).is_some() {
                return Err(StoreError::DuplicateAccount(number));
            }
        }
        if let Some(gap) = (AccountNumber::FIRST.get()..next.get())
            .map(AccountNumber)
            .find(|n| !accounts.contains_key(n))
        {
            return Err(StoreError::MissingAccount(gap));
        }
        Ok(Self {
            inner: Arc::new(RwLock::new(Inner {
                accounts,
                next_account: next,
            })),
        })
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "ST37X0038BZV6YV0MQCJ0G6QMZZ75QS64KA69V9D";
    const ALICE: &str = "SZ2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQ9H6DPR";

    fn owner() -> Principal {
        Principal::new(OWNER).unwrap()
    }

    #[test]
    fn empty_store_has_no_accounts() {
        let store = AccountStore::new();
        assert_eq!(store.open_account_count(), 0);
        assert_eq!(store.get(AccountNumber(1)), Err(EscrowError::AccountNotFound));
        assert!(!store.contains(AccountNumber(1)));
    }

    #[test]
    fn create_assigns_sequential_numbers() {
        let store = AccountStore::new();
        for expected in 1..=5 {
            let n = store.create(owner(), 1, 2, BlockHeight(1)).unwrap();
            assert_eq!(n, AccountNumber(expected));
        }
        assert_eq!(store.open_account_count(), 5);
    }

    #[test]
    fn invalid_thresholds_do_not_consume_numbers() {
        let store = AccountStore::new();
        assert_eq!(
            store.create(owner(), 0, 3, BlockHeight(1)),
            Err(EscrowError::InvalidThreshold)
        );
        assert_eq!(
            store.create(owner(), 4, 3, BlockHeight(1)),
            Err(EscrowError::InvalidThreshold)
        );
        assert_eq!(store.open_account_count(), 0);
        assert_eq!(
            store.create(owner(), 3, 3, BlockHeight(1)),
            Ok(AccountNumber(1))
        );
    }

    #[test]
    fn account_zero_is_never_issued() {
        let store = AccountStore::new();
        store.create(owner(), 1, 1, BlockHeight(1)).unwrap();
        assert_eq!(store.get(AccountNumber(0)), Err(EscrowError::AccountNotFound));
    }

    #[test]
    fn try_update_commits_on_ok() {
        let store = AccountStore::new();
        let n = store.create(owner(), 1, 1, BlockHeight(1)).unwrap();
        let alice = Principal::new(ALICE).unwrap();
        let balance = store
            .try_update(n, |a| a.credit(&alice, 50, BlockHeight(2)))
            .unwrap();
        assert_eq!(balance, 50);
        assert_eq!(store.get(n).unwrap().balance, 50);
    }

    #[test]
    fn try_update_discards_partial_mutation_on_err() {
        let store = AccountStore::new();
        let n = store.create(owner(), 1, 1, BlockHeight(1)).unwrap();
        let before = store.get(n).unwrap();
        let alice = Principal::new(ALICE).unwrap();
        let result: Result<(), EscrowError> = store.try_update(n, |a| {
            a.credit(&alice, 50, BlockHeight(2))?;
            Err(EscrowError::NotReceiver)
        });
        assert_eq!(result, Err(EscrowError::NotReceiver));
        assert_eq!(store.get(n).unwrap(), before);
    }

    #[test]
    fn try_update_unknown_account_skips_closure() {
        let store = AccountStore::new();
        let mut called = false;
        let result = store.try_update(AccountNumber(9), |_| {
            called = true;
            Ok(())
        });
        assert_eq!(result, Err(EscrowError::AccountNotFound));
        assert!(!called);
    }

    #[test]
    fn try_update_appends_to_retained_history() {
        let store = AccountStore::new();
        let n = store.create(owner(), 1, 1, BlockHeight(1)).unwrap();
        let alice = Principal::new(ALICE).unwrap();
        store
            .try_update(n, |a| {
                assert!(a.history.is_empty());
                a.credit(&alice, 5, BlockHeight(2))
            })
            .unwrap();
        let _ = store.try_update(n, |a| a.debit(&alice, 500, BlockHeight(3)));

        let history = store.get(n).unwrap().history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].height, BlockHeight(1));
        assert_eq!(history[1].height, BlockHeight(2));
    }

    #[test]
    fn last_account_number_is_not_reissued() {
        let store = AccountStore::new();
        store.inner.write().next_account = AccountNumber(u64::MAX);
        assert_eq!(
            store.create(owner(), 1, 1, BlockHeight(1)),
            Err(EscrowError::AccountLimitReached)
        );
        assert_eq!(store.open_account_count(), 0);
        assert_eq!(store.inner.read().next_account, AccountNumber(u64::MAX));
    }

    #[test]
    fn clones_share_data() {
        let store = AccountStore::new();
        let other = store.clone();
        store.create(owner(), 1, 1, BlockHeight(1)).unwrap();
        assert_eq!(other.open_account_count(), 1);
    }

    #[test]
    fn snapshot_restore_preserves_counter() {
        let store = AccountStore::new();
        store.create(owner(), 1, 2, BlockHeight(1)).unwrap();
        store.create(owner(), 2, 2, BlockHeight(2)).unwrap();
        let restored = AccountStore::restore(store.snapshot()).unwrap();
        assert_eq!(restored.list(), store.list());
        assert_eq!(
            restored.create(owner(), 1, 1, BlockHeight(3)).unwrap(),
            AccountNumber(3)
        );
    }

    #[test]
    fn restore_rejects_inconsistent_snapshots() {
        let store = AccountStore::new();
        store.create(owner(), 1, 2, BlockHeight(1)).unwrap();
        let good = store.snapshot();

        let mut stale_counter = good.clone();
        stale_counter.next_account = AccountNumber(1);
        assert!(matches!(
            AccountStore::restore(stale_counter),
            Err(StoreError::NumberOutOfRange { .. })
        ));

        let mut duplicated = good.clone();
        duplicated.next_account = AccountNumber(5);
        duplicated.accounts.push(duplicated.accounts[0].clone());
        assert_eq!(
            AccountStore::restore(duplicated).unwrap_err(),
            StoreError::DuplicateAccount(AccountNumber(1))
        );

        let mut gap = good.clone();
        gap.next_account = AccountNumber(3);
        assert_eq!(
            AccountStore::restore(gap).unwrap_err(),
            StoreError::MissingAccount(AccountNumber(2))
        );

        let zero_counter = StoreSnapshot {
            next_account: AccountNumber(0),
            accounts: Vec::new(),
        };
        assert_eq!(
            AccountStore::restore(zero_counter).unwrap_err(),
            StoreError::InvalidCounter(AccountNumber(0))
        );

        let mut broken = good;
        broken.accounts[0].m = 3;
        assert!(matches!(
            AccountStore::restore(broken),
            Err(StoreError::InvariantViolation { .. })
        ));
    }
}
