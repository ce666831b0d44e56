//! # Read-Only Queries
//!
//! [`QueryFacade`] exposes typed getters over the account store and
//! [`QueryFacade::evaluate`] renders a [`Query`] as the Clarity response a
//! legacy caller expects.
//!
//! Unknown accounts report `(err 4)` for scalar getters but an empty list
//! for the roster and signature getters. A receiver that was never set
//! reports `(err 6)` from `get-receiver` and height `u0` from
//! `get-block-height`.

use serde::{Deserialize, Serialize};

use mofn_core::{AccountNumber, Amount, BlockHeight, EscrowError, Principal, Value};

use crate::store::AccountStore;

/// A read-only contract call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// `get-m`: signatures required.
    M(AccountNumber),
    /// `get-n`: participant cap.
    N(AccountNumber),
    /// `get-participants`: roster in insertion order.
    Participants(AccountNumber),
    /// `get-signatures`: signers since the receiver was set.
    Signatures(AccountNumber),
    /// `get-receiver`: current receiver.
    Receiver(AccountNumber),
    /// `get-balance`: current balance.
    Balance(AccountNumber),
    /// `get-open-accounts`: accounts created so far.
    OpenAccounts,
    /// `get-block-height`: height at which the receiver was set.
    BlockHeight(AccountNumber),
}

/// Typed read access to an [`AccountStore`].
#[derive(Debug, Clone)]
pub struct QueryFacade {
    store: AccountStore,
}

impl QueryFacade {
    /// Wrap a store handle.
    pub fn new(store: AccountStore) -> Self {
        Self { store }
    }

    /// Signatures required to withdraw from `number`.
    pub fn get_m(&self, number: AccountNumber) -> Result<u64, EscrowError> {
        self.store.with(number, |a| a.m)
    }

    /// Participant cap of `number`.
    pub fn get_n(&self, number: AccountNumber) -> Result<u64, EscrowError> {
        self.store.with(number, |a| a.n)
    }

    /// Roster of `number`; empty when the account does not exist.
    pub fn get_participants(&self, number: AccountNumber) -> Vec<Principal> {
        self.store
            .with(number, |a| a.participants.clone())
            .unwrap_or_default()
    }

    /// Signers of `number`; empty when the account does not exist.
    pub fn get_signatures(&self, number: AccountNumber) -> Vec<Principal> {
        self.store
            .with(number, |a| a.signatures.clone())
            .unwrap_or_default()
    }

    /// Current receiver of `number`. Fails with
    /// [`EscrowError::ReceiverNotSet`] before the first `set-receiver`.
    pub fn get_receiver(&self, number: AccountNumber) -> Result<Principal, EscrowError> {
        self.store
            .with(number, |a| a.receiver.clone())?
            .ok_or(EscrowError::ReceiverNotSet)
    }

    /// Balance held by `number`.
    pub fn get_balance(&self, number: AccountNumber) -> Result<Amount, EscrowError> {
        self.store.with(number, |a| a.balance)
    }

    /// Accounts created so far. Accounts are never closed.
    pub fn get_open_accounts(&self) -> u64 {
        self.store.open_account_count()
    }

    /// Height at which the receiver was last set, or genesis if never.
    pub fn get_block_height(&self, number: AccountNumber) -> Result<BlockHeight, EscrowError> {
        self.store
            .with(number, |a| a.receiver_set_at.unwrap_or(BlockHeight::GENESIS))
    }

    /// Evaluate `query` and render the response value.
    pub fn evaluate(&self, query: Query) -> Value {
        fn respond<T>(r: Result<T, EscrowError>, f: impl FnOnce(T) -> Value) -> Value {
            match r {
                Ok(v) => Value::ok(f(v)),
                Err(e) => Value::err_code(e.code()),
            }
        }

        match query {
            Query::M(n) => respond(self.get_m(n), |m| Value::UInt(u128::from(m))),
            Query::N(n) => respond(self.get_n(n), |cap| Value::UInt(u128::from(cap))),
            Query::Participants(n) => Value::ok(Value::principals(&self.get_participants(n))),
            Query::Signatures(n) => Value::ok(Value::principals(&self.get_signatures(n))),
            Query::Receiver(n) => respond(self.get_receiver(n), Value::Principal),
            Query::Balance(n) => respond(self.get_balance(n), Value::UInt),
            Query::OpenAccounts => Value::UInt(u128::from(self.get_open_accounts())),
            Query::BlockHeight(n) => {
                respond(self.get_block_height(n), |h| Value::UInt(u128::from(h.get())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EscrowEngine;
    use mofn_core::{EpochSchedule, FixedHeight};

    const OWNER: &str = "ST37X0038BZV6YV0MQCJ0G6QMZZ75QS64KA69V9D";
    const ALICE: &str = "SZ2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQ9H6DPR";
    const BOB: &str = "ST1BG7MHW2R524WMF7X8PGG3V45ZN040EB9EW0GQJ";

    fn p(s: &str) -> Principal {
        Principal::new(s).unwrap()
    }

    fn setup() -> (EscrowEngine, QueryFacade) {
        let store = AccountStore::new();
        let engine = EscrowEngine::new(store.clone(), EpochSchedule::default());
        (engine, QueryFacade::new(store))
    }

    #[test]
    fn unknown_account_responses() {
        let (_, q) = setup();
        let missing = AccountNumber(3);
        assert_eq!(q.evaluate(Query::M(missing)).to_string(), "(err 4)");
        assert_eq!(q.evaluate(Query::N(missing)).to_string(), "(err 4)");
        assert_eq!(q.evaluate(Query::Balance(missing)).to_string(), "(err 4)");
        assert_eq!(q.evaluate(Query::Receiver(missing)).to_string(), "(err 4)");
        assert_eq!(q.evaluate(Query::BlockHeight(missing)).to_string(), "(err 4)");
        assert_eq!(q.evaluate(Query::Participants(missing)).to_string(), "(ok ())");
        assert_eq!(q.evaluate(Query::Signatures(missing)).to_string(), "(ok ())");
        assert_eq!(q.evaluate(Query::OpenAccounts).to_string(), "u0");
    }

    #[test]
    fn fresh_account_responses() {
        let (e, q) = setup();
        let owner = p(OWNER);
        let n = e.create(&owner, 2, 3, &FixedHeight(BlockHeight(2))).unwrap();
        assert_eq!(q.evaluate(Query::M(n)).to_string(), "(ok u2)");
        assert_eq!(q.evaluate(Query::N(n)).to_string(), "(ok u3)");
        assert_eq!(q.evaluate(Query::Receiver(n)).to_string(), "(err 6)");
        assert_eq!(q.evaluate(Query::BlockHeight(n)).to_string(), "(ok u0)");
        assert_eq!(q.evaluate(Query::Balance(n)).to_string(), "(ok u0)");
        assert_eq!(q.evaluate(Query::OpenAccounts).to_string(), "u1");
    }

    #[test]
    fn configured_account_responses() {
        let (e, q) = setup();
        let owner = p(OWNER);
        let h = FixedHeight(BlockHeight(12));
        let n = e.create(&owner, 1, 2, &h).unwrap();
        e.add_participant(&owner, n, p(ALICE), &h).unwrap();
        e.add_participant(&owner, n, p(BOB), &h).unwrap();
        e.set_receiver(&owner, n, p(BOB), &h).unwrap();
        e.add_signature(&p(ALICE), n, &h).unwrap();

        assert_eq!(
            q.evaluate(Query::Participants(n)).to_string(),
            format!("(ok ({ALICE} {BOB}))")
        );
        assert_eq!(
            q.evaluate(Query::Signatures(n)).to_string(),
            format!("(ok ({ALICE}))")
        );
        assert_eq!(q.evaluate(Query::Receiver(n)).to_string(), format!("(ok {BOB})"));
        assert_eq!(q.evaluate(Query::BlockHeight(n)).to_string(), "(ok u12)");
        assert_eq!(q.get_receiver(n), Ok(p(BOB)));
    }
}
