//! # Escrow Engine
//!
//! Stateless processor over an [`AccountStore`]. Each operation runs its
//! preconditions in a fixed order inside one [`AccountStore::try_update`]
//! section; the first failing check decides the [`EscrowError`] returned.
//!
//! ## Check Order
//!
//! | Operation | Checks |
//! |---|---|
//! | `add_participant` | exists, owner, not present, below cap |
//! | `set_receiver` | exists, owner, not set this epoch |
//! | `deposit` | exists, receiver set |
//! | `add_signature` | exists, roster full, participant, not signed |
//! | `withdraw` | exists, quorum, receiver, balance |
//!
//! Unknown accounts always short-circuit before any other check, so a
//! non-owner touching a missing account sees `ACCOUNT_NOT_FOUND`, not
//! `NOT_OWNER`.
//!
//! The height of the executing block is supplied by the caller through a
//! [`HeightSource`]; the engine never reads a clock.

use mofn_core::{
    AccountNumber, Amount, EpochSchedule, EscrowError, HeightSource, Principal,
};

use crate::store::AccountStore;

/// Applies escrow operations to a shared account store.
#[derive(Debug, Clone, Default)]
pub struct EscrowEngine {
    store: AccountStore,
    schedule: EpochSchedule,
}

impl EscrowEngine {
    /// Create an engine over `store` with the given epoch schedule.
    pub fn new(store: AccountStore, schedule: EpochSchedule) -> Self {
        Self { store, schedule }
    }

    /// The underlying store.
    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    /// The epoch schedule used for receiver gating.
    pub fn schedule(&self) -> EpochSchedule {
        self.schedule
    }

    /// Open a new `m`-of-`n` account owned by `sender`.
    pub fn create(
        &self,
        sender: &Principal,
        m: u64,
        n: u64,
        heights: &impl HeightSource,
    ) -> Result<AccountNumber, EscrowError> {
        let height = heights.current_height();
        let number = self.store.create(sender.clone(), m, n, height)?;
        tracing::debug!(account = %number, owner = %sender, m, n, "account created");
        Ok(number)
    }

    /// Add `participant` to the roster of `number`.
    pub fn add_participant(
        &self,
        sender: &Principal,
        number: AccountNumber,
        participant: Principal,
        heights: &impl HeightSource,
    ) -> Result<(), EscrowError> {
        let height = heights.current_height();
        self.store.try_update(number, |account| {
            if !account.is_owner(sender) {
                return Err(EscrowError::NotOwner);
            }
            if account.is_participant(&participant) {
                return Err(EscrowError::ParticipantAlreadyPresent);
            }
            if account.roster_full() {
                return Err(EscrowError::ParticipantCapExceeded);
            }
            account.push_participant(sender, participant.clone(), height);
            Ok(())
        })?;
        tracing::debug!(account = %number, participant = %participant, "participant added");
        Ok(())
    }

    /// Assign `receiver` for the epoch containing the current height.
    ///
    /// Succeeds at most once per account per epoch. A successful call
    /// discards every signature collected for the previous receiver.
    pub fn set_receiver(
        &self,
        sender: &Principal,
        number: AccountNumber,
        receiver: Principal,
        heights: &impl HeightSource,
    ) -> Result<(), EscrowError> {
        let height = heights.current_height();
        let epoch = self.schedule.epoch_of(height);
        self.store.try_update(number, |account| {
            if !account.is_owner(sender) {
                return Err(EscrowError::NotOwner);
            }
            if account.receiver_set_in(epoch) {
                return Err(EscrowError::ReceiverAlreadySet);
            }
            account.assign_receiver(sender, receiver.clone(), height, epoch);
            Ok(())
        })?;
        tracing::debug!(account = %number, receiver = %receiver, %height, %epoch, "receiver set");
        Ok(())
    }

    /// Credit `amount` to `number`. Any sender may deposit once a receiver
    /// is set. Returns the new balance.
    pub fn deposit(
        &self,
        sender: &Principal,
        number: AccountNumber,
        amount: Amount,
        heights: &impl HeightSource,
    ) -> Result<Amount, EscrowError> {
        let height = heights.current_height();
        let balance = self.store.try_update(number, |account| {
            if account.receiver.is_none() {
                return Err(EscrowError::ReceiverNotSet);
            }
            account.credit(sender, amount, height)
        })?;
        tracing::debug!(account = %number, amount = %amount, balance = %balance, "deposit credited");
        Ok(balance)
    }

    /// Record `sender`'s signature on `number` for the current receiver.
    pub fn add_signature(
        &self,
        sender: &Principal,
        number: AccountNumber,
        heights: &impl HeightSource,
    ) -> Result<(), EscrowError> {
        let height = heights.current_height();
        let count = self.store.try_update(number, |account| {
            if !account.roster_full() {
                return Err(EscrowError::NotAllParticipantsAdded);
            }
            if !account.is_participant(sender) {
                return Err(EscrowError::NotParticipant);
            }
            if account.has_signed(sender) {
                return Err(EscrowError::SignatureAlreadyPresent);
            }
            account.push_signature(sender, height);
            Ok(account.signatures.len())
        })?;
        tracing::debug!(account = %number, signer = %sender, signatures = count, "signature recorded");
        Ok(())
    }

    /// Debit `amount` from `number` to the receiver. Returns the new
    /// balance. Collected signatures stay valid for further withdrawals.
    pub fn withdraw(
        &self,
        sender: &Principal,
        number: AccountNumber,
        amount: Amount,
        heights: &impl HeightSource,
    ) -> Result<Amount, EscrowError> {
        let height = heights.current_height();
        let balance = self.store.try_update(number, |account| {
            if !account.has_quorum() {
                return Err(EscrowError::NotEnoughSignatures);
            }
            if !account.is_receiver(sender) {
                return Err(EscrowError::NotReceiver);
            }
            account.debit(sender, amount, height)
        })?;
        tracing::debug!(account = %number, amount = %amount, balance = %balance, "withdrawal debited");
        Ok(balance)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
