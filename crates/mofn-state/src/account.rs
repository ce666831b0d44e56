//! # Escrow Account Aggregate
//!
//! An [`EscrowAccount`] holds everything one M-of-N escrow needs: the
//! owner, the thresholds, the participant roster, the current receiver and
//! the epoch it was set in, the signatures collected for that epoch, and
//! the balance.
//!
//! ## Phases
//!
//! ```text
//! Open ──(roster full, receiver set)──▶ Collecting ──(signatures ≥ m)──▶ Withdrawable
//!   ▲                                        ▲                               │
//!   │                                        └──── new epoch receiver ───────┘
//!   └─ participants < n
//! ```
//!
//! The phase is derived from the fields, never stored. There is no
//! terminal phase: a drained account keeps accepting deposits.
//!
//! The methods here are the mutation primitives. Precondition ordering
//! (which rejection wins when several apply) belongs to
//! [`EscrowEngine`](crate::engine::EscrowEngine).

use serde::{Deserialize, Serialize};

use mofn_core::{AccountNumber, Amount, BlockHeight, Epoch, EscrowError, Principal};

// ─── Phase ───────────────────────────────────────────────────────────

/// Derived lifecycle phase of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountPhase {
    /// Roster is not yet full, or no receiver has been set.
    Open,
    /// Roster full and receiver set; fewer than `m` signatures.
    Collecting,
    /// At least `m` signatures collected; the receiver may withdraw.
    Withdrawable,
}

impl AccountPhase {
    /// The string representation of this phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Collecting => "COLLECTING",
            Self::Withdrawable => "WITHDRAWABLE",
        }
    }
}

impl std::fmt::Display for AccountPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── History ─────────────────────────────────────────────────────────

/// A state change applied to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountAction {
    /// Account opened with thresholds `m`-of-`n`.
    Created { m: u64, n: u64 },
    /// A participant joined the roster.
    ParticipantAdded { participant: Principal },
    /// A receiver was assigned for `epoch`.
    ReceiverSet { receiver: Principal, epoch: Epoch },
    /// Funds were credited.
    Deposited { amount: Amount },
    /// The sender signed for the current epoch.
    Signed,
    /// Funds were debited by the receiver.
    Withdrawn { amount: Amount },
}

/// Record of one applied action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEvent {
    /// Height of the block the action executed in.
    pub height: BlockHeight,
    /// Who sent the transaction.
    pub sender: Principal,
    /// What changed.
    pub action: AccountAction,
}

// ─── Account ─────────────────────────────────────────────────────────

/// Most recent events kept per account. Older ones are dropped and counted
/// in [`EscrowAccount::history_pruned`].
pub const HISTORY_LIMIT: usize = 256;

/// One M-of-N escrow account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowAccount {
    /// Sequential account number.
    pub number: AccountNumber,
    /// Creator; the only principal allowed to manage the roster and receiver.
    pub owner: Principal,
    /// Signatures required to withdraw.
    pub m: u64,
    /// Maximum number of participants.
    pub n: u64,
    /// Participant roster in insertion order. Unique, at most `n` entries.
    pub participants: Vec<Principal>,
    /// Current receiver, if any.
    pub receiver: Option<Principal>,
    /// Height at which the receiver was last set.
    pub receiver_set_at: Option<BlockHeight>,
    /// Epoch in which the receiver was last set.
    pub receiver_epoch: Option<Epoch>,
    /// Signatures collected since the receiver was last set, in signing order.
    pub signatures: Vec<Principal>,
    /// Deposits minus withdrawals.
    pub balance: Amount,
    /// The most recent applied actions, oldest first, at most
    /// [`HISTORY_LIMIT`] of them.
    #[serde(default)]
    pub history: Vec<AccountEvent>,
    /// Events dropped from the front of `history`.
    #[serde(default)]
    pub history_pruned: u64,
}

impl EscrowAccount {
    /// Open a fresh account. Thresholds are validated by the caller.
    pub fn new(
        number: AccountNumber,
        owner: Principal,
        m: u64,
        n: u64,
        height: BlockHeight,
    ) -> Self {
        let mut account = Self {
            number,
            owner: owner.clone(),
            m,
            n,
            participants: Vec::new(),
            receiver: None,
            receiver_set_at: None,
            receiver_epoch: None,
            signatures: Vec::new(),
            balance: 0,
            history: Vec::new(),
            history_pruned: 0,
        };
        account.record(height, &owner, AccountAction::Created { m, n });
        account
    }

    /// Whether `m` and `n` satisfy `1 <= m <= n`.
    pub fn valid_thresholds(m: u64, n: u64) -> bool {
        m >= 1 && m <= n
    }

    // ── Predicates ───────────────────────────────────────────────────

    /// Whether `who` owns this account.
    pub fn is_owner(&self, who: &Principal) -> bool {
        &self.owner == who
    }

    /// Whether `who` is on the roster.
    pub fn is_participant(&self, who: &Principal) -> bool {
        self.participants.contains(who)
    }

    /// Whether `who` has signed since the receiver was last set.
    pub fn has_signed(&self, who: &Principal) -> bool {
        self.signatures.contains(who)
    }

    /// Whether the roster holds `n` participants.
    pub fn roster_full(&self) -> bool {
        self.participants.len() as u64 >= self.n
    }

    /// Whether at least `m` signatures have been collected.
    pub fn has_quorum(&self) -> bool {
        self.signatures.len() as u64 >= self.m
    }

    /// Whether `who` is the current receiver.
    pub fn is_receiver(&self, who: &Principal) -> bool {
        self.receiver.as_ref() == Some(who)
    }

    /// Whether the receiver was set during `epoch`.
    pub fn receiver_set_in(&self, epoch: Epoch) -> bool {
        self.receiver.is_some() && self.receiver_epoch == Some(epoch)
    }

    /// The derived lifecycle phase.
    pub fn phase(&self) -> AccountPhase {
        if !self.roster_full() || self.receiver.is_none() {
            AccountPhase::Open
        } else if self.has_quorum() {
            AccountPhase::Withdrawable
        } else {
            AccountPhase::Collecting
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Append a participant to the roster.
    pub fn push_participant(&mut self, sender: &Principal, participant: Principal, height: BlockHeight) {
        self.participants.push(participant.clone());
        self.record(height, sender, AccountAction::ParticipantAdded { participant });
    }

    /// Assign the receiver for `epoch`, discarding signatures from earlier epochs.
    pub fn assign_receiver(
        &mut self,
        sender: &Principal,
        receiver: Principal,
        height: BlockHeight,
        epoch: Epoch,
    ) {
        self.receiver = Some(receiver.clone());
        self.receiver_set_at = Some(height);
        self.receiver_epoch = Some(epoch);
        self.signatures.clear();
        self.record(height, sender, AccountAction::ReceiverSet { receiver, epoch });
    }

    /// Record `signer`'s signature.
    pub fn push_signature(&mut self, signer: &Principal, height: BlockHeight) {
        self.signatures.push(signer.clone());
        self.record(height, signer, AccountAction::Signed);
    }

    /// Credit `amount`. Fails without mutating on overflow.
    pub fn credit(
        &mut self,
        sender: &Principal,
        amount: Amount,
        height: BlockHeight,
    ) -> Result<Amount, EscrowError> {
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(EscrowError::BalanceOverflow)?;
        self.balance = balance;
        self.record(height, sender, AccountAction::Deposited { amount });
        Ok(balance)
    }

    /// Debit `amount`. Fails without mutating when the balance is short.
    pub fn debit(
        &mut self,
        sender: &Principal,
        amount: Amount,
        height: BlockHeight,
    ) -> Result<Amount, EscrowError> {
        let balance = self
            .balance
            .checked_sub(amount)
            .ok_or(EscrowError::NotEnoughBalance)?;
        self.balance = balance;
        self.record(height, sender, AccountAction::Withdrawn { amount });
        Ok(balance)
    }

    /// Check the structural invariants. Returns the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        if !Self::valid_thresholds(self.m, self.n) {
            return Err(format!("thresholds {}-of-{} out of range", self.m, self.n));
        }
        if self.participants.len() as u64 > self.n {
            return Err(format!(
                "{} participants exceed cap {}",
                self.participants.len(),
                self.n
            ));
        }
        for (i, p) in self.participants.iter().enumerate() {
            if self.participants[..i].contains(p) {
                return Err(format!("duplicate participant {p}"));
            }
        }
        for (i, s) in self.signatures.iter().enumerate() {
            if !self.is_participant(s) {
                return Err(format!("signature from non-participant {s}"));
            }
            if self.signatures[..i].contains(s) {
                return Err(format!("duplicate signature {s}"));
            }
        }
        if self.receiver.is_some() != self.receiver_epoch.is_some()
            || self.receiver.is_some() != self.receiver_set_at.is_some()
        {
            return Err("receiver, receiver height and receiver epoch out of sync".into());
        }
        Ok(())
    }

    /// Actions applied since creation, including pruned ones.
    pub fn history_len(&self) -> u64 {
        self.history_pruned + self.history.len() as u64
    }

    /// Append `events` after the retained history, pruning to the limit.
    pub(crate) fn append_history(&mut self, events: Vec<AccountEvent>) {
        self.history.extend(events);
        self.trim_history();
    }

    /// Drop the oldest events beyond [`HISTORY_LIMIT`].
    pub(crate) fn trim_history(&mut self) {
        let excess = self.history.len().saturating_sub(HISTORY_LIMIT);
        if excess > 0 {
            self.history.drain(..excess);
            self.history_pruned += excess as u64;
        }
    }

    fn record(&mut self, height: BlockHeight, sender: &Principal, action: AccountAction) {
        self.history.push(AccountEvent {
            height,
            sender: sender.clone(),
            action,
        });
        self.trim_history();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
