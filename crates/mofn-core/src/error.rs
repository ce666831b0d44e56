//! # Error Types: Structured Error Hierarchy
//!
//! Two families of errors:
//!
//! - [`EscrowError`]: expected, caller-visible rejections of an escrow
//!   operation. Each variant carries a stable numeric code that callers of
//!   the legacy contract interface assert against.
//! - [`MofnError`]: malformed input (bad principal text, bad `u`-literal,
//!   zero epoch width). These never surface as contract codes.

use thiserror::Error;

/// Rejection of an escrow operation.
///
/// The numeric [`code`](EscrowError::code) is part of the external
/// contract; never renumber a variant.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EscrowError {
    /// The sender is not the owner of the account.
    #[error("sender is not the account owner")]
    NotOwner,

    /// The participant roster already holds `n` addresses.
    #[error("participant cap exceeded")]
    ParticipantCapExceeded,

    /// The participant is already on the roster.
    #[error("participant already present")]
    ParticipantAlreadyPresent,

    /// No account was ever issued under this number.
    #[error("account not found")]
    AccountNotFound,

    /// The receiver was already set during the current epoch.
    #[error("receiver already set in this epoch")]
    ReceiverAlreadySet,

    /// No receiver has been set for the account.
    #[error("receiver not set")]
    ReceiverNotSet,

    /// Signatures are only collected once the roster is full.
    #[error("not all participants added")]
    NotAllParticipantsAdded,

    /// The signer is not on the participant roster.
    #[error("sender is not a participant")]
    NotParticipant,

    /// The participant has already signed in this epoch.
    #[error("signature already present")]
    SignatureAlreadyPresent,

    /// `m` must satisfy `1 <= m <= n`.
    #[error("invalid threshold: m must satisfy 1 <= m <= n")]
    InvalidThreshold,

    /// Fewer than `m` signatures have been collected.
    #[error("not enough signatures")]
    NotEnoughSignatures,

    /// Only the receiver may withdraw.
    #[error("sender is not the receiver")]
    NotReceiver,

    /// The requested amount exceeds the balance.
    #[error("not enough balance")]
    NotEnoughBalance,

    /// A deposit would overflow the balance.
    #[error("balance overflow")]
    BalanceOverflow,

    /// Every account number has been issued.
    #[error("account numbers exhausted")]
    AccountLimitReached,
}

impl EscrowError {
    /// All variants, in code order.
    pub const ALL: [EscrowError; 15] = [
        Self::NotOwner,
        Self::ParticipantCapExceeded,
        Self::ParticipantAlreadyPresent,
        Self::AccountNotFound,
        Self::ReceiverAlreadySet,
        Self::ReceiverNotSet,
        Self::NotAllParticipantsAdded,
        Self::NotParticipant,
        Self::SignatureAlreadyPresent,
        Self::InvalidThreshold,
        Self::NotEnoughSignatures,
        Self::NotReceiver,
        Self::NotEnoughBalance,
        Self::BalanceOverflow,
        Self::AccountLimitReached,
    ];

    /// The numeric code reported to legacy callers.
    pub fn code(&self) -> u32 {
        match self {
            Self::NotOwner => 1,
            Self::ParticipantCapExceeded => 2,
            Self::ParticipantAlreadyPresent => 3,
            Self::AccountNotFound => 4,
            Self::ReceiverAlreadySet => 5,
            Self::ReceiverNotSet => 6,
            Self::NotAllParticipantsAdded => 7,
            Self::NotParticipant => 8,
            Self::SignatureAlreadyPresent => 9,
            Self::InvalidThreshold => 10,
            Self::NotEnoughSignatures => 11,
            Self::NotReceiver => 12,
            Self::NotEnoughBalance => 13,
            Self::BalanceOverflow => 14,
            Self::AccountLimitReached => 15,
        }
    }

    /// Inverse of [`code`](EscrowError::code).
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.code() == code)
    }

    /// Machine-readable name, e.g. `"NOT_OWNER"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotOwner => "NOT_OWNER",
            Self::ParticipantCapExceeded => "PARTICIPANT_CAP_EXCEEDED",
            Self::ParticipantAlreadyPresent => "PARTICIPANT_ALREADY_PRESENT",
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::ReceiverAlreadySet => "RECEIVER_ALREADY_SET",
            Self::ReceiverNotSet => "RECEIVER_NOT_SET",
            Self::NotAllParticipantsAdded => "NOT_ALL_PARTICIPANTS_ADDED",
            Self::NotParticipant => "NOT_PARTICIPANT",
            Self::SignatureAlreadyPresent => "SIGNATURE_ALREADY_PRESENT",
            Self::InvalidThreshold => "INVALID_THRESHOLD",
            Self::NotEnoughSignatures => "NOT_ENOUGH_SIGNATURES",
            Self::NotReceiver => "NOT_RECEIVER",
            Self::NotEnoughBalance => "NOT_ENOUGH_BALANCE",
            Self::BalanceOverflow => "BALANCE_OVERFLOW",
            Self::AccountLimitReached => "ACCOUNT_LIMIT_REACHED",
        }
    }
}

/// Malformed input.
#[derive(Error, Debug)]
pub enum MofnError {
    /// Principal text failed validation.
    #[error("invalid principal {value:?}: {reason}")]
    InvalidPrincipal {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A Clarity literal could not be parsed.
    #[error("invalid literal {value:?}: expected {expected}")]
    InvalidLiteral {
        /// The rejected input.
        value: String,
        /// What the parser expected.
        expected: &'static str,
    },

    /// Epoch width must be at least one block.
    #[error("blocks per epoch must be at least 1")]
    InvalidSchedule,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_legacy_table() {
        assert_eq!(EscrowError::NotOwner.code(), 1);
        assert_eq!(EscrowError::ParticipantCapExceeded.code(), 2);
        assert_eq!(EscrowError::ParticipantAlreadyPresent.code(), 3);
        assert_eq!(EscrowError::AccountNotFound.code(), 4);
        assert_eq!(EscrowError::ReceiverAlreadySet.code(), 5);
        assert_eq!(EscrowError::ReceiverNotSet.code(), 6);
        assert_eq!(EscrowError::NotAllParticipantsAdded.code(), 7);
        assert_eq!(EscrowError::SignatureAlreadyPresent.code(), 9);
        assert_eq!(EscrowError::NotEnoughSignatures.code(), 11);
        assert_eq!(EscrowError::NotReceiver.code(), 12);
        assert_eq!(EscrowError::NotEnoughBalance.code(), 13);
        assert_eq!(EscrowError::BalanceOverflow.code(), 14);
        assert_eq!(EscrowError::AccountLimitReached.code(), 15);
    }

    #[test]
    fn codes_are_unique_and_invertible() {
        let mut seen = std::collections::HashSet::new();
        for err in EscrowError::ALL {
            assert!(seen.insert(err.code()), "duplicate code {}", err.code());
            assert_eq!(EscrowError::from_code(err.code()), Some(err));
        }
        assert_eq!(EscrowError::from_code(0), None);
        assert_eq!(EscrowError::from_code(99), None);
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(
            EscrowError::NotEnoughSignatures.to_string(),
            "not enough signatures"
        );
        assert_eq!(EscrowError::NotOwner.as_str(), "NOT_OWNER");
    }
}
