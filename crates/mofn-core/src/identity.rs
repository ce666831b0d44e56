//! # Domain Identity Newtypes
//!
//! [`Principal`] identifies an actor (owner, participant, receiver,
//! depositor). [`AccountNumber`] identifies an escrow account. Keeping them
//! as distinct types means an account number can never be handed to an
//! API that expects a height or an amount.

use serde::{Deserialize, Serialize};

use crate::error::MofnError;

/// Token amounts. Matches the 128-bit unsigned integers of the legacy
/// contract interface.
pub type Amount = u128;

/// Crockford-style base-32 alphabet used by standard principals.
const C32_ALPHABET: &str = "0123456789ABCDEFGHJKMNPQRSTVWXYZ";

const MIN_PRINCIPAL_LEN: usize = 28;
const MAX_PRINCIPAL_LEN: usize = 41;

/// A standard principal (account address), e.g.
/// `ST37X0038BZV6YV0MQCJ0G6QMZZ75QS64KA69V9D`.
///
/// Validated on construction: leading `S`, followed by 27–40 characters of
/// the c32 alphabet (no `I`, `L`, `O`, `U`, no lowercase).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Validate and wrap a principal string.
    pub fn new(s: impl Into<String>) -> Result<Self, MofnError> {
        let s = s.into();
        let reject = |reason: &str| MofnError::InvalidPrincipal {
            value: s.clone(),
            reason: reason.to_string(),
        };

        if !(MIN_PRINCIPAL_LEN..=MAX_PRINCIPAL_LEN).contains(&s.len()) {
            return Err(reject("length must be between 28 and 41 characters"));
        }
        if !s.starts_with('S') {
            return Err(reject("must start with 'S'"));
        }
        if let Some(bad) = s.chars().skip(1).find(|c| !C32_ALPHABET.contains(*c)) {
            return Err(reject(&format!("character {bad:?} is not in the c32 alphabet")));
        }
        Ok(Self(s))
    }

    /// The principal as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Principal {
    type Error = MofnError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Principal> for String {
    fn from(p: Principal) -> Self {
        p.0
    }
}

impl std::str::FromStr for Principal {
    type Err = MofnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sequential, 1-based escrow account number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountNumber(pub u64);

impl AccountNumber {
    /// The first number ever issued.
    pub const FIRST: AccountNumber = AccountNumber(1);

    /// The raw number.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// The number issued after this one, or `None` once the space is
    /// exhausted.
    pub fn next(&self) -> Option<AccountNumber> {
        self.0.checked_add(1).map(AccountNumber)
    }
}

impl std::fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "u{}", self.0)
    }
}
