//! # mofn-core: Foundational Types for the M-of-N Escrow Ledger
//!
//! This crate is the leaf of the workspace dependency graph. It defines the
//! type-system primitives every other crate builds on: who can act
//! ([`Principal`]), what they act on ([`AccountNumber`]), when it happens
//! ([`BlockHeight`], [`Epoch`]), and how failures are reported
//! ([`EscrowError`] with its stable numeric codes).
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** Principals are validated
//!    on construction; account numbers and heights are distinct types, so
//!    a height can never be passed where an account number is expected.
//!
//! 2. **One error enum for contract outcomes.** Every rejected escrow
//!    operation maps to exactly one [`EscrowError`] variant, and every
//!    variant maps to exactly one legacy numeric code. Infrastructure
//!    failures live in [`MofnError`] and never carry a contract code.
//!
//! 3. **Text shape only at the boundary.** The Clarity-style rendering
//!    (`(ok u2)`, `(err 4)`, `true`) lives in [`clarity`]; domain code works
//!    with sum types.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `mofn-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod clarity;
pub mod error;
pub mod height;
pub mod identity;

// Re-export primary types for ergonomic imports.
pub use clarity::Value;
pub use error::{EscrowError, MofnError};
pub use height::{BlockHeight, Epoch, EpochSchedule, FixedHeight, HeightSource};
pub use identity::{AccountNumber, Amount, Principal};
