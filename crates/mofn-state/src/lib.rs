//! # mofn-state: Escrow Account State and Ledger
//!
//! Everything that holds or changes escrow state lives here:
//!
//! - **Account** ([`account`]): the [`EscrowAccount`] aggregate with its
//!   roster, receiver, signatures, balance, and action history.
//! - **Store** ([`store`]): arena of accounts indexed by sequential number,
//!   with atomic read-validate-update.
//! - **Engine** ([`engine`]): the escrow rules, with preconditions checked
//!   in a fixed order so every rejection reports a deterministic code.
//! - **Queries** ([`query`]): read-only getters and their Clarity responses.
//! - **Ledger** ([`ledger`]): block-per-transaction submission boundary
//!   that parses Clarity literal arguments and produces receipts.
//! - **Persistence** ([`persist`]): JSON ledger files.
//!
//! ## Design
//!
//! The engine is stateless; all state sits in an [`AccountStore`] shared
//! by handle. The ledger owns the chain tip and serialises submissions, so
//! heights are strictly increasing across transactions while queries only
//! ever take the store's read lock.

pub mod account;
pub mod engine;
pub mod ledger;
pub mod persist;
pub mod query;
pub mod store;

pub use account::{AccountAction, AccountEvent, AccountPhase, EscrowAccount, HISTORY_LIMIT};
pub use engine::EscrowEngine;
pub use ledger::{Call, Ledger, LedgerError, LedgerSnapshot, Method, QueryMethod, Receipt};
pub use persist::{LedgerFile, LedgerLock, PersistError};
pub use query::{Query, QueryFacade};
pub use store::{AccountStore, StoreError, StoreSnapshot};
