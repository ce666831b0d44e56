//! # Ledger Submission Layer
//!
//! The [`Ledger`] is the boundary legacy callers talk to. It accepts
//! contract calls as a method name plus Clarity literal arguments, mines
//! one block per transaction, runs the call through the
//! [`EscrowEngine`] at the new height, and hands back a [`Receipt`].
//!
//! ## Block Production
//!
//! `deploy` mines the deployment block, so a fresh ledger sits at tip 1.
//! Every submitted transaction mines exactly one block whether it commits
//! or aborts, and executes at that block's height. Repeated aborted calls
//! therefore still advance the chain into later epochs.
//!
//! Queries never mine.
//!
//! ## Malformed Calls
//!
//! Unknown methods, wrong arity, and unparseable literals are rejected with
//! a [`LedgerError`] before a block is mined. They never reach the engine
//! and never produce a contract error code.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mofn_core::clarity::{parse_principal, parse_uint};
use mofn_core::{
    AccountNumber, Amount, BlockHeight, EpochSchedule, EscrowError, FixedHeight, MofnError,
    Principal, Value,
};

use crate::engine::EscrowEngine;
use crate::query::{Query, QueryFacade};
use crate::store::{AccountStore, StoreError, StoreSnapshot};

// ─── Errors ──────────────────────────────────────────────────────────

/// A call that could not be turned into a transaction or query.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// No public or read-only function has this name.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// Wrong number of arguments.
    #[error("{method} expects {expected} argument(s), got {got}")]
    Arity {
        method: &'static str,
        expected: usize,
        got: usize,
    },

    /// An argument literal failed to parse.
    #[error("{method} argument {index}: {source}")]
    InvalidArgument {
        method: &'static str,
        index: usize,
        #[source]
        source: MofnError,
    },

    /// An integer argument is valid Clarity but too large for its role.
    #[error("{method} argument {index}: u{value} is out of range")]
    ArgumentOutOfRange {
        method: &'static str,
        index: usize,
        value: u128,
    },
}

// ─── Methods ─────────────────────────────────────────────────────────

/// Public (state-changing) contract functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    Create,
    AddParticipant,
    SetReceiver,
    Deposit,
    AddSignature,
    Withdraw,
}

impl Method {
    /// All methods in interface order.
    pub const ALL: [Method; 6] = [
        Self::Create,
        Self::AddParticipant,
        Self::SetReceiver,
        Self::Deposit,
        Self::AddSignature,
        Self::Withdraw,
    ];

    /// Contract function name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::AddParticipant => "add-participant",
            Self::SetReceiver => "set-receiver",
            Self::Deposit => "deposit",
            Self::AddSignature => "add-signature",
            Self::Withdraw => "withdraw",
        }
    }

    /// Number of arguments the function takes.
    pub fn arity(&self) -> usize {
        match self {
            Self::AddSignature => 1,
            _ => 2,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| LedgerError::UnknownMethod(s.to_string()))
    }
}

/// Read-only contract functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryMethod {
    GetM,
    GetN,
    GetParticipants,
    GetSignatures,
    GetReceiver,
    GetBalance,
    GetOpenAccounts,
    GetBlockHeight,
}

impl QueryMethod {
    /// All read-only functions in interface order.
    pub const ALL: [QueryMethod; 8] = [
        Self::GetM,
        Self::GetN,
        Self::GetParticipants,
        Self::GetSignatures,
        Self::GetReceiver,
        Self::GetBalance,
        Self::GetOpenAccounts,
        Self::GetBlockHeight,
    ];

    /// Contract function name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetM => "get-m",
            Self::GetN => "get-n",
            Self::GetParticipants => "get-participants",
            Self::GetSignatures => "get-signatures",
            Self::GetReceiver => "get-receiver",
            Self::GetBalance => "get-balance",
            Self::GetOpenAccounts => "get-open-accounts",
            Self::GetBlockHeight => "get-block-height",
        }
    }

    /// Number of arguments the function takes.
    pub fn arity(&self) -> usize {
        match self {
            Self::GetOpenAccounts => 0,
            _ => 1,
        }
    }

    /// Bind arguments, producing a typed [`Query`].
    pub fn bind<S: AsRef<str>>(self, args: &[S]) -> Result<Query, LedgerError> {
        let args = Args::new(self.as_str(), self.arity(), args)?;
        Ok(match self {
            Self::GetM => Query::M(args.account(0)?),
            Self::GetN => Query::N(args.account(0)?),
            Self::GetParticipants => Query::Participants(args.account(0)?),
            Self::GetSignatures => Query::Signatures(args.account(0)?),
            Self::GetReceiver => Query::Receiver(args.account(0)?),
            Self::GetBalance => Query::Balance(args.account(0)?),
            Self::GetOpenAccounts => Query::OpenAccounts,
            Self::GetBlockHeight => Query::BlockHeight(args.account(0)?),
        })
    }
}

impl std::fmt::Display for QueryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QueryMethod {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| LedgerError::UnknownMethod(s.to_string()))
    }
}

// ─── Calls ───────────────────────────────────────────────────────────

/// A fully parsed state-changing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Call {
    Create { m: u64, n: u64 },
    AddParticipant { account: AccountNumber, participant: Principal },
    SetReceiver { account: AccountNumber, receiver: Principal },
    Deposit { account: AccountNumber, amount: Amount },
    AddSignature { account: AccountNumber },
    Withdraw { account: AccountNumber, amount: Amount },
}

impl Call {
    /// Parse Clarity literal arguments for `method`.
    pub fn parse<S: AsRef<str>>(method: Method, args: &[S]) -> Result<Self, LedgerError> {
        let args = Args::new(method.as_str(), method.arity(), args)?;
        Ok(match method {
            Method::Create => Self::Create {
                m: args.u64(0)?,
                n: args.u64(1)?,
            },
            Method::AddParticipant => Self::AddParticipant {
                account: args.account(0)?,
                participant: args.principal(1)?,
            },
            Method::SetReceiver => Self::SetReceiver {
                account: args.account(0)?,
                receiver: args.principal(1)?,
            },
            Method::Deposit => Self::Deposit {
                account: args.account(0)?,
                amount: args.uint(1)?,
            },
            Method::AddSignature => Self::AddSignature {
                account: args.account(0)?,
            },
            Method::Withdraw => Self::Withdraw {
                account: args.account(0)?,
                amount: args.uint(1)?,
            },
        })
    }

    /// The contract function this call invokes.
    pub fn method(&self) -> Method {
        match self {
            Self::Create { .. } => Method::Create,
            Self::AddParticipant { .. } => Method::AddParticipant,
            Self::SetReceiver { .. } => Method::SetReceiver,
            Self::Deposit { .. } => Method::Deposit,
            Self::AddSignature { .. } => Method::AddSignature,
            Self::Withdraw { .. } => Method::Withdraw,
        }
    }
}

/// Positional argument reader.
struct Args<'a, S> {
    method: &'static str,
    values: &'a [S],
}

impl<'a, S: AsRef<str>> Args<'a, S> {
    fn new(method: &'static str, expected: usize, values: &'a [S]) -> Result<Self, LedgerError> {
        if values.len() != expected {
            return Err(LedgerError::Arity {
                method,
                expected,
                got: values.len(),
            });
        }
        Ok(Self { method, values })
    }

    fn invalid(&self, index: usize, source: MofnError) -> LedgerError {
        LedgerError::InvalidArgument {
            method: self.method,
            index,
            source,
        }
    }

    fn uint(&self, index: usize) -> Result<u128, LedgerError> {
        parse_uint(self.values[index].as_ref()).map_err(|e| self.invalid(index, e))
    }

    fn u64(&self, index: usize) -> Result<u64, LedgerError> {
        let value = self.uint(index)?;
        u64::try_from(value).map_err(|_| LedgerError::ArgumentOutOfRange {
            method: self.method,
            index,
            value,
        })
    }

    fn account(&self, index: usize) -> Result<AccountNumber, LedgerError> {
        self.u64(index).map(AccountNumber)
    }

    fn principal(&self, index: usize) -> Result<Principal, LedgerError> {
        parse_principal(self.values[index].as_ref()).map_err(|e| self.invalid(index, e))
    }
}

// ─── Receipts ────────────────────────────────────────────────────────

/// Result of one mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Height of the block the transaction was mined in.
    pub height: BlockHeight,
    /// Function invoked.
    pub method: Method,
    /// Signer of the transaction.
    pub sender: Principal,
    /// Returned value, or the contract error that aborted it.
    pub outcome: Result<Value, EscrowError>,
}

impl Receipt {
    /// Whether the transaction committed.
    pub fn is_committed(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The abort reason, if any.
    pub fn error(&self) -> Option<EscrowError> {
        self.outcome.as_ref().err().copied()
    }

    /// Receipt text as a node reports it.
    pub fn output(&self) -> String {
        match &self.outcome {
            Ok(value) => format!("Transaction executed and committed. Returned: {value}\n"),
            Err(e) => format!("Aborted: {}", e.code()),
        }
    }

    /// The returned value on commit, or the bare error code on abort.
    pub fn legacy_text(&self) -> String {
        match &self.outcome {
            Ok(value) => value.to_string(),
            Err(e) => e.code().to_string(),
        }
    }
}

impl std::fmt::Display for Receipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.output().trim_end())
    }
}

// ─── Ledger ──────────────────────────────────────────────────────────

/// Serializable image of a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub blocks_per_epoch: EpochSchedule,
    pub tip: BlockHeight,
    pub store: StoreSnapshot,
}

/// Single-writer escrow chain.
#[derive(Debug)]
pub struct Ledger {
    engine: EscrowEngine,
    queries: QueryFacade,
    tip: Mutex<BlockHeight>,
}

impl Ledger {
    /// Deploy the contract on a fresh chain. The deployment mines block 1.
    pub fn deploy(schedule: EpochSchedule) -> Self {
        tracing::info!(blocks_per_epoch = schedule.blocks_per_epoch(), "contract deployed");
        Self::from_parts(AccountStore::new(), schedule, BlockHeight::GENESIS.next())
    }

    /// Assemble a ledger over an existing store at the given tip.
    pub fn from_parts(store: AccountStore, schedule: EpochSchedule, tip: BlockHeight) -> Self {
        Self {
            engine: EscrowEngine::new(store.clone(), schedule),
            queries: QueryFacade::new(store),
            tip: Mutex::new(tip),
        }
    }

    /// Rebuild a ledger from a snapshot.
    pub fn restore(snapshot: LedgerSnapshot) -> Result<Self, StoreError> {
        let store = AccountStore::restore(snapshot.store)?;
        Ok(Self::from_parts(store, snapshot.blocks_per_epoch, snapshot.tip))
    }

    /// Height of the most recently mined block.
    pub fn tip(&self) -> BlockHeight {
        *self.tip.lock()
    }

    pub fn schedule(&self) -> EpochSchedule {
        self.engine.schedule()
    }

    pub fn store(&self) -> &AccountStore {
        self.engine.store()
    }

    /// Typed read access.
    pub fn queries(&self) -> &QueryFacade {
        &self.queries
    }

    /// Parse and submit a call given as a method name and literal arguments.
    pub fn submit<S: AsRef<str>>(
        &self,
        method: &str,
        args: &[S],
        sender: &Principal,
    ) -> Result<Receipt, LedgerError> {
        let method: Method = method.parse()?;
        let call = Call::parse(method, args)?;
        Ok(self.submit_call(call, sender))
    }

    /// Mine one block carrying `call`.
    pub fn submit_call(&self, call: Call, sender: &Principal) -> Receipt {
        let mut tip = self.tip.lock();
        let height = tip.next();
        *tip = height;
        let heights = FixedHeight(height);
        let method = call.method();

        let engine = &self.engine;
        let outcome = match call {
            Call::Create { m, n } => engine
                .create(sender, m, n, &heights)
                .map(|number| Value::UInt(u128::from(number.get()))),
            Call::AddParticipant {
                account,
                participant,
            } => engine
                .add_participant(sender, account, participant, &heights)
                .map(|()| Value::Bool(true)),
            Call::SetReceiver { account, receiver } => engine
                .set_receiver(sender, account, receiver, &heights)
                .map(|()| Value::Bool(true)),
            Call::Deposit { account, amount } => engine
                .deposit(sender, account, amount, &heights)
                .map(|_| Value::Bool(true)),
            Call::AddSignature { account } => engine
                .add_signature(sender, account, &heights)
                .map(|()| Value::Bool(true)),
            Call::Withdraw { account, amount } => engine
                .withdraw(sender, account, amount, &heights)
                .map(|_| Value::Bool(true)),
        };

        match &outcome {
            Ok(value) => {
                tracing::info!(%height, %method, %sender, returned = %value, "transaction committed")
            }
            Err(e) => {
                tracing::info!(%height, %method, %sender, code = e.code(), error = %e, "transaction aborted")
            }
        }

        Receipt {
            height,
            method,
            sender: sender.clone(),
            outcome,
        }
    }

    /// Parse and evaluate a read-only call.
    pub fn query<S: AsRef<str>>(&self, method: &str, args: &[S]) -> Result<Value, LedgerError> {
        let method: QueryMethod = method.parse()?;
        Ok(self.evaluate(method.bind(args)?))
    }

    /// Evaluate a typed read-only call.
    pub fn evaluate(&self, query: Query) -> Value {
        self.queries.evaluate(query)
    }

    /// Capture tip and accounts consistently.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let tip = self.tip.lock();
        LedgerSnapshot {
            blocks_per_epoch: self.schedule(),
            tip: *tip,
            store: self.store().snapshot(),
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::deploy(EpochSchedule::default())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
