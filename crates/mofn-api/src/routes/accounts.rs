//! # Account Inspection
//!
//! - `GET /v1/accounts`: every account in number order, without history.
//! - `GET /v1/accounts/:number?history=N`: one account with its `N` most
//!   recent events (default 50); `number` may be `7` or `u7`.
//!
//! Balances are rendered as decimal strings because they are 128-bit.
//! `history_len` counts every event ever applied, including ones the
//! ledger no longer retains.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use mofn_core::clarity::parse_uint;
use mofn_core::AccountNumber;
use mofn_state::{AccountEvent, AccountPhase, EscrowAccount, HISTORY_LIMIT};

use crate::error::AppError;
use crate::state::AppState;

/// Structured view of an escrow account.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountView {
    pub number: u64,
    pub owner: String,
    pub m: u64,
    pub n: u64,
    pub phase: AccountPhase,
    pub participants: Vec<String>,
    pub receiver: Option<String>,
    pub receiver_set_at: Option<u64>,
    pub receiver_epoch: Option<u64>,
    pub signatures: Vec<String>,
    pub balance: String,
    pub history_len: u64,
    /// Most recent events, oldest first. Omitted from listings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<AccountEvent>,
}

/// Events returned by the detail view when `history` is not given.
pub const DEFAULT_HISTORY: usize = 50;

/// Query parameters for the detail view.
#[derive(Debug, Deserialize)]
pub struct AccountParams {
    /// Number of recent events to include, capped at the retained history.
    pub history: Option<usize>,
}

impl AccountView {
    /// Render `a` with at most `history` of its most recent events.
    pub fn render(a: &EscrowAccount, history: usize) -> Self {
        let skip = a.history.len().saturating_sub(history);
        Self {
            number: a.number.get(),
            owner: a.owner.to_string(),
            m: a.m,
            n: a.n,
            phase: a.phase(),
            participants: a.participants.iter().map(ToString::to_string).collect(),
            receiver: a.receiver.as_ref().map(ToString::to_string),
            receiver_set_at: a.receiver_set_at.map(|h| h.get()),
            receiver_epoch: a.receiver_epoch.map(|e| e.0),
            signatures: a.signatures.iter().map(ToString::to_string).collect(),
            balance: a.balance.to_string(),
            history_len: a.history_len(),
            history: a.history[skip..].to_vec(),
        }
    }
}

/// Build the accounts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/accounts", get(list_accounts))
        .route("/v1/accounts/:number", get(get_account))
}

/// GET /v1/accounts
async fn list_accounts(State(state): State<AppState>) -> Json<Vec<AccountView>> {
    Json(state.ledger.store().map_all(|a| AccountView::render(a, 0)))
}

/// GET /v1/accounts/:number
async fn get_account(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(params): Query<AccountParams>,
) -> Result<Json<AccountView>, AppError> {
    let number = u64::try_from(parse_uint(&segment)?)
        .map(AccountNumber)
        .map_err(|_| AppError::NotFound(format!("account {segment} not found")))?;
    let history = params
        .history
        .unwrap_or(DEFAULT_HISTORY)
        .min(HISTORY_LIMIT);
    let view = state
        .ledger
        .store()
        .with(number, |a| AccountView::render(a, history))?;
    Ok(Json(view))
}
