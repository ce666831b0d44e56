//! # Transaction Submission
//!
//! - `POST /v1/transactions`: submit a state-changing contract call.
//!
//! Every accepted request mines one block. A call the contract rejects is
//! still mined and answered with 200 and `committed: false`; only calls
//! that cannot be parsed (unknown method, wrong arity, bad literal, bad
//! sender) are refused with 422 before mining.
//!
//! The receipt's `persisted` flag reports whether the block was written
//! to the ledger file.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use mofn_core::Principal;
use mofn_state::Receipt;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// A contract call with Clarity literal arguments.
#[derive(Debug, Deserialize)]
pub struct SubmitTransactionRequest {
    /// Public function name, e.g. `"add-participant"`.
    pub method: String,
    /// Arguments as Clarity literals, e.g. `["u1", "ST1…"]`.
    #[serde(default)]
    pub args: Vec<String>,
    /// Principal that signs the transaction.
    pub sender: String,
}

impl Validate for SubmitTransactionRequest {
    fn validate(&self) -> Result<(), String> {
        if self.method.trim().is_empty() {
            return Err("method must not be empty".to_string());
        }
        if self.sender.trim().is_empty() {
            return Err("sender must not be empty".to_string());
        }
        Ok(())
    }
}

/// Contract error that aborted a transaction.
#[derive(Debug, Serialize, Deserialize)]
pub struct ContractError {
    /// Legacy numeric code.
    pub code: u32,
    /// Machine-readable name, e.g. `"NOT_OWNER"`.
    pub name: String,
    pub message: String,
}

/// Receipt for a mined transaction.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReceiptResponse {
    pub height: u64,
    pub method: String,
    pub sender: String,
    pub committed: bool,
    /// Clarity rendering of the returned value, present when committed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Abort reason, present when not committed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ContractError>,
    /// Receipt text as a node reports it.
    pub output: String,
    /// Whether the block reached the ledger file. Always `false` for an
    /// in-memory ledger; `false` with a file configured means the save
    /// failed and the block survives only until restart.
    #[serde(default)]
    pub persisted: bool,
}

impl From<&Receipt> for ReceiptResponse {
    fn from(receipt: &Receipt) -> Self {
        let (result, error) = match &receipt.outcome {
            Ok(value) => (Some(value.to_string()), None),
            Err(e) => (
                None,
                Some(ContractError {
                    code: e.code(),
                    name: e.as_str().to_string(),
                    message: e.to_string(),
                }),
            ),
        };
        Self {
            height: receipt.height.get(),
            method: receipt.method.to_string(),
            sender: receipt.sender.to_string(),
            committed: receipt.is_committed(),
            result,
            error,
            output: receipt.output(),
            persisted: false,
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the transactions router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/transactions", post(submit_transaction))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/transactions: Mine a block carrying one contract call.
async fn submit_transaction(
    State(state): State<AppState>,
    body: Result<Json<SubmitTransactionRequest>, JsonRejection>,
) -> Result<Json<ReceiptResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let sender = Principal::new(req.sender.trim())?;
    let receipt = state.ledger.submit(&req.method, req.args.as_slice(), &sender)?;

    // The block is already mined; a failed save is reported, not raised.
    let saver = state.clone();
    let persisted = match tokio::task::spawn_blocking(move || saver.save()).await {
        Ok(Ok(written)) => written,
        Ok(Err(e)) => {
            tracing::error!(error = %e, height = %receipt.height, "failed to save ledger file");
            false
        }
        Err(e) => {
            tracing::error!(error = %e, height = %receipt.height, "ledger save task failed");
            false
        }
    };

    let mut response = ReceiptResponse::from(&receipt);
    response.persisted = persisted;
    Ok(Json(response))
}
