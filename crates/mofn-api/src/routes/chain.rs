//! # Chain Status
//!
//! - `GET /v1/chain`: tip height, current epoch, epoch width, and the
//!   number of accounts created.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ChainStatus {
    /// Height of the most recently mined block.
    pub tip: u64,
    /// Epoch containing the tip.
    pub epoch: u64,
    pub blocks_per_epoch: u64,
    pub open_accounts: u64,
}

/// Build the chain router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/chain", get(chain_status))
}

/// GET /v1/chain
async fn chain_status(State(state): State<AppState>) -> Json<ChainStatus> {
    let ledger = &state.ledger;
    let tip = ledger.tip();
    let schedule = ledger.schedule();
    Json(ChainStatus {
        tip: tip.get(),
        epoch: schedule.epoch_of(tip).0,
        blocks_per_epoch: schedule.blocks_per_epoch(),
        open_accounts: ledger.queries().get_open_accounts(),
    })
}
