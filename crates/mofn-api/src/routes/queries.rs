//! # Read-Only Queries
//!
//! - `POST /v1/queries`: evaluate a read-only contract call.
//!
//! Queries never mine. The response carries the Clarity rendering of the
//! result, including `(err N)` responses, with status 200.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// A read-only call with Clarity literal arguments.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub method: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Validate for QueryRequest {
    fn validate(&self) -> Result<(), String> {
        if self.method.trim().is_empty() {
            return Err("method must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub method: String,
    /// Clarity rendering, e.g. `(ok u2)` or `(err 4)`.
    pub result: String,
}

/// Build the queries router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/queries", post(run_query))
}

/// POST /v1/queries
async fn run_query(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let value = state.ledger.query(&req.method, req.args.as_slice())?;
    Ok(Json(QueryResponse {
        method: req.method,
        result: value.to_string(),
    }))
}
