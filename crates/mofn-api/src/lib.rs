//! # mofn-api: Axum API Service for the M-of-N Escrow Ledger
//!
//! Exposes the ledger over HTTP. Transactions and queries are sent in the
//! same shape legacy callers use (method name plus Clarity literal
//! arguments); accounts and chain status are also available as structured
//! JSON.
//!
//! ## API Surface
//!
//! | Route                       | Module                     |
//! |-----------------------------|----------------------------|
//! | `POST /v1/transactions`     | [`routes::transactions`]   |
//! | `POST /v1/queries`          | [`routes::queries`]        |
//! | `GET /v1/accounts[/:number]`| [`routes::accounts`]       |
//! | `GET /v1/chain`             | [`routes::chain`]          |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```

pub mod auth;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware
/// so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::transactions::router())
        .merge(routes::queries::router())
        .merge(routes::accounts::router())
        .merge(routes::chain::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe: 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the ledger is loaded and routes are mounted.
async fn readiness() -> &'static str {
    "ready"
}
