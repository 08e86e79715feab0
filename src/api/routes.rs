//! Route definitions.

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Map URLs to handlers.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        // Game lifecycle
        .route("/games", post(create_game_handler))
        .route("/games/:id", get(game_info_handler))
        .route("/games/:id/join", post(join_game_handler))
        .route("/games/:id/draw", post(draw_handler))
        .route("/games/:id/draws", get(draws_handler))
        .route("/games/:id/claim", post(claim_handler))
        .route("/games/:id/players/:idx", get(player_handler))
        // Dev ledger
        .route("/accounts/:account/fund", post(fund_handler))
        .route("/accounts/:account/balance", get(balance_handler))
        .with_state(state)
}
