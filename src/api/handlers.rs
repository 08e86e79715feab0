//! Request handlers.
//!
//! The environment's total ordering of submitted operations is the HTTP
//! request stream; each state-changing handler advances the tick once and
//! then runs exactly one atomic engine operation.

use super::{errors::ApiError, middleware::RequestId, models::*};
use crate::engine::{BingoEngine, GameInfo, ManualTicker, PlayerView};
use crate::token::{InMemoryLedger, TokenLedger};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub engine: Arc<BingoEngine>,
    /// Concrete dev ledger so the faucet endpoints can mint and approve.
    pub ledger: Arc<InMemoryLedger>,
    pub ticker: Arc<ManualTicker>,
    pub version: String,
}

/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "running".to_string(),
        version: state.version.clone(),
    })
}

/// POST /games
pub async fn create_game_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateGameRequest>,
) -> Result<Json<GameInfo>, ApiError> {
    state.ticker.advance();
    state
        .engine
        .create_game(request.game_id)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))?;

    let info = state
        .engine
        .game_info(request.game_id)
        .map_err(|e| ApiError::from_engine(request_id.0, e))?;
    Ok(Json(info))
}

/// POST /games/:id/join
pub async fn join_game_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<u64>,
    Json(request): Json<JoinRequest>,
) -> Result<Json<PlayerView>, ApiError> {
    if request.player.is_empty() {
        return Err(ApiError::bad_request(
            request_id.0,
            "player must not be empty".to_string(),
        ));
    }

    state.ticker.advance();
    state
        .engine
        .join_game(game_id, &request.player)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))?;

    // The new record is always the last one; joins append in order.
    let info = state
        .engine
        .game_info(game_id)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))?;
    let view = state
        .engine
        .player_by_index(game_id, info.player_count - 1)
        .map_err(|e| ApiError::from_engine(request_id.0, e))?;
    Ok(Json(view))
}

/// POST /games/:id/draw
pub async fn draw_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<u64>,
) -> Result<Json<DrawResponse>, ApiError> {
    state.ticker.advance();
    let number = state
        .engine
        .draw(game_id)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))?;

    let info = state
        .engine
        .game_info(game_id)
        .map_err(|e| ApiError::from_engine(request_id.0, e))?;
    Ok(Json(DrawResponse {
        game_id,
        number,
        draw_count: info.draw_count,
    }))
}

/// POST /games/:id/claim
pub async fn claim_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<u64>,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    state.ticker.advance();
    let won = state
        .engine
        .claim(game_id, &request.player, request.line_kind, request.line_param)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))?;

    let settlement = if won {
        state
            .engine
            .game_info(game_id)
            .map_err(|e| ApiError::from_engine(request_id.0, e))?
            .settlement
    } else {
        None
    };

    Ok(Json(ClaimResponse {
        game_id,
        won,
        settlement,
    }))
}

/// GET /games/:id
pub async fn game_info_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<u64>,
) -> Result<Json<GameInfo>, ApiError> {
    let info = state
        .engine
        .game_info(game_id)
        .map_err(|e| ApiError::from_engine(request_id.0, e))?;
    Ok(Json(info))
}

/// GET /games/:id/draws
pub async fn draws_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<u64>,
) -> Result<Json<DrawsResponse>, ApiError> {
    let numbers = state
        .engine
        .drawn_numbers(game_id)
        .map_err(|e| ApiError::from_engine(request_id.0, e))?;
    Ok(Json(DrawsResponse { game_id, numbers }))
}

/// GET /games/:id/players/:idx
pub async fn player_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path((game_id, index)): Path<(u64, usize)>,
) -> Result<Json<PlayerView>, ApiError> {
    let view = state
        .engine
        .player_by_index(game_id, index)
        .map_err(|e| ApiError::from_engine(request_id.0, e))?;
    Ok(Json(view))
}

/// POST /accounts/:account/fund — dev faucet against the in-memory ledger.
/// Mints the amount and approves the escrow account to pull it.
pub async fn fund_handler(
    State(state): State<Arc<AppState>>,
    Path(account): Path<String>,
    Json(request): Json<FundRequest>,
) -> Json<BalanceResponse> {
    state.ledger.mint(&account, request.amount);
    let escrow = &state.engine.config().escrow_account;
    let allowance = state.ledger.allowance(&account, escrow);
    state.ledger.approve(&account, escrow, allowance + request.amount);

    Json(BalanceResponse {
        balance: state.ledger.balance_of(&account),
        account,
    })
}

/// GET /accounts/:account/balance
pub async fn balance_handler(
    State(state): State<Arc<AppState>>,
    Path(account): Path<String>,
) -> Json<BalanceResponse> {
    Json(BalanceResponse {
        balance: state.ledger.balance_of(&account),
        account,
    })
}
