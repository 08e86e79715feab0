//! Request and response bodies for the HTTP surface.
//!
//! Read models for games and players live in the engine ([`GameInfo`],
//! [`PlayerView`]) and are serialized as-is; these are the remaining
//! API-only shapes.
//!
//! [`GameInfo`]: crate::engine::GameInfo
//! [`PlayerView`]: crate::engine::PlayerView

use crate::settlement::SettlementReceipt;
use crate::token::Amount;
use crate::verify::LineKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub game_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub player: String,
}

#[derive(Debug, Serialize)]
pub struct DrawResponse {
    pub game_id: u64,
    pub number: u8,
    pub draw_count: usize,
}

#[derive(Debug, Serialize)]
pub struct DrawsResponse {
    pub game_id: u64,
    pub numbers: Vec<u8>,
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub player: String,
    pub line_kind: LineKind,
    #[serde(default)]
    pub line_param: u8,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub game_id: u64,
    pub won: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<SettlementReceipt>,
}

/// Dev-ledger faucet: credits an account and approves the escrow to pull
/// from it. Only meaningful against the bundled in-memory ledger.
#[derive(Debug, Deserialize)]
pub struct FundRequest {
    pub amount: Amount,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub account: String,
    pub balance: Amount,
}
