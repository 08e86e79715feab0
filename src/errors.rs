//! Error types for the bingopool engine.
//!
//! Every operation fails synchronously with one of these variants; no failure
//! is swallowed and no operation leaves partial state behind.

use crate::token::TokenError;
use thiserror::Error;

/// Root error type for all engine operations.
#[derive(Debug, Error)]
pub enum BingoError {
    /// The game id has never been created.
    #[error("game {0} does not exist")]
    GameNotFound(u64),

    /// A game with this id is already active.
    #[error("game {0} already exists")]
    GameAlreadyExists(u64),

    /// The identity already holds a player record in this game.
    #[error("player {player} already joined game {game_id}")]
    AlreadyJoined { game_id: u64, player: String },

    /// The game is settled; no further joins, draws or claims are accepted.
    #[error("game {0} is settled")]
    GameSettled(u64),

    /// Late joins are disabled and drawing has started.
    #[error("game {0} is no longer accepting joins")]
    JoinClosed(u64),

    /// Every number in the game's universe has already been drawn.
    #[error("game {0} has exhausted its number universe")]
    UniverseExhausted(u64),

    /// The read accessor was asked for a player slot that does not exist.
    #[error("game {game_id} has no player at index {index}")]
    PlayerNotFound { game_id: u64, index: usize },

    /// The token collaborator rejected a transfer. The triggering operation
    /// changed no engine state.
    #[error("token transfer failed: {0}")]
    Transfer(#[from] TokenError),

    /// Invalid or unloadable configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type BingoResult<T> = Result<T, BingoError>;
