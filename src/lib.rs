//! bingopool - pooled-stake bingo game engine.
//!
//! Players pay a fixed entry fee into a per-game pot, the host draws numbers
//! one at a time without repeats from a deterministic tick-seeded sequencer,
//! each player holds an immutable packed board assigned at join time, and the
//! first player to prove a fully covered line takes the whole pool.
//!
//! The crate is split along the engine's seams:
//!
//! - [`board`] packs board layout + owner into one injective value and
//!   handles the per-cell covered bitmask;
//! - [`draw`] derives the next non-repeating number from the tick counter;
//! - [`verify`] checks a claimed line against the full draw history;
//! - [`engine`] owns game lifecycle (`Created -> Drawing -> Settled`) and
//!   the four state-changing operations;
//! - [`settlement`] pays the pool out through the [`token`] collaborator;
//! - [`api`] is a thin HTTP layer over the engine.
//!
//! Draws are procedurally derived from an abstract monotonic tick counter,
//! not cryptographically random: the same ticks replay the same game, which
//! is what makes settled games auditable.

pub mod api;
pub mod board;
pub mod config;
pub mod draw;
pub mod engine;
pub mod errors;
pub mod settlement;
pub mod token;
pub mod verify;

pub use board::{Board, CoveredMask, PackedBoard};
pub use config::{ApiConfig, BingoConfig, GameConfig};
pub use engine::{BingoEngine, GameInfo, GameStatus, ManualTicker, PlayerView, TickSource};
pub use errors::{BingoError, BingoResult};
pub use settlement::SettlementReceipt;
pub use token::{Amount, InMemoryLedger, TokenError, TokenLedger};
pub use verify::LineKind;
