//! Per-game lifecycle: the state machine behind every observable operation.
//!
//! Games move `Created -> Drawing -> Settled`. Each operation validates,
//! then talks to the token collaborator, then commits its state changes, so
//! a collaborator failure surfaces before anything was mutated and a retry
//! is always safe. Games are partitioned per id in a concurrent map; an
//! operation holds its game's entry for its whole duration, which makes
//! every operation atomic without any further locking.
//!
//! Covered bitmasks are reconciled lazily: draws never touch player records
//! (flat cost per draw regardless of player count), and the win verifier
//! recomputes coverage from the full draw history at claim time.

use crate::board::{derive_board, CoveredMask, PackedBoard};
use crate::config::GameConfig;
use crate::draw;
use crate::errors::{BingoError, BingoResult};
use crate::settlement::{settle_pool, SettlementReceipt};
use crate::token::{Amount, TokenLedger};
use crate::verify::{self, LineKind};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Abstract monotonic counter supplied by the environment. This is not
/// wall-clock time; draws derived from it replay deterministically.
pub trait TickSource: Send + Sync {
    fn current(&self) -> u64;
}

/// Tick counter advanced explicitly by the embedding environment, typically
/// once per state-changing request.
pub struct ManualTicker {
    tick: AtomicU64,
}

impl ManualTicker {
    pub fn new(start: u64) -> Self {
        Self {
            tick: AtomicU64::new(start),
        }
    }

    /// Advance the counter by one and return the new value.
    pub fn advance(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl TickSource for ManualTicker {
    fn current(&self) -> u64 {
        self.tick.load(Ordering::SeqCst)
    }
}

/// Lifecycle state of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Exists, accepting joins, nothing drawn yet.
    Created,
    /// At least one number drawn.
    Drawing,
    /// Pool paid out. Terminal.
    Settled,
}

/// One player's record within a game. `board` is set at join time and never
/// mutated afterwards; `covered` is only a cache the verifier merges with
/// the recomputed mask.
#[derive(Debug, Clone)]
pub struct Player {
    pub board: PackedBoard,
    pub covered: CoveredMask,
    pub join_tick: u64,
}

/// One independent bingo round. Rules are copied from the engine config at
/// creation so later config changes cannot alter a live game.
#[derive(Debug)]
struct Game {
    entry_fee: Amount,
    board_size: u8,
    free_space_index: Option<u8>,
    universe: u8,
    allow_late_join: bool,
    init_tick: u64,
    last_draw_tick: u64,
    draw_history: Vec<u8>,
    pool: Amount,
    status: GameStatus,
    players: Vec<Player>,
    settlement: Option<SettlementReceipt>,
}

/// Read-only game summary.
#[derive(Debug, Clone, Serialize)]
pub struct GameInfo {
    pub game_id: u64,
    pub status: GameStatus,
    pub settled: bool,
    pub init_tick: u64,
    pub last_draw_tick: u64,
    pub pool: Amount,
    pub entry_fee: Amount,
    pub draw_count: usize,
    pub player_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<SettlementReceipt>,
}

/// Read-only player record, ordered by join sequence. `covered_spots` is the
/// reconciled mask (cache merged with the current draw history), so it
/// reflects every draw made so far even though draws never write to players.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub index: usize,
    pub owner: String,
    pub board_and_owner: String,
    pub covered_spots: u64,
    pub join_tick: u64,
}

/// The game engine: owns all games, the token seam and the tick source.
pub struct BingoEngine {
    games: DashMap<u64, Game>,
    ledger: Arc<dyn TokenLedger>,
    ticker: Arc<dyn TickSource>,
    config: GameConfig,
}

impl BingoEngine {
    pub fn new(config: GameConfig, ledger: Arc<dyn TokenLedger>, ticker: Arc<dyn TickSource>) -> Self {
        Self {
            games: DashMap::new(),
            ledger,
            ticker,
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Allocate a fresh game under a caller-chosen id.
    pub fn create_game(&self, game_id: u64) -> BingoResult<()> {
        match self.games.entry(game_id) {
            Entry::Occupied(_) => Err(BingoError::GameAlreadyExists(game_id)),
            Entry::Vacant(slot) => {
                let tick = self.ticker.current();
                slot.insert(Game {
                    entry_fee: self.config.entry_fee,
                    board_size: self.config.board_size,
                    free_space_index: self.config.free_space_index,
                    universe: self.config.universe,
                    allow_late_join: self.config.allow_late_join,
                    init_tick: tick,
                    last_draw_tick: tick,
                    draw_history: Vec::new(),
                    pool: 0,
                    status: GameStatus::Created,
                    players: Vec::new(),
                    settlement: None,
                });
                tracing::info!(game_id, tick, "game created");
                Ok(())
            }
        }
    }

    /// Escrow the entry fee and append a player record with a derived board.
    ///
    /// The escrow pull happens before any state change; if the collaborator
    /// rejects it, the game is untouched.
    pub fn join_game(&self, game_id: u64, player: &str) -> BingoResult<()> {
        let mut game = self
            .games
            .get_mut(&game_id)
            .ok_or(BingoError::GameNotFound(game_id))?;

        match game.status {
            GameStatus::Settled => return Err(BingoError::GameSettled(game_id)),
            GameStatus::Drawing if !game.allow_late_join => {
                return Err(BingoError::JoinClosed(game_id))
            }
            _ => {}
        }

        if game.players.iter().any(|p| p.board.owner() == player) {
            return Err(BingoError::AlreadyJoined {
                game_id,
                player: player.to_string(),
            });
        }

        self.ledger
            .transfer_from(player, &self.config.escrow_account, game.entry_fee)?;

        let join_tick = self.ticker.current();
        let board = derive_board(game_id, player, join_tick, game.board_size, game.universe);

        let mut covered = CoveredMask::empty();
        if let Some(free) = game.free_space_index {
            covered.set(free as usize);
        }

        game.players.push(Player {
            board: PackedBoard::pack(board, player),
            covered,
            join_tick,
        });
        game.pool += game.entry_fee;

        tracing::info!(
            game_id,
            player,
            pool = game.pool,
            players = game.players.len(),
            "player joined"
        );
        Ok(())
    }

    /// Draw the next number and append it to the game's history.
    pub fn draw(&self, game_id: u64) -> BingoResult<u8> {
        let mut game = self
            .games
            .get_mut(&game_id)
            .ok_or(BingoError::GameNotFound(game_id))?;

        if game.status == GameStatus::Settled {
            return Err(BingoError::GameSettled(game_id));
        }

        let tick = self.ticker.current();
        let number = draw::next_number(
            game_id,
            game.init_tick,
            tick,
            &game.draw_history,
            game.universe,
        )
        .ok_or(BingoError::UniverseExhausted(game_id))?;

        game.draw_history.push(number);
        game.last_draw_tick = tick;
        if game.status == GameStatus::Created {
            game.status = GameStatus::Drawing;
        }

        tracing::debug!(game_id, number, drawn = game.draw_history.len(), "number drawn");
        Ok(number)
    }

    /// Verify a claimed line for `player` and settle the pool on success.
    ///
    /// An unverified claim is a normal `Ok(false)`, never an error, and
    /// changes nothing; claims stay free to retry as more numbers land. A
    /// verified claim pays the whole pool to the claimant, zeroes the pool
    /// and settles the game. If the payout transfer fails the claim fails
    /// atomically and the game stays claimable.
    pub fn claim(
        &self,
        game_id: u64,
        player: &str,
        kind: LineKind,
        param: u8,
    ) -> BingoResult<bool> {
        let mut game = self
            .games
            .get_mut(&game_id)
            .ok_or(BingoError::GameNotFound(game_id))?;

        if game.status == GameStatus::Settled {
            return Err(BingoError::GameSettled(game_id));
        }

        let Some(index) = game.players.iter().position(|p| p.board.owner() == player) else {
            tracing::debug!(game_id, player, "claim from non-player");
            return Ok(false);
        };

        let record = &game.players[index];
        let verified = verify::verify(
            record.board.board(),
            record.covered,
            &game.draw_history,
            game.free_space_index,
            kind,
            param,
        );
        if !verified {
            tracing::debug!(game_id, player, %kind, param, "claim not covered");
            return Ok(false);
        }

        let tick = self.ticker.current();
        let receipt = settle_pool(
            self.ledger.as_ref(),
            &self.config.escrow_account,
            game_id,
            player,
            game.pool,
            tick,
        )?;

        let effective = verify::effective_covered(
            game.players[index].board.board(),
            game.players[index].covered,
            &game.draw_history,
            game.free_space_index,
        );
        game.players[index].covered = effective;
        game.pool = 0;
        game.status = GameStatus::Settled;
        game.settlement = Some(receipt);

        tracing::info!(game_id, winner = player, %kind, param, "bingo verified, game settled");
        Ok(true)
    }

    /// Read-only summary of a game.
    pub fn game_info(&self, game_id: u64) -> BingoResult<GameInfo> {
        let game = self
            .games
            .get(&game_id)
            .ok_or(BingoError::GameNotFound(game_id))?;
        Ok(GameInfo {
            game_id,
            status: game.status,
            settled: game.status == GameStatus::Settled,
            init_tick: game.init_tick,
            last_draw_tick: game.last_draw_tick,
            pool: game.pool,
            entry_fee: game.entry_fee,
            draw_count: game.draw_history.len(),
            player_count: game.players.len(),
            settlement: game.settlement.clone(),
        })
    }

    /// Player record by join order, with the reconciled covered mask.
    pub fn player_by_index(&self, game_id: u64, index: usize) -> BingoResult<PlayerView> {
        let game = self
            .games
            .get(&game_id)
            .ok_or(BingoError::GameNotFound(game_id))?;
        let record = game
            .players
            .get(index)
            .ok_or(BingoError::PlayerNotFound { game_id, index })?;

        let covered = verify::effective_covered(
            record.board.board(),
            record.covered,
            &game.draw_history,
            game.free_space_index,
        );

        Ok(PlayerView {
            index,
            owner: record.board.owner().to_string(),
            board_and_owner: record.board.encode_hex(),
            covered_spots: covered.bits(),
            join_tick: record.join_tick,
        })
    }

    /// Full ordered draw history of a game.
    pub fn drawn_numbers(&self, game_id: u64) -> BingoResult<Vec<u8>> {
        let game = self
            .games
            .get(&game_id)
            .ok_or(BingoError::GameNotFound(game_id))?;
        Ok(game.draw_history.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::InMemoryLedger;

    const ESCROW: &str = "escrow";
    const FEE: Amount = 10;

    fn test_config(allow_late_join: bool) -> GameConfig {
        GameConfig {
            entry_fee: FEE,
            board_size: 3,
            free_space_index: Some(4),
            universe: 20,
            allow_late_join,
            escrow_account: ESCROW.to_string(),
        }
    }

    fn setup(allow_late_join: bool) -> (Arc<InMemoryLedger>, Arc<ManualTicker>, BingoEngine) {
        let ledger = Arc::new(InMemoryLedger::new());
        let ticker = Arc::new(ManualTicker::new(100));
        let engine = BingoEngine::new(
            test_config(allow_late_join),
            ledger.clone(),
            ticker.clone(),
        );
        (ledger, ticker, engine)
    }

    fn fund(ledger: &InMemoryLedger, player: &str) {
        ledger.mint(player, 100);
        ledger.approve(player, ESCROW, 100);
    }

    /// Draw (advancing the tick) until `player` can claim the given line.
    /// Panics if the universe exhausts first, which cannot happen for a
    /// full-card claim over a universe-covering history.
    fn draw_until_claimed(
        engine: &BingoEngine,
        ticker: &ManualTicker,
        game_id: u64,
        player: &str,
        kind: LineKind,
        param: u8,
    ) {
        loop {
            if engine.claim(game_id, player, kind, param).unwrap() {
                return;
            }
            ticker.advance();
            engine.draw(game_id).expect("universe exhausted before claim verified");
        }
    }

    #[test]
    fn test_create_then_duplicate_fails() {
        let (_, _, engine) = setup(true);
        engine.create_game(1).unwrap();

        let info = engine.game_info(1).unwrap();
        assert_eq!(info.status, GameStatus::Created);
        assert_eq!(info.init_tick, 100);
        assert_eq!(info.last_draw_tick, 100);

        let err = engine.create_game(1).unwrap_err();
        assert!(matches!(err, BingoError::GameAlreadyExists(1)));
    }

    #[test]
    fn test_operations_on_unknown_game_fail() {
        let (_, _, engine) = setup(true);
        assert!(matches!(engine.join_game(7, "alice"), Err(BingoError::GameNotFound(7))));
        assert!(matches!(engine.draw(7), Err(BingoError::GameNotFound(7))));
        assert!(matches!(
            engine.claim(7, "alice", LineKind::Row, 0),
            Err(BingoError::GameNotFound(7))
        ));
        assert!(matches!(engine.game_info(7), Err(BingoError::GameNotFound(7))));
    }

    #[test]
    fn test_join_escrows_fee_and_assigns_board() {
        let (ledger, _, engine) = setup(true);
        fund(&ledger, "alice");
        engine.create_game(1).unwrap();
        engine.join_game(1, "alice").unwrap();

        assert_eq!(ledger.balance_of("alice"), 90);
        assert_eq!(ledger.balance_of(ESCROW), 10);
        assert_eq!(engine.game_info(1).unwrap().pool, FEE);

        let view = engine.player_by_index(1, 0).unwrap();
        assert_eq!(view.owner, "alice");
        assert!(!view.board_and_owner.is_empty());
        // Free-space bit is pre-set before any draw.
        assert_eq!(view.covered_spots, 1 << 4);
    }

    #[test]
    fn test_rejoin_rejected_without_side_effects() {
        let (ledger, _, engine) = setup(true);
        fund(&ledger, "alice");
        engine.create_game(1).unwrap();
        engine.join_game(1, "alice").unwrap();

        let err = engine.join_game(1, "alice").unwrap_err();
        assert!(matches!(err, BingoError::AlreadyJoined { .. }));

        let info = engine.game_info(1).unwrap();
        assert_eq!(info.pool, FEE);
        assert_eq!(info.player_count, 1);
        assert_eq!(ledger.balance_of("alice"), 90);
    }

    #[test]
    fn test_join_without_allowance_changes_nothing() {
        let (ledger, _, engine) = setup(true);
        ledger.mint("bob", 100); // no approval
        engine.create_game(1).unwrap();

        let err = engine.join_game(1, "bob").unwrap_err();
        assert!(matches!(err, BingoError::Transfer(_)));

        let info = engine.game_info(1).unwrap();
        assert_eq!(info.pool, 0);
        assert_eq!(info.player_count, 0);
        assert_eq!(ledger.balance_of("bob"), 100);
    }

    #[test]
    fn test_pool_tracks_entry_fee_times_joins() {
        let (ledger, _, engine) = setup(true);
        engine.create_game(1).unwrap();
        for player in ["alice", "bob", "carol"] {
            fund(&ledger, player);
            engine.join_game(1, player).unwrap();
        }
        let info = engine.game_info(1).unwrap();
        assert_eq!(info.pool, FEE * 3);
        assert_eq!(info.player_count, 3);
        assert_eq!(ledger.balance_of(ESCROW), FEE * 3);
    }

    #[test]
    fn test_draw_transitions_and_stays_unique() {
        let (_, ticker, engine) = setup(true);
        engine.create_game(1).unwrap();

        let mut seen = std::collections::HashSet::new();
        for _ in 0..20 {
            ticker.advance();
            let number = engine.draw(1).unwrap();
            assert!(seen.insert(number), "duplicate draw {}", number);
            assert_eq!(engine.game_info(1).unwrap().status, GameStatus::Drawing);
            assert_eq!(engine.game_info(1).unwrap().last_draw_tick, ticker.current());
        }

        // Universe of 20 is now spent.
        ticker.advance();
        let err = engine.draw(1).unwrap_err();
        assert!(matches!(err, BingoError::UniverseExhausted(1)));
        assert_eq!(engine.drawn_numbers(1).unwrap().len(), 20);
    }

    #[test]
    fn test_late_join_policy_flag() {
        let (ledger, ticker, engine) = setup(false);
        fund(&ledger, "alice");
        fund(&ledger, "bob");
        engine.create_game(1).unwrap();
        engine.join_game(1, "alice").unwrap();

        ticker.advance();
        engine.draw(1).unwrap();

        let err = engine.join_game(1, "bob").unwrap_err();
        assert!(matches!(err, BingoError::JoinClosed(1)));

        // Same sequence with the flag on admits the late joiner.
        let (ledger2, ticker2, engine2) = setup(true);
        fund(&ledger2, "alice");
        fund(&ledger2, "bob");
        engine2.create_game(1).unwrap();
        engine2.join_game(1, "alice").unwrap();
        ticker2.advance();
        engine2.draw(1).unwrap();
        engine2.join_game(1, "bob").unwrap();
        assert_eq!(engine2.game_info(1).unwrap().player_count, 2);
    }

    #[test]
    fn test_board_is_stable_across_draws() {
        let (ledger, ticker, engine) = setup(true);
        fund(&ledger, "alice");
        engine.create_game(1).unwrap();
        engine.join_game(1, "alice").unwrap();

        let before = engine.player_by_index(1, 0).unwrap().board_and_owner;
        for _ in 0..5 {
            ticker.advance();
            engine.draw(1).unwrap();
        }
        let after = engine.player_by_index(1, 0).unwrap().board_and_owner;
        assert_eq!(before, after);
    }

    #[test]
    fn test_covered_spots_reconcile_from_history() {
        let (ledger, ticker, engine) = setup(true);
        fund(&ledger, "alice");
        engine.create_game(1).unwrap();
        engine.join_game(1, "alice").unwrap();

        // Draw the whole 20-number universe; every board cell must then read
        // as covered even though draws never wrote to the player record.
        for _ in 0..20 {
            ticker.advance();
            engine.draw(1).unwrap();
        }
        let view = engine.player_by_index(1, 0).unwrap();
        assert_eq!(view.covered_spots.count_ones(), 9);
    }

    #[test]
    fn test_claim_from_non_player_is_false() {
        let (ledger, _, engine) = setup(true);
        fund(&ledger, "alice");
        engine.create_game(1).unwrap();
        engine.join_game(1, "alice").unwrap();
        assert!(!engine.claim(1, "mallory", LineKind::Row, 0).unwrap());
    }

    #[test]
    fn test_full_claim_flow_and_settlement_exclusivity() {
        let (ledger, ticker, engine) = setup(true);
        fund(&ledger, "alice");
        fund(&ledger, "bob");
        engine.create_game(1).unwrap();
        engine.join_game(1, "alice").unwrap();
        engine.join_game(1, "bob").unwrap();
        assert_eq!(engine.game_info(1).unwrap().pool, FEE * 2);

        draw_until_claimed(&engine, &ticker, 1, "alice", LineKind::Row, 0);

        let info = engine.game_info(1).unwrap();
        assert!(info.settled);
        assert_eq!(info.status, GameStatus::Settled);
        assert_eq!(info.pool, 0);
        let receipt = info.settlement.expect("settlement receipt recorded");
        assert_eq!(receipt.winner, "alice");
        assert_eq!(receipt.amount, FEE * 2);

        // Whole pool went to the winner; escrow is empty.
        assert_eq!(ledger.balance_of("alice"), 90 + FEE * 2);
        assert_eq!(ledger.balance_of(ESCROW), 0);

        // Settled is terminal for every state-changing operation.
        assert!(matches!(engine.draw(1), Err(BingoError::GameSettled(1))));
        assert!(matches!(
            engine.claim(1, "bob", LineKind::Row, 0),
            Err(BingoError::GameSettled(1))
        ));
        assert!(matches!(engine.join_game(1, "bob"), Err(BingoError::GameSettled(1))));
        assert_eq!(engine.game_info(1).unwrap().pool, 0);
    }

    #[test]
    fn test_uncovered_claim_is_false_and_harmless() {
        let (ledger, ticker, engine) = setup(true);
        fund(&ledger, "alice");
        engine.create_game(1).unwrap();
        engine.join_game(1, "alice").unwrap();
        ticker.advance();
        engine.draw(1).unwrap();

        // One draw cannot cover a full card.
        assert!(!engine.claim(1, "alice", LineKind::FullCard, 0).unwrap());
        let info = engine.game_info(1).unwrap();
        assert!(!info.settled);
        assert_eq!(info.pool, FEE);
    }

    #[test]
    fn test_claim_with_failed_payout_stays_claimable() {
        let (ledger, ticker, engine) = setup(true);
        fund(&ledger, "alice");
        engine.create_game(1).unwrap();
        engine.join_game(1, "alice").unwrap();

        // Cover the whole card so the claim verifies.
        for _ in 0..20 {
            ticker.advance();
            engine.draw(1).unwrap();
        }

        // Simulate a collaborator failure by draining the escrow account.
        ledger.transfer(ESCROW, "vault", FEE).unwrap();
        let err = engine.claim(1, "alice", LineKind::FullCard, 0).unwrap_err();
        assert!(matches!(err, BingoError::Transfer(_)));

        let info = engine.game_info(1).unwrap();
        assert!(!info.settled, "failed payout must leave the game unsettled");
        assert_eq!(info.pool, FEE);

        // Refund the escrow; the retry now succeeds.
        ledger.transfer("vault", ESCROW, FEE).unwrap();
        assert!(engine.claim(1, "alice", LineKind::FullCard, 0).unwrap());
        assert!(engine.game_info(1).unwrap().settled);
    }

    #[test]
    fn test_games_are_isolated() {
        let (ledger, ticker, engine) = setup(true);
        fund(&ledger, "alice");
        engine.create_game(1).unwrap();
        engine.create_game(2).unwrap();
        engine.join_game(1, "alice").unwrap();

        ticker.advance();
        engine.draw(2).unwrap();

        assert_eq!(engine.game_info(1).unwrap().draw_count, 0);
        assert_eq!(engine.game_info(2).unwrap().draw_count, 1);
        assert_eq!(engine.game_info(2).unwrap().player_count, 0);
    }

    #[test]
    fn test_manual_ticker_is_monotonic() {
        let ticker = ManualTicker::new(5);
        assert_eq!(ticker.current(), 5);
        assert_eq!(ticker.advance(), 6);
        assert_eq!(ticker.advance(), 7);
        assert_eq!(ticker.current(), 7);
    }
}
