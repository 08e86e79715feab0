//! Pool settlement: pays the escrowed pool out to a verified winner.
//!
//! Settlement runs at most once per game; the engine's settled-state guard
//! enforces that, not this module. If the token collaborator rejects the
//! payout the whole claim fails atomically: the receipt is only produced
//! after the transfer lands, and the engine mutates nothing before that.

use crate::errors::BingoResult;
use crate::token::{Amount, TokenLedger};
use serde::{Deserialize, Serialize};

/// Audit record kept on the game after a successful payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub game_id: u64,
    pub winner: String,
    pub amount: Amount,
    pub settled_tick: u64,
}

/// Release `pool` from the escrow account to `winner`.
pub fn settle_pool(
    ledger: &dyn TokenLedger,
    escrow: &str,
    game_id: u64,
    winner: &str,
    pool: Amount,
    tick: u64,
) -> BingoResult<SettlementReceipt> {
    ledger.transfer(escrow, winner, pool)?;

    tracing::info!(game_id, winner, pool, "pool settled");

    Ok(SettlementReceipt {
        game_id,
        winner: winner.to_string(),
        amount: pool,
        settled_tick: tick,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BingoError;
    use crate::token::InMemoryLedger;

    #[test]
    fn test_settle_moves_whole_pool() {
        let ledger = InMemoryLedger::new();
        ledger.mint("escrow", 500);

        let receipt = settle_pool(&ledger, "escrow", 1, "alice", 500, 42).unwrap();
        assert_eq!(receipt.amount, 500);
        assert_eq!(receipt.winner, "alice");
        assert_eq!(receipt.settled_tick, 42);
        assert_eq!(ledger.balance_of("escrow"), 0);
        assert_eq!(ledger.balance_of("alice"), 500);
    }

    #[test]
    fn test_failed_transfer_surfaces_and_moves_nothing() {
        let ledger = InMemoryLedger::new();
        ledger.mint("escrow", 10);

        let err = settle_pool(&ledger, "escrow", 1, "alice", 500, 42).unwrap_err();
        assert!(matches!(err, BingoError::Transfer(_)));
        assert_eq!(ledger.balance_of("escrow"), 10);
        assert_eq!(ledger.balance_of("alice"), 0);
    }
}
