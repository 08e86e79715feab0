//! Token-transfer collaborator boundary.
//!
//! The engine never moves funds itself; it calls a [`TokenLedger`] with
//! `transfer_from`/`transfer` semantics. Each call is a single atomic step
//! that either fully succeeds or fully fails before the caller's operation
//! returns, so the engine can order its own state changes after the transfer
//! and stay atomic without rollback machinery.
//!
//! [`InMemoryLedger`] is the bundled implementation used by the server binary
//! and the tests. A production deployment swaps in a real token service
//! behind the same trait.

use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Fixed-point token amount (smallest unit).
pub type Amount = u64;

/// Failures surfaced by the token collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("account {0} has insufficient balance")]
    InsufficientBalance(String),

    #[error("account {owner} has not approved {spender} for this amount")]
    InsufficientAllowance { owner: String, spender: String },
}

/// Fungible-token service with escrow-style semantics.
pub trait TokenLedger: Send + Sync {
    /// Move `amount` from `from` into `to`, consuming allowance `from` has
    /// granted to `to`. Used to escrow entry fees.
    fn transfer_from(&self, from: &str, to: &str, amount: Amount) -> Result<(), TokenError>;

    /// Move `amount` out of an account the caller controls. Used to pay the
    /// pool out to a winner.
    fn transfer(&self, from: &str, to: &str, amount: Amount) -> Result<(), TokenError>;

    /// Current balance of an account. Unknown accounts read as zero.
    fn balance_of(&self, account: &str) -> Amount;
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<String, Amount>,
    /// (owner, spender) -> remaining allowance.
    allowances: HashMap<(String, String), Amount>,
}

/// In-process ledger with balances and allowances.
#[derive(Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account out of thin air. Test/faucet helper.
    pub fn mint(&self, account: &str, amount: Amount) {
        let mut state = self.state.lock().unwrap();
        *state.balances.entry(account.to_string()).or_insert(0) += amount;
    }

    /// Grant `spender` the right to pull up to `amount` from `owner`.
    pub fn approve(&self, owner: &str, spender: &str, amount: Amount) {
        let mut state = self.state.lock().unwrap();
        state
            .allowances
            .insert((owner.to_string(), spender.to_string()), amount);
    }

    pub fn allowance(&self, owner: &str, spender: &str) -> Amount {
        let state = self.state.lock().unwrap();
        state
            .allowances
            .get(&(owner.to_string(), spender.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn move_balance(
        state: &mut LedgerState,
        from: &str,
        to: &str,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let from_balance = state.balances.get(from).copied().unwrap_or(0);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance(from.to_string()));
        }
        state.balances.insert(from.to_string(), from_balance - amount);
        *state.balances.entry(to.to_string()).or_insert(0) += amount;
        Ok(())
    }
}

impl TokenLedger for InMemoryLedger {
    fn transfer_from(&self, from: &str, to: &str, amount: Amount) -> Result<(), TokenError> {
        let mut state = self.state.lock().unwrap();

        let key = (from.to_string(), to.to_string());
        let allowance = state.allowances.get(&key).copied().unwrap_or(0);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: from.to_string(),
                spender: to.to_string(),
            });
        }

        Self::move_balance(&mut state, from, to, amount)?;
        state.allowances.insert(key, allowance - amount);
        Ok(())
    }

    fn transfer(&self, from: &str, to: &str, amount: Amount) -> Result<(), TokenError> {
        let mut state = self.state.lock().unwrap();
        Self::move_balance(&mut state, from, to, amount)
    }

    fn balance_of(&self, account: &str) -> Amount {
        let state = self.state.lock().unwrap();
        state.balances.get(account).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_and_balance() {
        let ledger = InMemoryLedger::new();
        assert_eq!(ledger.balance_of("alice"), 0);
        ledger.mint("alice", 100);
        assert_eq!(ledger.balance_of("alice"), 100);
    }

    #[test]
    fn test_transfer_from_requires_allowance() {
        let ledger = InMemoryLedger::new();
        ledger.mint("alice", 100);

        let err = ledger.transfer_from("alice", "escrow", 10).unwrap_err();
        assert!(matches!(err, TokenError::InsufficientAllowance { .. }));

        ledger.approve("alice", "escrow", 10);
        ledger.transfer_from("alice", "escrow", 10).unwrap();
        assert_eq!(ledger.balance_of("alice"), 90);
        assert_eq!(ledger.balance_of("escrow"), 10);
        // Allowance is consumed.
        assert_eq!(ledger.allowance("alice", "escrow"), 0);
    }

    #[test]
    fn test_transfer_from_requires_balance() {
        let ledger = InMemoryLedger::new();
        ledger.approve("alice", "escrow", 50);

        let err = ledger.transfer_from("alice", "escrow", 50).unwrap_err();
        assert_eq!(err, TokenError::InsufficientBalance("alice".to_string()));
        // Failed pulls leave the allowance untouched.
        assert_eq!(ledger.allowance("alice", "escrow"), 50);
    }

    #[test]
    fn test_direct_transfer() {
        let ledger = InMemoryLedger::new();
        ledger.mint("escrow", 30);
        ledger.transfer("escrow", "winner", 30).unwrap();
        assert_eq!(ledger.balance_of("escrow"), 0);
        assert_eq!(ledger.balance_of("winner"), 30);

        let err = ledger.transfer("escrow", "winner", 1).unwrap_err();
        assert!(matches!(err, TokenError::InsufficientBalance(_)));
    }
}
