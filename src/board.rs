//! Board codec: grid layout, packed board+owner value, covered bitmask.
//!
//! A board is a fixed `size x size` grid of distinct numbers from the game's
//! universe `1..=universe`. At join time the grid and the owning identity are
//! packed into a single immutable [`PackedBoard`]; the packing is injective,
//! so the owner can always be recovered exactly and is never looked up
//! anywhere else. The covered bitmask records one bit per grid cell.
//!
//! Boards are derived procedurally from `(game_id, owner, join_tick)` via
//! SHA-256, which makes every assignment reproducible for audit while staying
//! unpredictable to the joiner before the join lands.

use sha2::{Digest, Sha256};

/// Rounds of hash output to try before falling back to a deterministic fill.
const MAX_DERIVE_ROUNDS: u32 = 64;

/// A player's grid: `size * size` distinct numbers in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: u8,
    cells: Vec<u8>,
}

impl Board {
    /// Build a board from raw cells. Callers guarantee `cells` holds
    /// `size * size` distinct numbers.
    pub fn new(size: u8, cells: Vec<u8>) -> Self {
        debug_assert_eq!(cells.len(), size as usize * size as usize);
        Self { size, cells }
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Number at a flat cell index.
    pub fn cell(&self, index: usize) -> u8 {
        self.cells[index]
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// Derive a board for `owner` joining `game_id` at `join_tick`.
///
/// Draws candidate numbers from a SHA-256 stream and keeps the first
/// `size * size` distinct ones. If the stream runs unlucky for too long the
/// remaining cells are filled with the smallest unused numbers, which keeps
/// derivation total for every valid `(size, universe)` pair.
pub fn derive_board(game_id: u64, owner: &str, join_tick: u64, size: u8, universe: u8) -> Board {
    let cell_count = size as usize * size as usize;
    debug_assert!(universe as usize >= cell_count);

    let mut cells: Vec<u8> = Vec::with_capacity(cell_count);
    let mut used = [false; 256];

    let mut round = 0u32;
    while cells.len() < cell_count && round < MAX_DERIVE_ROUNDS {
        let mut hasher = Sha256::new();
        hasher.update(b"bingopool:board");
        hasher.update(game_id.to_be_bytes());
        hasher.update(join_tick.to_be_bytes());
        hasher.update(round.to_be_bytes());
        hasher.update(owner.as_bytes());
        let digest = hasher.finalize();

        for byte in digest {
            if cells.len() == cell_count {
                break;
            }
            let number = byte % universe + 1;
            if !used[number as usize] {
                used[number as usize] = true;
                cells.push(number);
            }
        }
        round += 1;
    }

    // Deterministic fill for the pathological tail.
    let mut candidate = 1u8;
    while cells.len() < cell_count {
        if !used[candidate as usize] {
            used[candidate as usize] = true;
            cells.push(candidate);
        }
        candidate += 1;
    }

    Board::new(size, cells)
}

/// Immutable packed value combining a board layout with its owning identity.
///
/// Wire form is `[size] [cells...] [owner utf-8]`: the size byte fixes the
/// cell count, so the split point is unambiguous and two distinct
/// `(board, owner)` pairs can never encode to the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBoard {
    board: Board,
    owner: String,
}

impl PackedBoard {
    pub fn pack(board: Board, owner: &str) -> Self {
        Self {
            board,
            owner: owner.to_string(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Split back into the grid and the owning identity.
    pub fn unpack(&self) -> (&Board, &str) {
        (&self.board, &self.owner)
    }

    fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.board.cell_count() + self.owner.len());
        bytes.push(self.board.size);
        bytes.extend_from_slice(&self.board.cells);
        bytes.extend_from_slice(self.owner.as_bytes());
        bytes
    }

    /// Hex rendering of the packed value for read accessors and logs.
    pub fn encode_hex(&self) -> String {
        hex::encode(self.encode())
    }
}

/// Bitmask over grid cells: bit `i` set means cell `i` is covered.
///
/// Fits any board up to 8x8 in one word. The free-space bit, if the game has
/// one, is pre-set at join time and is never "matched by a draw".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoveredMask(u64);

impl CoveredMask {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u64 {
        self.0
    }

    pub fn set(&mut self, cell: usize) {
        debug_assert!(cell < 64);
        self.0 |= 1 << cell;
    }

    pub fn is_set(&self, cell: usize) -> bool {
        self.0 & (1 << cell) != 0
    }

    /// True when every listed cell is covered.
    pub fn covers(&self, cells: &[usize]) -> bool {
        cells.iter().all(|&cell| self.is_set(cell))
    }

    /// Union with another mask; the persisted mask is a lower bound that is
    /// merged with the recomputed one at verification time.
    pub fn merge(&self, other: CoveredMask) -> CoveredMask {
        CoveredMask(self.0 | other.0)
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }
}
