//! Win verifier: checks a claimed line against the board and draw history.
//!
//! A `true` result is final and releases the pool, so this module recomputes
//! everything from first principles at claim time: the persisted covered
//! bitmask is treated only as a lower-bound cache and is OR-ed with the mask
//! rebuilt from the full draw history. An uncovered line is a normal `false`
//! outcome, not an error, and leaves the claim free to retry later.

use crate::board::{Board, CoveredMask};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The claimed winning pattern. The index parameter selects the row or
/// column; diagonals and full-card ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Row,
    Column,
    /// Top-left to bottom-right.
    DiagonalMain,
    /// Top-right to bottom-left.
    DiagonalAnti,
    FullCard,
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineKind::Row => write!(f, "row"),
            LineKind::Column => write!(f, "column"),
            LineKind::DiagonalMain => write!(f, "diagonal_main"),
            LineKind::DiagonalAnti => write!(f, "diagonal_anti"),
            LineKind::FullCard => write!(f, "full_card"),
        }
    }
}

/// Flat cell indices making up the claimed line, or `None` when the index
/// parameter is out of range for the grid.
pub fn line_cells(kind: LineKind, param: u8, size: u8) -> Option<Vec<usize>> {
    let n = size as usize;
    match kind {
        LineKind::Row => {
            if param >= size {
                return None;
            }
            let row = param as usize;
            Some((0..n).map(|col| row * n + col).collect())
        }
        LineKind::Column => {
            if param >= size {
                return None;
            }
            let col = param as usize;
            Some((0..n).map(|row| row * n + col).collect())
        }
        LineKind::DiagonalMain => Some((0..n).map(|i| i * n + i).collect()),
        LineKind::DiagonalAnti => Some((0..n).map(|i| i * n + (n - 1 - i)).collect()),
        LineKind::FullCard => Some((0..n * n).collect()),
    }
}

/// Rebuild the covered mask a player is entitled to right now: the cached
/// mask merged with every cell whose number appears in the draw history,
/// plus the free-space cell if the game has one.
pub fn effective_covered(
    board: &Board,
    cached: CoveredMask,
    history: &[u8],
    free_space_index: Option<u8>,
) -> CoveredMask {
    let mut drawn = [false; 256];
    for &number in history {
        drawn[number as usize] = true;
    }

    let mut mask = cached;
    for index in 0..board.cell_count() {
        if drawn[board.cell(index) as usize] {
            mask.set(index);
        }
    }
    if let Some(free) = free_space_index {
        mask.set(free as usize);
    }
    mask
}

/// Check a claim. `true` only when every cell of the claimed line is covered
/// by the recomputed mask; anything else (including an out-of-range line
/// parameter) is `false`.
pub fn verify(
    board: &Board,
    cached: CoveredMask,
    history: &[u8],
    free_space_index: Option<u8>,
    kind: LineKind,
    param: u8,
) -> bool {
    let Some(cells) = line_cells(kind, param, board.size()) else {
        return false;
    };
    let mask = effective_covered(board, cached, history, free_space_index);
    mask.covers(&cells)
}
