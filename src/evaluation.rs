//! ArborChess - Position Evaluation Module
//!
//! Static evaluation by material count, always from the perspective of the
//! side to move. Checkmate and stalemate are special-cased.

use crate::board::Board;
use crate::move_generator::MoveGenerator;
use crate::types::*;

/// Score of a checkmated side to move (negated); mates found deeper in the
/// search are offset by their ply so that shorter mates score higher.
pub const MATE_SCORE: i32 = 10_000;

// ============================================================================
// PIECE VALUES
// ============================================================================

pub const PIECE_VALUES: [i32; 7] = [
    0, // EMPTY
    1, // PAWN
    3, // KNIGHT
    3, // BISHOP
    5, // ROOK
    9, // QUEEN
    0, // KING
];

/// Material balance, positive when the side to move is ahead
pub fn material(board: &Board) -> i32 {
    let score: i32 = board
        .squares
        .iter()
        .filter(|&&piece| piece != EMPTY)
        .map(|&piece| {
            let value = PIECE_VALUES[get_piece_type(piece) as usize];
            if get_piece_color(piece) == WHITE { value } else { -value }
        })
        .sum();

    if board.white_to_move { score } else { -score }
}

/// Score of a position without legal moves
#[inline]
pub fn terminal_score(in_check: bool) -> i32 {
    if in_check { -MATE_SCORE } else { 0 }
}

/// Evaluate the position for the side to move.
///
/// Returns `-MATE_SCORE` when checkmated, 0 when stalemated and the material
/// balance otherwise.
pub fn evaluate(board: &Board, generator: &MoveGenerator) -> i32 {
    if generator.generate_legal_moves(board).is_empty() {
        return terminal_score(generator.in_check(board));
    }
    material(board)
}
