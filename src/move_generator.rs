//! ArborChess - Move Generator Module
//!
//! This module handles pseudo-legal move generation per piece type, the
//! check detector, and the legality filter that drops moves leaving the
//! mover's own king attacked (including castling out of or through check).

use std::sync::Arc;

use crate::board::{Board, Move};
use crate::cache::MoveCache;
use crate::types::*;

/// Direction offsets (file, rank) for sliding pieces
const ROOK_DIRECTIONS: [(i32, i32); 4] = [(0, 1), (0, -1), (-1, 0), (1, 0)];
const BISHOP_DIRECTIONS: [(i32, i32); 4] = [(-1, 1), (1, 1), (-1, -1), (1, -1)];
const QUEEN_DIRECTIONS: [(i32, i32); 8] = [
    (0, 1), (0, -1), (-1, 0), (1, 0),
    (-1, 1), (1, 1), (-1, -1), (1, -1),
];
const KING_OFFSETS: [(i32, i32); 8] = QUEEN_DIRECTIONS;
const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (1, 2), (-1, 2), (2, 1), (-2, 1),
    (2, -1), (-2, -1), (1, -2), (-1, -2),
];

/// Move generator for chess positions.
///
/// Optionally memoizes legal-move sets in a shared [`MoveCache`]; clones share
/// the same cache.
#[derive(Clone, Default)]
pub struct MoveGenerator {
    cache: Option<Arc<MoveCache>>,
}

impl MoveGenerator {
    /// Create a move generator without memoization
    pub fn new() -> Self {
        MoveGenerator { cache: None }
    }

    /// Create a move generator backed by a shared legal-move cache
    pub fn with_cache(cache: Arc<MoveCache>) -> Self {
        MoveGenerator { cache: Some(cache) }
    }

    pub fn cache(&self) -> Option<&Arc<MoveCache>> {
        self.cache.as_ref()
    }

    /// Generate all legal moves for the current position
    pub fn generate_legal_moves(&self, board: &Board) -> Vec<Move> {
        match &self.cache {
            Some(cache) => {
                let moves = cache.get_or_insert_with(board.position_key(), || self.filter_legal(board));
                moves.as_ref().clone()
            }
            None => self.filter_legal(board),
        }
    }

    fn filter_legal(&self, board: &Board) -> Vec<Move> {
        let pseudo_legal = self.generate_pseudo_legal_moves(board);
        let mut legal_moves = Vec::with_capacity(pseudo_legal.len());

        for mv in pseudo_legal {
            if self.is_legal(board, &mv) {
                legal_moves.push(mv);
            }
        }

        legal_moves
    }

    /// Generate all pseudo-legal moves for the side to move (may leave king in check)
    pub fn generate_pseudo_legal_moves(&self, board: &Board) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        let color = board.side_to_move();

        for sq in Square::all() {
            let piece = board.piece_at(sq);
            if piece != EMPTY && get_piece_color(piece) == color {
                self.generate_piece_moves(board, sq, color, &mut moves);
            }
        }

        moves
    }

    /// Generate pseudo-legal moves for the piece on `sq`, as seen by `color`.
    ///
    /// The colour is taken from the caller rather than the side to move, so the
    /// same generators can trace attack patterns for either side.
    pub fn generate_piece_moves(&self, board: &Board, sq: Square, color: u8, moves: &mut Vec<Move>) {
        match get_piece_type(board.piece_at(sq)) {
            PAWN => self.generate_pawn_moves(board, sq, color, moves),
            KNIGHT => self.generate_step_moves(board, sq, color, &KNIGHT_OFFSETS, moves),
            BISHOP => self.generate_sliding_moves(board, sq, color, &BISHOP_DIRECTIONS, moves),
            ROOK => self.generate_sliding_moves(board, sq, color, &ROOK_DIRECTIONS, moves),
            QUEEN => self.generate_sliding_moves(board, sq, color, &QUEEN_DIRECTIONS, moves),
            KING => {
                self.generate_step_moves(board, sq, color, &KING_OFFSETS, moves);
                self.generate_castling_moves(board, sq, color, moves);
            }
            _ => {}
        }
    }

    /// Generate pawn moves from the given square
    fn generate_pawn_moves(&self, board: &Board, sq: Square, color: u8, moves: &mut Vec<Move>) {
        let (forward, start_rank, promo_rank, ep_rank) = if color == WHITE {
            (1, 1, 7, 5)
        } else {
            (-1, 6, 0, 2)
        };

        let push = |to: Square, moves: &mut Vec<Move>| {
            if to.rank() == promo_rank {
                for promo in PROMOTION_PIECES {
                    moves.push(Move::with_promotion(sq, to, promo));
                }
            } else {
                moves.push(Move::new(sq, to));
            }
        };

        // Single push, then double push from the starting rank
        if let Some(one) = sq.offset(0, forward) {
            if board.piece_at(one) == EMPTY {
                push(one, moves);

                if sq.rank() == start_rank {
                    if let Some(two) = sq.offset(0, 2 * forward) {
                        if board.piece_at(two) == EMPTY {
                            moves.push(Move::new(sq, two));
                        }
                    }
                }
            }
        }

        // Captures
        for file_delta in [-1, 1] {
            let Some(to) = sq.offset(file_delta, forward) else {
                continue;
            };
            let target = board.piece_at(to);

            if target != EMPTY {
                if get_piece_color(target) != color {
                    push(to, moves);
                }
            } else if board.effective_en_passant() == Some(to) && to.rank() == ep_rank {
                moves.push(Move::new(sq, to));
            }
        }
    }

    /// Generate moves for pieces with a fixed offset set (knight, king)
    fn generate_step_moves(
        &self,
        board: &Board,
        sq: Square,
        color: u8,
        offsets: &[(i32, i32)],
        moves: &mut Vec<Move>,
    ) {
        for &(df, dr) in offsets {
            if let Some(to) = sq.offset(df, dr) {
                let target = board.piece_at(to);
                if target == EMPTY || get_piece_color(target) != color {
                    moves.push(Move::new(sq, to));
                }
            }
        }
    }

    /// Generate moves for sliding pieces (bishop, rook, queen)
    fn generate_sliding_moves(
        &self,
        board: &Board,
        sq: Square,
        color: u8,
        directions: &[(i32, i32)],
        moves: &mut Vec<Move>,
    ) {
        for &(df, dr) in directions {
            let mut current = sq;
            while let Some(next) = current.offset(df, dr) {
                let target = board.piece_at(next);

                if target == EMPTY {
                    moves.push(Move::new(sq, next));
                } else {
                    if get_piece_color(target) != color {
                        moves.push(Move::new(sq, next));
                    }
                    break;
                }

                current = next;
            }
        }
    }

    /// Castling candidates: rights set and the squares between king and rook
    /// empty. Check-related legality is left to the legality filter.
    fn generate_castling_moves(&self, board: &Board, sq: Square, color: u8, moves: &mut Vec<Move>) {
        let (rank, kingside, queenside) = if color == WHITE {
            (0, CASTLE_WK, CASTLE_WQ)
        } else {
            (7, CASTLE_BK, CASTLE_BQ)
        };
        if sq != Square::new(4, rank) {
            return;
        }

        let rook = color | ROOK;
        let empty = |file: u8| board.piece_at(Square::new(file, rank)) == EMPTY;

        if board.can_castle(kingside)
            && empty(5)
            && empty(6)
            && board.piece_at(Square::new(7, rank)) == rook
        {
            moves.push(Move::new(sq, Square::new(6, rank)));
        }

        if board.can_castle(queenside)
            && empty(1)
            && empty(2)
            && empty(3)
            && board.piece_at(Square::new(0, rank)) == rook
        {
            moves.push(Move::new(sq, Square::new(2, rank)));
        }
    }

    /// Check if `sq` is attacked by the opponent of `defender`.
    ///
    /// Works outward from the square: the generators are run as if a
    /// `defender` piece of each type stood on `sq`, and any capture landing on
    /// an enemy piece of that same type is an attack.
    pub fn is_square_attacked(&self, board: &Board, sq: Square, defender: u8) -> bool {
        let attacker = opposite(defender);
        let mut rays = Vec::with_capacity(28);

        let hits = |rays: &[Move], types: &[u8]| {
            rays.iter().any(|m| {
                let piece = board.piece_at(m.to);
                get_piece_color(piece) == attacker && types.contains(&get_piece_type(piece))
            })
        };

        self.generate_sliding_moves(board, sq, defender, &ROOK_DIRECTIONS, &mut rays);
        if hits(&rays, &[ROOK, QUEEN]) {
            return true;
        }

        rays.clear();
        self.generate_sliding_moves(board, sq, defender, &BISHOP_DIRECTIONS, &mut rays);
        if hits(&rays, &[BISHOP, QUEEN]) {
            return true;
        }

        rays.clear();
        self.generate_step_moves(board, sq, defender, &KNIGHT_OFFSETS, &mut rays);
        if hits(&rays, &[KNIGHT]) {
            return true;
        }

        rays.clear();
        self.generate_step_moves(board, sq, defender, &KING_OFFSETS, &mut rays);
        if hits(&rays, &[KING]) {
            return true;
        }

        // Enemy pawns attack from the two diagonals in front of the defender
        let forward = if defender == WHITE { 1 } else { -1 };
        let enemy_pawn = attacker | PAWN;
        [-1, 1]
            .iter()
            .filter_map(|&df| sq.offset(df, forward))
            .any(|from| board.piece_at(from) == enemy_pawn)
    }

    /// Check if the king of `color` is attacked
    pub fn is_in_check(&self, board: &Board, color: u8) -> bool {
        match board.find_king(color) {
            Some(king_sq) => self.is_square_attacked(board, king_sq, color),
            None => false,
        }
    }

    /// Check if the side to move is in check
    pub fn in_check(&self, board: &Board) -> bool {
        self.is_in_check(board, board.side_to_move())
    }

    /// Check if a pseudo-legal move is legal (doesn't leave own king in check)
    fn is_legal(&self, board: &Board, mv: &Move) -> bool {
        let piece = board.piece_at(mv.from);
        let color = get_piece_color(piece);

        // Castling may not start in check nor cross an attacked square
        let file_delta = mv.to.file() as i32 - mv.from.file() as i32;
        if get_piece_type(piece) == KING && file_delta.abs() == 2 {
            if self.is_in_check(board, color) {
                return false;
            }
            let Some(crossed) = mv.from.offset(file_delta.signum(), 0) else {
                return false;
            };
            let mut step_board = board.clone();
            step_board.apply_move(&Move::new(mv.from, crossed));
            if self.is_in_check(&step_board, color) {
                return false;
            }
        }

        let mut temp_board = board.clone();
        temp_board.apply_move(mv);
        !self.is_in_check(&temp_board, color)
    }
}

/// Count the leaf nodes of the legal move tree to `depth`
pub fn perft(generator: &MoveGenerator, board: &Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = generator.generate_legal_moves(board);
    if depth == 1 {
        return moves.len() as u64;
    }

    moves
        .iter()
        .map(|mv| {
            let mut next = board.clone();
            next.apply_move(mv);
            perft(generator, &next, depth - 1)
        })
        .sum()
}
