//! ArborChess - Board Representation Module
//!
//! This module provides the position state: the 64-square mailbox, side to
//! move, castling rights, en passant target and move clocks. It includes FEN
//! parsing and generation and the single mutation path, `apply_move`.

use std::fmt;
use std::str::FromStr;

use crate::error::{ChessError, Result};
use crate::types::*;

/// Starting position FEN
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A chess move: origin, destination and an optional promotion piece type.
///
/// Moves carry no board reference; castling and en passant are recognised
/// from the geometry when the move is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<u8>,
}

impl Move {
    /// Create a new move
    pub fn new(from: Square, to: Square) -> Self {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    /// Create a promotion move
    pub fn with_promotion(from: Square, to: Square, promotion: u8) -> Self {
        Move {
            from,
            to,
            promotion: Some(promotion),
        }
    }

    /// Convert move to coordinate notation (e.g., "e2e4", "e7e8Q")
    pub fn to_notation(&self) -> String {
        let mut s = format!("{}{}", self.from, self.to);
        if let Some(c) = self.promotion.and_then(promotion_to_char) {
            s.push(c);
        }
        s
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_notation())
    }
}

impl FromStr for Move {
    type Err = ChessError;

    /// Parse "e2e4" or "e7e8Q" (promotion letter in either case)
    fn from_str(notation: &str) -> Result<Self> {
        let invalid = || ChessError::InvalidMoveNotation(notation.to_string());
        if !notation.is_ascii() || !(4..=5).contains(&notation.len()) {
            return Err(invalid());
        }

        let from: Square = notation[0..2].parse().map_err(|_| invalid())?;
        let to: Square = notation[2..4].parse().map_err(|_| invalid())?;

        match notation[4..].chars().next() {
            None => Ok(Move::new(from, to)),
            Some(c) => {
                let promotion = promotion_from_char(c).ok_or_else(invalid)?;
                Ok(Move::with_promotion(from, to, promotion))
            }
        }
    }
}

/// Chess board representation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    /// 64-element array representing the board (0=a1, 1=b1, ..., 63=h8)
    pub squares: [u8; 64],
    /// True if it's white's turn
    pub white_to_move: bool,
    /// Bitmask for castling rights (1=K, 2=Q, 4=k, 8=q)
    pub castling_rights: u8,
    /// Square a pawn of the side to move may capture into en passant
    pub en_passant: Option<Square>,
    /// Plies since last pawn move or capture (for 50-move rule)
    pub halfmove_clock: u32,
    /// Full move counter
    pub fullmove_number: u32,
}

impl Board {
    /// Create a new board with the starting position
    pub fn new() -> Self {
        Board::from_fen(STARTING_FEN).expect("starting FEN is well formed")
    }

    /// Create a board from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 || parts.len() > 6 {
            return Err(ChessError::invalid_fen(fen, "expected 4 to 6 fields"));
        }

        let mut board = Board {
            squares: [EMPTY; 64],
            white_to_move: true,
            castling_rights: 0,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        };

        // Parse piece placement
        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(ChessError::invalid_fen(fen, "expected 8 ranks"));
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i;
            let mut file = 0usize;
            for c in rank_str.chars() {
                if let Some(run) = c.to_digit(10).filter(|d| (1..=8).contains(d)) {
                    file += run as usize;
                } else if let Some(piece) = fen_to_piece(c) {
                    if file >= 8 {
                        return Err(ChessError::invalid_fen(fen, format!("rank {} overflows", rank + 1)));
                    }
                    board.squares[rank * 8 + file] = piece;
                    file += 1;
                } else {
                    return Err(ChessError::invalid_fen(fen, format!("unexpected character '{c}'")));
                }
            }
            if file != 8 {
                return Err(ChessError::invalid_fen(fen, format!("rank {} does not have 8 files", rank + 1)));
            }
        }

        for king in [WHITE_KING, BLACK_KING] {
            if board.squares.iter().filter(|&&p| p == king).count() != 1 {
                return Err(ChessError::invalid_fen(fen, "each side needs exactly one king"));
            }
        }

        // Parse active color
        board.white_to_move = match parts[1] {
            "w" => true,
            "b" => false,
            other => return Err(ChessError::invalid_fen(fen, format!("bad side to move '{other}'"))),
        };

        // Parse castling rights
        if parts[2] != "-" {
            for c in parts[2].chars() {
                board.castling_rights |= match c {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    _ => return Err(ChessError::invalid_fen(fen, format!("bad castling flag '{c}'"))),
                };
            }
        }

        // Parse en passant square
        if parts[3] != "-" {
            let sq: Square = parts[3]
                .parse()
                .map_err(|_| ChessError::invalid_fen(fen, "bad en passant square"))?;
            let (ep_rank, forward, victim) = if board.white_to_move {
                (5, 1, BLACK_PAWN)
            } else {
                (2, -1, WHITE_PAWN)
            };
            if sq.rank() != ep_rank {
                return Err(ChessError::invalid_fen(fen, "en passant square on the wrong rank"));
            }
            if board.piece_at(sq) != EMPTY {
                return Err(ChessError::invalid_fen(fen, "en passant square is occupied"));
            }
            if sq.offset(0, -forward).map(|behind| board.piece_at(behind)) != Some(victim) {
                return Err(ChessError::invalid_fen(fen, "no pawn to capture en passant"));
            }
            if sq.offset(0, forward).map(|origin| board.piece_at(origin)) != Some(EMPTY) {
                return Err(ChessError::invalid_fen(fen, "double push origin is occupied"));
            }
            board.en_passant = Some(sq);
        }

        // Parse halfmove clock and fullmove number
        if let Some(s) = parts.get(4) {
            board.halfmove_clock = s
                .parse()
                .map_err(|_| ChessError::invalid_fen(fen, "bad halfmove clock"))?;
        }
        if let Some(s) = parts.get(5) {
            board.fullmove_number = s
                .parse()
                .map_err(|_| ChessError::invalid_fen(fen, "bad fullmove number"))?;
        }

        Ok(board)
    }

    /// Generate FEN string from current board state.
    ///
    /// The en passant field is echoed as recorded, even when no pawn can use it.
    pub fn to_fen(&self) -> String {
        format!(
            "{} {} {}",
            self.fen_fields(self.en_passant),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// FEN without the two move counters: board, side, castling, en passant.
    ///
    /// Used as the legal-move cache key and for repetition detection. Only an
    /// en passant target that can actually be captured into is included.
    pub fn position_key(&self) -> String {
        self.fen_fields(self.effective_en_passant())
    }

    /// En passant target that a pawn of the side to move can capture into
    pub fn effective_en_passant(&self) -> Option<Square> {
        let target = self.en_passant?;
        let color = self.side_to_move();
        let forward = if color == WHITE { 1 } else { -1 };
        let victim = target.offset(0, -forward)?;
        if self.piece_at(victim) != (opposite(color) | PAWN) {
            return None;
        }

        let own_pawn = color | PAWN;
        [-1, 1]
            .iter()
            .filter_map(|&df| victim.offset(df, 0))
            .any(|sq| self.piece_at(sq) == own_pawn)
            .then_some(target)
    }

    fn fen_fields(&self, en_passant: Option<Square>) -> String {
        let mut fen = String::with_capacity(64);

        // Piece placement
        for rank in (0..8).rev() {
            let mut empty_count = 0;
            for file in 0..8 {
                let piece = self.squares[rank * 8 + file];
                match piece_to_fen(piece) {
                    None => empty_count += 1,
                    Some(c) => {
                        if empty_count > 0 {
                            fen.push_str(&empty_count.to_string());
                            empty_count = 0;
                        }
                        fen.push(c);
                    }
                }
            }
            if empty_count > 0 {
                fen.push_str(&empty_count.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        // Active color
        fen.push(' ');
        fen.push(if self.white_to_move { 'w' } else { 'b' });

        // Castling rights
        fen.push(' ');
        if self.castling_rights == 0 {
            fen.push('-');
        } else {
            if self.castling_rights & CASTLE_WK != 0 { fen.push('K'); }
            if self.castling_rights & CASTLE_WQ != 0 { fen.push('Q'); }
            if self.castling_rights & CASTLE_BK != 0 { fen.push('k'); }
            if self.castling_rights & CASTLE_BQ != 0 { fen.push('q'); }
        }

        // En passant
        fen.push(' ');
        match en_passant {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }

        fen
    }

    /// Colour whose turn it is
    #[inline]
    pub fn side_to_move(&self) -> u8 {
        if self.white_to_move { WHITE } else { BLACK }
    }

    /// Piece on a square
    #[inline]
    pub fn piece_at(&self, sq: Square) -> u8 {
        self.squares[sq.index()]
    }

    /// Piece at raw coordinates. Coordinates off the board are a programming
    /// error and abort.
    pub fn piece_at_coords(&self, file: i32, rank: i32) -> u8 {
        match Square::try_new(file, rank) {
            Some(sq) => self.piece_at(sq),
            None => panic!("board access out of bounds: file {file}, rank {rank}"),
        }
    }

    /// Find the king's square for the specified color
    pub fn find_king(&self, color: u8) -> Option<Square> {
        let king = color | KING;
        self.squares
            .iter()
            .position(|&p| p == king)
            .map(Square::from_index)
    }

    /// Whether a castling flag is still set
    #[inline]
    pub fn can_castle(&self, flag: u8) -> bool {
        self.castling_rights & flag != 0
    }

    /// Execute a move on the board.
    ///
    /// The move must come from the legal set of this position; no legality
    /// check happens here.
    pub fn apply_move(&mut self, mv: &Move) {
        let from = mv.from;
        let to = mv.to;
        let piece = self.squares[from.index()];
        let captured = self.squares[to.index()];
        let color = get_piece_color(piece);
        let piece_type = get_piece_type(piece);
        let forward: i32 = if color == WHITE { 1 } else { -1 };
        let ep_target = self.effective_en_passant();

        // Update halfmove clock
        if piece_type == PAWN || captured != EMPTY {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }

        // Handle en passant capture: the captured pawn sits behind the target
        if piece_type == PAWN && Some(to) == ep_target && captured == EMPTY {
            if let Some(victim) = to.offset(0, -forward) {
                self.squares[victim.index()] = EMPTY;
            }
        }

        // Update en passant square; only recorded if an enemy pawn can use it
        self.en_passant = None;
        if piece_type == PAWN && (to.rank() as i32 - from.rank() as i32).abs() == 2 {
            let enemy_pawn = opposite(color) | PAWN;
            let adjacent_enemy = [-1, 1]
                .iter()
                .filter_map(|&df| to.offset(df, 0))
                .any(|sq| self.squares[sq.index()] == enemy_pawn);
            if adjacent_enemy {
                self.en_passant = from.offset(0, forward);
            }
        }

        // Move the piece, handling promotion
        self.squares[to.index()] = match mv.promotion {
            Some(promo) => color | promo,
            None => piece,
        };

        // Handle castling
        if piece_type == KING && (to.file() as i32 - from.file() as i32).abs() == 2 {
            match (from.index(), to.index()) {
                (4, 6) => {   // White kingside (g1)
                    self.squares[7] = EMPTY;
                    self.squares[5] = WHITE_ROOK;
                }
                (4, 2) => {   // White queenside (c1)
                    self.squares[0] = EMPTY;
                    self.squares[3] = WHITE_ROOK;
                }
                (60, 62) => { // Black kingside (g8)
                    self.squares[63] = EMPTY;
                    self.squares[61] = BLACK_ROOK;
                }
                (60, 58) => { // Black queenside (c8)
                    self.squares[56] = EMPTY;
                    self.squares[59] = BLACK_ROOK;
                }
                _ => {}
            }
        }

        self.squares[from.index()] = EMPTY;

        // Update castling rights
        if piece_type == KING {
            self.castling_rights &= !castle_flags(color);
        }

        // If rook moves or is captured
        let (from_sq, to_sq) = (from.index(), to.index());
        if from_sq == 0 || to_sq == 0 { self.castling_rights &= !CASTLE_WQ; }
        if from_sq == 7 || to_sq == 7 { self.castling_rights &= !CASTLE_WK; }
        if from_sq == 56 || to_sq == 56 { self.castling_rights &= !CASTLE_BQ; }
        if from_sq == 63 || to_sq == 63 { self.castling_rights &= !CASTLE_BK; }

        // Update fullmove number
        if !self.white_to_move {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        // Switch side to move
        self.white_to_move = !self.white_to_move;
    }

    /// Check if 50-move rule applies (draw)
    pub fn is_fifty_moves(&self) -> bool {
        self.halfmove_clock >= 100
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl FromStr for Board {
    type Err = ChessError;

    fn from_str(fen: &str) -> Result<Self> {
        Board::from_fen(fen)
    }
}
