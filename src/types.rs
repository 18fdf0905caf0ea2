//! ArborChess - Type definitions and constants
//!
//! This module provides the piece and colour tags stored on the board,
//! castling flags, and the `Square` coordinate used by moves and generators.

use std::fmt;
use std::str::FromStr;

use crate::error::ChessError;

/// Piece type constants (lower 3 bits)
pub const EMPTY: u8 = 0;
pub const PAWN: u8 = 1;
pub const KNIGHT: u8 = 2;
pub const BISHOP: u8 = 3;
pub const ROOK: u8 = 4;
pub const QUEEN: u8 = 5;
pub const KING: u8 = 6;

/// Color constants (bits 3-4)
pub const WHITE: u8 = 8;
pub const BLACK: u8 = 16;

/// Piece masks
pub const PIECE_MASK: u8 = 0b111;
pub const COLOR_MASK: u8 = 0b11000;

pub const WHITE_PAWN: u8 = WHITE | PAWN;
pub const WHITE_KNIGHT: u8 = WHITE | KNIGHT;
pub const WHITE_BISHOP: u8 = WHITE | BISHOP;
pub const WHITE_ROOK: u8 = WHITE | ROOK;
pub const WHITE_QUEEN: u8 = WHITE | QUEEN;
pub const WHITE_KING: u8 = WHITE | KING;

pub const BLACK_PAWN: u8 = BLACK | PAWN;
pub const BLACK_KNIGHT: u8 = BLACK | KNIGHT;
pub const BLACK_BISHOP: u8 = BLACK | BISHOP;
pub const BLACK_ROOK: u8 = BLACK | ROOK;
pub const BLACK_QUEEN: u8 = BLACK | QUEEN;
pub const BLACK_KING: u8 = BLACK | KING;

/// Promotion choices, in generation order
pub const PROMOTION_PIECES: [u8; 4] = [QUEEN, ROOK, BISHOP, KNIGHT];

/// Castling rights bitmasks
pub const CASTLE_WK: u8 = 1; // White kingside
pub const CASTLE_WQ: u8 = 2; // White queenside
pub const CASTLE_BK: u8 = 4; // Black kingside
pub const CASTLE_BQ: u8 = 8; // Black queenside

/// File and rank names for coordinate notation
pub const FILE_NAMES: &[u8; 8] = b"abcdefgh";
pub const RANK_NAMES: &[u8; 8] = b"12345678";

/// Extract piece type from piece value
#[inline]
pub fn get_piece_type(piece: u8) -> u8 {
    piece & PIECE_MASK
}

/// Extract color from piece value
#[inline]
pub fn get_piece_color(piece: u8) -> u8 {
    piece & COLOR_MASK
}

/// The other side
#[inline]
pub fn opposite(color: u8) -> u8 {
    if color == WHITE {
        BLACK
    } else {
        WHITE
    }
}

/// Both castling flags belonging to `color`
#[inline]
pub fn castle_flags(color: u8) -> u8 {
    if color == WHITE {
        CASTLE_WK | CASTLE_WQ
    } else {
        CASTLE_BK | CASTLE_BQ
    }
}

/// A board coordinate: file (a..h) and rank (1..8), both zero based.
///
/// The constructor enforces the 0..=7 range; an out-of-range coordinate is a
/// programming error and panics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    pub fn new(file: u8, rank: u8) -> Self {
        assert!(
            file < 8 && rank < 8,
            "square out of bounds: file {file}, rank {rank}"
        );
        Square { file, rank }
    }

    /// Build a square from signed coordinates, `None` when off the board
    pub fn try_new(file: i32, rank: i32) -> Option<Self> {
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square {
                file: file as u8,
                rank: rank as u8,
            })
        } else {
            None
        }
    }

    /// Square from a 0..64 board index (a1 = 0, h8 = 63)
    pub fn from_index(index: usize) -> Self {
        assert!(index < 64, "square index out of bounds: {index}");
        Square::new((index % 8) as u8, (index / 8) as u8)
    }

    #[inline]
    pub fn file(self) -> u8 {
        self.file
    }

    #[inline]
    pub fn rank(self) -> u8 {
        self.rank
    }

    #[inline]
    pub fn index(self) -> usize {
        self.rank as usize * 8 + self.file as usize
    }

    /// Step by a file/rank delta; off-board destinations yield `None`
    #[inline]
    pub fn offset(self, file_delta: i32, rank_delta: i32) -> Option<Self> {
        Square::try_new(self.file as i32 + file_delta, self.rank as i32 + rank_delta)
    }

    /// Iterate over all 64 squares, a1 first
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square::from_index)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            FILE_NAMES[self.file as usize] as char,
            RANK_NAMES[self.rank as usize] as char
        )
    }
}

impl FromStr for Square {
    type Err = ChessError;

    /// Parse algebraic notation such as "e4"
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let bytes = name.as_bytes();
        if bytes.len() != 2 {
            return Err(ChessError::InvalidSquare(name.to_string()));
        }

        let file = match bytes[0] {
            b'a'..=b'h' => bytes[0] - b'a',
            _ => return Err(ChessError::InvalidSquare(name.to_string())),
        };
        let rank = match bytes[1] {
            b'1'..=b'8' => bytes[1] - b'1',
            _ => return Err(ChessError::InvalidSquare(name.to_string())),
        };

        Ok(Square::new(file, rank))
    }
}

/// FEN piece character to piece value
pub fn fen_to_piece(c: char) -> Option<u8> {
    match c {
        'P' => Some(WHITE_PAWN),
        'N' => Some(WHITE_KNIGHT),
        'B' => Some(WHITE_BISHOP),
        'R' => Some(WHITE_ROOK),
        'Q' => Some(WHITE_QUEEN),
        'K' => Some(WHITE_KING),
        'p' => Some(BLACK_PAWN),
        'n' => Some(BLACK_KNIGHT),
        'b' => Some(BLACK_BISHOP),
        'r' => Some(BLACK_ROOK),
        'q' => Some(BLACK_QUEEN),
        'k' => Some(BLACK_KING),
        _ => None,
    }
}

/// Piece value to FEN character
pub fn piece_to_fen(piece: u8) -> Option<char> {
    match piece {
        WHITE_PAWN => Some('P'),
        WHITE_KNIGHT => Some('N'),
        WHITE_BISHOP => Some('B'),
        WHITE_ROOK => Some('R'),
        WHITE_QUEEN => Some('Q'),
        WHITE_KING => Some('K'),
        BLACK_PAWN => Some('p'),
        BLACK_KNIGHT => Some('n'),
        BLACK_BISHOP => Some('b'),
        BLACK_ROOK => Some('r'),
        BLACK_QUEEN => Some('q'),
        BLACK_KING => Some('k'),
        _ => None,
    }
}

/// Promotion letter (either case) to piece type
pub fn promotion_from_char(c: char) -> Option<u8> {
    match c.to_ascii_uppercase() {
        'Q' => Some(QUEEN),
        'R' => Some(ROOK),
        'B' => Some(BISHOP),
        'N' => Some(KNIGHT),
        _ => None,
    }
}

/// Piece type to upper-case promotion letter
pub fn promotion_to_char(piece_type: u8) -> Option<char> {
    match piece_type {
        QUEEN => Some('Q'),
        ROOK => Some('R'),
        BISHOP => Some('B'),
        KNIGHT => Some('N'),
        _ => None,
    }
}
