//! ArborChess - Error types
//!
//! Recoverable failures surfaced to callers. Invariant violations (such as
//! building a square outside the board) are panics, not variants here.

use crate::board::Move;
use crate::transport::SubmitStatus;

/// Errors that can occur while parsing positions, applying moves or searching
#[derive(Debug, thiserror::Error)]
pub enum ChessError {
    /// The position string could not be parsed
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    /// A square name such as "e4" could not be parsed
    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    /// A coordinate move string such as "e2e4" could not be parsed
    #[error("Invalid move notation: {0}")]
    InvalidMoveNotation(String),

    /// The move is not in the legal set of the current position
    #[error("Illegal move: {0}")]
    IllegalMove(Move),

    /// A best move was requested but the side to move has no legal moves
    #[error("Game is over")]
    GameOver,

    /// The remote game server refused a submitted move
    #[error("Move rejected by server: {0:?}")]
    Rejected(SubmitStatus),

    /// The remote game server could not be reached
    #[error("Transport failure: {0}")]
    Transport(String),
}

impl ChessError {
    pub(crate) fn invalid_fen(fen: &str, reason: impl Into<String>) -> Self {
        ChessError::InvalidFen {
            fen: fen.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for chess operations
pub type Result<T> = std::result::Result<T, ChessError>;
