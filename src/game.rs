//! ArborChess - Game Session
//!
//! Holds the authoritative position, the history of reached positions (for
//! threefold repetition) and the log of applied moves. Every move goes through
//! the legality check here before it reaches `Board::apply_move`.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::board::{Board, Move};
use crate::error::{ChessError, Result};
use crate::move_generator::MoveGenerator;
use crate::types::*;

/// How a finished game ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// `winner` is `WHITE` or `BLACK`
    Checkmate { winner: u8 },
    Stalemate,
    FiftyMoveRule,
    ThreefoldRepetition,
}

impl Outcome {
    pub fn is_draw(&self) -> bool {
        !matches!(self, Outcome::Checkmate { .. })
    }
}

/// A single game in progress
pub struct Game {
    board: Board,
    history: Vec<String>,
    moves: Vec<Move>,
    generator: MoveGenerator,
}

impl Game {
    /// Start a game from the standard initial position
    pub fn new() -> Self {
        Game::with_board(Board::new())
    }

    /// Start a game from a FEN position
    pub fn from_fen(fen: &str) -> Result<Self> {
        Ok(Game::with_board(Board::from_fen(fen)?))
    }

    pub fn with_board(board: Board) -> Self {
        Game {
            history: vec![board.position_key()],
            board,
            moves: Vec::new(),
            generator: MoveGenerator::new(),
        }
    }

    /// Use a specific generator, e.g. one sharing a legal-move cache
    pub fn with_generator(mut self, generator: MoveGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Position keys reached so far, oldest first, current position last
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Moves applied since the game started
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.generator.generate_legal_moves(&self.board)
    }

    pub fn is_legal(&self, mv: &Move) -> bool {
        self.legal_moves().contains(mv)
    }

    /// Apply a move after checking it against the legal set.
    ///
    /// An illegal move leaves the game untouched and returns
    /// `ChessError::IllegalMove`.
    pub fn apply_move(&mut self, mv: Move) -> Result<()> {
        if !self.is_legal(&mv) {
            warn!(mv = %mv, fen = %self.board.to_fen(), "rejected illegal move");
            return Err(ChessError::IllegalMove(mv));
        }

        self.board.apply_move(&mv);
        self.history.push(self.board.position_key());
        self.moves.push(mv);
        debug!(mv = %mv, fen = %self.board.to_fen(), "applied move");
        Ok(())
    }

    /// Parse coordinate notation ("e2e4", "e7e8Q") and apply it
    pub fn apply_notation(&mut self, notation: &str) -> Result<Move> {
        let mv: Move = notation.parse()?;
        self.apply_move(mv)?;
        Ok(mv)
    }

    /// Side to move is in check
    pub fn is_check(&self) -> bool {
        self.generator.in_check(&self.board)
    }

    pub fn is_checkmate(&self) -> bool {
        self.is_check() && self.legal_moves().is_empty()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.is_check() && self.legal_moves().is_empty()
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.board.is_fifty_moves()
    }

    /// How many times the current position has been reached
    pub fn repetition_count(&self) -> usize {
        let current = self.board.position_key();
        self.history.iter().filter(|key| **key == current).count()
    }

    pub fn is_threefold_repetition(&self) -> bool {
        self.repetition_count() >= 3
    }

    pub fn is_draw(&self) -> bool {
        self.is_stalemate() || self.is_fifty_move_draw() || self.is_threefold_repetition()
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome().is_some()
    }

    /// Result of the game, `None` while it is still running
    pub fn outcome(&self) -> Option<Outcome> {
        if self.legal_moves().is_empty() {
            return Some(if self.is_check() {
                Outcome::Checkmate {
                    winner: opposite(self.board.side_to_move()),
                }
            } else {
                Outcome::Stalemate
            });
        }
        if self.is_fifty_move_draw() {
            return Some(Outcome::FiftyMoveRule);
        }
        if self.is_threefold_repetition() {
            return Some(Outcome::ThreefoldRepetition);
        }
        None
    }

    /// Pick a uniformly random legal move, `None` if there is none
    pub fn random_legal_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Move> {
        self.legal_moves().choose(rng).copied()
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}
