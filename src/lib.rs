//! ArborChess - Chess Position and Tree Search Engine
//!
//! A chess engine library with support for:
//! - Full FIDE move rules (castling, en passant, promotion)
//! - Checkmate, stalemate, fifty-move and threefold repetition detection
//! - Negamax search with alpha-beta pruning over an explicit game tree
//! - Root-split parallel search on a worker pool
//! - A shared legal-move cache keyed by position

pub mod types;
pub mod error;
pub mod board;
pub mod cache;
pub mod move_generator;
pub mod evaluation;
pub mod game;
pub mod search;
pub mod parallel_search;
pub mod config;
pub mod transport;
pub mod engine;

pub use board::{Board, Move, STARTING_FEN};
pub use cache::{CacheStats, MoveCache};
pub use config::SearchConfig;
pub use engine::{Engine, SearchResult};
pub use error::{ChessError, Result};
pub use evaluation::{evaluate, MATE_SCORE};
pub use game::{Game, Outcome};
pub use move_generator::{perft, MoveGenerator};
pub use search::{NodeId, NodeState, SearchTree, Searcher};
pub use transport::{MoveTransport, SubmitStatus};
pub use types::Square;
