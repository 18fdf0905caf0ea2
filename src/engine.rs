//! ArborChess - Engine
//!
//! Ties a game session to the tree search. The engine owns the live game, a
//! legal-move cache shared by every search thread and the tree of the most
//! recent search, which is discarded whenever the game position changes.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::board::Move;
use crate::cache::{CacheStats, MoveCache};
use crate::config::SearchConfig;
use crate::error::{ChessError, Result};
use crate::game::Game;
use crate::move_generator::MoveGenerator;
use crate::parallel_search::search_parallel;
use crate::search::{SearchTree, ROOT};
use crate::transport::{MoveTransport, SubmitStatus};

/// Outcome of a best-move search
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Move,
    /// Score for the side to move, in pawns; mates are near `MATE_SCORE`
    pub score: i32,
    /// Plies to a forced mate, odd when the side to move delivers it
    pub mate_in: Option<u32>,
    /// Nodes evaluated
    pub nodes: u64,
}

/// Search engine bound to one game
pub struct Engine {
    game: Game,
    config: SearchConfig,
    cache: Arc<MoveCache>,
    generator: MoveGenerator,
    tree: SearchTree,
}

impl Engine {
    pub fn new(game: Game, config: SearchConfig) -> Self {
        Engine::with_cache(game, config, Arc::new(MoveCache::new()))
    }

    /// Build an engine around an existing cache, e.g. one shared across games
    pub fn with_cache(game: Game, config: SearchConfig, cache: Arc<MoveCache>) -> Self {
        let generator = if config.use_cache {
            MoveGenerator::with_cache(Arc::clone(&cache))
        } else {
            MoveGenerator::new()
        };
        let game = game.with_generator(generator.clone());
        let tree = SearchTree::new(game.board().clone());

        Engine {
            game,
            config,
            cache,
            generator,
            tree,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Tree built by the last search
    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Apply a move to the live game; the search tree is reset
    pub fn apply_move(&mut self, mv: Move) -> Result<()> {
        self.game.apply_move(mv)?;
        self.tree = SearchTree::new(self.game.board().clone());
        Ok(())
    }

    /// Search the current position and return the best move.
    ///
    /// Fails with `ChessError::GameOver` when the side to move has no legal
    /// moves.
    pub fn best_move(&mut self) -> Result<SearchResult> {
        if self.game.legal_moves().is_empty() {
            return Err(ChessError::GameOver);
        }

        let depth = self.config.search_depth();
        let threads = self.config.worker_threads();
        let started = Instant::now();
        debug!(fen = %self.game.board().to_fen(), depth, threads, "search started");

        let mut tree = SearchTree::new(self.game.board().clone());
        let nodes = search_parallel(&mut tree, &self.generator, self.config.pruning, depth, threads);
        self.tree = tree;

        let root = self.tree.root();
        let best_child = root.best_child.ok_or(ChessError::GameOver)?;
        let best_move = self.tree.node(best_child).mv.ok_or(ChessError::GameOver)?;

        let result = SearchResult {
            best_move,
            score: root.score,
            mate_in: root.mate_in,
            nodes,
        };

        let stats = self.cache.stats();
        info!(
            best = %result.best_move,
            score = result.score,
            mate_in = ?result.mate_in,
            nodes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            cache_hits = stats.hits,
            cache_misses = stats.misses,
            "search finished"
        );
        Ok(result)
    }

    /// Expected line of play from the last search, starting with our move
    pub fn principal_line(&self) -> Vec<Move> {
        self.tree.line(ROOT)
    }

    /// Search, submit the move to the server and apply it once accepted
    pub fn play_turn<T: MoveTransport>(&mut self, transport: &mut T) -> Result<SearchResult> {
        let result = self.best_move()?;
        match transport.submit_move(&result.best_move)? {
            SubmitStatus::Ok => {
                self.apply_move(result.best_move)?;
                Ok(result)
            }
            status => {
                warn!(mv = %result.best_move, ?status, "server rejected move");
                Err(ChessError::Rejected(status))
            }
        }
    }

    /// Wait for the opponent's move and apply it
    pub fn receive_move<T: MoveTransport>(&mut self, transport: &mut T) -> Result<Move> {
        let mv = transport.receive_move()?;
        self.apply_move(mv)?;
        Ok(mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_move_resets_tree() {
        let mut engine = Engine::new(Game::new(), SearchConfig::default().with_depth(2));
        engine.best_move().unwrap();
        assert!(engine.tree().len() > 1);

        engine.apply_move("e2e4".parse().unwrap()).unwrap();
        assert_eq!(engine.tree().len(), 1);
        assert_eq!(engine.tree().root_board(), engine.game().board());
    }

    #[test]
    fn cache_disabled_leaves_cache_empty() {
        let config = SearchConfig::default().with_depth(2).with_cache(false);
        let mut engine = Engine::new(Game::new(), config);
        engine.best_move().unwrap();
        assert_eq!(engine.cache_stats(), CacheStats::default());
    }

    #[test]
    fn shared_cache_is_used() {
        let cache = Arc::new(MoveCache::new());
        let config = SearchConfig::default().with_depth(2);
        let mut engine = Engine::with_cache(Game::new(), config, Arc::clone(&cache));
        engine.best_move().unwrap();
        assert!(!cache.is_empty());
        assert_eq!(engine.cache_stats(), cache.stats());
    }
}
