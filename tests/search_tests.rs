//! Tests for the tree search and the engine
//!
//! This module tests:
//! - Best move selection and scores
//! - Alpha-beta agreeing with plain negamax
//! - Parallel search agreeing with serial search
//! - Mate detection and mate distance
//! - Playing against a remote server

use std::collections::VecDeque;

use arbor_chess::search::ROOT;
use arbor_chess::{
    evaluate, Board, ChessError, Engine, Game, Move, MoveGenerator, MoveTransport, Result,
    SearchConfig, SearchResult, SubmitStatus, MATE_SCORE, STARTING_FEN,
};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const MATE_IN_ONE: &str = "6k1/5ppp/8/8/8/8/1R6/K7 w - - 0 1";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn mv(notation: &str) -> Move {
    notation.parse().unwrap()
}

fn search(fen: &str, config: SearchConfig) -> SearchResult {
    init_tracing();
    let mut engine = Engine::new(Game::from_fen(fen).unwrap(), config);
    engine.best_move().unwrap()
}

// =============================================================================
// Best Move Tests
// =============================================================================

#[test]
fn test_depth_one_takes_free_queen() {
    let fen = "4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1";
    let result = search(fen, SearchConfig::default().with_depth(1));
    assert_eq!(result.best_move, mv("e4d5"));

    let mut after = Board::from_fen(fen).unwrap();
    after.apply_move(&result.best_move);
    assert_eq!(result.score, -evaluate(&after, &MoveGenerator::new()));
    assert_eq!(result.score, 1);
    assert_eq!(result.mate_in, None);
}

#[test]
fn test_best_move_is_legal_from_start() {
    let result = search(STARTING_FEN, SearchConfig::default().with_depth(3));
    assert!(Game::new().is_legal(&result.best_move));
    assert_eq!(result.score, 0, "no material can be won by force in 3 plies");
    assert!(result.nodes > 20);
}

// =============================================================================
// Pruning Tests
// =============================================================================

fn assert_pruning_agrees(fen: &str, depth: u32) {
    let config = SearchConfig::default().with_depth(depth);
    let pruned = search(fen, config);
    let full = search(fen, config.with_pruning(false));

    assert_eq!(pruned.best_move, full.best_move, "best move differs for {fen}");
    assert_eq!(pruned.score, full.score, "score differs for {fen}");
    assert_eq!(pruned.mate_in, full.mate_in);
    assert!(
        pruned.nodes <= full.nodes,
        "alpha-beta visited more nodes than negamax for {fen}"
    );
}

#[test]
fn test_pruning_matches_negamax_from_start() {
    assert_pruning_agrees(STARTING_FEN, 3);
}

#[test]
fn test_pruning_matches_negamax_kiwipete() {
    assert_pruning_agrees(KIWIPETE, 2);
}

#[test]
fn test_pruning_matches_negamax_endgames() {
    assert_pruning_agrees("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 3);
    assert_pruning_agrees("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1", 3);
    assert_pruning_agrees(MATE_IN_ONE, 3);
}

// =============================================================================
// Parallel Search Tests
// =============================================================================

#[test]
fn test_parallel_matches_serial() {
    for (fen, depth) in [(STARTING_FEN, 3), (KIWIPETE, 2), (MATE_IN_ONE, 3)] {
        let config = SearchConfig::default().with_depth(depth);
        let serial = search(fen, config);
        let parallel = search(fen, config.with_threads(4));

        assert_eq!(parallel.best_move, serial.best_move, "best move differs for {fen}");
        assert_eq!(parallel.score, serial.score, "score differs for {fen}");
        assert_eq!(parallel.mate_in, serial.mate_in);
    }
}

#[test]
fn test_parallel_without_pruning_matches_serial() {
    let config = SearchConfig::default().with_depth(2).with_pruning(false);
    let serial = search(KIWIPETE, config);
    let parallel = search(KIWIPETE, config.with_threads(3));
    assert_eq!(parallel, SearchResult { nodes: parallel.nodes, ..serial });
    assert_eq!(parallel.nodes, serial.nodes, "unpruned searches visit the same tree");
}

#[test]
fn test_parallel_search_uses_shared_cache() {
    init_tracing();
    let config = SearchConfig::default().with_depth(3).with_threads(4);
    let mut engine = Engine::new(Game::new(), config);
    engine.best_move().unwrap();

    let stats = engine.cache_stats();
    assert!(stats.hits > 0, "transpositions should hit the cache");
    assert!(stats.entries > 0);
    assert!(stats.hit_rate() > 0.0);
}

// =============================================================================
// Mate Tests
// =============================================================================

#[test]
fn test_finds_back_rank_mate() {
    for depth in [1, 2, 3] {
        let result = search(MATE_IN_ONE, SearchConfig::default().with_depth(depth));
        assert_eq!(result.best_move, mv("b2b8"), "depth {depth}");
        assert_eq!(result.mate_in, Some(1), "depth {depth}");
        assert_eq!(result.score, MATE_SCORE - 1, "depth {depth}");
    }
}

#[test]
fn test_prefers_shorter_mate() {
    // Rh1 mates at once; rook moves up the a-file force Kh7 and mate on the h-file
    let fen = "7k/5K2/8/8/8/8/8/R7 w - - 0 1";
    init_tracing();
    let config = SearchConfig::default().with_depth(3).with_pruning(false);
    let mut engine = Engine::new(Game::from_fen(fen).unwrap(), config);
    let result = engine.best_move().unwrap();

    assert_eq!(result.best_move, mv("a1h1"));
    assert_eq!(result.mate_in, Some(1));
    assert_eq!(result.score, MATE_SCORE - 1);

    let tree = engine.tree();
    let slower = tree
        .root()
        .children
        .iter()
        .copied()
        .find(|&child| tree.node(child).mv == Some(mv("a1a2")))
        .unwrap();
    assert_eq!(tree.node(slower).mate_in, Some(2), "Ra2 Kh7 Rh2 is mate in two moves");
    assert_eq!(-tree.node(slower).score, MATE_SCORE - 3);
    assert_eq!(tree.line(slower), vec![mv("h8h7"), mv("a2h2")]);

    let pruned = search(fen, config.with_pruning(true));
    assert_eq!(pruned, SearchResult { nodes: pruned.nodes, ..result });
}

#[test]
fn test_losing_side_delays_mate() {
    // Kb8 is forced and Rh8 mates
    let fen = "k7/8/1K6/8/8/8/8/7R b - - 0 1";
    let config = SearchConfig::default().with_depth(3);
    for config in [config, config.with_pruning(false), config.with_threads(3)] {
        let result = search(fen, config);
        assert_eq!(result.best_move, mv("a8b8"), "{config:?}");
        assert_eq!(result.mate_in, Some(2), "{config:?}");
        assert_eq!(result.score, -(MATE_SCORE - 2), "{config:?}");
    }

    let result = search(fen, SearchConfig::default().with_depth(4));
    assert_eq!(result.mate_in, Some(2));
    assert_eq!(result.score, -(MATE_SCORE - 2));
}

#[test]
fn test_black_finds_mate() {
    let result = search("7r/8/8/8/8/1k6/8/K7 b - - 0 1", SearchConfig::default().with_depth(2));
    assert_eq!(result.best_move, mv("h8h1"));
    assert_eq!(result.mate_in, Some(1));
}

#[test]
fn test_no_move_when_checkmated() {
    let mut engine = Engine::new(
        Game::from_fen("6k1/6PP/6K1/8/8/8/8/8 b - - 0 1").unwrap(),
        SearchConfig::default(),
    );
    assert!(matches!(engine.best_move(), Err(ChessError::GameOver)));
}

#[test]
fn test_no_move_when_stalemated() {
    let mut engine = Engine::new(
        Game::from_fen("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1").unwrap(),
        SearchConfig::default().with_threads(2),
    );
    assert!(matches!(engine.best_move(), Err(ChessError::GameOver)));
}

#[test]
fn test_principal_line_follows_best_moves() {
    init_tracing();
    let mut engine = Engine::new(Game::from_fen(KIWIPETE).unwrap(), SearchConfig::default().with_depth(3));
    let result = engine.best_move().unwrap();
    let line = engine.principal_line();

    assert_eq!(line.len(), 3);
    assert_eq!(line[0], result.best_move);

    let mut game = Game::from_fen(&engine.game().board().to_fen()).unwrap();
    for m in line {
        game.apply_move(m).unwrap();
    }
    assert_eq!(engine.tree().root().children.len(), 48);
    assert_eq!(engine.tree().line(ROOT).len(), 3);
}

// =============================================================================
// Remote Play Tests
// =============================================================================

/// Server stand-in answering from a script
#[derive(Default)]
struct ScriptedServer {
    verdicts: VecDeque<SubmitStatus>,
    incoming: VecDeque<Move>,
    submitted: Vec<Move>,
}

impl MoveTransport for ScriptedServer {
    fn submit_move(&mut self, mv: &Move) -> Result<SubmitStatus> {
        self.submitted.push(*mv);
        self.verdicts
            .pop_front()
            .ok_or_else(|| ChessError::Transport("no verdict scripted".to_string()))
    }

    fn receive_move(&mut self) -> Result<Move> {
        self.incoming
            .pop_front()
            .ok_or_else(|| ChessError::Transport("connection closed".to_string()))
    }
}

#[test]
fn test_play_turn_applies_accepted_move() {
    init_tracing();
    let mut engine = Engine::new(Game::from_fen(MATE_IN_ONE).unwrap(), SearchConfig::default().with_depth(2));
    let mut server = ScriptedServer {
        verdicts: VecDeque::from([SubmitStatus::Ok]),
        ..Default::default()
    };

    let result = engine.play_turn(&mut server).unwrap();
    assert_eq!(server.submitted, vec![mv("b2b8")]);
    assert_eq!(result.best_move, mv("b2b8"));
    assert_eq!(engine.game().moves(), &[mv("b2b8")]);
    assert!(engine.game().is_checkmate());
}

#[test]
fn test_play_turn_keeps_position_when_rejected() {
    let mut engine = Engine::new(Game::new(), SearchConfig::default().with_depth(1));
    let mut server = ScriptedServer {
        verdicts: VecDeque::from([SubmitStatus::NotYourTurn]),
        ..Default::default()
    };

    let err = engine.play_turn(&mut server).unwrap_err();
    assert!(matches!(err, ChessError::Rejected(SubmitStatus::NotYourTurn)));
    assert_eq!(server.submitted.len(), 1);
    assert!(engine.game().moves().is_empty());
    assert_eq!(engine.game().board(), &Board::new());
}

#[test]
fn test_play_turn_on_finished_game_submits_nothing() {
    let mut engine = Engine::new(
        Game::from_fen("6k1/6PP/6K1/8/8/8/8/8 b - - 0 1").unwrap(),
        SearchConfig::default(),
    );
    let mut server = ScriptedServer::default();
    assert!(matches!(engine.play_turn(&mut server), Err(ChessError::GameOver)));
    assert!(server.submitted.is_empty());
}

#[test]
fn test_receive_move_applies_opponent_move() {
    let mut engine = Engine::new(Game::new(), SearchConfig::default().with_depth(1));
    let mut server = ScriptedServer {
        incoming: VecDeque::from([mv("e2e4"), mv("e2e4")]),
        ..Default::default()
    };

    assert_eq!(engine.receive_move(&mut server).unwrap(), mv("e2e4"));
    assert!(!engine.game().board().white_to_move);

    // Same move again is illegal for black
    assert!(matches!(
        engine.receive_move(&mut server),
        Err(ChessError::IllegalMove(_))
    ));
    assert!(matches!(
        engine.receive_move(&mut server),
        Err(ChessError::Transport(_))
    ));
    assert_eq!(engine.game().moves().len(), 1);
}
