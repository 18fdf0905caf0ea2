//! ArborChess - Search Engine Module
//!
//! This module implements the tree-building search:
//! - An arena of nodes addressed by `NodeId`, each holding a parent handle
//!   and the handles of the children it owns
//! - Negamax with alpha-beta pruning over that tree
//! - Mate-distance bookkeeping
//!
//! A node's position is rebuilt by replaying the moves on the path from the
//! tree root, whose board mirrors the live game position.

use tracing::trace;

use crate::board::{Board, Move};
use crate::evaluation::{material, terminal_score, MATE_SCORE};
use crate::move_generator::MoveGenerator;

/// Bound wider than any reachable score
pub const INFINITY: i32 = 100_000;

/// Handle of a node inside a [`SearchTree`]
pub type NodeId = usize;

/// The root always lives at index 0
pub const ROOT: NodeId = 0;

/// Expansion state of a tree node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    Unexpanded,
    /// Reached the depth limit; holds a static score
    Leaf,
    /// Expanded; holds a best child and a backed-up score
    Internal,
    /// Checkmate, stalemate or fifty-move draw; never expanded
    Terminal,
}

/// One position in the search tree
#[derive(Clone, Debug)]
pub struct Node {
    /// Move that produced this node, `None` for the root
    pub mv: Option<Move>,
    pub white_to_move: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Score from the perspective of the side to move at this node
    pub score: i32,
    pub best_child: Option<NodeId>,
    /// Plies to a forced mate; even when the side to move gets mated
    pub mate_in: Option<u32>,
    pub state: NodeState,
}

impl Node {
    fn new(mv: Option<Move>, white_to_move: bool, parent: Option<NodeId>) -> Self {
        Node {
            mv,
            white_to_move,
            parent,
            children: Vec::new(),
            score: 0,
            best_child: None,
            mate_in: None,
            state: NodeState::Unexpanded,
        }
    }
}

/// Arena-backed game tree rooted at a fixed position
#[derive(Clone, Debug)]
pub struct SearchTree {
    root_board: Board,
    nodes: Vec<Node>,
}

impl SearchTree {
    pub fn new(root_board: Board) -> Self {
        SearchTree::rooted(root_board, None)
    }

    /// Tree whose root stands for a position reached by `mv` elsewhere.
    /// The root's move is informational and never replayed.
    pub(crate) fn rooted(root_board: Board, mv: Option<Move>) -> Self {
        let root = Node::new(mv, root_board.white_to_move, None);
        SearchTree {
            root_board,
            nodes: vec![root],
        }
    }

    pub fn root_board(&self) -> &Board {
        &self.root_board
    }

    pub fn root(&self) -> &Node {
        &self.nodes[ROOT]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a child reached by `mv` under `parent`
    pub fn add_child(&mut self, parent: NodeId, mv: Move) -> NodeId {
        let id = self.nodes.len();
        let white_to_move = !self.nodes[parent].white_to_move;
        self.nodes.push(Node::new(Some(mv), white_to_move, Some(parent)));
        self.nodes[parent].children.push(id);
        id
    }

    /// Moves from the root down to `id`
    pub fn path(&self, id: NodeId) -> Vec<Move> {
        let mut moves = Vec::new();
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            if let Some(mv) = self.nodes[current].mv {
                moves.push(mv);
            }
            current = parent;
        }
        moves.reverse();
        moves
    }

    /// Rebuild the position at `id` by replaying its path from the root
    pub fn board_at(&self, id: NodeId) -> Board {
        let mut board = self.root_board.clone();
        for mv in self.path(id) {
            board.apply_move(&mv);
        }
        board
    }

    /// Principal line below `id`, following best children
    pub fn line(&self, id: NodeId) -> Vec<Move> {
        let mut moves = Vec::new();
        let mut current = id;
        while let Some(best) = self.nodes[current].best_child {
            if let Some(mv) = self.nodes[best].mv {
                moves.push(mv);
            }
            current = best;
        }
        moves
    }

    /// Move a subtree searched elsewhere into this arena.
    ///
    /// The subtree's root takes the place of node `at`; its descendants are
    /// appended with their handles remapped.
    pub(crate) fn graft(&mut self, at: NodeId, subtree: SearchTree) {
        let base = self.nodes.len();
        let map = |id: NodeId| if id == ROOT { at } else { base + id - 1 };

        let mut nodes = subtree.nodes.into_iter();
        let Some(root) = nodes.next() else {
            return;
        };

        for mut node in nodes {
            node.parent = node.parent.map(map);
            node.children.iter_mut().for_each(|c| *c = map(*c));
            node.best_child = node.best_child.map(map);
            self.nodes.push(node);
        }

        let target = &mut self.nodes[at];
        target.children = root.children.into_iter().map(map).collect();
        target.best_child = root.best_child.map(map);
        target.score = root.score;
        target.mate_in = root.mate_in;
        target.state = root.state;
    }
}

/// Negamax / alpha-beta evaluator over a [`SearchTree`]
pub struct Searcher<'a> {
    generator: &'a MoveGenerator,
    pruning: bool,
    nodes_searched: u64,
}

impl<'a> Searcher<'a> {
    pub fn new(generator: &'a MoveGenerator, pruning: bool) -> Self {
        Searcher {
            generator,
            pruning,
            nodes_searched: 0,
        }
    }

    pub fn nodes_searched(&self) -> u64 {
        self.nodes_searched
    }

    /// Evaluate node `id` to `depth` plies within the `(alpha, beta)` window.
    ///
    /// `ply` is the node's distance from the real game position and offsets
    /// mate scores. Returns the node's score from its own side to move. When
    /// pruning cuts off the remaining siblings the score is only a bound.
    pub fn evaluate_node(
        &mut self,
        tree: &mut SearchTree,
        id: NodeId,
        mut alpha: i32,
        beta: i32,
        depth: u32,
        ply: i32,
    ) -> i32 {
        self.nodes_searched += 1;
        let board = tree.board_at(id);
        let moves = self.generator.generate_legal_moves(&board);

        // Checkmate / Stalemate
        if moves.is_empty() {
            let in_check = self.generator.in_check(&board);
            let score = if in_check { terminal_score(true) + ply } else { 0 };
            let node = tree.node_mut(id);
            node.score = score;
            node.mate_in = in_check.then_some(0);
            node.best_child = None;
            node.state = NodeState::Terminal;
            return score;
        }

        // Fifty-move draw below the root; at the root a move is still wanted
        if ply > 0 && board.is_fifty_moves() {
            let node = tree.node_mut(id);
            node.score = 0;
            node.mate_in = None;
            node.best_child = None;
            node.state = NodeState::Terminal;
            return 0;
        }

        if depth == 0 {
            let score = material(&board);
            let node = tree.node_mut(id);
            node.score = score;
            node.mate_in = None;
            node.state = NodeState::Leaf;
            return score;
        }

        tree.node_mut(id).children.clear();
        let mut best_score = -INFINITY;
        let mut best_child = None;

        for mv in moves {
            let child = tree.add_child(id, mv);
            let score = if self.pruning {
                -self.evaluate_node(tree, child, -beta, -alpha, depth - 1, ply + 1)
            } else {
                -self.evaluate_node(tree, child, -INFINITY, INFINITY, depth - 1, ply + 1)
            };

            if score > best_score {
                best_score = score;
                best_child = Some(child);
            }

            if self.pruning {
                alpha = alpha.max(best_score);
                if alpha >= beta {
                    trace!(ply, mv = %mv, "beta cutoff");
                    break;
                }
            }
        }

        let mate_in = best_child
            .and_then(|child| tree.node(child).mate_in)
            .map(|plies| plies + 1);

        let node = tree.node_mut(id);
        node.score = best_score;
        node.best_child = best_child;
        node.mate_in = mate_in;
        node.state = NodeState::Internal;
        best_score
    }
}

/// Whether a score encodes a forced mate
pub fn is_mate_score(score: i32) -> bool {
    score.abs() > MATE_SCORE - 1_000
}
