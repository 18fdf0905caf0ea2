//! ArborChess - Parallel Search Module
//!
//! Root-split search on a fixed worker pool. The calling thread expands the
//! root, queues one job per root move and then works through the queue
//! alongside `threads - 1` helper threads. Each job searches its subtree with
//! a full window, so the backed-up result is identical to a serial search.
//! Finished subtrees are grafted back into the caller's tree in move order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::board::{Board, Move};
use crate::move_generator::MoveGenerator;
use crate::search::{NodeId, NodeState, SearchTree, Searcher, INFINITY, ROOT};

/// Blocking FIFO shared between the search threads.
///
/// While the producer is still thinking, `pop` waits for work; once `stop` is
/// called the remaining jobs are drained and `pop` then returns `None`.
pub struct WorkQueue<T> {
    jobs: Mutex<VecDeque<T>>,
    available: Condvar,
    thinking: AtomicBool,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        WorkQueue {
            jobs: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            thinking: AtomicBool::new(true),
        }
    }

    pub fn push(&self, job: T) {
        self.jobs.lock().push_back(job);
        self.available.notify_one();
    }

    /// No more jobs will be pushed; wake every waiting consumer
    pub fn stop(&self) {
        // Flag flips under the lock so a consumer between its check and its
        // wait cannot miss the wakeup
        let _jobs = self.jobs.lock();
        self.thinking.store(false, Ordering::SeqCst);
        self.available.notify_all();
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking.load(Ordering::SeqCst)
    }

    /// Next job, waiting while the queue is empty and the producer is active
    pub fn pop(&self) -> Option<T> {
        let mut jobs = self.jobs.lock();
        loop {
            if let Some(job) = jobs.pop_front() {
                return Some(job);
            }
            if !self.is_thinking() {
                return None;
            }
            self.available.wait(&mut jobs);
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        WorkQueue::new()
    }
}

/// Search of one root move
struct Job {
    index: usize,
    node: NodeId,
    board: Board,
    mv: Move,
}

struct JobResult {
    index: usize,
    node: NodeId,
    subtree: SearchTree,
    nodes: u64,
}

fn search_job(job: Job, generator: &MoveGenerator, pruning: bool, depth: u32) -> JobResult {
    let mut subtree = SearchTree::rooted(job.board, Some(job.mv));
    let mut searcher = Searcher::new(generator, pruning);
    let score = searcher.evaluate_node(&mut subtree, ROOT, -INFINITY, INFINITY, depth - 1, 1);
    trace!(mv = %job.mv, score = -score, nodes = searcher.nodes_searched(), "root move searched");

    JobResult {
        index: job.index,
        node: job.node,
        subtree,
        nodes: searcher.nodes_searched(),
    }
}

fn drain(
    queue: &WorkQueue<Job>,
    results: &Mutex<Vec<JobResult>>,
    generator: &MoveGenerator,
    pruning: bool,
    depth: u32,
) {
    while let Some(job) = queue.pop() {
        let result = search_job(job, generator, pruning, depth);
        results.lock().push(result);
    }
}

/// Search `tree` from its root to `depth` plies using `threads` threads.
///
/// Expects a tree holding only its root. Returns the number of nodes
/// evaluated. With a single thread, or nothing to split, this is the serial
/// search.
pub fn search_parallel(
    tree: &mut SearchTree,
    generator: &MoveGenerator,
    pruning: bool,
    depth: u32,
    threads: usize,
) -> u64 {
    let moves = generator.generate_legal_moves(tree.root_board());
    if threads <= 1 || depth == 0 || moves.is_empty() {
        let mut searcher = Searcher::new(generator, pruning);
        searcher.evaluate_node(tree, ROOT, -INFINITY, INFINITY, depth, 0);
        return searcher.nodes_searched();
    }

    debug!(threads, root_moves = moves.len(), depth, "splitting root");

    let queue = Arc::new(WorkQueue::new());
    let results = Arc::new(Mutex::new(Vec::with_capacity(moves.len())));

    let helpers: Vec<_> = (1..threads)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let results = Arc::clone(&results);
            let generator = generator.clone();
            thread::spawn(move || drain(&queue, &results, &generator, pruning, depth))
        })
        .collect();

    tree.node_mut(ROOT).children.clear();
    for (index, mv) in moves.into_iter().enumerate() {
        let node = tree.add_child(ROOT, mv);
        queue.push(Job {
            index,
            node,
            board: tree.board_at(node),
            mv,
        });
    }
    queue.stop();

    drain(&queue, &results, generator, pruning, depth);
    for handle in helpers {
        if let Err(panic) = handle.join() {
            std::panic::resume_unwind(panic);
        }
    }

    let mut results = std::mem::take(&mut *results.lock());
    results.sort_by_key(|result| result.index);

    let mut nodes_searched = 1;
    let mut best: Option<(NodeId, i32)> = None;
    for result in results {
        nodes_searched += result.nodes;
        tree.graft(result.node, result.subtree);
        let score = -tree.node(result.node).score;
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((result.node, score));
        }
    }

    let mate_in = best
        .and_then(|(child, _)| tree.node(child).mate_in)
        .map(|plies| plies + 1);

    let root = tree.node_mut(ROOT);
    root.best_child = best.map(|(child, _)| child);
    root.score = best.map_or(-INFINITY, |(_, score)| score);
    root.mate_in = mate_in;
    root.state = NodeState::Internal;

    nodes_searched
}
