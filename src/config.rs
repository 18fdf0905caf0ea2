//! ArborChess - Search configuration

/// Knobs for [`Engine`](crate::engine::Engine) searches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// Full-width search depth in plies
    pub depth: u32,
    /// Worker threads including the caller; 0 means one per logical CPU
    pub threads: usize,
    /// Alpha-beta cutoffs; off gives plain negamax
    pub pruning: bool,
    /// Memoize legal-move sets across the search
    pub use_cache: bool,
}

impl SearchConfig {
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_pruning(mut self, pruning: bool) -> Self {
        self.pruning = pruning;
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Depth actually searched; a best move needs at least one ply
    pub fn search_depth(&self) -> u32 {
        self.depth.max(1)
    }

    /// Number of threads to search with, resolving 0 to the CPU count
    pub fn worker_threads(&self) -> usize {
        let threads = if self.threads == 0 { num_cpus::get() } else { self.threads };
        threads.max(1)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            depth: 4,
            threads: 1,
            pruning: true,
            use_cache: true,
        }
    }
}
