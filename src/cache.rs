//! ArborChess - Legal Move Cache
//!
//! A memo from canonical position key (FEN without move counters) to the
//! legal-move set of that position. Shared between search workers: lookups
//! take the read lock, inserting a freshly computed entry takes the write lock.
//! Entries are never evicted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::board::Move;

/// Snapshot of cache counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache, 0.0 when nothing was asked
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Thread-safe legal-move memo
#[derive(Default)]
pub struct MoveCache {
    entries: RwLock<HashMap<String, Arc<Vec<Move>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MoveCache {
    pub fn new() -> Self {
        MoveCache::default()
    }

    /// Look up a position key without computing anything
    pub fn get(&self, key: &str) -> Option<Arc<Vec<Move>>> {
        let found = self.entries.read().get(key).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Return the cached moves for `key`, computing and storing them on a miss.
    ///
    /// `compute` runs without any lock held. If two threads miss on the same
    /// key, the first insert wins and both receive the stored entry.
    pub fn get_or_insert_with<F>(&self, key: String, compute: F) -> Arc<Vec<Move>>
    where
        F: FnOnce() -> Vec<Move>,
    {
        if let Some(moves) = self.get(&key) {
            return moves;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let moves = Arc::new(compute());

        let mut entries = self.entries.write();
        Arc::clone(entries.entry(key).or_insert(moves))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;
    use std::thread;

    fn sample_moves() -> Vec<Move> {
        vec![Move::new(Square::new(4, 1), Square::new(4, 3))]
    }

    #[test]
    fn miss_then_hit() {
        let cache = MoveCache::new();
        let mut computed = 0;

        let first = cache.get_or_insert_with("key".to_string(), || {
            computed += 1;
            sample_moves()
        });
        let second = cache.get_or_insert_with("key".to_string(), || {
            computed += 1;
            Vec::new()
        });

        assert_eq!(computed, 1);
        assert_eq!(first, second);
        assert_eq!(
            cache.stats(),
            CacheStats { hits: 1, misses: 1, entries: 1 }
        );
        assert!((cache.stats().hit_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn clear_resets_counters() {
        let cache = MoveCache::new();
        cache.get_or_insert_with("a".to_string(), sample_moves);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
        assert_eq!(cache.stats().hit_rate(), 0.0);
    }

    #[test]
    fn concurrent_readers_see_one_entry() {
        let cache = Arc::new(MoveCache::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let moves = cache.get_or_insert_with("shared".to_string(), sample_moves);
                        assert_eq!(moves.len(), 1);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits + stats.misses, 400);
    }
}
