//! Bounded transposition cache keyed by position notation

use std::collections::{HashMap, VecDeque};

use shakmaty::Move;

/// How a stored score relates to the true value of the position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    /// Search failed high: true value ≥ score
    Lower,
    /// Search failed low: true value ≤ score
    Upper,
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub score: i32,
    pub depth: u8,
    pub best_move: Option<Move>,
    pub bound: Bound,
}

/// Hard-capacity map with oldest-first eviction.
/// A capacity of zero disables caching.
#[derive(Debug, Default)]
pub struct TranspositionCache {
    capacity: usize,
    entries: HashMap<String, CacheEntry>,
    order: VecDeque<String>,
}

impl TranspositionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Entry for `key` if it was searched at least `depth` plies deep.
    pub fn probe(&self, key: &str, depth: u8) -> Option<&CacheEntry> {
        self.entries.get(key).filter(|entry| entry.depth >= depth)
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn store(&mut self, key: String, entry: CacheEntry) {
        if self.capacity == 0 {
            return;
        }
        if let Some(existing) = self.entries.get_mut(&key) {
            // A shallower result never replaces a deeper one
            if entry.depth >= existing.depth {
                *existing = entry;
            }
            return;
        }
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
