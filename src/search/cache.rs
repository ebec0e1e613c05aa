use std::collections::HashMap;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use crate::engine::Board;

/// Which side is to act at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ply {
    /// The player picks a direction.
    Max,
    /// A tile spawns at random.
    Chance,
}

/// Transposition key: the board contents, the remaining depth and the ply kind.
///
/// Boards are compared by value, so positions reached through different
/// move orders share an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchKey {
    pub board: Board,
    pub depth: u32,
    pub ply: Ply,
}

impl SearchKey {
    #[inline]
    pub fn new(board: Board, depth: u32, ply: Ply) -> Self {
        Self { board, depth, ply }
    }
}

/// How cached values are reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    /// No transposition table.
    Disabled,
    /// Every stored value is reused, including values that were cut off by
    /// the pruning window they were computed under.
    #[default]
    Approximate,
    /// Only values computed without any cutoff in their subtree are stored.
    ExactOnly,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    score: f64,
    exact: bool,
}

/// Per-decision transposition table.
#[derive(Debug)]
pub struct TranspositionCache {
    policy: CachePolicy,
    map: HashMap<SearchKey, Entry, RandomState>,
    hits: u64,
}

impl TranspositionCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self { policy, map: HashMap::with_hasher(RandomState::new()), hits: 0 }
    }

    #[inline]
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Look up a reusable value for `key`.
    #[inline]
    pub fn probe(&mut self, key: &SearchKey) -> Option<f64> {
        let entry = match self.policy {
            CachePolicy::Disabled => return None,
            CachePolicy::Approximate => self.map.get(key)?,
            CachePolicy::ExactOnly => self.map.get(key).filter(|e| e.exact)?,
        };
        self.hits += 1;
        Some(entry.score)
    }

    /// Record a value. The first value stored under a key wins.
    #[inline]
    pub fn store(&mut self, key: SearchKey, score: f64, exact: bool) {
        let keep = match self.policy {
            CachePolicy::Disabled => false,
            CachePolicy::Approximate => true,
            CachePolicy::ExactOnly => exact,
        };
        if keep {
            self.map.entry(key).or_insert(Entry { score, exact });
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.hits = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: u64, depth: u32, ply: Ply) -> SearchKey {
        SearchKey::new(Board::from_raw(raw), depth, ply)
    }

    #[test]
    fn keys_distinguish_depth_and_ply() {
        let mut cache = TranspositionCache::new(CachePolicy::Approximate);
        cache.store(key(0x1200, 2, Ply::Max), 1.0, true);
        assert_eq!(cache.probe(&key(0x1200, 2, Ply::Max)), Some(1.0));
        assert_eq!(cache.probe(&key(0x1200, 1, Ply::Max)), None);
        assert_eq!(cache.probe(&key(0x1200, 2, Ply::Chance)), None);
        assert_eq!(cache.probe(&key(0x2100, 2, Ply::Max)), None);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn first_store_wins() {
        let mut cache = TranspositionCache::new(CachePolicy::Approximate);
        cache.store(key(1, 1, Ply::Chance), 5.0, true);
        cache.store(key(1, 1, Ply::Chance), 7.0, true);
        assert_eq!(cache.probe(&key(1, 1, Ply::Chance)), Some(5.0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn approximate_reuses_bounds() {
        let mut cache = TranspositionCache::new(CachePolicy::Approximate);
        cache.store(key(1, 3, Ply::Max), 2.5, false);
        assert_eq!(cache.probe(&key(1, 3, Ply::Max)), Some(2.5));
    }

    #[test]
    fn exact_only_drops_bounds() {
        let mut cache = TranspositionCache::new(CachePolicy::ExactOnly);
        cache.store(key(1, 3, Ply::Max), 2.5, false);
        cache.store(key(2, 3, Ply::Max), 4.0, true);
        assert_eq!(cache.probe(&key(1, 3, Ply::Max)), None);
        assert_eq!(cache.probe(&key(2, 3, Ply::Max)), Some(4.0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn disabled_stores_nothing() {
        let mut cache = TranspositionCache::new(CachePolicy::Disabled);
        cache.store(key(1, 1, Ply::Max), 1.0, true);
        assert!(cache.is_empty());
        assert_eq!(cache.probe(&key(1, 1, Ply::Max)), None);
        assert_eq!(cache.hits(), 0);
    }

    #[test]
    fn clear_resets() {
        let mut cache = TranspositionCache::new(CachePolicy::Approximate);
        cache.store(key(1, 1, Ply::Max), 1.0, true);
        let _ = cache.probe(&key(1, 1, Ply::Max));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.policy(), CachePolicy::Approximate);
    }
}
