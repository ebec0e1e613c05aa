//! Move selection: a depth-bounded search alternating player moves (MAX)
//! and tile spawns (CHANCE).
//!
//! - MAX plies try every legal direction, best static evaluation first, and
//!   keep the maximum. They carry an alpha-beta window and stop expanding
//!   siblings once `alpha >= beta`.
//! - CHANCE plies sample up to `sample_cells` empty cells, try a 2 (p=0.9)
//!   and a 4 (p=0.1) in each, and average the weighted results over the
//!   sampled cells.
//! - Every node is memoized per decision in a [`TranspositionCache`] keyed on
//!   board, remaining depth and ply kind.
//!
//! The only randomness is the cell sampling, drawn from the RNG owned by
//! [`HybridSearch`]. A seeded search is reproducible.
//!
//! ```
//! use hybrid_2048::engine::{Board, Move};
//! use hybrid_2048::search::{HybridSearch, SearchConfig};
//!
//! let board = Board::from_rows([[2, 4, 8, 0], [4, 8, 2, 0], [2, 4, 8, 0], [4, 8, 2, 0]]).unwrap();
//! let mut search = HybridSearch::seeded(SearchConfig::default(), 1);
//! let decision = search.best_move(board);
//! assert_eq!(decision.mv, Some(Move::Right));
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::engine::{self, Move};

pub mod cache;
pub mod heuristic;
mod hybrid;

pub use cache::{CachePolicy, Ply, SearchKey, TranspositionCache};
pub use heuristic::{breakdown, evaluate, evaluate_with, Breakdown, HeuristicWeights};
pub use hybrid::{ordered_moves, HybridSearch};

pub const DEFAULT_DEPTH: u32 = 3;
pub const DEFAULT_SAMPLE_CELLS: usize = 6;
/// Depth range accepted by [`SearchConfig::validate`] and [`HybridSearch::set_depth`].
pub const MIN_DEPTH: u32 = 1;
pub const MAX_DEPTH: u32 = 8;

/// Search knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Plies searched below the current position, counting both kinds.
    pub depth: u32,
    /// Upper bound on empty cells expanded at a chance ply.
    pub sample_cells: usize,
    /// Stop expanding MAX siblings once `alpha >= beta`.
    pub pruning: bool,
    pub cache: CachePolicy,
    pub weights: HeuristicWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            sample_cells: DEFAULT_SAMPLE_CELLS,
            pruning: true,
            cache: CachePolicy::default(),
            weights: HeuristicWeights::default(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_DEPTH..=MAX_DEPTH).contains(&self.depth) {
            return Err(ConfigError::Depth(self.depth));
        }
        if self.sample_cells == 0 {
            return Err(ConfigError::SampleCells);
        }
        if let Some(name) = self.weights.first_non_finite() {
            return Err(ConfigError::Weight(name));
        }
        Ok(())
    }
}

/// Chosen direction and its backed-up value.
///
/// `mv` is `None` when the board has no legal move; `score` is then the
/// static evaluation of the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub mv: Option<Move>,
    pub score: f64,
}

/// Counters from the most recent [`HybridSearch::best_move`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes entered, including ones answered from the cache.
    pub nodes: u64,
    pub cache_hits: u64,
    pub cache_entries: usize,
    /// MAX nodes that skipped at least one sibling.
    pub cutoffs: u64,
}

/// Build the engine and heuristic tables ahead of the first search.
pub fn warm() {
    engine::warm();
    heuristic::warm();
}
