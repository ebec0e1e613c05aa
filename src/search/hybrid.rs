use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::engine::{Board, Cell, Move, SPAWN_OUTCOMES};

use super::cache::{Ply, SearchKey, TranspositionCache};
use super::heuristic::{evaluate_with, HeuristicWeights};
use super::{warm, Decision, SearchConfig, SearchStats, MAX_DEPTH, MIN_DEPTH};

/// Value of a searched node. `exact` is false when a cutoff skipped part of its subtree.
#[derive(Debug, Clone, Copy)]
struct NodeValue {
    score: f64,
    exact: bool,
}

impl NodeValue {
    #[inline]
    fn exact(score: f64) -> Self {
        Self { score, exact: true }
    }
}

/// Legal moves sorted by static evaluation of the resulting board, best first.
///
/// The sort is stable, so ties keep [`Move::ALL`] order.
pub fn ordered_moves(board: Board, weights: &HeuristicWeights) -> Vec<(Move, Board)> {
    let mut scored: Vec<(Move, Board, f64)> = board
        .available_moves()
        .into_iter()
        .map(|(dir, next)| (dir, next, evaluate_with(next, weights)))
        .collect();
    scored.sort_by(|a, b| b.2.total_cmp(&a.2));
    scored.into_iter().map(|(dir, next, _)| (dir, next)).collect()
}

/// Single-threaded expectimax with alpha-beta cutoffs at MAX plies.
///
/// The transposition table lives only for one [`best_move`](Self::best_move)
/// call. The RNG used to sample spawn cells is owned by the search.
pub struct HybridSearch<R: Rng = StdRng> {
    cfg: SearchConfig,
    rng: R,
    stats: SearchStats,
}

impl HybridSearch<StdRng> {
    /// Search whose cell sampling is seeded from `seed`.
    pub fn seeded(cfg: SearchConfig, seed: u64) -> Self {
        Self::new(cfg, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> HybridSearch<R> {
    pub fn new(cfg: SearchConfig, rng: R) -> Self {
        warm();
        Self { cfg, rng, stats: SearchStats::default() }
    }

    #[inline]
    pub fn config(&self) -> &SearchConfig {
        &self.cfg
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.cfg.depth
    }

    /// Change the search depth, clamped to `MIN_DEPTH..=MAX_DEPTH`.
    pub fn set_depth(&mut self, depth: u32) {
        self.cfg.depth = depth.clamp(MIN_DEPTH, MAX_DEPTH);
    }

    #[inline]
    pub fn last_stats(&self) -> SearchStats {
        self.stats
    }

    /// Static evaluation under this search's weights.
    #[inline]
    pub fn evaluate(&self, board: Board) -> f64 {
        evaluate_with(board, &self.cfg.weights)
    }

    /// Pick the direction with the highest backed-up value.
    ///
    /// Moves are tried best-static-evaluation first and the first one
    /// reaching the maximum wins ties. With no legal move the result is
    /// `mv: None` and the board's static evaluation.
    pub fn best_move(&mut self, board: Board) -> Decision {
        self.stats = SearchStats::default();
        let mut cache = TranspositionCache::new(self.cfg.cache);

        let moves = ordered_moves(board, &self.cfg.weights);
        if moves.is_empty() {
            debug!(?board, "no legal moves");
            return Decision { mv: None, score: self.evaluate(board) };
        }

        let depth = self.cfg.depth.saturating_sub(1);
        let mut best = Decision { mv: None, score: f64::NEG_INFINITY };
        let mut alpha = f64::NEG_INFINITY;
        let beta = f64::INFINITY;
        for (dir, next) in moves {
            let value = self.search(next, depth, alpha, beta, Ply::Chance, &mut cache).score;
            if best.mv.is_none() || value > best.score {
                best = Decision { mv: Some(dir), score: value };
            }
            alpha = alpha.max(value);
        }

        self.stats.cache_hits = cache.hits();
        self.stats.cache_entries = cache.len();
        debug!(
            mv = ?best.mv,
            score = best.score,
            nodes = self.stats.nodes,
            cache_hits = self.stats.cache_hits,
            "decision"
        );
        best
    }

    fn search(
        &mut self,
        board: Board,
        depth: u32,
        alpha: f64,
        beta: f64,
        ply: Ply,
        cache: &mut TranspositionCache,
    ) -> NodeValue {
        self.stats.nodes += 1;
        let key = SearchKey::new(board, depth, ply);
        if let Some(score) = cache.probe(&key) {
            return NodeValue::exact(score);
        }
        let value = if depth == 0 {
            NodeValue::exact(self.evaluate(board))
        } else {
            match ply {
                Ply::Max => self.max_node(board, depth, alpha, beta, cache),
                Ply::Chance => self.chance_node(board, depth, alpha, beta, cache),
            }
        };
        cache.store(key, value.score, value.exact);
        value
    }

    fn max_node(
        &mut self,
        board: Board,
        depth: u32,
        mut alpha: f64,
        beta: f64,
        cache: &mut TranspositionCache,
    ) -> NodeValue {
        let moves = ordered_moves(board, &self.cfg.weights);
        if moves.is_empty() {
            return NodeValue::exact(self.evaluate(board));
        }
        let mut value = NodeValue { score: f64::NEG_INFINITY, exact: true };
        for (i, &(_, next)) in moves.iter().enumerate() {
            let child = self.search(next, depth - 1, alpha, beta, Ply::Chance, cache);
            value.score = value.score.max(child.score);
            value.exact &= child.exact;
            alpha = alpha.max(value.score);
            if self.cfg.pruning && alpha >= beta {
                if i + 1 < moves.len() {
                    self.stats.cutoffs += 1;
                    value.exact = false;
                }
                break;
            }
        }
        value
    }

    // The window is passed through untouched: chance plies never prune.
    fn chance_node(
        &mut self,
        board: Board,
        depth: u32,
        alpha: f64,
        beta: f64,
        cache: &mut TranspositionCache,
    ) -> NodeValue {
        let empties = board.empty_cells();
        if empties.is_empty() {
            return NodeValue::exact(self.evaluate(board));
        }
        let sample = self.sample_cells(&empties);
        let mut expected = 0.0;
        let mut exact = true;
        for &cell in &sample {
            for &(tile, prob) in &SPAWN_OUTCOMES {
                let child = self.search(board.with_tile(cell, tile), depth - 1, alpha, beta, Ply::Max, cache);
                expected += prob * child.score;
                exact &= child.exact;
            }
        }
        // Each sampled cell carries one unit of probability mass.
        NodeValue { score: expected / sample.len() as f64, exact }
    }

    /// All empty cells in row-major order when they fit in the sample,
    /// otherwise `sample_cells` distinct cells drawn from the RNG.
    fn sample_cells(&mut self, empties: &[Cell]) -> Vec<Cell> {
        let k = self.cfg.sample_cells.max(1);
        if empties.len() <= k {
            empties.to_vec()
        } else {
            empties.choose_multiple(&mut self.rng, k).copied().collect()
        }
    }
}
