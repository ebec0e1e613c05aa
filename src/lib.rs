//! hybrid-2048: a 2048 player built on a bounded expectimax search.
//!
//! This crate provides:
//! - A packed `Board` with move, spawn and terminal-state mechanics (`engine`)
//! - The decision engine: heuristic evaluator, alpha-beta pruned MAX plies,
//!   sampled CHANCE plies and a per-decision transposition table (`search`)
//! - A small live-game wrapper (`game`) and TOML settings (`config`)
//!
//! Quick start:
//! ```
//! use hybrid_2048::game::Game;
//! use hybrid_2048::search::{HybridSearch, SearchConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut game = Game::new(&mut rng);
//! let mut search = HybridSearch::seeded(SearchConfig { depth: 2, ..Default::default() }, 42);
//! let decision = search.best_move(game.board());
//! let dir = decision.mv.expect("a fresh game always has a move");
//! assert!(game.step(dir, &mut rng));
//! ```
pub mod config;
pub mod engine;
pub mod game;
pub mod logging;
pub mod search;
