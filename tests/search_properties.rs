use hybrid_2048::engine::{Board, Move, SPAWN_OUTCOMES};
use hybrid_2048::search::{evaluate, CachePolicy, HybridSearch, SearchConfig};
use rand::{rngs::StdRng, SeedableRng};

fn board(rows: [[u32; 4]; 4]) -> Board {
    Board::from_rows(rows).unwrap()
}

/// Plain expectimax: every legal move, every empty cell, no pruning, no cache.
fn reference_max(b: Board, depth: u32) -> f64 {
    let moves = b.available_moves();
    if depth == 0 || moves.is_empty() {
        return evaluate(b);
    }
    moves
        .into_iter()
        .map(|(_, next)| reference_chance(next, depth - 1))
        .fold(f64::NEG_INFINITY, f64::max)
}

fn reference_chance(b: Board, depth: u32) -> f64 {
    let empties = b.empty_cells();
    if depth == 0 || empties.is_empty() {
        return evaluate(b);
    }
    let mut total = 0.0;
    for &cell in &empties {
        for &(tile, prob) in &SPAWN_OUTCOMES {
            total += prob * reference_max(b.with_tile(cell, tile), depth - 1);
        }
    }
    total / empties.len() as f64
}

fn reference_root(b: Board, depth: u32) -> f64 {
    b.available_moves()
        .into_iter()
        .map(|(_, next)| reference_chance(next, depth - 1))
        .fold(f64::NEG_INFINITY, f64::max)
}

fn exhaustive(depth: u32, pruning: bool, cache: CachePolicy) -> SearchConfig {
    SearchConfig { depth, sample_cells: 16, pruning, cache, ..Default::default() }
}

fn sparse_boards() -> Vec<Board> {
    vec![
        board([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]),
        board([[2, 4, 0, 0], [0, 2, 0, 0], [0, 0, 8, 0], [0, 0, 0, 2]]),
        board([[16, 8, 4, 2], [8, 4, 2, 0], [2, 0, 0, 0], [0; 4]]),
        board([[2, 4, 8, 16], [4, 8, 16, 32], [2, 4, 2, 4], [0, 0, 2, 0]]),
    ]
}

#[test]
fn terminal_board_reports_no_move_and_static_score() {
    let b = board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
    assert!(b.is_terminal());
    let mut search = HybridSearch::seeded(SearchConfig::default(), 0);
    let decision = search.best_move(b);
    assert_eq!(decision.mv, None);
    assert_eq!(decision.score, evaluate(b));
}

#[test]
fn single_legal_move_is_chosen() {
    let b = board([[2, 4, 8, 0], [4, 8, 2, 0], [2, 4, 8, 0], [4, 8, 2, 0]]);
    let moves = b.available_moves();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].0, Move::Right);
    for depth in 1..=4 {
        let mut search = HybridSearch::seeded(SearchConfig { depth, ..Default::default() }, depth as u64);
        assert_eq!(search.best_move(b).mv, Some(Move::Right));
    }
}

#[test]
fn pruned_search_matches_plain_expectimax() {
    for b in sparse_boards() {
        for depth in 1..=3 {
            let expected = reference_root(b, depth);
            let mut pruned = HybridSearch::seeded(exhaustive(depth, true, CachePolicy::Disabled), 0);
            let mut plain = HybridSearch::seeded(exhaustive(depth, false, CachePolicy::Disabled), 0);
            let a = pruned.best_move(b);
            let p = plain.best_move(b);
            assert!((a.score - expected).abs() < 1e-9, "{b:?} depth {depth}: {} vs {expected}", a.score);
            assert_eq!(a, p, "{b:?} depth {depth}");
        }
    }
}

#[test]
fn reference_max_agrees_at_root_depth_four() {
    let b = board([[16, 8, 4, 2], [8, 4, 2, 0], [2, 0, 0, 0], [0; 4]]);
    let mut search = HybridSearch::seeded(exhaustive(4, true, CachePolicy::Disabled), 0);
    let decision = search.best_move(b);
    let expected = reference_max(b, 4);
    assert_eq!(expected, reference_root(b, 4));
    assert!((decision.score - expected).abs() < 1e-9);
}

#[test]
fn cache_does_not_change_exhaustive_results() {
    for b in sparse_boards() {
        let mut uncached = HybridSearch::seeded(exhaustive(3, true, CachePolicy::Disabled), 0);
        let mut approx = HybridSearch::seeded(exhaustive(3, true, CachePolicy::Approximate), 0);
        let mut exact = HybridSearch::seeded(exhaustive(3, true, CachePolicy::ExactOnly), 0);
        let u = uncached.best_move(b);
        assert_eq!(approx.best_move(b), u);
        assert_eq!(exact.best_move(b), u);
        assert!(approx.last_stats().nodes <= uncached.last_stats().nodes);
        assert_eq!(uncached.last_stats().cache_entries, 0);
    }
}

#[test]
fn seeded_searches_are_reproducible() {
    let b = board([[2, 0, 0, 0], [0, 4, 0, 0], [0; 4], [0, 0, 0, 2]]);
    let cfg = SearchConfig { depth: 4, sample_cells: 3, ..Default::default() };
    let mut first = HybridSearch::seeded(cfg.clone(), 1234);
    let mut second = HybridSearch::seeded(cfg, 1234);
    for _ in 0..3 {
        assert_eq!(first.best_move(b), second.best_move(b));
        assert_eq!(first.last_stats(), second.last_stats());
    }
}

#[test]
fn injected_rng_drives_sampling() {
    let b = board([[2, 0, 0, 0], [0, 4, 0, 0], [0; 4], [0, 0, 0, 2]]);
    let cfg = SearchConfig { depth: 3, sample_cells: 2, ..Default::default() };
    let mut injected = HybridSearch::new(cfg.clone(), StdRng::seed_from_u64(77));
    let mut seeded = HybridSearch::seeded(cfg, 77);
    assert_eq!(injected.best_move(b), seeded.best_move(b));
}

#[test]
fn full_game_with_shallow_search_terminates() {
    let mut rng = StdRng::seed_from_u64(2048);
    let mut game = hybrid_2048::game::Game::new(&mut rng);
    let mut search = HybridSearch::seeded(SearchConfig { depth: 2, sample_cells: 4, ..Default::default() }, 1);
    while !game.is_over() && game.moves() < 300 {
        let decision = search.best_move(game.board());
        let dir = decision.mv.expect("non-terminal board has a move");
        assert!(game.step(dir, &mut rng));
    }
    assert!(game.moves() > 0);
    assert!(game.score() > 0);
    if game.is_over() {
        assert_eq!(search.best_move(game.board()).mv, None);
    }
}
