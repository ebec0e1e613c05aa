//! Static board evaluation.
//!
//! Four features, each computed independently:
//! - empty cells (count of zeros)
//! - smoothness: minus the exponent gap of every adjacent non-empty pair
//! - monotonicity: per row and column, the smaller of the ascending and
//!   descending disagreement totals, negated
//! - max tile: `log2(max + 1)`
//!
//! Row and column terms only look at one line at a time, so they are
//! precomputed for all 65,536 packed lines, the same way the move tables are.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::engine::{self, Board, SIZE};

/// Weights applied to each feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeuristicWeights {
    pub empty: f64,
    pub smoothness: f64,
    pub monotonicity: f64,
    pub max_tile: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self { empty: 3.0, smoothness: 1.0, monotonicity: 1.5, max_tile: 0.1 }
    }
}

impl HeuristicWeights {
    pub(crate) fn first_non_finite(&self) -> Option<&'static str> {
        [
            ("empty", self.empty),
            ("smoothness", self.smoothness),
            ("monotonicity", self.monotonicity),
            ("max_tile", self.max_tile),
        ]
        .into_iter()
        .find(|(_, w)| !w.is_finite())
        .map(|(name, _)| name)
    }
}

/// Unweighted feature values for one board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakdown {
    pub empty: f64,
    /// Always `<= 0`.
    pub smoothness: f64,
    /// Always `<= 0`.
    pub monotonicity: f64,
    pub max_tile: f64,
}

impl Breakdown {
    pub fn weighted(&self, w: &HeuristicWeights) -> f64 {
        w.empty * self.empty
            + w.smoothness * self.smoothness
            + w.monotonicity * self.monotonicity
            + w.max_tile * self.max_tile
    }
}

#[derive(Clone, Copy, Default)]
struct LineTerms {
    smoothness: f64,
    monotonicity: f64,
}

static LINE_TERMS: OnceLock<Box<[LineTerms]>> = OnceLock::new();

pub(crate) fn warm() {
    let _ = line_terms();
}

fn line_terms() -> &'static [LineTerms] {
    LINE_TERMS
        .get_or_init(|| {
            (0..=u16::MAX)
                .map(|line| {
                    let tiles = engine::unpack_line(line);
                    LineTerms { smoothness: calc_smoothness(&tiles), monotonicity: calc_monotonicity(&tiles) }
                })
                .collect()
        })
        .as_ref()
}

/// Score a board with the default weights.
#[inline]
pub fn evaluate(board: Board) -> f64 {
    evaluate_with(board, &HeuristicWeights::default())
}

#[inline]
pub fn evaluate_with(board: Board, weights: &HeuristicWeights) -> f64 {
    breakdown(board).weighted(weights)
}

pub fn breakdown(board: Board) -> Breakdown {
    let terms = line_terms();
    let transposed = engine::transpose(board.raw());
    let (smoothness, monotonicity) = (0..SIZE).fold((0.0, 0.0), |(smooth, mono), idx| {
        let row = terms[engine::extract_line(board.raw(), idx) as usize];
        let col = terms[engine::extract_line(transposed, idx) as usize];
        (
            smooth + row.smoothness + col.smoothness,
            mono + row.monotonicity + col.monotonicity,
        )
    });
    Breakdown {
        empty: board.count_empty() as f64,
        smoothness,
        monotonicity,
        max_tile: (board.highest_tile() as f64 + 1.0).log2(),
    }
}

fn calc_smoothness(line: &[u8; SIZE]) -> f64 {
    line.windows(2)
        .filter(|pair| pair[0] != 0 && pair[1] != 0)
        .map(|pair| -(pair[0] as f64 - pair[1] as f64).abs())
        .sum()
}

/// `log2(tile + 1)` for a tile given by its exponent; 0 for an empty cell.
fn log_magnitude(exponent: u8) -> f64 {
    if exponent == 0 {
        0.0
    } else {
        ((1u32 << exponent) as f64 + 1.0).log2()
    }
}

fn calc_monotonicity(line: &[u8; SIZE]) -> f64 {
    let mut decreasing = 0.0;
    let mut increasing = 0.0;
    for pair in line.windows(2) {
        let (a, b) = (log_magnitude(pair[0]), log_magnitude(pair[1]));
        if pair[0] > pair[1] {
            decreasing += a - b;
        } else if pair[1] > pair[0] {
            increasing += b - a;
        }
    }
    -f64::min(decreasing, increasing)
}
