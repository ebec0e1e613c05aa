//! Board mechanics for a 4x4 game of 2048.
//!
//! A [`Board`] packs sixteen 4-bit tile exponents into a `u64` (row-major,
//! row 0 in the high bits). Exponent 0 is an empty cell and exponent `e`
//! is the tile `2^e`, so the largest representable tile is 32768.
//!
//! Sliding and merging go through per-line lookup tables (one entry per
//! possible 16-bit row) built lazily on first use. Every operation returns a
//! new board; nothing here mutates in place.
//!
//! ```
//! use hybrid_2048::engine::{Board, Move};
//!
//! let b = Board::from_rows([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
//! let out = b.apply(Move::Left);
//! assert!(out.changed);
//! assert_eq!(out.score_delta, 4);
//! assert_eq!(out.board.tile(0, 0), 4);
//! ```

use rand::Rng;
use std::fmt;
use std::sync::OnceLock;

/// Side length of the board.
pub const SIZE: usize = 4;

/// Largest tile a nibble can hold.
pub const MAX_TILE: u32 = 1 << 15;

/// Tile values a spawn can produce, with their probabilities.
pub const SPAWN_OUTCOMES: [(u32, f64); 2] = [(2, 0.9), (4, 0.1)];

const LINE_TABLE_SIZE: usize = 0x1_0000;
const MAX_EXPONENT: u8 = 15;

type BoardRaw = u64;

/// A direction to slide tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// All directions, in the order moves are generated.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "Up",
            Move::Down => "Down",
            Move::Left => "Left",
            Move::Right => "Right",
        };
        f.write_str(name)
    }
}

/// Zero-based board coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    #[inline]
    fn index(self) -> usize {
        self.row * SIZE + self.col
    }
}

/// Result of sliding a board in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub board: Board,
    /// Sum of the tiles produced by merges.
    pub score_delta: u64,
    /// False when the move leaves every cell as it was (an illegal move).
    pub changed: bool,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("tile {value} at ({row}, {col}) is not a power of two")]
    NotPowerOfTwo { row: usize, col: usize, value: u32 },
    #[error("tile {value} at ({row}, {col}) exceeds the largest tile 32768")]
    TooLarge { row: usize, col: usize, value: u32 },
}

/// Packed 4x4 board.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(BoardRaw);

impl Board {
    pub const EMPTY: Board = Board(0);

    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self {
        Board(raw)
    }

    #[inline]
    pub fn raw(&self) -> BoardRaw {
        self.0
    }

    /// Build a board from tile values (0 for empty).
    pub fn from_rows(rows: [[u32; SIZE]; SIZE]) -> Result<Self, BoardError> {
        let mut raw = 0;
        for (row, line) in rows.iter().enumerate() {
            for (col, &value) in line.iter().enumerate() {
                if value == 0 {
                    continue;
                }
                if value > MAX_TILE {
                    return Err(BoardError::TooLarge { row, col, value });
                }
                if value == 1 || !value.is_power_of_two() {
                    return Err(BoardError::NotPowerOfTwo { row, col, value });
                }
                raw |= (value.trailing_zeros() as u64) << nibble_shift(row * SIZE + col);
            }
        }
        Ok(Board(raw))
    }

    /// Tile values, row-major.
    pub fn to_rows(self) -> [[u32; SIZE]; SIZE] {
        let mut rows = [[0; SIZE]; SIZE];
        for (row, line) in rows.iter_mut().enumerate() {
            for (col, slot) in line.iter_mut().enumerate() {
                *slot = self.tile(row, col);
            }
        }
        rows
    }

    /// Tile value at a cell, 0 if empty.
    #[inline]
    pub fn tile(self, row: usize, col: usize) -> u32 {
        exponent_to_value(self.exponent(row * SIZE + col))
    }

    #[inline]
    fn exponent(self, idx: usize) -> u8 {
        ((self.0 >> nibble_shift(idx)) & 0xf) as u8
    }

    /// Slide and merge toward `dir`, reporting the merge score and whether anything moved.
    pub fn apply(self, dir: Move) -> MoveOutcome {
        let t = tables();
        let (raw, score_delta) = match dir {
            Move::Left => shift_rows(self.0, &t.left, &t.left_score),
            Move::Right => shift_rows(self.0, &t.right, &t.right_score),
            Move::Up => {
                let (raw, score) = shift_rows(transpose(self.0), &t.left, &t.left_score);
                (transpose(raw), score)
            }
            Move::Down => {
                let (raw, score) = shift_rows(transpose(self.0), &t.right, &t.right_score);
                (transpose(raw), score)
            }
        };
        MoveOutcome { board: Board(raw), score_delta, changed: raw != self.0 }
    }

    /// Board after sliding toward `dir`, without the score.
    #[inline]
    pub fn shift(self, dir: Move) -> Self {
        self.apply(dir).board
    }

    /// Moves that change the board, paired with the resulting board, in [`Move::ALL`] order.
    pub fn available_moves(self) -> Vec<(Move, Board)> {
        Move::ALL
            .iter()
            .filter_map(|&dir| {
                let next = self.shift(dir);
                (next != self).then_some((dir, next))
            })
            .collect()
    }

    /// Empty cells in row-major order.
    pub fn empty_cells(self) -> Vec<Cell> {
        (0..SIZE * SIZE)
            .filter(|&idx| self.exponent(idx) == 0)
            .map(|idx| Cell { row: idx / SIZE, col: idx % SIZE })
            .collect()
    }

    // https://stackoverflow.com/questions/38225571/count-number-of-zero-nibbles-in-an-unsigned-64-bit-integer
    /// Number of empty cells.
    #[inline]
    pub fn count_empty(self) -> u32 {
        let mut x = self.0;
        x |= x >> 1;
        x |= x >> 2;
        x &= 0x1111_1111_1111_1111;
        16 - x.count_ones()
    }

    /// True iff the board is full and no direction changes it.
    pub fn is_terminal(self) -> bool {
        self.count_empty() == 0 && Move::ALL.iter().all(|&dir| self.shift(dir) == self)
    }

    /// Place `value` into an empty cell.
    #[inline]
    pub fn with_tile(self, cell: Cell, value: u32) -> Self {
        debug_assert!(value.is_power_of_two() && value >= 2 && value <= MAX_TILE);
        debug_assert_eq!(self.exponent(cell.index()), 0, "cell {cell:?} is occupied");
        Board(self.0 | (value.trailing_zeros() as u64) << nibble_shift(cell.index()))
    }

    /// Insert a 2 (90%) or 4 (10%) into a uniformly random empty cell.
    ///
    /// A full board is returned unchanged.
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let empties = self.empty_cells();
        if empties.is_empty() {
            return self;
        }
        let cell = empties[rng.gen_range(0..empties.len())];
        let value = if rng.gen_range(0..10) < 9 { 2 } else { 4 };
        self.with_tile(cell, value)
    }

    /// Largest exponent on the board (0 when empty).
    pub fn max_exponent(self) -> u8 {
        (0..SIZE * SIZE).map(|idx| self.exponent(idx)).max().unwrap_or(0)
    }

    /// Largest tile value on the board (0 when empty).
    #[inline]
    pub fn highest_tile(self) -> u32 {
        exponent_to_value(self.max_exponent())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const RULE: &str = "-----------------------------";
        for (row, line) in self.to_rows().iter().enumerate() {
            if row > 0 {
                writeln!(f, "{RULE}")?;
            }
            let cells: Vec<String> = line
                .iter()
                .map(|&v| if v == 0 { " ".repeat(6) } else { format!("{v:^6}") })
                .collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

impl From<BoardRaw> for Board {
    fn from(v: BoardRaw) -> Self {
        Board::from_raw(v)
    }
}

impl From<Board> for BoardRaw {
    fn from(b: Board) -> Self {
        b.raw()
    }
}

/// Build the line tables now rather than on the first move. Safe to call repeatedly.
pub fn warm() {
    let _ = tables();
}

#[inline]
fn nibble_shift(idx: usize) -> u32 {
    (60 - 4 * idx) as u32
}

#[inline]
fn exponent_to_value(e: u8) -> u32 {
    if e == 0 {
        0
    } else {
        1 << e
    }
}

struct Tables {
    left: Box<[u16]>,
    right: Box<[u16]>,
    left_score: Box<[u32]>,
    right_score: Box<[u32]>,
}

static TABLES: OnceLock<Tables> = OnceLock::new();

#[inline(always)]
fn tables() -> &'static Tables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> Tables {
    let mut left = vec![0u16; LINE_TABLE_SIZE];
    let mut right = vec![0u16; LINE_TABLE_SIZE];
    let mut left_score = vec![0u32; LINE_TABLE_SIZE];
    let mut right_score = vec![0u32; LINE_TABLE_SIZE];
    for line in 0..LINE_TABLE_SIZE {
        let tiles = unpack_line(line as u16);

        let (slid, score) = slide_left(tiles);
        left[line] = pack_line(slid);
        left_score[line] = score;

        let mut reversed = tiles;
        reversed.reverse();
        let (mut slid, score) = slide_left(reversed);
        slid.reverse();
        right[line] = pack_line(slid);
        right_score[line] = score;
    }
    Tables {
        left: left.into_boxed_slice(),
        right: right.into_boxed_slice(),
        left_score: left_score.into_boxed_slice(),
        right_score: right_score.into_boxed_slice(),
    }
}

/// Unpack a 16-bit line into exponents, leftmost cell first.
pub(crate) fn unpack_line(line: u16) -> [u8; SIZE] {
    [(line >> 12) as u8 & 0xf, (line >> 8) as u8 & 0xf, (line >> 4) as u8 & 0xf, line as u8 & 0xf]
}

fn pack_line(tiles: [u8; SIZE]) -> u16 {
    (tiles[0] as u16) << 12 | (tiles[1] as u16) << 8 | (tiles[2] as u16) << 4 | tiles[3] as u16
}

/// Slide exponents toward index 0. Each tile merges at most once per move,
/// pairs nearest the wall first. Two 32768 tiles never merge.
fn slide_left(tiles: [u8; SIZE]) -> ([u8; SIZE], u32) {
    let mut out = [0u8; SIZE];
    let mut score = 0;
    let mut len = 0;
    let mut pending: Option<u8> = None;
    for &tile in tiles.iter().filter(|&&t| t != 0) {
        match pending {
            Some(p) if p == tile && p < MAX_EXPONENT => {
                out[len] = p + 1;
                len += 1;
                score += 1 << (p + 1);
                pending = None;
            }
            Some(p) => {
                out[len] = p;
                len += 1;
                pending = Some(tile);
            }
            None => pending = Some(tile),
        }
    }
    if let Some(p) = pending {
        out[len] = p;
    }
    (out, score)
}

#[inline]
pub(crate) fn extract_line(board: BoardRaw, line_idx: usize) -> u16 {
    ((board >> ((3 - line_idx) * 16)) & 0xffff) as u16
}

fn shift_rows(board: BoardRaw, table: &[u16], scores: &[u32]) -> (BoardRaw, u64) {
    (0..SIZE).fold((0, 0), |(raw, score), row| {
        let line = extract_line(board, row) as usize;
        (raw | (table[line] as u64) << ((3 - row) * 16), score + scores[line] as u64)
    })
}

// Credit to Nneonneo
pub(crate) fn transpose(x: BoardRaw) -> BoardRaw {
    let a1 = x & 0xF0F00F0FF0F00F0F;
    let a2 = x & 0x0000F0F00000F0F0;
    let a3 = x & 0x0F0F00000F0F0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00FF0000FF00FF;
    let b2 = a & 0x00FF00FF00000000;
    let b3 = a & 0x00000000FF00FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}
