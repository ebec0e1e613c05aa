//! Live game state: the board the player sees, the running score and the
//! move counter. Search never touches this; it only receives copies of
//! [`Game::board`].

use rand::Rng;

use crate::engine::{Board, Move};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Game {
    board: Board,
    score: u64,
    moves: u64,
}

impl Game {
    /// Start a game with two random tiles.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let board = Board::EMPTY.with_random_tile(rng).with_random_tile(rng);
        Self::from_board(board)
    }

    pub fn from_board(board: Board) -> Self {
        Self { board, score: 0, moves: 0 }
    }

    #[inline]
    pub fn board(&self) -> Board {
        self.board
    }

    #[inline]
    pub fn score(&self) -> u64 {
        self.score
    }

    #[inline]
    pub fn moves(&self) -> u64 {
        self.moves
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.board.is_terminal()
    }

    /// Play `dir`. When the board changes, add the merge score and spawn a
    /// tile; otherwise nothing happens and `false` is returned.
    pub fn step<R: Rng + ?Sized>(&mut self, dir: Move, rng: &mut R) -> bool {
        let outcome = self.board.apply(dir);
        if !outcome.changed {
            return false;
        }
        self.board = outcome.board.with_random_tile(rng);
        self.score += outcome.score_delta;
        self.moves += 1;
        true
    }
}
