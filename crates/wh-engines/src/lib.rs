//! Six pure game state machines behind one uniform contract.
//!
//! No engine performs I/O or owns a timer; the room actor in `wh-room` drives
//! `apply`/`auto_fallback` and is the only component aware of wall-clock time.
#![allow(dead_code)]

pub mod checkers;
pub mod chess;
pub mod dominoes;
pub mod gomoku;
pub mod mancala;
pub mod tictactoe;

use wh_core::Seat;

/// What happened to the room as a result of one `apply` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Move accepted, game continues with (possibly) a new `current_seat`.
    Applied,
    /// The current round ended but the match continues (dominoes only).
    RoundOver,
    /// The match is over. `winner` is `None` on a draw.
    GameOver { winner: Option<Seat> },
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Outcome::GameOver { .. })
    }
}

/// Uniform contract every game engine implements. No engine suspends or
/// throws: every rejection is a structured `Self::Error`.
pub trait GameEngine: Send {
    type Options;
    type Action: Copy + Send;
    type View: Send;
    type Error: std::error::Error + Send;

    /// Deterministic setup; randomness, if any, is confined to seating/shuffling.
    fn init(options: Self::Options) -> Self;
    fn apply(&mut self, seat: Seat, action: Self::Action) -> Result<Outcome, Self::Error>;
    /// The projection visible to `seat` — hides opponent-only information.
    fn view(&self, seat: Seat) -> Self::View;
    /// The move to inject when `seat`'s deadline fires. `None` means the
    /// position has no legal move for `seat` (handled by normal rules).
    fn auto_fallback(&self, seat: Seat) -> Option<Self::Action>;
    fn current_seat(&self) -> Seat;
    fn is_over(&self) -> bool;
    fn is_round_over(&self) -> bool;
}
