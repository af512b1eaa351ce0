//! Gomoku ("morpion"), fixed 15x15 board, win length 5.

use crate::GameEngine;
use crate::Outcome;
use wh_core::Seat;

pub const SIZE: usize = 15;
const WIN_LENGTH: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub struct Options;

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct Action {
    pub cell: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct View {
    pub grid: Vec<Option<Seat>>,
    pub current_seat: Seat,
    pub game_over: bool,
    pub winner: Option<Seat>,
    pub is_draw: bool,
    pub winning_cells: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    GameOver,
    NotYourTurn,
    OutOfRange,
    Occupied,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GameOver => write!(f, "game-over"),
            Self::NotYourTurn => write!(f, "not-your-turn"),
            Self::OutOfRange => write!(f, "invalid-action"),
            Self::Occupied => write!(f, "illegal-move"),
        }
    }
}
impl std::error::Error for Error {}

#[derive(Debug)]
pub struct Engine {
    grid: Vec<Option<Seat>>,
    current_seat: Seat,
    moves: usize,
    last_move: Option<usize>,
    winner: Option<Option<Seat>>,
    winning_cells: Vec<usize>,
}

const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

impl Engine {
    fn row_col(cell: usize) -> (isize, isize) {
        ((cell / SIZE) as isize, (cell % SIZE) as isize)
    }
    fn cell_of(row: isize, col: isize) -> Option<usize> {
        if row < 0 || col < 0 || row >= SIZE as isize || col >= SIZE as isize {
            None
        } else {
            Some((row as usize) * SIZE + col as usize)
        }
    }
    fn line_through(&self, last: usize, seat: Seat) -> Option<Vec<usize>> {
        let (r0, c0) = Self::row_col(last);
        for (dr, dc) in DIRECTIONS {
            let mut cells = vec![last];
            let mut r = r0 + dr;
            let mut c = c0 + dc;
            while let Some(idx) = Self::cell_of(r, c) {
                if self.grid[idx] == Some(seat) {
                    cells.push(idx);
                    r += dr;
                    c += dc;
                } else {
                    break;
                }
            }
            r = r0 - dr;
            c = c0 - dc;
            while let Some(idx) = Self::cell_of(r, c) {
                if self.grid[idx] == Some(seat) {
                    cells.push(idx);
                    r -= dr;
                    c -= dc;
                } else {
                    break;
                }
            }
            if cells.len() >= WIN_LENGTH {
                return Some(cells);
            }
        }
        None
    }
    fn center(&self) -> usize {
        (SIZE / 2) * SIZE + SIZE / 2
    }
}

impl GameEngine for Engine {
    type Options = Options;
    type Action = Action;
    type View = View;
    type Error = Error;

    fn init(_options: Options) -> Self {
        Self {
            grid: vec![None; SIZE * SIZE],
            current_seat: 0,
            moves: 0,
            last_move: None,
            winner: None,
            winning_cells: Vec::new(),
        }
    }

    fn apply(&mut self, seat: Seat, action: Action) -> Result<Outcome, Error> {
        if self.winner.is_some() {
            return Err(Error::GameOver);
        }
        if seat != self.current_seat {
            return Err(Error::NotYourTurn);
        }
        if action.cell >= SIZE * SIZE {
            return Err(Error::OutOfRange);
        }
        if self.grid[action.cell].is_some() {
            return Err(Error::Occupied);
        }
        self.grid[action.cell] = Some(seat);
        self.moves += 1;
        self.last_move = Some(action.cell);
        if let Some(cells) = self.line_through(action.cell, seat) {
            self.winner = Some(Some(seat));
            self.winning_cells = cells;
            return Ok(Outcome::GameOver {
                winner: Some(seat),
            });
        }
        if self.moves == SIZE * SIZE {
            self.winner = Some(None);
            return Ok(Outcome::GameOver { winner: None });
        }
        self.current_seat = 1 - self.current_seat;
        Ok(Outcome::Applied)
    }

    fn view(&self, _seat: Seat) -> View {
        View {
            grid: self.grid.clone(),
            current_seat: self.current_seat,
            game_over: self.winner.is_some(),
            winner: self.winner.flatten(),
            is_draw: matches!(self.winner, Some(None)),
            winning_cells: self.winning_cells.clone(),
        }
    }

    fn auto_fallback(&self, _seat: Seat) -> Option<Action> {
        let center = self.center();
        if self.grid[center].is_none() {
            return Some(Action { cell: center });
        }
        if let Some(last) = self.last_move {
            let (r0, c0) = Self::row_col(last);
            for dr in -1..=1isize {
                for dc in -1..=1isize {
                    if dr == 0 && dc == 0 {
                        continue;
                    }
                    if let Some(idx) = Self::cell_of(r0 + dr, c0 + dc) {
                        if self.grid[idx].is_none() {
                            return Some(Action { cell: idx });
                        }
                    }
                }
            }
        }
        self.grid
            .iter()
            .position(|c| c.is_none())
            .map(|cell| Action { cell })
    }

    fn current_seat(&self) -> Seat {
        self.current_seat
    }

    fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    fn is_round_over(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: usize, col: usize) -> usize {
        row * SIZE + col
    }

    #[test]
    fn diagonal_win_length_five() {
        let mut e = Engine::init(Options);
        let seat0 = [(7, 7), (8, 8), (9, 9), (10, 10)];
        let blockers = [(0, 0), (0, 1), (0, 2)];
        for i in 0..3 {
            e.apply(0, Action { cell: cell(seat0[i].0, seat0[i].1) })
                .unwrap();
            e.apply(1, Action { cell: cell(blockers[i].0, blockers[i].1) })
                .unwrap();
        }
        let outcome = e
            .apply(0, Action { cell: cell(seat0[3].0, seat0[3].1) })
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);
        let outcome = e
            .apply(1, Action { cell: cell(1, 3) })
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);
        let outcome = e.apply(0, Action { cell: cell(11, 11) }).unwrap();
        assert_eq!(outcome, Outcome::GameOver { winner: Some(0) });
        assert_eq!(e.winning_cells.len(), 5);
    }

    #[test]
    fn auto_fallback_prefers_center_then_adjacent() {
        let e = Engine::init(Options);
        let fallback = e.auto_fallback(0).unwrap();
        assert_eq!(fallback.cell, e.center());
    }
}
