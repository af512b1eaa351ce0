//! Square-grid tic-tac-toe, N in {3,5,7}. Win length 3 when N=3, else 4.

use crate::GameEngine;
use crate::Outcome;
use rand::Rng;
use wh_core::Seat;

#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub n: u8,
}

impl Default for Options {
    fn default() -> Self {
        Self { n: 3 }
    }
}

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct Action {
    pub cell: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct View {
    pub n: u8,
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
    n: u8,
    win_length: u8,
    grid: Vec<Option<Seat>>,
    current_seat: Seat,
    moves: usize,
    winner: Option<Option<Seat>>,
    winning_cells: Vec<usize>,
}

const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

impl Engine {
    fn cells(&self) -> usize {
        (self.n as usize) * (self.n as usize)
    }
    fn row_col(&self, cell: usize) -> (isize, isize) {
        let n = self.n as isize;
        ((cell as isize) / n, (cell as isize) % n)
    }
    fn cell_of(&self, row: isize, col: isize) -> Option<usize> {
        let n = self.n as isize;
        if row < 0 || col < 0 || row >= n || col >= n {
            None
        } else {
            Some((row * n + col) as usize)
        }
    }
    fn line_through(&self, last: usize, seat: Seat) -> Option<Vec<usize>> {
        let (r0, c0) = self.row_col(last);
        for (dr, dc) in DIRECTIONS {
            let mut cells = vec![last];
            let mut r = r0 + dr;
            let mut c = c0 + dc;
            while let Some(idx) = self.cell_of(r, c) {
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
            while let Some(idx) = self.cell_of(r, c) {
                if self.grid[idx] == Some(seat) {
                    cells.push(idx);
                    r -= dr;
                    c -= dc;
                } else {
                    break;
                }
            }
            if cells.len() >= self.win_length as usize {
                return Some(cells);
            }
        }
        None
    }
}

impl GameEngine for Engine {
    type Options = Options;
    type Action = Action;
    type View = View;
    type Error = Error;

    fn init(options: Options) -> Self {
        let n = options.n;
        let win_length = if n == 3 { 3 } else { 4 };
        Self {
            n,
            win_length,
            grid: vec![None; (n as usize) * (n as usize)],
            current_seat: rand::rng().random_range(0..2),
            moves: 0,
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
        if action.cell >= self.cells() {
            return Err(Error::OutOfRange);
        }
        if self.grid[action.cell].is_some() {
            return Err(Error::Occupied);
        }
        self.grid[action.cell] = Some(seat);
        self.moves += 1;
        if let Some(cells) = self.line_through(action.cell, seat) {
            self.winner = Some(Some(seat));
            self.winning_cells = cells;
            return Ok(Outcome::GameOver {
                winner: Some(seat),
            });
        }
        if self.moves == self.cells() {
            self.winner = Some(None);
            return Ok(Outcome::GameOver { winner: None });
        }
        self.current_seat = 1 - self.current_seat;
        Ok(Outcome::Applied)
    }

    fn view(&self, _seat: Seat) -> View {
        View {
            n: self.n,
            grid: self.grid.clone(),
            current_seat: self.current_seat,
            game_over: self.winner.is_some(),
            winner: self.winner.flatten(),
            is_draw: matches!(self.winner, Some(None)),
            winning_cells: self.winning_cells.clone(),
        }
    }

    fn auto_fallback(&self, _seat: Seat) -> Option<Action> {
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

    fn forced(seat: Seat) -> Engine {
        let mut e = Engine::init(Options::default());
        e.current_seat = seat;
        e
    }

    #[test]
    fn immediate_win_scenario() {
        let mut e = forced(0);
        assert_eq!(e.apply(0, Action { cell: 0 }), Ok(Outcome::Applied));
        assert_eq!(e.apply(1, Action { cell: 3 }), Ok(Outcome::Applied));
        assert_eq!(e.apply(0, Action { cell: 1 }), Ok(Outcome::Applied));
        assert_eq!(e.apply(1, Action { cell: 4 }), Ok(Outcome::Applied));
        let outcome = e.apply(0, Action { cell: 2 }).unwrap();
        assert_eq!(outcome, Outcome::GameOver { winner: Some(0) });
        assert!(e.is_over());
    }

    #[test]
    fn occupied_cell_rejected() {
        let mut e = forced(0);
        e.apply(0, Action { cell: 0 }).unwrap();
        assert_eq!(e.apply(1, Action { cell: 0 }), Err(Error::Occupied));
    }

    #[test]
    fn out_of_turn_rejected() {
        let mut e = forced(0);
        assert_eq!(e.apply(1, Action { cell: 0 }), Err(Error::NotYourTurn));
    }

    #[test]
    fn draw_when_board_fills() {
        let mut e = forced(0);
        // X . X      X O X
        // X O O  -->  X O O  (full, no winner)
        // O X X      O X X
        let moves = [
            (0, 0usize),
            (1, 1),
            (0, 2),
            (1, 5),
            (0, 3),
            (1, 4),
            (0, 7),
            (1, 6),
            (0, 8),
        ];
        let mut last = Ok(Outcome::Applied);
        for (seat, cell) in moves {
            last = e.apply(seat, Action { cell });
        }
        assert_eq!(last, Ok(Outcome::GameOver { winner: None }));
    }

    #[test]
    fn no_post_terminal_moves() {
        let mut e = forced(0);
        e.apply(0, Action { cell: 0 }).unwrap();
        e.apply(1, Action { cell: 3 }).unwrap();
        e.apply(0, Action { cell: 1 }).unwrap();
        e.apply(1, Action { cell: 4 }).unwrap();
        e.apply(0, Action { cell: 2 }).unwrap();
        assert_eq!(e.apply(1, Action { cell: 5 }), Err(Error::GameOver));
    }
}
