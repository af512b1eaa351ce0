//! Mancala (kalaha). 14 pits: 0-5 seat-0 pits, 6 seat-0 store,
//! 7-12 seat-1 pits, 13 seat-1 store. 4 seeds per playing pit initially.

use crate::GameEngine;
use crate::Outcome;
use wh_core::Seat;

const PITS: usize = 14;
const SEAT0_STORE: usize = 6;
const SEAT1_STORE: usize = 13;

#[derive(Debug, Clone, Copy, Default)]
pub struct Options;

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct Action {
    pub pit: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct View {
    pub board: [u32; PITS],
    pub current_seat: Seat,
    pub game_over: bool,
    pub winner: Option<Seat>,
    pub is_draw: bool,
    pub extra_turn: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    GameOver,
    NotYourTurn,
    WrongPit,
    EmptyPit,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GameOver => write!(f, "game-over"),
            Self::NotYourTurn => write!(f, "not-your-turn"),
            Self::WrongPit => write!(f, "wrong-piece"),
            Self::EmptyPit => write!(f, "illegal-move"),
        }
    }
}
impl std::error::Error for Error {}

#[derive(Debug)]
pub struct Engine {
    board: [u32; PITS],
    current_seat: Seat,
    winner: Option<Option<Seat>>,
    last_extra_turn: bool,
}

fn own_store(seat: Seat) -> usize {
    if seat == 0 { SEAT0_STORE } else { SEAT1_STORE }
}
fn opponent_store(seat: Seat) -> usize {
    if seat == 0 { SEAT1_STORE } else { SEAT0_STORE }
}
fn own_pits(seat: Seat) -> std::ops::RangeInclusive<usize> {
    if seat == 0 { 0..=5 } else { 7..=12 }
}
fn opposite(pit: usize) -> usize {
    12 - pit
}

impl Engine {
    fn side_empty(&self, seat: Seat) -> bool {
        own_pits(seat).map(|p| self.board[p]).sum::<u32>() == 0
    }
    fn sweep(&mut self) {
        for p in 0..=5 {
            self.board[SEAT0_STORE] += self.board[p];
            self.board[p] = 0;
        }
        for p in 7..=12 {
            self.board[SEAT1_STORE] += self.board[p];
            self.board[p] = 0;
        }
    }
}

impl GameEngine for Engine {
    type Options = Options;
    type Action = Action;
    type View = View;
    type Error = Error;

    fn init(_options: Options) -> Self {
        let mut board = [4u32; PITS];
        board[SEAT0_STORE] = 0;
        board[SEAT1_STORE] = 0;
        Self {
            board,
            current_seat: 0,
            winner: None,
            last_extra_turn: false,
        }
    }

    fn apply(&mut self, seat: Seat, action: Action) -> Result<Outcome, Error> {
        if self.winner.is_some() {
            return Err(Error::GameOver);
        }
        if seat != self.current_seat {
            return Err(Error::NotYourTurn);
        }
        if !own_pits(seat).contains(&action.pit) {
            return Err(Error::WrongPit);
        }
        let mut seeds = self.board[action.pit];
        if seeds == 0 {
            return Err(Error::EmptyPit);
        }
        self.board[action.pit] = 0;
        let skip = opponent_store(seat);
        let mut idx = action.pit;
        let mut last = idx;
        while seeds > 0 {
            idx = (idx + 1) % PITS;
            if idx == skip {
                continue;
            }
            self.board[idx] += 1;
            seeds -= 1;
            last = idx;
        }

        let extra_turn = last == own_store(seat);
        if !extra_turn && own_pits(seat).contains(&last) && self.board[last] == 1 {
            let opp = opposite(last);
            if self.board[opp] > 0 {
                let captured = self.board[opp] + self.board[last];
                self.board[opp] = 0;
                self.board[last] = 0;
                self.board[own_store(seat)] += captured;
            }
        }

        self.last_extra_turn = extra_turn;
        if self.side_empty(0) || self.side_empty(1) {
            self.sweep();
            let winner = match self.board[SEAT0_STORE].cmp(&self.board[SEAT1_STORE]) {
                std::cmp::Ordering::Greater => Some(0),
                std::cmp::Ordering::Less => Some(1),
                std::cmp::Ordering::Equal => Some(seat), // last mover wins a tie
            };
            self.winner = Some(winner);
            return Ok(Outcome::GameOver { winner });
        }

        if !extra_turn {
            self.current_seat = 1 - self.current_seat;
        }
        Ok(Outcome::Applied)
    }

    fn view(&self, _seat: Seat) -> View {
        View {
            board: self.board,
            current_seat: self.current_seat,
            game_over: self.winner.is_some(),
            winner: self.winner.flatten(),
            is_draw: false,
            extra_turn: self.last_extra_turn,
        }
    }

    fn auto_fallback(&self, seat: Seat) -> Option<Action> {
        own_pits(seat)
            .find(|&p| self.board[p] > 0)
            .map(|pit| Action { pit })
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

    #[test]
    fn pit_sum_invariant_is_forty_eight() {
        let mut e = Engine::init(Options);
        e.apply(0, Action { pit: 2 }).unwrap();
        assert_eq!(e.board.iter().sum::<u32>(), 48);
    }

    #[test]
    fn extra_turn_on_store_landing() {
        let mut e = Engine::init(Options);
        // pit 2 has 4 seeds: lands in 3,4,5,6(store) -> extra turn.
        let outcome = e.apply(0, Action { pit: 2 }).unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(e.current_seat, 0);
        assert!(e.last_extra_turn);
    }

    #[test]
    fn capture_moves_opposite_plus_landing_to_store() {
        let mut e = Engine::init(Options);
        e.board = [0; PITS];
        e.board[5] = 8;
        e.board[12] = 3;
        let outcome = e.apply(0, Action { pit: 5 }).unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(e.board[0], 0, "landing pit emptied by capture");
        assert_eq!(e.board[12], 0, "opposite pit emptied by capture");
        assert_eq!(e.board[SEAT0_STORE], 6, "1 sown + opposite(4) + landing(1)");
        assert_eq!(e.current_seat, 1, "capture does not grant an extra turn");
    }

    #[test]
    fn wrong_pit_rejected() {
        let mut e = Engine::init(Options);
        assert_eq!(e.apply(0, Action { pit: 7 }), Err(Error::WrongPit));
    }

    #[test]
    fn empty_pit_rejected() {
        let mut e = Engine::init(Options);
        e.board[0] = 0;
        assert_eq!(e.apply(0, Action { pit: 0 }), Err(Error::EmptyPit));
    }
}
