//! 8x8 American checkers. Dark squares only (row+col odd). Mandatory
//! capture, multi-jump continuation, kings.

use crate::GameEngine;
use crate::Outcome;
use wh_core::Seat;

const SIZE: usize = 8;

#[derive(Debug, Clone, Copy, Default)]
pub struct Options;

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct Action {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Piece {
    pub seat: Seat,
    pub king: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct View {
    pub board: Vec<Option<Piece>>,
    pub current_seat: Seat,
    pub must_continue_from: Option<usize>,
    pub game_over: bool,
    pub winner: Option<Seat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    GameOver,
    NotYourTurn,
    WrongPiece,
    IllegalMove,
    MustCapture,
    MustContinueJump,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GameOver => write!(f, "game-over"),
            Self::NotYourTurn => write!(f, "not-your-turn"),
            Self::WrongPiece => write!(f, "wrong-piece"),
            Self::IllegalMove => write!(f, "illegal-move"),
            Self::MustCapture => write!(f, "must-capture"),
            Self::MustContinueJump => write!(f, "must-continue-jump"),
        }
    }
}
impl std::error::Error for Error {}

#[derive(Debug)]
pub struct Engine {
    board: [Option<Piece>; SIZE * SIZE],
    current_seat: Seat,
    must_continue_from: Option<usize>,
    winner: Option<Seat>,
}

fn rc(sq: usize) -> (isize, isize) {
    ((sq / SIZE) as isize, (sq % SIZE) as isize)
}
fn sq_of(row: isize, col: isize) -> Option<usize> {
    if row < 0 || col < 0 || row >= SIZE as isize || col >= SIZE as isize {
        None
    } else {
        Some((row as usize) * SIZE + col as usize)
    }
}
fn directions(piece: Piece) -> &'static [(isize, isize)] {
    const KING: [(isize, isize); 4] = [(1, -1), (1, 1), (-1, -1), (-1, 1)];
    const FORWARD: [(isize, isize); 2] = [(1, -1), (1, 1)];
    const BACKWARD: [(isize, isize); 2] = [(-1, -1), (-1, 1)];
    if piece.king {
        &KING
    } else if piece.seat == 0 {
        &FORWARD
    } else {
        &BACKWARD
    }
}
fn promotes(piece: Piece, row: isize) -> bool {
    !piece.king && ((piece.seat == 0 && row == 7) || (piece.seat == 1 && row == 0))
}

impl Engine {
    fn captures_from(&self, sq: usize) -> Vec<(usize, usize)> {
        let Some(piece) = self.board[sq] else {
            return Vec::new();
        };
        let (r, c) = rc(sq);
        let mut out = Vec::new();
        for (dr, dc) in directions(piece) {
            if let Some(mid) = sq_of(r + dr, c + dc) {
                if let Some(over) = self.board[mid] {
                    if over.seat != piece.seat {
                        if let Some(land) = sq_of(r + 2 * dr, c + 2 * dc) {
                            if self.board[land].is_none() {
                                out.push((mid, land));
                            }
                        }
                    }
                }
            }
        }
        out
    }
    fn simple_moves_from(&self, sq: usize) -> Vec<usize> {
        let Some(piece) = self.board[sq] else {
            return Vec::new();
        };
        let (r, c) = rc(sq);
        let mut out = Vec::new();
        for (dr, dc) in directions(piece) {
            if let Some(to) = sq_of(r + dr, c + dc) {
                if self.board[to].is_none() {
                    out.push(to);
                }
            }
        }
        out
    }
    fn seat_squares(&self, seat: Seat) -> impl Iterator<Item = usize> + '_ {
        (0..SIZE * SIZE).filter(move |&sq| self.board[sq].map(|p| p.seat) == Some(seat))
    }
    fn any_capture(&self, seat: Seat) -> Vec<usize> {
        self.seat_squares(seat)
            .filter(|&sq| !self.captures_from(sq).is_empty())
            .collect()
    }
    fn has_legal_move(&self, seat: Seat) -> bool {
        self.seat_squares(seat)
            .any(|sq| !self.captures_from(sq).is_empty() || !self.simple_moves_from(sq).is_empty())
    }
    fn finalize_turn(&mut self) {
        let mover = self.current_seat;
        if self.seat_squares(mover).next().is_none() || !self.has_legal_move(mover) {
            self.winner = Some(1 - mover);
        }
    }
}

impl GameEngine for Engine {
    type Options = Options;
    type Action = Action;
    type View = View;
    type Error = Error;

    fn init(_options: Options) -> Self {
        let mut board = [None; SIZE * SIZE];
        for row in 0..3 {
            for col in 0..SIZE {
                if (row + col) % 2 == 1 {
                    board[row * SIZE + col] = Some(Piece { seat: 0, king: false });
                }
            }
        }
        for row in 5..8 {
            for col in 0..SIZE {
                if (row + col) % 2 == 1 {
                    board[row * SIZE + col] = Some(Piece { seat: 1, king: false });
                }
            }
        }
        Self {
            board,
            current_seat: 0,
            must_continue_from: None,
            winner: None,
        }
    }

    fn apply(&mut self, seat: Seat, action: Action) -> Result<Outcome, Error> {
        if self.winner.is_some() {
            return Err(Error::GameOver);
        }
        if seat != self.current_seat {
            return Err(Error::NotYourTurn);
        }
        if let Some(forced) = self.must_continue_from {
            if forced != action.from {
                return Err(Error::MustContinueJump);
            }
        }
        let piece = self.board[action.from].ok_or(Error::WrongPiece)?;
        if piece.seat != seat {
            return Err(Error::WrongPiece);
        }

        let captures = self.captures_from(action.from);
        let capture_move = captures.iter().find(|(_, to)| *to == action.to).copied();

        if self.must_continue_from.is_none() {
            let mandatory = self.any_capture(seat);
            if !mandatory.is_empty() && capture_move.is_none() {
                return Err(Error::MustCapture);
            }
        }

        let (captured_sq, landed) = match capture_move {
            Some((over, to)) => (Some(over), to),
            None => {
                if !self.simple_moves_from(action.from).contains(&action.to) {
                    return Err(Error::IllegalMove);
                }
                (None, action.to)
            }
        };

        self.board[action.from] = None;
        if let Some(over) = captured_sq {
            self.board[over] = None;
        }
        let (to_row, _) = rc(landed);
        let promoted = promotes(piece, to_row);
        let landed_piece = Piece {
            seat: piece.seat,
            king: piece.king || promoted,
        };
        self.board[landed] = Some(landed_piece);

        if captured_sq.is_some() && !promoted && !self.captures_from(landed).is_empty() {
            self.must_continue_from = Some(landed);
            return Ok(Outcome::Applied);
        }

        self.must_continue_from = None;
        self.current_seat = 1 - self.current_seat;
        self.finalize_turn();
        match self.winner {
            Some(winner) => Ok(Outcome::GameOver {
                winner: Some(winner),
            }),
            None => Ok(Outcome::Applied),
        }
    }

    fn view(&self, _seat: Seat) -> View {
        View {
            board: self.board.to_vec(),
            current_seat: self.current_seat,
            must_continue_from: self.must_continue_from,
            game_over: self.winner.is_some(),
            winner: self.winner,
        }
    }

    fn auto_fallback(&self, seat: Seat) -> Option<Action> {
        if let Some(from) = self.must_continue_from {
            if let Some((_, to)) = self.captures_from(from).first() {
                return Some(Action { from, to: *to });
            }
        }
        let mandatory = self.any_capture(seat);
        if let Some(&from) = mandatory.first() {
            if let Some((_, to)) = self.captures_from(from).first() {
                return Some(Action { from, to: *to });
            }
        }
        for from in self.seat_squares(seat) {
            if let Some(&to) = self.simple_moves_from(from).first() {
                return Some(Action { from, to });
            }
        }
        None
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

    fn empty() -> Engine {
        Engine {
            board: [None; SIZE * SIZE],
            current_seat: 0,
            must_continue_from: None,
            winner: None,
        }
    }
    fn at(row: usize, col: usize) -> usize {
        row * SIZE + col
    }

    #[test]
    fn piece_count_non_increasing_and_decreases_only_on_capture() {
        let mut e = Engine::init(Options);
        let before = e.board.iter().filter(|p| p.is_some()).count();
        e.apply(0, Action { from: at(2, 1), to: at(3, 0) }).unwrap();
        let after = e.board.iter().filter(|p| p.is_some()).count();
        assert_eq!(before, after, "simple move never captures");
    }

    #[test]
    fn mandatory_capture_rejects_non_capturing_move() {
        let mut e = empty();
        e.board[at(2, 1)] = Some(Piece { seat: 0, king: false });
        e.board[at(3, 2)] = Some(Piece { seat: 1, king: false });
        e.board[at(5, 4)] = Some(Piece { seat: 0, king: false });
        assert_eq!(
            e.apply(0, Action { from: at(5, 4), to: at(6, 5) }),
            Err(Error::MustCapture)
        );
        let outcome = e.apply(0, Action { from: at(2, 1), to: at(4, 3) }).unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert!(e.board[at(3, 2)].is_none(), "captured piece removed");
    }

    #[test]
    fn multi_jump_continues_from_landing_square() {
        let mut e = empty();
        e.board[at(2, 1)] = Some(Piece { seat: 0, king: false });
        e.board[at(3, 2)] = Some(Piece { seat: 1, king: false });
        e.board[at(5, 4)] = Some(Piece { seat: 1, king: false });
        e.apply(0, Action { from: at(2, 1), to: at(4, 3) }).unwrap();
        assert_eq!(e.must_continue_from, Some(at(4, 3)));
        assert_eq!(e.current_seat, 0, "turn not passed mid multi-jump");
        assert_eq!(
            e.apply(0, Action { from: at(2, 1), to: at(6, 5) }),
            Err(Error::MustContinueJump)
        );
        e.apply(0, Action { from: at(4, 3), to: at(6, 5) }).unwrap();
        assert!(e.must_continue_from.is_none());
        assert_eq!(e.current_seat, 1);
    }

    #[test]
    fn capturing_the_last_opposing_piece_wins_for_the_mover() {
        let mut e = empty();
        e.board[at(2, 1)] = Some(Piece { seat: 0, king: false });
        e.board[at(3, 2)] = Some(Piece { seat: 1, king: false });
        let outcome = e.apply(0, Action { from: at(2, 1), to: at(4, 3) }).unwrap();
        assert_eq!(outcome, Outcome::GameOver { winner: Some(0) });
        assert_eq!(e.winner, Some(0));
    }
}
