//! Full chess legality: pseudo-legal generation per piece, then king-in-check
//! filtering by simulating the move on a scratch board and testing whether
//! the mover's own king is attacked afterward.

use crate::GameEngine;
use crate::Outcome;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use wh_core::Seat;

#[derive(Debug, Clone, Copy, Default)]
pub struct Options;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Kind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PromotionPiece {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl From<PromotionPiece> for Kind {
    fn from(p: PromotionPiece) -> Self {
        match p {
            PromotionPiece::Queen => Kind::Queen,
            PromotionPiece::Rook => Kind::Rook,
            PromotionPiece::Bishop => Kind::Bishop,
            PromotionPiece::Knight => Kind::Knight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Piece {
    pub seat: Seat,
    pub kind: Kind,
}

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Move {
        from: usize,
        to: usize,
        #[serde(default)]
        promotion: Option<PromotionPiece>,
    },
    Resign,
}

#[derive(Debug, Clone, Copy)]
struct CastleRights {
    king_side: bool,
    queen_side: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct View {
    pub board: Vec<Option<Piece>>,
    pub current_seat: Seat,
    pub game_over: bool,
    pub winner: Option<Seat>,
    pub is_draw: bool,
    pub in_check: bool,
    pub halfmove_clock: u32,
    pub repetition_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    GameOver,
    NotYourTurn,
    WrongPiece,
    IllegalMove,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GameOver => write!(f, "game-over"),
            Self::NotYourTurn => write!(f, "not-your-turn"),
            Self::WrongPiece => write!(f, "wrong-piece"),
            Self::IllegalMove => write!(f, "illegal-move"),
        }
    }
}
impl std::error::Error for Error {}

type Board = [Option<Piece>; 64];

#[derive(Debug)]
pub struct Engine {
    board: Board,
    current_seat: Seat,
    rights: [CastleRights; 2],
    en_passant: Option<usize>,
    halfmove_clock: u32,
    history: Vec<u64>,
    winner: Option<Option<Seat>>,
}

fn rc(sq: usize) -> (isize, isize) {
    ((sq / 8) as isize, (sq % 8) as isize)
}
fn sq_of(r: isize, c: isize) -> Option<usize> {
    if (0..8).contains(&r) && (0..8).contains(&c) {
        Some((r * 8 + c) as usize)
    } else {
        None
    }
}
fn pawn_dir(seat: Seat) -> isize {
    if seat == 0 {
        1
    } else {
        -1
    }
}
fn start_rank(seat: Seat) -> isize {
    if seat == 0 {
        1
    } else {
        6
    }
}
fn last_rank(seat: Seat) -> isize {
    if seat == 0 {
        7
    } else {
        0
    }
}
const KNIGHT_DELTAS: [(isize, isize); 8] = [
    (1, 2), (2, 1), (-1, 2), (-2, 1), (1, -2), (2, -1), (-1, -2), (-2, -1),
];
const BISHOP_DIRS: [(isize, isize); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_DIRS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const KING_DELTAS: [(isize, isize); 8] = [
    (1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (1, -1), (-1, 1), (-1, -1),
];

/// Squares this piece attacks, ignoring whose turn it is and without
/// pawn-forward/castling moves (which are not attacks).
fn attacks_from(board: &Board, from: usize) -> Vec<usize> {
    let Some(piece) = board[from] else {
        return Vec::new();
    };
    let (r, c) = rc(from);
    match piece.kind {
        Kind::Pawn => {
            let dir = pawn_dir(piece.seat);
            [(dir, -1), (dir, 1)]
                .into_iter()
                .filter_map(|(dr, dc)| sq_of(r + dr, c + dc))
                .collect()
        }
        Kind::Knight => KNIGHT_DELTAS
            .into_iter()
            .filter_map(|(dr, dc)| sq_of(r + dr, c + dc))
            .collect(),
        Kind::King => KING_DELTAS
            .into_iter()
            .filter_map(|(dr, dc)| sq_of(r + dr, c + dc))
            .collect(),
        Kind::Bishop | Kind::Rook | Kind::Queen => {
            let dirs: Vec<(isize, isize)> = match piece.kind {
                Kind::Bishop => BISHOP_DIRS.to_vec(),
                Kind::Rook => ROOK_DIRS.to_vec(),
                _ => [BISHOP_DIRS.to_vec(), ROOK_DIRS.to_vec()].concat(),
            };
            let mut out = Vec::new();
            for (dr, dc) in &dirs {
                let mut cur = (r, c);
                loop {
                    cur = (cur.0 + dr, cur.1 + dc);
                    let Some(sq) = sq_of(cur.0, cur.1) else { break };
                    out.push(sq);
                    if board[sq].is_some() {
                        break;
                    }
                }
            }
            out
        }
    }
}

fn square_attacked(board: &Board, sq: usize, by_seat: Seat) -> bool {
    (0..64).any(|from| {
        board[from].map(|p| p.seat) == Some(by_seat) && attacks_from(board, from).contains(&sq)
    })
}

fn king_square(board: &Board, seat: Seat) -> Option<usize> {
    (0..64).find(|&sq| board[sq] == Some(Piece { seat, kind: Kind::King }))
}

impl Engine {
    fn pseudo_targets(&self, from: usize) -> Vec<(usize, bool, bool)> {
        // (to, is_promotion, is_en_passant_capture)
        let Some(piece) = self.board[from] else {
            return Vec::new();
        };
        let (r, c) = rc(from);
        let mut out = Vec::new();
        match piece.kind {
            Kind::Pawn => {
                let dir = pawn_dir(piece.seat);
                if let Some(one) = sq_of(r + dir, c) {
                    if self.board[one].is_none() {
                        out.push((one, (r + dir) == last_rank(piece.seat), false));
                        if r == start_rank(piece.seat) {
                            if let Some(two) = sq_of(r + 2 * dir, c) {
                                if self.board[two].is_none() {
                                    out.push((two, false, false));
                                }
                            }
                        }
                    }
                }
                for dc in [-1, 1] {
                    if let Some(cap) = sq_of(r + dir, c + dc) {
                        if let Some(target) = self.board[cap] {
                            if target.seat != piece.seat {
                                out.push((cap, (r + dir) == last_rank(piece.seat), false));
                            }
                        } else if self.en_passant == Some(cap) {
                            out.push((cap, false, true));
                        }
                    }
                }
            }
            Kind::Knight | Kind::King => {
                let deltas: &[(isize, isize)] = if piece.kind == Kind::Knight {
                    &KNIGHT_DELTAS
                } else {
                    &KING_DELTAS
                };
                for (dr, dc) in deltas {
                    if let Some(to) = sq_of(r + dr, c + dc) {
                        if self.board[to].map(|p| p.seat) != Some(piece.seat) {
                            out.push((to, false, false));
                        }
                    }
                }
            }
            Kind::Bishop | Kind::Rook | Kind::Queen => {
                let dirs: Vec<(isize, isize)> = match piece.kind {
                    Kind::Bishop => BISHOP_DIRS.to_vec(),
                    Kind::Rook => ROOK_DIRS.to_vec(),
                    _ => [BISHOP_DIRS.to_vec(), ROOK_DIRS.to_vec()].concat(),
                };
                for (dr, dc) in dirs {
                    let mut cur = (r, c);
                    loop {
                        cur = (cur.0 + dr, cur.1 + dc);
                        let Some(sq) = sq_of(cur.0, cur.1) else { break };
                        match self.board[sq] {
                            None => out.push((sq, false, false)),
                            Some(target) => {
                                if target.seat != piece.seat {
                                    out.push((sq, false, false));
                                }
                                break;
                            }
                        }
                    }
                }
            }
        }
        out
    }

    fn castle_targets(&self, seat: Seat) -> Vec<usize> {
        if square_attacked(&self.board, king_square(&self.board, seat).unwrap(), 1 - seat) {
            return Vec::new();
        }
        let rank = if seat == 0 { 0 } else { 7 };
        let mut out = Vec::new();
        let rights = self.rights[seat];
        if rights.king_side
            && self.board[rank * 8 + 5].is_none()
            && self.board[rank * 8 + 6].is_none()
            && !square_attacked(&self.board, rank * 8 + 5, 1 - seat)
            && !square_attacked(&self.board, rank * 8 + 6, 1 - seat)
        {
            out.push(rank * 8 + 6);
        }
        if rights.queen_side
            && self.board[rank * 8 + 3].is_none()
            && self.board[rank * 8 + 2].is_none()
            && self.board[rank * 8 + 1].is_none()
            && !square_attacked(&self.board, rank * 8 + 3, 1 - seat)
            && !square_attacked(&self.board, rank * 8 + 2, 1 - seat)
        {
            out.push(rank * 8 + 2);
        }
        out
    }

    fn simulate(&self, from: usize, to: usize, en_passant_capture: bool, promotion: Option<PromotionPiece>) -> Board {
        let mut board = self.board;
        let piece = board[from].unwrap();
        board[from] = None;
        if en_passant_capture {
            let captured = (rc(from).0) * 8 + rc(to).1;
            board[captured as usize] = None;
        }
        let landed_kind = promotion.map(Kind::from).unwrap_or(piece.kind);
        board[to] = Some(Piece { seat: piece.seat, kind: landed_kind });
        if piece.kind == Kind::King && (to as isize - from as isize).abs() == 2 {
            let rank = rc(from).0;
            if to % 8 == 6 {
                board[(rank * 8 + 7) as usize] = None;
                board[(rank * 8 + 5) as usize] = Some(Piece { seat: piece.seat, kind: Kind::Rook });
            } else {
                board[(rank * 8) as usize] = None;
                board[(rank * 8 + 3) as usize] = Some(Piece { seat: piece.seat, kind: Kind::Rook });
            }
        }
        board
    }

    fn legal_destinations(&self, from: usize) -> Vec<(usize, bool, bool)> {
        let Some(piece) = self.board[from] else {
            return Vec::new();
        };
        let mut candidates = self.pseudo_targets(from);
        if piece.kind == Kind::King {
            let is_castle = (from as isize) % 8 == 4;
            if is_castle {
                for to in self.castle_targets(piece.seat) {
                    candidates.push((to, false, false));
                }
            }
        }
        candidates
            .into_iter()
            .filter(|(to, _, ep)| {
                let scratch = self.simulate(from, *to, *ep, None);
                let king_sq = king_square(&scratch, piece.seat).expect("king on board");
                !square_attacked(&scratch, king_sq, 1 - piece.seat)
            })
            .collect()
    }

    fn has_any_legal_move(&self, seat: Seat) -> bool {
        (0..64).any(|sq| {
            self.board[sq].map(|p| p.seat) == Some(seat) && !self.legal_destinations(sq).is_empty()
        })
    }

    fn position_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for cell in self.board.iter() {
            cell.map(|p| (p.seat, p.kind)).hash(&mut hasher);
        }
        self.current_seat.hash(&mut hasher);
        self.en_passant.hash(&mut hasher);
        hasher.finish()
    }

    fn repetition_count(&self) -> u32 {
        let current = *self.history.last().unwrap_or(&0);
        self.history.iter().filter(|h| **h == current).count() as u32
    }
}

impl GameEngine for Engine {
    type Options = Options;
    type Action = Action;
    type View = View;
    type Error = Error;

    fn init(_options: Options) -> Self {
        let mut board: Board = [None; 64];
        let back = [
            Kind::Rook, Kind::Knight, Kind::Bishop, Kind::Queen,
            Kind::King, Kind::Bishop, Kind::Knight, Kind::Rook,
        ];
        for (file, kind) in back.into_iter().enumerate() {
            board[file] = Some(Piece { seat: 0, kind });
            board[8 + file] = Some(Piece { seat: 0, kind: Kind::Pawn });
            board[48 + file] = Some(Piece { seat: 1, kind: Kind::Pawn });
            board[56 + file] = Some(Piece { seat: 1, kind });
        }
        let mut engine = Self {
            board,
            current_seat: 0,
            rights: [
                CastleRights { king_side: true, queen_side: true },
                CastleRights { king_side: true, queen_side: true },
            ],
            en_passant: None,
            halfmove_clock: 0,
            history: Vec::new(),
            winner: None,
        };
        engine.history.push(engine.position_hash());
        engine
    }

    fn apply(&mut self, seat: Seat, action: Action) -> Result<Outcome, Error> {
        if self.winner.is_some() {
            return Err(Error::GameOver);
        }
        if seat != self.current_seat {
            return Err(Error::NotYourTurn);
        }
        let (from, to, promotion) = match action {
            Action::Resign => {
                self.winner = Some(Some(1 - seat));
                return Ok(Outcome::GameOver { winner: Some(1 - seat) });
            }
            Action::Move { from, to, promotion } => (from, to, promotion),
        };
        let piece = self.board[from].ok_or(Error::WrongPiece)?;
        if piece.seat != seat {
            return Err(Error::WrongPiece);
        }
        let options = self.legal_destinations(from);
        let matched = options.iter().find(|(dest, _, _)| *dest == to).copied();
        let Some((_, is_promotion, en_passant_capture)) = matched else {
            return Err(Error::IllegalMove);
        };
        let promotion = if is_promotion {
            Some(promotion.unwrap_or(PromotionPiece::Queen))
        } else {
            promotion
        };

        let capture = self.board[to].is_some() || en_passant_capture;
        let pawn_move = piece.kind == Kind::Pawn;
        self.board = self.simulate(from, to, en_passant_capture, promotion);

        if piece.kind == Kind::King {
            self.rights[seat] = CastleRights { king_side: false, queen_side: false };
        }
        for (corner, seat_idx, king_side) in [
            (0usize, 0usize, false), (7, 0, true), (56, 1, false), (63, 1, true),
        ] {
            if from == corner || to == corner {
                if king_side {
                    self.rights[seat_idx].king_side = false;
                } else {
                    self.rights[seat_idx].queen_side = false;
                }
            }
        }

        self.en_passant = if pawn_move && (to as isize - from as isize).unsigned_abs() == 16 {
            Some((from + to) / 2)
        } else {
            None
        };

        self.halfmove_clock = if pawn_move || capture { 0 } else { self.halfmove_clock + 1 };
        self.current_seat = 1 - seat;
        self.history.push(self.position_hash());

        if !self.has_any_legal_move(self.current_seat) {
            let king_sq = king_square(&self.board, self.current_seat).expect("king on board");
            let in_check = square_attacked(&self.board, king_sq, seat);
            let winner = if in_check { Some(seat) } else { None };
            self.winner = Some(winner);
            return Ok(Outcome::GameOver { winner });
        }
        Ok(Outcome::Applied)
    }

    fn view(&self, _seat: Seat) -> View {
        let king_sq = king_square(&self.board, self.current_seat);
        let in_check = king_sq
            .map(|sq| square_attacked(&self.board, sq, 1 - self.current_seat))
            .unwrap_or(false);
        View {
            board: self.board.to_vec(),
            current_seat: self.current_seat,
            game_over: self.winner.is_some(),
            winner: self.winner.flatten(),
            is_draw: matches!(self.winner, Some(None)),
            in_check,
            halfmove_clock: self.halfmove_clock,
            repetition_count: self.repetition_count(),
        }
    }

    fn auto_fallback(&self, seat: Seat) -> Option<Action> {
        for from in 0..64 {
            if self.board[from].map(|p| p.seat) != Some(seat) {
                continue;
            }
            let mut dests = self.legal_destinations(from);
            dests.sort_by_key(|(to, ..)| *to);
            if let Some((to, is_promotion, _)) = dests.first() {
                let promotion = is_promotion.then_some(PromotionPiece::Queen);
                return Some(Action::Move { from, to: *to, promotion });
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

    fn sq(file: usize, rank: usize) -> usize {
        rank * 8 + file
    }

    fn empty() -> Engine {
        Engine {
            board: [None; 64],
            current_seat: 0,
            rights: [
                CastleRights { king_side: false, queen_side: false },
                CastleRights { king_side: false, queen_side: false },
            ],
            en_passant: None,
            halfmove_clock: 0,
            history: Vec::new(),
            winner: None,
        }
    }

    #[test]
    fn scholars_mate_checkmates() {
        let mut e = Engine::init(Options);
        let moves: [(usize, usize, Seat); 7] = [
            (sq(4, 1), sq(4, 3), 0),
            (sq(4, 6), sq(4, 4), 1),
            (sq(5, 0), sq(2, 3), 0),
            (sq(1, 7), sq(2, 5), 1),
            (sq(3, 0), sq(7, 4), 0),
            (sq(1, 6), sq(1, 5), 1),
            (sq(7, 4), sq(5, 6), 0),
        ];
        let mut last = Ok(Outcome::Applied);
        for (from, to, seat) in moves {
            last = e.apply(seat, Action::Move { from, to, promotion: None });
        }
        assert_eq!(last, Ok(Outcome::GameOver { winner: Some(0) }));
        assert!(e.is_over());
    }

    #[test]
    fn king_cannot_move_into_check() {
        let mut e = empty();
        e.board[sq(4, 0)] = Some(Piece { seat: 0, kind: Kind::King });
        e.board[sq(4, 7)] = Some(Piece { seat: 1, kind: Kind::King });
        e.board[sq(0, 7)] = Some(Piece { seat: 1, kind: Kind::Rook });
        let dests: Vec<usize> = e
            .legal_destinations(sq(4, 0))
            .into_iter()
            .map(|(to, ..)| to)
            .collect();
        assert!(!dests.contains(&sq(0, 0)), "moving onto an attacked file is illegal");
    }

    #[test]
    fn en_passant_capture_available_immediately_after_double_push() {
        let mut e = empty();
        e.board[sq(4, 0)] = Some(Piece { seat: 0, kind: Kind::King });
        e.board[sq(4, 7)] = Some(Piece { seat: 1, kind: Kind::King });
        e.board[sq(3, 4)] = Some(Piece { seat: 0, kind: Kind::Pawn });
        e.board[sq(4, 6)] = Some(Piece { seat: 1, kind: Kind::Pawn });
        e.current_seat = 1;
        e.apply(1, Action::Move { from: sq(4, 6), to: sq(4, 4), promotion: None })
            .unwrap();
        assert_eq!(e.en_passant, Some(sq(4, 5)));
        let outcome = e
            .apply(0, Action::Move { from: sq(3, 4), to: sq(4, 5), promotion: None })
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert!(e.board[sq(4, 4)].is_none(), "captured pawn removed");
        assert_eq!(e.board[sq(4, 5)], Some(Piece { seat: 0, kind: Kind::Pawn }));
    }

    #[test]
    fn resign_ends_the_game_for_the_opponent() {
        let mut e = Engine::init(Options);
        let outcome = e.apply(0, Action::Resign).unwrap();
        assert_eq!(outcome, Outcome::GameOver { winner: Some(1) });
    }

    #[test]
    fn omitted_promotion_defaults_to_queen() {
        let mut e = empty();
        e.board[sq(4, 0)] = Some(Piece { seat: 0, kind: Kind::King });
        e.board[sq(4, 7)] = Some(Piece { seat: 1, kind: Kind::King });
        e.board[sq(0, 6)] = Some(Piece { seat: 0, kind: Kind::Pawn });
        e.apply(0, Action::Move { from: sq(0, 6), to: sq(0, 7), promotion: None })
            .unwrap();
        assert_eq!(e.board[sq(0, 7)], Some(Piece { seat: 0, kind: Kind::Queen }));
    }
}
