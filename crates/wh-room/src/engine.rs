//! Polymorphism over the six game engines via a tagged dispatch table,
//! per the "dynamic dispatch over game engines" design note: each engine has
//! a distinct `Action`/`View`/`Error` associated type, so a single `dyn
//! GameEngine` trait object isn't an option — `AnyEngine` fans out to the
//! concrete engine the room was created for.
use wh_core::GameKind;
use wh_core::Seat;
use wh_core::Variant;
use wh_engines::GameEngine;
use wh_engines::Outcome;
use wh_engines::checkers;
use wh_engines::chess;
use wh_engines::dominoes;
use wh_engines::gomoku;
use wh_engines::mancala;
use wh_engines::tictactoe;

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum GameAction {
    TicTacToe(tictactoe::Action),
    Gomoku(gomoku::Action),
    Mancala(mancala::Action),
    Checkers(checkers::Action),
    Chess(chess::Action),
    Dominoes(dominoes::Action),
}

impl GameAction {
    /// Parses a wire `game_action` payload against the room's own game type.
    /// The wire format carries no game tag of its own — a client only ever
    /// speaks the shape of the one room it's bound to.
    pub fn parse(game: GameKind, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match game {
            GameKind::TicTacToe => Self::TicTacToe(serde_json::from_value(value)?),
            GameKind::Gomoku => Self::Gomoku(serde_json::from_value(value)?),
            GameKind::Mancala => Self::Mancala(serde_json::from_value(value)?),
            GameKind::Checkers => Self::Checkers(serde_json::from_value(value)?),
            GameKind::Chess => Self::Chess(serde_json::from_value(value)?),
            GameKind::Dominoes => Self::Dominoes(serde_json::from_value(value)?),
        })
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameView {
    // Variants below must stay in sync with `AnyEngine`'s enum; see `view()`.
    TicTacToe(tictactoe::View),
    Gomoku(gomoku::View),
    Mancala(mancala::View),
    Checkers(checkers::View),
    Chess(chess::View),
    Dominoes(dominoes::View),
}

/// Per-game rejection, flattened to the caller as the `error_msg` string
/// produced by each engine's own `Display` impl; `Malformed` covers a wire
/// payload that doesn't parse as this room's action shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    TicTacToe(tictactoe::Error),
    Gomoku(gomoku::Error),
    Mancala(mancala::Error),
    Checkers(checkers::Error),
    Chess(chess::Error),
    Dominoes(dominoes::Error),
    Malformed,
    /// The room already reached a terminal state; no engine was touched.
    RoomFinished,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TicTacToe(e) => write!(f, "{e}"),
            Self::Gomoku(e) => write!(f, "{e}"),
            Self::Mancala(e) => write!(f, "{e}"),
            Self::Checkers(e) => write!(f, "{e}"),
            Self::Chess(e) => write!(f, "{e}"),
            Self::Dominoes(e) => write!(f, "{e}"),
            Self::Malformed => write!(f, "invalid-action"),
            Self::RoomFinished => write!(f, "game-over"),
        }
    }
}
impl std::error::Error for EngineError {}

#[derive(Debug)]
pub enum AnyEngine {
    TicTacToe(tictactoe::Engine),
    Gomoku(gomoku::Engine),
    Mancala(mancala::Engine),
    Checkers(checkers::Engine),
    Chess(chess::Engine),
    Dominoes(dominoes::Engine),
}

impl AnyEngine {
    pub fn init(game: GameKind, variant: Variant) -> Self {
        match game {
            GameKind::TicTacToe => Self::TicTacToe(tictactoe::Engine::init(tictactoe::Options {
                n: variant.grid_size.unwrap_or(3),
            })),
            GameKind::Gomoku => Self::Gomoku(gomoku::Engine::init(gomoku::Options)),
            GameKind::Mancala => Self::Mancala(mancala::Engine::init(mancala::Options)),
            GameKind::Checkers => Self::Checkers(checkers::Engine::init(checkers::Options)),
            GameKind::Chess => Self::Chess(chess::Engine::init(chess::Options)),
            GameKind::Dominoes => Self::Dominoes(dominoes::Engine::init(dominoes::Options)),
        }
    }

    pub fn game_kind(&self) -> GameKind {
        match self {
            Self::TicTacToe(_) => GameKind::TicTacToe,
            Self::Gomoku(_) => GameKind::Gomoku,
            Self::Mancala(_) => GameKind::Mancala,
            Self::Checkers(_) => GameKind::Checkers,
            Self::Chess(_) => GameKind::Chess,
            Self::Dominoes(_) => GameKind::Dominoes,
        }
    }

    pub fn apply(&mut self, seat: Seat, action: GameAction) -> Result<Outcome, EngineError> {
        match (self, action) {
            (Self::TicTacToe(e), GameAction::TicTacToe(a)) => {
                e.apply(seat, a).map_err(EngineError::TicTacToe)
            }
            (Self::Gomoku(e), GameAction::Gomoku(a)) => {
                e.apply(seat, a).map_err(EngineError::Gomoku)
            }
            (Self::Mancala(e), GameAction::Mancala(a)) => {
                e.apply(seat, a).map_err(EngineError::Mancala)
            }
            (Self::Checkers(e), GameAction::Checkers(a)) => {
                e.apply(seat, a).map_err(EngineError::Checkers)
            }
            (Self::Chess(e), GameAction::Chess(a)) => e.apply(seat, a).map_err(EngineError::Chess),
            (Self::Dominoes(e), GameAction::Dominoes(a)) => {
                e.apply(seat, a).map_err(EngineError::Dominoes)
            }
            _ => Err(EngineError::Malformed),
        }
    }

    pub fn view(&self, seat: Seat) -> GameView {
        match self {
            Self::TicTacToe(e) => GameView::TicTacToe(e.view(seat)),
            Self::Gomoku(e) => GameView::Gomoku(e.view(seat)),
            Self::Mancala(e) => GameView::Mancala(e.view(seat)),
            Self::Checkers(e) => GameView::Checkers(e.view(seat)),
            Self::Chess(e) => GameView::Chess(e.view(seat)),
            Self::Dominoes(e) => GameView::Dominoes(e.view(seat)),
        }
    }

    pub fn auto_fallback(&self, seat: Seat) -> Option<GameAction> {
        match self {
            Self::TicTacToe(e) => e.auto_fallback(seat).map(GameAction::TicTacToe),
            Self::Gomoku(e) => e.auto_fallback(seat).map(GameAction::Gomoku),
            Self::Mancala(e) => e.auto_fallback(seat).map(GameAction::Mancala),
            Self::Checkers(e) => e.auto_fallback(seat).map(GameAction::Checkers),
            Self::Chess(e) => e.auto_fallback(seat).map(GameAction::Chess),
            Self::Dominoes(e) => e.auto_fallback(seat).map(GameAction::Dominoes),
        }
    }

    pub fn current_seat(&self) -> Seat {
        match self {
            Self::TicTacToe(e) => e.current_seat(),
            Self::Gomoku(e) => e.current_seat(),
            Self::Mancala(e) => e.current_seat(),
            Self::Checkers(e) => e.current_seat(),
            Self::Chess(e) => e.current_seat(),
            Self::Dominoes(e) => e.current_seat(),
        }
    }

    pub fn is_over(&self) -> bool {
        match self {
            Self::TicTacToe(e) => e.is_over(),
            Self::Gomoku(e) => e.is_over(),
            Self::Mancala(e) => e.is_over(),
            Self::Checkers(e) => e.is_over(),
            Self::Chess(e) => e.is_over(),
            Self::Dominoes(e) => e.is_over(),
        }
    }

    pub fn is_round_over(&self) -> bool {
        match self {
            Self::TicTacToe(e) => e.is_round_over(),
            Self::Gomoku(e) => e.is_round_over(),
            Self::Mancala(e) => e.is_round_over(),
            Self::Checkers(e) => e.is_round_over(),
            Self::Chess(e) => e.is_round_over(),
            Self::Dominoes(e) => e.is_round_over(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_wrong_shape() {
        let value = serde_json::json!({"from": 8, "to": 16});
        assert!(GameAction::parse(GameKind::TicTacToe, value).is_err());
    }

    #[test]
    fn parse_accepts_matching_shape() {
        let value = serde_json::json!({"cell": 4});
        let parsed = GameAction::parse(GameKind::TicTacToe, value).unwrap();
        assert!(matches!(parsed, GameAction::TicTacToe(_)));
    }

    #[test]
    fn dispatch_mismatch_is_malformed() {
        let mut engine = AnyEngine::init(GameKind::TicTacToe, Variant::none());
        let wrong = GameAction::Checkers(checkers::Action { from: 0, to: 1 });
        assert_eq!(engine.apply(0, wrong), Err(EngineError::Malformed));
    }

    #[test]
    fn init_honors_grid_size_variant() {
        let engine = AnyEngine::init(GameKind::TicTacToe, Variant::grid(5));
        match engine.view(0) {
            GameView::TicTacToe(v) => assert_eq!(v.n, 5),
            _ => panic!("wrong view"),
        }
    }
}
