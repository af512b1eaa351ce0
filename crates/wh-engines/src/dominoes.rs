//! Draw-mode dominoes, double-six set, first to 50 points across rounds.

use crate::GameEngine;
use crate::Outcome;
use rand::seq::SliceRandom;
use wh_core::Seat;

const TARGET_SCORE: u32 = 50;
const HAND_SIZE: usize = 7;

#[derive(Debug, Clone, Copy, Default)]
pub struct Options;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Tile(pub u8, pub u8);

impl Tile {
    fn pips(self) -> u32 {
        self.0 as u32 + self.1 as u32
    }
    fn flipped(self) -> Tile {
        Tile(self.1, self.0)
    }
    fn is_double(self) -> bool {
        self.0 == self.1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Play { tile: Tile, side: Option<Side> },
    Draw,
    Pass,
    NextRound,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct View {
    pub hand: Vec<Tile>,
    pub opponent_tile_count: usize,
    pub boneyard_count: usize,
    pub line: Vec<Tile>,
    pub current_seat: Seat,
    pub scores: [u32; 2],
    pub round_over: bool,
    pub game_over: bool,
    pub winner: Option<Seat>,
    pub passes_in_a_row: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    GameOver,
    NotYourTurn,
    RoundNotOver,
    RoundOver,
    TileNotInHand,
    NoMatchingEnd,
    AmbiguousSide,
    BoneyardEmpty,
    MustDrawBeforePassing,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GameOver => write!(f, "game-over"),
            Self::NotYourTurn => write!(f, "not-your-turn"),
            Self::RoundNotOver => write!(f, "round-not-over"),
            Self::RoundOver => write!(f, "round-over"),
            Self::TileNotInHand => write!(f, "tile-not-in-hand"),
            Self::NoMatchingEnd => write!(f, "illegal-move"),
            Self::AmbiguousSide => write!(f, "invalid-action"),
            Self::BoneyardEmpty => write!(f, "boneyard-empty"),
            Self::MustDrawBeforePassing => write!(f, "must-draw-before-passing"),
        }
    }
}
impl std::error::Error for Error {}

#[derive(Debug)]
pub struct Engine {
    hands: [Vec<Tile>; 2],
    boneyard: Vec<Tile>,
    line: Vec<Tile>,
    current_seat: Seat,
    scores: [u32; 2],
    passes_in_a_row: u8,
    round_over: bool,
    winner: Option<Seat>,
    opener: Seat,
}

fn full_set() -> Vec<Tile> {
    let mut set = Vec::with_capacity(28);
    for a in 0..=6u8 {
        for b in a..=6u8 {
            set.push(Tile(a, b));
        }
    }
    set
}

impl Engine {
    fn left_end(&self) -> Option<u8> {
        self.line.first().map(|t| t.0)
    }
    fn right_end(&self) -> Option<u8> {
        self.line.last().map(|t| t.1)
    }
    fn playable_sides(&self, tile: Tile) -> Vec<Side> {
        if self.line.is_empty() {
            return vec![Side::Left];
        }
        let mut sides = Vec::new();
        if Some(tile.0) == self.left_end() || Some(tile.1) == self.left_end() {
            sides.push(Side::Left);
        }
        if Some(tile.0) == self.right_end() || Some(tile.1) == self.right_end() {
            sides.push(Side::Right);
        }
        sides
    }
    fn has_playable_tile(&self, seat: Seat) -> bool {
        self.hands[seat]
            .iter()
            .any(|&t| !self.playable_sides(t).is_empty())
    }
    fn deal_from_boneyard(&mut self, seat: Seat) -> Option<Tile> {
        let tile = self.boneyard.pop()?;
        self.hands[seat].push(tile);
        Some(tile)
    }
    fn start_round(&mut self, dealer_seat: Seat) {
        let mut set = full_set();
        // caller seeds randomness once per round via rand; deterministic
        // shuffling of a freshly-built set each round.
        set.shuffle(&mut rand::rng());
        self.hands = [
            set.split_off(set.len() - HAND_SIZE),
            set.split_off(set.len() - HAND_SIZE),
        ];
        self.boneyard = set;
        self.line.clear();
        self.passes_in_a_row = 0;
        self.round_over = false;

        let opener = self.hands[0]
            .iter()
            .chain(self.hands[1].iter())
            .filter(|t| t.is_double())
            .max_by_key(|t| t.0);
        self.opener = match opener {
            Some(&tile) => {
                let seat = if self.hands[0].contains(&tile) { 0 } else { 1 };
                self.hands[seat].retain(|&t| t != tile);
                self.line.push(tile);
                1 - seat
            }
            None => dealer_seat,
        };
        self.current_seat = self.opener;
    }
    fn score_round(&mut self, empty_hand_seat: Option<Seat>) {
        self.round_over = true;
        match empty_hand_seat {
            Some(winner) => {
                let opponent = 1 - winner;
                let points = self.hands[opponent].iter().map(|t| t.pips()).sum();
                self.scores[winner] += points;
            }
            None => {
                let pips = [
                    self.hands[0].iter().map(|t| t.pips()).sum::<u32>(),
                    self.hands[1].iter().map(|t| t.pips()).sum::<u32>(),
                ];
                match pips[0].cmp(&pips[1]) {
                    std::cmp::Ordering::Less => self.scores[0] += pips[1] - pips[0],
                    std::cmp::Ordering::Greater => self.scores[1] += pips[0] - pips[1],
                    std::cmp::Ordering::Equal => {}
                }
            }
        }
        if let Some(seat) = (0..2).find(|&s| self.scores[s] >= TARGET_SCORE) {
            self.winner = Some(seat);
        }
    }
}

impl GameEngine for Engine {
    type Options = Options;
    type Action = Action;
    type View = View;
    type Error = Error;

    fn init(_options: Options) -> Self {
        let mut engine = Self {
            hands: [Vec::new(), Vec::new()],
            boneyard: Vec::new(),
            line: Vec::new(),
            current_seat: 0,
            scores: [0, 0],
            passes_in_a_row: 0,
            round_over: false,
            winner: None,
            opener: 0,
        };
        engine.start_round(0);
        engine
    }

    fn apply(&mut self, seat: Seat, action: Action) -> Result<Outcome, Error> {
        if self.winner.is_some() {
            return Err(Error::GameOver);
        }
        if let Action::NextRound = action {
            if !self.round_over {
                return Err(Error::RoundNotOver);
            }
            self.start_round(1 - self.opener);
            return Ok(Outcome::Applied);
        }
        if self.round_over {
            return Err(Error::RoundOver);
        }
        if seat != self.current_seat {
            return Err(Error::NotYourTurn);
        }
        match action {
            Action::Play { tile, side } => {
                let in_hand = self.hands[seat].contains(&tile);
                if !in_hand {
                    return Err(Error::TileNotInHand);
                }
                let sides = self.playable_sides(tile);
                if sides.is_empty() {
                    return Err(Error::NoMatchingEnd);
                }
                let chosen = match side {
                    Some(s) if sides.contains(&s) => s,
                    Some(_) => return Err(Error::NoMatchingEnd),
                    None => {
                        if sides.len() > 1 {
                            return Err(Error::AmbiguousSide);
                        }
                        sides[0]
                    }
                };
                self.hands[seat].retain(|&t| t != tile);
                match chosen {
                    Side::Left => {
                        let oriented = if self.line.is_empty() || Some(tile.1) == self.left_end() {
                            tile
                        } else {
                            tile.flipped()
                        };
                        self.line.insert(0, oriented);
                    }
                    Side::Right => {
                        let oriented = if Some(tile.0) == self.right_end() {
                            tile
                        } else {
                            tile.flipped()
                        };
                        self.line.push(oriented);
                    }
                }
                self.passes_in_a_row = 0;
                if self.hands[seat].is_empty() {
                    self.score_round(Some(seat));
                    return Ok(Outcome::RoundOver);
                }
                self.current_seat = 1 - seat;
                Ok(Outcome::Applied)
            }
            Action::Draw => {
                if self.boneyard.is_empty() {
                    return Err(Error::BoneyardEmpty);
                }
                self.deal_from_boneyard(seat);
                Ok(Outcome::Applied)
            }
            Action::Pass => {
                if !self.boneyard.is_empty() {
                    return Err(Error::MustDrawBeforePassing);
                }
                if self.has_playable_tile(seat) {
                    return Err(Error::MustDrawBeforePassing);
                }
                self.passes_in_a_row += 1;
                if self.passes_in_a_row >= 2 {
                    self.score_round(None);
                    return Ok(Outcome::RoundOver);
                }
                self.current_seat = 1 - seat;
                Ok(Outcome::Applied)
            }
            Action::NextRound => unreachable!("handled above"),
        }
    }

    fn view(&self, seat: Seat) -> View {
        View {
            hand: self.hands[seat].clone(),
            opponent_tile_count: self.hands[1 - seat].len(),
            boneyard_count: self.boneyard.len(),
            line: self.line.clone(),
            current_seat: self.current_seat,
            scores: self.scores,
            round_over: self.round_over,
            game_over: self.winner.is_some(),
            winner: self.winner,
            passes_in_a_row: self.passes_in_a_row,
        }
    }

    fn auto_fallback(&self, seat: Seat) -> Option<Action> {
        if self.round_over {
            return Some(Action::NextRound);
        }
        if let Some(&tile) = self.hands[seat]
            .iter()
            .find(|&&t| !self.playable_sides(t).is_empty())
        {
            let side = self.playable_sides(tile).first().copied();
            return Some(Action::Play { tile, side });
        }
        if !self.boneyard.is_empty() {
            return Some(Action::Draw);
        }
        Some(Action::Pass)
    }

    fn current_seat(&self) -> Seat {
        self.current_seat
    }

    fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    fn is_round_over(&self) -> bool {
        self.round_over
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged(hands: [Vec<Tile>; 2], line: Vec<Tile>, seat: Seat) -> Engine {
        Engine {
            hands,
            boneyard: Vec::new(),
            line,
            current_seat: seat,
            scores: [0, 0],
            passes_in_a_row: 0,
            round_over: false,
            winner: None,
            opener: seat,
        }
    }

    #[test]
    fn empty_board_accepts_any_tile() {
        let mut e = staged([vec![Tile(3, 5)], vec![Tile(1, 1)]], Vec::new(), 0);
        let outcome = e
            .apply(0, Action::Play { tile: Tile(3, 5), side: None })
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(e.line, vec![Tile(3, 5)]);
    }

    #[test]
    fn tile_must_match_an_end() {
        let mut e = staged([vec![Tile(2, 2)], vec![]], vec![Tile(3, 5)], 0);
        assert_eq!(
            e.apply(0, Action::Play { tile: Tile(2, 2), side: Some(Side::Left) }),
            Err(Error::NoMatchingEnd)
        );
    }

    #[test]
    fn ambiguous_side_requires_explicit_choice() {
        let mut e = staged([vec![Tile(5, 5)], vec![]], vec![Tile(5, 3), Tile(1, 5)], 0);
        // both ends show a 5, so playing the 5-5 double without a side is ambiguous.
        assert_eq!(
            e.apply(0, Action::Play { tile: Tile(5, 5), side: None }),
            Err(Error::AmbiguousSide)
        );
        let outcome = e
            .apply(0, Action::Play { tile: Tile(5, 5), side: Some(Side::Left) })
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);
    }

    #[test]
    fn emptying_hand_scores_opponent_pips_and_ends_round() {
        let mut e = staged([vec![Tile(1, 1)], vec![Tile(6, 6), Tile(2, 3)]], vec![Tile(1, 3)], 0);
        let outcome = e
            .apply(0, Action::Play { tile: Tile(1, 1), side: Some(Side::Left) })
            .unwrap();
        assert_eq!(outcome, Outcome::RoundOver);
        assert!(e.round_over);
        assert_eq!(e.scores[0], 6 + 6 + 2 + 3);
    }

    #[test]
    fn pass_rejected_while_boneyard_non_empty() {
        let mut e = staged([vec![Tile(0, 0)], vec![]], vec![Tile(3, 5)], 0);
        e.boneyard.push(Tile(6, 6));
        assert_eq!(e.apply(0, Action::Pass), Err(Error::MustDrawBeforePassing));
    }

    #[test]
    fn two_consecutive_passes_block_the_round() {
        let mut e = staged([vec![Tile(0, 0)], vec![Tile(1, 1)]], vec![Tile(3, 5)], 0);
        e.apply(0, Action::Pass).unwrap();
        let outcome = e.apply(1, Action::Pass).unwrap();
        assert_eq!(outcome, Outcome::RoundOver);
        assert!(e.round_over);
    }
}
