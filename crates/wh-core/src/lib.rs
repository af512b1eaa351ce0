//! Core type aliases, traits, and constants for the wh match server.
//!
//! This crate provides the foundational types and configuration parameters
//! shared across the matchmaking, room, engine, session, and hosting crates.
#![allow(dead_code)]

use std::time::Duration;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// 0/1 index identifying a player within a room.
pub type Seat = usize;
/// Per-player wager amount, denominated in the payment oracle's smallest unit.
pub type Stake = u64;

/// The six supported game families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    TicTacToe,
    Gomoku,
    Mancala,
    Checkers,
    Chess,
    Dominoes,
}

impl std::fmt::Display for GameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::TicTacToe => "tic_tac_toe",
            Self::Gomoku => "gomoku",
            Self::Mancala => "mancala",
            Self::Checkers => "checkers",
            Self::Chess => "chess",
            Self::Dominoes => "dominoes",
        };
        write!(f, "{}", s)
    }
}

/// Variant options negotiated at matchmaking time. Only tic-tac-toe currently
/// varies (grid size); other games are fixed-shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Variant {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub grid_size: Option<u8>,
}

impl Variant {
    pub fn none() -> Self {
        Self::default()
    }
    pub fn grid(size: u8) -> Self {
        Self {
            grid_size: Some(size),
        }
    }
}

/// The matchmaking key: two open bets only pair when all three match.
pub type MatchKey = (GameKind, Stake, Variant);

// ============================================================================
// TRAITS
// ============================================================================
/// Unique identifier trait for domain entities.
pub trait Unique<T = Self> {
    fn id(&self) -> ID<T>;
}

// ============================================================================
// CROSS-CRATE IDENTITY TAGS
// ============================================================================
// Zero-sized marker types so `wh-matchmaker`, `wh-room`, and `wh-session` can
// all name the same ID space without depending on one another.
/// Marker for [`ID`]s identifying a connected session.
pub enum SessionTag {}
pub type SessionId = ID<SessionTag>;
/// Marker for [`ID`]s identifying a live room.
pub enum RoomTag {}
pub type RoomId = ID<RoomTag>;
/// Marker for [`ID`]s identifying an open matchmaker queue entry.
pub enum EntryTag {}
pub type EntryId = ID<EntryTag>;

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Generic ID wrapper providing compile-time type safety over uuid::Uuid.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
    /// Cast ID<T> to ID<U> while preserving the underlying UUID.
    pub fn cast<U>(self) -> ID<U> {
        ID {
            inner: self.inner,
            marker: PhantomData,
        }
    }
    /// First 8 hex characters, suitable for a short room code shown to clients.
    pub fn short(&self) -> String {
        self.inner.simple().to_string()[..8].to_string()
    }
}

impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner()
    }
}
impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.inner.serialize(serializer)
    }
}
impl<'de, T> serde::Deserialize<'de> for ID<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        uuid::Uuid::deserialize(deserializer).map(Self::from)
    }
}

// ============================================================================
// SETTLEMENT CONSTANTS
// ============================================================================
/// Fraction of the pot retained by the house on a decisive settlement.
pub const HOUSE_FEE: f64 = 0.10;
/// Minimum fraction of the expected amount an inbound proof must credit.
pub const PROOF_MIN_RATIO: f64 = 0.99;

/// `pot = 2 * stake`, `house_cut = round(pot * HOUSE_FEE)`, `payout = pot - house_cut`.
pub fn settle(stake: Stake) -> (Stake, Stake) {
    let pot = stake.saturating_mul(2);
    let house_cut = ((pot as f64) * HOUSE_FEE).round() as Stake;
    (pot - house_cut, house_cut)
}

// ============================================================================
// TIMING CONSTANTS
// ============================================================================
/// Slack added to every nominal per-turn budget to absorb network latency.
pub const TIMER_SLACK: Duration = Duration::from_millis(500);
/// Grace window before a room is torn down after a normal terminal transition.
pub const ROOM_TEARDOWN_GRACE: Duration = Duration::from_secs(5);
/// Shorter grace window after a disconnect-triggered terminal transition.
pub const DISCONNECT_TEARDOWN_GRACE: Duration = Duration::from_secs(3);

/// Nominal per-turn budget for a game, or `None` for games with no clock
/// (tic-tac-toe moves fast enough that a clock adds nothing but surprise).
pub fn turn_budget(game: GameKind) -> Option<Duration> {
    match game {
        GameKind::TicTacToe => None,
        GameKind::Dominoes => Some(Duration::from_secs(15)),
        GameKind::Mancala => Some(Duration::from_secs(20)),
        GameKind::Checkers => Some(Duration::from_secs(30)),
        GameKind::Gomoku => Some(Duration::from_secs(30)),
        GameKind::Chess => Some(Duration::from_secs(60)),
    }
}

/// Full deadline a scheduler should arm for a game: nominal budget + slack.
pub fn turn_deadline(game: GameKind) -> Option<Duration> {
    turn_budget(game).map(|d| d + TIMER_SLACK)
}

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register Ctrl+C handler for immediate (non-graceful) termination.
#[cfg(feature = "server")]
pub fn kys() {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.unwrap();
        println!();
        log::warn!("violent interrupt received, exiting immediately");
        std::process::exit(0);
    });
}

/// Global interrupt flag for graceful shutdown coordination: stop accepting
/// new matches and let in-flight rooms finish their grace window before exit.
#[cfg(feature = "server")]
static INTERRUPTED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);
#[cfg(feature = "server")]
pub fn interrupted() -> bool {
    INTERRUPTED.load(std::sync::atomic::Ordering::Relaxed)
}
#[cfg(not(feature = "server"))]
pub fn interrupted() -> bool {
    false
}
/// Register graceful interrupt handler; sets the flag read by `interrupted()`.
#[cfg(feature = "server")]
pub fn brb() {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        log::warn!("graceful interrupt requested, draining in-flight rooms...");
        INTERRUPTED.store(true, std::sync::atomic::Ordering::Relaxed);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_splits_pot_with_house_fee() {
        let (payout, house_cut) = settle(100);
        assert_eq!(house_cut, 20);
        assert_eq!(payout, 180);
    }

    #[test]
    fn turn_budget_matches_table() {
        assert_eq!(turn_budget(GameKind::TicTacToe), None);
        assert_eq!(turn_budget(GameKind::Dominoes), Some(Duration::from_secs(15)));
        assert_eq!(turn_budget(GameKind::Chess), Some(Duration::from_secs(60)));
    }

    #[test]
    fn id_round_trips_through_uuid() {
        struct Marker;
        let id = ID::<Marker>::default();
        let uuid: uuid::Uuid = id.into();
        let back = ID::<Marker>::from(uuid);
        assert_eq!(id, back);
    }
}
