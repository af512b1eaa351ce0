//! Room actor, wire protocol, and settlement for a single live match.
//!
//! A room is created once two matchmaker entries pair up and lives until its
//! teardown grace window elapses after a terminal transition.
mod engine;
mod protocol;
mod room;
mod settlement;

pub use engine::AnyEngine;
pub use engine::EngineError;
pub use engine::GameAction;
pub use engine::GameView;
pub use protocol::ActiveGame;
pub use protocol::ClientMessage;
pub use protocol::PlayerInfo;
pub use protocol::ServerMessage;
pub use protocol::WaitingEntry;
pub use room::RoomCommand;
pub use room::RoomError;
pub use room::RoomRegistry;
pub use room::SeatMeta;
pub use settlement::SettlementResult;
pub use settlement::settle;
