//! Facade crate re-exporting the match server's components for convenient
//! access from integration tests and the `bin/backend` binary.
//!
//! ## Crate organization
//!
//! - [`core`] — shared IDs, game/stake/variant types, settlement math
//! - [`engines`] — the six game state machines
//! - [`oracle`] — payment-proof verification and payout submission
//! - [`matchmaker`] — queueing and pairing by `(game, stake, variant)`
//! - [`room`] — room actor, turn timer, and wire protocol
//! - [`session`] — per-connection session state machine
//! - [`hosting`] — actix-web/actix-ws bridge and REST surface
//! - [`server`] — process entry point and configuration

pub use wh_core as core;
pub use wh_engines as engines;
pub use wh_hosting as hosting;
pub use wh_matchmaker as matchmaker;
pub use wh_oracle as oracle;
pub use wh_room as room;
pub use wh_server as server;
pub use wh_session as session;
