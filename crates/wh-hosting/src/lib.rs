//! HTTP/WebSocket bridge between a connection and its session. All room and
//! matchmaking machinery lives in `wh-session`/`wh-room`/`wh-oracle`; this
//! crate only terminates the transport.
mod bridge;
mod handlers;

pub use bridge::ws;
pub use handlers::escrow;
pub use handlers::health;
