//! Unified backend binary: live match hosting over WebSocket plus the
//! escrow/health REST surface. Runs on BIND_ADDR (e.g. 0.0.0.0:8888).

#[tokio::main]
async fn main() {
    wh_core::log();
    wh_core::kys();
    wh_core::brb();
    wh_server::run().await.unwrap();
}
