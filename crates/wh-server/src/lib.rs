//! Unified backend entrypoint: wires `wh-session::SessionManager` and
//! `wh-hosting`'s routes into a single actix-web server.
mod config;

pub use config::Config;

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpServer;
use actix_web::middleware::Logger;
use actix_web::web;
use std::sync::Arc;
use wh_matchmaker::Matchmaker;
use wh_oracle::PaymentOracle;
use wh_oracle::StubLedgerOracle;
use wh_oracle::TestOracle;
use wh_room::RoomRegistry;
use wh_session::PermissiveValidator;
use wh_session::SessionManager;

#[rustfmt::skip]
pub async fn run() -> std::io::Result<()> {
    let config = Config::from_env();
    let escrow_address = config.escrow_address();
    let oracle: Arc<dyn PaymentOracle> = if config.test_mode {
        Arc::new(TestOracle::new())
    } else {
        // A production oracle backed by `config.rpc_endpoint` is the
        // integration point a real deployment would plug in here; none
        // is implemented in this repo.
        Arc::new(StubLedgerOracle::new())
    };
    let rooms = RoomRegistry::new(oracle.clone(), config.house_account.clone());
    let matchmaker = Arc::new(Matchmaker::new());
    let manager = Arc::new(SessionManager::new(
        matchmaker,
        rooms.clone(),
        oracle,
        Arc::new(PermissiveValidator),
        escrow_address,
        config.test_mode,
    ));
    let manager_data = web::Data::new(manager);
    let rooms_data = web::Data::new(rooms);
    log::info!("starting server on {}", config.bind_addr);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(manager_data.clone())
            .app_data(rooms_data.clone())
            .route("/health", web::get().to(wh_hosting::health))
            .service(web::scope("/api").route("/escrow", web::get().to(wh_hosting::escrow)))
            .route("/ws", web::get().to(wh_hosting::ws))
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
