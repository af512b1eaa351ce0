//! REST surface: escrow address lookup and a liveness probe, `health`
//! backed by a check on the thing this service actually depends on — here
//! the room registry, not a database.
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use std::sync::Arc;
use wh_room::RoomRegistry;
use wh_session::SessionManager;

pub async fn escrow(manager: web::Data<Arc<SessionManager>>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "escrow_address": manager.escrow_address() }))
}

pub async fn health(rooms: web::Data<Arc<RoomRegistry>>) -> impl Responder {
    if rooms.is_alive().await {
        HttpResponse::Ok().body("ok")
    } else {
        HttpResponse::ServiceUnavailable().body("room registry unavailable")
    }
}
