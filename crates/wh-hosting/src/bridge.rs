//! Bridges one WebSocket connection to its session. A `tokio::select!`
//! loop races an outbound channel against the socket's own message stream;
//! there's no separate room lookup here — `wh-session::SessionManager`
//! owns that binding.
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::web;
use futures::StreamExt;
use std::sync::Arc;
use wh_room::ClientMessage;
use wh_room::ServerMessage;
use wh_session::SessionManager;

pub async fn ws(
    manager: web::Data<Arc<SessionManager>>,
    body: web::Payload,
    req: HttpRequest,
) -> actix_web::Result<HttpResponse> {
    let (response, mut session, mut stream) = actix_ws::handle(&req, body)?;
    let manager = manager.get_ref().clone();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ServerMessage>();
    let id = manager.connect(tx).await;
    log::debug!("[bridge {}] connected", id);
    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Some(out) => if session.text(out.to_json()).await.is_err() { break },
                    None => break,
                },
                msg = stream.next() => match msg {
                    Some(Ok(actix_ws::Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(parsed) => manager.handle(id, parsed).await,
                            Err(e) => log::warn!("[bridge {}] malformed frame: {}", id, e),
                        }
                    }
                    Some(Ok(actix_ws::Message::Close(_))) => break,
                    Some(Err(_)) | None => break,
                    _ => continue,
                },
            }
        }
        manager.disconnect(id).await;
        log::debug!("[bridge {}] disconnected", id);
    });
    Ok(response)
}
