//! Per-connection session state and dispatch. `wh-session` owns no game or
//! payment logic of its own — it only resolves identity, drives the
//! matchmaker and room registry, and routes each `ClientMessage` to the
//! right collaborator, sitting above the room registry without touching
//! engine state directly.
use crate::validator::AccountValidator;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use wh_core::EntryId;
use wh_core::GameKind;
use wh_core::MatchKey;
use wh_core::RoomId;
use wh_core::Seat;
use wh_core::SessionId;
use wh_core::Stake;
use wh_core::Variant;
use wh_matchmaker::Entry;
use wh_matchmaker::Matchmaker;
use wh_matchmaker::SeekOutcome;
use wh_oracle::PaymentOracle;
use wh_room::ClientMessage;
use wh_room::GameAction;
use wh_room::RoomRegistry;
use wh_room::SeatMeta;
use wh_room::ServerMessage;
use wh_room::WaitingEntry;

#[derive(Debug, Clone)]
struct Identity {
    account: String,
    display_name: String,
}

#[derive(Debug, Clone)]
enum Binding {
    None,
    Queued(EntryId),
    InRoom { room: RoomId, seat: Seat, game: GameKind },
}

struct SessionEntry {
    identity: Option<Identity>,
    outbox: mpsc::UnboundedSender<ServerMessage>,
    binding: Binding,
}

pub struct SessionManager {
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
    matchmaker: Arc<Matchmaker>,
    rooms: Arc<RoomRegistry>,
    oracle: Arc<dyn PaymentOracle>,
    validator: Arc<dyn AccountValidator>,
    escrow_address: String,
    test_mode: bool,
}

impl SessionManager {
    pub fn new(
        matchmaker: Arc<Matchmaker>,
        rooms: Arc<RoomRegistry>,
        oracle: Arc<dyn PaymentOracle>,
        validator: Arc<dyn AccountValidator>,
        escrow_address: impl Into<String>,
        test_mode: bool,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            matchmaker,
            rooms,
            oracle,
            validator,
            escrow_address: escrow_address.into(),
            test_mode,
        }
    }

    pub fn escrow_address(&self) -> &str {
        &self.escrow_address
    }

    /// Registers a freshly connected socket's outbound channel and returns
    /// the id the hosting bridge tags every inbound frame with.
    pub async fn connect(&self, outbox: mpsc::UnboundedSender<ServerMessage>) -> SessionId {
        let id = SessionId::default();
        self.sessions.lock().await.insert(
            id,
            SessionEntry {
                identity: None,
                outbox,
                binding: Binding::None,
            },
        );
        id
    }

    pub async fn handle(&self, session: SessionId, message: ClientMessage) {
        match message {
            ClientMessage::Register { account, display_name } => {
                self.on_register(session, account, display_name).await
            }
            ClientMessage::FindMatch { game_type, bet_amount, grid_size, proof } => {
                self.on_find_match(session, game_type, bet_amount, grid_size, proof).await
            }
            ClientMessage::AcceptBet { bet_id, proof } => {
                self.on_accept_bet(session, EntryId::from(bet_id), proof).await
            }
            ClientMessage::CancelSearch => self.on_cancel_search(session).await,
            ClientMessage::GameAction { action } => self.on_game_action(session, action).await,
            ClientMessage::GetLobby => self.on_get_lobby(session).await,
        }
    }

    /// Removes the session, refunding a queued entry or forfeiting a live
    /// room to the other seat.
    pub async fn disconnect(&self, session: SessionId) {
        let Some(entry) = self.sessions.lock().await.remove(&session) else {
            return;
        };
        match entry.binding {
            Binding::None => {}
            Binding::Queued(_) => {
                if let Some(cancelled) = self.matchmaker.cancel(session).await {
                    if let Err(e) = self.oracle.send_outbound(&cancelled.wallet, cancelled.key.1).await {
                        log::error!("[session] disconnect refund to {} failed: {}", cancelled.wallet, e);
                    }
                }
            }
            Binding::InRoom { room, seat, .. } => {
                self.rooms.disconnect(room, seat).await;
            }
        }
    }

    async fn send(&self, session: SessionId, msg: ServerMessage) {
        let sessions = self.sessions.lock().await;
        if let Some(entry) = sessions.get(&session) {
            let _ = entry.outbox.send(msg);
        }
    }

    async fn set_binding(&self, session: SessionId, binding: Binding) {
        if let Some(entry) = self.sessions.lock().await.get_mut(&session) {
            entry.binding = binding;
        }
    }

    async fn identity_of(&self, session: SessionId) -> Option<Identity> {
        self.sessions
            .lock()
            .await
            .get(&session)
            .and_then(|e| e.identity.clone())
    }

    async fn on_register(&self, session: SessionId, account: String, display_name: Option<String>) {
        match self.validator.validate(&account, display_name.as_deref()).await {
            Err(e) => self.send(session, ServerMessage::error(e)).await,
            Ok(display_name) => {
                if let Some(entry) = self.sessions.lock().await.get_mut(&session) {
                    entry.identity = Some(Identity {
                        account: account.clone(),
                        display_name: display_name.clone(),
                    });
                }
                self.send(session, ServerMessage::Registered {
                    account,
                    display_name,
                    escrow_address: self.escrow_address.clone(),
                    test_mode: self.test_mode,
                })
                .await;
            }
        }
    }

    async fn on_find_match(
        &self,
        session: SessionId,
        game_type: GameKind,
        bet_amount: Stake,
        grid_size: Option<u8>,
        proof: Option<String>,
    ) {
        if wh_core::interrupted() {
            self.send(session, ServerMessage::error("server-draining")).await;
            return;
        }
        let Some(identity) = self.identity_of(session).await else {
            self.send(session, ServerMessage::error("not-registered")).await;
            return;
        };
        let Some(proof) = proof else {
            self.send(session, ServerMessage::error("proof-required")).await;
            return;
        };
        if let Err(e) = self.oracle.verify_inbound(&proof, bet_amount).await {
            self.send(session, ServerMessage::error(e)).await;
            return;
        }
        let variant = grid_size.map(Variant::grid).unwrap_or_else(Variant::none);
        let key: MatchKey = (game_type, bet_amount, variant);
        let outcome = self
            .matchmaker
            .seek(session, key, Some(proof), identity.display_name.clone(), identity.account.clone())
            .await;
        match outcome {
            SeekOutcome::Queued(id) => {
                self.set_binding(session, Binding::Queued(id)).await;
                self.send(session, ServerMessage::Waiting {
                    msg: "searching for an opponent".to_string(),
                    bet_amount,
                    game_type,
                })
                .await;
            }
            SeekOutcome::Matched(opponent) => {
                self.start_room(game_type, variant, bet_amount, opponent, session, identity)
                    .await;
            }
        }
    }

    async fn on_accept_bet(&self, session: SessionId, open_id: EntryId, proof: Option<String>) {
        if wh_core::interrupted() {
            self.send(session, ServerMessage::error("server-draining")).await;
            return;
        }
        let Some(identity) = self.identity_of(session).await else {
            self.send(session, ServerMessage::error("not-registered")).await;
            return;
        };
        let Some(stake) = self.matchmaker.stake_of(open_id).await else {
            self.send(session, ServerMessage::error("bet-taken")).await;
            return;
        };
        let Some(proof) = proof else {
            self.send(session, ServerMessage::error("proof-required")).await;
            return;
        };
        if let Err(e) = self.oracle.verify_inbound(&proof, stake).await {
            self.send(session, ServerMessage::error(e)).await;
            return;
        }
        // `accept` re-checks presence under its own lock; a proof already
        // verified above is simply wasted (not refunded) if we lose the
        // race here, consistent with settlement's best-effort, never-reverse
        // posture.
        match self.matchmaker.accept(session, open_id).await {
            Err(e) => self.send(session, ServerMessage::error(e)).await,
            Ok(opponent) => {
                let (game_type, bet_amount, variant) = opponent.key;
                self.start_room(game_type, variant, bet_amount, opponent, session, identity)
                    .await;
            }
        }
    }

    async fn start_room(
        &self,
        game: GameKind,
        variant: Variant,
        stake: Stake,
        opponent: Entry,
        session: SessionId,
        identity: Identity,
    ) {
        let (opp_tx, self_tx) = {
            let sessions = self.sessions.lock().await;
            (
                sessions.get(&opponent.session).map(|e| e.outbox.clone()),
                sessions.get(&session).map(|e| e.outbox.clone()),
            )
        };
        let (Some(opp_tx), Some(self_tx)) = (opp_tx, self_tx) else {
            log::warn!("[session] opponent or requester vanished before room start");
            return;
        };
        let seats = [
            SeatMeta {
                session: opponent.session,
                account: opponent.wallet.clone(),
                username: opponent.username.clone(),
            },
            SeatMeta {
                session,
                account: identity.account,
                username: identity.display_name,
            },
        ];
        let room = self.rooms.create(game, variant, stake, seats, [opp_tx, self_tx]).await;
        self.set_binding(opponent.session, Binding::InRoom { room, seat: 0, game }).await;
        self.set_binding(session, Binding::InRoom { room, seat: 1, game }).await;
    }

    async fn on_cancel_search(&self, session: SessionId) {
        match self.matchmaker.cancel(session).await {
            None => self.send(session, ServerMessage::error("not-searching")).await,
            Some(entry) => {
                if let Err(e) = self.oracle.send_outbound(&entry.wallet, entry.key.1).await {
                    log::error!("[session] cancel-search refund to {} failed: {}", entry.wallet, e);
                }
                self.set_binding(session, Binding::None).await;
                self.send(session, ServerMessage::SearchCancelled).await;
            }
        }
    }

    async fn on_game_action(&self, session: SessionId, value: serde_json::Value) {
        let binding = self.sessions.lock().await.get(&session).map(|e| e.binding.clone());
        let Some(Binding::InRoom { room, seat, game }) = binding else {
            self.send(session, ServerMessage::error("no-room")).await;
            return;
        };
        let action = match GameAction::parse(game, value) {
            Ok(a) => a,
            Err(_) => {
                self.send(session, ServerMessage::error("invalid-action")).await;
                return;
            }
        };
        match self.rooms.apply(room, seat, action).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.send(session, ServerMessage::error(e)).await,
            Err(e) => self.send(session, ServerMessage::error(e)).await,
        }
    }

    async fn on_get_lobby(&self, session: SessionId) {
        let entries = self.matchmaker.lobby().await;
        let waiting = entries
            .into_iter()
            .map(|e| WaitingEntry {
                id: e.id.inner(),
                game_type: e.key.0,
                bet_amount: e.key.1,
                username: e.username,
                wallet: e.wallet,
                grid_size: e.key.2.grid_size,
            })
            .collect();
        // The registry tracks live rooms by id and command channel only, not
        // seat metadata, so there's no lobby-safe summary of active games to
        // report yet; `active_games` stays empty until it does.
        let online_count = self.sessions.lock().await.len();
        self.send(session, ServerMessage::LobbyUpdate {
            waiting,
            active_games: Vec::new(),
            online_count,
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::PermissiveValidator;
    use wh_oracle::TestOracle;

    fn manager() -> SessionManager {
        SessionManager::new(
            Arc::new(Matchmaker::new()),
            RoomRegistry::new(Arc::new(TestOracle::new()), "house"),
            Arc::new(TestOracle::new()),
            Arc::new(PermissiveValidator),
            "escrow-address",
            true,
        )
    }

    async fn connected(mgr: &SessionManager) -> (SessionId, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (mgr.connect(tx).await, rx)
    }

    #[tokio::test]
    async fn register_then_find_match_queues_without_opponent() {
        let mgr = manager();
        let (session, mut rx) = connected(&mgr).await;
        mgr.handle(session, ClientMessage::Register { account: "0xabc".into(), display_name: None }).await;
        assert!(matches!(rx.recv().await.unwrap(), ServerMessage::Registered { .. }));

        mgr.handle(session, ClientMessage::FindMatch {
            game_type: GameKind::Chess,
            bet_amount: 100,
            grid_size: None,
            proof: Some("p1".into()),
        })
        .await;
        assert!(matches!(rx.recv().await.unwrap(), ServerMessage::Waiting { .. }));
    }

    #[tokio::test]
    async fn matching_two_sessions_starts_a_room_for_both() {
        let mgr = manager();
        let (alice, mut alice_rx) = connected(&mgr).await;
        let (bob, mut bob_rx) = connected(&mgr).await;
        mgr.handle(alice, ClientMessage::Register { account: "alice".into(), display_name: None }).await;
        mgr.handle(bob, ClientMessage::Register { account: "bob".into(), display_name: None }).await;
        let _ = alice_rx.recv().await;
        let _ = bob_rx.recv().await;

        let find_match = |proof: &str| ClientMessage::FindMatch {
            game_type: GameKind::Chess,
            bet_amount: 100,
            grid_size: None,
            proof: Some(proof.to_string()),
        };
        mgr.handle(alice, find_match("alice-proof")).await;
        assert!(matches!(alice_rx.recv().await.unwrap(), ServerMessage::Waiting { .. }));

        mgr.handle(bob, find_match("bob-proof")).await;
        // Alice's queued entry gets matched; both sides see game_start.
        assert!(matches!(alice_rx.recv().await.unwrap(), ServerMessage::GameStart { .. }));
        assert!(matches!(bob_rx.recv().await.unwrap(), ServerMessage::GameStart { .. }));
    }

    #[tokio::test]
    async fn find_match_without_registration_is_rejected() {
        let mgr = manager();
        let (session, mut rx) = connected(&mgr).await;
        mgr.handle(session, ClientMessage::FindMatch {
            game_type: GameKind::TicTacToe,
            bet_amount: 10,
            grid_size: None,
            proof: Some("p".into()),
        })
        .await;
        match rx.recv().await.unwrap() {
            ServerMessage::ErrorMsg { msg } => assert_eq!(msg, "not-registered"),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_search_refunds_and_confirms() {
        let mgr = manager();
        let (session, mut rx) = connected(&mgr).await;
        mgr.handle(session, ClientMessage::Register { account: "alice".into(), display_name: None }).await;
        let _ = rx.recv().await;
        mgr.handle(session, ClientMessage::FindMatch {
            game_type: GameKind::Mancala,
            bet_amount: 50,
            grid_size: None,
            proof: Some("p1".into()),
        })
        .await;
        let _ = rx.recv().await;
        mgr.handle(session, ClientMessage::CancelSearch).await;
        assert!(matches!(rx.recv().await.unwrap(), ServerMessage::SearchCancelled));
    }

    #[tokio::test]
    async fn game_action_without_room_is_rejected() {
        let mgr = manager();
        let (session, mut rx) = connected(&mgr).await;
        mgr.handle(session, ClientMessage::GameAction { action: serde_json::json!({"cell": 0}) }).await;
        match rx.recv().await.unwrap() {
            ServerMessage::ErrorMsg { msg } => assert_eq!(msg, "no-room"),
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
