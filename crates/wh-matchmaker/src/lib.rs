//! Open-bet queue, keyed by `(GameKind, Stake, Variant)`.
//!
//! All three operations — `seek`, `accept`, `cancel` — are serialized
//! through a single `tokio::sync::Mutex`-guarded map. A second operation
//! that observes an entry already removed sees `Missing`/`BetTaken` —
//! there is no wider lock spanning the matchmaker and the room registry.
#![allow(dead_code)]

use std::collections::HashMap;
use tokio::sync::Mutex;
use wh_core::EntryId;
use wh_core::MatchKey;
use wh_core::SessionId;
use wh_core::Stake;

/// An open bet: one session's half of a not-yet-formed room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: EntryId,
    pub session: SessionId,
    pub key: MatchKey,
    pub proof: Option<String>,
    pub username: String,
    pub wallet: String,
}

/// Result of `seek`: either an immediate pairing with a waiting opponent, or
/// the requester's own entry now sitting in the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeekOutcome {
    Matched(Entry),
    Queued(EntryId),
}

/// Rejections for `accept`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptError {
    /// No such entry, or it was already taken by a concurrent `accept`.
    /// Ties are broken by arrival order — the loser sees this.
    BetTaken,
    CannotAcceptOwnBet,
}

impl std::fmt::Display for AcceptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BetTaken => write!(f, "bet-taken"),
            Self::CannotAcceptOwnBet => write!(f, "cannot-accept-own-bet"),
        }
    }
}
impl std::error::Error for AcceptError {}

#[derive(Debug, Default)]
pub struct Matchmaker {
    entries: Mutex<HashMap<EntryId, Entry>>,
}

impl Matchmaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs against a waiting opponent if one exists for `key`, else enqueues.
    pub async fn seek(
        &self,
        session: SessionId,
        key: MatchKey,
        proof: Option<String>,
        username: String,
        wallet: String,
    ) -> SeekOutcome {
        let mut entries = self.entries.lock().await;
        let opponent_id = entries
            .values()
            .find(|e| e.key == key && e.session != session)
            .map(|e| e.id);
        if let Some(id) = opponent_id {
            let opponent = entries.remove(&id).expect("id came from this map");
            log::debug!("[matchmaker] matched {:?} with waiting {:?}", session, opponent.session);
            return SeekOutcome::Matched(opponent);
        }
        let id = EntryId::default();
        entries.insert(
            id,
            Entry {
                id,
                session,
                key,
                proof,
                username,
                wallet,
            },
        );
        log::debug!("[matchmaker] queued {:?} for {:?}", session, key);
        SeekOutcome::Queued(id)
    }

    /// Accepts a specific open entry. Concurrent acceptors race on the same
    /// lock; only the first to observe the entry present removes it.
    pub async fn accept(
        &self,
        session: SessionId,
        open_id: EntryId,
    ) -> Result<Entry, AcceptError> {
        let mut entries = self.entries.lock().await;
        match entries.get(&open_id) {
            None => Err(AcceptError::BetTaken),
            Some(entry) if entry.session == session => Err(AcceptError::CannotAcceptOwnBet),
            Some(_) => Ok(entries.remove(&open_id).expect("checked present above")),
        }
    }

    /// Removes the requester's own entry, if any, so it can be refunded.
    pub async fn cancel(&self, session: SessionId) -> Option<Entry> {
        let mut entries = self.entries.lock().await;
        let id = entries
            .values()
            .find(|e| e.session == session)
            .map(|e| e.id)?;
        entries.remove(&id)
    }

    /// Snapshot of all open entries, for `lobby_update`.
    pub async fn lobby(&self) -> Vec<Entry> {
        self.entries.lock().await.values().cloned().collect()
    }

    pub async fn stake_of(&self, id: EntryId) -> Option<Stake> {
        self.entries.lock().await.get(&id).map(|e| e.key.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wh_core::GameKind;
    use wh_core::Variant;

    fn key() -> MatchKey {
        (GameKind::Chess, 100, Variant::none())
    }

    fn entry_args(username: &str) -> (Option<String>, String, String) {
        (None, username.to_string(), format!("wallet-{username}"))
    }

    #[tokio::test]
    async fn seek_enqueues_when_no_match() {
        let mm = Matchmaker::new();
        let (proof, username, wallet) = entry_args("alice");
        let outcome = mm.seek(SessionId::default(), key(), proof, username, wallet).await;
        assert!(matches!(outcome, SeekOutcome::Queued(_)));
        assert_eq!(mm.lobby().await.len(), 1);
    }

    #[tokio::test]
    async fn seek_matches_waiting_opponent() {
        let mm = Matchmaker::new();
        let alice = SessionId::default();
        let bob = SessionId::default();
        let (p, u, w) = entry_args("alice");
        mm.seek(alice, key(), p, u, w).await;
        let (p, u, w) = entry_args("bob");
        let outcome = mm.seek(bob, key(), p, u, w).await;
        match outcome {
            SeekOutcome::Matched(entry) => assert_eq!(entry.session, alice),
            SeekOutcome::Queued(_) => panic!("expected a match"),
        }
        assert!(mm.lobby().await.is_empty());
    }

    #[tokio::test]
    async fn seek_does_not_match_own_entry() {
        let mm = Matchmaker::new();
        let alice = SessionId::default();
        let (p, u, w) = entry_args("alice");
        mm.seek(alice, key(), p, u, w).await;
        let (p, u, w) = entry_args("alice-again");
        let outcome = mm.seek(alice, key(), p, u, w).await;
        assert!(matches!(outcome, SeekOutcome::Queued(_)));
    }

    #[tokio::test]
    async fn accept_rejects_own_bet() {
        let mm = Matchmaker::new();
        let alice = SessionId::default();
        let (p, u, w) = entry_args("alice");
        let id = match mm.seek(alice, key(), p, u, w).await {
            SeekOutcome::Queued(id) => id,
            _ => unreachable!(),
        };
        assert_eq!(
            mm.accept(alice, id).await,
            Err(AcceptError::CannotAcceptOwnBet)
        );
    }

    #[tokio::test]
    async fn accept_race_exactly_one_winner() {
        let mm = Matchmaker::new();
        let alice = SessionId::default();
        let (p, u, w) = entry_args("alice");
        let id = match mm.seek(alice, key(), p, u, w).await {
            SeekOutcome::Queued(id) => id,
            _ => unreachable!(),
        };
        let bob = SessionId::default();
        let carol = SessionId::default();
        let (a, b) = tokio::join!(mm.accept(bob, id), mm.accept(carol, id));
        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results.iter().filter(|r| *r == &Err(AcceptError::BetTaken)).count(),
            1
        );
    }

    #[tokio::test]
    async fn cancel_removes_and_returns_entry() {
        let mm = Matchmaker::new();
        let alice = SessionId::default();
        let (p, u, w) = entry_args("alice");
        mm.seek(alice, key(), p, u, w).await;
        let cancelled = mm.cancel(alice).await.unwrap();
        assert_eq!(cancelled.session, alice);
        assert!(mm.lobby().await.is_empty());
        assert!(mm.cancel(alice).await.is_none());
    }
}
