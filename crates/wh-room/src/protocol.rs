//! Wire protocol between a connection and the server.
//! `wh-session` owns decoding `ClientMessage` and encoding `ServerMessage`;
//! this module only defines the shapes, keeping them a plain serde-tagged
//! enum decoupled from the transport.
use crate::engine::GameView;
use wh_core::GameKind;
use wh_core::RoomId;
use wh_core::Seat;
use wh_core::Stake;

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Register {
        account: String,
        #[serde(default)]
        display_name: Option<String>,
    },
    FindMatch {
        game_type: GameKind,
        bet_amount: Stake,
        #[serde(default)]
        grid_size: Option<u8>,
        #[serde(default)]
        proof: Option<String>,
    },
    AcceptBet {
        bet_id: uuid::Uuid,
        #[serde(default)]
        proof: Option<String>,
    },
    CancelSearch,
    GameAction {
        #[serde(flatten)]
        action: serde_json::Value,
    },
    GetLobby,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PlayerInfo {
    pub username: String,
    pub wallet: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct WaitingEntry {
    pub id: uuid::Uuid,
    pub game_type: GameKind,
    pub bet_amount: Stake,
    pub username: String,
    pub wallet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_size: Option<u8>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ActiveGame {
    pub game_type: GameKind,
    pub bet_amount: Stake,
    pub players: [String; 2],
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Registered {
        account: String,
        display_name: String,
        escrow_address: String,
        test_mode: bool,
    },
    Waiting {
        msg: String,
        bet_amount: Stake,
        game_type: GameKind,
    },
    SearchCancelled,
    LobbyUpdate {
        waiting: Vec<WaitingEntry>,
        active_games: Vec<ActiveGame>,
        online_count: usize,
    },
    GameStart {
        room_id: RoomId,
        game_type: GameKind,
        bet_amount: Stake,
        player_index: Seat,
        players: [PlayerInfo; 2],
    },
    GameState {
        #[serde(flatten)]
        view: GameView,
    },
    GameOver {
        winner: Option<Seat>,
        winner_wallet: Option<String>,
        payout: Stake,
        is_draw: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        resigned: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    ErrorMsg {
        msg: String,
    },
    BalanceUpdate {
        wallet: String,
        balance: Stake,
    },
}

impl ServerMessage {
    pub fn error(msg: impl std::fmt::Display) -> Self {
        Self::ErrorMsg {
            msg: msg.to_string(),
        }
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize server message")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_register() {
        let json = r#"{"type":"register","account":"0xabc","display_name":"alice"}"#;
        match serde_json::from_str::<ClientMessage>(json).unwrap() {
            ClientMessage::Register { account, display_name } => {
                assert_eq!(account, "0xabc");
                assert_eq!(display_name.as_deref(), Some("alice"));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn decode_find_match_with_grid_size() {
        let json = r#"{"type":"find_match","gameType":"tic_tac_toe","betAmount":100}"#;
        // snake_case field names are required; camelCase should fail to parse.
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
        let json = r#"{"type":"find_match","game_type":"tic_tac_toe","bet_amount":100,"grid_size":5}"#;
        match serde_json::from_str::<ClientMessage>(json).unwrap() {
            ClientMessage::FindMatch { game_type, bet_amount, grid_size, .. } => {
                assert_eq!(game_type, GameKind::TicTacToe);
                assert_eq!(bet_amount, 100);
                assert_eq!(grid_size, Some(5));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn error_msg_round_trips() {
        let msg = ServerMessage::error("bet-taken");
        assert_eq!(msg.to_json(), r#"{"type":"error_msg","msg":"bet-taken"}"#);
    }
}
