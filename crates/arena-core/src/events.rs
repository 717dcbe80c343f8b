use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cards::CardSpec;
use crate::ids::PlayerId;

/// One entry of the presence snapshot broadcast to every client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUser {
    pub id: PlayerId,
    pub name: String,
}

/// One stored chat message, as delivered in conversation history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: PlayerId,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Terminal result of a battle, from the notified player's perspective.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Win,
    Lose,
    Forfeited,
}

/// Events received from a connected client. One variant per protocol event;
/// anything that does not parse into this set is dropped at the boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "WAITING_PLAYER")]
    WaitingPlayer { id: PlayerId },

    #[serde(rename = "WAITING_CARDS")]
    WaitingCards { id: PlayerId, cards: Vec<CardSpec> },

    #[serde(rename = "SEND_ACTION", rename_all = "camelCase")]
    SendAction {
        user_id: PlayerId,
        card_id: u64,
        target_id: u64,
    },

    #[serde(rename = "END_TURN")]
    EndTurn { id: PlayerId },

    #[serde(rename = "SEND_MESSAGE", rename_all = "camelCase")]
    SendMessage {
        sender_id: PlayerId,
        receiver_id: PlayerId,
        message: String,
    },

    #[serde(rename = "ON_USER_SELECT", rename_all = "camelCase")]
    UserSelect {
        sender_id: PlayerId,
        receiver_id: PlayerId,
    },
}

impl ClientEvent {
    /// Wire name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WaitingPlayer { .. } => "WAITING_PLAYER",
            Self::WaitingCards { .. } => "WAITING_CARDS",
            Self::SendAction { .. } => "SEND_ACTION",
            Self::EndTurn { .. } => "END_TURN",
            Self::SendMessage { .. } => "SEND_MESSAGE",
            Self::UserSelect { .. } => "ON_USER_SELECT",
        }
    }
}

/// Events emitted to connected clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Prompts deck submission. Carries `userId` when sent to the player who
    /// was waiting in the queue, `enemyId` when sent to the newly arrived one.
    #[serde(rename = "CARD_SELECTION", rename_all = "camelCase")]
    CardSelection {
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<PlayerId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        enemy_id: Option<PlayerId>,
    },

    /// Reveals the opponent's deck by card ids.
    #[serde(rename = "GAME_STARTS", rename_all = "camelCase")]
    GameStarts { cards_ids: Vec<u64> },

    /// Grants the turn to the receiving player.
    #[serde(rename = "START_TURN")]
    StartTurn,

    #[serde(rename = "ACTION_SUCCESS", rename_all = "camelCase")]
    ActionSuccess {
        card_id: u64,
        target_id: u64,
        damage: f64,
    },

    #[serde(rename = "ACTION_FAILED")]
    ActionFailed { message: String, code: i32 },

    /// Notifies the defender of an attack against one of their cards.
    #[serde(rename = "RECEIVE_ACTION", rename_all = "camelCase")]
    ReceiveAction {
        card_id: u64,
        target_id: u64,
        damage: f64,
    },

    #[serde(rename = "GAME_OVER")]
    GameOver { result: GameResult, award: u32 },

    #[serde(rename = "UPDATE_CONNECTED_USERS")]
    UpdateConnectedUsers { users: Vec<PresenceUser> },

    #[serde(rename = "RECEIVE_MESSAGE", rename_all = "camelCase")]
    ReceiveMessage {
        sender_id: PlayerId,
        message: String,
        timestamp: DateTime<Utc>,
    },

    #[serde(rename = "USER_NOT_CONNECTED", rename_all = "camelCase")]
    UserNotConnected {
        receiver_id: PlayerId,
        message: String,
    },

    #[serde(rename = "ON_USER_SELECTED")]
    UserSelected {
        participants: Vec<PlayerId>,
        messages: Vec<ChatMessage>,
    },
}

impl ServerEvent {
    /// `CARD_SELECTION` addressed to the player who was already waiting.
    pub fn card_selection_for_waiter(newcomer: PlayerId) -> Self {
        Self::CardSelection {
            user_id: Some(newcomer),
            enemy_id: None,
        }
    }

    /// `CARD_SELECTION` addressed to the player who just asked for a match.
    pub fn card_selection_for_newcomer(waiter: PlayerId) -> Self {
        Self::CardSelection {
            user_id: None,
            enemy_id: Some(waiter),
        }
    }

    /// Wire name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CardSelection { .. } => "CARD_SELECTION",
            Self::GameStarts { .. } => "GAME_STARTS",
            Self::StartTurn => "START_TURN",
            Self::ActionSuccess { .. } => "ACTION_SUCCESS",
            Self::ActionFailed { .. } => "ACTION_FAILED",
            Self::ReceiveAction { .. } => "RECEIVE_ACTION",
            Self::GameOver { .. } => "GAME_OVER",
            Self::UpdateConnectedUsers { .. } => "UPDATE_CONNECTED_USERS",
            Self::ReceiveMessage { .. } => "RECEIVE_MESSAGE",
            Self::UserNotConnected { .. } => "USER_NOT_CONNECTED",
            Self::UserSelected { .. } => "ON_USER_SELECTED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiting_player_parses() {
        let json = r#"{"type":"WAITING_PLAYER","id":12}"#;
        let ev: ClientEvent = serde_json::from_str(json).unwrap();
        assert_eq!(ev, ClientEvent::WaitingPlayer { id: PlayerId::new(12) });
    }

    #[test]
    fn send_action_uses_camel_case_fields() {
        let json = r#"{"type":"SEND_ACTION","userId":1,"cardId":10,"targetId":20}"#;
        let ev: ClientEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            ev,
            ClientEvent::SendAction {
                user_id: PlayerId::new(1),
                card_id: 10,
                target_id: 20,
            }
        );
    }

    #[test]
    fn waiting_cards_carries_specs() {
        let json = r#"{"type":"WAITING_CARDS","id":3,"cards":[{"id":1,"attack":5,"defence":2,"energy":10,"hp":20}]}"#;
        let ev: ClientEvent = serde_json::from_str(json).unwrap();
        match ev {
            ClientEvent::WaitingCards { id, cards } => {
                assert_eq!(id, PlayerId::new(3));
                assert_eq!(cards.len(), 1);
                assert_eq!(cards[0].id, 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let json = r#"{"type":"SELF_DESTRUCT","id":1}"#;
        assert!(serde_json::from_str::<ClientEvent>(json).is_err());
    }

    #[test]
    fn start_turn_serializes_as_bare_tag() {
        let json = serde_json::to_string(&ServerEvent::StartTurn).unwrap();
        assert_eq!(json, r#"{"type":"START_TURN"}"#);
    }

    #[test]
    fn card_selection_omits_absent_side() {
        let waiter_view = ServerEvent::card_selection_for_waiter(PlayerId::new(5));
        let json = serde_json::to_string(&waiter_view).unwrap();
        assert!(json.contains(r#""userId":5"#), "got: {json}");
        assert!(!json.contains("enemyId"), "got: {json}");

        let newcomer_view = ServerEvent::card_selection_for_newcomer(PlayerId::new(9));
        let json = serde_json::to_string(&newcomer_view).unwrap();
        assert!(json.contains(r#""enemyId":9"#), "got: {json}");
        assert!(!json.contains("userId"), "got: {json}");
    }

    #[test]
    fn game_over_result_is_lowercase() {
        let json = serde_json::to_string(&ServerEvent::GameOver {
            result: GameResult::Forfeited,
            award: 0,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"GAME_OVER","result":"forfeited","award":0}"#);
    }

    #[test]
    fn action_success_wire_shape() {
        let json = serde_json::to_string(&ServerEvent::ActionSuccess {
            card_id: 10,
            target_id: 20,
            damage: 7.5,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"type":"ACTION_SUCCESS","cardId":10,"targetId":20,"damage":7.5}"#
        );
    }

    #[test]
    fn event_names_match_wire_tags() {
        let ev = ClientEvent::EndTurn { id: PlayerId::new(1) };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains(&format!(r#""type":"{}""#, ev.name())));

        let ev = ServerEvent::GameStarts { cards_ids: vec![1, 2] };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains(&format!(r#""type":"{}""#, ev.name())));
    }
}
