use std::sync::Arc;

use tokio::sync::mpsc;

use arena_core::{
    CardSpec, ChatError, ClientEvent, GameResult, PlayerId, ServerEvent, SubmitError,
};
use arena_engine::{ChatStore, DeckStatus, GameCoordinator};
use arena_telemetry::MetricsRecorder;

use crate::bus::MatchPublisher;
use crate::connection::{ConnId, ConnectionEvent};
use crate::registry::PlayerRegistry;

/// Award paid to the winner of a completed battle.
const WINNER_AWARD: u32 = 100;

/// The boundary between the transport and the game core. Owns every mutable
/// structure (registry, coordinator, chat store) and consumes connection
/// events from a single channel, so each event runs to completion before the
/// next is touched.
pub struct Dispatcher {
    registry: PlayerRegistry,
    games: GameCoordinator,
    chats: ChatStore,
    publisher: Arc<dyn MatchPublisher>,
    metrics: Arc<MetricsRecorder>,
}

impl Dispatcher {
    pub fn new(publisher: Arc<dyn MatchPublisher>, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            registry: PlayerRegistry::new(),
            games: GameCoordinator::new(),
            chats: ChatStore::new(),
            publisher,
            metrics,
        }
    }

    /// Run the dispatch loop until every connection sender is gone.
    pub fn spawn(self, mut rx: mpsc::Receiver<ConnectionEvent>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut dispatcher = self;
            while let Some(event) = rx.recv().await {
                dispatcher.handle_event(event);
            }
            tracing::info!("dispatcher channel closed");
        })
    }

    pub fn handle_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Connected { conn, player, name, tx } => {
                self.on_connected(conn, player, name, tx)
            }
            ConnectionEvent::Inbound { player, event } => self.on_inbound(player, event),
            ConnectionEvent::Disconnected { conn, player } => self.on_disconnected(conn, player),
        }
    }

    fn on_connected(&mut self, conn: ConnId, player: PlayerId, name: String, tx: mpsc::Sender<String>) {
        self.registry.register(player, name, conn, tx);
        self.metrics.increment_counter("connections", 1);
        self.metrics
            .set_gauge("connected_players", self.registry.connected_count() as i64);
        self.broadcast_presence();
    }

    fn on_inbound(&mut self, player: PlayerId, event: ClientEvent) {
        tracing::debug!(conn_user = %player, event = event.name(), "event received");
        match event {
            ClientEvent::WaitingPlayer { id } => self.on_waiting_player(id),
            ClientEvent::WaitingCards { id, cards } => self.on_waiting_cards(id, &cards),
            ClientEvent::SendAction { user_id, card_id, target_id } => {
                self.on_send_action(user_id, card_id, target_id)
            }
            ClientEvent::EndTurn { id } => self.on_end_turn(id),
            ClientEvent::SendMessage { sender_id, receiver_id, message } => {
                self.on_send_message(sender_id, receiver_id, message)
            }
            ClientEvent::UserSelect { sender_id, receiver_id } => {
                self.on_user_select(sender_id, receiver_id)
            }
        }
    }

    fn on_waiting_player(&mut self, id: PlayerId) {
        match self.games.process_waiting_player(id) {
            Ok(None) => {}
            Ok(Some(enemy)) => {
                self.registry
                    .send_to(enemy, &ServerEvent::card_selection_for_waiter(id));
                self.registry
                    .send_to(id, &ServerEvent::card_selection_for_newcomer(enemy));
                self.metrics.increment_counter("matches_paired", 1);
                self.publish(
                    "match.paired",
                    serde_json::json!({ "users": [id, enemy] }),
                );
            }
            Err(err) => {
                tracing::warn!(user = %id, %err, "matchmaking rejected");
                self.registry.send_to(
                    id,
                    &ServerEvent::ActionFailed { message: err.to_string(), code: err.code() },
                );
            }
        }
    }

    fn on_waiting_cards(&mut self, id: PlayerId, cards: &[CardSpec]) {
        match self.games.submit_deck(id, cards) {
            Ok(DeckStatus::Waiting) => {
                tracing::info!(user = %id, "deck stored, waiting for the opponent's");
            }
            Ok(DeckStatus::Ready { first_turn }) => {
                let Some(enemy) = self.games.opponent_of(id) else {
                    return;
                };
                let own_ids = self.games.deck_ids(id).unwrap_or_default();
                let enemy_ids = self.games.deck_ids(enemy).unwrap_or_default();
                self.registry
                    .send_to(enemy, &ServerEvent::GameStarts { cards_ids: own_ids });
                self.registry
                    .send_to(id, &ServerEvent::GameStarts { cards_ids: enemy_ids });
                self.registry.send_to(first_turn, &ServerEvent::StartTurn);
                self.metrics.increment_counter("matches_started", 1);
                self.publish(
                    "match.started",
                    serde_json::json!({ "users": [id, enemy], "firstTurn": first_turn }),
                );
            }
            Err(err) => {
                tracing::warn!(user = %id, %err, "deck submission rejected");
                self.registry.send_to(
                    id,
                    &ServerEvent::ActionFailed { message: err.to_string(), code: err.code() },
                );
                // an invalid deck leaves the battle waiting; re-prompt the submitter
                if matches!(err, SubmitError::InvalidCard(_)) {
                    if let Some(enemy) = self.games.opponent_of(id) {
                        self.registry
                            .send_to(id, &ServerEvent::card_selection_for_newcomer(enemy));
                    }
                }
            }
        }
    }

    fn on_send_action(&mut self, user_id: PlayerId, card_id: u64, target_id: u64) {
        let damage = match self.games.resolve_action(user_id, card_id, target_id) {
            Ok(damage) => damage,
            Err(err) => {
                tracing::warn!(user = %user_id, kind = err.kind(), "action failed");
                self.metrics.increment_counter("actions_failed", 1);
                self.registry.send_to(
                    user_id,
                    &ServerEvent::ActionFailed { message: err.to_string(), code: err.code() },
                );
                return;
            }
        };
        let Some(enemy) = self.games.opponent_of(user_id) else {
            return;
        };
        // the defender sees their own card first
        self.registry.send_to(
            enemy,
            &ServerEvent::ReceiveAction { card_id: target_id, target_id: card_id, damage },
        );
        self.registry.send_to(
            user_id,
            &ServerEvent::ActionSuccess { card_id, target_id, damage },
        );
        self.metrics.increment_counter("actions_resolved", 1);

        if let Some(done) = self.games.check_outcome(user_id) {
            self.registry.send_to(
                done.winner,
                &ServerEvent::GameOver { result: GameResult::Win, award: WINNER_AWARD },
            );
            self.registry.send_to(
                done.loser,
                &ServerEvent::GameOver { result: GameResult::Lose, award: 0 },
            );
            self.metrics.increment_counter("matches_finished", 1);
            self.publish(
                "match.finished",
                serde_json::json!({ "winner": done.winner, "loser": done.loser }),
            );
        }
    }

    fn on_end_turn(&mut self, id: PlayerId) {
        if !self.games.is_fighting(id) {
            return;
        }
        if let Some(next) = self.games.end_turn(id) {
            self.registry.send_to(next, &ServerEvent::StartTurn);
        }
    }

    fn on_send_message(&mut self, sender: PlayerId, receiver: PlayerId, body: String) {
        let stored = self.chats.handle_message(sender, receiver, body);
        self.metrics.increment_counter("chat_messages", 1);

        let delivery = ServerEvent::ReceiveMessage {
            sender_id: sender,
            message: stored.message,
            timestamp: stored.timestamp,
        };
        if receiver.is_broadcast() {
            self.registry.broadcast_except(sender, &delivery);
            return;
        }
        if !self.registry.send_to(receiver, &delivery) {
            tracing::warn!(user = %receiver, "chat receiver is not connected");
            self.registry.send_to(
                sender,
                &ServerEvent::UserNotConnected {
                    receiver_id: receiver,
                    message: ChatError::ReceiverOffline.to_string(),
                },
            );
        }
    }

    fn on_user_select(&mut self, sender: PlayerId, receiver: PlayerId) {
        if sender == receiver {
            self.registry.send_to(
                sender,
                &ServerEvent::UserNotConnected {
                    receiver_id: receiver,
                    message: ChatError::SelfSelection.to_string(),
                },
            );
            return;
        }
        if !self.registry.contains(receiver) {
            self.registry.send_to(
                sender,
                &ServerEvent::UserNotConnected {
                    receiver_id: receiver,
                    message: ChatError::ReceiverNotConnected.to_string(),
                },
            );
            return;
        }
        let messages = self.chats.history(sender, receiver);
        self.registry.send_to(
            sender,
            &ServerEvent::UserSelected { participants: vec![sender, receiver], messages },
        );
    }

    /// Teardown, in order: chat history, forfeit notification, registry
    /// entry, presence broadcast. A signal from an already-replaced
    /// connection is ignored.
    fn on_disconnected(&mut self, conn: ConnId, player: PlayerId) {
        match self.registry.conn_of(player) {
            Some(current) if *current == conn => {}
            _ => {
                tracing::debug!(user = %player, conn = %conn, "stale disconnect ignored");
                return;
            }
        }

        self.chats.remove_by_participant(player);

        if let Some(opponent) = self.games.handle_disconnect(player) {
            self.registry.send_to(
                opponent,
                &ServerEvent::GameOver { result: GameResult::Forfeited, award: 0 },
            );
            self.metrics.increment_counter("matches_forfeited", 1);
            self.publish(
                "match.forfeited",
                serde_json::json!({ "by": player, "opponent": opponent }),
            );
        }

        self.registry.unregister(player);
        self.metrics
            .set_gauge("connected_players", self.registry.connected_count() as i64);
        self.broadcast_presence();
    }

    fn broadcast_presence(&self) {
        self.registry
            .broadcast(&ServerEvent::UpdateConnectedUsers { users: self.registry.snapshot() });
    }

    /// Hand a lifecycle notification to the bus without waiting on it.
    fn publish(&self, topic: &'static str, payload: serde_json::Value) {
        let publisher = Arc::clone(&self.publisher);
        tokio::spawn(async move {
            if let Err(err) = publisher.publish(topic, payload).await {
                tracing::warn!(topic, %err, "bus publish failed");
            }
        });
    }
}
