use std::collections::HashMap;

use chrono::Utc;

use arena_core::{ChatMessage, PlayerId};

/// In-memory store of one-to-one conversations, keyed by the participant
/// pair. The key is order-normalized so either participant reaches the same
/// conversation.
#[derive(Debug, Default)]
pub struct ChatStore {
    conversations: HashMap<(PlayerId, PlayerId), Vec<ChatMessage>>,
}

fn key(a: PlayerId, b: PlayerId) -> (PlayerId, PlayerId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the conversation between `sender` and `receiver`,
    /// creating the conversation on first contact. Returns the stored
    /// message (with its timestamp) for delivery.
    pub fn handle_message(
        &mut self,
        sender: PlayerId,
        receiver: PlayerId,
        body: impl Into<String>,
    ) -> ChatMessage {
        let message = ChatMessage {
            sender,
            message: body.into(),
            timestamp: Utc::now(),
        };
        self.conversations
            .entry(key(sender, receiver))
            .or_default()
            .push(message.clone());
        message
    }

    /// Conversation history between two participants, oldest first. Empty if
    /// the two never exchanged a message.
    pub fn history(&self, a: PlayerId, b: PlayerId) -> Vec<ChatMessage> {
        self.conversations
            .get(&key(a, b))
            .cloned()
            .unwrap_or_default()
    }

    /// Drop every conversation `player` takes part in. Returns how many
    /// conversations were removed.
    pub fn remove_by_participant(&mut self, player: PlayerId) -> usize {
        let before = self.conversations.len();
        self.conversations
            .retain(|(a, b), _| *a != player && *b != player);
        before - self.conversations.len()
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}
