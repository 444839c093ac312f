//! Conversation store — the ordered message sequence.
//!
//! Insertion order is chronological order. All mutation funnels through
//! `append` / `update_by_id` / `clear`; nothing outside this module may
//! splice or reorder the sequence.

use chat_types::message::{Message, MessageId, MessagePatch};

/// Holds the conversation and hands out read-only snapshots.
#[derive(Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Apply a partial update to exactly one message.
    /// No-op when the id is absent.
    pub fn update_by_id(&mut self, id: &MessageId, patch: MessagePatch) {
        let Some(msg) = self.messages.iter_mut().find(|m| &m.id == id) else {
            return;
        };
        if let Some(text) = patch.text {
            msg.text = text;
        }
        if let Some(streaming) = patch.streaming {
            msg.streaming = streaming;
        }
        if let Some(citations) = patch.citations {
            msg.citations = citations;
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Read-only snapshot for the presentation layer.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Most recent message still marked as streaming, if any.
    pub fn last_streaming_id(&self) -> Option<MessageId> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.streaming)
            .map(|m| m.id.clone())
    }
}
