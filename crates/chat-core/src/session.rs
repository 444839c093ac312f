//! Streaming session — drives exactly one question → answer exchange.
//!
//! Lifecycle per exchange:
//! `Idle -> Connecting -> Streaming -> {Finalized | Errored | Cancelled}`.
//!
//! The session owns the conversation and is its only writer. Stream
//! events arrive tagged with a session id; `apply` drops anything from
//! a session that is no longer current, so a late callback from a
//! cleared or cancelled exchange cannot resurrect state.

use std::pin::Pin;

use futures::Stream;

use chat_types::{
    event::{SessionId, StreamEvent},
    message::{Message, MessagePatch, MessageId},
};

use crate::citations::resolve as resolve_citations;
use crate::ports::{ConnectionHandle, StreamPort};
use crate::store::ConversationStore;

/// Fixed user-facing text substituted when the stream fails.
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// State of the current (or most recent) exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Connecting,
    Streaming,
    Finalized,
    Errored,
    Cancelled,
}

impl ExchangeState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExchangeState::Finalized | ExchangeState::Errored | ExchangeState::Cancelled
        )
    }
}

/// The conversation plus at most one in-flight exchange.
pub struct ChatSession {
    store: ConversationStore,
    state: ExchangeState,
    busy: bool,
    current: SessionId,
    buffer: String,
    assistant_id: Option<MessageId>,
    handle: Option<Box<dyn ConnectionHandle>>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            store: ConversationStore::new(),
            state: ExchangeState::Idle,
            busy: false,
            current: SessionId(0),
            buffer: String::new(),
            assistant_id: None,
            handle: None,
        }
    }

    /// Open a new exchange for `question`.
    ///
    /// No-op (returns `None`) while another exchange is open or when
    /// the trimmed question is empty. On success returns the session id
    /// and the connection's event stream; the caller forwards its items
    /// back into `apply`, tagged with that id.
    pub fn submit(
        &mut self,
        question: &str,
        transport: &dyn StreamPort,
    ) -> Option<(SessionId, Pin<Box<dyn Stream<Item = StreamEvent>>>)> {
        if self.busy {
            log::debug!("submit ignored: exchange already open");
            return None;
        }
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        self.store.append(Message::user(question));
        let placeholder = Message::assistant_placeholder();
        self.assistant_id = Some(placeholder.id.clone());
        self.store.append(placeholder);

        self.current = SessionId(self.current.0 + 1);
        self.buffer.clear();

        let connection = match transport.open(question) {
            Ok(c) => c,
            Err(e) => {
                log::error!("failed to open answer stream: {}", e);
                self.fail_exchange();
                return None;
            }
        };

        self.handle = Some(connection.handle);
        self.busy = true;
        self.state = ExchangeState::Connecting;
        Some((self.current, connection.events))
    }

    /// Apply one stream event delivered for `session`.
    ///
    /// Events from a stale session, or arriving after this exchange
    /// reached a terminal state, are dropped.
    pub fn apply(&mut self, session: SessionId, event: StreamEvent) {
        if session != self.current {
            log::debug!("dropping event from stale session {:?}", session);
            return;
        }
        if self.state.is_terminal() {
            return;
        }

        match event {
            StreamEvent::Token { text } => {
                self.state = ExchangeState::Streaming;
                self.buffer.push_str(&text);
                if let Some(id) = self.assistant_id.clone() {
                    self.store
                        .update_by_id(&id, MessagePatch::text(self.buffer.clone()).streaming(true));
                }
            }
            StreamEvent::Done { answer, citations } => {
                // Authoritative: the final answer replaces whatever the
                // token buffer accumulated.
                let citations = resolve_citations(&answer, citations);
                if let Some(id) = self.assistant_id.clone() {
                    self.store.update_by_id(
                        &id,
                        MessagePatch::text(answer)
                            .streaming(false)
                            .citations(citations),
                    );
                }
                self.close_connection();
                self.busy = false;
                self.state = ExchangeState::Finalized;
            }
            StreamEvent::Error { message } => {
                log::error!("answer stream error: {}", message);
                self.fail_exchange();
            }
        }
    }

    /// Close any open connection and empty the conversation.
    /// Safe with or without an open session.
    pub fn clear(&mut self) {
        self.close_connection();
        // Bump past the closed session so its queued events can't match.
        self.current = SessionId(self.current.0 + 1);
        self.store.clear();
        self.buffer.clear();
        self.assistant_id = None;
        self.busy = false;
        self.state = ExchangeState::Idle;
    }

    /// User-initiated stop: close the connection, keep history, and
    /// leave the partial text as the final answer. No error text.
    pub fn cancel(&mut self) {
        if !self.busy {
            return;
        }
        self.close_connection();
        self.current = SessionId(self.current.0 + 1);
        if let Some(id) = self.store.last_streaming_id() {
            self.store
                .update_by_id(&id, MessagePatch::default().streaming(false));
        }
        self.busy = false;
        self.state = ExchangeState::Cancelled;
    }

    /// Read-only snapshot for the presentation layer.
    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    fn fail_exchange(&mut self) {
        if let Some(id) = self.assistant_id.clone() {
            self.store.update_by_id(
                &id,
                MessagePatch::text(ERROR_REPLY)
                    .streaming(false)
                    .citations(Vec::new()),
            );
        }
        self.close_connection();
        self.busy = false;
        self.state = ExchangeState::Errored;
    }

    fn close_connection(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
