use serde::{Deserialize, Serialize};

use crate::citation::Citation;

/// Identifier for one open push connection serving one exchange.
///
/// Event handlers compare against the session's current id before
/// mutating shared state, so a closed session's late callbacks are
/// dropped instead of resurrecting cleared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

/// Wire payload of an SSE `token` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPayload {
    pub text: String,
}

/// Wire payload of an SSE `done` event.
/// The server may omit the citation list entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonePayload {
    pub answer: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// One event delivered by the answer stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StreamEvent {
    /// One incremental fragment of the answer
    Token { text: String },
    /// Terminal, authoritative full answer
    Done {
        answer: String,
        citations: Vec<Citation>,
    },
    /// Abnormal termination of the stream
    Error { message: String },
}

impl StreamEvent {
    /// True for events after which no further stream event is expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Error { .. })
    }
}

/// A stream event tagged with the session it belongs to, as routed
/// over the event bus.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub session: SessionId,
    pub event: StreamEvent,
}
