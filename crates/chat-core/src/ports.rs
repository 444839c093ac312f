//! Port traits — the boundary between the core and the browser.
//!
//! The core never imports platform code; it drives one push connection
//! per question through these traits. Implementations live in
//! `chat-platform`.

use std::pin::Pin;

use futures::Stream;

use chat_types::{event::StreamEvent, Result};

/// An open push connection for one question.
pub struct StreamConnection {
    /// Events in transport delivery order. Ends after `Done` or
    /// `Error`, or when the handle is closed.
    pub events: Pin<Box<dyn Stream<Item = StreamEvent>>>,
    pub handle: Box<dyn ConnectionHandle>,
}

/// Revokes the underlying connection. Closing must be synchronous so
/// that clear/cancel can stop the transport before any further queued
/// callback runs.
pub trait ConnectionHandle {
    fn close(&self);
}

/// Opens one server-push subscription per question.
pub trait StreamPort {
    fn open(&self, question: &str) -> Result<StreamConnection>;
}
