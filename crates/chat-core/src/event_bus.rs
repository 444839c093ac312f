//! Frame-drained queue between the transport forwarder and the UI loop.
//!
//! Single-threaded (WASM constraint); clones share the queue via Rc.
//! The forwarding task pushes stream events tagged with their exchange,
//! and the app drains the queue into the session once per frame.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use chat_types::event::{SessionEvent, SessionId, StreamEvent};

/// Queue of stream events awaiting application to the session.
#[derive(Clone, Default)]
pub struct EventBus {
    queue: Rc<RefCell<VecDeque<SessionEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one event, tagged with the exchange it belongs to.
    pub fn emit(&self, session: SessionId, event: StreamEvent) {
        self.queue
            .borrow_mut()
            .push_back(SessionEvent { session, event });
    }

    /// Take every queued event, oldest first.
    pub fn drain(&self) -> Vec<SessionEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }
}
