//! SSE transport adapter — wraps the browser `EventSource` API.
//!
//! One `EventSource` per question, subscribed as
//! `GET {endpoint}?question=<url-encoded>`. The server pushes named
//! events `token`, `done` and `error`; their callbacks feed an
//! unbounded channel that the core consumes as a `Stream`. All three
//! listeners are attached before `open` returns, so the first token
//! cannot be lost to a registration race.

use std::cell::RefCell;

use futures::channel::mpsc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventSource, MessageEvent};

use chat_core::ports::{ConnectionHandle, StreamConnection, StreamPort};
use chat_types::{
    event::{DonePayload, StreamEvent, TokenPayload},
    ChatError, Result,
};

/// Default subscription endpoint of the answering service.
pub const STREAM_ENDPOINT: &str = "/api/stream";

/// Build the subscription URL for a question.
pub fn stream_url(endpoint: &str, question: &str) -> String {
    format!("{}?question={}", endpoint, urlencoding::encode(question))
}

/// Parse the payload of a `token` event.
pub fn parse_token(data: &str) -> Result<StreamEvent> {
    let payload: TokenPayload = serde_json::from_str(data)?;
    Ok(StreamEvent::Token { text: payload.text })
}

/// Parse the payload of a `done` event.
pub fn parse_done(data: &str) -> Result<StreamEvent> {
    let payload: DonePayload = serde_json::from_str(data)?;
    Ok(StreamEvent::Done {
        answer: payload.answer,
        citations: payload.citations,
    })
}

/// Transport that opens one `EventSource` per question.
pub struct SseTransport {
    endpoint: String,
}

impl SseTransport {
    pub fn new() -> Self {
        Self {
            endpoint: STREAM_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for SseTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// The registered listener closures. They own the only senders of the
/// event channel, so their lifetime bounds the stream's.
struct Listeners {
    token: Closure<dyn FnMut(MessageEvent)>,
    done: Closure<dyn FnMut(MessageEvent)>,
    error: Closure<dyn FnMut(Event)>,
}

struct EventSourceHandle {
    source: EventSource,
    listeners: RefCell<Option<Listeners>>,
}

impl ConnectionHandle for EventSourceHandle {
    fn close(&self) {
        self.source.close();
        if let Some(Listeners { token, done, error }) = self.listeners.borrow_mut().take() {
            self.source.set_onerror(None);
            let _ = self
                .source
                .remove_event_listener_with_callback("token", token.as_ref().unchecked_ref());
            let _ = self
                .source
                .remove_event_listener_with_callback("done", done.as_ref().unchecked_ref());
            // Dropping the closures drops the last channel senders,
            // so the event stream ends and its forwarding task exits.
            drop((token, done, error));
        }
    }
}

impl StreamPort for SseTransport {
    fn open(&self, question: &str) -> Result<StreamConnection> {
        let url = stream_url(&self.endpoint, question);
        let source = EventSource::new(&url)
            .map_err(|e| ChatError::Transport(format!("EventSource failed: {:?}", e)))?;

        let (tx, rx) = mpsc::unbounded::<StreamEvent>();

        // token: drop malformed payloads, the stream stays open
        let tx_token = tx.clone();
        let on_token = Closure::wrap(Box::new(move |event: MessageEvent| {
            let data = event.data().as_string().unwrap_or_default();
            match parse_token(&data) {
                Ok(ev) => {
                    let _ = tx_token.unbounded_send(ev);
                }
                Err(e) => log::warn!("dropping malformed token event: {}", e),
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        source
            .add_event_listener_with_callback("token", on_token.as_ref().unchecked_ref())
            .map_err(|e| ChatError::JsInterop(format!("{:?}", e)))?;

        // done: a malformed terminal payload is escalated to the
        // stream-error path
        let tx_done = tx.clone();
        let on_done = Closure::wrap(Box::new(move |event: MessageEvent| {
            let data = event.data().as_string().unwrap_or_default();
            let ev = match parse_done(&data) {
                Ok(ev) => ev,
                Err(e) => {
                    log::error!("malformed done event: {}", e);
                    StreamEvent::Error {
                        message: e.to_string(),
                    }
                }
            };
            let _ = tx_done.unbounded_send(ev);
        }) as Box<dyn FnMut(MessageEvent)>);
        source
            .add_event_listener_with_callback("done", on_done.as_ref().unchecked_ref())
            .map_err(|e| ChatError::JsInterop(format!("{:?}", e)))?;

        // error: connection-level failure or abnormal close
        let tx_error = tx;
        let on_error = Closure::wrap(Box::new(move |_event: Event| {
            let _ = tx_error.unbounded_send(StreamEvent::Error {
                message: "connection failed".to_string(),
            });
        }) as Box<dyn FnMut(Event)>);
        source.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        // The handle keeps the closures alive while the connection is
        // open and releases them in `close`.
        Ok(StreamConnection {
            events: Box::pin(rx),
            handle: Box::new(EventSourceHandle {
                source,
                listeners: RefCell::new(Some(Listeners {
                    token: on_token,
                    done: on_done,
                    error: on_error,
                })),
            }),
        })
    }
}
