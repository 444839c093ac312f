#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use futures::channel::mpsc;
    use futures::StreamExt;

    use chat_types::citation::Citation;
    use chat_types::event::{SessionId, StreamEvent};
    use chat_types::message::{Message, MessagePatch, Role};

    use crate::citations::{resolve, segment, Segment};
    use crate::event_bus::EventBus;
    use crate::export::{export_filename, transcript_json, transcript_markdown};
    use crate::ports::{ConnectionHandle, StreamConnection, StreamPort};
    use crate::session::{ChatSession, ExchangeState, ERROR_REPLY};
    use crate::store::ConversationStore;

    // ─── Mock transport ──────────────────────────────────────

    struct MockHandle {
        closed: Rc<Cell<u32>>,
        sender: RefCell<Option<mpsc::UnboundedSender<StreamEvent>>>,
    }

    impl ConnectionHandle for MockHandle {
        fn close(&self) {
            self.closed.set(self.closed.get() + 1);
            // Dropping the sender ends the event stream, as the real
            // transport does when it releases its listeners.
            self.sender.borrow_mut().take();
        }
    }

    /// Transport that records opened questions and close calls.
    /// Tests drive the session by calling `apply` directly.
    struct MockTransport {
        opened: RefCell<Vec<String>>,
        closed: Rc<Cell<u32>>,
        fail_open: bool,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                opened: RefCell::new(Vec::new()),
                closed: Rc::new(Cell::new(0)),
                fail_open: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail_open: true,
                ..Self::new()
            }
        }

        fn close_count(&self) -> u32 {
            self.closed.get()
        }
    }

    impl StreamPort for MockTransport {
        fn open(&self, question: &str) -> chat_types::Result<StreamConnection> {
            if self.fail_open {
                return Err(chat_types::ChatError::Transport(
                    "connection refused".to_string(),
                ));
            }
            self.opened.borrow_mut().push(question.to_string());
            let (tx, rx) = mpsc::unbounded();
            Ok(StreamConnection {
                events: Box::pin(rx),
                handle: Box::new(MockHandle {
                    closed: self.closed.clone(),
                    sender: RefCell::new(Some(tx)),
                }),
            })
        }
    }

    fn token(text: &str) -> StreamEvent {
        StreamEvent::Token {
            text: text.to_string(),
        }
    }

    fn done(answer: &str, citations: Vec<Citation>) -> StreamEvent {
        StreamEvent::Done {
            answer: answer.to_string(),
            citations,
        }
    }

    // ─── ConversationStore Tests ─────────────────────────────

    #[test]
    fn test_store_append_preserves_order() {
        let mut store = ConversationStore::new();
        store.append(Message::user("first"));
        store.append(Message::user("second"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.messages()[0].text, "first");
        assert_eq!(store.messages()[1].text, "second");
    }

    #[test]
    fn test_store_update_by_id() {
        let mut store = ConversationStore::new();
        let msg = Message::assistant_placeholder();
        let id = msg.id.clone();
        store.append(msg);

        store.update_by_id(&id, MessagePatch::text("hello").streaming(false));
        assert_eq!(store.messages()[0].text, "hello");
        assert!(!store.messages()[0].streaming);
    }

    #[test]
    fn test_store_update_unknown_id_is_noop() {
        let mut store = ConversationStore::new();
        store.append(Message::user("hi"));
        let ghost = Message::user("ghost").id;
        store.update_by_id(&ghost, MessagePatch::text("changed"));
        assert_eq!(store.messages()[0].text, "hi");
    }

    #[test]
    fn test_store_partial_patch_leaves_other_fields() {
        let mut store = ConversationStore::new();
        let msg = Message::assistant_placeholder();
        let id = msg.id.clone();
        store.append(msg);

        store.update_by_id(&id, MessagePatch::text("partial"));
        assert!(store.messages()[0].streaming, "streaming flag was touched");
    }

    #[test]
    fn test_store_clear() {
        let mut store = ConversationStore::new();
        store.append(Message::user("hi"));
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_last_streaming_id() {
        let mut store = ConversationStore::new();
        assert!(store.last_streaming_id().is_none());

        store.append(Message::user("q"));
        let placeholder = Message::assistant_placeholder();
        let id = placeholder.id.clone();
        store.append(placeholder);
        assert_eq!(store.last_streaming_id(), Some(id));
    }

    // ─── Citation Resolver Tests ─────────────────────────────

    fn cite(id: u32) -> Citation {
        Citation::new(id, format!("Title {id}"), format!("https://s/{id}"))
    }

    #[test]
    fn test_segment_matched_markers() {
        let segments = segment("A [1] B [2]", &[cite(1), cite(2)]);
        assert_eq!(
            segments,
            vec![
                Segment::Text("A ".to_string()),
                Segment::Reference(1),
                Segment::Text(" B ".to_string()),
                Segment::Reference(2),
            ]
        );
    }

    #[test]
    fn test_segment_unmatched_marker_stays_literal() {
        let segments = segment("A [1] B [2]", &[cite(1)]);
        assert_eq!(
            segments,
            vec![
                Segment::Text("A ".to_string()),
                Segment::Reference(1),
                Segment::Text(" B [2]".to_string()),
            ]
        );
    }

    #[test]
    fn test_segment_adjacent_and_repeated_markers() {
        let segments = segment("[1][1]", &[cite(1)]);
        assert_eq!(
            segments,
            vec![Segment::Reference(1), Segment::Reference(1)]
        );
    }

    #[test]
    fn test_segment_no_markers_is_single_text() {
        let segments = segment("plain answer", &[cite(1)]);
        assert_eq!(segments, vec![Segment::Text("plain answer".to_string())]);
    }

    #[test]
    fn test_segment_non_numeric_bracket_is_literal() {
        let segments = segment("see [abc] and [1.2]", &[cite(1)]);
        assert_eq!(
            segments,
            vec![Segment::Text("see [abc] and [1.2]".to_string())]
        );
    }

    #[test]
    fn test_segment_unclosed_bracket_is_literal() {
        let segments = segment("dangling [", &[cite(1)]);
        assert_eq!(segments, vec![Segment::Text("dangling [".to_string())]);
    }

    #[test]
    fn test_resolve_prefers_supplied_citations() {
        let supplied = vec![cite(1), cite(2)];
        let resolved = resolve("A [1] B [2]", supplied.clone());
        assert_eq!(resolved, supplied);
    }

    #[test]
    fn test_resolve_synthesizes_when_absent() {
        let resolved = resolve("See [5]", Vec::new());
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, 5);
        assert_eq!(resolved[0].title, "Source 5");
        assert_eq!(resolved[0].url, "https://example.com/source/5");
    }

    #[test]
    fn test_resolve_synthesis_is_deterministic() {
        let first = resolve("See [5] and [5] again", Vec::new());
        let second = resolve("See [5] and [5] again", Vec::new());
        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_no_markers_yields_empty_list() {
        assert!(resolve("no sources here", Vec::new()).is_empty());
    }

    #[test]
    fn test_resolve_synthesis_first_appearance_order() {
        let resolved = resolve("[3] then [1]", Vec::new());
        let ids: Vec<u32> = resolved.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    // ─── EventBus Tests ──────────────────────────────────────

    #[test]
    fn test_event_bus_new_is_empty() {
        let bus = EventBus::new();
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_event_bus_emit_and_drain_in_order() {
        let bus = EventBus::new();
        bus.emit(SessionId(1), token("a"));
        bus.emit(SessionId(1), token("b"));

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].session, SessionId(1));
        assert!(matches!(&events[0].event, StreamEvent::Token { text } if text == "a"));
        assert!(matches!(&events[1].event, StreamEvent::Token { text } if text == "b"));
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_event_bus_clone_shares_queue() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        bus1.emit(SessionId(1), token("x"));
        assert_eq!(bus2.drain().len(), 1);
        assert!(bus1.drain().is_empty());
    }

    // ─── ChatSession Tests ───────────────────────────────────

    #[test]
    fn test_submit_appends_user_and_placeholder() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new();

        let opened = session.submit("What is Docker?", &transport);
        assert!(opened.is_some());
        assert!(session.is_busy());
        assert_eq!(session.state(), ExchangeState::Connecting);

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text, "What is Docker?");
        assert_eq!(messages[1].role, Role::Assistant);
        assert!(messages[1].text.is_empty());
        assert!(messages[1].streaming);

        assert_eq!(transport.opened.borrow().as_slice(), ["What is Docker?"]);
    }

    #[test]
    fn test_submit_trims_question() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new();
        session.submit("  hello  \n", &transport);
        assert_eq!(session.messages()[0].text, "hello");
    }

    #[test]
    fn test_submit_empty_question_is_noop() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new();
        assert!(session.submit("   ", &transport).is_none());
        assert!(session.messages().is_empty());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_submit_while_busy_is_noop() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new();

        session.submit("first", &transport).unwrap();
        assert!(session.submit("second", &transport).is_none());

        // No second user/assistant pair appended.
        assert_eq!(session.messages().len(), 2);
        assert_eq!(transport.opened.borrow().len(), 1);
    }

    #[test]
    fn test_tokens_concatenate_in_order() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new();
        let (id, _events) = session.submit("q", &transport).unwrap();

        session.apply(id, token("Doc"));
        session.apply(id, token("ker"));
        session.apply(id, token(" rocks"));

        let assistant = &session.messages()[1];
        assert_eq!(assistant.text, "Docker rocks");
        assert!(assistant.streaming);
        assert_eq!(session.state(), ExchangeState::Streaming);
        assert!(session.is_busy());
    }

    #[test]
    fn test_done_replaces_buffer_verbatim() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new();
        let (id, _events) = session.submit("q", &transport).unwrap();

        session.apply(id, token("Doc"));
        session.apply(id, token("ker"));
        session.apply(
            id,
            done("Docker is a platform. [1]", vec![cite(1)]),
        );

        let assistant = &session.messages()[1];
        assert_eq!(assistant.text, "Docker is a platform. [1]");
        assert!(!assistant.streaming);
        assert_eq!(assistant.citations, vec![cite(1)]);
        assert_eq!(session.state(), ExchangeState::Finalized);
        assert!(!session.is_busy());
        assert_eq!(transport.close_count(), 1);
    }

    #[test]
    fn test_done_without_citations_synthesizes() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new();
        let (id, _events) = session.submit("q", &transport).unwrap();

        session.apply(id, done("See [5]", Vec::new()));

        let assistant = &session.messages()[1];
        assert_eq!(assistant.citations.len(), 1);
        assert_eq!(assistant.citations[0].id, 5);
    }

    #[test]
    fn test_token_after_done_is_dropped() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new();
        let (id, _events) = session.submit("q", &transport).unwrap();

        session.apply(id, done("final", Vec::new()));
        session.apply(id, token("stray"));

        assert_eq!(session.messages()[1].text, "final");
        assert_eq!(session.state(), ExchangeState::Finalized);
    }

    #[test]
    fn test_error_substitutes_apology() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new();
        let (id, _events) = session.submit("q", &transport).unwrap();

        session.apply(id, token("partial"));
        session.apply(
            id,
            StreamEvent::Error {
                message: "connection lost".to_string(),
            },
        );

        let assistant = &session.messages()[1];
        assert_eq!(assistant.text, ERROR_REPLY);
        assert!(!assistant.streaming);
        assert!(assistant.citations.is_empty());
        assert_eq!(session.state(), ExchangeState::Errored);
        assert!(!session.is_busy());
        assert_eq!(transport.close_count(), 1);

        // The user may retry immediately.
        assert!(session.submit("again", &transport).is_some());
    }

    #[test]
    fn test_transport_open_failure_fails_exchange() {
        let transport = MockTransport::failing();
        let mut session = ChatSession::new();

        assert!(session.submit("q", &transport).is_none());
        let assistant = &session.messages()[1];
        assert_eq!(assistant.text, ERROR_REPLY);
        assert!(!assistant.streaming);
        assert!(!session.is_busy());
        assert_eq!(session.state(), ExchangeState::Errored);
    }

    #[test]
    fn test_clear_closes_connection_and_empties() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new();
        let (id, _events) = session.submit("q", &transport).unwrap();
        session.apply(id, token("partial"));

        session.clear();

        assert!(session.messages().is_empty());
        assert!(!session.is_busy());
        assert_eq!(session.state(), ExchangeState::Idle);
        assert_eq!(transport.close_count(), 1);

        // A late event from the closed session must not mutate anything.
        session.apply(id, token("ghost"));
        session.apply(id, done("ghost answer", Vec::new()));
        assert!(session.messages().is_empty());
    }

    #[test]
    fn test_clear_without_session_is_noop() {
        let mut session = ChatSession::new();
        session.clear();
        assert!(session.messages().is_empty());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_cancel_keeps_partial_text() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new();
        let (id, _events) = session.submit("q", &transport).unwrap();
        session.apply(id, token("partial answer"));

        session.cancel();

        let assistant = &session.messages()[1];
        assert_eq!(assistant.text, "partial answer");
        assert!(!assistant.streaming);
        assert_ne!(assistant.text, ERROR_REPLY);
        assert!(!session.is_busy());
        assert_eq!(session.state(), ExchangeState::Cancelled);
        assert_eq!(transport.close_count(), 1);

        // Late events for the cancelled session are dropped.
        session.apply(id, done("late answer", Vec::new()));
        assert_eq!(session.messages()[1].text, "partial answer");
    }

    #[test]
    fn test_cancel_terminates_event_stream() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new();
        let (_id, mut events) = session.submit("q", &transport).unwrap();

        session.cancel();

        // The closed connection's stream must finish, not park, so a
        // task awaiting the next event can exit.
        assert!(futures::executor::block_on(events.next()).is_none());
    }

    #[test]
    fn test_clear_terminates_event_stream() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new();
        let (_id, mut events) = session.submit("q", &transport).unwrap();

        session.clear();

        assert!(futures::executor::block_on(events.next()).is_none());
    }

    #[test]
    fn test_cancel_without_session_is_noop() {
        let mut session = ChatSession::new();
        session.cancel();
        assert!(!session.is_busy());
        assert_eq!(session.state(), ExchangeState::Idle);
    }

    #[test]
    fn test_second_exchange_after_finalize() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new();

        let (id, _events) = session.submit("first", &transport).unwrap();
        session.apply(id, done("answer one", Vec::new()));

        let (id2, _events) = session.submit("second", &transport).unwrap();
        assert_ne!(id, id2);
        session.apply(id2, token("two"));

        let messages = session.messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].text, "answer one");
        assert_eq!(messages[3].text, "two");

        // An event tagged with the first session no longer applies.
        session.apply(id, token("zombie"));
        assert_eq!(session.messages()[3].text, "two");
    }

    // ─── Export Tests ────────────────────────────────────────

    #[test]
    fn test_transcript_json_shape() {
        let messages = vec![Message::user("hi"), Message::assistant_placeholder()];
        let json = transcript_json(&messages).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["role"], "user");
        assert_eq!(records[0]["text"], "hi");
        assert!(records[0]["timestamp"].as_str().is_some());
    }

    #[test]
    fn test_transcript_markdown_shape() {
        let messages = vec![Message::user("question?")];
        let md = transcript_markdown(&messages);
        assert!(md.starts_with("**You** ("));
        assert!(md.contains("question?"));
        assert!(md.contains("---"));
    }

    #[test]
    fn test_export_filename() {
        let name = export_filename("json");
        assert!(name.starts_with("chat-export-"));
        assert!(name.ends_with(".json"));
    }
}
