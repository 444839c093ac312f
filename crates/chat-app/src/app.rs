//! Main egui application — owns the session and drives the event loop.
//!
//! Flow per question: the chat panel yields a submit action, the
//! session opens an SSE connection, and a spawned local task forwards
//! stream events onto the bus tagged with the session id. Each frame
//! drains the bus into the session, then renders its snapshot.

use std::cell::RefCell;
use std::rc::Rc;

use egui::CentralPanel;
use futures::StreamExt;

use chat_core::event_bus::EventBus;
use chat_core::export::{export_filename, transcript_json, transcript_markdown};
use chat_core::session::ChatSession;
use chat_platform::download::download_text;
use chat_platform::sse::SseTransport;
use chat_types::event::SessionEvent;
use chat_ui::panels::chat;
use chat_ui::state::{ChatAction, UiState};
use chat_ui::theme::{self, ThemeMode};

/// The main application state
pub struct ChatApp {
    session: Rc<RefCell<ChatSession>>,
    bus: EventBus,
    transport: Rc<SseTransport>,
    ui_state: UiState,
    applied_theme: Option<ThemeMode>,
}

impl ChatApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            session: Rc::new(RefCell::new(ChatSession::new())),
            bus: EventBus::new(),
            transport: Rc::new(SseTransport::new()),
            ui_state: UiState::new(),
            applied_theme: None,
        }
    }

    /// Open an exchange and forward its stream events onto the bus.
    fn dispatch_question(&self, question: String, ctx: &egui::Context) {
        let opened = self
            .session
            .borrow_mut()
            .submit(&question, self.transport.as_ref());
        let Some((id, mut events)) = opened else {
            return;
        };

        let bus = self.bus.clone();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            // The loop also ends when cancel/clear closes the
            // connection and the stream finishes.
            while let Some(event) = events.next().await {
                let terminal = event.is_terminal();
                bus.emit(id, event);
                ctx.request_repaint();
                if terminal {
                    break;
                }
            }
        });
    }

    fn export_transcript(&self, markdown: bool) {
        let session = self.session.borrow();
        let result = if markdown {
            Ok(transcript_markdown(session.messages()))
        } else {
            transcript_json(session.messages())
        };
        let (extension, mime) = if markdown {
            ("md", "text/markdown")
        } else {
            ("json", "application/json")
        };

        match result {
            Ok(content) => {
                if let Err(e) = download_text(&export_filename(extension), mime, &content) {
                    log::error!("transcript download failed: {}", e);
                }
            }
            Err(e) => log::error!("transcript serialization failed: {}", e),
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.applied_theme != Some(self.ui_state.theme) {
            theme::apply_theme(ctx, self.ui_state.theme);
            self.applied_theme = Some(self.ui_state.theme);
        }

        // Drain stream events into the session
        let events = self.bus.drain();
        if !events.is_empty() {
            let mut session = self.session.borrow_mut();
            for SessionEvent { session: id, event } in events {
                session.apply(id, event);
            }
            ctx.request_repaint();
        }

        if self.session.borrow().is_busy() {
            ctx.request_repaint();
        }

        let (messages, busy) = {
            let session = self.session.borrow();
            (session.messages().to_vec(), session.is_busy())
        };

        let mut action = None;
        CentralPanel::default().show(ctx, |ui| {
            action = chat::chat_panel(ui, &mut self.ui_state, &messages, busy);
        });

        match action {
            Some(ChatAction::Submit(question)) => self.dispatch_question(question, ctx),
            Some(ChatAction::Stop) => self.session.borrow_mut().cancel(),
            Some(ChatAction::Clear) => self.session.borrow_mut().clear(),
            Some(ChatAction::ExportJson) => self.export_transcript(false),
            Some(ChatAction::ExportMarkdown) => self.export_transcript(true),
            None => {}
        }
    }
}
