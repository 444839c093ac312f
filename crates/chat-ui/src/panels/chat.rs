//! Chat panel — conversation display and question input.

use egui::{self, Align, Layout, RichText, ScrollArea, Vec2};

use chat_core::citations::{segment, Segment};
use chat_types::message::{Message, Role};

use crate::state::{ChatAction, UiState};
use crate::theme::{Palette, PANEL_PADDING, PANEL_ROUNDING};

/// Example questions shown while the conversation is empty.
pub const SUGGESTIONS: &[&str] = &[
    "What are the latest developments in AI technology?",
    "Explain quantum computing in simple terms",
    "What's happening in global markets today?",
    "How does renewable energy compare to fossil fuels?",
];

/// Render the chat panel. Returns the action the user triggered, if any.
pub fn chat_panel(
    ui: &mut egui::Ui,
    state: &mut UiState,
    messages: &[Message],
    busy: bool,
) -> Option<ChatAction> {
    let mut action = None;
    let palette = state.theme.palette();

    egui::Frame::default()
        .fill(palette.bg_primary)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                // Header
                ui.horizontal(|ui| {
                    ui.heading(
                        RichText::new("Where knowledge begins")
                            .color(palette.text_primary)
                            .strong(),
                    );
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui.button(state.theme.label()).clicked() {
                            state.theme = state.theme.toggled();
                        }
                        if !messages.is_empty() {
                            if ui.button("Clear").clicked() {
                                action = Some(ChatAction::Clear);
                            }
                            if ui.button("Export .md").clicked() {
                                action = Some(ChatAction::ExportMarkdown);
                            }
                            if ui.button("Export .json").clicked() {
                                action = Some(ChatAction::ExportJson);
                            }
                        }
                        if busy && ui.button("Stop").clicked() {
                            action = Some(ChatAction::Stop);
                        }
                        let (status, color) = if busy {
                            ("Searching...", palette.accent)
                        } else {
                            ("Ready", palette.success)
                        };
                        ui.label(RichText::new(status).color(color).small());
                    });
                });

                ui.separator();

                // Messages area
                let available_height = ui.available_height() - 60.0;
                ScrollArea::vertical()
                    .max_height(available_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        if messages.is_empty() {
                            if let Some(question) = render_empty_state(ui, palette) {
                                action = Some(ChatAction::Submit(question));
                            }
                        } else {
                            for msg in messages {
                                render_message(ui, msg, palette);
                                ui.add_space(4.0);
                            }
                        }
                    });

                ui.add_space(8.0);

                // Input area
                ui.horizontal(|ui| {
                    let input = egui::TextEdit::singleline(&mut state.input_text)
                        .hint_text("Ask me anything...")
                        .desired_width(ui.available_width() - 70.0)
                        .font(egui::FontId::proportional(14.0));

                    let response = ui.add(input);

                    let send_enabled = !state.input_text.trim().is_empty() && !busy;
                    let send_btn = ui.add_enabled(
                        send_enabled,
                        egui::Button::new(RichText::new("Send").color(palette.text_primary))
                            .fill(if send_enabled {
                                palette.accent
                            } else {
                                palette.bg_surface
                            })
                            .corner_radius(PANEL_ROUNDING)
                            .min_size(Vec2::new(60.0, 0.0)),
                    );

                    // Submit on Enter or button click
                    if (response.lost_focus()
                        && ui.input(|i| i.key_pressed(egui::Key::Enter))
                        && send_enabled)
                        || send_btn.clicked()
                    {
                        let question = state.input_text.trim().to_string();
                        action = Some(ChatAction::Submit(question));
                        state.input_text.clear();
                        response.request_focus();
                    }
                });
            });
        });

    action
}

fn render_empty_state(ui: &mut egui::Ui, palette: &Palette) -> Option<String> {
    let mut picked = None;

    ui.add_space(24.0);
    ui.vertical_centered(|ui| {
        ui.label(
            RichText::new("Ask me anything and get well-sourced answers.")
                .color(palette.text_secondary)
                .size(16.0),
        );
        ui.add_space(12.0);
        ui.label(
            RichText::new("Try asking about")
                .color(palette.text_secondary)
                .small(),
        );
        ui.add_space(8.0);
        for suggestion in SUGGESTIONS {
            if ui.button(*suggestion).clicked() {
                picked = Some(suggestion.to_string());
            }
        }
    });

    picked
}

fn render_message(ui: &mut egui::Ui, msg: &Message, palette: &Palette) {
    let (label, label_color) = match msg.role {
        Role::User => ("You", palette.accent),
        Role::Assistant => ("Assistant", palette.success),
    };

    egui::Frame::default()
        .fill(palette.bg_secondary)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(label).color(label_color).strong().small());
                if msg.role == Role::Assistant && !msg.text.is_empty() {
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui.small_button("Copy").clicked() {
                            ui.ctx().copy_text(msg.text.clone());
                            log::debug!("copied message {} to clipboard", msg.id);
                        }
                    });
                }
            });

            if msg.text.is_empty() && msg.streaming {
                ui.label(
                    RichText::new("Thinking...")
                        .color(palette.text_secondary)
                        .italics(),
                );
                return;
            }

            render_answer_text(ui, msg, palette);

            if msg.streaming {
                ui.label(RichText::new("▌").color(palette.accent).strong());
            }

            if !msg.citations.is_empty() {
                ui.add_space(4.0);
                ui.horizontal_wrapped(|ui| {
                    ui.label(
                        RichText::new("Sources:")
                            .color(palette.text_secondary)
                            .small(),
                    );
                    for citation in &msg.citations {
                        ui.hyperlink_to(
                            RichText::new(format!("[{}] {}", citation.id, citation.title)).small(),
                            &citation.url,
                        );
                    }
                });
            }
        });
}

/// Answer text with inline `[n]` markers rendered as citation links.
fn render_answer_text(ui: &mut egui::Ui, msg: &Message, palette: &Palette) {
    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing.x = 0.0;
        for piece in segment(&msg.text, &msg.citations) {
            match piece {
                Segment::Text(text) => {
                    ui.label(RichText::new(text).color(palette.text_primary));
                }
                Segment::Reference(id) => {
                    if let Some(citation) = msg.citations.iter().find(|c| c.id == id) {
                        ui.hyperlink_to(format!("[{}]", id), &citation.url)
                            .on_hover_text(&citation.title);
                    }
                }
            }
        }
    });
}
