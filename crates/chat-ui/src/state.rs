//! UI-level state that drives rendering.
//!
//! The conversation itself lives in the core session; this holds only
//! presentation concerns (input field, theme) and the actions a frame
//! produced for the app to dispatch.

use crate::theme::ThemeMode;

/// State owned by the panels
pub struct UiState {
    /// Input field content
    pub input_text: String,
    pub theme: ThemeMode,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            input_text: String::new(),
            theme: ThemeMode::Dark,
        }
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

/// What the user asked for during one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    Submit(String),
    Stop,
    Clear,
    ExportJson,
    ExportMarkdown,
}
