use serde::{Deserialize, Serialize};

/// A source reference attached to an assistant message.
///
/// `id` matches the digits of the inline `[n]` markers in the message
/// text and is unique within one message's citation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub id: u32,
    pub title: String,
    pub url: String,
}

impl Citation {
    pub fn new(id: u32, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            url: url.into(),
        }
    }
}
