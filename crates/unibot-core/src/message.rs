use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An incoming message from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Channel name (e.g. "telegram", "cli").
    pub channel: String,
    /// Platform-specific user ID.
    pub sender_id: String,
    /// Human-readable sender name (e.g. "@handle").
    pub sender_name: Option<String>,
    /// First name, used for greetings.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Message text content. For callbacks this is the callback data.
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Platform-specific target for routing the response (e.g. Telegram chat_id).
    #[serde(default)]
    pub reply_target: Option<String>,
    #[serde(default)]
    pub kind: MessageKind,
}

/// What produced an incoming message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageKind {
    /// A typed message (including `/commands`).
    #[default]
    Text,
    /// An inline keyboard button press.
    Callback {
        callback_id: String,
        /// The message carrying the keyboard, so it can be edited in place.
        message_id: Option<i64>,
    },
}

impl IncomingMessage {
    /// Build a plain text message, mostly for the CLI and tests.
    pub fn text(channel: &str, sender_id: &str, text: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            sender_id: sender_id.to_string(),
            sender_name: None,
            first_name: None,
            text: text.to_string(),
            timestamp: Utc::now(),
            reply_target: Some(sender_id.to_string()),
            kind: MessageKind::Text,
        }
    }

    pub fn is_callback(&self) -> bool {
        matches!(self.kind, MessageKind::Callback { .. })
    }
}

/// An outgoing message to send back through a channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    pub metadata: MessageMetadata,
    /// Platform-specific target for routing (e.g. Telegram chat_id).
    #[serde(default)]
    pub reply_target: Option<String>,
    /// Render `*bold*` and friends. Channels retry as plain text if parsing fails.
    #[serde(default)]
    pub markdown: bool,
    /// Inline keyboard rows.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keyboard: Vec<Vec<InlineButton>>,
    /// Replace the text of an earlier message instead of sending a new one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_message_id: Option<i64>,
}

impl OutgoingMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markdown: true,
            ..Default::default()
        }
    }

    /// One button per row, the layout used for location and handbook pickers.
    pub fn with_buttons(mut self, buttons: Vec<InlineButton>) -> Self {
        self.keyboard = buttons.into_iter().map(|b| vec![b]).collect();
        self
    }

    pub fn editing(mut self, message_id: Option<i64>) -> Self {
        self.edit_message_id = message_id;
        self
    }

    pub fn to(mut self, target: Option<String>) -> Self {
        self.reply_target = target;
        self
    }
}

/// Metadata about how a message was generated.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MessageMetadata {
    /// Which provider produced this response.
    pub provider_used: String,
    /// Token count (if available from the provider).
    pub tokens_used: Option<u64>,
    /// Wall-clock processing time in milliseconds.
    pub processing_time_ms: u64,
    /// Model identifier (if applicable).
    pub model: Option<String>,
}

/// A single inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// A map pin with a title and address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub address: String,
}

/// A remote file the channel should deliver as a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLink {
    pub url: String,
    pub file_name: String,
}
