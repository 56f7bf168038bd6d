//! Outgoing calls: text, edits, venues, documents, callbacks, chat actions
//! and command registration.

use super::TelegramChannel;
use crate::utils::split_message;
use serde_json::{json, Value};
use tracing::{info, warn};
use unibot_core::{
    error::UnibotError,
    message::{DocumentLink, InlineButton, OutgoingMessage, Venue},
};

/// Telegram's message length limit.
const MAX_MESSAGE_LEN: usize = 4096;

/// Commands shown in the Telegram autocomplete menu.
pub(crate) const BOT_COMMANDS: &[(&str, &str)] = &[
    ("start", "Start the bot"),
    ("help", "Show what I can help with"),
    ("where", "Find a place on campus"),
    ("find", "Find places with a feature (printer, food, study)"),
    ("handbook", "Get a program handbook"),
    ("providers", "List available AI providers"),
    ("provider", "Show or switch your AI provider"),
];

/// Shown to senders outside `allowed_users` who press an inline button.
pub(crate) const UNAUTHORIZED_NOTICE: &str = "Sorry, you are not authorized to use this bot.";

/// Body for `answerCallbackQuery`, with an optional toast text.
pub(crate) fn callback_answer_body(callback_id: &str, notice: Option<&str>) -> Value {
    let mut body = json!({ "callback_query_id": callback_id });
    if let Some(text) = notice {
        body["text"] = json!(text);
    }
    body
}

/// Answer a button press from an unauthorized sender. Best-effort.
pub(crate) async fn answer_denied_callback(
    client: &reqwest::Client,
    base_url: &str,
    callback_id: &str,
) {
    let body = callback_answer_body(callback_id, Some(UNAUTHORIZED_NOTICE));
    if let Err(e) = client
        .post(format!("{base_url}/answerCallbackQuery"))
        .json(&body)
        .send()
        .await
    {
        warn!("failed to answer denied callback {callback_id}: {e}");
    }
}

/// Inline keyboard markup for a set of button rows.
pub(crate) fn keyboard_markup(rows: &[Vec<InlineButton>]) -> Value {
    let rows: Vec<Vec<Value>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| json!({ "text": b.text, "callback_data": b.callback_data }))
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

/// Build the JSON body for `sendMessage` / `editMessageText`.
///
/// The keyboard is attached only when `with_keyboard` is set, so split
/// messages carry it on their last chunk.
pub(crate) fn message_body(
    chat_id: i64,
    text: &str,
    markdown: bool,
    keyboard: &[Vec<InlineButton>],
    with_keyboard: bool,
) -> Value {
    let mut body = json!({
        "chat_id": chat_id,
        "text": text,
    });
    if markdown {
        body["parse_mode"] = json!("Markdown");
    }
    if with_keyboard && !keyboard.is_empty() {
        body["reply_markup"] = keyboard_markup(keyboard);
    }
    body
}

impl TelegramChannel {
    /// POST a JSON body, retrying once without `parse_mode` if Telegram
    /// rejects the Markdown.
    async fn post_with_plain_fallback(&self, method: &str, body: Value) -> Result<(), UnibotError> {
        let url = format!("{}/{method}", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| UnibotError::Channel(format!("telegram {method} failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let error_text = resp.text().await.unwrap_or_default();
        if !error_text.contains("can't parse entities") {
            return Err(UnibotError::Channel(format!(
                "telegram {method} failed ({status}): {error_text}"
            )));
        }

        warn!("Markdown parse failed, retrying as plain text: {error_text}");
        let mut plain_body = body;
        if let Some(obj) = plain_body.as_object_mut() {
            obj.remove("parse_mode");
        }
        let plain_resp = self
            .client
            .post(&url)
            .json(&plain_body)
            .send()
            .await
            .map_err(|e| UnibotError::Channel(format!("telegram {method} (plain) failed: {e}")))?;
        if !plain_resp.status().is_success() {
            let plain_err = plain_resp.text().await.unwrap_or_default();
            return Err(UnibotError::Channel(format!(
                "telegram {method} (plain fallback) failed: {plain_err}"
            )));
        }
        Ok(())
    }

    /// POST a JSON body and fail on a non-success status.
    async fn post_json(&self, method: &str, body: Value) -> Result<(), UnibotError> {
        let url = format!("{}/{method}", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| UnibotError::Channel(format!("telegram {method} failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(UnibotError::Channel(format!(
                "telegram {method} failed ({status}): {error_text}"
            )));
        }
        Ok(())
    }

    /// Send a message, split into 4096-byte chunks.
    pub(crate) async fn send_text(
        &self,
        chat_id: i64,
        message: &OutgoingMessage,
    ) -> Result<(), UnibotError> {
        let chunks = split_message(&message.text, MAX_MESSAGE_LEN);
        let last = chunks.len().saturating_sub(1);

        for (i, chunk) in chunks.into_iter().enumerate() {
            let body = message_body(
                chat_id,
                chunk,
                message.markdown,
                &message.keyboard,
                i == last,
            );
            self.post_with_plain_fallback("sendMessage", body).await?;
        }

        Ok(())
    }

    /// Replace the text (and keyboard) of an earlier message.
    pub(crate) async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i64,
        message: &OutgoingMessage,
    ) -> Result<(), UnibotError> {
        let mut body = message_body(
            chat_id,
            &message.text,
            message.markdown,
            &message.keyboard,
            true,
        );
        body["message_id"] = json!(message_id);
        self.post_with_plain_fallback("editMessageText", body).await
    }

    /// Send a map pin.
    pub(crate) async fn send_venue_pin(&self, chat_id: i64, venue: &Venue) -> Result<(), UnibotError> {
        let body = json!({
            "chat_id": chat_id,
            "latitude": venue.latitude,
            "longitude": venue.longitude,
            "title": venue.title,
            "address": venue.address,
        });
        self.post_json("sendVenue", body).await
    }

    /// Send a document by URL; Telegram fetches the file itself.
    pub(crate) async fn send_document_url(
        &self,
        chat_id: i64,
        document: &DocumentLink,
    ) -> Result<(), UnibotError> {
        let body = json!({
            "chat_id": chat_id,
            "document": document.url,
            "caption": document.file_name,
        });
        self.post_json("sendDocument", body).await
    }

    /// Acknowledge an inline keyboard press so the client stops its spinner.
    pub(crate) async fn answer_callback_query(&self, callback_id: &str) -> Result<(), UnibotError> {
        self.post_json("answerCallbackQuery", callback_answer_body(callback_id, None))
            .await
    }

    /// Register bot commands with Telegram so users see an autocomplete menu.
    /// Best-effort: logs failures but does not propagate errors.
    pub(crate) async fn register_commands(&self) {
        let commands: Vec<Value> = BOT_COMMANDS
            .iter()
            .map(|(command, description)| json!({ "command": command, "description": description }))
            .collect();

        match self
            .post_json("setMyCommands", json!({ "commands": commands }))
            .await
        {
            Ok(()) => info!("registered Telegram bot commands"),
            Err(e) => warn!("failed to register Telegram bot commands: {e}"),
        }
    }

    /// Send a chat action (e.g. "typing") to a chat.
    pub(crate) async fn send_chat_action(
        &self,
        chat_id: i64,
        action: &str,
    ) -> Result<(), UnibotError> {
        let url = format!("{}/sendChatAction", self.base_url);
        let body = json!({
            "chat_id": chat_id,
            "action": action,
        });

        self.client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| UnibotError::Channel(format!("telegram sendChatAction failed: {e}")))?;

        Ok(())
    }
}
