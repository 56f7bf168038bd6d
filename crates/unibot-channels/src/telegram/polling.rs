//! Long-polling update loop and Channel trait implementation.

use super::send::answer_denied_callback;
use super::types::{TgResponse, TgUpdate};
use super::{parse_chat_id, TelegramChannel};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use unibot_core::{
    error::UnibotError,
    message::{DocumentLink, IncomingMessage, MessageKind, OutgoingMessage, Venue},
    traits::Channel,
};
use uuid::Uuid;

/// Only these update types are requested from Telegram.
const ALLOWED_UPDATES: &str = r#"["message","callback_query"]"#;

/// Callback id of a button press from a sender outside a non-empty
/// `allowed_users` list. Such presses still need an answer.
pub(crate) fn denied_callback(update: &TgUpdate, allowed_users: &[i64]) -> Option<String> {
    let cb = update.callback_query.as_ref()?;
    (!allowed_users.is_empty() && !allowed_users.contains(&cb.from.id)).then(|| cb.id.clone())
}

/// Convert a raw update into an incoming message.
///
/// Returns `None` for updates we do not handle (edits, stickers, ...) and
/// for senders outside a non-empty `allowed_users` list.
pub(crate) fn to_incoming(update: TgUpdate, allowed_users: &[i64]) -> Option<IncomingMessage> {
    let (user, chat_id, text, kind) = if let Some(cb) = update.callback_query {
        let data = cb.data?;
        let chat_id = cb.message.as_ref().map(|m| m.chat.id).unwrap_or(cb.from.id);
        let kind = MessageKind::Callback {
            callback_id: cb.id,
            message_id: cb.message.as_ref().map(|m| m.message_id),
        };
        (cb.from, chat_id, data, kind)
    } else {
        let msg = update.message?;
        let text = msg.text?;
        let user = msg.from?;
        (user, msg.chat.id, text, MessageKind::Text)
    };

    if !allowed_users.is_empty() && !allowed_users.contains(&user.id) {
        warn!("ignoring update from unauthorized user {}", user.id);
        return None;
    }

    Some(IncomingMessage {
        id: Uuid::new_v4(),
        channel: "telegram".to_string(),
        sender_id: user.id.to_string(),
        sender_name: Some(user.display_name()),
        first_name: Some(user.first_name),
        text,
        timestamp: chrono::Utc::now(),
        reply_target: Some(chat_id.to_string()),
        kind,
    })
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, UnibotError> {
        self.register_commands().await;

        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let allowed_users = self.config.allowed_users.clone();
        let last_update_id = self.last_update_id.clone();

        info!("Telegram channel starting long polling...");

        tokio::spawn(async move {
            let mut backoff_secs: u64 = 1;

            loop {
                let last = last_update_id.lock().await;
                let offset = last.map(|id| id + 1);
                drop(last);

                let mut query = vec![
                    ("timeout", "30".to_string()),
                    ("allowed_updates", ALLOWED_UPDATES.to_string()),
                ];
                if let Some(off) = offset {
                    query.push(("offset", off.to_string()));
                }

                let resp = match client
                    .get(format!("{base_url}/getUpdates"))
                    .query(&query)
                    .timeout(Duration::from_secs(35))
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        error!("telegram poll error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                let body: TgResponse<Vec<TgUpdate>> = match resp.json().await {
                    Ok(b) => b,
                    Err(e) => {
                        error!("telegram parse error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                if !body.ok {
                    error!(
                        "telegram API error (retry in {backoff_secs}s): {}",
                        body.description.unwrap_or_default()
                    );
                    tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                    backoff_secs = (backoff_secs * 2).min(60);
                    continue;
                }

                backoff_secs = 1;

                let updates = body.result.unwrap_or_default();

                if let Some(last_update) = updates.last() {
                    *last_update_id.lock().await = Some(last_update.update_id);
                }

                for update in updates {
                    let update_id = update.update_id;
                    if let Some(callback_id) = denied_callback(&update, &allowed_users) {
                        answer_denied_callback(&client, &base_url, &callback_id).await;
                    }
                    let Some(incoming) = to_incoming(update, &allowed_users) else {
                        debug!("telegram: skipping update {update_id}");
                        continue;
                    };

                    if tx.send(incoming).await.is_err() {
                        info!("telegram channel receiver dropped, stopping poll");
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), UnibotError> {
        let target = message
            .reply_target
            .as_deref()
            .ok_or_else(|| UnibotError::Channel("no reply_target on outgoing message".into()))?;
        let chat_id = parse_chat_id(target)?;

        match message.edit_message_id {
            Some(message_id) => self.edit_text(chat_id, message_id, &message).await,
            None => self.send_text(chat_id, &message).await,
        }
    }

    async fn send_typing(&self, target: &str) -> Result<(), UnibotError> {
        self.send_chat_action(parse_chat_id(target)?, "typing").await
    }

    async fn send_venue(&self, target: &str, venue: &Venue) -> Result<(), UnibotError> {
        self.send_venue_pin(parse_chat_id(target)?, venue).await
    }

    async fn send_document(
        &self,
        target: &str,
        document: &DocumentLink,
    ) -> Result<(), UnibotError> {
        self.send_document_url(parse_chat_id(target)?, document)
            .await
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), UnibotError> {
        self.answer_callback_query(callback_id).await
    }

    async fn stop(&self) -> Result<(), UnibotError> {
        info!("Telegram channel stopped");
        Ok(())
    }
}
