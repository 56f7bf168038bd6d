//! Gateway: the main event loop connecting the channel, the router and the handlers.
//!
//! Includes auth enforcement, per-sender conversation state, interaction
//! logging and graceful shutdown.

mod pipeline;


use crate::commands::ProviderChoice;
use crate::handlers::{Knowledge, Pending};
use crate::router::ToolClassifier;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use unibot_core::{
    config::{AuthConfig, ChannelConfig},
    message::{IncomingMessage, OutgoingMessage},
    traits::Channel,
};
use unibot_knowledge::InteractionLog;

/// The central gateway that routes messages from the channel to the handlers.
pub struct Gateway {
    pub(super) channel: Arc<dyn Channel>,
    pub(super) providers: ProviderChoice,
    pub(super) knowledge: Knowledge,
    pub(super) classifier: ToolClassifier,
    /// `None` runs without an interaction log.
    pub(super) interactions: Option<InteractionLog>,
    pub(super) auth_config: AuthConfig,
    pub(super) channel_config: ChannelConfig,
    /// Follow-ups the bot is waiting for, keyed by sender.
    pub(super) pending: Mutex<HashMap<String, Pending>>,
    /// Tracks senders with a message in flight. New messages are buffered here.
    pub(super) active_senders: Mutex<HashMap<String, Vec<IncomingMessage>>>,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(
        channel: Arc<dyn Channel>,
        providers: ProviderChoice,
        knowledge: Knowledge,
        interactions: Option<InteractionLog>,
        auth_config: AuthConfig,
        channel_config: ChannelConfig,
    ) -> Self {
        let classifier = ToolClassifier::new(knowledge.routing.llm_classification);
        Self {
            channel,
            providers,
            knowledge,
            classifier,
            interactions,
            auth_config,
            channel_config,
            pending: Mutex::new(HashMap::new()),
            active_senders: Mutex::new(HashMap::new()),
        }
    }

    /// Run the main event loop until the channel closes or Ctrl-C.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "unibot gateway running | channel: {} | providers: {} | auth: {} | llm routing: {}",
            self.channel.name(),
            self.providers.names().join(", "),
            if self.auth_config.enabled {
                "enforced"
            } else {
                "disabled"
            },
            self.knowledge.routing.llm_classification,
        );

        let mut rx = self
            .channel
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start channel {}: {e}", self.channel.name()))?;
        info!("Channel started: {}", self.channel.name());

        loop {
            tokio::select! {
                incoming = rx.recv() => match incoming {
                    Some(incoming) => {
                        let gw = self.clone();
                        tokio::spawn(async move {
                            gw.dispatch_message(incoming).await;
                        });
                    }
                    None => {
                        warn!("channel {} closed its receiver", self.channel.name());
                        break;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Dispatch a message: buffer if the sender is busy, otherwise process.
    pub(super) async fn dispatch_message(self: Arc<Self>, incoming: IncomingMessage) {
        let sender_key = format!("{}:{}", incoming.channel, incoming.sender_id);

        {
            let mut active = self.active_senders.lock().await;
            if let Some(buffer) = active.get_mut(&sender_key) {
                info!("buffered message from {sender_key} (reply in progress)");
                buffer.push(incoming);
                return;
            }
            active.insert(sender_key.clone(), Vec::new());
        }

        self.handle_message(incoming).await;
        self.drain_buffered(&sender_key).await;
    }

    /// Process messages that arrived while the sender was busy, in order,
    /// then release the sender.
    pub(super) async fn drain_buffered(&self, sender_key: &str) {
        loop {
            let next = {
                let mut active = self.active_senders.lock().await;
                match active.get_mut(sender_key) {
                    Some(buf) if !buf.is_empty() => Some(buf.remove(0)),
                    _ => {
                        active.remove(sender_key);
                        None
                    }
                }
            };

            match next {
                Some(buffered) => {
                    info!("processing buffered message from {sender_key}");
                    self.handle_message(buffered).await;
                }
                None => break,
            }
        }
    }

    async fn shutdown(&self) {
        info!("Shutting down...");
        let waiting = self.pending.lock().await.len();
        if waiting > 0 {
            info!("dropping {waiting} unfinished conversations");
        }
        if let Err(e) = self.channel.stop().await {
            warn!("failed to stop channel {}: {e}", self.channel.name());
        }
        info!("Shutdown complete.");
    }

    /// Why a sender is not allowed, or `None` when they are.
    pub(super) fn check_auth(&self, incoming: &IncomingMessage) -> Option<String> {
        match incoming.channel.as_str() {
            "telegram" => match &self.channel_config.telegram {
                // Empty list = allow all.
                Some(tg) if tg.allowed_users.is_empty() => None,
                Some(tg) => {
                    let sender_id: i64 = incoming.sender_id.parse().unwrap_or(-1);
                    if tg.allowed_users.contains(&sender_id) {
                        None
                    } else {
                        Some(format!(
                            "telegram user {} not in allowed_users",
                            incoming.sender_id
                        ))
                    }
                }
                None => Some("telegram channel not configured".to_string()),
            },
            other => Some(format!("unknown channel: {other}")),
        }
    }

    /// Send a plain text message back to the sender.
    pub(super) async fn send_text(&self, incoming: &IncomingMessage, text: &str) {
        let msg = OutgoingMessage::plain(text).to(incoming.reply_target.clone());
        if let Err(e) = self.channel.send(msg).await {
            warn!("failed to send message: {e}");
        }
    }
}
