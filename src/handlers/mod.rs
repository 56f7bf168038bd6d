//! Tool handlers: turn a routed message into replies.
//!
//! Handlers never return errors. Failures are logged and the user gets a
//! fixed apology; the returned [`Handled`] says how it went so the gateway
//! can record the interaction.

pub mod directions;
pub mod faq;
pub mod handbook;
pub mod location;
pub mod qa;
pub mod schedules;


use crate::{
    faq::FaqIndex,
    rag::Chains,
    router::Tool,
    schedules::{LockerHours, ServeryHours},
};
use std::sync::Arc;
use tracing::warn;
use unibot_core::{
    config::RoutingConfig,
    message::{DocumentLink, InlineButton, OutgoingMessage, Venue},
    traits::{Channel, Provider},
};
use unibot_knowledge::{HandbookCatalog, Location};

/// Everything handlers answer from, loaded once at startup.
pub struct Knowledge {
    pub locations: Vec<Location>,
    pub faq: FaqIndex,
    pub lockers: LockerHours,
    pub serveries: ServeryHours,
    pub chains: Chains,
    pub handbooks: Option<Arc<dyn HandbookCatalog>>,
    pub routing: RoutingConfig,
    /// Venue address for locations without one.
    pub default_address: String,
}

/// A follow-up the bot is waiting for from one sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    /// Asked which servery; holds the original question.
    ServeryCollege { query: String },
    /// Asked where the user is standing; holds the destination they named.
    DirectionsOrigin { target: String },
}

/// How a handler finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handled {
    /// Main reply text, for the interaction log.
    pub output: String,
    pub ok: bool,
    pub pending: Option<Pending>,
    /// Provider that produced the reply, when one was called.
    pub provider: Option<String>,
}

impl Handled {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ok: true,
            pending: None,
            provider: None,
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            ok: false,
            ..Self::ok(output)
        }
    }

    pub fn awaiting(mut self, pending: Pending) -> Self {
        self.pending = Some(pending);
        self
    }

    pub fn via(mut self, provider: &str) -> Self {
        self.provider = Some(provider.to_string());
        self
    }
}

/// Sends replies to one chat. Send failures are logged, not returned.
pub struct Responder<'a> {
    channel: &'a dyn Channel,
    target: Option<String>,
}

impl<'a> Responder<'a> {
    pub fn new(channel: &'a dyn Channel, target: Option<String>) -> Self {
        Self { channel, target }
    }

    pub async fn send(&self, message: OutgoingMessage) {
        if let Err(e) = self.channel.send(message.to(self.target.clone())).await {
            warn!("failed to send reply: {e}");
        }
    }

    pub async fn text(&self, text: &str) {
        self.send(OutgoingMessage::plain(text)).await;
    }

    pub async fn markdown(&self, text: &str) {
        self.send(OutgoingMessage::markdown(text)).await;
    }

    pub async fn buttons(&self, text: &str, buttons: Vec<InlineButton>) {
        self.send(OutgoingMessage::plain(text).with_buttons(buttons))
            .await;
    }

    pub async fn typing(&self) {
        if let Some(target) = &self.target {
            if let Err(e) = self.channel.send_typing(target).await {
                warn!("failed to send typing indicator: {e}");
            }
        }
    }

    pub async fn venue(&self, venue: &Venue) {
        if let Some(target) = &self.target {
            if let Err(e) = self.channel.send_venue(target, venue).await {
                warn!("failed to send venue: {e}");
            }
        }
    }

    pub async fn document(&self, document: &DocumentLink) {
        if let Some(target) = &self.target {
            if let Err(e) = self.channel.send_document(target, document).await {
                warn!("failed to send document {}: {e}", document.file_name);
            }
        }
    }
}

/// Grouped context for handler execution.
pub struct HandlerContext<'a> {
    pub kb: &'a Knowledge,
    pub provider: &'a dyn Provider,
    pub reply: &'a Responder<'a>,
}

/// Run the handler for a routed tool.
pub async fn dispatch(tool: Tool, ctx: &HandlerContext<'_>, query: &str) -> Handled {
    match tool {
        Tool::Location => location::handle_with_ai(ctx, query).await,
        Tool::Locker => schedules::handle_locker(ctx, query).await,
        Tool::Servery => schedules::handle_servery(ctx, query).await,
        Tool::Handbook => handbook::handle_query(ctx, query).await,
        Tool::Faq => faq::handle(ctx, query).await,
        Tool::Qa => qa::handle(ctx, query).await,
    }
}
