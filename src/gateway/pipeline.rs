//! Message processing pipeline: the main handle_message flow.

use super::Gateway;
use crate::campus;
use crate::commands::{self, Command, CommandContext};
use crate::handbook;
use crate::handlers::{self, directions, schedules, HandlerContext, Handled, Pending, Responder};
use std::time::Instant;
use tracing::{info, warn};
use unibot_core::{
    filter,
    message::{IncomingMessage, MessageKind, OutgoingMessage},
};
use unibot_knowledge::{Interaction, InteractionStatus};

pub(super) const OUT_OF_SCOPE: &str = "I'm sorry, I can only help with university-related questions. \
     Try asking about campus locations, college schedules, handbooks or the FAQ.";
const LOCATION_GONE: &str = "Sorry, I couldn't find that location anymore.";
const UNKNOWN_BUTTON: &str = "Sorry, that button is no longer valid.";

/// What the pipeline did with a message, for the interaction log.
struct Outcome {
    tool: String,
    handled: Handled,
    status: InteractionStatus,
}

impl Outcome {
    fn new(tool: impl Into<String>, handled: Handled) -> Self {
        let status = if handled.ok {
            InteractionStatus::Ok
        } else {
            InteractionStatus::Error
        };
        Self {
            tool: tool.into(),
            handled,
            status,
        }
    }

    fn filtered(handled: Handled) -> Self {
        Self {
            tool: "filter".to_string(),
            handled,
            status: InteractionStatus::Filtered,
        }
    }
}

impl Gateway {
    /// Process a single incoming message through the full pipeline.
    pub(super) async fn handle_message(&self, incoming: IncomingMessage) {
        let started = Instant::now();
        let preview = if incoming.text.chars().count() > 60 {
            let truncated: String = incoming.text.chars().take(60).collect();
            format!("{truncated}...")
        } else {
            incoming.text.clone()
        };
        info!(
            "[{}] {} says: {}",
            incoming.channel,
            incoming.sender_name.as_deref().unwrap_or("unknown"),
            preview
        );

        // --- 1. AUTH CHECK ---
        if self.auth_config.enabled {
            if let Some(reason) = self.check_auth(&incoming) {
                warn!(
                    "auth denied for {} on {}: {reason}",
                    incoming.sender_id, incoming.channel
                );
                self.send_text(&incoming, &self.auth_config.deny_message)
                    .await;
                let outcome = Outcome {
                    tool: "auth".to_string(),
                    handled: Handled::failed(reason),
                    status: InteractionStatus::Denied,
                };
                self.record(&incoming, &outcome, started).await;
                return;
            }
        }

        let provider = self.providers.for_sender(&incoming.sender_id).await;
        let reply = Responder::new(self.channel.as_ref(), incoming.reply_target.clone());
        let ctx = HandlerContext {
            kb: &self.knowledge,
            provider: provider.as_ref(),
            reply: &reply,
        };

        // --- 2. CALLBACKS ---
        let outcome = if let MessageKind::Callback {
            callback_id,
            message_id,
        } = &incoming.kind
        {
            let outcome = self.handle_callback(&ctx, &incoming.text, *message_id).await;
            if let Err(e) = self.channel.answer_callback(callback_id).await {
                warn!("failed to answer callback {callback_id}: {e}");
            }
            outcome
        } else {
            self.handle_text(&ctx, &incoming).await
        };

        // --- 8. RECORD ---
        if let Some(pending) = &outcome.handled.pending {
            self.pending
                .lock()
                .await
                .insert(incoming.sender_id.clone(), pending.clone());
        }
        self.record(&incoming, &outcome, started).await;
    }

    async fn handle_callback(
        &self,
        ctx: &HandlerContext<'_>,
        data: &str,
        message_id: Option<i64>,
    ) -> Outcome {
        if let Some(id) = campus::parse_callback(data) {
            let handled = match campus::find_by_id(&self.knowledge.locations, id) {
                Some(found) => {
                    let card = campus::render_location(found);
                    ctx.reply
                        .send(OutgoingMessage::markdown(&card).editing(message_id))
                        .await;
                    if let Some(venue) = campus::venue(found, &self.knowledge.default_address) {
                        ctx.reply.venue(&venue).await;
                    }
                    Handled::ok(card)
                }
                None => {
                    ctx.reply
                        .send(OutgoingMessage::plain(LOCATION_GONE).editing(message_id))
                        .await;
                    Handled::failed(LOCATION_GONE)
                }
            };
            return Outcome::new("location", handled);
        }

        if let Some(idx) = handbook::parse_callback(data) {
            return Outcome::new("handbook", handlers::handbook::handle_callback(ctx, idx).await);
        }

        warn!("unknown callback data: {data}");
        ctx.reply.text(UNKNOWN_BUTTON).await;
        Outcome::new("callback", Handled::failed(UNKNOWN_BUTTON))
    }

    async fn handle_text(&self, ctx: &HandlerContext<'_>, incoming: &IncomingMessage) -> Outcome {
        let text = incoming.text.trim();
        let command = Command::parse(text);

        // --- 3. PENDING CONVERSATIONS ---
        // A command leaves the conversation waiting.
        if command.is_none() {
            let pending = self.pending.lock().await.remove(&incoming.sender_id);
            match pending {
                Some(Pending::ServeryCollege { query }) => {
                    let handled = schedules::handle_servery_follow_up(ctx, &query, text).await;
                    return Outcome::new("servery", handled);
                }
                Some(Pending::DirectionsOrigin { target }) => {
                    let handled = directions::follow_up(ctx, &target, text).await;
                    return Outcome::new("directions", handled);
                }
                None => {}
            }
        }

        // --- 4. COMMANDS ---
        if let Some(cmd) = command {
            let args = commands::args(text);
            let cmd_ctx = CommandContext {
                handler: ctx,
                sender_id: &incoming.sender_id,
                first_name: incoming.first_name.as_deref(),
                args: &args,
                providers: &self.providers,
            };
            let handled = commands::handle(cmd, &cmd_ctx).await;
            return Outcome::new(format!("/{}", cmd.name()), handled);
        }

        // --- 5. DIRECTIONS ---
        if directions::is_directions_question(text) {
            return Outcome::new("directions", directions::start(ctx, text).await);
        }

        // --- 6. CONTENT FILTER ---
        if self.knowledge.routing.content_filter {
            let verdict = filter::is_university_related(text);
            if !verdict.allowed {
                info!(
                    "filtered message from {}: {}",
                    incoming.sender_id,
                    verdict.reason.as_deref().unwrap_or("not university related")
                );
                ctx.reply.text(OUT_OF_SCOPE).await;
                return Outcome::filtered(Handled::failed(OUT_OF_SCOPE));
            }
        }

        // --- 7. CLASSIFY AND DISPATCH ---
        let tool = self.classifier.classify(ctx.provider, text).await;
        info!("routing message from {} to {tool}", incoming.sender_id);
        if tool.uses_llm() {
            ctx.reply.typing().await;
        }
        let handled = handlers::dispatch(tool, ctx, text).await;
        Outcome::new(tool.as_str(), handled)
    }

    async fn record(
        &self,
        incoming: &IncomingMessage,
        outcome: &Outcome,
        started: Instant,
    ) {
        let Some(log) = &self.interactions else {
            return;
        };
        log.record(&Interaction {
            channel: incoming.channel.clone(),
            sender_id: incoming.sender_id.clone(),
            sender_name: incoming.sender_name.clone(),
            input_text: incoming.text.clone(),
            tool: Some(outcome.tool.clone()),
            output_text: Some(outcome.handled.output.clone()),
            provider_used: outcome.handled.provider.clone(),
            processing_ms: Some(started.elapsed().as_millis() as i64),
            status: outcome.status,
        })
        .await;
    }
}
