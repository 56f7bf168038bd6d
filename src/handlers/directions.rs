//! "How do I get to X?": ask where the user is, then route between the two.

use super::{HandlerContext, Handled, Pending};
use crate::campus::resolve_location;
use tracing::error;

const TRIGGERS: &[&str] = &["how do i get to", "how can i get to", "how to reach"];
const ASK_ORIGIN: &str = "Where are you standing right now?";
const NO_TARGET: &str = "Please specify where you want to go.";
const UNKNOWN_PLACES: &str =
    "Sorry, I couldn't understand the location names. Try using different words.";
const FAILED: &str = "Sorry, I couldn't process your question.";
const THINKING: &str = "Thinking...";

/// Fuzzy cutoff for matching typed place names.
const PLACE_CUTOFF: f64 = 0.6;

pub fn is_directions_question(text: &str) -> bool {
    let text = text.to_lowercase();
    TRIGGERS.iter().any(|t| text.contains(t))
}

/// The destination left after removing the trigger phrases.
pub fn target_of(text: &str) -> String {
    let mut target = text.to_lowercase();
    for trigger in TRIGGERS {
        target = target.replace(trigger, "");
    }
    target.trim().trim_end_matches('?').trim().to_string()
}

pub async fn start(ctx: &HandlerContext<'_>, text: &str) -> Handled {
    let target = target_of(text);
    if target.is_empty() {
        ctx.reply.text(NO_TARGET).await;
        return Handled::ok(NO_TARGET);
    }
    ctx.reply.text(ASK_ORIGIN).await;
    Handled::ok(ASK_ORIGIN).awaiting(Pending::DirectionsOrigin { target })
}

/// The answer to [`ASK_ORIGIN`].
pub async fn follow_up(ctx: &HandlerContext<'_>, target: &str, origin: &str) -> Handled {
    let locations = &ctx.kb.locations;
    let (Some(origin), Some(target)) = (
        resolve_location(locations, origin, PLACE_CUTOFF),
        resolve_location(locations, target, PLACE_CUTOFF),
    ) else {
        ctx.reply.text(UNKNOWN_PLACES).await;
        return Handled::ok(UNKNOWN_PLACES);
    };

    let question = format!("How can I get from {} to {}?", origin.name, target.name);
    ctx.reply.text(THINKING).await;
    match ctx.kb.chains.general.invoke(ctx.provider, &question).await {
        Ok(answer) => {
            ctx.reply.text(&answer.text).await;
            Handled::ok(answer.text).via(&answer.provider)
        }
        Err(e) => {
            error!("error answering directions question: {e}");
            ctx.reply.text(FAILED).await;
            Handled::failed(FAILED)
        }
    }
}
