//! Locker access and servery opening hours.
//!
//! Both answer from the tables loaded at startup. When a table is empty (the
//! database had no rows) the matching retrieval chain answers instead.

use super::{HandlerContext, Handled, Pending};
use crate::rag::RetrievalChain;
use crate::schedules::{
    extract_basement, extract_day, extract_meal, find_college, mentioned_college,
    LOCKER_COLLEGES, SERVERY_COLLEGES,
};
use tracing::error;

const ASK_LOCKER_COLLEGE: &str =
    "❓ Please mention the college (Krupp, College III, Nordmetall, or Mercator).";
const ASK_SERVERY: &str = "❓ Which servery would you like information about? \
                           (Krupp, College III, Nordmetall, Mercator, or Coffee Bar)";
const UNKNOWN_SERVERY: &str = "❓ I couldn't identify that servery. \
                               Please mention one of: Krupp, College III, Nordmetall, Mercator";
const NO_SCHEDULE: &str = "Sorry, I couldn't look up those hours right now.";

pub async fn handle_locker(ctx: &HandlerContext<'_>, query: &str) -> Handled {
    let Some(college) = mentioned_college(query, LOCKER_COLLEGES) else {
        ctx.reply.text(ASK_LOCKER_COLLEGE).await;
        return Handled::ok(ASK_LOCKER_COLLEGE);
    };

    if ctx.kb.lockers.is_empty() {
        return from_chain(ctx, &ctx.kb.chains.locker, query).await;
    }

    let basement = extract_basement(query);
    let message = ctx
        .kb
        .lockers
        .render(college, extract_day(query), basement.as_deref());
    ctx.reply.markdown(&message).await;
    Handled::ok(message)
}

/// Servery hours, asking which servery when the question names none.
pub async fn handle_servery(ctx: &HandlerContext<'_>, query: &str) -> Handled {
    match find_college(query, SERVERY_COLLEGES) {
        Some(college) => servery_reply(ctx, college, query).await,
        None => {
            ctx.reply.text(ASK_SERVERY).await;
            Handled::ok(ASK_SERVERY).awaiting(Pending::ServeryCollege {
                query: query.to_lowercase(),
            })
        }
    }
}

/// The answer to [`ASK_SERVERY`]. Day and meal may come from either message.
pub async fn handle_servery_follow_up(
    ctx: &HandlerContext<'_>,
    original: &str,
    reply: &str,
) -> Handled {
    let college =
        find_college(reply, SERVERY_COLLEGES).or_else(|| find_college(original, SERVERY_COLLEGES));
    match college {
        Some(college) => servery_reply(ctx, college, &format!("{original} {reply}")).await,
        None => {
            ctx.reply.text(UNKNOWN_SERVERY).await;
            Handled::ok(UNKNOWN_SERVERY)
        }
    }
}

async fn servery_reply(ctx: &HandlerContext<'_>, college: &str, text: &str) -> Handled {
    if ctx.kb.serveries.is_empty() {
        return from_chain(ctx, &ctx.kb.chains.servery, text).await;
    }
    let message = ctx
        .kb
        .serveries
        .render(college, extract_day(text), extract_meal(text));
    ctx.reply.markdown(&message).await;
    Handled::ok(message)
}

async fn from_chain(ctx: &HandlerContext<'_>, chain: &RetrievalChain, query: &str) -> Handled {
    ctx.reply.typing().await;
    match chain.invoke(ctx.provider, query).await {
        Ok(answer) => {
            ctx.reply.markdown(&answer.text).await;
            Handled::ok(answer.text).via(&answer.provider)
        }
        Err(e) => {
            error!("{} chain failed: {e}", chain.name());
            ctx.reply.text(NO_SCHEDULE).await;
            Handled::failed(NO_SCHEDULE)
        }
    }
}
