//! Curated FAQ answers, with the FAQ chain behind them.

use super::{HandlerContext, Handled};
use std::time::Instant;
use tracing::error;
use unibot_core::error::UnibotError;

const NOT_IN_FAQ: &str = "I'm sorry, I don't have information about that in my FAQ database.";
const REPHRASE: &str =
    "I wasn't able to find an answer for that. Could you try rephrasing your question?";

pub async fn handle(ctx: &HandlerContext<'_>, query: &str) -> Handled {
    if let Some(answer) = ctx.kb.faq.lookup(query) {
        ctx.reply.markdown(answer).await;
        return Handled::ok(answer);
    }

    match semantic(ctx, query).await {
        Ok(handled) => handled,
        Err(e) => {
            error!("error processing FAQ query: {e}");
            ctx.reply.text(REPHRASE).await;
            Handled::failed(REPHRASE)
        }
    }
}

async fn semantic(ctx: &HandlerContext<'_>, query: &str) -> Result<Handled, UnibotError> {
    let started = Instant::now();
    let chain = &ctx.kb.chains.faq;
    let hits = chain.retrieve(query).await?;
    if hits.is_empty() {
        ctx.reply.text(NOT_IN_FAQ).await;
        return Ok(Handled::ok(NOT_IN_FAQ));
    }

    let answer = chain.answer(ctx.provider, query, hits, started).await?;
    ctx.reply.markdown(&answer.text).await;
    Ok(Handled::ok(answer.text).via(&answer.provider))
}
