//! General questions, answered by the unscoped chain.

use super::{HandlerContext, Handled};
use tracing::error;

const THINKING: &str = "Thinking...";
const FAILED: &str = "Sorry, I couldn't process your question.";

pub async fn handle(ctx: &HandlerContext<'_>, query: &str) -> Handled {
    ctx.reply.text(THINKING).await;
    match ctx.kb.chains.general.invoke(ctx.provider, query).await {
        Ok(answer) => {
            let text = answer.with_sources();
            ctx.reply.markdown(&text).await;
            Handled::ok(text).via(&answer.provider)
        }
        Err(e) => {
            error!("error processing question: {e}");
            ctx.reply.text(FAILED).await;
            Handled::failed(FAILED)
        }
    }
}
