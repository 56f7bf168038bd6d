//! Program handbooks: the PDF itself, or answers from its contents.

use super::{HandlerContext, Handled};
use crate::handbook::{extract_major, find_handbook_by_major, handbook_buttons, is_content_question};
use tracing::error;
use unibot_core::message::DocumentLink;
use unibot_knowledge::Handbook;

const CONTENT_FAILED: &str = "I'm sorry, I couldn't process your question about handbook content. \
                              Please try again later.";
const LIST_FAILED: &str =
    "I'm sorry, I couldn't retrieve the handbook information. Please try again later.";
const PICK_MAJOR: &str = "Which major's handbook would you like to see?";
const GONE: &str = "Sorry, I couldn't find that handbook anymore.";

/// A free-text handbook message: content questions go to the handbook
/// chain, anything else is a request for the file.
pub async fn handle_query(ctx: &HandlerContext<'_>, query: &str) -> Handled {
    if is_content_question(query) {
        return content_question(ctx, query).await;
    }
    send_handbook(ctx, extract_major(query)).await
}

/// `/handbook [major]`. Arguments name the major as typed.
pub async fn handle_command(ctx: &HandlerContext<'_>, args: &str) -> Handled {
    let args = args.trim();
    let major = (!args.is_empty()).then(|| args.to_lowercase());
    send_handbook(ctx, major).await
}

/// A `hb:{idx}` picker button.
pub async fn handle_callback(ctx: &HandlerContext<'_>, idx: usize) -> Handled {
    let handbooks = match list(ctx).await {
        Some(handbooks) => handbooks,
        None => return Handled::failed(LIST_FAILED),
    };
    match handbooks.get(idx) {
        Some(handbook) => deliver(ctx, handbook).await,
        None => {
            ctx.reply.text(GONE).await;
            Handled::failed(GONE)
        }
    }
}

async fn content_question(ctx: &HandlerContext<'_>, query: &str) -> Handled {
    ctx.reply.typing().await;
    match ctx.kb.chains.handbook.invoke(ctx.provider, query).await {
        Ok(answer) => {
            let text = answer.with_handbook_sources();
            ctx.reply.markdown(&text).await;
            Handled::ok(text).via(&answer.provider)
        }
        Err(e) => {
            error!("error processing handbook content question: {e}");
            ctx.reply.text(CONTENT_FAILED).await;
            Handled::failed(CONTENT_FAILED)
        }
    }
}

/// The handbook list, or `None` after telling the user it is unavailable.
async fn list(ctx: &HandlerContext<'_>) -> Option<Vec<Handbook>> {
    let result = match &ctx.kb.handbooks {
        Some(catalog) => catalog.list_handbooks().await,
        None => {
            ctx.reply.text(LIST_FAILED).await;
            return None;
        }
    };
    match result {
        Ok(handbooks) => Some(handbooks),
        Err(e) => {
            error!("error listing handbooks: {e}");
            ctx.reply.text(LIST_FAILED).await;
            None
        }
    }
}

async fn send_handbook(ctx: &HandlerContext<'_>, major: Option<String>) -> Handled {
    let Some(handbooks) = list(ctx).await else {
        return Handled::failed(LIST_FAILED);
    };

    match major {
        Some(major) => match find_handbook_by_major(&handbooks, &major) {
            Some(handbook) if !handbook.url.is_empty() => deliver(ctx, handbook).await,
            _ => about_major(ctx, &major).await,
        },
        None => {
            let limit = ctx.kb.routing.max_handbooks;
            ctx.reply
                .buttons(PICK_MAJOR, handbook_buttons(&handbooks, limit))
                .await;
            Handled::ok(PICK_MAJOR)
        }
    }
}

async fn deliver(ctx: &HandlerContext<'_>, handbook: &Handbook) -> Handled {
    let text = format!("Here's the handbook for *{}*:", handbook.major);
    ctx.reply.markdown(&text).await;
    ctx.reply
        .document(&DocumentLink {
            url: handbook.url.clone(),
            file_name: handbook.file_name.clone(),
        })
        .await;
    Handled::ok(text)
}

/// No handbook for the major: tell the user what the general chain knows.
async fn about_major(ctx: &HandlerContext<'_>, major: &str) -> Handled {
    let question =
        format!("What information do you have about the {major} program or major at the university?");
    match ctx.kb.chains.general.invoke(ctx.provider, &question).await {
        Ok(answer) => {
            let text = format!(
                "I couldn't find a specific handbook for *{major}*, but here's what I know:\n\n{}",
                answer.text
            );
            ctx.reply.markdown(&text).await;
            Handled::ok(text).via(&answer.provider)
        }
        Err(e) => {
            error!("error answering about major {major}: {e}");
            let text = format!(
                "I couldn't find a handbook for {major}. Please check with the academic office for information."
            );
            ctx.reply.text(&text).await;
            Handled::failed(text)
        }
    }
}
