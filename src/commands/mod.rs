//! Built-in bot commands.

mod providers;

#[cfg(test)]
mod tests;

pub use providers::ProviderChoice;

use crate::campus;
use crate::handlers::{handbook, location, HandlerContext, Handled};

const HELP: &str = "Here's what I can help you with:\n\n\
• 📍 `/where [location]`: Find places on campus (e.g., Ocean Lab, C3, IRC).\n\n\
• 🔍 `/find [feature]`: Find places with specific features (e.g., printer, food, study).\n\n\
• 🧺 *Locker hours*: Ask for locker access times in any college.\n\n\
• ❓ *University FAQs*: Ask about documents, laundry, residence permits, etc.\n\n\
• 🗓 *College events*: Get updates on announcements and upcoming activities.\n\n\
💬 Just type your question, I'll understand natural language too!\n\n\
🔒 Bot is limited to university-related queries only.";

const WHERE_USAGE: &str = "Please provide a location name.\nFor example: /where Ocean Lab";
const WHERE_MISS: &str =
    "Sorry, I couldn't find that location. Try asking in a different way or try the /find command.";
const FIND_USAGE: &str =
    "Please specify what you're looking for.\nFor example: /find printer or /find food";
const FIND_MISS: &str =
    "I don't have specific information about places with those features. Let me think about it...";

/// Grouped context for command execution.
pub struct CommandContext<'a> {
    pub handler: &'a HandlerContext<'a>,
    pub sender_id: &'a str,
    pub first_name: Option<&'a str>,
    /// Everything after the command word.
    pub args: &'a str,
    pub providers: &'a ProviderChoice,
}

/// Known bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Where,
    Find,
    Handbook,
    Providers,
    Provider,
}

impl Command {
    /// Parse a command from message text. Returns `None` for unknown `/` prefixes,
    /// which are then treated as questions.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        // Strip @botname suffix (e.g. "/help@unibot" → "/help").
        let cmd = first.split('@').next().unwrap_or(first);
        match cmd {
            "/start" => Some(Self::Start),
            "/help" => Some(Self::Help),
            "/where" => Some(Self::Where),
            "/find" => Some(Self::Find),
            "/handbook" => Some(Self::Handbook),
            "/providers" => Some(Self::Providers),
            "/provider" => Some(Self::Provider),
            _ => None,
        }
    }

    /// Command word without the slash, as recorded in the interaction log.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Where => "where",
            Self::Find => "find",
            Self::Handbook => "handbook",
            Self::Providers => "providers",
            Self::Provider => "provider",
        }
    }
}

/// Arguments after the command word, whitespace-normalised.
pub fn args(text: &str) -> String {
    text.split_whitespace()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Handle a command, sending its replies.
pub async fn handle(cmd: Command, ctx: &CommandContext<'_>) -> Handled {
    match cmd {
        Command::Start => {
            let name = ctx.first_name.unwrap_or("there");
            reply(
                ctx,
                format!(
                    "Hi {name}! I'm your University Info Bot. Ask me any question about college schedules, fees, or events!"
                ),
            )
            .await
        }
        Command::Help => {
            ctx.handler.reply.markdown(HELP).await;
            Handled::ok(HELP)
        }
        Command::Where => handle_where(ctx).await,
        Command::Find => handle_find(ctx).await,
        Command::Handbook => handbook::handle_command(ctx.handler, ctx.args).await,
        Command::Providers => {
            let text = ctx.providers.describe(ctx.sender_id).await;
            ctx.handler.reply.markdown(&text).await;
            Handled::ok(text)
        }
        Command::Provider => {
            let text = ctx.providers.apply(ctx.sender_id, ctx.args).await;
            reply(ctx, text).await
        }
    }
}

async fn reply(ctx: &CommandContext<'_>, text: String) -> Handled {
    ctx.handler.reply.text(&text).await;
    Handled::ok(text)
}

async fn handle_where(ctx: &CommandContext<'_>) -> Handled {
    if ctx.args.is_empty() {
        return reply(ctx, WHERE_USAGE.to_string()).await;
    }
    let name = campus::extract_location_name(ctx.args);
    match campus::find_location_by_name_or_alias(&ctx.handler.kb.locations, &name) {
        Some(found) => location::show_location(ctx.handler, found).await,
        None => reply(ctx, WHERE_MISS.to_string()).await,
    }
}

async fn handle_find(ctx: &CommandContext<'_>) -> Handled {
    if ctx.args.is_empty() {
        return reply(ctx, FIND_USAGE.to_string()).await;
    }
    let mut keywords = campus::extract_feature_keywords(ctx.args);
    if keywords.is_empty() {
        keywords.push(ctx.args.to_lowercase());
    }

    let kb = ctx.handler.kb;
    let matches = campus::find_locations_by_feature(&kb.locations, &keywords);
    if matches.is_empty() {
        ctx.handler.reply.text(FIND_MISS).await;
        return location::handle_with_ai(ctx.handler, ctx.args).await;
    }
    location::show_matches(ctx.handler, &matches, &keywords, kb.routing.max_locations).await
}
