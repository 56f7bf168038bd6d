//! Campus location answers: cards, pickers and the LLM-assisted search.

use super::{HandlerContext, Handled};
use crate::campus;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{error, warn};
use unibot_core::{context::Context, error::UnibotError};
use unibot_knowledge::Location;

const TROUBLE: &str = "Sorry, I'm having trouble understanding that location request.";
const PICK_RELEVANT: &str = "Based on your question, here are some relevant places:";
const FEATURE_QUERY: &str = "feature query";

/// Place names in free text, used when the LLM cannot list them.
static PLACE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-zA-Z\s]+(?:College|Hall|Lab|Center|Centre|Building)\b")
        .unwrap_or_else(|err| panic!("invalid place name regex: {err}"))
});

/// Send a location card followed by its map pin.
pub async fn show_location(ctx: &HandlerContext<'_>, location: &Location) -> Handled {
    let card = campus::render_location(location);
    ctx.reply.markdown(&card).await;
    if let Some(venue) = campus::venue(location, &ctx.kb.default_address) {
        ctx.reply.venue(&venue).await;
    }
    Handled::ok(card)
}

/// One card, or a picker when several places match.
pub async fn show_matches(
    ctx: &HandlerContext<'_>,
    matches: &[&Location],
    keywords: &[String],
    limit: usize,
) -> Handled {
    if let [only] = matches {
        return show_location(ctx, only).await;
    }
    let text = format!(
        "I found {} places with {}. Which one would you like to see?",
        matches.len(),
        keywords.join(" and ")
    );
    ctx.reply
        .buttons(&text, campus::location_buttons(matches, limit))
        .await;
    Handled::ok(text)
}

fn location_prompt(query: &str, locations: &[Location]) -> String {
    let mut names: Vec<&str> = locations.iter().map(|l| l.name.as_str()).collect();
    names.extend(
        locations
            .iter()
            .flat_map(|l| l.aliases.iter().map(|a| a.trim())),
    );
    format!(
        "You are a university location assistant. The user query is: \"{query}\"\n\n\
         The available campus locations are: {}\n\n\
         Which specific location, if any, is the user asking about? If the query is about a \
         specific location, respond with just that location name. If the query is about a \
         feature (like printers, food, etc.) or is not about a specific location, respond \
         with \"{FEATURE_QUERY}\".\n",
        names.join(", ")
    )
}

fn extraction_prompt(info: &str) -> String {
    format!(
        "From the following text about campus locations, extract all specific location names \
         mentioned:\n\n{info}\n\n\
         List just the names of locations, one per line, with no additional text.\n"
    )
}

/// The location the model named, matched exactly against names and aliases.
fn named_location<'a>(locations: &'a [Location], reply: &str) -> Option<&'a Location> {
    let reply = reply.trim().to_lowercase();
    if reply == FEATURE_QUERY {
        return None;
    }
    locations.iter().find(|loc| {
        loc.name.to_lowercase() == reply
            || loc.aliases.iter().any(|a| a.trim().to_lowercase() == reply)
    })
}

/// Campus entries whose name contains one of the extracted names, first hit per name.
fn match_extracted<'a>(locations: &'a [Location], names: &[String]) -> Vec<&'a Location> {
    let mut matched: Vec<&Location> = Vec::new();
    for name in names {
        let name = name.to_lowercase();
        if let Some(loc) = locations
            .iter()
            .find(|l| l.name.to_lowercase().contains(&name))
        {
            if !matched.iter().any(|m| m.id == loc.id) {
                matched.push(loc);
            }
        }
    }
    matched
}

/// Answer a free-text location question.
///
/// The model first gets a chance to name a single place. Feature words
/// (`printer`, `coffee`) come next, and the location chain is the last resort.
pub async fn handle_with_ai(ctx: &HandlerContext<'_>, query: &str) -> Handled {
    match locate(ctx, query).await {
        Ok(handled) => handled,
        Err(e) => {
            error!("error processing location query with AI: {e}");
            ctx.reply.text(TROUBLE).await;
            Handled::failed(TROUBLE)
        }
    }
}

async fn locate(ctx: &HandlerContext<'_>, query: &str) -> Result<Handled, UnibotError> {
    let locations = &ctx.kb.locations;

    let prompt = location_prompt(query, locations);
    match ctx.provider.complete(&Context::new(&prompt)).await {
        Ok(reply) => {
            if let Some(loc) = named_location(locations, &reply.text) {
                return Ok(show_location(ctx, loc).await.via(ctx.provider.name()));
            }
        }
        Err(e) => warn!("LLM location matching failed: {e}, falling back to feature search"),
    }

    let keywords = campus::extract_feature_keywords(query);
    if !keywords.is_empty() {
        let matches = campus::find_locations_by_feature(locations, &keywords);
        if !matches.is_empty() {
            let limit = ctx.kb.routing.max_feature_matches;
            return Ok(show_matches(ctx, &matches, &keywords, limit).await);
        }
    }

    let ai_query = format!(
        "The user wants to know about a location on campus with this query: {query}. \
         Please help find the most relevant locations."
    );
    let answer = ctx
        .kb
        .chains
        .location
        .invoke(ctx.provider, &ai_query)
        .await?;
    let info = answer.text;

    let names: Vec<String> = match ctx
        .provider
        .complete(&Context::new(&extraction_prompt(&info)))
        .await
    {
        Ok(reply) => reply
            .text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        Err(e) => {
            warn!("LLM location extraction failed: {e}, falling back to regex");
            PLACE_NAME
                .find_iter(&info)
                .map(|m| m.as_str().trim().to_string())
                .collect()
        }
    };

    let matched = match_extracted(locations, &names);
    let handled = if matched.is_empty() {
        let text = format!(
            "I couldn't find specific locations matching your query, but here's what I know:\n\n{info}"
        );
        ctx.reply.text(&text).await;
        Handled::ok(text)
    } else {
        let limit = ctx.kb.routing.max_feature_matches;
        ctx.reply
            .buttons(PICK_RELEVANT, campus::location_buttons(&matched, limit))
            .await;
        Handled::ok(PICK_RELEVANT)
    };
    Ok(handled.via(&answer.provider))
}
