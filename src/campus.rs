//! Campus map lookups: name and alias matching, feature search, location cards.

use crate::fuzzy;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use unibot_core::message::{InlineButton, Venue};
use unibot_knowledge::Location;

/// Question prefixes stripped before a name lookup, applied in order.
const NAME_PREFIXES: &[&str] = &[
    "where is",
    "where's",
    "where can i find",
    "how do i get to",
    "find",
    "where",
];

static FEATURE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(print(?:ing|er)?)\b",
        r"(?i)\b(stud(?:y|ying))\b",
        r"(?i)\b(food|eat(?:ing)?|dining|meal)\b",
        r"(?i)\b(coffee)\b",
        r"(?i)\b(ify)\b",
        r"(?i)\b(quiet)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap_or_else(|err| panic!("invalid feature regex {p}: {err}")))
    .collect()
});

/// Callback data prefix for location picker buttons.
pub const CALLBACK_PREFIX: &str = "location:";

/// Reduce a question to the place name it asks about.
pub fn extract_location_name(query: &str) -> String {
    let mut query = query.to_lowercase();
    for prefix in NAME_PREFIXES {
        if let Some(rest) = query.strip_prefix(prefix) {
            query = rest.trim().to_string();
        }
    }
    query.trim_matches('?').trim().to_string()
}

/// Find one location by name or alias, trying progressively looser strategies.
pub fn find_location_by_name_or_alias<'a>(
    locations: &'a [Location],
    query: &str,
) -> Option<&'a Location> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }
    let query_words: Vec<&str> = query.split_whitespace().collect();
    let lower_aliases = |loc: &Location| -> Vec<String> {
        loc.aliases.iter().map(|a| a.to_lowercase()).collect()
    };

    // Exact name.
    if let Some(loc) = locations.iter().find(|l| l.name.to_lowercase() == query) {
        return Some(loc);
    }

    // Exact alias.
    if let Some(loc) = locations
        .iter()
        .find(|l| lower_aliases(l).iter().any(|a| *a == query))
    {
        return Some(loc);
    }

    // Whole word of the name.
    if let Some(loc) = locations.iter().find(|l| {
        let name = l.name.to_lowercase();
        let name_words: Vec<&str> = name.split_whitespace().collect();
        query_words.iter().any(|w| name_words.contains(w))
    }) {
        return Some(loc);
    }

    // Substring of the name.
    if let Some(loc) = locations
        .iter()
        .find(|l| l.name.to_lowercase().contains(&query))
    {
        return Some(loc);
    }

    // Alias contains the query or the other way round.
    if let Some(loc) = locations.iter().find(|l| {
        lower_aliases(l)
            .iter()
            .any(|a| a.contains(&query) || query.contains(a.as_str()))
    }) {
        return Some(loc);
    }

    // Any longer query word inside the alias list.
    locations.iter().find(|l| {
        if l.aliases.is_empty() {
            return false;
        }
        let joined = lower_aliases(l).join(", ");
        query_words
            .iter()
            .any(|w| w.chars().count() > 2 && joined.contains(w))
    })
}

/// Resolve a free-form place name with fuzzy matching over names and aliases.
///
/// Used where the user types a place on its own (directions). Falls back to
/// [`find_location_by_name_or_alias`] when nothing scores above `cutoff`.
pub fn resolve_location<'a>(
    locations: &'a [Location],
    text: &str,
    cutoff: f64,
) -> Option<&'a Location> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    let mut keys: Vec<(String, usize)> = Vec::new();
    for (idx, loc) in locations.iter().enumerate() {
        keys.push((loc.name.to_lowercase(), idx));
        for alias in &loc.aliases {
            keys.push((alias.to_lowercase(), idx));
        }
    }

    if let Some(hit) = fuzzy::close_match(&text, keys.iter().map(|(k, _)| k.as_str()), cutoff) {
        if let Some((_, idx)) = keys.iter().find(|(k, _)| k == hit) {
            return locations.get(*idx);
        }
    }

    find_location_by_name_or_alias(locations, &text)
}

/// Feature words in a question (`printer`, `coffee`, `study`, ...), lower-cased.
pub fn extract_feature_keywords(text: &str) -> Vec<String> {
    let mut keywords = Vec::new();
    for pattern in FEATURE_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                keywords.push(m.as_str().to_lowercase());
            }
        }
    }
    keywords
}

/// Map a request word onto the tag vocabulary of the campus map.
fn feature_tag(keyword: &str) -> &str {
    match keyword {
        "print" | "printing" => "printer",
        "eat" | "food" | "meal" | "dining" | "cafeteria" => "food",
        "study" | "studying" | "quiet" => "study",
        other => other,
    }
}

/// Locations carrying any tag the keywords map to, in map order.
pub fn find_locations_by_feature<'a>(
    locations: &'a [Location],
    keywords: &[String],
) -> Vec<&'a Location> {
    let search: BTreeSet<String> = keywords
        .iter()
        .map(|k| feature_tag(&k.to_lowercase()).to_string())
        .collect();

    locations
        .iter()
        .filter(|loc| {
            loc.tags
                .iter()
                .any(|t| search.contains(&t.to_lowercase()))
        })
        .collect()
}

pub fn find_by_id(locations: &[Location], id: i64) -> Option<&Location> {
    locations.iter().find(|loc| loc.id == id)
}

/// Markdown card: name, features, aliases.
pub fn render_location(location: &Location) -> String {
    let mut text = format!("📍 *{}*\n", location.name);
    if !location.tags.is_empty() {
        text.push_str(&format!("Features: {}\n", location.tags.join(", ")));
    }
    if !location.aliases.is_empty() {
        text.push_str(&format!("Also known as: {}\n", location.aliases.join(", ")));
    }
    text
}

/// Map pin for a location. `None` when it has no coordinates.
pub fn venue(location: &Location, default_address: &str) -> Option<Venue> {
    Some(Venue {
        latitude: location.latitude?,
        longitude: location.longitude?,
        title: location.name.clone(),
        address: location
            .address
            .clone()
            .unwrap_or_else(|| default_address.to_string()),
    })
}

/// One picker button per location.
pub fn location_buttons(locations: &[&Location], limit: usize) -> Vec<InlineButton> {
    locations
        .iter()
        .take(limit)
        .map(|loc| InlineButton::new(&loc.name, format!("{CALLBACK_PREFIX}{}", loc.id)))
        .collect()
}

/// Location id from picker callback data.
pub fn parse_callback(data: &str) -> Option<i64> {
    data.strip_prefix(CALLBACK_PREFIX)?.trim().parse().ok()
}
