//! Program handbook requests: which major the user wants, and whether they
//! want the PDF itself or an answer from its contents.

use regex::Regex;
use std::sync::LazyLock;
use unibot_core::message::InlineButton;
use unibot_knowledge::Handbook;

/// Callback data prefix for handbook picker buttons: `hb:{index}`.
pub const CALLBACK_PREFIX: &str = "hb:";

const MAJOR_PREFIXES: &[&str] = &[
    "handbook for",
    "handbook of",
    "show me the handbook for",
    "get me the handbook for",
    "can i see the handbook for",
    "find the handbook for",
];

const CONTENT_INDICATORS: &[&str] = &[
    "what",
    "how",
    "why",
    "explain",
    "tell me about",
    "describe",
    "is there",
    "are there",
    "do i need",
    "requirements",
    "courses",
    "prerequisites",
    "credits",
];

static MAJOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:major|program|degree)(?:\s+in)?\s+([a-z\s]+?)(?:$|\.|\?)")
        .unwrap_or_else(|err| panic!("invalid major regex: {err}"))
});

/// The major a handbook request names, lower-cased.
pub fn extract_major(query: &str) -> Option<String> {
    let cleaned = query.to_lowercase();

    for prefix in MAJOR_PREFIXES {
        if let Some(pos) = cleaned.find(prefix) {
            let major = cleaned[pos + prefix.len()..]
                .trim()
                .trim_end_matches(['?', '.', '!'])
                .trim();
            return (!major.is_empty()).then(|| major.to_string());
        }
    }

    MAJOR_PATTERN
        .captures(&cleaned)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|m| !m.is_empty())
}

/// Exact major first, then either name containing the other.
pub fn find_handbook_by_major<'a>(handbooks: &'a [Handbook], major: &str) -> Option<&'a Handbook> {
    let major = major.trim().to_lowercase();
    if major.is_empty() {
        return None;
    }
    handbooks
        .iter()
        .find(|h| h.major.to_lowercase() == major)
        .or_else(|| {
            handbooks.iter().find(|h| {
                let name = h.major.to_lowercase();
                name.contains(&major) || major.contains(&name)
            })
        })
}

/// Whether the text asks about handbook contents rather than for the file.
pub fn is_content_question(text: &str) -> bool {
    let lower = text.to_lowercase();
    if lower.trim_start().starts_with("/handbook") {
        return false;
    }
    lower.contains('?') || CONTENT_INDICATORS.iter().any(|i| lower.contains(i))
}

/// Picker buttons, one per handbook, carrying the list index.
pub fn handbook_buttons(handbooks: &[Handbook], limit: usize) -> Vec<InlineButton> {
    handbooks
        .iter()
        .take(limit)
        .enumerate()
        .map(|(idx, h)| InlineButton::new(&h.major, format!("{CALLBACK_PREFIX}{idx}")))
        .collect()
}

pub fn parse_callback(data: &str) -> Option<usize> {
    data.strip_prefix(CALLBACK_PREFIX)?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handbooks() -> Vec<Handbook> {
        ["Computer Science", "Physics", "Industrial Engineering And Management"]
            .iter()
            .map(|m| Handbook {
                major: m.to_string(),
                file_name: format!("{}_handbook.pdf", m.to_lowercase().replace(' ', "_")),
                url: format!("https://storage.example/{m}"),
            })
            .collect()
    }

    #[test]
    fn test_extract_major_prefixes() {
        assert_eq!(
            extract_major("Can I see the handbook for Computer Science?"),
            Some("computer science".into())
        );
        assert_eq!(extract_major("handbook of physics"), Some("physics".into()));
        assert_eq!(extract_major("handbook for"), None);
    }

    #[test]
    fn test_extract_major_regex() {
        assert_eq!(
            extract_major("send me the degree in physics please."),
            Some("physics please".into())
        );
        assert_eq!(
            extract_major("pdf for the major in computer science"),
            Some("computer science".into())
        );
        assert_eq!(extract_major("handbook please"), None);
    }

    #[test]
    fn test_find_handbook_by_major() {
        let hbs = handbooks();
        assert_eq!(
            find_handbook_by_major(&hbs, "physics").map(|h| h.major.as_str()),
            Some("Physics")
        );
        assert_eq!(
            find_handbook_by_major(&hbs, "industrial engineering").map(|h| h.major.as_str()),
            Some("Industrial Engineering And Management")
        );
        assert_eq!(
            find_handbook_by_major(&hbs, "the computer science program").map(|h| h.major.as_str()),
            Some("Computer Science")
        );
        assert!(find_handbook_by_major(&hbs, "medicine").is_none());
    }

    #[test]
    fn test_is_content_question() {
        assert!(is_content_question("What are the credits for CS?"));
        assert!(is_content_question("prerequisites for physics"));
        assert!(!is_content_question("/handbook what"));
        assert!(!is_content_question("physics handbook"));
    }

    #[test]
    fn test_buttons_and_callback() {
        let buttons = handbook_buttons(&handbooks(), 2);
        assert_eq!(buttons.len(), 2);
        assert_eq!(buttons[1].text, "Physics");
        assert_eq!(parse_callback(&buttons[1].callback_data), Some(1));
        assert_eq!(parse_callback("location:3"), None);
    }
}
