//! Topic screening for incoming questions.
//!
//! A cheap keyword pass that keeps obviously off-topic questions away from the
//! LLM. It errs on the side of allowing: anything mentioning campus vocabulary,
//! directions, or opening times passes.

use regex::Regex;
use std::sync::LazyLock;

/// Off-topic categories, each a word-bounded alternation.
static OFF_TOPIC: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // politics
        r"\b(politic|election|vote|president|party|democrat|republican|congress|parliament)\b",
        // entertainment
        r"\b(movie|film|tv show|television|netflix|actor|actress|celebrity|hollywood)\b",
        // professional sports
        r"\b(nba|nfl|mlb|premier league|champions league|world cup|olympics|team)\b",
        // consumer tech
        r"\b(iphone|android|samsung|google|facebook|twitter|instagram|tiktok|snapchat)\b",
        // finance
        r"\b(stock market|bitcoin|ethereum|cryptocurrency|crypto|investment|forex|trading)\b",
        // violence
        r"\b(gun|weapon|murder|bomb|terrorist|kill|attack)\b",
        // adult
        r"\b(sex|porn|naked|nude|explicit|adult)\b",
        // drugs
        r"\b(weed|marijuana|cocaine|heroin|drug dealer|getting high|getting drunk)\b",
        // gaming
        r"\b(playstation|xbox|nintendo|gaming|game)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap_or_else(|err| panic!("invalid off-topic regex {p}: {err}")))
    .collect()
});

const UNIVERSITY_KEYWORDS: &[&str] = &[
    "university", "campus", "college", "class", "course", "professor", "lecture", "semester",
    "student", "study", "library", "exam", "assignment", "homework", "schedule", "degree",
    "dormitory", "dormitories", "hall", "locker", "servery", "dining", "food", "cafeteria",
    "constructor", "krupp", "mercator", "nordmetall", "c3", "bremen", "advisor", "academia",
    "handbook", "syllabus", "printer", "printing", "coffee bar", "basement", "building",
    "registration", "enrollment", "credit", "major", "minor", "faculty", "sport", "club",
    "event", "scholarship", "residence", "permit", "visa", "document", "certificate",
    "tuition", "fee", "payment", "lab", "laboratory", "workshop", "seminar", "academic",
    "program", "orientation", "semester ticket", "services", "office", "grade", "housing",
    "accommodation", "where is", "how to", "when is", "where can", "who is", "what is", "can i",
    "ify", "irc", "reimer", "lükens", "ocean lab", "research", "center", "canteen", "mensa",
    "jacobs",
];

const DIRECTION_PHRASES: &[&str] = &["where is", "how do i get to", "how to find", "direction to"];

const TIME_PHRASES: &[&str] = &["when is", "what time", "hours", "schedule"];

/// Outcome of screening a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterVerdict {
    pub allowed: bool,
    /// Why the question was rejected. `None` when allowed.
    pub reason: Option<String>,
}

impl FilterVerdict {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn reject(reason: String) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// Decide whether a question is about the university.
///
/// Off-topic terms reject even when campus words are also present.
pub fn is_university_related(query: &str) -> FilterVerdict {
    let text = query.to_lowercase();

    for pattern in OFF_TOPIC.iter() {
        if let Some(m) = pattern.find(&text) {
            return FilterVerdict::reject(format!(
                "Query contains non-university topic: '{}'",
                m.as_str()
            ));
        }
    }

    let contains_any = |list: &[&str]| list.iter().any(|kw| text.contains(kw));

    if contains_any(UNIVERSITY_KEYWORDS)
        || contains_any(DIRECTION_PHRASES)
        || contains_any(TIME_PHRASES)
    {
        return FilterVerdict::allow();
    }

    FilterVerdict::reject("Query doesn't appear to be related to university topics".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campus_question_allowed() {
        assert!(is_university_related("Where is the Krupp servery?").allowed);
        assert!(is_university_related("locker hours in college 3").allowed);
    }

    #[test]
    fn test_off_topic_rejected_with_term() {
        let verdict = is_university_related("Who won the NBA finals?");
        assert!(!verdict.allowed);
        assert_eq!(
            verdict.reason.as_deref(),
            Some("Query contains non-university topic: 'nba'")
        );
    }

    #[test]
    fn test_off_topic_wins_over_campus_words() {
        assert!(!is_university_related("best netflix series to watch on campus").allowed);
    }

    #[test]
    fn test_word_boundaries_respected() {
        // "gun" inside "begun" is not a match.
        assert!(is_university_related("when is the semester begun").allowed);
    }

    #[test]
    fn test_time_phrase_allowed() {
        assert!(is_university_related("what time does it open").allowed);
    }

    #[test]
    fn test_unrelated_rejected() {
        let verdict = is_university_related("tell me a joke about cats");
        assert!(!verdict.allowed);
        assert!(verdict.reason.unwrap().contains("doesn't appear"));
    }
}
