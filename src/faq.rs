//! Canned FAQ answers with fuzzy question matching.

use crate::fuzzy::close_match;
use unibot_knowledge::FaqEntry;

/// Topics that get an answer even when the wording is far from the stored
/// question. The key is the stored question, the list the words that trigger it.
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "immatrikulationsbescheinigung",
        &["immatrikulation", "enrollment", "certificate", "student", "confirmation"],
    ),
    (
        "laundry",
        &["laundry", "washing", "dryer", "laundromat", "wash", "clothes"],
    ),
    (
        "residence permit",
        &[
            "residence",
            "permit",
            "visa",
            "immigration",
            "foreigner",
            "ausländerbehörde",
            "auslanderbehorde",
        ],
    ),
    (
        "address change",
        &["address", "change", "move", "moving", "residence", "registration", "anmeldung"],
    ),
    (
        "emergency contacts",
        &["emergency", "help", "urgent", "crisis", "accident", "police", "ambulance"],
    ),
    (
        "driving license",
        &[
            "driving",
            "driver",
            "license",
            "licence",
            "car",
            "conversion",
            "führerschein",
            "fuhrerschein",
        ],
    ),
    (
        "semester ticket",
        &["semester", "ticket", "transportation", "train", "bus", "travel"],
    ),
    ("postal code", &["postal", "code", "zip", "plz", "mail", "post"]),
];

const QUERY_CUTOFF: f64 = 0.6;
const WORD_CUTOFF: f64 = 0.7;

/// FAQ questions (lower-cased) and their answers, in database order.
#[derive(Debug, Clone, Default)]
pub struct FaqIndex {
    entries: Vec<(String, String)>,
}

impl FaqIndex {
    pub fn new(entries: Vec<FaqEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (e.question.trim().to_lowercase(), e.answer))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn answer(&self, question: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(q, _)| q == question)
            .map(|(_, a)| a.as_str())
    }

    fn questions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(q, _)| q.as_str())
    }

    /// Best canned answer for a query, or `None` to fall back to retrieval.
    ///
    /// Tries the exact question, then the whole query fuzzily, then each
    /// longer word on its own, then the topic keyword table.
    pub fn lookup(&self, query: &str) -> Option<&str> {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        if let Some(answer) = self.answer(&normalized) {
            return Some(answer);
        }

        if let Some(q) = close_match(&normalized, self.questions(), QUERY_CUTOFF) {
            return self.answer(q);
        }

        for word in normalized.split_whitespace() {
            if word.chars().count() <= 3 {
                continue;
            }
            if let Some(q) = close_match(word, self.questions(), WORD_CUTOFF) {
                return self.answer(q);
            }
        }

        CATEGORIES
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| normalized.contains(k)))
            .find_map(|(category, _)| self.answer(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> FaqIndex {
        FaqIndex::new(vec![
            FaqEntry {
                question: "Laundry".into(),
                answer: "Laundry rooms are in every college basement.".into(),
            },
            FaqEntry {
                question: "Semester ticket".into(),
                answer: "The semester ticket covers VBN buses and trains.".into(),
            },
            FaqEntry {
                question: "Residence permit".into(),
                answer: "Book an appointment at the Migrationsamt.".into(),
            },
        ])
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        assert_eq!(
            index().lookup("LAUNDRY"),
            Some("Laundry rooms are in every college basement.")
        );
    }

    #[test]
    fn test_fuzzy_whole_query() {
        assert_eq!(
            index().lookup("semester tickets"),
            Some("The semester ticket covers VBN buses and trains.")
        );
    }

    #[test]
    fn test_word_match() {
        assert_eq!(
            index().lookup("where is the laundri"),
            Some("Laundry rooms are in every college basement.")
        );
    }

    #[test]
    fn test_category_keywords() {
        assert_eq!(
            index().lookup("do I need a visa"),
            Some("Book an appointment at the Migrationsamt.")
        );
    }

    #[test]
    fn test_category_without_stored_question_is_skipped() {
        // "postal code" is not in the index.
        assert_eq!(index().lookup("what is the zip"), None);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(index().lookup("who teaches linear algebra"), None);
        assert_eq!(index().lookup("   "), None);
        assert_eq!(index().len(), 3);
    }
}
