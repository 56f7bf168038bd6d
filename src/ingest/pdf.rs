//! Handbook PDFs: text extraction and the documents built from it.

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;
use unibot_core::{document::Document, error::UnibotError};
use unibot_knowledge::Handbook;

static MANY_NEWLINES: LazyLock<Regex> = LazyLock::new(|| compile(r"\n{3,}"));
static MANY_SPACES: LazyLock<Regex> = LazyLock::new(|| compile(r" {2,}"));

static SECTION_HEADERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:Curriculum|Study|Examination) (?:Plan|Structure)",
        r"(?i)(?:Required|Mandatory|Core) (?:Courses|Modules)",
        r"(?i)(?:Year|Semester) \d+[^\n]+(?:Courses|Modules)",
        r"(?i)CHOICE Modules?",
        r"(?i)CORE Modules?",
        r"(?i)CAREER Modules?",
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

/// Study years and the headings that introduce them.
const YEAR_HEADINGS: &[(&str, &[&str])] = &[
    ("First Year", &["First Year", "Year 1", "CHOICE"]),
    ("Second Year", &["Second Year", "Year 2", "CORE"]),
    ("Third Year", &["Third Year", "Year 3", "CAREER"]),
    ("CHOICE Year", &[r"CHOICE Modules?", "CHOICE Year"]),
    ("CORE Year", &[r"CORE Modules?", "CORE Year"]),
    ("CAREER Year", &[r"CAREER Modules?", "CAREER Year"]),
];

static YEAR_PATTERNS: LazyLock<Vec<(&'static str, Vec<Regex>)>> = LazyLock::new(|| {
    YEAR_HEADINGS
        .iter()
        .map(|(year, patterns)| {
            let compiled = patterns.iter().map(|p| compile(&format!("(?i){p}"))).collect();
            (*year, compiled)
        })
        .collect()
});

static MANDATORY: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"[Mm]andatory", r"[Rr]equired", r"[Cc]ore", r"\(m,", r"\bm\s"]
        .iter()
        .map(|p| compile(p))
        .collect()
});

/// A course code (`CO-520`) or a capitalized title, optionally with credits.
static COURSE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?:[A-Z]{2,4}[-\s]?\d{3,4}[-\s]?[A-Z]?|[A-Z][a-z]+(?:\s[A-Z][a-z]+){1,5})(?:.*?(\d+(?:\.\d+)?\s*(?:CP|ECTS|Credit)s?))?",
    )
});

/// Characters after a year heading searched for its courses.
const YEAR_WINDOW: usize = 2000;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid handbook regex {pattern}: {err}"))
}

/// Text of every page, pages separated by blank lines, then cleaned.
pub fn extract_text(bytes: &[u8]) -> Result<String, UnibotError> {
    let document = lopdf::Document::load_mem(bytes)
        .map_err(|e| UnibotError::Knowledge(format!("cannot parse PDF: {e}")))?;

    let mut text = String::new();
    for page in document.get_pages().keys() {
        match document.extract_text(&[*page]) {
            Ok(page_text) if !page_text.is_empty() => {
                text.push_str(&page_text);
                text.push_str("\n\n");
            }
            Ok(_) => {}
            Err(e) => warn!("error extracting text from page {page}: {e}"),
        }
    }
    Ok(clean_text(&text))
}

/// Collapse runs of blank lines and spaces, drop NUL bytes.
pub fn clean_text(text: &str) -> String {
    let text = MANY_NEWLINES.replace_all(text, "\n\n");
    let text = MANY_SPACES.replace_all(&text, " ");
    text.replace('\0', "")
}

/// Curriculum sections keyed by their header line, in order of first appearance.
///
/// A header line starts a section that runs until the next header. A repeated
/// header replaces the earlier section's text.
pub fn curriculum_sections(text: &str) -> Vec<(String, String)> {
    let mut sections: Vec<(String, String)> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in text.split('\n') {
        if SECTION_HEADERS.iter().any(|p| p.is_match(line)) {
            close_section(current.take(), &mut sections);
            current = Some((line.trim().to_string(), vec![line]));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }
    close_section(current, &mut sections);
    sections
}

fn close_section(current: Option<(String, Vec<&str>)>, sections: &mut Vec<(String, String)>) {
    if let Some((name, lines)) = current {
        let body = lines.join("\n");
        match sections.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = body,
            None => sections.push((name, body)),
        }
    }
}

/// Mandatory courses listed after each study-year heading. Years without
/// any are left out.
pub fn course_requirements(text: &str) -> Vec<(&'static str, Vec<String>)> {
    let mut requirements = Vec::new();
    for (year, patterns) in YEAR_PATTERNS.iter() {
        let mut courses: Vec<String> = Vec::new();
        for pattern in patterns {
            for heading in pattern.find_iter(text) {
                let after = &text[heading.end()..];
                let window = match after.char_indices().nth(YEAR_WINDOW) {
                    Some((end, _)) => &after[..end],
                    None => after,
                };
                for line in window.split('\n') {
                    if !MANDATORY.iter().any(|m| m.is_match(line)) {
                        continue;
                    }
                    if let Some(course) = COURSE.find(line) {
                        let course = course.as_str().trim().to_string();
                        if !course.is_empty() && !courses.contains(&course) {
                            courses.push(course);
                        }
                    }
                }
            }
        }
        if !courses.is_empty() {
            requirements.push((*year, courses));
        }
    }
    requirements
}

/// Paragraph chunks of at most `chunk_size` characters.
///
/// Paragraphs are packed together while they fit. A paragraph longer than
/// `chunk_size` is cut into windows that overlap by `overlap` characters.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for para in text.split("\n\n") {
        let para_len = para.chars().count();
        if current.chars().count() + para_len > chunk_size {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            if para_len > chunk_size {
                let chars: Vec<char> = para.chars().collect();
                let mut start = 0;
                while start < chars.len() {
                    let end = (start + chunk_size).min(chars.len());
                    chunks.push(chars[start..end].iter().collect());
                    start += step;
                }
            } else {
                current = para.to_string();
            }
        } else if current.is_empty() {
            current = para.to_string();
        } else {
            current.push_str("\n\n");
            current.push_str(para);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Chunking parameters for handbook text.
#[derive(Debug, Clone, Copy)]
pub struct HandbookChunking {
    pub chunk_size: usize,
    pub overlap: usize,
    pub min_chars: usize,
}

/// Every document one handbook yields: curriculum sections, per-year course
/// lists and general paragraph chunks.
pub fn handbook_documents(handbook: &Handbook, text: &str, chunking: HandbookChunking) -> Vec<Document> {
    let mut documents = Vec::new();

    for (section, body) in curriculum_sections(text) {
        documents.push(
            Document::new(body)
                .with_meta("type", "handbook_curriculum")
                .with_meta("major", handbook.major.as_str())
                .with_meta("file_name", handbook.file_name.as_str())
                .with_meta("section", section)
                .with_meta("tool", "handbook"),
        );
    }

    for (year, courses) in course_requirements(text) {
        let list = courses
            .iter()
            .map(|c| format!("- {c}"))
            .collect::<Vec<_>>()
            .join("\n");
        documents.push(
            Document::new(format!(
                "Required courses for {year} in {}:\n\n{list}",
                handbook.major
            ))
            .with_meta("type", "handbook_courses")
            .with_meta("major", handbook.major.as_str())
            .with_meta("year", year)
            .with_meta("mandatory", true)
            .with_meta("tool", "handbook"),
        );
    }

    for (chunk_id, chunk) in chunk_text(text, chunking.chunk_size, chunking.overlap)
        .into_iter()
        .enumerate()
    {
        if chunk.chars().count() < chunking.min_chars {
            continue;
        }
        documents.push(
            Document::new(chunk)
                .with_meta("type", "handbook_general")
                .with_meta("major", handbook.major.as_str())
                .with_meta("file_name", handbook.file_name.as_str())
                .with_meta("chunk_id", chunk_id)
                .with_meta("tool", "handbook"),
        );
    }

    documents
}

#[cfg(test)]
mod tests {
    use super::*;

    const HANDBOOK: &str = "Physics Handbook\n\
        Study Plan\n\
        The program runs three years.\n\
        Year 1 Foundation Courses\n\
        CH-140 Classical Physics 7.5 CP mandatory\n\
        Optional Astronomy 5 CP\n\
        Mandatory Modules\n\
        Quantum Mechanics 5 CP required\n";

    fn physics() -> Handbook {
        Handbook {
            major: "Physics".into(),
            file_name: "physics_handbook.pdf".into(),
            url: "https://storage.test/physics_handbook.pdf".into(),
        }
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("a\n\n\n\nb   c\0d"), "a\n\nb cd");
        assert_eq!(clean_text("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_extract_text_rejects_garbage() {
        assert!(extract_text(b"not a pdf").is_err());
    }

    #[test]
    fn test_curriculum_sections() {
        let sections = curriculum_sections(HANDBOOK);
        let names: Vec<&str> = sections.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Study Plan", "Year 1 Foundation Courses", "Mandatory Modules"]);
        assert_eq!(sections[0].1, "Study Plan\nThe program runs three years.");
        assert!(sections[2].1.ends_with("Quantum Mechanics 5 CP required\n"));
    }

    #[test]
    fn test_text_before_first_header_is_ignored() {
        assert!(curriculum_sections("intro\nnothing here").is_empty());
    }

    #[test]
    fn test_course_requirements() {
        let requirements = course_requirements(HANDBOOK);
        let (year, courses) = &requirements[0];
        assert_eq!(*year, "First Year");
        assert_eq!(courses[0], "CH-140 Classical Physics 7.5 CP");
        assert!(courses.contains(&"Quantum Mechanics 5 CP".to_string()));
        assert!(!courses.iter().any(|c| c.contains("Astronomy")));
        assert!(requirements.iter().all(|(_, c)| !c.is_empty()));
    }

    #[test]
    fn test_chunk_text_packs_paragraphs() {
        let text = "aaaa\n\nbbbb\n\ncccc";
        assert_eq!(chunk_text(text, 10, 2), vec!["aaaa\n\nbbbb", "cccc"]);
    }

    #[test]
    fn test_chunk_text_splits_long_paragraphs_with_overlap() {
        let chunks = chunk_text("short\n\n0123456789abcdef", 10, 4);
        assert_eq!(chunks, vec!["short", "0123456789", "6789abcdef", "cdef"]);
    }

    #[test]
    fn test_handbook_documents() {
        let chunking = HandbookChunking {
            chunk_size: 500,
            overlap: 50,
            min_chars: 50,
        };
        let documents = handbook_documents(&physics(), HANDBOOK, chunking);

        let kinds: Vec<&str> = documents.iter().filter_map(|d| d.meta_str("type")).collect();
        assert_eq!(kinds.iter().filter(|k| **k == "handbook_curriculum").count(), 3);
        assert!(kinds.contains(&"handbook_courses"));
        assert_eq!(kinds.last(), Some(&"handbook_general"));
        assert!(documents.iter().all(|d| d.meta_str("tool") == Some("handbook")));
        assert!(documents.iter().all(|d| d.meta_str("major") == Some("Physics")));

        let courses = documents
            .iter()
            .find(|d| d.meta_str("year") == Some("First Year"))
            .map(|d| d.content.as_str());
        assert!(courses
            .is_some_and(|c| c.starts_with("Required courses for First Year in Physics:\n\n- CH-140")));
    }
}
