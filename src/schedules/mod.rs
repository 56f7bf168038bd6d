//! Opening hours for locker basements and serveries.
//!
//! Both schedules are nested tables keyed college → day → slot, where the
//! slot is a basement letter or a meal type. Tables keep insertion order so
//! days come out in the order the database lists them.

mod locker;
mod servery;

pub use locker::{extract_basement, LockerHours, LOCKER_COLLEGES};
pub use servery::{extract_meal, ServeryHours, SERVERY_COLLEGES};

/// Shown when a row has no time range.
pub const HOURS_NOT_SPECIFIED: &str = "Hours not specified";

/// An insertion-ordered string-keyed table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for Table<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> Table<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Default> Table<V> {
    /// The value under `key`, inserted at the end if missing.
    pub fn entry(&mut self, key: &str) -> &mut V {
        let idx = match self.entries.iter().position(|(k, _)| k == key) {
            Some(idx) => idx,
            None => {
                self.entries.push((key.to_string(), V::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }
}

/// college → day → slot → "start - end".
pub type Schedule = Table<Table<Table<String>>>;

/// Insert one row. A later row for the same slot overwrites the earlier one.
pub(crate) fn insert_slot(
    schedule: &mut Schedule,
    college: &str,
    day: &str,
    slot: &str,
    time: String,
) {
    *schedule.entry(college).entry(day).entry(slot) = time;
}

/// "start - end", or [`HOURS_NOT_SPECIFIED`] when either bound is missing.
pub(crate) fn time_range(start: Option<&str>, end: Option<&str>) -> String {
    match (start, end) {
        (Some(s), Some(e)) => format!("{s} - {e}"),
        _ => HOURS_NOT_SPECIFIED.to_string(),
    }
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// The college whose alias appears verbatim in the text.
pub fn mentioned_college(text: &str, aliases: &[(&str, &'static str)]) -> Option<&'static str> {
    let text = text.to_lowercase();
    aliases
        .iter()
        .find(|(alias, _)| text.contains(alias))
        .map(|(_, real)| *real)
}

/// Like [`mentioned_college`], then falls back to any word (3+ chars) of the
/// text that is part of an alias, so "merc" still finds Mercator.
pub fn find_college(text: &str, aliases: &[(&str, &'static str)]) -> Option<&'static str> {
    if let Some(real) = mentioned_college(text, aliases) {
        return Some(real);
    }
    let text = text.to_lowercase();
    let words: Vec<&str> = text
        .split_whitespace()
        .filter(|w| w.chars().count() >= 3)
        .collect();
    aliases
        .iter()
        .find(|(alias, _)| words.iter().any(|w| alias.contains(w)))
        .map(|(_, real)| *real)
}

/// Day keyword in the text: a weekday name, `weekend`, `holiday` or `weekday`.
pub fn extract_day(text: &str) -> Option<&'static str> {
    let text = text.to_lowercase();
    for day in ["monday", "tuesday", "wednesday", "thursday", "friday"] {
        if text.contains(day) {
            return Some(day);
        }
    }
    if ["weekend", "saturday", "sunday"]
        .iter()
        .any(|d| text.contains(d))
    {
        return Some("weekend");
    }
    if text.contains("holiday") {
        return Some("holiday");
    }
    if text.contains("weekday") {
        return Some("weekday");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_keeps_insertion_order() {
        let mut table: Table<Vec<u8>> = Table::default();
        table.entry("thursday").push(1);
        table.entry("monday").push(2);
        table.entry("thursday").push(3);
        let keys: Vec<&str> = table.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["thursday", "monday"]);
        assert_eq!(table.get("thursday"), Some(&vec![1, 3]));
        assert!(table.get("friday").is_none());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("monday"), "Monday");
        assert_eq!(title_case("loaded fries"), "Loaded Fries");
        assert_eq!(title_case("college iii"), "College Iii");
        assert_eq!(title_case("c3"), "C3");
    }

    #[test]
    fn test_time_range() {
        assert_eq!(time_range(Some("12:00"), Some("14:00")), "12:00 - 14:00");
        assert_eq!(time_range(None, Some("14:00")), HOURS_NOT_SPECIFIED);
    }

    #[test]
    fn test_extract_day() {
        assert_eq!(extract_day("Krupp on Monday?"), Some("monday"));
        assert_eq!(extract_day("is it open on sunday"), Some("weekend"));
        assert_eq!(extract_day("during the holiday"), Some("holiday"));
        assert_eq!(extract_day("on a weekday"), Some("weekday"));
        assert_eq!(extract_day("today"), None);
    }

    #[test]
    fn test_find_college_partial_words() {
        assert_eq!(find_college("lunch at merc", SERVERY_COLLEGES), Some("Mercator College"));
        assert_eq!(find_college("c3 dinner", SERVERY_COLLEGES), Some("College III"));
        // Short words never match partially.
        assert_eq!(find_college("is it a", SERVERY_COLLEGES), None);
        assert_eq!(mentioned_college("lunch at merc", SERVERY_COLLEGES), None);
    }
}
