use super::{insert_slot, time_range, title_case, Schedule, Table};
use regex::Regex;
use std::sync::LazyLock;
use unibot_knowledge::LockerRow;

/// Locker college aliases, checked in order.
pub const LOCKER_COLLEGES: &[(&str, &str)] = &[
    ("krupp", "Krupp College"),
    ("krupp college", "Krupp College"),
    ("college iii", "College III"),
    ("college 3", "College III"),
    ("c3", "College III"),
    ("nordmetall", "Nordmetall College"),
    ("nordmetall college", "Nordmetall College"),
    ("nord", "Nordmetall College"),
    ("mercator", "Mercator College"),
    ("mercator college", "Mercator College"),
];

static BASEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:basement\s*)?([abcdf])\b")
        .unwrap_or_else(|err| panic!("invalid basement regex: {err}"))
});

/// Basement letter (A, B, C, D or F) mentioned in the text.
pub fn extract_basement(text: &str) -> Option<String> {
    BASEMENT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_uppercase())
}

/// Locker access hours: college → day → basement → time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockerHours {
    schedule: Schedule,
}

impl LockerHours {
    pub fn from_rows(rows: &[LockerRow]) -> Self {
        let mut schedule = Schedule::default();
        for row in rows {
            let college = row.college.as_deref().unwrap_or("Unknown");
            let day = row
                .day
                .as_deref()
                .map(str::to_lowercase)
                .unwrap_or_else(|| "Unknown".into());
            let basement = row
                .basement
                .as_deref()
                .map(str::to_uppercase)
                .unwrap_or_else(|| "Unknown".into());
            let time = time_range(row.start_time.as_deref(), row.end_time.as_deref());
            insert_slot(&mut schedule, college, &day, &basement, time);
        }
        Self { schedule }
    }

    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }

    /// Markdown reply for a college, optionally narrowed to a day and basement.
    pub fn render(&self, college: &str, day: Option<&str>, basement: Option<&str>) -> String {
        let mut message = format!("🔓 Locker Hours for *{college}*:\n");
        let empty = Table::default();
        let days = self.schedule.get(college).unwrap_or(&empty);

        match day {
            Some(day) => match days.get(day) {
                Some(basements) => {
                    message.push_str(&format!("\n📅 {}:\n", title_case(day)));
                    match basement {
                        Some(b) => match basements.get(b) {
                            Some(time) => message.push_str(&format!("- Basement {b}: {time}\n")),
                            None => message.push_str(&format!("- No info for Basement {b}.\n")),
                        },
                        None => {
                            for (b, time) in basements.iter() {
                                message.push_str(&format!("- Basement {b}: {time}\n"));
                            }
                        }
                    }
                }
                None => message.push_str("- No info for that day.\n"),
            },
            None if days.is_empty() => message.push_str("- No locker hours on record.\n"),
            None => {
                for (d, basements) in days.iter() {
                    message.push_str(&format!("\n📅 {}:\n", title_case(d)));
                    match basement {
                        Some(b) => {
                            if let Some(time) = basements.get(b) {
                                message.push_str(&format!("- Basement {b}: {time}\n"));
                            }
                        }
                        None => {
                            for (b, time) in basements.iter() {
                                message.push_str(&format!("- Basement {b}: {time}\n"));
                            }
                        }
                    }
                }
            }
        }

        message
    }
}
