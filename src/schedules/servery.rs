use super::{insert_slot, time_range, title_case, Schedule, Table};
use unibot_knowledge::ServeryRow;

/// Servery aliases, checked in order. Same colleges as the lockers plus the Coffee Bar.
pub const SERVERY_COLLEGES: &[(&str, &str)] = &[
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
    ("coffee bar", "Coffee Bar"),
    ("café", "Coffee Bar"),
    ("cafe", "Coffee Bar"),
    ("bar", "Coffee Bar"),
];

/// Meal words mapped onto the meal types used in the schedule.
const MEAL_ALIASES: &[(&str, &str)] = &[
    ("breakfast", "breakfast"),
    ("morning", "breakfast"),
    ("lunch", "lunch"),
    ("noon", "lunch"),
    ("midday", "lunch"),
    ("dinner", "dinner"),
    ("evening", "dinner"),
    ("supper", "dinner"),
    ("pizza", "pizza/pasta"),
    ("pasta", "pizza/pasta"),
    ("burger", "burgers/loaded fries"),
    ("fries", "burgers/loaded fries"),
];

/// Meal type mentioned in the text.
pub fn extract_meal(text: &str) -> Option<&'static str> {
    let text = text.to_lowercase();
    MEAL_ALIASES
        .iter()
        .find(|(alias, _)| text.contains(alias))
        .map(|(_, meal)| *meal)
}

/// "pizza/pasta" renders as "Pizza 🍽 Pasta", plain meals are title-cased.
fn format_meal(meal: &str) -> String {
    meal.split('/')
        .map(|part| title_case(part.trim()))
        .collect::<Vec<_>>()
        .join(" 🍽 ")
}

/// Servery opening hours: college → day → meal type → time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServeryHours {
    schedule: Schedule,
}

impl ServeryHours {
    pub fn from_rows(rows: &[ServeryRow]) -> Self {
        let mut schedule = Schedule::default();
        for row in rows {
            let college = row.college.as_deref().unwrap_or("Unknown");
            let day = row
                .day
                .as_deref()
                .map(str::to_lowercase)
                .unwrap_or_else(|| "Unknown".into());
            let meal = row
                .meal_type
                .as_deref()
                .map(str::to_lowercase)
                .unwrap_or_else(|| "Unknown".into());
            let time = time_range(row.start_time.as_deref(), row.end_time.as_deref());
            insert_slot(&mut schedule, college, &day, &meal, time);
        }
        Self { schedule }
    }

    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }

    /// Markdown reply for a servery, optionally narrowed to a day and meal.
    pub fn render(&self, college: &str, day: Option<&str>, meal: Option<&str>) -> String {
        let mut message = format!("🍽 Servery Hours for *{college}*:\n");
        let empty = Table::default();
        let days = self.schedule.get(college).unwrap_or(&empty);

        match day {
            Some(day) => match days.get(day) {
                Some(meals) => {
                    message.push_str(&format!("\n📅 {}:\n", title_case(day)));
                    match meal {
                        Some(meal) => match meals.get(meal) {
                            Some(time) => {
                                message.push_str(&format!("- {}: {time}\n", format_meal(meal)))
                            }
                            None => message.push_str(&format!(
                                "- No info for {} on {day}.\n",
                                format_meal(meal)
                            )),
                        },
                        None => {
                            for (m, time) in meals.iter() {
                                message.push_str(&format!("- {}: {time}\n", format_meal(m)));
                            }
                        }
                    }
                }
                None => message.push_str("- No info for that day.\n"),
            },
            None if days.is_empty() => message.push_str("- No servery hours on record.\n"),
            None => {
                for (d, meals) in days.iter() {
                    message.push_str(&format!("\n📅 {}:\n", title_case(d)));
                    match meal {
                        Some(meal) => match meals.get(meal) {
                            Some(time) => {
                                message.push_str(&format!("- {}: {time}\n", format_meal(meal)))
                            }
                            None => message.push_str(&format!(
                                "- No {} hours available for {d}.\n",
                                format_meal(meal)
                            )),
                        },
                        None => {
                            for (m, time) in meals.iter() {
                                message.push_str(&format!("- {}: {time}\n", format_meal(m)));
                            }
                        }
                    }
                }
            }
        }

        message
    }
}
