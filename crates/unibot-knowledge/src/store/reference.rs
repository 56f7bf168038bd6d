//! Reference tables: campus map, FAQ answers, locker and servery schedules.

use super::KnowledgeStore;
use serde::{Deserialize, Serialize};
use unibot_core::error::UnibotError;

/// A place on campus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub aliases: Vec<String>,
    pub tags: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
}

/// Split a comma-separated column into trimmed, non-empty parts.
pub(crate) fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) type LocationRow = (
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<f64>,
    Option<f64>,
    Option<String>,
);

impl Location {
    pub(crate) fn from_row(row: LocationRow) -> Self {
        let (id, name, aliases, tags, latitude, longitude, address) = row;
        Self {
            id,
            name,
            aliases: split_list(aliases.as_deref()),
            tags: split_list(tags.as_deref()),
            latitude,
            longitude,
            address: address.filter(|a| !a.trim().is_empty()),
        }
    }
}

/// A canned FAQ answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// One `locker_hours` row joined with its college, day and time range.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LockerRow {
    pub college: Option<String>,
    pub day: Option<String>,
    pub basement: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// One `servery_hours` row joined with its college, day and time range.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServeryRow {
    pub college: Option<String>,
    pub day: Option<String>,
    pub meal_type: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

type ScheduleRow = (
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

impl KnowledgeStore {
    /// All campus locations, by id.
    pub async fn load_campus_map(&self) -> Result<Vec<Location>, UnibotError> {
        let rows: Vec<LocationRow> = sqlx::query_as(
            "SELECT id::bigint, name, aliases, tags, \
                    latitude::float8, longitude::float8, address \
             FROM campus_map ORDER BY id",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| UnibotError::Knowledge(format!("failed to load campus map: {e}")))?;

        Ok(rows.into_iter().map(Location::from_row).collect())
    }

    /// FAQ answers in insertion order.
    pub async fn load_faq_answers(&self) -> Result<Vec<FaqEntry>, UnibotError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT question, answer FROM faq_responses ORDER BY id")
                .fetch_all(self.pool())
                .await
                .map_err(|e| UnibotError::Knowledge(format!("failed to load FAQ: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(question, answer)| FaqEntry { question, answer })
            .collect())
    }

    /// Locker access rows, ordered by day.
    pub async fn load_locker_rows(&self) -> Result<Vec<LockerRow>, UnibotError> {
        let rows: Vec<ScheduleRow> = sqlx::query_as(
            "SELECT c.name, d.name, lh.basement, tr.start_time::text, tr.end_time::text \
             FROM locker_hours lh \
             LEFT JOIN colleges c ON c.id = lh.college_id \
             LEFT JOIN days d ON d.id = lh.day_id \
             LEFT JOIN time_ranges tr ON tr.id = lh.time_range_id \
             ORDER BY d.id NULLS LAST, lh.id",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| UnibotError::Knowledge(format!("failed to load locker hours: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(college, day, basement, start_time, end_time)| LockerRow {
                college,
                day,
                basement,
                start_time,
                end_time,
            })
            .collect())
    }

    /// Servery opening rows, ordered by day.
    pub async fn load_servery_rows(&self) -> Result<Vec<ServeryRow>, UnibotError> {
        let rows: Vec<ScheduleRow> = sqlx::query_as(
            "SELECT c.name, d.name, sh.meal_type, tr.start_time::text, tr.end_time::text \
             FROM servery_hours sh \
             LEFT JOIN colleges c ON c.id = sh.college_id \
             LEFT JOIN days d ON d.id = sh.day_id \
             LEFT JOIN time_ranges tr ON tr.id = sh.time_range_id \
             ORDER BY d.id NULLS LAST, sh.id",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| UnibotError::Knowledge(format!("failed to load servery hours: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(college, day, meal_type, start_time, end_time)| ServeryRow {
                college,
                day,
                meal_type,
                start_time,
                end_time,
            })
            .collect())
    }
}
