//! Interaction log: records every message unibot answers.

use sqlx::PgPool;
use tracing::{debug, warn};
use unibot_core::error::UnibotError;
use uuid::Uuid;

/// An entry to write to the interaction log.
pub struct Interaction {
    pub channel: String,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub input_text: String,
    /// Handler that produced the answer (`location`, `qa`, a command, ...).
    pub tool: Option<String>,
    pub output_text: Option<String>,
    pub provider_used: Option<String>,
    pub processing_ms: Option<i64>,
    pub status: InteractionStatus,
}

/// Outcome of a handled message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionStatus {
    Ok,
    Error,
    Denied,
    Filtered,
}

impl InteractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Denied => "denied",
            Self::Filtered => "filtered",
        }
    }
}

/// Interaction logger backed by Postgres.
pub struct InteractionLog {
    pool: PgPool,
}

impl InteractionLog {
    /// Create a logger sharing the knowledge store's pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Write an entry to the log.
    pub async fn log(&self, entry: &Interaction) -> Result<(), UnibotError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO interactions \
             (id, channel, sender_id, sender_name, input_text, tool, output_text, \
              provider_used, processing_ms, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&id)
        .bind(&entry.channel)
        .bind(&entry.sender_id)
        .bind(&entry.sender_name)
        .bind(&entry.input_text)
        .bind(&entry.tool)
        .bind(&entry.output_text)
        .bind(&entry.provider_used)
        .bind(entry.processing_ms)
        .bind(entry.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| UnibotError::Knowledge(format!("interaction log write failed: {e}")))?;

        debug!(
            "interaction: {} {} [{}] {}",
            entry.channel,
            entry.sender_id,
            entry.status.as_str(),
            truncate(&entry.input_text, 80)
        );

        Ok(())
    }

    /// Best-effort write: failures are logged, never returned.
    pub async fn record(&self, entry: &Interaction) {
        if let Err(e) = self.log(entry).await {
            warn!("{e}");
        }
    }
}

/// Truncate to at most `max` bytes without splitting a character.
pub(crate) fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("where is the library", 8), "where is");
        assert_eq!(truncate("short", 80), "short");
    }

    #[test]
    fn test_truncate_multibyte() {
        // "ä" is two bytes; cutting in the middle must back off.
        assert_eq!(truncate("Mensaä", 6), "Mensa");
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(InteractionStatus::Ok.as_str(), "ok");
        assert_eq!(InteractionStatus::Filtered.as_str(), "filtered");
    }
}
