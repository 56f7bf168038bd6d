//! Postgres-backed knowledge store.
//!
//! Split into focused submodules:
//! - `vectors`: the pgvector `documents` table behind the `VectorStore` trait
//! - `reference`: campus map, FAQ answers, locker and servery schedules

mod reference;
mod vectors;

pub use reference::{FaqEntry, Location, LockerRow, ServeryRow};
pub use vectors::vector_literal;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use unibot_core::{config::DatabaseConfig, error::UnibotError};

const PGVECTOR_MIGRATION: &str = include_str!("../../migrations/001_pgvector.sql");

/// Knowledge store backed by Postgres with the pgvector extension.
#[derive(Clone)]
pub struct KnowledgeStore {
    pool: PgPool,
    dimensions: usize,
}

impl KnowledgeStore {
    /// Connect and run migrations. `dimensions` sizes the `embedding` column.
    pub async fn connect(config: &DatabaseConfig, dimensions: usize) -> Result<Self, UnibotError> {
        if config.url.is_empty() {
            return Err(UnibotError::Config(
                "database url is not set (DATABASE_URL or [database] url)".into(),
            ));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| UnibotError::Knowledge(format!("failed to connect to postgres: {e}")))?;

        Self::run_migrations(&pool, dimensions).await?;

        info!("Knowledge store connected ({dimensions}-dim embeddings)");

        Ok(Self { pool, dimensions })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Drop and recreate the `documents` table, discarding all embeddings.
    pub async fn reset_documents(&self) -> Result<(), UnibotError> {
        sqlx::raw_sql("DROP TABLE IF EXISTS documents")
            .execute(&self.pool)
            .await
            .map_err(|e| UnibotError::Knowledge(format!("failed to drop documents: {e}")))?;

        sqlx::raw_sql(&pgvector_sql(self.dimensions))
            .execute(&self.pool)
            .await
            .map_err(|e| UnibotError::Knowledge(format!("failed to recreate documents: {e}")))?;

        info!("Vector store reset");
        Ok(())
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &PgPool, dimensions: usize) -> Result<(), UnibotError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| UnibotError::Knowledge(format!("failed to create migrations table: {e}")))?;

        let migrations: Vec<(&str, String)> = vec![
            ("001_pgvector", pgvector_sql(dimensions)),
            (
                "002_reference",
                include_str!("../../migrations/002_reference.sql").to_string(),
            ),
            (
                "003_interactions",
                include_str!("../../migrations/003_interactions.sql").to_string(),
            ),
        ];

        for (name, sql) in &migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = $1")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        UnibotError::Knowledge(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| UnibotError::Knowledge(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES ($1)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    UnibotError::Knowledge(format!("failed to record migration {name}: {e}"))
                })?;

            info!("Applied migration {name}");
        }
        Ok(())
    }
}

/// The pgvector migration with the embedding width filled in.
fn pgvector_sql(dimensions: usize) -> String {
    PGVECTOR_MIGRATION.replace("{dimensions}", &dimensions.to_string())
}

#[cfg(test)]
mod tests;
