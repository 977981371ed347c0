//! Database operations for the `tweets` table of annotated examples.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentimeter_core::{ExampleStore, LabeledExample, StoreError};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `tweets` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExampleRow {
    pub id: i64,
    pub text: String,
    pub positive: bool,
    pub negative: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ExampleRow> for LabeledExample {
    fn from(row: ExampleRow) -> Self {
        LabeledExample::new(row.text, row.positive, row.negative)
    }
}

/// Return every annotated tweet ordered by `id`.
///
/// The stable order keeps a seeded train/test split reproducible for an
/// unchanged table.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn fetch_all_examples(pool: &PgPool) -> Result<Vec<ExampleRow>, DbError> {
    let rows = sqlx::query_as::<_, ExampleRow>(
        "SELECT id, text, positive, negative, created_at \
         FROM tweets \
         ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Return the most recent annotations, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_examples(pool: &PgPool, limit: i64) -> Result<Vec<ExampleRow>, DbError> {
    let rows = sqlx::query_as::<_, ExampleRow>(
        "SELECT id, text, positive, negative, created_at \
         FROM tweets \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Insert one annotation and return its generated id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_example(pool: &PgPool, example: &LabeledExample) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO tweets (text, positive, negative) \
         VALUES ($1, $2, $3) \
         RETURNING id",
    )
    .bind(&example.text)
    .bind(example.positive)
    .bind(example.negative)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Count stored annotations.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_examples(pool: &PgPool) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tweets")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// [`ExampleStore`] backed by the Postgres `tweets` table.
#[derive(Debug, Clone)]
pub struct PgExampleStore {
    pool: PgPool,
}

impl PgExampleStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unavailable(error: &DbError) -> StoreError {
    tracing::warn!(error = %error, "example store query failed");
    StoreError::Unavailable(error.to_string())
}

#[async_trait]
impl ExampleStore for PgExampleStore {
    async fn fetch_all(&self) -> Result<Vec<LabeledExample>, StoreError> {
        let rows = fetch_all_examples(&self.pool)
            .await
            .map_err(|e| unavailable(&e))?;
        Ok(rows.into_iter().map(LabeledExample::from).collect())
    }

    async fn append(&self, example: &LabeledExample) -> Result<(), StoreError> {
        insert_example(&self.pool, example)
            .await
            .map_err(|e| unavailable(&e))?;
        Ok(())
    }
}
