use sentimeter_core::sample_examples;
use sqlx::PgPool;

use crate::DbError;

/// Load the bundled sample annotations into an empty `tweets` table.
///
/// Returns the number of rows inserted; `0` when the table already holds
/// data. All inserts run inside a single transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_sample_examples(pool: &PgPool) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tweets")
        .fetch_one(&mut *tx)
        .await?;
    if existing > 0 {
        tracing::info!(existing, "tweets table already populated; skipping sample data");
        return Ok(0);
    }

    let rows = sample_examples();
    for row in &rows {
        sqlx::query("INSERT INTO tweets (text, positive, negative) VALUES ($1, $2, $3)")
            .bind(&row.text)
            .bind(row.positive)
            .bind(row.negative)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    tracing::info!(inserted = rows.len(), "sample tweets inserted");
    Ok(rows.len())
}
