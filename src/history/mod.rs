use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// How many of a student's most recent entries selection checks when steering
/// away from repeats.
pub const RECENT_WINDOW: i64 = 15;
/// Entries retained per student by the default prune policy. Equal to the
/// recency window today, but kept separate: retention and repeat-avoidance
/// are distinct policies.
pub const DEFAULT_KEEP: i64 = 15;

/// One recorded use of a genre combination. Entries are written once by the
/// story-creation flow and removed only by pruning, never updated.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HistoryEntry {
    pub id: i64,
    pub student_id: i64,
    pub combination: String,
    pub used_at: DateTime<Utc>,
}

/// Appends one entry stamped with the database clock. The student id is not
/// checked against the student table; recording for an unknown student
/// succeeds. Callers invoke this after the generated story is persisted, so
/// an aborted generation leaves no history behind.
pub async fn record(pool: &PgPool, student_id: i64, combination: &str) -> Result<()> {
    sqlx::query("INSERT INTO story_genre_history (student_id, combination) VALUES ($1, $2)")
        .bind(student_id)
        .bind(combination)
        .execute(pool)
        .await
        .with_context(|| format!("failed to record combination for student {student_id}"))?;

    Ok(())
}

/// Up to `limit` entries for the student, most recent first. Unknown students
/// simply have no entries.
pub async fn recent(pool: &PgPool, student_id: i64, limit: i64) -> Result<Vec<HistoryEntry>> {
    let limit = limit.max(0);

    sqlx::query_as::<_, HistoryEntry>(
        "SELECT id, student_id, combination, used_at
         FROM story_genre_history
         WHERE student_id = $1
         ORDER BY used_at DESC, id DESC
         LIMIT $2",
    )
    .bind(student_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to load recent history for student {student_id}"))
}

/// The student's full retained history, most recent first. Variety reporting
/// reads this unbounded view; selection only ever looks at the
/// `RECENT_WINDOW` newest entries via `recent`.
pub async fn fetch_all(pool: &PgPool, student_id: i64) -> Result<Vec<HistoryEntry>> {
    sqlx::query_as::<_, HistoryEntry>(
        "SELECT id, student_id, combination, used_at
         FROM story_genre_history
         WHERE student_id = $1
         ORDER BY used_at DESC, id DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to load history for student {student_id}"))
}

/// Deletes everything beyond the `keep` most recent entries for the student
/// and returns the number of rows removed. Maintenance invokes this
/// explicitly; `record` never prunes on its own.
pub async fn prune(pool: &PgPool, student_id: i64, keep: i64) -> Result<u64> {
    let keep = keep.max(0);

    let result = sqlx::query(
        "DELETE FROM story_genre_history
         WHERE id IN (
             SELECT id FROM story_genre_history
             WHERE student_id = $1
             ORDER BY used_at DESC, id DESC
             OFFSET $2
         )",
    )
    .bind(student_id)
    .bind(keep)
    .execute(pool)
    .await
    .with_context(|| format!("failed to prune history for student {student_id}"))?;

    Ok(result.rows_affected())
}
