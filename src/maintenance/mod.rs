use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::{PgPool, Row};
use tracing::info;

use crate::history;

/// Outcome of one prune sweep across all students.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PruneSummary {
    pub students_pruned: u64,
    pub entries_deleted: u64,
}

/// Trims every student's genre history down to `keep` entries. Only
/// students currently over the cap are touched, so repeated sweeps over a
/// quiet table are no-ops.
pub async fn prune_all(pool: &PgPool, keep: i64) -> Result<PruneSummary> {
    let keep = keep.max(0);

    let rows = sqlx::query(
        "SELECT student_id \
         FROM story_genre_history \
         GROUP BY student_id \
         HAVING COUNT(*) > $1 \
         ORDER BY student_id",
    )
    .bind(keep)
    .fetch_all(pool)
    .await
    .context("failed to list students over the history cap")?;

    let mut summary = PruneSummary::default();
    for row in rows {
        let student_id: i64 = row.try_get("student_id")?;
        let deleted = history::prune(pool, student_id, keep).await?;
        if deleted > 0 {
            summary.students_pruned += 1;
            summary.entries_deleted += deleted;
        }
    }

    if summary.students_pruned > 0 {
        info!(
            students = summary.students_pruned,
            entries = summary.entries_deleted,
            "history prune sweep completed"
        );
    }

    Ok(summary)
}
