use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::{PgPool, Row};

/// Aggregate view of one student's genre history.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct VarietyStats {
    pub total_combinations: i64,
    pub unique_combinations: i64,
    pub variety_score: i64,
}

/// One combination and how many stories used it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CombinationCount {
    pub combination: String,
    pub uses: i64,
}

/// Computes totals and the variety score for one student. A student with no
/// history gets all zeroes rather than an error.
pub async fn stats_for(pool: &PgPool, student_id: i64) -> Result<VarietyStats> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS total, COUNT(DISTINCT combination) AS unique_count \
         FROM story_genre_history \
         WHERE student_id = $1",
    )
    .bind(student_id)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to load variety stats for student {student_id}"))?;

    let total: i64 = row.try_get("total")?;
    let unique: i64 = row.try_get("unique_count")?;

    Ok(VarietyStats {
        total_combinations: total,
        unique_combinations: unique,
        variety_score: variety_score(total, unique),
    })
}

/// Batch variant of `stats_for`. Students with no history are absent from
/// the map; callers fall back to `VarietyStats::default()`.
pub async fn stats_for_students(
    pool: &PgPool,
    student_ids: &[i64],
) -> Result<HashMap<i64, VarietyStats>> {
    if student_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query(
        "SELECT student_id, COUNT(*) AS total, COUNT(DISTINCT combination) AS unique_count \
         FROM story_genre_history \
         WHERE student_id = ANY($1) \
         GROUP BY student_id",
    )
    .bind(student_ids)
    .fetch_all(pool)
    .await
    .context("failed to load variety stats batch")?;

    let mut stats = HashMap::with_capacity(rows.len());
    for row in rows {
        let student_id: i64 = row.try_get("student_id")?;
        let total: i64 = row.try_get("total")?;
        let unique: i64 = row.try_get("unique_count")?;
        stats.insert(
            student_id,
            VarietyStats {
                total_combinations: total,
                unique_combinations: unique,
                variety_score: variety_score(total, unique),
            },
        );
    }

    Ok(stats)
}

/// Returns the most used combinations across every student, heaviest first.
/// Ties are broken alphabetically so the ordering is stable across runs.
pub async fn top_combinations(pool: &PgPool, limit: i64) -> Result<Vec<CombinationCount>> {
    sqlx::query_as::<_, CombinationCount>(
        "SELECT combination, COUNT(*) AS uses \
         FROM story_genre_history \
         GROUP BY combination \
         ORDER BY uses DESC, combination ASC \
         LIMIT $1",
    )
    .bind(limit.max(0))
    .fetch_all(pool)
    .await
    .context("failed to load top combinations")
}

/// Share of stories that used a distinct combination, rounded to the
/// nearest whole percent. An empty history scores zero.
fn variety_score(total: i64, unique: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    ((unique as f64 / total as f64) * 100.0).round() as i64
}
