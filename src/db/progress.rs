use chrono::{NaiveDate, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{DbWorkoutProgress, WorkoutProgress};

const PROGRESS_COLUMNS: &str = "id, customer_id, date, weight, bmi, sessions_attended, \
     trainer_notes, customer_notes, created_at";

#[derive(Debug, Clone, Default)]
pub struct ProgressEntry {
    pub date: NaiveDate,
    pub weight: Option<f64>,
    pub bmi: Option<f64>,
    pub sessions_attended: i64,
    pub customer_notes: String,
}

/// One entry per customer per day. A second entry for the same date updates the first,
/// keeping the stored weight and BMI when the new entry leaves them out.
#[instrument(skip(entry), fields(date = %entry.date))]
pub async fn upsert_progress(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    entry: &ProgressEntry,
) -> Result<WorkoutProgress, AppError> {
    info!("Recording workout progress");
    let row = sqlx::query_as::<_, DbWorkoutProgress>(&format!(
        "INSERT INTO workout_progress (customer_id, date, weight, bmi, sessions_attended, customer_notes, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (customer_id, date) DO UPDATE SET
             weight = COALESCE(excluded.weight, weight),
             bmi = COALESCE(excluded.bmi, bmi),
             sessions_attended = excluded.sessions_attended,
             customer_notes = excluded.customer_notes
         RETURNING {PROGRESS_COLUMNS}"
    ))
    .bind(customer_id)
    .bind(entry.date)
    .bind(entry.weight)
    .bind(entry.bmi)
    .bind(entry.sessions_attended)
    .bind(&entry.customer_notes)
    .bind(Utc::now().naive_utc())
    .fetch_one(pool)
    .await?;

    Ok(WorkoutProgress::from(row))
}

/// Newest entries first.
#[instrument]
pub async fn list_progress(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    limit: i64,
) -> Result<Vec<WorkoutProgress>, AppError> {
    let rows = sqlx::query_as::<_, DbWorkoutProgress>(&format!(
        "SELECT {PROGRESS_COLUMNS} FROM workout_progress WHERE customer_id = ?
         ORDER BY date DESC, id DESC LIMIT ?"
    ))
    .bind(customer_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(WorkoutProgress::from).collect())
}

#[instrument]
pub async fn count_progress(pool: &Pool<Sqlite>, customer_id: i64) -> Result<i64, AppError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM workout_progress WHERE customer_id = ?")
            .bind(customer_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Number of entries and the total sessions attended across them.
#[instrument]
pub async fn progress_totals(pool: &Pool<Sqlite>, customer_id: i64) -> Result<(i64, i64), AppError> {
    let (entries, sessions): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), SUM(sessions_attended) FROM workout_progress WHERE customer_id = ?",
    )
    .bind(customer_id)
    .fetch_one(pool)
    .await?;
    Ok((entries, sessions.unwrap_or_default()))
}

/// Latest progress entries across all of a trainer's active clients.
#[instrument]
pub async fn recent_client_progress(
    pool: &Pool<Sqlite>,
    trainer_id: i64,
    limit: i64,
) -> Result<Vec<WorkoutProgress>, AppError> {
    let rows = sqlx::query_as::<_, DbWorkoutProgress>(
        "SELECT p.id, p.customer_id, p.date, p.weight, p.bmi, p.sessions_attended,
             p.trainer_notes, p.customer_notes, p.created_at
         FROM workout_progress p
         JOIN trainer_assignments a ON a.customer_id = p.customer_id AND a.is_active = 1
         WHERE a.trainer_id = ?
         ORDER BY p.date DESC, p.id DESC LIMIT ?",
    )
    .bind(trainer_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(WorkoutProgress::from).collect())
}
