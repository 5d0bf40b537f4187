use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use super::{PARTY_COLUMNS, PARTY_JOINS};
use crate::error::AppError;
use crate::models::{
    DbTrainerRating, DbTrainingSession, SessionStatus, SessionType, TrainerRating, TrainingSession,
};

fn session_select() -> String {
    format!(
        "SELECT x.id, x.customer_id, x.trainer_id, {PARTY_COLUMNS}, x.session_date, \
         x.session_time, x.duration_minutes, x.session_type, x.status, x.notes, \
         x.trainer_notes, x.is_confirmed, x.created_at FROM training_sessions x {PARTY_JOINS}"
    )
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub trainer_id: i64,
    pub customer_id: i64,
    pub session_date: NaiveDate,
    pub session_time: NaiveTime,
    pub duration_minutes: i64,
    pub session_type: SessionType,
    pub notes: String,
}

/// True when the trainer already has a scheduled or confirmed session at that slot.
#[instrument]
pub async fn slot_taken(
    pool: &Pool<Sqlite>,
    trainer_id: i64,
    session_date: NaiveDate,
    session_time: NaiveTime,
) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM training_sessions
         WHERE trainer_id = ? AND session_date = ? AND session_time = ?
           AND status IN ('scheduled', 'confirmed')",
    )
    .bind(trainer_id)
    .bind(session_date)
    .bind(session_time)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

#[instrument(skip(session), fields(trainer_id = session.trainer_id, customer_id = session.customer_id))]
pub async fn create_session(
    pool: &Pool<Sqlite>,
    session: &NewSession,
) -> Result<TrainingSession, AppError> {
    info!("Scheduling training session");
    if slot_taken(pool, session.trainer_id, session.session_date, session.session_time).await? {
        return Err(AppError::Conflict(
            "You already have a session scheduled at this time.".to_string(),
        ));
    }

    let inserted = sqlx::query(
        "INSERT INTO training_sessions (customer_id, trainer_id, session_date, session_time,
             duration_minutes, session_type, status, notes, is_confirmed, created_at)
         VALUES (?, ?, ?, ?, ?, ?, 'scheduled', ?, 0, ?)",
    )
    .bind(session.customer_id)
    .bind(session.trainer_id)
    .bind(session.session_date)
    .bind(session.session_time)
    .bind(session.duration_minutes)
    .bind(session.session_type.as_str())
    .bind(&session.notes)
    .bind(Utc::now().naive_utc())
    .execute(pool)
    .await
    .map_err(AppError::from);

    let id = match inserted {
        Ok(res) => res.last_insert_rowid(),
        Err(e) if e.is_unique_violation() => {
            // A cancelled or finished session still owns the row for this slot.
            warn!("Slot held by an inactive session");
            return Err(AppError::Conflict(
                "A session already exists at this time.".to_string(),
            ));
        }
        Err(e) => return Err(e),
    };

    get_session(pool, session.trainer_id, id).await
}

/// A session belonging to `trainer_id`.
#[instrument]
pub async fn get_session(
    pool: &Pool<Sqlite>,
    trainer_id: i64,
    session_id: i64,
) -> Result<TrainingSession, AppError> {
    let row = sqlx::query_as::<_, DbTrainingSession>(&format!(
        "{} WHERE x.id = ? AND x.trainer_id = ?",
        session_select()
    ))
    .bind(session_id)
    .bind(trainer_id)
    .fetch_optional(pool)
    .await?;

    row.map(TrainingSession::from)
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))
}

#[instrument]
pub async fn update_session_status(
    pool: &Pool<Sqlite>,
    session_id: i64,
    status: SessionStatus,
) -> Result<(), AppError> {
    info!("Updating session status");
    sqlx::query(
        "UPDATE training_sessions SET status = ?,
             is_confirmed = CASE WHEN ? = 'confirmed' THEN 1 ELSE is_confirmed END
         WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(status.as_str())
    .bind(session_id)
    .execute(pool)
    .await?;
    Ok(())
}

#[instrument(skip(notes))]
pub async fn set_trainer_notes(
    pool: &Pool<Sqlite>,
    session_id: i64,
    notes: &str,
) -> Result<(), AppError> {
    sqlx::query("UPDATE training_sessions SET trainer_notes = ? WHERE id = ?")
        .bind(notes)
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Narrows a session query. `upcoming` keeps only scheduled/confirmed sessions and
/// sorts them soonest first; otherwise the newest come first.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub trainer_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub status: Option<SessionStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub upcoming: bool,
}

impl SessionFilter {
    pub fn for_trainer(trainer_id: i64) -> Self {
        Self {
            trainer_id: Some(trainer_id),
            ..Default::default()
        }
    }

    pub fn for_customer(customer_id: i64) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Default::default()
        }
    }

    pub fn status(mut self, status: SessionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn upcoming_from(mut self, today: NaiveDate) -> Self {
        self.from = Some(today);
        self.upcoming = true;
        self
    }

    fn where_clause(&self) -> String {
        let mut clause = String::from(" WHERE 1 = 1");
        if self.trainer_id.is_some() {
            clause.push_str(" AND x.trainer_id = ?");
        }
        if self.customer_id.is_some() {
            clause.push_str(" AND x.customer_id = ?");
        }
        if self.status.is_some() {
            clause.push_str(" AND x.status = ?");
        }
        if self.from.is_some() {
            clause.push_str(" AND x.session_date >= ?");
        }
        if self.to.is_some() {
            clause.push_str(" AND x.session_date <= ?");
        }
        if self.upcoming {
            clause.push_str(" AND x.status IN ('scheduled', 'confirmed')");
        }
        clause
    }
}

macro_rules! bind_filter {
    ($query:expr, $filter:expr) => {{
        let mut query = $query;
        if let Some(id) = $filter.trainer_id {
            query = query.bind(id);
        }
        if let Some(id) = $filter.customer_id {
            query = query.bind(id);
        }
        if let Some(status) = $filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(from) = $filter.from {
            query = query.bind(from);
        }
        if let Some(to) = $filter.to {
            query = query.bind(to);
        }
        query
    }};
}

#[instrument]
pub async fn count_sessions(pool: &Pool<Sqlite>, filter: &SessionFilter) -> Result<i64, AppError> {
    let sql = format!(
        "SELECT COUNT(*) FROM training_sessions x{}",
        filter.where_clause()
    );
    let query = bind_filter!(sqlx::query_scalar::<_, i64>(&sql), filter);
    Ok(query.fetch_one(pool).await?)
}

#[instrument]
pub async fn list_sessions(
    pool: &Pool<Sqlite>,
    filter: &SessionFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<TrainingSession>, AppError> {
    let order = if filter.upcoming {
        "x.session_date ASC, x.session_time ASC"
    } else {
        "x.session_date DESC, x.session_time DESC"
    };
    let sql = format!(
        "{}{} ORDER BY {order} LIMIT ? OFFSET ?",
        session_select(),
        filter.where_clause()
    );

    let query = bind_filter!(sqlx::query_as::<_, DbTrainingSession>(&sql), filter);
    let rows = query.bind(limit).bind(offset).fetch_all(pool).await?;

    Ok(rows.into_iter().map(TrainingSession::from).collect())
}

#[instrument]
pub async fn get_rating(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    trainer_id: i64,
) -> Result<Option<TrainerRating>, AppError> {
    let row = sqlx::query_as::<_, DbTrainerRating>(
        "SELECT id, customer_id, trainer_id, rating, feedback, created_at, updated_at
         FROM trainer_ratings WHERE customer_id = ? AND trainer_id = ?",
    )
    .bind(customer_id)
    .bind(trainer_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(TrainerRating::from))
}

/// Creates or replaces the customer's rating and refreshes the trainer's average.
#[instrument(skip(feedback))]
pub async fn rate_trainer(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    trainer_id: i64,
    rating: i64,
    feedback: &str,
) -> Result<f64, AppError> {
    info!("Rating trainer");
    let now = Utc::now().naive_utc();
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO trainer_ratings (customer_id, trainer_id, rating, feedback, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT (customer_id, trainer_id) DO UPDATE SET
             rating = excluded.rating,
             feedback = excluded.feedback,
             updated_at = excluded.updated_at",
    )
    .bind(customer_id)
    .bind(trainer_id)
    .bind(rating)
    .bind(feedback)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let average: Option<f64> =
        sqlx::query_scalar("SELECT AVG(rating) FROM trainer_ratings WHERE trainer_id = ?")
            .bind(trainer_id)
            .fetch_one(&mut *tx)
            .await?;
    let average = average.unwrap_or_default();

    sqlx::query("UPDATE trainers SET average_rating = ?, updated_at = ? WHERE id = ?")
        .bind(average)
        .bind(now)
        .bind(trainer_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(average)
}
