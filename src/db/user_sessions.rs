use chrono::{NaiveDateTime, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::{DbUserSession, UserSession};
use crate::error::AppError;

/// Stores a login token for `user_id`. Tokens outlive logout only until the hourly sweep.
#[instrument(skip(pool, token))]
pub async fn create_user_session(
    pool: &Pool<Sqlite>,
    user_id: i64,
    token: &str,
    expires_at: NaiveDateTime,
) -> Result<i64, AppError> {
    info!(%expires_at, "Opening login session");
    let id = sqlx::query_scalar(
        "INSERT INTO user_sessions (user_id, token, created_at, expires_at)
         VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(user_id)
    .bind(token)
    .bind(Utc::now().naive_utc())
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// The session for a cookie token, expired or not; callers check `is_valid`.
#[instrument(skip(pool, token))]
pub async fn get_session_by_token(
    pool: &Pool<Sqlite>,
    token: &str,
) -> Result<UserSession, AppError> {
    sqlx::query_as::<_, DbUserSession>(
        "SELECT id, user_id, token, expires_at FROM user_sessions WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?
    .map(UserSession::from)
    .ok_or_else(|| AppError::Authentication("Invalid session token".to_string()))
}

#[instrument(skip(pool, token))]
pub async fn invalidate_session(pool: &Pool<Sqlite>, token: &str) -> Result<(), AppError> {
    info!("Closing login session");
    sqlx::query("DELETE FROM user_sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Removes every session the user holds.
#[instrument(skip(pool))]
pub async fn invalidate_user_sessions(pool: &Pool<Sqlite>, user_id: i64) -> Result<u64, AppError> {
    let removed = sqlx::query("DELETE FROM user_sessions WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();
    info!(removed, "Closed all sessions for user");
    Ok(removed)
}

#[instrument(skip(pool))]
pub async fn clean_expired_sessions(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    let removed = sqlx::query("DELETE FROM user_sessions WHERE expires_at < ?")
        .bind(Utc::now().naive_utc())
        .execute(pool)
        .await?
        .rows_affected();
    info!(removed, "Swept expired login sessions");
    Ok(removed)
}
