use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{DbNotification, InboxCounts, Notification, NotificationType};

const NOTIFICATION_COLUMNS: &str =
    "id, customer_id, title, message, notification_type, is_read, created_at";

/// Midnight of `now`'s day and the instant one week before `now`.
pub(crate) fn inbox_bounds(now: DateTime<Utc>) -> (NaiveDateTime, NaiveDateTime) {
    let now = now.naive_utc();
    let today = now.date().and_hms_opt(0, 0, 0).unwrap_or(now);
    (today, now - Duration::days(7))
}

#[instrument(skip(message))]
pub async fn create_notification(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    title: &str,
    message: &str,
    notification_type: NotificationType,
) -> Result<i64, AppError> {
    info!("Creating notification");
    let res = sqlx::query(
        "INSERT INTO notifications (customer_id, title, message, notification_type, is_read, created_at)
         VALUES (?, ?, ?, ?, 0, ?)",
    )
    .bind(customer_id)
    .bind(title)
    .bind(message)
    .bind(notification_type.as_str())
    .bind(Utc::now().naive_utc())
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn list_notifications(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    unread_only: bool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Notification>, AppError> {
    let filter = if unread_only { " AND is_read = 0" } else { "" };
    let rows = sqlx::query_as::<_, DbNotification>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE customer_id = ?{filter}
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    ))
    .bind(customer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Notification::from).collect())
}

#[instrument]
pub async fn notification_counts(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    now: DateTime<Utc>,
) -> Result<InboxCounts, AppError> {
    let (today, week_ago) = inbox_bounds(now);
    let (total, unread, today, this_week): (i64, Option<i64>, Option<i64>, Option<i64>) =
        sqlx::query_as(
            "SELECT COUNT(*),
                 SUM(CASE WHEN is_read = 0 THEN 1 ELSE 0 END),
                 SUM(CASE WHEN created_at >= ? THEN 1 ELSE 0 END),
                 SUM(CASE WHEN created_at >= ? THEN 1 ELSE 0 END)
             FROM notifications WHERE customer_id = ?",
        )
        .bind(today)
        .bind(week_ago)
        .bind(customer_id)
        .fetch_one(pool)
        .await?;

    Ok(InboxCounts {
        total,
        unread: unread.unwrap_or_default(),
        today: today.unwrap_or_default(),
        this_week: this_week.unwrap_or_default(),
    })
}

#[instrument]
pub async fn count_unread_notifications(
    pool: &Pool<Sqlite>,
    customer_id: i64,
) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE customer_id = ? AND is_read = 0",
    )
    .bind(customer_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Marks one of the customer's notifications read. Returns false if it isn't theirs.
#[instrument]
pub async fn mark_notification_read(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    notification_id: i64,
) -> Result<bool, AppError> {
    let result =
        sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND customer_id = ?")
            .bind(notification_id)
            .bind(customer_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

#[instrument]
pub async fn mark_all_notifications_read(
    pool: &Pool<Sqlite>,
    customer_id: i64,
) -> Result<u64, AppError> {
    info!("Marking all notifications read");
    let result =
        sqlx::query("UPDATE notifications SET is_read = 1 WHERE customer_id = ? AND is_read = 0")
            .bind(customer_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

/// Admin bulk action: sets the read flag on the given notification ids.
#[instrument(skip(ids), fields(count = ids.len()))]
pub async fn set_notifications_read(
    pool: &Pool<Sqlite>,
    ids: &[i64],
    is_read: bool,
) -> Result<u64, AppError> {
    if ids.is_empty() {
        return Ok(0);
    }
    info!("Bulk updating notification read state");

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("UPDATE notifications SET is_read = ? WHERE id IN ({placeholders})");
    let mut query = sqlx::query(&sql).bind(is_read);
    for id in ids {
        query = query.bind(*id);
    }

    Ok(query.execute(pool).await?.rows_affected())
}
