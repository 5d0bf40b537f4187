use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use super::notifications::inbox_bounds;
use super::{PARTY_COLUMNS, PARTY_JOINS};
use crate::error::AppError;
use crate::models::{DbTrainerMessage, InboxCounts, TrainerMessage};

fn message_select() -> String {
    format!(
        "SELECT x.id, x.customer_id, x.trainer_id, {PARTY_COLUMNS}, x.subject, x.message, \
         x.content, x.is_read, x.created_at FROM trainer_messages x {PARTY_JOINS}"
    )
}

/// Which side of the conversation a message list is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mailbox {
    Customer(i64),
    Trainer(i64),
}

impl Mailbox {
    fn column(&self) -> (&'static str, i64) {
        match self {
            Mailbox::Customer(id) => ("customer_id", *id),
            Mailbox::Trainer(id) => ("trainer_id", *id),
        }
    }
}

#[instrument(skip(message))]
pub async fn create_message(
    pool: &Pool<Sqlite>,
    trainer_id: i64,
    customer_id: i64,
    subject: &str,
    message: &str,
) -> Result<i64, AppError> {
    info!("Creating trainer message");
    let res = sqlx::query(
        "INSERT INTO trainer_messages (customer_id, trainer_id, subject, message, content, is_read, created_at)
         VALUES (?, ?, ?, ?, ?, 0, ?)",
    )
    .bind(customer_id)
    .bind(trainer_id)
    .bind(subject)
    .bind(message)
    .bind(message)
    .bind(Utc::now().naive_utc())
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn list_messages(
    pool: &Pool<Sqlite>,
    mailbox: Mailbox,
    unread_only: bool,
    limit: i64,
    offset: i64,
) -> Result<Vec<TrainerMessage>, AppError> {
    let (column, id) = mailbox.column();
    let filter = if unread_only { " AND x.is_read = 0" } else { "" };
    let rows = sqlx::query_as::<_, DbTrainerMessage>(&format!(
        "{} WHERE x.{column} = ?{filter} ORDER BY x.created_at DESC, x.id DESC LIMIT ? OFFSET ?",
        message_select()
    ))
    .bind(id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(TrainerMessage::from).collect())
}

#[instrument]
pub async fn message_counts(
    pool: &Pool<Sqlite>,
    mailbox: Mailbox,
    now: DateTime<Utc>,
) -> Result<InboxCounts, AppError> {
    let (column, id) = mailbox.column();
    let (today, week_ago) = inbox_bounds(now);
    let (total, unread, today, this_week): (i64, Option<i64>, Option<i64>, Option<i64>) =
        sqlx::query_as(&format!(
            "SELECT COUNT(*),
                 SUM(CASE WHEN is_read = 0 THEN 1 ELSE 0 END),
                 SUM(CASE WHEN created_at >= ? THEN 1 ELSE 0 END),
                 SUM(CASE WHEN created_at >= ? THEN 1 ELSE 0 END)
             FROM trainer_messages WHERE {column} = ?"
        ))
        .bind(today)
        .bind(week_ago)
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(InboxCounts {
        total,
        unread: unread.unwrap_or_default(),
        today: today.unwrap_or_default(),
        this_week: this_week.unwrap_or_default(),
    })
}

/// Messages received by the customer at or after `since`, optionally only from one trainer.
#[instrument]
pub async fn count_customer_messages(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    trainer_id: Option<i64>,
    since: Option<DateTime<Utc>>,
) -> Result<i64, AppError> {
    let since = since.map(|d| d.naive_utc());
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM trainer_messages
         WHERE customer_id = ? AND (? IS NULL OR trainer_id = ?) AND (? IS NULL OR created_at >= ?)",
    )
    .bind(customer_id)
    .bind(trainer_id)
    .bind(trainer_id)
    .bind(since)
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Marks a message read if it was sent to `customer_id`.
#[instrument]
pub async fn mark_message_read(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    message_id: i64,
) -> Result<bool, AppError> {
    let result =
        sqlx::query("UPDATE trainer_messages SET is_read = 1 WHERE id = ? AND customer_id = ?")
            .bind(message_id)
            .bind(customer_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

#[instrument]
pub async fn get_message_for_customer(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    message_id: i64,
) -> Result<TrainerMessage, AppError> {
    let row = sqlx::query_as::<_, DbTrainerMessage>(&format!(
        "{} WHERE x.id = ? AND x.customer_id = ?",
        message_select()
    ))
    .bind(message_id)
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;

    row.map(TrainerMessage::from)
        .ok_or_else(|| AppError::NotFound(format!("Message {} not found", message_id)))
}
