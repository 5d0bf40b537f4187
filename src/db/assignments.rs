use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use super::profiles::TRAINER_SUPPORT_SQL;
use super::{PARTY_COLUMNS, PARTY_JOINS, like_pattern};
use crate::error::AppError;
use crate::models::{
    Customer, DbCustomer, DbTrainerAssignment, DbTrainerWorkload, TrainerAssignment,
    TrainerWorkload,
};

fn assignment_select() -> String {
    format!(
        "SELECT x.id, x.customer_id, x.trainer_id, {PARTY_COLUMNS}, x.assigned_date, x.end_date, \
         x.is_active, x.notes FROM trainer_assignments x {PARTY_JOINS}"
    )
}

#[instrument]
pub async fn get_active_assignment_for_customer(
    pool: &Pool<Sqlite>,
    customer_id: i64,
) -> Result<Option<TrainerAssignment>, AppError> {
    let row = sqlx::query_as::<_, DbTrainerAssignment>(&format!(
        "{} WHERE x.customer_id = ? AND x.is_active = 1",
        assignment_select()
    ))
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(TrainerAssignment::from))
}

/// Points the customer's single assignment row at `trainer_id` and reactivates it.
#[instrument(skip(notes))]
pub async fn upsert_assignment(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    trainer_id: i64,
    notes: &str,
    now: DateTime<Utc>,
) -> Result<TrainerAssignment, AppError> {
    info!("Assigning trainer to customer");
    sqlx::query(
        "INSERT INTO trainer_assignments (customer_id, trainer_id, assigned_date, end_date, is_active, notes)
         VALUES (?, ?, ?, NULL, 1, ?)
         ON CONFLICT (customer_id) DO UPDATE SET
             trainer_id = excluded.trainer_id,
             assigned_date = excluded.assigned_date,
             end_date = NULL,
             is_active = 1,
             notes = excluded.notes",
    )
    .bind(customer_id)
    .bind(trainer_id)
    .bind(now.naive_utc())
    .bind(notes)
    .execute(pool)
    .await?;

    get_active_assignment_for_customer(pool, customer_id)
        .await?
        .ok_or_else(|| AppError::Internal("Assignment missing after save".to_string()))
}

#[instrument]
pub async fn deactivate_assignment(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    now: DateTime<Utc>,
) -> Result<bool, AppError> {
    info!("Deactivating assignment");
    let result = sqlx::query(
        "UPDATE trainer_assignments SET is_active = 0, end_date = ?
         WHERE customer_id = ? AND is_active = 1",
    )
    .bind(now.naive_utc())
    .bind(customer_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Verified trainers with their active client counts, in id order.
#[instrument]
pub async fn trainer_workloads(pool: &Pool<Sqlite>) -> Result<Vec<TrainerWorkload>, AppError> {
    info!("Computing trainer workloads");
    let rows = sqlx::query_as::<_, DbTrainerWorkload>(
        "SELECT t.id AS trainer_id, u.username, u.first_name, u.last_name, u.email,
             (SELECT COUNT(*) FROM trainer_assignments a
              WHERE a.trainer_id = t.id AND a.is_active = 1) AS active_clients
         FROM trainers t JOIN users u ON u.id = t.user_id
         WHERE t.is_verified = 1
         ORDER BY t.id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(TrainerWorkload::from).collect())
}

#[instrument]
pub async fn count_active_assignments(pool: &Pool<Sqlite>) -> Result<i64, AppError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM trainer_assignments WHERE is_active = 1")
            .fetch_one(pool)
            .await?;
    Ok(count)
}

#[instrument]
pub async fn is_client_of(
    pool: &Pool<Sqlite>,
    trainer_id: i64,
    customer_id: i64,
) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM trainer_assignments
         WHERE trainer_id = ? AND customer_id = ? AND is_active = 1",
    )
    .bind(trainer_id)
    .bind(customer_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

const CLIENT_FROM: &str = "FROM trainer_assignments a \
     JOIN customers c ON c.id = a.customer_id \
     JOIN users u ON u.id = c.user_id \
     WHERE a.trainer_id = ? AND a.is_active = 1";

const CLIENT_SEARCH: &str =
    " AND (u.username LIKE ? OR u.first_name LIKE ? OR u.last_name LIKE ? OR u.email LIKE ?)";

#[instrument]
pub async fn count_trainer_clients(
    pool: &Pool<Sqlite>,
    trainer_id: i64,
    search: Option<&str>,
) -> Result<i64, AppError> {
    let search = search.map(str::trim).filter(|s| !s.is_empty());
    let mut sql = format!("SELECT COUNT(*) {CLIENT_FROM}");
    if search.is_some() {
        sql.push_str(CLIENT_SEARCH);
    }

    let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(trainer_id);
    if let Some(term) = search {
        let pattern = like_pattern(term);
        for _ in 0..4 {
            query = query.bind(pattern.clone());
        }
    }
    Ok(query.fetch_one(pool).await?)
}

/// Active clients of the trainer whose subscription is flagged active.
#[instrument]
pub async fn count_subscribed_clients(pool: &Pool<Sqlite>, trainer_id: i64) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) {CLIENT_FROM} AND EXISTS (SELECT 1 FROM customer_subscriptions s \
         WHERE s.customer_id = c.id AND s.is_active = 1)"
    ))
    .bind(trainer_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Customers actively assigned to the trainer, most recently assigned first.
#[instrument]
pub async fn list_trainer_clients(
    pool: &Pool<Sqlite>,
    trainer_id: i64,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Customer>, AppError> {
    info!("Listing trainer clients");
    let search = search.map(str::trim).filter(|s| !s.is_empty());
    let mut sql = format!(
        "SELECT c.id, c.user_id, u.username, u.email, u.first_name, u.last_name, u.phone, \
         c.date_of_birth, c.gender, c.height, c.weight, c.fitness_level, c.fitness_goals, \
         c.medical_conditions, c.created_at {CLIENT_FROM}"
    );
    if search.is_some() {
        sql.push_str(CLIENT_SEARCH);
    }
    sql.push_str(" ORDER BY a.assigned_date DESC, c.id DESC LIMIT ? OFFSET ?");

    let mut query = sqlx::query_as::<_, DbCustomer>(&sql).bind(trainer_id);
    if let Some(term) = search {
        let pattern = like_pattern(term);
        for _ in 0..4 {
            query = query.bind(pattern.clone());
        }
    }
    let rows = query.bind(limit).bind(offset).fetch_all(pool).await?;

    Ok(rows.into_iter().map(Customer::from).collect())
}

#[instrument]
pub async fn recent_assignments(
    pool: &Pool<Sqlite>,
    limit: i64,
) -> Result<Vec<TrainerAssignment>, AppError> {
    let rows = sqlx::query_as::<_, DbTrainerAssignment>(&format!(
        "{} WHERE x.is_active = 1 ORDER BY x.assigned_date DESC, x.id DESC LIMIT ?",
        assignment_select()
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(TrainerAssignment::from).collect())
}

/// Customers entitled to trainer support who have no active trainer, oldest first.
#[instrument]
pub async fn unassigned_support_customers(
    pool: &Pool<Sqlite>,
    now: DateTime<Utc>,
    limit: Option<i64>,
) -> Result<Vec<Customer>, AppError> {
    let rows = sqlx::query_as::<_, DbCustomer>(&format!(
        "SELECT c.id, c.user_id, u.username, u.email, u.first_name, u.last_name, u.phone, \
         c.date_of_birth, c.gender, c.height, c.weight, c.fitness_level, c.fitness_goals, \
         c.medical_conditions, c.created_at \
         FROM customers c JOIN users u ON u.id = c.user_id \
         WHERE {TRAINER_SUPPORT_SQL} \
         AND NOT EXISTS (SELECT 1 FROM trainer_assignments a \
                         WHERE a.customer_id = c.id AND a.is_active = 1) \
         ORDER BY c.id LIMIT ?"
    ))
    .bind(now.naive_utc())
    .bind(limit.unwrap_or(-1))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Customer::from).collect())
}

#[instrument]
pub async fn count_support_customers(
    pool: &Pool<Sqlite>,
    now: DateTime<Utc>,
) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM customers c WHERE {TRAINER_SUPPORT_SQL}"
    ))
    .bind(now.naive_utc())
    .fetch_one(pool)
    .await?;
    Ok(count)
}
