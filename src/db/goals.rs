use chrono::{NaiveDate, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{DbGoal, Goal, GoalStatus, GoalType};

const GOAL_COLUMNS: &str = "id, customer_id, title, description, goal_type, target_value, \
     current_value, unit, target_date, status, is_active, is_completed, created_at, completed_at";

#[derive(Debug, Clone, Default)]
pub struct NewGoal {
    pub title: String,
    pub description: String,
    pub goal_type: GoalType,
    pub target_value: Option<f64>,
    pub current_value: f64,
    pub unit: String,
    pub target_date: Option<NaiveDate>,
}

#[instrument(skip(goal), fields(title = %goal.title))]
pub async fn create_goal(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    goal: &NewGoal,
) -> Result<Goal, AppError> {
    info!("Creating goal");
    let row = sqlx::query_as::<_, DbGoal>(&format!(
        "INSERT INTO goals (customer_id, title, description, goal_type, target_value, current_value,
             unit, target_date, status, is_active, is_completed, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'active', 1, 0, ?)
         RETURNING {GOAL_COLUMNS}"
    ))
    .bind(customer_id)
    .bind(&goal.title)
    .bind(&goal.description)
    .bind(goal.goal_type.as_str())
    .bind(goal.target_value)
    .bind(goal.current_value)
    .bind(&goal.unit)
    .bind(goal.target_date)
    .bind(Utc::now().naive_utc())
    .fetch_one(pool)
    .await?;

    Ok(Goal::from(row))
}

/// A goal owned by `customer_id`; other customers' goals are reported as not found.
#[instrument]
pub async fn get_goal(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    goal_id: i64,
) -> Result<Goal, AppError> {
    let row = sqlx::query_as::<_, DbGoal>(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals WHERE id = ? AND customer_id = ?"
    ))
    .bind(goal_id)
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;

    row.map(Goal::from)
        .ok_or_else(|| AppError::NotFound(format!("Goal {} not found", goal_id)))
}

/// Persists the goal, re-deriving `is_active`/`is_completed` from its status first.
#[instrument(skip(goal), fields(goal_id = goal.id))]
pub async fn save_goal(pool: &Pool<Sqlite>, goal: &mut Goal) -> Result<(), AppError> {
    info!("Saving goal");
    goal.sync_flags();

    sqlx::query(
        "UPDATE goals SET title = ?, description = ?, goal_type = ?, target_value = ?,
             current_value = ?, unit = ?, target_date = ?, status = ?, is_active = ?,
             is_completed = ?, completed_at = ?
         WHERE id = ? AND customer_id = ?",
    )
    .bind(&goal.title)
    .bind(&goal.description)
    .bind(goal.goal_type.as_str())
    .bind(goal.target_value)
    .bind(goal.current_value)
    .bind(&goal.unit)
    .bind(goal.target_date)
    .bind(goal.status.as_str())
    .bind(goal.is_active)
    .bind(goal.is_completed)
    .bind(goal.completed_at.map(|d| d.naive_utc()))
    .bind(goal.id)
    .bind(goal.customer_id)
    .execute(pool)
    .await?;

    Ok(())
}

#[instrument]
pub async fn list_goals(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    status: Option<GoalStatus>,
    limit: Option<i64>,
) -> Result<Vec<Goal>, AppError> {
    let rows = match status {
        Some(status) => {
            sqlx::query_as::<_, DbGoal>(&format!(
                "SELECT {GOAL_COLUMNS} FROM goals WHERE customer_id = ? AND status = ?
                 ORDER BY created_at DESC, id DESC LIMIT ?"
            ))
            .bind(customer_id)
            .bind(status.as_str())
            .bind(limit.unwrap_or(-1))
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, DbGoal>(&format!(
                "SELECT {GOAL_COLUMNS} FROM goals WHERE customer_id = ?
                 ORDER BY created_at DESC, id DESC LIMIT ?"
            ))
            .bind(customer_id)
            .bind(limit.unwrap_or(-1))
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().map(Goal::from).collect())
}

#[instrument]
pub async fn count_goals(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    status: Option<GoalStatus>,
) -> Result<i64, AppError> {
    let count: i64 = match status {
        Some(status) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM goals WHERE customer_id = ? AND status = ?")
                .bind(customer_id)
                .bind(status.as_str())
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM goals WHERE customer_id = ?")
                .bind(customer_id)
                .fetch_one(pool)
                .await?
        }
    };
    Ok(count)
}

#[instrument]
pub async fn delete_goal(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    goal_id: i64,
) -> Result<(), AppError> {
    info!("Deleting goal");
    let result = sqlx::query("DELETE FROM goals WHERE id = ? AND customer_id = ?")
        .bind(goal_id)
        .bind(customer_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Goal {} not found", goal_id)));
    }
    Ok(())
}
