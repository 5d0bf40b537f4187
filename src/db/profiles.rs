use chrono::{NaiveDate, Utc};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::{info, instrument};

use super::like_pattern;
use crate::error::AppError;
use crate::models::{Customer, DbCustomer, DbTrainer, FitnessLevel, Gender, Trainer};

const CUSTOMER_SELECT: &str = "SELECT c.id, c.user_id, u.username, u.email, u.first_name, \
     u.last_name, u.phone, c.date_of_birth, c.gender, c.height, c.weight, c.fitness_level, \
     c.fitness_goals, c.medical_conditions, c.created_at \
     FROM customers c JOIN users u ON u.id = c.user_id";

const TRAINER_SELECT: &str = "SELECT t.id, t.user_id, u.username, u.email, u.first_name, \
     u.last_name, u.phone, t.address, t.is_verified, t.bio, t.specializations, \
     t.experience_years, t.hourly_rate_cents, t.average_rating, t.created_at \
     FROM trainers t JOIN users u ON u.id = t.user_id";

/// SQL condition on customer alias `c`: the customer has a subscription that is active
/// and whose end date has not passed. Binds the current time once.
pub(crate) const CURRENT_SUBSCRIPTION_SQL: &str = "EXISTS (SELECT 1 FROM customer_subscriptions s \
     WHERE s.customer_id = c.id AND s.is_active = 1 AND (s.end_date IS NULL OR s.end_date > ?))";

/// Like `CURRENT_SUBSCRIPTION_SQL`, restricted to plans that include trainer support.
pub(crate) const TRAINER_SUPPORT_SQL: &str = "EXISTS (SELECT 1 FROM customer_subscriptions s \
     JOIN subscription_plans p ON p.id = s.plan_id \
     WHERE s.customer_id = c.id AND s.is_active = 1 AND p.trainer_support = 1 \
     AND (s.end_date IS NULL OR s.end_date > ?))";

#[instrument]
pub async fn get_customer(pool: &Pool<Sqlite>, customer_id: i64) -> Result<Customer, AppError> {
    info!("Fetching customer");
    let row = sqlx::query_as::<_, DbCustomer>(&format!("{CUSTOMER_SELECT} WHERE c.id = ?"))
        .bind(customer_id)
        .fetch_optional(pool)
        .await?;

    row.map(Customer::from)
        .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", customer_id)))
}

#[instrument]
pub async fn get_customer_by_user_id(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Option<Customer>, AppError> {
    let row = sqlx::query_as::<_, DbCustomer>(&format!("{CUSTOMER_SELECT} WHERE c.user_id = ?"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(Customer::from))
}

#[derive(Debug, Clone, Default)]
pub struct CustomerProfileUpdate {
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub fitness_level: FitnessLevel,
    pub fitness_goals: String,
    pub medical_conditions: String,
}

#[instrument(skip(update))]
pub async fn update_customer_profile(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    update: &CustomerProfileUpdate,
) -> Result<(), AppError> {
    info!("Updating customer profile");
    sqlx::query(
        "UPDATE customers SET date_of_birth = ?, gender = ?, height = ?, weight = ?,
             fitness_level = ?, fitness_goals = ?, medical_conditions = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(update.date_of_birth)
    .bind(update.gender.map(|g| g.as_str()).unwrap_or_default())
    .bind(update.height)
    .bind(update.weight)
    .bind(update.fitness_level.as_str())
    .bind(&update.fitness_goals)
    .bind(&update.medical_conditions)
    .bind(Utc::now().naive_utc())
    .bind(customer_id)
    .execute(pool)
    .await?;

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerFilter {
    Active,
    Expired,
    NoSubscription,
    PersonalTraining,
}

impl FromStr for CustomerFilter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CustomerFilter::Active),
            "expired" => Ok(CustomerFilter::Expired),
            "no_subscription" => Ok(CustomerFilter::NoSubscription),
            "personal_training" => Ok(CustomerFilter::PersonalTraining),
            _ => Err(()),
        }
    }
}

/// Admin customer list, optionally filtered by subscription state and searched by name.
#[instrument]
pub async fn list_customers(
    pool: &Pool<Sqlite>,
    filter: Option<CustomerFilter>,
    search: Option<&str>,
) -> Result<Vec<Customer>, AppError> {
    info!("Listing customers");
    let now = Utc::now().naive_utc();

    let mut sql = format!("{CUSTOMER_SELECT} WHERE 1 = 1");
    let mut binds_now = 0;
    match filter {
        Some(CustomerFilter::Active) => {
            sql.push_str(&format!(" AND {CURRENT_SUBSCRIPTION_SQL}"));
            binds_now += 1;
        }
        Some(CustomerFilter::Expired) => {
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM customer_subscriptions s WHERE s.customer_id = c.id) \
                  AND NOT {CURRENT_SUBSCRIPTION_SQL}"
            ));
            binds_now += 1;
        }
        Some(CustomerFilter::NoSubscription) => {
            sql.push_str(
                " AND NOT EXISTS (SELECT 1 FROM customer_subscriptions s WHERE s.customer_id = c.id)",
            );
        }
        Some(CustomerFilter::PersonalTraining) => {
            sql.push_str(&format!(" AND {TRAINER_SUPPORT_SQL}"));
            binds_now += 1;
        }
        None => {}
    }

    let search = search.map(str::trim).filter(|s| !s.is_empty());
    if search.is_some() {
        sql.push_str(
            " AND (u.username LIKE ? OR u.first_name LIKE ? OR u.last_name LIKE ? OR u.email LIKE ?)",
        );
    }
    sql.push_str(" ORDER BY c.created_at DESC, c.id DESC");

    let mut query = sqlx::query_as::<_, DbCustomer>(&sql);
    for _ in 0..binds_now {
        query = query.bind(now);
    }
    if let Some(term) = search {
        let pattern = like_pattern(term);
        for _ in 0..4 {
            query = query.bind(pattern.clone());
        }
    }

    let rows = query.fetch_all(pool).await?;
    Ok(rows.into_iter().map(Customer::from).collect())
}

#[instrument]
pub async fn get_trainer(pool: &Pool<Sqlite>, trainer_id: i64) -> Result<Trainer, AppError> {
    info!("Fetching trainer");
    let row = sqlx::query_as::<_, DbTrainer>(&format!("{TRAINER_SELECT} WHERE t.id = ?"))
        .bind(trainer_id)
        .fetch_optional(pool)
        .await?;

    row.map(Trainer::from)
        .ok_or_else(|| AppError::NotFound(format!("Trainer {} not found", trainer_id)))
}

#[instrument]
pub async fn get_trainer_by_user_id(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Option<Trainer>, AppError> {
    let row = sqlx::query_as::<_, DbTrainer>(&format!("{TRAINER_SELECT} WHERE t.user_id = ?"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(Trainer::from))
}

#[instrument]
pub async fn list_trainers(
    pool: &Pool<Sqlite>,
    verified: Option<bool>,
) -> Result<Vec<Trainer>, AppError> {
    info!("Listing trainers");
    let rows = match verified {
        Some(verified) => {
            sqlx::query_as::<_, DbTrainer>(&format!(
                "{TRAINER_SELECT} WHERE t.is_verified = ? ORDER BY t.id"
            ))
            .bind(verified)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, DbTrainer>(&format!("{TRAINER_SELECT} ORDER BY t.id"))
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows.into_iter().map(Trainer::from).collect())
}

#[instrument]
pub async fn set_trainer_verified(
    pool: &Pool<Sqlite>,
    trainer_id: i64,
    verified: bool,
) -> Result<(), AppError> {
    info!("Setting trainer verification");
    let result = sqlx::query("UPDATE trainers SET is_verified = ?, updated_at = ? WHERE id = ?")
        .bind(verified)
        .bind(Utc::now().naive_utc())
        .bind(trainer_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Trainer {} not found", trainer_id)));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct TrainerProfileUpdate {
    pub address: String,
    pub bio: String,
    pub specializations: String,
    pub experience_years: i64,
    pub hourly_rate_cents: Option<i64>,
}

#[instrument(skip(update))]
pub async fn update_trainer_profile(
    pool: &Pool<Sqlite>,
    trainer_id: i64,
    update: &TrainerProfileUpdate,
) -> Result<(), AppError> {
    info!("Updating trainer profile");
    sqlx::query(
        "UPDATE trainers SET address = ?, bio = ?, specializations = ?, experience_years = ?,
             hourly_rate_cents = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&update.address)
    .bind(&update.bio)
    .bind(&update.specializations)
    .bind(update.experience_years)
    .bind(update.hourly_rate_cents)
    .bind(Utc::now().naive_utc())
    .bind(trainer_id)
    .execute(pool)
    .await?;

    Ok(())
}
