use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::Role;
use crate::error::AppError;
use crate::models::{DbTrainerRegistration, RegistrationStatus, TrainerRegistration};

const REGISTRATION_COLUMNS: &str = "email, username, phone, address, password, status, \
     created_at, updated_at, approved_by, approval_date, rejection_reason, user_id";

#[instrument(skip(password_hash))]
pub async fn create_registration(
    pool: &Pool<Sqlite>,
    username: &str,
    email: &str,
    phone: &str,
    address: &str,
    password_hash: &str,
) -> Result<(), AppError> {
    info!("Creating trainer registration");
    let now = Utc::now().naive_utc();
    sqlx::query(
        "INSERT INTO trainer_registrations (email, username, phone, address, password, status, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, 'pending', ?, ?)",
    )
    .bind(email)
    .bind(username)
    .bind(phone)
    .bind(address)
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(AppError::from)
    .map_err(|e| {
        if e.is_unique_violation() {
            AppError::Conflict("This email is already registered.".to_string())
        } else {
            e
        }
    })?;

    Ok(())
}

#[instrument]
pub async fn get_registration(
    pool: &Pool<Sqlite>,
    email: &str,
) -> Result<Option<TrainerRegistration>, AppError> {
    let row = sqlx::query_as::<_, DbTrainerRegistration>(&format!(
        "SELECT {REGISTRATION_COLUMNS} FROM trainer_registrations WHERE lower(email) = lower(?)"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(TrainerRegistration::from))
}

/// An email is taken if an application or a user account already uses it.
#[instrument]
pub async fn registration_email_taken(pool: &Pool<Sqlite>, email: &str) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT (SELECT COUNT(*) FROM trainer_registrations WHERE lower(email) = lower(?))
              + (SELECT COUNT(*) FROM users WHERE lower(email) = lower(?) AND email != '')",
    )
    .bind(email)
    .bind(email)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

#[instrument]
pub async fn list_registrations(
    pool: &Pool<Sqlite>,
    status: Option<RegistrationStatus>,
) -> Result<Vec<TrainerRegistration>, AppError> {
    let rows = match status {
        Some(status) => {
            sqlx::query_as::<_, DbTrainerRegistration>(&format!(
                "SELECT {REGISTRATION_COLUMNS} FROM trainer_registrations WHERE status = ?
                 ORDER BY created_at DESC"
            ))
            .bind(status.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, DbTrainerRegistration>(&format!(
                "SELECT {REGISTRATION_COLUMNS} FROM trainer_registrations ORDER BY created_at DESC"
            ))
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().map(TrainerRegistration::from).collect())
}

#[instrument]
pub async fn count_pending_registrations(pool: &Pool<Sqlite>) -> Result<i64, AppError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM trainer_registrations WHERE status = 'pending'")
            .fetch_one(pool)
            .await?;
    Ok(count)
}

fn registration_not_found(email: &str) -> AppError {
    AppError::NotFound(format!("Registration for {} not found", email))
}

/// Turns a pending application into a verified trainer account whose username is the
/// applicant's email. Returns the updated registration, carrying the new user id.
#[instrument]
pub async fn approve_registration(
    pool: &Pool<Sqlite>,
    email: &str,
    admin_id: i64,
) -> Result<TrainerRegistration, AppError> {
    info!("Approving trainer registration");
    let registration = get_registration(pool, email)
        .await?
        .ok_or_else(|| registration_not_found(email))?;

    if registration.status == RegistrationStatus::Approved {
        return Err(AppError::Conflict(
            "Registration already approved".to_string(),
        ));
    }

    let (first_name, last_name) = registration.split_name();
    let now = Utc::now().naive_utc();
    let mut tx = pool.begin().await?;

    let user_id = sqlx::query(
        "INSERT INTO users (username, email, password, role, first_name, last_name, phone, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&registration.email)
    .bind(&registration.email)
    .bind(&registration.password_hash)
    .bind(Role::Trainer.as_str())
    .bind(&first_name)
    .bind(&last_name)
    .bind(&registration.phone)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(AppError::from)
    .map_err(|e| {
        if e.is_unique_violation() {
            AppError::Conflict("An account with this email already exists".to_string())
        } else {
            e
        }
    })?
    .last_insert_rowid();

    sqlx::query(
        "INSERT INTO trainers (user_id, address, is_verified, created_at, updated_at)
         VALUES (?, ?, 1, ?, ?)",
    )
    .bind(user_id)
    .bind(&registration.address)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE trainer_registrations
         SET status = 'approved', approved_by = ?, approval_date = ?, user_id = ?,
             rejection_reason = NULL, updated_at = ?
         WHERE email = ?",
    )
    .bind(admin_id)
    .bind(now)
    .bind(user_id)
    .bind(now)
    .bind(&registration.email)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    get_registration(pool, &registration.email)
        .await?
        .ok_or_else(|| registration_not_found(email))
}

#[instrument(skip(reason))]
pub async fn reject_registration(
    pool: &Pool<Sqlite>,
    email: &str,
    admin_id: i64,
    reason: &str,
) -> Result<TrainerRegistration, AppError> {
    info!("Rejecting trainer registration");
    let registration = get_registration(pool, email)
        .await?
        .ok_or_else(|| registration_not_found(email))?;

    if registration.status == RegistrationStatus::Approved {
        return Err(AppError::Conflict(
            "Registration already approved".to_string(),
        ));
    }

    let now = Utc::now().naive_utc();
    sqlx::query(
        "UPDATE trainer_registrations
         SET status = 'rejected', approved_by = ?, rejection_reason = ?, updated_at = ?
         WHERE email = ?",
    )
    .bind(admin_id)
    .bind(reason)
    .bind(now)
    .bind(&registration.email)
    .execute(pool)
    .await?;

    get_registration(pool, &registration.email)
        .await?
        .ok_or_else(|| registration_not_found(email))
}
