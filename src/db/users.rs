use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::{DbUser, Role, User};
use crate::error::AppError;

const USER_COLUMNS: &str =
    "id, username, email, role, first_name, last_name, phone, created_at";

fn bcrypt_cost() -> u32 {
    if cfg!(test) { 4 } else { bcrypt::DEFAULT_COST }
}

#[instrument(skip_all)]
pub fn hash_password(password: &str) -> Result<String, AppError> {
    Ok(bcrypt::hash(password, bcrypt_cost())?)
}

/// Everything needed to open an account. The matching customer or trainer row is
/// created alongside the user.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
    pub trainer_verified: bool,
}

#[instrument(skip_all, fields(username = %account.username, role = %role))]
pub async fn create_account(
    pool: &Pool<Sqlite>,
    account: &NewAccount,
    role: Role,
) -> Result<i64, AppError> {
    info!("Creating account");
    let now = Utc::now().naive_utc();
    let mut tx = pool.begin().await?;

    let user_id = sqlx::query(
        "INSERT INTO users (username, email, password, role, first_name, last_name, phone, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&account.username)
    .bind(&account.email)
    .bind(&account.password_hash)
    .bind(role.as_str())
    .bind(&account.first_name)
    .bind(&account.last_name)
    .bind(&account.phone)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    match role {
        Role::Customer => {
            sqlx::query("INSERT INTO customers (user_id, created_at, updated_at) VALUES (?, ?, ?)")
                .bind(user_id)
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }
        Role::Trainer => {
            sqlx::query(
                "INSERT INTO trainers (user_id, address, is_verified, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(&account.address)
            .bind(account.trainer_verified)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        Role::Admin => {}
    }

    tx.commit().await?;
    Ok(user_id)
}

#[instrument(skip_all, fields(username, role = %role))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    username: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<i64, AppError> {
    info!("Creating user");
    let account = NewAccount {
        username: username.to_string(),
        email: email.to_string(),
        password_hash: hash_password(password)?,
        ..Default::default()
    };
    create_account(pool, &account, role).await
}

#[instrument]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(user) => Ok(User::from(user)),
        _ => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument]
pub async fn username_exists(pool: &Pool<Sqlite>, username: &str) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

#[instrument]
pub async fn email_exists(pool: &Pool<Sqlite>, email: &str) -> Result<bool, AppError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE lower(email) = lower(?) AND email != ''")
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

#[instrument(skip_all, fields(username))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    info!("Authenticating user");
    let stored: Option<(i64, String)> =
        sqlx::query_as("SELECT id, password FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

    match stored {
        Some((id, hash)) => match bcrypt::verify(password, &hash) {
            Ok(true) => Ok(Some(get_user(pool, id).await?)),
            _ => Ok(None),
        },
        None => Ok(None),
    }
}

#[instrument(skip_all, fields(user_id))]
pub async fn verify_user_password(
    pool: &Pool<Sqlite>,
    user_id: i64,
    password: &str,
) -> Result<bool, AppError> {
    let hash: Option<String> = sqlx::query_scalar("SELECT password FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(hash
        .map(|hash| bcrypt::verify(password, &hash).unwrap_or(false))
        .unwrap_or(false))
}

#[instrument(skip_all, fields(user_id))]
pub async fn update_user_password(
    pool: &Pool<Sqlite>,
    user_id: i64,
    new_password: &str,
) -> Result<(), AppError> {
    info!("Updating user password");
    let hashed_password = hash_password(new_password)?;

    sqlx::query("UPDATE users SET password = ?, updated_at = ? WHERE id = ?")
        .bind(hashed_password)
        .bind(Utc::now().naive_utc())
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument]
pub async fn update_user_details(
    pool: &Pool<Sqlite>,
    user_id: i64,
    first_name: &str,
    last_name: &str,
    email: &str,
    phone: &str,
) -> Result<(), AppError> {
    info!("Updating user details");
    sqlx::query(
        "UPDATE users SET first_name = ?, last_name = ?, email = ?, phone = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(phone)
    .bind(Utc::now().naive_utc())
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Removes the user; profile rows and everything hanging off them cascade.
#[instrument]
pub async fn delete_user(pool: &Pool<Sqlite>, user_id: i64) -> Result<(), AppError> {
    info!("Deleting user");
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }
    Ok(())
}
