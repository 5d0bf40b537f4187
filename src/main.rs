#[macro_use]
extern crate rocket;

mod api;
mod assignment;
mod auth;
mod db;
mod env;
mod error;
mod mailer;
mod models;
mod otp;
mod telemetry;
mod validation;
#[cfg(test)]
mod test;

use auth::{Role, forbidden_api, unauthorized_api};
use chrono::Utc;
use db::{clean_expired_sessions, expire_subscriptions};
use env::{AppConfig, load_environment};
use error::AppError;
use mailer::MailService;
use rocket::{Build, Rocket, tokio};
use telemetry::TelemetryFairing;
use telemetry::init_tracing;
use thiserror::Error;

use sqlx::SqlitePool;
use tracing::info;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("{0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

/// Creates the configured admin account on first start.
async fn bootstrap_admin(pool: &SqlitePool, config: &AppConfig) -> Result<(), Error> {
    let Some(admin) = &config.admin else {
        return Ok(());
    };

    if db::username_exists(pool, &admin.username).await? {
        return Ok(());
    }

    db::create_user(pool, &admin.username, &admin.email, &admin.password, Role::Admin).await?;
    info!(username = %admin.username, "Created bootstrap admin account");
    Ok(())
}

async fn run_maintenance(pool: &SqlitePool) {
    match clean_expired_sessions(pool).await {
        Ok(count) if count > 0 => info!("Cleaned up {} expired sessions", count),
        Ok(_) => {}
        Err(e) => error!("Failed to clean expired sessions: {}", e),
    }

    match expire_subscriptions(pool, Utc::now()).await {
        Ok(count) if count > 0 => info!("Deactivated {} lapsed subscriptions", count),
        Ok(_) => {}
        Err(e) => error!("Failed to expire subscriptions: {}", e),
    }
}

#[launch]
async fn rocket() -> _ {
    if let Err(e) = load_environment() {
        eprintln!("Failed to load environment files: {}", e);
    }
    init_tracing();

    let config = AppConfig::from_env();

    let pool = SqlitePool::connect(&config.database_url)
        .await
        .expect("Failed to connect to SQLite database");

    info!("Running database migrations...");
    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        error!("Failed to run migrations: {}", e);
        panic!("Database migration failed: {}", e);
    }

    if let Err(e) = bootstrap_admin(&pool, &config).await {
        error!("Failed to create admin account: {}", e);
    }

    let pool_clone = pool.clone();
    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        loop {
            run_maintenance(&pool_clone).await;
            tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
        }
    });

    let mail = MailService::from_config(&config);
    init_rocket(pool, config, mail).await
}

pub async fn init_rocket(pool: SqlitePool, config: AppConfig, mail: MailService) -> Rocket<Build> {
    info!("Starting fittrack");

    rocket::build()
        .manage(pool)
        .manage(config)
        .manage(mail)
        .mount("/api", api::auth::routes())
        .mount("/api", routes![api::health])
        .mount("/api/customer", api::customer::routes())
        .mount("/api/trainer", api::trainer::routes())
        .mount("/api/admin", api::admin::routes())
        .register("/api", catchers![unauthorized_api, forbidden_api])
        .attach(TelemetryFairing)
}
