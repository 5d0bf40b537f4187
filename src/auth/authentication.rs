use rocket::Request;
use rocket::http::Status;
use rocket::outcome::try_outcome;
use rocket::request::{FromRequest, Outcome};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::db::{get_customer_by_user_id, get_session_by_token, get_trainer_by_user_id, get_user};
use crate::models::{Customer, Trainer};

use super::{Permission, Role, User};

pub const SESSION_COOKIE: &str = "session_token";

fn pool<'r>(request: &'r Request<'_>) -> Option<&'r SqlitePool> {
    let pool = request.rocket().state::<SqlitePool>();
    if pool.is_none() {
        tracing::error!("Database pool not found in managed state");
    }
    pool
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_span = tracing::info_span!("user_auth_guard");
        let _guard = auth_span.enter();

        let token = request
            .cookies()
            .get_private(SESSION_COOKIE)
            .map(|c| c.value().to_string());

        let Some(token) = token else {
            return Outcome::Error((Status::Unauthorized, ()));
        };

        let Some(db) = pool(request) else {
            return Outcome::Error((Status::InternalServerError, ()));
        };

        match get_session_by_token(db, &token).await {
            Ok(session) => {
                if !session.is_valid() {
                    tracing::warn!("Session token expired");
                    return Outcome::Error((Status::Unauthorized, ()));
                }

                match get_user(db, session.user_id).await {
                    Ok(user) => {
                        tracing::info!(username = %user.username, role = %user.role.as_str(), "User authenticated via session token");
                        Outcome::Success(user)
                    }
                    Err(err) => {
                        tracing::warn!(user_id = %session.user_id, error = ?err, "Session points at a missing user");
                        Outcome::Error((Status::Unauthorized, ()))
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = ?err, "Invalid session token");
                Outcome::Error((Status::Unauthorized, ()))
            }
        }
    }
}

/// A logged-in customer together with their customer profile.
pub struct CustomerUser {
    pub user: User,
    pub customer: Customer,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CustomerUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let user = try_outcome!(request.guard::<User>().await);

        if user.require_permission(Permission::ViewCustomerDashboard).is_err() {
            return Outcome::Error((Status::Forbidden, ()));
        }

        let Some(db) = pool(request) else {
            return Outcome::Error((Status::InternalServerError, ()));
        };

        match get_customer_by_user_id(db, user.id).await {
            Ok(Some(customer)) => Outcome::Success(CustomerUser { user, customer }),
            Ok(None) => {
                tracing::warn!(username = %user.username, "Customer profile not found");
                Outcome::Error((Status::Forbidden, ()))
            }
            Err(err) => {
                err.log_and_record("Customer guard");
                Outcome::Error((Status::InternalServerError, ()))
            }
        }
    }
}

/// A logged-in trainer whose account an admin has verified.
pub struct TrainerUser {
    pub user: User,
    pub trainer: Trainer,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for TrainerUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let user = try_outcome!(request.guard::<User>().await);

        if user.require_permission(Permission::ViewTrainerDashboard).is_err() {
            return Outcome::Error((Status::Forbidden, ()));
        }

        let Some(db) = pool(request) else {
            return Outcome::Error((Status::InternalServerError, ()));
        };

        match get_trainer_by_user_id(db, user.id).await {
            Ok(Some(trainer)) if trainer.is_verified => {
                Outcome::Success(TrainerUser { user, trainer })
            }
            Ok(Some(_)) => {
                tracing::warn!(username = %user.username, "Trainer is not verified");
                Outcome::Error((Status::Forbidden, ()))
            }
            Ok(None) => {
                tracing::warn!(username = %user.username, "Trainer profile not found");
                Outcome::Error((Status::Forbidden, ()))
            }
            Err(err) => {
                err.log_and_record("Trainer guard");
                Outcome::Error((Status::InternalServerError, ()))
            }
        }
    }
}

pub struct AdminUser {
    pub user: User,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let user = try_outcome!(request.guard::<User>().await);

        if user.role != Role::Admin {
            tracing::warn!(username = %user.username, role = %user.role.as_str(), "Admin access denied");
            return Outcome::Error((Status::Forbidden, ()));
        }

        Outcome::Success(AdminUser { user })
    }
}

#[catch(401)]
pub fn unauthorized_api(_req: &Request) -> Custom<Json<Value>> {
    let error_json = json!({
        "error": "Unauthorized",
        "message": "Authentication required"
    });

    Custom(Status::Unauthorized, Json(error_json))
}

#[catch(403)]
pub fn forbidden_api(_req: &Request) -> Custom<Json<Value>> {
    tracing::warn!("Forbidden access attempt");
    let error_json = json!({
        "error": "Forbidden",
        "message": "You don't have permission to access this page"
    });

    Custom(Status::Forbidden, Json(error_json))
}
