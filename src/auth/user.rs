use chrono::{DateTime, NaiveDateTime, Utc};
use rocket::http::Status;
use serde::Serialize;
use uuid::Uuid;

use super::{Permission, Role};
use crate::models::{display_name, utc};

#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbUser {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        Self {
            id: user.id.unwrap_or_default(),
            username: user.username.unwrap_or_default(),
            email: user.email.unwrap_or_default(),
            role: Role::from_str(&user.role.unwrap_or_default()).unwrap_or(Role::Customer),
            first_name: user.first_name.unwrap_or_default(),
            last_name: user.last_name.unwrap_or_default(),
            phone: user.phone.unwrap_or_default(),
            created_at: utc(user.created_at),
        }
    }
}

impl User {
    pub fn full_name(&self) -> String {
        display_name(&self.first_name, &self.last_name, &self.username)
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), Status> {
        if self.role.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(
                username = %self.username,
                role = %self.role.as_str(),
                permission = ?permission,
                "Permission denied"
            );
            Err(Status::Forbidden)
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserSession {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub expires_at: NaiveDateTime,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbUserSession {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub token: Option<String>,
    pub expires_at: Option<NaiveDateTime>,
}

impl From<DbUserSession> for UserSession {
    fn from(session: DbUserSession) -> Self {
        Self {
            id: session.id.unwrap_or_default(),
            user_id: session.user_id.unwrap_or_default(),
            token: session.token.unwrap_or_default(),
            expires_at: session.expires_at.unwrap_or_default(),
        }
    }
}

impl UserSession {
    pub fn generate_token() -> String {
        Uuid::new_v4().simple().to_string()
    }

    pub fn is_valid(&self) -> bool {
        self.expires_at > Utc::now().naive_utc()
    }
}
