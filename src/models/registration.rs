use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{utc, utc_opt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for RegistrationStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RegistrationStatus::Pending),
            "approved" => Ok(RegistrationStatus::Approved),
            "rejected" => Ok(RegistrationStatus::Rejected),
            _ => Err(()),
        }
    }
}

/// A public application to become a trainer, keyed by email.
#[derive(Debug, Clone, Serialize)]
pub struct TrainerRegistration {
    pub email: String,
    pub username: String,
    pub phone: String,
    pub address: String,
    #[serde(skip)]
    pub password_hash: String,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub approved_by: Option<i64>,
    pub approval_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub user_id: Option<i64>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbTrainerRegistration {
    pub email: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub password: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    pub approved_by: Option<i64>,
    pub approval_date: Option<NaiveDateTime>,
    pub rejection_reason: Option<String>,
    pub user_id: Option<i64>,
}

impl From<DbTrainerRegistration> for TrainerRegistration {
    fn from(db: DbTrainerRegistration) -> Self {
        Self {
            email: db.email.unwrap_or_default(),
            username: db.username.unwrap_or_default(),
            phone: db.phone.unwrap_or_default(),
            address: db.address.unwrap_or_default(),
            password_hash: db.password.unwrap_or_default(),
            status: db.status.and_then(|s| s.parse().ok()).unwrap_or_default(),
            created_at: utc(db.created_at),
            updated_at: utc(db.updated_at),
            approved_by: db.approved_by,
            approval_date: utc_opt(db.approval_date),
            rejection_reason: db.rejection_reason,
            user_id: db.user_id,
        }
    }
}

impl TrainerRegistration {
    /// First word of the applicant's name, and the rest joined by spaces.
    pub fn split_name(&self) -> (String, String) {
        let mut parts = self.username.split_whitespace();
        let first = parts.next().unwrap_or_default().to_string();
        let rest = parts.collect::<Vec<_>>().join(" ");
        (first, rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_name() {
        let mut registration = TrainerRegistration::from(DbTrainerRegistration {
            username: Some("Maria  de la Cruz".to_string()),
            ..Default::default()
        });
        assert_eq!(
            registration.split_name(),
            ("Maria".to_string(), "de la Cruz".to_string())
        );

        registration.username = "Sam".to_string();
        assert_eq!(registration.split_name(), ("Sam".to_string(), String::new()));
    }
}
