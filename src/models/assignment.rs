use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use super::{display_name, utc, utc_opt};

#[derive(Debug, Clone, Serialize)]
pub struct TrainerAssignment {
    pub id: i64,
    pub customer_id: i64,
    pub trainer_id: i64,
    pub customer_name: String,
    pub trainer_name: String,
    pub assigned_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub notes: String,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbTrainerAssignment {
    pub id: Option<i64>,
    pub customer_id: Option<i64>,
    pub trainer_id: Option<i64>,
    pub customer_username: Option<String>,
    pub customer_first_name: Option<String>,
    pub customer_last_name: Option<String>,
    pub trainer_username: Option<String>,
    pub trainer_first_name: Option<String>,
    pub trainer_last_name: Option<String>,
    pub assigned_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub is_active: Option<bool>,
    pub notes: Option<String>,
}

impl From<DbTrainerAssignment> for TrainerAssignment {
    fn from(db: DbTrainerAssignment) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            customer_id: db.customer_id.unwrap_or_default(),
            trainer_id: db.trainer_id.unwrap_or_default(),
            customer_name: display_name(
                &db.customer_first_name.unwrap_or_default(),
                &db.customer_last_name.unwrap_or_default(),
                &db.customer_username.unwrap_or_default(),
            ),
            trainer_name: display_name(
                &db.trainer_first_name.unwrap_or_default(),
                &db.trainer_last_name.unwrap_or_default(),
                &db.trainer_username.unwrap_or_default(),
            ),
            assigned_date: utc(db.assigned_date),
            end_date: utc_opt(db.end_date),
            is_active: db.is_active.unwrap_or_default(),
            notes: db.notes.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Availability {
    High,
    Medium,
    Low,
}

impl Availability {
    pub fn for_client_count(count: i64) -> Self {
        match count {
            c if c < 5 => Availability::High,
            c if c < 10 => Availability::Medium,
            _ => Availability::Low,
        }
    }
}

/// A verified trainer and the number of customers actively assigned to them.
#[derive(Debug, Clone, Serialize)]
pub struct TrainerWorkload {
    pub trainer_id: i64,
    pub trainer_name: String,
    pub email: String,
    pub active_clients: i64,
    pub availability: Availability,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbTrainerWorkload {
    pub trainer_id: Option<i64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub active_clients: Option<i64>,
}

impl From<DbTrainerWorkload> for TrainerWorkload {
    fn from(db: DbTrainerWorkload) -> Self {
        let active_clients = db.active_clients.unwrap_or_default();
        Self {
            trainer_id: db.trainer_id.unwrap_or_default(),
            trainer_name: display_name(
                &db.first_name.unwrap_or_default(),
                &db.last_name.unwrap_or_default(),
                &db.username.unwrap_or_default(),
            ),
            email: db.email.unwrap_or_default(),
            active_clients,
            availability: Availability::for_client_count(active_clients),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_thresholds() {
        assert_eq!(Availability::for_client_count(0), Availability::High);
        assert_eq!(Availability::for_client_count(4), Availability::High);
        assert_eq!(Availability::for_client_count(5), Availability::Medium);
        assert_eq!(Availability::for_client_count(9), Availability::Medium);
        assert_eq!(Availability::for_client_count(10), Availability::Low);
    }
}
