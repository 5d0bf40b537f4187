use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{display_name, utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Confirmed => "confirmed",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::NoShow => "no_show",
        }
    }

    /// Statuses that hold a trainer's time slot.
    pub fn occupies_slot(&self) -> bool {
        matches!(self, SessionStatus::Scheduled | SessionStatus::Confirmed)
    }

    /// Statuses a trainer may set from the session status endpoint.
    pub fn is_trainer_settable(&self) -> bool {
        !matches!(self, SessionStatus::NoShow)
    }
}

impl FromStr for SessionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(SessionStatus::Scheduled),
            "confirmed" => Ok(SessionStatus::Confirmed),
            "completed" => Ok(SessionStatus::Completed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            "no_show" => Ok(SessionStatus::NoShow),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    #[default]
    Personal,
    Group,
    Consultation,
    Assessment,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Personal => "personal",
            SessionType::Group => "group",
            SessionType::Consultation => "consultation",
            SessionType::Assessment => "assessment",
        }
    }
}

impl FromStr for SessionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(SessionType::Personal),
            "group" => Ok(SessionType::Group),
            "consultation" => Ok(SessionType::Consultation),
            "assessment" => Ok(SessionType::Assessment),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingSession {
    pub id: i64,
    pub customer_id: i64,
    pub trainer_id: i64,
    pub customer_name: String,
    pub trainer_name: String,
    pub session_date: NaiveDate,
    pub session_time: NaiveTime,
    pub duration_minutes: i64,
    pub session_type: SessionType,
    pub status: SessionStatus,
    pub notes: String,
    pub trainer_notes: String,
    pub is_confirmed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbTrainingSession {
    pub id: Option<i64>,
    pub customer_id: Option<i64>,
    pub trainer_id: Option<i64>,
    pub customer_username: Option<String>,
    pub customer_first_name: Option<String>,
    pub customer_last_name: Option<String>,
    pub trainer_username: Option<String>,
    pub trainer_first_name: Option<String>,
    pub trainer_last_name: Option<String>,
    pub session_date: Option<NaiveDate>,
    pub session_time: Option<NaiveTime>,
    pub duration_minutes: Option<i64>,
    pub session_type: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub trainer_notes: Option<String>,
    pub is_confirmed: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbTrainingSession> for TrainingSession {
    fn from(db: DbTrainingSession) -> Self {
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
            session_date: db.session_date.unwrap_or_default(),
            session_time: db.session_time.unwrap_or_default(),
            duration_minutes: db.duration_minutes.unwrap_or(60),
            session_type: db
                .session_type
                .and_then(|t| t.parse().ok())
                .unwrap_or_default(),
            status: db.status.and_then(|s| s.parse().ok()).unwrap_or_default(),
            notes: db.notes.unwrap_or_default(),
            trainer_notes: db.trainer_notes.unwrap_or_default(),
            is_confirmed: db.is_confirmed.unwrap_or_default(),
            created_at: utc(db.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainerRating {
    pub id: i64,
    pub customer_id: i64,
    pub trainer_id: i64,
    pub rating: i64,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbTrainerRating {
    pub id: Option<i64>,
    pub customer_id: Option<i64>,
    pub trainer_id: Option<i64>,
    pub rating: Option<i64>,
    pub feedback: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<DbTrainerRating> for TrainerRating {
    fn from(db: DbTrainerRating) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            customer_id: db.customer_id.unwrap_or_default(),
            trainer_id: db.trainer_id.unwrap_or_default(),
            rating: db.rating.unwrap_or_default(),
            feedback: db.feedback.unwrap_or_default(),
            created_at: utc(db.created_at),
            updated_at: utc(db.updated_at),
        }
    }
}

/// Percentage of `part` in `whole`, rounded to one decimal; 0 for an empty whole.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    ((part as f64 / whole as f64) * 1000.0).round() / 10.0
}
