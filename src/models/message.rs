use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{display_name, utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Subscription,
    Session,
    Message,
    Payment,
    #[default]
    General,
    Trainer,
    Goal,
    Progress,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Subscription => "subscription",
            NotificationType::Session => "session",
            NotificationType::Message => "message",
            NotificationType::Payment => "payment",
            NotificationType::General => "general",
            NotificationType::Trainer => "trainer",
            NotificationType::Goal => "goal",
            NotificationType::Progress => "progress",
        }
    }
}

impl FromStr for NotificationType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscription" => Ok(NotificationType::Subscription),
            "session" => Ok(NotificationType::Session),
            "message" => Ok(NotificationType::Message),
            "payment" => Ok(NotificationType::Payment),
            "general" => Ok(NotificationType::General),
            "trainer" => Ok(NotificationType::Trainer),
            "goal" => Ok(NotificationType::Goal),
            "progress" => Ok(NotificationType::Progress),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: i64,
    pub customer_id: i64,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbNotification {
    pub id: Option<i64>,
    pub customer_id: Option<i64>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub notification_type: Option<String>,
    pub is_read: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbNotification> for Notification {
    fn from(db: DbNotification) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            customer_id: db.customer_id.unwrap_or_default(),
            title: db.title.unwrap_or_default(),
            message: db.message.unwrap_or_default(),
            notification_type: db
                .notification_type
                .and_then(|t| t.parse().ok())
                .unwrap_or_default(),
            is_read: db.is_read.unwrap_or_default(),
            created_at: utc(db.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainerMessage {
    pub id: i64,
    pub customer_id: i64,
    pub trainer_id: i64,
    pub customer_name: String,
    pub trainer_name: String,
    pub subject: String,
    pub message: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbTrainerMessage {
    pub id: Option<i64>,
    pub customer_id: Option<i64>,
    pub trainer_id: Option<i64>,
    pub customer_username: Option<String>,
    pub customer_first_name: Option<String>,
    pub customer_last_name: Option<String>,
    pub trainer_username: Option<String>,
    pub trainer_first_name: Option<String>,
    pub trainer_last_name: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub content: Option<String>,
    pub is_read: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbTrainerMessage> for TrainerMessage {
    fn from(db: DbTrainerMessage) -> Self {
        let message = db.message.unwrap_or_default();
        let content = db
            .content
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| message.clone());
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
            subject: db.subject.unwrap_or_default(),
            message,
            content,
            is_read: db.is_read.unwrap_or_default(),
            created_at: utc(db.created_at),
        }
    }
}

/// Unread/total style counters shown next to message and notification lists.
#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
pub struct InboxCounts {
    pub total: i64,
    pub unread: i64,
    pub today: i64,
    pub this_week: i64,
}
