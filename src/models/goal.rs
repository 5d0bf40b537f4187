use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{utc, utc_opt};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Paused,
    Cancelled,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Paused => "paused",
            GoalStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: GoalStatus) -> bool {
        matches!(
            (self, next),
            (GoalStatus::Active, GoalStatus::Completed)
                | (GoalStatus::Active, GoalStatus::Paused)
                | (GoalStatus::Active, GoalStatus::Cancelled)
                | (GoalStatus::Paused, GoalStatus::Active)
                | (GoalStatus::Paused, GoalStatus::Cancelled)
        )
    }
}

impl FromStr for GoalStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(GoalStatus::Active),
            "completed" => Ok(GoalStatus::Completed),
            "paused" => Ok(GoalStatus::Paused),
            "cancelled" => Ok(GoalStatus::Cancelled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    WeightLoss,
    WeightGain,
    MuscleGain,
    Endurance,
    Strength,
    Flexibility,
    #[default]
    Other,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::WeightLoss => "weight_loss",
            GoalType::WeightGain => "weight_gain",
            GoalType::MuscleGain => "muscle_gain",
            GoalType::Endurance => "endurance",
            GoalType::Strength => "strength",
            GoalType::Flexibility => "flexibility",
            GoalType::Other => "other",
        }
    }
}

impl FromStr for GoalType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weight_loss" => Ok(GoalType::WeightLoss),
            "weight_gain" => Ok(GoalType::WeightGain),
            "muscle_gain" => Ok(GoalType::MuscleGain),
            "endurance" => Ok(GoalType::Endurance),
            "strength" => Ok(GoalType::Strength),
            "flexibility" => Ok(GoalType::Flexibility),
            "other" => Ok(GoalType::Other),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Goal {
    pub id: i64,
    pub customer_id: i64,
    pub title: String,
    pub description: String,
    pub goal_type: GoalType,
    pub target_value: Option<f64>,
    pub current_value: f64,
    pub unit: String,
    pub target_date: Option<NaiveDate>,
    pub status: GoalStatus,
    pub is_active: bool,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbGoal {
    pub id: Option<i64>,
    pub customer_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub goal_type: Option<String>,
    pub target_value: Option<f64>,
    pub current_value: Option<f64>,
    pub unit: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub is_active: Option<bool>,
    pub is_completed: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
}

impl From<DbGoal> for Goal {
    fn from(db: DbGoal) -> Self {
        let mut goal = Self {
            id: db.id.unwrap_or_default(),
            customer_id: db.customer_id.unwrap_or_default(),
            title: db.title.unwrap_or_default(),
            description: db.description.unwrap_or_default(),
            goal_type: db
                .goal_type
                .and_then(|t| t.parse().ok())
                .unwrap_or_default(),
            target_value: db.target_value,
            current_value: db.current_value.unwrap_or_default(),
            unit: db.unit.unwrap_or_default(),
            target_date: db.target_date,
            status: db.status.and_then(|s| s.parse().ok()).unwrap_or_default(),
            is_active: db.is_active.unwrap_or_default(),
            is_completed: db.is_completed.unwrap_or_default(),
            created_at: utc(db.created_at),
            completed_at: utc_opt(db.completed_at),
        };
        goal.sync_flags();
        goal
    }
}

impl Goal {
    /// Keeps the legacy boolean columns in step with `status`. Called before every write.
    pub fn sync_flags(&mut self) {
        self.is_active = self.status == GoalStatus::Active;
        self.is_completed = self.status == GoalStatus::Completed;
    }

    pub fn progress_percentage(&self) -> f64 {
        match self.target_value {
            Some(target) if target > 0.0 => (self.current_value / target * 100.0).min(100.0),
            _ => 0.0,
        }
    }

    pub fn transition_to(&mut self, next: GoalStatus, now: DateTime<Utc>) -> Result<(), AppError> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::Validation(format!(
                "Cannot change goal from {} to {}",
                self.status.as_str(),
                next.as_str()
            )));
        }

        self.status = next;
        if next == GoalStatus::Completed {
            self.completed_at = Some(now);
        }
        self.sync_flags();
        Ok(())
    }

    /// Records a new current value. Returns true when this update reached the target
    /// and completed the goal.
    pub fn record_progress(&mut self, value: f64, now: DateTime<Utc>) -> Result<bool, AppError> {
        if self.status != GoalStatus::Active {
            return Err(AppError::Validation(
                "Progress can only be recorded on active goals".to_string(),
            ));
        }

        self.current_value = value;
        match self.target_value {
            Some(target) if value >= target => {
                self.transition_to(GoalStatus::Completed, now)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(target: Option<f64>) -> Goal {
        Goal::from(DbGoal {
            title: Some("Run 10k".to_string()),
            target_value: target,
            status: Some("active".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_flags_mirror_status_on_load() {
        let goal = Goal::from(DbGoal {
            status: Some("completed".to_string()),
            is_active: Some(true),
            is_completed: Some(false),
            ..Default::default()
        });
        assert!(!goal.is_active);
        assert!(goal.is_completed);
    }

    #[test]
    fn test_allowed_transitions() {
        let now = Utc::now();
        let mut g = goal(None);

        g.transition_to(GoalStatus::Paused, now).unwrap();
        assert!(!g.is_active && !g.is_completed);

        g.transition_to(GoalStatus::Active, now).unwrap();
        assert!(g.is_active);

        g.transition_to(GoalStatus::Completed, now).unwrap();
        assert!(g.is_completed && !g.is_active);
        assert_eq!(g.completed_at, Some(now));
    }

    #[test]
    fn test_terminal_states_reject_changes() {
        let now = Utc::now();
        let mut g = goal(None);
        g.transition_to(GoalStatus::Cancelled, now).unwrap();

        assert!(g.transition_to(GoalStatus::Active, now).is_err());
        assert!(g.transition_to(GoalStatus::Completed, now).is_err());
        assert_eq!(g.status, GoalStatus::Cancelled);

        assert!(!GoalStatus::Completed.can_transition_to(GoalStatus::Paused));
        assert!(!GoalStatus::Paused.can_transition_to(GoalStatus::Completed));
    }

    #[test]
    fn test_reaching_target_completes_goal() {
        let now = Utc::now();
        let mut g = goal(Some(10.0));

        assert!(!g.record_progress(4.0, now).unwrap());
        assert_eq!(g.progress_percentage(), 40.0);

        assert!(g.record_progress(12.0, now).unwrap());
        assert_eq!(g.status, GoalStatus::Completed);
        assert!(g.is_completed);
        assert_eq!(g.progress_percentage(), 100.0);

        assert!(g.record_progress(13.0, now).is_err());
    }

    #[test]
    fn test_progress_without_target_never_completes() {
        let mut g = goal(None);
        assert!(!g.record_progress(1000.0, Utc::now()).unwrap());
        assert_eq!(g.progress_percentage(), 0.0);
        assert!(g.is_active);
    }
}
