use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{cents_to_amount, utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
            Gender::Other => "O",
        }
    }
}

impl FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Gender::Male),
            "F" => Ok(Gender::Female),
            "O" => Ok(Gender::Other),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitnessLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl FitnessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitnessLevel::Beginner => "beginner",
            FitnessLevel::Intermediate => "intermediate",
            FitnessLevel::Advanced => "advanced",
        }
    }
}

impl FromStr for FitnessLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(FitnessLevel::Beginner),
            "intermediate" => Ok(FitnessLevel::Intermediate),
            "advanced" => Ok(FitnessLevel::Advanced),
            _ => Err(()),
        }
    }
}

/// A customer's fitness profile joined with the owning user's identity fields.
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub fitness_level: FitnessLevel,
    pub fitness_goals: String,
    pub medical_conditions: String,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbCustomer {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub fitness_level: Option<String>,
    pub fitness_goals: Option<String>,
    pub medical_conditions: Option<String>,
    pub created_at: Option<chrono::NaiveDateTime>,
}

impl From<DbCustomer> for Customer {
    fn from(db: DbCustomer) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            user_id: db.user_id.unwrap_or_default(),
            username: db.username.unwrap_or_default(),
            email: db.email.unwrap_or_default(),
            first_name: db.first_name.unwrap_or_default(),
            last_name: db.last_name.unwrap_or_default(),
            phone: db.phone.unwrap_or_default(),
            date_of_birth: db.date_of_birth,
            gender: db.gender.and_then(|g| g.parse().ok()),
            height: db.height,
            weight: db.weight,
            fitness_level: db
                .fitness_level
                .and_then(|l| l.parse().ok())
                .unwrap_or_default(),
            fitness_goals: db.fitness_goals.unwrap_or_default(),
            medical_conditions: db.medical_conditions.unwrap_or_default(),
            created_at: utc(db.created_at),
        }
    }
}

impl Customer {
    pub fn full_name(&self) -> String {
        display_name(&self.first_name, &self.last_name, &self.username)
    }

    /// BMI from height in centimetres and weight in kilograms.
    pub fn bmi(&self) -> Option<f64> {
        match (self.height, self.weight) {
            (Some(height), Some(weight)) if height > 0.0 => {
                let metres = height / 100.0;
                Some(((weight / (metres * metres)) * 10.0).round() / 10.0)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Trainer {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
    pub is_verified: bool,
    pub bio: String,
    pub specializations: String,
    pub experience_years: i64,
    pub hourly_rate: Option<f64>,
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbTrainer {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_verified: Option<bool>,
    pub bio: Option<String>,
    pub specializations: Option<String>,
    pub experience_years: Option<i64>,
    pub hourly_rate_cents: Option<i64>,
    pub average_rating: Option<f64>,
    pub created_at: Option<chrono::NaiveDateTime>,
}

impl From<DbTrainer> for Trainer {
    fn from(db: DbTrainer) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            user_id: db.user_id.unwrap_or_default(),
            username: db.username.unwrap_or_default(),
            email: db.email.unwrap_or_default(),
            first_name: db.first_name.unwrap_or_default(),
            last_name: db.last_name.unwrap_or_default(),
            phone: db.phone.unwrap_or_default(),
            address: db.address.unwrap_or_default(),
            is_verified: db.is_verified.unwrap_or_default(),
            bio: db.bio.unwrap_or_default(),
            specializations: db.specializations.unwrap_or_default(),
            experience_years: db.experience_years.unwrap_or_default(),
            hourly_rate: db.hourly_rate_cents.map(cents_to_amount),
            average_rating: db.average_rating.unwrap_or_default(),
            created_at: utc(db.created_at),
        }
    }
}

impl Trainer {
    pub fn full_name(&self) -> String {
        display_name(&self.first_name, &self.last_name, &self.username)
    }
}

/// "First Last", falling back to the username when both names are blank.
pub fn display_name(first_name: &str, last_name: &str, username: &str) -> String {
    let full = format!("{} {}", first_name.trim(), last_name.trim());
    let full = full.trim();
    if full.is_empty() {
        username.to_string()
    } else {
        full.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_username() {
        assert_eq!(display_name("Ana", "Silva", "ana"), "Ana Silva");
        assert_eq!(display_name("Ana", "", "ana"), "Ana");
        assert_eq!(display_name(" ", "", "ana"), "ana");
    }

    #[test]
    fn test_bmi_requires_height_and_weight() {
        let mut customer = Customer::from(DbCustomer::default());
        assert_eq!(customer.bmi(), None);

        customer.height = Some(180.0);
        customer.weight = Some(81.0);
        assert_eq!(customer.bmi(), Some(25.0));
    }

    #[test]
    fn test_unknown_enum_values_fall_back() {
        let customer = Customer::from(DbCustomer {
            gender: Some("X".to_string()),
            fitness_level: Some("elite".to_string()),
            ..Default::default()
        });
        assert_eq!(customer.gender, None);
        assert_eq!(customer.fitness_level, FitnessLevel::Beginner);
    }
}
