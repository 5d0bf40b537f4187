use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{cents_to_amount, utc, utc_opt};

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionPlan {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(skip)]
    pub price_cents: i64,
    pub duration_days: i64,
    pub features: serde_json::Value,
    pub is_active: bool,
    pub is_featured: bool,
    pub trial_days: i64,
    pub workout_videos: bool,
    pub meal_plans: bool,
    pub trainer_support: bool,
    pub progress_tracking: bool,
    pub live_sessions: bool,
    pub personal_sessions: bool,
    pub nutrition_guidance: bool,
    pub premium_content: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbSubscriptionPlan {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub duration_days: Option<i64>,
    pub features: Option<String>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub trial_days: Option<i64>,
    pub workout_videos: Option<bool>,
    pub meal_plans: Option<bool>,
    pub trainer_support: Option<bool>,
    pub progress_tracking: Option<bool>,
    pub live_sessions: Option<bool>,
    pub personal_sessions: Option<bool>,
    pub nutrition_guidance: Option<bool>,
    pub premium_content: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbSubscriptionPlan> for SubscriptionPlan {
    fn from(db: DbSubscriptionPlan) -> Self {
        let price_cents = db.price_cents.unwrap_or_default();
        Self {
            id: db.id.unwrap_or_default(),
            name: db.name.unwrap_or_default(),
            description: db.description.unwrap_or_default(),
            price: cents_to_amount(price_cents),
            price_cents,
            duration_days: db.duration_days.unwrap_or_default(),
            features: db
                .features
                .and_then(|f| serde_json::from_str(&f).ok())
                .unwrap_or_else(|| serde_json::json!({})),
            is_active: db.is_active.unwrap_or_default(),
            is_featured: db.is_featured.unwrap_or_default(),
            trial_days: db.trial_days.unwrap_or_default(),
            workout_videos: db.workout_videos.unwrap_or_default(),
            meal_plans: db.meal_plans.unwrap_or_default(),
            trainer_support: db.trainer_support.unwrap_or_default(),
            progress_tracking: db.progress_tracking.unwrap_or_default(),
            live_sessions: db.live_sessions.unwrap_or_default(),
            personal_sessions: db.personal_sessions.unwrap_or_default(),
            nutrition_guidance: db.nutrition_guidance.unwrap_or_default(),
            premium_content: db.premium_content.unwrap_or_default(),
            created_at: utc(db.created_at),
        }
    }
}

impl SubscriptionPlan {
    /// Price normalised to a 30 day month. Plans without a duration have none.
    pub fn monthly_equivalent(&self) -> f64 {
        if self.duration_days <= 0 {
            return 0.0;
        }
        let monthly = self.price * 30.0 / self.duration_days as f64;
        (monthly * 100.0).round() / 100.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerSubscription {
    pub id: i64,
    pub customer_id: i64,
    pub plan_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub auto_renew: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbCustomerSubscription {
    pub id: Option<i64>,
    pub customer_id: Option<i64>,
    pub plan_id: Option<i64>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub is_active: Option<bool>,
    pub auto_renew: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbCustomerSubscription> for CustomerSubscription {
    fn from(db: DbCustomerSubscription) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            customer_id: db.customer_id.unwrap_or_default(),
            plan_id: db.plan_id.unwrap_or_default(),
            start_date: utc(db.start_date),
            end_date: utc_opt(db.end_date),
            is_active: db.is_active.unwrap_or_default(),
            auto_renew: db.auto_renew.unwrap_or_default(),
            created_at: utc(db.created_at),
        }
    }
}

/// End of a subscription that starts at `start`. A zero-length plan never ends.
pub fn subscription_end_date(start: DateTime<Utc>, duration_days: i64) -> Option<DateTime<Utc>> {
    if duration_days > 0 {
        Some(start + Duration::days(duration_days))
    } else {
        None
    }
}

impl CustomerSubscription {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.end_date {
            Some(end) => now > end,
            None => false,
        }
    }

    /// Whole days left, clamped at zero. `None` means the subscription is unlimited.
    pub fn days_remaining_at(&self, now: DateTime<Utc>) -> Option<i64> {
        self.end_date.map(|end| (end - now).num_days().max(0))
    }

    /// Active and not past its end date.
    pub fn is_current_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired_at(now)
    }

    /// Applied before every write: an expired subscription can't stay active.
    pub fn normalize_at(&mut self, now: DateTime<Utc>) {
        if self.is_expired_at(now) {
            self.is_active = false;
        }
    }

    pub fn extend_at(&mut self, days: i64, now: DateTime<Utc>) {
        self.end_date = Some(match self.end_date {
            Some(end) => end + Duration::days(days),
            None => now + Duration::days(days),
        });
        self.is_active = true;
        self.normalize_at(now);
    }

    pub fn cancel(&mut self) {
        self.is_active = false;
        self.auto_renew = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Paypal,
    Bank,
    Stripe,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Bank => "bank",
            PaymentMethod::Stripe => "stripe",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(PaymentMethod::Card),
            "paypal" => Ok(PaymentMethod::Paypal),
            "bank" => Ok(PaymentMethod::Bank),
            "stripe" => Ok(PaymentMethod::Stripe),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: i64,
    pub customer_id: i64,
    pub subscription_id: Option<i64>,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: String,
    pub payment_date: DateTime<Utc>,
    pub notes: String,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbPayment {
    pub id: Option<i64>,
    pub customer_id: Option<i64>,
    pub subscription_id: Option<i64>,
    pub amount_cents: Option<i64>,
    pub payment_method: Option<String>,
    pub status: Option<String>,
    pub transaction_id: Option<String>,
    pub payment_date: Option<NaiveDateTime>,
    pub notes: Option<String>,
}

impl From<DbPayment> for Payment {
    fn from(db: DbPayment) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            customer_id: db.customer_id.unwrap_or_default(),
            subscription_id: db.subscription_id,
            amount: cents_to_amount(db.amount_cents.unwrap_or_default()),
            payment_method: db
                .payment_method
                .and_then(|m| m.parse().ok())
                .unwrap_or_default(),
            status: db.status.and_then(|s| s.parse().ok()).unwrap_or_default(),
            transaction_id: db.transaction_id.unwrap_or_default(),
            payment_date: utc(db.payment_date),
            notes: db.notes.unwrap_or_default(),
        }
    }
}

/// `TXN_<timestamp>_<customer>_<nonce>`; the nonce keeps same-second payments unique.
pub fn generate_transaction_id(now: DateTime<Utc>, customer_id: i64) -> String {
    let nonce: u32 = rand::rng().random_range(100000..=999999);
    format!(
        "TXN_{}_{}_{}",
        now.format("%Y%m%d%H%M%S"),
        customer_id,
        nonce
    )
}
