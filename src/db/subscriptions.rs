use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{
    CustomerSubscription, DbCustomerSubscription, DbPayment, DbSubscriptionPlan, Payment,
    PaymentMethod, PaymentStatus, SubscriptionPlan, subscription_end_date,
};

const PLAN_COLUMNS: &str = "id, name, description, price_cents, duration_days, features, \
     is_active, is_featured, trial_days, workout_videos, meal_plans, trainer_support, \
     progress_tracking, live_sessions, personal_sessions, nutrition_guidance, premium_content, \
     created_at";

const SUBSCRIPTION_COLUMNS: &str =
    "id, customer_id, plan_id, start_date, end_date, is_active, auto_renew, created_at";

const PAYMENT_COLUMNS: &str = "id, customer_id, subscription_id, amount_cents, payment_method, \
     status, transaction_id, payment_date, notes";

#[instrument]
pub async fn list_active_plans(pool: &Pool<Sqlite>) -> Result<Vec<SubscriptionPlan>, AppError> {
    info!("Listing active plans");
    let rows = sqlx::query_as::<_, DbSubscriptionPlan>(&format!(
        "SELECT {PLAN_COLUMNS} FROM subscription_plans WHERE is_active = 1 ORDER BY price_cents, id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(SubscriptionPlan::from).collect())
}

#[instrument]
pub async fn get_plan(pool: &Pool<Sqlite>, plan_id: i64) -> Result<SubscriptionPlan, AppError> {
    let row = sqlx::query_as::<_, DbSubscriptionPlan>(&format!(
        "SELECT {PLAN_COLUMNS} FROM subscription_plans WHERE id = ?"
    ))
    .bind(plan_id)
    .fetch_optional(pool)
    .await?;

    row.map(SubscriptionPlan::from)
        .ok_or_else(|| AppError::NotFound(format!("Plan {} not found", plan_id)))
}

#[derive(Debug, Clone, Default)]
pub struct NewPlan {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub duration_days: i64,
    pub features: serde_json::Value,
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
}

#[instrument(skip(plan), fields(name = %plan.name))]
pub async fn create_plan(pool: &Pool<Sqlite>, plan: &NewPlan) -> Result<i64, AppError> {
    info!("Creating subscription plan");
    let features = if plan.features.is_null() {
        "{}".to_string()
    } else {
        serde_json::to_string(&plan.features)?
    };

    let res = sqlx::query(
        "INSERT INTO subscription_plans (name, description, price_cents, duration_days, features,
             is_active, is_featured, trial_days, workout_videos, meal_plans, trainer_support,
             progress_tracking, live_sessions, personal_sessions, nutrition_guidance,
             premium_content, created_at)
         VALUES (?, ?, ?, ?, ?, 1, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&plan.name)
    .bind(&plan.description)
    .bind(plan.price_cents)
    .bind(plan.duration_days)
    .bind(features)
    .bind(plan.is_featured)
    .bind(plan.trial_days)
    .bind(plan.workout_videos)
    .bind(plan.meal_plans)
    .bind(plan.trainer_support)
    .bind(plan.progress_tracking)
    .bind(plan.live_sessions)
    .bind(plan.personal_sessions)
    .bind(plan.nutrition_guidance)
    .bind(plan.premium_content)
    .bind(Utc::now().naive_utc())
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn get_subscription(
    pool: &Pool<Sqlite>,
    customer_id: i64,
) -> Result<Option<CustomerSubscription>, AppError> {
    let row = sqlx::query_as::<_, DbCustomerSubscription>(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM customer_subscriptions WHERE customer_id = ?"
    ))
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(CustomerSubscription::from))
}

/// The customer's subscription with its plan, if they have one.
#[instrument]
pub async fn get_subscription_with_plan(
    pool: &Pool<Sqlite>,
    customer_id: i64,
) -> Result<Option<(CustomerSubscription, SubscriptionPlan)>, AppError> {
    match get_subscription(pool, customer_id).await? {
        Some(subscription) => {
            let plan = get_plan(pool, subscription.plan_id).await?;
            Ok(Some((subscription, plan)))
        }
        None => Ok(None),
    }
}

const UPSERT_SUBSCRIPTION_SQL: &str = "INSERT INTO customer_subscriptions
         (customer_id, plan_id, start_date, end_date, is_active, auto_renew, created_at)
     VALUES (?, ?, ?, ?, 1, 1, ?)
     ON CONFLICT (customer_id) DO UPDATE SET
         plan_id = excluded.plan_id,
         start_date = excluded.start_date,
         end_date = excluded.end_date,
         is_active = 1,
         auto_renew = 1
     RETURNING id";

fn upsert_subscription<'q>(
    customer_id: i64,
    plan: &SubscriptionPlan,
    now: DateTime<Utc>,
) -> sqlx::query::QueryScalar<'q, Sqlite, i64, sqlx::sqlite::SqliteArguments<'q>> {
    let end_date = subscription_end_date(now, plan.duration_days);
    sqlx::query_scalar(UPSERT_SUBSCRIPTION_SQL)
        .bind(customer_id)
        .bind(plan.id)
        .bind(now.naive_utc())
        .bind(end_date.map(|d| d.naive_utc()))
        .bind(now.naive_utc())
}

async fn reload_subscription(
    pool: &Pool<Sqlite>,
    customer_id: i64,
) -> Result<CustomerSubscription, AppError> {
    get_subscription(pool, customer_id)
        .await?
        .ok_or_else(|| AppError::Internal("Subscription missing after save".to_string()))
}

/// Starts (or restarts) the customer's single subscription on `plan`.
#[instrument(skip(plan), fields(plan_id = plan.id))]
pub async fn start_subscription(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    plan: &SubscriptionPlan,
    now: DateTime<Utc>,
) -> Result<CustomerSubscription, AppError> {
    info!("Starting subscription");
    upsert_subscription(customer_id, plan, now)
        .fetch_one(pool)
        .await?;
    reload_subscription(pool, customer_id).await
}

/// Starts the subscription and records its payment in one transaction. If the payment
/// insert fails the customer's previous subscription state is left untouched.
#[instrument(skip(plan, payment), fields(plan_id = plan.id, transaction_id = %payment.transaction_id))]
pub async fn start_paid_subscription(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    plan: &SubscriptionPlan,
    payment: &NewPayment,
    now: DateTime<Utc>,
) -> Result<CustomerSubscription, AppError> {
    info!("Starting paid subscription");
    let mut tx = pool.begin().await?;

    let subscription_id = upsert_subscription(customer_id, plan, now)
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO payments (customer_id, subscription_id, amount_cents, payment_method, status,
             transaction_id, payment_date, notes)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(customer_id)
    .bind(subscription_id)
    .bind(payment.amount_cents)
    .bind(payment.payment_method.as_str())
    .bind(payment.status.as_str())
    .bind(&payment.transaction_id)
    .bind(payment.payment_date.naive_utc())
    .bind(&payment.notes)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    reload_subscription(pool, customer_id).await
}

/// Writes back a subscription after normalising it against `now`.
#[instrument(skip(subscription), fields(subscription_id = subscription.id))]
pub async fn save_subscription(
    pool: &Pool<Sqlite>,
    subscription: &mut CustomerSubscription,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    info!("Saving subscription");
    subscription.normalize_at(now);

    sqlx::query(
        "UPDATE customer_subscriptions SET end_date = ?, is_active = ?, auto_renew = ? WHERE id = ?",
    )
    .bind(subscription.end_date.map(|d| d.naive_utc()))
    .bind(subscription.is_active)
    .bind(subscription.auto_renew)
    .bind(subscription.id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Deactivates every active subscription whose end date has passed.
#[instrument(skip(pool))]
pub async fn expire_subscriptions(pool: &Pool<Sqlite>, now: DateTime<Utc>) -> Result<u64, AppError> {
    info!("Expiring lapsed subscriptions");
    let result = sqlx::query(
        "UPDATE customer_subscriptions SET is_active = 0
         WHERE is_active = 1 AND end_date IS NOT NULL AND end_date < ?",
    )
    .bind(now.naive_utc())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Premium content needs a current subscription on a plan with `premium_content`.
#[instrument]
pub async fn has_premium_access(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    now: DateTime<Utc>,
) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM customer_subscriptions s
         JOIN subscription_plans p ON p.id = s.plan_id
         WHERE s.customer_id = ? AND s.is_active = 1 AND p.premium_content = 1
           AND (s.end_date IS NULL OR s.end_date > ?)",
    )
    .bind(customer_id)
    .bind(now.naive_utc())
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

#[derive(Debug, Clone)]
/// A payment recorded alongside the subscription it pays for.
pub struct NewPayment {
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: String,
    pub payment_date: DateTime<Utc>,
    pub notes: String,
}

#[instrument]
pub async fn count_payments(pool: &Pool<Sqlite>, customer_id: i64) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE customer_id = ?")
        .bind(customer_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[instrument]
pub async fn list_payments(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Payment>, AppError> {
    info!("Listing payments");
    let rows = sqlx::query_as::<_, DbPayment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE customer_id = ?
         ORDER BY payment_date DESC, id DESC LIMIT ? OFFSET ?"
    ))
    .bind(customer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Payment::from).collect())
}

/// Count and summed amount (cents) for each payment status the customer has.
#[instrument]
pub async fn payment_totals(
    pool: &Pool<Sqlite>,
    customer_id: i64,
) -> Result<Vec<(PaymentStatus, i64, i64)>, AppError> {
    let rows: Vec<(String, i64, Option<i64>)> = sqlx::query_as(
        "SELECT status, COUNT(*), SUM(amount_cents) FROM payments
         WHERE customer_id = ? GROUP BY status",
    )
    .bind(customer_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(status, count, sum)| {
            status
                .parse::<PaymentStatus>()
                .ok()
                .map(|s| (s, count, sum.unwrap_or_default()))
        })
        .collect())
}
