use std::path::{Component, Path};

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use rocket::State;
use rocket::fs::NamedFile;
use rocket::http::{ContentType, Cookie, CookieJar, Header, Status};
use rocket::response::Redirect;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use super::{MessageResponse, ok_message, or_zero};
use crate::assignment::auto_assign_trainer;
use crate::auth::{CustomerUser, Permission, SESSION_COOKIE};
use crate::db::{
    self, CustomerProfileUpdate, Mailbox, NewGoal, NewPayment, ProgressEntry, ResourceFilter,
    SessionFilter,
};
use crate::env::AppConfig;
use crate::error::AppError;
use crate::mailer::MailService;
use crate::models::{
    Customer, CustomerSubscription, FitnessLevel, Gender, Goal, GoalStatus, GoalType,
    InboxCounts, Notification, NotificationType, Page, PageWindow, Payment, PaymentMethod,
    PaymentStatus, ProgressChart, Resource, ResourceCategory, ResourceLocation, ResourceType,
    SessionStatus, SubscriptionPlan, Trainer, TrainerAssignment, TrainerMessage, TrainerRating,
    TrainingSession, WorkoutProgress, cents_to_amount, generate_transaction_id, percentage,
    progress_chart,
};
use crate::validation::{
    ApiError, ApiResult, AppErrorExt, JsonValidateExt, PermissionCheckExt, api_error,
};

const PAYMENTS_PER_PAGE: i64 = 10;
const NOTIFICATIONS_PER_PAGE: i64 = 20;
const MESSAGES_PER_PAGE: i64 = 10;

fn month_start(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

/// Subscription state as the customer sees it.
#[derive(Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub subscription: CustomerSubscription,
    pub plan: SubscriptionPlan,
    pub is_expired: bool,
    pub days_remaining: Option<i64>,
}

impl SubscriptionView {
    fn new(subscription: CustomerSubscription, plan: SubscriptionPlan) -> Self {
        let now = Utc::now();
        Self {
            is_expired: subscription.is_expired_at(now),
            days_remaining: subscription.days_remaining_at(now),
            subscription,
            plan,
        }
    }
}

async fn subscription_view(
    db: &Pool<Sqlite>,
    customer_id: i64,
) -> Result<Option<SubscriptionView>, AppError> {
    Ok(db::get_subscription_with_plan(db, customer_id)
        .await?
        .map(|(subscription, plan)| SubscriptionView::new(subscription, plan)))
}

#[derive(Serialize)]
pub struct CustomerDashboard {
    pub customer: Customer,
    pub subscription: Option<SubscriptionView>,
    pub trainer_assignment: Option<TrainerAssignment>,
    pub active_goals: Vec<Goal>,
    pub active_goals_count: i64,
    pub recent_progress: Vec<WorkoutProgress>,
    pub recent_progress_count: i64,
    pub recent_notifications: Vec<Notification>,
    pub unread_notifications_count: i64,
    pub recent_messages: Vec<TrainerMessage>,
    pub unread_messages_count: i64,
}

#[get("/dashboard")]
pub async fn api_dashboard(
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<CustomerDashboard> {
    let customer_id = auth.customer.id;

    let subscription = subscription_view(db, customer_id).await.validate_custom()?;
    let trainer_assignment = db::get_active_assignment_for_customer(db, customer_id)
        .await
        .validate_custom()?;
    let active_goals = db::list_goals(db, customer_id, Some(GoalStatus::Active), Some(3))
        .await
        .validate_custom()?;
    let recent_progress = db::list_progress(db, customer_id, 5).await.validate_custom()?;
    let recent_notifications = db::list_notifications(db, customer_id, true, 5, 0)
        .await
        .validate_custom()?;
    let recent_messages = db::list_messages(db, Mailbox::Customer(customer_id), true, 3, 0)
        .await
        .validate_custom()?;

    let unread_messages_count = or_zero(
        db::message_counts(db, Mailbox::Customer(customer_id), Utc::now())
            .await
            .map(|c| c.unread),
        "Dashboard message count",
    );

    Ok(Json(CustomerDashboard {
        active_goals_count: or_zero(
            db::count_goals(db, customer_id, Some(GoalStatus::Active)).await,
            "Dashboard goal count",
        ),
        recent_progress_count: or_zero(
            db::count_progress(db, customer_id).await,
            "Dashboard progress count",
        ),
        unread_notifications_count: or_zero(
            db::count_unread_notifications(db, customer_id).await,
            "Dashboard notification count",
        ),
        unread_messages_count,
        customer: auth.customer,
        subscription,
        trainer_assignment,
        active_goals,
        recent_progress,
        recent_notifications,
        recent_messages,
    }))
}

#[derive(Serialize)]
pub struct ProfileStats {
    pub total_goals: i64,
    pub completed_goals: i64,
    pub progress_entries: i64,
    pub unread_notifications: i64,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub customer: Customer,
    pub bmi: Option<f64>,
    pub subscription: Option<SubscriptionView>,
    pub stats: ProfileStats,
}

#[get("/profile")]
pub async fn api_get_profile(
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<ProfileResponse> {
    auth.user
        .require_permission(Permission::ViewOwnProfile)
        .validate_custom()?;
    let customer_id = auth.customer.id;

    let stats = ProfileStats {
        total_goals: or_zero(db::count_goals(db, customer_id, None).await, "Profile goals"),
        completed_goals: or_zero(
            db::count_goals(db, customer_id, Some(GoalStatus::Completed)).await,
            "Profile completed goals",
        ),
        progress_entries: or_zero(db::count_progress(db, customer_id).await, "Profile progress"),
        unread_notifications: or_zero(
            db::count_unread_notifications(db, customer_id).await,
            "Profile notifications",
        ),
    };
    let subscription = subscription_view(db, customer_id).await.validate_custom()?;

    Ok(Json(ProfileResponse {
        bmi: auth.customer.bmi(),
        customer: auth.customer,
        subscription,
        stats,
    }))
}

#[derive(Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[validate(email(message = "Enter a valid email address."))]
    email: String,
    #[serde(default)]
    phone: String,
    date_of_birth: Option<NaiveDate>,
    gender: Option<Gender>,
    #[validate(range(min = 0.0, max = 300.0, message = "Height must be between 0 and 300 cm"))]
    height: Option<f64>,
    #[validate(range(min = 0.0, max = 500.0, message = "Weight must be between 0 and 500 kg"))]
    weight: Option<f64>,
    #[serde(default)]
    fitness_level: FitnessLevel,
    #[serde(default)]
    fitness_goals: String,
    #[serde(default)]
    medical_conditions: String,
}

#[put("/profile", data = "<request>")]
pub async fn api_update_profile(
    request: Json<ProfileUpdateRequest>,
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Customer> {
    auth.user
        .require_permission(Permission::EditOwnProfile)
        .validate_custom()?;
    let request = request.validate_custom()?;

    db::update_user_details(
        db,
        auth.user.id,
        request.first_name.trim(),
        request.last_name.trim(),
        request.email.trim(),
        request.phone.trim(),
    )
    .await
    .validate_custom()?;

    let update = CustomerProfileUpdate {
        date_of_birth: request.date_of_birth,
        gender: request.gender,
        height: request.height,
        weight: request.weight,
        fitness_level: request.fitness_level,
        fitness_goals: request.fitness_goals,
        medical_conditions: request.medical_conditions,
    };
    db::update_customer_profile(db, auth.customer.id, &update)
        .await
        .validate_custom()?;

    let customer = db::get_customer(db, auth.customer.id).await.validate_custom()?;
    Ok(Json(customer))
}

#[derive(Deserialize)]
pub struct DeleteAccountRequest {
    confirmation: String,
}

#[post("/account/delete", data = "<request>")]
pub async fn api_delete_account(
    request: Json<DeleteAccountRequest>,
    auth: CustomerUser,
    cookies: &CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<MessageResponse> {
    if request.confirmation != "DELETE" {
        return Err(api_error(
            Status::UnprocessableEntity,
            "confirmation",
            "Please type 'DELETE' to confirm account deletion.",
        ));
    }

    db::delete_user(db, auth.user.id).await.validate_custom()?;
    cookies.remove_private(Cookie::build(SESSION_COOKIE));

    Ok(ok_message("Account deleted successfully."))
}

#[get("/plans")]
pub async fn api_plans(
    _auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Vec<SubscriptionPlan>> {
    let plans = db::list_active_plans(db).await.validate_custom()?;
    Ok(Json(plans))
}

#[derive(Serialize)]
pub struct SubscriptionDetails {
    pub subscription: Option<SubscriptionView>,
    pub available_plans: Vec<SubscriptionPlan>,
    pub monthly_sessions: i64,
    pub monthly_messages: i64,
}

#[get("/subscription")]
pub async fn api_subscription_details(
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<SubscriptionDetails> {
    let customer_id = auth.customer.id;
    let subscription = subscription_view(db, customer_id).await.validate_custom()?;
    let available_plans = db::list_active_plans(db).await.validate_custom()?;

    let (mut monthly_sessions, mut monthly_messages) = (0, 0);
    if subscription.is_some() {
        let now = Utc::now();
        let start = month_start(now.date_naive());
        let filter = SessionFilter {
            from: Some(start),
            ..SessionFilter::for_customer(customer_id).status(SessionStatus::Completed)
        };
        monthly_sessions = or_zero(db::count_sessions(db, &filter).await, "Monthly sessions");

        let since = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt));
        monthly_messages = or_zero(
            db::count_customer_messages(db, customer_id, None, since).await,
            "Monthly messages",
        );
    }

    Ok(Json(SubscriptionDetails {
        subscription,
        available_plans,
        monthly_sessions,
        monthly_messages,
    }))
}

#[derive(Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: String,
    pub subscription: SubscriptionView,
    pub payment_transaction_id: String,
    pub trainer_assignment: Option<TrainerAssignment>,
}

#[post("/subscription/subscribe/<plan_id>")]
pub async fn api_subscribe(
    plan_id: i64,
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
    mail: &State<MailService>,
) -> ApiResult<SubscribeResponse> {
    auth.user
        .require_permission(Permission::ManageOwnSubscription)
        .validate_custom()?;
    let customer_id = auth.customer.id;

    let plan = db::get_plan(db, plan_id).await.validate_custom()?;
    if !plan.is_active {
        return Err(api_error(Status::NotFound, "plan", "Plan not found"));
    }

    let now = Utc::now();
    let transaction_id = generate_transaction_id(now, customer_id);
    let payment = NewPayment {
        amount_cents: plan.price_cents,
        payment_method: PaymentMethod::Card,
        status: PaymentStatus::Completed,
        transaction_id: transaction_id.clone(),
        payment_date: now,
        notes: String::new(),
    };
    let subscription = db::start_paid_subscription(db, customer_id, &plan, &payment, now)
        .await
        .validate_custom()?;

    let trainer_assignment = if plan.trainer_support {
        match auto_assign_trainer(db, mail, customer_id, now).await {
            Ok(assignment) => assignment,
            Err(err) => {
                err.log_and_record("Auto-assigning trainer on subscribe");
                None
            }
        }
    } else {
        None
    };

    db::create_notification(
        db,
        customer_id,
        "Subscription Activated",
        &format!(
            "Your {} subscription has been activated successfully!",
            plan.name
        ),
        NotificationType::Subscription,
    )
    .await
    .validate_custom()?;

    let message = format!("Successfully subscribed to {}!", plan.name);
    Ok(Json(SubscribeResponse {
        success: true,
        message,
        subscription: SubscriptionView::new(subscription, plan),
        payment_transaction_id: transaction_id,
        trainer_assignment,
    }))
}

fn no_subscription() -> ApiError {
    api_error(Status::NotFound, "subscription", "No active subscription found.")
}

#[post("/subscription/auto-renew")]
pub async fn api_toggle_auto_renew(
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<MessageResponse> {
    auth.user
        .require_permission(Permission::ManageOwnSubscription)
        .validate_custom()?;
    let Some(mut subscription) = db::get_subscription(db, auth.customer.id)
        .await
        .validate_custom()?
    else {
        return Err(no_subscription());
    };

    subscription.auto_renew = !subscription.auto_renew;
    db::save_subscription(db, &mut subscription, Utc::now())
        .await
        .validate_custom()?;

    let state = if subscription.auto_renew { "enabled" } else { "disabled" };
    Ok(ok_message(format!("Auto-renewal has been {}.", state)))
}

#[post("/subscription/cancel")]
pub async fn api_cancel_subscription(
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<MessageResponse> {
    auth.user
        .require_permission(Permission::ManageOwnSubscription)
        .validate_custom()?;
    let Some((mut subscription, plan)) = db::get_subscription_with_plan(db, auth.customer.id)
        .await
        .validate_custom()?
    else {
        return Err(no_subscription());
    };

    subscription.auto_renew = false;
    db::save_subscription(db, &mut subscription, Utc::now())
        .await
        .validate_custom()?;

    let until = subscription
        .end_date
        .map(|d| d.date_naive().to_string())
        .unwrap_or_else(|| "your plan ends".to_string());
    db::create_notification(
        db,
        auth.customer.id,
        "Subscription Cancelled",
        &format!(
            "Your {} subscription will not auto-renew. Access will continue until {}.",
            plan.name, until
        ),
        NotificationType::Subscription,
    )
    .await
    .validate_custom()?;

    Ok(ok_message(
        "Your subscription has been cancelled. You will continue to have access until the end of your billing period.",
    ))
}

#[derive(Serialize, Deserialize, Default)]
pub struct SubscriptionStatus {
    pub has_subscription: bool,
    pub plan_name: Option<String>,
    pub is_active: Option<bool>,
    pub days_remaining: Option<i64>,
    pub is_expired: Option<bool>,
}

#[get("/subscription/status")]
pub async fn api_subscription_status(
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> Json<SubscriptionStatus> {
    match db::get_subscription_with_plan(db, auth.customer.id).await {
        Ok(Some((subscription, plan))) if subscription.is_active => {
            let now = Utc::now();
            Json(SubscriptionStatus {
                has_subscription: true,
                plan_name: Some(plan.name),
                is_active: Some(subscription.is_active),
                days_remaining: subscription.days_remaining_at(now),
                is_expired: Some(subscription.is_expired_at(now)),
            })
        }
        Ok(_) => Json(SubscriptionStatus::default()),
        Err(err) => {
            err.log_and_record("Subscription status");
            Json(SubscriptionStatus::default())
        }
    }
}

#[derive(Serialize)]
pub struct PaymentTotals {
    pub total_amount: f64,
    pub completed_count: i64,
    pub pending_count: i64,
    pub failed_count: i64,
    pub refunded_count: i64,
}

#[derive(Serialize)]
pub struct PaymentHistory {
    pub payments: Page<Payment>,
    pub totals: PaymentTotals,
}

#[get("/payments?<page>")]
pub async fn api_payments(
    page: Option<i64>,
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<PaymentHistory> {
    let customer_id = auth.customer.id;
    let total = db::count_payments(db, customer_id).await.validate_custom()?;
    let window = PageWindow::new(page, PAYMENTS_PER_PAGE, total);
    let payments = db::list_payments(db, customer_id, window.limit, window.offset)
        .await
        .validate_custom()?;

    let mut totals = PaymentTotals {
        total_amount: 0.0,
        completed_count: 0,
        pending_count: 0,
        failed_count: 0,
        refunded_count: 0,
    };
    match db::payment_totals(db, customer_id).await {
        Ok(rows) => {
            let mut cents = 0;
            for (status, count, sum) in rows {
                cents += sum;
                match status {
                    PaymentStatus::Completed => totals.completed_count = count,
                    PaymentStatus::Pending => totals.pending_count = count,
                    PaymentStatus::Failed => totals.failed_count = count,
                    PaymentStatus::Refunded => totals.refunded_count = count,
                }
            }
            totals.total_amount = cents_to_amount(cents);
        }
        Err(err) => err.log_and_record("Payment totals"),
    }

    Ok(Json(PaymentHistory {
        payments: window.into_page(payments, total),
        totals,
    }))
}

#[derive(Serialize)]
pub struct TrainerInfo {
    pub trainer_assignment: Option<TrainerAssignment>,
    pub trainer: Option<Trainer>,
    pub my_rating: Option<TrainerRating>,
    pub subscription: Option<SubscriptionView>,
    pub upcoming_sessions: Vec<TrainingSession>,
    pub recent_messages: Vec<TrainerMessage>,
    pub total_sessions: i64,
    pub monthly_sessions: i64,
    pub attendance_rate: f64,
}

#[get("/trainer")]
pub async fn api_trainer_info(
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<TrainerInfo> {
    let customer_id = auth.customer.id;
    let assignment = db::get_active_assignment_for_customer(db, customer_id)
        .await
        .validate_custom()?;
    let subscription = subscription_view(db, customer_id).await.validate_custom()?;

    let mut info = TrainerInfo {
        trainer_assignment: None,
        trainer: None,
        my_rating: None,
        subscription,
        upcoming_sessions: Vec::new(),
        recent_messages: Vec::new(),
        total_sessions: 0,
        monthly_sessions: 0,
        attendance_rate: 0.0,
    };

    let Some(assignment) = assignment else {
        return Ok(Json(info));
    };

    let trainer_id = assignment.trainer_id;
    let today = Utc::now().date_naive();
    let pair = SessionFilter {
        trainer_id: Some(trainer_id),
        customer_id: Some(customer_id),
        ..Default::default()
    };

    info.upcoming_sessions = db::list_sessions(db, &pair.clone().upcoming_from(today), 5, 0)
        .await
        .validate_custom()?;

    let messages = db::list_messages(db, Mailbox::Customer(customer_id), false, 20, 0)
        .await
        .validate_custom()?;
    info.recent_messages = messages
        .into_iter()
        .filter(|m| m.trainer_id == trainer_id)
        .take(5)
        .collect();

    let completed = pair.clone().status(SessionStatus::Completed);
    info.total_sessions = or_zero(db::count_sessions(db, &completed).await, "Total sessions");

    let this_month = SessionFilter {
        from: Some(month_start(today)),
        ..completed.clone()
    };
    info.monthly_sessions = or_zero(db::count_sessions(db, &this_month).await, "Monthly sessions");

    let yesterday = today.pred_opt().unwrap_or(today);
    let past = SessionFilter {
        to: Some(yesterday),
        ..pair.clone()
    };
    let past_completed = SessionFilter {
        to: Some(yesterday),
        ..completed
    };
    info.attendance_rate = percentage(
        or_zero(db::count_sessions(db, &past_completed).await, "Attended sessions"),
        or_zero(db::count_sessions(db, &past).await, "Past sessions"),
    );

    info.trainer = Some(db::get_trainer(db, trainer_id).await.validate_custom()?);
    info.my_rating = db::get_rating(db, customer_id, trainer_id)
        .await
        .validate_custom()?;
    info.trainer_assignment = Some(assignment);

    Ok(Json(info))
}

#[derive(Deserialize, Validate)]
pub struct RatingRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    rating: i64,
    #[serde(default)]
    feedback: String,
}

#[derive(Serialize, Deserialize)]
pub struct RatingResponse {
    pub success: bool,
    pub message: String,
    pub average_rating: f64,
}

#[post("/trainer/<trainer_id>/rate", data = "<request>")]
pub async fn api_rate_trainer(
    trainer_id: i64,
    request: Json<RatingRequest>,
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<RatingResponse> {
    auth.user
        .require_permission(Permission::RateTrainers)
        .validate_custom()?;
    let request = request.validate_custom()?;

    db::get_trainer(db, trainer_id).await.validate_custom()?;
    let average_rating = db::rate_trainer(
        db,
        auth.customer.id,
        trainer_id,
        request.rating,
        request.feedback.trim(),
    )
    .await
    .validate_custom()?;

    Ok(Json(RatingResponse {
        success: true,
        message: "Thank you for rating your trainer!".to_string(),
        average_rating,
    }))
}

#[derive(Serialize)]
pub struct ProgressOverview {
    pub entries: Vec<WorkoutProgress>,
    pub chart: ProgressChart,
    pub total_entries: i64,
    pub total_sessions: i64,
    pub latest_weight: Option<f64>,
    pub latest_bmi: Option<f64>,
}

pub(crate) async fn progress_overview(
    db: &Pool<Sqlite>,
    customer_id: i64,
) -> Result<ProgressOverview, AppError> {
    let entries = db::list_progress(db, customer_id, 30).await?;
    let (total_entries, total_sessions) = match db::progress_totals(db, customer_id).await {
        Ok(totals) => totals,
        Err(err) => {
            err.log_and_record("Progress totals");
            (0, 0)
        }
    };
    let latest = entries.first();

    Ok(ProgressOverview {
        chart: progress_chart(&entries),
        latest_weight: latest.and_then(|p| p.weight),
        latest_bmi: latest.and_then(|p| p.bmi),
        total_entries,
        total_sessions,
        entries,
    })
}

#[get("/progress")]
pub async fn api_progress(
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<ProgressOverview> {
    let overview = progress_overview(db, auth.customer.id)
        .await
        .validate_custom()?;
    Ok(Json(overview))
}

#[derive(Deserialize, Validate)]
pub struct ProgressRequest {
    date: NaiveDate,
    #[validate(range(min = 0.0, max = 500.0, message = "Weight must be between 0 and 500 kg"))]
    weight: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0, message = "BMI must be between 0 and 100"))]
    bmi: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Sessions attended cannot be negative"))]
    sessions_attended: i64,
    #[serde(default)]
    customer_notes: String,
}

#[post("/progress", data = "<request>")]
pub async fn api_record_progress(
    request: Json<ProgressRequest>,
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<WorkoutProgress> {
    auth.user
        .require_permission(Permission::TrackOwnProgress)
        .validate_custom()?;
    let request = request.validate_custom()?;

    let entry = ProgressEntry {
        date: request.date,
        weight: request.weight,
        bmi: request.bmi,
        sessions_attended: request.sessions_attended,
        customer_notes: request.customer_notes,
    };
    let progress = db::upsert_progress(db, auth.customer.id, &entry)
        .await
        .validate_custom()?;
    Ok(Json(progress))
}

#[derive(Serialize)]
pub struct GoalStats {
    pub total_goals: i64,
    pub active_goals_count: i64,
    pub completed_goals_count: i64,
    pub paused_goals_count: i64,
    pub cancelled_goals_count: i64,
    pub avg_progress: f64,
}

#[derive(Serialize)]
pub struct GoalsOverview {
    pub goals: Vec<Goal>,
    pub stats: GoalStats,
}

fn goal_stats(goals: &[Goal]) -> GoalStats {
    let count = |status: GoalStatus| goals.iter().filter(|g| g.status == status).count() as i64;
    let tracked: Vec<&Goal> = goals
        .iter()
        .filter(|g| g.status == GoalStatus::Active && g.target_value.is_some())
        .collect();
    let avg_progress = if tracked.is_empty() {
        0.0
    } else {
        tracked.iter().map(|g| g.progress_percentage()).sum::<f64>() / tracked.len() as f64
    };

    GoalStats {
        total_goals: goals.len() as i64,
        active_goals_count: count(GoalStatus::Active),
        completed_goals_count: count(GoalStatus::Completed),
        paused_goals_count: count(GoalStatus::Paused),
        cancelled_goals_count: count(GoalStatus::Cancelled),
        avg_progress,
    }
}

#[get("/goals?<status>")]
pub async fn api_goals(
    status: Option<String>,
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<GoalsOverview> {
    let all = db::list_goals(db, auth.customer.id, None, None)
        .await
        .validate_custom()?;
    let stats = goal_stats(&all);

    let filter = status.and_then(|s| s.parse::<GoalStatus>().ok());
    let goals = match filter {
        Some(status) => all.into_iter().filter(|g| g.status == status).collect(),
        None => all,
    };

    Ok(Json(GoalsOverview { goals, stats }))
}

#[derive(Deserialize, Validate)]
pub struct GoalRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    goal_type: GoalType,
    target_value: Option<f64>,
    #[serde(default)]
    unit: String,
    target_date: Option<NaiveDate>,
}

#[post("/goals", data = "<request>")]
pub async fn api_create_goal(
    request: Json<GoalRequest>,
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Goal> {
    auth.user
        .require_permission(Permission::ManageOwnGoals)
        .validate_custom()?;
    let request = request.validate_custom()?;

    let goal = NewGoal {
        title: request.title.trim().to_string(),
        description: request.description,
        goal_type: request.goal_type,
        target_value: request.target_value.filter(|v| *v != 0.0),
        current_value: 0.0,
        unit: request.unit,
        target_date: request.target_date,
    };
    let goal = db::create_goal(db, auth.customer.id, &goal)
        .await
        .validate_custom()?;
    Ok(Json(goal))
}

#[derive(Deserialize)]
pub struct GoalProgressRequest {
    current_value: f64,
}

#[derive(Serialize)]
pub struct GoalProgressResponse {
    pub goal: Goal,
    pub completed: bool,
}

#[post("/goals/<goal_id>/progress", data = "<request>")]
pub async fn api_update_goal_progress(
    goal_id: i64,
    request: Json<GoalProgressRequest>,
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<GoalProgressResponse> {
    auth.user
        .require_permission(Permission::ManageOwnGoals)
        .validate_custom()?;
    let customer_id = auth.customer.id;

    let mut goal = db::get_goal(db, customer_id, goal_id).await.validate_custom()?;
    let completed = goal
        .record_progress(request.current_value, Utc::now())
        .validate_custom()?;
    db::save_goal(db, &mut goal).await.validate_custom()?;

    if completed {
        db::create_notification(
            db,
            customer_id,
            "Goal Completed!",
            &format!("Congratulations! You've completed your goal: {}", goal.title),
            NotificationType::Goal,
        )
        .await
        .validate_custom()?;
    }

    Ok(Json(GoalProgressResponse { goal, completed }))
}

#[post("/goals/<goal_id>/<action>", rank = 2)]
pub async fn api_goal_action(
    goal_id: i64,
    action: &str,
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Goal> {
    auth.user
        .require_permission(Permission::ManageOwnGoals)
        .validate_custom()?;

    let next = match action {
        "pause" => GoalStatus::Paused,
        "resume" => GoalStatus::Active,
        "cancel" => GoalStatus::Cancelled,
        "complete" => GoalStatus::Completed,
        _ => {
            return Err(api_error(
                Status::BadRequest,
                "action",
                "Unknown goal action",
            ));
        }
    };

    let mut goal = db::get_goal(db, auth.customer.id, goal_id)
        .await
        .validate_custom()?;
    goal.transition_to(next, Utc::now()).validate_custom()?;
    db::save_goal(db, &mut goal).await.validate_custom()?;

    Ok(Json(goal))
}

#[delete("/goals/<goal_id>")]
pub async fn api_delete_goal(
    goal_id: i64,
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<MessageResponse> {
    auth.user
        .require_permission(Permission::ManageOwnGoals)
        .validate_custom()?;
    db::delete_goal(db, auth.customer.id, goal_id)
        .await
        .validate_custom()?;
    Ok(ok_message("Goal deleted."))
}

#[derive(Serialize)]
pub struct ResourceLibrary {
    pub resources: Vec<Resource>,
    pub categories: Vec<ResourceCategory>,
    pub has_active_subscription: bool,
    pub has_premium_access: bool,
}

#[get("/resources?<category>&<resource_type>")]
pub async fn api_resources(
    category: Option<i64>,
    resource_type: Option<String>,
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<ResourceLibrary> {
    auth.user
        .require_permission(Permission::DownloadResources)
        .validate_custom()?;
    let now = Utc::now();
    let customer_id = auth.customer.id;

    let has_active_subscription = db::get_subscription(db, customer_id)
        .await
        .validate_custom()?
        .map(|s| s.is_current_at(now))
        .unwrap_or(false);
    let has_premium_access = db::has_premium_access(db, customer_id, now)
        .await
        .validate_custom()?;

    let filter = ResourceFilter {
        include_premium: has_premium_access,
        category_id: category,
        resource_type: resource_type.and_then(|t| t.parse::<ResourceType>().ok()),
    };
    let resources = db::list_resources(db, &filter).await.validate_custom()?;
    let categories = db::list_categories(db).await.validate_custom()?;

    Ok(Json(ResourceLibrary {
        resources,
        categories,
        has_active_subscription,
        has_premium_access,
    }))
}

#[derive(Responder)]
pub enum ResourceDownload {
    File(NamedFile, ContentType, Header<'static>),
    Redirect(Redirect),
}

/// Stored paths must stay inside the media root.
fn safe_relative_path(path: &str) -> Option<&Path> {
    let path = Path::new(path);
    let relative = path
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    (relative && !path.as_os_str().is_empty()).then_some(path)
}

fn resource_file_missing() -> ApiError {
    api_error(Status::NotFound, "resource", "Resource file not found.")
}

#[get("/resources/<resource_id>/download")]
pub async fn api_download_resource(
    resource_id: i64,
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> Result<ResourceDownload, ApiError> {
    auth.user
        .require_permission(Permission::DownloadResources)
        .validate_custom()?;

    let resource = db::get_resource(db, resource_id).await.validate_custom()?;
    let has_premium = if resource.is_premium {
        db::has_premium_access(db, auth.customer.id, Utc::now())
            .await
            .validate_custom()?
    } else {
        false
    };
    if !resource.accessible_with(has_premium) {
        return Err(api_error(
            Status::Forbidden,
            "subscription",
            "Premium subscription required to access this resource.",
        ));
    }

    match resource.location() {
        ResourceLocation::File(path) => {
            let relative = safe_relative_path(&path).ok_or_else(resource_file_missing)?;
            let full_path = config.media_root.join(relative);
            let file = NamedFile::open(&full_path).await.map_err(|err| {
                tracing::warn!(path = %full_path.display(), error = %err, "Resource file unreadable");
                resource_file_missing()
            })?;

            let file_name = relative
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "download".to_string());
            let disposition = Header::new(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", file_name),
            );
            Ok(ResourceDownload::File(file, ContentType::Binary, disposition))
        }
        ResourceLocation::Url(url) => Ok(ResourceDownload::Redirect(Redirect::to(url))),
        ResourceLocation::Missing => Err(resource_file_missing()),
    }
}

#[derive(Serialize)]
pub struct NotificationList {
    pub notifications: Page<Notification>,
    pub counts: InboxCounts,
}

#[get("/notifications?<page>")]
pub async fn api_notifications(
    page: Option<i64>,
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<NotificationList> {
    let customer_id = auth.customer.id;
    let counts = db::notification_counts(db, customer_id, Utc::now())
        .await
        .unwrap_or_else(|err| {
            err.log_and_record("Notification counts");
            InboxCounts::default()
        });

    let window = PageWindow::new(page, NOTIFICATIONS_PER_PAGE, counts.total);
    let items = db::list_notifications(db, customer_id, false, window.limit, window.offset)
        .await
        .validate_custom()?;

    Ok(Json(NotificationList {
        notifications: window.into_page(items, counts.total),
        counts,
    }))
}

#[post("/notifications/<notification_id>/read")]
pub async fn api_mark_notification_read(
    notification_id: i64,
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<MessageResponse> {
    let updated = db::mark_notification_read(db, auth.customer.id, notification_id)
        .await
        .validate_custom()?;
    if !updated {
        return Err(api_error(
            Status::NotFound,
            "notification",
            "Notification not found",
        ));
    }
    Ok(ok_message("success"))
}

#[post("/notifications/read-all")]
pub async fn api_mark_all_notifications_read(
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<MessageResponse> {
    let count = db::mark_all_notifications_read(db, auth.customer.id)
        .await
        .validate_custom()?;
    Ok(ok_message(format!("{} notifications marked as read.", count)))
}

#[derive(Serialize, Deserialize)]
pub struct UnreadCount {
    pub count: i64,
}

#[get("/notifications/count")]
pub async fn api_notifications_count(
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> Json<UnreadCount> {
    let count = or_zero(
        db::count_unread_notifications(db, auth.customer.id).await,
        "Unread notification count",
    );
    Json(UnreadCount { count })
}

#[derive(Serialize)]
pub struct MessageList {
    pub messages: Page<TrainerMessage>,
    pub counts: InboxCounts,
}

#[get("/messages?<page>")]
pub async fn api_messages(
    page: Option<i64>,
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<MessageList> {
    let mailbox = Mailbox::Customer(auth.customer.id);
    let counts = db::message_counts(db, mailbox, Utc::now())
        .await
        .unwrap_or_else(|err| {
            err.log_and_record("Message counts");
            InboxCounts::default()
        });

    let window = PageWindow::new(page, MESSAGES_PER_PAGE, counts.total);
    let items = db::list_messages(db, mailbox, false, window.limit, window.offset)
        .await
        .validate_custom()?;

    Ok(Json(MessageList {
        messages: window.into_page(items, counts.total),
        counts,
    }))
}

#[post("/messages/<message_id>/read")]
pub async fn api_mark_message_read(
    message_id: i64,
    auth: CustomerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<TrainerMessage> {
    let customer_id = auth.customer.id;
    if !db::mark_message_read(db, customer_id, message_id)
        .await
        .validate_custom()?
    {
        return Err(api_error(Status::NotFound, "message", "Message not found"));
    }
    let message = db::get_message_for_customer(db, customer_id, message_id)
        .await
        .validate_custom()?;
    Ok(Json(message))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        api_dashboard,
        api_get_profile,
        api_update_profile,
        api_delete_account,
        api_plans,
        api_subscription_details,
        api_subscribe,
        api_toggle_auto_renew,
        api_cancel_subscription,
        api_subscription_status,
        api_payments,
        api_trainer_info,
        api_rate_trainer,
        api_progress,
        api_record_progress,
        api_goals,
        api_create_goal,
        api_update_goal_progress,
        api_goal_action,
        api_delete_goal,
        api_resources,
        api_download_resource,
        api_notifications,
        api_mark_notification_read,
        api_mark_all_notifications_read,
        api_notifications_count,
        api_messages,
        api_mark_message_read,
    ]
}
