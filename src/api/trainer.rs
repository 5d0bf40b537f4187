use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc};
use rocket::State;
use rocket::http::Status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use super::{MessageResponse, ok_message, or_zero};
use crate::auth::{Permission, TrainerUser};
use crate::db::{self, Mailbox, NewSession, ResourceFilter, SessionFilter, TrainerProfileUpdate};
use crate::error::AppError;
use crate::models::{
    Customer, Goal, GoalStatus, InboxCounts, NotificationType, Page, PageWindow, Resource,
    SessionStatus, SessionType, Trainer, TrainerAssignment, TrainerMessage, TrainingSession,
    WorkoutProgress, percentage,
};
use crate::validation::{
    ApiError, ApiResult, AppErrorExt, JsonValidateExt, PermissionCheckExt, api_error,
};

const CLIENTS_PER_PAGE: i64 = 9;
const SESSIONS_PER_PAGE: i64 = 10;
const MESSAGES_PER_PAGE: i64 = 15;
const ALL: i64 = -1;

fn week_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(today.weekday().num_days_from_monday() as i64)
}

fn month_start(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

fn not_your_client() -> ApiError {
    api_error(
        Status::Forbidden,
        "client",
        "You are not assigned to this client.",
    )
}

/// Loads a customer only if they are actively assigned to the trainer.
async fn assigned_client(
    db: &Pool<Sqlite>,
    trainer_id: i64,
    customer_id: i64,
) -> Result<(Customer, TrainerAssignment), ApiError> {
    let customer = db::get_customer(db, customer_id).await.validate_custom()?;
    match db::get_active_assignment_for_customer(db, customer_id)
        .await
        .validate_custom()?
    {
        Some(assignment) if assignment.trainer_id == trainer_id => Ok((customer, assignment)),
        _ => Err(not_your_client()),
    }
}

async fn ensure_client(db: &Pool<Sqlite>, trainer_id: i64, customer_id: i64) -> Result<(), ApiError> {
    if db::is_client_of(db, trainer_id, customer_id)
        .await
        .validate_custom()?
    {
        Ok(())
    } else {
        Err(not_your_client())
    }
}

#[derive(Serialize)]
pub struct TrainerDashboard {
    pub trainer: Trainer,
    pub total_clients: i64,
    pub active_subscriptions: i64,
    pub sessions_today: i64,
    pub sessions_this_week: i64,
    pub sessions_this_month: i64,
    pub upcoming_sessions: Vec<TrainingSession>,
    pub recent_messages: Vec<TrainerMessage>,
    pub recent_progress: Vec<WorkoutProgress>,
    pub completion_rate: f64,
    pub today: NaiveDate,
}

#[get("/dashboard")]
pub async fn api_dashboard(
    auth: TrainerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<TrainerDashboard> {
    let trainer_id = auth.trainer.id;
    let today = Utc::now().date_naive();
    let mine = SessionFilter::for_trainer(trainer_id);

    let sessions_today = or_zero(
        db::count_sessions(db, &mine.clone().between(today, today)).await,
        "Sessions today",
    );
    let this_week = SessionFilter {
        from: Some(week_start(today)),
        ..mine.clone()
    };
    let sessions_this_week = or_zero(db::count_sessions(db, &this_week).await, "Sessions this week");
    let this_month = SessionFilter {
        from: Some(month_start(today)),
        ..mine.clone()
    };
    let sessions_this_month =
        or_zero(db::count_sessions(db, &this_month).await, "Sessions this month");

    // Completion rate only looks at sessions whose date has passed.
    let past = SessionFilter {
        to: today.pred_opt(),
        ..mine.clone()
    };
    let past_total = or_zero(db::count_sessions(db, &past).await, "Past sessions");
    let past_completed = or_zero(
        db::count_sessions(db, &past.status(SessionStatus::Completed)).await,
        "Completed sessions",
    );

    let upcoming_sessions = db::list_sessions(db, &mine.upcoming_from(today), 5, 0)
        .await
        .validate_custom()?;
    let recent_messages = db::list_messages(db, Mailbox::Trainer(trainer_id), false, 5, 0)
        .await
        .validate_custom()?;
    let recent_progress = db::recent_client_progress(db, trainer_id, 5)
        .await
        .validate_custom()?;

    Ok(Json(TrainerDashboard {
        total_clients: or_zero(
            db::count_trainer_clients(db, trainer_id, None).await,
            "Trainer client count",
        ),
        active_subscriptions: or_zero(
            db::count_subscribed_clients(db, trainer_id).await,
            "Subscribed client count",
        ),
        sessions_today,
        sessions_this_week,
        sessions_this_month,
        upcoming_sessions,
        recent_messages,
        recent_progress,
        completion_rate: percentage(past_completed, past_total),
        today,
        trainer: auth.trainer,
    }))
}

#[derive(Serialize)]
pub struct ClientList {
    pub clients: Page<Customer>,
    pub search_query: String,
    pub total_clients: i64,
    pub active_subscriptions: i64,
}

#[get("/clients?<search>&<page>")]
pub async fn api_clients(
    search: Option<String>,
    page: Option<i64>,
    auth: TrainerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<ClientList> {
    auth.user
        .require_permission(Permission::ViewAssignedClients)
        .validate_custom()?;
    let trainer_id = auth.trainer.id;
    let search_query = search.unwrap_or_default().trim().to_string();
    let term = Some(search_query.as_str()).filter(|s| !s.is_empty());

    let total = db::count_trainer_clients(db, trainer_id, term)
        .await
        .validate_custom()?;
    let window = PageWindow::new(page, CLIENTS_PER_PAGE, total);
    let clients = db::list_trainer_clients(db, trainer_id, term, window.limit, window.offset)
        .await
        .validate_custom()?;

    Ok(Json(ClientList {
        clients: window.into_page(clients, total),
        search_query,
        total_clients: total,
        active_subscriptions: or_zero(
            db::count_subscribed_clients(db, trainer_id).await,
            "Subscribed client count",
        ),
    }))
}

#[derive(Serialize)]
pub struct ClientDetail {
    pub customer: Customer,
    pub assignment: TrainerAssignment,
    pub recent_sessions: Vec<TrainingSession>,
    pub progress_entries: Vec<WorkoutProgress>,
    pub active_goals: Vec<Goal>,
    pub total_sessions: i64,
    pub completed_sessions: i64,
}

#[get("/clients/<client_id>")]
pub async fn api_client_detail(
    client_id: i64,
    auth: TrainerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<ClientDetail> {
    auth.user
        .require_permission(Permission::ViewAssignedClients)
        .validate_custom()?;
    let trainer_id = auth.trainer.id;
    let (customer, assignment) = assigned_client(db, trainer_id, client_id).await?;

    let pair = SessionFilter {
        trainer_id: Some(trainer_id),
        customer_id: Some(customer.id),
        ..Default::default()
    };
    let recent_sessions = db::list_sessions(db, &pair, 10, 0).await.validate_custom()?;
    let progress_entries = db::list_progress(db, customer.id, 10).await.validate_custom()?;
    let active_goals = db::list_goals(db, customer.id, Some(GoalStatus::Active), Some(5))
        .await
        .validate_custom()?;

    Ok(Json(ClientDetail {
        total_sessions: or_zero(db::count_sessions(db, &pair).await, "Client sessions"),
        completed_sessions: or_zero(
            db::count_sessions(db, &pair.clone().status(SessionStatus::Completed)).await,
            "Client completed sessions",
        ),
        customer,
        assignment,
        recent_sessions,
        progress_entries,
        active_goals,
    }))
}

#[derive(Serialize)]
pub struct ClientProgress {
    pub customer: Customer,
    pub assignment: TrainerAssignment,
    pub progress_entries: Vec<WorkoutProgress>,
    pub goals: Vec<Goal>,
}

#[get("/clients/<client_id>/progress")]
pub async fn api_client_progress(
    client_id: i64,
    auth: TrainerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<ClientProgress> {
    auth.user
        .require_permission(Permission::ViewAssignedClients)
        .validate_custom()?;
    let (customer, assignment) = assigned_client(db, auth.trainer.id, client_id).await?;

    let progress_entries = db::list_progress(db, customer.id, ALL).await.validate_custom()?;
    let goals = db::list_goals(db, customer.id, None, None)
        .await
        .validate_custom()?;

    Ok(Json(ClientProgress {
        customer,
        assignment,
        progress_entries,
        goals,
    }))
}

#[derive(Serialize)]
pub struct SessionList {
    pub sessions: Page<TrainingSession>,
    pub status_filter: Option<SessionStatus>,
    pub date_filter: Option<String>,
    pub total_sessions: i64,
    pub completed_sessions: i64,
    pub upcoming_sessions: i64,
}

/// `today`, `week` and `month` narrow by session date; anything else is ignored.
fn date_range_filter(filter: SessionFilter, range: &str, today: NaiveDate) -> SessionFilter {
    match range {
        "today" => filter.between(today, today),
        "week" => SessionFilter {
            from: Some(week_start(today)),
            ..filter
        },
        "month" => SessionFilter {
            from: Some(month_start(today)),
            ..filter
        },
        _ => filter,
    }
}

#[get("/sessions?<status>&<date_range>&<page>")]
pub async fn api_sessions(
    status: Option<String>,
    date_range: Option<String>,
    page: Option<i64>,
    auth: TrainerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<SessionList> {
    let today = Utc::now().date_naive();
    let status_filter = status.and_then(|s| s.parse::<SessionStatus>().ok());

    let mut filter = SessionFilter::for_trainer(auth.trainer.id);
    if let Some(range) = date_range.as_deref() {
        filter = date_range_filter(filter, range, today);
    }
    if let Some(status) = status_filter {
        filter = filter.status(status);
    }

    let total = db::count_sessions(db, &filter).await.validate_custom()?;
    let window = PageWindow::new(page, SESSIONS_PER_PAGE, total);
    let sessions = db::list_sessions(db, &filter, window.limit, window.offset)
        .await
        .validate_custom()?;

    let completed_sessions = match status_filter {
        None | Some(SessionStatus::Completed) => or_zero(
            db::count_sessions(db, &filter.clone().status(SessionStatus::Completed)).await,
            "Completed sessions",
        ),
        Some(_) => 0,
    };
    let from = filter.from.map_or(today, |from| from.max(today));
    let upcoming = filter.clone().upcoming_from(from);

    Ok(Json(SessionList {
        completed_sessions,
        upcoming_sessions: or_zero(db::count_sessions(db, &upcoming).await, "Upcoming sessions"),
        sessions: window.into_page(sessions, total),
        status_filter,
        date_filter: date_range,
        total_sessions: total,
    }))
}

#[derive(Serialize)]
pub struct ScheduleOverview {
    pub assigned_customers: Vec<Customer>,
    pub upcoming_sessions: Vec<TrainingSession>,
    pub today: NaiveDate,
    pub tomorrow: NaiveDate,
}

#[get("/schedule")]
pub async fn api_schedule(
    auth: TrainerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<ScheduleOverview> {
    let trainer_id = auth.trainer.id;
    let today = Utc::now().date_naive();

    let assigned_customers = db::list_trainer_clients(db, trainer_id, None, ALL, 0)
        .await
        .validate_custom()?;
    let upcoming_sessions = db::list_sessions(
        db,
        &SessionFilter::for_trainer(trainer_id).upcoming_from(today),
        ALL,
        0,
    )
    .await
    .validate_custom()?;

    Ok(Json(ScheduleOverview {
        assigned_customers,
        upcoming_sessions,
        tomorrow: today.succ_opt().unwrap_or(today),
        today,
    }))
}

#[derive(Deserialize, Validate)]
pub struct ScheduleRequest {
    customer_id: i64,
    session_date: String,
    session_time: String,
    #[serde(default)]
    session_type: SessionType,
    #[serde(default = "default_duration")]
    #[validate(range(min = 15, max = 480, message = "Duration must be between 15 and 480 minutes"))]
    duration_minutes: i64,
    #[serde(default)]
    notes: String,
}

fn default_duration() -> i64 {
    60
}

fn parse_slot(date: &str, time: &str) -> Option<(NaiveDate, NaiveTime)> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time.trim(), "%H:%M:%S"))
        .ok()?;
    Some((date, time))
}

#[post("/schedule", data = "<request>")]
pub async fn api_schedule_session(
    request: Json<ScheduleRequest>,
    auth: TrainerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<TrainingSession> {
    auth.user
        .require_permission(Permission::ScheduleSessions)
        .validate_custom()?;
    let request = request.validate_custom()?;
    let trainer_id = auth.trainer.id;

    db::get_customer(db, request.customer_id)
        .await
        .validate_custom()?;
    ensure_client(db, trainer_id, request.customer_id).await?;

    let Some((session_date, session_time)) =
        parse_slot(&request.session_date, &request.session_time)
    else {
        return Err(api_error(
            Status::UnprocessableEntity,
            "session_date",
            "Invalid date or time format.",
        ));
    };

    let session = db::create_session(
        db,
        &NewSession {
            trainer_id,
            customer_id: request.customer_id,
            session_date,
            session_time,
            duration_minutes: request.duration_minutes,
            session_type: request.session_type,
            notes: request.notes,
        },
    )
    .await
    .validate_custom()?;

    db::create_notification(
        db,
        request.customer_id,
        "New Session Scheduled",
        &format!(
            "Your trainer has scheduled a {} session for {} at {}.",
            session.session_type.as_str(),
            session.session_date,
            session.session_time.format("%H:%M")
        ),
        NotificationType::Session,
    )
    .await
    .validate_custom()?;

    Ok(Json(session))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    status: String,
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[post("/sessions/<session_id>/status", data = "<request>")]
pub async fn api_update_session_status(
    session_id: i64,
    request: Json<StatusRequest>,
    auth: TrainerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<MessageResponse> {
    auth.user
        .require_permission(Permission::ScheduleSessions)
        .validate_custom()?;

    let status = match request.status.parse::<SessionStatus>() {
        Ok(status) if status.is_trainer_settable() => status,
        _ => return Err(api_error(Status::BadRequest, "status", "Invalid status")),
    };

    let session = db::get_session(db, auth.trainer.id, session_id)
        .await
        .validate_custom()?;
    db::update_session_status(db, session.id, status)
        .await
        .validate_custom()?;

    db::create_notification(
        db,
        session.customer_id,
        &format!("Session {}", title_case(status.as_str())),
        &format!(
            "Your session scheduled for {} has been {}.",
            session.session_date,
            status.as_str()
        ),
        NotificationType::Session,
    )
    .await
    .validate_custom()?;

    Ok(ok_message("Session updated."))
}

#[derive(Deserialize)]
pub struct NotesRequest {
    #[serde(default)]
    notes: String,
}

#[post("/sessions/<session_id>/notes", data = "<request>")]
pub async fn api_add_session_notes(
    session_id: i64,
    request: Json<NotesRequest>,
    auth: TrainerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<MessageResponse> {
    let session = db::get_session(db, auth.trainer.id, session_id)
        .await
        .validate_custom()?;
    db::set_trainer_notes(db, session.id, &request.notes)
        .await
        .validate_custom()?;
    Ok(ok_message("Notes saved."))
}

#[derive(Serialize)]
pub struct TrainerMessageList {
    pub messages: Page<TrainerMessage>,
    pub counts: InboxCounts,
    pub assigned_customers: Vec<Customer>,
}

#[get("/messages?<page>")]
pub async fn api_messages(
    page: Option<i64>,
    auth: TrainerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<TrainerMessageList> {
    let trainer_id = auth.trainer.id;
    let mailbox = Mailbox::Trainer(trainer_id);
    let counts = db::message_counts(db, mailbox, Utc::now())
        .await
        .unwrap_or_else(|err| {
            err.log_and_record("Trainer message counts");
            InboxCounts::default()
        });

    let window = PageWindow::new(page, MESSAGES_PER_PAGE, counts.total);
    let messages = db::list_messages(db, mailbox, false, window.limit, window.offset)
        .await
        .validate_custom()?;
    let assigned_customers = db::list_trainer_clients(db, trainer_id, None, ALL, 0)
        .await
        .validate_custom()?;

    Ok(Json(TrainerMessageList {
        messages: window.into_page(messages, counts.total),
        counts,
        assigned_customers,
    }))
}

#[derive(Deserialize, Validate)]
pub struct SendMessageRequest {
    customer_id: i64,
    #[validate(length(min = 1, max = 200, message = "Subject is required"))]
    subject: String,
    #[validate(length(min = 1, message = "Message cannot be empty"))]
    message: String,
}

#[derive(Serialize, Deserialize)]
pub struct SentMessage {
    pub success: bool,
    pub message_id: i64,
}

#[post("/messages", data = "<request>")]
pub async fn api_send_message(
    request: Json<SendMessageRequest>,
    auth: TrainerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<SentMessage> {
    auth.user
        .require_permission(Permission::MessageClients)
        .validate_custom()?;
    let request = request.validate_custom()?;
    let trainer_id = auth.trainer.id;

    db::get_customer(db, request.customer_id)
        .await
        .validate_custom()?;
    ensure_client(db, trainer_id, request.customer_id).await?;

    let message_id = db::create_message(
        db,
        trainer_id,
        request.customer_id,
        request.subject.trim(),
        &request.message,
    )
    .await
    .validate_custom()?;

    db::create_notification(
        db,
        request.customer_id,
        "New Message from Trainer",
        &format!(
            "You have a new message from your trainer: {}",
            request.subject.trim()
        ),
        NotificationType::Message,
    )
    .await
    .validate_custom()?;

    Ok(Json(SentMessage {
        success: true,
        message_id,
    }))
}

#[derive(Serialize)]
pub struct ClientProgressFeed {
    pub client_progress: Vec<WorkoutProgress>,
    pub assigned_customers: Vec<Customer>,
}

#[get("/progress")]
pub async fn api_progress_feed(
    auth: TrainerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<ClientProgressFeed> {
    let trainer_id = auth.trainer.id;
    let client_progress = db::recent_client_progress(db, trainer_id, 20)
        .await
        .validate_custom()?;
    let assigned_customers = db::list_trainer_clients(db, trainer_id, None, ALL, 0)
        .await
        .validate_custom()?;

    Ok(Json(ClientProgressFeed {
        client_progress,
        assigned_customers,
    }))
}

#[get("/resources")]
pub async fn api_resources(
    _auth: TrainerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Vec<Resource>> {
    let filter = ResourceFilter {
        include_premium: true,
        ..Default::default()
    };
    let resources = db::list_resources(db, &filter).await.validate_custom()?;
    Ok(Json(resources))
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct TrainerReport {
    pub total_clients: i64,
    pub total_sessions: i64,
    pub completed_sessions: i64,
    pub monthly_sessions: i64,
    pub monthly_completed: i64,
}

async fn trainer_report(
    db: &Pool<Sqlite>,
    trainer_id: i64,
    today: NaiveDate,
) -> Result<TrainerReport, AppError> {
    let all = SessionFilter::for_trainer(trainer_id);
    let month = SessionFilter {
        from: Some(month_start(today)),
        ..all.clone()
    };

    Ok(TrainerReport {
        total_clients: db::count_trainer_clients(db, trainer_id, None).await?,
        total_sessions: db::count_sessions(db, &all).await?,
        completed_sessions: db::count_sessions(db, &all.clone().status(SessionStatus::Completed))
            .await?,
        monthly_sessions: db::count_sessions(db, &month).await?,
        monthly_completed: db::count_sessions(db, &month.status(SessionStatus::Completed)).await?,
    })
}

#[get("/reports")]
pub async fn api_reports(
    auth: TrainerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<TrainerReport> {
    let report = trainer_report(db, auth.trainer.id, Utc::now().date_naive())
        .await
        .validate_custom()?;
    Ok(Json(report))
}

#[get("/profile")]
pub fn api_get_profile(auth: TrainerUser) -> ApiResult<Trainer> {
    auth.user
        .require_permission(Permission::ViewOwnProfile)
        .validate_custom()?;
    Ok(Json(auth.trainer))
}

#[derive(Deserialize, Validate)]
pub struct TrainerProfileRequest {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[validate(email(message = "Enter a valid email address."))]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    bio: String,
    #[serde(default)]
    specializations: String,
    #[serde(default)]
    #[validate(range(min = 0, max = 80, message = "Experience must be between 0 and 80 years"))]
    experience_years: i64,
    #[validate(range(min = 0.0, message = "Hourly rate cannot be negative"))]
    hourly_rate: Option<f64>,
}

#[put("/profile", data = "<request>")]
pub async fn api_update_profile(
    request: Json<TrainerProfileRequest>,
    auth: TrainerUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Trainer> {
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

    let update = TrainerProfileUpdate {
        address: request.address,
        bio: request.bio,
        specializations: request.specializations,
        experience_years: request.experience_years,
        hourly_rate_cents: request.hourly_rate.map(|rate| (rate * 100.0).round() as i64),
    };
    db::update_trainer_profile(db, auth.trainer.id, &update)
        .await
        .validate_custom()?;

    let trainer = db::get_trainer(db, auth.trainer.id).await.validate_custom()?;
    Ok(Json(trainer))
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DashboardUpdates {
    pub sessions_today: i64,
    pub upcoming_sessions: i64,
    pub total_clients: i64,
}

#[get("/dashboard-updates")]
pub async fn api_dashboard_updates(
    auth: TrainerUser,
    db: &State<Pool<Sqlite>>,
) -> Json<DashboardUpdates> {
    let trainer_id = auth.trainer.id;
    let today = Utc::now().date_naive();
    let mine = SessionFilter::for_trainer(trainer_id);

    Json(DashboardUpdates {
        sessions_today: or_zero(
            db::count_sessions(db, &mine.clone().between(today, today)).await,
            "Sessions today",
        ),
        upcoming_sessions: or_zero(
            db::count_sessions(db, &mine.upcoming_from(today)).await,
            "Upcoming sessions",
        ),
        total_clients: or_zero(
            db::count_trainer_clients(db, trainer_id, None).await,
            "Trainer client count",
        ),
    })
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        api_dashboard,
        api_clients,
        api_client_detail,
        api_client_progress,
        api_sessions,
        api_schedule,
        api_schedule_session,
        api_update_session_status,
        api_add_session_notes,
        api_messages,
        api_send_message,
        api_progress_feed,
        api_resources,
        api_reports,
        api_get_profile,
        api_update_profile,
        api_dashboard_updates,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_starts_on_monday() {
        let thursday = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();
        assert_eq!(week_start(thursday), NaiveDate::from_ymd_opt(2025, 6, 9).unwrap());
        let monday = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        assert_eq!(week_start(monday), monday);
    }

    #[test]
    fn test_slot_parsing() {
        let (date, time) = parse_slot("2025-07-01", "09:30").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        assert_eq!(time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert!(parse_slot("2025-07-01", "09:30:15").is_some());
        assert!(parse_slot("01/07/2025", "09:30").is_none());
        assert!(parse_slot("2025-07-01", "half past nine").is_none());
    }

    #[test]
    fn test_status_titles() {
        assert_eq!(title_case("confirmed"), "Confirmed");
        assert_eq!(title_case(""), "");
    }
}
