use chrono::{DateTime, Utc};
use rocket::State;
use rocket::http::Status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use super::{MessageResponse, ok_message, or_zero};
use crate::assignment::{assign_trainer, auto_assign_trainer, bulk_auto_assign, pick_least_loaded};
use crate::auth::{AdminUser, Permission};
use crate::db::{self, CustomerFilter, Mailbox, NewPlan, NewResource};
use crate::error::AppError;
use crate::mailer::MailService;
use crate::models::{
    Customer, NotificationType, RegistrationStatus, ResourceType, SubscriptionPlan, Trainer,
    TrainerAssignment, TrainerMessage, TrainerRegistration, TrainerWorkload,
};
use crate::validation::{
    ApiError, ApiResult, AppErrorExt, JsonValidateExt, PermissionCheckExt, api_error,
};

fn require(admin: &AdminUser, permission: Permission) -> Result<(), ApiError> {
    admin.user.require_permission(permission).validate_custom()
}

/// True when the customer's subscription is current and includes trainer support.
async fn has_personal_training(
    db: &Pool<Sqlite>,
    customer_id: i64,
    now: DateTime<Utc>,
) -> Result<bool, AppError> {
    Ok(db::get_subscription_with_plan(db, customer_id)
        .await?
        .is_some_and(|(subscription, plan)| subscription.is_current_at(now) && plan.trainer_support))
}

#[derive(Serialize)]
pub struct AssignmentStats {
    pub total_customers: i64,
    pub assigned_customers: i64,
    pub unassigned_customers: i64,
    pub active_trainers: i64,
    pub avg_clients_per_trainer: f64,
    pub total_trainers: i64,
    pub pending_registrations: i64,
}

#[derive(Serialize)]
pub struct AdminDashboard {
    pub stats: AssignmentStats,
    pub recent_assignments: Vec<TrainerAssignment>,
    pub trainer_workload: Vec<TrainerWorkload>,
    pub unassigned_customers: Vec<Customer>,
}

fn average_clients(assigned: i64, active_trainers: i64) -> f64 {
    if active_trainers == 0 {
        return 0.0;
    }
    (assigned as f64 / active_trainers as f64 * 10.0).round() / 10.0
}

#[get("/dashboard")]
pub async fn api_dashboard(
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<AdminDashboard> {
    require(&admin, Permission::ViewAdminDashboard)?;
    let now = Utc::now();

    let mut trainer_workload = db::trainer_workloads(db).await.validate_custom()?;
    let unassigned_all = db::unassigned_support_customers(db, now, None)
        .await
        .validate_custom()?;
    let recent_assignments = db::recent_assignments(db, 10).await.validate_custom()?;

    let assigned_customers = or_zero(
        db::count_active_assignments(db).await,
        "Active assignment count",
    );
    let active_trainers = trainer_workload
        .iter()
        .filter(|w| w.active_clients > 0)
        .count() as i64;

    let stats = AssignmentStats {
        total_customers: or_zero(
            db::count_support_customers(db, now).await,
            "Personal training customers",
        ),
        assigned_customers,
        unassigned_customers: unassigned_all.len() as i64,
        active_trainers,
        avg_clients_per_trainer: average_clients(assigned_customers, active_trainers),
        total_trainers: trainer_workload.len() as i64,
        pending_registrations: or_zero(
            db::count_pending_registrations(db).await,
            "Pending registrations",
        ),
    };

    // Busiest trainers first; the stable sort keeps id order among equals.
    trainer_workload.sort_by(|a, b| b.active_clients.cmp(&a.active_clients));

    Ok(Json(AdminDashboard {
        stats,
        recent_assignments,
        trainer_workload,
        unassigned_customers: unassigned_all.into_iter().take(5).collect(),
    }))
}

#[get("/customers?<filter>&<search>")]
pub async fn api_customers(
    filter: Option<String>,
    search: Option<String>,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Vec<Customer>> {
    require(&admin, Permission::ViewAdminDashboard)?;
    let filter = filter.and_then(|f| f.parse::<CustomerFilter>().ok());
    let customers = db::list_customers(db, filter, search.as_deref())
        .await
        .validate_custom()?;
    Ok(Json(customers))
}

#[get("/trainers?<verified>")]
pub async fn api_trainers(
    verified: Option<bool>,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Vec<Trainer>> {
    require(&admin, Permission::ViewAdminDashboard)?;
    let trainers = db::list_trainers(db, verified).await.validate_custom()?;
    Ok(Json(trainers))
}

#[get("/workloads")]
pub async fn api_workloads(
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Vec<TrainerWorkload>> {
    require(&admin, Permission::ManageAssignments)?;
    let mut workloads = db::trainer_workloads(db).await.validate_custom()?;
    workloads.sort_by_key(|w| w.active_clients);
    Ok(Json(workloads))
}

#[derive(Deserialize)]
pub struct AssignRequest {
    trainer_id: i64,
    #[serde(default)]
    notes: String,
}

fn no_personal_training() -> ApiError {
    api_error(
        Status::UnprocessableEntity,
        "customer",
        "Customer does not have an active personal training subscription.",
    )
}

#[post("/customers/<customer_id>/assign", data = "<request>")]
pub async fn api_assign_trainer(
    customer_id: i64,
    request: Json<AssignRequest>,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
    mail: &State<MailService>,
) -> ApiResult<TrainerAssignment> {
    require(&admin, Permission::ManageAssignments)?;
    let now = Utc::now();

    let customer = db::get_customer(db, customer_id).await.validate_custom()?;
    if !has_personal_training(db, customer.id, now)
        .await
        .validate_custom()?
    {
        return Err(no_personal_training());
    }

    let trainer = db::get_trainer(db, request.trainer_id)
        .await
        .validate_custom()?;
    let assignment = assign_trainer(db, mail, &customer, &trainer, request.notes.trim(), now)
        .await
        .validate_custom()?;

    Ok(Json(assignment))
}

#[post("/customers/<customer_id>/auto-assign")]
pub async fn api_auto_assign(
    customer_id: i64,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
    mail: &State<MailService>,
) -> ApiResult<TrainerAssignment> {
    require(&admin, Permission::ManageAssignments)?;
    let now = Utc::now();

    db::get_customer(db, customer_id).await.validate_custom()?;
    if !has_personal_training(db, customer_id, now)
        .await
        .validate_custom()?
    {
        return Err(no_personal_training());
    }

    match auto_assign_trainer(db, mail, customer_id, now)
        .await
        .validate_custom()?
    {
        Some(assignment) => Ok(Json(assignment)),
        None => Err(api_error(
            Status::Conflict,
            "trainer",
            "No verified trainers are available.",
        )),
    }
}

#[derive(Serialize, Deserialize)]
pub struct BulkAssignResponse {
    pub success: bool,
    pub message: String,
    pub assigned_count: usize,
}

impl BulkAssignResponse {
    fn assigned(count: usize) -> Json<Self> {
        Json(Self {
            success: true,
            message: format!("Successfully assigned trainers to {} customers.", count),
            assigned_count: count,
        })
    }
}

#[post("/assignments/auto")]
pub async fn api_bulk_auto_assign(
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
    mail: &State<MailService>,
) -> ApiResult<BulkAssignResponse> {
    require(&admin, Permission::ManageAssignments)?;
    let assigned = bulk_auto_assign(db, mail, Utc::now())
        .await
        .validate_custom()?;
    Ok(BulkAssignResponse::assigned(assigned.len()))
}

#[derive(Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentMethod {
    Auto,
    Specific,
}

#[derive(Deserialize)]
pub struct BulkAssignRequest {
    customer_ids: Vec<i64>,
    assignment_method: AssignmentMethod,
    specific_trainer: Option<i64>,
    #[serde(default)]
    notes: String,
}

/// Assigns the selected customers that are eligible and not yet assigned. Auto mode
/// balances load across trainers; specific mode gives them all to one trainer.
#[post("/assignments/bulk", data = "<request>")]
pub async fn api_bulk_assign(
    request: Json<BulkAssignRequest>,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
    mail: &State<MailService>,
) -> ApiResult<BulkAssignResponse> {
    require(&admin, Permission::ManageAssignments)?;
    let now = Utc::now();
    let request = request.into_inner();

    let specific = match (request.assignment_method, request.specific_trainer) {
        (AssignmentMethod::Specific, Some(trainer_id)) => {
            let trainer = db::get_trainer(db, trainer_id).await.validate_custom()?;
            if !trainer.is_verified {
                return Err(api_error(
                    Status::NotFound,
                    "trainer",
                    "Trainer not found",
                ));
            }
            Some(trainer)
        }
        (AssignmentMethod::Specific, None) => {
            return Err(api_error(
                Status::BadRequest,
                "assignment_method",
                "Invalid assignment method.",
            ));
        }
        (AssignmentMethod::Auto, _) => None,
    };

    let default_notes = match specific {
        Some(_) => format!("Bulk assigned on {}", now.date_naive()),
        None => format!("Auto-assigned on {}", now.date_naive()),
    };
    let notes = Some(request.notes.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or(default_notes);

    let mut assigned = 0;
    for customer_id in request.customer_ids {
        let customer = match db::get_customer(db, customer_id).await {
            Ok(customer) => customer,
            Err(AppError::NotFound(_)) => continue,
            Err(err) => return Err(err).validate_custom(),
        };
        if !has_personal_training(db, customer.id, now)
            .await
            .validate_custom()?
            || db::get_active_assignment_for_customer(db, customer.id)
                .await
                .validate_custom()?
                .is_some()
        {
            continue;
        }

        let trainer = match &specific {
            Some(trainer) => trainer.clone(),
            None => {
                let workloads = db::trainer_workloads(db).await.validate_custom()?;
                let Some(trainer_id) = pick_least_loaded(&workloads) else {
                    break;
                };
                db::get_trainer(db, trainer_id).await.validate_custom()?
            }
        };

        assign_trainer(db, mail, &customer, &trainer, &notes, now)
            .await
            .validate_custom()?;
        assigned += 1;
    }

    Ok(BulkAssignResponse::assigned(assigned))
}

#[derive(Deserialize)]
pub struct CustomerIds {
    customer_ids: Vec<i64>,
}

#[post("/assignments/remove", data = "<request>")]
pub async fn api_remove_assignments(
    request: Json<CustomerIds>,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<MessageResponse> {
    require(&admin, Permission::ManageAssignments)?;
    let now = Utc::now();

    let mut removed = 0;
    for customer_id in &request.customer_ids {
        if db::deactivate_assignment(db, *customer_id, now)
            .await
            .validate_custom()?
        {
            removed += 1;
        }
    }

    Ok(ok_message(format!(
        "Removed trainer assignments for {} customers.",
        removed
    )))
}

#[post("/trainers/<trainer_id>/approve")]
pub async fn api_approve_trainer(
    trainer_id: i64,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
    mail: &State<MailService>,
) -> ApiResult<MessageResponse> {
    require(&admin, Permission::VerifyTrainers)?;

    let trainer = db::get_trainer(db, trainer_id).await.validate_custom()?;
    if trainer.is_verified {
        return Ok(ok_message("Trainer is already verified."));
    }

    db::set_trainer_verified(db, trainer.id, true)
        .await
        .validate_custom()?;
    mail.send_quietly(
        &trainer.email,
        "Trainer Account Approved",
        "Congratulations! Your trainer account has been approved. You can now log in and start working with clients.",
    )
    .await;

    Ok(ok_message(format!("Approved trainer {}.", trainer.full_name())))
}

#[post("/trainers/<trainer_id>/reject")]
pub async fn api_reject_trainer(
    trainer_id: i64,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
    mail: &State<MailService>,
) -> ApiResult<MessageResponse> {
    require(&admin, Permission::VerifyTrainers)?;

    let trainer = db::get_trainer(db, trainer_id).await.validate_custom()?;
    if trainer.is_verified {
        return Err(api_error(
            Status::Conflict,
            "trainer",
            "Verified trainers cannot be rejected.",
        ));
    }

    db::delete_user(db, trainer.user_id).await.validate_custom()?;
    mail.send_quietly(
        &trainer.email,
        "Trainer Application Rejected",
        "We regret to inform you that your trainer application has been rejected. Please contact support for more information.",
    )
    .await;

    Ok(ok_message("Rejected trainer application."))
}

#[get("/registrations?<status>")]
pub async fn api_registrations(
    status: Option<String>,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Vec<TrainerRegistration>> {
    require(&admin, Permission::VerifyTrainers)?;
    let status = status.and_then(|s| s.parse::<RegistrationStatus>().ok());
    let registrations = db::list_registrations(db, status)
        .await
        .validate_custom()?;
    Ok(Json(registrations))
}

#[derive(Deserialize)]
pub struct RegistrationDecision {
    email: String,
    #[serde(default)]
    reason: String,
}

#[post("/registrations/approve", data = "<request>")]
pub async fn api_approve_registration(
    request: Json<RegistrationDecision>,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
    mail: &State<MailService>,
) -> ApiResult<TrainerRegistration> {
    require(&admin, Permission::VerifyTrainers)?;

    let registration = db::approve_registration(db, request.email.trim(), admin.user.id)
        .await
        .validate_custom()?;
    mail.send_quietly(
        &registration.email,
        "Trainer Registration Approved",
        format!(
            "Hello {},\n\nYour trainer registration has been approved. Log in with {} as your username.",
            registration.username, registration.email
        ),
    )
    .await;

    Ok(Json(registration))
}

#[post("/registrations/reject", data = "<request>")]
pub async fn api_reject_registration(
    request: Json<RegistrationDecision>,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
    mail: &State<MailService>,
) -> ApiResult<TrainerRegistration> {
    require(&admin, Permission::VerifyTrainers)?;

    let reason = request.reason.trim();
    let registration = db::reject_registration(db, request.email.trim(), admin.user.id, reason)
        .await
        .validate_custom()?;
    mail.send_quietly(
        &registration.email,
        "Trainer Registration Rejected",
        format!(
            "Hello {},\n\nYour trainer registration was rejected. Reason: {}",
            registration.username,
            if reason.is_empty() { "Not specified" } else { reason }
        ),
    )
    .await;

    Ok(Json(registration))
}

#[derive(Deserialize)]
pub struct ShareRequest {
    customer_ids: Vec<i64>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    notify_email: bool,
}

#[derive(Serialize, Deserialize)]
pub struct ShareResponse {
    pub success: bool,
    pub message: String,
    pub shared_count: usize,
}

/// Shares with the selected customers that hold a personal training subscription.
#[post("/resources/<resource_id>/share", data = "<request>")]
pub async fn api_share_resource(
    resource_id: i64,
    request: Json<ShareRequest>,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
    mail: &State<MailService>,
) -> ApiResult<ShareResponse> {
    require(&admin, Permission::ShareResources)?;
    let now = Utc::now();

    let resource = db::get_resource(db, resource_id).await.validate_custom()?;
    let note = request.message.trim();
    let mut notification = format!("New resource shared: {}", resource.title);
    if !note.is_empty() {
        notification.push_str(&format!("\n\nMessage from admin: {}", note));
    }

    let mut shared_count = 0;
    for customer_id in &request.customer_ids {
        let customer = match db::get_customer(db, *customer_id).await {
            Ok(customer) => customer,
            Err(AppError::NotFound(_)) => continue,
            Err(err) => return Err(err).validate_custom(),
        };
        if !has_personal_training(db, customer.id, now)
            .await
            .validate_custom()?
        {
            continue;
        }

        db::create_notification(
            db,
            customer.id,
            "New Resource Shared",
            &notification,
            NotificationType::General,
        )
        .await
        .validate_custom()?;

        if request.notify_email {
            let mut body = format!(
                "Hello {},\n\nA new resource has been shared with you: {}\n\nDescription: {}\n\n\
                 You can access this resource from your dashboard under the Resources section.",
                customer.full_name(),
                resource.title,
                resource.description
            );
            if !note.is_empty() {
                body.push_str(&format!("\n\nPersonal message from admin:\n{}", note));
            }
            body.push_str("\n\nBest regards,\nFitTrack Team");
            mail.send_quietly(
                &customer.email,
                &format!("New Resource: {}", resource.title),
                body,
            )
            .await;
        }
        shared_count += 1;
    }

    Ok(Json(ShareResponse {
        success: true,
        message: format!("Resource shared with {} customers.", shared_count),
        shared_count,
    }))
}

#[derive(Deserialize, Validate)]
pub struct FacilitatedMessage {
    #[validate(length(min = 1, max = 200, message = "Subject is required"))]
    subject: String,
    #[validate(length(min = 1, message = "Message cannot be empty"))]
    message: String,
}

#[post("/messages/<customer_id>/<trainer_id>", data = "<request>")]
pub async fn api_send_message(
    customer_id: i64,
    trainer_id: i64,
    request: Json<FacilitatedMessage>,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
    mail: &State<MailService>,
) -> ApiResult<TrainerMessage> {
    require(&admin, Permission::FacilitateMessages)?;
    let request = request.validate_custom()?;

    let customer = db::get_customer(db, customer_id).await.validate_custom()?;
    let trainer = db::get_trainer(db, trainer_id).await.validate_custom()?;
    if !db::is_client_of(db, trainer.id, customer.id)
        .await
        .validate_custom()?
    {
        return Err(api_error(
            Status::UnprocessableEntity,
            "assignment",
            "No active assignment found between this customer and trainer.",
        ));
    }

    let subject = request.subject.trim();
    let message_id = db::create_message(
        db,
        trainer.id,
        customer.id,
        &format!("[Admin] {}", subject),
        &format!("Message facilitated by admin:\n\n{}", request.message),
    )
    .await
    .validate_custom()?;

    db::create_notification(
        db,
        customer.id,
        "New Message from Trainer",
        &format!("Your trainer sent you a message: {}", subject),
        NotificationType::Message,
    )
    .await
    .validate_custom()?;

    mail.send_quietly(
        &customer.email,
        &format!("New Message: {}", subject),
        format!(
            "Hello {},\n\nYou have received a new message from {}.\n\nSubject: {}\nMessage: {}\n\n\
             Please log into your dashboard to view and respond to this message.",
            customer.full_name(),
            trainer.full_name(),
            subject,
            request.message
        ),
    )
    .await;

    let message = db::get_message_for_customer(db, customer.id, message_id)
        .await
        .validate_custom()?;
    Ok(Json(message))
}

#[get("/messages/<customer_id>/<trainer_id>")]
pub async fn api_conversation(
    customer_id: i64,
    trainer_id: i64,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Vec<TrainerMessage>> {
    require(&admin, Permission::FacilitateMessages)?;
    let messages = db::list_messages(db, Mailbox::Customer(customer_id), false, 50, 0)
        .await
        .validate_custom()?;
    Ok(Json(
        messages
            .into_iter()
            .filter(|m| m.trainer_id == trainer_id)
            .take(5)
            .collect(),
    ))
}

#[derive(Deserialize)]
pub struct NotificationIds {
    ids: Vec<i64>,
}

#[post("/notifications/<state>", data = "<request>")]
pub async fn api_bulk_notifications(
    state: &str,
    request: Json<NotificationIds>,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<MessageResponse> {
    require(&admin, Permission::ManageNotifications)?;
    let is_read = match state {
        "read" => true,
        "unread" => false,
        _ => return Err(api_error(Status::NotFound, "resource", "Resource not found")),
    };

    let count = db::set_notifications_read(db, &request.ids, is_read)
        .await
        .validate_custom()?;
    Ok(ok_message(format!(
        "{} notifications marked as {}.",
        count, state
    )))
}

#[derive(Deserialize, Validate)]
pub struct PlanRequest {
    #[validate(length(min = 1, max = 100, message = "Plan name is required"))]
    name: String,
    #[serde(default)]
    description: String,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    price: f64,
    #[validate(range(min = 0, message = "Duration cannot be negative"))]
    duration_days: i64,
    #[serde(default)]
    features: serde_json::Value,
    #[serde(default)]
    is_featured: bool,
    #[serde(default)]
    trial_days: i64,
    #[serde(default)]
    workout_videos: bool,
    #[serde(default)]
    meal_plans: bool,
    #[serde(default)]
    trainer_support: bool,
    #[serde(default)]
    progress_tracking: bool,
    #[serde(default)]
    live_sessions: bool,
    #[serde(default)]
    personal_sessions: bool,
    #[serde(default)]
    nutrition_guidance: bool,
    #[serde(default)]
    premium_content: bool,
}

#[post("/plans", data = "<request>")]
pub async fn api_create_plan(
    request: Json<PlanRequest>,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<SubscriptionPlan> {
    require(&admin, Permission::ManageCatalog)?;
    let request = request.validate_custom()?;

    let plan = NewPlan {
        name: request.name.trim().to_string(),
        description: request.description,
        price_cents: (request.price * 100.0).round() as i64,
        duration_days: request.duration_days,
        features: request.features,
        is_featured: request.is_featured,
        trial_days: request.trial_days,
        workout_videos: request.workout_videos,
        meal_plans: request.meal_plans,
        trainer_support: request.trainer_support,
        progress_tracking: request.progress_tracking,
        live_sessions: request.live_sessions,
        personal_sessions: request.personal_sessions,
        nutrition_guidance: request.nutrition_guidance,
        premium_content: request.premium_content,
    };
    let plan_id = db::create_plan(db, &plan).await.validate_custom()?;
    let plan = db::get_plan(db, plan_id).await.validate_custom()?;
    Ok(Json(plan))
}

#[derive(Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Category name is required"))]
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Serialize, Deserialize)]
pub struct CreatedResponse {
    pub success: bool,
    pub id: i64,
}

#[post("/categories", data = "<request>")]
pub async fn api_create_category(
    request: Json<CategoryRequest>,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<CreatedResponse> {
    require(&admin, Permission::ManageCatalog)?;
    let request = request.validate_custom()?;
    let id = db::create_category(db, request.name.trim(), &request.description)
        .await
        .validate_custom()?;
    Ok(Json(CreatedResponse { success: true, id }))
}

#[derive(Deserialize, Validate)]
pub struct ResourceRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    resource_type: ResourceType,
    category_id: Option<i64>,
    file_path: Option<String>,
    #[validate(url(message = "Enter a valid URL."))]
    external_url: Option<String>,
    #[validate(url(message = "Enter a valid URL."))]
    file_url: Option<String>,
    #[serde(default)]
    is_premium: bool,
}

#[post("/resources", data = "<request>")]
pub async fn api_create_resource(
    request: Json<ResourceRequest>,
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<CreatedResponse> {
    require(&admin, Permission::ManageCatalog)?;
    let request = request.validate_custom()?;

    let resource = NewResource {
        title: request.title.trim().to_string(),
        description: request.description,
        resource_type: request.resource_type,
        category_id: request.category_id,
        file_path: request.file_path,
        external_url: request.external_url,
        file_url: request.file_url,
        is_premium: request.is_premium,
    };
    let id = db::create_resource(db, &resource).await.validate_custom()?;
    Ok(Json(CreatedResponse { success: true, id }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        api_dashboard,
        api_customers,
        api_trainers,
        api_workloads,
        api_assign_trainer,
        api_auto_assign,
        api_bulk_auto_assign,
        api_bulk_assign,
        api_remove_assignments,
        api_approve_trainer,
        api_reject_trainer,
        api_registrations,
        api_approve_registration,
        api_reject_registration,
        api_share_resource,
        api_send_message,
        api_conversation,
        api_bulk_notifications,
        api_create_plan,
        api_create_category,
        api_create_resource,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_clients_rounds_to_one_decimal() {
        assert_eq!(average_clients(0, 0), 0.0);
        assert_eq!(average_clients(7, 3), 2.3);
        assert_eq!(average_clients(10, 4), 2.5);
    }
}
