use chrono::{Duration, Utc};
use rocket::State;
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use super::{MessageResponse, ok_message};
use crate::auth::{AdminUser, Permission, Role, SESSION_COOKIE, User, UserSession};
use crate::db::{
    NewAccount, authenticate_user, count_pending_registrations, create_account,
    create_registration, create_user_session, email_exists, get_registration,
    get_trainer_by_user_id, hash_password, invalidate_session, registration_email_taken,
    update_user_password, username_exists, verify_user_password,
};
use crate::env::AppConfig;
use crate::mailer::MailService;
use crate::models::RegistrationStatus;
use crate::otp::{OtpError, PendingSignup, SignupRole};
use crate::validation::{
    ApiResult, AppErrorExt, FieldErrors, JsonValidateExt, PermissionCheckExt, api_error,
    check_trainer_application,
};

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UserData {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name(),
            username: user.username,
            email: user.email,
            role: user.role.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: Option<UserData>,
    pub error: Option<String>,
    pub redirect_url: Option<String>,
}

impl LoginResponse {
    fn failed(error: &str) -> Json<Self> {
        Json(Self {
            success: false,
            user: None,
            error: Some(error.to_string()),
            redirect_url: None,
        })
    }
}

fn dashboard_url(role: Role) -> &'static str {
    match role {
        Role::Customer => "/customer/dashboard",
        Role::Trainer => "/trainer/dashboard",
        Role::Admin => "/admin/dashboard",
    }
}

#[post("/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> ApiResult<LoginResponse> {
    let validated = login.validate_custom()?;

    let Some(user) = authenticate_user(db, &validated.username, &validated.password)
        .await
        .validate_custom()?
    else {
        return Ok(LoginResponse::failed("Invalid username or password."));
    };

    if user.role == Role::Trainer {
        let trainer = get_trainer_by_user_id(db, user.id).await.validate_custom()?;
        if !trainer.map(|t| t.is_verified).unwrap_or(false) {
            tracing::warn!(username = %user.username, "Unverified trainer login refused");
            return Ok(LoginResponse::failed(
                "Your account is pending admin approval.",
            ));
        }
    }

    let token = UserSession::generate_token();
    let expires_at = Utc::now() + Duration::hours(config.session_hours);

    create_user_session(db, user.id, &token, expires_at.naive_utc())
        .await
        .validate_custom()?;

    cookies.add_private(
        Cookie::build((SESSION_COOKIE, token))
            .same_site(SameSite::Lax)
            .http_only(true)
            .max_age(rocket::time::Duration::hours(config.session_hours)),
    );

    let redirect_url = dashboard_url(user.role).to_string();
    Ok(Json(LoginResponse {
        success: true,
        user: Some(UserData::from(user)),
        error: None,
        redirect_url: Some(redirect_url),
    }))
}

#[post("/logout")]
pub async fn api_logout(cookies: &CookieJar<'_>, db: &State<Pool<Sqlite>>) -> Status {
    if let Some(cookie) = cookies.get_private(SESSION_COOKIE) {
        if let Err(err) = invalidate_session(db, cookie.value()).await {
            err.log_and_record("Logout");
        }
    }
    cookies.remove_private(Cookie::build(SESSION_COOKIE));
    Status::Ok
}

#[get("/me")]
pub fn api_me(user: User) -> Json<UserData> {
    Json(UserData::from(user))
}

#[derive(Deserialize, Validate)]
pub struct ChangePasswordRequest {
    current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long."))]
    new_password: String,
    confirm_password: String,
}

#[post("/change-password", data = "<request>")]
pub async fn api_change_password(
    request: Json<ChangePasswordRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<MessageResponse> {
    user.require_permission(Permission::EditOwnProfile)
        .validate_custom()?;
    let request = request.validate_custom()?;

    if request.new_password != request.confirm_password {
        return Err(api_error(
            Status::UnprocessableEntity,
            "confirm_password",
            "Passwords do not match.",
        ));
    }

    if !verify_user_password(db, user.id, &request.current_password)
        .await
        .validate_custom()?
    {
        return Err(api_error(
            Status::UnprocessableEntity,
            "current_password",
            "Current password is incorrect.",
        ));
    }

    update_user_password(db, user.id, &request.new_password)
        .await
        .validate_custom()?;

    Ok(ok_message("Your password was successfully updated!"))
}

#[derive(Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 150, message = "Username is required"))]
    username: String,
    #[validate(email(message = "Enter a valid email address."))]
    email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long."))]
    password: String,
    password2: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Phone number is required"))]
    phone: String,
    #[validate(length(min = 1, message = "Address is required"))]
    address: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct SignupResponse {
    pub success: bool,
    pub message: String,
    pub email: String,
    pub expires_at: String,
}

async fn begin_signup(
    request: Json<SignupRequest>,
    role: SignupRole,
    cookies: &CookieJar<'_>,
    mail: &MailService,
) -> ApiResult<SignupResponse> {
    let request = request.validate_custom()?;

    let mut errors = FieldErrors::new();
    if let Some(password2) = &request.password2 {
        if password2 != &request.password {
            errors.add("password2", "Passwords do not match.");
        }
    }
    let address = request.address.map(|a| a.trim().to_string());
    if role == SignupRole::Trainer && address.as_deref().unwrap_or_default().is_empty() {
        errors.add("address", "Address is required");
    }
    errors.into_result()?;

    let password_hash = hash_password(&request.password).validate_custom()?;
    let pending = PendingSignup::new(
        request.username.trim().to_string(),
        request.email.trim().to_string(),
        password_hash,
        request.phone.trim().to_string(),
        role,
        address,
        Utc::now(),
    );

    pending.store(cookies).map_err(|err| {
        tracing::error!(error = %err, "Could not store pending signup");
        api_error(
            Status::InternalServerError,
            "server",
            "Could not start signup",
        )
    })?;

    mail.send_quietly(
        &pending.email,
        "Your OTP Code",
        format!("Your OTP is {}", pending.otp),
    )
    .await;

    Ok(Json(SignupResponse {
        success: true,
        message: format!("OTP sent to your email ({}).", pending.email),
        email: pending.email.clone(),
        expires_at: pending.expires_at.to_rfc3339(),
    }))
}

#[post("/signup/customer", data = "<request>")]
pub async fn api_signup_customer(
    request: Json<SignupRequest>,
    cookies: &CookieJar<'_>,
    mail: &State<MailService>,
) -> ApiResult<SignupResponse> {
    begin_signup(request, SignupRole::Customer, cookies, mail).await
}

#[post("/signup/trainer", data = "<request>")]
pub async fn api_signup_trainer(
    request: Json<SignupRequest>,
    cookies: &CookieJar<'_>,
    mail: &State<MailService>,
) -> ApiResult<SignupResponse> {
    begin_signup(request, SignupRole::Trainer, cookies, mail).await
}

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    otp: String,
}

fn session_expired() -> crate::validation::ApiError {
    api_error(
        Status::BadRequest,
        "session",
        "Session expired. Please sign up again.",
    )
}

#[post("/verify-otp", data = "<request>")]
pub async fn api_verify_otp(
    request: Json<VerifyOtpRequest>,
    cookies: &CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
    mail: &State<MailService>,
) -> ApiResult<MessageResponse> {
    let Some(mut pending) = PendingSignup::load(cookies) else {
        return Err(session_expired());
    };

    match pending.verify(&request.otp, Utc::now()) {
        Ok(()) => {}
        Err(OtpError::TooManyAttempts) => {
            PendingSignup::clear(cookies);
            return Err(api_error(
                Status::TooManyRequests,
                "otp",
                &OtpError::TooManyAttempts.to_string(),
            ));
        }
        Err(err) => {
            if let Err(store_err) = pending.store(cookies) {
                tracing::error!(error = %store_err, "Could not update pending signup");
            }
            return Err(api_error(Status::BadRequest, "otp", &err.to_string()));
        }
    }

    if username_exists(db, &pending.username).await.validate_custom()? {
        PendingSignup::clear(cookies);
        return Err(api_error(
            Status::Conflict,
            "username",
            "Username already exists. Please choose another.",
        ));
    }
    if email_exists(db, &pending.email).await.validate_custom()? {
        PendingSignup::clear(cookies);
        return Err(api_error(
            Status::Conflict,
            "email",
            "Email already registered. Please login or use a different one.",
        ));
    }

    let role = match pending.role {
        SignupRole::Customer => Role::Customer,
        SignupRole::Trainer => Role::Trainer,
    };
    let account = NewAccount {
        username: pending.username.clone(),
        email: pending.email.clone(),
        password_hash: pending.password_hash.clone(),
        phone: pending.phone.clone(),
        address: pending.address.clone().unwrap_or_default(),
        trainer_verified: false,
        ..Default::default()
    };
    create_account(db, &account, role).await.validate_custom()?;

    mail.send_quietly(
        &pending.email,
        "Welcome!",
        "Your account has been created successfully.",
    )
    .await;
    PendingSignup::clear(cookies);

    let message = match role {
        Role::Trainer => {
            "Account created successfully. An admin will verify your trainer account before you can log in."
        }
        _ => "Account created successfully. Please login.",
    };
    Ok(ok_message(message))
}

#[post("/resend-otp")]
pub async fn api_resend_otp(
    cookies: &CookieJar<'_>,
    mail: &State<MailService>,
) -> ApiResult<SignupResponse> {
    let Some(mut pending) = PendingSignup::load(cookies) else {
        return Err(api_error(Status::BadRequest, "session", "Session expired."));
    };

    pending.regenerate(Utc::now());
    pending.store(cookies).map_err(|err| {
        tracing::error!(error = %err, "Could not store pending signup");
        api_error(Status::InternalServerError, "server", "Could not resend OTP")
    })?;

    mail.send_quietly(
        &pending.email,
        "Your new OTP",
        format!("Your OTP is: {}", pending.otp),
    )
    .await;

    Ok(Json(SignupResponse {
        success: true,
        message: format!("OTP sent to your email ({}).", pending.email),
        email: pending.email.clone(),
        expires_at: pending.expires_at.to_rfc3339(),
    }))
}

#[derive(Deserialize)]
pub struct TrainerApplication {
    username: String,
    email: String,
    password: String,
    password2: String,
    phone: String,
    address: String,
}

#[post("/trainer-registration", data = "<application>")]
pub async fn api_trainer_apply(
    application: Json<TrainerApplication>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<MessageResponse> {
    let username = application.username.trim();
    let email = application.email.trim().to_lowercase();
    let phone = application.phone.trim();
    let address = application.address.trim();

    let mut errors = check_trainer_application(
        username,
        &email,
        &application.password,
        &application.password2,
        phone,
        address,
    );
    if registration_email_taken(db, &email).await.validate_custom()? {
        errors.add(
            "email",
            "This email is already registered. Please use a different email address.",
        );
    }
    errors.into_result()?;

    let password_hash = hash_password(&application.password).validate_custom()?;
    create_registration(db, username, &email, phone, address, &password_hash)
        .await
        .validate_custom()?;

    Ok(ok_message(
        "Registration successful! Your application has been submitted for review. \
         You will receive an email confirmation once approved.",
    ))
}

#[derive(Serialize, Deserialize)]
pub struct EmailAvailability {
    pub available: bool,
    pub message: String,
}

#[get("/trainer-registration/check-email?<email>")]
pub async fn api_check_email(
    email: Option<String>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<EmailAvailability> {
    let email = email.unwrap_or_default().trim().to_lowercase();
    if email.is_empty() {
        return Ok(Json(EmailAvailability {
            available: false,
            message: "Please enter an email address".to_string(),
        }));
    }

    let taken = registration_email_taken(db, &email).await.validate_custom()?;
    Ok(Json(EmailAvailability {
        available: !taken,
        message: if taken {
            "Email is already registered".to_string()
        } else {
            "Email is available".to_string()
        },
    }))
}

#[derive(Deserialize)]
pub struct StatusLookup {
    email: String,
}

#[derive(Serialize, Deserialize)]
pub struct RegistrationStatusResponse {
    pub status: String,
    pub message: String,
    pub created_at: Option<String>,
    pub approval_date: Option<String>,
}

#[post("/trainer-registration/status", data = "<lookup>")]
pub async fn api_registration_status(
    lookup: Json<StatusLookup>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<RegistrationStatusResponse> {
    let email = lookup.email.trim().to_lowercase();
    let Some(registration) = get_registration(db, &email).await.validate_custom()? else {
        return Ok(Json(RegistrationStatusResponse {
            status: "not_found".to_string(),
            message: "No registration found with this email address.".to_string(),
            created_at: None,
            approval_date: None,
        }));
    };

    let message = match registration.status {
        RegistrationStatus::Pending => "Your registration is pending admin approval.".to_string(),
        RegistrationStatus::Approved => {
            "Your registration has been approved! You can now log in.".to_string()
        }
        RegistrationStatus::Rejected => format!(
            "Your registration was rejected. Reason: {}",
            registration
                .rejection_reason
                .as_deref()
                .filter(|r| !r.is_empty())
                .unwrap_or("Not specified")
        ),
    };

    Ok(Json(RegistrationStatusResponse {
        status: registration.status.as_str().to_string(),
        message,
        created_at: Some(registration.created_at.format("%Y-%m-%d %H:%M").to_string()),
        approval_date: registration
            .approval_date
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string()),
    }))
}

#[derive(Serialize, Deserialize)]
pub struct CountResponse {
    pub count: i64,
}

#[get("/trainer-registration/pending-count")]
pub async fn api_pending_registrations_count(
    admin: AdminUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<CountResponse> {
    admin
        .user
        .require_permission(Permission::VerifyTrainers)
        .validate_custom()?;
    let count = count_pending_registrations(db).await.validate_custom()?;
    Ok(Json(CountResponse { count }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        api_login,
        api_logout,
        api_me,
        api_change_password,
        api_signup_customer,
        api_signup_trainer,
        api_verify_otp,
        api_resend_otp,
        api_trainer_apply,
        api_check_email,
        api_registration_status,
        api_pending_registrations_count,
    ]
}
