use crate::error::AppError;
use once_cell::sync::Lazy;
use regex::Regex;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;
use validator::{Validate, ValidateEmail};

pub static USERNAME_LETTERS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z ]+$").unwrap()
});

pub static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+\d{1,4}\d{9,11}$").unwrap()
});

pub static TRAINER_EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.-]+@(gmail|yahoo|hotmail)\.com$").unwrap()
});

pub type ApiError = Custom<Json<ValidationResponse>>;
pub type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ValidationResponse {
    pub status: String,
    pub errors: HashMap<String, Vec<String>>,
}

impl ValidationResponse {
    pub fn new(errors: HashMap<String, Vec<String>>) -> Self {
        Self {
            status: "error".to_string(),
            errors,
        }
    }

    pub fn with_error(field: &str, message: &str) -> Self {
        let mut errors = HashMap::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        Self::new(errors)
    }
}

/// Builds a JSON error response with a single field message.
pub fn api_error(status: Status, field: &str, message: &str) -> ApiError {
    Custom(status, Json(ValidationResponse::with_error(field, message)))
}

pub trait ToValidationResponse {
    fn to_validation_response(self) -> ApiError;
}

impl ToValidationResponse for AppError {
    #[instrument]
    fn to_validation_response(self) -> ApiError {
        self.log_and_record("API Validation Error");
        let status = self.status_code();

        let (field, message) = match &self {
            AppError::Database(_) => ("database", "Database error".to_string()),
            AppError::Authentication(msg) => ("authentication", msg.clone()),
            AppError::Authorization(msg) => ("authorization", msg.clone()),
            AppError::NotFound(msg) => ("resource", msg.clone()),
            AppError::Validation(msg) => ("validation", msg.clone()),
            AppError::Conflict(msg) => ("conflict", msg.clone()),
            AppError::ExternalService(msg) => ("service", format!("Service error: {}", msg)),
            AppError::Internal(_) => ("server", "Internal server error".to_string()),
        };

        api_error(status, field, &message)
    }
}

impl ToValidationResponse for Status {
    #[instrument]
    fn to_validation_response(self) -> ApiError {
        let (field, message) = match self.code {
            403 => (
                "permission",
                "You don't have permission to perform this action",
            ),
            401 => ("authentication", "Authentication required"),
            404 => ("resource", "Resource not found"),
            409 => ("resource", "Resource already exists"),
            400 => ("request", "Bad request"),
            422 => ("validation", "Validation failed"),
            500 => ("server", "Internal server error"),
            503 => ("service", "Service unavailable"),
            _ => ("error", "An error occurred"),
        };

        api_error(self, field, message)
    }
}

#[derive(Debug)]
pub struct ValidationErrorWrapper(pub validator::ValidationErrors);

impl From<ValidationErrorWrapper> for ApiError {
    #[instrument]
    fn from(wrapper: ValidationErrorWrapper) -> Self {
        let errors = wrapper.0;
        let mut error_map = HashMap::new();

        for (field, field_errors) in errors.field_errors() {
            let error_messages: Vec<String> = field_errors
                .iter()
                .map(|error| {
                    error
                        .message
                        .clone()
                        .unwrap_or_else(|| "Invalid value".into())
                        .to_string()
                })
                .collect();

            error_map.insert(field.to_string(), error_messages);
        }

        Custom(
            Status::UnprocessableEntity,
            Json(ValidationResponse::new(error_map)),
        )
    }
}

/// Runs `validator` checks on a JSON body and unwraps it.
pub trait JsonValidateExt<T> {
    fn validate_custom(self) -> Result<T, ApiError>;
}

impl<T: Validate> JsonValidateExt<T> for Json<T> {
    fn validate_custom(self) -> Result<T, ApiError> {
        let inner = self.into_inner();
        inner
            .validate()
            .map_err(|errors| ApiError::from(ValidationErrorWrapper(errors)))?;
        Ok(inner)
    }
}

/// Converts an `AppError` result into the JSON error response.
pub trait AppErrorExt<T> {
    fn validate_custom(self) -> Result<T, ApiError>;
}

impl<T> AppErrorExt<T> for Result<T, AppError> {
    fn validate_custom(self) -> Result<T, ApiError> {
        self.map_err(ToValidationResponse::to_validation_response)
    }
}

/// Converts a permission check into the JSON error response.
pub trait PermissionCheckExt<T> {
    fn validate_custom(self) -> Result<T, ApiError>;
}

impl<T> PermissionCheckExt<T> for Result<T, Status> {
    fn validate_custom(self) -> Result<T, ApiError> {
        self.map_err(ToValidationResponse::to_validation_response)
    }
}

/// Collects field errors so all of them can be reported at once.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Custom(
                Status::UnprocessableEntity,
                Json(ValidationResponse::new(self.errors)),
            ))
        }
    }
}

/// Form rules for a public trainer application. Uniqueness is checked by the caller.
pub fn check_trainer_application(
    username: &str,
    email: &str,
    password: &str,
    password2: &str,
    phone: &str,
    address: &str,
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if !USERNAME_LETTERS_REGEX.is_match(username) {
        errors.add("username", "Username can only contain letters and spaces.");
    }

    if email.to_string().validate_email() {
        if !TRAINER_EMAIL_REGEX.is_match(email) {
            errors.add(
                "email",
                "Email must be from gmail.com, yahoo.com, or hotmail.com",
            );
        }
    } else {
        errors.add("email", "Please enter a valid email address.");
    }

    if password.chars().count() < 8 {
        errors.add("password", "Password must be at least 8 characters long.");
    }

    if password != password2 {
        errors.add("password2", "Passwords do not match.");
    }

    if !PHONE_REGEX.is_match(phone) {
        errors.add(
            "phone",
            "Phone number must start with country code (e.g. +92) and be up to 15 digits.",
        );
    }

    if address.chars().count() < 10 {
        errors.add(
            "address",
            "Please enter a complete address (at least 10 characters).",
        );
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_trainer_application() {
        let errors = check_trainer_application(
            "Jane Doe",
            "jane.doe@gmail.com",
            "longenough",
            "longenough",
            "+923001234567",
            "12 Long Street, Lahore",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_trainer_application_collects_every_error() {
        let errors = check_trainer_application(
            "jane_99",
            "jane@outlook.com",
            "short",
            "different",
            "03001234567",
            "tiny",
        );
        let map = errors.errors;
        assert_eq!(map.len(), 6);
        assert!(map.contains_key("username"));
        assert_eq!(
            map["email"],
            vec!["Email must be from gmail.com, yahoo.com, or hotmail.com"]
        );
        assert!(map.contains_key("password"));
        assert!(map.contains_key("password2"));
        assert!(map.contains_key("phone"));
        assert!(map.contains_key("address"));
    }

    #[test]
    fn test_phone_pattern() {
        assert!(PHONE_REGEX.is_match("+12345678901"));
        assert!(PHONE_REGEX.is_match("+923001234567"));
        assert!(!PHONE_REGEX.is_match("+1234"));
        assert!(!PHONE_REGEX.is_match("923001234567"));
    }

    #[test]
    fn test_malformed_email_reported_once() {
        let errors = check_trainer_application(
            "Jane", "not-an-email", "password1", "password1", "+923001234567", "0123456789",
        );
        assert_eq!(
            errors.errors["email"],
            vec!["Please enter a valid email address."]
        );
    }

    #[test]
    fn test_status_maps_to_field_message() {
        let Custom(status, Json(body)) = Status::Forbidden.to_validation_response();
        assert_eq!(status, Status::Forbidden);
        assert_eq!(
            body.errors["permission"],
            vec!["You don't have permission to perform this action"]
        );

        let Custom(_, Json(body)) = Status::NotFound.to_validation_response();
        assert_eq!(body.errors["resource"], vec!["Resource not found"]);

        let Custom(_, Json(body)) = Status::ImATeapot.to_validation_response();
        assert_eq!(body.errors["error"], vec!["An error occurred"]);
    }
}
