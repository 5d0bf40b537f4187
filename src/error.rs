use opentelemetry_semantic_conventions::{attribute::OTEL_STATUS_CODE, trace::ERROR_TYPE};
use rocket::http::Status;
use thiserror::Error;
use tracing::{Span, error, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short machine name recorded on the span as `error.type`.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Authentication(_) => "authentication_error",
            AppError::Authorization(_) => "authorization_error",
            AppError::NotFound(_) => "not_found_error",
            AppError::Validation(_) => "validation_error",
            AppError::Conflict(_) => "conflict_error",
            AppError::ExternalService(_) => "external_service_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Failures on our side rather than the caller's.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::ExternalService(_) | AppError::Internal(_)
        )
    }

    pub fn log_and_record(&self, ctx: &str) {
        let message = self.to_string();
        let kind = self.kind();

        if self.is_server_fault() {
            error!(error = %message, context = %ctx, kind, "Request failed");
        } else {
            warn!(error = %message, context = %ctx, kind, "Request rejected");
        }

        let span = Span::current();
        if span.is_none() {
            return;
        }
        span.record("error", tracing::field::display(true));
        span.record(ERROR_TYPE, tracing::field::display(kind));
        span.record("error.message", tracing::field::display(&message));
        if self.is_server_fault() {
            span.record(OTEL_STATUS_CODE, tracing::field::display("ERROR"));
        }
    }

    pub fn status_code(&self) -> Status {
        match self {
            AppError::Database(_) => Status::InternalServerError,
            AppError::Authentication(_) => Status::Unauthorized,
            AppError::Authorization(_) => Status::Forbidden,
            AppError::NotFound(_) => Status::NotFound,
            AppError::Validation(_) => Status::BadRequest,
            AppError::Conflict(_) => Status::Conflict,
            AppError::ExternalService(_) => Status::ServiceUnavailable,
            AppError::Internal(_) => Status::InternalServerError,
        }
    }

    pub fn to_status_with_log(&self, context: &str) -> Status {
        self.log_and_record(context);
        self.status_code()
    }

    /// True when the underlying database error is a UNIQUE constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(err)) => err.is_unique_violation(),
            _ => false,
        }
    }
}

impl<'r> rocket::response::Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'static> {
        self.to_status_with_log(&format!("Request to {} {}", req.method(), req.uri()))
            .respond_to(req)
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("Cryptography error: {}", error))
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        AppError::Internal(format!("Migration error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Internal(format!("Serialization error: {}", error))
    }
}

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        err.to_status_with_log("Error conversion into Status")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            Status::NotFound
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            Status::Conflict
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status_code(),
            Status::InternalServerError
        );
        assert!(!AppError::Database(sqlx::Error::RowNotFound).is_unique_violation());
    }

    #[test]
    fn test_only_server_faults_mark_span_as_error() {
        assert!(AppError::ExternalService("smtp".into()).is_server_fault());
        assert!(!AppError::Conflict("slot".into()).is_server_fault());
        assert_eq!(AppError::Conflict("slot".into()).kind(), "conflict_error");
    }
}
