use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};

pub mod admin;
pub mod auth;
pub mod customer;
pub mod trainer;

/// Plain acknowledgement for actions that have nothing else to return.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

pub(crate) fn ok_message(message: impl Into<String>) -> Json<MessageResponse> {
    Json(MessageResponse {
        success: true,
        message: message.into(),
    })
}

/// Counts shown on dashboards fall back to zero rather than failing the whole page.
pub(crate) fn or_zero(result: Result<i64, crate::error::AppError>, what: &str) -> i64 {
    result.unwrap_or_else(|err| {
        err.log_and_record(what);
        0
    })
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
