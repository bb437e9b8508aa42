use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crates::domain::value_objects::content::ValidationErrors;
use serde::Serialize;
use thiserror::Error;

use crate::usecases::{
    boosts::BoostError, content::ContentError, subscriptions::SubscriptionError,
};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(ValidationErrors),

    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(status: StatusCode, message: impl Into<String>) -> Self {
        AppError::Status {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation failed".to_string(),
                Some(errors.errors().to_vec()),
            ),
            AppError::Status { status, message } => (status, message, None),
            AppError::Internal(_) => {
                // Don't leak internal error detail to client
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            message,
            errors,
        });

        (status, body).into_response()
    }
}

impl From<BoostError> for AppError {
    fn from(err: BoostError) -> Self {
        match err {
            BoostError::Internal(err) => AppError::Internal(err),
            other => AppError::status(other.status_code(), other.to_string()),
        }
    }
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Validation(errors) => AppError::Validation(errors),
            ContentError::Internal(err) => AppError::Internal(err),
            other => AppError::status(other.status_code(), other.to_string()),
        }
    }
}

impl From<SubscriptionError> for AppError {
    fn from(err: SubscriptionError) -> Self {
        match err {
            SubscriptionError::Internal(err) => AppError::Internal(err),
            other => AppError::status(other.status_code(), other.to_string()),
        }
    }
}
