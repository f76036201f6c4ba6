use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::questions::QuestionsError;
use crate::store::StoreError;
use crate::survey::approval::ApprovalError;
use crate::survey::transitions::TransitionError;

/// A call to Google or the mail server failed. Never aborts the surrounding
/// operation; it ends up as a warning on the response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{service} request failed: {reason}")]
pub struct ExternalServiceError {
    pub service: &'static str,
    pub reason: String,
}

impl ExternalServiceError {
    pub fn new(service: &'static str, reason: impl Into<String>) -> Self {
        Self {
            service,
            reason: reason.into(),
        }
    }
}

/// Anything that stops the server from starting.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("Unable to open survey store: {0}")]
    Store(#[from] StoreError),

    #[error("Unable to set up {component}: {reason}")]
    Component {
        component: &'static str,
        reason: String,
    },

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Questions(#[from] QuestionsError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Approval(#[from] ApprovalError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Survey not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("Survey '{0}' was changed by another request; reload and try again")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Questions(_)
            | ApiError::Transition(_)
            | ApiError::Approval(_)
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(AuthError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Auth(AuthError::Upstream(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Store(err) => {
                error!("Survey store failure: {err}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
