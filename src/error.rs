use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::{services::email::EmailError, users::errors::UserError};

const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal server error";

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Errors that reach the HTTP boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Json(#[from] JsonRejection),

    #[error(transparent)]
    Path(#[from] PathRejection),

    #[error(transparent)]
    Query(#[from] QueryRejection),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::User(e) if e.is_internal() => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::User(_) => StatusCode::BAD_REQUEST,
            ApiError::Email(_)
            | ApiError::Validation(_)
            | ApiError::Json(_)
            | ApiError::Path(_)
            | ApiError::Query(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Json(rejection) => rejection.body_text(),
            ApiError::Path(rejection) => rejection.body_text(),
            ApiError::Query(rejection) => rejection.body_text(),
            _ if status.is_server_error() => {
                error!(error = %self, "request failed");
                INTERNAL_SERVER_ERROR_MESSAGE.to_string()
            }
            _ => self.to_string(),
        };
        (status, Json(MessageResponse { message })).into_response()
    }
}
