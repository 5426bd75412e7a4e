use axum::http::StatusCode;
use thiserror::Error;

use crate::{
    db::StoreError,
    error::HttpError,
    models::ids::{JobId, UserId},
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Job {0} not found")]
    JobNotFound(JobId),

    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Store(StoreError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("{0}")]
    Hashing(String),

    #[error("Could not store upload: {0}")]
    Upload(#[from] std::io::Error),
}

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Duplicate(message) => ServiceError::Conflict(message),
            other => ServiceError::Store(other),
        }
    }
}

/// Collapses validator output into one readable line, e.g.
/// "All fields are required".
impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .map(|e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("Invalid value ({})", e.code),
            })
            .collect();
        messages.sort();
        messages.dedup();

        ServiceError::Validation(messages.join(", "))
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Auth(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::JobNotFound(_) | ServiceError::UserNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Store(_)
            | ServiceError::Token(_)
            | ServiceError::Hashing(_)
            | ServiceError::Upload(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match &error {
            ServiceError::JobNotFound(_) => HttpError::not_found("Job not found"),
            ServiceError::UserNotFound(_) => HttpError::not_found("User not found"),
            _ => HttpError::new(error.to_string(), error.status_code()),
        }
    }
}
