pub mod auth;
pub mod jobs;
pub mod users;

use axum::{extract::rejection::JsonRejection, Json};

use crate::{
    error::HttpError,
    models::ids::{JobId, UserId},
};

/// Unwraps a JSON body, reporting malformed input in the API's error shape.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, HttpError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| HttpError::bad_request(rejection.body_text()))
}

/// A path segment that is not an id cannot name an existing record.
pub(crate) fn user_id_param(raw: &str) -> Result<UserId, HttpError> {
    raw.parse().map_err(|_| HttpError::not_found("User not found"))
}

pub(crate) fn job_id_param(raw: &str) -> Result<JobId, HttpError> {
    raw.parse().map_err(|_| HttpError::not_found("Job not found"))
}
