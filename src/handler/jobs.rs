use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path},
    handler::Handler,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};

use super::{job_id_param, json_body};
use crate::{
    dtos::{
        jobdtos::{CreateJobDto, JobListResponseDto, JobResponseEnvelope, UpdateJobDto},
        userdtos::Response,
    },
    error::HttpError,
    middleware::{auth, role_check, JWTAuthMiddleware},
    models::usermodel::UserRole,
    AppState,
};

pub fn jobs_handler() -> Router {
    Router::new()
        .route(
            "/",
            get(get_jobs).post(
                create_job
                    .layer(middleware::from_fn(|state, req, next| {
                        role_check(state, req, next, vec![UserRole::Client])
                    }))
                    .layer(middleware::from_fn(auth)),
            ),
        )
        .route(
            "/client/my-jobs",
            get(get_my_jobs).layer(middleware::from_fn(auth)),
        )
        .route(
            "/:id",
            get(get_job)
                .put(update_job.layer(middleware::from_fn(auth)))
                .delete(delete_job.layer(middleware::from_fn(auth))),
        )
        .route(
            "/:id/apply",
            post(apply_for_job)
                .layer(middleware::from_fn(|state, req, next| {
                    role_check(state, req, next, vec![UserRole::Fundi])
                }))
                .layer(middleware::from_fn(auth)),
        )
}

pub async fn get_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.job_service.list_jobs().await?;
    Ok(Json(JobListResponseDto { jobs }))
}

pub async fn get_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.get_job(job_id_param(&id)?).await?;
    Ok(Json(JobResponseEnvelope { message: None, job }))
}

pub async fn get_my_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.job_service.my_jobs(&caller.identity).await?;
    Ok(Json(JobListResponseDto { jobs }))
}

pub async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddleware>,
    payload: Result<Json<CreateJobDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let body = json_body(payload)?;

    let job = app_state
        .job_service
        .create_job(&caller.identity, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(JobResponseEnvelope {
            message: Some("Job created successfully".to_string()),
            job,
        }),
    ))
}

pub async fn update_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddleware>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateJobDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let job_id = job_id_param(&id)?;
    let body = json_body(payload)?;

    let job = app_state
        .job_service
        .update_job(&caller.identity, job_id, body)
        .await?;

    Ok(Json(JobResponseEnvelope {
        message: Some("Job updated successfully".to_string()),
        job,
    }))
}

pub async fn delete_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddleware>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .job_service
        .delete_job(&caller.identity, job_id_param(&id)?)
        .await?;

    Ok(Json(Response {
        message: "Job deleted successfully".to_string(),
    }))
}

pub async fn apply_for_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddleware>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .job_service
        .apply_for_job(&caller.identity, job_id_param(&id)?)
        .await?;

    Ok(Json(JobResponseEnvelope {
        message: Some("Application submitted successfully".to_string()),
        job,
    }))
}
