use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;

use super::json_body;
use crate::{
    dtos::userdtos::{FilterUserDto, LoginUserDto, RegisterUserDto, UserAuthResponseDto},
    error::HttpError,
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    payload: Result<Json<RegisterUserDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let body = json_body(payload)?;

    let session = app_state.auth_service.register(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserAuthResponseDto {
            message: Some("User registered successfully".to_string()),
            token: session.token,
            user: FilterUserDto::filter_user(&session.user),
        }),
    ))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    payload: Result<Json<LoginUserDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let body = json_body(payload)?;

    let session = app_state.auth_service.login(body).await?;

    let cookie_duration = time::Duration::minutes(app_state.env.jwt_login_maxage);
    let cookie = Cookie::build(("token", session.token.clone()))
        .path("/")
        .max_age(cookie_duration)
        .http_only(true)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error("Could not build session cookie"))?,
    );

    let response = Json(UserAuthResponseDto {
        message: None,
        token: session.token,
        user: FilterUserDto::filter_user(&session.user),
    });

    Ok((headers, response))
}
