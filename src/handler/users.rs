use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, Path},
    handler::Handler,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};

use super::{json_body, user_id_param};
use crate::{
    dtos::userdtos::{
        parse_skills, FilterUserDto, ProfileUpdateDto, RateFundiDto, Response, UserUpdateDto,
        UserUpdatedResponseDto,
    },
    error::HttpError,
    middleware::{auth, role_check, JWTAuthMiddleware},
    models::usermodel::UserRole,
    service::ProfileImage,
    AppState,
};

pub fn users_handler(max_upload_bytes: usize) -> Router {
    Router::new()
        .route(
            "/all",
            get(get_users)
                .layer(middleware::from_fn(|state, req, next| {
                    role_check(state, req, next, vec![UserRole::Admin])
                }))
                .layer(middleware::from_fn(auth)),
        )
        .route("/fundis", get(get_fundis))
        .route(
            "/clients",
            get(get_clients)
                .layer(middleware::from_fn(|state, req, next| {
                    role_check(state, req, next, vec![UserRole::Admin])
                }))
                .layer(middleware::from_fn(auth)),
        )
        .route(
            "/profile",
            get(get_profile)
                .put(update_profile)
                .layer(DefaultBodyLimit::max(max_upload_bytes))
                .layer(middleware::from_fn(auth)),
        )
        .route(
            "/:id",
            get(get_user.layer(middleware::from_fn(auth)))
                .put(update_user.layer(middleware::from_fn(auth)))
                .delete(
                    delete_user
                        .layer(middleware::from_fn(|state, req, next| {
                            role_check(state, req, next, vec![UserRole::Admin])
                        }))
                        .layer(middleware::from_fn(auth)),
                ),
        )
        .route(
            "/:id/rate",
            post(rate_fundi).layer(middleware::from_fn(auth)),
        )
}

pub async fn get_users(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let users = app_state.user_service.list_users().await?;
    Ok(Json(FilterUserDto::filter_users(&users)))
}

pub async fn get_fundis(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let users = app_state.user_service.list_by_role(UserRole::Fundi).await?;
    Ok(Json(FilterUserDto::filter_users(&users)))
}

pub async fn get_clients(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let users = app_state.user_service.list_by_role(UserRole::Client).await?;
    Ok(Json(FilterUserDto::filter_users(&users)))
}

pub async fn get_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state.user_service.get_profile(&caller.identity).await?;
    Ok(Json(FilterUserDto::filter_user(&user)))
}

pub async fn update_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddleware>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let mut body = ProfileUpdateDto::default();
    let mut image: Option<ProfileImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "profileImage" {
            let file_name = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| HttpError::bad_request(e.body_text()))?;
            image = Some(ProfileImage { file_name, bytes: bytes.to_vec() });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| HttpError::bad_request(e.body_text()))?;

        match name.as_str() {
            "name" => body.name = Some(value),
            "phone" => body.phone = Some(value),
            "location" => body.location = Some(value),
            "experience" => body.experience = Some(value),
            "skills" => body.skills = Some(parse_skills(&value)),
            other => tracing::debug!("ignoring profile field '{}'", other),
        }
    }

    let user = app_state
        .user_service
        .update_profile(&caller.identity, body, image)
        .await?;

    Ok(Json(UserUpdatedResponseDto {
        message: "Profile updated successfully".to_string(),
        user: FilterUserDto::filter_user(&user),
    }))
}

pub async fn get_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state.user_service.get_user(user_id_param(&id)?).await?;
    Ok(Json(FilterUserDto::filter_user(&user)))
}

pub async fn update_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddleware>,
    Path(id): Path<String>,
    payload: Result<Json<UserUpdateDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = user_id_param(&id)?;
    let body = json_body(payload)?;

    let user = app_state
        .user_service
        .update_user(&caller.identity, user_id, body)
        .await?;

    Ok(Json(UserUpdatedResponseDto {
        message: "User updated successfully".to_string(),
        user: FilterUserDto::filter_user(&user),
    }))
}

pub async fn delete_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    app_state.user_service.delete_user(user_id_param(&id)?).await?;

    Ok(Json(Response {
        message: "User deleted successfully".to_string(),
    }))
}

pub async fn rate_fundi(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddleware>,
    Path(id): Path<String>,
    payload: Result<Json<RateFundiDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let fundi_id = user_id_param(&id)?;
    let body = json_body(payload)?;

    let fundi = app_state
        .user_service
        .rate_fundi(&caller.identity, fundi_id, body)
        .await?;

    Ok(Json(FilterUserDto::filter_user(&fundi)))
}
